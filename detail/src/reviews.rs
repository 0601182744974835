//! Review list and "my review" edit machine for one festival.
//!
//! Holds the server-ordered review list plus the current user's own review
//! and a draft the form edits. The list is replaced wholesale on every
//! load; after a successful create/update/delete the full list is reloaded
//! so the server-assigned timestamps and edit markers stay authoritative.
//!
//! "My review" is located by scanning the loaded list for the session's
//! account id — an O(n) scan on load, never a separate lookup call.

use crate::environment::DetailEnvironment;
use crate::error::DetailError;
use crate::types::{AccountId, NewReview, Review, Reviewer, SessionContext};
use festa_core::{Effect, Reducer, SmallVec, smallvec};
use std::sync::Arc;

/// Edit-mode state machine for the review form
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ReviewMode {
    /// No edit in progress
    #[default]
    Viewing,
    /// No existing review; the user is drafting a new one
    Composing,
    /// The existing review is loaded into the draft for modification
    Editing,
}

/// Draft fields backing the review form
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReviewDraft {
    /// Star rating, 0 meaning unset
    pub rating: u8,
    /// Free-text comment
    pub comment: String,
}

impl ReviewDraft {
    /// Draft seeded from a persisted review
    #[must_use]
    pub fn from_review(review: &Review) -> Self {
        Self {
            rating: review.rating,
            comment: review.comment.clone(),
        }
    }
}

/// Review slice of the screen state
#[derive(Clone, Debug)]
pub struct ReviewsState {
    /// Which festival, and who is looking
    pub session: SessionContext,
    /// Mount generation; stale completions are dropped
    pub generation: u64,
    /// All reviews, in whatever order the server returned them
    pub reviews: Vec<Review>,
    /// The current user's review, if the scan found one
    pub my_review: Option<Review>,
    /// Edit-mode state machine
    pub mode: ReviewMode,
    /// Form draft
    pub draft: ReviewDraft,
    /// List fetch in flight
    pub loading: bool,
    /// Create/update/delete in flight
    pub submitting: bool,
    /// Last surfaced error, for the screen to translate
    pub last_error: Option<DetailError>,
}

impl ReviewsState {
    /// Fresh state for a mount
    #[must_use]
    pub const fn new(session: SessionContext, generation: u64) -> Self {
        Self {
            session,
            generation,
            reviews: Vec::new(),
            my_review: None,
            mode: ReviewMode::Viewing,
            draft: ReviewDraft {
                rating: 0,
                comment: String::new(),
            },
            loading: false,
            submitting: false,
            last_error: None,
        }
    }

    /// Number of reviews in the list
    #[must_use]
    pub fn count(&self) -> usize {
        self.reviews.len()
    }

    /// Mean star rating across the list, if any
    #[must_use]
    #[allow(clippy::cast_precision_loss)] // review counts are far below 2^52
    pub fn average_rating(&self) -> Option<f64> {
        if self.reviews.is_empty() {
            return None;
        }
        let total: u32 = self.reviews.iter().map(|r| u32::from(r.rating)).sum();
        Some(f64::from(total) / self.reviews.len() as f64)
    }

    /// Classifies a review author relative to the session
    #[must_use]
    pub fn reviewer_of(&self, author: AccountId) -> Reviewer {
        self.session.reviewer_of(author)
    }

    /// Re-derives "my review", mode and draft from the freshly loaded list
    fn seed_from_list(&mut self) {
        let Some(account_id) = self.session.account_id else {
            self.my_review = None;
            self.mode = ReviewMode::Viewing;
            self.draft = ReviewDraft::default();
            return;
        };

        self.my_review = self
            .reviews
            .iter()
            .find(|r| r.account_id == account_id)
            .cloned();

        match &self.my_review {
            Some(mine) => {
                self.mode = ReviewMode::Viewing;
                self.draft = ReviewDraft::from_review(mine);
            },
            None => {
                self.mode = ReviewMode::Composing;
                self.draft = ReviewDraft::default();
            },
        }
    }
}

/// Actions for the review store
#[derive(Clone, Debug)]
pub enum ReviewsAction {
    /// Fetch the full review list
    Load,
    /// The list arrived
    Loaded {
        /// Mount generation the load was issued under
        generation: u64,
        /// Server-ordered review list
        reviews: Vec<Review>,
    },
    /// The list fetch failed
    LoadFailed {
        /// Mount generation the load was issued under
        generation: u64,
        /// Failure description
        error: String,
    },
    /// User picked a star rating in the form
    RatingChanged(u8),
    /// User edited the comment in the form
    CommentChanged(String),
    /// User tapped "edit" on their own review
    StartEdit,
    /// User abandoned the edit; draft resets to the persisted values
    CancelEdit,
    /// User submitted the draft (create or update, by mode)
    Submit,
    /// The create/update was confirmed
    SubmitCompleted {
        /// Mount generation the submit was issued under
        generation: u64,
    },
    /// The create/update failed
    SubmitFailed {
        /// Mount generation the submit was issued under
        generation: u64,
        /// Failure to surface
        error: DetailError,
    },
    /// User confirmed deleting their own review
    Delete,
    /// The delete was confirmed
    DeleteCompleted {
        /// Mount generation the delete was issued under
        generation: u64,
    },
    /// The delete failed
    DeleteFailed {
        /// Mount generation the delete was issued under
        generation: u64,
        /// Failure to surface
        error: DetailError,
    },
}

/// Reducer for the review store
#[derive(Clone, Debug, Default)]
pub struct ReviewsReducer;

impl ReviewsReducer {
    /// Creates a new `ReviewsReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Effect fetching the full list for the session's festival
    fn load_effect(state: &ReviewsState, env: &DetailEnvironment) -> Effect<ReviewsAction> {
        let gateway = Arc::clone(&env.reviews);
        let festival_id = state.session.festival_id;
        let generation = state.generation;
        Effect::future(async move {
            match gateway.fetch_reviews(festival_id).await {
                Ok(reviews) => Some(ReviewsAction::Loaded {
                    generation,
                    reviews,
                }),
                Err(error) => Some(ReviewsAction::LoadFailed {
                    generation,
                    error: error.to_string(),
                }),
            }
        })
    }
}

impl Reducer for ReviewsReducer {
    type State = ReviewsState;
    type Action = ReviewsAction;
    type Environment = DetailEnvironment;

    #[allow(clippy::too_many_lines)] // one arm per operation of the state machine
    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            ReviewsAction::Load => {
                state.loading = true;
                smallvec![Self::load_effect(state, env)]
            },

            ReviewsAction::Loaded {
                generation,
                reviews,
            } => {
                if generation != state.generation {
                    tracing::debug!(generation, "dropping stale review list");
                    return SmallVec::new();
                }
                state.loading = false;
                state.reviews = reviews; // wholesale, never incremental
                state.seed_from_list();
                SmallVec::new()
            },

            ReviewsAction::LoadFailed { generation, error } => {
                if generation != state.generation {
                    return SmallVec::new();
                }
                tracing::warn!(%error, "review list fetch failed");
                state.loading = false;
                state.last_error = Some(DetailError::NetworkFailure(error));
                SmallVec::new()
            },

            ReviewsAction::RatingChanged(rating) => {
                state.draft.rating = rating;
                SmallVec::new()
            },

            ReviewsAction::CommentChanged(comment) => {
                state.draft.comment = comment;
                SmallVec::new()
            },

            ReviewsAction::StartEdit => {
                let Some(mine) = &state.my_review else {
                    tracing::debug!("edit requested without an existing review");
                    return SmallVec::new();
                };
                state.draft = ReviewDraft::from_review(mine);
                state.mode = ReviewMode::Editing;
                SmallVec::new()
            },

            ReviewsAction::CancelEdit => {
                match &state.my_review {
                    Some(mine) => {
                        state.mode = ReviewMode::Viewing;
                        state.draft = ReviewDraft::from_review(mine);
                    },
                    None => {
                        state.mode = ReviewMode::Composing;
                        state.draft = ReviewDraft::default();
                    },
                }
                SmallVec::new()
            },

            ReviewsAction::Submit => {
                if state.submitting {
                    state.last_error = Some(DetailError::OperationInProgress);
                    return SmallVec::new();
                }
                let Some(account_id) = state.session.account_id else {
                    state.last_error = Some(DetailError::NotAuthenticated);
                    return SmallVec::new();
                };

                let rating = state.draft.rating;
                if !(1..=5).contains(&rating) {
                    state.last_error = Some(DetailError::InvalidRating(rating));
                    return SmallVec::new();
                }

                let generation = state.generation;
                let gateway = Arc::clone(&env.reviews);
                let comment = state.draft.comment.clone();

                let effect = match state.mode {
                    ReviewMode::Composing => {
                        let review = NewReview {
                            festival_id: state.session.festival_id,
                            account_id,
                            rating,
                            comment,
                        };
                        Effect::future(async move {
                            match gateway.create_review(review).await {
                                Ok(_) => Some(ReviewsAction::SubmitCompleted { generation }),
                                Err(error) => Some(ReviewsAction::SubmitFailed {
                                    generation,
                                    error: error.into(),
                                }),
                            }
                        })
                    },
                    ReviewMode::Editing => {
                        // A review the backend never identified cannot be
                        // addressed for update.
                        let Some(review_id) = state.my_review.as_ref().and_then(|r| r.id) else {
                            state.last_error = Some(DetailError::NotFound);
                            return SmallVec::new();
                        };
                        Effect::future(async move {
                            match gateway.update_review(review_id, rating, comment).await {
                                Ok(_) => Some(ReviewsAction::SubmitCompleted { generation }),
                                Err(error) => Some(ReviewsAction::SubmitFailed {
                                    generation,
                                    error: error.into(),
                                }),
                            }
                        })
                    },
                    ReviewMode::Viewing => {
                        tracing::debug!("submit ignored outside compose/edit mode");
                        return SmallVec::new();
                    },
                };

                state.submitting = true;
                state.last_error = None;
                smallvec![effect]
            },

            ReviewsAction::SubmitCompleted { generation } => {
                if generation != state.generation {
                    return SmallVec::new();
                }
                state.submitting = false;
                state.mode = ReviewMode::Viewing;
                state.last_error = None;
                // Reload so the server-assigned timestamps and edit markers
                // replace the local draft.
                state.loading = true;
                smallvec![Self::load_effect(state, env)]
            },

            ReviewsAction::SubmitFailed { generation, error } => {
                if generation != state.generation {
                    return SmallVec::new();
                }
                tracing::warn!(%error, "review submit failed");
                state.submitting = false;
                state.last_error = Some(error);
                SmallVec::new()
            },

            ReviewsAction::Delete => {
                if state.submitting {
                    state.last_error = Some(DetailError::OperationInProgress);
                    return SmallVec::new();
                }
                let Some(review_id) = state.my_review.as_ref().and_then(|r| r.id) else {
                    state.last_error = Some(DetailError::NotFound);
                    return SmallVec::new();
                };

                state.submitting = true;
                state.last_error = None;

                let generation = state.generation;
                let gateway = Arc::clone(&env.reviews);
                smallvec![Effect::future(async move {
                    match gateway.delete_review(review_id).await {
                        Ok(()) => Some(ReviewsAction::DeleteCompleted { generation }),
                        Err(error) => Some(ReviewsAction::DeleteFailed {
                            generation,
                            error: error.into(),
                        }),
                    }
                })]
            },

            ReviewsAction::DeleteCompleted { generation } => {
                if generation != state.generation {
                    return SmallVec::new();
                }
                state.submitting = false;
                state.my_review = None;
                state.draft = ReviewDraft::default();
                state.mode = if state.session.is_guest() {
                    ReviewMode::Viewing
                } else {
                    ReviewMode::Composing
                };
                state.loading = true;
                smallvec![Self::load_effect(state, env)]
            },

            ReviewsAction::DeleteFailed { generation, error } => {
                if generation != state.generation {
                    return SmallVec::new();
                }
                tracing::warn!(%error, "review delete failed");
                state.submitting = false;
                state.last_error = Some(error);
                SmallVec::new()
            },
        }
    }
}
