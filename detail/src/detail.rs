//! The festival-detail screen aggregate.
//!
//! Composes festival metadata, the review store, the participation tracker
//! and the profile cache into one read model. On mount the three remote
//! loads fan out concurrently and complete in any order; each failure is
//! isolated, so a failed review load never blocks festival metadata or the
//! participation flag from rendering.
//!
//! Remounting (a new festival id or a sign-in change) bumps the generation;
//! completions carrying a stale generation are dropped on the floor.

use crate::environment::DetailEnvironment;
use crate::participation::{
    ParticipationAction, ParticipationReducer, ParticipationState, RegistrationGate,
    registration_gate,
};
use crate::profiles::{ProfileAction, ProfileCacheState, ProfileReducer};
use crate::reviews::{ReviewsAction, ReviewsReducer, ReviewsState};
use crate::types::{AccountId, Festival, Loadable, SessionContext};
use chrono::{DateTime, Utc};
use festa_core::{Effect, Reducer, SmallVec, smallvec};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Merged state of the festival-detail screen
#[derive(Clone, Debug)]
pub struct FestivalDetailState {
    /// Which festival, and who is looking
    pub session: SessionContext,
    /// Bumped on every mount; stale completions are dropped
    pub generation: u64,
    /// Festival snapshot, replaced wholesale on reload
    pub festival: Loadable<Festival>,
    /// Participation slice
    pub participation: ParticipationState,
    /// Review slice
    pub reviews: ReviewsState,
    /// Author profile cache
    pub profiles: ProfileCacheState,
}

impl FestivalDetailState {
    /// State for a screen that has not mounted yet
    #[must_use]
    pub fn new(session: SessionContext) -> Self {
        Self {
            session,
            generation: 0,
            festival: Loadable::Idle,
            participation: ParticipationState::new(session, 0),
            reviews: ReviewsState::new(session, 0),
            profiles: ProfileCacheState::new(),
        }
    }

    /// The loaded festival, if the fetch has landed
    #[must_use]
    pub const fn festival(&self) -> Option<&Festival> {
        self.festival.value()
    }

    /// Registration-window predicate for the loaded festival.
    ///
    /// `None` until the festival snapshot arrives. Purely advisory: the
    /// server remains the source of truth for registration.
    #[must_use]
    pub fn registration_gate(&self, now: DateTime<Utc>) -> Option<RegistrationGate> {
        self.festival.value().map(|f| registration_gate(f, now))
    }

    /// Display name for a review author.
    ///
    /// Falls back to the placeholder wording while the profile is still
    /// resolving, so a review row never blocks on a slow lookup.
    #[must_use]
    pub fn display_name(&self, account_id: AccountId) -> String {
        self.profiles.get(account_id).map_or_else(
            || format!("User #{account_id}"),
            |profile| profile.display_name.clone(),
        )
    }
}

/// Actions for the festival-detail screen
#[derive(Clone, Debug)]
pub enum FestivalDetailAction {
    /// The screen mounted, or its festival id / account changed
    ScreenMounted {
        /// Identity of the new screen session
        session: SessionContext,
    },
    /// The festival snapshot arrived
    FestivalLoaded {
        /// Mount generation the fetch was issued under
        generation: u64,
        /// The snapshot (boxed: it dwarfs the other variants)
        festival: Box<Festival>,
    },
    /// The festival fetch failed
    FestivalLoadFailed {
        /// Mount generation the fetch was issued under
        generation: u64,
        /// Failure description
        error: String,
    },
    /// Participation slice actions
    Participation(ParticipationAction),
    /// Review slice actions
    Reviews(ReviewsAction),
    /// Profile cache actions
    Profiles(ProfileAction),
}

/// Reducer for the festival-detail screen
#[derive(Clone, Debug, Default)]
pub struct FestivalDetailReducer {
    participation: ParticipationReducer,
    reviews: ReviewsReducer,
    profiles: ProfileReducer,
}

impl FestivalDetailReducer {
    /// Creates a new `FestivalDetailReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self {
            participation: ParticipationReducer::new(),
            reviews: ReviewsReducer::new(),
            profiles: ProfileReducer::new(),
        }
    }

    /// Effect fetching the festival snapshot
    fn festival_effect(
        state: &FestivalDetailState,
        env: &DetailEnvironment,
    ) -> Effect<FestivalDetailAction> {
        let gateway = Arc::clone(&env.festivals);
        let festival_id = state.session.festival_id;
        let generation = state.generation;
        Effect::future(async move {
            match gateway.fetch_festival(festival_id).await {
                Ok(festival) => Some(FestivalDetailAction::FestivalLoaded {
                    generation,
                    festival: Box::new(festival),
                }),
                Err(error) => Some(FestivalDetailAction::FestivalLoadFailed {
                    generation,
                    error: error.to_string(),
                }),
            }
        })
    }
}

impl Reducer for FestivalDetailReducer {
    type State = FestivalDetailState;
    type Action = FestivalDetailAction;
    type Environment = DetailEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            FestivalDetailAction::ScreenMounted { session } => {
                state.generation += 1;
                let generation = state.generation;
                state.session = session;
                state.festival = Loadable::Loading;
                state.participation = ParticipationState::new(session, generation);
                state.reviews = ReviewsState::new(session, generation);
                state.profiles = ProfileCacheState::new();

                tracing::debug!(
                    festival_id = %session.festival_id,
                    generation,
                    "festival detail screen mounted"
                );

                // The three initial loads run concurrently; no ordering
                // guarantee between their completions.
                let mut loads = vec![Self::festival_effect(state, env)];
                loads.extend(
                    self.participation
                        .reduce(&mut state.participation, ParticipationAction::Check, env)
                        .into_iter()
                        .map(|e| e.map(FestivalDetailAction::Participation)),
                );
                loads.extend(
                    self.reviews
                        .reduce(&mut state.reviews, ReviewsAction::Load, env)
                        .into_iter()
                        .map(|e| e.map(FestivalDetailAction::Reviews)),
                );

                smallvec![Effect::Parallel(loads)]
            },

            FestivalDetailAction::FestivalLoaded {
                generation,
                festival,
            } => {
                if generation != state.generation {
                    tracing::debug!(generation, "dropping stale festival snapshot");
                    return SmallVec::new();
                }
                state.festival = Loadable::Loaded(*festival);
                SmallVec::new()
            },

            FestivalDetailAction::FestivalLoadFailed { generation, error } => {
                if generation != state.generation {
                    return SmallVec::new();
                }
                tracing::warn!(%error, "festival fetch failed");
                state.festival = Loadable::Failed(error);
                SmallVec::new()
            },

            FestivalDetailAction::Participation(action) => self
                .participation
                .reduce(&mut state.participation, action, env)
                .into_iter()
                .map(|e| e.map(FestivalDetailAction::Participation))
                .collect(),

            FestivalDetailAction::Reviews(action) => {
                let loaded = matches!(action, ReviewsAction::Loaded { .. });

                let mut effects: SmallVec<[Effect<Self::Action>; 4]> = self
                    .reviews
                    .reduce(&mut state.reviews, action, env)
                    .into_iter()
                    .map(|e| e.map(FestivalDetailAction::Reviews))
                    .collect();

                // A fresh list may contain authors the cache has not seen;
                // hydrate them in one deduplicated pass.
                if loaded {
                    let ids: BTreeSet<AccountId> = state
                        .reviews
                        .reviews
                        .iter()
                        .map(|r| r.account_id)
                        .collect();
                    if !ids.is_empty() {
                        effects.extend(
                            self.profiles
                                .reduce(&mut state.profiles, ProfileAction::Resolve { ids }, env)
                                .into_iter()
                                .map(|e| e.map(FestivalDetailAction::Profiles)),
                        );
                    }
                }

                effects
            },

            FestivalDetailAction::Profiles(action) => self
                .profiles
                .reduce(&mut state.profiles, action, env)
                .into_iter()
                .map(|e| e.map(FestivalDetailAction::Profiles))
                .collect(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::gateway::mock::MockBackend;
    use crate::participation::Participation;
    use crate::reviews::ReviewMode;
    use crate::types::{FestivalId, Review, ReviewId};
    use chrono::{TimeZone, Utc};
    use festa_testing::{ReducerTest, assertions, test_clock};

    fn test_env() -> DetailEnvironment {
        DetailEnvironment::with_backend(MockBackend::new(), Arc::new(test_clock()))
    }

    fn session() -> SessionContext {
        SessionContext::new(FestivalId::new(3), Some(AccountId::new(8)))
    }

    fn review(id: i64, account: i64, rating: u8) -> Review {
        Review {
            id: Some(ReviewId::new(id)),
            festival_id: FestivalId::new(3),
            account_id: AccountId::new(account),
            rating,
            comment: String::new(),
            created_at: Utc.with_ymd_and_hms(2025, 5, 20, 9, 0, 0).single(),
            updated_at: None,
            is_edit: false,
        }
    }

    #[test]
    fn mount_fans_out_the_three_loads() {
        ReducerTest::new(FestivalDetailReducer::new())
            .with_env(test_env())
            .given_state(FestivalDetailState::new(session()))
            .when_action(FestivalDetailAction::ScreenMounted { session: session() })
            .then_state(|state| {
                assert_eq!(state.generation, 1);
                assert!(state.festival.is_loading());
                assert_eq!(state.participation.status, Participation::Checking);
                assert!(state.reviews.loading);
            })
            .then_effects(|effects| {
                assert_eq!(effects.len(), 1);
                let Effect::Parallel(loads) = &effects[0] else {
                    unreachable!("mount loads fan out in parallel");
                };
                // festival fetch + participation check + review load
                assert_eq!(loads.len(), 3);
            })
            .run();
    }

    #[test]
    fn guest_mount_skips_the_participation_call() {
        let guest = SessionContext::new(FestivalId::new(3), None);
        ReducerTest::new(FestivalDetailReducer::new())
            .with_env(test_env())
            .given_state(FestivalDetailState::new(guest))
            .when_action(FestivalDetailAction::ScreenMounted { session: guest })
            .then_state(|state| {
                assert_eq!(
                    state.participation.status,
                    Participation::Known {
                        participating: false
                    }
                );
            })
            .then_effects(|effects| {
                let Effect::Parallel(loads) = &effects[0] else {
                    unreachable!("mount loads fan out in parallel");
                };
                // festival fetch + review load only
                assert_eq!(loads.len(), 2);
            })
            .run();
    }

    #[test]
    fn stale_festival_snapshot_is_dropped() {
        let mut state = FestivalDetailState::new(session());
        state.generation = 2;

        ReducerTest::new(FestivalDetailReducer::new())
            .with_env(test_env())
            .given_state(state)
            .when_action(FestivalDetailAction::FestivalLoadFailed {
                generation: 1,
                error: "late failure from a previous mount".to_string(),
            })
            .then_state(|state| assert_eq!(state.festival, Loadable::Idle))
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn festival_failure_does_not_touch_the_other_slices() {
        let reducer = FestivalDetailReducer::new();
        let env = test_env();
        let mut state = FestivalDetailState::new(session());

        let _ = reducer.reduce(
            &mut state,
            FestivalDetailAction::ScreenMounted { session: session() },
            &env,
        );
        let _ = reducer.reduce(
            &mut state,
            FestivalDetailAction::FestivalLoadFailed {
                generation: 1,
                error: "gone".to_string(),
            },
            &env,
        );

        assert!(matches!(state.festival, Loadable::Failed(_)));
        // Reviews and participation keep loading independently
        assert!(state.reviews.loading);
        assert_eq!(state.participation.status, Participation::Checking);
    }

    #[test]
    fn loaded_reviews_hydrate_unseen_authors_once() {
        let reducer = FestivalDetailReducer::new();
        let env = test_env();
        let mut state = FestivalDetailState::new(session());
        state.generation = 1;
        state.reviews.generation = 1;

        let effects = reducer.reduce(
            &mut state,
            FestivalDetailAction::Reviews(ReviewsAction::Loaded {
                generation: 1,
                reviews: vec![review(1, 20, 4), review(2, 21, 5), review(3, 20, 1)],
            }),
            &env,
        );

        // One parallel profile fan-out with one lookup per distinct author
        assert_eq!(effects.len(), 1);
        let Effect::Parallel(lookups) = &effects[0] else {
            unreachable!("profile resolution fans out in parallel");
        };
        assert_eq!(lookups.len(), 2);

        // A second identical load issues nothing: both authors are settled
        let effects = reducer.reduce(
            &mut state,
            FestivalDetailAction::Reviews(ReviewsAction::Loaded {
                generation: 1,
                reviews: vec![review(1, 20, 4), review(2, 21, 5)],
            }),
            &env,
        );
        assert!(effects.is_empty());
    }

    #[test]
    fn reviews_mode_follows_the_viewer() {
        let reducer = FestivalDetailReducer::new();
        let env = test_env();

        // User 8 owns review 2
        let mut state = FestivalDetailState::new(session());
        state.generation = 1;
        state.reviews.generation = 1;
        let _ = reducer.reduce(
            &mut state,
            FestivalDetailAction::Reviews(ReviewsAction::Loaded {
                generation: 1,
                reviews: vec![review(2, 8, 4)],
            }),
            &env,
        );
        assert_eq!(state.reviews.mode, ReviewMode::Viewing);
        assert!(state.reviews.my_review.is_some());

        // A different viewer sees the same list with an empty compose slot
        let other = SessionContext::new(FestivalId::new(3), Some(AccountId::new(9)));
        let mut state = FestivalDetailState::new(other);
        state.generation = 1;
        state.reviews.generation = 1;
        let _ = reducer.reduce(
            &mut state,
            FestivalDetailAction::Reviews(ReviewsAction::Loaded {
                generation: 1,
                reviews: vec![review(2, 8, 4)],
            }),
            &env,
        );
        assert_eq!(state.reviews.mode, ReviewMode::Composing);
        assert!(state.reviews.my_review.is_none());
        assert_eq!(state.reviews.count(), 1);
    }

    #[test]
    fn display_name_falls_back_while_resolving() {
        let state = FestivalDetailState::new(session());
        assert_eq!(state.display_name(AccountId::new(42)), "User #42");
    }
}
