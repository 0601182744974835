//! Remote gateway traits for the festival-detail screen.
//!
//! The engine consumes the REST backend through these narrow interfaces;
//! transport lives elsewhere (`festa-api` in production,
//! [`mock::MockBackend`] in tests). Every method returns success/failure
//! plus payload — the core treats non-2xx and transport failures uniformly
//! and never branches on the failure source.
//!
//! The traits use explicit `Pin<Box<dyn Future>>` returns instead of
//! `async fn` to stay dyn-compatible: reducers create effects that capture
//! an `Arc<dyn …Gateway>`.

use crate::types::{
    AccountId, AuthorProfile, Festival, FestivalId, NewReview, Review, ReviewId,
};
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Boxed future returned by gateway methods
pub type GatewayFuture<T> = Pin<Box<dyn Future<Output = Result<T, GatewayError>> + Send>>;

/// Errors produced by gateway implementations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// Transport failure (connection, timeout, TLS)
    #[error("request failed: {0}")]
    Network(String),

    /// Backend replied with a non-2xx status
    #[error("api error (status {status}): {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Error message from the backend
        message: String,
    },

    /// The addressed resource does not exist
    #[error("resource not found")]
    NotFound,

    /// Response body could not be decoded
    #[error("response parsing failed: {0}")]
    Parse(String),
}

/// Fetches festival snapshots
pub trait FestivalGateway: Send + Sync {
    /// Fetch the full detail snapshot for one festival
    fn fetch_festival(&self, festival_id: FestivalId) -> GatewayFuture<Festival>;
}

/// Reads and mutates participation rows
pub trait ParticipationGateway: Send + Sync {
    /// Whether a participation row exists for (festival, account)
    fn fetch_participation(
        &self,
        festival_id: FestivalId,
        account_id: AccountId,
    ) -> GatewayFuture<bool>;

    /// Register the account for the festival
    fn create_participation(
        &self,
        festival_id: FestivalId,
        account_id: AccountId,
    ) -> GatewayFuture<()>;

    /// Withdraw the account from the festival
    fn delete_participation(
        &self,
        festival_id: FestivalId,
        account_id: AccountId,
    ) -> GatewayFuture<()>;
}

/// Reads and mutates reviews
pub trait ReviewGateway: Send + Sync {
    /// All reviews for a festival, in whatever order the server returns
    fn fetch_reviews(&self, festival_id: FestivalId) -> GatewayFuture<Vec<Review>>;

    /// Create a review; the server assigns id and timestamps
    fn create_review(&self, review: NewReview) -> GatewayFuture<Review>;

    /// Update rating/comment of an existing review
    fn update_review(
        &self,
        review_id: ReviewId,
        rating: u8,
        comment: String,
    ) -> GatewayFuture<Review>;

    /// Delete a review
    fn delete_review(&self, review_id: ReviewId) -> GatewayFuture<()>;
}

/// Resolves account ids to display profiles
pub trait ProfileGateway: Send + Sync {
    /// Display name and avatar for one account
    fn fetch_author_profile(&self, account_id: AccountId) -> GatewayFuture<AuthorProfile>;
}

/// In-memory backend for development and testing.
///
/// Behaves like the real REST backend: reviews are stored in a list the
/// mutations edit (so a reload after create/update/delete observes the
/// server-side truth), participation is a flag, ids are assigned
/// monotonically. Failure injection and call counting cover the dedup and
/// serialization properties the engine is tested against.
pub mod mock {
    use super::{
        AccountId, AuthorProfile, Festival, FestivalId, GatewayError, GatewayFuture, NewReview,
        Review, ReviewId,
    };
    use super::{FestivalGateway, ParticipationGateway, ProfileGateway, ReviewGateway};
    use chrono::{TimeZone, Utc};
    use std::collections::{HashMap, HashSet};
    use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
    use std::sync::{Arc, Mutex};
    use tokio::sync::Notify;

    /// Everything the mock backend remembers, shared by cloned handles
    #[derive(Default)]
    struct MockState {
        festival: Mutex<Option<Festival>>,
        reviews: Mutex<Vec<Review>>,
        participating: Mutex<bool>,
        profiles: Mutex<HashMap<AccountId, AuthorProfile>>,
        failing_profiles: Mutex<HashSet<AccountId>>,
        fail_participation_mutations: AtomicBool,
        fail_review_mutations: AtomicBool,
        hold_participation: Mutex<Option<Arc<Notify>>>,
        next_review_id: AtomicI64,
        // call log
        fetch_festival_calls: AtomicI64,
        fetch_reviews_calls: AtomicI64,
        fetch_participation_calls: AtomicI64,
        create_participation_calls: AtomicI64,
        delete_participation_calls: AtomicI64,
        create_review_calls: AtomicI64,
        update_review_calls: AtomicI64,
        delete_review_calls: AtomicI64,
        profile_fetches: Mutex<Vec<AccountId>>,
    }

    /// Configurable in-memory implementation of all four gateways
    #[derive(Clone, Default)]
    pub struct MockBackend {
        state: Arc<MockState>,
    }

    #[allow(clippy::unwrap_used)] // Mutex poison is unrecoverable in a test backend
    impl MockBackend {
        /// Creates an empty backend (no festival, no reviews, not participating)
        #[must_use]
        pub fn new() -> Self {
            let backend = Self::default();
            backend.state.next_review_id.store(1000, Ordering::SeqCst);
            backend
        }

        /// Seed the festival snapshot
        #[must_use]
        pub fn with_festival(self, festival: Festival) -> Self {
            *self.state.festival.lock().unwrap() = Some(festival);
            self
        }

        /// Seed the review list
        #[must_use]
        pub fn with_reviews(self, reviews: Vec<Review>) -> Self {
            *self.state.reviews.lock().unwrap() = reviews;
            self
        }

        /// Seed the participation flag
        #[must_use]
        pub fn with_participation(self, participating: bool) -> Self {
            *self.state.participating.lock().unwrap() = participating;
            self
        }

        /// Seed a resolvable author profile
        #[must_use]
        pub fn with_profile(self, profile: AuthorProfile) -> Self {
            self.state
                .profiles
                .lock()
                .unwrap()
                .insert(profile.account_id, profile);
            self
        }

        /// Make profile lookups for the given account fail
        #[must_use]
        pub fn with_failing_profile(self, account_id: AccountId) -> Self {
            self.state
                .failing_profiles
                .lock()
                .unwrap()
                .insert(account_id);
            self
        }

        /// Make participation create/delete fail with a 500
        pub fn fail_participation_mutations(&self) {
            self.state
                .fail_participation_mutations
                .store(true, Ordering::SeqCst);
        }

        /// Make review create/update/delete fail with a 500
        pub fn fail_review_mutations(&self) {
            self.state
                .fail_review_mutations
                .store(true, Ordering::SeqCst);
        }

        /// Hold participation mutations until the returned handle is notified.
        ///
        /// Lets a test keep a toggle in flight deterministically while it
        /// issues a second one.
        #[must_use]
        pub fn hold_participation(&self) -> Arc<Notify> {
            let gate = Arc::new(Notify::new());
            *self.state.hold_participation.lock().unwrap() = Some(Arc::clone(&gate));
            gate
        }

        /// The server-side review list as it stands now
        #[must_use]
        pub fn reviews_snapshot(&self) -> Vec<Review> {
            self.state.reviews.lock().unwrap().clone()
        }

        /// How many times a profile fetch was issued for the given account
        #[must_use]
        pub fn profile_fetch_count(&self, account_id: AccountId) -> usize {
            self.state
                .profile_fetches
                .lock()
                .unwrap()
                .iter()
                .filter(|id| **id == account_id)
                .count()
        }

        /// Total review-create calls
        #[must_use]
        pub fn create_review_calls(&self) -> i64 {
            self.state.create_review_calls.load(Ordering::SeqCst)
        }

        /// Total participation mutation calls (create + delete)
        #[must_use]
        pub fn participation_mutation_calls(&self) -> i64 {
            self.state.create_participation_calls.load(Ordering::SeqCst)
                + self.state.delete_participation_calls.load(Ordering::SeqCst)
        }

        fn server_error() -> GatewayError {
            GatewayError::Api {
                status: 500,
                message: "internal server error".to_string(),
            }
        }
    }

    #[allow(clippy::unwrap_used)] // Mutex poison is unrecoverable in a test backend
    impl FestivalGateway for MockBackend {
        fn fetch_festival(&self, _festival_id: FestivalId) -> GatewayFuture<Festival> {
            let state = Arc::clone(&self.state);
            Box::pin(async move {
                state.fetch_festival_calls.fetch_add(1, Ordering::SeqCst);
                state
                    .festival
                    .lock()
                    .unwrap()
                    .clone()
                    .ok_or(GatewayError::NotFound)
            })
        }
    }

    #[allow(clippy::unwrap_used)] // Mutex poison is unrecoverable in a test backend
    impl ParticipationGateway for MockBackend {
        fn fetch_participation(
            &self,
            _festival_id: FestivalId,
            _account_id: AccountId,
        ) -> GatewayFuture<bool> {
            let state = Arc::clone(&self.state);
            Box::pin(async move {
                state
                    .fetch_participation_calls
                    .fetch_add(1, Ordering::SeqCst);
                Ok(*state.participating.lock().unwrap())
            })
        }

        fn create_participation(
            &self,
            _festival_id: FestivalId,
            _account_id: AccountId,
        ) -> GatewayFuture<()> {
            let state = Arc::clone(&self.state);
            Box::pin(async move {
                state
                    .create_participation_calls
                    .fetch_add(1, Ordering::SeqCst);

                let gate = state.hold_participation.lock().unwrap().clone();
                if let Some(gate) = gate {
                    gate.notified().await;
                }

                if state.fail_participation_mutations.load(Ordering::SeqCst) {
                    return Err(MockBackend::server_error());
                }
                *state.participating.lock().unwrap() = true;
                Ok(())
            })
        }

        fn delete_participation(
            &self,
            _festival_id: FestivalId,
            _account_id: AccountId,
        ) -> GatewayFuture<()> {
            let state = Arc::clone(&self.state);
            Box::pin(async move {
                state
                    .delete_participation_calls
                    .fetch_add(1, Ordering::SeqCst);

                let gate = state.hold_participation.lock().unwrap().clone();
                if let Some(gate) = gate {
                    gate.notified().await;
                }

                if state.fail_participation_mutations.load(Ordering::SeqCst) {
                    return Err(MockBackend::server_error());
                }
                *state.participating.lock().unwrap() = false;
                Ok(())
            })
        }
    }

    #[allow(clippy::unwrap_used)] // Mutex poison is unrecoverable in a test backend
    impl ReviewGateway for MockBackend {
        fn fetch_reviews(&self, _festival_id: FestivalId) -> GatewayFuture<Vec<Review>> {
            let state = Arc::clone(&self.state);
            Box::pin(async move {
                state.fetch_reviews_calls.fetch_add(1, Ordering::SeqCst);
                Ok(state.reviews.lock().unwrap().clone())
            })
        }

        fn create_review(&self, review: NewReview) -> GatewayFuture<Review> {
            let state = Arc::clone(&self.state);
            Box::pin(async move {
                state.create_review_calls.fetch_add(1, Ordering::SeqCst);

                if state.fail_review_mutations.load(Ordering::SeqCst) {
                    return Err(MockBackend::server_error());
                }

                let id = state.next_review_id.fetch_add(1, Ordering::SeqCst);
                let created = Review {
                    id: Some(ReviewId::new(id)),
                    festival_id: review.festival_id,
                    account_id: review.account_id,
                    rating: review.rating,
                    comment: review.comment,
                    created_at: Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).single(),
                    updated_at: None,
                    is_edit: false,
                };
                state.reviews.lock().unwrap().push(created.clone());
                Ok(created)
            })
        }

        fn update_review(
            &self,
            review_id: ReviewId,
            rating: u8,
            comment: String,
        ) -> GatewayFuture<Review> {
            let state = Arc::clone(&self.state);
            Box::pin(async move {
                state.update_review_calls.fetch_add(1, Ordering::SeqCst);

                if state.fail_review_mutations.load(Ordering::SeqCst) {
                    return Err(MockBackend::server_error());
                }

                let mut reviews = state.reviews.lock().unwrap();
                let Some(review) = reviews.iter_mut().find(|r| r.id == Some(review_id)) else {
                    return Err(GatewayError::NotFound);
                };
                review.rating = rating;
                review.comment = comment;
                review.updated_at = Utc.with_ymd_and_hms(2025, 6, 1, 12, 30, 0).single();
                review.is_edit = true;
                Ok(review.clone())
            })
        }

        fn delete_review(&self, review_id: ReviewId) -> GatewayFuture<()> {
            let state = Arc::clone(&self.state);
            Box::pin(async move {
                state.delete_review_calls.fetch_add(1, Ordering::SeqCst);

                if state.fail_review_mutations.load(Ordering::SeqCst) {
                    return Err(MockBackend::server_error());
                }

                let mut reviews = state.reviews.lock().unwrap();
                let before = reviews.len();
                reviews.retain(|r| r.id != Some(review_id));
                if reviews.len() == before {
                    return Err(GatewayError::NotFound);
                }
                Ok(())
            })
        }
    }

    #[allow(clippy::unwrap_used)] // Mutex poison is unrecoverable in a test backend
    impl ProfileGateway for MockBackend {
        fn fetch_author_profile(&self, account_id: AccountId) -> GatewayFuture<AuthorProfile> {
            let state = Arc::clone(&self.state);
            Box::pin(async move {
                state.profile_fetches.lock().unwrap().push(account_id);

                if state.failing_profiles.lock().unwrap().contains(&account_id) {
                    return Err(MockBackend::server_error());
                }

                state
                    .profiles
                    .lock()
                    .unwrap()
                    .get(&account_id)
                    .cloned()
                    .ok_or(GatewayError::NotFound)
            })
        }
    }

}
