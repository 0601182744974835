//! # Festa Festival Detail
//!
//! Client-side engine for the festival-detail screen: merges four
//! independently-fetched, independently-mutable resources — the festival
//! snapshot, the current user's participation flag, the review list, and a
//! profile cache keyed by review author — into one consistent view model.
//!
//! ## Structure
//!
//! Each concern is a `State` + `Action` + `Reducer` triple; the
//! [`detail::FestivalDetailReducer`] composes them and owns the cross-slice
//! wiring (mount fan-out, author hydration after a review load, the
//! generation guard against stale completions).
//!
//! - [`profiles`] — memoizing author-profile cache, one lookup per id per
//!   screen session
//! - [`participation`] — participation flag with a serialized,
//!   confirm-then-apply toggle
//! - [`reviews`] — review list plus the "my review" edit machine
//! - [`detail`] — the screen aggregate
//!
//! Remote access goes through the [`gateway`] traits; `festa-api` provides
//! the REST implementation and [`gateway::mock::MockBackend`] the
//! in-memory one.
//!
//! ## Example
//!
//! ```ignore
//! use festa_detail::prelude::*;
//! use festa_runtime::Store;
//!
//! let session = SessionContext::new(festival_id, Some(account_id));
//! let store = Store::new(
//!     FestivalDetailState::new(session),
//!     FestivalDetailReducer::new(),
//!     environment,
//! );
//! store.send(FestivalDetailAction::ScreenMounted { session }).await?;
//! ```

/// The screen aggregate
pub mod detail;
/// Environment dependencies
pub mod environment;
/// Error types
pub mod error;
/// Remote gateway traits and the in-memory mock backend
pub mod gateway;
/// Participation tracker
pub mod participation;
/// Author profile cache
pub mod profiles;
/// Review store
pub mod reviews;
/// Domain types
pub mod types;

/// The types a screen binding needs, in one import
pub mod prelude {
    pub use crate::detail::{FestivalDetailAction, FestivalDetailReducer, FestivalDetailState};
    pub use crate::environment::DetailEnvironment;
    pub use crate::error::DetailError;
    pub use crate::participation::{
        Participation, ParticipationAction, RegistrationGate, registration_gate,
    };
    pub use crate::profiles::ProfileAction;
    pub use crate::reviews::{ReviewMode, ReviewsAction};
    pub use crate::types::{
        AccountId, AuthorProfile, Festival, FestivalId, FestivalStatus, Loadable, Review,
        ReviewId, ReviewKey, Reviewer, SessionContext,
    };
}
