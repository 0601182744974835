//! Participation flag for one (festival, account) pair.
//!
//! Tracks whether the signed-in user registered interest in the festival
//! and exposes a toggle that is serialized: a second toggle issued while
//! one is in flight is rejected instead of racing, because a double-toggle
//! could desynchronize client and server state.
//!
//! The flag flips only after server confirmation. On failure the state is
//! left unchanged and the error is surfaced for user-facing messaging.

use crate::environment::DetailEnvironment;
use crate::error::DetailError;
use crate::types::{Festival, FestivalStatus, SessionContext};
use chrono::{DateTime, Utc};
use festa_core::{Effect, Reducer, SmallVec, smallvec};
use std::sync::Arc;

/// Lifecycle of the participation flag
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Participation {
    /// Not checked yet
    #[default]
    Unknown,
    /// Remote check in flight
    Checking,
    /// Check answered
    Known {
        /// Whether a participation row exists
        participating: bool,
    },
    /// Mutation in flight; holds the pre-toggle value
    Toggling {
        /// The confirmed value before the toggle was issued
        participating: bool,
    },
}

/// Participation slice of the screen state
#[derive(Clone, Debug)]
pub struct ParticipationState {
    /// Which festival, and who is looking
    pub session: SessionContext,
    /// Mount generation; stale completions are dropped
    pub generation: u64,
    /// Current flag lifecycle
    pub status: Participation,
    /// Last surfaced error, for the screen to translate
    pub last_error: Option<DetailError>,
}

impl ParticipationState {
    /// Fresh state for a mount
    #[must_use]
    pub const fn new(session: SessionContext, generation: u64) -> Self {
        Self {
            session,
            generation,
            status: Participation::Unknown,
            last_error: None,
        }
    }

    /// Whether the user is currently registered (pre-toggle value while toggling)
    #[must_use]
    pub const fn is_participating(&self) -> bool {
        match self.status {
            Participation::Known { participating } | Participation::Toggling { participating } => {
                participating
            },
            Participation::Unknown | Participation::Checking => false,
        }
    }
}

/// Actions for the participation tracker
#[derive(Clone, Debug)]
pub enum ParticipationAction {
    /// Query the remote participation status
    Check,
    /// The check answered
    CheckCompleted {
        /// Mount generation the check was issued under
        generation: u64,
        /// Whether a participation row exists
        participating: bool,
    },
    /// The check failed
    CheckFailed {
        /// Mount generation the check was issued under
        generation: u64,
        /// Failure description
        error: String,
    },
    /// User tapped the register/withdraw control
    ToggleRequested,
    /// The mutation was confirmed by the server
    ToggleCompleted {
        /// Mount generation the toggle was issued under
        generation: u64,
        /// The new confirmed value
        participating: bool,
    },
    /// The mutation failed
    ToggleFailed {
        /// Mount generation the toggle was issued under
        generation: u64,
        /// Failure to surface
        error: DetailError,
    },
}

/// Why registration is (or is not) currently possible.
///
/// A purely local predicate used to disable the control preemptively and
/// phrase the notice under it; the server stays the source of truth, so a
/// rejection from a stale client clock surfaces as a normal error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RegistrationGate {
    /// Registration is open right now
    Open,
    /// The festival is not in a registrable status
    NotPublished,
    /// The window has not opened yet
    NotYetOpen {
        /// When it opens
        opens_at: DateTime<Utc>,
    },
    /// The window already closed
    Closed {
        /// When it closed
        closed_at: DateTime<Utc>,
    },
}

impl RegistrationGate {
    /// Whether the control should be enabled
    #[must_use]
    pub const fn is_open(&self) -> bool {
        matches!(self, Self::Open)
    }
}

/// Evaluates the registration window for a festival at the given instant
#[must_use]
pub fn registration_gate(festival: &Festival, now: DateTime<Utc>) -> RegistrationGate {
    if festival.status != FestivalStatus::Published {
        return RegistrationGate::NotPublished;
    }
    if now < festival.registration_start_date {
        return RegistrationGate::NotYetOpen {
            opens_at: festival.registration_start_date,
        };
    }
    if now > festival.registration_end_date {
        return RegistrationGate::Closed {
            closed_at: festival.registration_end_date,
        };
    }
    RegistrationGate::Open
}

/// Reducer for the participation tracker
#[derive(Clone, Debug, Default)]
pub struct ParticipationReducer;

impl ParticipationReducer {
    /// Creates a new `ParticipationReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Reducer for ParticipationReducer {
    type State = ParticipationState;
    type Action = ParticipationAction;
    type Environment = DetailEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            ParticipationAction::Check => {
                // Guests are never participating; no network call.
                let Some(account_id) = state.session.account_id else {
                    state.status = Participation::Known {
                        participating: false,
                    };
                    return SmallVec::new();
                };

                state.status = Participation::Checking;

                let gateway = Arc::clone(&env.participants);
                let festival_id = state.session.festival_id;
                let generation = state.generation;
                smallvec![Effect::future(async move {
                    match gateway.fetch_participation(festival_id, account_id).await {
                        Ok(participating) => Some(ParticipationAction::CheckCompleted {
                            generation,
                            participating,
                        }),
                        Err(error) => Some(ParticipationAction::CheckFailed {
                            generation,
                            error: error.to_string(),
                        }),
                    }
                })]
            },

            ParticipationAction::CheckCompleted {
                generation,
                participating,
            } => {
                if generation != state.generation {
                    tracing::debug!(generation, "dropping stale participation check");
                    return SmallVec::new();
                }
                state.status = Participation::Known { participating };
                SmallVec::new()
            },

            ParticipationAction::CheckFailed { generation, error } => {
                if generation != state.generation {
                    return SmallVec::new();
                }
                // Degrade to not-participating; the toggle still goes to the
                // server, which stays authoritative.
                tracing::warn!(%error, "participation check failed");
                state.status = Participation::Known {
                    participating: false,
                };
                SmallVec::new()
            },

            ParticipationAction::ToggleRequested => {
                let Some(account_id) = state.session.account_id else {
                    state.last_error = Some(DetailError::NotAuthenticated);
                    return SmallVec::new();
                };

                let participating = match state.status {
                    Participation::Toggling { .. } => {
                        // Serialized: never two mutations racing.
                        state.last_error = Some(DetailError::OperationInProgress);
                        return SmallVec::new();
                    },
                    Participation::Unknown | Participation::Checking => {
                        state.last_error = Some(DetailError::NotAuthenticated);
                        return SmallVec::new();
                    },
                    Participation::Known { participating } => participating,
                };

                state.status = Participation::Toggling { participating };
                state.last_error = None;

                let gateway = Arc::clone(&env.participants);
                let festival_id = state.session.festival_id;
                let generation = state.generation;
                smallvec![Effect::future(async move {
                    let result = if participating {
                        gateway.delete_participation(festival_id, account_id).await
                    } else {
                        gateway.create_participation(festival_id, account_id).await
                    };
                    match result {
                        Ok(()) => Some(ParticipationAction::ToggleCompleted {
                            generation,
                            participating: !participating,
                        }),
                        Err(error) => Some(ParticipationAction::ToggleFailed {
                            generation,
                            error: error.into(),
                        }),
                    }
                })]
            },

            ParticipationAction::ToggleCompleted {
                generation,
                participating,
            } => {
                if generation != state.generation {
                    return SmallVec::new();
                }
                // Confirm-then-apply: this is the only place the flag flips.
                state.status = Participation::Known { participating };
                state.last_error = None;
                SmallVec::new()
            },

            ParticipationAction::ToggleFailed { generation, error } => {
                if generation != state.generation {
                    return SmallVec::new();
                }
                tracing::warn!(%error, "participation toggle failed");
                if let Participation::Toggling { participating } = state.status {
                    state.status = Participation::Known { participating };
                }
                state.last_error = Some(error);
                SmallVec::new()
            },
        }
    }
}
