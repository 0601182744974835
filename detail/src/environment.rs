//! Environment dependencies for the festival-detail engine.

use crate::gateway::{FestivalGateway, ParticipationGateway, ProfileGateway, ReviewGateway};
use festa_core::environment::Clock;
use std::sync::Arc;

/// Injected dependencies for the festival-detail reducers.
///
/// Everything the engine needs from the outside world: the four remote
/// gateways and a clock. Reducers capture `Arc` clones of the gateways in
/// their effects; nothing reaches for a global.
#[derive(Clone)]
pub struct DetailEnvironment {
    /// Festival snapshot fetches
    pub festivals: Arc<dyn FestivalGateway>,
    /// Participation reads and mutations
    pub participants: Arc<dyn ParticipationGateway>,
    /// Review reads and mutations
    pub reviews: Arc<dyn ReviewGateway>,
    /// Author profile lookups
    pub profiles: Arc<dyn ProfileGateway>,
    /// Time source for the registration-window predicate
    pub clock: Arc<dyn Clock>,
}

impl DetailEnvironment {
    /// Creates an environment from individual gateways
    #[must_use]
    pub fn new(
        festivals: Arc<dyn FestivalGateway>,
        participants: Arc<dyn ParticipationGateway>,
        reviews: Arc<dyn ReviewGateway>,
        profiles: Arc<dyn ProfileGateway>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            festivals,
            participants,
            reviews,
            profiles,
            clock,
        }
    }

    /// Creates an environment from one backend implementing all four gateways
    ///
    /// Convenient for the production API client and the in-memory mock,
    /// both of which speak every gateway.
    #[must_use]
    pub fn with_backend<B>(backend: B, clock: Arc<dyn Clock>) -> Self
    where
        B: FestivalGateway
            + ParticipationGateway
            + ReviewGateway
            + ProfileGateway
            + Clone
            + 'static,
    {
        Self {
            festivals: Arc::new(backend.clone()),
            participants: Arc::new(backend.clone()),
            reviews: Arc::new(backend.clone()),
            profiles: Arc::new(backend),
            clock,
        }
    }
}
