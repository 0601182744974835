//! Shared fixtures for the festival-detail integration tests.

#![allow(dead_code)] // each test binary uses the subset it needs

use chrono::{TimeZone, Utc};
use festa_detail::environment::DetailEnvironment;
use festa_detail::gateway::mock::MockBackend;
use festa_detail::prelude::*;
use festa_runtime::Store;
use std::sync::Arc;
use std::time::Duration;

/// The store type every test drives
pub type DetailStore =
    Store<FestivalDetailState, FestivalDetailAction, DetailEnvironment, FestivalDetailReducer>;

/// Festival id all fixtures use
pub const FESTIVAL: i64 = 3;

/// Account id of "the" signed-in test user
pub const ME: i64 = 8;

/// Signed-in session for the fixture festival
pub fn session() -> SessionContext {
    SessionContext::new(FestivalId::new(FESTIVAL), Some(AccountId::new(ME)))
}

/// Guest session for the fixture festival
pub fn guest_session() -> SessionContext {
    SessionContext::new(FestivalId::new(FESTIVAL), None)
}

/// A published festival whose registration window contains the test clock
/// (2025-06-01 12:00)
pub fn festival() -> Festival {
    Festival {
        festival_id: FestivalId::new(FESTIVAL),
        school_id: 1,
        festival_name: "Spring Food Fest".to_string(),
        theme: "Street food".to_string(),
        description: String::new(),
        status: FestivalStatus::Published,
        start_date: Utc.with_ymd_and_hms(2025, 6, 10, 8, 0, 0).single().unwrap(),
        end_date: Utc.with_ymd_and_hms(2025, 6, 12, 18, 0, 0).single().unwrap(),
        registration_start_date: Utc.with_ymd_and_hms(2025, 5, 1, 0, 0, 0).single().unwrap(),
        registration_end_date: Utc.with_ymd_and_hms(2025, 6, 5, 0, 0, 0).single().unwrap(),
        location: "Main campus".to_string(),
        max_food_booths: 20,
        max_beverage_booths: 10,
        registered_food_booths: 5,
        registered_beverage_booths: 2,
        total_registered_participants: 140,
        cancellation_reason: None,
        images: Vec::new(),
        maps: Vec::new(),
        menus: Vec::new(),
    }
}

/// A review row for the fixture festival
pub fn review(id: Option<i64>, account: i64, rating: u8, comment: &str) -> Review {
    Review {
        id: id.map(ReviewId::new),
        festival_id: FestivalId::new(FESTIVAL),
        account_id: AccountId::new(account),
        rating,
        comment: comment.to_string(),
        created_at: Utc.with_ymd_and_hms(2025, 5, 20, 9, 0, 0).single(),
        updated_at: None,
        is_edit: false,
    }
}

/// A resolvable author profile
pub fn profile(account: i64, name: &str) -> AuthorProfile {
    AuthorProfile {
        account_id: AccountId::new(account),
        display_name: name.to_string(),
        avatar_url: None,
    }
}

/// Store wired to the given backend and the fixed test clock
pub fn store_with(backend: &MockBackend, session: SessionContext) -> DetailStore {
    let env = DetailEnvironment::with_backend(
        backend.clone(),
        Arc::new(festa_testing::test_clock()),
    );
    Store::new(
        FestivalDetailState::new(session),
        FestivalDetailReducer::new(),
        env,
    )
}

/// Mount the screen and wait for the initial fan-out to settle
pub async fn mount(store: &DetailStore, session: SessionContext) {
    let mut handle = store
        .send(FestivalDetailAction::ScreenMounted { session })
        .await
        .unwrap();
    handle
        .wait_with_timeout(Duration::from_secs(5))
        .await
        .unwrap();
}

/// Poll the store until the predicate holds
///
/// Completions cascade through feedback sends, so tests wait on observable
/// state instead of effect bookkeeping.
pub async fn wait_until<F>(store: &DetailStore, predicate: F)
where
    F: Fn(&FestivalDetailState) -> bool,
{
    for _ in 0..200 {
        if store.state(&predicate).await {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not met within 2s");
}
