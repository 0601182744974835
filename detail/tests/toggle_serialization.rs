//! Participation toggle: serialized mutations, confirm-then-apply.

#![allow(clippy::unwrap_used, clippy::panic)]

mod support;

use festa_core::environment::Clock;
use festa_detail::gateway::mock::MockBackend;
use festa_detail::prelude::*;
use support::*;

fn toggle() -> FestivalDetailAction {
    FestivalDetailAction::Participation(ParticipationAction::ToggleRequested)
}

#[tokio::test]
async fn second_toggle_while_first_is_in_flight_is_rejected() {
    let backend = MockBackend::new().with_festival(festival());
    let gate = backend.hold_participation();
    let store = store_with(&backend, session());

    mount(&store, session()).await;
    wait_until(&store, |s| {
        matches!(s.participation.status, Participation::Known { .. })
    })
    .await;

    // First toggle goes out and stays held at the backend
    store.send(toggle()).await.unwrap();
    assert!(matches!(
        store.state(|s| s.participation.status).await,
        Participation::Toggling { .. }
    ));

    // Second toggle is rejected, not interleaved
    store.send(toggle()).await.unwrap();
    assert_eq!(
        store.state(|s| s.participation.last_error.clone()).await,
        Some(DetailError::OperationInProgress)
    );

    // Release the held mutation; exactly one toggle lands
    gate.notify_one();
    wait_until(&store, |s| {
        s.participation.status == Participation::Known {
            participating: true,
        }
    })
    .await;

    assert_eq!(backend.participation_mutation_calls(), 1);
    assert!(store.state(|s| s.participation.is_participating()).await);
}

#[tokio::test]
async fn registering_inside_the_window_flips_after_confirmation() {
    // Published festival, the test clock sits inside the registration
    // window, user not participating
    let backend = MockBackend::new().with_festival(festival());
    let store = store_with(&backend, session());

    mount(&store, session()).await;
    wait_until(&store, |s| {
        s.participation.status
            == Participation::Known {
                participating: false,
            }
    })
    .await;

    let now = festa_testing::test_clock().now();
    assert_eq!(
        store.state(move |s| s.registration_gate(now)).await,
        Some(RegistrationGate::Open)
    );

    store.send(toggle()).await.unwrap();
    wait_until(&store, |s| s.participation.is_participating()).await;

    // The control now reads as "withdraw": the flag is confirmed true
    assert_eq!(backend.participation_mutation_calls(), 1);
}

#[tokio::test]
async fn withdrawing_deletes_the_participation_row() {
    let backend = MockBackend::new()
        .with_festival(festival())
        .with_participation(true);
    let store = store_with(&backend, session());

    mount(&store, session()).await;
    wait_until(&store, |s| {
        s.participation.status == Participation::Known { participating: true }
    })
    .await;

    store.send(toggle()).await.unwrap();
    wait_until(&store, |s| {
        s.participation.status
            == Participation::Known {
                participating: false,
            }
    })
    .await;

    assert_eq!(backend.participation_mutation_calls(), 1);
}

#[tokio::test]
async fn failed_toggle_leaves_the_flag_unchanged() {
    let backend = MockBackend::new().with_festival(festival());
    backend.fail_participation_mutations();
    let store = store_with(&backend, session());

    mount(&store, session()).await;
    wait_until(&store, |s| {
        matches!(s.participation.status, Participation::Known { .. })
    })
    .await;

    store.send(toggle()).await.unwrap();
    wait_until(&store, |s| s.participation.last_error.is_some()).await;

    let state = store.state(Clone::clone).await;
    // Confirm-then-apply: no optimistic flip to roll back
    assert_eq!(
        state.participation.status,
        Participation::Known {
            participating: false,
        }
    );
    assert!(matches!(
        state.participation.last_error,
        Some(DetailError::NetworkFailure(_))
    ));
}

#[tokio::test]
async fn guest_toggle_is_rejected_without_a_network_call() {
    let backend = MockBackend::new().with_festival(festival());
    let store = store_with(&backend, guest_session());

    mount(&store, guest_session()).await;
    store.send(toggle()).await.unwrap();

    assert_eq!(
        store.state(|s| s.participation.last_error.clone()).await,
        Some(DetailError::NotAuthenticated)
    );
    assert_eq!(backend.participation_mutation_calls(), 0);
}
