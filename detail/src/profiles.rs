//! Author-profile cache for review rows.
//!
//! Resolves a set of author account ids to display profiles with at most
//! one network request per id per screen session. Entries never expire
//! within a session and are additively merged, so concurrent resolutions
//! from overlapping review loads cannot erase entries already fetched.

use crate::environment::DetailEnvironment;
use crate::types::{AccountId, AuthorProfile};
use festa_core::{Effect, Reducer, SmallVec, smallvec};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

/// Cached profiles plus the lookups currently in flight
#[derive(Clone, Debug, Default)]
pub struct ProfileCacheState {
    /// Resolved profiles by account id (placeholders included)
    pub profiles: HashMap<AccountId, AuthorProfile>,
    /// Lookups issued but not yet answered
    pub in_flight: HashSet<AccountId>,
}

impl ProfileCacheState {
    /// Creates an empty cache
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pure read of a resolved profile
    #[must_use]
    pub fn get(&self, account_id: AccountId) -> Option<&AuthorProfile> {
        self.profiles.get(&account_id)
    }

    /// Whether the id is resolved or currently being resolved
    #[must_use]
    pub fn is_settled(&self, account_id: AccountId) -> bool {
        self.profiles.contains_key(&account_id) || self.in_flight.contains(&account_id)
    }
}

/// Actions for the profile cache
#[derive(Clone, Debug)]
pub enum ProfileAction {
    /// Resolve the given ids, skipping ones already known or in flight
    Resolve {
        /// Account ids appearing in the review list
        ids: BTreeSet<AccountId>,
    },
    /// A lookup succeeded
    Resolved {
        /// Account the profile belongs to
        id: AccountId,
        /// The fetched profile
        profile: AuthorProfile,
    },
    /// A lookup failed; the slot resolves to a placeholder
    LookupFailed {
        /// Account whose lookup failed
        id: AccountId,
    },
}

/// Reducer for the profile cache
#[derive(Clone, Debug, Default)]
pub struct ProfileReducer;

impl ProfileReducer {
    /// Creates a new `ProfileReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Reducer for ProfileReducer {
    type State = ProfileCacheState;
    type Action = ProfileAction;
    type Environment = DetailEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            ProfileAction::Resolve { ids } => {
                let missing: Vec<AccountId> = ids
                    .into_iter()
                    .filter(|id| !state.is_settled(*id))
                    .collect();

                if missing.is_empty() {
                    return SmallVec::new();
                }

                // One lookup per id: the backend has no batch endpoint, so
                // the fan-out is parallel per-id futures.
                let lookups = missing
                    .into_iter()
                    .map(|id| {
                        state.in_flight.insert(id);
                        let gateway = Arc::clone(&env.profiles);
                        Effect::future(async move {
                            match gateway.fetch_author_profile(id).await {
                                Ok(profile) => Some(ProfileAction::Resolved { id, profile }),
                                Err(error) => {
                                    tracing::warn!(
                                        account_id = %id,
                                        %error,
                                        "author profile lookup failed, using placeholder"
                                    );
                                    Some(ProfileAction::LookupFailed { id })
                                },
                            }
                        })
                    })
                    .collect();

                smallvec![Effect::Parallel(lookups)]
            },

            ProfileAction::Resolved { id, profile } => {
                // Merge, never replace wholesale: entries fetched by an
                // overlapping resolution must survive.
                state.profiles.insert(id, profile);
                state.in_flight.remove(&id);
                SmallVec::new()
            },

            ProfileAction::LookupFailed { id } => {
                // The placeholder marks the slot resolved, so the id is not
                // retried within this screen session.
                state.profiles.insert(id, AuthorProfile::placeholder(id));
                state.in_flight.remove(&id);
                SmallVec::new()
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::gateway::mock::MockBackend;
    use festa_testing::{ReducerTest, assertions, test_clock};

    fn test_env() -> DetailEnvironment {
        DetailEnvironment::with_backend(MockBackend::new(), Arc::new(test_clock()))
    }

    fn ids(raw: &[i64]) -> BTreeSet<AccountId> {
        raw.iter().copied().map(AccountId::new).collect()
    }

    #[test]
    fn resolve_fans_out_one_lookup_per_unknown_id() {
        ReducerTest::new(ProfileReducer::new())
            .with_env(test_env())
            .given_state(ProfileCacheState::new())
            .when_action(ProfileAction::Resolve { ids: ids(&[1, 2]) })
            .then_state(|state| {
                assert!(state.in_flight.contains(&AccountId::new(1)));
                assert!(state.in_flight.contains(&AccountId::new(2)));
            })
            .then_effects(|effects| {
                assert_eq!(effects.len(), 1);
                let Effect::Parallel(lookups) = &effects[0] else {
                    unreachable!("resolve fans out in parallel");
                };
                assert_eq!(lookups.len(), 2);
            })
            .run();
    }

    #[test]
    fn resolve_skips_known_and_in_flight_ids() {
        let mut state = ProfileCacheState::new();
        state.profiles.insert(
            AccountId::new(2),
            AuthorProfile::placeholder(AccountId::new(2)),
        );
        state.in_flight.insert(AccountId::new(4));

        ReducerTest::new(ProfileReducer::new())
            .with_env(test_env())
            .given_state(state)
            .when_action(ProfileAction::Resolve {
                ids: ids(&[2, 3, 4]),
            })
            .then_effects(|effects| {
                assert_eq!(effects.len(), 1);
                let Effect::Parallel(lookups) = &effects[0] else {
                    unreachable!("resolve fans out in parallel");
                };
                // Only id 3 is actually looked up
                assert_eq!(lookups.len(), 1);
            })
            .run();
    }

    #[test]
    fn resolve_with_nothing_missing_is_a_no_op() {
        let mut state = ProfileCacheState::new();
        state.profiles.insert(
            AccountId::new(1),
            AuthorProfile::placeholder(AccountId::new(1)),
        );

        ReducerTest::new(ProfileReducer::new())
            .with_env(test_env())
            .given_state(state)
            .when_action(ProfileAction::Resolve { ids: ids(&[1]) })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn failed_lookup_stores_placeholder_and_is_not_retried() {
        let reducer = ProfileReducer::new();
        let env = test_env();
        let mut state = ProfileCacheState::new();

        // First resolve issues the lookup
        let effects = reducer.reduce(
            &mut state,
            ProfileAction::Resolve { ids: ids(&[7]) },
            &env,
        );
        assert_eq!(effects.len(), 1);

        // The lookup fails
        let _ = reducer.reduce(
            &mut state,
            ProfileAction::LookupFailed {
                id: AccountId::new(7),
            },
            &env,
        );
        assert_eq!(
            state.get(AccountId::new(7)).unwrap().display_name,
            "User #7"
        );

        // A later resolve for the same id issues nothing
        let effects = reducer.reduce(
            &mut state,
            ProfileAction::Resolve { ids: ids(&[7]) },
            &env,
        );
        assert!(effects.is_empty());
    }

    #[test]
    fn resolved_merges_without_erasing_existing_entries() {
        let mut state = ProfileCacheState::new();
        state.profiles.insert(
            AccountId::new(1),
            AuthorProfile {
                account_id: AccountId::new(1),
                display_name: "An Nguyen".to_string(),
                avatar_url: None,
            },
        );
        state.in_flight.insert(AccountId::new(2));

        ReducerTest::new(ProfileReducer::new())
            .with_env(test_env())
            .given_state(state)
            .when_action(ProfileAction::Resolved {
                id: AccountId::new(2),
                profile: AuthorProfile {
                    account_id: AccountId::new(2),
                    display_name: "Binh Tran".to_string(),
                    avatar_url: Some("https://cdn.example/avatars/2.png".to_string()),
                },
            })
            .then_state(|state| {
                assert_eq!(state.profiles.len(), 2);
                assert_eq!(
                    state.get(AccountId::new(1)).unwrap().display_name,
                    "An Nguyen"
                );
                assert_eq!(
                    state.get(AccountId::new(2)).unwrap().display_name,
                    "Binh Tran"
                );
                assert!(state.in_flight.is_empty());
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }
}
