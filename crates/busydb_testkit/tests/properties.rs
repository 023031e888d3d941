//! Property tests for the repository contract.

use busydb_core::{PersistenceState, RecordId, Repository, User};
use busydb_testkit::prelude::*;
use proptest::prelude::*;
use std::collections::BTreeMap;

fn nth_id(model: &BTreeMap<RecordId, User>, index: usize) -> Option<RecordId> {
    if model.is_empty() {
        return None;
    }
    model.keys().nth(index % model.len()).copied()
}

fn login_taken(model: &BTreeMap<RecordId, User>, login: &str, except: Option<RecordId>) -> bool {
    model
        .iter()
        .any(|(id, user)| user.login == login && Some(*id) != except)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// The table behaves like a map keyed by id with a unique login column.
    #[test]
    fn table_matches_model(ops in user_operations_strategy(40)) {
        let service = TestService::new();
        let users = service.users();
        let keys = [User::by_login()];
        let mut model: BTreeMap<RecordId, User> = BTreeMap::new();
        let mut last_issued = 0u64;

        for op in ops {
            match op {
                UserOperation::Insert { login } => {
                    let mut draft = users.create();
                    draft.login = login.clone();
                    let result = users.upsert_one(&mut draft, &keys);

                    let id = draft.id().unwrap();
                    prop_assert!(id.as_u64() > last_issued);
                    last_issued = id.as_u64();

                    if login_taken(&model, &login, None) {
                        prop_assert!(result.unwrap_err().is_constraint_violation());
                    } else {
                        prop_assert!(result.is_ok());
                        model.insert(id, draft);
                    }
                }
                UserOperation::UpdateEmail { index, email } => {
                    let Some(id) = nth_id(&model, index) else { continue };
                    let mut stored = users.get_by_id(id).unwrap();
                    stored.email = email;
                    users.upsert_one(&mut stored, &keys).unwrap();
                    prop_assert_eq!(stored.id(), Some(id));
                    model.insert(id, stored);
                }
                UserOperation::Rename { index, login } => {
                    let Some(id) = nth_id(&model, index) else { continue };
                    let mut stored = users.get_by_id(id).unwrap();
                    stored.login = login.clone();
                    let result = users.upsert_one(&mut stored, &keys);

                    if login_taken(&model, &login, Some(id)) {
                        prop_assert!(result.is_err());
                    } else {
                        prop_assert!(result.is_ok());
                        model.insert(id, stored);
                    }
                }
                UserOperation::Delete { index } => {
                    let Some(id) = nth_id(&model, index) else { continue };
                    let stored = users.get_by_id(id).unwrap();
                    prop_assert_eq!(users.delete(&stored), 1);
                    model.remove(&id);
                }
            }

            let expected: Vec<User> = model.values().cloned().collect();
            prop_assert_eq!(users.get_all(), expected);
        }
    }

    /// Mutating states on either side of the store never leaks across.
    #[test]
    fn copies_are_isolated(drafts in prop::collection::vec(user_draft_strategy(), 1..10)) {
        let service = TestService::new();
        let users = service.users();

        let mut drafts = drafts;
        users.upsert(&mut drafts, &[]).unwrap();
        let snapshot = users.get_all();

        for draft in &mut drafts {
            draft.login.push_str("_local");
        }
        let mut read = users.get_all();
        for user in &mut read {
            user.surname.push_str("_read");
        }

        prop_assert_eq!(users.get_all(), snapshot);
    }

    /// Ids of a kind strictly increase, whatever the batch shapes.
    #[test]
    fn ids_strictly_increase(batches in prop::collection::vec(1usize..8, 1..10)) {
        let service = TestService::new();
        let mut last = 0u64;

        for size in batches {
            let mut items: Vec<_> = (0..size).map(|_| service.work_items().create()).collect();
            service.work_items().upsert(&mut items, &[]).unwrap();
            for item in &items {
                let id = item.id().unwrap().as_u64();
                prop_assert!(id > last);
                last = id;
            }
        }

        prop_assert_eq!(service.seeds().current("WorkItem"), Some(last));
        prop_assert_eq!(service.seeds().current("User"), Some(0));
    }

    /// A batch with a duplicate login is rejected as a whole.
    #[test]
    fn duplicate_in_batch_rejects_everything(
        logins in distinct_logins_strategy(2, 8),
        dup in any::<prop::sample::Index>(),
    ) {
        let service = TestService::new();
        let users = service.users();

        let mut batch: Vec<User> = logins
            .iter()
            .map(|login| User { login: login.clone(), ..User::default() })
            .collect();
        let copy = batch[dup.index(batch.len())].login.clone();
        batch.push(User { login: copy, ..User::default() });

        let result = users.upsert(&mut batch, &[User::by_login()]);
        prop_assert!(result.unwrap_err().is_constraint_violation());
        prop_assert_eq!(users.count_all(), 0);
        prop_assert!(batch.iter().all(|u| u.has_id()));
    }

    /// Deleting by predicate removes exactly the matching records.
    #[test]
    fn delete_where_removes_matching(drafts in prop::collection::vec(user_draft_strategy(), 0..20)) {
        let service = TestService::new();
        let users = service.users();
        let mut drafts = drafts;
        users.upsert(&mut drafts, &[]).unwrap();

        let is_admin = |u: &User| u.role == busydb_core::UserRole::Administrator;
        let admins = users.count(&is_admin);
        let total = users.count_all();

        prop_assert_eq!(users.delete_where(&is_admin), admins);
        prop_assert_eq!(users.count_all(), total - admins);
        prop_assert_eq!(users.count(&is_admin), 0);
    }
}
