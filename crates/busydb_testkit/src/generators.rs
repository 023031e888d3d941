//! Property-based test generators using proptest.
//!
//! Provides strategies for generating detached entity drafts and sequences
//! of table operations.

use busydb_core::{Category, User, UserRole, WorkItem};
use proptest::prelude::*;

/// Strategy for generating valid logins.
pub fn login_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][a-z0-9_]{2,11}").expect("Invalid regex")
}

/// Strategy for generating email addresses.
pub fn email_strategy() -> impl Strategy<Value = String> {
    (
        prop::string::string_regex("[a-z]{1,8}").expect("Invalid regex"),
        prop::sample::select(vec!["example.com", "example.org", "busylist.test"]),
    )
        .prop_map(|(local, domain)| format!("{local}@{domain}"))
}

/// Strategy for generating user roles.
pub fn role_strategy() -> impl Strategy<Value = UserRole> {
    prop_oneof![Just(UserRole::User), Just(UserRole::Administrator)]
}

/// Strategy for generating detached user drafts.
pub fn user_draft_strategy() -> impl Strategy<Value = User> {
    (
        login_strategy(),
        role_strategy(),
        "[A-Z][a-z]{0,9}",
        "[A-Z][a-z]{0,9}",
        email_strategy(),
    )
        .prop_map(|(login, role, first_name, surname, email)| User {
            login,
            role,
            first_name,
            surname,
            email,
            ..User::default()
        })
}

/// Strategy for generating between `min` and `max` distinct logins.
pub fn distinct_logins_strategy(min: usize, max: usize) -> impl Strategy<Value = Vec<String>> {
    prop::collection::hash_set(login_strategy(), min..=max)
        .prop_map(|logins| logins.into_iter().collect())
}

/// Strategy for generating detached work items of `owner`.
pub fn work_item_strategy(owner: String) -> impl Strategy<Value = WorkItem> {
    ("[a-z ]{1,24}", "[a-z ]{0,48}", any::<bool>()).prop_map(move |(title, description, done)| {
        WorkItem {
            title,
            description,
            done,
            owning_login: owner.clone(),
            ..WorkItem::default()
        }
    })
}

/// Strategy for generating detached categories.
pub fn category_strategy() -> impl Strategy<Value = Category> {
    (login_strategy(), "[a-z]{1,10}").prop_map(|(owning_user_name, name)| Category {
        owning_user_name,
        name,
        ..Category::default()
    })
}

/// An operation against the user table.
///
/// Indexes select among the records that exist when the operation runs,
/// modulo their number.
#[derive(Debug, Clone)]
pub enum UserOperation {
    /// Upsert a new user.
    Insert {
        /// Login of the new user.
        login: String,
    },
    /// Change the email of an existing user.
    UpdateEmail {
        /// Which existing user.
        index: usize,
        /// New email.
        email: String,
    },
    /// Rename an existing user.
    Rename {
        /// Which existing user.
        index: usize,
        /// New login.
        login: String,
    },
    /// Delete an existing user.
    Delete {
        /// Which existing user.
        index: usize,
    },
}

/// Strategy for generating a single user operation.
pub fn user_operation_strategy() -> impl Strategy<Value = UserOperation> {
    prop_oneof![
        3 => login_strategy().prop_map(|login| UserOperation::Insert { login }),
        2 => (any::<usize>(), email_strategy())
            .prop_map(|(index, email)| UserOperation::UpdateEmail { index, email }),
        1 => (any::<usize>(), login_strategy())
            .prop_map(|(index, login)| UserOperation::Rename { index, login }),
        1 => any::<usize>().prop_map(|index| UserOperation::Delete { index }),
    ]
}

/// Strategy for generating a sequence of user operations.
pub fn user_operations_strategy(max_ops: usize) -> impl Strategy<Value = Vec<UserOperation>> {
    prop::collection::vec(user_operation_strategy(), 0..max_ops)
}

#[cfg(test)]
mod tests {
    use super::*;
    use busydb_core::PersistenceState;

    proptest! {
        #[test]
        fn test_login_strategy(login in login_strategy()) {
            prop_assert!(login.len() >= 3 && login.len() <= 12);
            prop_assert!(login.chars().next().unwrap().is_ascii_lowercase());
        }

        #[test]
        fn test_user_drafts_are_detached(user in user_draft_strategy()) {
            prop_assert!(!user.has_id());
            prop_assert!(user.email.contains('@'));
        }

        #[test]
        fn test_distinct_logins(logins in distinct_logins_strategy(2, 10)) {
            let mut sorted = logins.clone();
            sorted.sort();
            sorted.dedup();
            prop_assert_eq!(sorted.len(), logins.len());
        }

        #[test]
        fn test_operation_sequence(ops in user_operations_strategy(20)) {
            prop_assert!(ops.len() < 20);
        }
    }
}
