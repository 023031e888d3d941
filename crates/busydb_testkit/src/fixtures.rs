//! Test fixtures and service helpers.
//!
//! Provides convenience functions for setting up services and common test
//! scenarios.

use busydb_core::{Config, PersistenceService};

/// A service built for a single test.
pub struct TestService {
    /// The service instance.
    pub service: PersistenceService,
}

impl TestService {
    /// Creates a service with the default configuration.
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Creates a service with a custom configuration.
    pub fn with_config(config: Config) -> Self {
        Self {
            service: PersistenceService::with_config(config)
                .expect("Failed to build persistence service"),
        }
    }

    /// Unwraps the service, e.g. to share it behind an `Arc`.
    pub fn into_inner(self) -> PersistenceService {
        self.service
    }
}

impl Default for TestService {
    fn default() -> Self {
        Self::new()
    }
}

impl std::ops::Deref for TestService {
    type Target = PersistenceService;

    fn deref(&self) -> &Self::Target {
        &self.service
    }
}

/// Runs a test with a fresh service.
///
/// # Example
///
/// ```rust
/// use busydb_core::Repository;
/// use busydb_testkit::with_service;
///
/// let count = with_service(|service| service.users().count_all());
/// assert_eq!(count, 0);
/// ```
pub fn with_service<F, R>(f: F) -> R
where
    F: FnOnce(&PersistenceService) -> R,
{
    let test_service = TestService::new();
    f(&test_service)
}

/// Test scenario helpers.
pub mod scenarios {
    use super::*;
    use busydb_core::{Category, PersistenceState, Repository, User, WorkItem, WorkItemCategory};

    /// Creates a service holding one user per login.
    ///
    /// Users get ids `1..=logins.len()` in order, and the email
    /// `<login>@example.com`.
    pub fn with_users(logins: &[&str]) -> TestService {
        let test_service = TestService::new();
        let mut users: Vec<User> = logins
            .iter()
            .map(|login| User {
                login: (*login).to_owned(),
                email: format!("{login}@example.com"),
                ..User::default()
            })
            .collect();

        test_service
            .users()
            .upsert(&mut users, &[User::by_login(), User::by_email()])
            .expect("Failed to seed users");

        test_service
    }

    /// Creates a busy list for `owner`: the user, `item_count` work items,
    /// the named categories, and every item linked to the first category.
    pub fn busy_list(owner: &str, item_count: usize, categories: &[&str]) -> TestService {
        let test_service = with_users(&[owner]);

        let mut items: Vec<WorkItem> = (0..item_count)
            .map(|i| WorkItem {
                title: format!("item {i}"),
                owning_login: owner.to_owned(),
                ..WorkItem::default()
            })
            .collect();
        test_service
            .work_items()
            .upsert(&mut items, &[])
            .expect("Failed to seed work items");

        let mut owned: Vec<Category> = categories
            .iter()
            .map(|name| Category {
                owning_user_name: owner.to_owned(),
                name: (*name).to_owned(),
                ..Category::default()
            })
            .collect();
        test_service
            .categories()
            .upsert(&mut owned, &[Category::by_owner_and_name()])
            .expect("Failed to seed categories");

        if let Some(first) = owned.first().and_then(|c| c.id()) {
            let mut links: Vec<WorkItemCategory> = items
                .iter()
                .filter_map(|item| item.id())
                .map(|item_id| WorkItemCategory::link(item_id, first))
                .collect();
            test_service
                .work_item_categories()
                .upsert(&mut links, &[WorkItemCategory::by_link()])
                .expect("Failed to seed links");
        }

        test_service
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use busydb_core::{PersistenceState, RecordId, Repository};

    #[test]
    fn test_fresh_service() {
        let test_service = TestService::new();
        assert_eq!(test_service.users().count_all(), 0);
        assert_eq!(test_service.kinds().len(), 7);
    }

    #[test]
    fn test_with_service() {
        let kinds = with_service(|service| service.kinds());
        assert!(kinds.contains(&"User".to_owned()));
    }

    #[test]
    fn test_users_scenario() {
        let test_service = scenarios::with_users(&["alice", "bob"]);
        let bob = test_service
            .users()
            .get_single(&|u| u.login == "bob")
            .unwrap();
        assert_eq!(bob.id(), Some(RecordId::new(2)));
        assert_eq!(bob.email, "bob@example.com");
    }

    #[test]
    fn test_busy_list_scenario() {
        let test_service = scenarios::busy_list("alice", 3, &["home", "work"]);
        assert_eq!(test_service.work_items().count_all(), 3);
        assert_eq!(test_service.categories().count_all(), 2);
        assert_eq!(
            test_service
                .work_item_categories()
                .count(&|l| l.category_id == Some(RecordId::new(1))),
            3
        );
    }
}
