//! Benchmark utilities.

#![warn(missing_docs)]

use busydb_core::{PersistenceService, Repository, User};

/// Generate detached users with distinct logins and emails.
pub fn generate_users(count: usize) -> Vec<User> {
    (0..count)
        .map(|i| User {
            login: format!("user{i}"),
            email: format!("user{i}@example.com"),
            ..User::default()
        })
        .collect()
}

/// Creates a service whose user table holds `count` users.
pub fn populated_service(count: usize) -> PersistenceService {
    let service = PersistenceService::new().expect("Failed to build service");
    let mut users = generate_users(count);
    service
        .users()
        .upsert(&mut users, &[])
        .expect("Failed to populate users");
    service
}
