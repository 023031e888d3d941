//! Busy list entities: work items, categories and their links.

use crate::entity::{Identity, PersistenceState, RecordId};
use crate::table::UniqueKey;
use serde::Serialize;

/// A todo entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WorkItem {
    /// Record identity.
    #[serde(rename = "id")]
    pub identity: Identity<WorkItem>,
    /// Title.
    pub title: String,
    /// Description.
    pub description: String,
    /// Whether the item is done.
    pub done: bool,
    /// Login of the owner.
    pub owning_login: String,
}

impl PersistenceState for WorkItem {
    const KIND: &'static str = "WorkItem";

    fn identity(&self) -> &Identity<Self> {
        &self.identity
    }

    fn identity_mut(&mut self) -> &mut Identity<Self> {
        &mut self.identity
    }
}

/// A category owned by a user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Category {
    /// Record identity.
    #[serde(rename = "id")]
    pub identity: Identity<Category>,
    /// Login of the owner.
    pub owning_user_name: String,
    /// Category name.
    pub name: String,
}

impl PersistenceState for Category {
    const KIND: &'static str = "Category";

    fn identity(&self) -> &Identity<Self> {
        &self.identity
    }

    fn identity_mut(&mut self) -> &mut Identity<Self> {
        &mut self.identity
    }
}

impl Category {
    /// A user cannot have two categories with the same name.
    pub fn by_owner_and_name() -> UniqueKey<Self> {
        UniqueKey::new("owning_user_name_and_name", |c: &Category| {
            (c.owning_user_name.clone(), c.name.clone())
        })
    }
}

/// Link between a work item and a category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WorkItemCategory {
    /// Record identity.
    #[serde(rename = "id")]
    pub identity: Identity<WorkItemCategory>,
    /// Linked work item.
    pub work_item_id: Option<RecordId>,
    /// Linked category.
    pub category_id: Option<RecordId>,
}

impl PersistenceState for WorkItemCategory {
    const KIND: &'static str = "WorkItemCategory";

    fn identity(&self) -> &Identity<Self> {
        &self.identity
    }

    fn identity_mut(&mut self) -> &mut Identity<Self> {
        &mut self.identity
    }
}

impl WorkItemCategory {
    /// Creates a detached link.
    #[must_use]
    pub fn link(work_item_id: RecordId, category_id: RecordId) -> Self {
        Self {
            identity: Identity::detached(),
            work_item_id: Some(work_item_id),
            category_id: Some(category_id),
        }
    }

    /// A work item is linked to a category at most once.
    pub fn by_link() -> UniqueKey<Self> {
        UniqueKey::new("work_item_and_category", |l: &WorkItemCategory| {
            (l.work_item_id, l.category_id)
        })
    }
}
