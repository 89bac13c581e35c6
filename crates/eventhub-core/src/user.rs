// ABOUTME: Defines the User entity with its group, event wishlist, and favourite categories.
// ABOUTME: Favourite categories behave as a set: adding twice or removing a non-member changes nothing.

use serde::{Deserialize, Serialize};

use crate::category::Category;
use crate::entity::{Entity, EntityId, EntityKind, UNASSIGNED_ID};
use crate::event::Event;
use crate::group::Group;

/// A registered user. The group is a shared reference whose lifetime is
/// independent of the user; wishlist events and favourite categories are
/// memberships, not owned values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    user_id: EntityId,
    pub name: String,
    pub email: String,
    pub group: Group,
    wishlist: Vec<Event>,
    favourite_category: Vec<Category>,
}

impl User {
    /// Create a user with an empty wishlist and no favourite categories.
    pub fn new(user_id: EntityId, name: String, email: String, group: Group) -> Self {
        Self {
            user_id,
            name,
            email,
            group,
            wishlist: Vec::new(),
            favourite_category: Vec::new(),
        }
    }

    pub fn user_id(&self) -> EntityId {
        self.user_id
    }

    pub fn wishlist(&self) -> &[Event] {
        &self.wishlist
    }

    pub fn favourite_categories(&self) -> &[Category] {
        &self.favourite_category
    }

    /// Append an event to the end of the wishlist.
    pub fn add_to_wishlist(&mut self, event: Event) {
        self.wishlist.push(event);
    }

    /// Remove the first wishlist entry with the given event ID. Returns whether
    /// anything was removed.
    pub fn remove_from_wishlist(&mut self, event_id: EntityId) -> bool {
        match self.wishlist.iter().position(|e| e.event_id() == event_id) {
            Some(index) => {
                self.wishlist.remove(index);
                true
            }
            None => false,
        }
    }

    /// Add a favourite category unless an equal one is already present.
    pub fn add_category(&mut self, category: Category) {
        if !self.favourite_category.contains(&category) {
            self.favourite_category.push(category);
        }
    }

    /// Remove a favourite category if present; a non-member is a no-op.
    pub fn remove_category(&mut self, category: &Category) {
        self.favourite_category.retain(|c| c != category);
    }
}

impl Entity for User {
    const KIND: EntityKind = EntityKind::User;

    fn id(&self) -> EntityId {
        self.user_id
    }

    fn with_id(mut self, id: EntityId) -> Self {
        self.user_id = id;
        self
    }
}

/// Build a user that has not been stored yet. The backend assigns its ID on `add`.
pub fn create_user(name: &str, email: &str, group: Group) -> User {
    User::new(UNASSIGNED_ID, name.to_string(), email.to_string(), group)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventDraft;

    fn make_user() -> User {
        let group = Group::new(100, "Test group".to_string(), true, true, false);
        User::new(
            100,
            "Testing Subject".to_string(),
            "test@example.com".to_string(),
            group,
        )
    }

    #[test]
    fn new_user_has_empty_collections() {
        let user = make_user();
        assert_eq!(user.user_id(), 100);
        assert_eq!(user.name, "Testing Subject");
        assert_eq!(user.email, "test@example.com");
        assert!(user.wishlist().is_empty());
        assert!(user.favourite_categories().is_empty());
    }

    #[test]
    fn add_category_twice_keeps_single_membership() {
        let mut user = make_user();
        let category = Category::new(7, "Science".to_string(), "Talks".to_string());

        user.add_category(category.clone());
        user.add_category(category.clone());

        assert_eq!(user.favourite_categories(), &[category]);
    }

    #[test]
    fn remove_non_member_category_is_noop() {
        let mut user = make_user();
        let member = Category::new(1, "Music".to_string(), "Concerts".to_string());
        let stranger = Category::new(2, "Sport".to_string(), "Matches".to_string());
        user.add_category(member.clone());

        user.remove_category(&stranger);
        assert_eq!(user.favourite_categories().len(), 1);

        user.remove_category(&member);
        assert!(user.favourite_categories().is_empty());
    }

    #[test]
    fn wishlist_keeps_insertion_order() {
        let mut user = make_user();
        let category = Category::new(1, "Music".to_string(), "Concerts".to_string());
        let first = Event::new(1, EventDraft::new("First", make_user(), category.clone()));
        let second = Event::new(2, EventDraft::new("Second", make_user(), category));

        user.add_to_wishlist(first.clone());
        user.add_to_wishlist(second.clone());
        assert_eq!(user.wishlist(), &[first, second.clone()]);

        assert!(user.remove_from_wishlist(1));
        assert!(!user.remove_from_wishlist(1));
        assert_eq!(user.wishlist(), &[second]);
    }

    #[test]
    fn equality_includes_nested_group() {
        let a = make_user();
        let mut b = a.clone();
        b.group.admin_access = true;
        assert_ne!(a, b);
    }
}
