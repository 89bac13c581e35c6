// ABOUTME: Defines the Group entity, a permission profile shared by users.
// ABOUTME: Three boolean flags describe what members of the group may do.

use serde::{Deserialize, Serialize};

use crate::entity::{Entity, EntityId, EntityKind, UNASSIGNED_ID};

/// A user group and the rights its members hold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    group_id: EntityId,
    pub title: String,
    pub create_rights: bool,
    pub delete_rights: bool,
    pub admin_access: bool,
}

impl Group {
    pub fn new(
        group_id: EntityId,
        title: String,
        create_rights: bool,
        delete_rights: bool,
        admin_access: bool,
    ) -> Self {
        Self {
            group_id,
            title,
            create_rights,
            delete_rights,
            admin_access,
        }
    }

    pub fn group_id(&self) -> EntityId {
        self.group_id
    }
}

impl Entity for Group {
    const KIND: EntityKind = EntityKind::Group;

    fn id(&self) -> EntityId {
        self.group_id
    }

    fn with_id(mut self, id: EntityId) -> Self {
        self.group_id = id;
        self
    }
}

pub fn create_group(
    title: &str,
    create_rights: bool,
    delete_rights: bool,
    admin_access: bool,
) -> Group {
    Group::new(
        UNASSIGNED_ID,
        title.to_string(),
        create_rights,
        delete_rights,
        admin_access,
    )
}
