// ABOUTME: Static persistence layout for every entity kind: table, element, columns and link lists.
// ABOUTME: Backends build SQL, XML attributes and JSON keys only from these constants.

use eventhub_core::EntityKind;

/// How a scalar column is typed across backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    OptionalText,
    Bool,
    /// Integer ID of another entity kind.
    Reference(EntityKind),
}

#[derive(Debug)]
pub struct Column {
    pub name: &'static str,
    pub kind: ColumnKind,
}

/// An ordered collection of references to another entity kind.
#[derive(Debug)]
pub struct Link {
    pub name: &'static str,
    pub target: EntityKind,
}

/// Persistence layout of one entity kind. `table` doubles as the document
/// file stem and the XML root element; `element` names each XML child.
#[derive(Debug)]
pub struct Schema {
    pub kind: EntityKind,
    pub table: &'static str,
    pub element: &'static str,
    pub columns: &'static [Column],
    pub links: &'static [Link],
}

impl Schema {
    /// Name of the relational table holding `link`'s membership rows.
    pub fn link_table(&self, link: &Link) -> String {
        format!("{}_{}", self.table, link.name)
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }
}

const fn column(name: &'static str, kind: ColumnKind) -> Column {
    Column { name, kind }
}

pub static CATEGORY_SCHEMA: Schema = Schema {
    kind: EntityKind::Category,
    table: "categories",
    element: "category",
    columns: &[
        column("title", ColumnKind::Text),
        column("description", ColumnKind::Text),
    ],
    links: &[],
};

pub static GROUP_SCHEMA: Schema = Schema {
    kind: EntityKind::Group,
    table: "groups",
    element: "group",
    columns: &[
        column("title", ColumnKind::Text),
        column("create_rights", ColumnKind::Bool),
        column("delete_rights", ColumnKind::Bool),
        column("admin_access", ColumnKind::Bool),
    ],
    links: &[],
};

pub static USER_SCHEMA: Schema = Schema {
    kind: EntityKind::User,
    table: "users",
    element: "user",
    columns: &[
        column("name", ColumnKind::Text),
        column("email", ColumnKind::Text),
        column("group", ColumnKind::Reference(EntityKind::Group)),
    ],
    links: &[
        Link {
            name: "wishlist",
            target: EntityKind::Event,
        },
        Link {
            name: "favourite_category",
            target: EntityKind::Category,
        },
    ],
};

pub static COMMENT_SCHEMA: Schema = Schema {
    kind: EntityKind::Comment,
    table: "comments",
    element: "comment",
    columns: &[
        column("author", ColumnKind::Reference(EntityKind::User)),
        column("date", ColumnKind::Text),
        column("text", ColumnKind::Text),
    ],
    links: &[],
};

pub static EVENT_SCHEMA: Schema = Schema {
    kind: EntityKind::Event,
    table: "events",
    element: "event",
    columns: &[
        column("title", ColumnKind::Text),
        column("author", ColumnKind::Reference(EntityKind::User)),
        column("announcement", ColumnKind::Text),
        column("description", ColumnKind::Text),
        column("date", ColumnKind::Text),
        column("place", ColumnKind::Text),
        column("photo", ColumnKind::OptionalText),
        column("category", ColumnKind::Reference(EntityKind::Category)),
    ],
    links: &[Link {
        name: "feedback",
        target: EntityKind::Comment,
    }],
};

pub fn schema_for(kind: EntityKind) -> &'static Schema {
    match kind {
        EntityKind::Category => &CATEGORY_SCHEMA,
        EntityKind::Group => &GROUP_SCHEMA,
        EntityKind::User => &USER_SCHEMA,
        EntityKind::Comment => &COMMENT_SCHEMA,
        EntityKind::Event => &EVENT_SCHEMA,
    }
}
