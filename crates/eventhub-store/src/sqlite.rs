// ABOUTME: Relational repository backend over a single SQLite connection.
// ABOUTME: One table per entity kind, link tables for collections, one transaction per write.

use std::marker::PhantomData;
use std::path::Path;

use eventhub_core::EntityId;
use rusqlite::types::Value;
use rusqlite::{Connection, ErrorCode, Row, params, params_from_iter};

use crate::error::{StoreError, StoreResult};
use crate::persist::{Persist, RecordSource, ensure_references, read_entity};
use crate::record::{FieldValue, Record, ensure_storable_id, next_id_after};
use crate::repository::Repository;
use crate::schema::{ColumnKind, Schema};

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS groups (
    id INTEGER PRIMARY KEY,
    title TEXT NOT NULL,
    create_rights INTEGER NOT NULL,
    delete_rights INTEGER NOT NULL,
    admin_access INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS categories (
    id INTEGER PRIMARY KEY,
    title TEXT NOT NULL,
    description TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    email TEXT NOT NULL,
    "group" INTEGER NOT NULL REFERENCES groups(id)
);

CREATE TABLE IF NOT EXISTS comments (
    id INTEGER PRIMARY KEY,
    author INTEGER NOT NULL REFERENCES users(id),
    date TEXT NOT NULL,
    text TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS events (
    id INTEGER PRIMARY KEY,
    title TEXT NOT NULL,
    author INTEGER NOT NULL REFERENCES users(id),
    announcement TEXT NOT NULL,
    description TEXT NOT NULL,
    date TEXT NOT NULL,
    place TEXT NOT NULL,
    photo TEXT,
    category INTEGER NOT NULL REFERENCES categories(id)
);

CREATE TABLE IF NOT EXISTS users_wishlist (
    owner_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    member_id INTEGER NOT NULL REFERENCES events(id),
    position INTEGER NOT NULL,
    PRIMARY KEY (owner_id, position)
);

CREATE TABLE IF NOT EXISTS users_favourite_category (
    owner_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    member_id INTEGER NOT NULL REFERENCES categories(id),
    position INTEGER NOT NULL,
    PRIMARY KEY (owner_id, position)
);

CREATE TABLE IF NOT EXISTS events_feedback (
    owner_id INTEGER NOT NULL REFERENCES events(id) ON DELETE CASCADE,
    member_id INTEGER NOT NULL REFERENCES comments(id),
    position INTEGER NOT NULL,
    PRIMARY KEY (owner_id, position)
);
"#;

fn quote(identifier: &str) -> String {
    format!("\"{identifier}\"")
}

fn column_list(schema: &Schema) -> String {
    schema
        .columns
        .iter()
        .map(|c| quote(c.name))
        .collect::<Vec<_>>()
        .join(", ")
}

fn to_sql_value(value: &FieldValue) -> Value {
    match value {
        FieldValue::Text(text) => Value::Text(text.clone()),
        FieldValue::Bool(flag) => Value::Integer(i64::from(*flag)),
        FieldValue::Id(id) => Value::Integer(*id),
        FieldValue::Null => Value::Null,
    }
}

fn read_fields(
    schema: &'static Schema,
    row: &Row<'_>,
) -> rusqlite::Result<Vec<(&'static str, FieldValue)>> {
    let mut fields = Vec::with_capacity(schema.columns.len());
    for (index, column) in schema.columns.iter().enumerate() {
        let value = match column.kind {
            ColumnKind::Text => FieldValue::Text(row.get(index)?),
            ColumnKind::OptionalText => row
                .get::<_, Option<String>>(index)?
                .map_or(FieldValue::Null, FieldValue::Text),
            ColumnKind::Bool => FieldValue::Bool(row.get(index)?),
            ColumnKind::Reference(_) => FieldValue::Id(row.get(index)?),
        };
        fields.push((column.name, value));
    }
    Ok(fields)
}

/// Reads records through a borrowed connection, so the same code serves plain
/// reads and reads inside a write transaction.
struct SqliteScope<'c> {
    conn: &'c Connection,
}

impl SqliteScope<'_> {
    fn next_id(&self, schema: &Schema) -> StoreResult<EntityId> {
        let sql = format!("SELECT MAX(\"id\") FROM {}", quote(schema.table));
        let max: Option<EntityId> = self.conn.query_row(&sql, [], |row| row.get(0))?;
        next_id_after(schema.kind, max)
    }

    fn all_ids(&self, schema: &Schema) -> StoreResult<Vec<EntityId>> {
        let sql = format!("SELECT \"id\" FROM {} ORDER BY \"id\"", quote(schema.table));
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], |row| row.get(0))?;

        let mut ids = Vec::new();
        for row in rows {
            ids.push(row?);
        }
        Ok(ids)
    }

    fn link_ids(&self, table: &str, owner: EntityId) -> StoreResult<Vec<EntityId>> {
        let sql = format!(
            "SELECT member_id FROM {} WHERE owner_id = ?1 ORDER BY position",
            quote(table)
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![owner], |row| row.get(0))?;

        let mut ids = Vec::new();
        for row in rows {
            ids.push(row?);
        }
        Ok(ids)
    }

    /// Upsert the record's row, then rewrite its link rows in order.
    fn write_record(&self, schema: &'static Schema, record: &Record) -> StoreResult<()> {
        let placeholders = (1..=schema.columns.len() + 1)
            .map(|i| format!("?{i}"))
            .collect::<Vec<_>>()
            .join(", ");
        let updates = schema
            .columns
            .iter()
            .map(|c| format!("{0} = excluded.{0}", quote(c.name)))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "INSERT INTO {} (\"id\", {}) VALUES ({placeholders})
             ON CONFLICT(\"id\") DO UPDATE SET {updates}",
            quote(schema.table),
            column_list(schema),
        );

        let mut bind_values = vec![Value::Integer(record.id)];
        for column in schema.columns {
            let value = record.value(column.name).unwrap_or(&FieldValue::Null);
            bind_values.push(to_sql_value(value));
        }
        self.conn.execute(&sql, params_from_iter(bind_values))?;

        for link in schema.links {
            let table = quote(&schema.link_table(link));
            self.conn.execute(
                &format!("DELETE FROM {table} WHERE owner_id = ?1"),
                params![record.id],
            )?;
            let insert = format!(
                "INSERT INTO {table} (owner_id, member_id, position) VALUES (?1, ?2, ?3)"
            );
            for (position, member) in record.link_ids(link.name).iter().enumerate() {
                self.conn
                    .execute(&insert, params![record.id, member, position as i64])?;
            }
        }
        Ok(())
    }
}

impl RecordSource for SqliteScope<'_> {
    fn load_record(&self, schema: &'static Schema, id: EntityId) -> StoreResult<Option<Record>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE \"id\" = ?1",
            column_list(schema),
            quote(schema.table)
        );
        let result = self
            .conn
            .query_row(&sql, params![id], |row| read_fields(schema, row));

        let fields = match result {
            Ok(fields) => fields,
            Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
            Err(e) => return Err(StoreError::Sqlite(e)),
        };

        let mut links = Vec::with_capacity(schema.links.len());
        for link in schema.links {
            links.push((link.name, self.link_ids(&schema.link_table(link), id)?));
        }

        Ok(Some(Record {
            kind: schema.kind,
            id,
            fields,
            links,
        }))
    }
}

/// A repository of `T` stored in SQLite. The repository exclusively owns its
/// connection; repositories of different kinds share data by opening the same
/// database file.
pub struct SqliteRepository<T> {
    conn: Connection,
    _entity: PhantomData<fn() -> T>,
}

impl<T> SqliteRepository<T> {
    /// Open or create a database at `path` and ensure the schema exists.
    pub fn open(path: &Path) -> StoreResult<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        tracing::info!("opened sqlite store at {}", path.display());
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    /// Take ownership of an existing connection, enabling foreign keys and
    /// creating any missing tables.
    pub fn from_connection(conn: Connection) -> StoreResult<Self> {
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self {
            conn,
            _entity: PhantomData,
        })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    fn scope(&self) -> SqliteScope<'_> {
        SqliteScope { conn: &self.conn }
    }
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(err, rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation)
}

impl<T: Persist> Repository<T> for SqliteRepository<T> {
    fn get_by_id(&self, id: EntityId) -> StoreResult<Option<T>> {
        read_entity(&self.scope(), id)
    }

    fn get_all(&self) -> StoreResult<Vec<T>> {
        let scope = self.scope();
        let mut entities = Vec::new();
        for id in scope.all_ids(T::SCHEMA)? {
            if let Some(entity) = read_entity(&scope, id)? {
                entities.push(entity);
            }
        }
        Ok(entities)
    }

    fn add(&self, entity: &T) -> StoreResult<EntityId> {
        if entity.is_assigned() {
            ensure_storable_id(T::KIND, entity.id())?;
        }
        let tx = self.conn.unchecked_transaction()?;
        let scope = SqliteScope { conn: &tx };

        if entity.is_assigned() && scope.contains(T::SCHEMA, entity.id())? {
            tracing::debug!("{} {} already stored, add is a no-op", T::KIND, entity.id());
            return Ok(entity.id());
        }

        let id = if entity.is_assigned() {
            entity.id()
        } else {
            scope.next_id(T::SCHEMA)?
        };
        let record = entity.clone().with_id(id).to_record();
        ensure_references(&scope, &record)?;
        scope.write_record(T::SCHEMA, &record)?;
        tx.commit()?;

        tracing::info!("added {} {} to {}", T::KIND, id, T::SCHEMA.table);
        Ok(id)
    }

    fn update(&self, entity: &T) -> StoreResult<()> {
        if !entity.is_assigned() {
            return Err(StoreError::UnassignedId { kind: T::KIND });
        }
        ensure_storable_id(T::KIND, entity.id())?;

        let tx = self.conn.unchecked_transaction()?;
        let scope = SqliteScope { conn: &tx };
        let record = entity.to_record();
        ensure_references(&scope, &record)?;
        scope.write_record(T::SCHEMA, &record)?;
        tx.commit()?;

        tracing::debug!("updated {} {}", T::KIND, record.id);
        Ok(())
    }

    fn delete(&self, id: EntityId) -> StoreResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        let sql = format!("DELETE FROM {} WHERE \"id\" = ?1", quote(T::SCHEMA.table));
        let removed = match tx.execute(&sql, params![id]) {
            Ok(removed) => removed,
            Err(e) if is_constraint_violation(&e) => {
                tracing::warn!("refusing to delete {} {}: still referenced", T::KIND, id);
                return Err(StoreError::Referenced { kind: T::KIND, id });
            }
            Err(e) => return Err(StoreError::Sqlite(e)),
        };
        tx.commit()?;

        tracing::debug!("deleted {} {} ({} row)", T::KIND, id, removed);
        Ok(())
    }

    fn next_id(&self) -> StoreResult<EntityId> {
        self.scope().next_id(T::SCHEMA)
    }

    fn count(&self) -> StoreResult<usize> {
        let sql = format!("SELECT COUNT(*) FROM {}", quote(T::SCHEMA.table));
        let count: i64 = self.conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eventhub_core::{
        Category, Comment, Entity, Event, EventDraft, Group, User, create_category,
        create_group, create_user,
    };
    use tempfile::TempDir;

    struct Store {
        _dir: TempDir,
        groups: SqliteRepository<Group>,
        categories: SqliteRepository<Category>,
        users: SqliteRepository<User>,
        comments: SqliteRepository<Comment>,
        events: SqliteRepository<Event>,
    }

    fn open_store() -> Store {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("eventhub.db");
        Store {
            groups: SqliteRepository::open(&path).unwrap(),
            categories: SqliteRepository::open(&path).unwrap(),
            users: SqliteRepository::open(&path).unwrap(),
            comments: SqliteRepository::open(&path).unwrap(),
            events: SqliteRepository::open(&path).unwrap(),
            _dir: dir,
        }
    }

    fn seed_user(store: &Store) -> (User, Category) {
        let group_id = store
            .groups
            .add(&create_group("members", false, false, false))
            .unwrap();
        let group = store.groups.get_by_id(group_id).unwrap().unwrap();
        let user_id = store
            .users
            .add(&create_user("Ann", "ann@example.com", group))
            .unwrap();
        let category_id = store
            .categories
            .add(&create_category("Music", "Live music"))
            .unwrap();
        (
            store.users.get_by_id(user_id).unwrap().unwrap(),
            store.categories.get_by_id(category_id).unwrap().unwrap(),
        )
    }

    #[test]
    fn first_add_gets_id_one_then_max_plus_one() {
        let repo: SqliteRepository<Category> = SqliteRepository::open_in_memory().unwrap();
        assert_eq!(repo.next_id().unwrap(), 1);
        assert_eq!(repo.add(&create_category("A", "a")).unwrap(), 1);
        assert_eq!(repo.add(&create_category("B", "b").with_id(10)).unwrap(), 10);
        assert_eq!(repo.add(&create_category("C", "c")).unwrap(), 11);
        assert_eq!(repo.count().unwrap(), 3);
    }

    #[test]
    fn add_with_stored_id_is_noop() {
        let repo: SqliteRepository<Category> = SqliteRepository::open_in_memory().unwrap();
        let id = repo.add(&create_category("A", "a")).unwrap();
        let changed = Category::new(id, "Changed".into(), "x".into());

        assert_eq!(repo.add(&changed).unwrap(), id);
        assert_eq!(repo.get_by_id(id).unwrap().unwrap().title, "A");
        assert_eq!(repo.count().unwrap(), 1);
    }

    #[test]
    fn update_of_missing_id_upserts() {
        let repo: SqliteRepository<Group> = SqliteRepository::open_in_memory().unwrap();
        let group = Group::new(5, "admins".into(), true, true, true);
        repo.update(&group).unwrap();
        assert_eq!(repo.get_by_id(5).unwrap(), Some(group));
    }

    #[test]
    fn update_rejects_unassigned_entity() {
        let repo: SqliteRepository<Group> = SqliteRepository::open_in_memory().unwrap();
        let err = repo.update(&create_group("x", false, false, false)).unwrap_err();
        assert!(matches!(err, StoreError::UnassignedId { .. }));
    }

    #[test]
    fn delete_missing_id_is_noop() {
        let repo: SqliteRepository<Category> = SqliteRepository::open_in_memory().unwrap();
        repo.add(&create_category("A", "a")).unwrap();
        repo.delete(99).unwrap();
        assert_eq!(repo.count().unwrap(), 1);
    }

    #[test]
    fn event_with_feedback_round_trips() {
        let store = open_store();
        let (user, category) = seed_user(&store);

        let mut draft = EventDraft::new("Conf", user.clone(), category);
        draft.place = "Hall A".into();
        draft.photo = Some("conf.png".into());
        let event_id = store.events.add(&Event::new(0, draft)).unwrap();
        let mut event = store.events.get_by_id(event_id).unwrap().unwrap();

        let comment = Comment::new(0, user, "01.02.2026 10:00".into(), "Great".into());
        let comment_id = store.comments.add(&comment).unwrap();
        event.add_feedback(store.comments.get_by_id(comment_id).unwrap().unwrap());
        store.events.update(&event).unwrap();

        let loaded = store.events.get_by_id(event_id).unwrap().unwrap();
        assert_eq!(loaded, event);
        assert_eq!(loaded.photo(), Some("conf.png"));
        assert_eq!(loaded.feedback()[0].text, "Great");
    }

    #[test]
    fn favourite_categories_keep_order_and_set_semantics() {
        let store = open_store();
        let (mut user, music) = seed_user(&store);
        let sport_id = store
            .categories
            .add(&create_category("Sport", "Matches"))
            .unwrap();
        let sport = store.categories.get_by_id(sport_id).unwrap().unwrap();

        user.add_category(sport.clone());
        user.add_category(music.clone());
        user.add_category(sport.clone());
        store.users.update(&user).unwrap();

        let loaded = store.users.get_by_id(user.id()).unwrap().unwrap();
        assert_eq!(loaded.favourite_categories(), &[sport, music]);
    }

    #[test]
    fn dangling_reference_is_rejected_and_nothing_written() {
        let store = open_store();
        let ghost_group = Group::new(42, "ghost".into(), false, false, false);
        let err = store
            .users
            .add(&create_user("Bo", "bo@example.com", ghost_group))
            .unwrap_err();
        assert!(matches!(err, StoreError::DanglingReference { id: 42, .. }));
        assert_eq!(store.users.count().unwrap(), 0);
    }

    #[test]
    fn deleting_referenced_row_is_refused() {
        let store = open_store();
        let (user, _) = seed_user(&store);
        let err = store.groups.delete(user.group.id()).unwrap_err();
        assert!(matches!(err, StoreError::Referenced { .. }));
        assert!(store.groups.get_by_id(user.group.id()).unwrap().is_some());
    }

    #[test]
    fn deleting_owner_cascades_its_link_rows() {
        let store = open_store();
        let (mut user, music) = seed_user(&store);
        user.add_category(music);
        store.users.update(&user).unwrap();

        store.users.delete(user.id()).unwrap();
        let links: i64 = store
            .users
            .connection()
            .query_row("SELECT COUNT(*) FROM users_favourite_category", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(links, 0);
    }

    #[test]
    fn get_all_is_ascending_by_id() {
        let repo: SqliteRepository<Category> = SqliteRepository::open_in_memory().unwrap();
        repo.add(&create_category("B", "b").with_id(7)).unwrap();
        repo.add(&create_category("A", "a").with_id(3)).unwrap();
        let ids: Vec<EntityId> = repo.get_all().unwrap().iter().map(Entity::id).collect();
        assert_eq!(ids, [3, 7]);
    }
}
