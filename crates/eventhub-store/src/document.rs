// ABOUTME: Whole-file document repository shared by the XML and JSON backends.
// ABOUTME: Every operation loads the entity's file, filters by id, mutates in memory and rewrites the file.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::Write;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use eventhub_core::{EntityId, EntityKind};

use crate::error::{StoreError, StoreResult};
use crate::persist::{Persist, RecordSource, Resolver, ensure_references, read_entity};
use crate::record::{Record, ensure_storable_id, find_unique, next_id_after};
use crate::repository::Repository;
use crate::schema::Schema;

/// A text encoding of one entity kind's full record list.
pub trait DocumentFormat: Send + Sync + 'static {
    /// File extension, without the dot.
    const EXTENSION: &'static str;

    fn decode(schema: &'static Schema, text: &str) -> Result<Vec<Record>, String>;

    fn encode(schema: &'static Schema, records: &[Record]) -> Result<String, String>;
}

/// Path of the document holding `schema`'s entities inside `dir`.
pub fn document_path<F: DocumentFormat>(dir: &Path, schema: &Schema) -> PathBuf {
    dir.join(format!("{}.{}", schema.table, F::EXTENSION))
}

/// Load every record of one kind. A missing or blank file is an empty store.
pub fn load_document<F: DocumentFormat>(
    dir: &Path,
    schema: &'static Schema,
) -> StoreResult<Vec<Record>> {
    let path = document_path::<F>(dir, schema);
    let text = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(StoreError::io(path, e)),
    };
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    F::decode(schema, &text).map_err(|e| StoreError::malformed(&path, e))
}

/// Rewrite one kind's document atomically (write to .tmp, fsync, rename).
pub fn save_document<F: DocumentFormat>(
    dir: &Path,
    schema: &'static Schema,
    records: &[Record],
) -> StoreResult<()> {
    fs::create_dir_all(dir).map_err(|e| StoreError::io(dir, e))?;

    let final_path = document_path::<F>(dir, schema);
    let tmp_path = dir.join(format!("{}.{}.tmp", schema.table, F::EXTENSION));
    let text = F::encode(schema, records).map_err(StoreError::serialization)?;

    let mut file = File::create(&tmp_path).map_err(|e| StoreError::io(&tmp_path, e))?;
    file.write_all(text.as_bytes())
        .map_err(|e| StoreError::io(&tmp_path, e))?;
    file.sync_all().map_err(|e| StoreError::io(&tmp_path, e))?;
    drop(file);

    fs::rename(&tmp_path, &final_path).map_err(|e| StoreError::io(&final_path, e))?;
    Ok(())
}

/// One operation's view of a data directory. Each kind's document is read at
/// most once per operation.
struct DocumentScope<'d, F> {
    dir: &'d Path,
    cache: RefCell<HashMap<EntityKind, Rc<Vec<Record>>>>,
    _format: PhantomData<F>,
}

impl<'d, F: DocumentFormat> DocumentScope<'d, F> {
    fn new(dir: &'d Path) -> Self {
        Self {
            dir,
            cache: RefCell::new(HashMap::new()),
            _format: PhantomData,
        }
    }

    fn records(&self, schema: &'static Schema) -> StoreResult<Rc<Vec<Record>>> {
        if let Some(records) = self.cache.borrow().get(&schema.kind) {
            return Ok(Rc::clone(records));
        }
        let records = Rc::new(load_document::<F>(self.dir, schema)?);
        self.cache
            .borrow_mut()
            .insert(schema.kind, Rc::clone(&records));
        Ok(records)
    }
}

impl<F: DocumentFormat> RecordSource for DocumentScope<'_, F> {
    fn load_record(&self, schema: &'static Schema, id: EntityId) -> StoreResult<Option<Record>> {
        let records = self.records(schema)?;
        Ok(find_unique(&records, schema.kind, id)?.cloned())
    }
}

/// Positions of every record with `id`.
fn positions(records: &[Record], id: EntityId) -> Vec<usize> {
    records
        .iter()
        .enumerate()
        .filter(|(_, r)| r.id == id)
        .map(|(i, _)| i)
        .collect()
}

/// A repository of `T` persisted as one `F`-encoded document per entity kind
/// under a data directory.
///
/// There is no locking. Two repositories writing the same file race and the
/// last writer wins.
pub struct DocumentRepository<T, F> {
    dir: PathBuf,
    _marker: PhantomData<fn() -> (T, F)>,
}

impl<T: Persist, F: DocumentFormat> DocumentRepository<T, F> {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            _marker: PhantomData,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the document this repository reads and writes.
    pub fn path(&self) -> PathBuf {
        document_path::<F>(&self.dir, T::SCHEMA)
    }

    fn scope(&self) -> DocumentScope<'_, F> {
        DocumentScope::new(&self.dir)
    }

    fn save(&self, records: &[Record]) -> StoreResult<()> {
        save_document::<F>(&self.dir, T::SCHEMA, records)
    }
}

impl<T: Persist, F: DocumentFormat> Repository<T> for DocumentRepository<T, F> {
    fn get_by_id(&self, id: EntityId) -> StoreResult<Option<T>> {
        read_entity(&self.scope(), id)
    }

    fn get_all(&self) -> StoreResult<Vec<T>> {
        let scope = self.scope();
        let records = scope.records(T::SCHEMA)?;
        records
            .iter()
            .map(|record| Resolver::new(&scope).materialize(record))
            .collect()
    }

    fn add(&self, entity: &T) -> StoreResult<EntityId> {
        if entity.is_assigned() {
            ensure_storable_id(T::KIND, entity.id())?;
        }
        let scope = self.scope();
        let records = scope.records(T::SCHEMA)?;

        if entity.is_assigned() && find_unique(&records, T::KIND, entity.id())?.is_some() {
            tracing::debug!("{} {} already stored, add is a no-op", T::KIND, entity.id());
            return Ok(entity.id());
        }

        let id = if entity.is_assigned() {
            entity.id()
        } else {
            next_id_after(T::KIND, records.iter().map(|r| r.id))?
        };
        let record = entity.clone().with_id(id).to_record();
        ensure_references(&scope, &record)?;

        let mut updated = records.as_ref().clone();
        updated.push(record);
        self.save(&updated)?;

        tracing::info!("added {} {} to {}", T::KIND, id, self.path().display());
        Ok(id)
    }

    fn update(&self, entity: &T) -> StoreResult<()> {
        if !entity.is_assigned() {
            return Err(StoreError::UnassignedId { kind: T::KIND });
        }
        let id = entity.id();
        ensure_storable_id(T::KIND, id)?;
        let scope = self.scope();
        let records = scope.records(T::SCHEMA)?;

        let index = match positions(&records, id).as_slice() {
            [] => {
                tracing::warn!("update of missing {} {}", T::KIND, id);
                return Err(StoreError::NotFound { kind: T::KIND, id });
            }
            [index] => *index,
            many => {
                return Err(StoreError::DuplicateId {
                    kind: T::KIND,
                    id,
                    count: many.len(),
                });
            }
        };

        let record = entity.to_record();
        ensure_references(&scope, &record)?;

        let mut updated = records.as_ref().clone();
        updated[index] = record;
        self.save(&updated)?;

        tracing::debug!("updated {} {}", T::KIND, id);
        Ok(())
    }

    fn delete(&self, id: EntityId) -> StoreResult<()> {
        let records = self.scope().records(T::SCHEMA)?;

        let index = match positions(&records, id).as_slice() {
            [] => {
                tracing::debug!("delete of missing {} {} is a no-op", T::KIND, id);
                return Ok(());
            }
            [index] => *index,
            many => {
                return Err(StoreError::DuplicateId {
                    kind: T::KIND,
                    id,
                    count: many.len(),
                });
            }
        };

        let mut updated = records.as_ref().clone();
        updated.remove(index);
        self.save(&updated)?;

        tracing::debug!("deleted {} {}", T::KIND, id);
        Ok(())
    }

    fn next_id(&self) -> StoreResult<EntityId> {
        let records = self.scope().records(T::SCHEMA)?;
        next_id_after(T::KIND, records.iter().map(|r| r.id))
    }

    fn count(&self) -> StoreResult<usize> {
        Ok(self.scope().records(T::SCHEMA)?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::json::JsonFormat;
    use crate::schema::CATEGORY_SCHEMA;
    use crate::xml::XmlFormat;
    use eventhub_core::{Category, Entity, create_category};
    use tempfile::TempDir;

    fn repo<F: DocumentFormat>(dir: &TempDir) -> DocumentRepository<Category, F> {
        DocumentRepository::new(dir.path())
    }

    fn missing_file_is_empty_store<F: DocumentFormat>() {
        let dir = TempDir::new().unwrap();
        let repo = repo::<F>(&dir);
        assert!(repo.get_all().unwrap().is_empty());
        assert!(repo.get_by_id(1).unwrap().is_none());
        assert_eq!(repo.next_id().unwrap(), 1);
        assert!(!repo.path().exists());
    }

    fn update_missing_is_not_found<F: DocumentFormat>() {
        let dir = TempDir::new().unwrap();
        let repo = repo::<F>(&dir);
        repo.add(&create_category("A", "a")).unwrap();
        let err = repo
            .update(&Category::new(9, "B".into(), "b".into()))
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { id: 9, .. }));
    }

    fn duplicate_ids_are_corruption<F: DocumentFormat>() {
        let dir = TempDir::new().unwrap();
        let twin = Category::new(4, "Twin".into(), "t".into()).to_record();
        save_document::<F>(dir.path(), &CATEGORY_SCHEMA, &[twin.clone(), twin]).unwrap();

        let repo = repo::<F>(&dir);
        assert!(matches!(
            repo.get_by_id(4),
            Err(StoreError::DuplicateId { count: 2, .. })
        ));
        assert!(matches!(
            repo.delete(4),
            Err(StoreError::DuplicateId { .. })
        ));
        assert!(matches!(
            repo.update(&Category::new(4, "x".into(), "y".into())),
            Err(StoreError::DuplicateId { .. })
        ));
    }

    fn update_replaces_in_place<F: DocumentFormat>() {
        let dir = TempDir::new().unwrap();
        let repo = repo::<F>(&dir);
        repo.add(&create_category("A", "a")).unwrap();
        repo.add(&create_category("B", "b")).unwrap();
        repo.add(&create_category("C", "c")).unwrap();

        repo.update(&Category::new(2, "Bee".into(), "bb".into()))
            .unwrap();
        let titles: Vec<String> = repo.get_all().unwrap().into_iter().map(|c| c.title).collect();
        assert_eq!(titles, ["A", "Bee", "C"]);
    }

    fn delete_removes_exactly_one<F: DocumentFormat>() {
        let dir = TempDir::new().unwrap();
        let repo = repo::<F>(&dir);
        for title in ["A", "B", "C"] {
            repo.add(&create_category(title, "")).unwrap();
        }
        repo.delete(2).unwrap();
        repo.delete(2).unwrap();
        let ids: Vec<EntityId> = repo.get_all().unwrap().iter().map(Entity::id).collect();
        assert_eq!(ids, [1, 3]);
        assert_eq!(repo.next_id().unwrap(), 4);
    }

    fn no_temp_file_is_left_behind<F: DocumentFormat>() {
        let dir = TempDir::new().unwrap();
        let repo = repo::<F>(&dir);
        repo.add(&create_category("A", "a")).unwrap();
        let names: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, [format!("categories.{}", F::EXTENSION)]);
    }

    #[test]
    fn json_document_behaviour() {
        missing_file_is_empty_store::<JsonFormat>();
        update_missing_is_not_found::<JsonFormat>();
        duplicate_ids_are_corruption::<JsonFormat>();
        update_replaces_in_place::<JsonFormat>();
        delete_removes_exactly_one::<JsonFormat>();
        no_temp_file_is_left_behind::<JsonFormat>();
    }

    #[test]
    fn xml_document_behaviour() {
        missing_file_is_empty_store::<XmlFormat>();
        update_missing_is_not_found::<XmlFormat>();
        duplicate_ids_are_corruption::<XmlFormat>();
        update_replaces_in_place::<XmlFormat>();
        delete_removes_exactly_one::<XmlFormat>();
        no_temp_file_is_left_behind::<XmlFormat>();
    }

    #[test]
    fn blank_file_is_empty_store() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("categories.json"), "  \n").unwrap();
        let repo = repo::<JsonFormat>(&dir);
        assert_eq!(repo.count().unwrap(), 0);
    }
}
