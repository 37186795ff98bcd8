use std::sync::{Arc, Mutex, MutexGuard};

// other keepers use HashMap
use core::hash::BuildHasherDefault;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use seahash::SeaHasher;

use rusqlite::Connection;
use tracing::info;

// our own stuff that we need
use crate::datatype::Caster;
use crate::error::{lock, Result};
use crate::model::{ClassName, Entity};
use crate::persist::Persistor;

pub type OtherHasher = BuildHasherDefault<SeaHasher>;

// ------------- Objects -------------
/// Owns every live entity, keyed by `<Class>.<id>`, and remembers the order
/// in which they were kept.
#[derive(Debug, Default)]
pub struct ObjectKeeper {
    kept: HashMap<String, Entity, OtherHasher>,
    order: Vec<String>,
}

impl ObjectKeeper {
    pub fn new() -> Self {
        Self::default()
    }
    /// Keeps `entity` under its key. An entity already kept under the same
    /// key is replaced in place.
    pub fn keep(&mut self, entity: Entity) -> (String, bool) {
        let key = entity.key();
        let previously_kept = match self.kept.entry(key.clone()) {
            Entry::Vacant(e) => {
                e.insert(entity);
                self.order.push(key.clone());
                false
            }
            Entry::Occupied(mut e) => {
                e.insert(entity);
                true
            }
        };
        (key, previously_kept)
    }
    pub fn get(&self, key: &str) -> Option<&Entity> {
        self.kept.get(key)
    }
    pub fn get_mut(&mut self, key: &str) -> Option<&mut Entity> {
        self.kept.get_mut(key)
    }
    pub fn contains(&self, key: &str) -> bool {
        self.kept.contains_key(key)
    }
    pub fn remove(&mut self, key: &str) -> Option<Entity> {
        let removed = self.kept.remove(key)?;
        self.order.retain(|k| k != key);
        Some(removed)
    }
    /// Entities in the order they were first kept.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Entity)> {
        self.order
            .iter()
            .filter_map(|key| self.kept.get(key).map(|entity| (key, entity)))
    }
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.order.iter()
    }
    /// Number of keys starting with `prefix`.
    pub fn count_prefix(&self, prefix: &str) -> usize {
        self.order.iter().filter(|key| key.starts_with(prefix)).count()
    }
    pub fn len(&self) -> usize {
        self.kept.len()
    }
    pub fn is_empty(&self) -> bool {
        self.kept.is_empty()
    }
}

// ------------- Database -------------
pub enum PersistenceMode {
    InMemory,
    File(String),
}

// This sets up the database with the necessary structures
pub struct Database {
    // owns the live objects
    pub object_keeper: Arc<Mutex<ObjectKeeper>>,
    // responsible for the the persistence layer
    pub persistor: Arc<Mutex<Persistor>>,
}

impl Database {
    pub fn new(mode: PersistenceMode) -> Result<Database> {
        let connection = match &mode {
            PersistenceMode::InMemory => Connection::open_in_memory()?,
            PersistenceMode::File(path) => Connection::open(path)?,
        };
        let mut persistor = Persistor::new(connection)?;

        // Restore the existing database
        let mut object_keeper = ObjectKeeper::new();
        for entity in persistor.restore_objects()? {
            object_keeper.keep(entity);
        }
        if let PersistenceMode::File(path) = &mode {
            info!(path = %path, objects = object_keeper.len(), "restored objects");
        }

        Ok(Database {
            object_keeper: Arc::new(Mutex::new(object_keeper)),
            persistor: Arc::new(Mutex::new(persistor)),
        })
    }
    /// Every class an instance can be created of.
    pub fn classes(&self) -> &'static [ClassName] {
        &ClassName::ALL
    }
    /// Attribute name to caster table for `class`.
    pub fn attributes(&self, class: ClassName) -> HashMap<&'static str, Caster, OtherHasher> {
        class.attribute_types().collect()
    }
    /// Locks the live collection. Release the guard before calling anything
    /// that saves.
    pub fn object_keeper(&self) -> Result<MutexGuard<'_, ObjectKeeper>> {
        lock(&self.object_keeper)
    }
    // functions to create objects for the keeper to keep
    pub fn keep_object(&self, entity: Entity) -> Result<String> {
        let (key, _) = self.object_keeper()?.keep(entity);
        Ok(key)
    }
    /// Constructs, keeps and saves a new instance of `class`, returning its id.
    pub fn create_object(&self, class: ClassName) -> Result<String> {
        let entity = Entity::new(class);
        let id = entity.id().to_string();
        let key = self.keep_object(entity)?;
        self.touch(&key)?;
        info!(%key, "created object");
        Ok(id)
    }
    /// Refreshes `updated_at` of the object under `key` and saves. Returns
    /// `false` when no such object is kept.
    pub fn touch(&self, key: &str) -> Result<bool> {
        {
            let mut keeper = self.object_keeper()?;
            match keeper.get_mut(key) {
                Some(entity) => entity.refresh_updated_at(),
                None => return Ok(false),
            }
        }
        self.save()?;
        Ok(true)
    }
    /// Persists the current live collection.
    pub fn save(&self) -> Result<()> {
        let keeper = self.object_keeper()?;
        lock(&self.persistor)?.persist_objects(keeper.iter())?;
        Ok(())
    }
    /// Number of saves performed since the database was opened.
    pub fn saves(&self) -> Result<usize> {
        Ok(lock(&self.persistor)?.saves())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeper_preserves_insertion_order_across_removal() {
        let mut keeper = ObjectKeeper::new();
        let a = Entity::new(ClassName::State);
        let b = Entity::new(ClassName::City);
        let c = Entity::new(ClassName::State);
        let (key_a, _) = keeper.keep(a);
        let (key_b, _) = keeper.keep(b);
        let (key_c, _) = keeper.keep(c);
        keeper.remove(&key_b);
        let keys: Vec<&String> = keeper.keys().collect();
        assert_eq!(keys, vec![&key_a, &key_c]);
        assert_eq!(keeper.count_prefix("State."), 2);
        assert_eq!(keeper.count_prefix("City."), 0);
    }

    #[test]
    fn keeping_twice_replaces() {
        let mut keeper = ObjectKeeper::new();
        let entity = Entity::new(ClassName::User);
        let (_, first) = keeper.keep(entity.clone());
        let (_, second) = keeper.keep(entity);
        assert!(!first);
        assert!(second);
        assert_eq!(keeper.len(), 1);
    }

    #[test]
    fn create_saves_once() {
        let db = Database::new(PersistenceMode::InMemory).unwrap();
        let id = db.create_object(ClassName::Amenity).unwrap();
        assert!(db.object_keeper().unwrap().contains(&format!("Amenity.{id}")));
        assert_eq!(db.saves().unwrap(), 1);
    }

    #[test]
    fn touch_of_unknown_key_does_not_save() {
        let db = Database::new(PersistenceMode::InMemory).unwrap();
        assert!(!db.touch("State.nope").unwrap());
        assert_eq!(db.saves().unwrap(), 0);
    }

    #[test]
    fn class_and_attribute_tables() {
        let db = Database::new(PersistenceMode::InMemory).unwrap();
        let names: Vec<&str> = db.classes().iter().map(|c| c.name()).collect();
        assert_eq!(names, ["BaseModel", "User", "State", "City", "Amenity", "Place", "Review"]);
        let place = db.attributes(ClassName::Place);
        assert_eq!(place.get("number_rooms"), Some(&Caster::Int));
        assert_eq!(place.get("latitude"), Some(&Caster::Float));
        assert_eq!(place.get("name"), Some(&Caster::Str));
        assert!(!place.contains_key("amenity_ids"));
        assert!(db.attributes(ClassName::BaseModel).is_empty());
    }
}
