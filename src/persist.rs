// used for persistence
use rusqlite::{params, Connection};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{HbnbError, Result};
use crate::model::Entity;

// ------------- Persistence -------------
/// Durable copy of the object keeper. Every save rewrites the whole
/// collection inside one transaction, so the table always reflects the
/// state after the last completed command.
pub struct Persistor {
    connection: Connection,
    saves: usize,
}

impl Persistor {
    pub fn new(connection: Connection) -> Result<Persistor> {
        // The "STRICT" keyword introduced in 3.37.0 breaks JDBC connections, which makes
        // debugging using an external tool like DBeaver impossible
        connection.execute_batch(
            "
            create table if not exists Object (
                Object_Key text not null,
                Class text not null,
                Body text not null,
                Position integer not null,
                constraint unique_and_referenceable_Object_Key primary key (
                    Object_Key
                )
            );-- STRICT;
            ",
        )?;
        Ok(Persistor {
            connection,
            saves: 0,
        })
    }

    /// Replaces the persisted collection with `objects`, keeping their order.
    pub fn persist_objects<'a, I>(&mut self, objects: I) -> Result<usize>
    where
        I: IntoIterator<Item = (&'a String, &'a Entity)>,
    {
        let transaction = self.connection.transaction()?;
        transaction.execute("delete from Object", [])?;
        let mut written = 0;
        {
            let mut add_object = transaction.prepare_cached(
                "
                insert into Object (
                    Object_Key,
                    Class,
                    Body,
                    Position
                ) values (?, ?, ?, ?)
            ",
            )?;
            for (key, entity) in objects {
                let body = serde_json::to_string(&entity.to_map()).map_err(|e| {
                    HbnbError::Persistence(format!("could not serialize {key}: {e}"))
                })?;
                add_object.execute(params![key, entity.class().name(), body, written as i64])?;
                written += 1;
            }
        }
        transaction.commit()?;
        self.saves += 1;
        debug!(objects = written, saves = self.saves, "persisted object collection");
        Ok(written)
    }

    /// Reads back every persisted object in its saved order.
    pub fn restore_objects(&mut self) -> Result<Vec<Entity>> {
        let mut all_objects = self.connection.prepare(
            "
            select Object_Key, Class, Body
                from Object
                order by Position
        ",
        )?;
        let rows = all_objects.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;
        let mut entities = Vec::new();
        for row in rows {
            let (key, class, body) = row?;
            let map: Map<String, Value> = serde_json::from_str(&body).map_err(|e| {
                HbnbError::DataCorruption {
                    message: format!("body of {key} is not an object: {e}"),
                }
            })?;
            let entity = Entity::from_map(map)?;
            if entity.key() != key || entity.class().name() != class {
                return Err(HbnbError::DataCorruption {
                    message: format!("{key} holds a body for {}", entity.key()),
                });
            }
            entities.push(entity);
        }
        Ok(entities)
    }

    /// Number of completed saves since this persistor was opened.
    pub fn saves(&self) -> usize {
        self.saves
    }
}
