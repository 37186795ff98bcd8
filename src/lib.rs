//! HBnB – a command interpreter for a small persisted object store.
//!
//! The console manages instances of a fixed set of classes (`BaseModel`,
//! `User`, `State`, `City`, `Amenity`, `Place`, `Review`). Every instance is
//! an attribute bag with:
//! * an `id` (a UUID, assigned once),
//! * `created_at` and `updated_at` timestamps,
//! * any number of further attributes, some of them declared (and typed) by
//!   its class.
//!
//! Instances are kept in memory under `<Class>.<id>` and the whole collection
//! is persisted after every mutating command.
//!
//! ## Modules
//! * [`model`] – Classes, their attribute tables and the [`model::Entity`] record.
//! * [`datatype`] – Attribute casters and the textual rendering of values.
//! * [`store`] – The [`store::ObjectKeeper`] and the [`store::Database`] wiring it
//!   to persistence.
//! * [`persist`] – SQLite persistence & restoration layer.
//! * [`dotcall`] – Rewriting of `Class.method(args)` into plain commands.
//! * [`console`] – The interpreter: parsing, validation and command handlers.
//! * [`settings`] and [`logging`] – Start-up configuration.
//!
//! ## Two syntaxes
//! Commands are written either space-delimited or as dot-calls:
//! ```text
//! (hbnb) create City
//! (hbnb) show City 4c1d...
//! (hbnb) City.show("4c1d...")
//! (hbnb) City.update("4c1d...", "name", "Oakland")
//! (hbnb) City.update("4c1d...", {'name': "Oakland", 'state_id': "CA"})
//! ```
//! Both end up in the same handlers, so they validate identically and print
//! identical output.
//!
//! ## Quick Start
//! ```
//! use hbnb::{console::Console, store::{Database, PersistenceMode}};
//! let db = Database::new(PersistenceMode::InMemory).unwrap();
//! let mut console = Console::new(&db, Vec::new());
//! console.onecmd("create State").unwrap();
//! console.onecmd("State.count()").unwrap();
//! let output = String::from_utf8(console.into_output()).unwrap();
//! assert!(output.ends_with("1\n"));
//! assert_eq!(db.object_keeper().unwrap().len(), 1);
//! ```

pub mod console;
pub mod datatype;
pub mod dotcall;
pub mod error;
pub mod logging;
pub mod model;
pub mod persist;
pub mod settings;
pub mod store;

pub use error::{HbnbError, Rejection, Result};
