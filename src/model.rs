//! Entity model: the classes the console knows about and the attribute bag
//! every instance carries.
//!
//! An [`Entity`] owns three fixed fields (`id`, `created_at`, `updated_at`)
//! and an ordered map of instance attributes. Each [`ClassName`] declares a
//! table of known attributes with defaults and optional casters; attributes
//! outside that table are still accepted and round-trip verbatim.

use chrono::{Local, NaiveDateTime, SubsecRound, TimeDelta};
use serde_json::{Map, Value};
use uuid::Uuid;

// used to print out readable forms of an entity
use std::fmt;

use crate::datatype::{py_repr, repr_datetime, repr_str, Caster};
use crate::error::{HbnbError, Result};

/// Serialized timestamp layout, e.g. `2017-09-28T21:05:54.119427`.
pub const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";
/// Reserved key carrying the class name in the serialized mapping.
pub const CLASS_KEY: &str = "__class__";

const RESERVED: [&str; 4] = ["id", "created_at", "updated_at", CLASS_KEY];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeDefault {
    Text,
    Integer,
    Real,
    List,
}

/// A declared attribute of a class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attribute {
    pub name: &'static str,
    pub default: AttributeDefault,
    pub caster: Option<Caster>,
}

const fn text(name: &'static str) -> Attribute {
    Attribute { name, default: AttributeDefault::Text, caster: Some(Caster::Str) }
}
const fn integer(name: &'static str) -> Attribute {
    Attribute { name, default: AttributeDefault::Integer, caster: Some(Caster::Int) }
}
const fn real(name: &'static str) -> Attribute {
    Attribute { name, default: AttributeDefault::Real, caster: Some(Caster::Float) }
}

const USER: [Attribute; 4] = [text("email"), text("password"), text("first_name"), text("last_name")];
const STATE: [Attribute; 1] = [text("name")];
const CITY: [Attribute; 2] = [text("state_id"), text("name")];
const AMENITY: [Attribute; 1] = [text("name")];
const PLACE: [Attribute; 11] = [
    text("city_id"),
    text("user_id"),
    text("name"),
    text("description"),
    integer("number_rooms"),
    integer("number_bathrooms"),
    integer("max_guest"),
    integer("price_by_night"),
    real("latitude"),
    real("longitude"),
    Attribute { name: "amenity_ids", default: AttributeDefault::List, caster: None },
];
const REVIEW: [Attribute; 3] = [text("place_id"), text("user_id"), text("text")];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ClassName {
    BaseModel,
    User,
    State,
    City,
    Amenity,
    Place,
    Review,
}

impl ClassName {
    pub const ALL: [ClassName; 7] = [
        ClassName::BaseModel,
        ClassName::User,
        ClassName::State,
        ClassName::City,
        ClassName::Amenity,
        ClassName::Place,
        ClassName::Review,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ClassName::BaseModel => "BaseModel",
            ClassName::User => "User",
            ClassName::State => "State",
            ClassName::City => "City",
            ClassName::Amenity => "Amenity",
            ClassName::Place => "Place",
            ClassName::Review => "Review",
        }
    }

    /// Exact, case-sensitive lookup.
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|class| class.name() == name)
    }

    pub fn declared_attributes(self) -> &'static [Attribute] {
        match self {
            ClassName::BaseModel => &[],
            ClassName::User => &USER,
            ClassName::State => &STATE,
            ClassName::City => &CITY,
            ClassName::Amenity => &AMENITY,
            ClassName::Place => &PLACE,
            ClassName::Review => &REVIEW,
        }
    }

    /// Attribute name to caster, for every attribute that declares one.
    pub fn attribute_types(self) -> impl Iterator<Item = (&'static str, Caster)> {
        self.declared_attributes()
            .iter()
            .filter_map(|a| a.caster.map(|caster| (a.name, caster)))
    }

    pub fn default_value(self, attribute: &str) -> Option<Value> {
        let declared = self.declared_attributes().iter().find(|a| a.name == attribute)?;
        Some(match declared.default {
            AttributeDefault::Text => Value::from(""),
            AttributeDefault::Integer => Value::from(0),
            AttributeDefault::Real => Value::from(0.0),
            AttributeDefault::List => Value::Array(Vec::new()),
        })
    }
}

impl fmt::Display for ClassName {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Current local time at microsecond precision, the resolution timestamps
/// survive serialization with.
pub fn now() -> NaiveDateTime {
    Local::now().naive_local().trunc_subsecs(6)
}

// ------------- Entity -------------
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    class: ClassName,
    id: String,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
    attributes: Map<String, Value>,
}

impl Entity {
    /// Creates a fresh instance with a generated id and both timestamps set
    /// to now.
    pub fn new(class: ClassName) -> Self {
        let created_at = now();
        Self {
            class,
            id: Uuid::new_v4().to_string(),
            created_at,
            updated_at: created_at,
            attributes: Map::new(),
        }
    }

    /// Rebuilds an instance from its serialized mapping. Nothing is
    /// generated: id and timestamps are taken as found.
    pub fn from_map(mut map: Map<String, Value>) -> Result<Self> {
        let class_name = match map.remove(CLASS_KEY) {
            Some(Value::String(name)) => name,
            _ => return Err(corrupt(format!("missing `{CLASS_KEY}`"))),
        };
        let class = ClassName::parse(&class_name)
            .ok_or_else(|| corrupt(format!("unknown class `{class_name}`")))?;
        let id = match map.remove("id") {
            Some(Value::String(id)) => id,
            _ => return Err(corrupt(format!("{class_name} without an id"))),
        };
        let created_at = parse_time(map.remove("created_at"), "created_at")?;
        let updated_at = parse_time(map.remove("updated_at"), "updated_at")?;
        Ok(Self {
            class,
            id,
            created_at,
            updated_at,
            attributes: map,
        })
    }

    /// Serializes to an ordered mapping: the fixed fields, the instance
    /// attributes in assignment order and finally the class name.
    pub fn to_map(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert(String::from("id"), Value::from(self.id.as_str()));
        map.insert(String::from("created_at"), Value::from(self.created_at.format(TIME_FORMAT).to_string()));
        map.insert(String::from("updated_at"), Value::from(self.updated_at.format(TIME_FORMAT).to_string()));
        for (key, value) in &self.attributes {
            map.insert(key.clone(), value.clone());
        }
        map.insert(String::from(CLASS_KEY), Value::from(self.class.name()));
        map
    }

    pub fn class(&self) -> ClassName {
        self.class
    }
    pub fn id(&self) -> &str {
        &self.id
    }
    pub fn created_at(&self) -> NaiveDateTime {
        self.created_at
    }
    pub fn updated_at(&self) -> NaiveDateTime {
        self.updated_at
    }
    /// Partition key in the store, `<Class>.<id>`.
    pub fn key(&self) -> String {
        format!("{}.{}", self.class, self.id)
    }
    pub fn attributes(&self) -> &Map<String, Value> {
        &self.attributes
    }

    /// Reads an attribute, falling back to the class default for declared
    /// attributes that were never assigned.
    pub fn get(&self, name: &str) -> Option<Value> {
        match name {
            "id" => Some(Value::from(self.id.as_str())),
            "created_at" => Some(Value::from(self.created_at.format(TIME_FORMAT).to_string())),
            "updated_at" => Some(Value::from(self.updated_at.format(TIME_FORMAT).to_string())),
            _ => self
                .attributes
                .get(name)
                .cloned()
                .or_else(|| self.class.default_value(name)),
        }
    }

    /// Assigns an attribute. Returns `false`, leaving the entity untouched,
    /// for the reserved names.
    pub fn set(&mut self, name: &str, value: Value) -> bool {
        if is_reserved(name) {
            return false;
        }
        self.attributes.insert(name.to_string(), value);
        true
    }

    /// Moves `updated_at` to now, or one microsecond past its previous value
    /// when the clock has not advanced.
    pub fn refresh_updated_at(&mut self) {
        let mut stamp = now();
        if stamp <= self.updated_at {
            stamp = self.updated_at + TimeDelta::microseconds(1);
        }
        self.updated_at = stamp;
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "[{}] ({}) {{'id': {}, 'created_at': {}, 'updated_at': {}",
            self.class,
            self.id,
            repr_str(&self.id),
            repr_datetime(&self.created_at),
            repr_datetime(&self.updated_at)
        )?;
        for (key, value) in &self.attributes {
            write!(f, ", {}: {}", repr_str(key), py_repr(value))?;
        }
        f.write_str("}")
    }
}

pub fn is_reserved(name: &str) -> bool {
    RESERVED.contains(&name)
}

fn parse_time(value: Option<Value>, field: &str) -> Result<NaiveDateTime> {
    match value {
        Some(Value::String(text)) => NaiveDateTime::parse_from_str(&text, TIME_FORMAT)
            .map_err(|e| corrupt(format!("bad {field} `{text}`: {e}"))),
        _ => Err(corrupt(format!("missing {field}"))),
    }
}

fn corrupt(message: String) -> HbnbError {
    HbnbError::DataCorruption { message }
}
