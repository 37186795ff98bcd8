//! Rewriting of `Class.method(args)` calls into plain console commands.
//!
//! Everything here is string to string; the console decides what to do with
//! the result. `User.show("42")` becomes `show User 42 `,
//! `User.update("42", "name", "Betty")` becomes `update User 42 name "Betty"`,
//! and `User.update("42", {'name': "Betty"})` is handed over whole as a
//! dictionary update.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref DOT_CALL: Regex = Regex::new(r"^(\w*)\.(\w+)(?:\(([^)]*)\))$").unwrap();
    static ref QUOTED_ID: Regex = Regex::new(r#"^"([^"]*)"(?:, (.*))?$"#).unwrap();
    static ref DICTIONARY: Regex = Regex::new(r"^(\{.*\})$").unwrap();
    static ref ATTRIBUTE_AND_VALUE: Regex = Regex::new(r#"^(?:"([^"]*)")?(?:, (.*))?$"#).unwrap();
}

/// The pieces of a recognized dot-call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DotCall {
    pub class_name: String,
    pub method: String,
    /// The quoted first argument, or the whole argument text when nothing
    /// is quoted. Empty for `Class.method()`.
    pub uid: String,
    /// Whatever follows the quoted id and its comma.
    pub remainder: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Translation {
    /// Not a dot-call; the line goes through unchanged.
    Passthrough,
    /// A canonical command line ready for dispatch.
    Command(String),
    /// `Class.update("id", {...})` with the raw dictionary text.
    DictUpdate {
        class_name: String,
        uid: String,
        dictionary: String,
    },
}

/// Recognizes `Class.method(args)`.
pub fn parse(line: &str) -> Option<DotCall> {
    let captures = DOT_CALL.captures(line)?;
    let class_name = captures.get(1).map_or("", |m| m.as_str()).to_string();
    let method = captures.get(2).map_or("", |m| m.as_str()).to_string();
    let args = captures.get(3).map_or("", |m| m.as_str());
    let (uid, remainder) = match QUOTED_ID.captures(args) {
        Some(quoted) => (
            quoted.get(1).map_or("", |m| m.as_str()).to_string(),
            quoted.get(2).map(|m| m.as_str().to_string()),
        ),
        None => (args.to_string(), None),
    };
    Some(DotCall {
        class_name,
        method,
        uid,
        remainder,
    })
}

impl DotCall {
    pub fn translate(&self) -> Translation {
        let mut attribute_and_value = String::new();
        if self.method == "update" {
            if let Some(remainder) = self.remainder.as_deref().filter(|r| !r.is_empty()) {
                if let Some(dictionary) = DICTIONARY.captures(remainder) {
                    return Translation::DictUpdate {
                        class_name: self.class_name.clone(),
                        uid: self.uid.clone(),
                        dictionary: dictionary[1].to_string(),
                    };
                }
                if let Some(pair) = ATTRIBUTE_AND_VALUE.captures(remainder) {
                    attribute_and_value = format!(
                        "{} {}",
                        pair.get(1).map_or("", |m| m.as_str()),
                        pair.get(2).map_or("", |m| m.as_str())
                    );
                }
            }
        }
        Translation::Command(format!(
            "{} {} {} {}",
            self.method, self.class_name, self.uid, attribute_and_value
        ))
    }
}

/// Parses and translates in one step.
pub fn translate(line: &str) -> Translation {
    parse(line).map_or(Translation::Passthrough, |call| call.translate())
}
