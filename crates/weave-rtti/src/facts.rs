//! Auxiliary facts table
//!
//! Per-method facts produced by static analysis of method bodies: which
//! fields a method reads, writes, sets or returns, which collections it
//! adds to or removes from, which methods it calls and whether it
//! delegates to its super implementation.
//!
//! The table is a pure data sink. Facts are keyed by the class that
//! declares the method body and the method's canonical signature
//! (`addAccount(Account)`); repeated facts are idempotent.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

/// A call from one method to another
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InvokedMethod {
    /// Class declaring the callee
    pub class: String,
    /// Callee signature (`getBalance()`) or bare name
    pub method: String,
}

impl InvokedMethod {
    /// Create an invocation record
    pub fn new(class: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            method: method.into(),
        }
    }
}

/// Facts about one method body
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MethodFacts {
    /// Fields read
    pub accessed_fields: BTreeSet<String>,
    /// Fields written
    pub modified_fields: BTreeSet<String>,
    /// Fields assigned from a parameter
    pub set_fields: BTreeSet<String>,
    /// Field whose value is returned
    #[serde(skip_serializing_if = "Option::is_none")]
    pub returned_field: Option<String>,
    /// The body is a plain getter of `returned_field`
    pub is_getter: bool,
    /// Collections added to
    pub added_collections: BTreeSet<String>,
    /// Collections removed from
    pub removed_collections: BTreeSet<String>,
    /// Collections modified otherwise
    pub modified_collections: BTreeSet<String>,
    /// Parameter used as a collection key
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collection_index_argument: Option<usize>,
    /// Parameter used as the collection element
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collection_item_argument: Option<usize>,
    /// Methods called
    pub invoked_methods: BTreeSet<InvokedMethod>,
    /// The body calls the overridden implementation
    pub calls_super: bool,
}

impl MethodFacts {
    /// Whether no fact was recorded
    pub fn is_empty(&self) -> bool {
        *self == MethodFacts::default()
    }
}

/// Facts about the methods of one class, keyed by signature
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassFacts {
    methods: BTreeMap<String, MethodFacts>,
}

impl ClassFacts {
    /// Facts of a method, if any were recorded
    pub fn method(&self, signature: &str) -> Option<&MethodFacts> {
        self.methods.get(signature)
    }

    fn method_mut(&mut self, signature: &str) -> &mut MethodFacts {
        self.methods.entry(signature.to_string()).or_default()
    }

    /// Signatures with recorded facts
    pub fn signatures(&self) -> impl Iterator<Item = &str> {
        self.methods.keys().map(String::as_str)
    }
}

/// Receiver of facts produced by a static analysis pass
pub trait FactSink {
    /// Method reads `field`
    fn add_accessed_field(&mut self, class: &str, method: &str, field: &str);
    /// Method writes `field`
    fn add_modified_field(&mut self, class: &str, method: &str, field: &str);
    /// Method assigns `field` from a parameter
    fn add_set_field(&mut self, class: &str, method: &str, field: &str);
    /// Method returns the value of `field`
    fn add_returned_field(&mut self, class: &str, method: &str, field: &str);
    /// Method adds to collection `field`
    fn add_added_collection(&mut self, class: &str, method: &str, field: &str);
    /// Method removes from collection `field`
    fn add_removed_collection(&mut self, class: &str, method: &str, field: &str);
    /// Method otherwise modifies collection `field`
    fn add_modified_collection(&mut self, class: &str, method: &str, field: &str);
    /// Parameter `argument` is used as a collection key
    fn set_collection_index_argument(&mut self, class: &str, method: &str, argument: usize);
    /// Parameter `argument` is the element added or removed
    fn set_collection_item_argument(&mut self, class: &str, method: &str, argument: usize);
    /// Method calls `invoked`
    fn add_invoked_method(&mut self, class: &str, method: &str, invoked: InvokedMethod);
    /// Method calls its overridden implementation
    fn set_call_super(&mut self, class: &str, method: &str);
    /// Method body is a plain getter
    fn set_is_getter(&mut self, class: &str, method: &str, is_getter: bool);
}

/// In-memory facts table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FactTable {
    classes: BTreeMap<String, ClassFacts>,
}

impl FactTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a table from a `.json` or `.toml` file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Ok(toml::from_str(&content)?),
            _ => Ok(serde_json::from_str(&content)?),
        }
    }

    /// Serialize the table as pretty JSON
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Facts of a class
    pub fn class(&self, class: &str) -> Option<&ClassFacts> {
        self.classes.get(class)
    }

    /// Facts of a method; empty facts when nothing was recorded
    pub fn method(&self, class: &str, signature: &str) -> MethodFacts {
        self.classes
            .get(class)
            .and_then(|c| c.method(signature))
            .cloned()
            .unwrap_or_default()
    }

    /// Names of classes with recorded facts
    pub fn class_names(&self) -> impl Iterator<Item = &str> {
        self.classes.keys().map(String::as_str)
    }

    /// Merge another table into this one (set union)
    pub fn merge(&mut self, other: FactTable) {
        for (class, facts) in other.classes {
            for (signature, m) in facts.methods {
                let target = self.entry(&class, &signature);
                target.accessed_fields.extend(m.accessed_fields);
                target.modified_fields.extend(m.modified_fields);
                target.set_fields.extend(m.set_fields);
                if m.returned_field.is_some() {
                    target.returned_field = m.returned_field;
                }
                target.is_getter |= m.is_getter;
                target.added_collections.extend(m.added_collections);
                target.removed_collections.extend(m.removed_collections);
                target.modified_collections.extend(m.modified_collections);
                target.collection_index_argument =
                    m.collection_index_argument.or(target.collection_index_argument);
                target.collection_item_argument =
                    m.collection_item_argument.or(target.collection_item_argument);
                target.invoked_methods.extend(m.invoked_methods);
                target.calls_super |= m.calls_super;
            }
        }
    }

    fn entry(&mut self, class: &str, method: &str) -> &mut MethodFacts {
        self.classes
            .entry(class.to_string())
            .or_default()
            .method_mut(method)
    }
}

impl FactSink for FactTable {
    fn add_accessed_field(&mut self, class: &str, method: &str, field: &str) {
        self.entry(class, method).accessed_fields.insert(field.to_string());
    }

    fn add_modified_field(&mut self, class: &str, method: &str, field: &str) {
        self.entry(class, method).modified_fields.insert(field.to_string());
    }

    fn add_set_field(&mut self, class: &str, method: &str, field: &str) {
        self.entry(class, method).set_fields.insert(field.to_string());
    }

    fn add_returned_field(&mut self, class: &str, method: &str, field: &str) {
        self.entry(class, method).returned_field = Some(field.to_string());
    }

    fn add_added_collection(&mut self, class: &str, method: &str, field: &str) {
        self.entry(class, method).added_collections.insert(field.to_string());
    }

    fn add_removed_collection(&mut self, class: &str, method: &str, field: &str) {
        self.entry(class, method).removed_collections.insert(field.to_string());
    }

    fn add_modified_collection(&mut self, class: &str, method: &str, field: &str) {
        self.entry(class, method).modified_collections.insert(field.to_string());
    }

    fn set_collection_index_argument(&mut self, class: &str, method: &str, argument: usize) {
        self.entry(class, method).collection_index_argument = Some(argument);
    }

    fn set_collection_item_argument(&mut self, class: &str, method: &str, argument: usize) {
        self.entry(class, method).collection_item_argument = Some(argument);
    }

    fn add_invoked_method(&mut self, class: &str, method: &str, invoked: InvokedMethod) {
        self.entry(class, method).invoked_methods.insert(invoked);
    }

    fn set_call_super(&mut self, class: &str, method: &str) {
        self.entry(class, method).calls_super = true;
    }

    fn set_is_getter(&mut self, class: &str, method: &str, is_getter: bool) {
        self.entry(class, method).is_getter = is_getter;
    }
}
