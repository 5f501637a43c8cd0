//! Weave RTTI: reflective metadata for the Weave aspect runtime
//!
//! This crate builds class, field and method descriptors over a
//! [`NativeModel`] and enriches them with behavioral facts about method
//! bodies:
//! - Logical-name registry with virtual classes
//! - Lazy field construction, inherited members and expression fields
//! - Getter, setter, adder and remover classification
//! - Field and method dependency graph
//! - Attribute storage with owner gating and access control
//! - Configuration declarations (weave.toml)
//!
//! ```ignore
//! let model = NativeModel::from_file(Path::new("model.toml"))?;
//! let facts = FactTable::from_file(Path::new("facts.json"))?;
//! let mut repo = Repository::new(model).with_facts(facts);
//! let bank = repo.get_class("Bank")?;
//! let accounts = repo.get_collection(bank, "accounts")?;
//! let adder = repo.adder(accounts)?;
//! ```

#![warn(missing_docs)]

pub mod attributes;
pub mod class;
pub mod config;
pub mod configure;
pub mod descriptor;
pub mod error;
pub mod facts;
pub mod field;
pub mod method;
pub mod method_table;
pub mod model;
pub mod naming;
pub mod query;
pub mod repository;

pub use attributes::{AttrValue, AttributeController, AttributeMap};
pub use class::{BuildState, ClassDescriptor, MemberCounts, VirtualClass};
pub use config::{ConfigError, Declarations, RttiConfig, RttiSettings};
pub use descriptor::{ClassId, FieldId, ItemId, MemberId, MethodId, VirtualId};
pub use error::{Result, RttiError};
pub use facts::{ClassFacts, FactSink, FactTable, InvokedMethod, MethodFacts};
pub use field::{CollectionInfo, FieldDescriptor, FieldOrigin, FieldVariant};
pub use method::{MethodDescriptor, MethodKind};
pub use method_table::MethodTable;
pub use model::{CollectionKind, Modifiers, NativeClass, NativeModel, TypeRef};
pub use naming::{NamingConventions, PrefixFamily};
pub use repository::{Diagnostic, Repository};
