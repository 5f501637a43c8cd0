//! Native type model
//!
//! The structural facts the repository builds on: classes with their
//! superclass, interfaces, fields, methods and constructors. Models are
//! plain data, usually loaded from a TOML or JSON file:
//!
//! ```toml
//! [[classes]]
//! name = "Bank"
//! fields = [{ name = "accounts", type = "Map" }]
//! methods = [{ name = "addAccount", params = ["Account"] }]
//! ```
//!
//! A handful of builtin classes (`Object`, `String`, the collection
//! interfaces) are always present.

use std::fmt;
use std::path::Path;

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

/// Root of every class hierarchy
pub const OBJECT: &str = "Object";
/// Root collection interface
pub const COLLECTION: &str = "Collection";
/// Ordered collection interface
pub const LIST: &str = "List";
/// Unordered unique collection interface
pub const SET: &str = "Set";
/// Keyed collection interface
pub const MAP: &str = "Map";
/// Element type of a map iterated as entries
pub const MAP_ENTRY: &str = "Map.Entry";

const PRIMITIVES: [&str; 8] = [
    "boolean", "byte", "char", "short", "int", "long", "float", "double",
];

/// Reference to a type by name: `int`, `void`, `Account`, `Account[]`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeRef(String);

impl TypeRef {
    /// Create a type reference from its name
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The `void` type
    pub fn void() -> Self {
        Self("void".to_string())
    }

    /// Array of the given element type
    pub fn array_of(element: &TypeRef) -> Self {
        Self(format!("{}[]", element.0))
    }

    /// Type name
    pub fn name(&self) -> &str {
        &self.0
    }

    /// Whether this is `void`
    pub fn is_void(&self) -> bool {
        self.0 == "void"
    }

    /// Whether this is a primitive value type
    pub fn is_primitive(&self) -> bool {
        PRIMITIVES.contains(&self.0.as_str())
    }

    /// Whether this is an array type
    pub fn is_array(&self) -> bool {
        self.0.ends_with("[]")
    }

    /// Element type of an array
    pub fn element(&self) -> Option<TypeRef> {
        self.0.strip_suffix("[]").map(TypeRef::new)
    }

    /// Name without package path (`bank.Account[]` → `Account[]`)
    pub fn short_name(&self) -> &str {
        crate::naming::short_class_name(&self.0)
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TypeRef {
    fn from(name: &str) -> Self {
        TypeRef::new(name)
    }
}

/// Canonical signature string: `name(T1,T2)`
pub fn signature(name: &str, params: &[TypeRef]) -> String {
    let params: Vec<&str> = params.iter().map(TypeRef::name).collect();
    format!("{}({})", name, params.join(","))
}

/// Parameter list rendered with short type names: `(Account,int)`
pub fn compact_params(params: &[TypeRef]) -> String {
    let params: Vec<&str> = params.iter().map(TypeRef::short_name).collect();
    format!("({})", params.join(","))
}

/// Member and class modifier flags (bitflags)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct Modifiers(u16);

impl Modifiers {
    /// No modifier
    pub const NONE: Self = Self(0x000);
    /// Visible everywhere
    pub const PUBLIC: Self = Self(0x001);
    /// Visible to subclasses
    pub const PROTECTED: Self = Self(0x002);
    /// Visible to the declaring class only
    pub const PRIVATE: Self = Self(0x004);
    /// Class-level member
    pub const STATIC: Self = Self(0x008);
    /// Cannot be reassigned or overridden
    pub const FINAL: Self = Self(0x010);
    /// Not part of the persistent state
    pub const TRANSIENT: Self = Self(0x020);
    /// No body / not instantiable
    pub const ABSTRACT: Self = Self(0x040);

    const NAMED: [(&'static str, Modifiers); 7] = [
        ("public", Self::PUBLIC),
        ("protected", Self::PROTECTED),
        ("private", Self::PRIVATE),
        ("static", Self::STATIC),
        ("final", Self::FINAL),
        ("transient", Self::TRANSIENT),
        ("abstract", Self::ABSTRACT),
    ];

    /// Raw bits
    pub const fn bits(&self) -> u16 {
        self.0
    }

    /// Check if all flags of `other` are set
    pub const fn contains(&self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    /// Union of flags
    pub const fn union(&self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Parse a single modifier keyword
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim().to_ascii_lowercase();
        Self::NAMED
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, m)| *m)
    }

    /// Keywords of the set flags, in declaration order
    pub fn names(&self) -> Vec<&'static str> {
        Self::NAMED
            .iter()
            .filter(|(_, m)| self.contains(*m))
            .map(|(n, _)| *n)
            .collect()
    }

    /// Visible outside the declaring class hierarchy
    pub fn is_public(&self) -> bool {
        self.contains(Self::PUBLIC)
    }

    /// Class-level member
    pub fn is_static(&self) -> bool {
        self.contains(Self::STATIC)
    }
}

impl std::ops::BitOr for Modifiers {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

impl TryFrom<Vec<String>> for Modifiers {
    type Error = String;

    fn try_from(names: Vec<String>) -> Result<Self, Self::Error> {
        names.iter().try_fold(Modifiers::NONE, |acc, name| {
            Modifiers::from_name(name)
                .map(|m| acc.union(m))
                .ok_or_else(|| format!("unknown modifier: {}", name))
        })
    }
}

impl From<Modifiers> for Vec<String> {
    fn from(modifiers: Modifiers) -> Self {
        modifiers.names().into_iter().map(String::from).collect()
    }
}

fn public() -> Modifiers {
    Modifiers::PUBLIC
}

fn void() -> TypeRef {
    TypeRef::void()
}

/// A storage slot declared by a class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NativeField {
    /// Field name
    pub name: String,
    /// Declared type
    #[serde(rename = "type")]
    pub ty: TypeRef,
    /// Modifiers (default: none, i.e. package-private)
    #[serde(default)]
    pub modifiers: Modifiers,
}

/// A method declared by a class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NativeMethod {
    /// Method name
    pub name: String,
    /// Parameter types
    #[serde(default)]
    pub params: Vec<TypeRef>,
    /// Return type (default `void`)
    #[serde(default = "void", rename = "returns")]
    pub return_type: TypeRef,
    /// Modifiers (default `public`)
    #[serde(default = "public")]
    pub modifiers: Modifiers,
}

impl NativeMethod {
    /// Canonical signature, `name(T1,T2)`
    pub fn signature(&self) -> String {
        signature(&self.name, &self.params)
    }
}

/// A constructor declared by a class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NativeConstructor {
    /// Parameter types
    #[serde(default)]
    pub params: Vec<TypeRef>,
    /// Modifiers (default `public`)
    #[serde(default = "public")]
    pub modifiers: Modifiers,
}

/// A class or interface definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NativeClass {
    /// Fully qualified name
    pub name: String,
    /// Superclass name (`Object` when omitted, none for `Object` itself and interfaces)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub superclass: Option<String>,
    /// Implemented (or extended, for interfaces) interfaces
    #[serde(default)]
    pub interfaces: Vec<String>,
    /// Class modifiers
    #[serde(default = "public")]
    pub modifiers: Modifiers,
    /// Interface rather than class
    #[serde(default)]
    pub interface: bool,
    /// Declared fields
    #[serde(default)]
    pub fields: Vec<NativeField>,
    /// Declared methods
    #[serde(default)]
    pub methods: Vec<NativeMethod>,
    /// Declared constructors
    #[serde(default)]
    pub constructors: Vec<NativeConstructor>,
}

impl NativeClass {
    /// Empty public class extending `Object`
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            superclass: None,
            interfaces: Vec::new(),
            modifiers: Modifiers::PUBLIC,
            interface: false,
            fields: Vec::new(),
            methods: Vec::new(),
            constructors: Vec::new(),
        }
    }

    /// Empty public interface
    pub fn interface(name: impl Into<String>) -> Self {
        Self {
            interface: true,
            ..Self::new(name)
        }
    }

    /// Set the superclass
    pub fn extends(mut self, superclass: impl Into<String>) -> Self {
        self.superclass = Some(superclass.into());
        self
    }

    /// Add an implemented interface
    pub fn implements(mut self, interface: impl Into<String>) -> Self {
        self.interfaces.push(interface.into());
        self
    }

    /// Add a field with default modifiers
    pub fn field(mut self, name: &str, ty: &str) -> Self {
        self.fields.push(NativeField {
            name: name.to_string(),
            ty: TypeRef::new(ty),
            modifiers: Modifiers::NONE,
        });
        self
    }

    /// Add a field with explicit modifiers
    pub fn field_with(mut self, name: &str, ty: &str, modifiers: Modifiers) -> Self {
        self.fields.push(NativeField {
            name: name.to_string(),
            ty: TypeRef::new(ty),
            modifiers,
        });
        self
    }

    /// Add a public method
    pub fn method(self, name: &str, params: &[&str], returns: &str) -> Self {
        self.method_with(name, params, returns, Modifiers::PUBLIC)
    }

    /// Add a method with explicit modifiers
    pub fn method_with(mut self, name: &str, params: &[&str], returns: &str, modifiers: Modifiers) -> Self {
        self.methods.push(NativeMethod {
            name: name.to_string(),
            params: params.iter().map(|p| TypeRef::new(*p)).collect(),
            return_type: TypeRef::new(returns),
            modifiers,
        });
        self
    }

    /// Add a public constructor
    pub fn constructor(mut self, params: &[&str]) -> Self {
        self.constructors.push(NativeConstructor {
            params: params.iter().map(|p| TypeRef::new(*p)).collect(),
            modifiers: Modifiers::PUBLIC,
        });
        self
    }

    /// Effective superclass name
    pub fn superclass_name(&self) -> Option<&str> {
        match &self.superclass {
            Some(name) => Some(name),
            None if self.interface || self.name == OBJECT => None,
            None => Some(OBJECT),
        }
    }

    /// Whether the class is abstract (interfaces always are)
    pub fn is_abstract(&self) -> bool {
        self.interface || self.modifiers.contains(Modifiers::ABSTRACT)
    }
}

/// Kind of a collection-like type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionKind {
    /// Native array
    Array,
    /// Ordered collection
    List,
    /// Unique-element collection
    Set,
    /// Keyed collection
    Map,
    /// Any other collection
    Other,
}

impl fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CollectionKind::Array => "array",
            CollectionKind::List => "list",
            CollectionKind::Set => "set",
            CollectionKind::Map => "map",
            CollectionKind::Other => "collection",
        };
        f.write_str(name)
    }
}

/// A method visible on a class, with the class that declares its body
#[derive(Debug, Clone, Copy)]
pub struct VisibleMethod<'a> {
    /// Declaring class name
    pub declaring: &'a str,
    /// Method definition
    pub method: &'a NativeMethod,
}

/// On-disk model layout
#[derive(Debug, Default, Serialize, Deserialize)]
struct ModelFile {
    #[serde(default)]
    classes: Vec<NativeClass>,
}

/// Registry of native class definitions
#[derive(Debug, Clone)]
pub struct NativeModel {
    classes: FxHashMap<String, NativeClass>,
    order: Vec<String>,
}

impl Default for NativeModel {
    fn default() -> Self {
        Self::new()
    }
}

impl NativeModel {
    /// Create a model holding only the builtin classes
    pub fn new() -> Self {
        let mut model = Self {
            classes: FxHashMap::default(),
            order: Vec::new(),
        };
        model.add(NativeClass::new(OBJECT));
        model.add(NativeClass::new("String"));
        model.add(NativeClass::interface(COLLECTION));
        model.add(NativeClass::interface(LIST).implements(COLLECTION));
        model.add(NativeClass::interface(SET).implements(COLLECTION));
        model.add(NativeClass::interface(MAP));
        model.add(NativeClass::interface(MAP_ENTRY));
        model
    }

    /// Build a model from class definitions (builtins included)
    pub fn from_classes(classes: impl IntoIterator<Item = NativeClass>) -> Self {
        let mut model = Self::new();
        for class in classes {
            model.add(class);
        }
        model
    }

    /// Load a model from a `.toml` or `.json` file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(&content),
            _ => Self::from_toml(&content),
        }
    }

    /// Parse a model from TOML
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let file: ModelFile = toml::from_str(content)?;
        Self::validated(file)
    }

    /// Parse a model from JSON
    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let file: ModelFile = serde_json::from_str(content)?;
        Self::validated(file)
    }

    fn validated(file: ModelFile) -> Result<Self, ConfigError> {
        let mut seen = FxHashSet::default();
        for class in &file.classes {
            if class.name.is_empty() {
                return Err(ConfigError::Invalid("class name cannot be empty".to_string()));
            }
            if !seen.insert(class.name.as_str()) {
                return Err(ConfigError::Invalid(format!("class {} is defined twice", class.name)));
            }
        }
        let model = Self::from_classes(file.classes);
        model.check_hierarchy()?;
        Ok(model)
    }

    fn check_hierarchy(&self) -> Result<(), ConfigError> {
        for name in &self.order {
            let mut seen = FxHashSet::default();
            let mut current = Some(name.as_str());
            while let Some(class) = current {
                if !seen.insert(class) {
                    return Err(ConfigError::Invalid(format!(
                        "class {} is its own ancestor",
                        name
                    )));
                }
                current = self.get(class).and_then(NativeClass::superclass_name);
            }
        }
        Ok(())
    }

    /// Add or replace a class definition
    pub fn add(&mut self, class: NativeClass) {
        if !self.classes.contains_key(&class.name) {
            self.order.push(class.name.clone());
        }
        self.classes.insert(class.name.clone(), class);
    }

    /// Class definition by name
    pub fn get(&self, name: &str) -> Option<&NativeClass> {
        self.classes.get(name)
    }

    /// Whether a class or a primitive/array type of that name exists
    pub fn contains(&self, name: &str) -> bool {
        self.resolve(name).is_some()
    }

    /// Class definition for a type name, synthesizing primitives and arrays
    pub fn resolve(&self, name: &str) -> Option<NativeClass> {
        if let Some(class) = self.classes.get(name) {
            return Some(class.clone());
        }
        let ty = TypeRef::new(name);
        if ty.is_primitive() {
            return Some(NativeClass {
                modifiers: Modifiers::PUBLIC | Modifiers::FINAL,
                ..NativeClass::new(name)
            });
        }
        if let Some(element) = ty.element() {
            if self.contains(element.name()) {
                return Some(NativeClass {
                    modifiers: Modifiers::PUBLIC | Modifiers::FINAL,
                    ..NativeClass::new(name)
                });
            }
        }
        None
    }

    /// Class names in definition order
    pub fn class_names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Number of classes (builtins included)
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the model is empty (never true: builtins are always present)
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Superclass chain of a class, nearest first
    pub fn ancestors(&self, name: &str) -> Vec<&NativeClass> {
        let mut chain = Vec::new();
        let mut current = self.get(name).and_then(NativeClass::superclass_name);
        while let Some(parent) = current {
            match self.get(parent) {
                Some(class) if !chain.iter().any(|c: &&NativeClass| c.name == class.name) => {
                    chain.push(class);
                    current = class.superclass_name();
                }
                _ => break,
            }
        }
        chain
    }

    /// Whether a value of type `from` can be used where `to` is expected
    pub fn is_assignable(&self, from: &TypeRef, to: &TypeRef) -> bool {
        if from == to || (to.name() == OBJECT && !from.is_primitive() && !from.is_void()) {
            return true;
        }
        if let (Some(f), Some(t)) = (from.element(), to.element()) {
            return !f.is_primitive() && self.is_assignable(&f, &t);
        }
        let mut visited = FxHashSet::default();
        self.is_subtype(from.name(), to.name(), &mut visited)
    }

    fn is_subtype<'a>(&'a self, from: &'a str, to: &str, visited: &mut FxHashSet<&'a str>) -> bool {
        if from == to {
            return true;
        }
        if !visited.insert(from) {
            return false;
        }
        let Some(class) = self.get(from) else {
            return false;
        };
        class
            .superclass_name()
            .into_iter()
            .chain(class.interfaces.iter().map(String::as_str))
            .any(|parent| self.is_subtype(parent, to, visited))
    }

    /// Collection kind of a type, `None` when it is not collection-like.
    ///
    /// Byte arrays are treated as opaque values, not collections.
    pub fn collection_kind(&self, ty: &TypeRef) -> Option<CollectionKind> {
        if let Some(element) = ty.element() {
            return (element.name() != "byte").then_some(CollectionKind::Array);
        }
        let kind = |name: &str| self.is_assignable(ty, &TypeRef::new(name));
        if kind(MAP) {
            Some(CollectionKind::Map)
        } else if kind(SET) {
            Some(CollectionKind::Set)
        } else if kind(LIST) {
            Some(CollectionKind::List)
        } else if kind(COLLECTION) {
            Some(CollectionKind::Other)
        } else {
            None
        }
    }

    /// Whether a type is collection-like
    pub fn is_collection_type(&self, ty: &TypeRef) -> bool {
        self.collection_kind(ty).is_some()
    }

    /// Storage slots of a class, inherited ones first, filtered by `keep`.
    ///
    /// A redeclared field hides the inherited one of the same name.
    pub fn storage_slots(&self, name: &str, keep: impl Fn(&str) -> bool) -> Vec<&NativeField> {
        let mut hierarchy = self.ancestors(name);
        hierarchy.reverse();
        if let Some(class) = self.get(name) {
            hierarchy.push(class);
        }
        let mut slots: Vec<&NativeField> = Vec::new();
        for class in hierarchy.into_iter().filter(|c| c.name != OBJECT) {
            for field in class.fields.iter().filter(|f| keep(&f.name)) {
                match slots.iter().position(|s| s.name == field.name) {
                    Some(index) => slots[index] = field,
                    None => slots.push(field),
                }
            }
        }
        slots
    }

    /// Public methods of a class: declared ones first, then inherited
    /// ones not hidden by an override. Methods declared on `Object` are
    /// left out.
    pub fn public_methods(&self, name: &str) -> Vec<VisibleMethod<'_>> {
        let Some(class) = self.get(name) else {
            return Vec::new();
        };
        let mut seen = FxHashSet::default();
        let mut methods = Vec::new();
        let mut lineage = vec![class];
        lineage.extend(self.ancestors(name));
        if class.interface {
            lineage.extend(self.super_interfaces(name));
        }
        for owner in lineage.into_iter().filter(|c| c.name != OBJECT) {
            for method in owner.methods.iter().filter(|m| m.modifiers.is_public()) {
                if seen.insert(method.signature()) {
                    methods.push(VisibleMethod {
                        declaring: owner.name.as_str(),
                        method,
                    });
                }
            }
        }
        methods
    }

    fn super_interfaces(&self, name: &str) -> Vec<&NativeClass> {
        let mut out: Vec<&NativeClass> = Vec::new();
        let mut stack: Vec<&str> = self
            .get(name)
            .map(|c| c.interfaces.iter().map(String::as_str).collect())
            .unwrap_or_default();
        while let Some(next) = stack.pop() {
            if let Some(class) = self.get(next) {
                if !out.iter().any(|c| c.name == class.name) {
                    stack.extend(class.interfaces.iter().map(String::as_str));
                    out.push(class);
                }
            }
        }
        out
    }

    /// Public constructors declared by the class itself
    pub fn public_constructors(&self, name: &str) -> Vec<&NativeConstructor> {
        self.get(name)
            .map(|c| c.constructors.iter().filter(|k| k.modifiers.is_public()).collect())
            .unwrap_or_default()
    }

    /// Whether the class (or an ancestor) declares a method with this signature at any visibility
    pub fn declares_method(&self, name: &str, sig: &str) -> bool {
        self.get(name)
            .into_iter()
            .chain(self.ancestors(name))
            .any(|c| c.methods.iter().any(|m| m.signature() == sig))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> NativeModel {
        NativeModel::from_classes([
            NativeClass::new("Item").field("name", "String"),
            NativeClass::new("Base")
                .field("items", "List")
                .field("__hidden", "int")
                .method("addItem", &["Item"], "void")
                .method_with("helper", &[], "void", Modifiers::PROTECTED),
            NativeClass::new("Derived")
                .extends("Base")
                .field("count", "int")
                .method("addItem", &["Item"], "void")
                .method("getCount", &[], "int"),
            NativeClass::new("ItemList").implements(LIST),
        ])
    }

    #[test]
    fn test_type_ref() {
        let ty = TypeRef::new("bank.Account[]");
        assert!(ty.is_array());
        assert_eq!(ty.element(), Some(TypeRef::new("bank.Account")));
        assert_eq!(ty.short_name(), "Account[]");
        assert!(TypeRef::new("int").is_primitive());
        assert!(TypeRef::void().is_void());
        assert_eq!(signature("foo", &[TypeRef::new("int"), TypeRef::new("a.B")]), "foo(int,a.B)");
        assert_eq!(compact_params(&[TypeRef::new("a.B")]), "(B)");
    }

    #[test]
    fn test_modifiers() {
        let m = Modifiers::PUBLIC | Modifiers::STATIC;
        assert!(m.is_public());
        assert!(m.is_static());
        assert!(!m.contains(Modifiers::FINAL));
        assert_eq!(m.names(), vec!["public", "static"]);
        assert_eq!(Modifiers::from_name("Transient"), Some(Modifiers::TRANSIENT));
        assert!(Modifiers::try_from(vec!["bogus".to_string()]).is_err());
    }

    #[test]
    fn test_assignability() {
        let model = model();
        assert!(model.is_assignable(&"Derived".into(), &"Base".into()));
        assert!(model.is_assignable(&"Derived".into(), &OBJECT.into()));
        assert!(!model.is_assignable(&"Base".into(), &"Derived".into()));
        assert!(model.is_assignable(&"ItemList".into(), &COLLECTION.into()));
        assert!(model.is_assignable(&"Derived[]".into(), &"Base[]".into()));
        assert!(!model.is_assignable(&"int".into(), &OBJECT.into()));
    }

    #[test]
    fn test_collection_kind() {
        let model = model();
        assert_eq!(model.collection_kind(&"List".into()), Some(CollectionKind::List));
        assert_eq!(model.collection_kind(&"ItemList".into()), Some(CollectionKind::List));
        assert_eq!(model.collection_kind(&MAP.into()), Some(CollectionKind::Map));
        assert_eq!(model.collection_kind(&"Item[]".into()), Some(CollectionKind::Array));
        assert_eq!(model.collection_kind(&"byte[]".into()), None);
        assert_eq!(model.collection_kind(&"Item".into()), None);
    }

    #[test]
    fn test_storage_slots_include_inherited() {
        let model = model();
        let slots: Vec<&str> = model
            .storage_slots("Derived", |n| !n.starts_with("__"))
            .iter()
            .map(|f| f.name.as_str())
            .collect();
        assert_eq!(slots, vec!["items", "count"]);
    }

    #[test]
    fn test_public_methods_hide_overridden() {
        let model = model();
        let methods = model.public_methods("Derived");
        let add: Vec<_> = methods.iter().filter(|m| m.method.name == "addItem").collect();
        assert_eq!(add.len(), 1);
        assert_eq!(add[0].declaring, "Derived");
        assert!(!methods.iter().any(|m| m.method.name == "helper"));
        assert!(model.declares_method("Derived", "helper()"));
    }

    #[test]
    fn test_resolve_synthesizes_primitives_and_arrays() {
        let model = model();
        assert!(model.resolve("int").is_some());
        assert!(model.resolve("Item[]").is_some());
        assert!(model.resolve("Nope[]").is_none());
        assert!(model.resolve("Nope").is_none());
    }

    #[test]
    fn test_from_toml() {
        let model = NativeModel::from_toml(
            r#"
[[classes]]
name = "Bank"
fields = [{ name = "accounts", type = "Map" }]
methods = [{ name = "addAccount", params = ["Account"] }]

[[classes]]
name = "Account"
fields = [{ name = "balance", type = "double", modifiers = ["private"] }]
"#,
        )
        .unwrap();
        let bank = model.get("Bank").unwrap();
        assert_eq!(bank.methods[0].return_type, TypeRef::void());
        assert!(bank.methods[0].modifiers.is_public());
        assert_eq!(model.get("Account").unwrap().fields[0].modifiers, Modifiers::PRIVATE);
    }

    #[test]
    fn test_cyclic_hierarchy_rejected() {
        let err = NativeModel::from_toml(
            r#"
[[classes]]
name = "A"
superclass = "B"

[[classes]]
name = "B"
superclass = "A"
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("own ancestor"));
    }
}
