//! Class descriptors and method resolution
//!
//! A [`ClassDescriptor`] aggregates the fields and methods of one class.
//! Methods are registered when the class is created; fields are built
//! lazily, the first time a field-related query reaches the class (see
//! [`Repository::build_field_info`]).

use rustc_hash::FxHashMap;

use crate::attributes::AttributeMap;
use crate::descriptor::{ClassId, FieldId, MethodId};
use crate::error::{Result, RttiError};
use crate::method::MethodKind;
use crate::method_table::{bare_name, MethodTable};
use crate::model::Modifiers;
use crate::naming::short_class_name;
use crate::repository::Repository;

/// Field construction progress of a class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildState {
    /// Fields not built yet
    Unbuilt,
    /// Field construction in progress
    Building,
    /// Fields built and linked
    Built,
}

/// Number of members of each kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemberCounts {
    /// Primitive (value) fields
    pub primitives: usize,
    /// Reference fields
    pub references: usize,
    /// Collections
    pub collections: usize,
    /// Methods, mixins included
    pub methods: usize,
    /// Constructors
    pub constructors: usize,
}

/// Descriptor of one class
#[derive(Debug, Clone)]
pub struct ClassDescriptor {
    pub(crate) name: String,
    pub(crate) superclass: Option<ClassId>,
    pub(crate) children: Vec<ClassId>,
    pub(crate) interface_names: Vec<String>,
    pub(crate) interfaces: Option<Vec<ClassId>>,
    pub(crate) modifiers: Modifiers,
    pub(crate) is_interface: bool,
    pub(crate) fields: FxHashMap<String, FieldId>,
    pub(crate) field_order: Vec<FieldId>,
    pub(crate) methods: MethodTable,
    pub(crate) method_cache: FxHashMap<String, MethodId>,
    pub(crate) counts: MemberCounts,
    pub(crate) state: BuildState,
    pub(crate) constraints: Option<Vec<FieldId>>,
    pub(crate) attrs: AttributeMap,
}

impl ClassDescriptor {
    pub(crate) fn new(name: &str, superclass: Option<ClassId>, modifiers: Modifiers, is_interface: bool) -> Self {
        Self {
            name: name.to_string(),
            superclass,
            children: Vec::new(),
            interface_names: Vec::new(),
            interfaces: None,
            modifiers,
            is_interface,
            fields: FxHashMap::default(),
            field_order: Vec::new(),
            methods: MethodTable::new(),
            method_cache: FxHashMap::default(),
            counts: MemberCounts::default(),
            state: BuildState::Unbuilt,
            constraints: None,
            attrs: AttributeMap::default(),
        }
    }

    /// Fully qualified name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name without package path
    pub fn short_name(&self) -> &str {
        short_class_name(&self.name)
    }

    /// Superclass descriptor (`Object` is never represented)
    pub fn superclass(&self) -> Option<ClassId> {
        self.superclass
    }

    /// Direct subclasses created so far
    pub fn children(&self) -> &[ClassId] {
        &self.children
    }

    /// Class modifiers
    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    /// Whether this is an interface
    pub fn is_interface(&self) -> bool {
        self.is_interface
    }

    /// Whether the class is abstract
    pub fn is_abstract(&self) -> bool {
        self.is_interface || self.modifiers.contains(Modifiers::ABSTRACT)
    }

    /// Whether this is an inner class (`Outer$Inner`)
    pub fn is_inner(&self) -> bool {
        self.name.contains('$')
    }

    /// Method table
    pub fn methods(&self) -> &MethodTable {
        &self.methods
    }

    /// Field construction progress
    pub fn state(&self) -> BuildState {
        self.state
    }

    /// Whether fields have been built
    pub fn is_built(&self) -> bool {
        self.state == BuildState::Built
    }
}

/// A logical class layered over an actual class
#[derive(Debug, Clone)]
pub struct VirtualClass {
    pub(crate) name: String,
    pub(crate) actual: ClassId,
    pub(crate) attrs: AttributeMap,
}

impl VirtualClass {
    pub(crate) fn new(name: &str, actual: ClassId) -> Self {
        Self {
            name: name.to_string(),
            actual,
            attrs: AttributeMap::default(),
        }
    }

    /// Logical name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Actual class the virtual class refines
    pub fn actual(&self) -> ClassId {
        self.actual
    }
}

// ============================================================================
// Method resolution
// ============================================================================

impl Repository {
    /// All methods and constructors matching `name`, without building fields.
    ///
    /// A name ending in `)` selects one overload by signature, matched on
    /// the full name or the compact full name; `<init>` stands for the
    /// constructors.
    pub(crate) fn find_methods(&self, class: ClassId, name: &str) -> Result<Vec<MethodId>> {
        let descriptor = &self.classes[class.index()];
        let name = match name.strip_prefix("<init>") {
            Some(rest) => format!("{}{}", descriptor.short_name(), rest),
            None => name.to_string(),
        };

        let found: Vec<MethodId> = if name.ends_with(')') {
            descriptor
                .methods
                .exact(&name)
                .or_else(|| {
                    descriptor
                        .methods
                        .by_name(bare_name(&name))
                        .iter()
                        .copied()
                        .find(|m| self.methods[m.index()].compact_full_name() == name)
                })
                .into_iter()
                .collect()
        } else {
            descriptor.methods.by_name(&name).to_vec()
        };

        if found.is_empty() {
            return Err(RttiError::no_such_method(&descriptor.name, name));
        }
        Ok(found)
    }

    /// Resolve one method or constructor, without building fields.
    /// Unambiguous resolutions are cached per class.
    pub(crate) fn find_method(&mut self, class: ClassId, name: &str) -> Result<MethodId> {
        if let Some(&cached) = self.classes[class.index()].method_cache.get(name) {
            return Ok(cached);
        }
        let found = self.find_methods(class, name)?;
        if found.len() > 1 {
            return Err(RttiError::AmbiguousMethodName {
                class: self.classes[class.index()].name.clone(),
                method: name.to_string(),
                candidates: found
                    .iter()
                    .map(|m| self.methods[m.index()].full_name.clone())
                    .collect(),
            });
        }
        let method = found[0];
        self.classes[class.index()]
            .method_cache
            .insert(name.to_string(), method);
        Ok(method)
    }

    /// Method or constructor by name or signature
    pub fn get_abstract_method(&mut self, class: ClassId, name: &str) -> Result<MethodId> {
        self.build_field_info(class)?;
        self.find_method(class, name)
    }

    /// All methods or constructors matching a name or signature
    pub fn get_abstract_methods(&mut self, class: ClassId, name: &str) -> Result<Vec<MethodId>> {
        self.build_field_info(class)?;
        self.find_methods(class, name)
    }

    /// Method (not constructor) by name or signature.
    ///
    /// Fails with [`RttiError::AmbiguousMethodName`] when a bare name
    /// matches several overloads.
    pub fn get_method(&mut self, class: ClassId, name: &str) -> Result<MethodId> {
        let method = self.get_abstract_method(class, name)?;
        if self.methods[method.index()].kind == MethodKind::Constructor {
            return Err(RttiError::no_such_method(&self.classes[class.index()].name, name));
        }
        Ok(method)
    }

    /// Methods (not constructors) matching a name or signature
    pub fn get_methods(&mut self, class: ClassId, name: &str) -> Result<Vec<MethodId>> {
        let methods: Vec<MethodId> = self
            .get_abstract_methods(class, name)?
            .into_iter()
            .filter(|m| self.methods[m.index()].kind != MethodKind::Constructor)
            .collect();
        if methods.is_empty() {
            return Err(RttiError::no_such_method(&self.classes[class.index()].name, name));
        }
        Ok(methods)
    }

    /// Whether a method resolves; an ambiguous name counts as present
    pub fn has_method(&mut self, class: ClassId, name: &str) -> bool {
        match self.get_abstract_method(class, name) {
            Ok(_) | Err(RttiError::AmbiguousMethodName { .. }) => true,
            Err(_) => false,
        }
    }

    /// Constructors of a class
    pub fn get_constructors(&self, class: ClassId) -> Vec<MethodId> {
        self.classes[class.index()]
            .methods
            .ids()
            .iter()
            .copied()
            .filter(|m| self.methods[m.index()].kind == MethodKind::Constructor)
            .collect()
    }

    /// Constructor with exactly these parameter types
    pub fn get_constructor(&self, class: ClassId, params: &[&str]) -> Result<MethodId> {
        self.get_constructors(class)
            .into_iter()
            .find(|m| {
                let declared = &self.methods[m.index()].params;
                declared.len() == params.len()
                    && declared.iter().zip(params).all(|(d, p)| d.name() == *p)
            })
            .ok_or_else(|| {
                let descriptor = &self.classes[class.index()];
                RttiError::no_such_method(
                    &descriptor.name,
                    format!("{}({})", descriptor.short_name(), params.join(",")),
                )
            })
    }

    /// Nearest superclass method with the same full name
    pub(crate) fn super_method(&self, method: MethodId) -> Option<MethodId> {
        let descriptor = &self.methods[method.index()];
        let mut current = self.classes[descriptor.class.index()].superclass;
        while let Some(class) = current {
            let class = &self.classes[class.index()];
            if let Some(found) = class.methods.exact(&descriptor.full_name) {
                return Some(found);
            }
            current = class.superclass;
        }
        None
    }

    pub(crate) fn insert_method(&mut self, class: ClassId, method: MethodId) {
        let (name, full_name, kind) = {
            let m = &self.methods[method.index()];
            (m.name.clone(), m.full_name.clone(), m.kind)
        };
        let descriptor = &mut self.classes[class.index()];
        if descriptor.methods.insert(&name, &full_name, method).is_none() {
            match kind {
                MethodKind::Constructor => descriptor.counts.constructors += 1,
                _ => descriptor.counts.methods += 1,
            }
        }
        descriptor.method_cache.retain(|key, _| bare_name(key) != name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NativeClass, NativeModel};

    fn repo() -> Repository {
        Repository::new(NativeModel::from_classes([NativeClass::new("shop.Cart")
            .field("total", "int")
            .method("foo", &[], "void")
            .method("foo", &["int"], "void")
            .method("bar", &["shop.Item"], "int")
            .constructor(&[])
            .constructor(&["int"])
            .extends("Object")]))
    }

    #[test]
    fn test_ambiguous_bare_name() {
        let mut repo = repo();
        let cart = repo.get_class("shop.Cart").unwrap();
        let err = repo.get_method(cart, "foo").unwrap_err();
        assert!(matches!(err, RttiError::AmbiguousMethodName { ref candidates, .. } if candidates.len() == 2));
        let foo_int = repo.get_method(cart, "foo(int)").unwrap();
        assert_eq!(repo.method(foo_int).params().len(), 1);
        assert!(repo.has_method(cart, "foo"));
        assert!(!repo.has_method(cart, "baz"));
    }

    #[test]
    fn test_compact_signature_and_cache() {
        let mut repo = repo();
        let cart = repo.get_class("shop.Cart").unwrap();
        let by_full = repo.get_method(cart, "bar(shop.Item)").unwrap();
        let by_compact = repo.get_method(cart, "bar(Item)").unwrap();
        let by_name = repo.get_method(cart, "bar").unwrap();
        assert_eq!(by_full, by_compact);
        assert_eq!(by_full, by_name);
        assert!(repo.class(cart).method_cache.contains_key("bar"));
    }

    #[test]
    fn test_constructors() {
        let mut repo = repo();
        let cart = repo.get_class("shop.Cart").unwrap();
        assert_eq!(repo.get_constructors(cart).len(), 2);
        let ctor = repo.get_constructor(cart, &["int"]).unwrap();
        assert_eq!(repo.method(ctor).full_name(), "Cart(int)");
        assert_eq!(repo.get_abstract_method(cart, "<init>(int)").unwrap(), ctor);
        assert!(repo.get_method(cart, "Cart(int)").is_err());
        assert!(repo.get_constructor(cart, &["long"]).is_err());
        assert_eq!(repo.class(cart).counts.constructors, 2);
    }

    #[test]
    fn test_class_flags() {
        let mut repo = Repository::new(NativeModel::from_classes([
            NativeClass::new("Outer$Inner"),
            NativeClass::interface("Named"),
        ]));
        let inner = repo.get_class("Outer$Inner").unwrap();
        assert!(repo.class(inner).is_inner());
        let named = repo.get_class("Named").unwrap();
        assert!(repo.class(named).is_abstract());
        assert!(repo.class(named).is_interface());
    }
}
