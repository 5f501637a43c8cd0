//! Method, constructor and mixin descriptors
//!
//! The three kinds share one descriptor type tagged by [`MethodKind`].
//! Classification (`is_getter`, `is_adder`, ...) is computed from the
//! links established during field construction.

use crate::attributes::AttributeMap;
use crate::descriptor::{push_unique, ClassId, FieldId, MethodId};
use crate::error::{Result, RttiError};
use crate::model::{compact_params, signature, Modifiers, NativeMethod, TypeRef};
use crate::repository::Repository;

/// Kind of a method descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MethodKind {
    /// Regular method
    Method,
    /// Constructor; never a getter, setter, adder or remover
    Constructor,
    /// Static method attached to a class, invoked with the instance as
    /// implicit first argument
    Mixin,
}

/// Descriptor of a method, constructor or mixin method
#[derive(Debug, Clone)]
pub struct MethodDescriptor {
    pub(crate) name: String,
    pub(crate) full_name: String,
    pub(crate) class: ClassId,
    pub(crate) declaring: String,
    pub(crate) kind: MethodKind,
    pub(crate) params: Vec<TypeRef>,
    pub(crate) return_type: TypeRef,
    pub(crate) modifiers: Modifiers,
    pub(crate) accessed_fields: Vec<FieldId>,
    pub(crate) written_fields: Vec<FieldId>,
    pub(crate) added_collections: Vec<FieldId>,
    pub(crate) removed_collections: Vec<FieldId>,
    pub(crate) modified_collections: Vec<FieldId>,
    pub(crate) returned_field: Option<FieldId>,
    pub(crate) set_field: Option<FieldId>,
    pub(crate) dependent_methods: Vec<MethodId>,
    pub(crate) collection_index_argument: Option<usize>,
    pub(crate) collection_item_argument: Option<usize>,
    pub(crate) attrs: AttributeMap,
}

impl MethodDescriptor {
    fn with_kind(name: &str, params: Vec<TypeRef>, return_type: TypeRef, modifiers: Modifiers, class: ClassId, declaring: &str, kind: MethodKind) -> Self {
        Self {
            full_name: signature(name, &params),
            name: name.to_string(),
            class,
            declaring: declaring.to_string(),
            kind,
            params,
            return_type,
            modifiers,
            accessed_fields: Vec::new(),
            written_fields: Vec::new(),
            added_collections: Vec::new(),
            removed_collections: Vec::new(),
            modified_collections: Vec::new(),
            returned_field: None,
            set_field: None,
            dependent_methods: Vec::new(),
            collection_index_argument: None,
            collection_item_argument: None,
            attrs: AttributeMap::default(),
        }
    }

    /// Regular method declared by `declaring`, visible on `class`
    pub(crate) fn method(native: &NativeMethod, class: ClassId, declaring: &str) -> Self {
        Self::with_kind(
            &native.name,
            native.params.clone(),
            native.return_type.clone(),
            native.modifiers,
            class,
            declaring,
            MethodKind::Method,
        )
    }

    /// Constructor, named after the class
    pub(crate) fn constructor(short_name: &str, params: Vec<TypeRef>, modifiers: Modifiers, class: ClassId, declaring: &str) -> Self {
        Self::with_kind(short_name, params, TypeRef::void(), modifiers, class, declaring, MethodKind::Constructor)
    }

    /// Mixin view of a static method: the first parameter is dropped
    pub(crate) fn mixin(source: &MethodDescriptor, class: ClassId) -> Self {
        let params = match source.kind {
            MethodKind::Mixin => source.params.clone(),
            _ => source.params.iter().skip(1).cloned().collect(),
        };
        Self::with_kind(
            &source.name,
            params,
            source.return_type.clone(),
            source.modifiers,
            class,
            &source.declaring,
            MethodKind::Mixin,
        )
    }

    /// Method name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name with parameter types, `addAccount(bank.Account)`
    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    /// Name with short parameter types, `addAccount(Account)`
    pub fn compact_full_name(&self) -> String {
        format!("{}{}", self.name, compact_params(&self.params))
    }

    /// Class the descriptor belongs to
    pub fn owning_class(&self) -> ClassId {
        self.class
    }

    /// Name of the class declaring the executable body
    pub fn declaring_class(&self) -> &str {
        &self.declaring
    }

    /// Descriptor kind
    pub fn kind(&self) -> MethodKind {
        self.kind
    }

    /// Whether this is a constructor
    pub fn is_constructor(&self) -> bool {
        self.kind == MethodKind::Constructor
    }

    /// Whether this is a mixin method
    pub fn is_mixin(&self) -> bool {
        self.kind == MethodKind::Mixin
    }

    /// Parameter types
    pub fn params(&self) -> &[TypeRef] {
        &self.params
    }

    /// Number of parameters
    pub fn parameter_count(&self) -> usize {
        self.params.len()
    }

    /// Return type (`void` for constructors)
    pub fn return_type(&self) -> &TypeRef {
        &self.return_type
    }

    /// Whether the method returns nothing
    pub fn is_void(&self) -> bool {
        self.return_type.is_void()
    }

    /// Modifiers
    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    /// Whether the method is static
    pub fn is_static(&self) -> bool {
        self.modifiers.is_static()
    }

    /// Fields read by the method
    pub fn accessed_fields(&self) -> &[FieldId] {
        &self.accessed_fields
    }

    /// Fields written by the method
    pub fn written_fields(&self) -> &[FieldId] {
        &self.written_fields
    }

    /// Collections the method adds to
    pub fn added_collections(&self) -> &[FieldId] {
        &self.added_collections
    }

    /// First collection the method adds to
    pub fn added_collection(&self) -> Option<FieldId> {
        self.added_collections.first().copied()
    }

    /// Collections the method removes from
    pub fn removed_collections(&self) -> &[FieldId] {
        &self.removed_collections
    }

    /// First collection the method removes from
    pub fn removed_collection(&self) -> Option<FieldId> {
        self.removed_collections.first().copied()
    }

    /// Collections the method modifies otherwise
    pub fn modified_collections(&self) -> &[FieldId] {
        &self.modified_collections
    }

    /// Field the method is the getter of
    pub fn returned_field(&self) -> Option<FieldId> {
        self.returned_field
    }

    /// Field the method is the setter of
    pub fn set_field(&self) -> Option<FieldId> {
        self.set_field
    }

    /// Methods whose result depends on this method's result
    pub fn dependent_methods(&self) -> &[MethodId] {
        &self.dependent_methods
    }

    /// Parameter used as collection key
    pub fn collection_index_argument(&self) -> Option<usize> {
        self.collection_index_argument
    }

    /// Parameter used as collection element
    pub fn collection_item_argument(&self) -> Option<usize> {
        self.collection_item_argument
    }

    /// Getter of some field
    pub fn is_getter(&self) -> bool {
        self.returned_field.is_some()
    }

    /// Setter of some field
    pub fn is_setter(&self) -> bool {
        self.set_field.is_some()
    }

    /// Adds to some collection
    pub fn is_adder(&self) -> bool {
        !self.added_collections.is_empty()
    }

    /// Removes from some collection
    pub fn is_remover(&self) -> bool {
        !self.removed_collections.is_empty()
    }

    /// Reads some field
    pub fn is_accessor(&self) -> bool {
        !self.accessed_fields.is_empty()
    }

    /// Writes some field
    pub fn is_writer(&self) -> bool {
        !self.written_fields.is_empty()
    }

    /// Changes object state: writes a field or modifies a collection
    pub fn is_modifier(&self) -> bool {
        self.is_writer() || !self.modified_collections.is_empty() || self.is_adder() || self.is_remover()
    }
}

// ============================================================================
// Repository-level queries
// ============================================================================

impl Repository {
    /// `Class.fullName`
    pub fn method_long_name(&self, method: MethodId) -> String {
        let m = &self.methods[method.index()];
        format!("{}.{}", self.classes[m.class.index()].name, m.full_name)
    }

    /// Descriptor of the class that declares the executable body, for
    /// inherited methods
    pub fn concrete_method(&mut self, method: MethodId) -> Result<MethodId> {
        let (class, declaring, full_name) = {
            let m = &self.methods[method.index()];
            (m.class, m.declaring.clone(), m.full_name.clone())
        };
        if self.classes[class.index()].name == declaring {
            return Ok(method);
        }
        let owner = self.get_class(&declaring)?;
        self.classes[owner.index()]
            .methods
            .exact(&full_name)
            .ok_or_else(|| RttiError::no_such_method(declaring, full_name))
    }

    /// Class descriptor of a parameter type
    pub fn parameter_type_item(&mut self, method: MethodId, index: usize) -> Result<ClassId> {
        let ty = self.methods[method.index()]
            .params
            .get(index)
            .cloned()
            .ok_or_else(|| RttiError::no_such_method(self.method_long_name(method), format!("parameter {}", index)))?;
        self.get_class(ty.name())
    }

    /// Accessed fields that are references
    pub fn accessed_references(&self, method: MethodId) -> Vec<FieldId> {
        self.methods[method.index()]
            .accessed_fields
            .iter()
            .copied()
            .filter(|f| self.is_reference(*f))
            .collect()
    }

    /// Accessed fields that are collections
    pub fn accessed_collections(&self, method: MethodId) -> Vec<FieldId> {
        self.methods[method.index()]
            .accessed_fields
            .iter()
            .copied()
            .filter(|f| self.fields[f.index()].is_collection())
            .collect()
    }

    /// Reads at least one collection
    pub fn is_collection_accessor(&self, method: MethodId) -> bool {
        !self.accessed_collections(method).is_empty()
    }

    /// Reads at least one reference
    pub fn is_reference_accessor(&self, method: MethodId) -> bool {
        !self.accessed_references(method).is_empty()
    }

    /// Getter of a collection
    pub fn is_collection_getter(&self, method: MethodId) -> bool {
        self.methods[method.index()]
            .returned_field
            .is_some_and(|f| self.fields[f.index()].is_collection())
    }

    /// Getter of a primitive field
    pub fn is_field_getter(&self, method: MethodId) -> bool {
        self.methods[method.index()]
            .returned_field
            .is_some_and(|f| self.is_primitive(f))
    }

    /// Getter of a reference field
    pub fn is_reference_getter(&self, method: MethodId) -> bool {
        self.methods[method.index()]
            .returned_field
            .is_some_and(|f| self.is_reference(f))
    }

    /// Setter of a collection
    pub fn is_collection_setter(&self, method: MethodId) -> bool {
        self.methods[method.index()]
            .set_field
            .is_some_and(|f| self.fields[f.index()].is_collection())
    }

    /// Setter of a primitive field
    pub fn is_field_setter(&self, method: MethodId) -> bool {
        self.methods[method.index()]
            .set_field
            .is_some_and(|f| self.is_primitive(f))
    }

    /// Setter of a reference field
    pub fn is_reference_setter(&self, method: MethodId) -> bool {
        self.methods[method.index()]
            .set_field
            .is_some_and(|f| self.is_reference(f))
    }

    // ===== Linking =====

    pub(crate) fn link_accessed(&mut self, method: MethodId, field: FieldId) {
        push_unique(&mut self.methods[method.index()].accessed_fields, field);
        push_unique(&mut self.fields[field.index()].accessing_methods, method);
        if !self.methods[method.index()].is_void() {
            self.add_dependent_method(field, method);
        }
    }

    pub(crate) fn link_written(&mut self, method: MethodId, field: FieldId) {
        push_unique(&mut self.methods[method.index()].written_fields, field);
        push_unique(&mut self.fields[field.index()].writing_methods, method);
    }

    pub(crate) fn link_modified_collection(&mut self, method: MethodId, collection: FieldId) {
        push_unique(&mut self.methods[method.index()].modified_collections, collection);
        push_unique(&mut self.fields[collection.index()].writing_methods, method);
    }

    /// Record `dependent` as depending on the result of `method`
    pub(crate) fn add_method_dependent(&mut self, method: MethodId, dependent: MethodId) {
        push_unique(&mut self.methods[method.index()].dependent_methods, dependent);
    }

    /// Make `method` the getter of `field`, on both sides
    pub(crate) fn bind_getter(&mut self, method: MethodId, field: FieldId) {
        if let Some(previous) = self.methods[method.index()].returned_field {
            let both_calculated = self.fields[previous.index()].is_calculated()
                && self.fields[field.index()].is_calculated();
            if previous != field && !both_calculated {
                let message = format!(
                    "overriding returned field {} with {}",
                    self.fields[previous.index()].name,
                    self.fields[field.index()].name
                );
                self.advise(self.method_long_name(method), message);
            }
            if previous != field && self.fields[previous.index()].getter == Some(method) {
                self.fields[previous.index()].getter = None;
            }
        }
        self.methods[method.index()].returned_field = Some(field);
        self.set_field_getter(field, method);
    }

    /// Make `method` the setter of `field`, on both sides
    pub(crate) fn bind_setter(&mut self, method: MethodId, field: FieldId) {
        if let Some(previous) = self.methods[method.index()].set_field {
            if previous != field {
                let message = format!(
                    "overriding set field {} with {}",
                    self.fields[previous.index()].name,
                    self.fields[field.index()].name
                );
                self.advise(self.method_long_name(method), message);
                if self.fields[previous.index()].setter == Some(method) {
                    self.fields[previous.index()].setter = None;
                }
            }
        }
        self.methods[method.index()].set_field = Some(field);
        self.set_field_setter(field, method);
        push_unique(&mut self.methods[method.index()].written_fields, field);
    }
}
