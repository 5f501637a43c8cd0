//! Field and collection descriptors
//!
//! A field is backed by a storage slot, calculated from a getter, or a
//! dotted path over other fields (`account.owner.name`). Collections are
//! fields with extra adder/remover bookkeeping and an element type that
//! is inferred lazily.

use tracing::{debug, error};

use crate::attributes::{AttrValue, AttributeMap, IS_INDEX, OPPOSITE_ROLE};
use crate::descriptor::{push_unique, ClassId, FieldId, ItemId, MethodId};
use crate::error::{Result, RttiError};
use crate::model::{CollectionKind, Modifiers, TypeRef, MAP_ENTRY, OBJECT};
use crate::repository::Repository;

/// Where a field's value comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldOrigin {
    /// Backed by a storage slot
    Native,
    /// Computed by a getter, no storage
    Calculated,
    /// Dotted path; the last element is the field the path ends on
    Expression(Vec<FieldId>),
}

/// Collection-specific data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionInfo {
    pub(crate) kind: CollectionKind,
    pub(crate) component_type: Option<ClassId>,
    pub(crate) adder: Option<MethodId>,
    pub(crate) remover: Option<MethodId>,
    pub(crate) adding_methods: Vec<MethodId>,
    pub(crate) removing_methods: Vec<MethodId>,
    pub(crate) component_unresolved: bool,
}

impl CollectionInfo {
    pub(crate) fn new(kind: CollectionKind) -> Self {
        Self {
            kind,
            component_type: None,
            adder: None,
            remover: None,
            adding_methods: Vec::new(),
            removing_methods: Vec::new(),
            component_unresolved: false,
        }
    }

    /// Collection kind
    pub fn kind(&self) -> CollectionKind {
        self.kind
    }

    /// Methods adding to the collection
    pub fn adding_methods(&self) -> &[MethodId] {
        &self.adding_methods
    }

    /// Methods removing from the collection
    pub fn removing_methods(&self) -> &[MethodId] {
        &self.removing_methods
    }

    /// Whether the collection is a list
    pub fn is_list(&self) -> bool {
        self.kind == CollectionKind::List
    }

    /// Whether the collection is a set
    pub fn is_set(&self) -> bool {
        self.kind == CollectionKind::Set
    }

    /// Whether the collection is a map
    pub fn is_map(&self) -> bool {
        self.kind == CollectionKind::Map
    }

    /// Whether the collection is a native array
    pub fn is_array(&self) -> bool {
        self.kind == CollectionKind::Array
    }
}

/// Plain field or collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldVariant {
    /// Single value
    Plain,
    /// Collection of values
    Collection(CollectionInfo),
}

/// Descriptor of a field or collection
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    pub(crate) name: String,
    pub(crate) class: ClassId,
    pub(crate) native_type: Option<TypeRef>,
    pub(crate) type_override: Option<TypeRef>,
    pub(crate) modifiers: Modifiers,
    pub(crate) origin: FieldOrigin,
    pub(crate) variant: FieldVariant,
    pub(crate) getter: Option<MethodId>,
    pub(crate) setter: Option<MethodId>,
    pub(crate) accessing_methods: Vec<MethodId>,
    pub(crate) writing_methods: Vec<MethodId>,
    pub(crate) dependent_fields: Vec<FieldId>,
    pub(crate) dependent_methods: Vec<MethodId>,
    pub(crate) opposite_role: Option<FieldId>,
    pub(crate) aggregation: bool,
    pub(crate) attrs: AttributeMap,
}

impl FieldDescriptor {
    fn with_origin(name: &str, class: ClassId, origin: FieldOrigin, variant: FieldVariant) -> Self {
        Self {
            name: name.to_string(),
            class,
            native_type: None,
            type_override: None,
            modifiers: Modifiers::PUBLIC | Modifiers::TRANSIENT,
            origin,
            variant,
            getter: None,
            setter: None,
            accessing_methods: Vec::new(),
            writing_methods: Vec::new(),
            dependent_fields: Vec::new(),
            dependent_methods: Vec::new(),
            opposite_role: None,
            aggregation: false,
            attrs: AttributeMap::default(),
        }
    }

    /// Field over a storage slot
    pub(crate) fn native(name: &str, ty: TypeRef, modifiers: Modifiers, kind: Option<CollectionKind>, class: ClassId) -> Self {
        let variant = match kind {
            Some(kind) => FieldVariant::Collection(CollectionInfo::new(kind)),
            None => FieldVariant::Plain,
        };
        Self {
            native_type: Some(ty),
            modifiers,
            ..Self::with_origin(name, class, FieldOrigin::Native, variant)
        }
    }

    /// Field computed by a getter
    pub(crate) fn calculated(name: &str, kind: Option<CollectionKind>, class: ClassId) -> Self {
        let variant = match kind {
            Some(kind) => FieldVariant::Collection(CollectionInfo::new(kind)),
            None => FieldVariant::Plain,
        };
        Self::with_origin(name, class, FieldOrigin::Calculated, variant)
    }

    /// Field name (the whole path for expression fields)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Owning class
    pub fn class(&self) -> ClassId {
        self.class
    }

    /// Value origin
    pub fn origin(&self) -> &FieldOrigin {
        &self.origin
    }

    /// Plain or collection
    pub fn variant(&self) -> &FieldVariant {
        &self.variant
    }

    /// Collection data, if this is a collection
    pub fn collection(&self) -> Option<&CollectionInfo> {
        match &self.variant {
            FieldVariant::Collection(info) => Some(info),
            FieldVariant::Plain => None,
        }
    }

    pub(crate) fn collection_mut(&mut self) -> Option<&mut CollectionInfo> {
        match &mut self.variant {
            FieldVariant::Collection(info) => Some(info),
            FieldVariant::Plain => None,
        }
    }

    /// Whether this is a collection
    pub fn is_collection(&self) -> bool {
        matches!(self.variant, FieldVariant::Collection(_))
    }

    /// Whether the field has no storage of its own
    pub fn is_calculated(&self) -> bool {
        !matches!(self.origin, FieldOrigin::Native)
    }

    /// Whether the field is a dotted path
    pub fn is_expression(&self) -> bool {
        matches!(self.origin, FieldOrigin::Expression(_))
    }

    /// Path of an expression field
    pub fn path(&self) -> &[FieldId] {
        match &self.origin {
            FieldOrigin::Expression(path) => path,
            _ => &[],
        }
    }

    /// Last field of the path (the field itself for non-expression fields)
    pub fn path_top(&self) -> Option<FieldId> {
        self.path().last().copied()
    }

    /// Modifiers; calculated fields are public and transient
    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    /// Whether the field is transient
    pub fn is_transient(&self) -> bool {
        self.modifiers.contains(Modifiers::TRANSIENT)
    }

    /// Whether the field is final
    pub fn is_final(&self) -> bool {
        !self.is_calculated() && self.modifiers.contains(Modifiers::FINAL)
    }

    /// The getter, if bound
    pub fn getter(&self) -> Option<MethodId> {
        self.getter
    }

    /// Methods reading the field
    pub fn accessing_methods(&self) -> &[MethodId] {
        &self.accessing_methods
    }

    /// Methods writing the field
    pub fn writing_methods(&self) -> &[MethodId] {
        &self.writing_methods
    }

    /// Calculated fields derived from this one
    pub fn dependent_fields(&self) -> &[FieldId] {
        &self.dependent_fields
    }

    /// Non-void methods whose result depends on this field
    pub fn dependent_methods(&self) -> &[MethodId] {
        &self.dependent_methods
    }

    /// Whether the field is an aggregation relation
    pub fn is_aggregation(&self) -> bool {
        self.aggregation
    }
}

// ============================================================================
// Resolution
// ============================================================================

impl Repository {
    /// Field or collection by name or dotted expression.
    ///
    /// Expression fields are materialized on first use; fields inherited
    /// from a superclass are cloned onto `class`.
    pub fn get_field(&mut self, class: ClassId, name: &str) -> Result<FieldId> {
        self.build_field_info(class)?;
        self.resolve_field(class, name)?
            .ok_or_else(|| RttiError::no_such_field(&self.classes[class.index()].name, name))
    }

    /// Field by name, `None` when it does not resolve
    pub fn get_field_opt(&mut self, class: ClassId, name: &str) -> Result<Option<FieldId>> {
        self.build_field_info(class)?;
        self.resolve_field(class, name)
    }

    /// Collection by name; a plain field of that name is an invalid delegate
    pub fn get_collection(&mut self, class: ClassId, name: &str) -> Result<FieldId> {
        let field = self.get_field(class, name)?;
        self.expect_collection(field)?;
        Ok(field)
    }

    /// Whether a field of that name is defined locally
    pub fn has_field(&mut self, class: ClassId, name: &str) -> Result<bool> {
        self.build_field_info(class)?;
        Ok(self.classes[class.index()].fields.contains_key(name))
    }

    pub(crate) fn expect_collection(&self, field: FieldId) -> Result<&CollectionInfo> {
        self.fields[field.index()]
            .collection()
            .ok_or_else(|| RttiError::InvalidDelegate {
                item: self.field_long_name(field),
                reason: "not a collection type".to_string(),
            })
    }

    fn resolve_field(&mut self, class: ClassId, name: &str) -> Result<Option<FieldId>> {
        if let Some(&field) = self.classes[class.index()].fields.get(name) {
            return Ok(Some(field));
        }
        if name.contains('.') {
            match self.parse_expression(class, name) {
                Ok(path) => return self.add_expression_field(class, name, path).map(Some),
                Err(e @ RttiError::CyclicConstruction { .. }) => return Err(e),
                Err(e) => error!(
                    class = %self.classes[class.index()].name,
                    expression = name,
                    "expression field instantiation failed: {}",
                    e
                ),
            }
        }
        self.inherit_field(class, name, true)
    }

    /// Local field, or a superclass field cloned onto `class`
    pub(crate) fn lookup_field(&mut self, class: ClassId, name: &str) -> Option<FieldId> {
        if let Some(&field) = self.classes[class.index()].fields.get(name) {
            return Some(field);
        }
        self.inherit_field(class, name, false).ok().flatten()
    }

    fn inherit_field(&mut self, class: ClassId, name: &str, expressions: bool) -> Result<Option<FieldId>> {
        let Some(superclass) = self.classes[class.index()].superclass else {
            return Ok(None);
        };
        let inherited = if expressions {
            self.build_field_info(superclass)?;
            self.resolve_field(superclass, name)?
        } else {
            self.lookup_field(superclass, name)
        };
        match inherited {
            Some(field) => self.clone_field(field, class).map(Some),
            None => Ok(None),
        }
    }

    /// Nearest superclass field with the same name, without cloning
    pub(crate) fn super_field(&self, field: FieldId) -> Option<FieldId> {
        let descriptor = &self.fields[field.index()];
        let mut current = self.classes[descriptor.class.index()].superclass;
        while let Some(class) = current {
            let class = &self.classes[class.index()];
            if let Some(&found) = class.fields.get(&descriptor.name) {
                return Some(found);
            }
            current = class.superclass;
        }
        None
    }

    /// Resolve each segment of a dotted expression, stepping into the
    /// element type of collections and the type of other fields
    pub fn parse_expression(&mut self, class: ClassId, expression: &str) -> Result<Vec<FieldId>> {
        let segments: Vec<&str> = expression.split('.').collect();
        let mut current = class;
        let mut path = Vec::with_capacity(segments.len());
        for (index, segment) in segments.iter().enumerate() {
            let field = self.get_field(current, segment)?;
            path.push(field);
            if index + 1 < segments.len() {
                current = if self.fields[field.index()].is_collection() {
                    self.component_type(field)?
                        .ok_or_else(|| RttiError::no_such_field(&self.classes[current.index()].name, expression))?
                } else {
                    self.type_item(field)?
                };
            }
        }
        Ok(path)
    }

    fn add_expression_field(&mut self, class: ClassId, name: &str, path: Vec<FieldId>) -> Result<FieldId> {
        let Some(&top) = path.last() else {
            return Err(RttiError::no_such_field(&self.classes[class.index()].name, name));
        };
        let ty = self.field_type(top);
        let variant = match self.fields[top.index()].collection() {
            Some(info) => FieldVariant::Collection(CollectionInfo::new(info.kind)),
            None => FieldVariant::Plain,
        };
        let mut descriptor = FieldDescriptor::with_origin(name, class, FieldOrigin::Expression(path), variant);
        descriptor.type_override = Some(ty);
        debug!(class = %self.classes[class.index()].name, expression = name, "materialized expression field");
        Ok(self.attach_field(class, descriptor))
    }

    /// Copy a field onto another class. Calculated fields re-resolve
    /// their getter on the target; collections keep their explicit
    /// adder and remover.
    pub fn clone_field(&mut self, field: FieldId, onto: impl Into<ItemId>) -> Result<FieldId> {
        let class = match onto.into() {
            ItemId::Class(class) => class,
            other => {
                return Err(RttiError::InvalidParent {
                    item: self.field_long_name(field),
                    parent: format!("{:?}", other),
                })
            }
        };
        let source = &self.fields[field.index()];
        let mut clone = match &source.origin {
            FieldOrigin::Native => FieldDescriptor::native(
                &source.name,
                source.native_type.clone().unwrap_or_else(|| TypeRef::new(OBJECT)),
                source.modifiers,
                source.collection().map(CollectionInfo::kind),
                class,
            ),
            FieldOrigin::Calculated => FieldDescriptor::calculated(&source.name, source.collection().map(CollectionInfo::kind), class),
            FieldOrigin::Expression(path) => {
                let mut clone = FieldDescriptor::with_origin(&source.name, class, FieldOrigin::Expression(path.clone()), source.variant.clone());
                clone.type_override = source.type_override.clone();
                clone
            }
        };
        if let (Some(info), Some(target)) = (source.collection(), clone.collection_mut()) {
            target.adder = info.adder;
            target.remover = info.remover;
        }
        let getter = match source.origin {
            FieldOrigin::Calculated => source.getter.map(|g| self.methods[g.index()].full_name.clone()),
            _ => None,
        };
        clone.type_override = clone.type_override.or_else(|| source.type_override.clone());
        clone.aggregation = source.aggregation;

        let id = self.attach_field(class, clone);
        if let Some(full_name) = getter {
            if let Some(method) = self.classes[class.index()].methods.exact(&full_name) {
                self.link_accessed(method, id);
                self.bind_getter(method, id);
            }
        }
        Ok(id)
    }

    /// Add a field to a class, updating the per-kind counts
    pub(crate) fn attach_field(&mut self, class: ClassId, descriptor: FieldDescriptor) -> FieldId {
        let id = FieldId::new(self.fields.len());
        let name = descriptor.name.clone();
        self.fields.push(descriptor);

        let replaced = self.classes[class.index()].fields.insert(name.clone(), id);
        if let Some(previous) = replaced {
            let message = format!("overriding field {} with a new descriptor", self.field_long_name(previous));
            self.advise(self.classes[class.index()].name.clone(), message);
            let order = &mut self.classes[class.index()].field_order;
            if let Some(slot) = order.iter_mut().find(|f| **f == previous) {
                *slot = id;
            }
        } else {
            let is_collection = self.fields[id.index()].is_collection();
            let is_reference = self.is_reference(id);
            let descriptor = &mut self.classes[class.index()];
            descriptor.field_order.push(id);
            if is_collection {
                descriptor.counts.collections += 1;
            } else if is_reference {
                descriptor.counts.references += 1;
            } else {
                descriptor.counts.primitives += 1;
            }
        }
        id
    }

    // ===== Types =====

    /// `Class.field`
    pub fn field_long_name(&self, field: FieldId) -> String {
        let f = &self.fields[field.index()];
        format!("{}.{}", self.classes[f.class.index()].name, f.name)
    }

    /// Field type: explicit override, else the slot type, else the
    /// getter's return type
    pub fn field_type(&self, field: FieldId) -> TypeRef {
        let f = &self.fields[field.index()];
        f.type_override
            .clone()
            .or_else(|| f.native_type.clone())
            .or_else(|| f.getter.map(|g| self.methods[g.index()].return_type.clone()))
            .unwrap_or_else(|| TypeRef::new(OBJECT))
    }

    /// Class descriptor of the field type
    pub fn type_item(&mut self, field: FieldId) -> Result<ClassId> {
        let ty = self.field_type(field);
        self.get_class(ty.name())
    }

    /// Whether the field holds a reference to another model object
    pub fn is_reference(&self, field: FieldId) -> bool {
        if self.fields[field.index()].is_collection() {
            return false;
        }
        let ty = self.field_type(field);
        !ty.is_primitive()
            && !ty.is_void()
            && !ty.is_array()
            && ty.name() != OBJECT
            && ty.name() != "String"
            && self.model.get(ty.name()).is_some()
            && !self.model.is_collection_type(&ty)
    }

    /// Whether the field holds a plain value
    pub fn is_primitive(&self, field: FieldId) -> bool {
        !self.fields[field.index()].is_collection() && !self.is_reference(field)
    }

    /// Whether the field is static (calculated fields follow their getter
    /// or the end of their path)
    pub fn is_static_field(&self, field: FieldId) -> bool {
        let f = &self.fields[field.index()];
        match &f.origin {
            FieldOrigin::Native => f.modifiers.is_static(),
            FieldOrigin::Calculated => f.getter.is_some_and(|g| self.methods[g.index()].is_static()),
            FieldOrigin::Expression(path) => path.last().is_some_and(|top| self.is_static_field(*top)),
        }
    }

    // ===== Accessors =====

    /// The getter of a field
    pub fn field_getter(&mut self, field: FieldId) -> Result<Option<MethodId>> {
        self.build_field_info(self.fields[field.index()].class)?;
        Ok(self.fields[field.index()].getter)
    }

    /// The setter of a field; expression fields use the setter of the
    /// field their path ends on
    pub fn field_setter(&mut self, field: FieldId) -> Result<Option<MethodId>> {
        self.build_field_info(self.fields[field.index()].class)?;
        let f = &self.fields[field.index()];
        match (f.setter, f.path_top()) {
            (Some(setter), _) => Ok(Some(setter)),
            (None, Some(top)) => self.field_setter(top),
            (None, None) => Ok(None),
        }
    }

    pub(crate) fn set_field_getter(&mut self, field: FieldId, getter: MethodId) {
        let getter_type = self.methods[getter.index()].return_type.clone();
        let field_type = self.field_type(field);
        let narrows = field_type != getter_type && self.model.is_assignable(&getter_type, &field_type);
        let previous = self.fields[field.index()].getter.filter(|p| *p != getter);
        if let Some(previous) = previous.filter(|_| !narrows) {
            let message = format!(
                "overriding getter {} with {}",
                self.method_long_name(previous),
                self.method_long_name(getter)
            );
            self.advise(self.field_long_name(field), message);
        }
        if narrows && !getter_type.is_void() {
            debug!(field = %self.field_long_name(field), ty = %getter_type, "narrowing field type to getter type");
            self.fields[field.index()].type_override = Some(getter_type);
        }
        if let Some(previous) = previous {
            let returned = &mut self.methods[previous.index()].returned_field;
            if *returned == Some(field) {
                *returned = None;
            }
        }
        let f = &mut self.fields[field.index()];
        f.getter = Some(getter);
        push_unique(&mut f.accessing_methods, getter);
    }

    pub(crate) fn set_field_setter(&mut self, field: FieldId, setter: MethodId) {
        if let Some(previous) = self.fields[field.index()].setter.filter(|p| *p != setter) {
            let message = format!(
                "overriding setter {} with {}",
                self.methods[previous.index()].full_name,
                self.methods[setter.index()].full_name
            );
            self.advise(self.field_long_name(field), message);
            let set_field = &mut self.methods[previous.index()].set_field;
            if *set_field == Some(field) {
                *set_field = None;
            }
        }
        let f = &mut self.fields[field.index()];
        f.setter = Some(setter);
        push_unique(&mut f.writing_methods, setter);
    }

    // ===== Dependencies =====

    /// Record `dependent` as derived from `field`, up the superclass chain
    pub fn add_dependent_field(&mut self, field: FieldId, dependent: FieldId) {
        push_unique(&mut self.fields[field.index()].dependent_fields, dependent);
        if let Some(parent) = self.super_field(field) {
            self.add_dependent_field(parent, dependent);
        }
    }

    /// Record `method` as depending on `field`, up the superclass chain
    pub fn add_dependent_method(&mut self, field: FieldId, method: MethodId) {
        push_unique(&mut self.fields[field.index()].dependent_methods, method);
        if let Some(parent) = self.super_field(field) {
            self.add_dependent_method(parent, method);
        }
    }

    // ===== Collections =====

    pub(crate) fn link_added(&mut self, method: MethodId, collection: FieldId) -> Result<()> {
        let count = {
            let info = self.collection_info_mut(collection)?;
            push_unique(&mut info.adding_methods, method);
            info.adding_methods.len()
        };
        push_unique(&mut self.methods[method.index()].added_collections, collection);
        if count > 1 {
            let adders: Vec<String> = self.fields[collection.index()]
                .collection()
                .map(|info| info.adding_methods.iter().map(|m| self.methods[m.index()].full_name.clone()).collect())
                .unwrap_or_default();
            self.advise(self.field_long_name(collection), format!("several adders: {}", adders.join(", ")));
        }
        Ok(())
    }

    pub(crate) fn link_removed(&mut self, method: MethodId, collection: FieldId) -> Result<()> {
        push_unique(&mut self.collection_info_mut(collection)?.removing_methods, method);
        push_unique(&mut self.methods[method.index()].removed_collections, collection);
        Ok(())
    }

    fn collection_info_mut(&mut self, collection: FieldId) -> Result<&mut CollectionInfo> {
        self.expect_collection(collection)?;
        self.fields[collection.index()]
            .collection_mut()
            .ok_or_else(|| RttiError::InvalidDelegate {
                item: collection.to_string(),
                reason: "not a collection type".to_string(),
            })
    }

    pub(crate) fn set_explicit_adder(&mut self, collection: FieldId, adder: MethodId) -> Result<()> {
        self.collection_info_mut(collection)?.adder = Some(adder);
        push_unique(&mut self.methods[adder.index()].added_collections, collection);
        Ok(())
    }

    pub(crate) fn set_explicit_remover(&mut self, collection: FieldId, remover: MethodId) -> Result<()> {
        self.collection_info_mut(collection)?.remover = Some(remover);
        push_unique(&mut self.methods[remover.index()].removed_collections, collection);
        Ok(())
    }

    /// The adder: explicit, else the first adding method, else the adder
    /// of the collection an expression ends on
    pub fn adder(&mut self, collection: FieldId) -> Result<Option<MethodId>> {
        self.build_field_info(self.fields[collection.index()].class)?;
        let info = self.expect_collection(collection)?;
        if let Some(adder) = info.adder.or_else(|| info.adding_methods.first().copied()) {
            return Ok(Some(adder));
        }
        match self.fields[collection.index()].path_top() {
            Some(top) => self.adder(top),
            None => Ok(None),
        }
    }

    /// The remover: explicit, else the first removing method, else the
    /// remover of the collection an expression ends on
    pub fn remover(&mut self, collection: FieldId) -> Result<Option<MethodId>> {
        self.build_field_info(self.fields[collection.index()].class)?;
        let info = self.expect_collection(collection)?;
        if let Some(remover) = info.remover.or_else(|| info.removing_methods.first().copied()) {
            return Ok(Some(remover));
        }
        match self.fields[collection.index()].path_top() {
            Some(top) => self.remover(top),
            None => Ok(None),
        }
    }

    /// Whether the map collection is an index on its values
    pub fn is_index(&self, collection: FieldId) -> bool {
        self.get_boolean(collection, IS_INDEX, false)
    }

    /// Set the element type explicitly
    pub fn set_component_type_id(&mut self, collection: FieldId, component: ClassId) -> Result<()> {
        self.collection_info_mut(collection)?.component_type = Some(component);
        Ok(())
    }

    /// Element type of a collection.
    ///
    /// Explicit type first; then the element type of an array, the
    /// element type of the collection an expression ends on, or the
    /// adder's parameters. `None` means unknown and is reported as a
    /// diagnostic, once per collection.
    pub fn component_type(&mut self, collection: FieldId) -> Result<Option<ClassId>> {
        self.build_field_info(self.fields[collection.index()].class)?;
        let info = self.expect_collection(collection)?;
        if let Some(component) = info.component_type {
            return Ok(Some(component));
        }
        let kind = info.kind;
        let reported = info.component_unresolved;

        let ty = self.field_type(collection);
        let inferred = if let Some(element) = ty.element() {
            self.get_class(element.name()).ok()
        } else if let Some(top) = self.fields[collection.index()].path_top() {
            self.component_type(top)?
        } else {
            match self.adder(collection)? {
                Some(adder) => self.component_from_adder(collection, adder, kind, !reported),
                None => None,
            }
        };

        match inferred {
            Some(component) => self.set_component_type_id(collection, component)?,
            None if reported => {}
            None => {
                self.collection_info_mut(collection)?.component_unresolved = true;
                let calculated = self.fields[collection.index()].is_calculated();
                let has_adder = self.adder(collection)?.is_some();
                let message = if !has_adder && !calculated {
                    "component type is unknown: no adder"
                } else {
                    "component type is unknown"
                };
                self.advise(self.field_long_name(collection), message);
            }
        }
        Ok(inferred)
    }

    fn component_from_adder(&mut self, collection: FieldId, adder: MethodId, kind: CollectionKind, report: bool) -> Option<ClassId> {
        let method = &self.methods[adder.index()];
        let params = method.params.clone();
        let item_argument = method.collection_item_argument;
        let ty = match params.len() {
            0 => None,
            1 => Some(params[0].clone()),
            n if kind == CollectionKind::Map && self.is_index(collection) => Some(params[n - 1].clone()),
            n => match item_argument.filter(|i| *i < n) {
                Some(i) => Some(params[i].clone()),
                None if kind == CollectionKind::Map => Some(TypeRef::new(MAP_ENTRY)),
                None => None,
            },
        };
        match ty {
            Some(ty) => self.get_class(ty.name()).ok(),
            None if !report => None,
            None => {
                let message = format!(
                    "cannot determine component type from adder {}",
                    self.methods[adder.index()].full_name
                );
                self.advise(self.field_long_name(collection), message);
                None
            }
        }
    }

    // ===== Paths and roles =====

    /// Whether `field` is a longer path starting with `base`
    pub fn starts_with(&self, field: FieldId, base: FieldId) -> bool {
        field != base && self.fields[field.index()].name.starts_with(&self.fields[base.index()].name)
    }

    /// The part of an expression field after `base`, resolved on the
    /// element type (collections) or the type of `base`
    pub fn relative_field(&mut self, field: FieldId, base: FieldId) -> Result<FieldId> {
        let name = self.fields[field.index()].name.clone();
        let base_len = self.fields[base.index()].name.len();
        let rest = name
            .get(base_len + 1..)
            .ok_or_else(|| RttiError::no_such_field(self.field_long_name(base), &name))?
            .to_string();
        let class = if self.fields[base.index()].is_collection() {
            self.component_type(base)?
                .ok_or_else(|| RttiError::no_such_field(self.field_long_name(base), &rest))?
        } else {
            self.type_item(base)?
        };
        self.get_field(class, &rest)
    }

    /// Opposite role of an association end
    pub fn opposite_role(&self, field: FieldId) -> Option<FieldId> {
        self.fields[field.index()]
            .opposite_role
            .or_else(|| self.get_attribute(field, OPPOSITE_ROLE).and_then(|v| v.as_field()))
    }

    pub(crate) fn set_opposite_role_raw(&mut self, field: FieldId, opposite: FieldId) {
        self.fields[field.index()].opposite_role = Some(opposite);
        self.set_attribute(field, OPPOSITE_ROLE, AttrValue::from(opposite));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facts::{FactSink, FactTable};
    use crate::model::{NativeClass, NativeModel};

    fn bank() -> Repository {
        let model = NativeModel::from_classes([
            NativeClass::new("Person").field("name", "String"),
            NativeClass::new("Account")
                .field("owner", "Person")
                .field("balance", "double")
                .method("getOwner", &[], "Person"),
            NativeClass::new("Bank")
                .field("accounts", "List")
                .field("codes", "int[]")
                .field("raw", "byte[]")
                .method("addAccount", &["Account"], "void")
                .method("getAccounts", &[], "List"),
        ]);
        let mut facts = FactTable::new();
        facts.add_added_collection("Bank", "addAccount(Account)", "accounts");
        facts.add_returned_field("Account", "getOwner()", "owner");
        facts.set_is_getter("Account", "getOwner()", true);
        Repository::new(model).with_facts(facts)
    }

    #[test]
    fn test_slot_variants() {
        let mut repo = bank();
        let b = repo.get_class("Bank").unwrap();
        let codes = repo.get_field(b, "codes").unwrap();
        assert!(repo.field(codes).collection().unwrap().is_array());
        let raw = repo.get_field(b, "raw").unwrap();
        assert!(!repo.field(raw).is_collection());
        assert!(repo.get_collection(b, "raw").is_err());
        let counts = repo.class(b).counts;
        assert_eq!(counts.collections, 2);
        assert_eq!(counts.primitives, 1);
    }

    #[test]
    fn test_component_type_from_array_and_adder() {
        let mut repo = bank();
        let b = repo.get_class("Bank").unwrap();
        let codes = repo.get_field(b, "codes").unwrap();
        let int = repo.component_type(codes).unwrap().unwrap();
        assert_eq!(repo.class(int).name(), "int");

        let accounts = repo.get_field(b, "accounts").unwrap();
        let account = repo.component_type(accounts).unwrap().unwrap();
        assert_eq!(repo.class(account).name(), "Account");
    }

    #[test]
    fn test_expression_field() {
        let mut repo = bank();
        let b = repo.get_class("Bank").unwrap();
        let expr = repo.get_field(b, "accounts.owner.name").unwrap();
        assert!(repo.field(expr).is_expression());
        assert_eq!(repo.field(expr).path().len(), 3);
        assert_eq!(repo.field_type(expr).name(), "String");
        assert_eq!(repo.get_field(b, "accounts.owner.name").unwrap(), expr);

        let accounts = repo.get_field(b, "accounts").unwrap();
        assert!(repo.starts_with(expr, accounts));
        let relative = repo.relative_field(expr, accounts).unwrap();
        assert_eq!(repo.field(relative).name(), "owner.name");
    }

    #[test]
    fn test_bad_expression_is_no_such_field() {
        let mut repo = bank();
        let b = repo.get_class("Bank").unwrap();
        let err = repo.get_field(b, "accounts.nothing").unwrap_err();
        assert!(matches!(err, RttiError::NoSuchField { .. }));
    }

    #[test]
    fn test_reference_classification() {
        let mut repo = bank();
        let a = repo.get_class("Account").unwrap();
        let owner = repo.get_field(a, "owner").unwrap();
        let balance = repo.get_field(a, "balance").unwrap();
        assert!(repo.is_reference(owner));
        assert!(repo.is_primitive(balance));
        let getter = repo.field_getter(owner).unwrap().unwrap();
        assert!(repo.is_reference_getter(getter));
        assert_eq!(repo.class(a).counts.references, 1);
    }

    #[test]
    fn test_clone_onto_non_class_is_invalid_parent() {
        let mut repo = bank();
        let a = repo.get_class("Account").unwrap();
        let owner = repo.get_field(a, "owner").unwrap();
        let getter = repo.field_getter(owner).unwrap().unwrap();
        let err = repo.clone_field(owner, getter).unwrap_err();
        assert!(matches!(err, RttiError::InvalidParent { .. }));
    }

    #[test]
    fn test_unknown_component_type_reported_once() {
        let mut repo = Repository::new(NativeModel::from_classes([NativeClass::new("Shelf").field("tags", "List")]));
        let shelf = repo.get_class("Shelf").unwrap();
        let tags = repo.get_collection(shelf, "tags").unwrap();
        for _ in 0..5 {
            assert_eq!(repo.component_type(tags).unwrap(), None);
        }
        let reported = repo.diagnostics().iter().filter(|d| d.subject == "Shelf.tags").count();
        assert_eq!(reported, 1);
        assert!(repo.field(tags).collection().unwrap().component_unresolved);
    }
}
