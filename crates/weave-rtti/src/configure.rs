//! Attribute configuration surface
//!
//! Declarations made by configuration collaborators after (or instead
//! of) fact-based construction: explicit accessors, calculated fields,
//! logical types, associations, casts, keys and nullability. Most of
//! them end up as attributes on the descriptors.

use rustc_hash::FxHashSet;
use tracing::{debug, info};

use crate::attributes::{
    AttrValue, CLONED_FIELDS, FIELD_TYPE, INDEXED_FIELD, IS_INDEX, NULL_ALLOWED, NULL_ALLOWED_PARAMETERS,
    PARAMETERS_FIELDS, PARAMETER_TYPES, PRIMARY_KEY, REPOSITORY_COLLECTION, REPOSITORY_NAME,
};
use crate::config::Declarations;
use crate::descriptor::{push_unique, ClassId, FieldId, ItemId, MethodId, VirtualId};
use crate::error::{Result, RttiError};
use crate::field::FieldDescriptor;
use crate::model::TypeRef;
use crate::repository::Repository;

impl Repository {
    // ===== Behavioral declarations =====

    /// Declare fields written by a method, by name
    pub fn add_written_fields(&mut self, method: MethodId, fields: &[&str]) -> Result<()> {
        let class = self.methods[method.index()].class;
        for name in fields {
            let field = self.get_field(class, name)?;
            self.link_written(method, field);
        }
        Ok(())
    }

    /// Declare fields read by a method, by name
    pub fn add_accessed_fields(&mut self, method: MethodId, fields: &[&str]) -> Result<()> {
        let class = self.methods[method.index()].class;
        for name in fields {
            let field = self.get_field(class, name)?;
            self.link_accessed(method, field);
        }
        Ok(())
    }

    /// Add a field computed by `getter`. Fields read by the getter get
    /// the new field as a dependent.
    pub fn declare_calculated_field(&mut self, class: ClassId, name: &str, getter: &str) -> Result<FieldId> {
        let getter = self.get_method(class, getter)?;
        let kind = self.model.collection_kind(&self.methods[getter.index()].return_type);
        let field = self.attach_field(class, FieldDescriptor::calculated(name, kind, class));
        self.set_field_getter(field, getter);
        if self.methods[getter.index()].returned_field.is_none() {
            self.methods[getter.index()].returned_field = Some(field);
        }
        let sources: Vec<FieldId> = self.methods[getter.index()]
            .accessed_fields
            .iter()
            .copied()
            .filter(|f| *f != field)
            .collect();
        for source in sources {
            debug!(field = %self.field_long_name(field), source = %self.field_long_name(source), "calculated field dependency");
            self.add_dependent_field(source, field);
        }
        Ok(field)
    }

    /// Bind the setter of a field by method name
    pub fn set_setter(&mut self, field: FieldId, setter: &str) -> Result<()> {
        let class = self.fields[field.index()].class;
        let setter = self.get_method(class, setter)?;
        self.bind_setter(setter, field);
        Ok(())
    }

    /// Bind the getter of a field by method name
    pub fn set_getter(&mut self, field: FieldId, getter: &str) -> Result<()> {
        let class = self.fields[field.index()].class;
        let getter = self.get_method(class, getter)?;
        self.bind_getter(getter, field);
        Ok(())
    }

    /// Declare that `field` is derived from the field named `source`
    pub fn declare_dependency(&mut self, field: FieldId, source: &str) -> Result<()> {
        let class = self.fields[field.index()].class;
        let source = self.get_field(class, source)?;
        self.add_dependent_field(source, field);
        Ok(())
    }

    fn collection_method(&mut self, collection: FieldId, name: &str) -> Result<MethodId> {
        self.expect_collection(collection)?;
        let class = self.fields[collection.index()].class;
        self.get_method(class, name)
    }

    /// Declare one more adding method of a collection
    pub fn add_adder(&mut self, collection: FieldId, method: &str) -> Result<()> {
        let method = self.collection_method(collection, method)?;
        self.link_added(method, collection)
    }

    /// Declare the adder of a collection
    pub fn set_adder(&mut self, collection: FieldId, method: &str) -> Result<()> {
        let method = self.collection_method(collection, method)?;
        self.set_explicit_adder(collection, method)
    }

    /// Declare one more removing method of a collection
    pub fn add_remover(&mut self, collection: FieldId, method: &str) -> Result<()> {
        let method = self.collection_method(collection, method)?;
        self.link_removed(method, collection)
    }

    /// Declare the remover of a collection
    pub fn set_remover(&mut self, collection: FieldId, method: &str) -> Result<()> {
        let method = self.collection_method(collection, method)?;
        self.set_explicit_remover(collection, method)
    }

    // ===== Logical types =====

    fn type_object(&mut self, name: &str) -> Result<ItemId> {
        self.get_virtual_class(name)
    }

    /// Logical type of a field: a class or a virtual class
    pub fn set_field_type(&mut self, field: FieldId, ty: &str) -> Result<()> {
        let item = self.type_object(ty)?;
        self.set_attribute(field, FIELD_TYPE, item);
        Ok(())
    }

    /// Logical type declared with [`Repository::set_field_type`]
    pub fn declared_field_type(&self, field: FieldId) -> Option<ItemId> {
        self.get_attribute(field, FIELD_TYPE).and_then(|v| v.as_item())
    }

    /// Element type of a collection, by class name
    pub fn set_component_type(&mut self, collection: FieldId, ty: &str) -> Result<()> {
        let component = self.get_class(ty)?;
        self.set_component_type_id(collection, component)
    }

    /// Logical types of a method's parameters
    pub fn set_parameters_type(&mut self, method: MethodId, types: &[&str]) -> Result<()> {
        let mut items = Vec::with_capacity(types.len());
        for ty in types {
            items.push(self.type_object(ty)?);
        }
        self.set_attribute(method, PARAMETER_TYPES, items);
        Ok(())
    }

    /// Register a virtual class over an actual class
    pub fn new_virtual_class(&mut self, name: &str, actual: ClassId) -> Result<VirtualId> {
        info!(name, actual = %self.classes[actual.index()].name, "new virtual class");
        self.add_virtual_class(name, actual)
    }

    /// Redirect attribute lookups of an item to the class or virtual
    /// class `class_name`, creating a virtual class over the item's type
    /// when the name is unknown
    pub fn set_class(&mut self, item: impl Into<ItemId>, class_name: &str) -> Result<()> {
        let item = item.into();
        let target = match self.get_virtual_class(class_name) {
            Ok(target) => target,
            Err(RttiError::NoSuchClass { .. }) => {
                let actual = match item {
                    ItemId::Class(class) => class,
                    ItemId::Field(field) => self.type_item(field)?,
                    ItemId::Method(method) => {
                        let ty = self.methods[method.index()].return_type.clone();
                        self.get_class(ty.name())?
                    }
                    ItemId::Virtual(v) => self.virtuals[v.index()].actual,
                };
                ItemId::Virtual(self.add_virtual_class(class_name, actual)?)
            }
            Err(e) => return Err(e),
        };
        self.set_item_class(item, target);
        Ok(())
    }

    // ===== Repository and cloning =====

    /// Name and collection of the object holding all instances of a class
    pub fn define_repository(&mut self, class: ClassId, name: &str, collection: FieldId) {
        self.set_attribute(class, REPOSITORY_NAME, name);
        self.set_attribute(class, REPOSITORY_COLLECTION, collection);
    }

    /// Fields copied when an instance of the class is cloned
    pub fn set_cloned_fields(&mut self, class_name: &str, fields: &[&str]) -> Result<()> {
        let class = self.get_class(class_name)?;
        self.set_attribute(class, CLONED_FIELDS, fields.to_vec());
        Ok(())
    }

    /// Fields the parameters of a method are assigned to
    pub fn set_parameters_fields(&mut self, method: MethodId, fields: &[FieldId]) {
        self.set_attribute(method, PARAMETERS_FIELDS, fields.to_vec());
    }

    // ===== Constraints =====

    /// Whether a field accepts null
    pub fn set_null_allowed(&mut self, field: FieldId, allowed: bool) {
        self.set_attribute(field, NULL_ALLOWED, allowed);
    }

    /// Null acceptance of a field, false when undeclared
    pub fn is_null_allowed(&self, field: FieldId) -> bool {
        self.get_boolean(field, NULL_ALLOWED, false)
    }

    /// Null acceptance of each parameter of a method
    pub fn set_null_allowed_parameters(&mut self, method: MethodId, allowed: &[bool]) {
        self.set_attribute(method, NULL_ALLOWED_PARAMETERS, allowed.to_vec());
    }

    /// Null acceptance of one parameter, false when undeclared
    pub fn is_null_allowed_parameter(&self, method: MethodId, index: usize) -> bool {
        self.get_attribute(method, NULL_ALLOWED_PARAMETERS)
            .and_then(|v| v.as_list().and_then(|list| list.get(index).and_then(AttrValue::as_bool)))
            .unwrap_or(false)
    }

    /// Mark a field as an aggregation relation
    pub fn set_aggregation(&mut self, field: FieldId, aggregation: bool) {
        self.fields[field.index()].aggregation = aggregation;
    }

    /// Declare a map collection as an index keyed on an element field
    pub fn set_indexed_field(&mut self, collection: FieldId, indexed: FieldId) -> Result<()> {
        self.set_is_index(collection, true)?;
        self.set_attribute(collection, INDEXED_FIELD, indexed);
        Ok(())
    }

    /// Declare whether a collection is an index
    pub fn set_is_index(&mut self, collection: FieldId, is_index: bool) -> Result<()> {
        self.expect_collection(collection)?;
        self.set_attribute(collection, IS_INDEX, is_index);
        Ok(())
    }

    /// Element field an index collection is keyed on
    pub fn indexed_field(&self, collection: FieldId) -> Option<FieldId> {
        self.get_attribute(collection, INDEXED_FIELD).and_then(|v| v.as_field())
    }

    /// Element fields forming the primary key of a collection
    pub fn define_primary_key(&mut self, collection: FieldId, fields: &[&str]) -> Result<()> {
        self.expect_collection(collection)?;
        self.set_attribute(collection, PRIMARY_KEY, fields.to_vec());
        Ok(())
    }

    /// Primary key of a collection
    pub fn primary_key(&self, collection: FieldId) -> Vec<String> {
        self.get_attribute(collection, PRIMARY_KEY)
            .map(|v| v.as_strings().into_iter().map(str::to_string).collect())
            .unwrap_or_default()
    }

    // ===== Casts and associations =====

    /// Allow converting instances of `from` into `to`
    pub fn add_allowed_cast(&mut self, from: ClassId, to: ClassId) {
        self.allowed_casts.entry(from).or_insert_with(FxHashSet::default).insert(to);
    }

    /// Whether a conversion was allowed
    pub fn is_cast_allowed(&self, from: ClassId, to: ClassId) -> bool {
        self.allowed_casts.get(&from).is_some_and(|casts| casts.contains(&to))
    }

    /// Set the opposite role of one association end
    pub fn set_opposite_role(&mut self, field: FieldId, opposite: FieldId) {
        self.set_opposite_role_raw(field, opposite);
        let class = self.fields[field.index()].class;
        push_unique(&mut self.classes_with_associations, class);
    }

    /// Declare a bidirectional association
    pub fn declare_association(&mut self, role_a: FieldId, role_b: FieldId) {
        self.set_opposite_role(role_a, role_b);
        self.set_opposite_role(role_b, role_a);
    }

    /// Classes owning at least one association end
    pub fn classes_with_associations(&self) -> &[ClassId] {
        &self.classes_with_associations
    }

    // ===== Mixins =====

    /// Attach a static method to `class` as a mixin. The method's first
    /// parameter must accept instances of the class. Existing subclasses
    /// get the mixin too; subclasses built later inherit it.
    pub fn add_mixin_method(&mut self, class: ClassId, source: MethodId) -> Result<MethodId> {
        let method = &self.methods[source.index()];
        let class_type = TypeRef::new(self.classes[class.index()].name.clone());
        let reason = if !method.is_static() {
            Some("mixin method must be static")
        } else {
            match method.params.first() {
                None => Some("mixin method needs the target instance as first parameter"),
                Some(first) if !self.model.is_assignable(&class_type, first) => {
                    Some("first parameter does not accept the target class")
                }
                Some(_) => None,
            }
        };
        if let Some(reason) = reason {
            return Err(RttiError::InvalidDelegate {
                item: self.method_long_name(source),
                reason: reason.to_string(),
            });
        }

        let mixin = self.attach_mixin(class, source);
        let full_name = self.methods[mixin.index()].full_name.clone();
        let mut pending = self.classes[class.index()].children.clone();
        while let Some(child) = pending.pop() {
            if self.classes[child.index()].methods.exact(&full_name).is_none() {
                self.attach_mixin(child, mixin);
            }
            pending.extend(self.classes[child.index()].children.iter().copied());
        }
        Ok(mixin)
    }

    // ===== Declarations =====

    /// `Class.field` reference; the class part ends at the last `.`
    pub fn resolve_field_ref(&mut self, reference: &str) -> Result<FieldId> {
        let split = reference
            .rfind('.')
            .ok_or_else(|| RttiError::no_such_field("", reference))?;
        let class = self.get_class(&reference[..split])?;
        self.get_field(class, &reference[split + 1..])
    }

    /// Apply configuration declarations, in dependency order: virtual
    /// classes and calculated fields first, relations last
    pub fn apply_declarations(&mut self, declare: &Declarations) -> Result<()> {
        for decl in &declare.virtual_classes {
            let actual = self.get_class(&decl.actual)?;
            self.new_virtual_class(&decl.name, actual)?;
        }
        for decl in &declare.calculated {
            let class = self.get_class(&decl.class)?;
            self.declare_calculated_field(class, &decl.field, &decl.getter)?;
        }
        for decl in &declare.getters {
            let field = self.resolve_field_ref(&decl.field)?;
            self.set_getter(field, &decl.method)?;
        }
        for decl in &declare.setters {
            let field = self.resolve_field_ref(&decl.field)?;
            self.set_setter(field, &decl.method)?;
        }
        for decl in &declare.adders {
            let field = self.resolve_field_ref(&decl.field)?;
            self.set_adder(field, &decl.method)?;
        }
        for decl in &declare.removers {
            let field = self.resolve_field_ref(&decl.field)?;
            self.set_remover(field, &decl.method)?;
        }
        for decl in &declare.component_types {
            let collection = self.resolve_field_ref(&decl.collection)?;
            self.set_component_type(collection, &decl.ty)?;
        }
        for decl in &declare.indexes {
            let collection = self.resolve_field_ref(&decl.collection)?;
            match &decl.field {
                Some(name) => {
                    let element = self.component_type(collection)?.ok_or_else(|| RttiError::InvalidDelegate {
                        item: decl.collection.clone(),
                        reason: "index over a collection of unknown element type".to_string(),
                    })?;
                    let indexed = self.get_field(element, name)?;
                    self.set_indexed_field(collection, indexed)?;
                }
                None => self.set_is_index(collection, true)?,
            }
        }
        for decl in &declare.associations {
            let role_a = self.resolve_field_ref(&decl.role_a)?;
            let role_b = self.resolve_field_ref(&decl.role_b)?;
            self.declare_association(role_a, role_b);
        }
        for decl in &declare.casts {
            let from = self.get_class(&decl.from)?;
            let to = self.get_class(&decl.to)?;
            self.add_allowed_cast(from, to);
        }
        for decl in &declare.primary_keys {
            let collection = self.resolve_field_ref(&decl.collection)?;
            let fields: Vec<&str> = decl.fields.iter().map(String::as_str).collect();
            self.define_primary_key(collection, &fields)?;
        }
        for decl in &declare.nullable {
            let field = self.resolve_field_ref(&decl.field)?;
            self.set_null_allowed(field, decl.allowed);
        }
        for reference in &declare.aggregations {
            let field = self.resolve_field_ref(reference)?;
            self.set_aggregation(field, true);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facts::{FactSink, FactTable};
    use crate::model::{Modifiers, NativeClass, NativeModel};

    fn repo() -> Repository {
        let model = NativeModel::from_classes([
            NativeClass::new("Customer")
                .field("name", "String")
                .field("orders", "List")
                .method("getName", &[], "String")
                .method("addOrder", &["Order"], "void")
                .method("getLabel", &[], "String"),
            NativeClass::new("Vip").extends("Customer"),
            NativeClass::new("Order").field("customer", "Customer").field("ref", "String"),
            NativeClass::new("Util").method_with("describe", &["Customer"], "String", Modifiers::PUBLIC | Modifiers::STATIC),
        ]);
        let mut facts = FactTable::new();
        facts.add_accessed_field("Customer", "getLabel()", "name");
        Repository::new(model).with_facts(facts)
    }

    #[test]
    fn test_calculated_field_dependencies() {
        let mut repo = repo();
        let customer = repo.get_class("Customer").unwrap();
        let label = repo.declare_calculated_field(customer, "label", "getLabel").unwrap();
        assert!(repo.field(label).is_calculated());
        assert!(repo.field(label).is_transient());
        assert_eq!(repo.field_type(label).name(), "String");
        let name = repo.get_field(customer, "name").unwrap();
        assert_eq!(repo.field(name).dependent_fields(), &[label]);
    }

    #[test]
    fn test_explicit_adder_and_component_type() {
        let mut repo = repo();
        let customer = repo.get_class("Customer").unwrap();
        let orders = repo.get_collection(customer, "orders").unwrap();
        repo.set_adder(orders, "addOrder").unwrap();
        let adder = repo.adder(orders).unwrap().unwrap();
        assert_eq!(repo.method(adder).name(), "addOrder");
        assert!(repo.method(adder).is_adder());
        let order = repo.component_type(orders).unwrap().unwrap();
        assert_eq!(repo.class(order).name(), "Order");

        let name = repo.get_field(customer, "name").unwrap();
        assert!(matches!(repo.set_adder(name, "addOrder"), Err(RttiError::InvalidDelegate { .. })));
    }

    #[test]
    fn test_association_and_casts() {
        let mut repo = repo();
        let orders = repo.resolve_field_ref("Customer.orders").unwrap();
        let customer = repo.resolve_field_ref("Order.customer").unwrap();
        repo.declare_association(orders, customer);
        assert_eq!(repo.opposite_role(orders), Some(customer));
        assert_eq!(repo.opposite_role(customer), Some(orders));
        assert_eq!(repo.classes_with_associations().len(), 2);

        let a = repo.get_class("Customer").unwrap();
        let b = repo.get_class("Order").unwrap();
        repo.add_allowed_cast(a, b);
        assert!(repo.is_cast_allowed(a, b));
        assert!(!repo.is_cast_allowed(b, a));
    }

    #[test]
    fn test_nullability_and_keys() {
        let mut repo = repo();
        let name = repo.resolve_field_ref("Customer.name").unwrap();
        assert!(!repo.is_null_allowed(name));
        repo.set_null_allowed(name, true);
        assert!(repo.is_null_allowed(name));

        let customer = repo.get_class("Customer").unwrap();
        let add = repo.get_method(customer, "addOrder").unwrap();
        repo.set_null_allowed_parameters(add, &[true]);
        assert!(repo.is_null_allowed_parameter(add, 0));
        assert!(!repo.is_null_allowed_parameter(add, 1));

        let orders = repo.resolve_field_ref("Customer.orders").unwrap();
        repo.define_primary_key(orders, &["ref"]).unwrap();
        assert_eq!(repo.primary_key(orders), vec!["ref".to_string()]);
    }

    #[test]
    fn test_set_class_creates_virtual_redirect() {
        let mut repo = repo();
        let name = repo.resolve_field_ref("Customer.name").unwrap();
        repo.set_class(name, "Email").unwrap();
        let target = repo.item_class(name).unwrap();
        let virtual_id = repo.get_virtual_class_strict("Email").unwrap();
        assert_eq!(target, ItemId::Virtual(virtual_id));
        assert_eq!(repo.class(repo.virtual_class(virtual_id).actual()).name(), "String");

        repo.set_attribute(virtual_id, "Gui.FORMAT", "email");
        assert_eq!(repo.get_attribute(name, "Gui.FORMAT"), Some(AttrValue::from("email")));
    }

    #[test]
    fn test_field_type_must_exist() {
        let mut repo = repo();
        let name = repo.resolve_field_ref("Customer.name").unwrap();
        assert!(matches!(repo.set_field_type(name, "Nope"), Err(RttiError::NoSuchClass { .. })));
        let customer = repo.get_class("Customer").unwrap();
        repo.new_virtual_class("Label", customer).unwrap();
        repo.set_field_type(name, "Label").unwrap();
        assert!(matches!(repo.declared_field_type(name), Some(ItemId::Virtual(_))));
    }

    #[test]
    fn test_mixin_propagates_to_subclasses() {
        let mut repo = repo();
        let customer = repo.get_class("Customer").unwrap();
        let vip = repo.get_class("Vip").unwrap();
        let util = repo.get_class("Util").unwrap();
        let describe = repo.get_method(util, "describe").unwrap();

        let mixin = repo.add_mixin_method(customer, describe).unwrap();
        assert!(repo.method(mixin).is_mixin());
        assert!(repo.method(mixin).params().is_empty());
        assert_eq!(repo.mixin_methods(customer).unwrap(), vec![mixin]);
        assert_eq!(repo.mixin_methods(vip).unwrap().len(), 1);

        let order = repo.get_class("Order").unwrap();
        assert!(matches!(repo.add_mixin_method(order, describe), Err(RttiError::InvalidDelegate { .. })));
    }
}
