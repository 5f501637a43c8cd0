//! Attribute store
//!
//! Every descriptor carries a string-keyed attribute map. Lookups fall
//! back along the item's inheritance path: a class asks its superclass,
//! a field or method asks the same-named member of the superclass, an
//! expression field asks the terminal field of its path, and any item
//! can be redirected to an "item class" (usually a virtual class).
//!
//! The first owner that writes an attribute name is recorded; reads of
//! that name are hidden while the owner is not registered. Gated names
//! (the GUI visibility and editability tags by default) are passed
//! through an optional [`AttributeController`] that may veto or rewrite
//! the value.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::descriptor::{ClassId, FieldId, ItemId, MethodId};
use crate::field::FieldOrigin;
use crate::repository::Repository;

// ============================================================================
// Attribute names
// ============================================================================

/// Whether an item is shown in user interfaces
pub const GUI_VISIBLE: &str = "GuiAC.VISIBLE";
/// Whether a field can be edited
pub const GUI_EDITABLE: &str = "GuiAC.EDITABLE";
/// Whether elements can be added to a collection
pub const GUI_ADDABLE: &str = "GuiAC.ADDABLE";
/// Whether instances can be created
pub const GUI_CREATABLE: &str = "GuiAC.CREATABLE";
/// Whether elements can be removed from a collection
pub const GUI_REMOVABLE: &str = "GuiAC.REMOVABLE";

/// Attribute names routed through the access controller by default
pub const GUI_GATED_ATTRIBUTES: [&str; 5] = [
    GUI_VISIBLE,
    GUI_EDITABLE,
    GUI_ADDABLE,
    GUI_CREATABLE,
    GUI_REMOVABLE,
];

/// Opposite role of an association end (field item)
pub const OPPOSITE_ROLE: &str = "RttiAC.OPPOSITE_ROLE";
/// Logical type of a field (class or virtual class item)
pub const FIELD_TYPE: &str = "RttiAC.FIELD_TYPE";
/// Logical types of method parameters (list of items)
pub const PARAMETER_TYPES: &str = "RttiAC.PARAMETERS_TYPES";
/// Fields copied when an instance is cloned (list of names)
pub const CLONED_FIELDS: &str = "RttiAC.CLONED_FIELDS";
/// Name of the object holding the instances of a class
pub const REPOSITORY_NAME: &str = "RttiAC.REPOSITORY_NAME";
/// Collection holding the instances of a class (field item)
pub const REPOSITORY_COLLECTION: &str = "RttiAC.REPOSITORY_COLLECTION";
/// Per-parameter null acceptance (list of booleans)
pub const NULL_ALLOWED_PARAMETERS: &str = "RttiAC.NULL_ALOWED_PARAMETERS";
/// Null acceptance of a field (boolean)
pub const NULL_ALLOWED: &str = "RttiAC.NULL_ALLOWED";
/// A map collection is an index on its values (boolean)
pub const IS_INDEX: &str = "RttiAC.IS_INDEX";
/// Element field an index collection is keyed on (field item)
pub const INDEXED_FIELD: &str = "RttiAC.INDEXED_FIELD";
/// Fields a method's parameters are assigned to (list of field items)
pub const PARAMETERS_FIELDS: &str = "RttiAC.PARAMETERS_FIELDS";
/// Element fields forming a collection's primary key (list of names)
pub const PRIMARY_KEY: &str = "RttiAC.PRIMARY_KEY";

// ============================================================================
// Values
// ============================================================================

/// Attribute value
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    /// Boolean flag
    Bool(bool),
    /// Integer
    Int(i64),
    /// String
    Str(String),
    /// Ordered list of values
    List(Vec<AttrValue>),
    /// Reference to another descriptor
    Item(ItemId),
}

impl AttrValue {
    /// Boolean value
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttrValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Integer value
    pub fn as_int(&self) -> Option<i64> {
        match self {
            AttrValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// String value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// List value
    pub fn as_list(&self) -> Option<&[AttrValue]> {
        match self {
            AttrValue::List(l) => Some(l),
            _ => None,
        }
    }

    /// Descriptor reference
    pub fn as_item(&self) -> Option<ItemId> {
        match self {
            AttrValue::Item(i) => Some(*i),
            _ => None,
        }
    }

    /// Field reference
    pub fn as_field(&self) -> Option<FieldId> {
        match self.as_item()? {
            ItemId::Field(f) => Some(f),
            _ => None,
        }
    }

    /// Class reference
    pub fn as_class(&self) -> Option<ClassId> {
        match self.as_item()? {
            ItemId::Class(c) => Some(c),
            _ => None,
        }
    }

    /// List of strings, skipping non-string entries
    pub fn as_strings(&self) -> Vec<&str> {
        self.as_list()
            .map(|l| l.iter().filter_map(AttrValue::as_str).collect())
            .unwrap_or_default()
    }
}

impl From<bool> for AttrValue {
    fn from(b: bool) -> Self {
        AttrValue::Bool(b)
    }
}

impl From<i64> for AttrValue {
    fn from(i: i64) -> Self {
        AttrValue::Int(i)
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        AttrValue::Str(s.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(s: String) -> Self {
        AttrValue::Str(s)
    }
}

impl From<ItemId> for AttrValue {
    fn from(i: ItemId) -> Self {
        AttrValue::Item(i)
    }
}

impl From<ClassId> for AttrValue {
    fn from(c: ClassId) -> Self {
        AttrValue::Item(c.into())
    }
}

impl From<FieldId> for AttrValue {
    fn from(f: FieldId) -> Self {
        AttrValue::Item(f.into())
    }
}

impl From<MethodId> for AttrValue {
    fn from(m: MethodId) -> Self {
        AttrValue::Item(m.into())
    }
}

impl<T: Into<AttrValue>> From<Vec<T>> for AttrValue {
    fn from(values: Vec<T>) -> Self {
        AttrValue::List(values.into_iter().map(Into::into).collect())
    }
}

/// Attributes stored on one descriptor
#[derive(Debug, Clone, Default)]
pub struct AttributeMap {
    values: FxHashMap<String, AttrValue>,
    item_class: Option<ItemId>,
}

impl AttributeMap {
    /// Local value, without fallback
    pub fn get(&self, name: &str) -> Option<&AttrValue> {
        self.values.get(name)
    }

    pub(crate) fn set(&mut self, name: &str, value: AttrValue) {
        self.values.insert(name.to_string(), value);
    }

    pub(crate) fn unset(&mut self, name: &str) -> Option<AttrValue> {
        self.values.remove(name)
    }

    /// Names of the local attributes
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Number of local attributes
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no local attribute is set
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Redirect target for missing attributes
    pub fn item_class(&self) -> Option<ItemId> {
        self.item_class
    }
}

// ============================================================================
// Access control
// ============================================================================

/// Vetoes or rewrites reads of gated attributes
pub trait AttributeController {
    /// Return the value callers should see for `name` on `item`
    fn control_attribute(&self, item: ItemId, name: &str, value: Option<AttrValue>) -> Option<AttrValue>;
}

impl<F> AttributeController for F
where
    F: Fn(ItemId, &str, Option<AttrValue>) -> Option<AttrValue>,
{
    fn control_attribute(&self, item: ItemId, name: &str, value: Option<AttrValue>) -> Option<AttrValue> {
        self(item, name, value)
    }
}

/// Owner bookkeeping and gating shared by all descriptors
#[derive(Default)]
pub(crate) struct AttributeGate {
    owners: FxHashMap<String, String>,
    registered: FxHashSet<String>,
    current: Option<String>,
    controller: Option<Box<dyn AttributeController>>,
    gated: FxHashSet<String>,
}

impl std::fmt::Debug for AttributeGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttributeGate")
            .field("owners", &self.owners)
            .field("registered", &self.registered)
            .field("current", &self.current)
            .field("controller", &self.controller.is_some())
            .field("gated", &self.gated)
            .finish()
    }
}

impl AttributeGate {
    pub(crate) fn new(gated: &[String]) -> Self {
        Self {
            gated: gated.iter().cloned().collect(),
            ..Self::default()
        }
    }

    fn record_write(&mut self, name: &str) {
        if let Some(owner) = &self.current {
            self.owners
                .entry(name.to_string())
                .or_insert_with(|| owner.clone());
        }
    }

    fn hides(&self, name: &str) -> bool {
        self.owners
            .get(name)
            .is_some_and(|owner| !self.registered.contains(owner))
    }

    fn control(&self, item: ItemId, name: &str, value: Option<AttrValue>) -> Option<AttrValue> {
        match &self.controller {
            Some(controller) if self.gated.contains(name) => {
                controller.control_attribute(item, name, value)
            }
            _ => value,
        }
    }
}

// ============================================================================
// Repository API
// ============================================================================

impl Repository {
    fn attrs(&self, item: ItemId) -> &AttributeMap {
        match item {
            ItemId::Class(c) => &self.classes[c.index()].attrs,
            ItemId::Field(f) => &self.fields[f.index()].attrs,
            ItemId::Method(m) => &self.methods[m.index()].attrs,
            ItemId::Virtual(v) => &self.virtuals[v.index()].attrs,
        }
    }

    fn attrs_mut(&mut self, item: ItemId) -> &mut AttributeMap {
        match item {
            ItemId::Class(c) => &mut self.classes[c.index()].attrs,
            ItemId::Field(f) => &mut self.fields[f.index()].attrs,
            ItemId::Method(m) => &mut self.methods[m.index()].attrs,
            ItemId::Virtual(v) => &mut self.virtuals[v.index()].attrs,
        }
    }

    /// Local attributes of an item, without fallback
    pub fn attributes(&self, item: impl Into<ItemId>) -> &AttributeMap {
        self.attrs(item.into())
    }

    /// Set an attribute. An empty name is ignored.
    ///
    /// The current owner (see [`Repository::set_current_owner`]) becomes
    /// the owner of `name` if nobody wrote it before.
    pub fn set_attribute(&mut self, item: impl Into<ItemId>, name: &str, value: impl Into<AttrValue>) {
        if name.is_empty() {
            return;
        }
        self.gate.record_write(name);
        self.attrs_mut(item.into()).set(name, value.into());
    }

    /// Remove a local attribute, returning its previous value
    pub fn unset_attribute(&mut self, item: impl Into<ItemId>, name: &str) -> Option<AttrValue> {
        self.attrs_mut(item.into()).unset(name)
    }

    /// Attribute value, hidden when its owner is not registered
    pub fn get_attribute(&self, item: impl Into<ItemId>, name: &str) -> Option<AttrValue> {
        self.attribute_lookup(item.into(), name, false)
    }

    /// Attribute value, ignoring owner registration
    pub fn get_attribute_always(&self, item: impl Into<ItemId>, name: &str) -> Option<AttrValue> {
        self.attribute_lookup(item.into(), name, true)
    }

    /// Boolean attribute, `default` when unset or not a boolean
    pub fn get_boolean(&self, item: impl Into<ItemId>, name: &str, default: bool) -> bool {
        self.get_attribute(item, name)
            .and_then(|v| v.as_bool())
            .unwrap_or(default)
    }

    /// Redirect attribute lookups of `item` to `target` when missing locally
    pub fn set_item_class(&mut self, item: impl Into<ItemId>, target: impl Into<ItemId>) {
        self.attrs_mut(item.into()).item_class = Some(target.into());
    }

    /// Redirect target of an item
    pub fn item_class(&self, item: impl Into<ItemId>) -> Option<ItemId> {
        self.attrs(item.into()).item_class
    }

    /// Install the controller consulted for gated attribute names
    pub fn register_access_controller(&mut self, controller: impl AttributeController + 'static) {
        self.gate.controller = Some(Box::new(controller));
    }

    /// Remove the access controller
    pub fn clear_access_controller(&mut self) {
        self.gate.controller = None;
    }

    /// Owner credited with subsequent attribute writes
    pub fn set_current_owner(&mut self, owner: Option<&str>) {
        self.gate.current = owner.map(str::to_string);
    }

    /// Make attributes written by `owner` visible
    pub fn register_owner(&mut self, owner: &str) {
        self.gate.registered.insert(owner.to_string());
    }

    /// Hide attributes written by `owner`
    pub fn unregister_owner(&mut self, owner: &str) {
        self.gate.registered.remove(owner);
    }

    /// Owner recorded for an attribute name
    pub fn attribute_owner(&self, name: &str) -> Option<&str> {
        self.gate.owners.get(name).map(String::as_str)
    }

    fn attribute_lookup(&self, item: ItemId, name: &str, always: bool) -> Option<AttrValue> {
        if !always && self.gate.hides(name) {
            return None;
        }
        let mut visited = Vec::new();
        let value = self.inherited_attribute(item, name, &mut visited);
        self.gate.control(item, name, value)
    }

    fn inherited_attribute(&self, item: ItemId, name: &str, visited: &mut Vec<ItemId>) -> Option<AttrValue> {
        if visited.contains(&item) {
            return None;
        }
        visited.push(item);

        let attrs = self.attrs(item);
        if let Some(value) = attrs.get(name) {
            return Some(value.clone());
        }
        if let Some(target) = attrs.item_class {
            if let Some(value) = self.inherited_attribute(target, name, visited) {
                return Some(value);
            }
        }
        self.attribute_parents(item)
            .into_iter()
            .find_map(|parent| self.inherited_attribute(parent, name, visited))
    }

    /// Items an attribute lookup falls back to, nearest first
    fn attribute_parents(&self, item: ItemId) -> Vec<ItemId> {
        match item {
            ItemId::Class(c) => self.classes[c.index()]
                .superclass
                .map(ItemId::Class)
                .into_iter()
                .collect(),
            ItemId::Field(f) => {
                let field = &self.fields[f.index()];
                let mut parents: Vec<ItemId> = self
                    .super_field(f)
                    .map(ItemId::Field)
                    .into_iter()
                    .collect();
                if let FieldOrigin::Expression(path) = &field.origin {
                    parents.extend(path.last().copied().map(ItemId::Field));
                }
                parents
            }
            ItemId::Method(m) => self.super_method(m).map(ItemId::Method).into_iter().collect(),
            ItemId::Virtual(v) => vec![ItemId::Class(self.virtuals[v.index()].actual)],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attr_value_accessors() {
        assert_eq!(AttrValue::from(true).as_bool(), Some(true));
        assert_eq!(AttrValue::from(7i64).as_int(), Some(7));
        assert_eq!(AttrValue::from("x").as_str(), Some("x"));
        assert_eq!(AttrValue::from(vec!["a", "b"]).as_strings(), vec!["a", "b"]);
        assert_eq!(AttrValue::from(true).as_str(), None);
    }

    #[test]
    fn test_attribute_map() {
        let mut map = AttributeMap::default();
        assert!(map.is_empty());
        map.set("k", AttrValue::Bool(true));
        assert_eq!(map.get("k"), Some(&AttrValue::Bool(true)));
        assert_eq!(map.unset("k"), Some(AttrValue::Bool(true)));
        assert!(map.get("k").is_none());
    }

    #[test]
    fn test_gate_records_first_owner_only() {
        let mut gate = AttributeGate::new(&[]);
        gate.current = Some("gui".to_string());
        gate.record_write("GuiAC.VISIBLE");
        gate.current = Some("other".to_string());
        gate.record_write("GuiAC.VISIBLE");
        assert_eq!(gate.owners.get("GuiAC.VISIBLE").map(String::as_str), Some("gui"));
        assert!(gate.hides("GuiAC.VISIBLE"));
        gate.registered.insert("gui".to_string());
        assert!(!gate.hides("GuiAC.VISIBLE"));
    }

    #[test]
    fn test_gate_without_current_owner_records_nothing() {
        let mut gate = AttributeGate::new(&[]);
        gate.record_write("x");
        assert!(gate.owners.is_empty());
        assert!(!gate.hides("x"));
    }
}
