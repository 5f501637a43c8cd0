//! Class-level queries
//!
//! Listings and filters over the members of a class. Every query builds
//! the class's fields first.

use regex::Regex;
use tracing::warn;

use crate::attributes::AttrValue;
use crate::class::MemberCounts;
use crate::descriptor::{ClassId, FieldId, MemberId, MethodId};
use crate::error::{Result, RttiError};
use crate::method::{MethodDescriptor, MethodKind};
use crate::model::Modifiers;
use crate::repository::Repository;

/// Compile a pattern that must match a whole name
fn whole_match(pattern: &str) -> Result<Regex> {
    Regex::new(&format!("^(?:{})$", pattern)).map_err(|e| RttiError::InvalidPattern {
        pattern: pattern.to_string(),
        reason: e.to_string(),
    })
}

impl Repository {
    // ===== Fields =====

    /// Fields and collections of a class, in construction order
    pub fn get_fields(&mut self, class: ClassId) -> Result<Vec<FieldId>> {
        self.build_field_info(class)?;
        Ok(self.classes[class.index()].field_order.clone())
    }

    /// Fields with this attribute set (`not` inverts the test)
    pub fn get_tagged_fields(&mut self, class: ClassId, attribute: &str, not: bool) -> Result<Vec<FieldId>> {
        Ok(self
            .get_fields(class)?
            .into_iter()
            .filter(|f| self.get_attribute(*f, attribute).is_some() ^ not)
            .collect())
    }

    /// Fields by modifier: `static`, `public`, `transient`, `private`,
    /// `protected`, optionally negated with `!`
    pub fn filter_fields(&mut self, class: ClassId, expression: &str) -> Result<Vec<FieldId>> {
        let (not, keyword) = match expression.strip_prefix('!') {
            Some(rest) => (true, rest),
            None => (false, expression),
        };
        let modifier = Modifiers::from_name(keyword)
            .filter(|m| *m != Modifiers::NONE)
            .ok_or_else(|| RttiError::InvalidPattern {
                pattern: expression.to_string(),
                reason: format!("unknown modifier {}", keyword),
            })?;
        Ok(self
            .get_fields(class)?
            .into_iter()
            .filter(|f| self.fields[f.index()].modifiers.contains(modifier) ^ not)
            .collect())
    }

    /// Several fields by name; unknown names are skipped
    pub fn select_fields(&mut self, class: ClassId, names: &[&str]) -> Result<Vec<FieldId>> {
        let mut selected = Vec::with_capacity(names.len());
        for name in names {
            match self.get_field(class, name) {
                Ok(field) => selected.push(field),
                Err(RttiError::NoSuchField { .. }) => {
                    warn!(class = %self.classes[class.index()].name, field = name, "no such field, skipped")
                }
                Err(e) => return Err(e),
            }
        }
        Ok(selected)
    }

    /// Primitive (value) fields
    pub fn primitive_fields(&mut self, class: ClassId) -> Result<Vec<FieldId>> {
        let fields = self.get_fields(class)?;
        Ok(fields.into_iter().filter(|f| self.is_primitive(*f)).collect())
    }

    /// Reference fields
    pub fn references(&mut self, class: ClassId) -> Result<Vec<FieldId>> {
        let fields = self.get_fields(class)?;
        Ok(fields.into_iter().filter(|f| self.is_reference(*f)).collect())
    }

    /// Collections
    pub fn collections(&mut self, class: ClassId) -> Result<Vec<FieldId>> {
        let fields = self.get_fields(class)?;
        Ok(fields
            .into_iter()
            .filter(|f| self.fields[f.index()].is_collection())
            .collect())
    }

    /// References and collections whose name matches a regular expression
    pub fn matching_relations(&mut self, class: ClassId, pattern: &str) -> Result<Vec<FieldId>> {
        let re = whole_match(pattern)?;
        let fields = self.get_fields(class)?;
        Ok(fields
            .into_iter()
            .filter(|f| self.is_reference(*f) || self.fields[f.index()].is_collection())
            .filter(|f| re.is_match(&self.fields[f.index()].name))
            .collect())
    }

    /// Fields of any class whose type, or element type, is this class.
    /// Computed once per class.
    pub fn get_constraints(&mut self, class: ClassId) -> Result<Vec<FieldId>> {
        if let Some(constraints) = &self.classes[class.index()].constraints {
            return Ok(constraints.clone());
        }
        let name = self.classes[class.index()].name.clone();
        let mut constraints = Vec::new();
        for owner in self.get_classes() {
            for field in self.get_fields(owner)? {
                let matches = if self.fields[field.index()].is_collection() {
                    self.component_type(field)? == Some(class)
                } else {
                    self.field_type(field).name() == name
                };
                if matches {
                    constraints.push(field);
                }
            }
        }
        self.classes[class.index()].constraints = Some(constraints.clone());
        Ok(constraints)
    }

    // ===== Methods =====

    fn methods_where(&mut self, class: ClassId, keep: impl Fn(&MethodDescriptor) -> bool) -> Result<Vec<MethodId>> {
        self.build_field_info(class)?;
        Ok(self.classes[class.index()]
            .methods
            .ids()
            .iter()
            .copied()
            .filter(|m| {
                let method = &self.methods[m.index()];
                method.kind != MethodKind::Constructor && !self.is_hidden_method(&method.name) && keep(method)
            })
            .collect())
    }

    /// Methods and mixins, hidden ones excluded
    pub fn all_methods(&mut self, class: ClassId) -> Result<Vec<MethodId>> {
        self.methods_where(class, |_| true)
    }

    /// Mixin methods
    pub fn mixin_methods(&mut self, class: ClassId) -> Result<Vec<MethodId>> {
        self.methods_where(class, MethodDescriptor::is_mixin)
    }

    /// Static methods
    pub fn all_static_methods(&mut self, class: ClassId) -> Result<Vec<MethodId>> {
        self.methods_where(class, MethodDescriptor::is_static)
    }

    /// Instance methods
    pub fn all_instance_methods(&mut self, class: ClassId) -> Result<Vec<MethodId>> {
        self.methods_where(class, |m| !m.is_static())
    }

    /// Methods changing instance state
    pub fn all_modifiers(&mut self, class: ClassId) -> Result<Vec<MethodId>> {
        self.methods_where(class, MethodDescriptor::is_modifier)
    }

    /// Setters
    pub fn all_setters(&mut self, class: ClassId) -> Result<Vec<MethodId>> {
        self.methods_where(class, MethodDescriptor::is_setter)
    }

    /// Methods writing at least one field
    pub fn all_writers(&mut self, class: ClassId) -> Result<Vec<MethodId>> {
        self.methods_where(class, MethodDescriptor::is_writer)
    }

    /// Getters
    pub fn all_getters(&mut self, class: ClassId) -> Result<Vec<MethodId>> {
        self.methods_where(class, MethodDescriptor::is_getter)
    }

    /// Methods reading at least one field
    pub fn all_accessors(&mut self, class: ClassId) -> Result<Vec<MethodId>> {
        self.methods_where(class, MethodDescriptor::is_accessor)
    }

    /// Removers
    pub fn all_removers(&mut self, class: ClassId) -> Result<Vec<MethodId>> {
        self.methods_where(class, MethodDescriptor::is_remover)
    }

    /// Adders
    pub fn all_adders(&mut self, class: ClassId) -> Result<Vec<MethodId>> {
        self.methods_where(class, MethodDescriptor::is_adder)
    }

    /// Methods with this attribute set (`not` inverts the test)
    pub fn get_tagged_methods(&mut self, class: ClassId, attribute: &str, not: bool) -> Result<Vec<MethodId>> {
        Ok(self
            .all_methods(class)?
            .into_iter()
            .filter(|m| self.get_attribute(*m, attribute).is_some() ^ not)
            .collect())
    }

    /// Several methods by name; unknown names are skipped
    pub fn select_methods(&mut self, class: ClassId, names: &[&str]) -> Result<Vec<MethodId>> {
        let mut selected = Vec::with_capacity(names.len());
        for name in names {
            match self.get_methods(class, name) {
                Ok(methods) => selected.extend(methods),
                Err(RttiError::NoSuchMethod { .. }) => {
                    warn!(class = %self.classes[class.index()].name, method = name, "no such method, skipped")
                }
                Err(e) => return Err(e),
            }
        }
        Ok(selected)
    }

    // ===== Members =====

    /// Member by name: a name with `(` is a method; otherwise a field,
    /// then a method
    pub fn get_member(&mut self, class: ClassId, name: &str) -> Result<MemberId> {
        let no_such_member = |repo: &Self| RttiError::NoSuchMember {
            class: repo.classes[class.index()].name.clone(),
            member: name.to_string(),
        };
        if !name.contains('(') {
            if let Some(field) = self.get_field_opt(class, name)? {
                return Ok(field.into());
            }
        }
        match self.get_abstract_method(class, name) {
            Ok(method) => Ok(method.into()),
            Err(e) if e.is_not_found() => Err(no_such_member(self)),
            Err(e) => Err(e),
        }
    }

    /// Several members by name; unknown names are skipped
    pub fn select_members(&mut self, class: ClassId, names: &[&str]) -> Result<Vec<MemberId>> {
        let mut selected = Vec::with_capacity(names.len());
        for name in names {
            match self.get_member(class, name) {
                Ok(member) => selected.push(member),
                Err(RttiError::NoSuchMember { .. }) => {
                    warn!(class = %self.classes[class.index()].name, member = name, "no such member, skipped")
                }
                Err(e) => return Err(e),
            }
        }
        Ok(selected)
    }

    /// Methods then fields with this attribute set (`not` inverts the test)
    pub fn get_tagged_members(&mut self, class: ClassId, attribute: &str, not: bool) -> Result<Vec<MemberId>> {
        let mut members: Vec<MemberId> = self
            .get_tagged_methods(class, attribute, not)?
            .into_iter()
            .map(MemberId::from)
            .collect();
        members.extend(self.get_tagged_fields(class, attribute, not)?.into_iter().map(MemberId::from));
        Ok(members)
    }

    /// Members whose attribute equals `value`
    pub fn get_tagged_members_with_value(&mut self, class: ClassId, attribute: &str, value: &AttrValue) -> Result<Vec<MemberId>> {
        let mut members: Vec<MemberId> = self.get_fields(class)?.into_iter().map(MemberId::from).collect();
        members.extend(self.all_methods(class)?.into_iter().map(MemberId::from));
        Ok(members
            .into_iter()
            .filter(|m| self.get_attribute(*m, attribute).as_ref() == Some(value))
            .collect())
    }

    /// Member counts by kind
    pub fn member_counts(&mut self, class: ClassId) -> Result<MemberCounts> {
        self.build_field_info(class)?;
        Ok(self.classes[class.index()].counts)
    }

    // ===== Hierarchy =====

    /// Implemented interfaces, resolved on first use. Unknown interface
    /// names are skipped.
    pub fn interfaces(&mut self, class: ClassId) -> Vec<ClassId> {
        if let Some(interfaces) = &self.classes[class.index()].interfaces {
            return interfaces.clone();
        }
        let names = self.classes[class.index()].interface_names.clone();
        let mut interfaces = Vec::with_capacity(names.len());
        for name in names {
            match self.get_class(&name) {
                Ok(interface) => interfaces.push(interface),
                Err(e) => {
                    let subject = self.classes[class.index()].name.clone();
                    self.advise(subject, format!("interface {} ignored: {}", name, e));
                }
            }
        }
        self.classes[class.index()].interfaces = Some(interfaces.clone());
        interfaces
    }

    /// Whether `class` is `ancestor` or inherits from it, through
    /// superclasses or interfaces
    pub fn is_subclass_of(&mut self, class: ClassId, ancestor: ClassId) -> bool {
        self.any_ancestor(class, &mut |_, c| c == ancestor)
    }

    /// Whether the class, or one of its ancestors, has a name matching
    /// the regular expression
    pub fn is_subclass_of_pattern(&mut self, class: ClassId, pattern: &str) -> Result<bool> {
        let re = whole_match(pattern)?;
        Ok(self.any_ancestor(class, &mut |repo, c| re.is_match(&repo.classes[c.index()].name)))
    }

    fn any_ancestor(&mut self, class: ClassId, test: &mut impl FnMut(&Self, ClassId) -> bool) -> bool {
        let mut pending = vec![class];
        let mut seen = Vec::new();
        while let Some(current) = pending.pop() {
            if seen.contains(&current) {
                continue;
            }
            seen.push(current);
            if test(self, current) {
                return true;
            }
            pending.extend(self.classes[current.index()].superclass);
            pending.extend(self.interfaces(current));
        }
        false
    }

    /// Enclosing class of an inner class (`Outer$Inner`)
    pub fn owner_class(&mut self, class: ClassId) -> Result<Option<ClassId>> {
        let name = self.classes[class.index()].name.clone();
        match name.find('$') {
            Some(index) => self.get_class(&name[..index]).map(Some),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facts::{FactSink, FactTable};
    use crate::model::{NativeClass, NativeModel};

    fn repo() -> Repository {
        let model = NativeModel::from_classes([
            NativeClass::interface("Named"),
            NativeClass::new("Person").implements("Named").field("name", "String"),
            NativeClass::new("Customer").extends("Person").field("orders", "Order[]"),
            NativeClass::new("Order")
                .field("customer", "Customer")
                .field("total", "double")
                .field_with("counter", "int", Modifiers::STATIC)
                .method("getTotal", &[], "double")
                .method("setTotal", &["double"], "void")
                .method_with("create", &["Customer"], "Order", Modifiers::PUBLIC | Modifiers::STATIC),
            NativeClass::new("Order$Line").field("qty", "int"),
        ]);
        let mut facts = FactTable::new();
        facts.add_accessed_field("Order", "getTotal()", "total");
        facts.add_modified_field("Order", "setTotal(double)", "total");
        Repository::new(model).with_facts(facts)
    }

    #[test]
    fn test_field_listings() {
        let mut repo = repo();
        let order = repo.get_class("Order").unwrap();
        assert_eq!(repo.get_fields(order).unwrap().len(), 3);
        assert_eq!(repo.references(order).unwrap().len(), 1);
        assert_eq!(repo.primitive_fields(order).unwrap().len(), 2);
        assert!(repo.collections(order).unwrap().is_empty());

        let statics = repo.filter_fields(order, "static").unwrap();
        assert_eq!(statics.len(), 1);
        assert_eq!(repo.filter_fields(order, "!static").unwrap().len(), 2);
        assert!(matches!(
            repo.filter_fields(order, "volatile"),
            Err(RttiError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn test_fields_round_trip_by_name() {
        let mut repo = repo();
        let order = repo.get_class("Order").unwrap();
        for field in repo.get_fields(order).unwrap() {
            let name = repo.field(field).name().to_string();
            assert_eq!(repo.get_field(order, &name).unwrap(), field);
        }
    }

    #[test]
    fn test_method_listings() {
        let mut repo = repo();
        let order = repo.get_class("Order").unwrap();
        assert_eq!(repo.all_methods(order).unwrap().len(), 3);
        assert_eq!(repo.all_static_methods(order).unwrap().len(), 1);
        assert_eq!(repo.all_getters(order).unwrap().len(), 1);
        assert_eq!(repo.all_setters(order).unwrap().len(), 1);
        assert_eq!(repo.all_modifiers(order).unwrap().len(), 1);
    }

    #[test]
    fn test_get_member() {
        let mut repo = repo();
        let order = repo.get_class("Order").unwrap();
        assert!(matches!(repo.get_member(order, "total").unwrap(), MemberId::Field(_)));
        assert!(matches!(repo.get_member(order, "getTotal").unwrap(), MemberId::Method(_)));
        assert!(matches!(repo.get_member(order, "setTotal(double)").unwrap(), MemberId::Method(_)));
        assert!(matches!(repo.get_member(order, "nothing"), Err(RttiError::NoSuchMember { .. })));

        let selected = repo.select_members(order, &["total", "nothing", "getTotal"]).unwrap();
        assert_eq!(selected.len(), 2);
    }

    #[test]
    fn test_member_from_full_name() {
        let mut repo = repo();
        let member = repo.get_member_from_full_name("Order.setTotal(double)").unwrap();
        let method = member.as_method().unwrap();
        assert_eq!(repo.method(method).name(), "setTotal");
    }

    #[test]
    fn test_tagged_members() {
        let mut repo = repo();
        let order = repo.get_class("Order").unwrap();
        let total = repo.get_field(order, "total").unwrap();
        repo.set_attribute(total, "Gui.LABEL", "Total");
        assert_eq!(repo.get_tagged_fields(order, "Gui.LABEL", false).unwrap(), vec![total]);
        assert_eq!(repo.get_tagged_fields(order, "Gui.LABEL", true).unwrap().len(), 2);
        let tagged = repo
            .get_tagged_members_with_value(order, "Gui.LABEL", &AttrValue::from("Total"))
            .unwrap();
        assert_eq!(tagged, vec![MemberId::Field(total)]);
    }

    #[test]
    fn test_hierarchy() {
        let mut repo = repo();
        let customer = repo.get_class("Customer").unwrap();
        let person = repo.get_class("Person").unwrap();
        let named = repo.get_class("Named").unwrap();
        assert!(repo.is_subclass_of(customer, person));
        assert!(repo.is_subclass_of(customer, named));
        assert!(!repo.is_subclass_of(person, customer));
        assert!(repo.is_subclass_of_pattern(customer, "Pers.*").unwrap());
        assert!(!repo.is_subclass_of_pattern(customer, "Pers").unwrap());
        assert!(repo.is_subclass_of_pattern(customer, "(").is_err());
    }

    #[test]
    fn test_inner_class_owner() {
        let mut repo = repo();
        let line = repo.get_class("Order$Line").unwrap();
        assert!(repo.class(line).is_inner());
        let owner = repo.owner_class(line).unwrap().unwrap();
        assert_eq!(repo.class(owner).name(), "Order");
    }

    #[test]
    fn test_constraints() {
        let mut repo = repo();
        let customer = repo.get_class("Customer").unwrap();
        repo.get_class("Order").unwrap();
        let constraints = repo.get_constraints(customer).unwrap();
        let names: Vec<String> = constraints.iter().map(|f| repo.field_long_name(*f)).collect();
        assert_eq!(names, vec!["Order.customer".to_string()]);
    }

    #[test]
    fn test_matching_relations() {
        let mut repo = repo();
        let customer = repo.get_class("Customer").unwrap();
        assert_eq!(repo.matching_relations(customer, "ord.*").unwrap().len(), 1);
        assert!(repo.matching_relations(customer, "name").unwrap().is_empty());
    }
}
