//! The metadata repository
//!
//! [`Repository`] owns every descriptor and the logical-name registry.
//! Classes are created on first reference, with their methods and
//! constructors. Fields are built lazily by [`Repository::build_field_info`],
//! which links the auxiliary facts onto the descriptors in three passes:
//!
//! 1. explicit facts of each method body,
//! 2. classifications inherited through `calls_super` facts,
//! 3. naming-convention inference for slots still empty.
//!
//! Earlier passes win; later passes only fill what is left unbound.

use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;
use tracing::{debug, error, warn};

use crate::attributes::AttributeGate;
use crate::class::{BuildState, ClassDescriptor, VirtualClass};
use crate::config::{RttiConfig, RttiSettings};
use crate::descriptor::{push_unique, ClassId, FieldId, ItemId, MemberId, MethodId, VirtualId};
use crate::error::{Result, RttiError};
use crate::facts::{FactTable, MethodFacts};
use crate::field::FieldDescriptor;
use crate::method::{MethodDescriptor, MethodKind};
use crate::model::{Modifiers, NativeClass, NativeModel, TypeRef, OBJECT};
use crate::naming::{short_class_name, NamingConventions, PrefixFamily};

/// Advisory condition recorded while building metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// Item the condition is about (`Class.member` or class name)
    pub subject: String,
    /// Description
    pub message: String,
}

/// State restored when a field build fails
struct BuildCheckpoint {
    fields: usize,
    class: ClassDescriptor,
    methods: Vec<(MethodId, MethodDescriptor)>,
}

impl BuildCheckpoint {
    /// Saved descriptor, keeping subclasses created since the checkpoint
    fn restored(mut class: ClassDescriptor, children: Vec<ClassId>) -> ClassDescriptor {
        class.children = children;
        class
    }
}

/// Owner of all class, field and method descriptors
#[derive(Debug)]
pub struct Repository {
    pub(crate) model: NativeModel,
    pub(crate) facts: FactTable,
    pub(crate) naming: NamingConventions,
    pub(crate) settings: RttiSettings,

    pub(crate) classes: Vec<ClassDescriptor>,
    pub(crate) fields: Vec<FieldDescriptor>,
    pub(crate) methods: Vec<MethodDescriptor>,
    pub(crate) virtuals: Vec<VirtualClass>,

    objects: FxHashMap<String, ItemId>,
    names: FxHashMap<ItemId, String>,
    native_index: FxHashMap<String, ClassId>,
    loading: FxHashSet<String>,

    pub(crate) gate: AttributeGate,
    pub(crate) allowed_casts: FxHashMap<ClassId, FxHashSet<ClassId>>,
    pub(crate) classes_with_associations: Vec<ClassId>,
    diagnostics: Vec<Diagnostic>,
}

impl Repository {
    /// Create a repository over a native model, with no facts and the
    /// default settings
    pub fn new(model: NativeModel) -> Self {
        let settings = RttiSettings::default();
        Self {
            model,
            facts: FactTable::new(),
            naming: NamingConventions::default(),
            gate: AttributeGate::new(&settings.gated_attributes),
            settings,
            classes: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            virtuals: Vec::new(),
            objects: FxHashMap::default(),
            names: FxHashMap::default(),
            native_index: FxHashMap::default(),
            loading: FxHashSet::default(),
            allowed_casts: FxHashMap::default(),
            classes_with_associations: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Use this facts table
    pub fn with_facts(mut self, facts: FactTable) -> Self {
        self.facts = facts;
        self
    }

    /// Use the naming conventions and settings of a configuration.
    /// Declarations are applied separately, see
    /// [`Repository::apply_declarations`].
    pub fn with_config(mut self, config: &RttiConfig) -> Self {
        self.naming = config.naming.clone();
        self.settings = config.rtti.clone();
        self.gate = AttributeGate::new(&self.settings.gated_attributes);
        self
    }

    /// Facts table, for late additions before classes are built
    pub fn facts_mut(&mut self) -> &mut FactTable {
        &mut self.facts
    }

    /// Native model
    pub fn model(&self) -> &NativeModel {
        &self.model
    }

    /// Naming conventions in use
    pub fn naming(&self) -> &NamingConventions {
        &self.naming
    }

    /// Advisory conditions recorded so far
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub(crate) fn advise(&mut self, subject: impl Into<String>, message: impl Into<String>) {
        let diagnostic = Diagnostic {
            subject: subject.into(),
            message: message.into(),
        };
        warn!(subject = %diagnostic.subject, "{}", diagnostic.message);
        self.diagnostics.push(diagnostic);
    }

    // ===== Arena access =====

    /// Class descriptor
    pub fn class(&self, id: ClassId) -> &ClassDescriptor {
        &self.classes[id.index()]
    }

    /// Field or collection descriptor
    pub fn field(&self, id: FieldId) -> &FieldDescriptor {
        &self.fields[id.index()]
    }

    /// Method, constructor or mixin descriptor
    pub fn method(&self, id: MethodId) -> &MethodDescriptor {
        &self.methods[id.index()]
    }

    /// Virtual class
    pub fn virtual_class(&self, id: VirtualId) -> &VirtualClass {
        &self.virtuals[id.index()]
    }

    /// Ids of every class created so far
    pub fn class_ids(&self) -> impl Iterator<Item = ClassId> {
        (0..self.classes.len()).map(ClassId::new)
    }

    pub(crate) fn is_hidden_method(&self, name: &str) -> bool {
        let prefix = &self.settings.hidden_method_prefix;
        !prefix.is_empty() && name.starts_with(prefix.as_str())
    }

    pub(crate) fn is_hidden_field(&self, name: &str) -> bool {
        let prefix = &self.settings.hidden_field_prefix;
        (!prefix.is_empty() && name.starts_with(prefix.as_str())) || name.contains('$')
    }

    // ===== Registry =====

    /// Bind a logical name. Only virtual classes may replace an existing
    /// binding.
    pub fn register(&mut self, name: &str, item: impl Into<ItemId>) -> Result<()> {
        let item = item.into();
        if let Some(previous) = self.objects.get(name).copied() {
            if !matches!(item, ItemId::Virtual(_)) {
                return Err(RttiError::AlreadyRegistered {
                    name: name.to_string(),
                });
            }
            self.names.remove(&previous);
        }
        debug!(name, ?item, "register");
        self.objects.insert(name.to_string(), item);
        self.names.insert(item, name.to_string());
        Ok(())
    }

    /// Remove a logical name
    pub fn unregister(&mut self, name: &str) {
        if let Some(item) = self.objects.remove(name) {
            self.names.remove(&item);
        }
    }

    /// Whether a logical name is bound
    pub fn is_registered(&self, name: &str) -> bool {
        self.objects.contains_key(name)
    }

    /// Registered classes
    pub fn get_classes(&self) -> Vec<ClassId> {
        let mut classes: Vec<ClassId> = self
            .objects
            .values()
            .filter_map(|item| match item {
                ItemId::Class(c) => Some(*c),
                _ => None,
            })
            .collect();
        classes.sort();
        classes.dedup();
        classes
    }

    /// Registered logical names, sorted
    pub fn get_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.objects.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Item bound to a logical name
    pub fn get_object(&self, name: &str) -> Option<ItemId> {
        self.objects.get(name).copied()
    }

    /// Logical name of an item
    pub fn get_name(&self, item: impl Into<ItemId>) -> Option<&str> {
        self.names.get(&item.into()).map(String::as_str)
    }

    /// Class descriptor by logical or native name, created on first use
    pub fn get_class(&mut self, name: &str) -> Result<ClassId> {
        match self.objects.get(name) {
            Some(ItemId::Class(class)) => Ok(*class),
            Some(_) => Err(RttiError::no_such_class(name)),
            None => self.build_default_rtti(name),
        }
    }

    /// Class descriptor by name, `None` when the name is unknown
    pub fn get_class_opt(&mut self, name: &str) -> Result<Option<ClassId>> {
        match self.get_class(name) {
            Ok(class) => Ok(Some(class)),
            Err(RttiError::NoSuchClass { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Registered item (class or virtual class), else the class of that name
    pub fn get_virtual_class(&mut self, name: &str) -> Result<ItemId> {
        match self.objects.get(name) {
            Some(item @ (ItemId::Class(_) | ItemId::Virtual(_))) => Ok(*item),
            _ => self.get_class(name).map(ItemId::Class),
        }
    }

    /// Virtual class by name
    pub fn get_virtual_class_strict(&self, name: &str) -> Result<VirtualId> {
        match self.objects.get(name) {
            Some(ItemId::Virtual(v)) => Ok(*v),
            _ => Err(RttiError::no_such_class(name)),
        }
    }

    pub(crate) fn add_virtual_class(&mut self, name: &str, actual: ClassId) -> Result<VirtualId> {
        let id = VirtualId::new(self.virtuals.len());
        self.virtuals.push(VirtualClass::new(name, actual));
        self.register(name, id)?;
        Ok(id)
    }

    /// Member from `Class.member`; the class part ends at the last `.`
    /// before any parameter list
    pub fn get_member_from_full_name(&mut self, full_name: &str) -> Result<MemberId> {
        let head = match full_name.find('(') {
            Some(index) => &full_name[..index],
            None => full_name,
        };
        let split = head.rfind('.').ok_or_else(|| RttiError::NoSuchMember {
            class: String::new(),
            member: full_name.to_string(),
        })?;
        let class = self.get_class(&full_name[..split])?;
        self.get_member(class, &full_name[split + 1..])
    }

    /// Build the fields of every known class, including classes created
    /// while building. Afterwards the repository can be shared read-only.
    pub fn build_all(&mut self) -> Result<()> {
        let mut next = 0;
        while next < self.classes.len() {
            self.build_field_info(ClassId::new(next))?;
            next += 1;
        }
        Ok(())
    }

    // ===== Class construction =====

    fn build_default_rtti(&mut self, name: &str) -> Result<ClassId> {
        if let Some(&class) = self.native_index.get(name) {
            return Ok(class);
        }
        let native = self
            .model
            .resolve(name)
            .ok_or_else(|| RttiError::no_such_class(name))?;
        if !self.loading.insert(name.to_string()) {
            return Err(RttiError::CyclicConstruction {
                class: name.to_string(),
            });
        }
        let created = self.create_class(&native);
        self.loading.remove(name);
        created
    }

    fn create_class(&mut self, native: &NativeClass) -> Result<ClassId> {
        let superclass = match native.superclass_name() {
            None | Some(OBJECT) => None,
            Some(parent) => match self.build_default_rtti(parent) {
                Ok(class) => Some(class),
                Err(e @ RttiError::CyclicConstruction { .. }) => return Err(e),
                Err(e) => {
                    self.advise(&native.name, format!("superclass ignored: {}", e));
                    None
                }
            },
        };

        let id = ClassId::new(self.classes.len());
        let mut descriptor = ClassDescriptor::new(&native.name, superclass, native.modifiers, native.interface);
        descriptor.interface_names = native.interfaces.clone();
        self.classes.push(descriptor);
        self.native_index.insert(native.name.clone(), id);
        self.objects.insert(native.name.clone(), id.into());
        self.names.insert(id.into(), native.name.clone());
        if let Some(parent) = superclass {
            push_unique(&mut self.classes[parent.index()].children, id);
        }

        let mut members: Vec<MethodDescriptor> = self
            .model
            .public_methods(&native.name)
            .into_iter()
            .map(|visible| MethodDescriptor::method(visible.method, id, visible.declaring))
            .collect();
        let short_name = short_class_name(&native.name);
        members.extend(self.model.public_constructors(&native.name).into_iter().map(|k| {
            MethodDescriptor::constructor(short_name, k.params.clone(), k.modifiers, id, &native.name)
        }));
        let count = members.len();
        for member in members {
            let method = MethodId::new(self.methods.len());
            self.methods.push(member);
            self.insert_method(id, method);
        }

        debug!(class = %native.name, methods = count, "created class descriptor");
        Ok(id)
    }

    // ===== Field construction =====

    /// Build and link the fields of a class, once.
    ///
    /// The superclass is built first. Re-entering a class while it is
    /// being built fails with [`RttiError::CyclicConstruction`]; a failed
    /// build leaves the class unbuilt.
    pub fn build_field_info(&mut self, class: ClassId) -> Result<()> {
        match self.classes[class.index()].state {
            BuildState::Built => return Ok(()),
            BuildState::Building => {
                return Err(RttiError::CyclicConstruction {
                    class: self.classes[class.index()].name.clone(),
                })
            }
            BuildState::Unbuilt => {}
        }
        if let Some(superclass) = self.classes[class.index()].superclass {
            self.build_field_info(superclass)?;
        }

        let checkpoint = self.checkpoint(class);
        self.classes[class.index()].state = BuildState::Building;
        match self.build_default_field_rtti(class) {
            Ok(()) => {
                self.classes[class.index()].state = BuildState::Built;
                Ok(())
            }
            Err(e) => {
                self.rollback(class, checkpoint);
                Err(e)
            }
        }
    }

    fn checkpoint(&self, class: ClassId) -> BuildCheckpoint {
        let descriptor = self.classes[class.index()].clone();
        let methods = descriptor
            .methods
            .ids()
            .iter()
            .map(|m| (*m, self.methods[m.index()].clone()))
            .collect();
        BuildCheckpoint {
            fields: self.fields.len(),
            class: descriptor,
            methods,
        }
    }

    /// Undo a failed build: restore the class and its methods, and drop
    /// every edge to a field attached to it since the checkpoint
    fn rollback(&mut self, class: ClassId, checkpoint: BuildCheckpoint) {
        let dropped: FxHashSet<FieldId> = (checkpoint.fields..self.fields.len())
            .map(FieldId::new)
            .filter(|f| self.fields[f.index()].class == class)
            .collect();
        let children = std::mem::take(&mut self.classes[class.index()].children);
        self.classes[class.index()] = BuildCheckpoint::restored(checkpoint.class, children);
        for (id, method) in checkpoint.methods {
            self.methods[id.index()] = method;
        }
        if dropped.is_empty() {
            return;
        }
        let keep = |f: &FieldId| !dropped.contains(f);
        for field in &mut self.fields {
            field.dependent_fields.retain(keep);
            field.opposite_role = field.opposite_role.filter(keep);
        }
        for method in &mut self.methods {
            method.accessed_fields.retain(keep);
            method.written_fields.retain(keep);
            method.added_collections.retain(keep);
            method.removed_collections.retain(keep);
            method.modified_collections.retain(keep);
            method.returned_field = method.returned_field.filter(keep);
            method.set_field = method.set_field.filter(keep);
        }
        debug!(class = %self.classes[class.index()].name, fields = dropped.len(), "rolled back failed build");
    }

    fn build_default_field_rtti(&mut self, class: ClassId) -> Result<()> {
        let name = self.classes[class.index()].name.clone();

        let slots: Vec<(String, TypeRef, Modifiers)> = self
            .model
            .storage_slots(&name, |slot| !self.is_hidden_field(slot))
            .into_iter()
            .map(|slot| (slot.name.clone(), slot.ty.clone(), slot.modifiers))
            .collect();
        for (slot, ty, modifiers) in slots {
            let kind = self.model.collection_kind(&ty);
            let descriptor = FieldDescriptor::native(&slot, ty, modifiers, kind, class);
            self.attach_field(class, descriptor);
        }

        let linkable: Vec<MethodId> = self.classes[class.index()]
            .methods
            .ids()
            .iter()
            .copied()
            .filter(|m| {
                let method = &self.methods[m.index()];
                method.kind == MethodKind::Method && !self.is_hidden_method(&method.name)
            })
            .collect();

        for &method in &linkable {
            match self.link_facts(class, method) {
                Ok(()) => {}
                Err(RttiError::CyclicConstruction { class: cyclic }) if cyclic == name => {
                    return Err(RttiError::CyclicConstruction { class: cyclic })
                }
                Err(e) => error!(method = %self.method_long_name(method), "fact linking failed: {}", e),
            }
        }
        for &method in &linkable {
            if self.method_facts(method).calls_super {
                self.propagate_super(class, method);
            }
        }
        if self.settings.infer_from_naming {
            self.infer_accessors(class, &linkable);
        }
        self.inherit_mixins(class);

        debug!(
            class = %name,
            fields = self.classes[class.index()].field_order.len(),
            "built field info"
        );
        Ok(())
    }

    fn method_facts(&self, method: MethodId) -> MethodFacts {
        let m = &self.methods[method.index()];
        self.facts.method(&m.declaring, &m.full_name)
    }

    /// Pass 1: explicit facts of the method body
    fn link_facts(&mut self, class: ClassId, method: MethodId) -> Result<()> {
        let facts = self.method_facts(method);
        if facts.is_empty() {
            return Ok(());
        }

        for name in &facts.accessed_fields {
            match self.lookup_field(class, name) {
                Some(field) => self.link_accessed(method, field),
                None => self.advise(self.method_long_name(method), format!("accessed field {} not found", name)),
            }
        }

        if facts.is_getter {
            if let Some(name) = &facts.returned_field {
                match self.lookup_field(class, name) {
                    Some(field) => self.bind_getter(method, field),
                    None => self.advise(self.method_long_name(method), format!("returned field {} not found", name)),
                }
            }
        }

        let m = &mut self.methods[method.index()];
        m.collection_index_argument = facts.collection_index_argument;
        m.collection_item_argument = facts.collection_item_argument;

        // written fields may be missing on some models; skip silently
        for name in &facts.modified_fields {
            if let Some(field) = self.lookup_field(class, name) {
                self.link_written(method, field);
            }
        }

        match facts.set_fields.len() {
            0 => {}
            1 => {
                let name = facts.set_fields.iter().next().map(String::as_str).unwrap_or_default();
                if let Some(field) = self.lookup_field(class, name) {
                    self.bind_setter(method, field);
                }
            }
            _ => {
                let names: Vec<&str> = facts.set_fields.iter().map(String::as_str).collect();
                self.advise(
                    self.method_long_name(method),
                    format!("sets several fields ({}), no setter bound", names.join(", ")),
                );
            }
        }

        for name in &facts.added_collections {
            self.link_collection(class, method, name, Self::link_added);
        }
        for name in &facts.removed_collections {
            self.link_collection(class, method, name, Self::link_removed);
        }
        for name in &facts.modified_collections {
            self.link_collection(class, method, name, |repo, method, field| {
                repo.expect_collection(field)?;
                repo.link_modified_collection(method, field);
                Ok(())
            });
        }

        if !self.methods[method.index()].is_void() {
            for invoked in &facts.invoked_methods {
                let target_class = match self.get_class(&invoked.class) {
                    Ok(target) => target,
                    Err(e) => {
                        self.advise(self.method_long_name(method), format!("invoked class {} ignored: {}", invoked.class, e));
                        continue;
                    }
                };
                if let Ok(target) = self.find_method(target_class, &invoked.method) {
                    if !self.methods[target.index()].is_void() {
                        self.add_method_dependent(target, method);
                    }
                }
            }
        }
        Ok(())
    }

    fn link_collection(
        &mut self,
        class: ClassId,
        method: MethodId,
        name: &str,
        link: impl FnOnce(&mut Self, MethodId, FieldId) -> Result<()>,
    ) {
        let outcome = match self.lookup_field(class, name) {
            Some(field) => link(self, method, field),
            None => Err(RttiError::no_such_field(&self.classes[class.index()].name, name)),
        };
        if let Err(e) = outcome {
            self.advise(self.method_long_name(method), e.to_string());
        }
    }

    /// Pass 2: an override calling its super implementation inherits the
    /// super method's classifications, re-targeted on this class's fields
    fn propagate_super(&mut self, class: ClassId, method: MethodId) {
        let full_name = self.methods[method.index()].full_name.clone();
        let Some(superclass) = self.classes[class.index()].superclass else {
            self.advise(self.method_long_name(method), "calls super but the class has no superclass");
            return;
        };
        let Some(super_method) = self.classes[superclass.index()].methods.exact(&full_name) else {
            let super_name = self.classes[superclass.index()].name.clone();
            if self.model.declares_method(&super_name, &full_name) {
                debug!(method = %self.method_long_name(method), "super implementation is not public");
            } else {
                self.advise(self.method_long_name(method), format!("no super method in {}", super_name));
            }
            return;
        };

        let names = |ids: &[FieldId]| -> Vec<String> {
            ids.iter().map(|f| self.fields[f.index()].name.clone()).collect()
        };
        let source = &self.methods[super_method.index()];
        let added = names(&source.added_collections);
        let removed = names(&source.removed_collections);
        let modified = names(&source.modified_collections);
        let written = names(&source.written_fields);
        let set_field = source.set_field.map(|f| self.fields[f.index()].name.clone());

        for name in &added {
            self.link_collection(class, method, name, Self::link_added);
        }
        for name in &removed {
            self.link_collection(class, method, name, Self::link_removed);
        }
        for name in &modified {
            self.link_collection(class, method, name, |repo, method, field| {
                repo.expect_collection(field)?;
                repo.link_modified_collection(method, field);
                Ok(())
            });
        }
        for name in &written {
            if let Some(field) = self.lookup_field(class, name) {
                self.link_written(method, field);
            }
        }
        if let Some(name) = set_field {
            if self.methods[method.index()].set_field.is_none() {
                if let Some(field) = self.lookup_field(class, &name) {
                    if self.fields[field.index()].setter.is_none() {
                        self.bind_setter(method, field);
                    }
                }
            }
        }
    }

    /// Pass 3: bind accessors from naming conventions where nothing else did
    fn infer_accessors(&mut self, class: ClassId, candidates: &[MethodId]) {
        let fields = self.classes[class.index()].field_order.clone();
        for field in fields {
            let descriptor = &self.fields[field.index()];
            let needs_getter = descriptor.getter.is_none();
            let needs_setter = descriptor.setter.is_none();
            let (needs_adder, needs_remover) = match descriptor.collection() {
                Some(info) => (
                    info.adder.is_none() && info.adding_methods.is_empty(),
                    info.remover.is_none() && info.removing_methods.is_empty(),
                ),
                None => (false, false),
            };

            if needs_getter {
                if let Some(getter) = self.infer_unique(candidates, field, PrefixFamily::Getter) {
                    debug!(field = %self.field_long_name(field), getter = %self.methods[getter.index()].full_name, "inferred getter");
                    self.bind_getter(getter, field);
                }
            }
            if needs_setter {
                if let Some(setter) = self.infer_unique(candidates, field, PrefixFamily::Setter) {
                    debug!(field = %self.field_long_name(field), setter = %self.methods[setter.index()].full_name, "inferred setter");
                    self.bind_setter(setter, field);
                }
            }
            if needs_adder {
                if let Some(adder) = self.infer_unique(candidates, field, PrefixFamily::Adder) {
                    if let Err(e) = self.link_added(adder, field) {
                        self.advise(self.field_long_name(field), e.to_string());
                    }
                }
            }
            if needs_remover {
                if let Some(remover) = self.infer_unique(candidates, field, PrefixFamily::Remover) {
                    if let Err(e) = self.link_removed(remover, field) {
                        self.advise(self.field_long_name(field), e.to_string());
                    }
                }
            }
        }
    }

    fn infer_unique(&self, candidates: &[MethodId], field: FieldId, family: PrefixFamily) -> Option<MethodId> {
        let field_name = self.fields[field.index()].name.as_str();
        let mut found = candidates.iter().copied().filter(|m| {
            let method = &self.methods[m.index()];
            let shape = match family {
                PrefixFamily::Getter => method.params.is_empty() && !method.is_void() && method.returned_field.is_none(),
                PrefixFamily::Setter => method.params.len() == 1 && method.set_field.is_none(),
                PrefixFamily::Adder | PrefixFamily::Remover => !method.params.is_empty(),
            };
            let touches = match family {
                PrefixFamily::Getter => method.accessed_fields.contains(&field),
                PrefixFamily::Setter => method.written_fields.contains(&field),
                PrefixFamily::Adder | PrefixFamily::Remover => {
                    method.modified_collections.contains(&field) || method.accessed_fields.contains(&field)
                }
            };
            shape
                && touches
                && self.naming.classify(&method.name).map(|(f, _)| f) == Some(family)
                && self.naming.field_for_method(&method.name, |n| n == field_name).is_some()
        });
        let first = found.next()?;
        match found.next() {
            Some(_) => None,
            None => Some(first),
        }
    }

    /// Mixins attached to the superclass are visible on its subclasses
    fn inherit_mixins(&mut self, class: ClassId) {
        let Some(superclass) = self.classes[class.index()].superclass else {
            return;
        };
        let mixins: Vec<MethodId> = self.classes[superclass.index()]
            .methods
            .ids()
            .iter()
            .copied()
            .filter(|m| self.methods[m.index()].kind == MethodKind::Mixin)
            .collect();
        for mixin in mixins {
            let full_name = &self.methods[mixin.index()].full_name;
            if self.classes[class.index()].methods.exact(full_name).is_none() {
                self.attach_mixin(class, mixin);
            }
        }
    }

    pub(crate) fn attach_mixin(&mut self, class: ClassId, source: MethodId) -> MethodId {
        let descriptor = MethodDescriptor::mixin(&self.methods[source.index()], class);
        let method = MethodId::new(self.methods.len());
        self.methods.push(descriptor);
        self.insert_method(class, method);
        method
    }
}
