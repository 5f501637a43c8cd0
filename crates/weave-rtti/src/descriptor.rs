//! Descriptor identifiers
//!
//! Descriptors live in arenas owned by the [`Repository`](crate::Repository)
//! and refer to each other through these copyable ids, which stay valid
//! for the lifetime of the repository.

use std::fmt;

macro_rules! arena_id {
    ($(#[$doc:meta])* $name:ident, $label:literal) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub(crate) u32);

        impl $name {
            pub(crate) fn new(index: usize) -> Self {
                Self(index as u32)
            }

            /// Arena index
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", $label, self.0)
            }
        }
    };
}

arena_id!(
    /// Identifier of a class descriptor
    ClassId,
    "ClassId"
);
arena_id!(
    /// Identifier of a field or collection descriptor
    FieldId,
    "FieldId"
);
arena_id!(
    /// Identifier of a method, constructor or mixin descriptor
    MethodId,
    "MethodId"
);
arena_id!(
    /// Identifier of a virtual class
    VirtualId,
    "VirtualId"
);

/// Any descriptor that can carry attributes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemId {
    /// Class descriptor
    Class(ClassId),
    /// Field or collection descriptor
    Field(FieldId),
    /// Method, constructor or mixin descriptor
    Method(MethodId),
    /// Virtual class
    Virtual(VirtualId),
}

impl From<ClassId> for ItemId {
    fn from(id: ClassId) -> Self {
        ItemId::Class(id)
    }
}

impl From<FieldId> for ItemId {
    fn from(id: FieldId) -> Self {
        ItemId::Field(id)
    }
}

impl From<MethodId> for ItemId {
    fn from(id: MethodId) -> Self {
        ItemId::Method(id)
    }
}

impl From<VirtualId> for ItemId {
    fn from(id: VirtualId) -> Self {
        ItemId::Virtual(id)
    }
}

impl From<MemberId> for ItemId {
    fn from(id: MemberId) -> Self {
        match id {
            MemberId::Field(f) => ItemId::Field(f),
            MemberId::Method(m) => ItemId::Method(m),
        }
    }
}

/// A class member: field or method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberId {
    /// Field or collection
    Field(FieldId),
    /// Method, constructor or mixin
    Method(MethodId),
}

impl MemberId {
    /// Field id, if this member is a field
    pub fn as_field(self) -> Option<FieldId> {
        match self {
            MemberId::Field(f) => Some(f),
            MemberId::Method(_) => None,
        }
    }

    /// Method id, if this member is a method
    pub fn as_method(self) -> Option<MethodId> {
        match self {
            MemberId::Method(m) => Some(m),
            MemberId::Field(_) => None,
        }
    }
}

impl From<FieldId> for MemberId {
    fn from(id: FieldId) -> Self {
        MemberId::Field(id)
    }
}

impl From<MethodId> for MemberId {
    fn from(id: MethodId) -> Self {
        MemberId::Method(id)
    }
}

/// Push unless already present; edge lists have set semantics
pub(crate) fn push_unique<T: PartialEq>(list: &mut Vec<T>, item: T) -> bool {
    if list.contains(&item) {
        false
    } else {
        list.push(item);
        true
    }
}
