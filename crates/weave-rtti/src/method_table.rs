//! Per-class method table
//!
//! Methods are keyed by full name (`name(T1,T2)`), with a bare-name index
//! kept alongside for overload lookups. Insertion order is preserved so
//! listings are stable.

use rustc_hash::FxHashMap;

use crate::descriptor::MethodId;

/// Method multimap: full name to descriptor, bare name to overloads
#[derive(Debug, Clone, Default)]
pub struct MethodTable {
    order: Vec<MethodId>,
    exact: FxHashMap<String, MethodId>,
    by_name: FxHashMap<String, Vec<MethodId>>,
}

impl MethodTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a method. A method with the same full name is replaced and
    /// returned.
    pub fn insert(&mut self, name: &str, full_name: &str, id: MethodId) -> Option<MethodId> {
        let previous = self.exact.insert(full_name.to_string(), id);
        let overloads = self.by_name.entry(name.to_string()).or_default();
        match previous {
            Some(old) => {
                if let Some(slot) = overloads.iter_mut().find(|m| **m == old) {
                    *slot = id;
                }
                if let Some(slot) = self.order.iter_mut().find(|m| **m == old) {
                    *slot = id;
                }
            }
            None => {
                overloads.push(id);
                self.order.push(id);
            }
        }
        previous
    }

    /// Method with exactly this full name
    pub fn exact(&self, full_name: &str) -> Option<MethodId> {
        self.exact.get(full_name).copied()
    }

    /// Overloads sharing a bare name, in insertion order
    pub fn by_name(&self, name: &str) -> &[MethodId] {
        self.by_name.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Whether any overload has this bare name
    pub fn contains_name(&self, name: &str) -> bool {
        !self.by_name(name).is_empty()
    }

    /// All methods in insertion order
    pub fn ids(&self) -> &[MethodId] {
        &self.order
    }

    /// Bare names
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.by_name.keys().map(String::as_str)
    }

    /// Number of methods
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the table is empty
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Split `name(params)` into the bare name; names without `(` are returned as is
pub fn bare_name(name: &str) -> &str {
    match name.find('(') {
        Some(index) => &name[..index],
        None => name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overloads_share_bare_name() {
        let mut table = MethodTable::new();
        table.insert("foo", "foo()", MethodId::new(0));
        table.insert("foo", "foo(int)", MethodId::new(1));
        table.insert("bar", "bar()", MethodId::new(2));

        assert_eq!(table.by_name("foo").len(), 2);
        assert_eq!(table.exact("foo(int)"), Some(MethodId::new(1)));
        assert_eq!(table.exact("foo(long)"), None);
        assert_eq!(table.len(), 3);
        assert!(table.by_name("baz").is_empty());
    }

    #[test]
    fn test_same_full_name_replaces() {
        let mut table = MethodTable::new();
        table.insert("foo", "foo()", MethodId::new(0));
        let old = table.insert("foo", "foo()", MethodId::new(5));
        assert_eq!(old, Some(MethodId::new(0)));
        assert_eq!(table.by_name("foo"), &[MethodId::new(5)]);
        assert_eq!(table.ids(), &[MethodId::new(5)]);
    }

    #[test]
    fn test_bare_name() {
        assert_eq!(bare_name("foo(int)"), "foo");
        assert_eq!(bare_name("foo"), "foo");
    }
}
