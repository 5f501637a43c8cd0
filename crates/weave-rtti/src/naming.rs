//! Naming conventions
//!
//! Classifies method names by prefix family (getter, setter, adder,
//! remover) and derives the field a method most likely works on. Also
//! converts identifiers between camel case, underscored and display forms.
//!
//! Nothing here fails: an unclassifiable name simply yields "no match".

use serde::{Deserialize, Serialize};

/// One of the four prefix families a method name can belong to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrefixFamily {
    /// `get`, `is`
    Getter,
    /// `set`
    Setter,
    /// `add`, `put`
    Adder,
    /// `rmv`, `del`, `remove`, `clear`
    Remover,
}

/// Configurable prefix families
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct NamingConventions {
    /// Getter prefixes
    pub getter_prefixes: Vec<String>,
    /// Setter prefixes
    pub setter_prefixes: Vec<String>,
    /// Adder prefixes
    pub adder_prefixes: Vec<String>,
    /// Remover prefixes
    pub remover_prefixes: Vec<String>,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for NamingConventions {
    fn default() -> Self {
        Self {
            getter_prefixes: strings(&["get", "is"]),
            setter_prefixes: strings(&["set"]),
            adder_prefixes: strings(&["add", "put"]),
            remover_prefixes: strings(&["rmv", "del", "remove", "clear"]),
        }
    }
}

impl NamingConventions {
    /// Create the default conventions
    pub fn new() -> Self {
        Self::default()
    }

    /// Prefixes of a family
    pub fn prefixes(&self, family: PrefixFamily) -> &[String] {
        match family {
            PrefixFamily::Getter => &self.getter_prefixes,
            PrefixFamily::Setter => &self.setter_prefixes,
            PrefixFamily::Adder => &self.adder_prefixes,
            PrefixFamily::Remover => &self.remover_prefixes,
        }
    }

    /// Length of the family prefix `name` starts with, 0 when none matches
    pub fn prefix_len(&self, name: &str, family: PrefixFamily) -> usize {
        is_prefixed_with(name, self.prefixes(family))
    }

    /// Whether the name is a getter name (`getName`, `isEmpty`)
    pub fn is_getter(&self, name: &str) -> bool {
        self.prefix_len(name, PrefixFamily::Getter) != 0
    }

    /// Whether the name is a setter name
    pub fn is_setter(&self, name: &str) -> bool {
        self.prefix_len(name, PrefixFamily::Setter) != 0
    }

    /// Whether the name is an adder name
    pub fn is_adder(&self, name: &str) -> bool {
        self.prefix_len(name, PrefixFamily::Adder) != 0
    }

    /// Whether the name is a remover name
    pub fn is_remover(&self, name: &str) -> bool {
        self.prefix_len(name, PrefixFamily::Remover) != 0
    }

    /// Whether the name looks like a state-modifying method.
    ///
    /// Bare adder and remover prefixes (`add`, `clear`) count as
    /// modifiers even though they classify as nothing else.
    pub fn is_modifier(&self, name: &str) -> bool {
        self.is_setter(name)
            || self.is_adder(name)
            || self.is_remover(name)
            || self.remover_prefixes.iter().any(|p| p == name)
            || self.adder_prefixes.iter().any(|p| p == name)
    }

    /// First matching family, checked in remover, adder, setter, getter order
    pub fn classify(&self, name: &str) -> Option<(PrefixFamily, usize)> {
        [
            PrefixFamily::Remover,
            PrefixFamily::Adder,
            PrefixFamily::Setter,
            PrefixFamily::Getter,
        ]
        .into_iter()
        .find_map(|family| match self.prefix_len(name, family) {
            0 => None,
            len => Some((family, len)),
        })
    }

    /// Name stripped of its prefix, pluralized for adders and removers.
    ///
    /// `addOrder` gives `Orders`, `getName` gives `Name`; unprefixed
    /// names come back unchanged.
    pub fn unprefixed(&self, name: &str) -> String {
        match self.classify(name) {
            Some((PrefixFamily::Adder | PrefixFamily::Remover, len)) => plural(&name[len..]),
            Some((_, len)) => name[len..].to_string(),
            None => name.to_string(),
        }
    }

    /// Name stripped of its prefix, without pluralization
    pub fn remove_prefix(&self, name: &str) -> String {
        match self.classify(name) {
            Some((_, len)) => name[len..].to_string(),
            None => name.to_string(),
        }
    }

    /// Field a method name designates, if `has_field` knows it.
    ///
    /// Tries the underscored form first (`getFirstName` → `first_name`),
    /// then the lower-first form (`firstName`).
    pub fn field_for_method(&self, method: &str, has_field: impl Fn(&str) -> bool) -> Option<String> {
        if !self.is_getter(method) && !self.is_modifier(method) {
            return None;
        }
        let unprefixed = self.unprefixed(method);
        let underscored = underscored_string(&unprefixed);
        if has_field(&underscored) {
            return Some(underscored);
        }
        let lowered = lower_first(&unprefixed);
        if has_field(&lowered) {
            return Some(lowered);
        }
        None
    }
}

/// Length of the first prefix `candidate` starts with.
///
/// Returns 0 for no match and also when the candidate *is* a prefix
/// (`get` alone is not a getter).
pub fn is_prefixed_with<S: AsRef<str>>(candidate: &str, prefixes: &[S]) -> usize {
    for prefix in prefixes {
        let prefix = prefix.as_ref();
        if prefix == candidate {
            return 0;
        }
        if candidate.starts_with(prefix) {
            return prefix.len();
        }
    }
    0
}

/// Upper-case the first character
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Lower-case the first character
pub fn lower_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Lower-case the first character unless the name starts with an acronym (`URL`)
pub fn maybe_lower_first(s: &str) -> String {
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(a), Some(b)) if a.is_uppercase() && b.is_uppercase() => s.to_string(),
        _ => lower_first(s),
    }
}

/// `one_string` / `one.string` / `one-string` / `one string` → `OneString`
pub fn normalized_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    if let Some(first) = chars.next() {
        out.extend(first.to_uppercase());
    }
    let mut word_sep = false;
    for c in chars {
        if matches!(c, '_' | '.' | ' ' | '-') {
            word_sep = true;
        } else if word_sep {
            word_sep = false;
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// `OneString` → `one_string`
pub fn underscored_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 4);
    let mut chars = s.chars();
    if let Some(first) = chars.next() {
        out.extend(first.to_lowercase());
    }
    for c in chars {
        if c.is_uppercase() {
            out.push('_');
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// English plural: `order` → `orders`, `category` → `categories`, `address` → `addresses`
pub fn plural(name: &str) -> String {
    if name.ends_with('s') {
        format!("{}es", name)
    } else if let Some(stem) = name.strip_suffix('y') {
        format!("{}ies", stem)
    } else {
        format!("{}s", name)
    }
}

/// Inverse of [`plural`] for the common cases
pub fn singular(name: &str) -> String {
    if let Some(stem) = name.strip_suffix("ies") {
        format!("{}y", stem)
    } else if let Some(stem) = name.strip_suffix('s') {
        stem.to_string()
    } else {
        name.to_string()
    }
}

/// Display text for an identifier: `firstName` → `First name`, `zip_code` → `Zip code`
pub fn text_for_name(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if i == 0 {
            out.extend(c.to_uppercase());
        } else if c.is_uppercase() && chars[i - 1].is_lowercase() {
            out.push(' ');
            // keep acronyms (`homeURL` → `Home URL`)
            if chars.get(i + 1).is_some_and(|n| n.is_uppercase()) {
                out.push(c);
            } else {
                out.extend(c.to_lowercase());
            }
        } else if matches!(c, '_' | '.' | '-') {
            out.push(' ');
        } else {
            out.push(c);
        }
    }
    out
}

/// Class name without its package path; array suffixes are kept
pub fn short_class_name(name: &str) -> &str {
    match name.rfind('.') {
        Some(dot) => &name[dot + 1..],
        None => name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_detection() {
        let naming = NamingConventions::default();
        assert_eq!(naming.prefix_len("getName", PrefixFamily::Getter), 3);
        assert_eq!(naming.prefix_len("isEmpty", PrefixFamily::Getter), 2);
        assert_eq!(naming.prefix_len("removeItem", PrefixFamily::Remover), 6);
        assert_eq!(naming.prefix_len("name", PrefixFamily::Getter), 0);
    }

    #[test]
    fn test_exact_prefix_is_not_a_match() {
        let naming = NamingConventions::default();
        assert!(!naming.is_getter("get"));
        assert!(!naming.is_adder("add"));
        assert!(naming.is_modifier("add"));
        assert!(naming.is_modifier("clear"));
        assert!(!naming.is_modifier("get"));
    }

    #[test]
    fn test_classification() {
        let naming = NamingConventions::default();
        assert!(naming.is_setter("setBalance"));
        assert!(naming.is_adder("putEntry"));
        assert!(naming.is_remover("delAccount"));
        assert!(naming.is_remover("clearItems"));
        assert!(!naming.is_setter("settle"));
        assert_eq!(naming.classify("toString"), None);
    }

    #[test]
    fn test_unprefixed() {
        let naming = NamingConventions::default();
        assert_eq!(naming.unprefixed("addOrder"), "Orders");
        assert_eq!(naming.unprefixed("removeAddress"), "Addresses");
        assert_eq!(naming.unprefixed("addCategory"), "Categories");
        assert_eq!(naming.unprefixed("getName"), "Name");
        assert_eq!(naming.unprefixed("compute"), "compute");
        assert_eq!(naming.remove_prefix("addOrder"), "Order");
    }

    #[test]
    fn test_field_for_method() {
        let naming = NamingConventions::default();
        let fields = ["balance", "first_name", "lastName", "orders"];
        let has = |f: &str| fields.contains(&f);
        assert_eq!(naming.field_for_method("getBalance", has), Some("balance".to_string()));
        assert_eq!(naming.field_for_method("setFirstName", has), Some("first_name".to_string()));
        assert_eq!(naming.field_for_method("getLastName", has), Some("lastName".to_string()));
        assert_eq!(naming.field_for_method("addOrder", has), Some("orders".to_string()));
        assert_eq!(naming.field_for_method("getMissing", has), None);
        assert_eq!(naming.field_for_method("compute", has), None);
    }

    #[test]
    fn test_custom_prefixes() {
        let naming = NamingConventions {
            getter_prefixes: vec!["fetch".to_string()],
            ..NamingConventions::default()
        };
        assert!(naming.is_getter("fetchName"));
        assert!(!naming.is_getter("getName"));
    }

    #[test]
    fn test_case_conversions() {
        assert_eq!(capitalize("name"), "Name");
        assert_eq!(capitalize(""), "");
        assert_eq!(lower_first("Name"), "name");
        assert_eq!(maybe_lower_first("URLPath"), "URLPath");
        assert_eq!(maybe_lower_first("Path"), "path");
        assert_eq!(normalized_string("one_string"), "OneString");
        assert_eq!(normalized_string("a.b-c d"), "ABCD");
        assert_eq!(underscored_string("OneString"), "one_string");
    }

    #[test]
    fn test_plural_singular() {
        assert_eq!(plural("order"), "orders");
        assert_eq!(plural("address"), "addresses");
        assert_eq!(plural("entry"), "entries");
        assert_eq!(singular("entries"), "entry");
        assert_eq!(singular("orders"), "order");
        assert_eq!(singular("data"), "data");
    }

    #[test]
    fn test_text_for_name() {
        assert_eq!(text_for_name("firstName"), "First name");
        assert_eq!(text_for_name("zip_code"), "Zip code");
        assert_eq!(text_for_name("homeURL"), "Home URL");
        assert_eq!(text_for_name(""), "");
    }

    #[test]
    fn test_short_class_name() {
        assert_eq!(short_class_name("bank.model.Account"), "Account");
        assert_eq!(short_class_name("Account"), "Account");
        assert_eq!(short_class_name("bank.Account[]"), "Account[]");
    }
}
