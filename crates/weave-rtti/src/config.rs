//! Repository configuration (weave.toml)
//!
//! ```toml
//! [naming]
//! getter_prefixes = ["get", "is"]
//!
//! [rtti]
//! hidden_method_prefix = "_"
//! infer_from_naming = true
//!
//! [[declare.calculated]]
//! class = "Bank"
//! field = "total"
//! getter = "getTotal"
//!
//! [[declare.associations]]
//! role_a = "Bank.accounts"
//! role_b = "Account.bank"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::attributes::GUI_GATED_ATTRIBUTES;
use crate::naming::NamingConventions;

/// Errors that can occur while loading configuration, models or facts
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the file
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse TOML: {0}")]
    Toml(#[from] toml::de::Error),

    /// Failed to parse JSON
    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Content parsed but is not usable
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RttiConfig {
    /// Prefix families used to classify method names
    pub naming: NamingConventions,
    /// Construction settings
    pub rtti: RttiSettings,
    /// Declarations replayed on the repository after construction
    pub declare: Declarations,
}

/// Construction settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RttiSettings {
    /// Methods whose name starts with this prefix are runtime plumbing
    pub hidden_method_prefix: String,
    /// Fields whose name starts with this prefix are runtime plumbing
    pub hidden_field_prefix: String,
    /// Bind getters, setters, adders and removers from naming conventions
    /// when no explicit fact did
    pub infer_from_naming: bool,
    /// Attribute names routed through the registered access controller
    pub gated_attributes: Vec<String>,
}

impl Default for RttiSettings {
    fn default() -> Self {
        Self {
            hidden_method_prefix: "_".to_string(),
            hidden_field_prefix: "__".to_string(),
            infer_from_naming: true,
            gated_attributes: GUI_GATED_ATTRIBUTES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// `Class.field` with a method name
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AccessorDecl {
    /// Member reference, `Class.field`
    pub field: String,
    /// Method name or signature on the same class
    pub method: String,
}

/// Calculated field backed by a getter
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CalculatedDecl {
    /// Owning class
    pub class: String,
    /// New field name
    pub field: String,
    /// Getter computing the value
    pub getter: String,
}

/// Bidirectional association between two roles
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssociationDecl {
    /// First role, `Class.field`
    pub role_a: String,
    /// Opposite role, `Class.field`
    pub role_b: String,
}

/// Allowed conversion between two classes
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CastDecl {
    /// Source class
    pub from: String,
    /// Destination class
    pub to: String,
}

/// Primary key of a collection's elements
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PrimaryKeyDecl {
    /// Collection, `Class.field`
    pub collection: String,
    /// Element fields forming the key
    pub fields: Vec<String>,
}

/// Null acceptance of a field
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NullableDecl {
    /// Field, `Class.field`
    pub field: String,
    /// Whether null is accepted
    #[serde(default = "yes")]
    pub allowed: bool,
}

/// Explicit element type of a collection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComponentTypeDecl {
    /// Collection, `Class.field`
    pub collection: String,
    /// Element type name
    #[serde(rename = "type")]
    pub ty: String,
}

/// Map collection used as an index
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexDecl {
    /// Collection, `Class.field`
    pub collection: String,
    /// Element field the index is keyed on
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

/// Virtual class layered over an actual class
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VirtualClassDecl {
    /// Logical name
    pub name: String,
    /// Actual class
    pub actual: String,
}

fn yes() -> bool {
    true
}

/// Declarations applied through the configuration surface
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Declarations {
    /// Virtual classes, registered first
    pub virtual_classes: Vec<VirtualClassDecl>,
    /// Calculated fields
    pub calculated: Vec<CalculatedDecl>,
    /// Explicit getters
    pub getters: Vec<AccessorDecl>,
    /// Explicit setters
    pub setters: Vec<AccessorDecl>,
    /// Explicit adders
    pub adders: Vec<AccessorDecl>,
    /// Explicit removers
    pub removers: Vec<AccessorDecl>,
    /// Collection element types
    pub component_types: Vec<ComponentTypeDecl>,
    /// Index collections
    pub indexes: Vec<IndexDecl>,
    /// Associations
    pub associations: Vec<AssociationDecl>,
    /// Allowed casts
    pub casts: Vec<CastDecl>,
    /// Primary keys
    pub primary_keys: Vec<PrimaryKeyDecl>,
    /// Nullable fields
    pub nullable: Vec<NullableDecl>,
    /// Aggregation relations, `Class.field`
    pub aggregations: Vec<String>,
}

impl Declarations {
    fn member_refs(&self) -> Vec<&str> {
        let mut refs: Vec<&str> = Vec::new();
        refs.extend(
            self.getters
                .iter()
                .chain(&self.setters)
                .chain(&self.adders)
                .chain(&self.removers)
                .map(|d| d.field.as_str()),
        );
        refs.extend(self.component_types.iter().map(|d| d.collection.as_str()));
        refs.extend(self.indexes.iter().map(|d| d.collection.as_str()));
        refs.extend(
            self.associations
                .iter()
                .flat_map(|d| [d.role_a.as_str(), d.role_b.as_str()]),
        );
        refs.extend(self.primary_keys.iter().map(|d| d.collection.as_str()));
        refs.extend(self.nullable.iter().map(|d| d.field.as_str()));
        refs.extend(self.aggregations.iter().map(String::as_str));
        refs
    }
}

impl RttiConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Parse configuration from TOML
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let config: RttiConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let naming = &self.naming;
        for prefix in naming
            .getter_prefixes
            .iter()
            .chain(&naming.setter_prefixes)
            .chain(&naming.adder_prefixes)
            .chain(&naming.remover_prefixes)
        {
            if prefix.is_empty() {
                return Err(ConfigError::Invalid(
                    "naming prefixes cannot be empty".to_string(),
                ));
            }
        }

        for member in self.declare.member_refs() {
            match member.rsplit_once('.') {
                Some((class, field)) if !class.is_empty() && !field.is_empty() => {}
                _ => {
                    return Err(ConfigError::Invalid(format!(
                        "member reference must be Class.field: {}",
                        member
                    )))
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RttiConfig::from_str("").unwrap();
        assert_eq!(config, RttiConfig::default());
        assert!(config.rtti.infer_from_naming);
        assert_eq!(config.rtti.hidden_method_prefix, "_");
        assert!(config
            .rtti
            .gated_attributes
            .contains(&"GuiAC.VISIBLE".to_string()));
    }

    #[test]
    fn test_partial_naming_section() {
        let config = RttiConfig::from_str(
            r#"
[naming]
getter_prefixes = ["get", "is", "has"]
"#,
        )
        .unwrap();
        assert_eq!(config.naming.getter_prefixes.len(), 3);
        assert_eq!(config.naming.setter_prefixes, vec!["set".to_string()]);
    }

    #[test]
    fn test_declarations() {
        let config = RttiConfig::from_str(
            r#"
[[declare.calculated]]
class = "Bank"
field = "total"
getter = "getTotal"

[[declare.nullable]]
field = "Account.owner"

[[declare.component_types]]
collection = "Bank.accounts"
type = "Account"
"#,
        )
        .unwrap();
        assert_eq!(config.declare.calculated[0].getter, "getTotal");
        assert!(config.declare.nullable[0].allowed);
        assert_eq!(config.declare.component_types[0].ty, "Account");
    }

    #[test]
    fn test_rejects_bad_member_reference() {
        let err = RttiConfig::from_str(
            r#"
[declare]
aggregations = ["accounts"]
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_rejects_empty_prefix() {
        let err = RttiConfig::from_str("[naming]\nsetter_prefixes = [\"\"]\n").unwrap_err();
        assert!(err.to_string().contains("prefixes"));
    }
}
