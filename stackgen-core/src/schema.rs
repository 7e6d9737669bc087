//! Schema - Define type schemas for resources
//!
//! Providers define a schema for each resource kind, so a template can be
//! checked before it is handed to CloudFormation.

use std::fmt;

use indexmap::IndexMap;

use crate::resource::{ResourceKind, Value};

/// Attribute type
#[derive(Debug, Clone)]
pub enum AttributeType {
    /// String
    String,
    /// Integer
    Int,
    /// Boolean
    Bool,
    /// Any value (free-form documents such as IAM policies)
    Any,
    /// Enum (list of allowed values)
    Enum(Vec<String>),
    /// Custom type (with validation function)
    Custom {
        name: String,
        base: Box<AttributeType>,
        validate: fn(&Value) -> Result<(), String>,
    },
    /// List
    List(Box<AttributeType>),
    /// Map with homogeneous values
    Map(Box<AttributeType>),
    /// Map with a fixed set of named fields
    Struct {
        name: String,
        fields: Vec<AttributeSchema>,
    },
}

impl AttributeType {
    /// Check if a value conforms to this type
    pub fn validate(&self, value: &Value) -> Result<(), TypeError> {
        // Intrinsic functions are resolved by CloudFormation at deploy time
        if value.is_intrinsic() {
            return Ok(());
        }

        match (self, value) {
            (AttributeType::Any, _) => Ok(()),
            (AttributeType::String, Value::String(_)) => Ok(()),
            (AttributeType::Int, Value::Int(_)) => Ok(()),
            (AttributeType::Bool, Value::Bool(_)) => Ok(()),

            (AttributeType::Enum(variants), Value::String(s)) => {
                if variants.iter().any(|v| v == s) {
                    Ok(())
                } else {
                    Err(TypeError::InvalidEnumVariant {
                        value: s.clone(),
                        expected: variants.clone(),
                    })
                }
            }

            (AttributeType::Custom { validate, base, .. }, v) => {
                base.validate(v)?;
                validate(v).map_err(|msg| TypeError::ValidationFailed { message: msg })
            }

            (AttributeType::List(inner), Value::List(items)) => {
                for (i, item) in items.iter().enumerate() {
                    inner.validate(item).map_err(|e| TypeError::ListItemError {
                        index: i,
                        inner: Box::new(e),
                    })?;
                }
                Ok(())
            }

            (AttributeType::Map(inner), Value::Map(map)) => {
                for (k, v) in map {
                    inner.validate(v).map_err(|e| TypeError::MapValueError {
                        key: k.clone(),
                        inner: Box::new(e),
                    })?;
                }
                Ok(())
            }

            (AttributeType::Struct { fields, .. }, Value::Map(map)) => {
                validate_fields(fields, map)
                    .map_err(|mut errors| errors.remove(0))
            }

            _ => Err(TypeError::TypeMismatch {
                expected: self.type_name(),
                got: value.type_name(),
            }),
        }
    }

    fn type_name(&self) -> String {
        match self {
            AttributeType::String => "String".to_string(),
            AttributeType::Int => "Int".to_string(),
            AttributeType::Bool => "Bool".to_string(),
            AttributeType::Any => "Any".to_string(),
            AttributeType::Enum(variants) => format!("Enum({})", variants.join(" | ")),
            AttributeType::Custom { name, .. } => name.clone(),
            AttributeType::List(inner) => format!("List<{}>", inner.type_name()),
            AttributeType::Map(inner) => format!("Map<{}>", inner.type_name()),
            AttributeType::Struct { name, .. } => name.clone(),
        }
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.type_name())
    }
}

/// Type error
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TypeError {
    #[error("Type mismatch: expected {expected}, got {got}")]
    TypeMismatch { expected: String, got: String },

    #[error("Invalid enum variant '{value}', expected one of: {}", expected.join(", "))]
    InvalidEnumVariant {
        value: String,
        expected: Vec<String>,
    },

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    #[error("Required attribute '{name}' is missing")]
    MissingRequired { name: String },

    #[error("Unknown attribute '{name}'")]
    UnknownAttribute { name: String },

    #[error("Attribute '{name}': {inner}")]
    AttributeError { name: String, inner: Box<TypeError> },

    #[error("List item at index {index}: {inner}")]
    ListItemError { index: usize, inner: Box<TypeError> },

    #[error("Map value for key '{key}': {inner}")]
    MapValueError { key: String, inner: Box<TypeError> },
}

/// Attribute schema
#[derive(Debug, Clone)]
pub struct AttributeSchema {
    pub name: String,
    pub attr_type: AttributeType,
    pub required: bool,
    pub description: Option<String>,
}

impl AttributeSchema {
    pub fn new(name: impl Into<String>, attr_type: AttributeType) -> Self {
        Self {
            name: name.into(),
            attr_type,
            required: false,
            description: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }
}

/// Resource schema
#[derive(Debug, Clone)]
pub struct ResourceSchema {
    pub kind: ResourceKind,
    pub attributes: Vec<AttributeSchema>,
    pub description: Option<String>,
}

impl ResourceSchema {
    pub fn new(kind: ResourceKind) -> Self {
        Self {
            kind,
            attributes: Vec::new(),
            description: None,
        }
    }

    pub fn attribute(mut self, schema: AttributeSchema) -> Self {
        self.attributes.push(schema);
        self
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    /// Validate resource properties
    pub fn validate(&self, properties: &IndexMap<String, Value>) -> Result<(), Vec<TypeError>> {
        validate_fields(&self.attributes, properties)
    }
}

/// Check required fields, reject unknown ones, and type check the rest
fn validate_fields(
    fields: &[AttributeSchema],
    values: &IndexMap<String, Value>,
) -> Result<(), Vec<TypeError>> {
    let mut errors = Vec::new();

    for field in fields {
        if field.required && !values.contains_key(&field.name) {
            errors.push(TypeError::MissingRequired {
                name: field.name.clone(),
            });
        }
    }

    for (name, value) in values {
        match fields.iter().find(|f| &f.name == name) {
            Some(field) => {
                if let Err(e) = field.attr_type.validate(value) {
                    errors.push(TypeError::AttributeError {
                        name: name.clone(),
                        inner: Box::new(e),
                    });
                }
            }
            None => errors.push(TypeError::UnknownAttribute { name: name.clone() }),
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Helper functions for common types
pub mod types {
    use super::*;

    /// Positive integer type
    pub fn positive_int() -> AttributeType {
        AttributeType::Custom {
            name: "PositiveInt".to_string(),
            base: Box::new(AttributeType::Int),
            validate: |value| {
                if let Value::Int(n) = value {
                    if *n > 0 {
                        Ok(())
                    } else {
                        Err("Value must be positive".to_string())
                    }
                } else {
                    Err("Expected integer".to_string())
                }
            },
        }
    }

    /// CIDR block type (e.g., "10.0.0.0/16")
    pub fn cidr() -> AttributeType {
        AttributeType::Custom {
            name: "Cidr".to_string(),
            base: Box::new(AttributeType::String),
            validate: |value| {
                if let Value::String(s) = value {
                    validate_cidr(s)
                } else {
                    Err("Expected string".to_string())
                }
            },
        }
    }

    /// List of `{Key, Value}` tags
    pub fn tags() -> AttributeType {
        AttributeType::List(Box::new(AttributeType::Struct {
            name: "Tag".to_string(),
            fields: vec![
                AttributeSchema::new("Key", AttributeType::String).required(),
                AttributeSchema::new("Value", AttributeType::String).required(),
            ],
        }))
    }
}

/// Validate CIDR block format (e.g., "10.0.0.0/16")
pub fn validate_cidr(cidr: &str) -> Result<(), String> {
    let parts: Vec<&str> = cidr.split('/').collect();
    if parts.len() != 2 {
        return Err(format!("Invalid CIDR format '{}': expected IP/prefix", cidr));
    }

    let ip = parts[0];
    let prefix = parts[1];

    let octets: Vec<&str> = ip.split('.').collect();
    if octets.len() != 4 {
        return Err(format!("Invalid IP address '{}': expected 4 octets", ip));
    }

    for octet in &octets {
        if octet.parse::<u8>().is_err() {
            return Err(format!(
                "Invalid octet '{}' in IP address: must be 0-255",
                octet
            ));
        }
    }

    match prefix.parse::<u8>() {
        Ok(p) if p <= 32 => Ok(()),
        Ok(p) => Err(format!("Invalid prefix length '{}': must be 0-32", p)),
        Err(_) => Err(format!(
            "Invalid prefix length '{}': must be a number",
            prefix
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_string_type() {
        let t = AttributeType::String;
        assert!(t.validate(&Value::String("hello".to_string())).is_ok());
        assert!(t.validate(&Value::Int(42)).is_err());
    }

    #[test]
    fn intrinsics_pass_any_type() {
        assert!(AttributeType::Int.validate(&Value::reference("Param")).is_ok());
        assert!(
            types::cidr()
                .validate(&Value::get_att("Vpc", "CidrBlock"))
                .is_ok()
        );
    }

    #[test]
    fn validate_enum_type() {
        let t = AttributeType::Enum(vec!["a".to_string(), "b".to_string()]);
        assert!(t.validate(&Value::String("a".to_string())).is_ok());
        assert!(t.validate(&Value::String("c".to_string())).is_err());
    }

    #[test]
    fn validate_positive_int() {
        let t = types::positive_int();
        assert!(t.validate(&Value::Int(1)).is_ok());
        assert!(t.validate(&Value::Int(0)).is_err());
        assert!(t.validate(&Value::Int(-1)).is_err());
        assert!(t.validate(&Value::Bool(true)).is_err());
    }

    #[test]
    fn validate_resource_schema() {
        let schema = ResourceSchema::new(ResourceKind::Queue)
            .attribute(AttributeSchema::new("QueueName", AttributeType::String).required())
            .attribute(AttributeSchema::new("DelaySeconds", types::positive_int()));

        let mut props = IndexMap::new();
        props.insert("QueueName".to_string(), Value::from("q"));
        props.insert("DelaySeconds".to_string(), Value::Int(5));
        assert!(schema.validate(&props).is_ok());

        props.insert("Bogus".to_string(), Value::Int(1));
        let errors = schema.validate(&props).unwrap_err();
        assert_eq!(
            errors,
            vec![TypeError::UnknownAttribute {
                name: "Bogus".to_string()
            }]
        );
    }

    #[test]
    fn missing_required_attribute() {
        let schema = ResourceSchema::new(ResourceKind::Queue)
            .attribute(AttributeSchema::new("QueueName", AttributeType::String).required());

        let errors = schema.validate(&IndexMap::new()).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("QueueName"));
    }

    #[test]
    fn struct_fields_are_checked() {
        let t = types::tags();
        let good = Value::List(vec![Value::map([("Key", "Name"), ("Value", "x")])]);
        assert!(t.validate(&good).is_ok());

        let missing_value = Value::List(vec![Value::map([("Key", "Name")])]);
        let err = t.validate(&missing_value).unwrap_err();
        assert!(err.to_string().contains("Required attribute 'Value'"));
    }

    #[test]
    fn validate_cidr_type() {
        let t = types::cidr();

        assert!(t.validate(&Value::from("10.0.0.0/16")).is_ok());
        assert!(t.validate(&Value::from("0.0.0.0/0")).is_ok());
        assert!(t.validate(&Value::from("255.255.255.255/32")).is_ok());

        assert!(t.validate(&Value::from("10.0.0.0")).is_err()); // no prefix
        assert!(t.validate(&Value::from("10.0.0.0/33")).is_err()); // prefix too large
        assert!(t.validate(&Value::from("10.0.0.256/16")).is_err()); // octet > 255
        assert!(t.validate(&Value::from("10.0.0/16")).is_err()); // only 3 octets
        assert!(t.validate(&Value::Int(42)).is_err()); // wrong type
    }
}
