//! Stackgen AWS Provider
//!
//! CloudFormation schemas for every resource kind stackgen emits, and
//! whole-template validation against them.

pub mod schemas;

use std::collections::HashMap;
use std::fmt::Write;

use stackgen_core::schema::{ResourceSchema, TypeError};
use stackgen_core::{ResourceKind, Template};

/// Violation found while validating a template
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("{logical_id} ({kind}): {error}")]
    Resource {
        logical_id: String,
        kind: ResourceKind,
        error: TypeError,
    },

    #[error("Parameter {name}: default '{default}' is not one of its allowed values")]
    DisallowedDefault { name: String, default: String },
}

/// Result type for validation
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// Schemas indexed by resource kind
pub fn schema_registry() -> HashMap<ResourceKind, ResourceSchema> {
    schemas::all_schemas()
        .into_iter()
        .map(|schema| (schema.kind, schema))
        .collect()
}

/// Validate every parameter and resource of a template
///
/// Collects all violations rather than stopping at the first one.
pub fn validate_template(template: &Template) -> ValidationResult {
    let registry = schema_registry();
    let mut errors = Vec::new();

    for (name, parameter) in template.parameters() {
        if let Some(default) = &parameter.default
            && !parameter.allowed_values.is_empty()
            && !parameter.allowed_values.contains(default)
        {
            errors.push(ValidationError::DisallowedDefault {
                name: name.to_string(),
                default: default.clone(),
            });
        }
    }

    for resource in template.resources() {
        let Some(schema) = registry.get(&resource.kind()) else {
            log::warn!("No schema for {}, skipping validation", resource.id);
            continue;
        };
        if let Err(type_errors) = schema.validate(&resource.properties) {
            errors.extend(
                type_errors
                    .into_iter()
                    .map(|error| ValidationError::Resource {
                        logical_id: resource.logical_id().to_string(),
                        kind: resource.kind(),
                        error,
                    }),
            );
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Human-readable summary of a schema: its description and attributes
pub fn describe_schema(schema: &ResourceSchema) -> String {
    let mut out = String::new();
    let _ = write!(out, "{}", schema.kind);
    if let Some(description) = &schema.description {
        let _ = write!(out, " - {}", description);
    }
    out.push('\n');

    for attribute in &schema.attributes {
        let _ = write!(out, "  {}", attribute.name);
        if attribute.required {
            out.push_str(" (required)");
        }
        if let Some(description) = &attribute.description {
            let _ = write!(out, ": {}", description);
        }
        out.push('\n');
    }
    out
}
