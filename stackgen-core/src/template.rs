//! Template - Ordered accumulator of parameters, mappings, resources, and outputs
//!
//! Components append to a `Template` passed to them explicitly. Every name a
//! resource refers to must already be declared when the resource is added, so
//! insertion order is always a valid creation order.

use indexmap::IndexMap;
use serde::Serialize;
use serde::ser::{SerializeMap, Serializer};

use crate::resource::{Reference, Resource, Value};

/// CloudFormation template format version
pub const FORMAT_VERSION: &str = "2010-09-09";

/// Prefix of pseudo parameters (e.g., `AWS::Region`), which are always declared
const PSEUDO_PARAMETER_PREFIX: &str = "AWS::";

/// Errors raised while accumulating a template
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TemplateError {
    #[error("Logical ID '{0}' is already declared")]
    DuplicateLogicalId(String),

    #[error("Mapping '{0}' is already declared")]
    DuplicateMapping(String),

    #[error("Output '{0}' is already declared")]
    DuplicateOutput(String),

    #[error("Invalid logical ID '{0}': must be non-empty and alphanumeric")]
    InvalidLogicalId(String),

    #[error("{resource} depends on undeclared resource '{target}'")]
    UnknownDependency { resource: String, target: String },

    #[error("{resource} references undeclared name '{target}'")]
    UnknownReference { resource: String, target: String },

    #[error("{resource} looks up undeclared mapping '{mapping}'")]
    UnknownMapping { resource: String, mapping: String },

    #[error("Parameter '{0}' is not declared")]
    UnknownParameter(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Template parameter
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Parameter {
    #[serde(rename = "Type")]
    pub param_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub allowed_values: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub constraint_description: Option<String>,
}

impl Parameter {
    pub fn new(param_type: impl Into<String>) -> Self {
        Self {
            param_type: param_type.into(),
            default: None,
            description: None,
            allowed_values: Vec::new(),
            constraint_description: None,
        }
    }

    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    pub fn with_allowed_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_values = values.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_constraint_description(mut self, desc: impl Into<String>) -> Self {
        self.constraint_description = Some(desc.into());
        self
    }
}

/// Two-level lookup table: top key -> second key -> value
pub type Mapping = IndexMap<String, IndexMap<String, String>>;

/// Template output
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Output {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub value: Value,
}

/// Stack template under construction
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Template {
    description: Option<String>,
    parameters: IndexMap<String, Parameter>,
    mappings: IndexMap<String, Mapping>,
    resources: IndexMap<String, Resource>,
    outputs: IndexMap<String, Output>,
}

impl Template {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    /// Declare a parameter and return a `Ref` to it
    pub fn add_parameter(
        &mut self,
        name: impl Into<String>,
        parameter: Parameter,
    ) -> Result<Value, TemplateError> {
        let name = name.into();
        self.check_new_logical_id(&name)?;
        log::debug!("Adding parameter {} ({})", name, parameter.param_type);
        self.parameters.insert(name.clone(), parameter);
        Ok(Value::Ref(name))
    }

    pub fn add_mapping(
        &mut self,
        name: impl Into<String>,
        mapping: Mapping,
    ) -> Result<(), TemplateError> {
        let name = name.into();
        if self.mappings.contains_key(&name) {
            return Err(TemplateError::DuplicateMapping(name));
        }
        log::debug!("Adding mapping {} ({} keys)", name, mapping.len());
        self.mappings.insert(name, mapping);
        Ok(())
    }

    /// Append a resource and return a `Ref` to it
    ///
    /// Fails if the logical ID is taken, or if a dependency, `Ref`,
    /// `Fn::GetAtt`, or `Fn::FindInMap` names something not yet declared.
    pub fn add_resource(&mut self, resource: Resource) -> Result<Value, TemplateError> {
        let logical_id = resource.logical_id().to_string();
        self.check_new_logical_id(&logical_id)?;

        for target in &resource.depends_on {
            if !self.resources.contains_key(target) {
                return Err(TemplateError::UnknownDependency {
                    resource: logical_id,
                    target: target.clone(),
                });
            }
        }

        for reference in resource.references() {
            match reference {
                Reference::Entity(target) if !self.declares(target) => {
                    return Err(TemplateError::UnknownReference {
                        resource: logical_id,
                        target: target.to_string(),
                    });
                }
                Reference::Mapping(mapping) if !self.mappings.contains_key(mapping) => {
                    return Err(TemplateError::UnknownMapping {
                        resource: logical_id,
                        mapping: mapping.to_string(),
                    });
                }
                _ => {}
            }
        }

        log::debug!("Adding resource {}", resource.id);
        self.resources.insert(logical_id.clone(), resource);
        Ok(Value::Ref(logical_id))
    }

    pub fn add_output(
        &mut self,
        name: impl Into<String>,
        output: Output,
    ) -> Result<(), TemplateError> {
        let name = name.into();
        if self.outputs.contains_key(&name) {
            return Err(TemplateError::DuplicateOutput(name));
        }
        let mut references = Vec::new();
        output.value.collect_references(&mut references);
        for reference in references {
            if let Reference::Entity(target) = reference
                && !self.declares(target)
            {
                return Err(TemplateError::UnknownReference {
                    resource: name,
                    target: target.to_string(),
                });
            }
        }
        self.outputs.insert(name, output);
        Ok(())
    }

    /// `Ref` to a declared parameter
    pub fn parameter_ref(&self, name: &str) -> Result<Value, TemplateError> {
        if self.parameters.contains_key(name) {
            Ok(Value::reference(name))
        } else {
            Err(TemplateError::UnknownParameter(name.to_string()))
        }
    }

    /// Returns true if `name` can be the target of a `Ref`
    pub fn declares(&self, name: &str) -> bool {
        name.starts_with(PSEUDO_PARAMETER_PREFIX)
            || self.resources.contains_key(name)
            || self.parameters.contains_key(name)
    }

    pub fn resource(&self, logical_id: &str) -> Option<&Resource> {
        self.resources.get(logical_id)
    }

    /// Resources in declaration order
    pub fn resources(&self) -> impl Iterator<Item = &Resource> {
        self.resources.values()
    }

    /// Parameters in declaration order
    pub fn parameters(&self) -> impl Iterator<Item = (&str, &Parameter)> {
        self.parameters.iter().map(|(name, p)| (name.as_str(), p))
    }

    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters.get(name)
    }

    pub fn mapping(&self, name: &str) -> Option<&Mapping> {
        self.mappings.get(name)
    }

    pub fn output(&self, name: &str) -> Option<&Output> {
        self.outputs.get(name)
    }

    /// Number of resources
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    pub fn to_json(&self) -> Result<serde_json::Value, TemplateError> {
        serde_json::to_value(self).map_err(|e| TemplateError::Serialization(e.to_string()))
    }

    pub fn to_json_string(&self) -> Result<String, TemplateError> {
        serde_json::to_string_pretty(self)
            .map(|mut s| {
                s.push('\n');
                s
            })
            .map_err(|e| TemplateError::Serialization(e.to_string()))
    }

    pub fn to_yaml_string(&self) -> Result<String, TemplateError> {
        serde_yaml::to_string(self).map_err(|e| TemplateError::Serialization(e.to_string()))
    }

    fn check_new_logical_id(&self, name: &str) -> Result<(), TemplateError> {
        if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(TemplateError::InvalidLogicalId(name.to_string()));
        }
        if self.resources.contains_key(name) || self.parameters.contains_key(name) {
            return Err(TemplateError::DuplicateLogicalId(name.to_string()));
        }
        Ok(())
    }
}

impl Serialize for Template {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut m = serializer.serialize_map(None)?;
        m.serialize_entry("AWSTemplateFormatVersion", FORMAT_VERSION)?;
        if let Some(description) = &self.description {
            m.serialize_entry("Description", description)?;
        }
        if !self.parameters.is_empty() {
            m.serialize_entry("Parameters", &self.parameters)?;
        }
        if !self.mappings.is_empty() {
            m.serialize_entry("Mappings", &self.mappings)?;
        }
        m.serialize_entry("Resources", &self.resources)?;
        if !self.outputs.is_empty() {
            m.serialize_entry("Outputs", &self.outputs)?;
        }
        m.end()
    }
}
