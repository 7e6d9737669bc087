//! IAM resource schema definitions

use stackgen_core::ResourceKind;
use stackgen_core::schema::{AttributeSchema, AttributeType, ResourceSchema};

use super::types::check_name;

fn iam_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || "+=,.@_-".contains(c)
}

fn role_name() -> AttributeType {
    AttributeType::Custom {
        name: "RoleName".to_string(),
        base: Box::new(AttributeType::String),
        validate: |value| check_name(value, 64, iam_name_char, "RoleName"),
    }
}

fn path() -> AttributeType {
    AttributeType::Custom {
        name: "IamPath".to_string(),
        base: Box::new(AttributeType::String),
        validate: |value| match value.as_str() {
            Some(p) if p.starts_with('/') && p.ends_with('/') => Ok(()),
            Some(p) => Err(format!("IAM path '{}' must begin and end with '/'", p)),
            None => Err("Expected string".to_string()),
        },
    }
}

fn policy() -> AttributeType {
    AttributeType::Struct {
        name: "Policy".to_string(),
        fields: vec![
            AttributeSchema::new("PolicyName", AttributeType::String).required(),
            AttributeSchema::new("PolicyDocument", AttributeType::Any).required(),
        ],
    }
}

/// Returns the schema for AWS::IAM::Role
pub fn role_schema() -> ResourceSchema {
    ResourceSchema::new(ResourceKind::Role)
        .with_description("An IAM role")
        .attribute(AttributeSchema::new("AssumeRolePolicyDocument", AttributeType::Any).required())
        .attribute(AttributeSchema::new("Path", path()))
        .attribute(AttributeSchema::new("RoleName", role_name()))
        .attribute(AttributeSchema::new(
            "Policies",
            AttributeType::List(Box::new(policy())),
        ))
        .attribute(AttributeSchema::new(
            "ManagedPolicyArns",
            AttributeType::List(Box::new(AttributeType::String)),
        ))
}

/// Returns the schema for AWS::IAM::InstanceProfile
pub fn instance_profile_schema() -> ResourceSchema {
    ResourceSchema::new(ResourceKind::InstanceProfile)
        .with_description("An IAM instance profile wrapping one role")
        .attribute(AttributeSchema::new("InstanceProfileName", AttributeType::String))
        .attribute(AttributeSchema::new("Path", path()))
        .attribute(
            AttributeSchema::new("Roles", AttributeType::List(Box::new(AttributeType::String)))
                .required(),
        )
}

pub fn schemas() -> Vec<ResourceSchema> {
    vec![role_schema(), instance_profile_schema()]
}
