//! SQS resource schema definitions

use stackgen_core::ResourceKind;
use stackgen_core::schema::{AttributeSchema, AttributeType, ResourceSchema};

use super::types::{check_name, check_range};

/// Longest retention SQS allows: 14 days
pub const MAX_MESSAGE_RETENTION_SECONDS: i64 = 1_209_600;

/// Largest message SQS allows: 256 KiB
pub const MAX_MESSAGE_SIZE_BYTES: i64 = 262_144;

fn queue_name() -> AttributeType {
    AttributeType::Custom {
        name: "QueueName".to_string(),
        base: Box::new(AttributeType::String),
        validate: |value| {
            check_name(
                value,
                80,
                |c| c.is_ascii_alphanumeric() || c == '-' || c == '_',
                "QueueName",
            )
        },
    }
}

fn retention_period() -> AttributeType {
    AttributeType::Custom {
        name: "MessageRetentionPeriod".to_string(),
        base: Box::new(AttributeType::Int),
        validate: |value| {
            check_range(value, 60, MAX_MESSAGE_RETENTION_SECONDS, "MessageRetentionPeriod")
        },
    }
}

fn visibility_timeout() -> AttributeType {
    AttributeType::Custom {
        name: "VisibilityTimeout".to_string(),
        base: Box::new(AttributeType::Int),
        validate: |value| check_range(value, 0, 43_200, "VisibilityTimeout"),
    }
}

fn maximum_message_size() -> AttributeType {
    AttributeType::Custom {
        name: "MaximumMessageSize".to_string(),
        base: Box::new(AttributeType::Int),
        validate: |value| check_range(value, 1024, MAX_MESSAGE_SIZE_BYTES, "MaximumMessageSize"),
    }
}

/// Returns the schema for AWS::SQS::Queue
pub fn queue_schema() -> ResourceSchema {
    ResourceSchema::new(ResourceKind::Queue)
        .with_description("An Amazon SQS standard queue")
        .attribute(AttributeSchema::new("QueueName", queue_name()))
        .attribute(
            AttributeSchema::new("MessageRetentionPeriod", retention_period())
                .with_description("Seconds SQS retains a message (60 to 1209600)"),
        )
        .attribute(
            AttributeSchema::new("VisibilityTimeout", visibility_timeout())
                .with_description("Seconds a received message stays hidden (0 to 43200)"),
        )
        .attribute(
            AttributeSchema::new("MaximumMessageSize", maximum_message_size())
                .with_description("Message size limit in bytes (1024 to 262144)"),
        )
        .attribute(AttributeSchema::new(
            "DelaySeconds",
            AttributeType::Custom {
                name: "DelaySeconds".to_string(),
                base: Box::new(AttributeType::Int),
                validate: |value| check_range(value, 0, 900, "DelaySeconds"),
            },
        ))
}

pub fn schemas() -> Vec<ResourceSchema> {
    vec![queue_schema()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;
    use stackgen_core::Value;

    fn props(pairs: &[(&str, Value)]) -> IndexMap<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn babysitter_queue_settings_are_valid() {
        let result = queue_schema().validate(&props(&[
            ("QueueName", Value::from("chef-deregistration_acme_prod")),
            ("MessageRetentionPeriod", Value::Int(1_209_600)),
            ("VisibilityTimeout", Value::Int(60)),
            ("MaximumMessageSize", Value::Int(16_384)),
        ]));
        assert!(result.is_ok());
    }

    #[test]
    fn retention_beyond_fourteen_days_is_rejected() {
        let errors = queue_schema()
            .validate(&props(&[("MessageRetentionPeriod", Value::Int(1_209_601))]))
            .unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("MessageRetentionPeriod"));
    }

    #[test]
    fn queue_name_with_dots_is_rejected() {
        assert!(
            queue_schema()
                .validate(&props(&[("QueueName", Value::from("babysitter.acme.prod"))]))
                .is_err()
        );
    }
}
