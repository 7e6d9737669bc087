//! SNS resource schema definitions

use stackgen_core::ResourceKind;
use stackgen_core::schema::{AttributeSchema, AttributeType, ResourceSchema};

/// Subscription protocols accepted by SNS
pub fn subscription_protocol() -> AttributeType {
    AttributeType::Enum(
        [
            "http",
            "https",
            "email",
            "email-json",
            "sms",
            "sqs",
            "application",
            "lambda",
            "firehose",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect(),
    )
}

fn subscription() -> AttributeType {
    AttributeType::Struct {
        name: "Subscription".to_string(),
        fields: vec![
            AttributeSchema::new("Endpoint", AttributeType::String).required(),
            AttributeSchema::new("Protocol", subscription_protocol()).required(),
        ],
    }
}

/// Returns the schema for AWS::SNS::Topic
pub fn topic_schema() -> ResourceSchema {
    ResourceSchema::new(ResourceKind::Topic)
        .with_description("An Amazon SNS topic")
        .attribute(AttributeSchema::new("DisplayName", AttributeType::String))
        .attribute(AttributeSchema::new("TopicName", AttributeType::String))
        .attribute(AttributeSchema::new(
            "Subscription",
            AttributeType::List(Box::new(subscription())),
        ))
}

pub fn schemas() -> Vec<ResourceSchema> {
    vec![topic_schema()]
}
