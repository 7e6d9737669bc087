//! CloudWatch resource schema definitions

use stackgen_core::ResourceKind;
use stackgen_core::schema::{AttributeSchema, AttributeType, ResourceSchema, types};

fn enum_of(values: &[&str]) -> AttributeType {
    AttributeType::Enum(values.iter().map(|s| s.to_string()).collect())
}

pub fn comparison_operator() -> AttributeType {
    enum_of(&[
        "GreaterThanOrEqualToThreshold",
        "GreaterThanThreshold",
        "LessThanThreshold",
        "LessThanOrEqualToThreshold",
    ])
}

pub fn statistic() -> AttributeType {
    enum_of(&["SampleCount", "Average", "Sum", "Minimum", "Maximum"])
}

fn dimension() -> AttributeType {
    AttributeType::Struct {
        name: "MetricDimension".to_string(),
        fields: vec![
            AttributeSchema::new("Name", AttributeType::String).required(),
            AttributeSchema::new("Value", AttributeType::String).required(),
        ],
    }
}

fn actions() -> AttributeType {
    AttributeType::List(Box::new(AttributeType::String))
}

/// Returns the schema for AWS::CloudWatch::Alarm
pub fn alarm_schema() -> ResourceSchema {
    ResourceSchema::new(ResourceKind::Alarm)
        .with_description("A CloudWatch metric alarm")
        .attribute(AttributeSchema::new("AlarmName", AttributeType::String))
        .attribute(AttributeSchema::new("AlarmDescription", AttributeType::String))
        .attribute(AttributeSchema::new("Namespace", AttributeType::String).required())
        .attribute(AttributeSchema::new("MetricName", AttributeType::String).required())
        .attribute(AttributeSchema::new(
            "Dimensions",
            AttributeType::List(Box::new(dimension())),
        ))
        .attribute(AttributeSchema::new("Statistic", statistic()))
        .attribute(
            AttributeSchema::new("Period", types::positive_int())
                .with_description("Seconds over which the statistic is applied"),
        )
        .attribute(AttributeSchema::new("EvaluationPeriods", types::positive_int()).required())
        .attribute(AttributeSchema::new("Threshold", AttributeType::Int))
        .attribute(AttributeSchema::new("ComparisonOperator", comparison_operator()).required())
        .attribute(AttributeSchema::new("AlarmActions", actions()))
        .attribute(AttributeSchema::new("InsufficientDataActions", actions()))
        .attribute(AttributeSchema::new("OKActions", actions()))
}

pub fn schemas() -> Vec<ResourceSchema> {
    vec![alarm_schema()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;
    use stackgen_core::Value;

    #[test]
    fn missing_comparison_operator_is_reported() {
        let mut props = IndexMap::new();
        props.insert("Namespace".to_string(), Value::from("AWS/SQS"));
        props.insert(
            "MetricName".to_string(),
            Value::from("ApproximateNumberOfMessagesVisible"),
        );
        props.insert("EvaluationPeriods".to_string(), Value::Int(1));

        let errors = alarm_schema().validate(&props).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("ComparisonOperator"));
    }

    #[test]
    fn zero_period_is_rejected() {
        let mut props = IndexMap::new();
        props.insert("Namespace".to_string(), Value::from("AWS/SQS"));
        props.insert("MetricName".to_string(), Value::from("m"));
        props.insert("EvaluationPeriods".to_string(), Value::Int(1));
        props.insert(
            "ComparisonOperator".to_string(),
            Value::from("GreaterThanThreshold"),
        );
        props.insert("Period".to_string(), Value::Int(0));
        assert!(alarm_schema().validate(&props).is_err());
    }
}
