//! AutoScaling resource schema definitions

use stackgen_core::ResourceKind;
use stackgen_core::schema::{AttributeSchema, AttributeType, ResourceSchema, types};

use super::types::{capacity, instance_type};

/// Lifecycle notification sent to the group's topic
pub const EC2_INSTANCE_TERMINATE: &str = "autoscaling:EC2_INSTANCE_TERMINATE";

pub fn notification_type() -> AttributeType {
    AttributeType::Enum(
        [
            "autoscaling:EC2_INSTANCE_LAUNCH",
            "autoscaling:EC2_INSTANCE_LAUNCH_ERROR",
            EC2_INSTANCE_TERMINATE,
            "autoscaling:EC2_INSTANCE_TERMINATE_ERROR",
            "autoscaling:TEST_NOTIFICATION",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect(),
    )
}

fn block_device_mapping() -> AttributeType {
    AttributeType::Struct {
        name: "BlockDeviceMapping".to_string(),
        fields: vec![
            AttributeSchema::new("DeviceName", AttributeType::String).required(),
            AttributeSchema::new(
                "Ebs",
                AttributeType::Struct {
                    name: "BlockDevice".to_string(),
                    fields: vec![
                        AttributeSchema::new("DeleteOnTermination", AttributeType::Bool),
                        AttributeSchema::new("VolumeSize", types::positive_int()),
                        AttributeSchema::new(
                            "VolumeType",
                            AttributeType::Enum(
                                ["standard", "gp2", "gp3", "io1", "st1", "sc1"]
                                    .iter()
                                    .map(|s| s.to_string())
                                    .collect(),
                            ),
                        ),
                    ],
                },
            ),
        ],
    }
}

fn notification_configuration() -> AttributeType {
    AttributeType::Struct {
        name: "NotificationConfiguration".to_string(),
        fields: vec![
            AttributeSchema::new("TopicARN", AttributeType::String).required(),
            AttributeSchema::new(
                "NotificationTypes",
                AttributeType::List(Box::new(notification_type())),
            ),
        ],
    }
}

fn strings() -> AttributeType {
    AttributeType::List(Box::new(AttributeType::String))
}

/// Returns the schema for AWS::AutoScaling::LaunchConfiguration
pub fn launch_configuration_schema() -> ResourceSchema {
    ResourceSchema::new(ResourceKind::LaunchConfig)
        .with_description("An Auto Scaling launch configuration")
        .attribute(AttributeSchema::new("ImageId", AttributeType::String).required())
        .attribute(AttributeSchema::new("InstanceType", instance_type()).required())
        .attribute(AttributeSchema::new("IamInstanceProfile", AttributeType::String))
        .attribute(AttributeSchema::new("AssociatePublicIpAddress", AttributeType::Bool))
        .attribute(AttributeSchema::new(
            "BlockDeviceMappings",
            AttributeType::List(Box::new(block_device_mapping())),
        ))
        .attribute(AttributeSchema::new("KeyName", AttributeType::String))
        .attribute(AttributeSchema::new("SecurityGroups", strings()))
        .attribute(AttributeSchema::new("UserData", AttributeType::String))
}

/// Returns the schema for AWS::AutoScaling::AutoScalingGroup
pub fn auto_scaling_group_schema() -> ResourceSchema {
    ResourceSchema::new(ResourceKind::AutoScalingGroup)
        .with_description("An Auto Scaling group")
        .attribute(AttributeSchema::new("AutoScalingGroupName", AttributeType::String))
        .attribute(AttributeSchema::new("AvailabilityZones", strings()))
        .attribute(AttributeSchema::new("LaunchConfigurationName", AttributeType::String))
        .attribute(AttributeSchema::new("MinSize", capacity()).required())
        .attribute(AttributeSchema::new("MaxSize", capacity()).required())
        .attribute(AttributeSchema::new("DesiredCapacity", capacity()))
        .attribute(AttributeSchema::new(
            "NotificationConfigurations",
            AttributeType::List(Box::new(notification_configuration())),
        ))
        .attribute(AttributeSchema::new("VPCZoneIdentifier", strings()))
}

pub fn schemas() -> Vec<ResourceSchema> {
    vec![launch_configuration_schema(), auto_scaling_group_schema()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;
    use stackgen_core::Value;

    #[test]
    fn group_sizes_are_required() {
        let errors = auto_scaling_group_schema()
            .validate(&IndexMap::new())
            .unwrap_err();
        let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        assert!(messages.iter().any(|m| m.contains("MinSize")));
        assert!(messages.iter().any(|m| m.contains("MaxSize")));
    }

    #[test]
    fn numeric_group_size_is_rejected() {
        let mut props = IndexMap::new();
        props.insert("MinSize".to_string(), Value::Int(1));
        props.insert("MaxSize".to_string(), Value::from("1"));
        let errors = auto_scaling_group_schema().validate(&props).unwrap_err();
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn ebs_mapping_is_checked() {
        let mut props = IndexMap::new();
        props.insert("ImageId".to_string(), Value::from("ami-1"));
        props.insert("InstanceType".to_string(), Value::from("t2.micro"));
        props.insert(
            "BlockDeviceMappings".to_string(),
            Value::List(vec![Value::map([
                ("DeviceName", Value::from("/dev/sda1")),
                ("Ebs", Value::map([("DeleteOnTermination", true)])),
            ])]),
        );
        assert!(launch_configuration_schema().validate(&props).is_ok());

        props.insert(
            "BlockDeviceMappings".to_string(),
            Value::List(vec![Value::map([
                ("DeviceName", Value::from("/dev/sda1")),
                ("Ebs", Value::map([("DeleteOnTermination", "yes")])),
            ])]),
        );
        assert!(launch_configuration_schema().validate(&props).is_err());
    }
}
