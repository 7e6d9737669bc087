//! EC2 resource schema definitions

use stackgen_core::ResourceKind;
use stackgen_core::schema::{AttributeSchema, AttributeType, ResourceSchema, types};

use super::types::{port_number, protocol};

/// Ingress/egress rule embedded in a security group
fn security_group_rule() -> AttributeType {
    AttributeType::Struct {
        name: "SecurityGroupRule".to_string(),
        fields: vec![
            AttributeSchema::new("IpProtocol", protocol()).required(),
            AttributeSchema::new("CidrIp", types::cidr()),
            AttributeSchema::new("FromPort", port_number()),
            AttributeSchema::new("ToPort", port_number()),
            AttributeSchema::new("Description", AttributeType::String),
        ],
    }
}

/// Returns the schema for AWS::EC2::VPC
pub fn vpc_schema() -> ResourceSchema {
    ResourceSchema::new(ResourceKind::Vpc)
        .with_description("An AWS VPC (Virtual Private Cloud)")
        .attribute(
            AttributeSchema::new("CidrBlock", types::cidr())
                .required()
                .with_description("The IPv4 network range for the VPC, in CIDR notation"),
        )
        .attribute(AttributeSchema::new("EnableDnsHostnames", AttributeType::Bool))
        .attribute(AttributeSchema::new("EnableDnsSupport", AttributeType::Bool))
        .attribute(AttributeSchema::new(
            "InstanceTenancy",
            AttributeType::Enum(vec![
                "default".to_string(),
                "dedicated".to_string(),
                "host".to_string(),
            ]),
        ))
        .attribute(AttributeSchema::new("Tags", types::tags()))
}

/// Returns the schema for AWS::EC2::Subnet
pub fn subnet_schema() -> ResourceSchema {
    ResourceSchema::new(ResourceKind::Subnet)
        .with_description("An AWS VPC Subnet")
        .attribute(
            AttributeSchema::new("VpcId", AttributeType::String)
                .required()
                .with_description("VPC ID to create the subnet in"),
        )
        .attribute(
            AttributeSchema::new("CidrBlock", types::cidr())
                .required()
                .with_description("The IPv4 CIDR block for the subnet"),
        )
        .attribute(AttributeSchema::new("AvailabilityZone", AttributeType::String))
        .attribute(AttributeSchema::new("MapPublicIpOnLaunch", AttributeType::Bool))
        .attribute(AttributeSchema::new("Tags", types::tags()))
}

/// Returns the schema for AWS::EC2::SecurityGroup
pub fn security_group_schema() -> ResourceSchema {
    let rules = AttributeType::List(Box::new(security_group_rule()));
    ResourceSchema::new(ResourceKind::SecurityGroup)
        .with_description("An AWS VPC Security Group")
        .attribute(AttributeSchema::new("GroupDescription", AttributeType::String).required())
        .attribute(AttributeSchema::new("GroupName", AttributeType::String))
        .attribute(AttributeSchema::new("VpcId", AttributeType::String))
        .attribute(AttributeSchema::new("SecurityGroupIngress", rules.clone()))
        .attribute(AttributeSchema::new("SecurityGroupEgress", rules))
        .attribute(AttributeSchema::new("Tags", types::tags()))
}

pub fn schemas() -> Vec<ResourceSchema> {
    vec![vpc_schema(), subnet_schema(), security_group_schema()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;
    use stackgen_core::Value;

    fn ingress(protocol: &str, cidr: &str, port: i64) -> Value {
        Value::map([
            ("IpProtocol", Value::from(protocol)),
            ("CidrIp", Value::from(cidr)),
            ("FromPort", Value::Int(port)),
            ("ToPort", Value::Int(port)),
        ])
    }

    #[test]
    fn ssh_rule_is_valid() {
        let mut props = IndexMap::new();
        props.insert("GroupDescription".to_string(), Value::from("ssh"));
        props.insert(
            "SecurityGroupIngress".to_string(),
            Value::List(vec![ingress("tcp", "10.0.0.0/8", 22)]),
        );
        assert!(security_group_schema().validate(&props).is_ok());
    }

    #[test]
    fn rule_with_bad_cidr_or_protocol_is_rejected() {
        let mut props = IndexMap::new();
        props.insert("GroupDescription".to_string(), Value::from("ssh"));
        props.insert(
            "SecurityGroupIngress".to_string(),
            Value::List(vec![ingress("tcp", "10.0.0.0", 22)]),
        );
        assert!(security_group_schema().validate(&props).is_err());

        props.insert(
            "SecurityGroupIngress".to_string(),
            Value::List(vec![ingress("sctp", "10.0.0.0/8", 22)]),
        );
        assert!(security_group_schema().validate(&props).is_err());
    }

    #[test]
    fn subnet_requires_vpc_and_cidr() {
        let errors = subnet_schema().validate(&IndexMap::new()).unwrap_err();
        assert_eq!(errors.len(), 2);
    }
}
