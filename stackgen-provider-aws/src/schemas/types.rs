//! AWS-specific type definitions

use stackgen_core::Value;
use stackgen_core::schema::AttributeType;

/// Valid AWS regions
pub const VALID_REGIONS: &[&str] = &[
    "ap-northeast-1",
    "ap-northeast-2",
    "ap-northeast-3",
    "ap-southeast-1",
    "ap-southeast-2",
    "ap-south-1",
    "us-east-1",
    "us-east-2",
    "us-west-1",
    "us-west-2",
    "eu-west-1",
    "eu-west-2",
    "eu-west-3",
    "eu-central-1",
    "eu-north-1",
    "ca-central-1",
    "sa-east-1",
];

/// Instance types offered as allowed values of instance-type parameters
const USABLE_INSTANCES: &[&str] = &[
    "t2.nano",
    "t2.micro",
    "t2.small",
    "t2.medium",
    "t2.large",
    "t3.micro",
    "t3.small",
    "t3.medium",
    "t3.large",
    "m4.large",
    "m4.xlarge",
    "m4.2xlarge",
    "m5.large",
    "m5.xlarge",
    "m5.2xlarge",
    "c4.large",
    "c4.xlarge",
    "c5.large",
    "c5.xlarge",
    "r4.large",
    "r4.xlarge",
    "r5.large",
    "r5.xlarge",
];

/// Instance types a stack may launch
pub fn usable_instances() -> Vec<String> {
    USABLE_INSTANCES.iter().map(|s| s.to_string()).collect()
}

pub fn is_valid_region(region: &str) -> bool {
    VALID_REGIONS.contains(&region)
}

/// AWS region type with custom validation
pub fn aws_region() -> AttributeType {
    AttributeType::Custom {
        name: "Region".to_string(),
        base: Box::new(AttributeType::String),
        validate: |value| match value {
            Value::String(s) if is_valid_region(s) => Ok(()),
            Value::String(s) => Err(format!(
                "Invalid region '{}', expected one of: {}",
                s,
                VALID_REGIONS.join(", ")
            )),
            _ => Err("Expected string".to_string()),
        },
    }
}

/// Instance type restricted to the usable list
pub fn instance_type() -> AttributeType {
    AttributeType::Custom {
        name: "InstanceType".to_string(),
        base: Box::new(AttributeType::String),
        validate: |value| match value {
            Value::String(s) if USABLE_INSTANCES.contains(&s.as_str()) => Ok(()),
            Value::String(s) => Err(format!("Unsupported instance type '{}'", s)),
            _ => Err("Expected string".to_string()),
        },
    }
}

/// Port number type (with validation)
pub fn port_number() -> AttributeType {
    AttributeType::Custom {
        name: "PortNumber".to_string(),
        base: Box::new(AttributeType::Int),
        validate: |value| {
            if let Value::Int(n) = value {
                if *n >= -1 && *n <= 65535 {
                    Ok(())
                } else {
                    Err("Port number must be between -1 and 65535".to_string())
                }
            } else {
                Err("Expected integer".to_string())
            }
        },
    }
}

/// Protocol type for security group rules
pub fn protocol() -> AttributeType {
    AttributeType::Enum(vec![
        "tcp".to_string(),
        "udp".to_string(),
        "icmp".to_string(),
        "-1".to_string(), // All traffic
    ])
}

/// Capacity count encoded as a string (AutoScaling sizes)
pub fn capacity() -> AttributeType {
    AttributeType::Custom {
        name: "Capacity".to_string(),
        base: Box::new(AttributeType::String),
        validate: |value| match value {
            Value::String(s) if s.parse::<u32>().is_ok() => Ok(()),
            Value::String(s) => Err(format!("Capacity '{}' must be a non-negative integer", s)),
            _ => Err("Expected string".to_string()),
        },
    }
}

/// Check an integer lies in an inclusive range
pub(crate) fn check_range(value: &Value, min: i64, max: i64, what: &str) -> Result<(), String> {
    match value {
        Value::Int(n) if (min..=max).contains(n) => Ok(()),
        Value::Int(n) => Err(format!(
            "{} must be between {} and {}, got {}",
            what, min, max, n
        )),
        _ => Err("Expected integer".to_string()),
    }
}

/// Check a string's length and allowed characters
pub(crate) fn check_name(
    value: &Value,
    max_len: usize,
    allowed: fn(char) -> bool,
    what: &str,
) -> Result<(), String> {
    match value {
        Value::String(s) if s.is_empty() || s.len() > max_len => Err(format!(
            "{} must be between 1 and {} characters, got {}",
            what,
            max_len,
            s.len()
        )),
        Value::String(s) => match s.chars().find(|c| !allowed(*c)) {
            Some(c) => Err(format!("{} '{}' contains invalid character '{}'", what, s, c)),
            None => Ok(()),
        },
        _ => Err("Expected string".to_string()),
    }
}
