//! Context - Shared naming and environment inputs for every component
//!
//! A `StackContext` is immutable once validated. Components derive resource
//! names, render parameters, and the network layout from it.

use std::fmt;

use indexmap::IndexMap;
use serde::Deserialize;

use crate::naming::{join_name, sanitize_id};
use crate::render::RenderParams;
use crate::schema::validate_cidr;
use crate::template::TemplateError;

/// Subnets are numbered per tier, so each tier holds at most this many zones
pub const MAX_AVAILABILITY_ZONES: usize = 9;

/// Errors in the stack context
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ContextError {
    #[error("Context field '{0}' must not be empty")]
    EmptyField(&'static str),

    #[error("Invalid CIDR prefix '{0}': expected two octets like 10.20")]
    InvalidCidrPrefix(String),

    #[error("Invalid CIDR for '{field}': {message}")]
    InvalidCidr { field: &'static str, message: String },

    #[error("At least one availability zone is required")]
    NoAvailabilityZones,

    #[error(
        "At most {max} availability zones are supported, got {got}",
        max = MAX_AVAILABILITY_ZONES
    )]
    TooManyAvailabilityZones { got: usize },

    #[error("No {family} AMI configured for region {region}")]
    MissingAmi { region: String, family: AmiFamily },

    #[error(transparent)]
    Naming(#[from] TemplateError),
}

/// Machine image family used as the second key of the region map
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AmiFamily {
    #[default]
    Ebs,
    InstanceStore,
    Hvm,
}

impl AmiFamily {
    /// Key used in the `RegionMap` mapping
    pub fn key(&self) -> &'static str {
        match self {
            AmiFamily::Ebs => "ebs",
            AmiFamily::InstanceStore => "instance-store",
            AmiFamily::Hvm => "hvm",
        }
    }
}

impl fmt::Display for AmiFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// Subnet tier within a VPC
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubnetTier {
    Public,
    Platform,
}

impl SubnetTier {
    pub fn all() -> &'static [SubnetTier] {
        &[SubnetTier::Public, SubnetTier::Platform]
    }

    pub fn name(&self) -> &'static str {
        match self {
            SubnetTier::Public => "public",
            SubnetTier::Platform => "platform",
        }
    }

    /// Third-octet offset of this tier's subnets
    fn octet_offset(&self) -> usize {
        match self {
            SubnetTier::Public => 0,
            SubnetTier::Platform => 10,
        }
    }
}

/// Naming and environment inputs
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StackContext {
    pub cloud: String,
    pub env: String,
    pub region: String,
    /// First two octets of the VPC CIDR (e.g., "10.20")
    pub cidr_prefix: String,
    pub vpc_name: String,
    /// Default EC2 key pair name
    pub key_name: String,
    /// CIDR allowed to reach SSH on managed instances
    pub default_route: String,
    #[serde(default)]
    pub use_private_subnets: bool,
    pub availability_zones: Vec<String>,
    /// region -> AMI family key -> image ID
    #[serde(default)]
    pub amis: IndexMap<String, IndexMap<String, String>>,
    #[serde(default)]
    pub ami_family: AmiFamily,
    #[serde(default)]
    pub alarm_email: Option<String>,
    #[serde(default = "default_instance_type")]
    pub instance_type: String,
}

fn default_instance_type() -> String {
    "t2.micro".to_string()
}

impl StackContext {
    /// Check every field a component relies on
    pub fn validate(&self) -> Result<(), ContextError> {
        let required = [
            ("cloud", &self.cloud),
            ("env", &self.env),
            ("region", &self.region),
            ("vpc_name", &self.vpc_name),
            ("key_name", &self.key_name),
            ("instance_type", &self.instance_type),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(ContextError::EmptyField(field));
            }
        }

        let octets: Vec<&str> = self.cidr_prefix.split('.').collect();
        if octets.len() != 2 || octets.iter().any(|o| o.parse::<u8>().is_err()) {
            return Err(ContextError::InvalidCidrPrefix(self.cidr_prefix.clone()));
        }

        validate_cidr(&self.default_route).map_err(|message| ContextError::InvalidCidr {
            field: "default_route",
            message,
        })?;

        match self.availability_zones.len() {
            0 => return Err(ContextError::NoAvailabilityZones),
            n if n > MAX_AVAILABILITY_ZONES => {
                return Err(ContextError::TooManyAvailabilityZones { got: n });
            }
            _ => {}
        }

        self.ami_id()?;
        sanitize_id(&self.vpc_name)?;
        Ok(())
    }

    /// Image ID for the configured region and family
    pub fn ami_id(&self) -> Result<&str, ContextError> {
        self.amis
            .get(&self.region)
            .and_then(|families| families.get(self.ami_family.key()))
            .map(String::as_str)
            .ok_or_else(|| ContextError::MissingAmi {
                region: self.region.clone(),
                family: self.ami_family,
            })
    }

    /// `{prefix}{sep}{cloud}{sep}{env}`
    pub fn qualified(&self, prefix: &str, separator: char) -> String {
        join_name(prefix, &[&self.cloud, &self.env], separator)
    }

    /// Parameters shared by every rendered template
    pub fn render_params(&self) -> RenderParams {
        RenderParams::new()
            .with("env", &self.env)
            .with("cloud", &self.cloud)
            .with("region", &self.region)
    }

    /// VPCs owned by this stack, derived from the CIDR prefix and zones
    pub fn vpcs(&self) -> Result<Vec<Vpc>, ContextError> {
        let vpc_id = sanitize_id(&self.vpc_name)?;
        let mut subnets = Vec::new();
        for tier in SubnetTier::all() {
            for (index, zone) in self.availability_zones.iter().enumerate() {
                let logical_id = sanitize_id(&format!("{} {} {}", vpc_id, tier.name(), zone))?;
                subnets.push(Subnet {
                    logical_id,
                    tier: *tier,
                    availability_zone: zone.clone(),
                    cidr_block: format!(
                        "{}.{}.0/24",
                        self.cidr_prefix,
                        tier.octet_offset() + index + 1
                    ),
                });
            }
        }

        Ok(vec![Vpc {
            logical_id: vpc_id,
            name: self.vpc_name.clone(),
            cidr_block: format!("{}.0.0/16", self.cidr_prefix),
            subnets,
        }])
    }
}

/// VPC declared by the network fragment
#[derive(Debug, Clone, PartialEq)]
pub struct Vpc {
    pub logical_id: String,
    pub name: String,
    pub cidr_block: String,
    pub subnets: Vec<Subnet>,
}

impl Vpc {
    /// Subnets of one tier, in availability zone order
    pub fn subnets(&self, tier: SubnetTier) -> impl Iterator<Item = &Subnet> {
        self.subnets.iter().filter(move |s| s.tier == tier)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Subnet {
    pub logical_id: String,
    pub tier: SubnetTier,
    pub availability_zone: String,
    pub cidr_block: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> StackContext {
        StackContext {
            cloud: "acme".to_string(),
            env: "prod".to_string(),
            region: "us-east-1".to_string(),
            cidr_prefix: "10.20".to_string(),
            vpc_name: "acme-prod".to_string(),
            key_name: "ops".to_string(),
            default_route: "10.0.0.0/8".to_string(),
            use_private_subnets: true,
            availability_zones: vec!["us-east-1a".to_string(), "us-east-1b".to_string()],
            amis: IndexMap::from([(
                "us-east-1".to_string(),
                IndexMap::from([("ebs".to_string(), "ami-0123".to_string())]),
            )]),
            ami_family: AmiFamily::Ebs,
            alarm_email: None,
            instance_type: "t2.micro".to_string(),
        }
    }

    #[test]
    fn valid_context_passes() {
        assert_eq!(context().validate(), Ok(()));
        assert_eq!(context().ami_id().unwrap(), "ami-0123");
    }

    #[test]
    fn empty_fields_are_rejected() {
        let mut ctx = context();
        ctx.env = " ".to_string();
        assert_eq!(ctx.validate(), Err(ContextError::EmptyField("env")));
    }

    #[test]
    fn malformed_cidrs_are_rejected() {
        let mut ctx = context();
        ctx.cidr_prefix = "10.20.0".to_string();
        assert!(matches!(
            ctx.validate(),
            Err(ContextError::InvalidCidrPrefix(_))
        ));

        let mut ctx = context();
        ctx.default_route = "10.0.0.0".to_string();
        assert!(matches!(
            ctx.validate(),
            Err(ContextError::InvalidCidr {
                field: "default_route",
                ..
            })
        ));
    }

    #[test]
    fn availability_zone_count_is_bounded() {
        let mut ctx = context();
        ctx.availability_zones.clear();
        assert_eq!(ctx.validate(), Err(ContextError::NoAvailabilityZones));

        ctx.availability_zones = (0..10).map(|i| format!("zone-{}", i)).collect();
        assert_eq!(
            ctx.validate(),
            Err(ContextError::TooManyAvailabilityZones { got: 10 })
        );
    }

    #[test]
    fn missing_ami_for_region_is_rejected() {
        let mut ctx = context();
        ctx.region = "eu-west-1".to_string();
        assert_eq!(
            ctx.validate(),
            Err(ContextError::MissingAmi {
                region: "eu-west-1".to_string(),
                family: AmiFamily::Ebs,
            })
        );
    }

    #[test]
    fn qualified_names() {
        let ctx = context();
        assert_eq!(ctx.qualified("babysitter", '.'), "babysitter.acme.prod");
        assert_eq!(
            ctx.qualified("chef-deregistration", '_'),
            "chef-deregistration_acme_prod"
        );
    }

    #[test]
    fn vpc_layout_is_derived_from_prefix_and_zones() {
        let vpcs = context().vpcs().unwrap();
        assert_eq!(vpcs.len(), 1);
        let vpc = &vpcs[0];
        assert_eq!(vpc.logical_id, "AcmeProd");
        assert_eq!(vpc.cidr_block, "10.20.0.0/16");

        let platform: Vec<(&str, &str)> = vpc
            .subnets(SubnetTier::Platform)
            .map(|s| (s.logical_id.as_str(), s.cidr_block.as_str()))
            .collect();
        assert_eq!(
            platform,
            vec![
                ("AcmeProdPlatformUsEast1a", "10.20.11.0/24"),
                ("AcmeProdPlatformUsEast1b", "10.20.12.0/24"),
            ]
        );
        assert_eq!(vpc.subnets(SubnetTier::Public).count(), 2);
    }

    #[test]
    fn render_params_carry_env_cloud_region() {
        let params = context().render_params();
        assert_eq!(params.get("env"), Some("prod"));
        assert_eq!(params.get("cloud"), Some("acme"));
        assert_eq!(params.get("region"), Some("us-east-1"));
    }
}
