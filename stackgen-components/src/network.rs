//! Network fragment - VPC and tiered subnets other components attach to

use stackgen_core::{Output, Resource, ResourceKind, StackContext, SubnetTier, Template, Value};

use crate::error::BuildError;

fn name_tag(name: &str) -> Value {
    Value::List(vec![Value::map([("Key", "Name"), ("Value", name)])])
}

/// Declare every VPC of the context together with its subnets
pub fn emit(ctx: &StackContext, template: &mut Template) -> Result<(), BuildError> {
    for vpc in ctx.vpcs()? {
        let vpc_ref = template.add_resource(
            Resource::new(ResourceKind::Vpc, &vpc.logical_id)
                .with_property("CidrBlock", &vpc.cidr_block)
                .with_property("EnableDnsSupport", true)
                .with_property("EnableDnsHostnames", true)
                .with_property("Tags", name_tag(&vpc.name)),
        )?;

        for subnet in &vpc.subnets {
            let name = format!(
                "{}-{}-{}",
                vpc.name,
                subnet.tier.name(),
                subnet.availability_zone
            );
            template.add_resource(
                Resource::new(ResourceKind::Subnet, &subnet.logical_id)
                    .with_property("VpcId", vpc_ref.clone())
                    .with_property("CidrBlock", &subnet.cidr_block)
                    .with_property("AvailabilityZone", &subnet.availability_zone)
                    .with_property("MapPublicIpOnLaunch", subnet.tier == SubnetTier::Public)
                    .with_property("Tags", name_tag(&name)),
            )?;
        }

        template.add_output(
            format!("{}Id", vpc.logical_id),
            Output {
                description: Some(format!("ID of the {} VPC", vpc.name)),
                value: vpc_ref,
            },
        )?;
        log::info!(
            "Emitted VPC {} with {} subnets",
            vpc.logical_id,
            vpc.subnets.len()
        );
    }
    Ok(())
}
