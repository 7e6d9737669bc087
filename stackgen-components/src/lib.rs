//! Stackgen Components
//!
//! Stack fragments that append resources to a shared template. The base and
//! network fragments are always emitted first; other components refer to the
//! parameters, mappings, and VPCs they declare.

pub mod babysitter;
pub mod base;
pub mod error;
pub mod network;

pub use error::BuildError;

use stackgen_core::{Renderer, StackContext, Template};

/// A named fragment of a stack
pub trait Component {
    /// Name used to select the component in configuration
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// Append this component's declarations to `template`
    fn emit(
        &self,
        ctx: &StackContext,
        template: &mut Template,
        renderer: &dyn Renderer,
    ) -> Result<(), BuildError>;
}

pub struct Base;

impl Component for Base {
    fn name(&self) -> &'static str {
        "base"
    }

    fn description(&self) -> &'static str {
        "Key pair parameter and region AMI mapping"
    }

    fn emit(
        &self,
        ctx: &StackContext,
        template: &mut Template,
        _renderer: &dyn Renderer,
    ) -> Result<(), BuildError> {
        base::emit(ctx, template)
    }
}

pub struct Network;

impl Component for Network {
    fn name(&self) -> &'static str {
        "network"
    }

    fn description(&self) -> &'static str {
        "VPC with public and platform subnets per availability zone"
    }

    fn emit(
        &self,
        ctx: &StackContext,
        template: &mut Template,
        _renderer: &dyn Renderer,
    ) -> Result<(), BuildError> {
        network::emit(ctx, template)
    }
}

pub struct Babysitter;

impl Component for Babysitter {
    fn name(&self) -> &'static str {
        "babysitter"
    }

    fn description(&self) -> &'static str {
        "Chef deregistration queue, alarm, and single-instance worker group"
    }

    fn emit(
        &self,
        ctx: &StackContext,
        template: &mut Template,
        renderer: &dyn Renderer,
    ) -> Result<(), BuildError> {
        babysitter::build(ctx, template, renderer)
    }
}

/// Every known component, base and network first
pub fn registry() -> Vec<Box<dyn Component>> {
    vec![Box::new(Base), Box::new(Network), Box::new(Babysitter)]
}

pub fn find_component(name: &str) -> Option<Box<dyn Component>> {
    registry().into_iter().find(|c| c.name() == name)
}

/// Build a complete template from the named components
///
/// Base and network are always emitted first, whether or not they are named.
/// Each other component is emitted once, in the order given.
pub fn assemble(
    ctx: &StackContext,
    renderer: &dyn Renderer,
    names: &[String],
) -> Result<Template, BuildError> {
    ctx.validate()?;

    let mut selected: Vec<Box<dyn Component>> = vec![Box::new(Base), Box::new(Network)];
    for name in names {
        if selected.iter().any(|c| c.name() == name) {
            log::debug!("Component {} already selected", name);
            continue;
        }
        let component =
            find_component(name).ok_or_else(|| BuildError::UnknownComponent(name.clone()))?;
        selected.push(component);
    }

    let mut template = Template::new().with_description(format!(
        "{} stack for {}",
        ctx.env,
        ctx.qualified("stackgen", '.')
    ));
    for component in &selected {
        log::info!("Emitting component {}", component.name());
        component.emit(ctx, &mut template, renderer)?;
    }
    Ok(template)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use indexmap::IndexMap;
    use stackgen_core::{AmiFamily, ResourceKind, StaticRenderer};

    pub fn context() -> StackContext {
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

    pub fn renderer() -> StaticRenderer {
        StaticRenderer::new()
            .with_template(
                babysitter::POLICY_TEMPLATE,
                r#"{
  "Version": "2012-10-17",
  "Statement": [
    {
      "Effect": "Allow",
      "Action": ["sqs:ReceiveMessage", "sqs:DeleteMessage"],
      "Resource": "arn:aws:sqs:{{ region }}:*:chef-deregistration_{{ cloud }}_{{ env }}"
    }
  ]
}"#,
            )
            .with_template(
                babysitter::DEFAULT_POLICY_TEMPLATE,
                r#"{
  "Version": "2012-10-17",
  "Statement": [
    {"Effect": "Allow", "Action": ["ec2:DescribeTags"], "Resource": "*"}
  ]
}"#,
            )
            .with_template(
                babysitter::USER_DATA_TEMPLATE,
                "#!/bin/bash\nDEPLOY={{ deploy }} ENV={{ env }} CLOUD={{ cloud }}\n",
            )
    }

    /// Template with the base and network fragments declared
    pub fn prepared_template(ctx: &StackContext) -> Template {
        let mut template = Template::new();
        base::emit(ctx, &mut template).unwrap();
        network::emit(ctx, &mut template).unwrap();
        template
    }

    #[test]
    fn registry_lists_base_and_network_first() {
        let names: Vec<&str> = registry().iter().map(|c| c.name()).collect();
        assert_eq!(names, vec!["base", "network", "babysitter"]);
        assert!(find_component("babysitter").is_some());
        assert!(find_component("bastion").is_none());
    }

    #[test]
    fn assembles_babysitter_stack() {
        let template = assemble(&context(), &renderer(), &["babysitter".to_string()]).unwrap();
        let first = template.resources().next().unwrap();
        assert_eq!(first.kind(), ResourceKind::Vpc);
        assert!(template.resource(babysitter::ASG_ID).is_some());
        assert!(template.parameter(base::KEY_NAME_PARAMETER).is_some());
        assert_eq!(stackgen_provider_aws::validate_template(&template), Ok(()));
    }

    #[test]
    fn explicit_base_and_duplicates_are_emitted_once() {
        let names = ["network", "babysitter", "base", "babysitter"].map(String::from);
        let template = assemble(&context(), &renderer(), &names).unwrap();
        let expected = assemble(&context(), &renderer(), &["babysitter".to_string()]).unwrap();
        assert_eq!(template, expected);
    }

    #[test]
    fn unknown_component_is_rejected() {
        let result = assemble(&context(), &renderer(), &["bastion".to_string()]);
        assert!(matches!(result, Err(BuildError::UnknownComponent(ref n)) if n == "bastion"));
    }

    #[test]
    fn assembled_json_uses_cfn_layout() {
        let template = assemble(&context(), &renderer(), &["babysitter".to_string()]).unwrap();
        let json = template.to_json().unwrap();
        assert_eq!(json["AWSTemplateFormatVersion"], "2010-09-09");
        assert_eq!(
            json["Resources"]["BabysitterASG"]["Type"],
            "AWS::AutoScaling::AutoScalingGroup"
        );
        assert_eq!(
            json["Resources"]["BabysitterLaunchConfiguration"]["DependsOn"],
            serde_json::json!(["BabysitterInstanceProfile", "BabysitterSecurityGroup"])
        );
        assert_eq!(
            json["Resources"]["BabysitterLaunchConfiguration"]["Properties"]["UserData"],
            serde_json::json!({
                "Fn::Base64": "#!/bin/bash\nDEPLOY=babysitter ENV=prod CLOUD=acme\n"
            })
        );
    }
}
