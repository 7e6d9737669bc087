//! Base fragment - Parameters and mappings shared by every component

use stackgen_core::{Parameter, StackContext, Template};

use crate::error::BuildError;

/// Key pair parameter referenced by launch configurations
pub const KEY_NAME_PARAMETER: &str = "KeyName";

/// Region -> AMI family -> image ID lookup
pub const REGION_MAP: &str = "RegionMap";

pub fn emit(ctx: &StackContext, template: &mut Template) -> Result<(), BuildError> {
    template.add_parameter(
        KEY_NAME_PARAMETER,
        Parameter::new("AWS::EC2::KeyPair::KeyName")
            .with_default(&ctx.key_name)
            .with_description("Name of an existing EC2 key pair for SSH access"),
    )?;
    template.add_mapping(REGION_MAP, ctx.amis.clone())?;
    log::info!("Emitted base parameters and {} mapping", REGION_MAP);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::context;

    #[test]
    fn declares_key_name_and_region_map() {
        let ctx = context();
        let mut template = Template::new();
        emit(&ctx, &mut template).unwrap();

        let key_name = template.parameter(KEY_NAME_PARAMETER).unwrap();
        assert_eq!(key_name.param_type, "AWS::EC2::KeyPair::KeyName");
        assert_eq!(key_name.default.as_deref(), Some("ops"));

        let region_map = template.mapping(REGION_MAP).unwrap();
        assert_eq!(region_map["us-east-1"]["ebs"], "ami-0123");
        assert!(template.is_empty());
    }

    #[test]
    fn emitting_twice_fails() {
        let ctx = context();
        let mut template = Template::new();
        emit(&ctx, &mut template).unwrap();
        assert!(matches!(
            emit(&ctx, &mut template),
            Err(BuildError::Template(_))
        ));
    }
}
