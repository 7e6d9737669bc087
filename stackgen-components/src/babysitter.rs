//! Babysitter - Chef deregistration queue with an alarmed single-instance worker
//!
//! Emits, in order: the deregistration queue, its alarm topic, a queue-depth
//! alarm, the instance IAM role and profile, an SSH-only security group, the
//! launch configuration, and a fixed-size auto-scaling group that notifies
//! the topic when its instance terminates.

use stackgen_core::naming::sanitize_id;
use stackgen_core::{
    Parameter, RenderParams, Renderer, Resource, ResourceKind, StackContext, SubnetTier, Template,
    Value,
};
use stackgen_provider_aws::schemas::autoscaling::EC2_INSTANCE_TERMINATE;
use stackgen_provider_aws::schemas::types::usable_instances;

use crate::base::{KEY_NAME_PARAMETER, REGION_MAP};
use crate::error::BuildError;

pub const INSTANCE_TYPE_PARAMETER: &str = "BabysitterInstanceType";
pub const ALARM_EMAIL_PARAMETER: &str = "BabysitterAlarmEmail";

pub const TOPIC_ID: &str = "BabysitterAlarmTopic";
pub const ALARM_ID: &str = "BabysitterQueueDepthAlarm";
pub const ROLE_ID: &str = "BabysitterIamRole";
pub const INSTANCE_PROFILE_ID: &str = "BabysitterInstanceProfile";
pub const SECURITY_GROUP_ID: &str = "BabysitterSecurityGroup";
pub const LAUNCH_CONFIG_ID: &str = "BabysitterLaunchConfiguration";
pub const ASG_ID: &str = "BabysitterASG";

pub const POLICY_TEMPLATE: &str = "babysitter_policy.json";
pub const DEFAULT_POLICY_TEMPLATE: &str = "default_policy.json";
pub const USER_DATA_TEMPLATE: &str = "default-init.bash";

/// 14 days
pub const QUEUE_RETENTION_SECONDS: i64 = 1_209_600;
pub const QUEUE_VISIBILITY_TIMEOUT_SECONDS: i64 = 60;
/// 16 KiB
pub const QUEUE_MAX_MESSAGE_BYTES: i64 = 16_384;

pub const ALARM_THRESHOLD_MESSAGES: i64 = 200;
pub const ALARM_PERIOD_SECONDS: i64 = 300;

const SSH_PORTS: &[i64] = &[22];
const GROUP_SIZE: &str = "1";
const ROOT_DEVICE: &str = "/dev/sda1";

/// Deterministic name of a babysitter resource
pub fn resource_name(ctx: &StackContext, kind: ResourceKind) -> String {
    match kind {
        ResourceKind::Queue | ResourceKind::Topic | ResourceKind::Alarm => {
            ctx.qualified("chef-deregistration", '_')
        }
        ResourceKind::SecurityGroup => ctx.qualified("babysitter-sg", '.'),
        _ => ctx.qualified("babysitter", '.'),
    }
}

/// Trust policy letting EC2 instances assume the role
fn assume_role_policy() -> Value {
    Value::map([
        ("Version", Value::from("2012-10-17")),
        (
            "Statement",
            Value::List(vec![Value::map([
                ("Effect", Value::from("Allow")),
                (
                    "Principal",
                    Value::map([(
                        "Service",
                        Value::List(vec![Value::from("ec2.amazonaws.com")]),
                    )]),
                ),
                ("Action", Value::List(vec![Value::from("sts:AssumeRole")])),
            ])]),
        ),
    ])
}

fn render_policy(
    renderer: &dyn Renderer,
    template_id: &str,
    policy_name: &str,
    params: &RenderParams,
) -> Result<Value, BuildError> {
    let text = renderer.render(template_id, params)?;
    let document: serde_json::Value =
        serde_json::from_str(&text).map_err(|source| BuildError::InvalidPolicy {
            template: template_id.to_string(),
            source,
        })?;
    Ok(Value::map([
        ("PolicyName", Value::from(policy_name)),
        ("PolicyDocument", Value::from(document)),
    ]))
}

/// Append the babysitter resources to `template`
///
/// Requires the base and network fragments to be declared already. Either all
/// parameters and resources are added or, on error, the template is left
/// untouched.
pub fn build(
    ctx: &StackContext,
    template: &mut Template,
    renderer: &dyn Renderer,
) -> Result<(), BuildError> {
    ctx.validate()?;
    let mut staged = template.clone();
    emit_resources(ctx, &mut staged, renderer)?;
    *template = staged;
    log::info!("Emitted babysitter for {}", ctx.qualified("babysitter", '.'));
    Ok(())
}

fn emit_resources(
    ctx: &StackContext,
    template: &mut Template,
    renderer: &dyn Renderer,
) -> Result<(), BuildError> {
    let vpc = ctx.vpcs()?.into_iter().next().ok_or(BuildError::MissingVpc)?;
    let key_name = template.parameter_ref(KEY_NAME_PARAMETER)?;

    let instance_type = template.add_parameter(
        INSTANCE_TYPE_PARAMETER,
        Parameter::new("String")
            .with_default(&ctx.instance_type)
            .with_description("Chef babysitter instance type")
            .with_allowed_values(usable_instances())
            .with_constraint_description("Instance size must be a valid instance type"),
    )?;

    let mut email = Parameter::new("String")
        .with_description("Email address to notify if there are issues in the babysitter queue");
    if let Some(address) = &ctx.alarm_email {
        email = email.with_default(address);
    }
    let email = template.add_parameter(ALARM_EMAIL_PARAMETER, email)?;

    // Queue
    let queue_name = resource_name(ctx, ResourceKind::Queue);
    let queue_id = sanitize_id(&queue_name)?;
    template.add_resource(
        Resource::new(ResourceKind::Queue, &queue_id)
            .with_property("VisibilityTimeout", QUEUE_VISIBILITY_TIMEOUT_SECONDS)
            .with_property("MessageRetentionPeriod", QUEUE_RETENTION_SECONDS)
            .with_property("MaximumMessageSize", QUEUE_MAX_MESSAGE_BYTES)
            .with_property("QueueName", &queue_name),
    )?;

    // Alarm topic
    let topic = template.add_resource(
        Resource::new(ResourceKind::Topic, TOPIC_ID)
            .depends_on(&queue_id)
            .with_property("DisplayName", "Babysitter Alarm")
            .with_property("TopicName", resource_name(ctx, ResourceKind::Topic))
            .with_property(
                "Subscription",
                vec![Value::map([
                    ("Endpoint", email),
                    ("Protocol", Value::from("email")),
                ])],
            ),
    )?;

    // Queue depth alarm
    template.add_resource(
        Resource::new(ResourceKind::Alarm, ALARM_ID)
            .depends_on(TOPIC_ID)
            .with_property(
                "AlarmDescription",
                format!(
                    "Alarm if the queue depth grows beyond {} messages",
                    ALARM_THRESHOLD_MESSAGES
                ),
            )
            .with_property("Namespace", "AWS/SQS")
            .with_property("MetricName", "ApproximateNumberOfMessagesVisible")
            .with_property(
                "Dimensions",
                vec![Value::map([
                    ("Name", Value::from("QueueName")),
                    ("Value", Value::get_att(&queue_id, "QueueName")),
                ])],
            )
            .with_property("Statistic", "Sum")
            .with_property("Period", ALARM_PERIOD_SECONDS)
            .with_property("EvaluationPeriods", 1i64)
            .with_property("Threshold", ALARM_THRESHOLD_MESSAGES)
            .with_property("ComparisonOperator", "GreaterThanThreshold")
            .with_property("AlarmActions", vec![topic.clone()])
            .with_property("InsufficientDataActions", vec![topic.clone()]),
    )?;

    // IAM role and instance profile
    let params = ctx.render_params();
    let role = template.add_resource(
        Resource::new(ResourceKind::Role, ROLE_ID)
            .depends_on(&vpc.logical_id)
            .with_property("AssumeRolePolicyDocument", assume_role_policy())
            .with_property("Path", "/")
            .with_property("RoleName", resource_name(ctx, ResourceKind::Role))
            .with_property(
                "Policies",
                vec![
                    render_policy(renderer, POLICY_TEMPLATE, "BabySitterPolicy", &params)?,
                    render_policy(
                        renderer,
                        DEFAULT_POLICY_TEMPLATE,
                        "BabySitterDefaultPolicy",
                        &params,
                    )?,
                ],
            ),
    )?;

    let instance_profile = template.add_resource(
        Resource::new(ResourceKind::InstanceProfile, INSTANCE_PROFILE_ID)
            .depends_on(ROLE_ID)
            .with_property("Path", "/")
            .with_property("Roles", vec![role]),
    )?;

    // SSH-only security group
    let ingress_rules: Vec<Value> = SSH_PORTS
        .iter()
        .map(|port| {
            Value::map([
                ("IpProtocol", Value::from("tcp")),
                ("CidrIp", Value::from(&ctx.default_route)),
                ("FromPort", Value::Int(*port)),
                ("ToPort", Value::Int(*port)),
            ])
        })
        .collect();

    let security_group = template.add_resource(
        Resource::new(ResourceKind::SecurityGroup, SECURITY_GROUP_ID)
            .depends_on(&vpc.logical_id)
            .with_property("GroupDescription", "Security Group for babysitter instances")
            .with_property("VpcId", Value::reference(&vpc.logical_id))
            .with_property("SecurityGroupIngress", ingress_rules)
            .with_property(
                "Tags",
                vec![Value::map([
                    ("Key", Value::from("Name")),
                    (
                        "Value",
                        Value::from(resource_name(ctx, ResourceKind::SecurityGroup)),
                    ),
                ])],
            ),
    )?;

    // Launch configuration
    let user_data = renderer.render(
        USER_DATA_TEMPLATE,
        &RenderParams::new()
            .with("env", &ctx.env)
            .with("cloud", &ctx.cloud)
            .with("deploy", "babysitter"),
    )?;

    let launch_config = template.add_resource(
        Resource::new(ResourceKind::LaunchConfig, LAUNCH_CONFIG_ID)
            .depends_on(INSTANCE_PROFILE_ID)
            .depends_on(SECURITY_GROUP_ID)
            .with_property(
                "ImageId",
                Value::find_in_map(
                    REGION_MAP,
                    Value::reference("AWS::Region"),
                    Value::from(ctx.ami_family.key()),
                ),
            )
            .with_property("InstanceType", instance_type)
            .with_property("IamInstanceProfile", instance_profile)
            .with_property("AssociatePublicIpAddress", !ctx.use_private_subnets)
            .with_property(
                "BlockDeviceMappings",
                vec![Value::map([
                    ("DeviceName", Value::from(ROOT_DEVICE)),
                    ("Ebs", Value::map([("DeleteOnTermination", true)])),
                ])],
            )
            .with_property("KeyName", key_name)
            .with_property("SecurityGroups", vec![security_group])
            .with_property("UserData", Value::base64(user_data)),
    )?;

    // Auto scaling group
    let availability_zones: Vec<Value> = ctx
        .availability_zones
        .iter()
        .map(Value::from)
        .collect();
    let subnets: Vec<Value> = vpc
        .subnets(SubnetTier::Platform)
        .map(|subnet| Value::reference(&subnet.logical_id))
        .collect();

    template.add_resource(
        Resource::new(ResourceKind::AutoScalingGroup, ASG_ID)
            .depends_on(LAUNCH_CONFIG_ID)
            .with_property(
                "AutoScalingGroupName",
                resource_name(ctx, ResourceKind::AutoScalingGroup),
            )
            .with_property("AvailabilityZones", availability_zones)
            .with_property("DesiredCapacity", GROUP_SIZE)
            .with_property("LaunchConfigurationName", launch_config)
            .with_property("MinSize", GROUP_SIZE)
            .with_property("MaxSize", GROUP_SIZE)
            .with_property(
                "NotificationConfigurations",
                vec![Value::map([
                    ("TopicARN", topic),
                    (
                        "NotificationTypes",
                        Value::List(vec![Value::from(EC2_INSTANCE_TERMINATE)]),
                    ),
                ])],
            )
            .with_property("VPCZoneIdentifier", subnets),
    )?;

    Ok(())
}
