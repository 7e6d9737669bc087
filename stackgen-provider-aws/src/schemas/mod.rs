//! AWS resource schema definitions

pub mod autoscaling;
pub mod cloudwatch;
pub mod ec2;
pub mod iam;
pub mod sns;
pub mod sqs;
pub mod types;

use stackgen_core::schema::ResourceSchema;

/// Returns all AWS schemas
pub fn all_schemas() -> Vec<ResourceSchema> {
    let mut schemas = Vec::new();
    schemas.extend(sqs::schemas());
    schemas.extend(sns::schemas());
    schemas.extend(cloudwatch::schemas());
    schemas.extend(iam::schemas());
    schemas.extend(ec2::schemas());
    schemas.extend(autoscaling::schemas());
    schemas
}
