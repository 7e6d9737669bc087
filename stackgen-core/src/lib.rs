//! Stackgen Core
//!
//! Core library for composing CloudFormation stack fragments out of typed
//! resource descriptors

pub mod context;
pub mod naming;
pub mod render;
pub mod resource;
pub mod schema;
pub mod template;

pub use context::{AmiFamily, ContextError, StackContext, Subnet, SubnetTier, Vpc};
pub use render::{FileRenderer, RenderError, RenderParams, Renderer, StaticRenderer};
pub use resource::{Resource, ResourceId, ResourceKind, Value};
pub use template::{Mapping, Output, Parameter, Template, TemplateError};
