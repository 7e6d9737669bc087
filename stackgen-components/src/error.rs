//! Errors raised while emitting components

use stackgen_core::{ContextError, RenderError, TemplateError};

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Invalid stack context: {0}")]
    Context(#[from] ContextError),

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("Template '{template}' did not render to a JSON document: {source}")]
    InvalidPolicy {
        template: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Stack context declares no VPC")]
    MissingVpc,

    #[error("Unknown component '{0}'")]
    UnknownComponent(String),
}
