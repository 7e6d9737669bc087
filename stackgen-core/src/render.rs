//! Render - Text templates for policy documents and boot scripts
//!
//! Rendering is injected into components through the `Renderer` trait so that
//! resource construction stays a pure function of its inputs.
//!
//! Templates use `{{ name }}` placeholders. A placeholder without a matching
//! parameter is an error rather than an empty substitution.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::{Captures, Regex};

/// Extension tried first when resolving a template ID to a file
pub const TEMPLATE_EXTENSION: &str = "j2";

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").expect("valid placeholder regex")
});

/// Errors raised while rendering a template
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("Template '{0}' not found")]
    NotFound(String),

    #[error("Template '{template}' uses undefined variable '{name}'")]
    UndefinedVariable { template: String, name: String },

    #[error("Failed to read template {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Named string parameters passed to a template
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderParams(IndexMap<String, String>);

impl RenderParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }
}

/// Capability to turn a template ID and parameters into text
pub trait Renderer {
    fn render(&self, template_id: &str, params: &RenderParams) -> Result<String, RenderError>;
}

/// Substitute every placeholder in `source`
pub fn render_str(
    template_id: &str,
    source: &str,
    params: &RenderParams,
) -> Result<String, RenderError> {
    if let Some(missing) = PLACEHOLDER
        .captures_iter(source)
        .map(|caps| caps[1].to_string())
        .find(|name| params.get(name).is_none())
    {
        return Err(RenderError::UndefinedVariable {
            template: template_id.to_string(),
            name: missing,
        });
    }

    let rendered = PLACEHOLDER.replace_all(source, |caps: &Captures<'_>| {
        params.get(&caps[1]).unwrap_or_default().to_string()
    });
    Ok(rendered.into_owned())
}

/// Renders templates stored as files in a directory
///
/// `babysitter_policy.json` resolves to `babysitter_policy.json.j2`, falling
/// back to `babysitter_policy.json` itself.
#[derive(Debug, Clone)]
pub struct FileRenderer {
    dir: PathBuf,
}

impl FileRenderer {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn resolve(&self, template_id: &str) -> Option<PathBuf> {
        let with_extension = self
            .dir
            .join(format!("{}.{}", template_id, TEMPLATE_EXTENSION));
        if with_extension.is_file() {
            return Some(with_extension);
        }
        let plain = self.dir.join(template_id);
        plain.is_file().then_some(plain)
    }
}

impl Renderer for FileRenderer {
    fn render(&self, template_id: &str, params: &RenderParams) -> Result<String, RenderError> {
        let path = self
            .resolve(template_id)
            .ok_or_else(|| RenderError::NotFound(template_id.to_string()))?;
        log::debug!("Rendering {} from {}", template_id, path.display());

        let source = std::fs::read_to_string(&path).map_err(|source| RenderError::Io {
            path: path.clone(),
            source,
        })?;
        render_str(template_id, &source, params)
    }
}

/// Renders templates held in memory
#[derive(Debug, Clone, Default)]
pub struct StaticRenderer {
    templates: HashMap<String, String>,
}

impl StaticRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_template(
        mut self,
        template_id: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        self.templates.insert(template_id.into(), source.into());
        self
    }
}

impl Renderer for StaticRenderer {
    fn render(&self, template_id: &str, params: &RenderParams) -> Result<String, RenderError> {
        let source = self
            .templates
            .get(template_id)
            .ok_or_else(|| RenderError::NotFound(template_id.to_string()))?;
        render_str(template_id, source, params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn params() -> RenderParams {
        RenderParams::new()
            .with("env", "prod")
            .with("cloud", "acme")
            .with("region", "us-east-1")
    }

    #[test]
    fn substitutes_placeholders_with_and_without_spaces() {
        let rendered = render_str(
            "policy",
            "arn:aws:sqs:{{ region }}:*:chef-deregistration_{{cloud}}_{{  env }}",
            &params(),
        )
        .unwrap();
        assert_eq!(rendered, "arn:aws:sqs:us-east-1:*:chef-deregistration_acme_prod");
    }

    #[test]
    fn repeated_renders_share_one_pattern() {
        let first = render_str("a", "{{ env }}", &params()).unwrap();
        let second = render_str("b", "{{ cloud }}-{{ region }}", &params()).unwrap();
        let plain = render_str("c", "no placeholders {}", &params()).unwrap();
        assert_eq!(first, "prod");
        assert_eq!(second, "acme-us-east-1");
        assert_eq!(plain, "no placeholders {}");
    }

    #[test]
    fn undefined_variable_is_an_error() {
        let result = render_str("init", "deploy={{ deploy }}", &params());
        match result {
            Err(RenderError::UndefinedVariable { template, name }) => {
                assert_eq!(template, "init");
                assert_eq!(name, "deploy");
            }
            other => panic!("Expected UndefinedVariable, got {:?}", other),
        }
    }

    #[test]
    fn file_renderer_prefers_j2_extension() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("init.bash.j2"), "env={{ env }}").unwrap();
        std::fs::write(dir.path().join("init.bash"), "plain").unwrap();
        std::fs::write(dir.path().join("other.sh"), "cloud={{ cloud }}").unwrap();

        let renderer = FileRenderer::new(dir.path());
        assert_eq!(renderer.render("init.bash", &params()).unwrap(), "env=prod");
        assert_eq!(renderer.render("other.sh", &params()).unwrap(), "cloud=acme");
    }

    #[test]
    fn file_renderer_missing_template_is_not_found() {
        let dir = tempdir().unwrap();
        let renderer = FileRenderer::new(dir.path());
        assert!(matches!(
            renderer.render("default_policy.json", &params()),
            Err(RenderError::NotFound(id)) if id == "default_policy.json"
        ));
    }

    #[test]
    fn static_renderer_renders_registered_templates() {
        let renderer = StaticRenderer::new().with_template("greeting", "hello {{ cloud }}");
        assert_eq!(renderer.render("greeting", &params()).unwrap(), "hello acme");
        assert!(matches!(
            renderer.render("missing", &params()),
            Err(RenderError::NotFound(_))
        ));
    }
}
