//! Template file rendering.

use std::fs;
use std::path::Path;

use handlebars::{handlebars_helper, no_escape, Handlebars};
use tracing::trace;

use crate::config::ResolvedConfiguration;
use crate::error::{TemplateError, TemplateResult};

/// Renders template source text against a resolved configuration.
///
/// An empty `Ok` string is a legitimately empty output, not a failure.
#[cfg_attr(test, mockall::automock)]
pub trait Renderer {
    /// Render `source`; `name` identifies the template in error messages.
    fn render(&self, name: &str, source: &str, data: &ResolvedConfiguration) -> TemplateResult<String>;

    /// Read and render a template file.
    fn render_file(&self, path: &Path, data: &ResolvedConfiguration) -> TemplateResult<String> {
        trace!("Rendering {:?}", path);
        let source = fs::read_to_string(path).map_err(|e| TemplateError::render(path, e))?;
        self.render(&path.to_string_lossy(), &source, data)
    }
}

handlebars_helper!(to_class_name_helper: |name: str| to_class_name(name));

/// Handlebars-backed renderer.
///
/// Output is plain text, so HTML escaping is disabled. Registered helpers:
///
/// - `toClassName`: `{{toClassName item_name}}` turns `my_widget-type` into
///   `My_widget-Type`
pub struct HandlebarsRenderer {
    registry: Handlebars<'static>,
}

impl Default for HandlebarsRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl HandlebarsRenderer {
    /// Create a renderer with the standard helpers registered.
    pub fn new() -> Self {
        let mut registry = Handlebars::new();
        registry.register_escape_fn(no_escape);
        registry.register_helper("toClassName", Box::new(to_class_name_helper));
        Self { registry }
    }

    /// Access the underlying registry to add helpers.
    pub fn registry_mut(&mut self) -> &mut Handlebars<'static> {
        &mut self.registry
    }
}

impl Renderer for HandlebarsRenderer {
    fn render(&self, name: &str, source: &str, data: &ResolvedConfiguration) -> TemplateResult<String> {
        self.registry
            .render_template(source, data)
            .map_err(|e| TemplateError::render(name, e))
    }
}

/// Lowercase the input, then uppercase the first letter of every word.
///
/// Letters, digits and underscores continue a word; anything else ends it.
pub fn to_class_name(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut at_word_start = true;
    for c in input.chars().flat_map(char::to_lowercase) {
        if at_word_start {
            result.extend(c.to_uppercase());
        } else {
            result.push(c);
        }
        at_word_start = !(c.is_alphanumeric() || c == '_');
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{merge_layers, ConfigKey, ConfigLayer, LayerName};

    fn config() -> ResolvedConfiguration {
        let layer = ConfigLayer::new(LayerName::Convention)
            .with(ConfigKey::ItemName, "MY_widget")
            .with(ConfigKey::ModuleAuthor, "alice");
        merge_layers([&layer])
    }

    #[test]
    fn test_render_variables() {
        let renderer = HandlebarsRenderer::new();
        let rendered = renderer
            .render("t", "{{item_name}} by {{puppet_module.author}}", &config())
            .unwrap();
        assert_eq!(rendered, "MY_widget by alice");
    }

    #[test]
    fn test_class_name_helper() {
        let renderer = HandlebarsRenderer::new();
        let rendered = renderer
            .render("t", "class {{toClassName item_name}}", &config())
            .unwrap();
        assert_eq!(rendered, "class My_widget");
    }

    #[test]
    fn test_no_html_escaping() {
        let renderer = HandlebarsRenderer::new();
        let layer = ConfigLayer::from_yaml(LayerName::User, Path::new("u.yml"), "v: \"<a & b>\"\n").unwrap();
        let rendered = renderer.render("t", "{{v}}", &merge_layers([&layer])).unwrap();
        assert_eq!(rendered, "<a & b>");
    }

    #[test]
    fn test_syntax_error() {
        let renderer = HandlebarsRenderer::new();
        let result = renderer.render("broken", "{{#if item_name}}open", &config());
        assert!(matches!(result, Err(TemplateError::Render { .. })));
    }

    #[test]
    fn test_empty_output_is_ok() {
        let renderer = HandlebarsRenderer::new();
        assert_eq!(renderer.render("t", "", &config()).unwrap(), "");
    }

    #[test]
    fn test_render_missing_file() {
        let renderer = HandlebarsRenderer::new();
        let result = renderer.render_file(Path::new("/nonexistent/file.tmpl"), &config());
        assert!(result.is_err());
    }

    #[test]
    fn test_to_class_name() {
        assert_eq!(to_class_name("widget"), "Widget");
        assert_eq!(to_class_name("WIDGET"), "Widget");
        assert_eq!(to_class_name("my widget"), "My Widget");
        assert_eq!(to_class_name("my-widget"), "My-Widget");
        assert_eq!(to_class_name("my_widget"), "My_widget");
        assert_eq!(to_class_name("ntp::server"), "Ntp::Server");
        assert_eq!(to_class_name(""), "");
    }
}
