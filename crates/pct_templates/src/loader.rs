//! Template discovery.

use std::path::{Path, PathBuf};

use glob::Pattern;
use tracing::{debug, info, warn};

use crate::descriptor::{TemplateDescriptor, CONTENT_DIR, DESCRIPTOR_FILE_NAME};
use crate::error::TemplateResult;

/// Template loader.
///
/// Finds every `pct-config.yml` below a search root. Descriptors that fail to
/// parse are logged and left out.
pub struct TemplateLoader {
    templates_path: PathBuf,
}

impl TemplateLoader {
    /// Create a new template loader.
    pub fn new(templates_path: impl Into<PathBuf>) -> Self {
        Self {
            templates_path: templates_path.into(),
        }
    }

    pub fn templates_path(&self) -> &Path {
        &self.templates_path
    }

    /// List installed templates, optionally restricted to an exact name.
    ///
    /// An empty filter is treated as no filter. No match yields an empty list.
    pub fn list(&self, name_filter: Option<&str>) -> TemplateResult<Vec<TemplateDescriptor>> {
        let mut templates = Vec::new();

        if !self.templates_path.exists() {
            warn!("Templates directory does not exist: {:?}", self.templates_path);
            return Ok(templates);
        }

        for path in self.descriptor_paths()? {
            debug!("Found: {:?}", path);
            match TemplateDescriptor::load(&path) {
                Ok(descriptor) => templates.push(descriptor),
                Err(e) => warn!("Skipping template: {}", e),
            }
        }

        if let Some(name) = name_filter.filter(|n| !n.is_empty()) {
            debug!("Filtering for: {}", name);
            templates.retain(|t| t.name == name);
        }

        templates.sort_by(|a, b| a.name.cmp(&b.name));
        info!("Found {} template(s) in {:?}", templates.len(), self.templates_path);
        Ok(templates)
    }

    /// Locate descriptor files, ignoring any that live inside a template's
    /// content tree.
    fn descriptor_paths(&self) -> TemplateResult<Vec<PathBuf>> {
        let root = Pattern::escape(&self.templates_path.to_string_lossy());
        let pattern = format!("{}/**/{}", root, DESCRIPTOR_FILE_NAME);

        let mut paths = Vec::new();
        for entry in glob::glob(&pattern)? {
            match entry {
                Ok(path) if self.is_template_payload(&path) => {
                    debug!("Ignoring descriptor inside template content: {:?}", path)
                }
                Ok(path) => paths.push(path),
                Err(e) => warn!("Unreadable entry while searching templates: {}", e),
            }
        }
        Ok(paths)
    }

    /// A descriptor is payload when some `content` directory between it and
    /// the search root belongs to a template, i.e. sits next to a descriptor.
    fn is_template_payload(&self, descriptor: &Path) -> bool {
        descriptor
            .ancestors()
            .skip(1)
            .take_while(|dir| dir.starts_with(&self.templates_path) && *dir != self.templates_path)
            .filter(|dir| dir.file_name().map_or(false, |n| n == CONTENT_DIR))
            .any(|content| {
                content
                    .parent()
                    .map_or(false, |owner| owner.join(DESCRIPTOR_FILE_NAME).is_file())
            })
    }
}

/// List templates under `search_root`, optionally filtered by exact name.
pub fn list(search_root: impl AsRef<Path>, name_filter: Option<&str>) -> TemplateResult<Vec<TemplateDescriptor>> {
    TemplateLoader::new(search_root.as_ref()).list(name_filter)
}
