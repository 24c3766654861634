//! Template descriptor definitions.
//!
//! Every installed template is a directory holding a `pct-config.yml`
//! descriptor next to a `content/` tree. The descriptor's `template` section
//! identifies the template; the rest of the file supplies default values for
//! rendering.

use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::{TemplateError, TemplateResult};

/// Well-known descriptor file name searched for by the registry.
pub const DESCRIPTOR_FILE_NAME: &str = "pct-config.yml";

/// Directory inside a template holding the files to materialize.
pub const CONTENT_DIR: &str = "content";

/// Literal token in content paths replaced by the resolved target name.
pub const PLACEHOLDER_TOKEN: &str = "__REPLACE__";

/// Suffix marking a content file as a template to render.
pub const TEMPLATE_SUFFIX: &str = ".tmpl";

/// Template kind.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TemplateKind {
    /// Output is a new directory named after the target.
    Project,
    /// Output is placed inside an existing directory.
    Item,
}

impl TemplateKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateKind::Project => "project",
            TemplateKind::Item => "item",
        }
    }
}

impl fmt::Display for TemplateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Metadata identifying an installed template.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TemplateDescriptor {
    /// Registry key
    pub name: String,
    /// Project or item
    #[serde(rename = "type")]
    pub kind: TemplateKind,
    /// Human readable label
    #[serde(default)]
    pub display: String,
    #[serde(default)]
    pub version: String,
    /// Where the template is published
    #[serde(default)]
    pub url: String,
}

/// On-disk shape of the descriptor file. Keys outside `template` are
/// rendering defaults and are read separately by the config resolver.
#[derive(Debug, Deserialize)]
struct DescriptorFile {
    template: TemplateDescriptor,
}

impl TemplateDescriptor {
    /// Parse a descriptor from YAML text.
    pub fn from_yaml(path: &Path, content: &str) -> TemplateResult<Self> {
        let file: DescriptorFile =
            serde_yaml::from_str(content).map_err(|e| TemplateError::DescriptorParse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        Ok(file.template)
    }

    /// Read and parse a descriptor file.
    pub fn load(path: &Path) -> TemplateResult<Self> {
        trace!("Reading template descriptor {:?}", path);
        let content = fs::read_to_string(path).map_err(|e| TemplateError::DescriptorParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::from_yaml(path, &content)
    }
}
