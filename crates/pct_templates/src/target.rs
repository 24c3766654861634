//! Target name and output directory inference.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::debug;

use crate::descriptor::TemplateKind;

/// Final name and output directory of a deployment.
///
/// Computed once before anything is written; every deployed path is derived
/// from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedTarget {
    pub name: String,
    pub output_dir: PathBuf,
}

impl ResolvedTarget {
    /// Infer the target from optional user input.
    ///
    /// | name  | output | result                          |
    /// |-------|--------|---------------------------------|
    /// | -     | -      | name = base(cwd), output = cwd  |
    /// | given | -      | output = cwd/name               |
    /// | -     | given  | name = base(output)             |
    /// | given | given  | as given                        |
    ///
    /// When an output was given, a project gets its own `name` directory
    /// unless the output already ends with it, and an item drops a trailing
    /// `name` segment so it lands inside that directory's parent.
    pub fn resolve(
        kind: TemplateKind,
        requested_name: Option<&str>,
        requested_output: Option<&Path>,
        cwd: &Path,
    ) -> Self {
        let requested_name = requested_name.filter(|n| !n.is_empty());
        let requested_output = requested_output.filter(|o| !o.as_os_str().is_empty());

        let target = match (requested_name, requested_output) {
            (None, None) => Self {
                name: base_name(cwd),
                output_dir: cwd.to_path_buf(),
            },
            (Some(name), None) => Self {
                name: name.to_string(),
                output_dir: cwd.join(name),
            },
            (None, Some(output)) => Self {
                name: Some(base_name(output))
                    .filter(|n| !n.is_empty())
                    .unwrap_or_else(|| base_name(cwd)),
                output_dir: output.to_path_buf(),
            }
            .adjust_for(kind),
            (Some(name), Some(output)) => Self {
                name: name.to_string(),
                output_dir: output.to_path_buf(),
            }
            .adjust_for(kind),
        };

        debug!("Target Name: {}", target.name);
        debug!("Target Output: {:?}", target.output_dir);
        target
    }

    fn adjust_for(mut self, kind: TemplateKind) -> Self {
        let ends_with_name = self
            .output_dir
            .file_name()
            .map_or(false, |last| last == self.name.as_str());

        match kind {
            TemplateKind::Project => {
                if !ends_with_name {
                    self.output_dir = self.output_dir.join(&self.name);
                }
            }
            TemplateKind::Item => {
                if ends_with_name {
                    self.output_dir = match self.output_dir.parent() {
                        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
                        _ => PathBuf::from("."),
                    };
                    debug!("Changing target to: {:?}", self.output_dir);
                }
            }
        }
        self
    }
}

/// Last path segment as a string; empty when the path has none (`/`, `..`).
fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
