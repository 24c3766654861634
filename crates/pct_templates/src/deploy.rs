//! Template deployment.
//!
//! The deployer:
//! - Loads the selected template's descriptor
//! - Resolves the target name and output directory
//! - Walks the template's `content/` tree, mapping each entry onto the target
//! - Creates directories, renders `.tmpl` files and copies everything else
//!
//! A failure on one entry is logged and that entry skipped; only a content
//! tree that cannot be walked at all aborts the deployment.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};

use serde::Serialize;
use tracing::{debug, error, info, trace, warn};
use walkdir::WalkDir;

use crate::config::{BuildMetadata, ConfigResolver, HostContext};
use crate::descriptor::{
    TemplateDescriptor, CONTENT_DIR, DESCRIPTOR_FILE_NAME, PLACEHOLDER_TOKEN, TEMPLATE_SUFFIX,
};
use crate::error::{TemplateError, TemplateResult};
use crate::renderer::{HandlebarsRenderer, Renderer};
use crate::target::ResolvedTarget;

/// What to deploy and where.
#[derive(Debug, Clone, Default)]
pub struct DeploymentRequest {
    /// Name of the template directory under the cache root
    pub template: String,
    /// Directory holding installed templates
    pub template_cache: PathBuf,
    pub target_name: Option<String>,
    pub target_output: Option<PathBuf>,
    pub build: BuildMetadata,
}

impl DeploymentRequest {
    pub fn new(template: impl Into<String>, template_cache: impl Into<PathBuf>) -> Self {
        Self {
            template: template.into(),
            template_cache: template_cache.into(),
            ..Default::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.target_name = Some(name.into());
        self
    }

    pub fn with_output(mut self, output: impl Into<PathBuf>) -> Self {
        self.target_output = Some(output.into());
        self
    }

    pub fn with_build(mut self, build: BuildMetadata) -> Self {
        self.build = build;
        self
    }

    /// Directory of the selected template.
    pub fn template_dir(&self) -> PathBuf {
        self.template_cache.join(&self.template)
    }
}

/// One entry of a template's content tree and where it lands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateFileEntry {
    pub source_path: PathBuf,
    pub target_path: PathBuf,
    pub target_dir: PathBuf,
    pub target_file_name: String,
    pub is_directory: bool,
}

impl TemplateFileEntry {
    /// Whether the source is rendered rather than copied.
    pub fn is_template(&self) -> bool {
        !self.is_directory
            && self
                .source_path
                .file_name()
                .map_or(false, |n| n.to_string_lossy().ends_with(TEMPLATE_SUFFIX))
    }
}

/// Outcome of a deployment.
#[derive(Debug, Clone, Serialize)]
pub struct DeploymentResult {
    pub target: ResolvedTarget,
    /// Paths written, in the order processed
    pub deployed: Vec<PathBuf>,
    /// Entries that could not be read, rendered or written
    pub skipped: Vec<PathBuf>,
}

impl DeploymentResult {
    /// True when no entry was skipped.
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// Map a path relative to the content root onto the target.
///
/// The placeholder token is replaced in every segment and the template suffix
/// is removed from the last one.
pub fn map_target_path(relative: &Path, target: &ResolvedTarget) -> PathBuf {
    let segments: Vec<String> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(segment) => Some(segment.to_string_lossy().replace(PLACEHOLDER_TOKEN, &target.name)),
            _ => None,
        })
        .collect();

    let mut mapped = target.output_dir.clone();
    let last = segments.len().saturating_sub(1);
    for (i, segment) in segments.into_iter().enumerate() {
        if i == last {
            let stripped = segment.strip_suffix(TEMPLATE_SUFFIX).unwrap_or(&segment);
            mapped.push(stripped);
        } else {
            mapped.push(segment);
        }
    }
    mapped
}

/// Deploys templates from an installed template cache.
pub struct TemplateDeployer<R = HandlebarsRenderer> {
    renderer: R,
    host: HostContext,
}

impl TemplateDeployer<HandlebarsRenderer> {
    /// Create a deployer using the Handlebars renderer.
    pub fn new(host: HostContext) -> Self {
        Self::with_renderer(HandlebarsRenderer::new(), host)
    }
}

impl<R: Renderer> TemplateDeployer<R> {
    pub fn with_renderer(renderer: R, host: HostContext) -> Self {
        Self { renderer, host }
    }

    pub fn host(&self) -> &HostContext {
        &self.host
    }

    /// Deploy the requested template.
    pub fn deploy(&self, request: &DeploymentRequest) -> TemplateResult<DeploymentResult> {
        let template_dir = request.template_dir();
        let descriptor_path = template_dir.join(DESCRIPTOR_FILE_NAME);
        debug!("Template: {:?}", descriptor_path);

        if !descriptor_path.is_file() {
            return Err(TemplateError::TemplateNotFound(format!(
                "{} (no {} in {:?})",
                request.template, DESCRIPTOR_FILE_NAME, template_dir
            )));
        }
        let descriptor = TemplateDescriptor::load(&descriptor_path)?;
        trace!("Parsed: {:?}", descriptor);

        let target = ResolvedTarget::resolve(
            descriptor.kind,
            request.target_name.as_deref(),
            request.target_output.as_deref(),
            &self.host.cwd,
        );

        info!(
            "Deploying template {} to {:?}",
            descriptor.name, target.output_dir
        );

        let content_dir = template_dir.join(CONTENT_DIR);
        let walk = collect_entries(&content_dir, &target)?;
        let config = ConfigResolver::new(&descriptor, &template_dir, &target, &self.host, &request.build);

        let mut deployed = Vec::new();
        let mut skipped = walk.unreadable;

        for entry in walk.entries {
            debug!("Deploying: {:?}", entry.target_path);
            let outcome = if entry.is_directory {
                create_directory(&entry.target_path)
            } else {
                self.create_file(&entry, &config)
            };

            match outcome {
                Ok(()) => deployed.push(entry.target_path),
                Err(e) => {
                    error!("{}", e);
                    skipped.push(entry.target_path);
                }
            }
        }

        info!("Deployed {} path(s), skipped {}", deployed.len(), skipped.len());
        Ok(DeploymentResult {
            target,
            deployed,
            skipped,
        })
    }

    fn create_file(&self, entry: &TemplateFileEntry, config: &ConfigResolver) -> TemplateResult<()> {
        if entry.is_template() {
            let data = config.resolve();
            let text = self.renderer.render_file(&entry.source_path, &data)?;
            trace!("Writing {:?}", entry.target_path);
            write_synced(&entry.target_dir, &entry.target_path, text.as_bytes())
        } else {
            trace!("Copying {:?}", entry.target_path);
            copy_synced(&entry.source_path, &entry.target_dir, &entry.target_path)
        }
    }
}

/// Deploy using the current process environment and the Handlebars renderer.
pub fn deploy(request: &DeploymentRequest) -> TemplateResult<DeploymentResult> {
    TemplateDeployer::new(HostContext::detect()?).deploy(request)
}

/// Content entries in walk order, plus the target paths of entries the walk
/// could not read.
struct ContentWalk {
    entries: Vec<TemplateFileEntry>,
    unreadable: Vec<PathBuf>,
}

/// Walk the content tree depth-first, root included, in file-name order.
fn collect_entries(content_dir: &Path, target: &ResolvedTarget) -> TemplateResult<ContentWalk> {
    if !content_dir.is_dir() {
        return Err(TemplateError::WalkAbort {
            path: content_dir.to_path_buf(),
            message: "content directory does not exist".to_string(),
        });
    }

    let mut entries = Vec::new();
    let mut unreadable = Vec::new();
    for entry in WalkDir::new(content_dir).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 => {
                return Err(TemplateError::WalkAbort {
                    path: content_dir.to_path_buf(),
                    message: e.to_string(),
                })
            }
            Err(e) => {
                warn!("Skipping unreadable template entry: {}", e);
                let source = e.path().unwrap_or(content_dir);
                let relative = source.strip_prefix(content_dir).unwrap_or(source);
                unreadable.push(map_target_path(relative, target));
                continue;
            }
        };

        let Ok(relative) = entry.path().strip_prefix(content_dir) else {
            continue;
        };
        let target_path = map_target_path(relative, target);
        trace!("Resolved {:?} to {:?}", entry.path(), target_path);

        let target_dir = target_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| target.output_dir.clone());
        let target_file_name = target_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        entries.push(TemplateFileEntry {
            source_path: entry.path().to_path_buf(),
            target_path,
            target_dir,
            target_file_name,
            is_directory: entry.file_type().is_dir(),
        });
    }

    Ok(ContentWalk { entries, unreadable })
}

fn create_directory(path: &Path) -> TemplateResult<()> {
    trace!("Creating: {:?}", path);
    fs::create_dir_all(path).map_err(|e| TemplateError::write(path, e))
}

/// Write a file, creating its directory first, and flush it to disk.
fn write_synced(dir: &Path, path: &Path, contents: &[u8]) -> TemplateResult<()> {
    create_directory(dir)?;
    let mut file = File::create(path).map_err(|e| TemplateError::write(path, e))?;
    file.write_all(contents)
        .map_err(|e| TemplateError::write(path, e))?;
    file.sync_all().map_err(|e| TemplateError::write(path, e))
}

/// Copy a static file, keeping its permission bits, and flush it to disk.
fn copy_synced(source: &Path, dir: &Path, path: &Path) -> TemplateResult<()> {
    let mut input = File::open(source).map_err(|e| TemplateError::read(source, e))?;
    let permissions = input
        .metadata()
        .map_err(|e| TemplateError::read(source, e))?
        .permissions();

    create_directory(dir)?;
    let mut file = File::create(path).map_err(|e| TemplateError::write(path, e))?;
    io::copy(&mut input, &mut file).map_err(|e| TemplateError::write(path, e))?;
    file.set_permissions(permissions)
        .map_err(|e| TemplateError::write(path, e))?;
    file.sync_all().map_err(|e| TemplateError::write(path, e))
}
