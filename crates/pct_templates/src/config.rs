//! Layered rendering configuration.
//!
//! Values handed to the renderer come from four layers, lowest precedence
//! first:
//!
//! 1. convention: target name, invoking user, build metadata
//! 2. machine: working directory, host name
//! 3. template: the template's own `pct-config.yml`
//! 4. user: `~/.pdk/pdk.yml`
//!
//! Later layers win on conflicting keys; nested mappings are merged key by key.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, trace, warn};

use crate::descriptor::{TemplateDescriptor, TemplateKind, DESCRIPTOR_FILE_NAME};
use crate::error::{TemplateError, TemplateResult};
use crate::target::ResolvedTarget;

/// Directory under the user's home holding the override file.
pub const USER_CONFIG_DIR: &str = ".pdk";

/// Accepted names for the user override file, in lookup order.
pub const USER_CONFIG_FILE_NAMES: [&str; 2] = ["pdk.yml", "pdk.yaml"];

/// Version information of the running tool.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildMetadata {
    pub version: String,
    pub commit_hash: String,
    pub build_date: String,
}

impl BuildMetadata {
    pub fn new(
        version: impl Into<String>,
        commit_hash: impl Into<String>,
        build_date: impl Into<String>,
    ) -> Self {
        Self {
            version: version.into(),
            commit_hash: commit_hash.into(),
            build_date: build_date.into(),
        }
    }
}

/// Keys the tool itself populates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigKey {
    /// Target name, for project templates
    ProjectName,
    /// Target name, for item templates
    ItemName,
    /// Invoking OS account, without domain
    User,
    /// Module author, defaults to the invoking user
    ModuleAuthor,
    PdkVersion,
    PdkCommitHash,
    PdkBuildDate,
    /// Working directory of the invocation
    Cwd,
    Hostname,
}

impl ConfigKey {
    /// Dotted key path; each dot introduces a nested mapping.
    pub fn path(&self) -> &'static str {
        match self {
            ConfigKey::ProjectName => "project_name",
            ConfigKey::ItemName => "item_name",
            ConfigKey::User => "user",
            ConfigKey::ModuleAuthor => "puppet_module.author",
            ConfigKey::PdkVersion => "pdk.version",
            ConfigKey::PdkCommitHash => "pdk.commit_hash",
            ConfigKey::PdkBuildDate => "pdk.build_date",
            ConfigKey::Cwd => "cwd",
            ConfigKey::Hostname => "hostname",
        }
    }

    /// Key receiving the target name for a template kind.
    pub fn target_name_for(kind: TemplateKind) -> Self {
        match kind {
            TemplateKind::Project => ConfigKey::ProjectName,
            TemplateKind::Item => ConfigKey::ItemName,
        }
    }
}

/// Configuration layers, in precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LayerName {
    Convention,
    Machine,
    Template,
    User,
}

impl LayerName {
    pub fn as_str(&self) -> &'static str {
        match self {
            LayerName::Convention => "convention",
            LayerName::Machine => "machine",
            LayerName::Template => "template",
            LayerName::User => "user",
        }
    }
}

/// One named source of configuration values.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigLayer {
    pub name: LayerName,
    pub values: Map<String, Value>,
}

impl ConfigLayer {
    /// Create an empty layer.
    pub fn new(name: LayerName) -> Self {
        Self {
            name,
            values: Map::new(),
        }
    }

    /// Set a recognized key.
    pub fn set(&mut self, key: ConfigKey, value: impl Into<Value>) {
        set_dotted(&mut self.values, key.path(), value.into());
    }

    pub fn with(mut self, key: ConfigKey, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Decode a YAML document into a layer. An empty document is an empty layer.
    pub fn from_yaml(name: LayerName, path: &Path, content: &str) -> TemplateResult<Self> {
        let decode_error = |message: String| TemplateError::ConfigLayer {
            path: path.to_path_buf(),
            message,
        };

        let value: Value = serde_yaml::from_str(content).map_err(|e| decode_error(e.to_string()))?;
        let values = match value {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                return Err(decode_error(format!(
                    "expected a mapping at the top level, found {}",
                    json_type(&other)
                )))
            }
        };

        Ok(Self { name, values })
    }

    /// Read a layer file.
    pub fn from_file(name: LayerName, path: &Path) -> TemplateResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| TemplateError::ConfigLayer {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::from_yaml(name, path, &content)
    }

    /// Read a layer file, falling back to an empty layer if it is missing or
    /// cannot be decoded.
    pub fn load_or_empty(name: LayerName, path: &Path) -> Self {
        if !path.is_file() {
            debug!("No {} configuration at {:?}", name.as_str(), path);
            return Self::new(name);
        }

        match Self::from_file(name, path) {
            Ok(layer) => {
                trace!("Merging config file: {:?}", path);
                layer
            }
            Err(e) => {
                warn!("{}", e);
                Self::new(name)
            }
        }
    }
}

/// Final key/value tree consumed by the renderer.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ResolvedConfiguration {
    values: Map<String, Value>,
}

impl ResolvedConfiguration {
    /// Look up a dotted key path.
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let first = segments.next()?;
        segments.try_fold(self.values.get(first)?, |value, segment| {
            value.as_object()?.get(segment)
        })
    }

    pub fn get_str(&self, path: &str) -> Option<&str> {
        self.get(path).and_then(Value::as_str)
    }

    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }
}

/// Combine layers in the order given; later layers win.
pub fn merge_layers<'a>(layers: impl IntoIterator<Item = &'a ConfigLayer>) -> ResolvedConfiguration {
    let mut values = Map::new();
    for layer in layers {
        trace!("Applying {} layer ({} keys)", layer.name.as_str(), layer.values.len());
        deep_merge(&mut values, &layer.values);
    }
    ResolvedConfiguration { values }
}

fn deep_merge(target: &mut Map<String, Value>, source: &Map<String, Value>) {
    for (key, value) in source {
        match (target.get_mut(key), value) {
            (Some(Value::Object(existing)), Value::Object(incoming)) => {
                deep_merge(existing, incoming);
            }
            _ => {
                target.insert(key.clone(), value.clone());
            }
        }
    }
}

fn set_dotted(map: &mut Map<String, Value>, path: &str, value: Value) {
    match path.split_once('.') {
        None => {
            map.insert(path.to_string(), value);
        }
        Some((head, rest)) => {
            let entry = map
                .entry(head.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !entry.is_object() {
                *entry = Value::Object(Map::new());
            }
            if let Value::Object(child) = entry {
                set_dotted(child, rest, value);
            }
        }
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a sequence",
        Value::Object(_) => "a mapping",
    }
}

/// Facts about the invoking machine and user, captured once per invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostContext {
    pub cwd: PathBuf,
    /// OS account name with any `DOMAIN\` prefix removed
    pub user: String,
    pub hostname: String,
    /// User override file, if one exists
    pub user_config: Option<PathBuf>,
}

impl HostContext {
    /// Inspect the current process environment.
    pub fn detect() -> TemplateResult<Self> {
        let cwd = std::env::current_dir()?;
        let user = whoami::fallible::username().unwrap_or_else(|e| {
            warn!("Unable to determine current user: {}", e);
            String::new()
        });
        let hostname = whoami::fallible::hostname().unwrap_or_else(|e| {
            warn!("Unable to determine host name: {}", e);
            String::new()
        });

        Ok(Self {
            cwd,
            user: strip_domain(&user).to_string(),
            hostname,
            user_config: default_user_config(),
        })
    }

    /// Context with fixed values and no user override file.
    pub fn new(cwd: impl Into<PathBuf>, user: &str, hostname: impl Into<String>) -> Self {
        Self {
            cwd: cwd.into(),
            user: strip_domain(user).to_string(),
            hostname: hostname.into(),
            user_config: None,
        }
    }

    pub fn with_user_config(mut self, path: impl Into<PathBuf>) -> Self {
        self.user_config = Some(path.into());
        self
    }
}

/// Drop a Windows `DOMAIN\` prefix from an account name.
pub fn strip_domain(user: &str) -> &str {
    user.split_once('\\').map_or(user, |(_, name)| name)
}

/// First existing `~/.pdk/pdk.{yml,yaml}`, or the `.yml` path if neither exists.
fn default_user_config() -> Option<PathBuf> {
    let dir = dirs::home_dir()?.join(USER_CONFIG_DIR);
    let found = USER_CONFIG_FILE_NAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.is_file());
    Some(found.unwrap_or_else(|| dir.join(USER_CONFIG_FILE_NAMES[0])))
}

/// Builds the per-file configuration for one deployment.
///
/// The template and user files are read once on construction; resolving only
/// re-runs the merge.
#[derive(Debug, Clone)]
pub struct ConfigResolver {
    convention: ConfigLayer,
    machine: ConfigLayer,
    template: ConfigLayer,
    user: ConfigLayer,
}

impl ConfigResolver {
    /// Prepare layers for deploying `descriptor` from `template_dir`.
    pub fn new(
        descriptor: &TemplateDescriptor,
        template_dir: &Path,
        target: &ResolvedTarget,
        host: &HostContext,
        build: &BuildMetadata,
    ) -> Self {
        let convention = ConfigLayer::new(LayerName::Convention)
            .with(ConfigKey::target_name_for(descriptor.kind), target.name.as_str())
            .with(ConfigKey::User, host.user.as_str())
            .with(ConfigKey::ModuleAuthor, host.user.as_str())
            .with(ConfigKey::PdkVersion, build.version.as_str())
            .with(ConfigKey::PdkCommitHash, build.commit_hash.as_str())
            .with(ConfigKey::PdkBuildDate, build.build_date.as_str());

        let machine = ConfigLayer::new(LayerName::Machine)
            .with(ConfigKey::Cwd, host.cwd.to_string_lossy().into_owned())
            .with(ConfigKey::Hostname, host.hostname.as_str());

        let template =
            ConfigLayer::load_or_empty(LayerName::Template, &template_dir.join(DESCRIPTOR_FILE_NAME));

        let user = match &host.user_config {
            Some(path) => ConfigLayer::load_or_empty(LayerName::User, path),
            None => ConfigLayer::new(LayerName::User),
        };

        Self {
            convention,
            machine,
            template,
            user,
        }
    }

    /// Layers in precedence order, lowest first.
    pub fn layers(&self) -> [&ConfigLayer; 4] {
        [&self.convention, &self.machine, &self.template, &self.user]
    }

    /// Merge all layers into the configuration for one file.
    pub fn resolve(&self) -> ResolvedConfiguration {
        merge_layers(self.layers())
    }
}
