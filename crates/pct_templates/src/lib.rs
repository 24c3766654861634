//! # pct_templates
//!
//! Template discovery and deployment for pct.
//!
//! An installed template is a directory holding a `pct-config.yml`
//! descriptor and a `content/` tree. Deploying a template:
//!
//! - Infers the target name and output directory from the request
//! - Layers configuration (conventions, machine facts, template defaults,
//!   user overrides)
//! - Mirrors `content/` into the output, replacing `__REPLACE__` in paths with
//!   the target name and rendering every `.tmpl` file with Handlebars
//!
//! ## Example
//!
//! ```rust,no_run
//! use pct_templates::{list, BuildMetadata, DeploymentRequest, HostContext, TemplateDeployer};
//!
//! let templates = list("/home/me/.pdk/pct", None).unwrap();
//! for template in &templates {
//!     println!("{} ({})", template.name, template.kind);
//! }
//!
//! let request = DeploymentRequest::new("full-project", "/home/me/.pdk/pct")
//!     .with_name("my_module")
//!     .with_build(BuildMetadata::new("0.1.1", "abc123", "2024-01-01"));
//!
//! let deployer = TemplateDeployer::new(HostContext::detect().unwrap());
//! let result = deployer.deploy(&request).unwrap();
//! for path in &result.deployed {
//!     println!("Deployed: {}", path.display());
//! }
//! ```

pub mod config;
pub mod deploy;
pub mod descriptor;
pub mod error;
pub mod loader;
pub mod renderer;
pub mod target;

pub use config::{
    merge_layers, BuildMetadata, ConfigKey, ConfigLayer, ConfigResolver, HostContext, LayerName,
    ResolvedConfiguration,
};
pub use deploy::{
    deploy, map_target_path, DeploymentRequest, DeploymentResult, TemplateDeployer,
    TemplateFileEntry,
};
pub use descriptor::{
    TemplateDescriptor, TemplateKind, CONTENT_DIR, DESCRIPTOR_FILE_NAME, PLACEHOLDER_TOKEN,
    TEMPLATE_SUFFIX,
};
pub use error::{TemplateError, TemplateResult};
pub use loader::{list, TemplateLoader};
pub use renderer::{to_class_name, HandlebarsRenderer, Renderer};
pub use target::ResolvedTarget;
