//! Integration tests for template discovery and deployment.

use std::fs;
use std::path::{Path, PathBuf};

use pct_templates::{
    list, BuildMetadata, DeploymentRequest, HostContext, TemplateDeployer, TemplateKind,
};
use tempfile::{tempdir, TempDir};

/// Lay out a template under `cache/<dir>` with the given content files.
fn write_template(cache: &Path, dir: &str, descriptor: &str, files: &[(&str, &str)]) -> PathBuf {
    let template_dir = cache.join(dir);
    let content = template_dir.join("content");
    fs::create_dir_all(&content).unwrap();
    fs::write(template_dir.join("pct-config.yml"), descriptor).unwrap();
    for (path, text) in files {
        let file = content.join(path);
        fs::create_dir_all(file.parent().unwrap()).unwrap();
        fs::write(file, text).unwrap();
    }
    template_dir
}

fn project_descriptor(name: &str) -> String {
    format!(
        "template:\n  name: {name}\n  type: project\n  display: {name} project\n  version: 0.1.0\n  url: https://example.com/{name}\n"
    )
}

struct Fixture {
    temp: TempDir,
}

impl Fixture {
    fn new() -> Self {
        Self { temp: tempdir().unwrap() }
    }

    fn cache(&self) -> PathBuf {
        self.temp.path().join("cache")
    }

    fn cwd(&self) -> PathBuf {
        let cwd = self.temp.path().join("work");
        fs::create_dir_all(&cwd).unwrap();
        cwd
    }

    fn deployer(&self) -> TemplateDeployer {
        TemplateDeployer::new(HostContext::new(self.cwd(), "DOMAIN\\alice", "buildbox"))
    }

    fn deployer_with_user_config(&self, yaml: &str) -> TemplateDeployer {
        let user_config = self.temp.path().join("pdk.yml");
        fs::write(&user_config, yaml).unwrap();
        TemplateDeployer::new(
            HostContext::new(self.cwd(), "alice", "buildbox").with_user_config(user_config),
        )
    }
}

#[test]
fn test_list_all_and_filtered() {
    let fx = Fixture::new();
    write_template(&fx.cache(), "full-project", &project_descriptor("full-project"), &[]);
    write_template(
        &fx.cache(),
        "nested/fact",
        "template:\n  name: fact\n  type: item\n  display: Custom Fact\n",
        &[],
    );

    let all = list(fx.cache(), None).unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].name, "fact");
    assert_eq!(all[0].kind, TemplateKind::Item);
    assert_eq!(all[1].name, "full-project");
    assert_eq!(all[1].url, "https://example.com/full-project");

    let filtered = list(fx.cache(), Some("fact")).unwrap();
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0].display, "Custom Fact");

    assert!(list(fx.cache(), Some("missing")).unwrap().is_empty());
}

#[test]
fn test_deploy_project_renders_and_substitutes() {
    let fx = Fixture::new();
    write_template(
        &fx.cache(),
        "module",
        &project_descriptor("module"),
        &[
            ("metadata.json.tmpl", "{\"name\": \"{{puppet_module.author}}-{{project_name}}\"}"),
            ("manifests/__REPLACE__.pp.tmpl", "class {{toClassName project_name}} {}"),
            ("__REPLACE__.tmpl", "{{project_name}} on {{hostname}}"),
            ("files/.keep", ""),
        ],
    );

    let out = fx.temp.path().join("out");
    let request = DeploymentRequest::new("module", fx.cache())
        .with_name("alpha")
        .with_output(&out)
        .with_build(BuildMetadata::new("0.1.1", "abc123", "2024-01-01"));
    let result = fx.deployer().deploy(&request).unwrap();

    let root = out.join("alpha");
    assert_eq!(result.target.output_dir, root);
    assert!(result.is_complete());
    assert_eq!(
        result.deployed,
        vec![
            root.clone(),
            root.join("alpha"),
            root.join("files"),
            root.join("files/.keep"),
            root.join("manifests"),
            root.join("manifests/alpha.pp"),
            root.join("metadata.json"),
        ]
    );

    assert_eq!(fs::read_to_string(root.join("alpha")).unwrap(), "alpha on buildbox");
    assert_eq!(
        fs::read_to_string(root.join("manifests/alpha.pp")).unwrap(),
        "class Alpha {}"
    );
    assert_eq!(
        fs::read_to_string(root.join("metadata.json")).unwrap(),
        "{\"name\": \"alice-alpha\"}"
    );
}

#[test]
fn test_deploy_item_into_existing_directory() {
    let fx = Fixture::new();
    write_template(
        &fx.cache(),
        "class",
        "template:\n  name: class\n  type: item\n",
        &[("manifests/__REPLACE__.pp.tmpl", "class {{item_name}} {}")],
    );

    let module = fx.temp.path().join("mymodule");
    let request = DeploymentRequest::new("class", fx.cache())
        .with_name("widget")
        .with_output(module.join("widget"));
    let result = fx.deployer().deploy(&request).unwrap();

    assert_eq!(result.target.output_dir, module);
    assert_eq!(
        fs::read_to_string(module.join("manifests/widget.pp")).unwrap(),
        "class widget {}"
    );
}

#[test]
fn test_deploy_defaults_to_cwd() {
    let fx = Fixture::new();
    write_template(
        &fx.cache(),
        "readme",
        &project_descriptor("readme"),
        &[("README.md.tmpl", "# {{project_name}}\n")],
    );

    let result = fx
        .deployer()
        .deploy(&DeploymentRequest::new("readme", fx.cache()))
        .unwrap();

    assert_eq!(result.target.name, "work");
    assert_eq!(result.target.output_dir, fx.cwd());
    assert_eq!(
        fs::read_to_string(fx.cwd().join("README.md")).unwrap(),
        "# work\n"
    );
}

#[test]
fn test_user_layer_overrides_template_layer() {
    let fx = Fixture::new();
    let descriptor = format!("{}license: MIT\nsummary: template summary\n", project_descriptor("lic"));
    write_template(
        &fx.cache(),
        "lic",
        &descriptor,
        &[("LICENSE.tmpl", "{{license}}|{{summary}}|{{user}}")],
    );

    let out = fx.temp.path().join("out");
    let request = DeploymentRequest::new("lic", fx.cache())
        .with_name("alpha")
        .with_output(&out);
    fx.deployer_with_user_config("license: Apache-2.0\n")
        .deploy(&request)
        .unwrap();

    assert_eq!(
        fs::read_to_string(out.join("alpha/LICENSE")).unwrap(),
        "Apache-2.0|template summary|alice"
    );
}

#[test]
fn test_broken_template_file_is_skipped() {
    let fx = Fixture::new();
    write_template(
        &fx.cache(),
        "partial",
        &project_descriptor("partial"),
        &[
            ("one.txt.tmpl", "one {{project_name}}"),
            ("two.txt.tmpl", "two {{#if project_name}}unterminated"),
            ("three.txt.tmpl", "three {{project_name}}"),
        ],
    );

    let out = fx.temp.path().join("out");
    let request = DeploymentRequest::new("partial", fx.cache())
        .with_name("alpha")
        .with_output(&out);
    let result = fx.deployer().deploy(&request).unwrap();

    let root = out.join("alpha");
    assert_eq!(
        result.deployed,
        vec![root.clone(), root.join("one.txt"), root.join("three.txt")]
    );
    assert_eq!(result.skipped, vec![root.join("two.txt")]);
    assert!(!root.join("two.txt").exists());
}

#[test]
fn test_redeploy_is_idempotent() {
    let fx = Fixture::new();
    write_template(
        &fx.cache(),
        "again",
        &project_descriptor("again"),
        &[("lib/__REPLACE__.rb.tmpl", "module {{toClassName project_name}}\nend\n")],
    );

    let out = fx.temp.path().join("out");
    let request = DeploymentRequest::new("again", fx.cache())
        .with_name("beta")
        .with_output(&out);
    let deployer = fx.deployer();

    let first = deployer.deploy(&request).unwrap();
    let file = out.join("beta/lib/beta.rb");
    fs::write(&file, "local edit").unwrap();
    let second = deployer.deploy(&request).unwrap();

    assert_eq!(first.deployed, second.deployed);
    assert!(second.is_complete());
    assert_eq!(fs::read_to_string(&file).unwrap(), "module Beta\nend\n");
}
