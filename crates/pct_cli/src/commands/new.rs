//! New command - List templates or create content from one.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use tracing::{debug, info, warn};

use pct_templates::{list, DeploymentRequest, HostContext, TemplateDeployer, TemplateDescriptor};

use super::build_metadata;

#[derive(Args, Debug)]
pub struct NewArgs {
    /// Template to deploy (lists templates when omitted)
    template: Option<String>,

    /// Name for the created output, same as --name
    #[arg(value_name = "NAME")]
    positional_name: Option<String>,

    /// Location of installed templates (defaults to ~/.pdk/pct)
    #[arg(long = "templatepath", env = "PCT_TEMPLATE_PATH")]
    template_path: Option<PathBuf>,

    /// List templates
    #[arg(short, long)]
    list: bool,

    /// The name for the created output (default is the name of the current directory)
    #[arg(short, long)]
    name: Option<String>,

    /// Location to place the generated output (default is the current directory)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// JSON output
    #[arg(long)]
    json: bool,
}

impl NewArgs {
    fn target_name(&self) -> Option<String> {
        self.name.clone().or_else(|| self.positional_name.clone())
    }
}

pub fn execute(args: NewArgs) -> Result<()> {
    let templates_path = match &args.template_path {
        Some(path) => path.clone(),
        None => default_templates_path()?,
    };
    debug!("Template path: {:?}", templates_path);
    debug!("Selected template: {:?}", args.template);

    if args.list || args.template.is_none() {
        return list_templates(&templates_path, args.template.as_deref(), args.json);
    }

    let template = args.template.clone().unwrap_or_default();
    let mut request = DeploymentRequest::new(template, &templates_path).with_build(build_metadata());
    request.target_name = args.target_name();
    request.target_output = args.output.clone();

    let host = HostContext::detect().context("Failed to inspect the current environment")?;
    let result = TemplateDeployer::new(host)
        .deploy(&request)
        .with_context(|| format!("Failed to deploy template '{}'", request.template))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result.deployed)?);
    } else {
        for path in &result.deployed {
            info!("Deployed: {}", path.display());
        }
    }

    if !result.is_complete() {
        warn!(
            "{} path(s) could not be created from template '{}'",
            result.skipped.len(),
            request.template
        );
    }

    Ok(())
}

fn default_templates_path() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Unable to determine home directory")?;
    Ok(home.join(".pdk").join("pct"))
}

fn list_templates(templates_path: &Path, filter: Option<&str>, json: bool) -> Result<()> {
    let templates = list(templates_path, filter).context("Failed to list templates")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&templates)?);
    } else if templates.len() == 1 {
        println!();
        print!("{}", format_details(&templates[0]));
    } else {
        println!();
        print!("{}", format_table(&templates));
    }
    Ok(())
}

/// Detail block for a single template.
fn format_details(template: &TemplateDescriptor) -> String {
    format!(
        "DisplayName:     {}\nName:            {}\nTemplateType:    {}\nTemplateURL:     {}\nTemplateVersion: {}\n",
        template.display, template.name, template.kind, template.url, template.version
    )
}

/// Borderless DisplayName/Name/Type table.
fn format_table(templates: &[TemplateDescriptor]) -> String {
    const HEADERS: [&str; 3] = ["DISPLAYNAME", "NAME", "TYPE"];

    let rows: Vec<[&str; 3]> = templates
        .iter()
        .map(|t| [t.display.as_str(), t.name.as_str(), t.kind.as_str()])
        .collect();

    let mut widths = HEADERS.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.len());
        }
    }

    let mut out = String::new();
    for row in std::iter::once(HEADERS).chain(rows) {
        let line = row
            .iter()
            .zip(widths)
            .map(|(cell, width)| format!("{:<width$}", cell, width = width))
            .collect::<Vec<_>>()
            .join("  ");
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pct_templates::TemplateKind;

    fn descriptor(name: &str, display: &str, kind: TemplateKind) -> TemplateDescriptor {
        TemplateDescriptor {
            name: name.into(),
            kind,
            display: display.into(),
            version: "0.1.0".into(),
            url: format!("https://example.com/{}", name),
        }
    }

    #[test]
    fn test_format_details() {
        let details = format_details(&descriptor("fact", "Custom Fact", TemplateKind::Item));
        assert!(details.contains("DisplayName:     Custom Fact\n"));
        assert!(details.contains("TemplateType:    item\n"));
        assert!(details.contains("TemplateURL:     https://example.com/fact\n"));
    }

    #[test]
    fn test_format_table_aligns_columns() {
        let table = format_table(&[
            descriptor("full-project", "Full Project", TemplateKind::Project),
            descriptor("fact", "Fact", TemplateKind::Item),
        ]);
        let lines: Vec<_> = table.lines().collect();
        assert_eq!(lines[0], "DISPLAYNAME   NAME          TYPE");
        assert_eq!(lines[1], "Full Project  full-project  project");
        assert_eq!(lines[2], "Fact          fact          item");
    }

    #[test]
    fn test_name_flag_wins_over_positional() {
        let mut args = NewArgs {
            template: Some("fact".into()),
            positional_name: Some("from_arg".into()),
            template_path: None,
            list: false,
            name: Some("from_flag".into()),
            output: None,
            json: false,
        };
        assert_eq!(args.target_name().as_deref(), Some("from_flag"));

        args.name = None;
        assert_eq!(args.target_name().as_deref(), Some("from_arg"));
    }
}
