//! config command - Show effective configuration values

use std::path::Path;

use crate::core::config::Config;
use crate::engine::Context;
use crate::ui::output;
use anyhow::{Context as _, Result};

/// List effective configuration values and the files they came from.
pub fn list(ctx: &Context, explicit: Option<&Path>, source: Option<&Path>) -> Result<()> {
    let start = source.unwrap_or_else(|| Path::new("."));
    let config = Config::load(explicit, Some(start)).context("Failed to load configuration")?;

    for line in render(&config) {
        output::print(line, ctx.verbosity);
    }
    Ok(())
}

/// Render the listing, one `key = value` per line.
fn render(config: &Config) -> Vec<String> {
    fn show(value: Option<impl std::fmt::Display>) -> String {
        value
            .map(|v| v.to_string())
            .unwrap_or_else(|| "(not set)".to_string())
    }

    let mut lines = vec!["# Configuration Files".to_string()];
    lines.push(format!(
        "global = {}",
        show(config.global_config_loaded_from().map(Path::display))
    ));
    lines.push(format!(
        "project = {}",
        show(config.project_config_loaded_from().map(Path::display))
    ));

    lines.push(String::new());
    lines.push("# Effective Values".to_string());
    lines.push(format!("ref = {}", show(config.git_ref())));
    lines.push(format!("sha = {}", show(config.sha())));
    lines.push(format!("target = {}", show(config.target().map(Path::display))));
    lines.push(format!("repo = {}", show(config.repo())));
    lines.push(format!("branch = {}", config.branch()));
    lines.push(format!("force = {}", config.force()));
    lines.push(format!("name = {}", show(config.name())));
    lines.push(format!("email = {}", show(config.email())));
    lines.push(format!("git-path = {}", config.git_path().display()));
    lines.push(format!("verbose = {}", config.verbose()));
    lines.push(format!("manifest = {}", config.manifest()));
    let aliases = config
        .aliases()
        .iter()
        .map(|(alias, pattern)| format!("{alias}={pattern}"))
        .collect::<Vec<_>>()
        .join(", ");
    lines.push(format!("aliases = {}", aliases));
    lines
}
