//! publish command - Publish a directory under its ref name

use crate::cli::args::PublishArgs;
use crate::core::config::Config;
use crate::core::types::CommitIdentity;
use crate::engine::{Context, PublishSettings, Publisher};
use crate::git::Git;
use crate::ui::output::{self, Verbosity};
use anyhow::{Context as _, Result};

/// Publish `args.source` to the configured target.
pub fn publish(ctx: &Context, args: &PublishArgs) -> Result<()> {
    let config = Config::load(args.config.as_deref(), Some(args.source.as_path()))
        .context("Failed to load configuration")?;

    let verbosity = match ctx.verbosity {
        Verbosity::Normal if config.verbose() => Verbosity::Verbose,
        v => v,
    };
    if let Some(path) = config.global_config_loaded_from() {
        output::debug(format!("global config: {}", path.display()), verbosity);
    }
    if let Some(path) = config.project_config_loaded_from() {
        output::debug(format!("project config: {}", path.display()), verbosity);
    }

    let settings = resolve_settings(args, &config);
    let git_path = args
        .git_path
        .clone()
        .unwrap_or_else(|| config.git_path().to_path_buf());
    let git = Git::new(git_path).with_verbosity(verbosity);

    let report = Publisher::new(&git, verbosity)
        .run(&settings)
        .with_context(|| format!("Failed to publish '{}'", args.source.display()))?;

    output::debug(
        format!(
            "published {} to {}{}",
            report.identity,
            report.location,
            if report.pushed { " (pushed)" } else { "" }
        ),
        verbosity,
    );
    Ok(())
}

/// Layer CLI options over loaded configuration.
///
/// Choosing `--repo` or `--target` on the command line replaces both
/// configured destinations, so a file-level `target` never collides with a
/// CLI `--repo`.
pub fn resolve_settings(args: &PublishArgs, config: &Config) -> PublishSettings {
    let mut settings = PublishSettings::new(&args.source);

    settings.git_ref = args
        .git_ref
        .clone()
        .or_else(|| config.git_ref().map(str::to_string));
    settings.sha = args.sha.clone().or_else(|| config.sha().map(str::to_string));

    if args.repo.is_some() || args.target.is_some() {
        settings.repo = args.repo.clone();
        settings.target = args.target.clone();
    } else {
        settings.repo = config.repo().map(str::to_string);
        settings.target = config.target().map(|p| p.to_path_buf());
    }

    settings.branch = args
        .branch
        .clone()
        .unwrap_or_else(|| config.branch().to_string());
    settings.force = args.force || config.force();
    settings.manifest = args.manifest || config.manifest();
    settings.aliases = config.aliases();
    settings.identity = CommitIdentity::new(
        args.name
            .as_deref()
            .or(config.name())
            .unwrap_or(CommitIdentity::DEFAULT_NAME),
        args.email
            .as_deref()
            .or(config.email())
            .unwrap_or(CommitIdentity::DEFAULT_EMAIL),
    );

    settings
}
