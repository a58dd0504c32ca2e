//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--verbose` / `-v`: Print every step and git command to stderr
//! - `--quiet` / `-q`: Suppress informational output

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// refpages - Publish built documentation under a directory named for its git ref
#[derive(Parser, Debug)]
#[command(name = "refpages")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Print diagnostics for every step to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress informational output; errors are always printed
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Publish a directory under its git ref name
    #[command(
        name = "publish",
        long_about = "Publish a directory under a subdirectory named for its git ref.\n\n\
            The ref is taken from --ref or detected from the git checkout containing \
            SOURCE. Tags and branches are published under their short names with '/' \
            replaced by '-', so refs/heads/feature/login lands in feature-login/.\n\n\
            With --target the copy goes into a local directory. With --repo the target \
            branch (gh-pages by default) is cloned into a temporary directory, updated, \
            committed and pushed. Other refs already published on the branch are kept.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Publish the current branch's build to gh-pages
    refpages publish docs/_build/html --repo git@github.com:org/project.git

    # Publish a release build to a local directory
    refpages publish site/ --ref refs/tags/v1.2.0 --target /srv/docs

    # Replace the branch history instead of adding to it
    refpages publish site/ --repo ../project.git --force

    # Keep a versions.json index next to the published refs
    refpages publish site/ --repo ../project.git --manifest"
    )]
    Publish(PublishArgs),

    /// Inspect configuration
    #[command(
        name = "config",
        long_about = "Inspect refpages configuration.\n\n\
            Configuration is read from a global file and an optional project \
            refpages.toml found next to the sources; CLI options override both."
    )]
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completion scripts
    #[command(
        name = "completion",
        long_about = "Generate shell completion scripts for tab-completion.\n\n\
            Outputs a completion script for the specified shell. Add the output \
            to your shell's configuration to enable tab-completion for refpages commands.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Bash (add to ~/.bashrc)
    refpages completion bash >> ~/.bashrc

    # Zsh (add to ~/.zshrc)
    refpages completion zsh >> ~/.zshrc

    # Fish
    refpages completion fish > ~/.config/fish/completions/refpages.fish

    # PowerShell
    refpages completion powershell >> $PROFILE"
    )]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Options for `publish`.
#[derive(Args, Debug, Clone, Default)]
pub struct PublishArgs {
    /// Directory whose contents are published
    pub source: PathBuf,

    /// Git ref to publish under (detected from SOURCE when omitted)
    #[arg(long = "ref", value_name = "REF")]
    pub git_ref: Option<String>,

    /// Commit SHA recorded in the commit message (detected when omitted)
    #[arg(long)]
    pub sha: Option<String>,

    /// Local directory to publish into
    #[arg(long, value_name = "DIR", conflicts_with = "repo")]
    pub target: Option<PathBuf>,

    /// Git repository URL or path to publish into
    #[arg(long, value_name = "URL")]
    pub repo: Option<String>,

    /// Branch of --repo to publish to [default: gh-pages]
    #[arg(short, long)]
    pub branch: Option<String>,

    /// Replace the previous deploy commit and force push
    #[arg(long)]
    pub force: bool,

    /// Commit author name
    #[arg(long)]
    pub name: Option<String>,

    /// Commit author email
    #[arg(long)]
    pub email: Option<String>,

    /// Path to the git executable
    #[arg(long, value_name = "PATH")]
    pub git_path: Option<PathBuf>,

    /// Maintain versions.json at the target root
    #[arg(long)]
    pub manifest: bool,

    /// Project config file (default: nearest refpages.toml above SOURCE)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

/// Config subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ConfigAction {
    /// List effective configuration values and the files they came from
    List {
        /// Project config file (default: nearest refpages.toml)
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Directory to start the refpages.toml search from [default: .]
        source: Option<PathBuf>,
    },
}

/// Supported shells for completion.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    #[value(name = "powershell")]
    PowerShell,
}
