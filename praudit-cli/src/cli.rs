use std::path::PathBuf;

use clap::Parser;

/// Audit a repository branch for npm vulnerabilities and manage the PR
/// report comment
#[derive(Parser)]
#[command(name = "praudit", version)]
pub struct Cli {
    /// Clone URL of the repository to audit
    #[arg(long)]
    pub url: String,

    /// Repository name; names the local working copy
    #[arg(long)]
    pub repo: String,

    /// Branch to check out and scan
    #[arg(long)]
    pub branch: String,

    /// Directory that holds working copies
    #[arg(long, default_value = ".praudit-work")]
    pub workdir: PathBuf,

    /// Post the report to this pull request number instead of printing it
    #[arg(long, requires = "owner")]
    pub pr: Option<u64>,

    /// Repository owner login, required when posting a comment
    #[arg(long)]
    pub owner: Option<String>,

    /// GitHub API token used when posting
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Skip the audit and emit the fixed placeholder body
    #[arg(long)]
    pub dry_run: bool,

    /// Override the audit command, whitespace-separated (default: "npm audit --json")
    #[arg(long)]
    pub scanner: Option<String>,

    #[command(flatten)]
    pub verbosity: clap_verbosity_flag::Verbosity,
}
