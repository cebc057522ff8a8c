use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "license-fetchr",
    about = "Resolve license identifiers and texts for a list of dependencies",
    version
)]
pub struct Cli {
    /// File listing all module dependencies, one per line
    #[arg(long, value_name = "FILE")]
    pub modules: PathBuf,

    /// Output JSON file for dependencies with a resolved license
    #[arg(long, value_name = "FILE")]
    pub json_output: PathBuf,

    /// Output JSON file for dependencies whose license could not be found
    #[arg(long, value_name = "FILE")]
    pub json_missing_output: Option<PathBuf>,

    /// JSON file with manually curated licenses
    #[arg(long, value_name = "FILE")]
    pub json_manual_input: Option<PathBuf>,

    /// GitHub token for authenticated API calls (higher rate limits)
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,

    /// Query pkg.go.dev for modules not hosted on GitHub
    #[arg(long)]
    pub try_pkg_go_dev: bool,

    /// Config file [default: ./.license-fetchr/config.toml, fallback ~/.config/license-fetchr/config.toml]
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Number of concurrent workers [default: 12, or dispatch.workers from config]
    #[arg(long, value_name = "N")]
    pub workers: Option<usize>,

    /// Show resolved dependencies and debug logs
    #[arg(short, long)]
    pub verbose: bool,

    /// Only print summary line
    #[arg(short, long)]
    pub quiet: bool,
}
