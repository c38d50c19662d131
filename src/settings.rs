use crate::chart::ChartSize;
use crate::util::{GitChartError, GitChartErrorKind};
use clap::Parser;
use serde::Deserialize;
use std::fs::read_to_string;
use std::path::{Path, PathBuf};
use std::sync::atomic::Ordering;

pub const DEFAULT_SIZE: &str = "1000x300";
pub const DEFAULT_BRANCH: &str = "master";
pub const DEFAULT_CHART_API: &str = "https://image-charts.com/chart";
pub const DEFAULT_LIMIT_HISTORY: usize = 10_000;

#[derive(Parser, Debug)]
#[command(author = "Trevor Bentley", version, about, long_about = None)]
#[command(help_template = "\
{name} v{version}, by {author-with-newline}
{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
")]
struct CliArgs {
    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Path to the repository to chart
    #[arg(short, long, default_value = ".")]
    repo: PathBuf,
    /// Branch to walk history from.  Overrides config TOML.
    #[arg(short, long)]
    branch: Option<String>,
    /// Chart size in pixels, as WIDTHxHEIGHT.  Overrides config TOML.
    #[arg(short, long, value_name = "WxH")]
    size: Option<String>,
    /// Render flat charts instead of 3D ones
    #[arg(long)]
    flat: bool,
    /// Only chart the N most recent commits
    #[arg(long, value_name = "N")]
    commits: Option<usize>,
    /// Number of commits to walk before asking for a smaller sample
    #[arg(long, value_name = "N")]
    max_history: Option<usize>,
    /// Write the report to this file instead of a temporary one
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,
    /// Print the report location instead of opening a browser
    #[arg(long)]
    no_open: bool,
    /// Only print the URL of the authors chart
    #[arg(long)]
    minimal: bool,
    /// Don't show any output, except errors and warnings
    #[arg(short, long)]
    quiet: bool,
    /// Increase verbosity of output.  Specify up to 3 times.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

pub struct GitChartCli {
    pub config: Option<PathBuf>,
    pub repo: PathBuf,
    pub output: Option<PathBuf>,
    pub should_open: bool,
    pub minimal: bool,
    branch: Option<String>,
    size: Option<String>,
    flat: bool,
    commits: Option<usize>,
    max_history: Option<usize>,
}

impl GitChartCli {
    pub fn new() -> Self {
        GitChartCli::from_args(CliArgs::parse())
    }

    fn from_args(cli: CliArgs) -> Self {
        // The minimal variant prints nothing but the URL.
        crate::util::VERBOSITY.store(
            match cli.quiet || cli.minimal {
                true => 0,
                false => (cli.verbose + 1).into(),
            },
            Ordering::Relaxed,
        );
        GitChartCli {
            config: cli.config,
            repo: cli.repo,
            output: cli.output,
            should_open: !cli.no_open,
            minimal: cli.minimal,
            branch: cli.branch,
            size: cli.size,
            flat: cli.flat,
            commits: cli.commits,
            max_history: cli.max_history,
        }
    }
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct GitChartSettings {
    pub size: Option<String>,
    pub threed: Option<bool>,
    pub branch: Option<String>,
    pub chart_api: Option<String>,
    pub limit_history: Option<usize>,
    pub commits: Option<usize>,
    pub template: Option<PathBuf>,
    pub open_command: Option<String>,
}

impl GitChartSettings {
    pub fn new(cli: &GitChartCli) -> Result<GitChartSettings, GitChartError> {
        let mut settings = match &cli.config {
            Some(path) => GitChartSettings::from_file(path)?,
            None => GitChartSettings::default(),
        };

        macro_rules! cli_to_settings {
            ($cli:ident, $settings:ident, $field:ident) => {
                if $cli.$field.is_some() {
                    $settings.$field = $cli.$field.clone()
                }
            };
        }
        cli_to_settings!(cli, settings, branch);
        cli_to_settings!(cli, settings, size);
        cli_to_settings!(cli, settings, commits);
        if cli.max_history.is_some() {
            settings.limit_history = cli.max_history;
        }
        if cli.flat {
            settings.threed = Some(false);
        }

        // Catch a malformed size before any git work happens.
        settings.size()?;
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> Result<GitChartSettings, GitChartError> {
        let toml = read_to_string(path).map_err(|e| {
            GitChartError::sourced_kind(
                GitChartErrorKind::Settings,
                Some(&format!("Configuration file not found: {}", path.display())),
                e,
            )
        })?;
        let mut settings = GitChartSettings::from_toml(&toml)?;

        // Template paths are relative to the config file.
        if let (Some(template), Some(dir)) = (&settings.template, path.parent()) {
            if template.is_relative() {
                settings.template = Some(dir.join(template));
            }
        }
        Ok(settings)
    }

    pub fn from_toml(toml: &str) -> Result<GitChartSettings, GitChartError> {
        Ok(toml::from_str(toml)?)
    }

    pub fn size(&self) -> Result<ChartSize, GitChartError> {
        self.size.as_deref().unwrap_or(DEFAULT_SIZE).parse()
    }

    pub fn threed(&self) -> bool {
        self.threed.unwrap_or(true)
    }

    pub fn branch(&self) -> &str {
        self.branch.as_deref().unwrap_or(DEFAULT_BRANCH)
    }

    pub fn chart_api(&self) -> &str {
        self.chart_api.as_deref().unwrap_or(DEFAULT_CHART_API)
    }

    pub fn limit_history(&self) -> usize {
        match self.limit_history.unwrap_or(DEFAULT_LIMIT_HISTORY) {
            x if x == 0 => usize::MAX,
            x => x,
        }
    }
}
