use std::fs;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use owo_colors::OwoColorize;
use tracing_subscriber::EnvFilter;
use vnshelf_core::{
    Aggregator, EmptyReason, Endpoints, FetchConfig, JsonConfig, Outcome, Settings, TextConfig, convert_to_json,
    convert_to_text,
};

mod echo;

use echo::{print_banner, print_info, print_player_details, print_step, print_success, print_timing, print_warning};

pub(crate) const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Output format for the aggregate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Json,
    Text,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "text" | "txt" => Ok(Self::Text),
            _ => Err(format!("Invalid format: {}. Valid options: json, text", s)),
        }
    }
}

/// Show a VNDB user's recently finished and playing visual novels, favourites and stats
#[derive(Parser, Debug)]
#[command(name = "vnshelf")]
#[command(version)]
#[command(about = "Visual novel activity from VNDB", long_about = None)]
struct Args {
    /// Settings file (default: <config dir>/vnshelf/config.json)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// VNDB user id or username; enables the run regardless of the settings file
    #[arg(short, long, value_name = "ID")]
    user: Option<String>,

    /// Number of recently finished titles to show
    #[arg(long, value_name = "NUM")]
    finished_limit: Option<usize>,

    /// Number of currently playing titles to show
    #[arg(long, value_name = "NUM")]
    playing_limit: Option<usize>,

    /// Favourite VN id, repeatable; replaces the configured favourites
    #[arg(long = "favourite", value_name = "ID")]
    favourites: Vec<String>,

    /// Tags kept per title
    #[arg(long, value_name = "NUM")]
    tag_max: Option<usize>,

    /// Output format (json, text)
    #[arg(short, long, default_value = "text", value_name = "FORMAT")]
    format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long)]
    pretty: bool,

    /// Output file (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Embed covers as base64 JPEG data URIs
    #[arg(long)]
    inline_images: bool,

    /// Cover width in pixels
    #[arg(long, value_name = "PX")]
    image_width: Option<u32>,

    /// Cover height in pixels
    #[arg(long, value_name = "PX")]
    image_height: Option<u32>,

    /// HTTP timeout in seconds
    #[arg(long, default_value = "30", value_name = "SECS")]
    timeout: u64,

    /// Custom User-Agent for HTTP requests
    #[arg(long, value_name = "UA")]
    user_agent: Option<String>,

    /// Base URL of the VNDB JSON API
    #[arg(long, value_name = "URL")]
    api_base: Option<String>,

    /// Base URL of the VNDB website
    #[arg(long, value_name = "URL")]
    site_base: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    /// Applies command-line overrides on top of file settings.
    fn apply(&self, mut settings: Settings) -> Settings {
        if let Some(user) = &self.user {
            settings.enabled = true;
            settings.user = Some(user.clone());
        }
        if let Some(limit) = self.finished_limit {
            settings.finished_limit = limit;
        }
        if let Some(limit) = self.playing_limit {
            settings.playing_limit = limit;
        }
        if !self.favourites.is_empty() {
            settings.favourites = self.favourites.clone();
        }
        if let Some(max) = self.tag_max {
            settings.tag_max = max;
        }
        if let Some(width) = self.image_width {
            settings.image_width = width;
        }
        if let Some(height) = self.image_height {
            settings.image_height = height;
        }
        settings.inline_images |= self.inline_images;

        tracing::debug!(
            user = settings.user.as_deref().unwrap_or_default(),
            finished_limit = settings.finished_limit,
            playing_limit = settings.playing_limit,
            favourites = settings.favourites.len(),
            "applied command-line overrides"
        );
        settings
    }

    fn endpoints(&self) -> Endpoints {
        let defaults = Endpoints::default();
        Endpoints {
            api_base: self.api_base.clone().unwrap_or(defaults.api_base),
            site_base: self.site_base.clone().unwrap_or(defaults.site_base),
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "vnshelf_core=debug,vnshelf=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).with_target(false).init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    if args.verbose {
        print_banner();
        print_info("Debug logging enabled");
        eprintln!();
        print_step(1, 3, "Loading settings");
    }

    let settings = match &args.config {
        Some(path) => Settings::load(path).with_context(|| format!("Failed to load settings: {}", path.display()))?,
        None => Settings::load_default().context("Failed to load default settings")?,
    };
    tracing::debug!(enabled = settings.enabled, "settings loaded");
    let settings = args.apply(settings);
    let config = settings.activate().context("Settings are not usable")?;

    if args.verbose {
        if !config.user_id.is_empty() {
            eprintln!("  {} {}", "User:".dimmed(), config.user_id.bright_white());
        }
        eprintln!("  {} {}", "Favourites:".dimmed(), config.favourite_ids.len().to_string().bright_white());
        eprintln!();
        print_step(2, 3, "Fetching activity from VNDB");
    }

    let fetch = FetchConfig {
        timeout: args.timeout,
        user_agent: args.user_agent.clone().unwrap_or_else(|| FetchConfig::default().user_agent),
    };
    let aggregator = Aggregator::over_http(&fetch, settings.inline_images)
        .context("Failed to set up HTTP client")?
        .with_endpoints(args.endpoints());

    let started = Instant::now();
    let outcome = aggregator.aggregate(&config).await;
    if args.verbose {
        print_timing("Aggregation", started.elapsed());
    }

    let result = match outcome {
        Outcome::Ready(result) => result,
        Outcome::Empty(EmptyReason::NoUser) => {
            print_info("No user configured, nothing to show");
            return Ok(());
        }
        Outcome::Empty(EmptyReason::Failed(reason)) => {
            print_warning(&format!("Nothing to show: {}", reason));
            return Ok(());
        }
    };

    if args.verbose {
        print_player_details(
            &result.player,
            [
                ("Finished shown", result.finished_vns.len()),
                ("Playing shown", result.playing_vns.len()),
                ("Favourites shown", result.favourite_vns.len()),
            ],
        );
        print_step(3, 3, "Writing output");
        eprintln!("  {} {}", "Format:".dimmed(), format!("{:?}", args.format).bright_white());
        eprintln!();
    }

    let output = match args.format {
        OutputFormat::Json => {
            convert_to_json(&result, &JsonConfig { pretty: args.pretty }).context("Failed to convert to JSON")?
        }
        OutputFormat::Text => convert_to_text(&result, &TextConfig::default()),
    };

    match args.output {
        Some(path) => {
            fs::write(&path, output).with_context(|| format!("Failed to write to file: {}", path.display()))?;
            print_success(&format!("Output written to {}", path.display().bright_white()));
        }
        None => println!("{}", output),
    }

    Ok(())
}
