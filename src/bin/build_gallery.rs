#![forbid(unsafe_code)]

//! Fetches the channel's recent uploads, drops Shorts, and writes the static
//! gallery page. Meant to run once per site build.

use std::path::PathBuf;

use anyhow::{Context, Result};
use channel_gallery::config::{DEFAULT_CONFIG_PATH, load_config_from};
use channel_gallery::pipeline;
use channel_gallery::youtube::build_agent;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Build the static video gallery page.")]
struct Cli {
    #[arg(
        long = "config",
        value_name = "PATH",
        default_value = DEFAULT_CONFIG_PATH,
        help = "Optional KEY=\"value\" file; process environment overrides it"
    )]
    config: PathBuf,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = load_config_from(&cli.config)
        .with_context(|| format!("loading configuration ({})", cli.config.display()))?;
    info!(
        channel_id = %config.channel_id,
        search_results = config.search_results,
        desired_count = config.filter.max_count,
        output = %config.output_path.display(),
        "starting gallery build"
    );

    let agent = build_agent(config.http_timeout);
    let report = pipeline::run(&config, &agent).context("building gallery")?;

    info!(
        candidates = report.candidates,
        kept = report.kept,
        output = %report.output.display(),
        "gallery build complete"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_defaults_config_path() {
        let cli = Cli::try_parse_from(["build_gallery"]).unwrap();
        assert_eq!(cli.config, PathBuf::from(DEFAULT_CONFIG_PATH));
    }

    #[test]
    fn cli_accepts_config_override() {
        let cli = Cli::try_parse_from(["build_gallery", "--config", "/srv/site/gallery.env"])
            .unwrap();
        assert_eq!(cli.config, PathBuf::from("/srv/site/gallery.env"));
    }

    #[test]
    fn cli_rejects_unknown_flags() {
        assert!(Cli::try_parse_from(["build_gallery", "--channel", "x"]).is_err());
    }
}
