//! reamerge - merge recorded sessions into a mix template
//!
//! Subcommands:
//! - `reamerge inspect <session>...` - Summarize sessions
//! - `reamerge plan <session>...` - Show session offsets on the merged timeline
//! - `reamerge match --template <t> <session>...` - Show the track assignment
//! - `reamerge merge --template <t> --output <o> <session>...` - Write the merged project
//! - `reamerge config` - Print the effective configuration

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use mergeconf::MergeConfig;

mod commands;

use commands::{MatchSettings, MergeSettings};

#[derive(Parser)]
#[command(name = "reamerge")]
#[command(about = "Merge recorded sessions into a mix template")]
#[command(version)]
struct Cli {
    /// Config file, used instead of ./reamerge.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct MatchArgs {
    /// Alias as PATTERN=DESTINATION (wildcards allowed); repeatable
    #[arg(short, long = "alias")]
    aliases: Vec<String>,

    /// Lowest score for an automatic match (0 to 1)
    #[arg(long)]
    threshold: Option<f64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarize sessions: tempo, tracks, markers, length
    Inspect {
        /// Session files
        #[arg(required = true)]
        sessions: Vec<PathBuf>,
    },

    /// Show where each session starts on the merged timeline
    Plan {
        /// Session files, in timeline order
        #[arg(required = true)]
        sessions: Vec<PathBuf>,

        /// Empty measures between sessions
        #[arg(short, long)]
        gap: Option<u32>,
    },

    /// Match session tracks to template tracks
    Match {
        /// Template project
        #[arg(short, long)]
        template: Option<PathBuf>,

        /// Session files
        #[arg(required = true)]
        sessions: Vec<PathBuf>,

        #[command(flatten)]
        matching: MatchArgs,
    },

    /// Merge sessions into the template and write the result
    Merge {
        /// Template project
        #[arg(short, long)]
        template: Option<PathBuf>,

        /// Where to write the merged project
        #[arg(short, long)]
        output: PathBuf,

        /// Session files, in timeline order
        #[arg(required = true)]
        sessions: Vec<PathBuf>,

        /// Empty measures between sessions
        #[arg(short, long)]
        gap: Option<u32>,

        /// Leave lanes as recorded instead of aligning them
        #[arg(long)]
        no_align_lanes: bool,

        /// Remove template tracks that received nothing
        #[arg(long)]
        cleanup: bool,

        /// Prefix merged marker names with their session name
        #[arg(long)]
        prefix_markers: bool,

        #[command(flatten)]
        matching: MatchArgs,
    },

    /// Print the effective configuration and where it came from
    Config,
}

fn match_settings(args: MatchArgs, config: &MergeConfig) -> Result<MatchSettings> {
    let threshold = args.threshold.unwrap_or(config.matching.threshold);
    if !(0.0..=1.0).contains(&threshold) {
        anyhow::bail!("--threshold must be between 0 and 1, got {}", threshold);
    }
    Ok(MatchSettings {
        threshold,
        aliases: args.aliases,
    })
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let (config, sources) =
        MergeConfig::load_with_sources_from(cli.config.as_deref()).context("Failed to load configuration")?;

    // Logs go to stderr so --json output stays clean
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level)),
        )
        .init();

    match cli.command {
        Commands::Inspect { sessions } => {
            commands::inspect(&sessions, config.merge.gap_measures, cli.json)?;
        }
        Commands::Plan { sessions, gap } => {
            commands::plan(&sessions, gap.unwrap_or(config.merge.gap_measures), cli.json)?;
        }
        Commands::Match {
            template,
            sessions,
            matching,
        } => {
            let template = commands::resolve_template(template, &config)?;
            let matching = match_settings(matching, &config)?;
            commands::match_tracks(&template, &sessions, &matching, &config, cli.json)?;
        }
        Commands::Merge {
            template,
            output,
            sessions,
            gap,
            no_align_lanes,
            cleanup,
            prefix_markers,
            matching,
        } => {
            let template = commands::resolve_template(template, &config)?;
            let matching = match_settings(matching, &config)?;
            let settings = MergeSettings {
                gap: gap.unwrap_or(config.merge.gap_measures),
                align_lanes: config.merge.align_lanes && !no_align_lanes,
                cleanup: cleanup || config.merge.cleanup_unused,
                prefix_markers: prefix_markers || config.merge.prefix_markers,
                output,
            };
            commands::merge(&template, &sessions, &matching, &settings, &config, cli.json)?;
        }
        Commands::Config => {
            commands::show_config(&config, &sources, cli.json)?;
        }
    }

    Ok(())
}
