//! CLI command implementations

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use consolidate::{ConsolidateOptions, DiagnosticKind};
use mergeconf::{ConfigSources, MergeConfig};
use reamerge::output::{assignment_matrix, matrix_table, offset_rows, offsets_table, SessionSummary};
use reamerge::Workbench;
use rpp::{Feedback, FeedbackLevel};
use serde::Serialize;
use timeline::MarkerNaming;
use tracing::{info, warn};
use trackmatch::{Alias, AliasSet, TrackMatcher};

/// Matching settings after config and flags are combined.
pub struct MatchSettings {
    pub threshold: f64,
    pub aliases: Vec<String>,
}

/// Merge settings after config and flags are combined.
pub struct MergeSettings {
    pub gap: u32,
    pub align_lanes: bool,
    pub cleanup: bool,
    pub prefix_markers: bool,
    pub output: PathBuf,
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let output = serde_json::to_string_pretty(value)?;
    println!("{}", output);
    Ok(())
}

fn log_feedback(path: &Path, feedback: &[Feedback]) {
    for f in feedback {
        match f.level {
            FeedbackLevel::Error | FeedbackLevel::Warning => {
                warn!(file = %path.display(), line = f.line, code = ?f.code, "{}", f.message)
            }
            FeedbackLevel::Info => info!(file = %path.display(), "{}", f.message),
        }
    }
}

/// Queue every session, keeping parse feedback per session.
fn load_sessions(bench: &mut Workbench, paths: &[PathBuf]) -> Result<Vec<Vec<Feedback>>> {
    let mut all = Vec::with_capacity(paths.len());
    for path in paths {
        let feedback = bench
            .load_session(path)
            .with_context(|| format!("Failed to load session {}", path.display()))?;
        log_feedback(path, &feedback);
        all.push(feedback);
    }
    Ok(all)
}

fn load_template(bench: &mut Workbench, path: &Path) -> Result<()> {
    let feedback = bench
        .load_template(path)
        .with_context(|| format!("Failed to load template {}", path.display()))?;
    log_feedback(path, &feedback);
    Ok(())
}

/// Template from the command line, else from config.
pub fn resolve_template(flag: Option<PathBuf>, config: &MergeConfig) -> Result<PathBuf> {
    match flag.or_else(|| config.merge.template.clone()) {
        Some(path) => Ok(path),
        None => bail!(
            "No template given.\n\n\
             Pass --template <FILE> or set it in the config:\n  \
             [merge]\n  \
             template = \"~/templates/band.rpp\""
        ),
    }
}

/// Command-line aliases first, then the configured ones; earlier wins.
fn build_matcher(settings: &MatchSettings, config: &MergeConfig) -> Result<TrackMatcher> {
    let mut aliases = Vec::new();
    for raw in &settings.aliases {
        let alias: Alias = raw.parse().with_context(|| format!("Bad --alias '{}'", raw))?;
        aliases.push(alias);
    }
    aliases.extend(
        config
            .aliases
            .iter()
            .map(|(pattern, destination)| Alias::new(pattern.as_str(), destination.as_str())),
    );
    Ok(TrackMatcher::new(settings.threshold, AliasSet::new(&aliases)))
}

/// Summarize each session.
pub fn inspect(paths: &[PathBuf], gap: u32, json: bool) -> Result<()> {
    let mut bench = Workbench::new(gap);
    let feedback = load_sessions(&mut bench, paths)?;

    let summaries: Vec<SessionSummary> = bench
        .sessions()
        .iter()
        .zip(&feedback)
        .map(|(s, f)| SessionSummary::new(s, f))
        .collect();

    if json {
        return print_json(&summaries);
    }
    for summary in &summaries {
        print!("{}", summary);
    }
    Ok(())
}

/// Print where each session lands on the merged timeline.
pub fn plan(paths: &[PathBuf], gap: u32, json: bool) -> Result<()> {
    let mut bench = Workbench::new(gap);
    load_sessions(&mut bench, paths)?;

    let rows = offset_rows(bench.sessions());
    if json {
        return print_json(&rows);
    }
    print!("{}", offsets_table(&rows));
    println!("total: {} measures, {:.3}s", bench.end().measure, bench.end().time);
    Ok(())
}

/// Auto-match sessions against a template and print the assignment.
pub fn match_tracks(template: &Path, paths: &[PathBuf], settings: &MatchSettings, config: &MergeConfig, json: bool) -> Result<()> {
    let matcher = build_matcher(settings, config)?;
    let mut bench = Workbench::new(config.merge.gap_measures);
    load_template(&mut bench, template)?;
    load_sessions(&mut bench, paths)?;

    let results = bench.auto_match(&matcher);
    let rows = assignment_matrix(bench.destinations(), bench.sessions(), bench.assignment());
    if json {
        return print_json(&rows);
    }
    print!("{}", matrix_table(&rows, bench.sessions()));
    println!("{} tracks matched", results.len());
    Ok(())
}

/// Full run: plan, match, consolidate and write the merged project.
pub fn merge(
    template: &Path,
    paths: &[PathBuf],
    matching: &MatchSettings,
    settings: &MergeSettings,
    config: &MergeConfig,
    json: bool,
) -> Result<()> {
    let matcher = build_matcher(matching, config)?;
    let mut bench = Workbench::new(settings.gap);
    load_template(&mut bench, template)?;
    load_sessions(&mut bench, paths)?;

    let matched = bench.auto_match(&matcher);
    info!(matched = matched.len(), "tracks matched");

    let options = ConsolidateOptions {
        align_lanes: settings.align_lanes,
        cleanup_unused: settings.cleanup,
    };
    let naming = if settings.prefix_markers {
        MarkerNaming::SessionPrefix
    } else {
        MarkerNaming::Keep
    };
    let (doc, report) = bench.commit(options, naming).context("Failed to merge sessions")?;

    doc.save(&settings.output)
        .with_context(|| format!("Failed to write {}", settings.output.display()))?;

    if json {
        return print_json(&report);
    }
    println!("{}", report.summary());
    if report.removed > 0 {
        println!("{} unused tracks removed", report.removed);
    }
    let unresolved = report.count(DiagnosticKind::MediaUnresolved);
    if unresolved > 0 {
        println!("{} media references not found", unresolved);
    }
    for d in report
        .diagnostics
        .iter()
        .filter(|d| d.kind != DiagnosticKind::MediaUnresolved)
    {
        println!("  track {}: {}", d.destination, d.message);
    }
    println!("wrote {}", settings.output.display());
    Ok(())
}

#[derive(Serialize)]
struct ConfigReport<'a> {
    config: &'a MergeConfig,
    sources: &'a ConfigSources,
}

/// Print the merged configuration, then the files and variables it came from.
pub fn show_config(config: &MergeConfig, sources: &ConfigSources, json: bool) -> Result<()> {
    if json {
        return print_json(&ConfigReport { config, sources });
    }

    print!("{}", config.to_toml().context("Failed to render configuration")?);
    println!();
    if sources.files.is_empty() {
        println!("# no config files found, using defaults");
    }
    for file in &sources.files {
        println!("# from {}", file.display());
    }
    for var in &sources.env_overrides {
        println!("# overridden by ${}", var);
    }
    Ok(())
}
