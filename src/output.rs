use std::path::PathBuf;

use serde::Serialize;

use jsx_graph::error::FileError;
use jsx_graph::graph::GraphStats;
use jsx_graph::graph::builder::BuildSummary;
use jsx_graph::marker::MarkerSummary;
use jsx_graph::patch::{PatchReport, StepOutcome, StepPreview};

/// Result of a `build` run.
#[derive(Debug, Serialize)]
pub struct BuildStats {
    #[serde(flatten)]
    pub summary: BuildSummary,
    pub graph: GraphStats,
    pub index_entries: usize,
    pub graph_path: PathBuf,
    pub index_path: PathBuf,
}

/// Result of a `refresh` run.
#[derive(Debug, Serialize)]
pub struct RefreshStats {
    pub removed: usize,
    pub added: usize,
    pub nodes: usize,
    pub edges: usize,
    pub failed_files: usize,
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{s}"),
        Err(e) => eprintln!("error serialising output: {e}"),
    }
}

/// Per-file failures go to stderr so stdout stays clean for JSON consumers.
fn print_errors(errors: &[FileError]) {
    for e in errors {
        eprintln!("  failed: {}: {}", e.file, e.error);
    }
}

pub fn print_marker_summary(summary: &MarkerSummary, json: bool) {
    if json {
        print_json(summary);
        return;
    }

    println!(
        "Processed {}/{} files",
        summary.processed_files, summary.total_files
    );
    if summary.markers_added > 0 || summary.markers_removed == 0 {
        println!("  {} markers added", summary.markers_added);
    }
    if summary.markers_removed > 0 {
        println!("  {} markers removed", summary.markers_removed);
    }
    if summary.failed_files > 0 {
        eprintln!("  {} files failed", summary.failed_files);
        print_errors(&summary.errors);
    }
}

pub fn print_build_stats(stats: &BuildStats, json: bool) {
    if json {
        print_json(stats);
        return;
    }

    println!(
        "Built graph from {}/{} files",
        stats.summary.built_files, stats.summary.total_files
    );
    println!(
        "  {} nodes ({} functions, {} elements, {} unresolved), {} edges",
        stats.graph.nodes,
        stats.graph.functions,
        stats.graph.elements,
        stats.graph.placeholders,
        stats.graph.edges,
    );
    let by_kind: Vec<String> = stats
        .graph
        .edges_by_kind
        .iter()
        .map(|(kind, n)| format!("{n} {kind}"))
        .collect();
    println!("  {}", by_kind.join(", "));
    println!("  {} fingerprints indexed", stats.index_entries);
    println!("  wrote {}", stats.graph_path.display());
    println!("  wrote {}", stats.index_path.display());
    if stats.summary.failed_files > 0 {
        eprintln!("  {} files failed", stats.summary.failed_files);
        print_errors(&stats.summary.errors);
    }
}

pub fn print_refresh_stats(stats: &RefreshStats, json: bool) {
    if json {
        print_json(stats);
        return;
    }
    println!("Removed {} markers, added {}", stats.removed, stats.added);
    println!("Rebuilt graph: {} nodes, {} edges", stats.nodes, stats.edges);
    if stats.failed_files > 0 {
        eprintln!("  {} files failed", stats.failed_files);
    }
}

pub fn print_patch_report(report: &PatchReport, json: bool) {
    if json {
        print_json(report);
        return;
    }

    for step in &report.steps {
        match &step.outcome {
            StepOutcome::Applied {
                applied,
                skipped,
                formatted,
            } => {
                let note = if *formatted { "" } else { " (unformatted)" };
                println!(
                    "{}: {applied} applied, {skipped} skipped{note}",
                    step.file
                );
            }
            StepOutcome::FileNotFound => println!("{}: file not found", step.file),
            StepOutcome::Failed { error } => println!("{}: failed: {error}", step.file),
        }
    }
    println!(
        "{} change(s) applied, {} skipped",
        report.applied_changes(),
        report.skipped_changes()
    );
}

pub fn print_previews(previews: &[StepPreview], json: bool) {
    if json {
        print_json(&previews);
        return;
    }

    for p in previews {
        println!("Would modify: {}", p.file);
        println!("  Action: {}", p.action);
        println!("  Reason: {}", p.reason.as_deref().unwrap_or("n/a"));
        println!("  Changes: {} replacement(s)", p.changes);
    }
    println!("Dry run complete. No files were modified.");
}
