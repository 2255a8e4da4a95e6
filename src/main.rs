mod cli;
mod output;

use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use jsx_graph::config::JsxGraphConfig;
use jsx_graph::format;
use jsx_graph::graph::GraphStore;
use jsx_graph::graph::builder::{BuildOptions, BuildSummary, build_all};
use jsx_graph::index::FingerprintIndex;
use jsx_graph::marker::{MarkerOptions, inject_markers, strip_markers};
use jsx_graph::patch::{ChangePlan, apply_plan, preview_plan};
use jsx_graph::query::context::assemble_context;
use jsx_graph::walker::collect_files;

use cli::{Cli, Commands};
use output::{BuildStats, RefreshStats};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    match cli.command {
        Commands::Inject { path, json } => {
            let config = JsxGraphConfig::load(&path);
            let summary = inject_markers(&path, &MarkerOptions::from_config(&config));
            output::print_marker_summary(&summary, json);
        }

        Commands::Strip { path, json } => {
            let config = JsxGraphConfig::load(&path);
            let formatter = format::from_config(&config.formatter);
            let summary = strip_markers(
                &path,
                &MarkerOptions::from_config(&config),
                formatter.as_ref(),
            );
            output::print_marker_summary(&summary, json);
        }

        Commands::Build { path, json } => {
            let config = JsxGraphConfig::load(&path);
            let stats = build(&path, &config)?;
            output::print_build_stats(&stats, json);
        }

        Commands::Refresh { path, json } => {
            let config = JsxGraphConfig::load(&path);
            let options = MarkerOptions::from_config(&config);
            let formatter = format::from_config(&config.formatter);

            info!("removing existing markers");
            let removed = strip_markers(&path, &options, formatter.as_ref());
            info!("adding markers");
            let added = inject_markers(&path, &options);
            info!("rebuilding graph");
            let built = build(&path, &config)?;

            let stats = RefreshStats {
                removed: removed.markers_removed,
                added: added.markers_added,
                nodes: built.graph.nodes,
                edges: built.graph.edges,
                failed_files: removed.failed_files
                    + added.failed_files
                    + built.summary.failed_files,
            };
            output::print_refresh_stats(&stats, json);
        }

        Commands::Context { path, id, intent } => {
            let config = JsxGraphConfig::load(&path);
            let store = load_graph(&path, &config)?;
            let text = assemble_context(&store, &id, &intent)?;
            println!("{text}");
        }

        Commands::Lookup { path, id } => {
            let config = JsxGraphConfig::load(&path);
            let index_path = config.index_path(&path);
            let index = FingerprintIndex::load(&index_path).with_context(|| {
                format!(
                    "no fingerprint index at {}; run `jsx-graph build` first",
                    index_path.display()
                )
            })?;
            let entry = index.lookup(&id)?;
            println!("{}", serde_json::to_string_pretty(entry)?);
        }

        Commands::Show { path } => {
            let config = JsxGraphConfig::load(&path);
            let store = load_graph(&path, &config)?;
            print!("{}", store.render_text());
        }

        Commands::Apply {
            path,
            plan,
            dry_run,
            json,
        } => {
            let change_plan = ChangePlan::load(&plan)
                .with_context(|| format!("failed to read plan {}", plan.display()))?;
            if dry_run {
                output::print_previews(&preview_plan(&change_plan), json);
            } else {
                let config = JsxGraphConfig::load(&path);
                let formatter = format::from_config(&config.formatter);
                let report = apply_plan(&path, &change_plan, formatter.as_ref());
                output::print_patch_report(&report, json);
            }
        }
    }

    Ok(())
}

/// Build the graph from the configured source directory and write the graph
/// and fingerprint index to the output directory.
fn build(path: &Path, config: &JsxGraphConfig) -> Result<BuildStats> {
    let source_root = config.source_root(path);
    let files = collect_files(&source_root, &config.graph_walk());
    info!("found {} files under {}", files.len(), source_root.display());

    let mut store = GraphStore::new();
    let options = BuildOptions {
        attribute_name: config.attribute_name.clone(),
    };
    let summary: BuildSummary = build_all(&mut store, &files, &options);
    let index = FingerprintIndex::from_graph(&store);

    let graph_path = config.graph_path(path);
    let index_path = config.index_path(path);
    store
        .save(&graph_path)
        .with_context(|| format!("failed to write {}", graph_path.display()))?;
    index
        .save(&index_path)
        .with_context(|| format!("failed to write {}", index_path.display()))?;

    Ok(BuildStats {
        summary,
        graph: store.stats(),
        index_entries: index.len(),
        graph_path,
        index_path,
    })
}

fn load_graph(path: &Path, config: &JsxGraphConfig) -> Result<GraphStore> {
    let graph_path = config.graph_path(path);
    GraphStore::load(&graph_path).with_context(|| {
        format!(
            "no graph at {}; run `jsx-graph build` first",
            graph_path.display()
        )
    })
}
