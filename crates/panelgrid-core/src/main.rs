//! panelgrid command line
//!
//! Inspect the topology catalog, run the codec by hand, and walk an
//! in-memory engine through a workspace's lifecycle.

use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use panelgrid_codec::{CellBox, Codec, ContainerSize, PercentageVector, PixelFractionMap};
use panelgrid_core::{CellElement, EngineConfig, LayoutEngine, LayoutPublisher, RenderSurface};
use panelgrid_store::{InMemoryBackend, WorkspaceId};
use panelgrid_topology::Topology;
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    let topology = || {
        Arg::new("topology")
            .long("topology")
            .short('t')
            .required(true)
            .help("Topology identifier, e.g. left-large")
    };
    let vector = || {
        Arg::new("vector")
            .long("vector")
            .required(true)
            .allow_hyphen_values(true)
            .help("Comma-separated percentage vector")
    };

    Command::new("panelgrid")
        .version(panelgrid_core::VERSION)
        .about("Dashboard layout persistence engine")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Engine configuration file (TOML)"),
        )
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON lines"),
        )
        .subcommand(
            Command::new("topologies")
                .about("List the topology catalog")
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output as JSON"),
                ),
        )
        .subcommand(
            Command::new("encode")
                .about("Encode cell boxes (container percent) into a percentage vector")
                .arg(topology())
                .arg(
                    Arg::new("boxes")
                        .long("boxes")
                        .required(true)
                        .help(r#"JSON array of {"top","left","width","height"}"#),
                ),
        )
        .subcommand(
            Command::new("decode")
                .about("Decode a percentage vector into per-cell geometry")
                .arg(topology())
                .arg(vector())
                .arg(
                    Arg::new("width")
                        .long("width")
                        .requires("height")
                        .value_parser(value_parser!(f64))
                        .help("Container width in pixels"),
                )
                .arg(
                    Arg::new("height")
                        .long("height")
                        .requires("width")
                        .value_parser(value_parser!(f64))
                        .help("Container height in pixels"),
                ),
        )
        .subcommand(
            Command::new("raw")
                .about("Convert a percentage vector to the durable store's position record")
                .arg(topology())
                .arg(vector()),
        )
        .subcommand(
            Command::new("demo")
                .about("Resize, save, migrate and reload a workspace against an in-memory store")
                .arg(
                    Arg::new("topology")
                        .long("topology")
                        .short('t')
                        .default_value("left-large")
                        .help("Topology identifier"),
                )
                .arg(
                    Arg::new("vector")
                        .long("vector")
                        .default_value("55,65,35")
                        .help("Layout the user drags to"),
                ),
        )
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn arg<'a>(args: &'a ArgMatches, name: &str) -> Result<&'a str> {
    args.get_one::<String>(name)
        .map(String::as_str)
        .with_context(|| format!("missing --{name}"))
}

fn vector_arg(args: &ArgMatches) -> Result<PercentageVector> {
    arg(args, "vector")?.parse().context("invalid --vector")
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = cli().get_matches();
    init_tracing(matches.get_flag("log-json"));

    let config = match matches.get_one::<PathBuf>("config") {
        Some(path) => EngineConfig::from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => EngineConfig::default(),
    };
    let codec = Codec::builtin().with_config(config.codec_config());

    match matches.subcommand() {
        Some(("topologies", args)) => list_topologies(&codec, args.get_flag("json")),
        Some(("encode", args)) => encode(&codec, args),
        Some(("decode", args)) => decode(&codec, args),
        Some(("raw", args)) => raw(&codec, args),
        Some(("demo", args)) => demo(config, args).await,
        _ => Ok(()),
    }
}

fn list_topologies(codec: &Codec, json: bool) -> Result<()> {
    let registry = codec.registry();
    if json {
        let entries: Vec<_> = registry
            .iter()
            .map(|t| {
                serde_json::json!({
                    "id": t.id(),
                    "cells": t.cell_count(),
                    "axis": t.axis_kind(),
                    "defaults": PercentageVector::new(t.default_vector()).to_csv(),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    println!("{:<24} {:>5}  {:<10} DEFAULTS", "ID", "CELLS", "AXIS");
    for t in registry.iter() {
        println!(
            "{:<24} {:>5}  {:<10} {}",
            t.id(),
            t.cell_count(),
            format!("{:?}", t.axis_kind()).to_lowercase(),
            PercentageVector::new(t.default_vector()).to_csv()
        );
    }
    Ok(())
}

fn encode(codec: &Codec, args: &ArgMatches) -> Result<()> {
    let topology_id = arg(args, "topology")?;
    let boxes: Vec<CellBox> = serde_json::from_str(arg(args, "boxes")?).context("invalid --boxes")?;
    let vector = codec.encode(topology_id, &boxes)?;
    println!("vector {}", vector.to_csv());
    println!("key    {}", vector.content_key(topology_id));
    Ok(())
}

fn decode(codec: &Codec, args: &ArgMatches) -> Result<()> {
    let topology_id = arg(args, "topology")?;
    let layout = codec.try_decode(topology_id, &vector_arg(args)?)?;

    let container = match (args.get_one::<f64>("width"), args.get_one::<f64>("height")) {
        (Some(&width), Some(&height)) => Some(ContainerSize::new(width, height)),
        _ => None,
    };
    match container {
        Some(container) => {
            for (cell, px) in layout.to_pixels(container) {
                println!(
                    "{:<8} top {:>8.1}px  left {:>8.1}px  width {:>8.1}px  height {:>8.1}px",
                    cell.as_str(),
                    px.top, px.left, px.width, px.height
                );
            }
        }
        None => {
            for (cell, _) in layout.iter() {
                if let Some(css) = layout.css(cell) {
                    println!(
                        "{:<8} top {:>8}  left {:>8}  width {:>8}  height {:>8}",
                        cell.as_str(),
                        css.top, css.left, css.width, css.height
                    );
                }
            }
        }
    }
    Ok(())
}

fn raw(codec: &Codec, args: &ArgMatches) -> Result<()> {
    let record = codec.to_raw(arg(args, "topology")?, &vector_arg(args)?)?;
    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}

/// Fixed-size surface that renders whatever layout it was last shown
struct DemoSurface {
    container: ContainerSize,
    shown: Mutex<Option<PixelFractionMap>>,
}

impl DemoSurface {
    fn show(&self, layout: PixelFractionMap) {
        *self.shown.lock() = Some(layout);
    }
}

impl RenderSurface for DemoSurface {
    fn container_size(&self) -> ContainerSize {
        self.container
    }

    fn cell_elements(&self, _topology: &Topology) -> Vec<CellElement> {
        self.shown
            .lock()
            .as_ref()
            .map(|layout| {
                layout
                    .to_pixels(self.container)
                    .into_iter()
                    .map(|(cell, rect)| CellElement::new(cell, rect))
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Publisher that logs each layout and keeps the latest
#[derive(Default)]
struct LogPublisher {
    last: Mutex<Option<PixelFractionMap>>,
}

impl LayoutPublisher for LogPublisher {
    fn publish_layout(&self, workspace: &WorkspaceId, layout: &PixelFractionMap) {
        tracing::info!(workspace = %workspace, topology = layout.topology_id(), cells = layout.len(), "layout published");
        *self.last.lock() = Some(layout.clone());
    }
}

async fn demo(config: EngineConfig, args: &ArgMatches) -> Result<()> {
    let topology_id = arg(args, "topology")?;
    let dragged = vector_arg(args)?;

    let backend = Arc::new(InMemoryBackend::default());
    let surface = Arc::new(DemoSurface {
        container: ContainerSize::new(1200.0, 800.0),
        shown: Mutex::new(None),
    });
    let publisher = Arc::new(LogPublisher::default());
    let engine = LayoutEngine::new(config.clone(), surface.clone(), publisher.clone(), backend.clone())?;

    let draft = WorkspaceId::provisional();
    let first = engine.on_workspace_activated(&draft, topology_id).await;
    println!("activate {draft}: {first}");

    surface.show(engine.codec().try_decode(topology_id, &dragged)?);
    engine.on_resize_stop(draft.clone(), topology_id);
    let saved = engine
        .flush(&draft)
        .await
        .context("resize did not schedule a save")?;
    println!("save {draft}: {saved:?}");

    let durable = WorkspaceId::durable(1);
    let migrated = engine.on_workspace_saved(&draft, &durable).await;
    println!("migrate {draft} -> {durable}: {migrated:?}");

    // a second session with an empty local cache reads the durable store
    let reload_config = EngineConfig {
        local_snapshot_path: None,
        ..config
    };
    let reload_publisher = Arc::new(LogPublisher::default());
    let reload = LayoutEngine::new(reload_config, surface, reload_publisher.clone(), backend)?;
    let reloaded = reload.on_workspace_activated(&durable, topology_id).await;
    println!("reload {durable}: {reloaded}");

    if let Some(layout) = reload_publisher.last.lock().as_ref() {
        for (cell, rect) in layout.iter() {
            println!(
                "  {:<8} top {:>6.2}  left {:>6.2}  width {:>6.2}  height {:>6.2}",
                cell.as_str(),
                rect.top, rect.left, rect.width, rect.height
            );
        }
    }
    Ok(())
}
