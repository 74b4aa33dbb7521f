mod provenance;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use geofence::structure::TreeNode;
use geofence::{EngineCfg, Point, Workspace};
use serde::Serialize;
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing_subscriber::fmt::SubscriberBuilder;
use tracing_subscriber::EnvFilter;

use provenance::Payload;

#[derive(Parser)]
#[command(name = "geofence-cli")]
#[command(about = "Offline tools over campus structure and trigger files")]
struct Cmd {
    /// JSON file overriding engine settings (partial files are fine)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    action: Action,
}

#[derive(Subcommand)]
enum Action {
    /// Print boundary and band area per structure, in m²
    Area {
        #[arg(long)]
        input: PathBuf,
    },
    /// List structures whose boundary or band contains a point
    Locate {
        #[arg(long)]
        input: PathBuf,
        /// Trigger export to attach active triggers from
        #[arg(long)]
        triggers: Option<PathBuf>,
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lng: f64,
    },
    /// Regenerate every trigger band and write the structure envelope
    Bands {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        out: PathBuf,
    },
    /// Export structures as a GeoJSON FeatureCollection
    Geojson {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        out: PathBuf,
        /// Emit walk boundaries as polygons instead of line strings
        #[arg(long)]
        force_polygon: bool,
    },
    /// Print the structure forest
    Tree {
        #[arg(long)]
        input: PathBuf,
    },
    /// Check a trigger export against a structure file
    Triggers {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        triggers: PathBuf,
    },
    /// Print a small provenance JSON block
    Report,
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    SubscriberBuilder::default()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();
    let cmd = Cmd::parse();
    let cfg = load_cfg(cmd.config.as_deref())?;
    match cmd.action {
        Action::Area { input } => area(cfg, &input),
        Action::Locate {
            input,
            triggers,
            lat,
            lng,
        } => locate(cfg, &input, triggers.as_deref(), Point::new(lat, lng)),
        Action::Bands { input, out } => bands(cfg, &input, &out),
        Action::Geojson {
            input,
            out,
            force_polygon,
        } => geojson(cfg, &input, &out, force_polygon),
        Action::Tree { input } => tree(cfg, &input),
        Action::Triggers { input, triggers } => triggers_check(cfg, &input, &triggers),
        Action::Report => report(),
    }
}

fn load_cfg(path: Option<&Path>) -> Result<EngineCfg> {
    let Some(path) = path else {
        return Ok(EngineCfg::default());
    };
    let text = read(path)?;
    let cfg = serde_json::from_str(&text)
        .with_context(|| format!("parsing config {}", path.display()))?;
    tracing::info!(config = %path.display(), "config loaded");
    Ok(cfg)
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

fn load_workspace(cfg: EngineCfg, input: &Path) -> Result<Workspace> {
    let mut ws = Workspace::new(cfg);
    let imported = ws
        .import_structures(&read(input)?)
        .with_context(|| format!("importing structures from {}", input.display()))?;
    for r in &imported.renamed {
        tracing::warn!(from = ?r.from, to = %r.to, "structure code reassigned");
    }
    tracing::info!(
        input = %input.display(),
        structures = imported.structures.len(),
        skipped = imported.skipped,
        "structures loaded"
    );
    Ok(ws)
}

fn write_artifact(out: &Path, body: &[u8], payload: Payload) -> Result<()> {
    if let Some(parent) = out.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
    }
    std::fs::write(out, body).with_context(|| format!("writing {}", out.display()))?;
    let prov = provenance::write_sidecar(out, payload)?;
    tracing::info!(out = %out.display(), provenance = %prov.display(), "written");
    Ok(())
}

fn area(cfg: EngineCfg, input: &Path) -> Result<()> {
    let ws = load_workspace(cfg, input)?;
    for a in ws.areas() {
        println!("{}\t{:.1}\t{:.1}", a.code, a.boundary_m2, a.band_m2);
    }
    Ok(())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LocateHit<'a> {
    code: &'a str,
    name: &'a str,
    in_boundary: bool,
    in_band: bool,
    triggers: Vec<&'a str>,
}

fn locate(cfg: EngineCfg, input: &Path, triggers: Option<&Path>, p: Point) -> Result<()> {
    let mut ws = load_workspace(cfg, input)?;
    if let Some(path) = triggers {
        let outcome = ws
            .import_triggers(&read(path)?, true)
            .with_context(|| format!("importing triggers from {}", path.display()))?;
        tracing::info!(added = outcome.added, skipped = outcome.skipped, "triggers loaded");
    }
    let hits: Vec<LocateHit> = ws
        .locate(p)
        .into_iter()
        .map(|h| LocateHit {
            code: &h.structure.code,
            name: &h.structure.name,
            in_boundary: h.in_boundary,
            in_band: h.in_band,
            triggers: h.triggers.iter().map(|t| t.id.as_str()).collect(),
        })
        .collect();
    println!("{}", serde_json::to_string_pretty(&hits)?);
    Ok(())
}

fn bands(cfg: EngineCfg, input: &Path, out: &Path) -> Result<()> {
    let mut ws = load_workspace(cfg, input)?;
    let codes: Vec<String> = ws.structures().iter().map(|s| s.code.clone()).collect();
    for code in &codes {
        ws.regenerate_band(code)?;
    }
    let body = serde_json::to_vec_pretty(&ws.export_structures())?;
    let payload = Payload::new(json!({
        "command": "bands",
        "structures": codes.len(),
        "corridorScale": ws.cfg().corridor_scale,
    }))
    .with_input(input);
    write_artifact(out, &body, payload)
}

fn geojson(cfg: EngineCfg, input: &Path, out: &Path, force_polygon: bool) -> Result<()> {
    let ws = load_workspace(cfg, input)?;
    let body = serde_json::to_vec_pretty(&ws.export_geojson(force_polygon))?;
    let payload = Payload::new(json!({
        "command": "geojson",
        "forcePolygon": force_polygon,
    }))
    .with_input(input);
    write_artifact(out, &body, payload)
}

fn print_node(node: &TreeNode<'_>) {
    println!(
        "{}{} ({})",
        "  ".repeat(node.depth),
        node.structure.code,
        node.structure.name
    );
    for child in &node.children {
        print_node(child);
    }
}

fn tree(cfg: EngineCfg, input: &Path) -> Result<()> {
    let ws = load_workspace(cfg, input)?;
    let forest = ws.forest();
    let reachable: usize = forest.iter().map(TreeNode::size).sum();
    for root in &forest {
        print_node(root);
    }
    if reachable < ws.structures().len() {
        tracing::warn!(
            unreachable = ws.structures().len() - reachable,
            "structures caught in a parent cycle"
        );
    }
    Ok(())
}

fn triggers_check(cfg: EngineCfg, input: &Path, triggers: &Path) -> Result<()> {
    let mut ws = load_workspace(cfg, input)?;
    let outcome = ws
        .import_triggers(&read(triggers)?, true)
        .with_context(|| format!("importing triggers from {}", triggers.display()))?;
    let orphans: Vec<&str> = ws
        .orphaned_triggers()
        .into_iter()
        .map(|t| t.id.as_str())
        .collect();
    let summary = json!({
        "accepted": outcome.added,
        "rejected": outcome.skipped,
        "orphaned": orphans,
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn report() -> Result<()> {
    let obj = provenance::block(json!({}));
    println!("{}", serde_json::to_string_pretty(&obj)?);
    Ok(())
}
