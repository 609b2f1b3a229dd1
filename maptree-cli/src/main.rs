use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use anyhow::Result;
use anyhow::bail;
use clap::Parser;
use log::info;
use log::warn;
use maptree_lib::FeatureClient;
use maptree_lib::InteractiveMap;
use maptree_lib::LayerState;
use maptree_lib::LoadOutcome;
use maptree_lib::config::LayerSource;
use maptree_lib::config::MapConfig;
use maptree_lib::csrf::StaticCsrfToken;
use maptree_lib::model::Bounds;
use maptree_lib::model::LatLng;
use maptree_lib::tree;
use maptree_lib::tree::TreeNode;
use maptree_lib::widget::HeadlessWidget;
use simplelog::ColorChoice;
use simplelog::Config;
use simplelog::LevelFilter;
use simplelog::TermLogger;
use simplelog::TerminalMode;
use simplelog::WriteLogger;

/// Loads a layer tree endpoint without a browser and prints what it offers.
#[derive(Parser, Debug)]
#[command(name = "maptree", version)]
struct Args {
    /// Server the tree and layer URLs are relative to
    #[arg(long)]
    base_url: String,

    /// Layer tree endpoint, e.g. /map/tree/
    #[arg(long)]
    tree_url: Option<String>,

    #[arg(long)]
    csrf_token: Option<String>,

    /// Viewport as NE_LAT,NE_LNG,SW_LAT,SW_LNG
    #[arg(
        long,
        value_parser = parse_bounds,
        default_value = "-10,154,-29,138",
        allow_hyphen_values = true
    )]
    bounds: Bounds,

    /// Map configuration as JSON
    #[arg(long)]
    config: Option<PathBuf>,

    /// Leaf labels to toggle on after the tree loads
    #[arg(long)]
    show: Vec<String>,

    /// Write logs here instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,

    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

fn parse_bounds(value: &str) -> Result<Bounds, String> {
    let parts = value
        .split(',')
        .map(|part| part.trim().parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| format!("invalid coordinate: {}", e))?;

    let [ne_lat, ne_lng, sw_lat, sw_lng] = parts[..] else {
        return Err(format!("expected 4 coordinates, got {}", parts.len()));
    };

    let north_east = LatLng::new(ne_lat, ne_lng);
    let south_west = LatLng::new(sw_lat, sw_lng);
    north_east.validate().map_err(|e| e.to_string())?;
    south_west.validate().map_err(|e| e.to_string())?;
    Ok(Bounds::new(north_east, south_west))
}

fn init_logging(args: &Args) -> Result<()> {
    let level = if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    match &args.log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create log file {}", path.display()))?;
            WriteLogger::init(level, Config::default(), file)?;
        }
        None => {
            TermLogger::init(
                level,
                Config::default(),
                TerminalMode::Stderr,
                ColorChoice::Auto,
            )?;
        }
    }
    Ok(())
}

fn load_config(args: &Args) -> Result<MapConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("Failed to open config {}", path.display()))?;
            serde_json::from_reader(file)
                .with_context(|| format!("Failed to parse config {}", path.display()))?
        }
        None => MapConfig::default(),
    };

    if let Some(tree_url) = &args.tree_url {
        config = config.with_layer(LayerSource::tree(tree_url.clone()));
    }
    if config.layers.is_empty() {
        bail!("Nothing to load: pass --tree-url or a config with layers");
    }
    config.validate()?;
    Ok(config)
}

fn print_nodes(nodes: &[TreeNode], indent: usize) {
    let pad = "  ".repeat(indent);
    for node in nodes {
        match node {
            TreeNode::Category(category) => {
                println!("{}- {}", pad, category.label);
                print_nodes(&category.children, indent + 1);
            }
            TreeNode::Leaf(leaf) => {
                let layer = &leaf.layer;
                let mark = if layer.is_visible() { "x" } else { " " };
                let state = match layer.state() {
                    LayerState::Empty => "empty".to_string(),
                    LayerState::Populated => format!("{} features", layer.feature_count()),
                };
                let url = leaf.url().unwrap_or("no url");
                print!("{}[{}] {} ({}, {})", pad, mark, leaf.label, url, state);
                if let Some(err) = layer.last_error() {
                    print!(" last error: {}", err);
                }
                println!();
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args)?;

    let config = load_config(&args)?;

    let csrf = match &args.csrf_token {
        Some(token) => StaticCsrfToken::new(token.clone()),
        None => StaticCsrfToken::empty(),
    };
    let client = FeatureClient::builder()
        .base_url(args.base_url.clone())
        .csrf(csrf)
        .build()?;

    let widget = Arc::new(HeadlessWidget::new(args.bounds));
    let map = InteractiveMap::new("map", config, widget, Arc::new(client))?;

    let loaded = map.load_layers().await;
    info!(
        "Loaded {} of {} layer sources",
        loaded,
        map.config().layers.len()
    );

    let Some(nodes) = map.tree() else {
        bail!("No layer tree was loaded");
    };

    for label in &args.show {
        match tree::find_leaf(&nodes, label) {
            Some(leaf) => {
                if let LoadOutcome::Failed(err) = leaf.layer.show().await {
                    warn!("Layer '{}' failed to load: {}", label, err);
                }
            }
            None => warn!("No layer labelled '{}'", label),
        }
    }

    print_nodes(&nodes, 0);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bounds() {
        let bounds = parse_bounds("-10, 154,-29,138").unwrap();
        assert_eq!(bounds.north_east, LatLng::new(-10.0, 154.0));
        assert_eq!(bounds.south_west, LatLng::new(-29.0, 138.0));
    }

    #[test]
    fn test_parse_bounds_rejects_bad_input() {
        assert!(parse_bounds("1,2,3").is_err());
        assert!(parse_bounds("a,2,3,4").is_err());
        assert!(parse_bounds("91,0,0,0").is_err());
    }

    #[test]
    fn test_args_parse() {
        let args = Args::try_parse_from([
            "maptree",
            "--base-url",
            "http://localhost:8000",
            "--tree-url",
            "/map/tree/",
            "--bounds",
            "-10,154,-29,138",
            "--show",
            "Roads",
            "--show",
            "States",
        ])
        .unwrap();
        assert_eq!(args.show, vec!["Roads", "States"]);
        assert_eq!(args.bounds.south_west.lat, -29.0);
    }
}
