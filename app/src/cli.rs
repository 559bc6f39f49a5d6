use std::path::PathBuf;

use clap::Parser;
use dem_mesh::HeightMode;
use glob::glob;

#[derive(Parser, Debug, Default)]
#[command(
    name = "geomesh",
    about = "Turn LAS point clouds and elevation GeoTIFFs into renderable glTF",
    author = "MIERUNE Inc.",
    version
)]
pub struct Cli {
    /// LAS or GeoTIFF files; glob patterns are expanded.
    #[arg(short, long, required = true, num_args = 1.., value_name = "FILE")]
    pub input: Vec<String>,

    #[arg(short, long, required = true, value_name = "DIR")]
    pub output: PathBuf,

    /// JSON configuration file.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Distance from the viewer to the cloud, used to pick the LOD tier.
    #[arg(long)]
    pub viewer_distance: Option<f64>,

    #[arg(long)]
    pub height_scale: Option<f32>,

    /// exaggerated or metric
    #[arg(long, value_parser = parse_height_mode)]
    pub height_mode: Option<HeightMode>,

    #[arg(long)]
    pub cache_capacity: Option<usize>,

    /// off, error, warn, info, debug or trace
    #[arg(long)]
    pub log_level: Option<String>,
}

fn parse_height_mode(value: &str) -> Result<HeightMode, String> {
    match value.to_ascii_lowercase().as_str() {
        "exaggerated" => Ok(HeightMode::Exaggerated),
        "metric" => Ok(HeightMode::Metric),
        other => Err(format!("unknown height mode {other:?}")),
    }
}

pub fn expand_globs(input_patterns: &[String]) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    for pattern in input_patterns {
        if pattern.contains('*') || pattern.contains('?') || pattern.contains('[') {
            match glob(pattern) {
                Ok(entries) => {
                    for entry in entries {
                        match entry {
                            Ok(path) => paths.push(path),
                            Err(e) => log::warn!("Skipping unreadable match: {}", e),
                        }
                    }
                }
                Err(e) => log::error!("Invalid glob pattern {:?}: {}", pattern, e),
            }
        } else {
            paths.push(PathBuf::from(pattern));
        }
    }
    paths
}
