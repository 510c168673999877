//! One-shot route queries against a lane map and a routing plan.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pnc_cli::{
    neighbors_json, path_json, route_segments_json, waypoint_index_json, waypoint_json,
};
use pnc_core::{LaneGraph, LaneWaypoint, PncMap, PncMapConfig, Vec2};
use pnc_service::sources;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Query route segments, waypoints and paths from JSON map and plan files
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Lane map JSON
    #[arg(long, default_value = "data/sample_map.json")]
    map: String,

    /// Routing plan JSON
    #[arg(long, default_value = "data/sample_routing.json")]
    routing: String,

    /// Max lateral distance for matching a point to the route, in meters
    #[arg(long, default_value_t = 5.0)]
    max_lateral: f64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Route segment candidates around a position
    Segments {
        #[arg(long, allow_hyphen_values = true)]
        x: f64,
        #[arg(long, allow_hyphen_values = true)]
        y: f64,
        /// Distance kept behind the position
        #[arg(long, default_value_t = 10.0)]
        backward: f64,
        /// Distance kept ahead of the position
        #[arg(long, default_value_t = 250.0)]
        forward: f64,
    },
    /// Nearest on-route waypoint
    Nearest {
        #[arg(long, allow_hyphen_values = true)]
        x: f64,
        #[arg(long, allow_hyphen_values = true)]
        y: f64,
    },
    /// Passages reachable by one lane change
    Neighbors {
        #[arg(long)]
        road: usize,
        #[arg(long)]
        passage: usize,
    },
    /// Plan positions covering a lane station
    WaypointIndex {
        #[arg(long)]
        lane: String,
        #[arg(long)]
        s: f64,
    },
    /// Sampled path of the current-passage candidate around a position
    Path {
        #[arg(long, allow_hyphen_values = true)]
        x: f64,
        #[arg(long, allow_hyphen_values = true)]
        y: f64,
        #[arg(long, default_value_t = 10.0)]
        backward: f64,
        #[arg(long, default_value_t = 250.0)]
        forward: f64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive("pnc_core=warn".parse()?))
        .init();

    let args = Args::parse();

    let map = Arc::new(sources::load_map(&args.map).await?);
    let routing = sources::load_routing(&args.routing).await?;
    let config = PncMapConfig {
        max_lateral_distance_m: args.max_lateral,
        ..PncMapConfig::default()
    };
    let pnc = PncMap::new(map.clone(), config);
    pnc.update_routing_response(routing);

    let output = match args.command {
        Command::Segments { x, y, backward, forward } => {
            let candidates = pnc.get_route_segments(Vec2::new(x, y), backward, forward)?;
            route_segments_json(&candidates)
        }
        Command::Nearest { x, y } => {
            waypoint_json(&pnc.get_nearest_point_from_routing(Vec2::new(x, y))?)
        }
        Command::Neighbors { road, passage } => {
            neighbors_json(&pnc.get_neighbor_passages(road, passage)?)
        }
        Command::WaypointIndex { lane, s } => {
            let lane = map
                .lane_by_id(&lane)
                .with_context(|| format!("lane {} is not in the map", lane))?;
            waypoint_index_json(&pnc.get_waypoint_index(&LaneWaypoint::new(lane, s)))
        }
        Command::Path { x, y, backward, forward } => {
            let candidates = pnc.get_route_segments(Vec2::new(x, y), backward, forward)?;
            let own = candidates
                .first()
                .context("no route segments around the position")?;
            path_json(&pnc.create_path_from_lane_segments(own)?)
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
