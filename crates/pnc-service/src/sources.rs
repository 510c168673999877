//! JSON file inputs: the lane map, the routing plan and the vehicle pose.

use anyhow::{Context, Result};
use pnc_core::{RoadMap, RoadMapRecord, RoutingResponse, Vec2};
use serde::de::DeserializeOwned;
use std::path::Path;
use std::time::SystemTime;
use tokio::fs;

async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let bytes = fs::read(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_slice(&bytes).with_context(|| format!("parsing {}", path.display()))
}

pub async fn load_map(path: impl AsRef<Path>) -> Result<RoadMap> {
    let path = path.as_ref();
    let record: RoadMapRecord = read_json(path).await?;
    let map = RoadMap::from_record(record)
        .with_context(|| format!("building lane map from {}", path.display()))?;
    anyhow::ensure!(!map.is_empty(), "lane map {} has no lanes", path.display());
    tracing::info!("Loaded {} lanes from {}", map.len(), path.display());
    Ok(map)
}

pub async fn load_routing(path: impl AsRef<Path>) -> Result<RoutingResponse> {
    read_json(path.as_ref()).await
}

pub async fn load_pose(path: impl AsRef<Path>) -> Result<Vec2> {
    let path = path.as_ref();
    let pose: Vec2 = read_json(path).await?;
    anyhow::ensure!(pose.is_finite(), "pose in {} is not finite", path.display());
    Ok(pose)
}

/// Modification time, used to skip reloading unchanged files.
pub async fn modified_at(path: impl AsRef<Path>) -> Result<SystemTime> {
    let path = path.as_ref();
    let metadata = fs::metadata(path)
        .await
        .with_context(|| format!("stat {}", path.display()))?;
    metadata
        .modified()
        .with_context(|| format!("modification time of {}", path.display()))
}
