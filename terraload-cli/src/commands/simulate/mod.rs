//! Simulate command - drive the tile pipeline with synthetic providers.
//!
//! A camera sweeps east along a parallel. Each frame the tiles under it are
//! refined one level further than their renderable parent, every visible
//! tile is advanced one step, and tiles off the camera path are evicted
//! once the tree exceeds its cache size.

mod imagery;
mod terrain;

use std::cmp::Reverse;
use std::collections::HashSet;
use std::sync::Arc;
use terraload::config::TerraloadConfig;
use terraload::coord::{Cartographic, GeographicTilingScheme, TilingScheme};
use terraload::imagery::ImageryLayerCollection;
use terraload::render::CountingRenderContext;
use terraload::request::{RequestScheduler, RequestType};
use terraload::tile::{Tile, TileKey, TileState, TileTree};
use tracing::info;

use self::imagery::SyntheticImageryLayer;
use self::terrain::SyntheticTerrainProvider;
use crate::error::{CliError, CliResult};

/// Arguments for the simulate command.
pub struct SimulateArgs {
    pub ticks: usize,
    pub levels: u32,
    pub data_levels: u32,
    pub latency: u32,
    pub latitude: f64,
    pub speed: f64,
    pub tile_cache_size: Option<usize>,
}

/// Run the simulate command.
pub fn run(args: SimulateArgs, config: &TerraloadConfig) -> CliResult<()> {
    if !(-90.0..=90.0).contains(&args.latitude) {
        return Err(CliError::InvalidArgument(format!(
            "latitude {} is outside [-90, 90]",
            args.latitude
        )));
    }

    let mut tiles = config.tiles.clone();
    if let Some(size) = args.tile_cache_size {
        tiles = tiles.with_tile_cache_size(size);
    }
    let levels = args.levels.min(tiles.max_level);

    let mut scheduler = RequestScheduler::new(config.scheduler.clone());
    let mut completed = scheduler.subscribe_completed();
    let mut tree = TileTree::new(Arc::new(GeographicTilingScheme::new()), tiles);
    let mut context = CountingRenderContext::new();
    let provider = SyntheticTerrainProvider::new(args.latency, args.data_levels);
    let mut layers =
        ImageryLayerCollection::new().with_layer(Box::new(SyntheticImageryLayer::new(args.latency)));

    tree.create_level_zero_tiles();

    println!(
        "Simulating {} frames: refine to level {}, data to level {}, latency {} frames",
        args.ticks, levels, args.data_levels, args.latency
    );

    let mut evicted = 0;
    let mut failed_requests = 0;
    for tick in 0..args.ticks {
        let longitude = camera_longitude(tick, args.speed);
        let focus = Cartographic::from_degrees(longitude, args.latitude);

        scheduler.update();
        let visible = visible_tiles(&mut tree, focus, levels);
        for &key in &visible {
            tree.process_state_machine(key, &mut context, &provider, &mut layers, &mut scheduler);
        }

        if tree.is_over_capacity() {
            evicted += evict(&mut tree, &visible, &mut context, &mut layers);
        }

        while let Ok(event) = completed.try_recv() {
            if event.error.is_some() {
                failed_requests += 1;
            }
        }

        tracing::debug!(
            tick,
            longitude,
            visible = visible.len(),
            tiles = tree.len(),
            active = scheduler.active_len(),
            queued = scheduler.queued_len(),
            "Frame"
        );
    }

    let counts = tree.state_counts();
    let count = |state: TileState| counts.get(&state).copied().unwrap_or_default();
    let statistics = scheduler.statistics();

    info!(
        tiles = tree.len(),
        ready = count(TileState::Ready),
        evicted,
        "Simulation finished"
    );

    println!();
    println!("Tiles");
    println!("  In tree:  {}", tree.len());
    println!(
        "  Start: {}  Loading: {}  Ready: {}  Failed: {}",
        count(TileState::Start),
        count(TileState::Loading),
        count(TileState::Ready),
        count(TileState::Failed)
    );
    println!(
        "  Upsampled from parent: {}",
        tree.iter().filter(|tile| tile.upsampled_from_parent()).count()
    );
    println!("  Evicted subtrees: {}", evicted);
    println!();
    println!("Requests");
    println!("  Attempted: {}", statistics.number_of_attempted_requests);
    println!("  Started:   {}", statistics.number_of_active_requests_ever);
    println!(
        "  Completed: {} terrain, {} imagery",
        statistics.completed_by_type(RequestType::Terrain),
        statistics.completed_by_type(RequestType::Imagery)
    );
    println!(
        "  Cancelled: {} ({} while active)",
        statistics.number_of_cancelled_requests, statistics.number_of_cancelled_active_requests
    );
    println!("  Failed:    {}", failed_requests);
    println!();
    println!("Render resources");
    println!("  Live textures:      {}", context.live_textures());
    println!("  Live vertex arrays: {}", context.live_vertex_arrays());
    println!("  Water mask textures: {}", tree.water_masks().len());

    tree.destroy(&mut context, &mut layers);
    if context.live_textures() > 0 || context.live_vertex_arrays() > 0 {
        tracing::warn!(
            textures = context.live_textures(),
            vertex_arrays = context.live_vertex_arrays(),
            "Render resources leaked after teardown"
        );
    }

    Ok(())
}

/// Longitude in degrees, wrapped into [-180, 180).
fn camera_longitude(tick: usize, speed: f64) -> f64 {
    (tick as f64 * speed).rem_euclid(360.0) - 180.0
}

/// Roots plus the chain of tiles under `focus`, refined while the parent
/// is renderable.
fn visible_tiles(tree: &mut TileTree, focus: Cartographic, levels: u32) -> Vec<TileKey> {
    let mut visible = tree.roots().to_vec();
    let Some((x, y)) = tree.tiling_scheme().position_to_tile_xy(focus, 0) else {
        return visible;
    };

    let mut current = TileKey::new(x, y, 0);
    for level in 1..=levels {
        if !tree.get(current).is_some_and(Tile::is_renderable) {
            break;
        }
        let Some((x, y)) = tree.tiling_scheme().position_to_tile_xy(focus, level) else {
            break;
        };
        let next = TileKey::new(x, y, level);
        let Some(children) = tree.children(current) else {
            break;
        };
        if !children.contains(&next) {
            break;
        }
        visible.push(next);
        current = next;
    }
    visible
}

/// Frees the subtrees of off-path tiles, deepest first, until the tree fits.
fn evict(
    tree: &mut TileTree,
    visible: &[TileKey],
    context: &mut CountingRenderContext,
    layers: &mut ImageryLayerCollection,
) -> usize {
    let visible: HashSet<TileKey> = visible.iter().copied().collect();
    let mut candidates: Vec<TileKey> = tree
        .iter()
        .filter(|tile| tile.children().is_some() && !visible.contains(&tile.key()))
        .map(Tile::key)
        .collect();
    candidates.sort_by_key(|key| Reverse(key.level));

    let mut evicted = 0;
    for key in candidates {
        if !tree.is_over_capacity() {
            break;
        }
        if tree.get(key).is_none() || !tree.eligible_for_unloading(key, layers) {
            continue;
        }
        tree.free_resources(key, context, layers);
        evicted += 1;
    }
    evicted
}

#[cfg(test)]
mod tests {
    use super::*;
    use terraload::config::TileLoadConfig;

    #[test]
    fn test_camera_longitude_wraps() {
        assert_eq!(camera_longitude(0, 10.0), -180.0);
        assert_eq!(camera_longitude(18, 10.0), 0.0);
        assert_eq!(camera_longitude(36, 10.0), -180.0);
    }

    #[test]
    fn test_visible_tiles_stop_at_unrenderable_parent() {
        let mut tree = TileTree::new(
            Arc::new(GeographicTilingScheme::new()),
            TileLoadConfig::default(),
        );
        tree.create_level_zero_tiles();

        let visible = visible_tiles(&mut tree, Cartographic::from_degrees(-90.0, 10.0), 4);

        assert_eq!(visible, tree.roots().to_vec());
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn test_simulation_runs_clean() {
        let config = TerraloadConfig::default();
        let args = SimulateArgs {
            ticks: 20,
            levels: 3,
            data_levels: 2,
            latency: 1,
            latitude: 10.0,
            speed: 20.0,
            tile_cache_size: Some(16),
        };
        assert!(run(args, &config).is_ok());
    }

    #[test]
    fn test_invalid_latitude_rejected() {
        let args = SimulateArgs {
            ticks: 1,
            levels: 1,
            data_levels: 1,
            latency: 0,
            latitude: 95.0,
            speed: 1.0,
            tile_cache_size: None,
        };
        assert!(matches!(
            run(args, &TerraloadConfig::default()),
            Err(CliError::InvalidArgument(_))
        ));
    }
}
