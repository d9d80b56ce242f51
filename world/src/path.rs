//! Waypoint path shared by every mob of a scene.

use glam::Vec2;
use iso_defence_core::{IsoProjection, TileCoord, TileProjection, ViewTransform};

/// Ordered waypoints mobs walk through, one segment per consecutive pair.
#[derive(Clone, Debug, Default)]
pub(crate) struct Path {
    waypoints: Vec<TileCoord>,
}

impl Path {
    pub(crate) fn new(waypoints: Vec<TileCoord>) -> Self {
        Self { waypoints }
    }

    pub(crate) fn waypoints(&self) -> &[TileCoord] {
        &self.waypoints
    }

    /// A path needs two waypoints before any segment exists.
    pub(crate) fn is_walkable(&self) -> bool {
        self.waypoints.len() >= 2
    }

    /// Index of the waypoint that ends the final segment.
    pub(crate) fn last_index(&self) -> usize {
        self.waypoints.len().saturating_sub(1)
    }

    /// Start and end waypoints of the segment that ends at `target`.
    pub(crate) fn segment(&self, target: usize) -> Option<(TileCoord, TileCoord)> {
        if target == 0 {
            return None;
        }
        let start = self.waypoints.get(target - 1)?;
        let end = self.waypoints.get(target)?;
        Some((*start, *end))
    }

    /// Seconds a mob moving at `speed` tiles per second needs for the segment ending at `target`.
    pub(crate) fn segment_duration(&self, target: usize, speed: f32) -> Option<f32> {
        if speed <= 0.0 {
            return None;
        }
        let (start, end) = self.segment(target)?;
        Some(segment_tiles(start, end) / speed)
    }

    /// Share of the whole path walked, from 0 to 100.
    pub(crate) fn percent_traveled(
        &self,
        target: usize,
        time_in_segment: f32,
        speed: f32,
    ) -> Option<f32> {
        let mut total = 0.0;
        let mut traveled = 0.0;
        for index in 1..self.waypoints.len() {
            let duration = self.segment_duration(index, speed)?;
            total += duration;
            if index < target {
                traveled += duration;
            } else if index == target {
                traveled += time_in_segment.min(duration);
            }
        }
        if total <= 0.0 {
            return None;
        }
        Some(traveled * 100.0 / total)
    }

    /// World-space point reached after `time_in_segment` seconds on the segment ending at `target`.
    pub(crate) fn point_at(
        &self,
        target: usize,
        time_in_segment: f32,
        speed: f32,
        projection: &IsoProjection,
        transform: &ViewTransform,
    ) -> Option<Vec2> {
        let (start, end) = self.segment(target)?;
        let duration = self.segment_duration(target, speed)?;
        let from = projection.tile_center(transform, start);
        let to = projection.tile_center(transform, end);
        let t = (time_in_segment / duration).clamp(0.0, 1.0);
        Some(from.lerp(to, t).clamp(from.min(to), from.max(to)))
    }

    /// Reports whether the tile lies in the bounding rectangle of any segment.
    pub(crate) fn contains_tile(&self, tile: TileCoord) -> bool {
        self.waypoints.windows(2).any(|pair| {
            let (start, end) = (pair[0], pair[1]);
            let columns = start.column().min(end.column())..=start.column().max(end.column());
            let rows = start.row().min(end.row())..=start.row().max(end.row());
            columns.contains(&tile.column()) && rows.contains(&tile.row())
        })
    }
}

/// Number of tiles a segment spans, counting both of its ends.
fn segment_tiles(start: TileCoord, end: TileCoord) -> f32 {
    let across = (start.column() - end.column()).unsigned_abs() + 1;
    let down = (start.row() - end.row()).unsigned_abs() + 1;
    if across == 1 {
        down as f32
    } else {
        across as f32
    }
}
