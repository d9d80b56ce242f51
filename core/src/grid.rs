//! Isometric grid projection consumed by the simulation.

use glam::Vec2;

use crate::TileCoord;

/// Scale at which tower ranges, area radii and projectile speeds are authored.
pub const REFERENCE_SCALE: f32 = 1.0;

/// Pan and zoom applied when projecting tiles into world space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewTransform {
    translation: Vec2,
    scale: f32,
}

impl ViewTransform {
    /// Creates a transform from a translation and a scale factor.
    #[must_use]
    pub const fn new(translation: Vec2, scale: f32) -> Self {
        Self { translation, scale }
    }

    /// World-space offset of the grid origin.
    #[must_use]
    pub const fn translation(&self) -> Vec2 {
        self.translation
    }

    /// Scale factor applied to tile metrics.
    #[must_use]
    pub const fn scale(&self) -> f32 {
        self.scale
    }

    /// Scale relative to [`REFERENCE_SCALE`], used to scale authored distances.
    #[must_use]
    pub fn zoom_factor(&self) -> f32 {
        self.scale / REFERENCE_SCALE
    }
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self::new(Vec2::ZERO, REFERENCE_SCALE)
    }
}

/// Conversion between tile coordinates and world-space points.
pub trait TileProjection {
    /// World-space center of the tile under the provided transform.
    fn tile_center(&self, transform: &ViewTransform, tile: TileCoord) -> Vec2;

    /// Tile containing the world-space point under the provided transform.
    ///
    /// The returned coordinate may lie outside of any grid.
    fn world_to_tile(&self, transform: &ViewTransform, point: Vec2) -> TileCoord;

    /// Reports whether the tile lies within a grid of the given dimensions.
    fn is_valid_tile(&self, columns: u32, rows: u32, tile: TileCoord) -> bool {
        tile.column() >= 0
            && tile.row() >= 0
            && (tile.column() as u32) < columns
            && (tile.row() as u32) < rows
    }
}

/// Diamond projection where columns run up-right and rows run down-right.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IsoProjection {
    tile_width: f32,
    tile_height: f32,
}

impl IsoProjection {
    /// Creates a projection for tiles of the given size at reference scale.
    #[must_use]
    pub const fn new(tile_width: f32, tile_height: f32) -> Self {
        Self {
            tile_width,
            tile_height,
        }
    }

    /// Width of a tile at reference scale.
    #[must_use]
    pub const fn tile_width(&self) -> f32 {
        self.tile_width
    }

    /// Height of a tile at reference scale.
    #[must_use]
    pub const fn tile_height(&self) -> f32 {
        self.tile_height
    }
}

impl Default for IsoProjection {
    fn default() -> Self {
        Self::new(64.0, 32.0)
    }
}

impl TileProjection for IsoProjection {
    fn tile_center(&self, transform: &ViewTransform, tile: TileCoord) -> Vec2 {
        let half_width = self.tile_width * transform.scale() * 0.5;
        let half_height = self.tile_height * transform.scale() * 0.5;
        let sum = (tile.column() + tile.row() + 1) as f32;
        let difference = (tile.row() - tile.column()) as f32;
        transform.translation() + Vec2::new(sum * half_width, difference * half_height)
    }

    fn world_to_tile(&self, transform: &ViewTransform, point: Vec2) -> TileCoord {
        let width = self.tile_width * transform.scale();
        let height = self.tile_height * transform.scale();
        let delta = point - transform.translation();
        let across = delta.x / width;
        let down = delta.y / height;
        TileCoord::new((across - down).floor() as i32, (across + down).floor() as i32)
    }
}

/// Reports whether `point` lies inside the axis-aligned ellipse centered on `center`.
#[must_use]
pub fn point_in_ellipse(point: Vec2, center: Vec2, radius_x: f32, radius_y: f32) -> bool {
    if radius_x <= 0.0 || radius_y <= 0.0 {
        return false;
    }
    let delta = point - center;
    (delta.x * delta.x) / (radius_x * radius_x) + (delta.y * delta.y) / (radius_y * radius_y)
        <= 1.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tile_centers_round_trip_through_world_space() {
        let projection = IsoProjection::default();
        let transform = ViewTransform::new(Vec2::new(100.0, 300.0), 1.5);
        for column in 0..6 {
            for row in 0..6 {
                let tile = TileCoord::new(column, row);
                let center = projection.tile_center(&transform, tile);
                assert_eq!(
                    projection.world_to_tile(&transform, center),
                    tile,
                    "center of {tile:?} should project back onto it"
                );
            }
        }
    }

    #[test]
    fn origin_tile_center_sits_half_a_tile_right_of_translation() {
        let projection = IsoProjection::default();
        let center = projection.tile_center(&ViewTransform::default(), TileCoord::new(0, 0));
        assert_eq!(center, Vec2::new(32.0, 0.0));
    }

    #[test]
    fn points_left_of_the_grid_map_to_invalid_tiles() {
        let projection = IsoProjection::default();
        let tile = projection.world_to_tile(&ViewTransform::default(), Vec2::new(-10.0, 0.0));
        assert!(!projection.is_valid_tile(4, 4, tile));
    }

    #[test]
    fn ellipse_is_twice_as_wide_as_tall() {
        let center = Vec2::new(10.0, 10.0);
        assert!(point_in_ellipse(Vec2::new(50.0, 10.0), center, 40.0, 20.0));
        assert!(!point_in_ellipse(Vec2::new(10.0, 35.0), center, 40.0, 20.0));
        assert!(point_in_ellipse(Vec2::new(10.0, 29.0), center, 40.0, 20.0));
    }

    #[test]
    fn degenerate_ellipse_contains_nothing() {
        assert!(!point_in_ellipse(Vec2::ZERO, Vec2::ZERO, 0.0, 0.0));
    }

    #[test]
    fn zoom_factor_is_relative_to_reference_scale() {
        let transform = ViewTransform::new(Vec2::ZERO, 2.0);
        assert_eq!(transform.zoom_factor(), 2.0);
    }
}
