//! Snap functionality for aligning tool input to the grid, to angle
//! increments and to existing geometry.

use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Default grid size for snapping.
pub const GRID_SIZE: f64 = 20.0;

/// Angle snap increment in degrees.
pub const ANGLE_SNAP_INCREMENT: f64 = 15.0;

/// Snap mode for aligning tool input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SnapMode {
    /// No snapping.
    #[default]
    None,
    /// Snap to grid intersections.
    Grid,
    /// Snap to anchor points of existing shapes.
    Shapes,
    /// Shapes first, grid otherwise.
    All,
}

impl SnapMode {
    /// Cycle to the next snap mode.
    pub fn next(self) -> Self {
        match self {
            SnapMode::None => SnapMode::Grid,
            SnapMode::Grid => SnapMode::Shapes,
            SnapMode::Shapes => SnapMode::All,
            SnapMode::All => SnapMode::None,
        }
    }

    pub fn snaps_to_grid(self) -> bool {
        matches!(self, SnapMode::Grid | SnapMode::All)
    }

    pub fn snaps_to_shapes(self) -> bool {
        matches!(self, SnapMode::Shapes | SnapMode::All)
    }

    pub fn is_enabled(self) -> bool {
        self != SnapMode::None
    }
}

/// Result of a snap operation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapResult {
    /// The snapped point.
    pub point: Point,
    pub snapped: bool,
}

impl SnapResult {
    /// A result with no snapping.
    pub fn none(point: Point) -> Self {
        Self {
            point,
            snapped: false,
        }
    }

    fn snapped(point: Point) -> Self {
        Self {
            point,
            snapped: true,
        }
    }
}

/// Snap an angle to the nearest increment.
/// Returns the snapped angle in degrees (0-360).
pub fn snap_angle(angle_degrees: f64, increment: f64) -> f64 {
    let snapped = (angle_degrees / increment).round() * increment;
    snapped.rem_euclid(360.0)
}

/// Snap `end` so that the direction from `start` lies on a 15° increment,
/// preserving the distance.
pub fn snap_line_endpoint(start: Point, end: Point) -> SnapResult {
    let delta = end - start;
    let distance = delta.hypot();
    if distance < 0.001 {
        return SnapResult::none(end);
    }
    let angle = delta.y.atan2(delta.x).to_degrees();
    let snapped = snap_angle(angle, ANGLE_SNAP_INCREMENT).to_radians();
    SnapResult::snapped(Point::new(
        start.x + distance * snapped.cos(),
        start.y + distance * snapped.sin(),
    ))
}

/// Snap a point to the nearest grid intersection.
pub fn snap_to_grid(point: Point, grid_size: f64) -> SnapResult {
    if grid_size <= 0.0 || !grid_size.is_finite() {
        return SnapResult::none(point);
    }
    SnapResult::snapped(Point::new(
        (point.x / grid_size).round() * grid_size,
        (point.y / grid_size).round() * grid_size,
    ))
}

/// Snap a point to the nearest target within `threshold`.
pub fn snap_to_targets(point: Point, targets: &[Point], threshold: f64) -> SnapResult {
    let mut best: Option<Point> = None;
    let mut best_dist_sq = threshold * threshold;
    for target in targets {
        let dist_sq = (point - *target).hypot2();
        if dist_sq < best_dist_sq {
            best_dist_sq = dist_sq;
            best = Some(*target);
        }
    }
    best.map_or(SnapResult::none(point), SnapResult::snapped)
}

/// Snap a point according to `mode`. Shape targets take priority over the grid.
pub fn snap_point(
    point: Point,
    mode: SnapMode,
    grid_size: f64,
    targets: &[Point],
    threshold: f64,
) -> SnapResult {
    if mode.snaps_to_shapes() {
        let result = snap_to_targets(point, targets, threshold);
        if result.snapped {
            return result;
        }
    }
    if mode.snaps_to_grid() {
        return snap_to_grid(point, grid_size);
    }
    SnapResult::none(point)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snap_to_grid_round_up() {
        let result = snap_to_grid(Point::new(31.0, 51.0), 20.0);
        assert_eq!(result.point, Point::new(40.0, 60.0));
        assert!(result.snapped);
    }

    #[test]
    fn test_invalid_grid_does_not_snap() {
        let p = Point::new(3.0, 4.0);
        assert_eq!(snap_to_grid(p, 0.0), SnapResult::none(p));
    }

    #[test]
    fn test_snap_mode_cycle() {
        assert_eq!(SnapMode::None.next(), SnapMode::Grid);
        assert_eq!(SnapMode::All.next(), SnapMode::None);
        assert!(SnapMode::All.snaps_to_grid());
        assert!(!SnapMode::Shapes.snaps_to_grid());
    }

    #[test]
    fn test_snap_angle() {
        assert!((snap_angle(7.0, 15.0) - 0.0).abs() < 0.01);
        assert!((snap_angle(8.0, 15.0) - 15.0).abs() < 0.01);
        assert!((snap_angle(359.0, 15.0) - 0.0).abs() < 0.01);
        assert!((snap_angle(-100.0, 15.0) - 255.0).abs() < 0.01);
    }

    #[test]
    fn test_snap_line_endpoint_preserves_distance() {
        let start = Point::new(0.0, 0.0);
        let end = Point::new(100.0, 5.0);
        let result = snap_line_endpoint(start, end);
        assert!(result.point.y.abs() < 1e-9);
        assert!(((result.point - start).hypot() - (end - start).hypot()).abs() < 1e-9);
    }

    #[test]
    fn test_shape_targets_take_priority() {
        let targets = [Point::new(0.0, 0.0), Point::new(33.0, 33.0), Point::new(16.5, 16.5)];
        let result = snap_point(Point::new(31.0, 34.0), SnapMode::All, 20.0, &targets, 5.0);
        assert_eq!(result.point, Point::new(33.0, 33.0));

        let far = snap_point(Point::new(71.0, 89.0), SnapMode::All, 20.0, &targets, 5.0);
        assert_eq!(far.point, Point::new(80.0, 80.0));

        let off = snap_point(Point::new(31.0, 34.0), SnapMode::None, 20.0, &targets, 5.0);
        assert!(!off.snapped);
    }
}
