//! Mapping from normalized detector coordinates to view coordinates.
//!
//! The capture sensor is rotated and cropped (aspect-fill) relative to the
//! display, so detector output cannot be scaled by the view size alone: the
//! horizontal axis is mirrored and the sensor overflows the screen on both
//! sides.

use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};

/// View geometry for the tracking surface.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Viewport {
    /// Visible view size in points.
    pub view_size: Vector2<f32>,
    /// Display points-to-pixels scale.
    pub native_scale: f32,
    /// Raw sensor frame size in pixels, already rotated to view orientation.
    pub sensor_size: Vector2<f32>,
}

impl Viewport {
    pub fn new(view_size: Vector2<f32>, native_scale: f32, sensor_size: Vector2<f32>) -> Self {
        Viewport {
            view_size,
            native_scale,
            sensor_size,
        }
    }

    /// Geometric center of the view, the default guidance reference point.
    #[inline]
    pub fn center(&self) -> Point2<f32> {
        Point2::new(self.view_size.x / 2.0, self.view_size.y / 2.0)
    }

    /// Whether a view-space point lies inside the visible view rect.
    #[inline]
    pub fn contains(&self, point: Point2<f32>) -> bool {
        point.x >= 0.0 && point.y >= 0.0 && point.x <= self.view_size.x && point.y <= self.view_size.y
    }

    /// Map a normalized detector point into view coordinates.
    ///
    /// Mirrors the horizontal axis and compensates for the aspect-fill crop:
    /// the sensor is wider than the screen, so a fraction `k` of the frame
    /// hangs off each side of the view.
    pub fn scale_point(&self, norm: Point2<f32>) -> Point2<f32> {
        let screen_px_w = self.view_size.x * self.native_scale;
        let k = (self.sensor_size.x - screen_px_w) / (2.0 * screen_px_w);
        let mirrored_x = 1.0 - norm.x;
        let cropped_x = (mirrored_x - k) / (1.0 - 2.0 * k);
        Point2::new(cropped_x * self.view_size.x, norm.y * self.view_size.y)
    }

    /// Scale a normalized bounding-box extent into view pixels.
    pub fn scale_extent(&self, width: f32, height: f32) -> (f32, f32) {
        let screen_px_w = self.view_size.x * self.native_scale;
        let screen_px_h = self.view_size.y * self.native_scale;
        let w = self.sensor_size.x / screen_px_w * self.view_size.x * width;
        let h = self.sensor_size.y / screen_px_h * self.view_size.y * height;
        (w, h)
    }
}
