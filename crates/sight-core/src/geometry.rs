//! Pure geometric helpers shared by the tracking and feedback pipelines.

use nalgebra::{Point2, Point3, Unit, Vector3};

use crate::camera::{CameraPose, Ray};

/// Largest accepted increase between two consecutive depth estimates, in
/// world length units. Larger jumps are treated as geometry noise.
pub const DEPTH_JUMP_TOLERANCE: f32 = 0.2;

/// Unit vector for `v`, or `None` when the magnitude is (near) zero.
#[inline]
pub fn normalize(v: Vector3<f32>) -> Option<Unit<Vector3<f32>>> {
    Unit::try_new(v, 1e-8)
}

/// L2 distance between two 2D points.
#[inline]
pub fn distance2(a: Point2<f32>, b: Point2<f32>) -> f32 {
    (b - a).norm()
}

/// L2 distance between two 3D points.
#[inline]
pub fn distance3(a: Point3<f32>, b: Point3<f32>) -> f32 {
    (b - a).norm()
}

/// Place a world point `depth` units from the camera along the view ray
/// through `point`.
///
/// Returns `None` only when the pose yields a degenerate ray.
pub fn unproject_at_depth(
    point: Point2<f32>,
    depth: f32,
    pose: &dyn CameraPose,
) -> Option<Point3<f32>> {
    let ray = Ray::through_screen_point(pose, point)?;
    Some(ray.point_at(depth))
}

/// Distance of `world_pos` from the ray origin, measured along the ray.
///
/// The candidate is the dot product of `world_pos - origin` with the unit
/// ray direction. A candidate that is negative, or that exceeds `previous`
/// by more than [`DEPTH_JUMP_TOLERANCE`] while a previous estimate exists,
/// is rejected and `previous` is returned unchanged.
pub fn distance_along_ray(world_pos: Point3<f32>, ray: &Ray, previous: f32) -> f32 {
    let candidate = (world_pos - ray.origin).dot(&ray.direction);
    if previous != 0.0 && (candidate < 0.0 || candidate - previous > DEPTH_JUMP_TOLERANCE) {
        return previous;
    }
    candidate
}

/// Bearing of `to` as seen from `from`, in degrees within `[0, 360)`.
///
/// View coordinates are y-down, so a target directly above the reference
/// point comes out at 90 degrees.
pub fn angle_degrees(from: Point2<f32>, to: Point2<f32>) -> f32 {
    let delta = to - from;
    let mut degrees = delta.y.atan2(delta.x).to_degrees();
    if degrees < 0.0 {
        degrees += 360.0;
    }
    degrees
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::PoseSnapshot;
    use approx::assert_relative_eq;

    fn test_pose() -> PoseSnapshot {
        PoseSnapshot::looking_forward(1000.0, Point2::new(0.0, 0.0))
    }

    #[test]
    fn unprojected_point_sits_at_requested_depth() {
        let pose = test_pose();
        let p = unproject_at_depth(Point2::new(50.0, -30.0), 0.8, &pose).unwrap();
        assert_relative_eq!(distance3(p, pose.position), 0.8, epsilon = 1e-5);
    }

    #[test]
    fn ray_distance_accepts_plausible_candidates() {
        let pose = test_pose();
        let ray = Ray::through_screen_point(&pose, Point2::origin()).unwrap();
        let pos = ray.point_at(0.55);
        let d = distance_along_ray(pos, &ray, 0.5);
        assert_relative_eq!(d, 0.55, epsilon = 1e-5);
    }

    #[test]
    fn ray_distance_rejects_negative_and_jumps() {
        let pose = test_pose();
        let ray = Ray::through_screen_point(&pose, Point2::origin()).unwrap();

        let behind = ray.point_at(-0.4);
        assert_relative_eq!(distance_along_ray(behind, &ray, 0.5), 0.5);

        let far = ray.point_at(0.9);
        assert_relative_eq!(distance_along_ray(far, &ray, 0.5), 0.5);

        // Without a previous estimate everything passes through.
        assert_relative_eq!(distance_along_ray(far, &ray, 0.0), 0.9, epsilon = 1e-5);
    }

    #[test]
    fn bearing_is_wrapped_non_negative() {
        let reference = Point2::new(100.0, 100.0);
        // Target directly above the reference point (y-down view coords).
        let target_above = Point2::new(100.0, 60.0);
        assert_relative_eq!(angle_degrees(target_above, reference), 90.0, epsilon = 1e-4);
        // Target to the left of the reference point.
        let target_left = Point2::new(40.0, 100.0);
        assert_relative_eq!(angle_degrees(target_left, reference), 0.0, epsilon = 1e-4);
        let target_right = Point2::new(160.0, 100.0);
        assert_relative_eq!(angle_degrees(target_right, reference), 180.0, epsilon = 1e-4);
    }

    #[test]
    fn zero_vector_has_no_direction() {
        assert!(normalize(Vector3::zeros()).is_none());
    }
}
