use nalgebra::{Point2, Point3, Unit, Vector3};

use crate::geometry::normalize;

/// Camera pose boundary.
///
/// Supplied by an external AR/world-tracking subsystem. The engine never
/// constructs poses itself; it only casts rays and projects points through
/// whatever pose the boundary reports for the current tick.
pub trait CameraPose {
    /// World-space camera position.
    fn camera_position(&self) -> Point3<f32>;

    /// A world point on the view ray through `point` (view coordinates).
    fn unproject_screen_point(&self, point: Point2<f32>) -> Point3<f32>;

    /// Project a world point into view coordinates.
    fn project_world_point(&self, point: Point3<f32>) -> Point2<f32>;
}

/// A view ray: camera origin plus unit direction into the scene.
#[derive(Clone, Copy, Debug)]
pub struct Ray {
    pub origin: Point3<f32>,
    pub direction: Unit<Vector3<f32>>,
}

impl Ray {
    /// Cast the view ray through a 2D view point.
    ///
    /// Returns `None` when the unprojected point coincides with the camera
    /// origin (degenerate pose reports happen during AR session warm-up).
    pub fn through_screen_point(pose: &dyn CameraPose, point: Point2<f32>) -> Option<Ray> {
        let origin = pose.camera_position();
        let plane_point = pose.unproject_screen_point(point);
        let direction = normalize(plane_point - origin)?;
        Some(Ray { origin, direction })
    }

    /// Point at `distance` units from the origin along the ray.
    #[inline]
    pub fn point_at(&self, distance: f32) -> Point3<f32> {
        self.origin + self.direction.as_ref() * distance
    }
}

/// Owned snapshot of a camera pose, cheap to move across threads.
///
/// A pinhole model: `position` is the optical center, `forward`/`right`/`up`
/// the camera basis in world space, `focal_px` the focal length and
/// `principal` the view-space principal point.
#[derive(Clone, Copy, Debug)]
pub struct PoseSnapshot {
    pub position: Point3<f32>,
    pub forward: Unit<Vector3<f32>>,
    pub right: Unit<Vector3<f32>>,
    pub up: Unit<Vector3<f32>>,
    pub focal_px: f32,
    pub principal: Point2<f32>,
}

impl PoseSnapshot {
    /// Identity pose looking down -Z, y-down view coordinates.
    pub fn looking_forward(focal_px: f32, principal: Point2<f32>) -> Self {
        PoseSnapshot {
            position: Point3::origin(),
            forward: Unit::new_unchecked(Vector3::new(0.0, 0.0, -1.0)),
            right: Unit::new_unchecked(Vector3::new(1.0, 0.0, 0.0)),
            up: Unit::new_unchecked(Vector3::new(0.0, -1.0, 0.0)),
            focal_px,
            principal,
        }
    }
}

impl CameraPose for PoseSnapshot {
    fn camera_position(&self) -> Point3<f32> {
        self.position
    }

    fn unproject_screen_point(&self, point: Point2<f32>) -> Point3<f32> {
        let dx = point.x - self.principal.x;
        let dy = point.y - self.principal.y;
        self.position
            + self.forward.as_ref() * self.focal_px
            + self.right.as_ref() * dx
            + self.up.as_ref() * dy
    }

    fn project_world_point(&self, point: Point3<f32>) -> Point2<f32> {
        let rel = point - self.position;
        let z = rel.dot(&self.forward);
        if z.abs() < f32::EPSILON {
            return self.principal;
        }
        let x = rel.dot(&self.right) / z * self.focal_px;
        let y = rel.dot(&self.up) / z * self.focal_px;
        Point2::new(self.principal.x + x, self.principal.y + y)
    }
}
