// src/analysis/projector.rs
//
// Image-space lane endpoints -> world-frame 3D points.
//
// Per pixel (row i, col j) with depth d:
//   raw    = [d*j*K, d*i*K, d*K]          K = depth scale
//   camera = intrinsics^-1 * raw
//   v      = [camera_2, -camera_1, camera_0, 1]   image axes -> vehicle-forward axes
//   world  = vehicle_pose * extrinsic * v

use crate::types::{CameraCalibration, DepthFrame, ImageLane, ImagePoint, WorldLane};
use nalgebra::{Matrix3, Matrix4, Point3, Vector3, Vector4};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProjectionError {
    #[error("camera intrinsic matrix is singular")]
    SingularIntrinsics,

    #[error("depth buffer is {depth_width}x{depth_height}, frame is {frame_width}x{frame_height}")]
    DepthResolutionMismatch {
        depth_width: usize,
        depth_height: usize,
        frame_width: usize,
        frame_height: usize,
    },

    #[error("depth buffer length does not match its dimensions")]
    MalformedDepth,
}

/// Maps an image lane into the world frame.
pub trait LaneProjector {
    fn project(&self, lane: &ImageLane) -> Result<WorldLane, ProjectionError>;
}

/// Back-projection through a depth buffer and the frame's calibration.
///
/// A zero depth collapses the point onto the camera origin in world space.
/// That is a known limitation and is not reported as an error.
#[derive(Debug, Clone)]
pub struct DepthProjector<'a> {
    depth: &'a DepthFrame,
    intrinsics_inv: Matrix3<f64>,
    camera_to_world: Matrix4<f64>,
    depth_scale: f64,
}

impl<'a> DepthProjector<'a> {
    pub fn new(
        depth: &'a DepthFrame,
        calibration: &CameraCalibration,
        depth_scale: f64,
        frame_width: usize,
        frame_height: usize,
    ) -> Result<Self, ProjectionError> {
        if !depth.is_well_formed() {
            return Err(ProjectionError::MalformedDepth);
        }
        if depth.width != frame_width || depth.height != frame_height {
            return Err(ProjectionError::DepthResolutionMismatch {
                depth_width: depth.width,
                depth_height: depth.height,
                frame_width,
                frame_height,
            });
        }
        let intrinsics_inv = calibration
            .intrinsics
            .try_inverse()
            .ok_or(ProjectionError::SingularIntrinsics)?;

        Ok(Self {
            depth,
            intrinsics_inv,
            camera_to_world: calibration.vehicle_pose * calibration.extrinsic,
            depth_scale,
        })
    }

    pub fn project_point(&self, point: ImagePoint) -> Point3<f64> {
        let (row, col) = (i64::from(point.y), i64::from(point.x));
        let d = f64::from(self.depth.sample(row, col)) * self.depth_scale;

        let raw = Vector3::new(d * col as f64, d * row as f64, d);
        let camera = self.intrinsics_inv * raw;
        let axes = Vector4::new(camera.z, -camera.y, camera.x, 1.0);
        let world = self.camera_to_world * axes;

        Point3::new(world.x, world.y, world.z)
    }
}

impl LaneProjector for DepthProjector<'_> {
    fn project(&self, lane: &ImageLane) -> Result<WorldLane, ProjectionError> {
        Ok(WorldLane::new(
            self.project_point(lane.near),
            self.project_point(lane.far),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Translation3;

    fn identity_calibration() -> CameraCalibration {
        CameraCalibration::new(Matrix3::identity(), Matrix4::identity(), Matrix4::identity())
    }

    #[test]
    fn test_axis_remap_with_identity_calibration() {
        let depth = DepthFrame::filled(0.5, 8, 8);
        let projector = DepthProjector::new(&depth, &identity_calibration(), 20.0, 8, 8).unwrap();

        // d*K = 10 -> raw = [50, 20, 10] -> v = [10, -20, 50]
        let p = projector.project_point(ImagePoint::new(5, 2));
        assert_relative_eq!(p, Point3::new(10.0, -20.0, 50.0), epsilon = 1e-9);
    }

    #[test]
    fn test_pose_applied_after_extrinsic() {
        let depth = DepthFrame::filled(0.5, 8, 8);
        let calibration = CameraCalibration::new(
            Matrix3::identity(),
            Translation3::new(1.0, 0.0, 0.0).to_homogeneous(),
            Matrix4::new_scaling(2.0),
        );
        let projector = DepthProjector::new(&depth, &calibration, 20.0, 8, 8).unwrap();

        // pose * (v + t) = 2 * ([10, -20, 50] + [1, 0, 0])
        let p = projector.project_point(ImagePoint::new(5, 2));
        assert_relative_eq!(p.x, 22.0, epsilon = 1e-9);
        assert_relative_eq!(p.y, -40.0, epsilon = 1e-9);
        assert_relative_eq!(p.z, 100.0, epsilon = 1e-9);
    }

    #[test]
    fn test_intrinsics_are_inverted() {
        let depth = DepthFrame::filled(0.5, 8, 8);
        let k = Matrix3::new(2.0, 0.0, 4.0, 0.0, 2.0, 4.0, 0.0, 0.0, 1.0);
        let calibration = CameraCalibration::new(k, Matrix4::identity(), Matrix4::identity());
        let projector = DepthProjector::new(&depth, &calibration, 2.0, 8, 8).unwrap();

        // d*K = 1, pixel (6, 4): raw = [6, 4, 1]; K^-1 raw = [(6-4)/2, (4-4)/2, 1] = [1, 0, 1]
        let p = projector.project_point(ImagePoint::new(6, 4));
        assert_relative_eq!(p, Point3::new(1.0, 0.0, 1.0), epsilon = 1e-9);
    }

    #[test]
    fn test_zero_depth_collapses_to_origin() {
        let depth = DepthFrame::filled(0.0, 4, 4);
        let calibration = CameraCalibration::new(
            Matrix3::identity(),
            Matrix4::identity(),
            Translation3::new(3.0, 1.0, -2.0).to_homogeneous(),
        );
        let projector = DepthProjector::new(&depth, &calibration, 1000.0, 4, 4).unwrap();
        let lane = projector
            .project(&ImageLane::new(ImagePoint::new(1, 3), ImagePoint::new(2, 1)))
            .unwrap();
        assert_relative_eq!(lane.near, Point3::new(3.0, 1.0, -2.0));
        assert_relative_eq!(lane.far, Point3::new(3.0, 1.0, -2.0));
    }

    #[test]
    fn test_construction_errors() {
        let depth = DepthFrame::filled(1.0, 4, 4);
        let singular = CameraCalibration::new(Matrix3::zeros(), Matrix4::identity(), Matrix4::identity());
        assert_eq!(
            DepthProjector::new(&depth, &singular, 1000.0, 4, 4).unwrap_err(),
            ProjectionError::SingularIntrinsics
        );

        let err = DepthProjector::new(&depth, &identity_calibration(), 1000.0, 8, 4).unwrap_err();
        assert!(matches!(err, ProjectionError::DepthResolutionMismatch { frame_width: 8, .. }));

        let broken = DepthFrame::new(vec![1.0; 3], 4, 4);
        assert_eq!(
            DepthProjector::new(&broken, &identity_calibration(), 1000.0, 4, 4).unwrap_err(),
            ProjectionError::MalformedDepth
        );
    }
}
