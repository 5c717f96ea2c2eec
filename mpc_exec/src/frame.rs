//! # Frame transformation
//!
//! Moves reference waypoints between the world frame and the vehicle frame.
//! In the vehicle frame the vehicle sits at the origin with zero heading, x
//! pointing forwards and y to the left.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use crate::pose::{Pose, Waypoints};

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Express world frame waypoints in the frame of the given pose.
///
/// Each point is translated by the negative pose position and then rotated by
/// the negative heading.
pub fn to_vehicle_frame(world: &Waypoints, pose: &Pose) -> Waypoints {
    let (sin, cos) = pose.heading_rad.sin_cos();

    Waypoints(
        world
            .iter()
            .map(|p| {
                let dx = p[0] - pose.x_m;
                let dy = p[1] - pose.y_m;

                [dx * cos + dy * sin, -dx * sin + dy * cos]
            })
            .collect(),
    )
}

/// Inverse of [`to_vehicle_frame`], rotate by the heading then translate by the
/// pose position.
pub fn to_world_frame(vehicle: &Waypoints, pose: &Pose) -> Waypoints {
    let (sin, cos) = pose.heading_rad.sin_cos();

    Waypoints(
        vehicle
            .iter()
            .map(|p| {
                [
                    p[0] * cos - p[1] * sin + pose.x_m,
                    p[0] * sin + p[1] * cos + pose.y_m,
                ]
            })
            .collect(),
    )
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use proptest::prelude::*;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_identity_pose() {
        let w = Waypoints(vec![[10.0, 0.0], [20.0, 1.0], [-3.0, 4.5]]);
        assert_eq!(to_vehicle_frame(&w, &Pose::default()), w);
    }

    #[test]
    fn test_quarter_turn() {
        // Vehicle at (1, 1) facing +y, a point 2 m further along +y is 2 m ahead
        let pose = Pose {
            x_m: 1.0,
            y_m: 1.0,
            heading_rad: FRAC_PI_2,
            speed_ms: 0.0,
        };
        let w = Waypoints(vec![[1.0, 3.0], [0.0, 1.0]]);

        let v = to_vehicle_frame(&w, &pose);

        assert!((v.0[0][0] - 2.0).abs() < 1e-12);
        assert!(v.0[0][1].abs() < 1e-12);

        // A point in -x world is on the vehicle's left
        assert!(v.0[1][0].abs() < 1e-12);
        assert!((v.0[1][1] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_pose_maps_to_origin() {
        let pose = Pose {
            x_m: -40.62,
            y_m: 108.73,
            heading_rad: 3.733651,
            speed_ms: 0.0,
        };
        let w = Waypoints(vec![[pose.x_m, pose.y_m]]);

        let v = to_vehicle_frame(&w, &pose);
        assert!(v.0[0][0].abs() < 1e-12);
        assert!(v.0[0][1].abs() < 1e-12);
    }

    proptest! {
        #[test]
        fn prop_round_trip(
            x in -1000.0f64..1000.0,
            y in -1000.0f64..1000.0,
            heading in -10.0f64..10.0,
            pts in prop::collection::vec((-1000.0f64..1000.0, -1000.0f64..1000.0), 0..20),
        ) {
            let pose = Pose { x_m: x, y_m: y, heading_rad: heading, speed_ms: 0.0 };
            let world = Waypoints(pts.iter().map(|&(a, b)| [a, b]).collect());

            let back = to_world_frame(&to_vehicle_frame(&world, &pose), &pose);

            prop_assert_eq!(back.len(), world.len());
            for (a, b) in back.iter().zip(world.iter()) {
                prop_assert!((a[0] - b[0]).abs() < 1e-9);
                prop_assert!((a[1] - b[1]).abs() < 1e-9);
            }
        }
    }
}
