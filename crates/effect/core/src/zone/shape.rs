//! Zone volumes: shape definitions, containment, and size evolution.
//!
//! Containment is evaluated in zone-local coordinates (the point minus the
//! zone center). The ground plane is XZ and Y is height; `Box` and `Cone`
//! are additionally rotated into zone-local axes before their axis-aligned
//! tests.

use std::f32::consts::{PI, TAU};

use glam::{Quat, Vec2, Vec3};

/// Smallest size a shrinking shape may reach. Keeps evolved shapes from
/// collapsing to zero or inverting.
const MIN_EVOLVED_SIZE: f32 = 0.01;

/// Geometric volume of an effect zone.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Shape {
    Sphere {
        radius: f32,
    },
    /// Vertical cylinder: radial test in XZ, height band in Y.
    Cylinder {
        radius: f32,
        half_height: f32,
    },
    Cube {
        half_extent: f32,
    },
    /// Rectangular footprint rotated by `yaw` around Y, plus a height band.
    Box {
        half_extents: Vec3,
        yaw: f32,
    },
    /// Horizontal wedge: within `radius` of the center and within
    /// `half_angle` of the `facing` direction (radians, XZ plane).
    Cone {
        radius: f32,
        facing: f32,
        half_angle: f32,
    },
    /// Horizontal annulus: ring of thickness `2 * minor_radius` around a
    /// circle of `major_radius`.
    Torus {
        major_radius: f32,
        minor_radius: f32,
    },
    /// Sphere cut at the horizontal plane through its center; `upper`
    /// selects which vertical side counts.
    HalfSphere {
        radius: f32,
        upper: bool,
    },
}

impl Shape {
    /// Whether `point` lies inside the shape centered at `center`.
    pub fn contains(&self, center: Vec3, point: Vec3) -> bool {
        let local = point - center;
        match *self {
            Self::Sphere { radius } => local.length_squared() <= radius * radius,
            Self::Cylinder {
                radius,
                half_height,
            } => {
                planar(local).length_squared() <= radius * radius
                    && local.y.abs() <= half_height
            }
            Self::Cube { half_extent } => {
                local.x.abs() <= half_extent
                    && local.y.abs() <= half_extent
                    && local.z.abs() <= half_extent
            }
            Self::Box { half_extents, yaw } => {
                let local = Quat::from_rotation_y(-yaw) * local;
                local.x.abs() <= half_extents.x
                    && local.y.abs() <= half_extents.y
                    && local.z.abs() <= half_extents.z
            }
            Self::Cone {
                radius,
                facing,
                half_angle,
            } => {
                let flat = planar(local);
                if flat.length_squared() > radius * radius {
                    return false;
                }
                // Zone center itself counts regardless of facing.
                if flat.length_squared() == 0.0 {
                    return true;
                }
                let angle = flat.y.atan2(flat.x);
                wrap_angle(angle - facing).abs() <= half_angle
            }
            Self::Torus {
                major_radius,
                minor_radius,
            } => (planar(local).length() - major_radius).abs() <= minor_radius,
            Self::HalfSphere { radius, upper } => {
                local.length_squared() <= radius * radius
                    && if upper { local.y >= 0.0 } else { local.y <= 0.0 }
            }
        }
    }

    /// Characteristic size driven by zone evolution.
    pub fn size(&self) -> f32 {
        match *self {
            Self::Sphere { radius }
            | Self::Cylinder { radius, .. }
            | Self::Cone { radius, .. }
            | Self::HalfSphere { radius, .. } => radius,
            Self::Cube { half_extent } => half_extent,
            Self::Box { half_extents, .. } => half_extents.max_element(),
            Self::Torus { major_radius, .. } => major_radius,
        }
    }

    /// Writes an evolved characteristic size back into the shape. `Box`
    /// extents scale proportionally so the aspect ratio is preserved.
    pub fn set_size(&mut self, next: f32) {
        match self {
            Self::Sphere { radius }
            | Self::Cylinder { radius, .. }
            | Self::Cone { radius, .. }
            | Self::HalfSphere { radius, .. } => *radius = next,
            Self::Cube { half_extent } => *half_extent = next,
            Self::Box { half_extents, .. } => {
                let current = half_extents.max_element();
                if current > 0.0 {
                    *half_extents *= next / current;
                }
            }
            Self::Torus { major_radius, .. } => *major_radius = next,
        }
    }
}

/// Projection onto the XZ ground plane.
fn planar(local: Vec3) -> Vec2 {
    Vec2::new(local.x, local.z)
}

/// Normalizes an angle difference into [-PI, PI].
fn wrap_angle(angle: f32) -> f32 {
    let mut wrapped = angle % TAU;
    if wrapped > PI {
        wrapped -= TAU;
    } else if wrapped < -PI {
        wrapped += TAU;
    }
    wrapped
}

/// How a zone's characteristic size changes over time.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum EvolutionKind {
    /// Linear growth, clamped to `max`.
    Expand,
    /// Linear decay, clamped to `min` (floored above zero).
    Shrink,
    /// Sinusoidal oscillation between `min` and `max` at `rate` Hz.
    Pulse,
}

/// Time evolution of a zone's characteristic size.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Evolution {
    pub kind: EvolutionKind,
    /// Units per second for `Expand`/`Shrink`, cycles per second for
    /// `Pulse`.
    pub rate: f32,
    pub min: f32,
    pub max: f32,
    #[cfg_attr(feature = "serde", serde(skip))]
    phase: f32,
}

impl Evolution {
    pub fn new(kind: EvolutionKind, rate: f32, min: f32, max: f32) -> Self {
        Self {
            kind,
            rate,
            min,
            max,
            phase: 0.0,
        }
    }

    /// Advances by `dt` milliseconds and returns the next size.
    pub(crate) fn advance(&mut self, current: f32, dt: f32) -> f32 {
        let seconds = dt / 1000.0;
        match self.kind {
            EvolutionKind::Expand => (current + self.rate * seconds).min(self.max),
            EvolutionKind::Shrink => {
                (current - self.rate * seconds).max(self.min.max(MIN_EVOLVED_SIZE))
            }
            EvolutionKind::Pulse => {
                self.phase += self.rate * seconds;
                let swing = 0.5 - 0.5 * (self.phase * TAU).cos();
                self.min + (self.max - self.min) * swing
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORIGIN: Vec3 = Vec3::ZERO;

    #[test]
    fn sphere_containment() {
        let sphere = Shape::Sphere { radius: 3.0 };
        // Distance ~2.83.
        assert!(sphere.contains(ORIGIN, Vec3::new(2.0, 0.0, 2.0)));
        // Distance ~4.24.
        assert!(!sphere.contains(ORIGIN, Vec3::new(3.0, 0.0, 3.0)));
    }

    #[test]
    fn sphere_is_offset_by_center() {
        let sphere = Shape::Sphere { radius: 1.0 };
        assert!(sphere.contains(Vec3::new(10.0, 0.0, 0.0), Vec3::new(10.5, 0.0, 0.0)));
        assert!(!sphere.contains(Vec3::new(10.0, 0.0, 0.0), Vec3::new(8.0, 0.0, 0.0)));
    }

    #[test]
    fn cylinder_checks_radius_and_height_band() {
        let cylinder = Shape::Cylinder {
            radius: 2.0,
            half_height: 1.0,
        };
        assert!(cylinder.contains(ORIGIN, Vec3::new(1.5, 0.5, 0.0)));
        assert!(!cylinder.contains(ORIGIN, Vec3::new(1.5, 1.5, 0.0)));
        assert!(!cylinder.contains(ORIGIN, Vec3::new(2.5, 0.0, 0.0)));
    }

    #[test]
    fn cube_bounds_all_axes() {
        let cube = Shape::Cube { half_extent: 1.0 };
        assert!(cube.contains(ORIGIN, Vec3::new(0.9, -0.9, 0.9)));
        assert!(!cube.contains(ORIGIN, Vec3::new(0.9, -1.1, 0.9)));
    }

    #[test]
    fn box_rotates_footprint_before_testing() {
        let shape = Shape::Box {
            half_extents: Vec3::new(2.0, 1.0, 0.5),
            yaw: std::f32::consts::FRAC_PI_2,
        };
        // The long axis now runs along Z.
        assert!(shape.contains(ORIGIN, Vec3::new(0.0, 0.0, 1.8)));
        assert!(!shape.contains(ORIGIN, Vec3::new(1.8, 0.0, 0.0)));
    }

    #[test]
    fn cone_respects_facing_and_half_angle() {
        let cone = Shape::Cone {
            radius: 5.0,
            facing: 0.0,
            half_angle: std::f32::consts::FRAC_PI_4,
        };
        assert!(cone.contains(ORIGIN, Vec3::new(3.0, 0.0, 1.0)));
        // Behind the facing direction.
        assert!(!cone.contains(ORIGIN, Vec3::new(-3.0, 0.0, 0.0)));
        // In the arc but out of range.
        assert!(!cone.contains(ORIGIN, Vec3::new(6.0, 0.0, 0.0)));
    }

    #[test]
    fn cone_angle_difference_wraps() {
        // Facing just below +PI; a point just past -PI is angularly close.
        let cone = Shape::Cone {
            radius: 5.0,
            facing: PI - 0.1,
            half_angle: 0.5,
        };
        let angle = -PI + 0.1;
        let point = Vec3::new(3.0 * angle.cos(), 0.0, 3.0 * angle.sin());
        assert!(cone.contains(ORIGIN, point));
    }

    #[test]
    fn torus_is_an_annulus() {
        let torus = Shape::Torus {
            major_radius: 4.0,
            minor_radius: 1.0,
        };
        assert!(torus.contains(ORIGIN, Vec3::new(4.5, 0.0, 0.0)));
        // Hole in the middle.
        assert!(!torus.contains(ORIGIN, Vec3::ZERO));
        assert!(!torus.contains(ORIGIN, Vec3::new(6.0, 0.0, 0.0)));
    }

    #[test]
    fn half_sphere_selects_a_vertical_side() {
        let dome = Shape::HalfSphere {
            radius: 2.0,
            upper: true,
        };
        assert!(dome.contains(ORIGIN, Vec3::new(0.0, 1.0, 0.0)));
        assert!(!dome.contains(ORIGIN, Vec3::new(0.0, -1.0, 0.0)));
        assert!(!dome.contains(ORIGIN, Vec3::new(0.0, 3.0, 0.0)));
    }

    #[test]
    fn expand_grows_linearly_to_max() {
        let mut evolution = Evolution::new(EvolutionKind::Expand, 2.0, 0.0, 5.0);
        assert_eq!(evolution.advance(1.0, 1000.0), 3.0);
        assert_eq!(evolution.advance(4.5, 1000.0), 5.0);
    }

    #[test]
    fn shrink_decays_linearly_and_floors_above_zero() {
        let mut evolution = Evolution::new(EvolutionKind::Shrink, 2.0, 1.0, 5.0);
        assert_eq!(evolution.advance(4.0, 1000.0), 2.0);
        assert_eq!(evolution.advance(1.5, 1000.0), 1.0);

        let mut unfloored = Evolution::new(EvolutionKind::Shrink, 2.0, 0.0, 5.0);
        assert_eq!(unfloored.advance(0.5, 1000.0), MIN_EVOLVED_SIZE);
    }

    #[test]
    fn pulse_oscillates_between_bounds() {
        let mut evolution = Evolution::new(EvolutionKind::Pulse, 1.0, 1.0, 3.0);
        // Half a cycle: at the top.
        let peak = evolution.advance(1.0, 500.0);
        assert!((peak - 3.0).abs() < 1e-3);
        // Full cycle: back at the bottom.
        let trough = evolution.advance(peak, 500.0);
        assert!((trough - 1.0).abs() < 1e-3);
    }

    #[test]
    fn box_size_scales_extents_proportionally() {
        let mut shape = Shape::Box {
            half_extents: Vec3::new(2.0, 1.0, 0.5),
            yaw: 0.0,
        };
        shape.set_size(4.0);
        assert_eq!(
            shape,
            Shape::Box {
                half_extents: Vec3::new(4.0, 2.0, 1.0),
                yaw: 0.0,
            }
        );
    }
}
