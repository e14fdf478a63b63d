//! Scene-space geometry.
//!
//! The scene uses a right-handed frame: `+x` is the viewer's right, `+y` is
//! up and the viewer looks down `-z`.  Panels only ever turn about the
//! vertical axis, so a rotation is a single [`Yaw`] and a panel's pose is an
//! [`ArcPose`]: an offset in the panel's arc frame swung by its yaw.
//!
//! # Example
//!
//! ```rust
//! use memlane_layout::geometry::{ArcPose, Vec3, Yaw};
//!
//! // A panel 5 units in front of the viewer, swung 90° to the left.
//! let pose = ArcPose::new(Yaw::from_degrees(90.0), Vec3::new(0.0, 0.0, -5.0));
//! let world = pose.world();
//! assert!((world.x + 5.0).abs() < 1e-4);
//! assert!(world.z.abs() < 1e-4);
//! ```

/// A point or offset in scene units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Euclidean distance to `other`.
    pub fn distance(self, other: Self) -> f32 {
        let (dx, dy, dz) = (self.x - other.x, self.y - other.y, self.z - other.z);
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

/// Rotation about the vertical (`+y`) axis.  Positive angles turn
/// counter-clockwise when seen from above, i.e. towards the viewer's left.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Yaw {
    sin: f32,
    cos: f32,
}

impl Yaw {
    pub fn from_degrees(degrees: f32) -> Self {
        let (sin, cos) = degrees.to_radians().sin_cos();
        Self { sin, cos }
    }

    /// Turn `v` about the vertical axis; height is untouched.
    pub fn apply(self, v: Vec3) -> Vec3 {
        Vec3::new(
            self.cos * v.x + self.sin * v.z,
            v.y,
            self.cos * v.z - self.sin * v.x,
        )
    }
}

/// A panel's offset in its arc frame plus the yaw that swings the frame into
/// world space.  Panels face the viewer, so the yaw is also their heading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArcPose {
    pub yaw: Yaw,
    pub offset: Vec3,
}

impl ArcPose {
    pub fn new(yaw: Yaw, offset: Vec3) -> Self {
        Self { yaw, offset }
    }

    /// Panel centre in world space.
    pub fn world(self) -> Vec3 {
        self.yaw.apply(self.offset)
    }
}

/// Straight-line distance between two points on a circle of `radius` that are
/// `angle_deg` apart.
pub fn chord_length(radius: f32, angle_deg: f32) -> f32 {
    2.0 * radius.abs() * (angle_deg.to_radians() * 0.5).sin()
}
