//! Local-frame offsets around an anchor pose

use crate::world::Transform;

/// A (forward, lateral) displacement in meters, in an anchor's heading frame.
/// Positive forward moves along the heading, positive lateral moves right.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Offset {
    pub forward: f32,
    pub lateral: f32,
}

impl Offset {
    pub const ZERO: Offset = Offset {
        forward: 0.0,
        lateral: 0.0,
    };

    pub fn new(forward: f32, lateral: f32) -> Self {
        Self { forward, lateral }
    }
}

impl From<(f32, f32)> for Offset {
    fn from((forward, lateral): (f32, f32)) -> Self {
        Self::new(forward, lateral)
    }
}

/// Translate `anchor` by a displacement in its own heading frame.
///
/// The world is left-handed, so the right-hand lateral axis is
/// `(sin θ, -cos θ)`. Only the position moves; rotation is copied as is.
pub fn apply_offset(anchor: &Transform, forward: f32, lateral: f32) -> Transform {
    let yaw = anchor.rotation.yaw.to_radians();
    let (fx, fy) = (yaw.cos(), yaw.sin());
    let (rx, ry) = (yaw.sin(), -yaw.cos());

    let mut moved = *anchor;
    moved.location.x += fx * forward + rx * lateral;
    moved.location.y += fy * forward + ry * lateral;
    moved
}

/// Shorthand for [`apply_offset`] with an [`Offset`] value
pub fn offset_transform(anchor: &Transform, offset: Offset) -> Transform {
    apply_offset(anchor, offset.forward, offset.lateral)
}
