use scenario_spawner::scenario::{apply_offset, offset_transform, Offset};
use scenario_spawner::world::{Location, Rotation, Transform};

fn anchor(x: f32, y: f32, z: f32, yaw: f32) -> Transform {
    Transform::new(Location::new(x, y, z), Rotation::from_yaw(yaw))
}

fn assert_close(actual: f32, expected: f32) {
    assert!(
        (actual - expected).abs() < 1e-4,
        "expected {}, got {}",
        expected,
        actual
    );
}

#[test]
fn test_zero_offset_is_identity() {
    let base = anchor(12.5, -3.0, 0.3, 37.0);
    assert_eq!(apply_offset(&base, 0.0, 0.0), base);
    assert_eq!(offset_transform(&base, Offset::ZERO), base);
}

#[test]
fn test_forward_and_lateral_at_yaw_zero() {
    let base = anchor(10.0, 20.0, 0.5, 0.0);
    let moved = apply_offset(&base, 5.0, 0.5);

    assert_close(moved.location.x, 15.0);
    // Right-hand lateral axis at yaw 0 points toward -y
    assert_close(moved.location.y, 19.5);
    assert_close(moved.location.z, 0.5);
    assert_eq!(moved.rotation, base.rotation);
}

#[test]
fn test_offset_follows_heading() {
    let north = apply_offset(&anchor(0.0, 0.0, 0.0, 90.0), 2.0, 1.0);
    assert_close(north.location.x, 1.0);
    assert_close(north.location.y, 2.0);

    let west = apply_offset(&anchor(0.0, 0.0, 0.0, 180.0), 3.0, 1.0);
    assert_close(west.location.x, -3.0);
    assert_close(west.location.y, 1.0);
}

#[test]
fn test_offset_keeps_height_and_rotation() {
    let base = Transform::new(
        Location::new(1.0, 2.0, 7.25),
        Rotation::new(4.0, 45.0, -2.0),
    );
    let moved = apply_offset(&base, 10.0, -3.0);

    assert_eq!(moved.location.z, 7.25);
    assert_eq!(moved.rotation, base.rotation);
    assert_close(moved.location.distance(&base.location), (100.0f32 + 9.0).sqrt());
}

#[test]
fn test_offset_is_deterministic() {
    let base = anchor(-40.0, 8.0, 0.0, 213.0);
    let offset = Offset::from((4.5, -1.25));
    assert_eq!(offset_transform(&base, offset), offset_transform(&base, offset));
}
