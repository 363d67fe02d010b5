//! Matrix helpers for the text renderer's projection and model transforms.
//!
//! All functions are pure: they return a new column-major matrix and never
//! mutate their arguments. Composition is ordinary [`Matrix4`]
//! multiplication.

use cgmath::{InnerSpace, Rad, SquareMatrix};

use crate::{Matrix4, Vector3};

pub fn identity() -> Matrix4 {
    Matrix4::identity()
}

pub fn translation(x: f32, y: f32, z: f32) -> Matrix4 {
    Matrix4::from_translation(Vector3::new(x, y, z))
}

pub fn scaling(x: f32, y: f32, z: f32) -> Matrix4 {
    Matrix4::from_nonuniform_scale(x, y, z)
}

/// Rotation around an arbitrary axis.
///
/// The axis does not need to be unit length; it is normalized on a copy, the
/// caller's vector stays untouched.
pub fn axis_rotation(axis: Vector3, angle: Rad<f32>) -> Matrix4 {
    Matrix4::from_axis_angle(axis.normalize(), angle)
}

/// Orthographic projection in OpenGL clip-space conventions.
pub fn orthographic(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Matrix4 {
    let sx = 2.0 / (right - left);
    let sy = 2.0 / (top - bottom);
    let sz = -2.0 / (far - near);
    let tx = -(right + left) / (right - left);
    let ty = -(top + bottom) / (top - bottom);
    let tz = -(far + near) / (far - near);

    #[rustfmt::skip]
    let m = Matrix4::new(
        sx, 0.0, 0.0, 0.0,
        0.0, sy, 0.0, 0.0,
        0.0, 0.0, sz, 0.0,
        tx, ty, tz, 1.0,
    );
    m
}

/// The per-draw model transform: scales around `origin` instead of the world
/// origin, so scaled text stays anchored at its draw position.
pub fn pivot_scale(origin: (f32, f32), scale_x: f32, scale_y: f32) -> Matrix4 {
    translation(origin.0, origin.1, 0.0)
        * scaling(scale_x, scale_y, 1.0)
        * translation(-origin.0, -origin.1, 0.0)
}
