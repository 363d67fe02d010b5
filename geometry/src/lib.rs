//! Geometry primitives for the quill text renderer.

mod color;
pub mod matrix;

pub use color::*;

pub type Matrix4 = cgmath::Matrix4<f32>;
pub type Vector3 = cgmath::Vector3<f32>;
pub type Vector4 = cgmath::Vector4<f32>;

pub struct PixelUnit;
pub type SizePx = euclid::Size2D<u32, PixelUnit>;
pub type PointPx = euclid::Point2D<i32, PixelUnit>;
