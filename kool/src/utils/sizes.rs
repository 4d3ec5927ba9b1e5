use nalgebra::{Matrix3, Matrix4, Vector2, Vector3, Vector4};
use static_assertions::const_assert_eq;

pub const F32_SIZE: u64 = size_of::<f32>() as u64;
pub const VEC2_SIZE: u64 = size_of::<Vector2<f32>>() as u64;
pub const VEC3_SIZE: u64 = size_of::<Vector3<f32>>() as u64;
pub const VEC4_SIZE: u64 = size_of::<Vector4<f32>>() as u64;
pub const MAT3_SIZE: u64 = size_of::<Matrix3<f32>>() as u64;
pub const MAT4_SIZE: u64 = size_of::<Matrix4<f32>>() as u64;

pub const STD140_VEC4_ALIGN: u64 = 16;
pub const STD140_ARRAY_STRIDE_ALIGN: u64 = 16;

const_assert_eq!(VEC2_SIZE, 2 * F32_SIZE);
const_assert_eq!(VEC3_SIZE + F32_SIZE, STD140_VEC4_ALIGN);
const_assert_eq!(VEC4_SIZE, STD140_VEC4_ALIGN);
const_assert_eq!(size_of::<Vector4<i32>>() as u64, STD140_VEC4_ALIGN);

// nalgebra stores matrices column major without padding, std140 wants each column padded to a vec4
const_assert_eq!(MAT3_SIZE, 3 * VEC3_SIZE);
const_assert_eq!(MAT4_SIZE, 4 * VEC4_SIZE);
