use crate::engine::pipeline::binding_layout::{GpuType, UniformDescriptor};
use bytemuck::Pod;
use nalgebra::{Matrix3, Matrix4, Vector2, Vector3, Vector4};
use std::cell::{Ref, RefCell, RefMut};
use std::fmt::Debug;
use std::rc::Rc;

/// Current value of a single uniform buffer member.
#[derive(Debug, Clone, PartialEq)]
pub enum UniformValue {
    F1(f32),
    F2(Vector2<f32>),
    F3(Vector3<f32>),
    F4(Vector4<f32>),
    I1(i32),
    I2(Vector2<i32>),
    I3(Vector3<i32>),
    I4(Vector4<i32>),
    Mat3(Matrix3<f32>),
    Mat4(Matrix4<f32>),

    F1v(Vec<f32>),
    F2v(Vec<Vector2<f32>>),
    F3v(Vec<Vector3<f32>>),
    F4v(Vec<Vector4<f32>>),
    I1v(Vec<i32>),
    I2v(Vec<Vector2<i32>>),
    I3v(Vec<Vector3<i32>>),
    I4v(Vec<Vector4<i32>>),
    Mat3v(Vec<Matrix3<f32>>),
    Mat4v(Vec<Matrix4<f32>>),
}

impl UniformValue {
    /// Zeroed storage for `desc`. Matrices start out as identity.
    pub fn new(desc: &UniformDescriptor) -> Self {
        let n = desc.len();
        match (desc.gpu_type, desc.is_array()) {
            (GpuType::Float1, false) => UniformValue::F1(f32::initial()),
            (GpuType::Float2, false) => UniformValue::F2(Vector2::initial()),
            (GpuType::Float3, false) => UniformValue::F3(Vector3::initial()),
            (GpuType::Float4, false) => UniformValue::F4(Vector4::initial()),
            (GpuType::Int1, false) => UniformValue::I1(i32::initial()),
            (GpuType::Int2, false) => UniformValue::I2(Vector2::initial()),
            (GpuType::Int3, false) => UniformValue::I3(Vector3::initial()),
            (GpuType::Int4, false) => UniformValue::I4(Vector4::initial()),
            (GpuType::Mat3, false) => UniformValue::Mat3(Matrix3::initial()),
            (GpuType::Mat4, false) => UniformValue::Mat4(Matrix4::initial()),

            (GpuType::Float1, true) => UniformValue::F1v(vec![f32::initial(); n]),
            (GpuType::Float2, true) => UniformValue::F2v(vec![Vector2::initial(); n]),
            (GpuType::Float3, true) => UniformValue::F3v(vec![Vector3::initial(); n]),
            (GpuType::Float4, true) => UniformValue::F4v(vec![Vector4::initial(); n]),
            (GpuType::Int1, true) => UniformValue::I1v(vec![i32::initial(); n]),
            (GpuType::Int2, true) => UniformValue::I2v(vec![Vector2::initial(); n]),
            (GpuType::Int3, true) => UniformValue::I3v(vec![Vector3::initial(); n]),
            (GpuType::Int4, true) => UniformValue::I4v(vec![Vector4::initial(); n]),
            (GpuType::Mat3, true) => UniformValue::Mat3v(vec![Matrix3::initial(); n]),
            (GpuType::Mat4, true) => UniformValue::Mat4v(vec![Matrix4::initial(); n]),
        }
    }

    pub fn gpu_type(&self) -> GpuType {
        match self {
            UniformValue::F1(_) | UniformValue::F1v(_) => GpuType::Float1,
            UniformValue::F2(_) | UniformValue::F2v(_) => GpuType::Float2,
            UniformValue::F3(_) | UniformValue::F3v(_) => GpuType::Float3,
            UniformValue::F4(_) | UniformValue::F4v(_) => GpuType::Float4,
            UniformValue::I1(_) | UniformValue::I1v(_) => GpuType::Int1,
            UniformValue::I2(_) | UniformValue::I2v(_) => GpuType::Int2,
            UniformValue::I3(_) | UniformValue::I3v(_) => GpuType::Int3,
            UniformValue::I4(_) | UniformValue::I4v(_) => GpuType::Int4,
            UniformValue::Mat3(_) | UniformValue::Mat3v(_) => GpuType::Mat3,
            UniformValue::Mat4(_) | UniformValue::Mat4v(_) => GpuType::Mat4,
        }
    }

    /// Element count of an array value, `None` for plain values.
    pub fn array_len(&self) -> Option<usize> {
        match self {
            UniformValue::F1v(v) => Some(v.len()),
            UniformValue::F2v(v) => Some(v.len()),
            UniformValue::F3v(v) => Some(v.len()),
            UniformValue::F4v(v) => Some(v.len()),
            UniformValue::I1v(v) => Some(v.len()),
            UniformValue::I2v(v) => Some(v.len()),
            UniformValue::I3v(v) => Some(v.len()),
            UniformValue::I4v(v) => Some(v.len()),
            UniformValue::Mat3v(v) => Some(v.len()),
            UniformValue::Mat4v(v) => Some(v.len()),
            _ => None,
        }
    }

    pub fn is_array(&self) -> bool {
        self.array_len().is_some()
    }

    /// Writes the value at `offset` into `out`. Array elements are placed `stride` bytes apart.
    pub fn write_std140(&self, out: &mut [u8], offset: usize, stride: usize) {
        match self {
            UniformValue::F1(v) => v.write_std140(out, offset),
            UniformValue::F2(v) => v.write_std140(out, offset),
            UniformValue::F3(v) => v.write_std140(out, offset),
            UniformValue::F4(v) => v.write_std140(out, offset),
            UniformValue::I1(v) => v.write_std140(out, offset),
            UniformValue::I2(v) => v.write_std140(out, offset),
            UniformValue::I3(v) => v.write_std140(out, offset),
            UniformValue::I4(v) => v.write_std140(out, offset),
            UniformValue::Mat3(v) => v.write_std140(out, offset),
            UniformValue::Mat4(v) => v.write_std140(out, offset),

            UniformValue::F1v(v) => write_array(v, out, offset, stride),
            UniformValue::F2v(v) => write_array(v, out, offset, stride),
            UniformValue::F3v(v) => write_array(v, out, offset, stride),
            UniformValue::F4v(v) => write_array(v, out, offset, stride),
            UniformValue::I1v(v) => write_array(v, out, offset, stride),
            UniformValue::I2v(v) => write_array(v, out, offset, stride),
            UniformValue::I3v(v) => write_array(v, out, offset, stride),
            UniformValue::I4v(v) => write_array(v, out, offset, stride),
            UniformValue::Mat3v(v) => write_array(v, out, offset, stride),
            UniformValue::Mat4v(v) => write_array(v, out, offset, stride),
        }
    }
}

fn write_array<E: UniformElement>(values: &[E], out: &mut [u8], offset: usize, stride: usize) {
    for (i, value) in values.iter().enumerate() {
        value.write_std140(out, offset + i * stride);
    }
}

fn put<T: Pod>(out: &mut [u8], offset: usize, data: &[T]) {
    let bytes: &[u8] = bytemuck::cast_slice(data);
    out[offset..offset + bytes.len()].copy_from_slice(bytes);
}

/// A type that can live inside a [`UniformValue`], either on its own or as an array element.
pub trait UniformElement: Copy + Debug + PartialEq + 'static {
    const GPU_TYPE: GpuType;

    /// Value a freshly created uniform holds.
    fn initial() -> Self;

    fn single(value: &UniformValue) -> Option<Self>;
    fn single_mut(value: &mut UniformValue) -> Option<&mut Self>;
    fn array(value: &UniformValue) -> Option<&Vec<Self>>;
    fn array_mut(value: &mut UniformValue) -> Option<&mut Vec<Self>>;

    fn write_std140(&self, out: &mut [u8], offset: usize);
}

macro_rules! uniform_element {
    ($ty:ty, $gpu:ident, $single:ident, $array:ident, $initial:expr, |$s:ident, $out:ident, $offset:ident| $write:expr) => {
        impl UniformElement for $ty {
            const GPU_TYPE: GpuType = GpuType::$gpu;

            fn initial() -> Self {
                $initial
            }

            fn single(value: &UniformValue) -> Option<Self> {
                match value {
                    UniformValue::$single(v) => Some(*v),
                    _ => None,
                }
            }

            fn single_mut(value: &mut UniformValue) -> Option<&mut Self> {
                match value {
                    UniformValue::$single(v) => Some(v),
                    _ => None,
                }
            }

            fn array(value: &UniformValue) -> Option<&Vec<Self>> {
                match value {
                    UniformValue::$array(v) => Some(v),
                    _ => None,
                }
            }

            fn array_mut(value: &mut UniformValue) -> Option<&mut Vec<Self>> {
                match value {
                    UniformValue::$array(v) => Some(v),
                    _ => None,
                }
            }

            fn write_std140(&self, $out: &mut [u8], $offset: usize) {
                let $s = self;
                $write
            }
        }
    };
}

uniform_element!(f32, Float1, F1, F1v, 0.0, |s, out, offset| put(out, offset, &[*s]));
uniform_element!(Vector2<f32>, Float2, F2, F2v, Vector2::zeros(), |s, out, offset| put(out, offset, s.as_slice()));
uniform_element!(Vector3<f32>, Float3, F3, F3v, Vector3::zeros(), |s, out, offset| put(out, offset, s.as_slice()));
uniform_element!(Vector4<f32>, Float4, F4, F4v, Vector4::zeros(), |s, out, offset| put(out, offset, s.as_slice()));
uniform_element!(i32, Int1, I1, I1v, 0, |s, out, offset| put(out, offset, &[*s]));
uniform_element!(Vector2<i32>, Int2, I2, I2v, Vector2::zeros(), |s, out, offset| put(out, offset, s.as_slice()));
uniform_element!(Vector3<i32>, Int3, I3, I3v, Vector3::zeros(), |s, out, offset| put(out, offset, s.as_slice()));
uniform_element!(Vector4<i32>, Int4, I4, I4v, Vector4::zeros(), |s, out, offset| put(out, offset, s.as_slice()));
uniform_element!(Matrix3<f32>, Mat3, Mat3, Mat3v, Matrix3::identity(), |s, out, offset| {
    // each column is padded to a vec4
    for (i, column) in s.as_slice().chunks_exact(3).enumerate() {
        put(out, offset + i * 16, column);
    }
});
uniform_element!(Matrix4<f32>, Mat4, Mat4, Mat4v, Matrix4::identity(), |s, out, offset| put(out, offset, s.as_slice()));

/// A named uniform buffer member whose value is shared with every connected input.
///
/// Cloning is cheap and yields another handle to the same value.
#[derive(Debug, Clone)]
pub struct Uniform {
    name: Rc<str>,
    value: Rc<RefCell<UniformValue>>,
}

impl Uniform {
    pub fn new(desc: &UniformDescriptor) -> Self {
        Uniform {
            name: Rc::from(desc.name.as_str()),
            value: Rc::new(RefCell::new(UniformValue::new(desc))),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> Ref<'_, UniformValue> {
        self.value.borrow()
    }

    pub fn value_mut(&self) -> RefMut<'_, UniformValue> {
        self.value.borrow_mut()
    }

    pub fn gpu_type(&self) -> GpuType {
        self.value.borrow().gpu_type()
    }

    /// `true` if both handles point at the same live value.
    pub fn ptr_eq(&self, other: &Uniform) -> bool {
        Rc::ptr_eq(&self.value, &other.value)
    }
}
