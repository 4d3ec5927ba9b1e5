//! Typed, late-bound views on named shader bindings.
//!
//! An input starts out *buffered*: reads and writes hit a local value. Once the owning
//! [`ShaderBase`](super::ShaderBase) learns about a pipeline, every input is
//! [connected](ConnectUniformListener::connect), which flushes the buffered value into the live
//! binding of the same name. From then on the input is a plain proxy of that binding.
//!
//! A name the pipeline does not declare is not an error. The input simply stays buffered, which
//! lets shared material code set uniforms that only some shader variants use.

use crate::engine::pipeline::bind_group_data::{SamplerRef, StorageRef};
use crate::engine::pipeline::shader_base::{ArraySizeMismatchErr, ShaderBindings, ShaderError};
use crate::engine::pipeline::texture::{
    Dim1d, Dim2d, Dim3d, DimCube, StorageDim, StorageTexture, Texture, TextureDim,
};
use crate::engine::pipeline::uniform::{Uniform, UniformElement};
use crate::utils::Color;
use log::{trace, warn};
use nalgebra::{Matrix3, Matrix4, Quaternion, UnitQuaternion, Vector2, Vector3, Vector4};
use snafu::ensure;
use std::cell::RefCell;
use std::fmt::Debug;
use std::sync::Arc;

/// Implemented by every input a [`ShaderBase`](super::ShaderBase) hands out.
pub trait ConnectUniformListener: Debug {
    fn name(&self) -> &str;

    fn is_connected(&self) -> bool;

    /// Resolves the input against freshly created bindings. A previous connection is dropped
    /// first, its current value becomes the buffered one.
    fn connect(&self, bindings: &ShaderBindings) -> Result<(), ShaderError>;

    /// Drops the live binding, keeping its current value as the buffered one.
    fn disconnect(&self);

    fn kind(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// A value type a [`UniformInput`] can proxy.
///
/// Most types are stored as they are, [`Color`] and [`UnitQuaternion`] travel as a `vec4`.
pub trait UniformData: Clone + Debug + 'static {
    type Element: UniformElement;

    fn to_element(&self) -> Self::Element;
    fn from_element(element: Self::Element) -> Self;
}

macro_rules! stored_as_is {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl UniformData for $ty {
                type Element = $ty;

                fn to_element(&self) -> Self::Element {
                    *self
                }

                fn from_element(element: Self::Element) -> Self {
                    element
                }
            }
        )+
    };
}

stored_as_is!(
    f32,
    Vector2<f32>,
    Vector3<f32>,
    Vector4<f32>,
    i32,
    Vector2<i32>,
    Vector3<i32>,
    Vector4<i32>,
    Matrix3<f32>,
    Matrix4<f32>,
);

impl UniformData for Color {
    type Element = Vector4<f32>;

    fn to_element(&self) -> Self::Element {
        self.to_vec4()
    }

    fn from_element(element: Self::Element) -> Self {
        Color::from(element)
    }
}

impl UniformData for UnitQuaternion<f32> {
    type Element = Vector4<f32>;

    fn to_element(&self) -> Self::Element {
        // i, j, k, w
        self.coords
    }

    /// A live value too close to zero to normalize reads back as the identity.
    fn from_element(element: Self::Element) -> Self {
        UnitQuaternion::try_new(Quaternion::from(element), f32::EPSILON)
            .unwrap_or_else(UnitQuaternion::identity)
    }
}

/// Input for a single uniform value.
#[derive(Debug)]
pub struct UniformInput<T: UniformData> {
    name: String,
    buffer: RefCell<T>,
    uniform: RefCell<Option<Uniform>>,
}

pub type UniformInput1f = UniformInput<f32>;
pub type UniformInput2f = UniformInput<Vector2<f32>>;
pub type UniformInput3f = UniformInput<Vector3<f32>>;
pub type UniformInput4f = UniformInput<Vector4<f32>>;
pub type UniformInput1i = UniformInput<i32>;
pub type UniformInput2i = UniformInput<Vector2<i32>>;
pub type UniformInput3i = UniformInput<Vector3<i32>>;
pub type UniformInput4i = UniformInput<Vector4<i32>>;
pub type UniformInputMat3f = UniformInput<Matrix3<f32>>;
pub type UniformInputMat4f = UniformInput<Matrix4<f32>>;
pub type UniformInputColor = UniformInput<Color>;
pub type UniformInputQuat = UniformInput<UnitQuaternion<f32>>;

impl<T: UniformData> UniformInput<T> {
    pub fn new(name: impl Into<String>, initial: T) -> Self {
        UniformInput {
            name: name.into(),
            buffer: RefCell::new(initial),
            uniform: RefCell::new(None),
        }
    }

    pub fn get(&self) -> T {
        if let Some(uniform) = self.uniform.borrow().as_ref()
            && let Some(element) = T::Element::single(&uniform.value())
        {
            return T::from_element(element);
        }
        self.buffer.borrow().clone()
    }

    pub fn set(&self, value: T) {
        if let Some(uniform) = self.uniform.borrow().as_ref()
            && let Some(slot) = T::Element::single_mut(&mut uniform.value_mut())
        {
            *slot = value.to_element();
            return;
        }
        *self.buffer.borrow_mut() = value;
    }
}

impl<T: UniformData> ConnectUniformListener for UniformInput<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_connected(&self) -> bool {
        self.uniform.borrow().is_some()
    }

    fn connect(&self, bindings: &ShaderBindings) -> Result<(), ShaderError> {
        self.disconnect();

        let Some(uniform) = bindings.uniforms.get(&self.name) else {
            trace!("[{} Input] Not declared by the pipeline, staying buffered", self.name);
            return Ok(());
        };

        {
            let mut value = uniform.value_mut();
            let Some(slot) = T::Element::single_mut(&mut value) else {
                warn!(
                    "[{} Input] Uniform is declared as {}{}, expected {}. Staying buffered",
                    self.name,
                    value.gpu_type(),
                    if value.is_array() { "[]" } else { "" },
                    T::Element::GPU_TYPE,
                );
                return Ok(());
            };
            *slot = self.buffer.borrow().to_element();
        }

        *self.uniform.borrow_mut() = Some(uniform.clone());
        Ok(())
    }

    fn disconnect(&self) {
        let Some(uniform) = self.uniform.borrow_mut().take() else {
            return;
        };
        if let Some(element) = T::Element::single(&uniform.value()) {
            *self.buffer.borrow_mut() = T::from_element(element);
        }
    }
}

/// Input for a fixed size uniform array.
///
/// The requested size must match the declared one, a mismatch fails the connect with
/// [`ShaderError::ArraySizeMismatch`]. On success the buffered elements are moved into the live
/// binding.
#[derive(Debug)]
pub struct UniformArrayInput<E: UniformElement> {
    name: String,
    array_size: usize,
    buffer: RefCell<Vec<E>>,
    uniform: RefCell<Option<Uniform>>,
}

pub type UniformInput1fv = UniformArrayInput<f32>;
pub type UniformInput2fv = UniformArrayInput<Vector2<f32>>;
pub type UniformInput3fv = UniformArrayInput<Vector3<f32>>;
pub type UniformInput4fv = UniformArrayInput<Vector4<f32>>;
pub type UniformInput1iv = UniformArrayInput<i32>;
pub type UniformInput2iv = UniformArrayInput<Vector2<i32>>;
pub type UniformInput3iv = UniformArrayInput<Vector3<i32>>;
pub type UniformInput4iv = UniformArrayInput<Vector4<i32>>;
pub type UniformInputMat3fv = UniformArrayInput<Matrix3<f32>>;
pub type UniformInputMat4fv = UniformArrayInput<Matrix4<f32>>;

impl<E: UniformElement> UniformArrayInput<E> {
    pub fn new(name: impl Into<String>, array_size: usize) -> Self {
        UniformArrayInput {
            name: name.into(),
            array_size,
            buffer: RefCell::new(vec![E::initial(); array_size]),
            uniform: RefCell::new(None),
        }
    }

    pub fn array_size(&self) -> usize {
        self.array_size
    }

    pub fn len(&self) -> usize {
        self.with(<[E]>::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Runs `f` on the current elements, live ones if connected.
    pub fn with<R>(&self, f: impl FnOnce(&[E]) -> R) -> R {
        if let Some(uniform) = self.uniform.borrow().as_ref()
            && let Some(values) = E::array(&uniform.value())
        {
            return f(values);
        }
        f(&self.buffer.borrow())
    }

    pub fn with_mut<R>(&self, f: impl FnOnce(&mut [E]) -> R) -> R {
        if let Some(uniform) = self.uniform.borrow().as_ref()
            && let Some(values) = E::array_mut(&mut uniform.value_mut())
        {
            return f(values);
        }
        f(&mut self.buffer.borrow_mut())
    }

    pub fn get(&self, index: usize) -> Option<E> {
        self.with(|values| values.get(index).copied())
    }

    /// Returns `false` and changes nothing if `index` is out of bounds.
    pub fn set(&self, index: usize, value: E) -> bool {
        self.with_mut(|values| match values.get_mut(index) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        })
    }

    pub fn to_vec(&self) -> Vec<E> {
        self.with(<[E]>::to_vec)
    }
}

impl<E: UniformElement> ConnectUniformListener for UniformArrayInput<E> {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_connected(&self) -> bool {
        self.uniform.borrow().is_some()
    }

    fn connect(&self, bindings: &ShaderBindings) -> Result<(), ShaderError> {
        self.disconnect();

        let Some(uniform) = bindings.uniforms.get(&self.name) else {
            trace!("[{} Input] Not declared by the pipeline, staying buffered", self.name);
            return Ok(());
        };

        {
            let mut value = uniform.value_mut();
            let Some(live) = E::array_mut(&mut value) else {
                warn!(
                    "[{} Input] Uniform is declared as {}, expected an array of {}. Staying buffered",
                    self.name,
                    value.gpu_type(),
                    E::GPU_TYPE,
                );
                return Ok(());
            };

            ensure!(
                live.len() == self.array_size,
                ArraySizeMismatchErr {
                    name: self.name.clone(),
                    requested: self.array_size,
                    declared: live.len(),
                }
            );

            *live = std::mem::take(&mut *self.buffer.borrow_mut());
        }

        *self.uniform.borrow_mut() = Some(uniform.clone());
        Ok(())
    }

    fn disconnect(&self) {
        let Some(uniform) = self.uniform.borrow_mut().take() else {
            return;
        };
        if let Some(values) = E::array(&uniform.value()) {
            *self.buffer.borrow_mut() = values.clone();
        }
    }
}

/// Input for a sampled texture.
#[derive(Debug)]
pub struct UniformInputTexture<D: TextureDim> {
    name: String,
    buffer: RefCell<Option<Arc<Texture<D>>>>,
    sampler: RefCell<Option<SamplerRef<D>>>,
}

pub type UniformInputTexture1d = UniformInputTexture<Dim1d>;
pub type UniformInputTexture2d = UniformInputTexture<Dim2d>;
pub type UniformInputTexture3d = UniformInputTexture<Dim3d>;
pub type UniformInputTextureCube = UniformInputTexture<DimCube>;

impl<D: TextureDim> UniformInputTexture<D> {
    pub fn new(name: impl Into<String>, initial: Option<Arc<Texture<D>>>) -> Self {
        UniformInputTexture {
            name: name.into(),
            buffer: RefCell::new(initial),
            sampler: RefCell::new(None),
        }
    }

    pub fn get(&self) -> Option<Arc<Texture<D>>> {
        match self.sampler.borrow().as_ref() {
            Some(sampler) => sampler.borrow().texture().cloned(),
            None => self.buffer.borrow().clone(),
        }
    }

    pub fn set(&self, texture: Option<Arc<Texture<D>>>) {
        match self.sampler.borrow().as_ref() {
            Some(sampler) => sampler.borrow_mut().set_texture(texture),
            None => *self.buffer.borrow_mut() = texture,
        }
    }
}

impl<D: TextureDim> ConnectUniformListener for UniformInputTexture<D> {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_connected(&self) -> bool {
        self.sampler.borrow().is_some()
    }

    fn connect(&self, bindings: &ShaderBindings) -> Result<(), ShaderError> {
        self.disconnect();

        let Some(sampler) = D::samplers(bindings).get(&self.name) else {
            trace!("[{} Input] No such texture in the pipeline, staying buffered", self.name);
            return Ok(());
        };

        sampler.borrow_mut().set_texture(self.buffer.borrow().clone());
        *self.sampler.borrow_mut() = Some(sampler.clone());
        Ok(())
    }

    fn disconnect(&self) {
        if let Some(previous) = self.sampler.borrow_mut().take() {
            *self.buffer.borrow_mut() = previous.borrow().texture().cloned();
        }
    }
}

/// Input for an array of sampled textures, checked against the declared array size.
#[derive(Debug)]
pub struct UniformInputTextureArray<D: TextureDim> {
    name: String,
    array_size: usize,
    buffer: RefCell<Vec<Option<Arc<Texture<D>>>>>,
    sampler: RefCell<Option<SamplerRef<D>>>,
}

pub type UniformInputTexture1dArray = UniformInputTextureArray<Dim1d>;
pub type UniformInputTexture2dArray = UniformInputTextureArray<Dim2d>;
pub type UniformInputTexture3dArray = UniformInputTextureArray<Dim3d>;
pub type UniformInputTextureCubeArray = UniformInputTextureArray<DimCube>;

impl<D: TextureDim> UniformInputTextureArray<D> {
    pub fn new(name: impl Into<String>, array_size: usize) -> Self {
        UniformInputTextureArray {
            name: name.into(),
            array_size,
            buffer: RefCell::new(vec![None; array_size]),
            sampler: RefCell::new(None),
        }
    }

    pub fn array_size(&self) -> usize {
        self.array_size
    }

    pub fn get(&self, index: usize) -> Option<Arc<Texture<D>>> {
        match self.sampler.borrow().as_ref() {
            Some(sampler) => sampler.borrow().textures().get(index).cloned().flatten(),
            None => self.buffer.borrow().get(index).cloned().flatten(),
        }
    }

    /// Returns `false` and changes nothing if `index` is out of bounds.
    pub fn set(&self, index: usize, texture: Option<Arc<Texture<D>>>) -> bool {
        let assign = |slots: &mut [Option<Arc<Texture<D>>>]| match slots.get_mut(index) {
            Some(slot) => {
                *slot = texture;
                true
            }
            None => false,
        };

        match self.sampler.borrow().as_ref() {
            Some(sampler) => assign(sampler.borrow_mut().textures_mut()),
            None => assign(&mut self.buffer.borrow_mut()[..]),
        }
    }

    pub fn to_vec(&self) -> Vec<Option<Arc<Texture<D>>>> {
        match self.sampler.borrow().as_ref() {
            Some(sampler) => sampler.borrow().textures().to_vec(),
            None => self.buffer.borrow().clone(),
        }
    }
}

impl<D: TextureDim> ConnectUniformListener for UniformInputTextureArray<D> {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_connected(&self) -> bool {
        self.sampler.borrow().is_some()
    }

    fn connect(&self, bindings: &ShaderBindings) -> Result<(), ShaderError> {
        self.disconnect();

        let Some(sampler) = D::samplers(bindings).get(&self.name) else {
            trace!("[{} Input] No such texture in the pipeline, staying buffered", self.name);
            return Ok(());
        };

        {
            let mut live = sampler.borrow_mut();
            let declared = live.array_size();
            ensure!(
                declared == self.array_size,
                ArraySizeMismatchErr {
                    name: self.name.clone(),
                    requested: self.array_size,
                    declared,
                }
            );

            let buffer = std::mem::take(&mut *self.buffer.borrow_mut());
            for (slot, texture) in live.textures_mut().iter_mut().zip(buffer) {
                *slot = texture;
            }
        }

        *self.sampler.borrow_mut() = Some(sampler.clone());
        Ok(())
    }

    fn disconnect(&self) {
        if let Some(previous) = self.sampler.borrow_mut().take() {
            *self.buffer.borrow_mut() = previous.borrow().textures().to_vec();
        }
    }
}

/// Input for a storage texture.
#[derive(Debug)]
pub struct UniformInputStorage<D: StorageDim> {
    name: String,
    buffer: RefCell<Option<Arc<StorageTexture<D>>>>,
    storage: RefCell<Option<StorageRef<D>>>,
}

pub type UniformInputStorage1d = UniformInputStorage<Dim1d>;
pub type UniformInputStorage2d = UniformInputStorage<Dim2d>;
pub type UniformInputStorage3d = UniformInputStorage<Dim3d>;

impl<D: StorageDim> UniformInputStorage<D> {
    pub fn new(name: impl Into<String>, initial: Option<Arc<StorageTexture<D>>>) -> Self {
        UniformInputStorage {
            name: name.into(),
            buffer: RefCell::new(initial),
            storage: RefCell::new(None),
        }
    }

    pub fn get(&self) -> Option<Arc<StorageTexture<D>>> {
        match self.storage.borrow().as_ref() {
            Some(storage) => storage.borrow().texture().cloned(),
            None => self.buffer.borrow().clone(),
        }
    }

    pub fn set(&self, texture: Option<Arc<StorageTexture<D>>>) {
        match self.storage.borrow().as_ref() {
            Some(storage) => storage.borrow_mut().set_texture(texture),
            None => *self.buffer.borrow_mut() = texture,
        }
    }
}

impl<D: StorageDim> ConnectUniformListener for UniformInputStorage<D> {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_connected(&self) -> bool {
        self.storage.borrow().is_some()
    }

    fn connect(&self, bindings: &ShaderBindings) -> Result<(), ShaderError> {
        self.disconnect();

        let Some(storage) = D::storage(bindings).get(&self.name) else {
            trace!("[{} Input] No such storage texture in the pipeline, staying buffered", self.name);
            return Ok(());
        };

        {
            let mut live = storage.borrow_mut();
            if let Some(texture) = self.buffer.borrow().as_ref()
                && texture.format() != live.format()
            {
                warn!(
                    "[{} Input] Storage texture `{}` has format {}, binding expects {}",
                    self.name,
                    texture.name(),
                    texture.format(),
                    live.format()
                );
            }
            live.set_texture(self.buffer.borrow().clone());
        }

        *self.storage.borrow_mut() = Some(storage.clone());
        Ok(())
    }

    fn disconnect(&self) {
        if let Some(previous) = self.storage.borrow_mut().take() {
            *self.buffer.borrow_mut() = previous.borrow().texture().cloned();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::pipeline::binding_layout::{GpuType, UniformDescriptor};
    use crate::engine::pipeline::uniform::UniformValue;

    fn bindings_with(descs: &[UniformDescriptor]) -> ShaderBindings {
        let mut bindings = ShaderBindings::default();
        for desc in descs {
            bindings.uniforms.insert(desc.name.clone(), Uniform::new(desc));
        }
        bindings
    }

    #[test]
    fn buffered_until_connected() {
        let input = UniformInput1f::new("uRoughness", 0.5);
        assert!(!input.is_connected());
        input.set(0.6);
        assert_eq!(input.get(), 0.6);

        let bindings = bindings_with(&[UniformDescriptor::new("uRoughness", GpuType::Float1)]);
        input.connect(&bindings).unwrap();

        assert!(input.is_connected());
        assert_eq!(*bindings.uniforms["uRoughness"].value(), UniformValue::F1(0.6));
    }

    #[test]
    fn type_mismatch_stays_buffered() {
        let input = UniformInput1i::new("uRoughness", 3);
        let bindings = bindings_with(&[UniformDescriptor::new("uRoughness", GpuType::Float1)]);

        input.connect(&bindings).unwrap();
        assert!(!input.is_connected());
        assert_eq!(*bindings.uniforms["uRoughness"].value(), UniformValue::F1(0.0));
    }

    #[test]
    fn color_travels_as_vec4() {
        let input = UniformInputColor::new("uTint", Color::new(0.1, 0.2, 0.3, 1.0));
        let bindings = bindings_with(&[UniformDescriptor::new("uTint", GpuType::Float4)]);
        input.connect(&bindings).unwrap();

        assert_eq!(
            *bindings.uniforms["uTint"].value(),
            UniformValue::F4(Vector4::new(0.1, 0.2, 0.3, 1.0))
        );
        assert_eq!(input.get(), Color::new(0.1, 0.2, 0.3, 1.0));
    }

    #[test]
    fn quaternion_round_trips_identity() {
        let input = UniformInputQuat::new("uRotation", UnitQuaternion::identity());
        let bindings = bindings_with(&[UniformDescriptor::new("uRotation", GpuType::Float4)]);
        input.connect(&bindings).unwrap();

        assert_eq!(
            *bindings.uniforms["uRotation"].value(),
            UniformValue::F4(Vector4::new(0.0, 0.0, 0.0, 1.0))
        );
        assert_eq!(input.get(), UnitQuaternion::identity());
    }

    #[test]
    fn degenerate_quaternion_reads_as_identity() {
        let input = UniformInputQuat::new("uRotation", UnitQuaternion::identity());
        let bindings = bindings_with(&[UniformDescriptor::new("uRotation", GpuType::Float4)]);
        input.connect(&bindings).unwrap();

        *bindings.uniforms["uRotation"].value_mut() = UniformValue::F4(Vector4::zeros());
        let rotation = input.get();
        assert!(rotation.coords.iter().all(|c| c.is_finite()));
        assert_eq!(rotation, UnitQuaternion::identity());
    }

    #[test]
    fn array_buffer_moves_into_live_binding() {
        let input = UniformInput1fv::new("uWeights", 3);
        assert!(input.set(1, 2.0));
        assert!(!input.set(3, 1.0));

        let bindings =
            bindings_with(&[UniformDescriptor::new("uWeights", GpuType::Float1).array(3)]);
        input.connect(&bindings).unwrap();

        assert_eq!(
            *bindings.uniforms["uWeights"].value(),
            UniformValue::F1v(vec![0.0, 2.0, 0.0])
        );
        input.set(0, 7.0);
        assert_eq!(input.to_vec(), vec![7.0, 2.0, 0.0]);
        assert_eq!(input.len(), 3);
    }

    #[test]
    fn array_size_mismatch() {
        let input = UniformInput4fv::new("uLightPositions", 4);
        let bindings =
            bindings_with(&[UniformDescriptor::new("uLightPositions", GpuType::Float4).array(2)]);

        let err = input.connect(&bindings);
        assert!(matches!(
            err,
            Err(ShaderError::ArraySizeMismatch {
                requested: 4,
                declared: 2,
                ..
            })
        ));
        assert!(!input.is_connected());
    }

    #[test]
    fn reconnect_carries_the_live_value() {
        let input = UniformInput1f::new("uRoughness", 0.5);
        let first = bindings_with(&[UniformDescriptor::new("uRoughness", GpuType::Float1)]);
        input.connect(&first).unwrap();
        input.set(0.9);

        let second = bindings_with(&[UniformDescriptor::new("uRoughness", GpuType::Float1)]);
        input.connect(&second).unwrap();
        assert_eq!(*second.uniforms["uRoughness"].value(), UniformValue::F1(0.9));

        input.connect(&ShaderBindings::default()).unwrap();
        assert!(!input.is_connected());
        assert_eq!(input.get(), 0.9);
    }

    #[test]
    fn disconnect_keeps_the_live_value() {
        let input = UniformInput2fv::new("uOffsets", 2);
        let bindings =
            bindings_with(&[UniformDescriptor::new("uOffsets", GpuType::Float2).array(2)]);
        input.connect(&bindings).unwrap();
        input.set(1, Vector2::new(3.0, 4.0));

        input.disconnect();
        assert!(!input.is_connected());
        assert_eq!(input.get(1), Some(Vector2::new(3.0, 4.0)));

        input.set(0, Vector2::new(1.0, 1.0));
        assert_eq!(
            *bindings.uniforms["uOffsets"].value(),
            UniformValue::F2v(vec![Vector2::zeros(), Vector2::new(3.0, 4.0)])
        );
    }
}
