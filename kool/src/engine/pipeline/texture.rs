//! Opaque texture handles, typed by dimension.
//!
//! The binding core never touches pixel data. A [`Texture`] only carries an identity and a name,
//! which is all a sampler slot needs to know about what it is pointing at.

use crate::engine::pipeline::binding_layout::{GpuType, StorageDimension, TextureDimension};
use crate::engine::pipeline::bind_group_data::{SamplerRef, StorageRef};
use crate::engine::pipeline::shader_base::ShaderBindings;
use std::collections::HashMap;
use std::fmt::Debug;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_RESOURCE_ID: AtomicU64 = AtomicU64::new(1);

fn next_resource_id() -> u64 {
    NEXT_RESOURCE_ID.fetch_add(1, Ordering::Relaxed)
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Dim1d;
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Dim2d;
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Dim3d;
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct DimCube;

/// Marker for the dimension of a sampled texture.
///
/// Besides naming the dimension, every marker knows which of the per-dimension maps in
/// [`ShaderBindings`] holds its samplers, so inputs can be written once for all dimensions.
pub trait TextureDim: Debug + 'static {
    const DIMENSION: TextureDimension;

    fn samplers(bindings: &ShaderBindings) -> &HashMap<String, SamplerRef<Self>>
    where
        Self: Sized;

    fn samplers_mut(bindings: &mut ShaderBindings) -> &mut HashMap<String, SamplerRef<Self>>
    where
        Self: Sized;
}

/// Marker for the dimension of a storage texture. Cube maps have no storage variant.
pub trait StorageDim: Debug + 'static {
    const DIMENSION: StorageDimension;

    fn storage(bindings: &ShaderBindings) -> &HashMap<String, StorageRef<Self>>
    where
        Self: Sized;

    fn storage_mut(bindings: &mut ShaderBindings) -> &mut HashMap<String, StorageRef<Self>>
    where
        Self: Sized;
}

macro_rules! texture_dim {
    ($marker:ty, $dim:ident, $field:ident) => {
        impl TextureDim for $marker {
            const DIMENSION: TextureDimension = TextureDimension::$dim;

            fn samplers(bindings: &ShaderBindings) -> &HashMap<String, SamplerRef<Self>> {
                &bindings.$field
            }

            fn samplers_mut(bindings: &mut ShaderBindings) -> &mut HashMap<String, SamplerRef<Self>> {
                &mut bindings.$field
            }
        }
    };
}

macro_rules! storage_dim {
    ($marker:ty, $dim:ident, $field:ident) => {
        impl StorageDim for $marker {
            const DIMENSION: StorageDimension = StorageDimension::$dim;

            fn storage(bindings: &ShaderBindings) -> &HashMap<String, StorageRef<Self>> {
                &bindings.$field
            }

            fn storage_mut(bindings: &mut ShaderBindings) -> &mut HashMap<String, StorageRef<Self>> {
                &mut bindings.$field
            }
        }
    };
}

texture_dim!(Dim1d, D1, tex_samplers_1d);
texture_dim!(Dim2d, D2, tex_samplers_2d);
texture_dim!(Dim3d, D3, tex_samplers_3d);
texture_dim!(DimCube, Cube, tex_samplers_cube);

storage_dim!(Dim1d, D1, storage_1d);
storage_dim!(Dim2d, D2, storage_2d);
storage_dim!(Dim3d, D3, storage_3d);

/// A sampled texture resource.
#[derive(Debug)]
pub struct Texture<D: TextureDim> {
    id: u64,
    name: String,
    _dim: PhantomData<D>,
}

pub type Texture1d = Texture<Dim1d>;
pub type Texture2d = Texture<Dim2d>;
pub type Texture3d = Texture<Dim3d>;
pub type TextureCube = Texture<DimCube>;

impl<D: TextureDim> Texture<D> {
    pub fn new(name: impl Into<String>) -> Self {
        Texture {
            id: next_resource_id(),
            name: name.into(),
            _dim: PhantomData,
        }
    }

    /// Process unique identity of this resource.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dimension(&self) -> TextureDimension {
        D::DIMENSION
    }
}

impl<D: TextureDim> PartialEq for Texture<D> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<D: TextureDim> Eq for Texture<D> {}

/// A texture that compute shaders read and write as storage.
#[derive(Debug)]
pub struct StorageTexture<D: StorageDim> {
    id: u64,
    name: String,
    format: GpuType,
    _dim: PhantomData<D>,
}

pub type StorageTexture1d = StorageTexture<Dim1d>;
pub type StorageTexture2d = StorageTexture<Dim2d>;
pub type StorageTexture3d = StorageTexture<Dim3d>;

impl<D: StorageDim> StorageTexture<D> {
    pub fn new(name: impl Into<String>, format: GpuType) -> Self {
        StorageTexture {
            id: next_resource_id(),
            name: name.into(),
            format,
            _dim: PhantomData,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn format(&self) -> GpuType {
        self.format
    }

    pub fn dimension(&self) -> StorageDimension {
        D::DIMENSION
    }
}

impl<D: StorageDim> PartialEq for StorageTexture<D> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<D: StorageDim> Eq for StorageTexture<D> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_are_unique() {
        let a = Texture2d::new("albedo");
        let b = Texture2d::new("albedo");

        assert_ne!(a.id(), b.id());
        assert_ne!(a, b);
        assert_eq!(a.dimension(), TextureDimension::D2);
        assert_eq!(TextureCube::new("sky").dimension(), TextureDimension::Cube);
    }

    #[test]
    fn storage_keeps_format() {
        let field = StorageTexture3d::new("density", GpuType::Float1);
        assert_eq!(field.format(), GpuType::Float1);
        assert_eq!(field.dimension(), StorageDimension::D3);
    }
}
