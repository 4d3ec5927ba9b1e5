//! Immutable, hashable descriptions of a single named GPU resource.
//!
//! A [`BindingLayout`] is what shader generation emits for every uniform buffer, texture and
//! storage texture a shader references. Its [`content_hash`](BindingLayout::content_hash) is a
//! pure function of the declared content, so two shaders that declare the same resource produce
//! equal layouts and can share pipeline objects. The binding index is assigned later, when the
//! binding is inserted into a [`BindGroupLayout`](super::BindGroupLayout), and never takes part in
//! the hash.

use crate::engine::pipeline::bind_group_layout::{InvalidStorageExtentErr, LayoutError};
use crate::engine::pipeline::std140::Std140BufferLayout;
use bitflags::bitflags;
use bon::bon;
use kool_utils::LongHash;
use snafu::ensure;
use std::fmt::{Display, Formatter};
use std::hash::{Hash, Hasher};

bitflags! {
    /// Shader stages that reference a binding.
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
    pub struct ShaderStages: u32 {
        const VERTEX = 1 << 0;
        const FRAGMENT = 1 << 1;
        const COMPUTE = 1 << 2;

        const VERTEX_FRAGMENT = Self::VERTEX.bits() | Self::FRAGMENT.bits();
        const ALL = Self::VERTEX.bits() | Self::FRAGMENT.bits() | Self::COMPUTE.bits();
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum BindingType {
    Texture1d,
    Texture2d,
    Texture3d,
    TextureCube,
    UniformBuffer,
    Storage1d,
    Storage2d,
    Storage3d,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum TextureDimension {
    D1,
    D2,
    D3,
    Cube,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum StorageDimension {
    D1,
    D2,
    D3,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub enum TextureSampleType {
    #[default]
    Float,
    UnfilterableFloat,
    Depth,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum StorageAccessType {
    ReadOnly,
    WriteOnly,
    ReadWrite,
}

/// Element type of a uniform or a storage texture.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum GpuType {
    Float1,
    Float2,
    Float3,
    Float4,
    Int1,
    Int2,
    Int3,
    Int4,
    Mat3,
    Mat4,
}

impl GpuType {
    pub fn is_matrix(self) -> bool {
        matches!(self, GpuType::Mat3 | GpuType::Mat4)
    }

    pub fn is_int(self) -> bool {
        matches!(
            self,
            GpuType::Int1 | GpuType::Int2 | GpuType::Int3 | GpuType::Int4
        )
    }

    /// Number of scalar components, for matrices the number of columns.
    pub fn components(self) -> u32 {
        match self {
            GpuType::Float1 | GpuType::Int1 => 1,
            GpuType::Float2 | GpuType::Int2 => 2,
            GpuType::Float3 | GpuType::Int3 | GpuType::Mat3 => 3,
            GpuType::Float4 | GpuType::Int4 | GpuType::Mat4 => 4,
        }
    }
}

impl Display for GpuType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            GpuType::Float1 => "float",
            GpuType::Float2 => "vec2f",
            GpuType::Float3 => "vec3f",
            GpuType::Float4 => "vec4f",
            GpuType::Int1 => "int",
            GpuType::Int2 => "vec2i",
            GpuType::Int3 => "vec3i",
            GpuType::Int4 => "vec4i",
            GpuType::Mat3 => "mat3f",
            GpuType::Mat4 => "mat4f",
        };
        f.write_str(name)
    }
}

/// One member of a uniform buffer. `array_size` is `None` for plain values.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UniformDescriptor {
    pub name: String,
    pub gpu_type: GpuType,
    pub array_size: Option<u32>,
}

impl UniformDescriptor {
    pub fn new(name: impl Into<String>, gpu_type: GpuType) -> Self {
        UniformDescriptor {
            name: name.into(),
            gpu_type,
            array_size: None,
        }
    }

    pub fn array(mut self, array_size: u32) -> Self {
        self.array_size = Some(array_size.max(1));
        self
    }

    pub fn is_array(&self) -> bool {
        self.array_size.is_some()
    }

    /// Number of elements, 1 for plain values.
    pub fn len(&self) -> usize {
        self.array_size.unwrap_or(1) as usize
    }
}

#[derive(Debug, Clone)]
pub struct UniformBufferLayout {
    name: String,
    uniforms: Vec<UniformDescriptor>,
    stages: ShaderStages,
    layout: Std140BufferLayout,
    hash: u64,
    binding_index: Option<u32>,
}

impl UniformBufferLayout {
    pub fn new(
        name: impl Into<String>,
        uniforms: Vec<UniformDescriptor>,
        stages: ShaderStages,
    ) -> Self {
        let name = name.into();

        let mut hash = LongHash::new();
        hash.push(&name).push(&BindingType::UniformBuffer).push(&stages);
        for uniform in &uniforms {
            hash.push(&uniform.name)
                .push(&uniform.gpu_type)
                .push(&uniform.array_size);
        }

        UniformBufferLayout {
            layout: Std140BufferLayout::new(&uniforms),
            hash: hash.hash(),
            name,
            uniforms,
            stages,
            binding_index: None,
        }
    }

    pub fn uniforms(&self) -> &[UniformDescriptor] {
        &self.uniforms
    }

    pub fn has_uniform(&self, name: &str) -> bool {
        self.uniforms.iter().any(|u| u.name == name)
    }

    pub fn layout(&self) -> &Std140BufferLayout {
        &self.layout
    }
}

#[derive(Debug, Clone)]
pub struct TextureLayout {
    name: String,
    dimension: TextureDimension,
    stages: ShaderStages,
    sample_type: TextureSampleType,
    array_size: u32,
    hash: u64,
    binding_index: Option<u32>,
}

impl TextureLayout {
    pub fn new(name: impl Into<String>, dimension: TextureDimension, stages: ShaderStages) -> Self {
        let mut layout = TextureLayout {
            name: name.into(),
            dimension,
            stages,
            sample_type: TextureSampleType::Float,
            array_size: 1,
            hash: 0,
            binding_index: None,
        };
        layout.rehash();
        layout
    }

    pub fn tex_1d(name: impl Into<String>, stages: ShaderStages) -> Self {
        Self::new(name, TextureDimension::D1, stages)
    }

    pub fn tex_2d(name: impl Into<String>, stages: ShaderStages) -> Self {
        Self::new(name, TextureDimension::D2, stages)
    }

    pub fn tex_3d(name: impl Into<String>, stages: ShaderStages) -> Self {
        Self::new(name, TextureDimension::D3, stages)
    }

    pub fn tex_cube(name: impl Into<String>, stages: ShaderStages) -> Self {
        Self::new(name, TextureDimension::Cube, stages)
    }

    pub fn with_sample_type(mut self, sample_type: TextureSampleType) -> Self {
        self.sample_type = sample_type;
        self.rehash();
        self
    }

    pub fn with_array_size(mut self, array_size: u32) -> Self {
        self.array_size = array_size.max(1);
        self.rehash();
        self
    }

    fn rehash(&mut self) {
        let mut hash = LongHash::new();
        hash.push(&self.name)
            .push(&self.binding_type())
            .push(&self.stages)
            .push(&self.sample_type)
            .push(&self.array_size);
        self.hash = hash.hash();
    }

    pub fn dimension(&self) -> TextureDimension {
        self.dimension
    }

    pub fn sample_type(&self) -> TextureSampleType {
        self.sample_type
    }

    pub fn array_size(&self) -> u32 {
        self.array_size
    }

    pub fn is_array(&self) -> bool {
        self.array_size > 1
    }

    pub fn binding_type(&self) -> BindingType {
        match self.dimension {
            TextureDimension::D1 => BindingType::Texture1d,
            TextureDimension::D2 => BindingType::Texture2d,
            TextureDimension::D3 => BindingType::Texture3d,
            TextureDimension::Cube => BindingType::TextureCube,
        }
    }
}

#[derive(Debug, Clone)]
pub struct StorageLayout {
    name: String,
    dimension: StorageDimension,
    format: GpuType,
    access: StorageAccessType,
    stages: ShaderStages,
    size_x: Option<u32>,
    size_y: Option<u32>,
    size_z: Option<u32>,
    hash: u64,
    binding_index: Option<u32>,
}

#[bon]
impl StorageLayout {
    /// Declared extents are informational, only the outermost one may be left open. A 2d storage
    /// texture needs `size_x`, a 3d one `size_x` and `size_y`, and no layout may declare an extent
    /// beyond its dimension.
    #[builder]
    pub fn new(
        #[builder(into)] name: String,
        dimension: StorageDimension,
        format: GpuType,
        #[builder(default = StorageAccessType::ReadWrite)] access: StorageAccessType,
        #[builder(default = ShaderStages::COMPUTE)] stages: ShaderStages,
        size_x: Option<u32>,
        size_y: Option<u32>,
        size_z: Option<u32>,
    ) -> Result<Self, LayoutError> {
        let valid_extent = match dimension {
            StorageDimension::D1 => size_y.is_none() && size_z.is_none(),
            StorageDimension::D2 => size_x.is_some() && size_z.is_none(),
            StorageDimension::D3 => size_x.is_some() && size_y.is_some(),
        };
        ensure!(
            valid_extent,
            InvalidStorageExtentErr {
                name: &name,
                dimension,
                size: [size_x, size_y, size_z],
            }
        );

        let binding_type = match dimension {
            StorageDimension::D1 => BindingType::Storage1d,
            StorageDimension::D2 => BindingType::Storage2d,
            StorageDimension::D3 => BindingType::Storage3d,
        };

        let mut hash = LongHash::new();
        hash.push(&name)
            .push(&access)
            .push(&format)
            .push(&binding_type)
            .push(&stages);

        Ok(StorageLayout {
            hash: hash.hash(),
            name,
            dimension,
            format,
            access,
            stages,
            size_x,
            size_y,
            size_z,
            binding_index: None,
        })
    }
}

impl StorageLayout {
    pub fn dimension(&self) -> StorageDimension {
        self.dimension
    }

    pub fn format(&self) -> GpuType {
        self.format
    }

    pub fn access(&self) -> StorageAccessType {
        self.access
    }

    pub fn size(&self) -> [Option<u32>; 3] {
        [self.size_x, self.size_y, self.size_z]
    }

    pub fn binding_type(&self) -> BindingType {
        match self.dimension {
            StorageDimension::D1 => BindingType::Storage1d,
            StorageDimension::D2 => BindingType::Storage2d,
            StorageDimension::D3 => BindingType::Storage3d,
        }
    }
}

/// Accessors every concrete layout shares.
macro_rules! common_layout_accessors {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $ty {
                pub fn name(&self) -> &str {
                    &self.name
                }

                pub fn stages(&self) -> ShaderStages {
                    self.stages
                }

                pub fn content_hash(&self) -> u64 {
                    self.hash
                }

                /// Position inside the parent bind group. `None` until the binding was added to one.
                pub fn binding_index(&self) -> Option<u32> {
                    self.binding_index
                }

                /// Bindings cloned out of another group carry its index, the new group overwrites it.
                fn assign_binding_index(&mut self, index: u32) {
                    self.binding_index = Some(index);
                }
            }
        )+
    };
}

common_layout_accessors!(UniformBufferLayout, TextureLayout, StorageLayout);

#[derive(Debug, Clone)]
pub enum BindingLayout {
    UniformBuffer(UniformBufferLayout),
    Texture(TextureLayout),
    Storage(StorageLayout),
}

impl BindingLayout {
    pub fn name(&self) -> &str {
        match self {
            BindingLayout::UniformBuffer(l) => l.name(),
            BindingLayout::Texture(l) => l.name(),
            BindingLayout::Storage(l) => l.name(),
        }
    }

    pub fn stages(&self) -> ShaderStages {
        match self {
            BindingLayout::UniformBuffer(l) => l.stages(),
            BindingLayout::Texture(l) => l.stages(),
            BindingLayout::Storage(l) => l.stages(),
        }
    }

    pub fn binding_type(&self) -> BindingType {
        match self {
            BindingLayout::UniformBuffer(_) => BindingType::UniformBuffer,
            BindingLayout::Texture(l) => l.binding_type(),
            BindingLayout::Storage(l) => l.binding_type(),
        }
    }

    pub fn content_hash(&self) -> u64 {
        match self {
            BindingLayout::UniformBuffer(l) => l.content_hash(),
            BindingLayout::Texture(l) => l.content_hash(),
            BindingLayout::Storage(l) => l.content_hash(),
        }
    }

    pub fn binding_index(&self) -> Option<u32> {
        match self {
            BindingLayout::UniformBuffer(l) => l.binding_index(),
            BindingLayout::Texture(l) => l.binding_index(),
            BindingLayout::Storage(l) => l.binding_index(),
        }
    }

    pub(crate) fn assign_binding_index(&mut self, index: u32) {
        match self {
            BindingLayout::UniformBuffer(l) => l.assign_binding_index(index),
            BindingLayout::Texture(l) => l.assign_binding_index(index),
            BindingLayout::Storage(l) => l.assign_binding_index(index),
        }
    }
}

impl From<UniformBufferLayout> for BindingLayout {
    fn from(value: UniformBufferLayout) -> Self {
        BindingLayout::UniformBuffer(value)
    }
}

impl From<TextureLayout> for BindingLayout {
    fn from(value: TextureLayout) -> Self {
        BindingLayout::Texture(value)
    }
}

impl From<StorageLayout> for BindingLayout {
    fn from(value: StorageLayout) -> Self {
        BindingLayout::Storage(value)
    }
}

macro_rules! eq_by_content_hash {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl PartialEq for $ty {
                fn eq(&self, other: &Self) -> bool {
                    self.content_hash() == other.content_hash()
                }
            }

            impl Eq for $ty {}

            impl Hash for $ty {
                fn hash<H: Hasher>(&self, state: &mut H) {
                    state.write_u64(<$ty>::content_hash(self));
                }
            }
        )+
    };
}

eq_by_content_hash!(UniformBufferLayout, TextureLayout, StorageLayout, BindingLayout);

#[cfg(test)]
mod tests {
    use super::*;

    fn light_ubo() -> UniformBufferLayout {
        UniformBufferLayout::new(
            "uLights",
            vec![
                UniformDescriptor::new("uLightCount", GpuType::Int1),
                UniformDescriptor::new("uLightPositions", GpuType::Float4).array(4),
            ],
            ShaderStages::FRAGMENT,
        )
    }

    #[test]
    fn identical_declarations_hash_equal() {
        assert_eq!(light_ubo().content_hash(), light_ubo().content_hash());
        assert_eq!(light_ubo(), light_ubo());

        let a = TextureLayout::tex_2d("uAlbedo", ShaderStages::FRAGMENT);
        let b = TextureLayout::tex_2d("uAlbedo", ShaderStages::FRAGMENT);
        assert_eq!(a, b);
    }

    #[test]
    fn builder_order_does_not_change_hash() {
        let a = TextureLayout::tex_2d("uShadow", ShaderStages::FRAGMENT)
            .with_array_size(4)
            .with_sample_type(TextureSampleType::Depth);
        let b = TextureLayout::tex_2d("uShadow", ShaderStages::FRAGMENT)
            .with_sample_type(TextureSampleType::Depth)
            .with_array_size(4);
        assert_eq!(a.content_hash(), b.content_hash());

        let s1 = StorageLayout::builder()
            .name("uField")
            .format(GpuType::Float1)
            .dimension(StorageDimension::D2)
            .size_x(128)
            .build()
            .unwrap();
        let s2 = StorageLayout::builder()
            .dimension(StorageDimension::D2)
            .name("uField")
            .format(GpuType::Float1)
            .size_x(128)
            .build()
            .unwrap();
        assert_eq!(s1.content_hash(), s2.content_hash());
    }

    #[test]
    fn content_changes_hash() {
        let base = TextureLayout::tex_2d("uAlbedo", ShaderStages::FRAGMENT);
        let renamed = TextureLayout::tex_2d("uNormal", ShaderStages::FRAGMENT);
        let other_dim = TextureLayout::tex_3d("uAlbedo", ShaderStages::FRAGMENT);
        let other_stage = TextureLayout::tex_2d("uAlbedo", ShaderStages::VERTEX_FRAGMENT);
        let depth = base.clone().with_sample_type(TextureSampleType::Depth);

        for other in [renamed, other_dim, other_stage, depth] {
            assert_ne!(base.content_hash(), other.content_hash(), "{other:?}");
        }

        let shorter = UniformBufferLayout::new(
            "uLights",
            vec![
                UniformDescriptor::new("uLightCount", GpuType::Int1),
                UniformDescriptor::new("uLightPositions", GpuType::Float4).array(2),
            ],
            ShaderStages::FRAGMENT,
        );
        assert_ne!(light_ubo().content_hash(), shorter.content_hash());
    }

    #[test]
    fn storage_hash_covers_access_and_format() {
        let rw = StorageLayout::builder()
            .name("uField")
            .dimension(StorageDimension::D1)
            .format(GpuType::Float4)
            .build()
            .unwrap();
        let ro = StorageLayout::builder()
            .name("uField")
            .dimension(StorageDimension::D1)
            .format(GpuType::Float4)
            .access(StorageAccessType::ReadOnly)
            .build()
            .unwrap();
        let int = StorageLayout::builder()
            .name("uField")
            .dimension(StorageDimension::D1)
            .format(GpuType::Int4)
            .build()
            .unwrap();

        assert_ne!(rw.content_hash(), ro.content_hash());
        assert_ne!(rw.content_hash(), int.content_hash());
        assert_eq!(rw.access(), StorageAccessType::ReadWrite);
        assert_eq!(rw.stages(), ShaderStages::COMPUTE);
    }

    #[test]
    fn storage_extent_matches_dimension() {
        let storage = |dimension, x: Option<u32>, y: Option<u32>, z: Option<u32>| {
            StorageLayout::builder()
                .name("uField")
                .dimension(dimension)
                .format(GpuType::Float1)
                .maybe_size_x(x)
                .maybe_size_y(y)
                .maybe_size_z(z)
                .build()
        };

        assert!(storage(StorageDimension::D1, None, None, None).is_ok());
        assert!(storage(StorageDimension::D1, Some(64), None, None).is_ok());
        assert!(storage(StorageDimension::D2, Some(64), None, None).is_ok());
        assert!(storage(StorageDimension::D3, Some(8), Some(8), None).is_ok());

        let sized = storage(StorageDimension::D3, Some(8), Some(8), Some(4)).unwrap();
        assert_eq!(sized.size(), [Some(8), Some(8), Some(4)]);

        for (dimension, x, y, z) in [
            (StorageDimension::D1, None, Some(4), Some(9)),
            (StorageDimension::D1, Some(4), Some(4), None),
            (StorageDimension::D2, None, Some(4), None),
            (StorageDimension::D2, Some(4), Some(4), Some(4)),
            (StorageDimension::D3, Some(4), None, Some(4)),
        ] {
            assert!(
                matches!(
                    storage(dimension, x, y, z),
                    Err(LayoutError::InvalidStorageExtent { .. })
                ),
                "{dimension:?} {x:?} {y:?} {z:?}"
            );
        }
    }

    #[test]
    fn binding_index_is_not_hashed() {
        let mut indexed = BindingLayout::from(light_ubo());
        let before = indexed.content_hash();
        indexed.assign_binding_index(3);

        assert_eq!(indexed.binding_index(), Some(3));
        assert_eq!(indexed.content_hash(), before);
        assert_eq!(indexed, BindingLayout::from(light_ubo()));

        let mut moved = indexed.clone();
        moved.assign_binding_index(0);
        assert_eq!(moved.binding_index(), Some(0));
        assert_eq!(moved, indexed);
    }

    #[test]
    fn ubo_lookup() {
        let ubo = light_ubo();
        assert!(ubo.has_uniform("uLightCount"));
        assert!(!ubo.has_uniform("uLightColors"));
        assert_eq!(ubo.uniforms()[1].array_size, Some(4));
        assert_eq!(BindingLayout::from(ubo).binding_type(), BindingType::UniformBuffer);
    }
}
