use crate::engine::pipeline::bind_group_layout::BindGroupLayout;
use crate::engine::pipeline::binding_layout::{
    BindingLayout, GpuType, StorageAccessType, StorageDimension, StorageLayout, TextureDimension,
    TextureLayout, TextureSampleType, UniformBufferLayout,
};
use crate::engine::pipeline::std140::Std140BufferLayout;
use crate::engine::pipeline::texture::{
    Dim1d, Dim2d, Dim3d, DimCube, StorageDim, StorageTexture, Texture, TextureDim,
};
use crate::engine::pipeline::uniform::Uniform;
use smallvec::SmallVec;
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

/// Live contents of a uniform buffer.
#[derive(Debug, Clone)]
pub struct UniformBufferData {
    name: String,
    uniforms: Vec<Uniform>,
    layout: Std140BufferLayout,
}

impl UniformBufferData {
    pub fn new(layout: &UniformBufferLayout) -> Self {
        UniformBufferData {
            name: layout.name().to_string(),
            uniforms: layout.uniforms().iter().map(Uniform::new).collect(),
            layout: layout.layout().clone(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn uniforms(&self) -> &[Uniform] {
        &self.uniforms
    }

    pub fn uniform(&self, name: &str) -> Option<&Uniform> {
        self.uniforms.iter().find(|u| u.name() == name)
    }

    pub fn layout(&self) -> &Std140BufferLayout {
        &self.layout
    }

    /// Packs the current values into `out`, which must hold at least [`Std140BufferLayout::size`]
    /// bytes. Padding bytes are left untouched.
    pub fn write_std140(&self, out: &mut [u8]) {
        for (uniform, entry) in self.uniforms.iter().zip(self.layout.entries()) {
            uniform
                .value()
                .write_std140(out, entry.offset as usize, entry.stride as usize);
        }
    }

    pub fn to_std140_bytes(&self) -> Vec<u8> {
        let mut out = vec![0; self.layout.size() as usize];
        self.write_std140(&mut out);
        out
    }
}

/// Live slot of a sampled texture binding. Holds one texture per array element.
#[derive(Debug)]
pub struct TextureSampler<D: TextureDim> {
    name: String,
    sample_type: TextureSampleType,
    textures: SmallVec<[Option<Arc<Texture<D>>>; 1]>,
}

pub type SamplerRef<D> = Rc<RefCell<TextureSampler<D>>>;

impl<D: TextureDim> TextureSampler<D> {
    pub fn new(layout: &TextureLayout) -> Self {
        debug_assert_eq!(layout.dimension(), D::DIMENSION);
        TextureSampler {
            name: layout.name().to_string(),
            sample_type: layout.sample_type(),
            textures: SmallVec::from_elem(None, layout.array_size() as usize),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sample_type(&self) -> TextureSampleType {
        self.sample_type
    }

    pub fn array_size(&self) -> usize {
        self.textures.len()
    }

    /// The first (for non-array bindings the only) texture.
    pub fn texture(&self) -> Option<&Arc<Texture<D>>> {
        self.textures.first().and_then(Option::as_ref)
    }

    pub fn set_texture(&mut self, texture: Option<Arc<Texture<D>>>) {
        if let Some(slot) = self.textures.first_mut() {
            *slot = texture;
        }
    }

    pub fn textures(&self) -> &[Option<Arc<Texture<D>>>] {
        &self.textures
    }

    pub fn textures_mut(&mut self) -> &mut [Option<Arc<Texture<D>>>] {
        &mut self.textures
    }
}

/// Live slot of a storage texture binding.
#[derive(Debug)]
pub struct StorageBinding<D: StorageDim> {
    name: String,
    format: GpuType,
    access: StorageAccessType,
    texture: Option<Arc<StorageTexture<D>>>,
}

pub type StorageRef<D> = Rc<RefCell<StorageBinding<D>>>;

impl<D: StorageDim> StorageBinding<D> {
    pub fn new(layout: &StorageLayout) -> Self {
        debug_assert_eq!(layout.dimension(), D::DIMENSION);
        StorageBinding {
            name: layout.name().to_string(),
            format: layout.format(),
            access: layout.access(),
            texture: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn format(&self) -> GpuType {
        self.format
    }

    pub fn access(&self) -> StorageAccessType {
        self.access
    }

    pub fn texture(&self) -> Option<&Arc<StorageTexture<D>>> {
        self.texture.as_ref()
    }

    pub fn set_texture(&mut self, texture: Option<Arc<StorageTexture<D>>>) {
        self.texture = texture;
    }
}

/// Live counterpart of a [`BindingLayout`].
#[derive(Debug)]
pub enum BindingData {
    UniformBuffer(UniformBufferData),
    Texture1d(SamplerRef<Dim1d>),
    Texture2d(SamplerRef<Dim2d>),
    Texture3d(SamplerRef<Dim3d>),
    TextureCube(SamplerRef<DimCube>),
    Storage1d(StorageRef<Dim1d>),
    Storage2d(StorageRef<Dim2d>),
    Storage3d(StorageRef<Dim3d>),
}

fn sampler<D: TextureDim>(layout: &TextureLayout) -> SamplerRef<D> {
    Rc::new(RefCell::new(TextureSampler::new(layout)))
}

fn storage<D: StorageDim>(layout: &StorageLayout) -> StorageRef<D> {
    Rc::new(RefCell::new(StorageBinding::new(layout)))
}

impl BindingData {
    pub fn new(layout: &BindingLayout) -> Self {
        match layout {
            BindingLayout::UniformBuffer(ubo) => {
                BindingData::UniformBuffer(UniformBufferData::new(ubo))
            }
            BindingLayout::Texture(tex) => match tex.dimension() {
                TextureDimension::D1 => BindingData::Texture1d(sampler(tex)),
                TextureDimension::D2 => BindingData::Texture2d(sampler(tex)),
                TextureDimension::D3 => BindingData::Texture3d(sampler(tex)),
                TextureDimension::Cube => BindingData::TextureCube(sampler(tex)),
            },
            BindingLayout::Storage(s) => match s.dimension() {
                StorageDimension::D1 => BindingData::Storage1d(storage(s)),
                StorageDimension::D2 => BindingData::Storage2d(storage(s)),
                StorageDimension::D3 => BindingData::Storage3d(storage(s)),
            },
        }
    }

    pub fn name(&self) -> String {
        match self {
            BindingData::UniformBuffer(ubo) => ubo.name().to_string(),
            BindingData::Texture1d(s) => s.borrow().name().to_string(),
            BindingData::Texture2d(s) => s.borrow().name().to_string(),
            BindingData::Texture3d(s) => s.borrow().name().to_string(),
            BindingData::TextureCube(s) => s.borrow().name().to_string(),
            BindingData::Storage1d(s) => s.borrow().name().to_string(),
            BindingData::Storage2d(s) => s.borrow().name().to_string(),
            BindingData::Storage3d(s) => s.borrow().name().to_string(),
        }
    }

    pub fn as_uniform_buffer(&self) -> Option<&UniformBufferData> {
        match self {
            BindingData::UniformBuffer(ubo) => Some(ubo),
            _ => None,
        }
    }
}

/// Runtime container for the live bindings of one bind group, in layout order.
#[derive(Debug)]
pub struct BindGroupData {
    layout: Arc<BindGroupLayout>,
    bindings: Vec<BindingData>,
}

impl BindGroupData {
    pub fn new(layout: Arc<BindGroupLayout>) -> Self {
        let bindings = layout.bindings().iter().map(BindingData::new).collect();
        BindGroupData { layout, bindings }
    }

    pub fn layout(&self) -> &Arc<BindGroupLayout> {
        &self.layout
    }

    pub fn bindings(&self) -> &[BindingData] {
        &self.bindings
    }

    /// Looks up a uniform buffer member by its own name, across all buffers of the group.
    pub fn uniform(&self, name: &str) -> Option<&Uniform> {
        self.bindings
            .iter()
            .filter_map(BindingData::as_uniform_buffer)
            .find_map(|ubo| ubo.uniform(name))
    }

    pub fn uniform_buffer(&self, name: &str) -> Option<&UniformBufferData> {
        self.bindings
            .iter()
            .filter_map(BindingData::as_uniform_buffer)
            .find(|ubo| ubo.name() == name)
    }
}
