use crate::engine::pipeline::bind_group_layout::{
    BindGroupLayout, BindGroupLayouts, BindGroupScope, LayoutError, UnsupportedStorageFormatErr,
    ensure_texture_supported,
};
use crate::engine::pipeline::binding_layout::{
    BindingLayout, GpuType, ShaderStages, StorageAccessType, StorageDimension, TextureDimension,
    TextureLayout, TextureSampleType,
};
use snafu::OptionExt;
use std::num::{NonZeroU32, NonZeroU64};

impl From<ShaderStages> for wgpu::ShaderStages {
    fn from(stages: ShaderStages) -> Self {
        let mut out = wgpu::ShaderStages::NONE;
        if stages.contains(ShaderStages::VERTEX) {
            out |= wgpu::ShaderStages::VERTEX;
        }
        if stages.contains(ShaderStages::FRAGMENT) {
            out |= wgpu::ShaderStages::FRAGMENT;
        }
        if stages.contains(ShaderStages::COMPUTE) {
            out |= wgpu::ShaderStages::COMPUTE;
        }
        out
    }
}

impl From<StorageAccessType> for wgpu::StorageTextureAccess {
    fn from(access: StorageAccessType) -> Self {
        match access {
            StorageAccessType::ReadOnly => wgpu::StorageTextureAccess::ReadOnly,
            StorageAccessType::WriteOnly => wgpu::StorageTextureAccess::WriteOnly,
            StorageAccessType::ReadWrite => wgpu::StorageTextureAccess::ReadWrite,
        }
    }
}

impl From<TextureDimension> for wgpu::TextureViewDimension {
    fn from(dimension: TextureDimension) -> Self {
        match dimension {
            TextureDimension::D1 => wgpu::TextureViewDimension::D1,
            TextureDimension::D2 => wgpu::TextureViewDimension::D2,
            TextureDimension::D3 => wgpu::TextureViewDimension::D3,
            TextureDimension::Cube => wgpu::TextureViewDimension::Cube,
        }
    }
}

impl From<StorageDimension> for wgpu::TextureViewDimension {
    fn from(dimension: StorageDimension) -> Self {
        match dimension {
            StorageDimension::D1 => wgpu::TextureViewDimension::D1,
            StorageDimension::D2 => wgpu::TextureViewDimension::D2,
            StorageDimension::D3 => wgpu::TextureViewDimension::D3,
        }
    }
}

/// Texel format of a storage texture holding `format` elements.
pub fn storage_texture_format(format: GpuType) -> Option<wgpu::TextureFormat> {
    match format {
        GpuType::Float1 => Some(wgpu::TextureFormat::R32Float),
        GpuType::Float2 => Some(wgpu::TextureFormat::Rg32Float),
        GpuType::Float4 => Some(wgpu::TextureFormat::Rgba32Float),
        GpuType::Int1 => Some(wgpu::TextureFormat::R32Sint),
        GpuType::Int2 => Some(wgpu::TextureFormat::Rg32Sint),
        GpuType::Int4 => Some(wgpu::TextureFormat::Rgba32Sint),
        _ => None,
    }
}

fn texture_entries(
    texture: &TextureLayout,
    binding: u32,
    sampler_binding: u32,
) -> Result<[wgpu::BindGroupLayoutEntry; 2], LayoutError> {
    ensure_texture_supported(texture)?;

    let (sample_type, sampler_type) = match texture.sample_type() {
        TextureSampleType::Float => (
            wgpu::TextureSampleType::Float { filterable: true },
            wgpu::SamplerBindingType::Filtering,
        ),
        TextureSampleType::UnfilterableFloat => (
            wgpu::TextureSampleType::Float { filterable: false },
            wgpu::SamplerBindingType::NonFiltering,
        ),
        TextureSampleType::Depth => (
            wgpu::TextureSampleType::Depth,
            wgpu::SamplerBindingType::Comparison,
        ),
    };

    let visibility = texture.stages().into();
    let count = if texture.is_array() {
        NonZeroU32::new(texture.array_size())
    } else {
        None
    };

    Ok([
        wgpu::BindGroupLayoutEntry {
            binding,
            visibility,
            ty: wgpu::BindingType::Texture {
                sample_type,
                view_dimension: texture.dimension().into(),
                multisampled: false,
            },
            count,
        },
        wgpu::BindGroupLayoutEntry {
            binding: sampler_binding,
            visibility,
            ty: wgpu::BindingType::Sampler(sampler_type),
            count: None,
        },
    ])
}

impl BindGroupLayout {
    /// Entries for a `wgpu::BindGroupLayoutDescriptor`.
    ///
    /// Every binding keeps its index. Each texture additionally gets a sampler entry at
    /// [`sampler_binding`](Self::sampler_binding).
    pub fn wgpu_entries(&self) -> Result<Vec<wgpu::BindGroupLayoutEntry>, LayoutError> {
        let mut entries = Vec::with_capacity(self.bindings().len());
        let mut samplers = Vec::new();

        for (index, binding) in self.bindings().iter().enumerate() {
            let index = index as u32;
            match binding {
                BindingLayout::UniformBuffer(ubo) => entries.push(wgpu::BindGroupLayoutEntry {
                    binding: index,
                    visibility: ubo.stages().into(),
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: NonZeroU64::new(ubo.layout().size()),
                    },
                    count: None,
                }),
                BindingLayout::Texture(texture) => {
                    let sampler_binding = self.sampler_binding(samplers.len());
                    let [texture, sampler] = texture_entries(texture, index, sampler_binding)?;
                    entries.push(texture);
                    samplers.push(sampler);
                }
                BindingLayout::Storage(storage) => {
                    let format = storage_texture_format(storage.format()).context(
                        UnsupportedStorageFormatErr {
                            name: storage.name(),
                            format: storage.format(),
                        },
                    )?;

                    entries.push(wgpu::BindGroupLayoutEntry {
                        binding: index,
                        visibility: storage.stages().into(),
                        ty: wgpu::BindingType::StorageTexture {
                            access: storage.access().into(),
                            format,
                            view_dimension: storage.dimension().into(),
                        },
                        count: None,
                    });
                }
            }
        }

        entries.extend(samplers);
        Ok(entries)
    }
}

impl BindGroupLayouts {
    /// [`BindGroupLayout::wgpu_entries`] of view, pipeline and mesh layout.
    pub fn wgpu_entries(&self) -> Result<[Vec<wgpu::BindGroupLayoutEntry>; 3], LayoutError> {
        Ok([
            self.get(BindGroupScope::View).wgpu_entries()?,
            self.get(BindGroupScope::Pipeline).wgpu_entries()?,
            self.get(BindGroupScope::Mesh).wgpu_entries()?,
        ])
    }
}
