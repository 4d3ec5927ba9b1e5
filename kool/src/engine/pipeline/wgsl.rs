//! WGSL resource declarations matching a [`BindGroupLayout`].
//!
//! The emitted `@binding` indices are the layout's binding indices, samplers follow at
//! [`BindGroupLayout::sampler_binding`]. Shader code generated on top of these declarations
//! therefore lines up with the backend lowering without any further bookkeeping.

use crate::engine::pipeline::bind_group_layout::{
    BindGroupLayout, BindGroupLayouts, LayoutError, ensure_storage_supported,
    ensure_texture_supported,
};
use crate::engine::pipeline::binding_layout::{
    BindingLayout, GpuType, StorageAccessType, StorageDimension, StorageLayout, TextureDimension,
    TextureLayout, TextureSampleType, UniformBufferLayout, UniformDescriptor,
};
use itertools::Itertools;

fn wgsl_type(gpu_type: GpuType) -> &'static str {
    match gpu_type {
        GpuType::Float1 => "f32",
        GpuType::Float2 => "vec2f",
        GpuType::Float3 => "vec3f",
        GpuType::Float4 => "vec4f",
        GpuType::Int1 => "i32",
        GpuType::Int2 => "vec2i",
        GpuType::Int3 => "vec3i",
        GpuType::Int4 => "vec4i",
        GpuType::Mat3 => "mat3x3f",
        GpuType::Mat4 => "mat4x4f",
    }
}

/// Uniform arrays need a 16 byte element stride, so narrow element types are widened to a vec4.
fn wgsl_array_element(gpu_type: GpuType) -> &'static str {
    match gpu_type {
        GpuType::Float1 | GpuType::Float2 => "vec4f",
        GpuType::Int1 | GpuType::Int2 => "vec4i",
        other => wgsl_type(other),
    }
}

fn member(uniform: &UniformDescriptor) -> String {
    match uniform.array_size {
        Some(n) => format!(
            "    {}: array<{}, {n}>,",
            uniform.name,
            wgsl_array_element(uniform.gpu_type)
        ),
        None => format!("    {}: {},", uniform.name, wgsl_type(uniform.gpu_type)),
    }
}

fn uniform_buffer(group: u32, binding: u32, ubo: &UniformBufferLayout) -> String {
    let struct_name = format!("{}Struct", ubo.name());
    let members = if ubo.uniforms().is_empty() {
        // empty structs are not valid WGSL
        "    _unused: vec4f,".to_string()
    } else {
        ubo.uniforms().iter().map(member).join("\n")
    };

    format!(
        "struct {struct_name} {{\n{members}\n}}\n\
         @group({group}) @binding({binding}) var<uniform> {}: {struct_name};",
        ubo.name()
    )
}

fn texture(
    group: u32,
    binding: u32,
    sampler_binding: u32,
    texture: &TextureLayout,
) -> Result<String, LayoutError> {
    ensure_texture_supported(texture)?;

    let depth = texture.sample_type() == TextureSampleType::Depth;
    let ty = match (texture.dimension(), depth) {
        (TextureDimension::D1, _) => "texture_1d<f32>",
        (TextureDimension::D2, false) => "texture_2d<f32>",
        (TextureDimension::D3, _) => "texture_3d<f32>",
        (TextureDimension::Cube, false) => "texture_cube<f32>",
        (TextureDimension::D2, true) => "texture_depth_2d",
        (TextureDimension::Cube, true) => "texture_depth_cube",
    };
    let ty = if texture.is_array() {
        format!("binding_array<{ty}, {}>", texture.array_size())
    } else {
        ty.to_string()
    };
    let sampler = if depth { "sampler_comparison" } else { "sampler" };

    Ok(format!(
        "@group({group}) @binding({binding}) var {name}: {ty};\n\
         @group({group}) @binding({sampler_binding}) var {name}_sampler: {sampler};",
        name = texture.name()
    ))
}

fn storage(group: u32, binding: u32, storage: &StorageLayout) -> Result<String, LayoutError> {
    ensure_storage_supported(storage)?;

    let dim = match storage.dimension() {
        StorageDimension::D1 => "1d",
        StorageDimension::D2 => "2d",
        StorageDimension::D3 => "3d",
    };
    let format = match storage.format() {
        GpuType::Float1 => "r32float",
        GpuType::Float2 => "rg32float",
        GpuType::Int1 => "r32sint",
        GpuType::Int2 => "rg32sint",
        GpuType::Int4 => "rgba32sint",
        _ => "rgba32float",
    };
    let access = match storage.access() {
        StorageAccessType::ReadOnly => "read",
        StorageAccessType::WriteOnly => "write",
        StorageAccessType::ReadWrite => "read_write",
    };

    Ok(format!(
        "@group({group}) @binding({binding}) var {}: texture_storage_{dim}<{format}, {access}>;",
        storage.name()
    ))
}

impl BindGroupLayout {
    /// Declarations of every binding in this group, in binding order.
    pub fn wgsl_declarations(&self) -> Result<String, LayoutError> {
        let group = self.group();
        let mut textures = 0;
        let mut decls = Vec::with_capacity(self.bindings().len());

        for (index, binding) in self.bindings().iter().enumerate() {
            let index = index as u32;
            let decl = match binding {
                BindingLayout::UniformBuffer(ubo) => uniform_buffer(group, index, ubo),
                BindingLayout::Texture(tex) => {
                    let sampler = self.sampler_binding(textures);
                    textures += 1;
                    texture(group, index, sampler, tex)?
                }
                BindingLayout::Storage(s) => storage(group, index, s)?,
            };
            decls.push(decl);
        }

        Ok(decls.join("\n"))
    }
}

impl BindGroupLayouts {
    pub fn wgsl_declarations(&self) -> Result<String, LayoutError> {
        let decls = self
            .iter()
            .map(|layout| layout.wgsl_declarations())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(decls.into_iter().filter(|d| !d.is_empty()).join("\n\n"))
    }
}
