#![allow(dead_code)]

pub mod wgsl;

use kool::pipeline::{
    BindGroupLayout, BindGroupLayouts, BindGroupScope, GpuType, Pipeline, ShaderStages,
    StorageDimension, StorageLayout, TextureLayout, UniformBufferLayout, UniformDescriptor,
};

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A pbr like pipeline: camera data in the view group, material data and textures in the
/// pipeline group, the model matrix in the mesh group.
pub fn pbr_pipeline(shadow_maps: u32) -> Pipeline {
    let view = BindGroupLayout::new(
        0,
        BindGroupScope::View,
        vec![
            UniformBufferLayout::new(
                "uCamera",
                vec![
                    UniformDescriptor::new("uViewProj", GpuType::Mat4),
                    UniformDescriptor::new("uCamPosition", GpuType::Float3),
                ],
                ShaderStages::VERTEX_FRAGMENT,
            )
            .into(),
        ],
    );

    let mut material = BindGroupLayout::builder(1, BindGroupScope::Pipeline);
    material
        .add_texture(TextureLayout::tex_2d("uAlbedo", ShaderStages::FRAGMENT))
        .add_texture(
            TextureLayout::tex_2d("uShadowMaps", ShaderStages::FRAGMENT)
                .with_array_size(shadow_maps),
        )
        .add_ubo(UniformBufferLayout::new(
            "uMaterial",
            vec![
                UniformDescriptor::new("uRoughness", GpuType::Float1),
                UniformDescriptor::new("uTint", GpuType::Float4),
                UniformDescriptor::new("uLightCount", GpuType::Int1),
                UniformDescriptor::new("uCascadeSplits", GpuType::Float1).array(4),
            ],
            ShaderStages::FRAGMENT,
        ));

    let mesh = BindGroupLayout::new(
        2,
        BindGroupScope::Mesh,
        vec![
            UniformBufferLayout::new(
                "uModel",
                vec![UniformDescriptor::new("uModelMat", GpuType::Mat4)],
                ShaderStages::VERTEX,
            )
            .into(),
        ],
    );

    let layouts = BindGroupLayouts::new(view, material.create(), mesh)
        .expect("layouts are declared in their own slots");
    Pipeline::new("pbr", layouts)
}

/// A compute pipeline: skinning matrices and two storage textures in the pipeline group.
pub fn compute_pipeline(bones: u32) -> Pipeline {
    let mut simulation = BindGroupLayout::builder(1, BindGroupScope::Pipeline);
    simulation
        .add_ubo(UniformBufferLayout::new(
            "uSkin",
            vec![UniformDescriptor::new("uBones", GpuType::Mat4).array(bones)],
            ShaderStages::COMPUTE,
        ))
        .add_storage(
            StorageLayout::builder()
                .name("uField")
                .dimension(StorageDimension::D2)
                .format(GpuType::Float1)
                .size_x(256)
                .size_y(256)
                .build()
                .expect("2d extent is complete"),
        )
        .add_storage(
            StorageLayout::builder()
                .name("uVolume")
                .dimension(StorageDimension::D3)
                .format(GpuType::Float4)
                .size_x(32)
                .size_y(32)
                .build()
                .expect("3d extent is complete"),
        );

    let layouts = BindGroupLayouts::new(
        BindGroupLayout::new(0, BindGroupScope::View, vec![]),
        simulation.create(),
        BindGroupLayout::new(2, BindGroupScope::Mesh, vec![]),
    )
    .expect("layouts are declared in their own slots");
    Pipeline::new("simulation", layouts)
}
