//! Binding layouts and the uniform connection model.
//!
//! Shader generation describes every resource a shader references as a [`BindingLayout`] and
//! groups them into the three scoped [`BindGroupLayouts`] a [`Pipeline`] is created from.
//! Shader authoring code on the other hand talks to a [`ShaderBase`], which hands out typed
//! uniform inputs by name long before any pipeline exists:
//!
//! ```rust
//! use kool::pipeline::*;
//!
//! let mut shader = ShaderBase::new("pbr");
//! let roughness = shader.uniform1f("uRoughness", 0.5_f32);
//! assert!(!roughness.is_connected());
//!
//! let mut material = BindGroupLayout::builder(1, BindGroupScope::Pipeline);
//! material.add_ubo(UniformBufferLayout::new(
//!     "uMaterial",
//!     vec![UniformDescriptor::new("uRoughness", GpuType::Float1)],
//!     ShaderStages::FRAGMENT,
//! ));
//!
//! let layouts = BindGroupLayouts::new(
//!     BindGroupLayout::new(0, BindGroupScope::View, vec![]),
//!     material.create(),
//!     BindGroupLayout::new(2, BindGroupScope::Mesh, vec![]),
//! )
//! .unwrap();
//!
//! let pipeline = Pipeline::new("pbr", layouts);
//! shader.pipeline_created(&pipeline).unwrap();
//!
//! assert!(roughness.is_connected());
//! assert_eq!(roughness.get(), 0.5);
//! ```

#[cfg(feature = "wgpu")]
pub mod backend;
mod bind_group_data;
mod bind_group_layout;
mod binding_layout;
mod layout_cache;
#[allow(clippy::module_inception)]
mod pipeline;
mod shader_base;
mod std140;
mod texture;
mod uniform;
mod uniform_input;
mod wgsl;

pub use bind_group_data::*;
pub use bind_group_layout::*;
pub use binding_layout::*;
pub use layout_cache::*;
pub use pipeline::*;
pub use shader_base::*;
pub use std140::*;
pub use texture::*;
pub use uniform::*;
pub use uniform_input::*;
