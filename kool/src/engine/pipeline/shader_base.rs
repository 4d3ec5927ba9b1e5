use crate::engine::pipeline::bind_group_data::{BindingData, SamplerRef, StorageRef};
use crate::engine::pipeline::pipeline::Pipeline;
use crate::engine::pipeline::texture::{
    Dim1d, Dim2d, Dim3d, DimCube, StorageDim, StorageTexture, Texture, TextureDim,
};
use crate::engine::pipeline::uniform::Uniform;
use crate::engine::pipeline::uniform_input::{
    ConnectUniformListener, UniformArrayInput, UniformInput, UniformInputStorage,
    UniformInputTexture, UniformInputTextureArray,
};
use crate::utils::Color;
use log::{debug, trace, warn};
use nalgebra::{Matrix3, Matrix4, UnitQuaternion, Vector2, Vector3, Vector4};
use snafu::Snafu;
use std::any::{Any, type_name};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::rc::Rc;
use std::sync::Arc;

#[derive(Debug, Snafu)]
#[snafu(context(suffix(Err)), visibility(pub(crate)))]
pub enum ShaderError {
    #[snafu(display(
        "Mismatching array size for `{name}`: requested {requested}, declared {declared}"
    ))]
    ArraySizeMismatch {
        name: String,
        requested: usize,
        declared: usize,
    },
}

/// Name based view on the live bindings of the pipeline a shader is connected to.
///
/// Members of uniform buffers are registered under their own name, not under the name of the
/// buffer, so `uniforms` is flat across all buffers and groups.
#[derive(Debug, Default)]
pub struct ShaderBindings {
    pub uniforms: HashMap<String, Uniform>,
    pub tex_samplers_1d: HashMap<String, SamplerRef<Dim1d>>,
    pub tex_samplers_2d: HashMap<String, SamplerRef<Dim2d>>,
    pub tex_samplers_3d: HashMap<String, SamplerRef<Dim3d>>,
    pub tex_samplers_cube: HashMap<String, SamplerRef<DimCube>>,
    pub storage_1d: HashMap<String, StorageRef<Dim1d>>,
    pub storage_2d: HashMap<String, StorageRef<Dim2d>>,
    pub storage_3d: HashMap<String, StorageRef<Dim3d>>,
}

impl ShaderBindings {
    pub fn clear(&mut self) {
        self.uniforms.clear();
        self.tex_samplers_1d.clear();
        self.tex_samplers_2d.clear();
        self.tex_samplers_3d.clear();
        self.tex_samplers_cube.clear();
        self.storage_1d.clear();
        self.storage_2d.clear();
        self.storage_3d.clear();
    }

    pub fn len(&self) -> usize {
        self.uniforms.len()
            + self.tex_samplers_1d.len()
            + self.tex_samplers_2d.len()
            + self.tex_samplers_3d.len()
            + self.tex_samplers_cube.len()
            + self.storage_1d.len()
            + self.storage_2d.len()
            + self.storage_3d.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn uniform(&self, name: &str) -> Option<&Uniform> {
        self.uniforms.get(name)
    }

    pub fn sampler<D: TextureDim>(&self, name: &str) -> Option<&SamplerRef<D>> {
        D::samplers(self).get(name)
    }

    pub fn storage<D: StorageDim>(&self, name: &str) -> Option<&StorageRef<D>> {
        D::storage(self).get(name)
    }

    fn register(&mut self, shader: &str, binding: &BindingData) {
        match binding {
            BindingData::UniformBuffer(ubo) => {
                for uniform in ubo.uniforms() {
                    let previous = self
                        .uniforms
                        .insert(uniform.name().to_string(), uniform.clone());
                    if previous.is_some() {
                        warn!(
                            "[{shader} Shader] Uniform `{}` is declared more than once, the last declaration wins",
                            uniform.name()
                        );
                    }
                }
            }
            BindingData::Texture1d(s) => insert_named(&mut self.tex_samplers_1d, s),
            BindingData::Texture2d(s) => insert_named(&mut self.tex_samplers_2d, s),
            BindingData::Texture3d(s) => insert_named(&mut self.tex_samplers_3d, s),
            BindingData::TextureCube(s) => insert_named(&mut self.tex_samplers_cube, s),
            BindingData::Storage1d(s) => insert_storage(&mut self.storage_1d, s),
            BindingData::Storage2d(s) => insert_storage(&mut self.storage_2d, s),
            BindingData::Storage3d(s) => insert_storage(&mut self.storage_3d, s),
        }
    }
}

fn insert_named<D: TextureDim>(map: &mut HashMap<String, SamplerRef<D>>, sampler: &SamplerRef<D>) {
    let name = sampler.borrow().name().to_string();
    map.insert(name, sampler.clone());
}

fn insert_storage<D: StorageDim>(map: &mut HashMap<String, StorageRef<D>>, storage: &StorageRef<D>) {
    let name = storage.borrow().name().to_string();
    map.insert(name, storage.clone());
}

#[derive(Debug)]
struct InputEntry {
    listener: Rc<dyn ConnectUniformListener>,
    any: Rc<dyn Any>,
}

/// Per shader state connecting user code to the bindings of a created pipeline.
///
/// Inputs are requested by name, at any time, and memoized: asking twice for the same name returns
/// the same [`Rc`]. Each call to [`pipeline_created`](Self::pipeline_created) rebuilds the name
/// maps and reconnects every input that was handed out so far.
#[derive(Debug)]
pub struct ShaderBase {
    name: String,
    bindings: ShaderBindings,
    inputs: Vec<InputEntry>,
    input_index: HashMap<String, usize>,
    connected_pipeline: Option<String>,
}

macro_rules! single_inputs {
    ($($(#[$meta:meta])* $fn_name:ident => $ty:ty = $default:expr;)+) => {
        $(
            $(#[$meta])*
            #[track_caller]
            pub fn $fn_name(
                &mut self,
                name: &str,
                default: impl Into<Option<$ty>>,
            ) -> Rc<UniformInput<$ty>> {
                let initial = default.into().unwrap_or_else(|| $default);
                self.input(name, |name| UniformInput::new(name, initial))
            }
        )+
    };
}

macro_rules! array_inputs {
    ($($fn_name:ident => $ty:ty;)+) => {
        $(
            #[track_caller]
            pub fn $fn_name(&mut self, name: &str, array_size: usize) -> Rc<UniformArrayInput<$ty>> {
                self.input(name, |name| UniformArrayInput::new(name, array_size))
            }
        )+
    };
}

macro_rules! texture_inputs {
    ($($fn_name:ident, $array_fn:ident => $dim:ty;)+) => {
        $(
            #[track_caller]
            pub fn $fn_name(
                &mut self,
                name: &str,
                default: impl Into<Option<Arc<Texture<$dim>>>>,
            ) -> Rc<UniformInputTexture<$dim>> {
                let initial = default.into();
                self.input(name, |name| UniformInputTexture::new(name, initial))
            }

            #[track_caller]
            pub fn $array_fn(
                &mut self,
                name: &str,
                array_size: usize,
            ) -> Rc<UniformInputTextureArray<$dim>> {
                self.input(name, |name| UniformInputTextureArray::new(name, array_size))
            }
        )+
    };
}

macro_rules! storage_inputs {
    ($($fn_name:ident => $dim:ty;)+) => {
        $(
            #[track_caller]
            pub fn $fn_name(
                &mut self,
                name: &str,
                default: impl Into<Option<Arc<StorageTexture<$dim>>>>,
            ) -> Rc<UniformInputStorage<$dim>> {
                let initial = default.into();
                self.input(name, |name| UniformInputStorage::new(name, initial))
            }
        )+
    };
}

impl ShaderBase {
    pub fn new(name: impl Into<String>) -> Self {
        ShaderBase {
            name: name.into(),
            bindings: ShaderBindings::default(),
            inputs: Vec::new(),
            input_index: HashMap::new(),
            connected_pipeline: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bindings(&self) -> &ShaderBindings {
        &self.bindings
    }

    /// `true` once a pipeline was created for this shader.
    pub fn is_live(&self) -> bool {
        self.connected_pipeline.is_some()
    }

    pub fn input_count(&self) -> usize {
        self.inputs.len()
    }

    /// Rebuilds the name maps from `pipeline` and connects every input requested so far.
    ///
    /// Aborts on the first configuration error, e.g. an array input whose size does not match the
    /// declaration. Every input is disconnected before the connect pass, so inputs that were not
    /// reached yet stay buffered instead of writing to a previous pipeline.
    pub fn pipeline_created(&mut self, pipeline: &Pipeline) -> Result<(), ShaderError> {
        if let Some(previous) = &self.connected_pipeline {
            warn!(
                "[{} Shader] Was connected to pipeline `{previous}`, rebinding all inputs to `{}`",
                self.name,
                pipeline.name()
            );
        }

        self.bindings.clear();
        for group in pipeline.bind_groups() {
            for binding in group.bindings() {
                self.bindings.register(&self.name, binding);
            }
        }
        trace!(
            "[{} Shader] Registered {} bindings of pipeline `{}`",
            self.name,
            self.bindings.len(),
            pipeline.name()
        );

        self.connected_pipeline = Some(pipeline.name().to_string());

        for entry in &self.inputs {
            entry.listener.disconnect();
        }
        for entry in &self.inputs {
            entry.listener.connect(&self.bindings)?;
        }

        debug!(
            "[{} Shader] Connected {}/{} inputs to pipeline `{}`",
            self.name,
            self.inputs.iter().filter(|e| e.listener.is_connected()).count(),
            self.inputs.len(),
            pipeline.name()
        );
        Ok(())
    }

    /// Returns the input registered under `name`, creating it with `create` if there is none.
    ///
    /// # Panics
    ///
    /// If `name` was already requested as a different kind of input, or if the shader is live and
    /// connecting the new input fails.
    #[track_caller]
    fn input<I>(&mut self, name: &str, create: impl FnOnce(&str) -> I) -> Rc<I>
    where
        I: ConnectUniformListener + 'static,
    {
        match self.input_index.entry(name.to_string()) {
            Entry::Occupied(slot) => {
                let entry = &self.inputs[*slot.get()];
                match entry.any.clone().downcast::<I>() {
                    Ok(input) => input,
                    Err(_) => panic!(
                        "[{} Shader] Input `{name}` was requested as {} but already exists as {}",
                        self.name,
                        type_name::<I>(),
                        entry.listener.kind()
                    ),
                }
            }
            Entry::Vacant(slot) => {
                let input = Rc::new(create(name));

                if self.connected_pipeline.is_some()
                    && let Err(e) = input.connect(&self.bindings)
                {
                    panic!("[{} Shader] {e}", self.name);
                }

                slot.insert(self.inputs.len());
                self.inputs.push(InputEntry {
                    listener: input.clone(),
                    any: input.clone(),
                });
                input
            }
        }
    }

    single_inputs! {
        uniform1f => f32 = 0.0;
        uniform2f => Vector2<f32> = Vector2::zeros();
        uniform3f => Vector3<f32> = Vector3::zeros();
        uniform4f => Vector4<f32> = Vector4::zeros();
        uniform1i => i32 = 0;
        uniform2i => Vector2<i32> = Vector2::zeros();
        uniform3i => Vector3<i32> = Vector3::zeros();
        uniform4i => Vector4<i32> = Vector4::zeros();
        uniform_mat3f => Matrix3<f32> = Matrix3::identity();
        uniform_mat4f => Matrix4<f32> = Matrix4::identity();
        /// Proxies a `vec4` uniform, defaults to opaque black.
        uniform_color => Color = Color::BLACK;
        /// Proxies a `vec4` uniform holding `(i, j, k, w)`, defaults to identity.
        uniform_quat => UnitQuaternion<f32> = UnitQuaternion::identity();
    }

    array_inputs! {
        uniform1fv => f32;
        uniform2fv => Vector2<f32>;
        uniform3fv => Vector3<f32>;
        uniform4fv => Vector4<f32>;
        uniform1iv => i32;
        uniform2iv => Vector2<i32>;
        uniform3iv => Vector3<i32>;
        uniform4iv => Vector4<i32>;
        uniform_mat3fv => Matrix3<f32>;
        uniform_mat4fv => Matrix4<f32>;
    }

    texture_inputs! {
        texture1d, texture1d_array => Dim1d;
        texture2d, texture2d_array => Dim2d;
        texture3d, texture3d_array => Dim3d;
        texture_cube, texture_cube_array => DimCube;
    }

    storage_inputs! {
        storage1d => Dim1d;
        storage2d => Dim2d;
        storage3d => Dim3d;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inputs_are_memoized() {
        let mut shader = ShaderBase::new("test");
        let a = shader.uniform1f("uRoughness", 0.5_f32);
        let b = shader.uniform1f("uRoughness", None);

        assert!(Rc::ptr_eq(&a, &b));
        // the default of the second request is ignored
        assert_eq!(b.get(), 0.5);
        assert_eq!(shader.input_count(), 1);
    }

    #[test]
    #[should_panic(expected = "already exists as")]
    fn kind_clash_panics() {
        let mut shader = ShaderBase::new("test");
        shader.uniform1f("uValue", None);
        shader.uniform1i("uValue", None);
    }

    #[test]
    fn defaults() {
        let mut shader = ShaderBase::new("test");
        assert_eq!(shader.uniform_mat4f("uModel", None).get(), Matrix4::identity());
        assert_eq!(shader.uniform_color("uTint", None).get(), Color::BLACK);
        assert_eq!(shader.uniform_quat("uRot", None).get(), UnitQuaternion::identity());
        assert_eq!(shader.uniform3i("uCell", None).get(), Vector3::zeros());
        assert!(shader.texture2d("uAlbedo", None).get().is_none());
        assert_eq!(shader.texture_cube_array("uProbes", 2).array_size(), 2);
        assert!(!shader.is_live());
    }
}
