use crate::engine::pipeline::bind_group_data::BindGroupData;
use crate::engine::pipeline::binding_layout::{
    BindingLayout, StorageLayout, TextureDimension, TextureLayout, TextureSampleType,
    UniformBufferLayout,
};
use crate::engine::pipeline::{GpuType, StorageDimension};
use kool_utils::LongHash;
use snafu::{Snafu, ensure};
use std::fmt::{Display, Formatter};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

#[derive(Debug, Snafu)]
#[snafu(context(suffix(Err)), visibility(pub(crate)))]
pub enum LayoutError {
    #[snafu(display("Bind group layout in the {slot} slot has scope {found}"))]
    ScopeMismatch {
        slot: BindGroupScope,
        found: BindGroupScope,
    },

    #[snafu(display(
        "Storage binding `{name}` uses format {format} which has no storage texture equivalent"
    ))]
    UnsupportedStorageFormat { name: String, format: GpuType },

    #[snafu(display(
        "Storage binding `{name}` declares extent {size:?} which a {dimension:?} storage texture cannot have"
    ))]
    InvalidStorageExtent {
        name: String,
        dimension: StorageDimension,
        size: [Option<u32>; 3],
    },

    #[snafu(display(
        "Depth texture `{name}` has dimension {dimension:?}, only 2d and cube depth textures exist"
    ))]
    UnsupportedDepthTexture {
        name: String,
        dimension: TextureDimension,
    },
}

pub(crate) fn ensure_texture_supported(texture: &TextureLayout) -> Result<(), LayoutError> {
    if texture.sample_type() == TextureSampleType::Depth {
        ensure!(
            matches!(
                texture.dimension(),
                TextureDimension::D2 | TextureDimension::Cube
            ),
            UnsupportedDepthTextureErr {
                name: texture.name(),
                dimension: texture.dimension(),
            }
        );
    }
    Ok(())
}

/// Storage textures only exist with 1, 2 or 4 components of 32 bit.
pub(crate) fn ensure_storage_supported(storage: &StorageLayout) -> Result<(), LayoutError> {
    ensure!(
        matches!(
            storage.format(),
            GpuType::Float1
                | GpuType::Float2
                | GpuType::Float4
                | GpuType::Int1
                | GpuType::Int2
                | GpuType::Int4
        ),
        UnsupportedStorageFormatErr {
            name: storage.name(),
            format: storage.format(),
        }
    );
    Ok(())
}

/// How often the contents of a bind group change.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum BindGroupScope {
    View,
    Pipeline,
    Mesh,
}

impl BindGroupScope {
    pub const ALL: [BindGroupScope; 3] = [
        BindGroupScope::View,
        BindGroupScope::Pipeline,
        BindGroupScope::Mesh,
    ];
}

impl Display for BindGroupScope {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            BindGroupScope::View => f.write_str("view"),
            BindGroupScope::Pipeline => f.write_str("pipeline"),
            BindGroupScope::Mesh => f.write_str("mesh"),
        }
    }
}

/// An ordered set of bindings sharing one [`BindGroupScope`].
///
/// The position of a binding in the list is its binding index, which is why the layout hash is
/// order sensitive. Two layouts compare equal iff their content hashes match, which makes them
/// usable as cache keys for pipeline objects.
#[derive(Debug, Clone)]
pub struct BindGroupLayout {
    group: u32,
    scope: BindGroupScope,
    bindings: Vec<BindingLayout>,
    hash: u64,
}

impl BindGroupLayout {
    pub fn new(group: u32, scope: BindGroupScope, mut bindings: Vec<BindingLayout>) -> Self {
        let mut hash = LongHash::new();
        hash.push(&scope);

        for (i, binding) in bindings.iter_mut().enumerate() {
            binding.assign_binding_index(i as u32);
            hash.push_u64(binding.content_hash());
        }

        BindGroupLayout {
            group,
            scope,
            bindings,
            hash: hash.hash(),
        }
    }

    pub fn builder(group: u32, scope: BindGroupScope) -> BindGroupLayoutBuilder {
        BindGroupLayoutBuilder::new(group, scope)
    }

    /// An empty runtime container with one typed slot per binding.
    pub fn create_data(self: &Arc<Self>) -> BindGroupData {
        BindGroupData::new(self.clone())
    }

    pub fn group(&self) -> u32 {
        self.group
    }

    pub fn scope(&self) -> BindGroupScope {
        self.scope
    }

    pub fn bindings(&self) -> &[BindingLayout] {
        &self.bindings
    }

    pub fn content_hash(&self) -> u64 {
        self.hash
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn binding(&self, name: &str) -> Option<&BindingLayout> {
        self.bindings.iter().find(|b| b.name() == name)
    }

    pub fn find_uniform_buffer_of(&self, uniform_name: &str) -> Option<&UniformBufferLayout> {
        self.bindings.iter().find_map(|b| match b {
            BindingLayout::UniformBuffer(ubo) if ubo.has_uniform(uniform_name) => Some(ubo),
            _ => None,
        })
    }

    pub fn textures(&self) -> impl Iterator<Item = &TextureLayout> {
        self.bindings.iter().filter_map(|b| match b {
            BindingLayout::Texture(tex) => Some(tex),
            _ => None,
        })
    }

    /// Binding index of the sampler belonging to the `ordinal`-th texture. Samplers are placed
    /// after all regular bindings, in texture order.
    pub fn sampler_binding(&self, ordinal: usize) -> u32 {
        (self.bindings.len() + ordinal) as u32
    }

    pub fn storage_of_dimension(
        &self,
        dimension: StorageDimension,
    ) -> impl Iterator<Item = &StorageLayout> {
        self.bindings.iter().filter_map(move |b| match b {
            BindingLayout::Storage(s) if s.dimension() == dimension => Some(s),
            _ => None,
        })
    }
}

impl PartialEq for BindGroupLayout {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash
    }
}

impl Eq for BindGroupLayout {}

impl Hash for BindGroupLayout {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash);
    }
}

/// Collects bindings declared independently by shader generation.
///
/// [`create`](Self::create) always orders uniform buffers first, then textures, then storage. The
/// code generator relies on exactly this order when it emits binding indices.
#[derive(Debug, Clone)]
pub struct BindGroupLayoutBuilder {
    group: u32,
    scope: BindGroupScope,
    pub ubos: Vec<UniformBufferLayout>,
    pub textures: Vec<TextureLayout>,
    pub storage: Vec<StorageLayout>,
}

impl BindGroupLayoutBuilder {
    pub fn new(group: u32, scope: BindGroupScope) -> Self {
        BindGroupLayoutBuilder {
            group,
            scope,
            ubos: Vec::new(),
            textures: Vec::new(),
            storage: Vec::new(),
        }
    }

    pub fn add_ubo(&mut self, ubo: UniformBufferLayout) -> &mut Self {
        self.ubos.push(ubo);
        self
    }

    pub fn add_texture(&mut self, texture: TextureLayout) -> &mut Self {
        self.textures.push(texture);
        self
    }

    pub fn add_storage(&mut self, storage: StorageLayout) -> &mut Self {
        self.storage.push(storage);
        self
    }

    pub fn scope(&self) -> BindGroupScope {
        self.scope
    }

    pub fn create(self) -> BindGroupLayout {
        let bindings = self
            .ubos
            .into_iter()
            .map(BindingLayout::from)
            .chain(self.textures.into_iter().map(BindingLayout::from))
            .chain(self.storage.into_iter().map(BindingLayout::from))
            .collect();

        BindGroupLayout::new(self.group, self.scope, bindings)
    }
}

/// The three scoped layouts a pipeline is built from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BindGroupLayouts {
    view: Arc<BindGroupLayout>,
    pipeline: Arc<BindGroupLayout>,
    mesh: Arc<BindGroupLayout>,
}

impl BindGroupLayouts {
    pub fn new(
        view: impl Into<Arc<BindGroupLayout>>,
        pipeline: impl Into<Arc<BindGroupLayout>>,
        mesh: impl Into<Arc<BindGroupLayout>>,
    ) -> Result<Self, LayoutError> {
        let layouts = BindGroupLayouts {
            view: view.into(),
            pipeline: pipeline.into(),
            mesh: mesh.into(),
        };

        for slot in BindGroupScope::ALL {
            let found = layouts.get(slot).scope();
            ensure!(found == slot, ScopeMismatchErr { slot, found });
        }

        Ok(layouts)
    }

    pub fn get(&self, scope: BindGroupScope) -> &Arc<BindGroupLayout> {
        match scope {
            BindGroupScope::View => &self.view,
            BindGroupScope::Pipeline => &self.pipeline,
            BindGroupScope::Mesh => &self.mesh,
        }
    }

    /// View, pipeline and mesh layout, in that order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<BindGroupLayout>> {
        [&self.view, &self.pipeline, &self.mesh].into_iter()
    }

    pub fn content_hash(&self) -> u64 {
        let mut hash = LongHash::new();
        for layout in self.iter() {
            hash.push_u64(layout.content_hash());
        }
        hash.hash()
    }
}
