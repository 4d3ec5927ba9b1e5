use crate::engine::pipeline::bind_group_data::BindGroupData;
use crate::engine::pipeline::bind_group_layout::{BindGroupLayouts, BindGroupScope};
use crate::engine::pipeline::uniform::Uniform;
use log::trace;

/// A created pipeline: the three scoped layouts together with their live bind group data.
#[derive(Debug)]
pub struct Pipeline {
    name: String,
    layouts: BindGroupLayouts,
    bind_groups: [BindGroupData; 3],
}

impl Pipeline {
    pub fn new(name: impl Into<String>, layouts: BindGroupLayouts) -> Self {
        let name = name.into();
        let bind_groups = BindGroupScope::ALL.map(|scope| layouts.get(scope).create_data());

        trace!(
            "[{name} Pipeline] Created bind groups with {} bindings",
            bind_groups.iter().map(|g| g.bindings().len()).sum::<usize>()
        );

        Pipeline {
            name,
            layouts,
            bind_groups,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn layouts(&self) -> &BindGroupLayouts {
        &self.layouts
    }

    /// View, pipeline and mesh group, in that order.
    pub fn bind_groups(&self) -> &[BindGroupData] {
        &self.bind_groups
    }

    pub fn bind_group(&self, scope: BindGroupScope) -> &BindGroupData {
        match scope {
            BindGroupScope::View => &self.bind_groups[0],
            BindGroupScope::Pipeline => &self.bind_groups[1],
            BindGroupScope::Mesh => &self.bind_groups[2],
        }
    }

    /// Finds a uniform buffer member by name in any of the three groups.
    pub fn find_uniform(&self, name: &str) -> Option<&Uniform> {
        self.bind_groups.iter().find_map(|g| g.uniform(name))
    }
}
