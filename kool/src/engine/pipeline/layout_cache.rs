use crate::engine::pipeline::bind_group_layout::BindGroupLayout;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use log::trace;
use std::sync::Arc;

/// Deduplicates structurally identical bind group layouts.
///
/// Shaders generated from the same declarations produce layouts with equal content hashes. The
/// cache hands out one shared [`Arc`] per hash, so backend objects built from a layout only have to
/// be created once. Safe to share between threads.
#[derive(Debug, Default)]
pub struct LayoutCache {
    layouts: DashMap<u64, Arc<BindGroupLayout>>,
}

impl LayoutCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached layout with the same content hash as `layout`, inserting it if there
    /// is none yet.
    pub fn get_or_insert(&self, layout: BindGroupLayout) -> Arc<BindGroupLayout> {
        match self.layouts.entry(layout.content_hash()) {
            Entry::Occupied(cached) => Arc::clone(cached.get()),
            Entry::Vacant(slot) => {
                trace!(
                    "[Layout Cache] Added {} layout {:#018x} with {} bindings",
                    layout.scope(),
                    layout.content_hash(),
                    layout.bindings().len()
                );
                Arc::clone(slot.insert(Arc::new(layout)).value())
            }
        }
    }

    pub fn get(&self, hash: u64) -> Option<Arc<BindGroupLayout>> {
        self.layouts.get(&hash).map(|l| Arc::clone(l.value()))
    }

    pub fn len(&self) -> usize {
        self.layouts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layouts.is_empty()
    }

    pub fn clear(&self) {
        self.layouts.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::pipeline::bind_group_layout::BindGroupScope;
    use crate::engine::pipeline::binding_layout::{ShaderStages, TextureLayout};

    fn albedo_layout() -> BindGroupLayout {
        BindGroupLayout::new(
            1,
            BindGroupScope::Pipeline,
            vec![TextureLayout::tex_2d("uAlbedo", ShaderStages::FRAGMENT).into()],
        )
    }

    #[test]
    fn equal_layouts_share_one_entry() {
        let cache = LayoutCache::new();
        let a = cache.get_or_insert(albedo_layout());
        let b = cache.get_or_insert(albedo_layout());

        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 1);
        assert!(cache.get(a.content_hash()).is_some());
    }

    #[test]
    fn different_layouts_are_kept_apart() {
        let cache = LayoutCache::new();
        cache.get_or_insert(albedo_layout());
        cache.get_or_insert(BindGroupLayout::new(0, BindGroupScope::View, vec![]));

        assert_eq!(cache.len(), 2);
        cache.clear();
        assert!(cache.is_empty());
    }
}
