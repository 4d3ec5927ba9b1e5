use crate::engine::pipeline::binding_layout::{GpuType, UniformDescriptor};
use crate::utils::sizes::{STD140_ARRAY_STRIDE_ALIGN, STD140_VEC4_ALIGN};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Std140Entry {
    pub name: String,
    pub gpu_type: GpuType,
    pub array_size: Option<u32>,
    /// Byte offset of the first element inside the buffer.
    pub offset: u64,
    /// Distance between two array elements. Equals `size` for non-arrays.
    pub stride: u64,
    /// Bytes occupied by the whole member, including array padding.
    pub size: u64,
}

/// Byte layout of a uniform buffer following the std140 rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Std140BufferLayout {
    entries: Vec<Std140Entry>,
    size: u64,
}

impl Std140BufferLayout {
    pub fn new(uniforms: &[UniformDescriptor]) -> Self {
        let mut offset = 0;
        let mut entries = Vec::with_capacity(uniforms.len());

        for uniform in uniforms {
            let (size, align) = size_align(uniform.gpu_type);
            let is_array = uniform.is_array();

            // arrays and matrices always start and step on vec4 boundaries
            let (align, stride) = if is_array {
                let stride = round_up(size, STD140_ARRAY_STRIDE_ALIGN);
                (align.max(STD140_ARRAY_STRIDE_ALIGN), stride)
            } else {
                (align, size)
            };

            offset = round_up(offset, align);
            let total = if is_array {
                stride * uniform.len() as u64
            } else {
                size
            };

            entries.push(Std140Entry {
                name: uniform.name.clone(),
                gpu_type: uniform.gpu_type,
                array_size: uniform.array_size,
                offset,
                stride,
                size: total,
            });
            offset += total;
        }

        Std140BufferLayout {
            entries,
            size: round_up(offset, STD140_VEC4_ALIGN),
        }
    }

    /// Total buffer size, rounded up to a multiple of 16.
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn entries(&self) -> &[Std140Entry] {
        &self.entries
    }

    pub fn entry(&self, name: &str) -> Option<&Std140Entry> {
        self.entries.iter().find(|e| e.name == name)
    }
}

/// Size and base alignment of a single (non-array) member.
fn size_align(gpu_type: GpuType) -> (u64, u64) {
    match gpu_type {
        GpuType::Float1 | GpuType::Int1 => (4, 4),
        GpuType::Float2 | GpuType::Int2 => (8, 8),
        GpuType::Float3 | GpuType::Int3 => (12, 16),
        GpuType::Float4 | GpuType::Int4 => (16, 16),
        // matrices are stored as padded vec4 columns
        GpuType::Mat3 => (3 * STD140_VEC4_ALIGN, STD140_VEC4_ALIGN),
        GpuType::Mat4 => (4 * STD140_VEC4_ALIGN, STD140_VEC4_ALIGN),
    }
}

#[inline]
fn round_up(value: u64, align: u64) -> u64 {
    value.div_ceil(align) * align
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout(uniforms: &[UniformDescriptor]) -> Std140BufferLayout {
        Std140BufferLayout::new(uniforms)
    }

    #[test]
    fn scalars_pack_tightly() {
        let l = layout(&[
            UniformDescriptor::new("a", GpuType::Float1),
            UniformDescriptor::new("b", GpuType::Int1),
            UniformDescriptor::new("c", GpuType::Float2),
        ]);

        assert_eq!(l.entry("a").map(|e| e.offset), Some(0));
        assert_eq!(l.entry("b").map(|e| e.offset), Some(4));
        assert_eq!(l.entry("c").map(|e| e.offset), Some(8));
        assert_eq!(l.size(), 16);
    }

    #[test]
    fn vec3_aligns_to_sixteen_and_shares_tail() {
        let l = layout(&[
            UniformDescriptor::new("pad", GpuType::Float1),
            UniformDescriptor::new("dir", GpuType::Float3),
            UniformDescriptor::new("intensity", GpuType::Float1),
        ]);

        assert_eq!(l.entry("dir").map(|e| e.offset), Some(16));
        // a scalar directly after a vec3 fills its padding
        assert_eq!(l.entry("intensity").map(|e| e.offset), Some(28));
        assert_eq!(l.size(), 32);
    }

    #[test]
    fn arrays_use_vec4_stride() {
        let l = layout(&[
            UniformDescriptor::new("count", GpuType::Int1),
            UniformDescriptor::new("weights", GpuType::Float1).array(3),
            UniformDescriptor::new("tail", GpuType::Float1),
        ]);

        let weights = l.entry("weights").cloned();
        assert_eq!(weights.as_ref().map(|e| e.offset), Some(16));
        assert_eq!(weights.as_ref().map(|e| e.stride), Some(16));
        assert_eq!(weights.as_ref().map(|e| e.size), Some(48));
        assert_eq!(l.entry("tail").map(|e| e.offset), Some(64));
        assert_eq!(l.size(), 80);
    }

    #[test]
    fn matrices() {
        let l = layout(&[
            UniformDescriptor::new("normalMat", GpuType::Mat3),
            UniformDescriptor::new("bones", GpuType::Mat4).array(2),
        ]);

        assert_eq!(l.entry("normalMat").map(|e| e.size), Some(48));
        assert_eq!(l.entry("bones").map(|e| e.offset), Some(48));
        assert_eq!(l.entry("bones").map(|e| e.stride), Some(64));
        assert_eq!(l.size(), 48 + 128);
    }

    #[test]
    fn empty_buffer() {
        let l = layout(&[]);
        assert_eq!(l.size(), 0);
        assert!(l.entries().is_empty());
    }
}
