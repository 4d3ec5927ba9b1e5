//! Lowering of the backend independent layouts to graphics API descriptor types.
//!
//! Only plain descriptor data is produced here, no device objects are created.

mod wgpu_layout;

pub use wgpu_layout::*;
