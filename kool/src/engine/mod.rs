//! Engine side of kool's shader plumbing.
//!
//! Everything that describes how a shader's resources are laid out on the GPU, and how user code
//! reaches the live values behind them, lives in [`pipeline`].

pub mod pipeline;

pub use pipeline::*;
