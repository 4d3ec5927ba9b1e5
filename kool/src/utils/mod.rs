pub mod color;
pub mod sizes;

pub use color::*;
