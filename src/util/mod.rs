//! Utility types shared by every layer of the codec.
//!
//! - [`Error`] / [`Result`] - Error handling
//! - [`ArrayVector`] - fixed-capacity arrays for hardware-limited state
//! - Math type re-exports from glam plus [`Aabb`] and [`Mtx34`]

mod array_vector;
mod error;
mod math;

pub use array_vector::*;
pub use error::*;
pub use math::*;
