//! Domain layer: bookmark tree model, provider error taxonomy and ports.

pub mod error;
pub mod model;
pub mod traits;
