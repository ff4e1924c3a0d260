//! Usecase layer: application workflows + events.

pub mod classify;
pub mod event;
pub mod group;
pub mod organize;
pub mod reorganize;
pub mod stats;
