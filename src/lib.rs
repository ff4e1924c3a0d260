//! Reclassifies Netscape bookmark exports with an LLM and rebuilds them into a
//! shallow, sorted folder hierarchy.
//!
//! Split into Clean Architecture layers:
//! - domain: bookmark tree model, provider error taxonomy, ports
//! - usecase: classification, grouping, hierarchy rebuild + progress events
//! - infrastructure: HTML codec, file I/O, HTTP provider, schema checks
//! - interface: CLI wiring

pub mod domain;
pub mod infrastructure;
pub mod interface;
pub mod usecase;
