//! REST API
//!
//! - `common`: response envelope, error mapping, validated JSON extractor
//! - `modules`: one directory per resource (dto + handlers)
//! - `router`: route table, shared state and OpenAPI document

pub mod common;
pub mod modules;
pub mod router;

pub use router::{create_api_router, ApiDoc, ApiState};

#[cfg(test)]
mod tests;
