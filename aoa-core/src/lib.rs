//! AOA Core
//!
//! Core types and pure logic for the area-of-applicability pipeline.
//!
//! This crate contains:
//! - Domain types: pipeline requests, stage outcomes, engine calls, the aggregated result
//! - DTOs: wire shapes exchanged with the HTTP collaborator and the CLI
//! - The request normalizer turning loosely-typed input into a `PipelineRequest`

pub mod domain;
pub mod dto;
pub mod normalize;
