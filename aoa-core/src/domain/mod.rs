//! Core domain types
//!
//! These types are shared between the runner (which produces them) and the
//! server and CLI (which carry them over the wire).

pub mod call;
pub mod outcome;
pub mod request;
pub mod result;
