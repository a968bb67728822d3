//! Data Transfer Objects for the HTTP surface
//!
//! These are the loosely-typed shapes the browser client sends and the
//! response shapes it expects back. The server and CLI share them.

pub mod start;
pub mod upload;
