//! Engine components.
//!
//! The catalog, artifact model and loader, cross-artifact index and the
//! orchestrator live here. Rule families live in [`crate::rules`].

pub mod artifact;
pub mod catalog;
pub mod config;
pub mod diagnostic;
pub mod engine;
pub mod error;
pub mod fixer;
pub mod frontmatter;
pub mod ids;
pub mod index;
pub mod kinds;
pub mod loader;
pub mod markdown;
pub mod output;
pub mod report;
pub mod schema;
pub mod scoring;
