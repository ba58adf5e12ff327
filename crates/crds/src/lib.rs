//! Marketplace CRD Definitions
//!
//! Kubernetes Custom Resource Definitions for the marketplace controller.

pub mod catalog_source_config;
pub mod operator_source;
pub mod phase;

pub use catalog_source_config::*;
pub use operator_source::*;
pub use phase::*;
