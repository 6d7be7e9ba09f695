//! # Signature Kit
//!
//! API signature generation, comparison and enforcement for JVM projects.
//! Drives an external extraction tool (metalava) and gates its output against
//! a checked-in baseline.
//!
//! ## Modules
//!
//! - `config` - Validated configuration, defaults and the `sigguard.toml` layer
//! - `signature` - Signature file model, parser, serializer and diff
//! - `tool` - Argument building, tool resolution and bounded process invocation
//! - `enforcement` - Diagnostics classification and the final run verdict
//! - `keep_rules` - Keep rules derived from the generated signature
//! - `execution_api` - High-level generate/check API
//!
//! ## Usage
//!
//! ```rust,ignore
//! use signature_kit::config::{ApiType, Configuration};
//! use signature_kit::execution_api::SignaturePipeline;
//!
//! let config = Configuration::builder()
//!     .hidden_package("com.example.internal")
//!     .build(project_root)?;
//! let pipeline = SignaturePipeline::system(&config, None);
//!
//! // Regenerate the baseline
//! pipeline.generate(&config)?;
//!
//! // Check both surfaces concurrently
//! let surfaces = [config.surface(ApiType::Api), config.surface(ApiType::Removed)];
//! for report in pipeline.check_all(&surfaces) {
//!     println!("{}", report?.outcome.status());
//! }
//! ```

pub mod config;
pub mod enforcement;
pub mod errors;
pub mod execution_api;
pub mod keep_rules;
pub mod signature;
pub mod tool;

pub use config::{Configuration, ConfigurationBuilder};
pub use enforcement::{Outcome, Status};
pub use errors::PipelineError;
pub use execution_api::{Operation, RunReport, SignaturePipeline};
