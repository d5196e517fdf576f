//! Sandboxed JavaScript execution.
//!
//! The douyin detail API is protected by an obfuscated client-side
//! signing script that is not worth reimplementing (it changes with the
//! platform's web bundle). Instead the script asset is embedded verbatim
//! and executed in a QuickJS context with just enough browser stubs to
//! keep it happy. The evaluator is isolated here so the asset can be
//! swapped without touching the extractors.

mod context;
mod error;
mod manager;

pub use context::JsContext;
pub use error::JsError;
pub use manager::JsEngineManager;
