//! Request boundary for rx-search.
//!
//! Wraps the search core with request validation, an optional enhanced
//! lookup that falls back to local search, tagged JSON responses, and
//! localized error bodies. The `rx-search` binary drives it from the
//! command line.
//!
//! # Modules
//!
//! - [`request`]: JSON request parsing and validation
//! - [`gateway`]: Request handling and fallback selection
//! - [`enhanced`]: Enhanced lookup trait, providers, and reply parsing
//! - [`prompts`]: Prompt templates for model-backed lookups
//! - [`response`]: Response envelopes
//! - [`error`]: Gateway errors and locales

pub mod enhanced;
pub mod error;
pub mod gateway;
pub mod prompts;
pub mod request;
pub mod response;

pub use enhanced::{EnhancedLookup, EnhancedReply, LookupError, MockEnhancedLookup};
pub use error::{GatewayError, GatewayResult, Locale};
pub use gateway::Gateway;
pub use request::SearchRequest;
pub use response::{SearchResponse, SuggestionBody, SuggestionEnvelope};
