//! plotmatch-export: Pure report serializers (sans-IO)
//!
//! Turns rankings into human-readable text reports and JSON documents.
//! Every function returns a `String`; writing it anywhere is the
//! caller's job.

pub mod json;
pub mod text;

pub use json::{embedding_to_json, to_json};
pub use text::{to_embedding_text_report, to_text_report};
