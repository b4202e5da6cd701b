//! Payload encoding capability
//!
//! Proposal text is never stored in the clear; it passes through a
//! `PayloadEncoder` first. Nothing at this layer decodes the result or relies
//! on any algebraic property of it.

use base64::{engine::general_purpose::STANDARD, Engine as _};

/// Turns a plaintext payload into the opaque string stored as `content`
pub trait PayloadEncoder: Send + Sync {
    fn encode(&self, plain_payload: &str) -> String;
}

/// Stand-in for a real encryption scheme: tags the base64 of the payload.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderEncoder;

impl PlaceholderEncoder {
    pub const PREFIX: &'static str = "FHE-";
}

impl PayloadEncoder for PlaceholderEncoder {
    fn encode(&self, plain_payload: &str) -> String {
        format!("{}{}", Self::PREFIX, STANDARD.encode(plain_payload.as_bytes()))
    }
}
