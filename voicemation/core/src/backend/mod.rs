//! Generation Service Integration
//!
//! Access to the remote generation service through a common trait.
//!
//! # Usage
//!
//! ```ignore
//! use voicemation_core::backend::{GenerationBackend, GenerationClient, GenerationInput, Mode};
//!
//! let client = GenerationClient::from_env();
//! let result = client.submit(GenerationInput::text("draw a circle", Mode::Standard)).await;
//! ```

mod http;
mod traits;

pub use http::{GenerationClient, DEFAULT_BASE_URL, GENERATE_PATH};
pub use traits::{
    AudioClip, FailureKind, GenerationBackend, GenerationFailure, GenerationInput,
    GenerationPayload, GenerationSuccess, Mode,
};
