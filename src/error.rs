//! Error taxonomy of the public surface.
//!
//! None of these cross the public operations as panics or `Err` values: each is
//! logged where it is detected and the operation resolves to `None`/`false`.

use thiserror::Error;

use crate::registry::CreateError;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VirtualizerError {
    #[error("Unknown component id: {0}")]
    UnknownId(String),

    #[error("Construction of {id} failed: {source}")]
    Construction {
        id: String,
        #[source]
        source: CreateError,
    },

    #[error("Viewport intersection observation is unavailable")]
    VisibilityUnavailable,

    #[error("No tokio runtime available to run the construction")]
    NoRuntime,
}
