use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The input image could not be decoded or has zero area.
    #[error("invalid image: {0}")]
    InvalidImage(String),

    /// The segmentation oracle failed; fatal for the current item.
    #[error("segmentation failed: {0}")]
    Segmentation(String),

    /// The embedding oracle failed; fatal for the current item or request.
    #[error("embedding failed: {0}")]
    Embedding(String),

    /// The caption oracle failed; callers substitute the fallback phrase.
    #[error("caption generation failed: {0}")]
    Caption(String),

    /// A vector with zero norm cannot be compared.
    #[error("zero-norm embedding vector")]
    DegenerateVector,

    /// Two mask stacks with different channel counts were compared.
    #[error("mask stacks have {left} vs {right} channels")]
    ChannelMismatch { left: usize, right: usize },

    /// A corpus item is missing one of its artifact files.
    #[error("missing {kind} artifact for '{id}'")]
    MissingArtifact { id: String, kind: &'static str },

    #[error("artifact encoding error: {0}")]
    Encode(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serde error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
