use thiserror::Error;

pub type Result<T> = std::result::Result<T, KbError>;

#[derive(Error, Debug)]
pub enum KbError {
    #[error("Data load error: {0}")]
    DataLoad(String),

    #[error("Index build error: {0}")]
    IndexBuild(String),

    #[error("Embedding service error: {0}")]
    EmbeddingService(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

pub mod commands;
pub mod config;
pub mod corpus;
pub mod embeddings;
pub mod engine;
pub mod index;
pub mod server;
