//! hikefind-store
//!
//! Flat per-item artifact persistence and the offline batch indexer. Each
//! corpus item is a colocated file pair (mask stack + embedding vector)
//! under one shared identifier, plus an optional class-map visualization.

pub mod artifacts;
pub mod corpus;
pub mod indexer;

pub use artifacts::{
    load_mask_stack, load_vector, save_class_map, save_mask_stack, save_vector, IndexManifest,
};
pub use corpus::load_corpus;
pub use indexer::{BatchIndexer, IndexReport};
