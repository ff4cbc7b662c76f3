//! Artifact persistence for accepted parsers

mod store;

pub use store::ArtifactStore;
