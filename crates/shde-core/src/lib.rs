//! Shared data model, external-collaborator ports, and configuration for
//! the Self-Healing Debugging Engine (SHDE).
//!
//! This crate has no knowledge of *how* a patch is found or applied; it
//! only defines the vocabulary (`Failure`, `ErrorSignature`, `Patch`, …)
//! and the traits (`TestExecutor`, `PatchOracleProvider`, `ArtifactSink`)
//! every other SHDE crate builds on.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod config;
pub mod error;
pub mod model;
pub mod ports;

pub use config::ShdeConfig;
pub use error::CoreError;
pub use model::{
    AttemptOutcome, AttemptStatus, ConfidenceReason, ConfidenceRecord, ErrorKind, ErrorSignature,
    Failure, LearnedFix, Patch, Provenance, SessionId, Timestamp,
};
pub use ports::{ArtifactSink, ExecutorOutput, FileArtifactSink, PatchOracleProvider, TestExecutor};
