//! Data carried through a thumbnail run.
//!
//! The inbound event is parsed once into an immutable `SourceReference`;
//! everything else (local artifacts, destination container, result) lives
//! for one run only.

pub mod artifact;
pub mod container;
pub mod event;
pub mod result;
