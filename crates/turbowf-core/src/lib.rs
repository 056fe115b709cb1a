//! # turbowf
//!
//! Lazy reader and minimal-diff writer for TurboRVB wavefunction record files
//! (`fort.10`).
//!
//! ## Architectural Philosophy
//!
//! The library follows a three-layer layout:
//!
//! - **[`core`]: The Foundation.** Stateless pieces: the provenance-carrying
//!   [`Field`](core::models::field::Field), the tokenizer and keyword-based section
//!   locator, and one reader per section of the record.
//!
//! - **[`engine`]: The Plumbing.** Stateful file handling: the error taxonomy, the
//!   configuration builder, the store that owns the working file (in place or a
//!   private copy), and the mutation engine that splices token replacements into
//!   the file with either a buffered or a streaming rewrite.
//!
//! - **[`wavefunction`]: The Public API.** The [`Fort10`](wavefunction::Fort10)
//!   facade wires header counts into every section reader, parses each section on
//!   first access, and writes every mutation through to disk immediately.
//!
//! Referencing the crate has no process-wide side effects: nothing installs a
//! logger or creates directories until a file is opened.

pub mod core;
pub mod engine;
pub mod wavefunction;

#[cfg(test)]
pub(crate) mod testing;
