//! # Engine Module
//!
//! File-level plumbing behind the [`Fort10`](crate::wavefunction::Fort10) facade.
//!
//! - **Configuration** ([`config`]) - write mode, rewrite strategy and memory budget
//! - **Error Handling** ([`error`]) - the [`WfError`](error::WfError) taxonomy
//! - **Storage** ([`store`]) - the working file, in place or a private copy
//! - **Mutation** ([`rewrite`]) - token splicing with atomic replacement
//! - **Available memory** ([`memory`]) - available memory, used to pick a rewrite strategy

pub mod config;
pub mod error;
pub(crate) mod memory;
pub mod rewrite;
pub mod store;
