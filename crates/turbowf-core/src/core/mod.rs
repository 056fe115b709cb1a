//! # Core Module
//!
//! Stateless building blocks of the record-file reader.
//!
//! - **Token model** ([`models`]) - [`Field`](models::field::Field) values that remember
//!   their `(line, token)` position, and the turbo-notation shell codes
//! - **Tokenizing and locating** ([`io`]) - whitespace tokenizer and the keyword regexes
//!   that bound each section
//! - **Section readers** ([`sections`]) - one typed record per section, parsed from a
//!   token stream with counts supplied by the header

pub mod io;
pub mod models;
pub mod sections;
