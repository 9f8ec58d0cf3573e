//! Object identity and content hashing for mdgraph realms.
//!
//! Every persisted object is named by the digest of its framed encoding,
//! `"<kind> <len>\0<payload>"`. This crate provides the [`ObjectId`] type,
//! the streaming [`Hasher`](hasher::Hasher) that produces it, and hex helpers.

mod algorithm;
mod error;
pub mod hasher;
pub mod hex;
mod oid;

pub use algorithm::HashAlgorithm;
pub use error::HashError;
pub use oid::ObjectId;
