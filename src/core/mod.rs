//! core
//!
//! Core domain types, naming rules, and configuration for refpages.
//!
//! # Modules
//!
//! - [`types`] - Strong types: RefIdentity, RefKind, CommitIdentity, TreeDigest
//! - [`naming`] - Ref to directory-name resolution
//! - [`config`] - Configuration schema and loading
//!
//! # Design Principles
//!
//! - Strong typing prevents invalid states at compile time
//! - Schemas are strict and self-describing
//! - Resolution is pure and deterministic

pub mod config;
pub mod naming;
pub mod types;
