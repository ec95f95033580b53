//! Lightweight JavaScript/TypeScript syntax layer for Redraft.
//!
//! This is intentionally *not* a full ECMAScript front end. The goal is a
//! small, deterministic syntax layer covering the node shapes the
//! refactoring engine needs: declarations (including destructuring
//! patterns), functions, type aliases, exports, and a pragmatic expression
//! grammar. Every node carries a byte [`redraft_types::Span`] into the
//! original source so downstream passes can slice and rewrite text.

pub mod js;

pub use js::{parse, Parse};
