//! Trazo Core Types and Definitions
//!
//! This crate provides the foundational types shared by every stage of the
//! Trazo diagram compiler:
//!
//! - **Notations**: The supported input languages and the immutable source
//!   document ([`notation`] module)
//! - **Graph**: The unified node/edge/group model every notation lowers into
//!   ([`graph`] module)
//! - **Geometry**: Points, sizes and bounding boxes ([`geometry`] module)
//! - **Colors**: CSS color handling ([`color::Color`])
//! - **Style**: Stroke and text definitions ([`style`] module)

pub mod color;
pub mod geometry;
pub mod graph;
pub mod notation;
pub mod style;

pub use notation::{Notation, SourceDocument};
