//! Skilltree Core Types and Definitions
//!
//! This crate provides the foundational types shared by the skill tree
//! editor. It includes:
//!
//! - **Identifiers**: Creation-ordered node identifiers ([`identifier::NodeId`])
//! - **Colors**: Color handling with CSS color support ([`color::Color`])
//! - **Geometry**: Basic geometric types ([`geometry`] module)
//! - **Stroke**: Line styling for rendered edges ([`stroke`] module)

pub mod color;
pub mod geometry;
pub mod identifier;
pub mod stroke;
