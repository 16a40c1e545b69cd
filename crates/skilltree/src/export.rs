//! Concrete [`Renderer`](crate::scene::Renderer) implementations.

pub mod svg;

pub use self::svg::SvgRenderer;
