//! HTTP adapter around the link store

pub mod render;
pub mod services;

pub use render::{Renderer, ResponseFormat};
pub use services::{LinkSettings, link_routes};
