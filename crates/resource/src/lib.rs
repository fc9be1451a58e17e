//! Template stores for stencil.
//!
//! This crate provides platform-specific implementations of the
//! `TemplateStore` trait from stencil-traits.
//!
//! ## Available Stores
//!
//! - [`FilesystemTemplateStore`]: Keeps uploaded templates in a local directory
//!
//! The in-memory store from stencil-traits is re-exported for convenience:
//! - [`InMemoryTemplateStore`]: Pre-populated in-memory storage

mod filesystem;

pub use filesystem::FilesystemTemplateStore;

pub use stencil_traits::InMemoryTemplateStore;
