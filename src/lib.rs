//! Declarative assembly of styled, paginated PDF documents.
//!
//! A [`model::Document`] is populated through the [`assembler`] operations, laid out by
//! [`layout`] on top of `genpdf`, post-processed by [`metadata`] and written by [`output`].

pub mod assembler;
pub mod elements;
pub mod error;
pub mod fonts;
pub mod layout;
pub mod metadata;
pub mod model;
pub mod output;
pub mod richtext;
pub mod style;

pub use error::{GenerateError, ModelError, RenderError, StyleError};
pub use model::{BlockContainer, ContentBlock, Document};
pub use output::{generate, OutputTarget};
