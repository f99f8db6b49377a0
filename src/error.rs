//! Error types shared by the cv_document crate.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while registering text styles with a document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StyleError {
    /// A style with the same name is already registered.
    #[error("text style `{name}` is already registered")]
    DuplicateStyle {
        /// Name of the conflicting style.
        name: String,
    },
}

/// Errors raised while constructing model values.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    /// A column width fraction was not in `(0, 1]`.
    #[error("column width fraction {0} must be positive and at most 1")]
    InvalidWidth(f64),
}

/// Errors that abort laying out or writing a document.
#[derive(Debug, Error)]
pub enum RenderError {
    /// A font family could not be located or parsed.
    #[error("failed to load font family `{family}`")]
    FontLoad {
        /// Name of the family that failed to load.
        family: String,
        /// Underlying loader error.
        #[source]
        source: genpdf::error::Error,
    },

    /// A content block references a style the document does not know.
    #[error("text style `{0}` is not registered with the document")]
    UnknownStyle(String),

    /// The layout engine failed to place or render an element.
    #[error("layout failed")]
    Layout(#[from] genpdf::error::Error),

    /// The rendered bytes could not be parsed or rewritten.
    #[error("failed to post-process PDF structure")]
    Metadata(#[from] lopdf::Error),

    /// The PDF trailer has no usable document catalog.
    #[error("PDF catalog entry is missing or not a dictionary")]
    MissingCatalog,

    /// An outline entry refers to a page that was never emitted.
    #[error("outline entry `{title}` refers to missing page {page}")]
    MissingPage {
        /// Title of the outline entry.
        title: String,
        /// The requested (1-indexed) page number.
        page: usize,
    },

    /// A link annotation refers to a page that was never emitted.
    #[error("link to `{url}` refers to missing page {page}")]
    MissingLinkPage {
        url: String,
        page: usize,
    },

    /// Restricting permissions needs PDF encryption, which is not produced.
    #[error("restricted permissions (printing: {printing}, copying: {copying}) require encryption")]
    UnsupportedPermissions {
        /// Whether printing was requested.
        printing: bool,
        /// Whether copying was requested.
        copying: bool,
    },

    /// Writing to the destination failed.
    #[error("I/O error while writing {path}")]
    Io {
        /// Destination that was being written.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The finished temporary file could not be moved onto the destination.
    #[error("failed to move rendered document into place")]
    Persist(#[from] tempfile::PersistError),
}

/// Terminal failures of the document generation pipeline.
#[derive(Debug, Error)]
pub enum GenerateError {
    /// The output path could not be constructed.
    #[error("failed to create output path: {reason}")]
    PathConstruction {
        /// Human-readable explanation.
        reason: String,
    },

    /// Layout, rendering or writing failed.
    #[error("failed to generate PDF document")]
    Render(#[from] RenderError),

    /// The generated file could not be opened in the system viewer.
    #[error("failed to open {path} in the system viewer")]
    ViewerOpen {
        /// Path of the generated document.
        path: PathBuf,
        /// Underlying opener error.
        #[source]
        source: opener::OpenError,
    },
}
