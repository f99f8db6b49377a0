//! Writing the finished document and handing it to the system viewer.

use std::env;
use std::io::Write;
use std::path::{Component, Path, PathBuf};

use log::{debug, info};
use tempfile::NamedTempFile;

use crate::error::{GenerateError, RenderError};
use crate::layout;
use crate::metadata;
use crate::model::Document;

/// Directory and file name of the generated document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputTarget {
    pub directory: PathBuf,
    pub file_name: String,
}

impl OutputTarget {
    /// Creates a target for `file_name` inside `directory`.
    pub fn new(directory: impl Into<PathBuf>, file_name: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
            file_name: file_name.into(),
        }
    }

    /// Places `file_name` in the system temporary directory.
    pub fn in_temp_dir(file_name: impl Into<String>) -> Self {
        Self::new(env::temp_dir(), file_name)
    }

    /// Builds and validates the destination path.
    pub fn path(&self) -> Result<PathBuf, GenerateError> {
        output_path(&self.directory, &self.file_name)
    }
}

/// Joins `directory` and `file_name` into a destination path.
///
/// The file name must be a single plain path component and the directory must exist.
pub fn output_path(directory: &Path, file_name: &str) -> Result<PathBuf, GenerateError> {
    let mut components = Path::new(file_name).components();
    let plain = matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    );
    if !plain {
        return Err(GenerateError::PathConstruction {
            reason: format!("`{file_name}` is not a plain file name"),
        });
    }

    if !directory.is_dir() {
        return Err(GenerateError::PathConstruction {
            reason: format!("output directory {} does not exist", directory.display()),
        });
    }

    Ok(directory.join(file_name))
}

/// Writes `bytes` to `path`, leaving any existing file untouched on failure.
pub fn write_atomically(bytes: &[u8], path: &Path) -> Result<(), RenderError> {
    let io_error = |source| RenderError::Io {
        path: path.to_path_buf(),
        source,
    };
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut file = NamedTempFile::new_in(directory).map_err(io_error)?;
    file.write_all(bytes).map_err(io_error)?;
    file.as_file().sync_all().map_err(io_error)?;
    file.persist(path)?;

    debug!("Wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}

/// Opens `path` with the default application of the operating system.
pub fn open_in_viewer(path: &Path) -> Result<(), GenerateError> {
    opener::open(path).map_err(|source| GenerateError::ViewerOpen {
        path: path.to_path_buf(),
        source,
    })
}

/// Renders `document` and writes it to `target`, returning the written path.
pub fn generate(document: &Document, target: &OutputTarget) -> Result<PathBuf, GenerateError> {
    let path = target.path()?;
    metadata::check_permissions(document.metadata().permissions)?;

    let fonts = layout::load_fonts(document)?;
    let rendered = layout::render(document, &fonts)?;
    let bytes = metadata::finalize(
        &rendered.bytes,
        document.metadata(),
        &rendered.outline,
        &rendered.links,
    )?;
    write_atomically(&bytes, &path)?;

    info!(
        "Generated {} ({} page(s), {} bytes)",
        path.display(),
        rendered.page_count,
        bytes.len()
    );
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_path_joins_plain_file_names() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = output_path(dir.path(), "Philip Niedertscheider CV.pdf").expect("path");
        assert_eq!(path, dir.path().join("Philip Niedertscheider CV.pdf"));
    }

    #[test]
    fn output_path_rejects_nested_or_empty_names() {
        let dir = tempfile::tempdir().expect("temp dir");
        for name in ["", "nested/cv.pdf", "..", "/cv.pdf"] {
            assert!(
                matches!(
                    output_path(dir.path(), name),
                    Err(GenerateError::PathConstruction { .. })
                ),
                "{name:?} should be rejected"
            );
        }
    }

    #[test]
    fn missing_directory_leaves_no_bytes_behind() {
        let dir = tempfile::tempdir().expect("temp dir");
        let missing = dir.path().join("missing");

        assert!(matches!(
            output_path(&missing, "cv.pdf"),
            Err(GenerateError::PathConstruction { .. })
        ));

        let destination = missing.join("cv.pdf");
        let Err(err) = write_atomically(b"%PDF-1.5", &destination) else {
            panic!("write into a missing directory unexpectedly succeeded");
        };
        assert!(matches!(err, RenderError::Io { .. }));
        assert!(!destination.exists());
    }

    #[test]
    fn atomic_write_replaces_existing_content() {
        let dir = tempfile::tempdir().expect("temp dir");
        let destination = dir.path().join("cv.pdf");
        std::fs::write(&destination, b"old").expect("seed file");

        write_atomically(b"new content", &destination).expect("write");

        assert_eq!(std::fs::read(&destination).expect("read"), b"new content");
        let leftovers = std::fs::read_dir(dir.path()).expect("list").count();
        assert_eq!(leftovers, 1);
    }

    #[test]
    fn temp_dir_target_uses_system_directory() {
        let target = OutputTarget::in_temp_dir("cv.pdf");
        assert_eq!(target.directory, env::temp_dir());
        assert_eq!(target.file_name, "cv.pdf");
    }
}
