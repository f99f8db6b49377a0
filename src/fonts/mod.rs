//! Font loading for the families named by a document's styles.
//!
//! Families are read with [`genpdf::fonts::from_files`], which expects the four faces to be named
//! `<Family>-Regular.ttf`, `<Family>-Bold.ttf`, `<Family>-Italic.ttf` and
//! `<Family>-BoldItalic.ttf`. Directories are searched in this order:
//!
//! 1. the directory named by the `CV_FONTS_DIR` environment variable,
//! 2. `assets/fonts` next to the running executable,
//! 3. `assets/fonts` inside this crate,
//! 4. the system directory for the Liberation fonts.

use std::collections::BTreeMap;
use std::env;
use std::io;
use std::path::{Path, PathBuf};

use genpdf::error::Error;
use genpdf::fonts::{self, FontData, FontFamily};
use log::debug;

use crate::error::RenderError;

/// Family used by the bundled CV styles.
pub const DEFAULT_FONT_FAMILY_NAME: &str = "LiberationSerif";

/// Environment variable overriding the font search directory.
pub const FONTS_DIR_ENV: &str = "CV_FONTS_DIR";

const FACE_SUFFIXES: &[&str] = &["Regular", "Bold", "Italic", "BoldItalic"];

const SYSTEM_FONT_DIRECTORIES: &[&str] = &[
    "/usr/share/fonts/truetype/liberation",
    "/usr/share/fonts/liberation",
    "/usr/share/fonts/liberation-serif",
];

fn font_directory_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    if let Some(path) = env::var_os(FONTS_DIR_ENV).map(PathBuf::from) {
        if !path.as_os_str().is_empty() {
            candidates.push(path);
        }
    }

    if let Ok(current_exe) = env::current_exe() {
        if let Some(bin_dir) = current_exe.parent() {
            candidates.push(bin_dir.join("assets/fonts"));
        }
    }

    candidates.push(bundled_fonts_source_dir());
    candidates.extend(SYSTEM_FONT_DIRECTORIES.iter().map(PathBuf::from));
    candidates.dedup();
    candidates
}

/// Directory inside the crate that holds bundled font files.
pub fn bundled_fonts_source_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("assets/fonts")
}

fn face_files(family: &str) -> impl Iterator<Item = String> + '_ {
    FACE_SUFFIXES
        .iter()
        .map(move |suffix| format!("{family}-{suffix}.ttf"))
}

fn missing_face_files(directory: &Path, family: &str) -> Vec<String> {
    face_files(family)
        .filter(|name| !directory.join(name).is_file())
        .collect()
}

/// Finds the first candidate directory holding all faces of `family`.
pub fn resolve_family_directory(family: &str) -> Result<PathBuf, Error> {
    let mut attempts = Vec::new();

    for candidate in font_directory_candidates() {
        if !candidate.is_dir() {
            attempts.push(format!("{} (directory missing)", candidate.display()));
            continue;
        }

        let missing = missing_face_files(&candidate, family);
        if missing.is_empty() {
            debug!("Resolved font family '{}' in {}", family, candidate.display());
            return Ok(candidate);
        }
        attempts.push(format!(
            "{} (missing files [{}])",
            candidate.display(),
            missing.join(", ")
        ));
    }

    Err(Error::new(
        format!(
            "Unable to locate font family '{}'. Checked: {}. Set {} to a directory containing the font files.",
            family,
            attempts.join(", "),
            FONTS_DIR_ENV
        ),
        io::Error::new(io::ErrorKind::NotFound, "font family not found"),
    ))
}

/// Loads all four faces of `family`.
pub fn load_family(family: &str) -> Result<FontFamily<FontData>, RenderError> {
    let directory =
        resolve_family_directory(family).map_err(|source| RenderError::FontLoad {
            family: family.to_owned(),
            source,
        })?;

    fonts::from_files(&directory, family, None).map_err(|source| RenderError::FontLoad {
        family: family.to_owned(),
        source,
    })
}

/// Indicates whether every face of `family` can be found on disk.
pub fn family_available(family: &str) -> bool {
    resolve_family_directory(family).is_ok()
}

/// Font families loaded once and shared between render passes.
#[derive(Clone, Default)]
pub struct FontLibrary {
    families: BTreeMap<String, FontFamily<FontData>>,
}

impl FontLibrary {
    /// Creates an empty library.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads every family in `names` that is not loaded yet.
    pub fn load<'a, I>(names: I) -> Result<Self, RenderError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut library = Self::new();
        for name in names {
            if !library.contains(name) {
                let family = load_family(name)?;
                library.insert(name, family);
            }
        }
        Ok(library)
    }

    /// Adds an already loaded family under `name`.
    pub fn insert(&mut self, name: impl Into<String>, family: FontFamily<FontData>) {
        self.families.insert(name.into(), family);
    }

    /// Returns the family loaded under `name`.
    pub fn get(&self, name: &str) -> Option<&FontFamily<FontData>> {
        self.families.get(name)
    }

    /// Returns whether a family is loaded under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.families.contains_key(name)
    }

    /// Iterates over loaded families in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FontFamily<FontData>)> {
        self.families
            .iter()
            .map(|(name, family)| (name.as_str(), family))
    }
}
