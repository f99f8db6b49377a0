//! Named text styles and the per-document registry that owns them.
//!
//! Styles are plain values: a [`TextStyle`] bundles a [`FontFace`], a size in points and an
//! optional color. Registering a style with a [`StyleRegistry`] hands back a [`StyleRef`] which
//! content blocks use to refer to the style by name.

use std::collections::BTreeMap;
use std::fmt;

use genpdf::style::{Color, Style};

use crate::error::StyleError;

/// Weight of a font face.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum FontWeight {
    /// Regular weight.
    #[default]
    Regular,
    /// Bold weight.
    Bold,
}

/// Slant of a font face.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum FontSlant {
    /// Upright glyphs.
    #[default]
    Upright,
    /// Italic glyphs.
    Italic,
}

/// A font family name together with the weight and slant to use from it.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FontFace {
    family: String,
    weight: FontWeight,
    slant: FontSlant,
}

impl FontFace {
    /// Creates the regular, upright face of `family`.
    pub fn new(family: impl Into<String>) -> Self {
        Self {
            family: family.into(),
            weight: FontWeight::Regular,
            slant: FontSlant::Upright,
        }
    }

    /// Returns the family name.
    pub fn family(&self) -> &str {
        &self.family
    }

    /// Regular or bold.
    pub fn weight(&self) -> FontWeight {
        self.weight
    }

    /// Upright or italic.
    pub fn slant(&self) -> FontSlant {
        self.slant
    }

    /// Switches to the bold weight.
    pub fn bold(mut self) -> Self {
        self.weight = FontWeight::Bold;
        self
    }

    /// Switches to the italic slant.
    pub fn italic(mut self) -> Self {
        self.slant = FontSlant::Italic;
        self
    }
}

/// A named bundle of font face, size and color.
#[derive(Clone, Debug, PartialEq)]
pub struct TextStyle {
    name: String,
    font: FontFace,
    size: u8,
    color: Option<Color>,
}

impl TextStyle {
    /// Defines a new style. The size is given in points.
    pub fn new(name: impl Into<String>, font: FontFace, size: u8) -> Self {
        Self {
            name: name.into(),
            font,
            size,
            color: None,
        }
    }

    /// Sets the text color and returns the updated style.
    pub fn with_color(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }

    /// Unique name of the style.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Font family and face.
    pub fn font(&self) -> &FontFace {
        &self.font
    }

    /// Font size in points.
    pub fn size(&self) -> u8 {
        self.size
    }

    /// Text color, if one is set.
    pub fn color(&self) -> Option<Color> {
        self.color
    }

    /// Converts the style into a `genpdf` style without a font family.
    ///
    /// The family is resolved by the layout bridge because it depends on the fonts loaded into
    /// the `genpdf` document.
    pub fn to_genpdf_style(&self) -> Style {
        let mut style = Style::new().with_font_size(self.size);
        if let Some(color) = self.color {
            style.set_color(color);
        }
        if self.font.weight == FontWeight::Bold {
            style.set_bold();
        }
        if self.font.slant == FontSlant::Italic {
            style.set_italic();
        }
        style
    }
}

/// Handle to a registered style, referencing it by name.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StyleRef(String);

impl StyleRef {
    /// Name of the referenced style.
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StyleRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Mapping from style name to style, populated once at startup.
#[derive(Clone, Debug, Default)]
pub struct StyleRegistry {
    styles: BTreeMap<String, TextStyle>,
}

impl StyleRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `style`, failing if a style with the same name already exists.
    pub fn register(&mut self, style: TextStyle) -> Result<StyleRef, StyleError> {
        if self.styles.contains_key(style.name()) {
            return Err(StyleError::DuplicateStyle {
                name: style.name().to_owned(),
            });
        }
        let handle = StyleRef(style.name().to_owned());
        self.styles.insert(style.name().to_owned(), style);
        Ok(handle)
    }

    /// Looks up a style by name.
    pub fn get(&self, name: &str) -> Option<&TextStyle> {
        self.styles.get(name)
    }

    /// Resolves a handle, which may have been issued by another registry.
    pub fn resolve(&self, style: &StyleRef) -> Option<&TextStyle> {
        self.get(style.name())
    }

    /// Number of registered styles.
    pub fn len(&self) -> usize {
        self.styles.len()
    }

    /// Whether no style is registered.
    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }

    /// Iterates over registered styles in name order.
    pub fn iter(&self) -> impl Iterator<Item = &TextStyle> {
        self.styles.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn heading() -> TextStyle {
        TextStyle::new("Heading", FontFace::new("LiberationSerif").bold(), 14)
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut registry = StyleRegistry::new();
        registry.register(heading()).expect("first registration");

        let err = registry
            .register(TextStyle::new("Heading", FontFace::new("Other"), 9))
            .unwrap_err();
        assert_eq!(
            err,
            StyleError::DuplicateStyle {
                name: "Heading".to_string()
            }
        );
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("Heading").map(TextStyle::size), Some(14));
    }

    #[test]
    fn distinct_names_remain_retrievable() {
        let mut registry = StyleRegistry::new();
        let title = registry
            .register(
                TextStyle::new("Title", FontFace::new("LiberationSerif"), 28)
                    .with_color(Color::Rgb(36, 101, 144)),
            )
            .expect("title registers");
        let heading = registry.register(heading()).expect("heading registers");

        assert_eq!(registry.resolve(&title).map(TextStyle::size), Some(28));
        assert_eq!(
            registry.resolve(&title).and_then(TextStyle::color),
            Some(Color::Rgb(36, 101, 144))
        );
        assert_eq!(
            registry.resolve(&heading).map(|s| s.font().weight()),
            Some(FontWeight::Bold)
        );
    }

    #[test]
    fn genpdf_style_reflects_face_and_color() {
        let style = TextStyle::new(
            "Footer",
            FontFace::new("LiberationSerif").bold().italic(),
            8,
        )
        .with_color(Color::Rgb(1, 2, 3))
        .to_genpdf_style();

        assert!(style.is_bold());
        assert!(style.is_italic());
        assert_eq!(style.font_size(), 8);
        assert_eq!(style.color(), Some(Color::Rgb(1, 2, 3)));
    }
}
