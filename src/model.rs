//! Data structures describing the logical content of a document.
//!
//! A [`Document`] owns its page geometry, metadata, style registry and an ordered list of
//! [`ContentBlock`]s. Blocks are immutable once appended; their order defines the vertical flow
//! handed to the layout engine. All lengths are PDF points.

use genpdf::style::Color;

use crate::error::{ModelError, StyleError};
use crate::richtext::Span;
use crate::style::{StyleRef, StyleRegistry, TextStyle};

/// Horizontal alignment of a text block within its container.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HorizontalAlignment {
    /// Left aligned content.
    #[default]
    Left,
    /// Center aligned content.
    Center,
    /// Right aligned content.
    Right,
    /// Fully justified paragraphs.
    Justified,
}

/// A run of wrapped text, either in the body style or in a registered style.
#[derive(Clone, Debug, PartialEq)]
pub struct Text {
    content: String,
    style: Option<StyleRef>,
    alignment: HorizontalAlignment,
    outline: bool,
}

impl Text {
    /// Creates text rendered with the document body style.
    pub fn plain(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            style: None,
            alignment: HorizontalAlignment::Left,
            outline: false,
        }
    }

    /// Creates text rendered with a registered style.
    pub fn styled(content: impl Into<String>, style: &StyleRef) -> Self {
        Self {
            style: Some(style.clone()),
            ..Self::plain(content)
        }
    }

    /// Sets the alignment and returns the updated text.
    pub fn aligned(mut self, alignment: HorizontalAlignment) -> Self {
        self.alignment = alignment;
        self
    }

    /// Marks the text as an outline (bookmark) entry.
    pub fn with_outline(mut self) -> Self {
        self.outline = true;
        self
    }

    /// The text to render.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// The referenced style, or `None` for body text.
    pub fn style(&self) -> Option<&StyleRef> {
        self.style.as_ref()
    }

    /// Horizontal alignment within the container.
    pub fn alignment(&self) -> HorizontalAlignment {
        self.alignment
    }

    /// Whether the text appears in the document outline.
    pub fn is_outline(&self) -> bool {
        self.outline
    }
}

/// Indentation of list items, in points.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Indentation {
    /// Space before the bullet glyph.
    pub pre: f64,
    /// Space between the bullet glyph and the item text.
    pub post: f64,
}

impl Default for Indentation {
    fn default() -> Self {
        Self { pre: 4.0, post: 8.0 }
    }
}

/// A bullet glyph plus its text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListItem {
    symbol: String,
    content: String,
}

impl ListItem {
    pub fn new(symbol: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            content: content.into(),
        }
    }

    /// Bullet glyph printed before the item.
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Item text.
    pub fn content(&self) -> &str {
        &self.content
    }
}

/// An ordered list of bulleted items.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct List {
    items: Vec<ListItem>,
    indentation: Indentation,
}

impl List {
    pub fn new(indentation: Indentation) -> Self {
        Self {
            items: Vec::new(),
            indentation,
        }
    }

    /// Appends an item and returns the updated list.
    pub fn with_item(mut self, item: ListItem) -> Self {
        self.items.push(item);
        self
    }

    /// Items in display order.
    pub fn items(&self) -> &[ListItem] {
        &self.items
    }

    /// Bullet and text indentation, in points.
    pub fn indentation(&self) -> Indentation {
        self.indentation
    }

    /// Whether the list has no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Relative width of a column, validated to lie in `(0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
pub struct WidthFraction(pub(crate) f64);

impl WidthFraction {
    /// The full container width.
    pub const FULL: WidthFraction = WidthFraction(1.0);

    /// Validates that `value` lies in `(0, 1]`.
    pub fn new(value: f64) -> Result<Self, ModelError> {
        if value.is_finite() && value > 0.0 && value <= 1.0 {
            Ok(Self(value))
        } else {
            Err(ModelError::InvalidWidth(value))
        }
    }

    /// The fraction as a number in `(0, 1]`.
    pub fn value(self) -> f64 {
        self.0
    }
}

/// A column of a [`Section`] owning its own ordered blocks.
#[derive(Clone, Debug, PartialEq)]
pub struct Column {
    width: WidthFraction,
    blocks: Vec<ContentBlock>,
}

impl Column {
    /// Creates an empty column of the given width.
    pub fn new(width: WidthFraction) -> Self {
        Self {
            width,
            blocks: Vec::new(),
        }
    }

    /// Relative width of the column.
    pub fn width(&self) -> WidthFraction {
        self.width
    }

    /// Blocks stacked in the column.
    pub fn blocks(&self) -> &[ContentBlock] {
        &self.blocks
    }
}

/// A horizontal row of independently flowing columns.
#[derive(Clone, Debug, PartialEq)]
pub struct Section {
    columns: Vec<Column>,
}

impl Section {
    pub fn new(columns: Vec<Column>) -> Self {
        Self { columns }
    }

    /// Columns from left to right.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Sum of all column width fractions.
    pub fn total_width(&self) -> f64 {
        self.columns.iter().map(|c| c.width.value()).sum()
    }
}

/// A horizontal rule spanning its container.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LineSeparator {
    /// Stroke color.
    pub color: Color,
    /// Vertical space the rule occupies, in points. The stroke itself uses the default PDF
    /// line width.
    pub width: f64,
}

impl Default for LineSeparator {
    fn default() -> Self {
        Self {
            color: Color::Greyscale(64),
            width: 0.25,
        }
    }
}

/// One discrete appendable unit of content.
#[derive(Clone, Debug, PartialEq)]
pub enum ContentBlock {
    /// Text in the body style.
    PlainText(Text),
    /// Text in a registered style.
    StyledText(Text),
    /// A bulleted list.
    List(List),
    /// A row of columns.
    Section(Section),
    /// Fixed vertical whitespace in points.
    Space(f64),
    /// A horizontal rule.
    LineSeparator(LineSeparator),
}

impl ContentBlock {
    /// Wraps text into the matching variant depending on whether it carries a style.
    pub fn text(text: Text) -> Self {
        if text.style().is_some() {
            Self::StyledText(text)
        } else {
            Self::PlainText(text)
        }
    }

    /// Returns the text payload, if this is a text block.
    pub fn as_text(&self) -> Option<&Text> {
        match self {
            Self::PlainText(text) | Self::StyledText(text) => Some(text),
            _ => None,
        }
    }
}

/// A target that content blocks can be appended to.
pub trait BlockContainer {
    /// Appends a block at the end of the container.
    fn push_block(&mut self, block: ContentBlock);

    /// Returns the blocks appended so far.
    fn blocks(&self) -> &[ContentBlock];
}

impl BlockContainer for Column {
    fn push_block(&mut self, block: ContentBlock) {
        self.blocks.push(block);
    }

    fn blocks(&self) -> &[ContentBlock] {
        &self.blocks
    }
}

/// Supported paper sizes.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum PaperSize {
    /// ISO A4, 210 x 297 mm.
    #[default]
    A4,
    /// US Letter, 215.9 x 279.4 mm.
    Letter,
    /// Arbitrary size in millimetres.
    Custom {
        /// Page width in millimetres.
        width_mm: f64,
        /// Page height in millimetres.
        height_mm: f64,
    },
}

impl PaperSize {
    /// Width and height in millimetres.
    pub fn dimensions_mm(self) -> (f64, f64) {
        match self {
            PaperSize::A4 => (210.0, 297.0),
            PaperSize::Letter => (215.9, 279.4),
            PaperSize::Custom {
                width_mm,
                height_mm,
            } => (width_mm, height_mm),
        }
    }
}

/// Page margins in points.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Insets {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Insets {
    /// Uses the same inset on all four sides.
    pub fn uniform(value: f64) -> Self {
        Self {
            top: value,
            right: value,
            bottom: value,
            left: value,
        }
    }
}

/// Page size, margins and the spacing reserved around header and footer notes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PageGeometry {
    pub paper: PaperSize,
    pub margins: Insets,
    /// Gap between the header band and the content.
    pub header_space: f64,
    /// Gap between the content and the footer band.
    pub footer_space: f64,
    /// Height reserved for each of the header and footer bands.
    pub note_height: f64,
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self {
            paper: PaperSize::A4,
            margins: Insets::uniform(32.0),
            header_space: 4.0,
            footer_space: 4.0,
            note_height: 24.0,
        }
    }
}

/// Document-level permission flags.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Permissions {
    pub printing: bool,
    pub copying: bool,
}

impl Permissions {
    /// Returns whether every operation is permitted.
    pub fn is_unrestricted(self) -> bool {
        self.printing && self.copying
    }
}

impl Default for Permissions {
    fn default() -> Self {
        Self {
            printing: true,
            copying: true,
        }
    }
}

/// Document information embedded into the PDF `/Info` dictionary.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Metadata {
    pub title: String,
    pub author: String,
    pub subject: String,
    pub keywords: Vec<String>,
    pub permissions: Permissions,
}

/// Lines of rich text shown in the header or footer band of every page.
#[derive(Clone, Debug, PartialEq)]
pub struct PageNote {
    lines: Vec<Vec<Span>>,
    style: StyleRef,
}

impl PageNote {
    /// Creates an empty note drawn in `style`.
    pub fn new(style: &StyleRef) -> Self {
        Self {
            lines: Vec::new(),
            style: style.clone(),
        }
    }

    /// Appends a line of spans and returns the updated note.
    pub fn with_line(mut self, spans: Vec<Span>) -> Self {
        self.lines.push(spans);
        self
    }

    /// Lines of the note, each a sequence of spans.
    pub fn lines(&self) -> &[Vec<Span>] {
        &self.lines
    }

    /// Base style of every line.
    pub fn style(&self) -> &StyleRef {
        &self.style
    }
}

/// Page numbering shown right-aligned in the footer band.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pagination {
    template: String,
    style: StyleRef,
}

impl Pagination {
    /// Creates pagination from a template containing `{page}` and `{total}` placeholders.
    pub fn new(template: impl Into<String>, style: &StyleRef) -> Self {
        Self {
            template: template.into(),
            style: style.clone(),
        }
    }

    /// Style of the pagination text.
    pub fn style(&self) -> &StyleRef {
        &self.style
    }

    /// Formats the label for `page`. An unknown total renders as `?`.
    pub fn format(&self, page: usize, total: Option<usize>) -> String {
        let total = total.map_or_else(|| "?".to_owned(), |total| total.to_string());
        self.template
            .replace("{page}", &page.to_string())
            .replace("{total}", &total)
    }
}

/// A document under assembly.
#[derive(Clone, Debug)]
pub struct Document {
    geometry: PageGeometry,
    metadata: Metadata,
    styles: StyleRegistry,
    body_style: StyleRef,
    blocks: Vec<ContentBlock>,
    header: Option<PageNote>,
    footer: Option<PageNote>,
    pagination: Option<Pagination>,
}

impl Document {
    /// Creates an empty document whose body text uses `body_style`.
    ///
    /// The body style is registered like any other style, so its name is taken.
    pub fn new(geometry: PageGeometry, body_style: TextStyle) -> Result<Self, StyleError> {
        let mut styles = StyleRegistry::new();
        let body_style = styles.register(body_style)?;
        Ok(Self {
            geometry,
            metadata: Metadata::default(),
            styles,
            body_style,
            blocks: Vec::new(),
            header: None,
            footer: None,
            pagination: None,
        })
    }

    /// Registers a style, failing if the name is already taken.
    pub fn register_style(&mut self, style: TextStyle) -> Result<StyleRef, StyleError> {
        self.styles.register(style)
    }

    /// Styles registered with the document.
    pub fn styles(&self) -> &StyleRegistry {
        &self.styles
    }

    /// Handle of the body style used by plain text.
    pub fn body_style(&self) -> &StyleRef {
        &self.body_style
    }

    /// Page size, margins and band spacing.
    pub fn geometry(&self) -> &PageGeometry {
        &self.geometry
    }

    /// Document-level metadata written to the PDF.
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn set_metadata(&mut self, metadata: Metadata) {
        self.metadata = metadata;
    }

    /// Note repeated at the top of every page.
    pub fn header(&self) -> Option<&PageNote> {
        self.header.as_ref()
    }

    pub fn set_header(&mut self, note: PageNote) {
        self.header = Some(note);
    }

    /// Note repeated at the bottom of every page.
    pub fn footer(&self) -> Option<&PageNote> {
        self.footer.as_ref()
    }

    pub fn set_footer(&mut self, note: PageNote) {
        self.footer = Some(note);
    }

    /// Pagination printed in the footer band.
    pub fn pagination(&self) -> Option<&Pagination> {
        self.pagination.as_ref()
    }

    pub fn set_pagination(&mut self, pagination: Pagination) {
        self.pagination = Some(pagination);
    }

    /// Titles of all outline entries, in document order.
    pub fn outline_titles(&self) -> Vec<&str> {
        fn collect<'a>(blocks: &'a [ContentBlock], titles: &mut Vec<&'a str>) {
            for block in blocks {
                match block {
                    ContentBlock::PlainText(text) | ContentBlock::StyledText(text)
                        if text.is_outline() =>
                    {
                        titles.push(text.content());
                    }
                    ContentBlock::Section(section) => {
                        for column in section.columns() {
                            collect(column.blocks(), titles);
                        }
                    }
                    _ => {}
                }
            }
        }

        let mut titles = Vec::new();
        collect(&self.blocks, &mut titles);
        titles
    }
}

impl BlockContainer for Document {
    fn push_block(&mut self, block: ContentBlock) {
        self.blocks.push(block);
    }

    fn blocks(&self) -> &[ContentBlock] {
        &self.blocks
    }
}
