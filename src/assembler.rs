//! Append operations that compose content blocks into a document.
//!
//! The simple operations ([`add_text`], [`add_space`], ...) work on any [`BlockContainer`]. The
//! composite ones live on [`Assembler`], which carries the house style (heading style, rule,
//! bullet glyph, list indentation) so every header and list in a document looks the same.

use std::num::NonZeroUsize;

use crate::error::ModelError;
use crate::model::{
    BlockContainer, Column, ContentBlock, Document, HorizontalAlignment, Indentation,
    LineSeparator, List, ListItem, Section, Text, WidthFraction,
};
use crate::style::StyleRef;

/// Bullet glyph used for list items.
pub const DEFAULT_BULLET: &str = "\u{2022}";

/// Appends wrapped text in a registered style.
pub fn add_text(container: &mut impl BlockContainer, text: impl Into<String>, style: &StyleRef) {
    container.push_block(ContentBlock::StyledText(Text::styled(text, style)));
}

/// Appends wrapped text in the document body style.
pub fn add_plain_text(container: &mut impl BlockContainer, text: impl Into<String>) {
    container.push_block(ContentBlock::PlainText(Text::plain(text)));
}

/// Appends styled text with an explicit alignment.
pub fn add_aligned_text(
    container: &mut impl BlockContainer,
    text: impl Into<String>,
    style: &StyleRef,
    alignment: HorizontalAlignment,
) {
    container.push_block(ContentBlock::StyledText(
        Text::styled(text, style).aligned(alignment),
    ));
}

/// Inserts fixed vertical whitespace, in points.
pub fn add_space(container: &mut impl BlockContainer, height: f64) {
    container.push_block(ContentBlock::Space(height));
}

/// Appends a horizontal rule.
pub fn add_line_separator(container: &mut impl BlockContainer, separator: LineSeparator) {
    container.push_block(ContentBlock::LineSeparator(separator));
}

/// Width split of a two-column entry.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColumnSplit {
    left: WidthFraction,
    right: WidthFraction,
}

impl ColumnSplit {
    /// Gives the left column `left` of the width and the right column the rest.
    ///
    /// `left` must be strictly between 0 and 1 so both columns keep a positive width.
    pub fn new(left: f64) -> Result<Self, ModelError> {
        let left_fraction = WidthFraction::new(left)?;
        let right = WidthFraction::new(1.0 - left).map_err(|_| ModelError::InvalidWidth(left))?;
        Ok(Self {
            left: left_fraction,
            right,
        })
    }

    /// Uses explicit fractions for both columns. They are not normalized.
    pub fn explicit(left: f64, right: f64) -> Result<Self, ModelError> {
        Ok(Self {
            left: WidthFraction::new(left)?,
            right: WidthFraction::new(right)?,
        })
    }

    /// Width of the left column.
    pub fn left(&self) -> WidthFraction {
        self.left
    }

    /// Width of the right column.
    pub fn right(&self) -> WidthFraction {
        self.right
    }
}

impl Default for ColumnSplit {
    fn default() -> Self {
        Self {
            left: WidthFraction(0.5),
            right: WidthFraction(0.5),
        }
    }
}

/// Splits `items` into exactly `count` chunks whose sizes differ by at most one.
///
/// The first `len % count` chunks receive one extra item, so sizes are non-increasing. Order is
/// preserved and trailing chunks are empty when there are fewer items than chunks.
pub fn evenly_chunked<T>(items: &[T], count: NonZeroUsize) -> Vec<&[T]> {
    let count = count.get();
    let base = items.len() / count;
    let remainder = items.len() % count;

    let mut chunks = Vec::with_capacity(count);
    let mut start = 0;
    for index in 0..count {
        let size = base + usize::from(index < remainder);
        chunks.push(&items[start..start + size]);
        start += size;
    }
    chunks
}

/// Builder for the composite blocks of a document, configured once with the house style.
#[derive(Clone, Debug)]
pub struct Assembler {
    heading: StyleRef,
    rule: LineSeparator,
    space_before_header: f64,
    space_after_header: f64,
    bullet: String,
    indentation: Indentation,
}

impl Assembler {
    /// Creates an assembler whose headers use `heading`.
    pub fn new(heading: &StyleRef) -> Self {
        Self {
            heading: heading.clone(),
            rule: LineSeparator::default(),
            space_before_header: 10.0,
            space_after_header: 6.0,
            bullet: DEFAULT_BULLET.to_owned(),
            indentation: Indentation::default(),
        }
    }

    /// Sets the rule drawn under headers.
    pub fn with_rule(mut self, rule: LineSeparator) -> Self {
        self.rule = rule;
        self
    }

    /// Sets the whitespace around headers, in points.
    pub fn with_header_spacing(mut self, before: f64, after: f64) -> Self {
        self.space_before_header = before;
        self.space_after_header = after;
        self
    }

    /// Sets the bullet glyph used by lists.
    pub fn with_bullet(mut self, bullet: impl Into<String>) -> Self {
        self.bullet = bullet.into();
        self
    }

    /// Sets the list indentation.
    pub fn with_indentation(mut self, indentation: Indentation) -> Self {
        self.indentation = indentation;
        self
    }

    /// Appends a header: space, heading text, rule, space.
    ///
    /// The heading text is marked as an outline entry.
    pub fn add_header(&self, document: &mut Document, title: impl Into<String>) {
        add_space(document, self.space_before_header);
        document.push_block(ContentBlock::StyledText(
            Text::styled(title, &self.heading).with_outline(),
        ));
        add_line_separator(document, self.rule);
        add_space(document, self.space_after_header);
    }

    /// Builds a bulleted list from plain strings.
    pub fn bullet_list<I, S>(&self, items: I) -> List
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        items
            .into_iter()
            .fold(List::new(self.indentation), |list, item| {
                list.with_item(ListItem::new(self.bullet.as_str(), item))
            })
    }

    /// Appends a bulleted list with one item per string.
    pub fn add_bullet_list<I, S>(&self, container: &mut impl BlockContainer, items: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        container.push_block(ContentBlock::List(self.bullet_list(items)));
    }

    /// Appends a two-column row. Text in the right column is right-aligned.
    pub fn add_two_column_entry(
        &self,
        document: &mut Document,
        left_blocks: Vec<ContentBlock>,
        right_blocks: Vec<ContentBlock>,
        split: ColumnSplit,
    ) {
        let mut left = Column::new(split.left());
        for block in left_blocks {
            left.push_block(block);
        }

        let mut right = Column::new(split.right());
        for block in right_blocks {
            right.push_block(align_right(block));
        }

        document.push_block(ContentBlock::Section(Section::new(vec![left, right])));
    }

    /// Appends a row of `columns` equally wide columns, each holding a bulleted list.
    ///
    /// Items are distributed with [`evenly_chunked`].
    pub fn add_multi_column_grid<S>(
        &self,
        document: &mut Document,
        items: &[S],
        columns: NonZeroUsize,
    ) where
        S: AsRef<str>,
    {
        let width = WidthFraction(1.0 / columns.get() as f64);
        let columns = evenly_chunked(items, columns)
            .into_iter()
            .map(|chunk| {
                let mut column = Column::new(width);
                self.add_bullet_list(&mut column, chunk.iter().map(|item| item.as_ref()));
                column
            })
            .collect();
        document.push_block(ContentBlock::Section(Section::new(columns)));
    }
}

fn align_right(block: ContentBlock) -> ContentBlock {
    match block {
        ContentBlock::PlainText(text) => {
            ContentBlock::PlainText(text.aligned(HorizontalAlignment::Right))
        }
        ContentBlock::StyledText(text) => {
            ContentBlock::StyledText(text.aligned(HorizontalAlignment::Right))
        }
        other => other,
    }
}
