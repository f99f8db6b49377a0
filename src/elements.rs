//! Element implementations built on top of `genpdf` primitives.
//!
//! `genpdf` measures vertical breaks in lines and indents bullets by a fixed amount, while
//! documents here are specified in points. The elements in this module fill those gaps: fixed
//! whitespace, full-width rules, bullets with configurable indentation, underlined single lines
//! that remember where their links landed, and a wrapper that records the page an outline entry
//! lands on.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use genpdf::error::Error;
use genpdf::style::{Color, Style, StyledString};
use genpdf::{render, Element, Mm, Position, RenderResult, Size};

use crate::richtext::StyledSpan;

const MM_PER_INCH: f64 = 25.4;
const POINTS_PER_INCH: f64 = 72.0;
const DEFAULT_UNDERLINE_OFFSET_MM: f64 = 0.4;

pub(crate) fn mm_from_f64(value: f64) -> Mm {
    Mm::from(printpdf::Mm(value))
}

pub(crate) fn mm_to_f64(value: Mm) -> f64 {
    let mm: printpdf::Mm = value.into();
    mm.0
}

/// Converts PDF points to `genpdf` millimetres.
pub fn points(value: f64) -> Mm {
    mm_from_f64(value * MM_PER_INCH / POINTS_PER_INCH)
}

/// Converts `genpdf` millimetres to PDF points.
pub fn to_points(value: Mm) -> f64 {
    mm_to_f64(value) * POINTS_PER_INCH / MM_PER_INCH
}

/// Fixed vertical whitespace.
///
/// Whitespace never carries over to the next page: when less room is left than requested, the
/// element consumes what remains.
pub struct VerticalSpace {
    height: Mm,
    rendered: bool,
}

impl VerticalSpace {
    /// Reserves `height` of vertical space.
    pub fn new(height: Mm) -> Self {
        Self {
            height,
            rendered: false,
        }
    }
}

impl Element for VerticalSpace {
    fn render(
        &mut self,
        _context: &genpdf::Context,
        area: render::Area<'_>,
        _style: Style,
    ) -> Result<RenderResult, Error> {
        let mut result = RenderResult::default();
        if self.rendered {
            return Ok(result);
        }
        self.rendered = true;

        let available = area.size().height;
        let height = if self.height > available {
            available
        } else {
            self.height
        };
        result.size = Size::new(0, height);
        Ok(result)
    }
}

/// A horizontal rule spanning the full width of its area.
///
/// `genpdf` strokes every line with the default PDF line width, so `thickness` only sets the
/// vertical space the rule reserves. The stroke runs through the middle of that space.
pub struct HorizontalRule {
    color: Color,
    thickness: Mm,
}

impl HorizontalRule {
    pub fn new(color: Color, thickness: Mm) -> Self {
        Self { color, thickness }
    }

    /// Height the rule occupies in the flow.
    pub fn reserved_height(&self) -> Mm {
        self.thickness
    }

    fn stroke_offset(&self) -> Mm {
        mm_from_f64(mm_to_f64(self.thickness) / 2.0)
    }

    fn stroke_style(&self) -> Style {
        Style::new().with_color(self.color)
    }
}

impl Element for HorizontalRule {
    fn render(
        &mut self,
        _context: &genpdf::Context,
        area: render::Area<'_>,
        _style: Style,
    ) -> Result<RenderResult, Error> {
        let mut result = RenderResult::default();
        let size = area.size();
        if self.thickness > size.height {
            result.has_more = true;
            return Ok(result);
        }

        let y = self.stroke_offset();
        area.draw_line(
            vec![Position::new(0, y), Position::new(size.width, y)],
            self.stroke_style(),
        );

        result.size = Size::new(size.width, self.thickness);
        Ok(result)
    }
}

/// A list item with a bullet placed `pre` from the left edge and the content `post` after it.
pub struct IndentedBullet<E: Element> {
    element: E,
    bullet: String,
    pre: Mm,
    post: Mm,
    bullet_rendered: bool,
}

impl<E: Element> IndentedBullet<E> {
    pub fn new(element: E, bullet: impl Into<String>, pre: Mm, post: Mm) -> Self {
        Self {
            element,
            bullet: bullet.into(),
            pre,
            post,
            bullet_rendered: false,
        }
    }

    /// Left offset of the content for a bullet of the given width.
    pub fn content_offset(&self, bullet_width: Mm) -> Mm {
        self.pre + bullet_width + self.post
    }
}

impl<E: Element> Element for IndentedBullet<E> {
    fn render(
        &mut self,
        context: &genpdf::Context,
        area: render::Area<'_>,
        style: Style,
    ) -> Result<RenderResult, Error> {
        let bullet_width = style.str_width(&context.font_cache, &self.bullet);
        let offset = self.content_offset(bullet_width);

        let mut element_area = area.clone();
        element_area.add_offset(Position::new(offset, 0));
        let mut result = self.element.render(context, element_area, style)?;

        // Only place the bullet on the page where the content starts.
        if !self.bullet_rendered && result.size.height > Mm::default() {
            area.print_str(
                &context.font_cache,
                Position::new(self.pre, 0),
                style,
                self.bullet.as_str(),
            )?;
            self.bullet_rendered = true;
        }

        result.size.width += offset;
        Ok(result)
    }
}

/// The part of a rendered line covered by a link, relative to the line's area.
#[derive(Clone, Debug, PartialEq)]
pub struct LinkSpan {
    pub x: Mm,
    pub width: Mm,
    pub height: Mm,
    pub url: String,
}

/// Places linked fragments side by side, starting at the left edge.
fn link_spans<'a, I>(fragments: I, height: Mm) -> Vec<LinkSpan>
where
    I: IntoIterator<Item = (Mm, Option<&'a str>)>,
{
    let mut cursor = Mm::default();
    let mut links = Vec::new();
    for (width, url) in fragments {
        if let Some(url) = url {
            links.push(LinkSpan {
                x: cursor,
                width,
                height,
                url: url.to_string(),
            });
        }
        cursor += width;
    }
    links
}

/// A single left-aligned line of styled text that draws thin strokes under underlined spans.
///
/// After rendering, [`UnderlinedLine::links`] reports where the linked spans were placed.
pub struct UnderlinedLine {
    spans: Vec<StyledSpan>,
    underline_offset: Mm,
    links: Vec<LinkSpan>,
}

impl UnderlinedLine {
    pub fn new(spans: Vec<StyledSpan>) -> Self {
        Self {
            spans,
            underline_offset: mm_from_f64(DEFAULT_UNDERLINE_OFFSET_MM),
            links: Vec::new(),
        }
    }

    /// Link areas of the last render, relative to the area the line was drawn in.
    pub fn links(&self) -> &[LinkSpan] {
        &self.links
    }
}

impl Element for UnderlinedLine {
    fn render(
        &mut self,
        context: &genpdf::Context,
        area: render::Area<'_>,
        style: Style,
    ) -> Result<RenderResult, Error> {
        let mut result = RenderResult::default();
        let mut prepared: Vec<(StyledString, bool, Mm)> = Vec::with_capacity(self.spans.len());
        let mut total_width = Mm::default();
        let mut line_height = style.line_height(&context.font_cache);
        let mut glyph_height = Mm::default();
        self.links.clear();

        for span in &self.spans {
            let mut string = span.string.clone();
            string.style = style.and(string.style);
            let width = string.width(&context.font_cache);
            total_width += width;
            line_height = line_height.max(string.style.line_height(&context.font_cache));
            glyph_height = glyph_height.max(
                string
                    .style
                    .font(&context.font_cache)
                    .glyph_height(string.style.font_size()),
            );
            prepared.push((string, span.underline, width));
        }

        if line_height > area.size().height {
            result.has_more = true;
            return Ok(result);
        }

        match area.text_section(&context.font_cache, Position::default(), style) {
            Some(mut section) => {
                for (string, _, _) in &prepared {
                    section.print_str(&string.s, string.style)?;
                }
            }
            None => {
                result.has_more = true;
                return Ok(result);
            }
        }

        let baseline = glyph_height + self.underline_offset;
        let mut cursor = Mm::default();
        for (string, underline, width) in &prepared {
            if *underline {
                let color = string.style.color().or(style.color()).unwrap_or(Color::Rgb(0, 0, 0));
                area.draw_line(
                    vec![
                        Position::new(cursor, baseline),
                        Position::new(cursor + *width, baseline),
                    ],
                    Style::new().with_color(color),
                );
            }
            cursor += *width;
        }

        self.links = link_spans(
            prepared
                .iter()
                .zip(&self.spans)
                .map(|((_, _, width), span)| (*width, span.url.as_deref())),
            line_height,
        );
        result.size = Size::new(total_width, line_height);
        Ok(result)
    }
}

/// A URI link placed on a page, with its rectangle in PDF user space.
#[derive(Clone, Debug, PartialEq)]
pub struct LinkAnnotation {
    /// 1-indexed page the link is on.
    pub page: usize,
    /// Left, bottom, right and top edge in points, measured from the bottom-left page corner.
    pub rect: [f64; 4],
    pub url: String,
}

/// Converts a link span drawn at `origin` (top-left page coordinates) into a PDF rectangle.
pub fn link_rect(page_height: Mm, origin: Position, link: &LinkSpan) -> [f64; 4] {
    let left = to_points(origin.x + link.x);
    let top = to_points(page_height - origin.y);
    [
        left,
        top - to_points(link.height),
        left + to_points(link.width),
        top,
    ]
}

/// A page-level bookmark collected while rendering.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutlineEntry {
    /// Bookmark title.
    pub title: String,
    /// 1-indexed page the entry first appeared on, if it was rendered.
    pub page: Option<usize>,
}

/// Shared page counter, outline, link and pagination log for one render pass.
///
/// The page decorator advances the counter before any element of a page is rendered, so
/// elements observe the page they are drawn on.
#[derive(Clone, Default)]
pub struct PageTracker {
    page: Rc<Cell<usize>>,
    outline: Rc<RefCell<Vec<OutlineEntry>>>,
    links: Rc<RefCell<Vec<LinkAnnotation>>>,
    labels: Rc<RefCell<Vec<String>>>,
}

impl PageTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves to the next page and returns its 1-indexed number.
    pub fn advance_page(&self) -> usize {
        let page = self.page.get() + 1;
        self.page.set(page);
        page
    }

    /// Number of pages started so far.
    pub fn page_count(&self) -> usize {
        self.page.get()
    }

    fn register(&self, title: String) -> usize {
        let mut outline = self.outline.borrow_mut();
        outline.push(OutlineEntry { title, page: None });
        outline.len() - 1
    }

    fn record(&self, slot: usize) {
        let page = self.page.get();
        if let Some(entry) = self.outline.borrow_mut().get_mut(slot) {
            entry.page.get_or_insert(page);
        }
    }

    /// Snapshot of the outline entries registered so far.
    pub fn outline(&self) -> Vec<OutlineEntry> {
        self.outline.borrow().clone()
    }

    /// Stores a link placed on the current page.
    pub fn record_link(&self, link: LinkAnnotation) {
        self.links.borrow_mut().push(link);
    }

    /// Links placed so far, in page order.
    pub fn links(&self) -> Vec<LinkAnnotation> {
        self.links.borrow().clone()
    }

    /// Remembers the pagination text drawn on the current page.
    pub fn record_label(&self, label: String) {
        self.labels.borrow_mut().push(label);
    }

    /// Pagination text drawn so far, one entry per page.
    pub fn labels(&self) -> Vec<String> {
        self.labels.borrow().clone()
    }
}

/// Wraps an element and records the page it first renders content on.
pub struct Outlined<E: Element> {
    element: E,
    tracker: PageTracker,
    slot: usize,
}

impl<E: Element> Outlined<E> {
    pub fn new(element: E, title: impl Into<String>, tracker: &PageTracker) -> Self {
        let slot = tracker.register(title.into());
        Self {
            element,
            tracker: tracker.clone(),
            slot,
        }
    }
}

impl<E: Element> Element for Outlined<E> {
    fn render(
        &mut self,
        context: &genpdf::Context,
        area: render::Area<'_>,
        style: Style,
    ) -> Result<RenderResult, Error> {
        let result = self.element.render(context, area, style)?;
        if result.size.height > Mm::default() {
            self.tracker.record(self.slot);
        }
        Ok(result)
    }
}
