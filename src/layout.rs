//! Bridge between the document model and the `genpdf` layout engine.
//!
//! [`render`] converts a [`Document`] into `genpdf` elements and lets `genpdf` paginate them.
//! Page geometry becomes a [`PageDecorator`] that applies margins, reserves the header and footer
//! bands and draws page notes and pagination into them. Rendering repeats until the page count
//! is stable, so the pagination can print "page of total". Links inside page notes are
//! collected with their page rectangles for [`crate::metadata::finalize`].

use std::collections::BTreeMap;
use std::io;

use genpdf::elements::{LinearLayout, Paragraph, StyledElement, TableLayout};
use genpdf::error::{Error, ErrorKind};
use genpdf::fonts::{Font, FontData, FontFamily};
use genpdf::render::Area;
use genpdf::style::Style;
use genpdf::{Alignment, Element, Margins, Mm, PageDecorator, Position, RenderResult, Size};
use log::{debug, info, warn};

use crate::elements::{
    link_rect, mm_from_f64, mm_to_f64, points, HorizontalRule, IndentedBullet, LinkAnnotation,
    OutlineEntry, Outlined, PageTracker, UnderlinedLine, VerticalSpace,
};
use crate::error::RenderError;
use crate::fonts::FontLibrary;
use crate::model::{
    BlockContainer, ContentBlock, Document, HorizontalAlignment, List, PageGeometry, PageNote,
    Pagination, Section, Text,
};
use crate::richtext;
use crate::style::{StyleRef, TextStyle};

/// Resolution used when turning width fractions into integer column weights.
const WEIGHT_SCALE: f64 = 1000.0;

/// Tolerance below which a row of fractions counts as filling the full width.
const FULL_WIDTH_EPSILON: f64 = 1e-6;

/// Upper bound on layout passes while waiting for the page count to settle.
const MAX_LAYOUT_PASSES: usize = 3;

/// Output of a successful render.
#[derive(Clone, Debug)]
pub struct RenderedDocument {
    /// The PDF bytes as produced by `genpdf`.
    pub bytes: Vec<u8>,
    /// Number of pages emitted.
    pub page_count: usize,
    /// Outline entries with the page each one starts on.
    pub outline: Vec<OutlineEntry>,
    /// Links placed inside page notes.
    pub links: Vec<LinkAnnotation>,
    /// Pagination text drawn on each page, in page order.
    pub pagination_labels: Vec<String>,
}

/// Names of all font families referenced by the document's styles, body family first.
pub fn font_families(document: &Document) -> Vec<&str> {
    let mut names = Vec::new();
    if let Some(body) = document.styles().resolve(document.body_style()) {
        names.push(body.font().family());
    }
    for style in document.styles().iter() {
        let family = style.font().family();
        if !names.contains(&family) {
            names.push(family);
        }
    }
    names
}

/// Loads every font family the document needs.
pub fn load_fonts(document: &Document) -> Result<FontLibrary, RenderError> {
    FontLibrary::load(font_families(document))
}

/// Lays out and renders `document` with the fonts in `fonts`.
///
/// The first pass runs without a page total. Later passes feed the previous page count into the
/// pagination until a pass reproduces it.
pub fn render(document: &Document, fonts: &FontLibrary) -> Result<RenderedDocument, RenderError> {
    let mut total_pages = None;
    let mut passes = 0;
    loop {
        let rendered = render_pass(document, fonts, total_pages)?;
        passes += 1;
        let settled = total_pages == Some(rendered.page_count);
        if settled || passes >= MAX_LAYOUT_PASSES {
            if !settled {
                warn!(
                    "Page count did not settle after {} passes, last pass produced {} page(s)",
                    passes, rendered.page_count
                );
            }
            info!(
                "Rendered {} page(s), {} bytes",
                rendered.page_count,
                rendered.bytes.len()
            );
            return Ok(rendered);
        }
        debug!(
            "Layout pass {} produced {} page(s)",
            passes, rendered.page_count
        );
        total_pages = Some(rendered.page_count);
    }
}

fn render_pass(
    document: &Document,
    fonts: &FontLibrary,
    total_pages: Option<usize>,
) -> Result<RenderedDocument, RenderError> {
    let body = resolve_style(document, document.body_style())?;
    let default_family = family_data(fonts, body.font().family())?;

    let mut pdf = genpdf::Document::new(default_family);
    pdf.set_title(document.metadata().title.as_str());
    pdf.set_minimal_conformance();
    pdf.set_font_size(body.size());

    let (width_mm, height_mm) = document.geometry().paper.dimensions_mm();
    pdf.set_paper_size(Size::new(mm_from_f64(width_mm), mm_from_f64(height_mm)));

    let mut families = BTreeMap::new();
    for (name, family) in fonts.iter() {
        if name != body.font().family() {
            families.insert(name.to_owned(), pdf.add_font_family(family.clone()));
        }
    }

    let tracker = PageTracker::new();
    let factory = ElementFactory {
        document,
        families,
        tracker: tracker.clone(),
    };

    let decorator = factory.page_decorator(total_pages)?;
    pdf.set_page_decorator(decorator);

    let mut root = LinearLayout::vertical();
    for block in document.blocks() {
        factory.push_block(&mut root, block)?;
    }
    pdf.push(root);

    let mut bytes = Vec::new();
    pdf.render(&mut bytes)?;

    Ok(RenderedDocument {
        bytes,
        page_count: tracker.page_count(),
        outline: tracker.outline(),
        links: tracker.links(),
        pagination_labels: tracker.labels(),
    })
}

fn resolve_style<'d>(document: &'d Document, style: &StyleRef) -> Result<&'d TextStyle, RenderError> {
    document
        .styles()
        .resolve(style)
        .ok_or_else(|| RenderError::UnknownStyle(style.name().to_owned()))
}

fn family_data(fonts: &FontLibrary, name: &str) -> Result<FontFamily<FontData>, RenderError> {
    fonts.get(name).cloned().ok_or_else(|| RenderError::FontLoad {
        family: name.to_owned(),
        source: Error::new(
            format!("Font family '{}' was not loaded before rendering", name),
            io::Error::new(io::ErrorKind::NotFound, "font family not loaded"),
        ),
    })
}

fn genpdf_alignment(alignment: HorizontalAlignment) -> Alignment {
    match alignment {
        HorizontalAlignment::Left => Alignment::Left,
        HorizontalAlignment::Center => Alignment::Center,
        HorizontalAlignment::Right => Alignment::Right,
        HorizontalAlignment::Justified => {
            warn!("Justified text is not supported by the layout engine, using left alignment");
            Alignment::Left
        }
    }
}

/// Converts width fractions into integer weights, adding a filler column when they sum to less
/// than the full width.
fn column_weights(fractions: &[f64]) -> (Vec<usize>, bool) {
    let to_weight = |fraction: f64| ((fraction * WEIGHT_SCALE).round() as usize).max(1);
    let mut weights: Vec<usize> = fractions.iter().copied().map(to_weight).collect();
    let remainder = 1.0 - fractions.iter().sum::<f64>();
    let filler = remainder > FULL_WIDTH_EPSILON;
    if filler {
        weights.push(to_weight(remainder));
    }
    (weights, filler)
}

struct ElementFactory<'d> {
    document: &'d Document,
    families: BTreeMap<String, FontFamily<Font>>,
    tracker: PageTracker,
}

impl<'d> ElementFactory<'d> {
    fn style(&self, style: &StyleRef) -> Result<Style, RenderError> {
        let text_style = resolve_style(self.document, style)?;
        let mut converted = text_style.to_genpdf_style();
        if let Some(family) = self.families.get(text_style.font().family()) {
            converted.set_font_family(family.clone());
        }
        Ok(converted)
    }

    fn body_style(&self) -> Result<Style, RenderError> {
        self.style(self.document.body_style())
    }

    fn push_block(&self, layout: &mut LinearLayout, block: &ContentBlock) -> Result<(), RenderError> {
        match block {
            ContentBlock::PlainText(text) | ContentBlock::StyledText(text) => {
                self.push_text(layout, text)?;
            }
            ContentBlock::List(list) => layout.push(self.list(list)?),
            ContentBlock::Section(section) => layout.push(self.section(section)?),
            ContentBlock::Space(height) => layout.push(VerticalSpace::new(points(*height))),
            ContentBlock::LineSeparator(separator) => layout.push(HorizontalRule::new(
                separator.color,
                points(separator.width),
            )),
        }
        Ok(())
    }

    fn push_text(&self, layout: &mut LinearLayout, text: &Text) -> Result<(), RenderError> {
        let style = match text.style() {
            Some(style) => self.style(style)?,
            None => self.body_style()?,
        };

        let mut paragraph = Paragraph::new(text.content());
        paragraph.set_alignment(genpdf_alignment(text.alignment()));
        let element = paragraph.styled(style);

        if text.is_outline() {
            layout.push(Outlined::new(element, text.content(), &self.tracker));
        } else {
            layout.push(element);
        }
        Ok(())
    }

    fn list(&self, list: &List) -> Result<StyledElement<LinearLayout>, RenderError> {
        let indentation = list.indentation();
        let mut layout = LinearLayout::vertical();
        for item in list.items() {
            layout.push(IndentedBullet::new(
                Paragraph::new(item.content()),
                item.symbol(),
                points(indentation.pre),
                points(indentation.post),
            ));
        }
        Ok(layout.styled(self.body_style()?))
    }

    fn section(&self, section: &Section) -> Result<TableLayout, RenderError> {
        let fractions: Vec<f64> = section
            .columns()
            .iter()
            .map(|column| column.width().value())
            .collect();
        let (weights, filler) = column_weights(&fractions);

        let mut table = TableLayout::new(weights);
        let mut row = table.row();
        for column in section.columns() {
            let mut cell = LinearLayout::vertical();
            for block in column.blocks() {
                self.push_block(&mut cell, block)?;
            }
            row.push_element(cell);
        }
        if filler {
            row.push_element(LinearLayout::vertical());
        }
        row.push()?;
        Ok(table)
    }

    fn note(&self, note: &PageNote) -> Result<NoteBand, RenderError> {
        let style = self.style(note.style())?;
        let lines = note
            .lines()
            .iter()
            .map(|spans| richtext::styled_spans(spans, style))
            .collect();
        Ok(NoteBand { lines, style })
    }

    fn page_decorator(&self, total_pages: Option<usize>) -> Result<CvPageDecorator, RenderError> {
        let header = self.document.header().map(|note| self.note(note)).transpose()?;
        let footer = self.document.footer().map(|note| self.note(note)).transpose()?;
        let pagination = match self.document.pagination() {
            Some(pagination) => Some(PaginationBand {
                template: pagination.clone(),
                style: self.style(pagination.style())?,
            }),
            None => None,
        };

        Ok(CvPageDecorator::new(
            self.document.geometry(),
            self.tracker.clone(),
            header,
            footer,
            pagination,
            total_pages,
        ))
    }
}

struct NoteBand {
    lines: Vec<Vec<richtext::StyledSpan>>,
    style: Style,
}

struct PaginationBand {
    template: Pagination,
    style: Style,
}

impl PaginationBand {
    fn label(&self, page: usize, total: Option<usize>) -> String {
        self.template.format(page, total)
    }

    fn element(&self, label: String) -> StyledElement<Paragraph> {
        let mut paragraph = Paragraph::new(label);
        paragraph.set_alignment(Alignment::Right);
        paragraph.styled(self.style)
    }
}

/// Header and footer band weights: note on the left, pagination on the right.
const FOOTER_WEIGHTS: [usize; 2] = [3, 1];

/// Placement of the bands and the content on one page.
///
/// Band origins are measured from the top-left page corner. The content offset and height are
/// relative to the area inside the margins.
#[derive(Clone, Copy, Debug)]
struct BandLayout {
    header: Option<Position>,
    footer: Option<Position>,
    content_offset: Mm,
    content_height: Mm,
}

fn ensure_fits(result: &RenderResult) -> Result<(), Error> {
    if result.has_more {
        return Err(Error::new(
            "Page note does not fit into the reserved band",
            ErrorKind::PageSizeExceeded,
        ));
    }
    Ok(())
}

struct CvPageDecorator {
    tracker: PageTracker,
    margins: Margins,
    origin: Position,
    page_height: Mm,
    band_height: Mm,
    header_space: Mm,
    footer_space: Mm,
    header: Option<NoteBand>,
    footer: Option<NoteBand>,
    pagination: Option<PaginationBand>,
    total_pages: Option<usize>,
}

impl CvPageDecorator {
    fn new(
        geometry: &PageGeometry,
        tracker: PageTracker,
        header: Option<NoteBand>,
        footer: Option<NoteBand>,
        pagination: Option<PaginationBand>,
        total_pages: Option<usize>,
    ) -> Self {
        let margins = geometry.margins;
        let (_, height_mm) = geometry.paper.dimensions_mm();
        Self {
            tracker,
            margins: Margins::trbl(
                points(margins.top),
                points(margins.right),
                points(margins.bottom),
                points(margins.left),
            ),
            origin: Position::new(points(margins.left), points(margins.top)),
            page_height: mm_from_f64(height_mm),
            band_height: points(geometry.note_height),
            header_space: points(geometry.header_space),
            footer_space: points(geometry.footer_space),
            header,
            footer,
            pagination,
            total_pages,
        }
    }

    /// Splits the `available` height inside the margins into bands and content.
    fn band_layout(&self, available: Mm) -> Result<BandLayout, Error> {
        let mut remaining = available;
        let mut content_offset = Mm::default();

        let header = match &self.header {
            Some(_) => {
                let reserved = self.band_height + self.header_space;
                if reserved > remaining {
                    return Err(Error::new(
                        "Header band exceeds available space",
                        ErrorKind::InvalidData,
                    ));
                }
                remaining = remaining - reserved;
                content_offset = reserved;
                Some(self.origin)
            }
            None => None,
        };

        let footer = if self.footer.is_some() || self.pagination.is_some() {
            let reserved = self.band_height + self.footer_space;
            if reserved > remaining {
                return Err(Error::new(
                    "Footer band exceeds available space",
                    ErrorKind::InvalidData,
                ));
            }
            let top = self.origin.y + content_offset + remaining - self.band_height;
            remaining = remaining - reserved;
            Some(Position::new(self.origin.x, top))
        } else {
            None
        };

        Ok(BandLayout {
            header,
            footer,
            content_offset,
            content_height: remaining,
        })
    }

    /// Draws the lines of `note` from the top of `area` and records its links.
    fn draw_note(
        &self,
        context: &genpdf::Context,
        note: &NoteBand,
        mut area: Area<'_>,
        style: Style,
        origin: Position,
        page: usize,
    ) -> Result<(), Error> {
        let mut top = origin.y;
        for spans in &note.lines {
            let mut line = UnderlinedLine::new(spans.clone());
            let result = line.render(context, area.clone(), style.and(note.style))?;
            ensure_fits(&result)?;
            for link in line.links() {
                self.tracker.record_link(LinkAnnotation {
                    page,
                    rect: link_rect(self.page_height, Position::new(origin.x, top), link),
                    url: link.url.clone(),
                });
            }
            area.add_offset(Position::new(0, result.size.height));
            top += result.size.height;
        }
        Ok(())
    }
}

impl PageDecorator for CvPageDecorator {
    fn decorate_page<'a>(
        &mut self,
        context: &genpdf::Context,
        mut area: Area<'a>,
        style: Style,
    ) -> Result<Area<'a>, Error> {
        let page = self.tracker.advance_page();
        area.add_margins(self.margins);
        let bands = self.band_layout(area.size().height)?;

        if let (Some(header), Some(origin)) = (&self.header, bands.header) {
            let mut band = area.clone();
            band.set_height(self.band_height);
            self.draw_note(context, header, band, style, origin, page)?;
        }

        if let Some(origin) = bands.footer {
            let mut band = area.clone();
            band.add_offset(Position::new(0, origin.y - self.origin.y));
            band.set_height(self.band_height);
            let mut columns = band.split_horizontally(&FOOTER_WEIGHTS).into_iter();
            let (left, right) = match (columns.next(), columns.next()) {
                (Some(left), Some(right)) => (left, right),
                _ => {
                    return Err(Error::new(
                        "Footer band could not be split",
                        ErrorKind::InvalidData,
                    ))
                }
            };

            if let Some(footer) = &self.footer {
                self.draw_note(context, footer, left, style, origin, page)?;
            }
            if let Some(pagination) = &self.pagination {
                let label = pagination.label(page, self.total_pages);
                self.tracker.record_label(label.clone());
                let result = pagination.element(label).render(context, right, style)?;
                ensure_fits(&result)?;
            }
        }

        area.add_offset(Position::new(0, bands.content_offset));
        area.set_height(bands.content_height);
        debug!(
            "Decorated page {} with {:.1}mm of content height",
            page,
            mm_to_f64(area.size().height)
        );
        Ok(area)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PaperSize;
    use crate::style::FontFace;

    #[test]
    fn weights_keep_fractions_and_fill_the_remainder() {
        assert_eq!(column_weights(&[0.6, 0.4]), (vec![600, 400], false));
        assert_eq!(
            column_weights(&[0.25, 0.25, 0.25, 0.25]),
            (vec![250, 250, 250, 250], false)
        );
        assert_eq!(column_weights(&[0.5]), (vec![500, 500], true));
        assert_eq!(column_weights(&[0.8, 0.8]), (vec![800, 800], false));
        assert_eq!(column_weights(&[0.5, 0.25]), (vec![500, 250, 250], true));
    }

    #[test]
    fn thirds_fill_the_width_without_a_filler() {
        let third = 1.0 / 3.0;
        assert_eq!(
            column_weights(&[third, third, third]),
            (vec![333, 333, 333], false)
        );
    }

    #[test]
    fn justified_text_falls_back_to_left() {
        assert!(matches!(
            genpdf_alignment(HorizontalAlignment::Justified),
            Alignment::Left
        ));
        assert!(matches!(
            genpdf_alignment(HorizontalAlignment::Right),
            Alignment::Right
        ));
    }

    fn band(lines: usize) -> NoteBand {
        NoteBand {
            lines: vec![Vec::new(); lines],
            style: Style::new(),
        }
    }

    fn decorator(
        geometry: PageGeometry,
        header: Option<NoteBand>,
        footer: Option<NoteBand>,
    ) -> CvPageDecorator {
        CvPageDecorator::new(&geometry, PageTracker::new(), header, footer, None, None)
    }

    fn assert_points(actual: Mm, expected: f64) {
        let actual = crate::elements::to_points(actual);
        assert!(
            (actual - expected).abs() < 1e-6,
            "expected {expected}pt, got {actual}pt"
        );
    }

    #[test]
    fn footer_band_sits_at_the_bottom_of_the_content_area() {
        let geometry = PageGeometry::default();
        let page = crate::elements::to_points(mm_from_f64(297.0));
        let available = page - 64.0;

        let decorator = decorator(geometry, None, Some(band(1)));
        let bands = decorator
            .band_layout(points(available))
            .expect("band layout");

        assert!(bands.header.is_none());
        assert_points(bands.content_offset, 0.0);
        assert_points(bands.content_height, available - 24.0 - 4.0);
        let footer = bands.footer.expect("footer band");
        assert_points(footer.x, 32.0);
        assert_points(footer.y, 32.0 + available - 24.0);
    }

    #[test]
    fn header_band_pushes_content_down() {
        let geometry = PageGeometry {
            paper: PaperSize::Letter,
            header_space: 6.0,
            ..PageGeometry::default()
        };
        let page = crate::elements::to_points(mm_from_f64(279.4));
        assert!((page - 792.0).abs() < 1e-6);
        let available = page - 64.0;

        let decorator = decorator(geometry, Some(band(1)), Some(band(1)));
        let bands = decorator
            .band_layout(points(available))
            .expect("band layout");

        let header = bands.header.expect("header band");
        assert_points(header.x, 32.0);
        assert_points(header.y, 32.0);
        assert_points(bands.content_offset, 30.0);
        assert_points(bands.content_height, available - 30.0 - 28.0);
        let footer = bands.footer.expect("footer band");
        assert_points(footer.y, 32.0 + available - 24.0);
    }

    #[test]
    fn pagination_alone_reserves_the_footer_band() {
        let document = Document::new(
            PageGeometry::default(),
            TextStyle::new("Body", FontFace::new("Serif"), 10),
        )
        .expect("document");
        let body = document.body_style().clone();
        let decorator = CvPageDecorator::new(
            &PageGeometry::default(),
            PageTracker::new(),
            None,
            None,
            Some(PaginationBand {
                template: Pagination::new("{page} of {total}", &body),
                style: Style::new(),
            }),
            Some(3),
        );
        let bands = decorator.band_layout(points(500.0)).expect("band layout");

        assert!(bands.footer.is_some());
        assert_points(bands.content_height, 500.0 - 28.0);
        let Some(pagination) = &decorator.pagination else {
            panic!("pagination band missing");
        };
        assert_eq!(pagination.label(3, decorator.total_pages), "3 of 3");
    }

    #[test]
    fn bands_taller_than_the_page_are_rejected() {
        let geometry = PageGeometry {
            paper: PaperSize::Custom {
                width_mm: 100.0,
                height_mm: 40.0,
            },
            note_height: 60.0,
            ..PageGeometry::default()
        };
        let available = points(crate::elements::to_points(mm_from_f64(40.0)) - 64.0);

        let footer_only = decorator(geometry, None, Some(band(1)));
        let Err(err) = footer_only.band_layout(available) else {
            panic!("oversized footer band unexpectedly fit");
        };
        assert!(err.to_string().contains("Footer band"), "{err}");

        let header_only = decorator(geometry, Some(band(1)), None);
        let Err(err) = header_only.band_layout(available) else {
            panic!("oversized header band unexpectedly fit");
        };
        assert!(err.to_string().contains("Header band"), "{err}");
    }

    #[test]
    fn font_families_start_with_the_body_family() {
        let mut document = Document::new(
            PageGeometry::default(),
            TextStyle::new("Body", FontFace::new("Serif"), 10),
        )
        .expect("document");
        document
            .register_style(TextStyle::new("Code", FontFace::new("Mono"), 9))
            .expect("code style");
        document
            .register_style(TextStyle::new("Heading", FontFace::new("Serif").bold(), 14))
            .expect("heading style");

        assert_eq!(font_families(&document), vec!["Serif", "Mono"]);
    }

    #[test]
    fn unknown_styles_fail_the_render() {
        let mut other = Document::new(
            PageGeometry::default(),
            TextStyle::new("Body", FontFace::new("Serif"), 10),
        )
        .expect("other document");
        let foreign = other
            .register_style(TextStyle::new("Foreign", FontFace::new("Serif"), 10))
            .expect("foreign style");

        let mut document = Document::new(
            PageGeometry::default(),
            TextStyle::new("Body", FontFace::new("Serif"), 10),
        )
        .expect("document");
        document.set_pagination(Pagination::new("{page}", &foreign));

        let factory = ElementFactory {
            document: &document,
            families: BTreeMap::new(),
            tracker: PageTracker::new(),
        };
        let Err(err) = factory.page_decorator(None) else {
            panic!("foreign style unexpectedly resolved");
        };
        assert!(matches!(err, RenderError::UnknownStyle(name) if name == "Foreign"));
    }
}
