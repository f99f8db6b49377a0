use std::num::NonZeroUsize;

use cv_document::assembler::{add_plain_text, add_space, Assembler, ColumnSplit};
use cv_document::fonts::{self, FontLibrary, DEFAULT_FONT_FAMILY_NAME};
use cv_document::layout::{self, RenderedDocument};
use cv_document::metadata;
use cv_document::model::{
    ContentBlock, Document, Metadata, PageGeometry, PageNote, Pagination, Permissions, Text,
};
use cv_document::RenderError;
use cv_document::output::{generate, OutputTarget};
use cv_document::richtext::Span;
use cv_document::style::{FontFace, TextStyle};
use genpdf::style::Color;
use sha2::{Digest, Sha256};

const SKIP_REASON: &str =
    "fonts missing. Set CV_FONTS_DIR or install the Liberation Serif fonts.";

fn sample_metadata() -> Metadata {
    Metadata {
        title: "Curriculum Vitae of Jane Doe".to_string(),
        author: "Jane Doe".to_string(),
        subject: "Professional profile for rendering tests".to_string(),
        keywords: vec!["CV".to_string(), "Résumé".to_string()],
        permissions: Permissions::default(),
    }
}

fn sample_document(paragraphs: usize) -> Document {
    let face = || FontFace::new(DEFAULT_FONT_FAMILY_NAME);
    let mut document = Document::new(
        PageGeometry::default(),
        TextStyle::new("Body", face(), 10),
    )
    .expect("document");
    document.set_metadata(sample_metadata());

    let heading = document
        .register_style(TextStyle::new("Heading", face().bold(), 14))
        .expect("heading");
    let period = document
        .register_style(TextStyle::new("Period", face(), 12))
        .expect("period");
    let footer = document
        .register_style(TextStyle::new("Footer", face().italic(), 8))
        .expect("footer");

    document.set_footer(PageNote::new(&footer).with_line(vec![
        Span::new("Rendered by "),
        Span::new("cv_document")
            .link("https://github.com/philprime/cv", Color::Rgb(0, 0, 255)),
    ]));
    let body = document.body_style().clone();
    document.set_pagination(Pagination::new("{page} of {total}", &body));

    let assembler = Assembler::new(&heading);
    assembler.add_header(&mut document, "Profile");
    for index in 0..paragraphs {
        add_plain_text(
            &mut document,
            format!("Paragraph {index} describes a long and varied career in some detail."),
        );
    }

    assembler.add_header(&mut document, "Experience");
    assembler.add_two_column_entry(
        &mut document,
        vec![ContentBlock::text(Text::styled("Example GmbH", &heading))],
        vec![ContentBlock::text(Text::styled("2020 \u{2014} 2024", &period))],
        ColumnSplit::new(0.6).expect("split"),
    );
    assembler.add_bullet_list(&mut document, ["Built things", "Shipped things"]);
    add_space(&mut document, 8.0);

    assembler.add_header(&mut document, "Languages");
    assembler.add_multi_column_grid(
        &mut document,
        &["German (Native)", "English (Fluent)"][..],
        NonZeroUsize::new(4).expect("columns"),
    );
    document
}

fn try_render(document: &Document) -> Option<Result<RenderedDocument, RenderError>> {
    if !fonts::family_available(DEFAULT_FONT_FAMILY_NAME) {
        return None;
    }
    let library: FontLibrary = layout::load_fonts(document).expect("load fonts");
    Some(layout::render(document, &library))
}

fn render_sample(paragraphs: usize) -> Option<RenderedDocument> {
    try_render(&sample_document(paragraphs)).map(|result| result.expect("render sample pdf"))
}

fn finalize_sample(rendered: &RenderedDocument) -> Vec<u8> {
    metadata::finalize(
        &rendered.bytes,
        &sample_metadata(),
        &rendered.outline,
        &rendered.links,
    )
    .expect("finalize")
}

fn scrub_pdf(bytes: &[u8]) -> Vec<u8> {
    fn scrub_segment(data: &mut [u8], tag: &[u8], terminator: u8) {
        let mut index = 0;
        while index + tag.len() < data.len() {
            if data[index..].starts_with(tag) {
                let mut cursor = index + tag.len();
                while cursor < data.len() {
                    let byte = data[cursor];
                    if byte == terminator {
                        break;
                    }
                    if terminator == b')' {
                        data[cursor] = b'0';
                    } else if !matches!(byte, b'<' | b'>' | b' ' | b'\n' | b'\r' | b'\t') {
                        data[cursor] = b'0';
                    }
                    cursor += 1;
                }
                index = cursor;
            } else {
                index += 1;
            }
        }
    }

    let mut normalized = bytes.to_vec();
    scrub_segment(&mut normalized, b"/CreationDate(", b')');
    scrub_segment(&mut normalized, b"/ModDate(", b')');
    scrub_segment(&mut normalized, b"/ID[", b']');
    scrub_segment(&mut normalized, b"/Producer(", b')');
    normalized
}

/// Drops the per-run trailer and info entries before hashing.
fn strip_volatile_entries(bytes: &[u8]) -> Vec<u8> {
    let mut document = lopdf::Document::load_mem(bytes).expect("parse pdf");
    document.trailer.remove(b"ID");
    if let Ok(id) = document.trailer.get(b"Info").and_then(lopdf::Object::as_reference) {
        if let Ok(info) = document
            .get_object_mut(id)
            .and_then(lopdf::Object::as_dict_mut)
        {
            info.remove(b"CreationDate");
            info.remove(b"ModDate");
            info.remove(b"Producer");
        }
    }
    let mut buffer = Vec::new();
    document.save_to(&mut buffer).expect("save pdf");
    buffer
}

fn normalized_hash(bytes: &[u8]) -> [u8; 32] {
    let normalized = scrub_pdf(bytes);
    let digest = Sha256::digest(&normalized);
    digest.into()
}

#[test]
fn renders_non_empty_output() {
    let Some(rendered) = render_sample(3) else {
        eprintln!("Skipping renders_non_empty_output: {SKIP_REASON}");
        return;
    };
    assert!(rendered.bytes.starts_with(b"%PDF"));
    assert_eq!(rendered.page_count, 1);
}

#[test]
fn rendering_is_deterministic() {
    let (Some(first), Some(second)) = (render_sample(3), render_sample(3)) else {
        eprintln!("Skipping rendering_is_deterministic: {SKIP_REASON}");
        return;
    };

    assert_eq!(first.bytes.len(), second.bytes.len(), "PDF sizes should match");
    assert_eq!(
        normalized_hash(&first.bytes),
        normalized_hash(&second.bytes),
        "PDF renders must be deterministic after metadata normalization"
    );

    let finalize =
        |rendered: &RenderedDocument| strip_volatile_entries(&finalize_sample(rendered));
    assert_eq!(
        normalized_hash(&finalize(&first)),
        normalized_hash(&finalize(&second)),
        "finalized PDFs must be deterministic"
    );
}

#[test]
fn metadata_round_trips_through_rendered_document() {
    let Some(rendered) = render_sample(3) else {
        eprintln!("Skipping metadata_round_trips_through_rendered_document: {SKIP_REASON}");
        return;
    };
    let bytes = finalize_sample(&rendered);
    let info = metadata::read_document_info(&bytes).expect("read info");

    assert_eq!(info.title.as_deref(), Some("Curriculum Vitae of Jane Doe"));
    assert_eq!(info.author.as_deref(), Some("Jane Doe"));
    assert_eq!(
        info.subject.as_deref(),
        Some("Professional profile for rendering tests")
    );
    assert_eq!(info.keywords.as_deref(), Some("CV, Résumé"));
}

#[test]
fn long_documents_paginate_and_keep_outline_pages() {
    let Some(rendered) = render_sample(150) else {
        eprintln!("Skipping long_documents_paginate_and_keep_outline_pages: {SKIP_REASON}");
        return;
    };
    assert!(rendered.page_count >= 2, "150 paragraphs should not fit one page");

    let pages: Vec<usize> = rendered
        .outline
        .iter()
        .map(|entry| entry.page.expect("every header is rendered"))
        .collect();
    assert_eq!(pages.len(), 3);
    assert_eq!(pages[0], 1);
    assert!(pages.windows(2).all(|pair| pair[0] <= pair[1]));
    assert!(pages[2] > 1);
    assert!(pages[2] <= rendered.page_count);

    let bytes = finalize_sample(&rendered);
    let outline = metadata::read_outline(&bytes).expect("read outline");
    let titles: Vec<&str> = outline.iter().map(|(title, _)| title.as_str()).collect();
    assert_eq!(titles, vec!["Profile", "Experience", "Languages"]);
}

#[test]
fn pagination_prints_the_final_page_total() {
    let Some(rendered) = render_sample(150) else {
        eprintln!("Skipping pagination_prints_the_final_page_total: {SKIP_REASON}");
        return;
    };
    let total = rendered.page_count;
    assert!(total >= 2);

    let expected: Vec<String> = (1..=total).map(|page| format!("{page} of {total}")).collect();
    assert_eq!(rendered.pagination_labels, expected);
}

#[test]
fn footer_links_are_clickable_on_every_page() {
    let Some(rendered) = render_sample(150) else {
        eprintln!("Skipping footer_links_are_clickable_on_every_page: {SKIP_REASON}");
        return;
    };
    assert_eq!(rendered.links.len(), rendered.page_count);

    let links = metadata::read_links(&finalize_sample(&rendered)).expect("read links");
    let pages: Vec<usize> = links.iter().map(|link| link.page).collect();
    assert_eq!(pages, (1..=rendered.page_count).collect::<Vec<_>>());
    for link in &links {
        assert_eq!(link.url, "https://github.com/philprime/cv");
        let [left, bottom, right, top] = link.rect;
        assert!(left >= 32 && right > left, "{:?}", link.rect);
        assert!(bottom >= 0 && top > bottom && top < 200, "{:?}", link.rect);
    }
}

#[test]
fn header_notes_render_above_the_content() {
    let mut document = sample_document(3);
    let header_style = document
        .register_style(TextStyle::new(
            "Header",
            FontFace::new(DEFAULT_FONT_FAMILY_NAME),
            8,
        ))
        .expect("header style");
    document.set_header(PageNote::new(&header_style).with_line(vec![
        Span::new("Jane Doe, "),
        Span::new("jane@example.com").link("mailto:jane@example.com", Color::Rgb(0, 0, 255)),
    ]));

    let Some(result) = try_render(&document) else {
        eprintln!("Skipping header_notes_render_above_the_content: {SKIP_REASON}");
        return;
    };
    let rendered = result.expect("render with header");
    assert_eq!(rendered.page_count, 1);

    let header_link = rendered
        .links
        .iter()
        .find(|link| link.url == "mailto:jane@example.com")
        .expect("header link");
    let footer_link = rendered
        .links
        .iter()
        .find(|link| link.url == "https://github.com/philprime/cv")
        .expect("footer link");
    assert!(header_link.rect[1] > footer_link.rect[3]);
    assert!(header_link.rect[3] > 700.0, "{:?}", header_link.rect);
}

#[test]
fn footer_notes_taller_than_the_band_fail_the_render() {
    let mut document = sample_document(1);
    let footer_style = document
        .register_style(TextStyle::new(
            "Tall Footer",
            FontFace::new(DEFAULT_FONT_FAMILY_NAME),
            8,
        ))
        .expect("footer style");
    document.set_footer(
        PageNote::new(&footer_style)
            .with_line(vec![Span::new("First line")])
            .with_line(vec![Span::new("Second line")])
            .with_line(vec![Span::new("Third line")]),
    );

    let Some(result) = try_render(&document) else {
        eprintln!("Skipping footer_notes_taller_than_the_band_fail_the_render: {SKIP_REASON}");
        return;
    };
    let Err(RenderError::Layout(source)) = result else {
        panic!("a three-line footer should not fit a 24pt band");
    };
    assert!(
        source.to_string().contains("does not fit into the reserved band"),
        "{source}"
    );
}

#[test]
fn generate_writes_the_finished_document() {
    if !fonts::family_available(DEFAULT_FONT_FAMILY_NAME) {
        eprintln!("Skipping generate_writes_the_finished_document: {SKIP_REASON}");
        return;
    }
    let dir = tempfile::tempdir().expect("temp dir");
    let target = OutputTarget::new(dir.path(), "Jane Doe CV.pdf");

    let path = generate(&sample_document(3), &target).expect("generate");

    assert_eq!(path, dir.path().join("Jane Doe CV.pdf"));
    let bytes = std::fs::read(&path).expect("read output");
    let info = metadata::read_document_info(&bytes).expect("read info");
    assert_eq!(info.author.as_deref(), Some("Jane Doe"));
}

#[test]
fn generate_fails_without_touching_a_missing_directory() {
    let dir = tempfile::tempdir().expect("temp dir");
    let missing = dir.path().join("missing");
    let target = OutputTarget::new(&missing, "cv.pdf");

    let result = generate(&sample_document(1), &target);

    assert!(matches!(
        result,
        Err(cv_document::GenerateError::PathConstruction { .. })
    ));
    assert!(!missing.join("cv.pdf").exists());
}
