//! Post-processing of rendered PDF bytes with `lopdf`.
//!
//! `genpdf` only knows about the document title. [`finalize`] reopens the rendered bytes, fills
//! the `/Info` dictionary with the remaining [`Metadata`] fields, attaches a flat `/Outlines`
//! tree built from the outline entries collected during layout and adds a `/Link` annotation
//! with a `/URI` action for every link placed in a page note.

use std::collections::BTreeMap;

use log::{debug, warn};
use lopdf::{Dictionary, Document, Object, ObjectId, StringFormat};

use crate::elements::{LinkAnnotation, OutlineEntry};
use crate::error::RenderError;
use crate::model::{Metadata, Permissions};

const UTF16_BOM: [u8; 2] = [0xFE, 0xFF];
const KEYWORD_SEPARATOR: &str = ", ";

/// Fails when `permissions` restrict anything.
///
/// Unrestricted documents need no `/Encrypt` dictionary. Restrictions would require encrypting
/// the document, which is not produced.
pub fn check_permissions(permissions: Permissions) -> Result<(), RenderError> {
    if permissions.is_unrestricted() {
        Ok(())
    } else {
        Err(RenderError::UnsupportedPermissions {
            printing: permissions.printing,
            copying: permissions.copying,
        })
    }
}

/// Embeds `metadata`, `outline` and `links` into the PDF in `pdf_bytes`.
pub fn finalize(
    pdf_bytes: &[u8],
    metadata: &Metadata,
    outline: &[OutlineEntry],
    links: &[LinkAnnotation],
) -> Result<Vec<u8>, RenderError> {
    check_permissions(metadata.permissions)?;

    let mut document = Document::load_mem(pdf_bytes)?;
    write_info(&mut document, metadata)?;

    let pages = document.get_pages();
    let entries = collect_outline_entries(&mut document, outline, &pages)?;
    if !entries.is_empty() {
        let outlines_id = document.new_object_id();
        link_outline_entries(outlines_id, &mut document, &entries);
        insert_outlines_root(outlines_id, &mut document, &entries)?;
    }
    for link in links {
        insert_link_annotation(&mut document, link, &pages)?;
    }
    debug!(
        "Embedded metadata, {} outline entries and {} link(s) into {} page(s)",
        entries.len(),
        links.len(),
        pages.len()
    );

    let mut buffer = Vec::new();
    document.save_to(&mut buffer).map_err(lopdf::Error::from)?;
    Ok(buffer)
}

/// Encodes `value` as a PDF text string.
///
/// ASCII stays a literal string; anything else becomes UTF-16BE with a byte order mark.
pub fn encode_text_string(value: &str) -> Object {
    if value.is_ascii() {
        return Object::string_literal(value);
    }
    let mut bytes = UTF16_BOM.to_vec();
    for unit in value.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    Object::String(bytes, StringFormat::Hexadecimal)
}

/// Decodes a PDF text string written either as UTF-16BE with a byte order mark or as
/// single-byte text.
pub fn decode_text_string(bytes: &[u8]) -> String {
    match bytes.strip_prefix(&UTF16_BOM[..]) {
        Some(rest) => {
            let units: Vec<u16> = rest
                .chunks_exact(2)
                .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                .collect();
            String::from_utf16_lossy(&units)
        }
        None => bytes.iter().map(|&byte| char::from(byte)).collect(),
    }
}

/// Text fields of a PDF `/Info` dictionary.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DocumentInfo {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub keywords: Option<String>,
}

/// Reads the `/Info` dictionary of a PDF.
pub fn read_document_info(pdf_bytes: &[u8]) -> Result<DocumentInfo, RenderError> {
    let document = Document::load_mem(pdf_bytes)?;
    let info = match document.trailer.get(b"Info") {
        Ok(Object::Reference(id)) => document.get_object(*id)?.as_dict()?,
        Ok(Object::Dictionary(dictionary)) => dictionary,
        _ => return Ok(DocumentInfo::default()),
    };

    let field = |key: &[u8]| {
        info.get(key)
            .and_then(Object::as_str)
            .ok()
            .map(decode_text_string)
    };
    Ok(DocumentInfo {
        title: field(b"Title"),
        author: field(b"Author"),
        subject: field(b"Subject"),
        keywords: field(b"Keywords"),
    })
}

/// Reads the flat outline of a PDF as titles with their 1-indexed destination pages.
pub fn read_outline(pdf_bytes: &[u8]) -> Result<Vec<(String, usize)>, RenderError> {
    let document = Document::load_mem(pdf_bytes)?;
    let page_numbers: BTreeMap<ObjectId, usize> = document
        .get_pages()
        .into_iter()
        .map(|(number, id)| (id, number as usize))
        .collect();

    let catalog = catalog_id(&document)?;
    let outlines = match document
        .get_object(catalog)
        .and_then(Object::as_dict)
        .and_then(|catalog| catalog.get(b"Outlines"))
        .and_then(Object::as_reference)
    {
        Ok(id) => id,
        Err(_) => return Ok(Vec::new()),
    };

    let mut entries = Vec::new();
    let mut next = document
        .get_object(outlines)
        .and_then(Object::as_dict)
        .and_then(|root| root.get(b"First"))
        .and_then(Object::as_reference)
        .ok();
    while let Some(id) = next {
        let item = document.get_object(id)?.as_dict()?;
        let title = decode_text_string(item.get(b"Title")?.as_str()?);
        let page = match item.get(b"Dest")? {
            Object::Array(destination) => destination
                .first()
                .and_then(|target| target.as_reference().ok())
                .and_then(|target| page_numbers.get(&target).copied()),
            _ => None,
        };
        if let Some(page) = page {
            entries.push((title, page));
        }
        next = item.get(b"Next").and_then(Object::as_reference).ok();
    }
    Ok(entries)
}

/// A `/URI` link annotation read back from a PDF.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageLink {
    /// 1-indexed page holding the annotation.
    pub page: usize,
    pub url: String,
    /// Left, bottom, right and top edge in points.
    pub rect: [i64; 4],
}

/// Reads the `/URI` link annotations of every page.
pub fn read_links(pdf_bytes: &[u8]) -> Result<Vec<PageLink>, RenderError> {
    let document = Document::load_mem(pdf_bytes)?;
    let mut links = Vec::new();

    for (number, page_id) in document.get_pages() {
        let page = document.get_object(page_id)?.as_dict()?;
        let annotations = match page.get(b"Annots") {
            Ok(Object::Array(items)) => items.clone(),
            Ok(Object::Reference(id)) => document.get_object(*id)?.as_array()?.clone(),
            _ => continue,
        };

        for item in &annotations {
            let annotation = match item {
                Object::Reference(id) => document.get_object(*id)?.as_dict()?,
                Object::Dictionary(dictionary) => dictionary,
                _ => continue,
            };
            let url = annotation
                .get(b"A")
                .and_then(Object::as_dict)
                .and_then(|action| action.get(b"URI"))
                .and_then(Object::as_str)
                .ok()
                .map(decode_text_string);
            let Some(url) = url else {
                continue;
            };

            let mut rect = [0; 4];
            if let Ok(Object::Array(edges)) = annotation.get(b"Rect") {
                for (slot, edge) in rect.iter_mut().zip(edges) {
                    *slot = edge.as_i64().unwrap_or_default();
                }
            }
            links.push(PageLink {
                page: number as usize,
                url,
                rect,
            });
        }
    }
    Ok(links)
}

/// Rounds a rectangle in points outward to whole points.
fn outward_rect(rect: [f64; 4]) -> [i64; 4] {
    let [left, bottom, right, top] = rect;
    [
        left.floor() as i64,
        bottom.floor() as i64,
        right.ceil() as i64,
        top.ceil() as i64,
    ]
}

fn insert_link_annotation(
    document: &mut Document,
    link: &LinkAnnotation,
    pages: &BTreeMap<u32, ObjectId>,
) -> Result<(), RenderError> {
    let page_id = u32::try_from(link.page)
        .ok()
        .and_then(|number| pages.get(&number).copied())
        .ok_or_else(|| RenderError::MissingLinkPage {
            url: link.url.clone(),
            page: link.page,
        })?;

    let mut action = Dictionary::new();
    action.set("Type", Object::Name("Action".into()));
    action.set("S", Object::Name("URI".into()));
    action.set("URI", Object::string_literal(link.url.as_str()));

    let mut annotation = Dictionary::new();
    annotation.set("Type", Object::Name("Annot".into()));
    annotation.set("Subtype", Object::Name("Link".into()));
    annotation.set(
        "Rect",
        Object::Array(
            outward_rect(link.rect)
                .into_iter()
                .map(Object::Integer)
                .collect(),
        ),
    );
    annotation.set(
        "Border",
        Object::Array(vec![Object::Integer(0), Object::Integer(0), Object::Integer(0)]),
    );
    annotation.set("A", Object::Dictionary(action));
    let annotation_id = document.add_object(annotation);

    let existing = document
        .get_object(page_id)
        .and_then(Object::as_dict)
        .and_then(|page| page.get(b"Annots"))
        .ok()
        .cloned();
    let annotations = match existing {
        Some(Object::Reference(id)) => {
            document
                .get_object_mut(id)?
                .as_array_mut()?
                .push(Object::Reference(annotation_id));
            return Ok(());
        }
        Some(Object::Array(mut annotations)) => {
            annotations.push(Object::Reference(annotation_id));
            annotations
        }
        _ => vec![Object::Reference(annotation_id)],
    };
    document
        .get_object_mut(page_id)?
        .as_dict_mut()?
        .set("Annots", Object::Array(annotations));
    Ok(())
}

fn catalog_id(document: &Document) -> Result<ObjectId, RenderError> {
    document
        .trailer
        .get(b"Root")
        .and_then(Object::as_reference)
        .map_err(|_| RenderError::MissingCatalog)
}

fn write_info(document: &mut Document, metadata: &Metadata) -> Result<(), RenderError> {
    let info_id = match document.trailer.get(b"Info").ok().cloned() {
        Some(Object::Reference(id)) => id,
        Some(Object::Dictionary(existing)) => document.add_object(existing),
        _ => document.add_object(Dictionary::new()),
    };
    document.trailer.set("Info", Object::Reference(info_id));

    let info = document.get_object_mut(info_id)?.as_dict_mut()?;
    info.set("Title", encode_text_string(&metadata.title));
    info.set("Author", encode_text_string(&metadata.author));
    info.set("Subject", encode_text_string(&metadata.subject));
    info.set(
        "Keywords",
        encode_text_string(&metadata.keywords.join(KEYWORD_SEPARATOR)),
    );
    info.set(
        "Creator",
        Object::string_literal(concat!(
            env!("CARGO_PKG_NAME"),
            " ",
            env!("CARGO_PKG_VERSION")
        )),
    );
    Ok(())
}

struct OutlineItem {
    object_id: ObjectId,
    page_ref: ObjectId,
    title: String,
}

fn collect_outline_entries(
    document: &mut Document,
    outline: &[OutlineEntry],
    pages: &BTreeMap<u32, ObjectId>,
) -> Result<Vec<OutlineItem>, RenderError> {
    let mut items = Vec::new();

    for entry in outline {
        let Some(page) = entry.page else {
            warn!("Outline entry '{}' was never rendered, skipping", entry.title);
            continue;
        };
        let page_ref = u32::try_from(page)
            .ok()
            .and_then(|number| pages.get(&number).copied())
            .ok_or_else(|| RenderError::MissingPage {
                title: entry.title.clone(),
                page,
            })?;

        items.push(OutlineItem {
            object_id: document.new_object_id(),
            page_ref,
            title: entry.title.clone(),
        });
    }

    Ok(items)
}

fn link_outline_entries(outlines_id: ObjectId, document: &mut Document, items: &[OutlineItem]) {
    for (index, item) in items.iter().enumerate() {
        let mut dictionary = Dictionary::new();
        dictionary.set("Title", encode_text_string(&item.title));
        dictionary.set(
            "Dest",
            Object::Array(vec![
                Object::Reference(item.page_ref),
                Object::Name("Fit".into()),
            ]),
        );
        dictionary.set("Parent", Object::Reference(outlines_id));

        if let Some(previous) = index.checked_sub(1).and_then(|i| items.get(i)) {
            dictionary.set("Prev", Object::Reference(previous.object_id));
        }
        if let Some(next) = items.get(index + 1) {
            dictionary.set("Next", Object::Reference(next.object_id));
        }

        document
            .objects
            .insert(item.object_id, Object::Dictionary(dictionary));
    }
}

fn insert_outlines_root(
    outlines_id: ObjectId,
    document: &mut Document,
    items: &[OutlineItem],
) -> Result<(), RenderError> {
    let catalog_id = catalog_id(document)?;

    let mut dictionary = Dictionary::new();
    dictionary.set("Type", Object::Name("Outlines".into()));
    dictionary.set("Count", Object::Integer(items.len() as i64));
    if let Some(first) = items.first() {
        dictionary.set("First", Object::Reference(first.object_id));
    }
    if let Some(last) = items.last() {
        dictionary.set("Last", Object::Reference(last.object_id));
    }
    document
        .objects
        .insert(outlines_id, Object::Dictionary(dictionary));

    let catalog = document
        .get_object_mut(catalog_id)
        .and_then(Object::as_dict_mut)
        .map_err(|_| RenderError::MissingCatalog)?;
    catalog.set("Outlines", Object::Reference(outlines_id));
    catalog.set("PageMode", Object::Name("UseOutlines".into()));

    Ok(())
}
