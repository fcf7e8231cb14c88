//! PPTX package writer.
//!
//! Renders a list of title + bullet slides into an Office Open XML package.
//! Static parts come from [`crate::template`]; the parts that depend on the
//! slides are generated with `quick-xml` so all text is escaped.

use crate::template::*;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use slides_core::{Error, Result};
use std::io::{Seek, Write};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

/// First id PowerPoint accepts for `p:sldId`.
const FIRST_SLIDE_ID: usize = 256;

/// Relationship ids 1 and 2 in `presentation.xml.rels` are the master and
/// the theme; slides follow.
const FIRST_SLIDE_REL_ID: usize = 3;

/// One slide as stored by the host.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeckSlide {
    pub title: String,
    pub bullets: Vec<String>,
}

impl DeckSlide {
    pub fn new(title: impl Into<String>, bullets: Vec<String>) -> Self {
        Self {
            title: title.into(),
            bullets,
        }
    }
}

/// Write a complete `.pptx` package for `slides` into `writer`.
pub fn write_package<W: Write + Seek>(writer: W, slides: &[DeckSlide]) -> Result<W> {
    let mut zip = ZipWriter::new(writer);
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    let add = |zip: &mut ZipWriter<W>, path: &str, content: &[u8]| -> Result<()> {
        zip.start_file(path, options)
            .map_err(|e| Error::ZipError(format!("Failed to start '{}': {}", path, e)))?;
        zip.write_all(content)
            .map_err(|e| Error::ZipError(format!("Failed to write '{}': {}", path, e)))
    };

    add(&mut zip, "[Content_Types].xml", &content_types_xml(slides.len())?)?;
    add(&mut zip, "_rels/.rels", &package_rels_xml()?)?;
    add(&mut zip, "ppt/presentation.xml", &presentation_xml(slides.len())?)?;
    add(
        &mut zip,
        "ppt/_rels/presentation.xml.rels",
        &presentation_rels_xml(slides.len())?,
    )?;
    add(&mut zip, SLIDE_MASTER_PATH, SLIDE_MASTER_XML.as_bytes())?;
    add(&mut zip, SLIDE_MASTER_RELS_PATH, SLIDE_MASTER_RELS_XML.as_bytes())?;
    add(&mut zip, SLIDE_LAYOUT_PATH, SLIDE_LAYOUT_XML.as_bytes())?;
    add(&mut zip, SLIDE_LAYOUT_RELS_PATH, SLIDE_LAYOUT_RELS_XML.as_bytes())?;
    add(&mut zip, THEME_PATH, THEME_XML.as_bytes())?;

    for (idx, slide) in slides.iter().enumerate() {
        let number = idx + 1;
        add(
            &mut zip,
            &format!("ppt/slides/slide{}.xml", number),
            &slide_xml(slide)?,
        )?;
        add(
            &mut zip,
            &format!("ppt/slides/_rels/slide{}.xml.rels", number),
            SLIDE_RELS_XML.as_bytes(),
        )?;
    }

    log::debug!("Wrote PPTX package with {} slides", slides.len());

    zip.finish()
        .map_err(|e| Error::ZipError(format!("Failed to finish archive: {}", e)))
}

/// Thin wrapper over `quick_xml::Writer` that maps errors once.
struct XmlBuilder {
    writer: Writer<Vec<u8>>,
}

impl XmlBuilder {
    fn new() -> Result<Self> {
        let mut builder = Self {
            writer: Writer::new(Vec::new()),
        };
        builder.event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;
        Ok(builder)
    }

    fn event(&mut self, event: Event<'_>) -> Result<()> {
        self.writer
            .write_event(event)
            .map_err(|e| Error::XmlError(e.to_string()))
    }

    fn start(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<()> {
        let elem = BytesStart::new(name).with_attributes(attrs.iter().copied());
        self.event(Event::Start(elem))
    }

    fn empty(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<()> {
        let elem = BytesStart::new(name).with_attributes(attrs.iter().copied());
        self.event(Event::Empty(elem))
    }

    fn end(&mut self, name: &str) -> Result<()> {
        self.event(Event::End(BytesEnd::new(name)))
    }

    fn text(&mut self, text: &str) -> Result<()> {
        self.event(Event::Text(BytesText::new(text)))
    }

    fn finish(self) -> Vec<u8> {
        self.writer.into_inner()
    }
}

fn content_types_xml(slide_count: usize) -> Result<Vec<u8>> {
    let mut xml = XmlBuilder::new()?;
    xml.start("Types", &[("xmlns", NS_CONTENT_TYPES)])?;
    xml.empty("Default", &[("Extension", "rels"), ("ContentType", CT_RELS)])?;
    xml.empty("Default", &[("Extension", "xml"), ("ContentType", "application/xml")])?;

    let fixed = [
        ("/ppt/presentation.xml", CT_PRESENTATION),
        ("/ppt/slideMasters/slideMaster1.xml", CT_SLIDE_MASTER),
        ("/ppt/slideLayouts/slideLayout1.xml", CT_SLIDE_LAYOUT),
        ("/ppt/theme/theme1.xml", CT_THEME),
    ];
    for (part, content_type) in fixed {
        xml.empty("Override", &[("PartName", part), ("ContentType", content_type)])?;
    }

    for number in 1..=slide_count {
        let part = format!("/ppt/slides/slide{}.xml", number);
        xml.empty("Override", &[("PartName", part.as_str()), ("ContentType", CT_SLIDE)])?;
    }

    xml.end("Types")?;
    Ok(xml.finish())
}

fn package_rels_xml() -> Result<Vec<u8>> {
    let mut xml = XmlBuilder::new()?;
    xml.start("Relationships", &[("xmlns", NS_PACKAGE_REL)])?;
    xml.empty(
        "Relationship",
        &[
            ("Id", "rId1"),
            ("Type", REL_OFFICE_DOCUMENT),
            ("Target", "ppt/presentation.xml"),
        ],
    )?;
    xml.end("Relationships")?;
    Ok(xml.finish())
}

fn presentation_xml(slide_count: usize) -> Result<Vec<u8>> {
    let mut xml = XmlBuilder::new()?;
    xml.start(
        "p:presentation",
        &[
            ("xmlns:a", NS_DRAWING),
            ("xmlns:r", NS_REL),
            ("xmlns:p", NS_MAIN),
            ("saveSubsetFonts", "1"),
        ],
    )?;

    xml.start("p:sldMasterIdLst", &[])?;
    xml.empty("p:sldMasterId", &[("id", "2147483648"), ("r:id", "rId1")])?;
    xml.end("p:sldMasterIdLst")?;

    if slide_count > 0 {
        xml.start("p:sldIdLst", &[])?;
        for idx in 0..slide_count {
            let id = (FIRST_SLIDE_ID + idx).to_string();
            let rel_id = format!("rId{}", FIRST_SLIDE_REL_ID + idx);
            xml.empty("p:sldId", &[("id", id.as_str()), ("r:id", rel_id.as_str())])?;
        }
        xml.end("p:sldIdLst")?;
    }

    let (cx, cy) = (SLIDE_WIDTH.to_string(), SLIDE_HEIGHT.to_string());
    xml.empty("p:sldSz", &[("cx", cx.as_str()), ("cy", cy.as_str()), ("type", "screen4x3")])?;
    xml.empty("p:notesSz", &[("cx", "6858000"), ("cy", "9144000")])?;

    xml.end("p:presentation")?;
    Ok(xml.finish())
}

fn presentation_rels_xml(slide_count: usize) -> Result<Vec<u8>> {
    let mut xml = XmlBuilder::new()?;
    xml.start("Relationships", &[("xmlns", NS_PACKAGE_REL)])?;
    xml.empty(
        "Relationship",
        &[
            ("Id", "rId1"),
            ("Type", REL_SLIDE_MASTER),
            ("Target", "slideMasters/slideMaster1.xml"),
        ],
    )?;
    xml.empty(
        "Relationship",
        &[("Id", "rId2"), ("Type", REL_THEME), ("Target", "theme/theme1.xml")],
    )?;

    for idx in 0..slide_count {
        let rel_id = format!("rId{}", FIRST_SLIDE_REL_ID + idx);
        let target = format!("slides/slide{}.xml", idx + 1);
        xml.empty(
            "Relationship",
            &[("Id", rel_id.as_str()), ("Type", REL_SLIDE), ("Target", target.as_str())],
        )?;
    }

    xml.end("Relationships")?;
    Ok(xml.finish())
}

fn slide_xml(slide: &DeckSlide) -> Result<Vec<u8>> {
    let mut xml = XmlBuilder::new()?;
    xml.start(
        "p:sld",
        &[("xmlns:a", NS_DRAWING), ("xmlns:r", NS_REL), ("xmlns:p", NS_MAIN)],
    )?;
    xml.start("p:cSld", &[])?;
    xml.start("p:spTree", &[])?;

    xml.start("p:nvGrpSpPr", &[])?;
    xml.empty("p:cNvPr", &[("id", "1"), ("name", "")])?;
    xml.empty("p:cNvGrpSpPr", &[])?;
    xml.empty("p:nvPr", &[])?;
    xml.end("p:nvGrpSpPr")?;
    xml.empty("p:grpSpPr", &[])?;

    placeholder_shape(
        &mut xml,
        "2",
        "Title 1",
        &[("type", "title")],
        std::slice::from_ref(&slide.title),
    )?;
    placeholder_shape(
        &mut xml,
        "3",
        "Content Placeholder 2",
        &[("idx", "1")],
        &slide.bullets,
    )?;

    xml.end("p:spTree")?;
    xml.end("p:cSld")?;
    xml.start("p:clrMapOvr", &[])?;
    xml.empty("a:masterClrMapping", &[])?;
    xml.end("p:clrMapOvr")?;
    xml.end("p:sld")?;
    Ok(xml.finish())
}

/// A placeholder shape with one paragraph per line.
fn placeholder_shape(
    xml: &mut XmlBuilder,
    id: &str,
    name: &str,
    placeholder: &[(&str, &str)],
    paragraphs: &[String],
) -> Result<()> {
    xml.start("p:sp", &[])?;

    xml.start("p:nvSpPr", &[])?;
    xml.empty("p:cNvPr", &[("id", id), ("name", name)])?;
    xml.start("p:cNvSpPr", &[])?;
    xml.empty("a:spLocks", &[("noGrp", "1")])?;
    xml.end("p:cNvSpPr")?;
    xml.start("p:nvPr", &[])?;
    xml.empty("p:ph", placeholder)?;
    xml.end("p:nvPr")?;
    xml.end("p:nvSpPr")?;
    xml.empty("p:spPr", &[])?;

    xml.start("p:txBody", &[])?;
    xml.empty("a:bodyPr", &[])?;
    xml.empty("a:lstStyle", &[])?;
    if paragraphs.is_empty() {
        // txBody needs at least one paragraph.
        xml.start("a:p", &[])?;
        xml.empty("a:endParaRPr", &[("lang", "en-US")])?;
        xml.end("a:p")?;
    }
    for paragraph in paragraphs {
        xml.start("a:p", &[])?;
        xml.start("a:r", &[])?;
        xml.empty("a:rPr", &[("lang", "en-US"), ("dirty", "0")])?;
        xml.start("a:t", &[])?;
        xml.text(paragraph)?;
        xml.end("a:t")?;
        xml.end("a:r")?;
        xml.end("a:p")?;
    }
    xml.end("p:txBody")?;

    xml.end("p:sp")
}
