//! Reads the title/bullet outline back out of a `.pptx` file.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::{Deserialize, Serialize};
use slides_core::{Error, Result};
use std::io::{Read, Seek};
use zip::ZipArchive;

/// Title and body paragraphs of one slide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutlineSlide {
    /// 1-based position in the presentation.
    pub number: usize,

    /// Text of the title placeholder, if the slide has one.
    pub title: Option<String>,

    /// Non-empty paragraphs from every other text shape, in document order.
    pub bullets: Vec<String>,
}

/// Reader for the slide outline of PPTX files.
pub struct OutlineReader;

impl OutlineReader {
    /// Create a new outline reader.
    pub fn new() -> Self {
        Self
    }

    /// Read the outline of every slide, in presentation order.
    pub fn read<R: Read + Seek>(&self, reader: R) -> Result<Vec<OutlineSlide>> {
        let mut archive = ZipArchive::new(reader)
            .map_err(|e| Error::ZipError(format!("Failed to open ZIP: {}", e)))?;

        let slide_order = self.get_slide_order(&mut archive)?;

        slide_order
            .iter()
            .enumerate()
            .map(|(idx, slide_path)| {
                let content = self.read_file_from_archive(&mut archive, slide_path)?;
                self.parse_slide(&content, idx + 1)
            })
            .collect()
    }

    /// Get the ordered list of slide paths from the presentation relationships.
    fn get_slide_order<R: Read + Seek>(&self, archive: &mut ZipArchive<R>) -> Result<Vec<String>> {
        let rels_content =
            self.read_file_from_archive(archive, "ppt/_rels/presentation.xml.rels")?;
        let mut slides: Vec<(String, Option<usize>)> = Vec::new();

        let mut reader = Reader::from_str(&rels_content);
        reader.trim_text(true);

        loop {
            match reader.read_event() {
                Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                    if e.name().as_ref() == b"Relationship" =>
                {
                    let rel_type = attribute(e, b"Type").unwrap_or_default();
                    let target = attribute(e, b"Target").unwrap_or_default();
                    let id = attribute(e, b"Id").unwrap_or_default();

                    if rel_type.ends_with("/slide") {
                        let order_num =
                            extract_slide_number(&id).or_else(|| extract_slide_number(&target));
                        let full_path = match target.strip_prefix('/') {
                            Some(absolute) => absolute.to_string(),
                            None => format!("ppt/{}", target),
                        };
                        slides.push((full_path, order_num));
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(Error::XmlError(format!(
                        "Error parsing relationships: {}",
                        e
                    )));
                }
                _ => {}
            }
        }

        slides.sort_by(|a, b| match (a.1, b.1) {
            (Some(na), Some(nb)) => na.cmp(&nb),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.0.cmp(&b.0),
        });

        Ok(slides.into_iter().map(|(path, _)| path).collect())
    }

    /// Split one slide's shapes into title text and body paragraphs.
    fn parse_slide(&self, xml_content: &str, number: usize) -> Result<OutlineSlide> {
        let mut outline = OutlineSlide {
            number,
            title: None,
            bullets: Vec::new(),
        };

        // Runs inside one paragraph keep their own spacing, so text is not
        // trimmed per event.
        let mut reader = Reader::from_str(xml_content);

        let mut in_shape = false;
        let mut is_title = false;
        let mut in_text = false;
        let mut paragraphs: Vec<String> = Vec::new();

        loop {
            match reader.read_event() {
                Ok(Event::Start(ref e)) => match local_name(e.name().as_ref()) {
                    b"sp" => {
                        in_shape = true;
                        is_title = false;
                        paragraphs.clear();
                    }
                    b"ph" if in_shape => is_title = is_title_placeholder(e),
                    b"p" if in_shape => paragraphs.push(String::new()),
                    b"t" => in_text = true,
                    _ => {}
                },
                Ok(Event::Empty(ref e)) => {
                    if in_shape && local_name(e.name().as_ref()) == b"ph" {
                        is_title = is_title_placeholder(e);
                    }
                }
                Ok(Event::Text(ref e)) => {
                    if in_text {
                        let text = e.unescape().unwrap_or_default();
                        if let Some(paragraph) = paragraphs.last_mut() {
                            paragraph.push_str(&text);
                        }
                    }
                }
                Ok(Event::End(ref e)) => match local_name(e.name().as_ref()) {
                    b"t" => in_text = false,
                    b"sp" => {
                        let texts = paragraphs
                            .drain(..)
                            .map(|p| p.trim().to_string())
                            .filter(|p| !p.is_empty());
                        if is_title {
                            let title = texts.collect::<Vec<_>>().join(" ");
                            if !title.is_empty() {
                                outline.title = Some(title);
                            }
                        } else {
                            outline.bullets.extend(texts);
                        }
                        in_shape = false;
                    }
                    _ => {}
                },
                Ok(Event::Eof) => break,
                Err(e) => {
                    log::warn!("XML parsing error in slide {}, keeping partial outline: {}", number, e);
                    break;
                }
                _ => {}
            }
        }

        Ok(outline)
    }

    /// Read a file from the ZIP archive.
    fn read_file_from_archive<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        path: &str,
    ) -> Result<String> {
        let mut file = archive
            .by_name(path)
            .map_err(|e| Error::ZipError(format!("File not found in archive '{}': {}", path, e)))?;

        let mut content = String::new();
        file.read_to_string(&mut content)
            .map_err(|e| Error::ZipError(format!("Failed to read '{}': {}", path, e)))?;

        Ok(content)
    }
}

impl Default for OutlineReader {
    fn default() -> Self {
        Self::new()
    }
}

/// Read the outline of a PPTX file with the default reader.
pub fn read_outline<R: Read + Seek>(reader: R) -> Result<Vec<OutlineSlide>> {
    OutlineReader::new().read(reader)
}

fn attribute(e: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == key)
        .map(|attr| String::from_utf8_lossy(&attr.value).to_string())
}

fn is_title_placeholder(e: &BytesStart<'_>) -> bool {
    matches!(
        attribute(e, b"type").as_deref(),
        Some("title") | Some("ctrTitle")
    )
}

/// Extract the local name from a potentially namespaced XML element name.
fn local_name(name: &[u8]) -> &[u8] {
    match name.iter().position(|&b| b == b':') {
        Some(pos) => &name[pos + 1..],
        None => name,
    }
}

/// Extract a trailing number from a string like "rId2" or "slide3.xml".
fn extract_slide_number(s: &str) -> Option<usize> {
    let s = s.trim_end_matches(".xml").trim_end_matches(".rels");
    let start = s
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_digit())
        .last()
        .map(|(idx, _)| idx)?;
    s[start..].parse().ok()
}
