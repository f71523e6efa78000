use std::io::{Cursor, Read};

use zip::ZipArchive;

use super::{DocumentKind, ExtractionError};

/// The main body part of a WordprocessingML package.
const DOCUMENT_PART: &str = "word/document.xml";

/// Extracts paragraph text from a DOCX package, one paragraph per line.
pub fn extract(bytes: &[u8]) -> Result<String, ExtractionError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| ExtractionError::unreadable(DocumentKind::Docx, e))?;

    let mut xml = String::new();
    archive
        .by_name(DOCUMENT_PART)
        .map_err(|e| {
            ExtractionError::unreadable(DocumentKind::Docx, format!("{DOCUMENT_PART}: {e}"))
        })?
        .read_to_string(&mut xml)
        .map_err(|e| ExtractionError::unreadable(DocumentKind::Docx, e))?;

    Ok(paragraphs(&xml).join("\n"))
}

/// Walks the document XML tag by tag and collects the text of each `<w:p>`.
///
/// Runs (`<w:t>`) are concatenated, `<w:tab/>` becomes a tab and `<w:br/>` /
/// `<w:cr/>` a newline. Paragraphs nested in text boxes are emitted as their
/// own lines. Tab stop definitions inside `<w:pPr>` are ignored.
fn paragraphs(xml: &str) -> Vec<String> {
    let mut done = Vec::new();
    let mut open: Vec<String> = Vec::new();
    let mut in_text = false;
    let mut in_props = false;
    let mut rest = xml;

    while let Some(start) = rest.find('<') {
        if in_text {
            if let Some(p) = open.last_mut() {
                p.push_str(&decode_entities(&rest[..start]));
            }
        }

        let Some(len) = rest[start..].find('>') else {
            break;
        };
        let tag = &rest[start + 1..start + len];
        rest = &rest[start + len + 1..];

        let closing = tag.starts_with('/');
        let self_closing = tag.ends_with('/');
        let name = tag
            .trim_start_matches('/')
            .split(|c: char| c.is_whitespace() || c == '/')
            .next()
            .unwrap_or("");

        match name {
            "w:p" if closing => {
                if let Some(p) = open.pop() {
                    done.push(p);
                }
            }
            "w:p" if self_closing => done.push(String::new()),
            "w:p" => open.push(String::new()),
            "w:pPr" => in_props = !closing && !self_closing,
            "w:t" => in_text = !closing && !self_closing,
            "w:tab" if !in_props => push_char(&mut open, '\t'),
            "w:br" | "w:cr" => push_char(&mut open, '\n'),
            _ => {}
        }
    }

    done
}

fn push_char(open: &mut [String], c: char) {
    if let Some(p) = open.last_mut() {
        p.push(c);
    }
}

fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];

        let decoded = rest.find(';').and_then(|semi| {
            let entity = &rest[1..semi];
            let c = match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                _ => entity
                    .strip_prefix("#x")
                    .map(|hex| u32::from_str_radix(hex, 16))
                    .or_else(|| entity.strip_prefix('#').map(|dec| dec.parse::<u32>()))
                    .and_then(|n| n.ok())
                    .and_then(char::from_u32),
            };
            c.map(|c| (c, semi + 1))
        });

        match decoded {
            Some((c, consumed)) => {
                out.push(c);
                rest = &rest[consumed..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Builds a minimal in-memory DOCX with one `<w:p>` per entry.
#[cfg(test)]
pub(crate) fn fixture(paragraphs: &[&str]) -> Vec<u8> {
    use std::io::Write;
    use zip::write::FileOptions;
    use zip::ZipWriter;

    let body: String = paragraphs
        .iter()
        .map(|p| {
            let escaped = p
                .replace('&', "&amp;")
                .replace('<', "&lt;")
                .replace('>', "&gt;");
            format!(r#"<w:p><w:r><w:t xml:space="preserve">{escaped}</w:t></w:r></w:p>"#)
        })
        .collect();
    let document = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body}<w:sectPr/></w:body></w:document>"#
    );

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    writer
        .start_file("[Content_Types].xml", FileOptions::default())
        .unwrap();
    writer
        .write_all(br#"<?xml version="1.0" encoding="UTF-8"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"/>"#)
        .unwrap();
    writer
        .start_file(DOCUMENT_PART, FileOptions::default())
        .unwrap();
    writer.write_all(document.as_bytes()).unwrap();
    writer.finish().unwrap().into_inner()
}
