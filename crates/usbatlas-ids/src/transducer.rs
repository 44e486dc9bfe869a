//! Streaming conversion of the flat-text registry into XML
//!
//! [`IdsToXml`] reads the prefix-encoded registry line by line and produces
//! the equivalent namespace-qualified XML document through `std::io::Read`.
//! It is an explicit pull state machine: an open-element stack (at most
//! three frames), the current line source, and a pending byte buffer that
//! never holds more than one line's worth of markup. Registries with tens
//! of thousands of lines stream through without the output ever being
//! materialized in memory.

use std::io::{self, BufRead, Read};
use tracing::trace;

use crate::line::{classify, ClassifiedLine, LineKind};
use crate::locale;

/// Namespace of the XML document model produced here and consumed by the
/// registry builder.
pub const XMLNS: &str = "https://usbatlas.dev/xmlns/usbclassid";

/// Root element tag; carries the namespace declaration.
pub const ROOT_TAG: &str = "usbclassid";

/// An open element awaiting its children or its closing tag.
struct Frame {
    kind: LineKind,
    /// Original label text; a dialect resolves its locale against the label
    /// of the enclosing language frame.
    label: String,
    children: usize,
}

/// Transparent flat-text-to-XML reader.
///
/// Single forward pass, single consumer, not restartable. After the end of
/// the document has been produced, `read` returns `Ok(0)` forever.
pub struct IdsToXml<R> {
    source: R,
    stack: Vec<Frame>,
    pending: Vec<u8>,
    pos: usize,
    closed: bool,
}

impl<R: BufRead> IdsToXml<R> {
    pub fn new(source: R) -> Self {
        let mut t = Self {
            source,
            stack: Vec::with_capacity(3),
            pending: Vec::new(),
            pos: 0,
            closed: false,
        };
        t.emit("<?xml version=\"1.0\"?>\n");
        t.emit(&format!("<{} xmlns=\"{}\">", ROOT_TAG, XMLNS));
        t
    }

    fn emit(&mut self, text: &str) {
        self.pending.extend_from_slice(text.as_bytes());
    }

    /// Refills the pending buffer from the next accepted input line.
    ///
    /// Returns false only once the document epilogue has been drained.
    fn fill(&mut self) -> io::Result<bool> {
        if self.pos < self.pending.len() {
            return Ok(true);
        }
        self.pending.clear();
        self.pos = 0;
        if self.closed {
            return Ok(false);
        }
        loop {
            let mut line = String::new();
            if self.source.read_line(&mut line)? == 0 {
                self.close_frames(0);
                self.emit(&format!("\n</{}>", ROOT_TAG));
                self.closed = true;
                return Ok(true);
            }
            let record = line.trim_end_matches(['\n', '\r']);
            if record.is_empty() || record.starts_with('#') {
                continue;
            }
            let open: Vec<LineKind> = self.stack.iter().map(|f| f.kind).collect();
            match classify(record, &open) {
                Some(classified) => {
                    self.write_element(&classified);
                    return Ok(true);
                }
                None => {
                    trace!(line = record, "unrecognized line dropped");
                }
            }
        }
    }

    /// Closes frames, finalizes the parent, pushes the new frame, and emits
    /// the new element's opening tag (left unterminated until its first
    /// child or its pop decides between `>` and `/>`).
    fn write_element(&mut self, classified: &ClassifiedLine<'_>) {
        let depth = classified.depth();
        self.close_frames(depth);

        let locale = match classified.kind {
            LineKind::Lang => locale::language_code(classified.label).map(str::to_string),
            LineKind::Dialect => self
                .stack
                .last()
                .and_then(|lang| locale::dialect_locale(&lang.label, classified.label)),
            _ => None,
        };

        if let Some(parent) = self.stack.last_mut() {
            if parent.children == 0 {
                self.pending.extend_from_slice(b">");
            }
            parent.children += 1;
        }
        self.stack.push(Frame {
            kind: classified.kind,
            label: classified.label.to_string(),
            children: 0,
        });

        self.emit("\n");
        for _ in 0..=depth {
            self.emit("\t");
        }
        self.emit(&format!(
            "<{} id=\"{}\" label=\"{}\"",
            classified.kind.tag(),
            escape(&classified.id.to_uppercase()),
            escape(classified.label),
        ));
        if let Some(locale) = locale {
            self.emit(&format!(" locale=\"{}\"", locale));
        }
    }

    /// Pops every frame at the given depth or deeper, emitting `/>` for
    /// childless frames and an indented closing tag otherwise.
    fn close_frames(&mut self, depth: usize) {
        while self.stack.len() > depth {
            let Some(frame) = self.stack.pop() else {
                break;
            };
            if frame.children == 0 {
                self.emit("/>");
            } else {
                self.emit("\n");
                for _ in 0..=self.stack.len() {
                    self.emit("\t");
                }
                self.emit(&format!("</{}>", frame.kind.tag()));
            }
        }
    }
}

impl<R: BufRead> Read for IdsToXml<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() || !self.fill()? {
            return Ok(0);
        }
        let n = (self.pending.len() - self.pos).min(buf.len());
        buf[..n].copy_from_slice(&self.pending[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}

/// Escapes text for use in an attribute value. Control characters have no
/// literal representation in the output and become character references.
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            c if c.is_control() => {
                out.push_str("&#");
                out.push_str(&(c as u32).to_string());
                out.push(';');
            }
            c => out.push(c),
        }
    }
    out
}

/// Converts a whole flat-text registry to its XML document in one call.
pub fn ids_to_xml_string(input: impl BufRead) -> io::Result<String> {
    let mut out = String::new();
    IdsToXml::new(input).read_to_string(&mut out)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn convert(ids: &str) -> String {
        ids_to_xml_string(ids.as_bytes()).unwrap()
    }

    #[test]
    fn test_vendor_with_product() {
        let xml = convert("0a5c\tBroadcom Corp\n\t0001  Product A\n");
        assert_eq!(
            xml,
            "<?xml version=\"1.0\"?>\n\
             <usbclassid xmlns=\"https://usbatlas.dev/xmlns/usbclassid\">\n\
             \t<vendor id=\"0A5C\" label=\"Broadcom Corp\">\n\
             \t\t<product id=\"0001\" label=\"Product A\"/>\n\
             \t</vendor>\n\
             </usbclassid>"
        );
    }

    #[test]
    fn test_childless_vendor_is_self_closing() {
        let xml = convert("0a5c  Broadcom Corp\nffff  Other Corp\n");
        assert!(xml.contains("<vendor id=\"0A5C\" label=\"Broadcom Corp\"/>"));
        assert!(xml.contains("<vendor id=\"FFFF\" label=\"Other Corp\"/>"));
    }

    #[test]
    fn test_class_hierarchy() {
        let xml = convert("C 09  Hub\n\t00  Unused\n\t\t01  Single TT\n");
        assert!(xml.contains("\t<class id=\"09\" label=\"Hub\">"));
        assert!(xml.contains("\t\t<subclass id=\"00\" label=\"Unused\">"));
        assert!(xml.contains("\t\t\t<protocol id=\"01\" label=\"Single TT\"/>"));
        assert!(xml.contains("\t\t</subclass>"));
        assert!(xml.contains("\t</class>"));
    }

    #[test]
    fn test_unknown_code_leaves_stack_intact() {
        // The X line is dropped without closing the open class, so the
        // following one-tab line still nests under it.
        let xml = convert("C 03  HID\nX 09  Something\n\t01  Boot Interface\n");
        assert!(!xml.contains("Something"));
        assert!(xml.contains("<subclass id=\"01\" label=\"Boot Interface\"/>"));
    }

    #[test]
    fn test_sibling_products() {
        let xml = convert("0a5c\tBroadcom Corp\n\t0001  Product A\n\t0002  Product B\n");
        assert!(xml.contains("\t\t<product id=\"0001\" label=\"Product A\"/>"));
        assert!(xml.contains("\t\t<product id=\"0002\" label=\"Product B\"/>"));
    }

    #[test]
    fn test_subclass_after_protocol_closes_both() {
        let xml = convert("C 03  HID\n\t01  Boot\n\t\t01  Keyboard\n\t02  Reserved\n");
        assert!(xml.contains("\t\t\t<protocol id=\"01\" label=\"Keyboard\"/>"));
        assert!(xml.contains("\t\t</subclass>"));
        assert!(xml.contains("\t\t<subclass id=\"02\" label=\"Reserved\"/>"));
    }

    #[test]
    fn test_protocol_under_product_dropped() {
        let xml = convert("0a5c  Broadcom Corp\n\t0001  Product A\n\t\t01  Iface\n");
        assert!(!xml.contains("Iface"));
        assert!(!xml.contains("<interface"));
        assert!(xml.contains("<product id=\"0001\" label=\"Product A\"/>"));
    }

    #[test]
    fn test_lang_and_dialect_locales() {
        let xml = convert("L 0009  English\n\t01  United States\n");
        assert!(xml.contains("<lang id=\"0009\" label=\"English\" locale=\"en\">"));
        assert!(xml.contains("<dialect id=\"01\" label=\"United States\" locale=\"en_US\"/>"));

        // An unresolvable dialect label falls back to the bare language code.
        let xml = convert("L 0009  English\n\t02  UK\n");
        assert!(xml.contains("<dialect id=\"02\" label=\"UK\" locale=\"en\"/>"));

        // An unresolvable language label omits the attribute entirely.
        let xml = convert("L 0017  forgotten\n");
        assert!(xml.contains("<lang id=\"0017\" label=\"forgotten\"/>"));
    }

    #[test]
    fn test_label_escaping() {
        let xml = convert("0001  AT&T <\"Labs\">\n");
        assert!(xml.contains("label=\"AT&amp;T &lt;&quot;Labs&quot;&gt;\""));
    }

    #[test]
    fn test_comments_and_blanks_skipped() {
        let xml = convert("# comment\n\n0a5c  Broadcom Corp\n\n# tail\n");
        assert!(xml.contains("<vendor id=\"0A5C\""));
        assert!(!xml.contains("comment"));
    }

    #[test]
    fn test_empty_input_yields_empty_document() {
        assert_eq!(
            convert(""),
            "<?xml version=\"1.0\"?>\n\
             <usbclassid xmlns=\"https://usbatlas.dev/xmlns/usbclassid\">\n\
             </usbclassid>"
        );
    }

    #[test]
    fn test_end_of_stream_is_latched() {
        let mut reader = IdsToXml::new("0a5c  Broadcom Corp\n".as_bytes());
        let mut out = String::new();
        reader.read_to_string(&mut out).unwrap();
        let mut buf = [0u8; 16];
        assert_eq!(reader.read(&mut buf).unwrap(), 0);
        assert_eq!(reader.read(&mut buf).unwrap(), 0);
    }

    #[test]
    fn test_single_byte_reads_match_bulk_read() {
        let ids = "0a5c  Broadcom Corp\n\t0001  Product A\nC 09  Hub\n\t00  Unused\n";
        let bulk = convert(ids);

        let mut reader = IdsToXml::new(ids.as_bytes());
        let mut trickled = Vec::new();
        let mut byte = [0u8; 1];
        loop {
            match reader.read(&mut byte).unwrap() {
                0 => break,
                n => trickled.extend_from_slice(&byte[..n]),
            }
        }
        assert_eq!(String::from_utf8(trickled).unwrap(), bulk);
    }
}
