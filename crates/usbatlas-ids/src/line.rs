//! Line classification for the flat-text USB ID registry format
//!
//! The registry encodes its hierarchy with line prefixes: vendor, class and
//! language records start at column 0, their children carry one leading tab,
//! and grandchildren carry two. Class-family and language-family roots are
//! distinguished from vendors by a single-letter code token (`C` or `L`).

use tracing::trace;

/// Kind of record a registry line introduces.
///
/// Lines that match no pattern (or match one with an unexpected parent) are
/// unrecognized and classify to `None` rather than a variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Vendor,
    Product,
    /// Never produced by [`classify`]: depth-2 lines under a product were
    /// dropped by the reference behavior and remain so. The registry still
    /// accepts `interface` elements from externally authored documents.
    Interface,
    Class,
    Subclass,
    Protocol,
    Lang,
    Dialect,
}

impl LineKind {
    /// Element tag emitted for this record kind.
    pub fn tag(self) -> &'static str {
        match self {
            LineKind::Vendor => "vendor",
            LineKind::Product => "product",
            LineKind::Interface => "interface",
            LineKind::Class => "class",
            LineKind::Subclass => "subclass",
            LineKind::Protocol => "protocol",
            LineKind::Lang => "lang",
            LineKind::Dialect => "dialect",
        }
    }

    /// Nesting depth below the document root (0..=2).
    pub fn depth(self) -> usize {
        match self {
            LineKind::Vendor | LineKind::Class | LineKind::Lang => 0,
            LineKind::Product | LineKind::Subclass | LineKind::Dialect => 1,
            LineKind::Interface | LineKind::Protocol => 2,
        }
    }

    /// Whether this kind carries a `locale` attribute in the document model.
    pub fn has_locale(self) -> bool {
        matches!(self, LineKind::Lang | LineKind::Dialect)
    }
}

/// A classified registry line, borrowing id and label from the input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedLine<'a> {
    pub kind: LineKind,
    /// Hexadecimal id text as written in the source (may be empty for coded
    /// lines whose id group matched nothing).
    pub id: &'a str,
    /// Label text, everything after the separating whitespace run.
    pub label: &'a str,
}

impl ClassifiedLine<'_> {
    /// Nesting depth below the document root (0..=2).
    pub fn depth(&self) -> usize {
        self.kind.depth()
    }
}

/// Classifies one registry line against the currently open records.
///
/// `open` lists the kinds of the open records, root first; a tab-indented
/// line at depth *d* is only meaningful relative to the open record at
/// depth *d - 1*. Blank lines and `#` comments are expected to be filtered
/// out by the caller. Returns `None` for every unrecognized line;
/// classification never fails.
pub fn classify<'a>(line: &'a str, open: &[LineKind]) -> Option<ClassifiedLine<'a>> {
    if let Some(rest) = line.strip_prefix("\t\t") {
        let (id, label) = id_label(rest, true)?;
        let kind = match open.get(1)? {
            LineKind::Subclass => LineKind::Protocol,
            // A product parent never matched in the reference behavior
            // (misspelled tag comparison), so such lines stay dropped.
            other => {
                trace!(?other, "two-tab line under unexpected parent, dropped");
                return None;
            }
        };
        return Some(ClassifiedLine { kind, id, label });
    }

    if let Some(rest) = line.strip_prefix('\t') {
        let (id, label) = id_label(rest, true)?;
        let kind = match open.first()? {
            LineKind::Vendor => LineKind::Product,
            LineKind::Class => LineKind::Subclass,
            LineKind::Lang => LineKind::Dialect,
            other => {
                trace!(?other, "one-tab line under unexpected parent, dropped");
                return None;
            }
        };
        return Some(ClassifiedLine { kind, id, label });
    }

    // Vendor lines take priority over coded lines; vendor ids are lowercase
    // hex only, so an uppercase code token cannot shadow them.
    if let Some((id, label)) = id_label(line, false) {
        return Some(ClassifiedLine {
            kind: LineKind::Vendor,
            id,
            label,
        });
    }

    if let Some((code, id, label)) = coded_line(line) {
        let kind = match code {
            "C" => LineKind::Class,
            "L" => LineKind::Lang,
            other => {
                trace!(code = other, "unknown class code, line dropped");
                return None;
            }
        };
        return Some(ClassifiedLine { kind, id, label });
    }

    None
}

fn is_hex(c: char, mixed_case: bool) -> bool {
    c.is_ascii_digit() || ('a'..='f').contains(&c) || (mixed_case && ('A'..='F').contains(&c))
}

/// Matches `hex-id, whitespace, label` against the whole of `s`.
///
/// The id run must be non-empty and the separating whitespace run at least
/// one character; the label may be empty. Tab-indented records accept mixed
/// case hex, column-0 records lowercase only.
fn id_label(s: &str, mixed_case: bool) -> Option<(&str, &str)> {
    let hex_end = s
        .find(|c: char| !is_hex(c, mixed_case))
        .unwrap_or(s.len());
    if hex_end == 0 {
        return None;
    }
    let (id, rest) = s.split_at(hex_end);
    let ws_end = rest
        .find(|c: char| !c.is_ascii_whitespace())
        .unwrap_or(rest.len());
    if ws_end == 0 {
        return None;
    }
    Some((id, &rest[ws_end..]))
}

/// Matches `code, whitespace, hex-id (possibly empty), whitespace, label`.
///
/// The code is one or more uppercase letters. An empty id group is only
/// possible when the single whitespace run after the code is long enough to
/// be split in two (length >= 2), mirroring the reference pattern
/// `([A-Z]+)\s+([0-9a-f]*)\s+(.*)`.
fn coded_line(s: &str) -> Option<(&str, &str, &str)> {
    let code_end = s
        .find(|c: char| !c.is_ascii_uppercase())
        .unwrap_or(s.len());
    if code_end == 0 {
        return None;
    }
    let (code, rest) = s.split_at(code_end);
    let ws_end = rest
        .find(|c: char| !c.is_ascii_whitespace())
        .unwrap_or(rest.len());
    if ws_end == 0 {
        return None;
    }
    let after_ws = &rest[ws_end..];
    let hex_end = after_ws
        .find(|c: char| !is_hex(c, false))
        .unwrap_or(after_ws.len());
    if hex_end > 0 {
        let (id, tail) = after_ws.split_at(hex_end);
        let ws2_end = tail
            .find(|c: char| !c.is_ascii_whitespace())
            .unwrap_or(tail.len());
        if ws2_end > 0 {
            return Some((code, id, &tail[ws2_end..]));
        }
    }
    if ws_end >= 2 {
        return Some((code, "", after_ws));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vendor_line() {
        let c = classify("0a5c  Broadcom Corp", &[]).unwrap();
        assert_eq!(c.kind, LineKind::Vendor);
        assert_eq!(c.id, "0a5c");
        assert_eq!(c.label, "Broadcom Corp");
        assert_eq!(c.depth(), 0);
    }

    #[test]
    fn test_vendor_id_is_lowercase_only() {
        // Uppercase hex at column 0 matches neither the vendor nor the
        // coded-line pattern.
        assert!(classify("0A5C  Broadcom Corp", &[]).is_none());
    }

    #[test]
    fn test_class_and_lang_lines() {
        let c = classify("C 09  Hub", &[]).unwrap();
        assert_eq!(c.kind, LineKind::Class);
        assert_eq!(c.id, "09");
        assert_eq!(c.label, "Hub");

        let l = classify("L 0009  English", &[]).unwrap();
        assert_eq!(l.kind, LineKind::Lang);
        assert_eq!(l.id, "0009");
        assert_eq!(l.label, "English");
    }

    #[test]
    fn test_unknown_code_dropped() {
        assert!(classify("X 09  Something", &[]).is_none());
        assert!(classify("HUT 12  Phone", &[]).is_none());
    }

    #[test]
    fn test_coded_line_empty_id() {
        // The two whitespace groups of the pattern split one run of two.
        let c = classify("C  Hub", &[]).unwrap();
        assert_eq!(c.kind, LineKind::Class);
        assert_eq!(c.id, "");
        assert_eq!(c.label, "Hub");

        // A single separating space leaves nothing for the second group.
        assert!(classify("C Hub", &[]).is_none());
    }

    #[test]
    fn test_one_tab_depends_on_depth_zero_record() {
        let line = "\t0001  Product A";
        assert_eq!(
            classify(line, &[LineKind::Vendor]).unwrap().kind,
            LineKind::Product
        );
        assert_eq!(
            classify(line, &[LineKind::Class]).unwrap().kind,
            LineKind::Subclass
        );
        assert_eq!(
            classify(line, &[LineKind::Lang]).unwrap().kind,
            LineKind::Dialect
        );
        assert!(classify(line, &[]).is_none());
    }

    #[test]
    fn test_one_tab_sibling_with_deeper_records_open() {
        // A still-open sibling (or deeper) record does not shadow the
        // depth-0 ancestor the line actually nests under.
        let line = "\t0002  Product B";
        assert_eq!(
            classify(line, &[LineKind::Vendor, LineKind::Product])
                .unwrap()
                .kind,
            LineKind::Product
        );
        assert_eq!(
            classify(
                line,
                &[LineKind::Class, LineKind::Subclass, LineKind::Protocol]
            )
            .unwrap()
            .kind,
            LineKind::Subclass
        );
    }

    #[test]
    fn test_two_tab_only_under_subclass() {
        let line = "\t\t01  Keyboard";
        let c = classify(line, &[LineKind::Class, LineKind::Subclass]).unwrap();
        assert_eq!(c.kind, LineKind::Protocol);
        assert_eq!(c.depth(), 2);

        // Under a product the line is dropped, never an interface.
        assert!(classify(line, &[LineKind::Vendor, LineKind::Product]).is_none());
        // Without an open depth-1 record there is nothing to nest under.
        assert!(classify(line, &[LineKind::Class]).is_none());
        assert!(classify(line, &[]).is_none());
    }

    #[test]
    fn test_tab_lines_accept_mixed_case_hex() {
        let c = classify("\t00fF  Widget", &[LineKind::Vendor]).unwrap();
        assert_eq!(c.id, "00fF");
    }

    #[test]
    fn test_missing_label_dropped() {
        assert!(classify("0a5c", &[]).is_none());
        assert!(classify("C 09", &[]).is_none());
        assert!(classify("\t01", &[LineKind::Vendor]).is_none());
    }

    #[test]
    fn test_empty_label_kept() {
        let c = classify("0a5c ", &[]).unwrap();
        assert_eq!(c.label, "");
    }

    #[test]
    fn test_three_tabs_dropped() {
        assert!(classify("\t\t\t01  Deep", &[LineKind::Class, LineKind::Subclass]).is_none());
    }
}
