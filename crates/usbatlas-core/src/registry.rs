//! Registry construction and the name lookup API
//!
//! A [`Registry`] is compiled from one or more `usbclassid` XML documents
//! (streamed from the flat-text registry through `usbatlas-ids`, or
//! externally authored). The walk is event-driven with an explicit ancestor
//! stack: each namespace-qualified element is validated against the tag
//! chain its own tag implies, and on a full match the chain's ids become a
//! composite key in one of three lookup maps. Once built, a registry is
//! immutable and can be shared across threads without locking.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::reader::NsReader;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, trace, warn};

use usbatlas_ids::{IdsToXml, XMLNS};

use crate::langid;

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse document: {0}")]
    Parse(String),
}

/// Ordered sequence of up to three ids identifying one entry across the
/// hierarchy levels. Equality and hashing are element-wise; unused slots
/// are zeroed by construction so the derived impls stay consistent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct CompositeKey {
    ids: [u16; 3],
    len: u8,
}

impl CompositeKey {
    fn new(ids: &[u16]) -> Self {
        debug_assert!(!ids.is_empty() && ids.len() <= 3);
        let mut slots = [0u16; 3];
        slots[..ids.len()].copy_from_slice(ids);
        Self {
            ids: slots,
            len: ids.len() as u8,
        }
    }
}

impl fmt::Display for CompositeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, id) in self.ids[..self.len as usize].iter().enumerate() {
            if i != 0 {
                write!(f, ":")?;
            }
            write!(f, "{:X}", id)?;
        }
        Ok(())
    }
}

/// Parsed `locale` attribute value: a lowercase ISO language code,
/// optionally with an uppercase country code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocaleId {
    pub language: String,
    pub country: Option<String>,
}

impl LocaleId {
    /// Parses `"ll"` or `"ll_CC"`; anything else yields `None`.
    pub fn parse(value: &str) -> Option<Self> {
        if value.is_empty() {
            return None;
        }
        let mut parts = value.split('_');
        let language = parts.next()?.to_string();
        match (parts.next(), parts.next()) {
            (None, _) => Some(Self {
                language,
                country: None,
            }),
            (Some(country), None) => Some(Self {
                language,
                country: Some(country.to_string()),
            }),
            _ => None,
        }
    }
}

impl fmt::Display for LocaleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.country {
            Some(country) => write!(f, "{}_{}", self.language, country),
            None => write!(f, "{}", self.language),
        }
    }
}

/// A language-family registry entry.
///
/// `locale` is `None` when the element existed but carried no locale
/// attribute (the resolver could not classify its label at build time) -
/// distinct from the language id being unknown to the registry altogether.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageEntry {
    pub label: String,
    pub locale: Option<LocaleId>,
}

/// Entry counts per lookup map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryStats {
    pub name_entries: usize,
    pub class_entries: usize,
    pub language_entries: usize,
}

/// Which lookup map an element family feeds.
#[derive(Debug, Clone, Copy)]
enum Family {
    Names,
    Classes,
    Languages,
}

/// Expected root-to-element tag chain for a registry element, and the map
/// family its entries belong to.
fn template_for(tag: &str) -> Option<(&'static [&'static str], Family)> {
    let entry: (&'static [&'static str], Family) = match tag {
        "vendor" => (&["vendor"], Family::Names),
        "product" => (&["vendor", "product"], Family::Names),
        "interface" => (&["vendor", "product", "interface"], Family::Names),
        "class" => (&["class"], Family::Classes),
        "subclass" => (&["class", "subclass"], Family::Classes),
        "protocol" => (&["class", "subclass", "protocol"], Family::Classes),
        "lang" => (&["lang"], Family::Languages),
        "dialect" => (&["lang", "dialect"], Family::Languages),
        _ => return None,
    };
    Some(entry)
}

/// One namespace-qualified element on the walk's ancestor stack.
struct Frame {
    tag: String,
    /// Raw id attribute text; parsed on key derivation so a malformed id
    /// only skips the entries whose chain needs it.
    id: Option<String>,
    label: String,
    locale: Option<LocaleId>,
}

fn in_namespace(resolve: &ResolveResult) -> bool {
    matches!(resolve, ResolveResult::Bound(Namespace(ns)) if *ns == XMLNS.as_bytes())
}

fn parse_frame(element: &BytesStart) -> Result<Frame, RegistryError> {
    let tag = String::from_utf8_lossy(element.local_name().as_ref()).into_owned();
    let mut id = None;
    let mut label = String::new();
    let mut locale = None;
    for attr in element.attributes() {
        let attr = attr.map_err(|e| RegistryError::Parse(e.to_string()))?;
        let value = attr
            .unescape_value()
            .map_err(|e| RegistryError::Parse(e.to_string()))?;
        match attr.key.as_ref() {
            b"id" => id = Some(value.into_owned()),
            b"label" => label = value.into_owned(),
            b"locale" => locale = LocaleId::parse(&value),
            _ => {}
        }
    }
    Ok(Frame {
        tag,
        id,
        label,
        locale,
    })
}

/// Immutable composite-key lookup tables for USB identifier names.
///
/// Built once via [`RegistryBuilder`] or the `from_*` constructors, then
/// read-only; lookups never fail, they return an empty string (or `None`
/// for language entries) when a key has no match.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    /// vendor / vendor:product / vendor:product:interface labels.
    vendor_names: HashMap<CompositeKey, String>,
    /// class / class:subclass / class:subclass:protocol labels.
    class_names: HashMap<CompositeKey, String>,
    /// lang / lang:dialect entries.
    languages: HashMap<CompositeKey, LanguageEntry>,
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Builds a registry from a single `usbclassid` XML document.
    pub fn from_xml_reader(reader: impl BufRead) -> Result<Self, RegistryError> {
        Ok(Self::builder().add_xml_reader(reader)?.build())
    }

    pub fn from_xml_str(xml: &str) -> Result<Self, RegistryError> {
        Self::from_xml_reader(xml.as_bytes())
    }

    pub fn from_xml_file(path: &Path) -> Result<Self, RegistryError> {
        Ok(Self::builder().add_xml_file(path)?.build())
    }

    /// Builds a registry from a flat-text registry source, streamed through
    /// the IDS-to-XML transducer.
    pub fn from_ids_reader(reader: impl BufRead) -> Result<Self, RegistryError> {
        Ok(Self::builder().add_ids_reader(reader)?.build())
    }

    pub fn from_ids_str(ids: &str) -> Result<Self, RegistryError> {
        Self::from_ids_reader(ids.as_bytes())
    }

    pub fn from_ids_file(path: &Path) -> Result<Self, RegistryError> {
        Ok(Self::builder().add_ids_file(path)?.build())
    }

    /// Vendor name, or the empty string when undefined.
    pub fn vendor_name(&self, vendor: u16) -> &str {
        self.name_in(&self.vendor_names, &[vendor])
    }

    /// Product name, or the empty string when undefined.
    pub fn product_name(&self, vendor: u16, product: u16) -> &str {
        self.name_in(&self.vendor_names, &[vendor, product])
    }

    /// Interface name, or the empty string when undefined.
    pub fn interface_name(&self, vendor: u16, product: u16, interface: u8) -> &str {
        self.name_in(&self.vendor_names, &[vendor, product, interface as u16])
    }

    /// Device or interface class name, or the empty string when undefined.
    pub fn class_name(&self, class: u8) -> &str {
        self.name_in(&self.class_names, &[class as u16])
    }

    /// Subclass name, or the empty string when undefined.
    pub fn subclass_name(&self, class: u8, subclass: u8) -> &str {
        self.name_in(&self.class_names, &[class as u16, subclass as u16])
    }

    /// Protocol name, or the empty string when undefined.
    pub fn protocol_name(&self, class: u8, subclass: u8, protocol: u8) -> &str {
        self.name_in(
            &self.class_names,
            &[class as u16, subclass as u16, protocol as u16],
        )
    }

    fn name_in<'a>(&self, map: &'a HashMap<CompositeKey, String>, ids: &[u16]) -> &'a str {
        map.get(&CompositeKey::new(ids))
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Looks up the entry for a 16-bit language identifier.
    ///
    /// Two-step fallback: the exact `(primary, sub)` key first, then the
    /// `(primary)`-only key. `None` means the language id is unknown to the
    /// registry, which is distinct from a returned entry without a locale.
    pub fn language(&self, langid: u16) -> Option<&LanguageEntry> {
        let primary = langid::primary_language(langid);
        let sub = langid::sub_language(langid);
        self.languages
            .get(&CompositeKey::new(&[primary, sub]))
            .or_else(|| self.languages.get(&CompositeKey::new(&[primary])))
    }

    /// Language display label, or the empty string when undefined.
    pub fn language_name(&self, langid: u16) -> &str {
        self.language(langid)
            .map(|entry| entry.label.as_str())
            .unwrap_or("")
    }

    /// Locale of a language identifier; `None` when the id is unknown or
    /// the entry carries no locale (use [`Registry::language`] to tell the
    /// two apart).
    pub fn language_locale(&self, langid: u16) -> Option<&LocaleId> {
        self.language(langid).and_then(|entry| entry.locale.as_ref())
    }

    /// Every language identifier the registry can resolve, packed into
    /// 16-bit LANGIDs. Primary-only entries pack with sub-language `0x01`.
    pub fn available_langids(&self) -> BTreeSet<u16> {
        self.languages
            .keys()
            .map(|key| match key.len {
                1 => langid::langid(key.ids[0], 0x01),
                _ => langid::langid(key.ids[0], key.ids[1]),
            })
            .collect()
    }

    /// Entry counts per lookup map.
    pub fn stats(&self) -> RegistryStats {
        RegistryStats {
            name_entries: self.vendor_names.len(),
            class_entries: self.class_names.len(),
            language_entries: self.languages.len(),
        }
    }

    /// Walks one document and merges its entries, last write winning.
    fn absorb_document(&mut self, reader: impl BufRead) -> Result<(), RegistryError> {
        let mut xml = NsReader::from_reader(reader);
        let mut buf = Vec::new();
        let mut stack: Vec<Option<Frame>> = Vec::new();
        loop {
            buf.clear();
            let (resolve, event) = xml
                .read_resolved_event_into(&mut buf)
                .map_err(|e| RegistryError::Parse(e.to_string()))?;
            match event {
                Event::Start(e) => {
                    let frame = if in_namespace(&resolve) {
                        Some(parse_frame(&e)?)
                    } else {
                        None
                    };
                    if let Some(frame) = &frame {
                        self.absorb_element(&stack, frame);
                    }
                    stack.push(frame);
                }
                Event::Empty(e) => {
                    if in_namespace(&resolve) {
                        let frame = parse_frame(&e)?;
                        self.absorb_element(&stack, &frame);
                    }
                }
                Event::End(_) => {
                    stack.pop();
                }
                Event::Eof => break,
                _ => {}
            }
        }
        Ok(())
    }

    /// Validates one element's ancestor chain against its tag template and
    /// inserts the entry on a full match. Mismatches and unparseable ids
    /// are silent skips; the subtree is traversed regardless.
    fn absorb_element(&mut self, ancestors: &[Option<Frame>], element: &Frame) {
        let Some((template, family)) = template_for(&element.tag) else {
            debug!(tag = %element.tag, "unknown element");
            return;
        };

        let chain: Vec<&Frame> = ancestors
            .iter()
            .flatten()
            .chain(std::iter::once(element))
            .collect();
        if chain.len() < template.len() {
            return;
        }
        let tail = &chain[chain.len() - template.len()..];
        if tail.iter().zip(template.iter()).any(|(f, t)| f.tag != *t) {
            return;
        }

        let mut ids = Vec::with_capacity(tail.len());
        for frame in tail {
            match frame
                .id
                .as_deref()
                .and_then(|text| u16::from_str_radix(text, 16).ok())
            {
                Some(value) => ids.push(value),
                None => {
                    warn!(
                        tag = %element.tag,
                        id = frame.id.as_deref().unwrap_or(""),
                        "unparseable id attribute, entry skipped"
                    );
                    return;
                }
            }
        }
        let key = CompositeKey::new(&ids);

        match family {
            Family::Names => {
                trace!(%key, label = %element.label, "name entry");
                self.vendor_names.insert(key, element.label.clone());
            }
            Family::Classes => {
                trace!(%key, label = %element.label, "class entry");
                self.class_names.insert(key, element.label.clone());
            }
            Family::Languages => {
                trace!(%key, label = %element.label, "language entry");
                self.languages.insert(
                    key,
                    LanguageEntry {
                        label: element.label.clone(),
                        locale: element.locale.clone(),
                    },
                );
            }
        }
    }
}

/// Merges one or more ordered document sources into a [`Registry`].
///
/// Sources are applied strictly in call order; later entries overwrite
/// earlier ones sharing a key. A failure in a later source leaves the
/// builder consumed - construction is all-or-nothing for the caller.
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    registry: Registry,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges a `usbclassid` XML document.
    pub fn add_xml_reader(mut self, reader: impl BufRead) -> Result<Self, RegistryError> {
        self.registry.absorb_document(reader)?;
        Ok(self)
    }

    pub fn add_xml_str(self, xml: &str) -> Result<Self, RegistryError> {
        self.add_xml_reader(xml.as_bytes())
    }

    pub fn add_xml_file(self, path: &Path) -> Result<Self, RegistryError> {
        let file = File::open(path)?;
        self.add_xml_reader(BufReader::new(file))
    }

    /// Merges a flat-text registry source through the streaming transducer.
    pub fn add_ids_reader(self, reader: impl BufRead) -> Result<Self, RegistryError> {
        self.add_xml_reader(BufReader::new(IdsToXml::new(reader)))
    }

    pub fn add_ids_str(self, ids: &str) -> Result<Self, RegistryError> {
        self.add_ids_reader(ids.as_bytes())
    }

    pub fn add_ids_file(self, path: &Path) -> Result<Self, RegistryError> {
        let file = File::open(path)?;
        self.add_ids_reader(BufReader::new(file))
    }

    pub fn build(self) -> Registry {
        let registry = self.registry;
        debug!(stats = ?registry.stats(), "registry built");
        registry
    }
}
