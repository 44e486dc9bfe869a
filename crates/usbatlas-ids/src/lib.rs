//! usbatlas-ids - Flat-text USB ID registry handling
//!
//! This crate provides the flat-text side of usbatlas:
//! - Line classification for the prefix-encoded registry format
//! - Locale resolution for language and dialect records
//! - A streaming transducer that converts the flat-text registry into a
//!   namespace-qualified XML document in a single constant-memory pass

pub mod line;
pub mod locale;
pub mod transducer;

pub use line::{classify, ClassifiedLine, LineKind};
pub use transducer::{ids_to_xml_string, IdsToXml, ROOT_TAG, XMLNS};
