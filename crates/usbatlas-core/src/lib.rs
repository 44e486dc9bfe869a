//! usbatlas-core - Composite-key USB identifier name registry
//!
//! This crate compiles `usbclassid` XML documents (produced by the
//! streaming transducer in `usbatlas-ids`, or externally authored) into an
//! immutable registry of composite-key lookup maps, and exposes the query
//! API that resolves raw descriptor integers into human-readable names.

pub mod langid;
pub mod registry;

pub use registry::{
    LanguageEntry, LocaleId, Registry, RegistryBuilder, RegistryError, RegistryStats,
};
