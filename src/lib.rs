//! `docforge`: a library for reading, transforming, and writing PDF
//! documents — parsing the object model, resolving cross-references
//! (tables and streams alike), decoding the standard filter pipeline,
//! re-serializing byte-for-byte valid output, manipulating page trees
//! (split/merge/rotate/crop/stamp/optimize), and appending incrementally
//! updated, digitally signed revisions.

pub mod destinations;
pub mod document;
pub mod error;
pub mod filters;
pub mod incremental;
pub mod lexer;
pub mod mutator;
pub mod object;
pub mod object_stream;
pub mod page_tree;
pub mod parser;
pub mod reader;
#[cfg(feature = "signing")]
pub mod signing;
pub mod writer;
mod xref;

pub use destinations::Destination;
pub use document::Document;
pub use error::{Error, Result};
pub use incremental::IncrementalDocument;
pub use object::{Dictionary, Object, ObjectId, ObjectMap, Stream, StringFormat};
pub use page_tree::PageHandle;
pub use reader::PdfMetadata;
pub use writer::{write, WriteOptions, XrefFormat};
