//! Page-level document mutators: split, merge, rotate, crop, stamp, and a
//! textual-scan optimizer. Every mutator here follows the same shape —
//! deep-copy the selected pages into a fresh object store via
//! [`PageGraphCopier`], then synthesize a new `/Pages` root, `/Catalog`,
//! and `/Info` around the copies. The source document is never mutated.

mod cropper;
mod merger;
mod optimizer;
mod page_graph_copier;
mod rotator;
mod splitter;
mod stamper;

pub use cropper::Cropper;
pub use merger::Merger;
pub use optimizer::{Optimizer, OptimizerLevel, OptimizerStats};
pub use page_graph_copier::PageGraphCopier;
pub use rotator::Rotator;
pub use splitter::Splitter;
pub use stamper::Stamper;

use crate::document::Document;
use crate::object::{Dictionary, Object, ObjectId};
use crate::Result;

/// Assembles the `/Pages` root, `/Catalog`, and `/Info` around a set of
/// already-copied page leaves, and points each leaf's `/Parent` at the new
/// root. Shared by every mutator that produces a whole fresh document.
pub(crate) fn finish_document(target: &mut Document, leaves: &[ObjectId]) -> Result<ObjectId> {
    let pages_id = target.new_object_id();

    let mut pages_dict = Dictionary::new();
    pages_dict.set("Type", Object::Name(b"Pages".to_vec()));
    pages_dict.set("Kids", Object::Array(leaves.iter().map(|&id| Object::Reference(id)).collect()));
    pages_dict.set("Count", Object::Integer(leaves.len() as i64));
    target.set_object(pages_id, pages_dict);

    for &leaf in leaves {
        target.get_object_mut(leaf)?.as_dict_mut()?.set("Parent", pages_id);
    }

    let mut catalog = Dictionary::new();
    catalog.set("Type", Object::Name(b"Catalog".to_vec()));
    catalog.set("Pages", pages_id);
    let catalog_id = target.add_object(catalog);

    let mut info = Dictionary::new();
    info.set("Producer", Object::string_literal(b"docforge".to_vec()));
    let info_id = target.add_object(info);

    target.trailer.set("Root", catalog_id);
    target.trailer.set("Info", info_id);

    Ok(pages_id)
}

/// Copies every page of `source` into `target` (a fresh document sharing
/// one copier so duplicated resources are only copied once), returning
/// the new ids in page order.
pub(crate) fn copy_all_pages(source: &Document, target: &mut Document) -> Result<Vec<ObjectId>> {
    let mut copier = PageGraphCopier::new(source, target);
    source.pages().map(|page| copier.copy_page(page.id)).collect()
}
