//! Appends a new content stream to selected pages of a freshly copied
//! document. Drawing operators are supplied by the caller; this layer only
//! guarantees the appended stream is wired in without disturbing the
//! original content.

use super::{copy_all_pages, finish_document};
use crate::document::Document;
use crate::object::{Object, Stream};
use crate::Result;

pub struct Stamper;

impl Stamper {
    /// Appends `content` (raw, uncompressed operator bytes) to `/Contents`
    /// on every page in `indices` (empty means all pages) of a fresh copy
    /// of `source`. An existing single-stream `/Contents` is turned into a
    /// two-element array so both streams still concatenate correctly per
    /// ISO 32000-1 §7.8.2.
    pub fn stamp(source: &Document, indices: &[u32], content: Vec<u8>) -> Result<Document> {
        let mut target = Document::new();
        let leaves = copy_all_pages(source, &mut target)?;
        let selected: Vec<usize> = if indices.is_empty() {
            (0..leaves.len()).collect()
        } else {
            indices.iter().map(|&i| i as usize).collect()
        };

        for &i in &selected {
            let Some(&leaf) = leaves.get(i) else { continue };
            let stamp_id = target.add_object(Stream::new(Default::default(), content.clone()));

            let dict = target.get_object_mut(leaf)?.as_dict_mut()?;
            let existing = dict.get(b"Contents").ok().cloned();
            let new_contents = match existing {
                Some(Object::Array(mut arr)) => {
                    arr.push(Object::Reference(stamp_id));
                    Object::Array(arr)
                }
                Some(other @ Object::Reference(_)) => Object::Array(vec![other, Object::Reference(stamp_id)]),
                _ => Object::Reference(stamp_id),
            };
            dict.set("Contents", new_contents);
        }

        finish_document(&mut target, &leaves)?;
        Ok(target)
    }
}
