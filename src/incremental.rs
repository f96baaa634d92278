use std::collections::HashSet;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::document::Document;
use crate::object::{Object, ObjectId};
use crate::writer::ObjectWriter;
use crate::Result;

/// A document paired with the exact bytes it was parsed from, so further
/// edits can be appended as a new revision instead of rewriting the whole
/// file. This is the structure `IncrementalSigner` builds on: every
/// revision it appends keeps the previous bytes byte-for-byte intact.
pub struct IncrementalDocument {
    pub original_bytes: Vec<u8>,
    pub document: Document,
    /// Object ids added or changed since `original_bytes` was parsed. Only
    /// these are re-serialized into the appended revision.
    dirty: HashSet<ObjectId>,
}

impl IncrementalDocument {
    pub fn create_from(original_bytes: Vec<u8>, document: Document) -> Self {
        IncrementalDocument { original_bytes, document, dirty: HashSet::new() }
    }

    pub fn add_object<O: Into<Object>>(&mut self, object: O) -> ObjectId {
        let id = self.document.add_object(object);
        self.dirty.insert(id);
        id
    }

    pub fn set_object<O: Into<Object>>(&mut self, id: ObjectId, object: O) {
        self.document.set_object(id, object);
        self.dirty.insert(id);
    }

    pub fn mark_dirty(&mut self, id: ObjectId) {
        self.dirty.insert(id);
    }

    pub fn dirty_ids(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.dirty.iter().copied()
    }

    /// Appends the objects modified since parsing as a new xref/trailer
    /// revision, writing `/Prev` back to the previous startxref offset.
    pub fn save<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let mut file = File::create(path)?;
        self.save_to(&mut file)
    }

    pub fn save_to<W: Write>(&mut self, target: &mut W) -> Result<()> {
        target.write_all(&self.original_bytes)?;
        let mut writer = ObjectWriter::new_incremental(self.original_bytes.len() as u64, self.document.xref_start as u64);
        writer.write_revision(target, &self.document, self.dirty.iter().copied())
    }

    pub fn save_to_bytes(&mut self) -> Result<Vec<u8>> {
        let mut out = io::Cursor::new(Vec::new());
        self.save_to(&mut out)?;
        Ok(out.into_inner())
    }
}
