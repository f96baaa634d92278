use std::collections::HashSet;

use crate::error::Error;
use crate::object::{Dictionary, Object, ObjectId, ObjectMap};
use crate::xref::Xref;
use crate::Result;

/// The full in-memory representation of a PDF: every reachable object plus
/// enough of the original file structure (xref, trailer, binary marker) to
/// reproduce or extend it faithfully.
#[derive(Debug, Clone)]
pub struct Document {
    /// `"1.N"` from the `%PDF-1.N` header.
    pub version: String,
    /// The high-byte marker comment on the line following the header,
    /// preserved so `save` reproduces it (writers check for it to assume
    /// the file is binary-safe).
    pub binary_mark: Vec<u8>,
    pub xref_start: usize,
    pub max_id: u32,
    pub trailer: Dictionary,
    pub reference_table: Xref,
    pub objects: ObjectMap,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        Document {
            version: String::from("1.5"),
            binary_mark: vec![0xE2, 0xE3, 0xCF, 0xD3],
            xref_start: 0,
            max_id: 0,
            trailer: Dictionary::new(),
            reference_table: Xref::new(0),
            objects: ObjectMap::new(),
        }
    }

    pub fn with_version<S: Into<String>>(version: S) -> Self {
        Document { version: version.into(), ..Self::new() }
    }

    /// Next unused object number, for allocating a fresh object.
    pub fn new_object_id(&mut self) -> ObjectId {
        self.max_id += 1;
        (self.max_id, 0)
    }

    pub fn add_object<O: Into<Object>>(&mut self, object: O) -> ObjectId {
        let id = self.new_object_id();
        self.objects.insert(id, object.into());
        id
    }

    pub fn set_object<O: Into<Object>>(&mut self, id: ObjectId, object: O) {
        self.max_id = self.max_id.max(id.0);
        self.objects.insert(id, object.into());
    }

    pub fn get_object(&self, id: ObjectId) -> Result<&Object> {
        self.objects.get(&id).ok_or(Error::Resolution(id))
    }

    pub fn get_object_mut(&mut self, id: ObjectId) -> Result<&mut Object> {
        self.objects.get_mut(&id).ok_or(Error::Resolution(id))
    }

    pub fn get_dictionary(&self, id: ObjectId) -> Result<&Dictionary> {
        self.get_object(id)?.as_dict()
    }

    /// Follows `object` one hop if it is a `Reference`, returning the
    /// resolved id and object; otherwise echoes `object` back with id
    /// `(0, 0)`. Matches lopdf's convention of returning the id alongside
    /// the value so callers can detect self-reference cycles.
    pub fn dereference<'a>(&'a self, object: &'a Object) -> Result<(Option<ObjectId>, &'a Object)> {
        match object {
            Object::Reference(id) => {
                let resolved = self.get_object(*id)?;
                Ok((Some(*id), resolved))
            }
            other => Ok((None, other)),
        }
    }

    /// Like `dereference` but follows chained references until a
    /// non-reference value is found, guarding against cycles.
    pub fn resolve(&self, object: &Object) -> Result<&Object> {
        let mut current = object;
        let mut seen = HashSet::new();
        loop {
            match current {
                Object::Reference(id) => {
                    if !seen.insert(*id) {
                        return Err(Error::ReferenceCycle(*id));
                    }
                    current = self.get_object(*id)?;
                }
                other => return Ok(other),
            }
        }
    }

    pub fn catalog(&self) -> Result<&Dictionary> {
        let root = self.trailer.get(b"Root").and_then(Object::as_reference)?;
        self.get_dictionary(root)
    }

    pub fn catalog_mut(&mut self) -> Result<&mut Dictionary> {
        let root = self.trailer.get(b"Root").and_then(Object::as_reference)?;
        self.get_object_mut(root)?.as_dict_mut()
    }

    pub fn trailer(&self) -> &Dictionary {
        &self.trailer
    }

    /// Decompresses every stream's content in place. Mutations that add
    /// objects through the `Mutator` components typically need object
    /// content to already be decoded.
    pub fn decompress(&mut self) {
        for object in self.objects.values_mut() {
            if let Ok(stream) = object.as_stream_mut() {
                let _ = stream.decompress();
            }
        }
    }
}
