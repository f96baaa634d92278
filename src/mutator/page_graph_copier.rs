//! Deep-copies a page's reachable object subgraph into a fresh document,
//! assigning new object numbers and cutting `/Parent` back-edges.

use crate::document::Document;
use crate::object::{Dictionary, Object, ObjectId};
use crate::Result;
use std::collections::HashMap;

/// Copies pages one at a time from `source` into `target`, renumbering
/// every transitively reachable object. A single copier instance should be
/// used for every page pulled from the same source so shared resources
/// (fonts, images) are only copied once per source.
pub struct PageGraphCopier<'a> {
    source: &'a Document,
    target: &'a mut Document,
    id_map: HashMap<ObjectId, ObjectId>,
}

impl<'a> PageGraphCopier<'a> {
    pub fn new(source: &'a Document, target: &'a mut Document) -> Self {
        PageGraphCopier { source, target, id_map: HashMap::new() }
    }

    /// Copies the page dictionary at `page_id` and everything it
    /// transitively references (except through `/Parent`) into `target`,
    /// returning the new id of the copied page leaf. `/MediaBox` is
    /// resolved through the source's inheritance chain and stamped
    /// explicitly onto the copy, since the `/Parent` edge that would have
    /// carried it is cut.
    pub fn copy_page(&mut self, page_id: ObjectId) -> Result<ObjectId> {
        let new_id = self.copy_object(page_id)?;
        if self.target.get_dictionary(new_id)?.get(b"MediaBox").is_err() {
            if let Some(inherited) = self.source.inherited(page_id, b"MediaBox")? {
                let rewritten = self.rewrite_value(inherited.clone())?;
                self.target.get_object_mut(new_id)?.as_dict_mut()?.set("MediaBox", rewritten);
            }
        }
        Ok(new_id)
    }

    fn copy_object(&mut self, old_id: ObjectId) -> Result<ObjectId> {
        if let Some(&new_id) = self.id_map.get(&old_id) {
            return Ok(new_id);
        }
        let new_id = self.target.new_object_id();
        self.id_map.insert(old_id, new_id);

        let object = self.source.get_object(old_id)?.clone();
        let rewritten = self.rewrite_value(object)?;
        self.target.set_object(new_id, rewritten);
        Ok(new_id)
    }

    fn rewrite_dict(&mut self, dict: &Dictionary) -> Result<Dictionary> {
        let mut out = Dictionary::new();
        for (key, value) in dict.iter() {
            if key.as_slice() == b"Parent" {
                continue;
            }
            let rewritten = self.rewrite_value(value.clone())?;
            out.set(key.clone(), rewritten);
        }
        Ok(out)
    }

    fn rewrite_value(&mut self, value: Object) -> Result<Object> {
        match value {
            Object::Reference(id) => Ok(Object::Reference(self.copy_object(id)?)),
            Object::Dictionary(dict) => Ok(Object::Dictionary(self.rewrite_dict(&dict)?)),
            Object::Array(items) => {
                let rewritten = items.into_iter().map(|item| self.rewrite_value(item)).collect::<Result<Vec<_>>>()?;
                Ok(Object::Array(rewritten))
            }
            Object::Stream(mut stream) => {
                stream.dict = self.rewrite_dict(&stream.dict)?;
                Ok(Object::Stream(stream))
            }
            other => Ok(other),
        }
    }
}
