//! Page-tree enumeration: descending the `/Pages` tree by summing `/Count`
//! on subtrees, without materializing the whole tree up front.

use std::collections::HashSet;

use crate::document::Document;
use crate::error::{Error, Result};
use crate::object::{Dictionary, ObjectId};

/// A resolved page leaf plus the id it lives at, handed back by
/// [`Document::page`] and [`Document::pages`].
#[derive(Debug, Clone)]
pub struct PageHandle {
    pub id: ObjectId,
}

impl Document {
    /// Total number of `/Type /Page` leaves reachable from the catalog's
    /// `/Pages` root.
    pub fn page_count(&self) -> u32 {
        let Ok(pages_id) = self.pages_root() else { return 0 };
        self.subtree_count(pages_id).unwrap_or(0)
    }

    /// The `i`-th page (0-based), found by descending the tree and summing
    /// `/Count` on sibling subtrees to skip those that don't contain `i`.
    pub fn page(&self, index: u32) -> Result<PageHandle> {
        let pages_id = self.pages_root()?;
        let mut remaining = index;
        let mut current = pages_id;
        let mut seen = HashSet::new();
        loop {
            if !seen.insert(current) {
                return Err(Error::ReferenceCycle(current));
            }
            let dict = self.get_dictionary(current)?;
            if dict.has_type(b"Page") {
                if remaining == 0 {
                    return Ok(PageHandle { id: current });
                }
                return Err(Error::Resolution(current));
            }

            let kids = dict.get(b"Kids").and_then(|o| o.as_array())?;
            let mut found = None;
            for kid in kids {
                let kid_id = kid.as_reference()?;
                let count = self.subtree_count(kid_id)?;
                if remaining < count {
                    found = Some(kid_id);
                    break;
                }
                remaining -= count;
            }
            current = found.ok_or(Error::Resolution(current))?;
        }
    }

    /// Iterates every page leaf in document order.
    pub fn pages(&self) -> impl Iterator<Item = PageHandle> + '_ {
        (0..self.page_count()).filter_map(move |i| self.page(i).ok())
    }

    fn pages_root(&self) -> Result<ObjectId> {
        self.catalog()?.get(b"Pages").and_then(|o| o.as_reference())
    }

    fn subtree_count(&self, id: ObjectId) -> Result<u32> {
        let dict = self.get_dictionary(id)?;
        if dict.has_type(b"Page") {
            return Ok(1);
        }
        if let Ok(count) = dict.get(b"Count").and_then(|o| o.as_i64()) {
            return Ok(count.max(0) as u32);
        }
        let kids = dict.get(b"Kids").and_then(|o| o.as_array())?;
        let mut total = 0;
        for kid in kids {
            total += self.subtree_count(kid.as_reference()?)?;
        }
        Ok(total)
    }

    /// `/MediaBox`, inherited from the nearest ancestor (including the
    /// `/Pages` root) when absent on the leaf itself, per the page-tree
    /// inheritance rule.
    pub fn inherited(&self, mut id: ObjectId, key: &[u8]) -> Result<Option<&crate::object::Object>> {
        let mut seen = HashSet::new();
        loop {
            if !seen.insert(id) {
                return Err(Error::ReferenceCycle(id));
            }
            let dict = self.get_dictionary(id)?;
            if let Ok(value) = dict.get(key) {
                return Ok(Some(value));
            }
            match dict.get(b"Parent").and_then(|o| o.as_reference()) {
                Ok(parent) => id = parent,
                Err(_) => return Ok(None),
            }
        }
    }
}

/// True if `dict` is a `/Pages` intermediate node rather than a leaf.
pub fn is_pages_node(dict: &Dictionary) -> bool {
    dict.has_type(b"Pages")
}
