//! Concatenates pages from multiple independently-parsed source documents
//! into one fresh document.

use super::{finish_document, PageGraphCopier};
use crate::document::Document;
use crate::Result;

pub struct Merger;

impl Merger {
    /// Merges `sources` in order: page 1..n1 of the result are `sources[0]`'s
    /// pages, n1+1..n1+n2 are `sources[1]`'s, and so on.
    pub fn merge(sources: &[&Document]) -> Result<Document> {
        let mut target = Document::new();
        let mut leaves = Vec::new();

        for &source in sources {
            let mut copier = PageGraphCopier::new(source, &mut target);
            for page in source.pages() {
                leaves.push(copier.copy_page(page.id)?);
            }
        }

        finish_document(&mut target, &leaves)?;
        Ok(target)
    }
}
