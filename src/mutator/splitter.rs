//! Extracts a subset of pages, or splits a document into fixed-size
//! chunks, each as an independent fresh document.

use super::{finish_document, PageGraphCopier};
use crate::document::Document;
use crate::Result;

pub struct Splitter;

impl Splitter {
    /// Builds a new document containing only the pages at `indices`
    /// (0-based), in the order given.
    pub fn extract(source: &Document, indices: &[u32]) -> Result<Document> {
        let mut target = Document::new();
        let mut copier = PageGraphCopier::new(source, &mut target);
        let mut leaves = Vec::with_capacity(indices.len());
        for &index in indices {
            let page = source.page(index)?;
            leaves.push(copier.copy_page(page.id)?);
        }
        finish_document(&mut target, &leaves)?;
        Ok(target)
    }

    /// Splits `source` into `ceil(n / chunk_size)` documents of at most
    /// `chunk_size` pages each, in page order.
    pub fn split(source: &Document, chunk_size: u32) -> Result<Vec<Document>> {
        let total = source.page_count();
        let mut chunks = Vec::new();
        let mut start = 0;
        while start < total {
            let end = (start + chunk_size).min(total);
            let indices: Vec<u32> = (start..end).collect();
            chunks.push(Self::extract(source, &indices)?);
            start = end;
        }
        Ok(chunks)
    }
}
