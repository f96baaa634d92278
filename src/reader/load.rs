use std::convert::TryInto;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use super::{FilterFunc, PdfMetadata, Reader};
use crate::incremental::IncrementalDocument;
use crate::{Document, Error, Result};

impl Document {
    /// Load a PDF document from a specified file path.
    #[inline]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Document> {
        let file = File::open(path)?;
        let capacity = Some(file.metadata()?.len() as usize);
        Self::load_internal(file, capacity, None)
    }

    #[inline]
    pub fn load_filtered<P: AsRef<Path>>(path: P, filter_func: FilterFunc) -> Result<Document> {
        let file = File::open(path)?;
        let capacity = Some(file.metadata()?.len() as usize);
        Self::load_internal(file, capacity, Some(filter_func))
    }

    /// Load a PDF document from an arbitrary source.
    #[inline]
    pub fn load_from<R: Read>(source: R) -> Result<Document> {
        Self::load_internal(source, None, None)
    }

    fn load_internal<R: Read>(mut source: R, capacity: Option<usize>, filter_func: Option<FilterFunc>) -> Result<Document> {
        let mut buffer = capacity.map(Vec::with_capacity).unwrap_or_default();
        source.read_to_end(&mut buffer)?;

        Reader { buffer: &buffer, document: Document::new() }.read(filter_func)
    }

    /// Load a PDF document from a memory slice.
    pub fn load_mem(buffer: &[u8]) -> Result<Document> {
        buffer.try_into()
    }

    /// Load PDF metadata (title and page count) without loading the entire
    /// document. Much faster for large PDFs when only basic information is
    /// needed.
    #[inline]
    pub fn load_metadata<P: AsRef<Path>>(path: P) -> Result<PdfMetadata> {
        let file = File::open(path)?;
        let capacity = Some(file.metadata()?.len() as usize);
        Self::load_metadata_internal(file, capacity)
    }

    /// Load PDF metadata from an arbitrary source without loading the
    /// entire document.
    #[inline]
    pub fn load_metadata_from<R: Read>(source: R) -> Result<PdfMetadata> {
        Self::load_metadata_internal(source, None)
    }

    /// Load PDF metadata from a memory slice without loading the entire
    /// document.
    #[inline]
    pub fn load_metadata_mem(buffer: &[u8]) -> Result<PdfMetadata> {
        Reader { buffer, document: Document::new() }.read_metadata()
    }

    fn load_metadata_internal<R: Read>(mut source: R, capacity: Option<usize>) -> Result<PdfMetadata> {
        let mut buffer = capacity.map(Vec::with_capacity).unwrap_or_default();
        source.read_to_end(&mut buffer)?;

        Reader { buffer: &buffer, document: Document::new() }.read_metadata()
    }
}

impl TryInto<Document> for &[u8] {
    type Error = Error;

    fn try_into(self) -> Result<Document> {
        Reader { buffer: self, document: Document::new() }.read(None)
    }
}

impl IncrementalDocument {
    /// Load a PDF document from a specified file path, retaining the raw
    /// bytes so edits can be appended as a new revision.
    #[inline]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let capacity = Some(file.metadata()?.len() as usize);
        Self::load_internal(file, capacity)
    }

    /// Load a PDF document from an arbitrary source, retaining the raw
    /// bytes so edits can be appended as a new revision.
    #[inline]
    pub fn load_from<R: Read>(source: R) -> Result<Self> {
        Self::load_internal(source, None)
    }

    fn load_internal<R: Read>(mut source: R, capacity: Option<usize>) -> Result<Self> {
        let mut buffer = capacity.map(Vec::with_capacity).unwrap_or_default();
        source.read_to_end(&mut buffer)?;

        let document = Reader { buffer: &buffer, document: Document::new() }.read(None)?;
        Ok(IncrementalDocument::create_from(buffer, document))
    }

    /// Load a PDF document from a memory slice, retaining the raw bytes so
    /// edits can be appended as a new revision.
    pub fn load_mem(buffer: &[u8]) -> Result<Self> {
        let document = Reader { buffer, document: Document::new() }.read(None)?;
        Ok(IncrementalDocument::create_from(buffer.to_vec(), document))
    }
}
