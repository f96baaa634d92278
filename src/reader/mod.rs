mod load;
mod metadata;
mod object_loader;

#[cfg(test)]
mod tests;

use log::{error, warn};
use std::cmp;
use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;

#[cfg(feature = "rayon")]
use rayon::prelude::*;

use crate::error::{ParseError, XrefError};
use crate::object_stream::ObjectStream;
use crate::parser::{self, ParserInput};
use crate::xref::XrefEntry;
use crate::{Document, Error, Object, Result};

pub use metadata::PdfMetadata;

pub(crate) type FilterFunc = fn((u32, u16), &mut Object) -> Option<((u32, u16), Object)>;

/// Drives one parse of a byte buffer into a [`Document`]. Scoped to the
/// lifetime of the buffer it was constructed over; nothing it produces
/// borrows from `self` past [`Reader::read`] returning.
pub struct Reader<'a> {
    pub buffer: &'a [u8],
    pub document: Document,
}

/// Maximum allowed nesting depth of parenthesized literal strings.
pub const MAX_BRACKET: usize = 100;

impl Reader<'_> {
    /// Reads the whole document: header, xref chain, then every in-use
    /// object (including compressed-object-stream contents).
    ///
    /// The document structure can be expressed in PEG as:
    ///   document <- header indirect_object* xref trailer xref_start
    pub fn read(mut self, filter_func: Option<FilterFunc>) -> Result<Document> {
        let offset = self.buffer.windows(5).position(|w| w == b"%PDF-").unwrap_or(0);
        self.buffer = &self.buffer[offset..];

        let version =
            parser::header(ParserInput::new_extra(self.buffer, "header")).ok_or(ParseError::InvalidFileHeader)?;

        // The binary mark sits on the line right after the version line; if
        // it isn't there (or isn't all high bytes) the file is presumed
        // text-safe and we keep the default.
        if let Some(pos) = self.buffer.iter().position(|&byte| byte == b'\n') {
            if let Some(binary_mark) =
                parser::binary_mark(ParserInput::new_extra(&self.buffer[pos + 1..], "binary_mark"))
            {
                if binary_mark.iter().all(|&byte| byte >= 128) {
                    self.document.binary_mark = binary_mark;
                }
            }
        }

        let xref_start = Self::get_xref_start(self.buffer)?;
        if xref_start > self.buffer.len() {
            return Err(Error::Xref(XrefError::Start));
        }
        self.document.xref_start = xref_start;

        let (mut xref, mut trailer) =
            parser::xref_and_trailer(ParserInput::new_extra(&self.buffer[xref_start..], "xref"), &self)?;

        // Walk /Prev (and, for hybrid-reference files, /XRefStm) chains.
        // First occurrence inserted wins: newest revision is read first.
        let mut already_seen = HashSet::new();
        let mut prev_xref_start = trailer.remove(b"Prev");
        while let Some(prev) = prev_xref_start.and_then(|offset| offset.as_i64().ok()) {
            if already_seen.contains(&prev) {
                break;
            }
            already_seen.insert(prev);
            if prev < 0 || prev as usize > self.buffer.len() {
                return Err(Error::Xref(XrefError::PrevStart));
            }

            let (prev_xref, prev_trailer) =
                parser::xref_and_trailer(ParserInput::new_extra(&self.buffer[prev as usize..], ""), &self)?;
            xref.merge(prev_xref);

            let prev_xref_stream_start = trailer.remove(b"XRefStm");
            if let Some(prev) = prev_xref_stream_start.and_then(|offset| offset.as_i64().ok()) {
                if prev < 0 || prev as usize > self.buffer.len() {
                    return Err(Error::Xref(XrefError::StreamStart));
                }

                let (prev_xref, _) =
                    parser::xref_and_trailer(ParserInput::new_extra(&self.buffer[prev as usize..], ""), &self)?;
                xref.merge(prev_xref);
            }

            prev_xref_start = prev_trailer.get(b"Prev").cloned().ok();
        }
        let xref_entry_count = xref.max_id().checked_add(1).ok_or(ParseError::InvalidXref)?;
        if xref.size != xref_entry_count {
            warn!(
                "Size entry of trailer dictionary is {}, correct value is {}.",
                xref.size, xref_entry_count
            );
            xref.size = xref_entry_count;
        }

        self.document.version = version;
        self.document.max_id = xref.size.saturating_sub(1);
        self.document.trailer = trailer;
        self.document.reference_table = xref;

        self.load_objects_raw(filter_func)?;

        Ok(self.document)
    }

    fn load_objects_raw(&mut self, filter_func: Option<FilterFunc>) -> Result<()> {
        let zero_length_streams = Mutex::new(vec![]);
        let object_stream_ids = Mutex::new(vec![]);

        let entries_filter_map = |(_, entry): (&_, &_)| {
            if let XrefEntry::Normal { offset, .. } = *entry {
                let result = self.read_object(offset as usize, None, &mut HashSet::new());
                let (object_id, mut object) = match result {
                    Ok(obj) => obj,
                    Err(e) => {
                        error!("object load error at offset {offset}: {e:?}");
                        return None;
                    }
                };
                if let Some(filter_func) = filter_func {
                    filter_func(object_id, &mut object)?;
                }

                if let Ok(ref stream) = object.as_stream() {
                    // Every stream is parsed with empty content (only its
                    // absolute start offset recorded); content is filled
                    // below once the whole object table is in place and
                    // indirect /Length references can be resolved. Object
                    // streams additionally need their content filled
                    // *before* they can be unpacked, so their ids are
                    // tracked separately and decoded after that fill.
                    if stream.content.is_empty() {
                        let mut zero_length_streams =
                            zero_length_streams.lock().expect("zero_length_streams mutex poisoned");
                        zero_length_streams.push(object_id);
                    }
                    if stream.dict.has_type(b"ObjStm") {
                        let mut object_stream_ids = object_stream_ids.lock().expect("object_stream_ids mutex poisoned");
                        object_stream_ids.push(object_id);
                    }
                }

                Some((object_id, object))
            } else {
                None
            }
        };

        #[cfg(feature = "rayon")]
        {
            self.document.objects = self
                .document
                .reference_table
                .entries
                .par_iter()
                .filter_map(entries_filter_map)
                .collect();
        }
        #[cfg(not(feature = "rayon"))]
        {
            self.document.objects = self
                .document
                .reference_table
                .entries
                .iter()
                .filter_map(entries_filter_map)
                .collect();
        }

        for object_id in zero_length_streams.into_inner().expect("zero_length_streams mutex poisoned") {
            let _ = self.read_stream_content(object_id);
        }

        // Only now, with every /ObjStm stream's content filled in from the
        // buffer, can its packed objects actually be unpacked.
        let mut object_streams = BTreeMap::new();
        for container_id in object_stream_ids.into_inner().expect("object_stream_ids mutex poisoned") {
            let Some(Ok(mut stream)) = self.document.objects.get(&container_id).map(|o| o.as_stream().map(|s| s.clone())) else {
                continue;
            };
            let Ok(obj_stream) = ObjectStream::new(&mut stream) else { continue };
            if let Some(filter_func) = filter_func {
                for (object_id, mut object) in obj_stream.objects {
                    if let Some((object_id, object)) = filter_func(object_id, &mut object) {
                        object_streams.entry(object_id).or_insert(object);
                    }
                }
            } else {
                object_streams.extend(obj_stream.objects);
            }
        }

        // Per PDF spec, first definition wins for duplicate object IDs.
        for (id, entry) in object_streams {
            self.document.objects.entry(id).or_insert(entry);
        }

        Ok(())
    }

    fn get_xref_start(buffer: &[u8]) -> Result<usize> {
        let seek_pos = buffer.len() - cmp::min(buffer.len(), 1024);
        Self::search_substring(buffer, b"startxref", seek_pos)
            .ok_or(Error::Xref(XrefError::Start))
            .and_then(|xref_pos| {
                if xref_pos <= buffer.len() {
                    match parser::xref_start(ParserInput::new_extra(&buffer[xref_pos..], "xref")) {
                        Some(startxref) => Ok(startxref as usize),
                        None => Err(Error::Xref(XrefError::Start)),
                    }
                } else {
                    Err(Error::Xref(XrefError::Start))
                }
            })
    }

    pub(crate) fn search_substring(buffer: &[u8], pattern: &[u8], start_pos: usize) -> Option<usize> {
        buffer
            .get(start_pos..)?
            .windows(pattern.len())
            .rposition(|window| window == pattern)
            .map(|pos| start_pos + pos)
    }
}
