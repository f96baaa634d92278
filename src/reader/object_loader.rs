use log::error;
use std::collections::HashSet;

use super::Reader;
use crate::error::ParseError;
use crate::object_stream::ObjectStream;
use crate::parser::{self, ParserInput};
use crate::xref::XrefEntry;
use crate::{Error, Object, ObjectId, Result};

impl Reader<'_> {
    pub fn get_object(&self, id: ObjectId, already_seen: &mut HashSet<ObjectId>) -> Result<Object> {
        if already_seen.contains(&id) {
            return Err(Error::ReferenceCycle(id));
        }
        already_seen.insert(id);

        if let Some(entry) = self.document.reference_table.get(id.0) {
            if matches!(entry, XrefEntry::Compressed { .. }) {
                return self.get_compressed_object(id);
            }
        }

        let offset = self.get_offset(id)?;
        let (_, obj) = self.read_object(offset as usize, Some(id), already_seen)?;
        Ok(obj)
    }

    /// Get object offset by object ID.
    pub(super) fn get_offset(&self, id: ObjectId) -> Result<u32> {
        let entry = self.document.reference_table.get(id.0).ok_or(Error::MissingXrefEntry)?;
        match *entry {
            XrefEntry::Normal { offset, generation } if generation == id.1 => Ok(offset),
            _ => Err(Error::MissingXrefEntry),
        }
    }

    /// Loads one object out of the object stream that contains it.
    pub(super) fn get_compressed_object(&self, id: ObjectId) -> Result<Object> {
        let entry = self.document.reference_table.get(id.0).ok_or(Error::MissingXrefEntry)?;

        let container_id = match entry {
            XrefEntry::Compressed { container, .. } => *container,
            _ => return Err(Error::MissingXrefEntry),
        };

        let container_id = (container_id, 0);
        let mut already_seen = HashSet::new();
        let container_obj = self.get_object(container_id, &mut already_seen)?;
        let mut container_stream = container_obj.as_stream()?.clone();
        // `read_object` always parses a stream with empty content and only
        // its start offset recorded (see `parser::indirect_object`); fill
        // it in from the buffer before the container can be unpacked.
        self.fill_stream_content(&mut container_stream)?;
        let object_stream = ObjectStream::new(&mut container_stream)?;
        object_stream.objects.get(&id).cloned().ok_or(Error::MissingXrefEntry)
    }

    /// Fills an already-parsed stream's content from `self.buffer`, using
    /// its recorded start offset and resolving `/Length` (following one
    /// indirect reference if needed) without relying on `self.document`
    /// already holding the referenced object — this runs both before and
    /// during `Document` construction.
    pub(super) fn fill_stream_content(&self, stream: &mut crate::object::Stream) -> Result<()> {
        if !stream.content.is_empty() {
            return Ok(());
        }
        let Some(start) = stream.start_position else { return Ok(()) };

        let length = match stream.dict.get(b"Length").map_err(|_| Error::Parse(ParseError::InvalidObjectStream))? {
            Object::Reference(length_id) => {
                let mut seen = HashSet::new();
                self.get_object(*length_id, &mut seen)?.as_i64()?
            }
            other => other.as_i64()?,
        };
        if length < 0 {
            return Err(Error::Parse(ParseError::InvalidStreamLength(0, 0)));
        }

        let end = start + length as usize;
        if end > self.buffer.len() {
            return Err(Error::Parse(ParseError::InvalidOffset(end)));
        }
        stream.set_content(self.buffer[start..end].to_vec());
        Ok(())
    }

    pub(super) fn read_object(
        &self, offset: usize, expected_id: Option<ObjectId>, already_seen: &mut HashSet<ObjectId>,
    ) -> Result<(ObjectId, Object)> {
        if offset > self.buffer.len() {
            return Err(Error::Parse(ParseError::InvalidOffset(offset)));
        }

        parser::indirect_object(
            ParserInput::new_extra(self.buffer, "indirect object"),
            offset,
            expected_id,
            self,
            already_seen,
        )
    }

    /// Fills in a stream's content from the buffer once its `/Length` is
    /// known; used for streams whose length was an unresolved indirect
    /// reference at first-pass parse time.
    pub(super) fn read_stream_content(&mut self, object_id: ObjectId) -> Result<()> {
        let length = self.get_stream_length(object_id)?;
        let stream = self
            .document
            .get_object_mut(object_id)
            .and_then(Object::as_stream_mut)?;
        let start = stream
            .start_position
            .ok_or(Error::Parse(ParseError::InvalidStreamLength(object_id.0, object_id.1)))?;

        if length < 0 {
            return Err(Error::Parse(ParseError::InvalidStreamLength(object_id.0, object_id.1)));
        }

        let length = length as usize;
        let end = start + length;

        if end > self.buffer.len() {
            return Err(Error::Parse(ParseError::InvalidOffset(end)));
        }

        stream.set_content(self.buffer[start..end].to_vec());
        Ok(())
    }

    fn get_stream_length(&self, object_id: ObjectId) -> Result<i64> {
        let object = self.document.get_object(object_id)?;
        let stream = object.as_stream()?;
        stream
            .dict
            .get(b"Length")
            .and_then(|value| self.document.dereference(value))
            .and_then(|(_id, obj)| obj.as_i64())
            .inspect_err(|_err| {
                error!(
                    "stream dictionary of '{} {} R' is missing the Length entry",
                    object_id.0, object_id.1
                );
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use crate::xref::XrefEntry;

    /// `get_compressed_object` resolves a single object out of its
    /// container stream without going through `Document::load_mem` at
    /// all, so the container's content has to be filled from the buffer
    /// here too, not just in the bulk `load_objects_raw` path.
    #[test]
    fn get_compressed_object_fills_container_stream_content() {
        let objstm_header = b"7 0\n";
        let objstm_body = b"<</Type/Page/MediaBox[0 0 1 1]>>";
        let mut content = Vec::new();
        content.extend_from_slice(objstm_header);
        content.extend_from_slice(objstm_body);

        let mut buffer = Vec::new();
        let container_offset = buffer.len();
        buffer.extend_from_slice(
            format!(
                "4 0 obj<</Type/ObjStm/N 1/First {}/Length {}>>stream\n",
                objstm_header.len(),
                content.len()
            )
            .as_bytes(),
        );
        buffer.extend_from_slice(&content);
        buffer.extend_from_slice(b"\nendstream\nendobj\n");

        let mut document = Document::new();
        document.reference_table.insert(4, XrefEntry::Normal { offset: container_offset as u32, generation: 0 });
        document.reference_table.insert(7, XrefEntry::Compressed { container: 4, index: 0 });

        let reader = Reader { buffer: &buffer, document };
        let obj = reader.get_object((7, 0), &mut HashSet::new()).unwrap();
        assert!(obj.as_dict().unwrap().has_type(b"Page"));
    }
}
