use std::collections::BTreeMap;

use crate::error::{Error, ParseError};
use crate::object::{Object, ObjectId, Stream};
use crate::parser::{self, ParserInput};
use crate::Result;

/// A decompressed `/Type /ObjStm` object stream: a container that packs
/// many non-stream objects into one compressed blob (PDF 1.5+). Each
/// contained object has generation 0 by definition (ISO 32000-1 §7.5.7).
pub struct ObjectStream {
    pub objects: BTreeMap<ObjectId, Object>,
}

impl ObjectStream {
    /// Decompresses `stream` (if not already raw) and parses its header
    /// pairs plus the `/N` object values that follow `/First`.
    pub fn new(stream: &mut Stream) -> Result<Self> {
        if !stream.dict.has_type(b"ObjStm") {
            return Err(Error::Parse(ParseError::InvalidObjectStream));
        }

        let n = stream.dict.get(b"N").and_then(Object::as_i64).map_err(|_| Error::Parse(ParseError::InvalidObjectStream))? as usize;
        let first = stream.dict.get(b"First").and_then(Object::as_i64).map_err(|_| Error::Parse(ParseError::InvalidObjectStream))? as usize;

        let content = if stream.dict.has(b"Filter") {
            stream.decompressed_content()?
        } else {
            stream.content.clone()
        };

        if first > content.len() {
            return Err(Error::Parse(ParseError::InvalidObjectStream));
        }

        let header = &content[..first];
        let body = &content[first..];

        let header_str = std::str::from_utf8(header).map_err(|_| Error::Parse(ParseError::InvalidObjectStream))?;
        let mut numbers = header_str.split_ascii_whitespace().filter_map(|s| s.parse::<i64>().ok());

        let mut pairs = Vec::with_capacity(n);
        for _ in 0..n {
            let (Some(num), Some(off)) = (numbers.next(), numbers.next()) else {
                return Err(Error::Parse(ParseError::InvalidObjectStream));
            };
            pairs.push((num as u32, off as usize));
        }

        let mut objects = BTreeMap::new();
        for (idx, &(obj_num, offset)) in pairs.iter().enumerate() {
            let end = pairs.get(idx + 1).map(|&(_, next_off)| next_off).unwrap_or(body.len());
            if offset > body.len() || end > body.len() || offset > end {
                continue;
            }
            let slice = &body[offset..end];
            let span = ParserInput::new_extra(slice, "objstm");
            if let Ok((_, obj)) = parser::object(span) {
                objects.insert((obj_num, 0), obj);
            }
        }

        Ok(ObjectStream { objects })
    }
}
