use std::collections::BTreeMap;
use std::fmt;
use std::str;

use indexmap::IndexMap;

use crate::error::{Error, Result};

/// Object number plus generation number. Generation is non-zero only for
/// objects that have survived an incremental update that reused the slot.
pub type ObjectId = (u32, u16);

/// Distinguishes a literal `(...)` string from a hex `<...>` string so the
/// writer can round-trip the original encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StringFormat {
    Literal,
    Hexadecimal,
}

/// A decoded stream: its dictionary plus the (possibly still filtered)
/// content bytes, and where in the source buffer the raw bytes started.
#[derive(Debug, Clone, PartialEq)]
pub struct Stream {
    pub dict: Dictionary,
    pub content: Vec<u8>,
    /// Set once filters have been applied via `decompress`/`decode`.
    pub allows_compression: bool,
    pub start_position: Option<usize>,
}

impl Stream {
    pub fn new(mut dict: Dictionary, content: Vec<u8>) -> Self {
        dict.set("Length", Object::Integer(content.len() as i64));
        Stream {
            dict,
            content,
            allows_compression: true,
            start_position: None,
        }
    }

    pub fn with_position(dict: Dictionary, content: Vec<u8>, start_position: usize) -> Self {
        Stream {
            dict,
            content,
            allows_compression: true,
            start_position: Some(start_position),
        }
    }

    pub fn set_content(&mut self, content: Vec<u8>) {
        self.content = content;
    }

    /// Decode the stream through its `/Filter` chain, returning the
    /// fully-decoded bytes without mutating `self`.
    pub fn decompressed_content(&self) -> Result<Vec<u8>> {
        crate::filters::decode_stream(&self.dict, &self.content)
    }

    /// Decode in place, dropping the `/Filter` and `/DecodeParms` entries and
    /// rewriting `/Length` to match.
    pub fn decompress(&mut self) -> Result<()> {
        let decoded = self.decompressed_content()?;
        self.dict.remove(b"Filter");
        self.dict.remove(b"DecodeParms");
        self.dict.set("Length", Object::Integer(decoded.len() as i64));
        self.content = decoded;
        Ok(())
    }

    /// Re-compress the (currently raw) content with FlateDecode.
    pub fn compress(&mut self) -> Result<()> {
        if self.dict.has_filter(b"FlateDecode") {
            return Ok(());
        }
        let compressed = crate::filters::flate_encode(&self.content);
        self.dict.set("Filter", Object::Name(b"FlateDecode".to_vec()));
        self.dict.remove(b"DecodeParms");
        self.dict.set("Length", Object::Integer(compressed.len() as i64));
        self.content = compressed;
        Ok(())
    }
}

/// The full PDF object grammar: every value that can appear as the body of
/// an indirect object or as a dictionary/array entry.
#[derive(Debug, Clone, PartialEq)]
pub enum Object {
    Null,
    Boolean(bool),
    Integer(i64),
    Real(f64),
    Name(Vec<u8>),
    String(Vec<u8>, StringFormat),
    Array(Vec<Object>),
    Dictionary(Dictionary),
    Stream(Stream),
    Reference(ObjectId),
}

impl Object {
    pub fn string_literal<S: Into<Vec<u8>>>(s: S) -> Self {
        Object::String(s.into(), StringFormat::Literal)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Object::Null)
    }

    pub fn as_bool(&self) -> Result<bool> {
        match self {
            Object::Boolean(b) => Ok(*b),
            _ => Err(Error::TypeMismatch { expected: "Boolean", found: self.kind() }),
        }
    }

    pub fn as_i64(&self) -> Result<i64> {
        match self {
            Object::Integer(i) => Ok(*i),
            Object::Real(r) => Ok(*r as i64),
            _ => Err(Error::TypeMismatch { expected: "Integer", found: self.kind() }),
        }
    }

    pub fn as_f64(&self) -> Result<f64> {
        match self {
            Object::Integer(i) => Ok(*i as f64),
            Object::Real(r) => Ok(*r),
            _ => Err(Error::TypeMismatch { expected: "Real", found: self.kind() }),
        }
    }

    pub fn as_name(&self) -> Result<&[u8]> {
        match self {
            Object::Name(n) => Ok(n),
            _ => Err(Error::TypeMismatch { expected: "Name", found: self.kind() }),
        }
    }

    pub fn as_name_str(&self) -> Result<&str> {
        self.as_name().map(|n| str::from_utf8(n).unwrap_or(""))
    }

    pub fn as_str(&self) -> Result<&[u8]> {
        match self {
            Object::String(s, _) => Ok(s),
            _ => Err(Error::TypeMismatch { expected: "String", found: self.kind() }),
        }
    }

    pub fn as_array(&self) -> Result<&Vec<Object>> {
        match self {
            Object::Array(a) => Ok(a),
            _ => Err(Error::TypeMismatch { expected: "Array", found: self.kind() }),
        }
    }

    pub fn as_array_mut(&mut self) -> Result<&mut Vec<Object>> {
        match self {
            Object::Array(a) => Ok(a),
            _ => Err(Error::TypeMismatch { expected: "Array", found: self.kind() }),
        }
    }

    pub fn as_dict(&self) -> Result<&Dictionary> {
        match self {
            Object::Dictionary(d) => Ok(d),
            Object::Stream(s) => Ok(&s.dict),
            _ => Err(Error::TypeMismatch { expected: "Dictionary", found: self.kind() }),
        }
    }

    pub fn as_dict_mut(&mut self) -> Result<&mut Dictionary> {
        match self {
            Object::Dictionary(d) => Ok(d),
            Object::Stream(s) => Ok(&mut s.dict),
            _ => Err(Error::TypeMismatch { expected: "Dictionary", found: self.kind() }),
        }
    }

    pub fn as_stream(&self) -> Result<&Stream> {
        match self {
            Object::Stream(s) => Ok(s),
            _ => Err(Error::TypeMismatch { expected: "Stream", found: self.kind() }),
        }
    }

    pub fn as_stream_mut(&mut self) -> Result<&mut Stream> {
        match self {
            Object::Stream(s) => Ok(s),
            _ => Err(Error::TypeMismatch { expected: "Stream", found: self.kind() }),
        }
    }

    pub fn as_reference(&self) -> Result<ObjectId> {
        match self {
            Object::Reference(id) => Ok(*id),
            _ => Err(Error::TypeMismatch { expected: "Reference", found: self.kind() }),
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Object::Null => "Null",
            Object::Boolean(_) => "Boolean",
            Object::Integer(_) => "Integer",
            Object::Real(_) => "Real",
            Object::Name(_) => "Name",
            Object::String(..) => "String",
            Object::Array(_) => "Array",
            Object::Dictionary(_) => "Dictionary",
            Object::Stream(_) => "Stream",
            Object::Reference(_) => "Reference",
        }
    }
}

impl From<bool> for Object {
    fn from(v: bool) -> Self {
        Object::Boolean(v)
    }
}
impl From<i64> for Object {
    fn from(v: i64) -> Self {
        Object::Integer(v)
    }
}
impl From<f64> for Object {
    fn from(v: f64) -> Self {
        Object::Real(v)
    }
}
impl From<f32> for Object {
    fn from(v: f32) -> Self {
        Object::Real(v as f64)
    }
}
impl From<ObjectId> for Object {
    fn from(id: ObjectId) -> Self {
        Object::Reference(id)
    }
}
impl From<Vec<Object>> for Object {
    fn from(v: Vec<Object>) -> Self {
        Object::Array(v)
    }
}
impl From<Dictionary> for Object {
    fn from(d: Dictionary) -> Self {
        Object::Dictionary(d)
    }
}
impl From<Stream> for Object {
    fn from(s: Stream) -> Self {
        Object::Stream(s)
    }
}

/// An insertion-ordered PDF dictionary. Order is preserved purely for
/// byte-stable round-tripping; PDF semantics never depend on key order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dictionary(IndexMap<Vec<u8>, Object>);

impl Dictionary {
    pub fn new() -> Self {
        Dictionary(IndexMap::new())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Vec<u8>, &Object)> {
        self.0.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&Vec<u8>, &mut Object)> {
        self.0.iter_mut()
    }

    pub fn has<K: AsRef<[u8]>>(&self, key: K) -> bool {
        self.0.contains_key(key.as_ref())
    }

    pub fn get(&self, key: &[u8]) -> Result<&Object> {
        self.0.get(key).ok_or_else(|| Error::missing_key(key))
    }

    pub fn get_mut(&mut self, key: &[u8]) -> Result<&mut Object> {
        self.0.get_mut(key).ok_or_else(|| Error::missing_key(key))
    }

    pub fn set<K, V>(&mut self, key: K, value: V)
    where
        K: Into<Vec<u8>>,
        V: Into<Object>,
    {
        self.0.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &[u8]) -> Option<Object> {
        self.0.shift_remove(key)
    }

    /// True if `/Type` equals `name`.
    pub fn has_type(&self, name: &[u8]) -> bool {
        matches!(self.get(b"Type").and_then(Object::as_name), Ok(n) if n == name)
    }

    pub fn get_type(&self) -> Result<&[u8]> {
        self.get(b"Type").and_then(Object::as_name)
    }

    /// True if `/Filter` is, or contains, `name`.
    pub fn has_filter(&self, name: &[u8]) -> bool {
        match self.get(b"Filter") {
            Ok(Object::Name(n)) => n == name,
            Ok(Object::Array(arr)) => arr.iter().any(|o| matches!(o.as_name(), Ok(n) if n == name)),
            _ => false,
        }
    }
}

/// PDF date strings (ISO 32000-1 §7.9.4): `D:YYYYMMDDHHmmSSOHH'mm'` where
/// `O` is `+`, `-`, or `Z`. Conversion to/from `chrono` mirrors the
/// teacher's own `Object::as_datetime` / `From<DateTime<Tz>>` pair.
#[cfg(feature = "chrono")]
mod pdf_date {
    use super::{Object, StringFormat};
    use chrono::{DateTime, FixedOffset, TimeZone};

    impl Object {
        /// Parses `self` as a PDF date string, if it is a `/CreationDate`-
        /// or `/ModDate`-shaped literal string.
        pub fn as_datetime(&self) -> Option<DateTime<FixedOffset>> {
            let Object::String(bytes, _) = self else { return None };
            parse(std::str::from_utf8(bytes).ok()?)
        }
    }

    impl<Tz: TimeZone> From<DateTime<Tz>> for Object {
        fn from(time: DateTime<Tz>) -> Self {
            Object::String(format(&time.fixed_offset()).into_bytes(), StringFormat::Literal)
        }
    }

    fn parse(s: &str) -> Option<DateTime<FixedOffset>> {
        let s = s.strip_prefix("D:").unwrap_or(s);
        let digits = |slice: &str, from: usize, len: usize| -> Option<i64> { slice.get(from..from + len)?.parse().ok() };

        let year = digits(s, 0, 4)?;
        let month = digits(s, 4, 2).unwrap_or(1).clamp(1, 12);
        let day = digits(s, 6, 2).unwrap_or(1).clamp(1, 31);
        let hour = digits(s, 8, 2).unwrap_or(0);
        let minute = digits(s, 10, 2).unwrap_or(0);
        let second = digits(s, 12, 2).unwrap_or(0);

        let rest = s.get(14..).unwrap_or("");
        let (offset_minutes, _) = match rest.chars().next() {
            Some('Z') => (0, &rest[1..]),
            Some(sign @ ('+' | '-')) => {
                let hh: i64 = rest.get(1..3)?.parse().ok()?;
                let mm: i64 = rest.get(4..6).and_then(|m| m.parse().ok()).unwrap_or(0);
                let signed = if sign == '-' { -1 } else { 1 } * (hh * 60 + mm);
                (signed, "")
            }
            _ => (0, rest),
        };

        let offset = FixedOffset::east_opt((offset_minutes * 60) as i32)?;
        offset
            .with_ymd_and_hms(year as i32, month as u32, day as u32, hour as u32, minute as u32, second as u32)
            .single()
    }

    fn format(time: &DateTime<FixedOffset>) -> String {
        let offset_minutes = time.offset().local_minus_utc() / 60;
        let (sign, abs) = if offset_minutes < 0 { ('-', -offset_minutes) } else { ('+', offset_minutes) };
        format!(
            "D:{:04}{:02}{:02}{:02}{:02}{:02}{}{:02}'{:02}'",
            time.format("%Y"),
            time.format("%m"),
            time.format("%d"),
            time.format("%H"),
            time.format("%M"),
            time.format("%S"),
            sign,
            abs / 60,
            abs % 60,
        )
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use crate::object::{Object, StringFormat};

        #[test]
        fn round_trips_through_object() {
            let time = FixedOffset::east_opt(5 * 3600).unwrap().with_ymd_and_hms(2024, 3, 14, 9, 26, 53).unwrap();
            let obj: Object = time.into();
            let parsed = obj.as_datetime().unwrap();
            assert_eq!(parsed, time);
        }

        #[test]
        fn parses_utc_marker() {
            let obj = Object::String(b"D:20240101120000Z".to_vec(), StringFormat::Literal);
            let parsed = obj.as_datetime().unwrap();
            assert_eq!(parsed.offset().local_minus_utc(), 0);
            assert_eq!(parsed.format("%Y%m%d%H%M%S").to_string(), "20240101120000");
        }

        #[test]
        fn parses_bare_date_without_time() {
            let obj = Object::String(b"D:20240101".to_vec(), StringFormat::Literal);
            let parsed = obj.as_datetime().unwrap();
            assert_eq!(parsed.format("%H%M%S").to_string(), "000000");
        }
    }
}

impl fmt::Display for StringFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StringFormat::Literal => write!(f, "literal"),
            StringFormat::Hexadecimal => write!(f, "hexadecimal"),
        }
    }
}

/// Objects keyed by (number, generation), the in-memory form of a document
/// body once fully materialized.
pub type ObjectMap = BTreeMap<ObjectId, Object>;
