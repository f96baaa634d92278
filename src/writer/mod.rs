//! Serialization: turns an in-memory [`Document`](crate::Document) back
//! into PDF bytes, either as a full fresh file or as an appended
//! incremental revision.

mod xref_writer;

use std::io::Write;

use crate::document::Document;
use crate::object::{Dictionary, Object, ObjectId, StringFormat};
use crate::Result;

pub use xref_writer::{write_trailer, write_xref_subsections, write_xref_table, XrefWriter};

/// Cross-reference emission format a document is written with. Traditional
/// tables are readable by every PDF consumer ever shipped; xref streams
/// (PDF >= 1.5) are more compact and required once compressed object
/// streams are in play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum XrefFormat {
    #[default]
    Table,
    Stream,
}

/// Options controlling a full (non-incremental) document write, matching
/// the caller-facing `write(DocumentBuilder, options) -> bytes` entry point.
#[derive(Debug, Clone)]
pub struct WriteOptions {
    pub version: Option<String>,
    pub xref_format: XrefFormat,
    pub compress: bool,
    pub compression_level: u32,
}

impl Default for WriteOptions {
    fn default() -> Self {
        WriteOptions { version: None, xref_format: XrefFormat::Table, compress: true, compression_level: 6 }
    }
}

/// Serializes `doc` to bytes per `options`. This is the top-level entry
/// point named in the external API surface; [`ObjectWriter`] is the
/// lower-level mechanism it drives.
pub fn write(doc: &Document, options: WriteOptions) -> Result<Vec<u8>> {
    let mut doc = doc.clone();
    if let Some(version) = options.version.clone() {
        doc.version = version;
    }
    if options.compress {
        for object in doc.objects.values_mut() {
            if let Ok(stream) = object.as_stream_mut() {
                if !stream.dict.has(b"Filter") {
                    let _ = stream.compress();
                }
            }
        }
    }
    ensure_id(&mut doc);

    let mut out = Vec::new();
    let mut writer = ObjectWriter::new();
    writer.write_document(&mut out, &doc, options.xref_format)?;
    Ok(out)
}

/// Stamps a fresh random 16-byte `/ID` (two identical copies, per §6) onto
/// documents that don't already carry one.
fn ensure_id(doc: &mut Document) {
    if doc.trailer.has(b"ID") {
        return;
    }
    let mut bytes = [0u8; 16];
    if getrandom::fill(&mut bytes).is_err() {
        // getrandom failing is effectively unrecoverable on every supported
        // target; fall back to a fixed-but-distinct marker rather than
        // panic in a library entry point.
        bytes = *b"docforge-fallback";
    }
    let id = Object::String(bytes.to_vec(), StringFormat::Hexadecimal);
    doc.trailer.set("ID", Object::Array(vec![id.clone(), id]));
}

/// Tracks object offsets while writing so the xref table/stream it emits at
/// the end is correct, independent of which objects were actually written.
pub struct ObjectWriter {
    offset: u64,
    entries: Vec<(ObjectId, u64)>,
    mode: Mode,
}

enum Mode {
    Full,
    Incremental { prev_start: u64 },
}

impl ObjectWriter {
    /// Starts a writer for a brand-new file.
    pub fn new() -> Self {
        ObjectWriter { offset: 0, entries: Vec::new(), mode: Mode::Full }
    }

    /// Starts a writer for an appended revision; `base_offset` is the
    /// length of the bytes already written (the prior file), and
    /// `prev_start` is the `startxref` value those bytes ended with.
    pub fn new_incremental(base_offset: u64, prev_start: u64) -> Self {
        ObjectWriter { offset: base_offset, entries: Vec::new(), mode: Mode::Incremental { prev_start } }
    }

    /// Serializes the full document: header, every object, and a trailing
    /// xref table plus trailer, into a new buffer.
    pub fn write_document<W: Write>(&mut self, target: &mut W, doc: &Document, xref_format: XrefFormat) -> Result<()> {
        write!(target, "%PDF-{}\n", doc.version)?;
        target.write_all(b"%")?;
        target.write_all(&doc.binary_mark)?;
        target.write_all(b"\n")?;
        self.offset = format!("%PDF-{}\n%", doc.version).len() as u64 + doc.binary_mark.len() as u64 + 1;

        for (&id, object) in doc.objects.iter() {
            self.write_object(target, id, object)?;
        }

        let mut trailer = doc.trailer.clone();
        trailer.remove(b"Prev");

        match xref_format {
            XrefFormat::Table => {
                let xref_offset = self.offset;
                let size = doc.max_id + 1;
                trailer.set("Size", Object::Integer(size as i64));
                write_xref_table(target, &self.entries, size)?;
                write_trailer(target, &trailer, xref_offset)?;
            }
            XrefFormat::Stream => {
                let xref_offset = self.offset;
                let self_id = (doc.max_id + 1, 0);
                let size = self_id.0 + 1;
                trailer.set("Size", Object::Integer(size as i64));
                XrefWriter::write_stream(target, &self.entries, size, self_id, xref_offset, &trailer)?;
            }
        }
        Ok(())
    }

    /// Writes only `ids` (the objects changed in this revision) plus a new
    /// xref/trailer chained via `/Prev` to the previous revision's table.
    pub fn write_revision<W: Write>(
        &mut self, target: &mut W, doc: &Document, ids: impl Iterator<Item = ObjectId>,
    ) -> Result<()> {
        let mut ids: Vec<ObjectId> = ids.collect();
        ids.sort_unstable();

        for id in &ids {
            if let Ok(object) = doc.get_object(*id) {
                self.write_object(target, *id, object)?;
            }
        }

        let xref_offset = self.offset;
        let size = doc.max_id + 1;
        write_xref_subsections(target, &self.entries)?;

        let mut trailer = doc.trailer.clone();
        trailer.set("Size", Object::Integer(size as i64));
        if let Mode::Incremental { prev_start } = self.mode {
            trailer.set("Prev", Object::Integer(prev_start as i64));
        }
        write_trailer(target, &trailer, xref_offset)?;
        Ok(())
    }

    fn write_object<W: Write>(&mut self, target: &mut W, id: ObjectId, object: &Object) -> Result<()> {
        self.entries.push((id, self.offset));
        let mut buf = Vec::new();
        write!(buf, "{} {} obj\n", id.0, id.1)?;
        write_object(&mut buf, object)?;
        buf.extend_from_slice(b"\nendobj\n");
        target.write_all(&buf)?;
        self.offset += buf.len() as u64;
        Ok(())
    }
}

impl Default for ObjectWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Serializes a single object's PDF-syntax representation (no `obj`
/// wrapper, no trailing newline).
pub fn write_object<W: Write>(w: &mut W, object: &Object) -> Result<()> {
    match object {
        Object::Null => write!(w, "null")?,
        Object::Boolean(b) => write!(w, "{b}")?,
        Object::Integer(i) => write!(w, "{i}")?,
        Object::Real(r) => write_real(w, *r)?,
        Object::Name(n) => write_name(w, n)?,
        Object::String(s, format) => write_string(w, s, *format)?,
        Object::Array(arr) => {
            write!(w, "[")?;
            for (i, item) in arr.iter().enumerate() {
                if i > 0 {
                    write!(w, " ")?;
                }
                write_object(w, item)?;
            }
            write!(w, "]")?;
        }
        Object::Dictionary(dict) => write_dictionary(w, dict)?,
        Object::Stream(stream) => {
            let mut dict = stream.dict.clone();
            dict.set("Length", Object::Integer(stream.content.len() as i64));
            write_dictionary(w, &dict)?;
            write!(w, "\nstream\n")?;
            w.write_all(&stream.content)?;
            write!(w, "\nendstream")?;
        }
        Object::Reference(id) => write!(w, "{} {} R", id.0, id.1)?,
    }
    Ok(())
}

fn write_real<W: Write>(w: &mut W, value: f64) -> Result<()> {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        write!(w, "{}", value as i64)?;
    } else {
        write!(w, "{value}")?;
    }
    Ok(())
}

fn write_name<W: Write>(w: &mut W, name: &[u8]) -> Result<()> {
    write!(w, "/")?;
    for &b in name {
        if crate::lexer::is_regular(b) && b != b'#' {
            w.write_all(&[b])?;
        } else {
            write!(w, "#{b:02X}")?;
        }
    }
    Ok(())
}

fn write_string<W: Write>(w: &mut W, s: &[u8], format: StringFormat) -> Result<()> {
    match format {
        StringFormat::Literal => {
            write!(w, "(")?;
            for &b in s {
                match b {
                    b'(' | b')' | b'\\' => {
                        w.write_all(&[b'\\', b])?;
                    }
                    b'\n' => w.write_all(b"\\n")?,
                    b'\r' => w.write_all(b"\\r")?,
                    _ => w.write_all(&[b])?,
                }
            }
            write!(w, ")")?;
        }
        StringFormat::Hexadecimal => {
            write!(w, "<")?;
            for &b in s {
                write!(w, "{b:02X}")?;
            }
            write!(w, ">")?;
        }
    }
    Ok(())
}

/// Writes a dictionary, skipping any key whose value is `Null` — per the
/// data-model invariant, a `Null` value is equivalent to an absent key.
fn write_dictionary<W: Write>(w: &mut W, dict: &Dictionary) -> Result<()> {
    write!(w, "<<")?;
    for (key, value) in dict.iter() {
        if value.is_null() {
            continue;
        }
        write!(w, " ")?;
        write_name(w, key)?;
        write!(w, " ")?;
        write_object(w, value)?;
    }
    write!(w, " >>")?;
    Ok(())
}
