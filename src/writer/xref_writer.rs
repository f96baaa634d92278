//! Cross-reference emission: the traditional table format (§6, default)
//! and the optional xref-stream format (PDF >= 1.5).

use std::collections::BTreeMap;
use std::io::Write;

use crate::object::{Dictionary, Object, ObjectId, Stream};
use crate::Result;

/// Writes a traditional cross-reference table as one `0 <size>` subsection
/// covering every object number from 0 to `size - 1`, in-use or free.
/// Real-world writers often split this into several subsections to skip
/// long free runs; one subsection is simpler and equally valid per ISO
/// 32000-1 §7.5.4, since nothing requires subsections to be minimal.
pub fn write_xref_table<W: Write>(target: &mut W, entries: &[(ObjectId, u64)], size: u32) -> Result<()> {
    let by_id = index_entries(entries);

    write!(target, "xref\n0 {size}\n")?;
    for num in 0..size {
        match by_id.get(&num) {
            Some(&(offset, generation)) => write!(target, "{offset:010} {generation:05} n \n")?,
            None if num == 0 => write!(target, "0000000000 65535 f \n")?,
            None => write!(target, "0000000000 00000 f \n")?,
        }
    }
    Ok(())
}

/// Writes a cross-reference section covering *only* `entries`' object
/// numbers, split into one subsection per contiguous run, as an appended
/// incremental revision requires (spec.md §4.6 step 3). A `0 <size>` table
/// here would stamp every object untouched by this revision with a
/// spurious free entry, and since `Xref::merge` is first-occurrence-wins
/// that shadows every unchanged object in the newest revision — dropping
/// the whole page tree from documents that only append a signature.
pub fn write_xref_subsections<W: Write>(target: &mut W, entries: &[(ObjectId, u64)]) -> Result<()> {
    let by_id = index_entries(entries);
    let ids: Vec<u32> = by_id.keys().copied().collect();

    write!(target, "xref\n")?;
    let mut i = 0;
    while i < ids.len() {
        let mut j = i;
        while j + 1 < ids.len() && ids[j + 1] == ids[j] + 1 {
            j += 1;
        }
        write!(target, "{} {}\n", ids[i], j - i + 1)?;
        for &id in &ids[i..=j] {
            let (offset, generation) = by_id[&id];
            write!(target, "{offset:010} {generation:05} n \n")?;
        }
        i = j + 1;
    }
    Ok(())
}

/// Writes `trailer << ... >>`, `startxref`, and `%%EOF`.
pub fn write_trailer<W: Write>(target: &mut W, trailer: &Dictionary, xref_offset: u64) -> Result<()> {
    write!(target, "trailer\n")?;
    super::write_object(target, &Object::Dictionary(trailer.clone()))?;
    write!(target, "\nstartxref\n{xref_offset}\n%%EOF\n")?;
    Ok(())
}

fn index_entries(entries: &[(ObjectId, u64)]) -> BTreeMap<u32, (u64, u16)> {
    let mut by_id = BTreeMap::new();
    for &(id, offset) in entries {
        by_id.entry(id.0).or_insert((offset, id.1));
    }
    by_id
}

/// Emits the cross-reference section as a `/Type /XRef` stream (ISO
/// 32000-1 §7.5.8) instead of a table. The stream is itself the last
/// object in the file and therefore describes its own offset.
pub struct XrefWriter;

impl XrefWriter {
    pub fn write_stream<W: Write>(
        target: &mut W, entries: &[(ObjectId, u64)], size: u32, self_id: ObjectId, self_offset: u64,
        trailer: &Dictionary,
    ) -> Result<()> {
        let mut by_id = index_entries(entries);
        by_id.insert(self_id.0, (self_offset, self_id.1));

        let mut body = Vec::with_capacity(size as usize * 7);
        for num in 0..size {
            match by_id.get(&num) {
                Some(&(offset, generation)) => {
                    body.push(1u8);
                    body.extend_from_slice(&(offset as u32).to_be_bytes());
                    body.extend_from_slice(&generation.to_be_bytes());
                }
                None if num == 0 => {
                    body.push(0u8);
                    body.extend_from_slice(&0u32.to_be_bytes());
                    body.extend_from_slice(&65535u16.to_be_bytes());
                }
                None => {
                    body.push(0u8);
                    body.extend_from_slice(&0u32.to_be_bytes());
                    body.extend_from_slice(&0u16.to_be_bytes());
                }
            }
        }

        let compressed = crate::filters::flate_encode(&body);

        let mut dict = trailer.clone();
        dict.set("Type", Object::Name(b"XRef".to_vec()));
        dict.set("W", Object::Array(vec![Object::Integer(1), Object::Integer(4), Object::Integer(2)]));
        dict.set("Size", Object::Integer(size as i64));
        dict.set("Filter", Object::Name(b"FlateDecode".to_vec()));
        dict.remove(b"Index");

        let stream = Stream::new(dict, compressed);

        write!(target, "{} {} obj\n", self_id.0, self_id.1)?;
        super::write_object(target, &Object::Stream(stream))?;
        write!(target, "\nendobj\n")?;
        write!(target, "startxref\n{self_offset}\n%%EOF\n")?;
        Ok(())
    }
}
