//! Stream filter pipeline (ISO 32000-1 §7.4): decodes whatever `/Filter`
//! chain a stream dictionary declares, applying the matching `/DecodeParms`
//! predictor where one is specified.

use std::io::Read;

use flate2::read::{DeflateDecoder, ZlibDecoder};

use crate::error::{CodecError, Error, UnsupportedFeature};
use crate::object::{Dictionary, Object};
use crate::Result;

/// Filters whose bytes this crate passes straight through: the data is a
/// foreign codec (image/fax) this crate has no reason to decode for
/// structural manipulation.
const PASSTHROUGH: &[&[u8]] = &[b"DCTDecode", b"JPXDecode", b"CCITTFaxDecode", b"JBIG2Decode"];

pub fn decode_stream(dict: &Dictionary, raw: &[u8]) -> Result<Vec<u8>> {
    let filters = filter_names(dict)?;
    let parms = decode_parms(dict, filters.len());

    let mut data = raw.to_vec();
    for (filter, parm) in filters.iter().zip(parms.iter()) {
        if PASSTHROUGH.contains(&filter.as_slice()) {
            continue;
        }
        data = match filter.as_slice() {
            b"FlateDecode" | b"Fl" => {
                let decoded = flate_decode(&data)?;
                apply_predictor(decoded, parm)?
            }
            b"ASCIIHexDecode" | b"AHx" => ascii_hex_decode(&data)?,
            b"ASCII85Decode" | b"A85" => ascii85_decode(&data)?,
            b"LZWDecode" | b"LZW" => {
                let decoded = lzw_decode(&data, parm)?;
                apply_predictor(decoded, parm)?
            }
            b"RunLengthDecode" | b"RL" => run_length_decode(&data)?,
            other => {
                return Err(Error::Unsupported(UnsupportedFeature::Filter(
                    String::from_utf8_lossy(other).into_owned(),
                )))
            }
        };
    }
    Ok(data)
}

fn filter_names(dict: &Dictionary) -> Result<Vec<Vec<u8>>> {
    match dict.get(b"Filter") {
        Ok(Object::Name(n)) => Ok(vec![n.clone()]),
        Ok(Object::Array(arr)) => Ok(arr
            .iter()
            .filter_map(|o| o.as_name().ok().map(|n| n.to_vec()))
            .collect()),
        _ => Ok(Vec::new()),
    }
}

fn decode_parms(dict: &Dictionary, count: usize) -> Vec<Option<Dictionary>> {
    match dict.get(b"DecodeParms").or_else(|_| dict.get(b"DP")) {
        Ok(Object::Dictionary(d)) => vec![Some(d.clone())],
        Ok(Object::Array(arr)) => arr
            .iter()
            .map(|o| o.as_dict().ok().cloned())
            .chain(std::iter::repeat(None))
            .take(count)
            .collect(),
        _ => vec![None; count],
    }
}

/// FlateDecode tries zlib framing first (the PDF-mandated form) and falls
/// back to raw deflate, which some non-conformant writers emit.
fn flate_decode(data: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    let mut zlib = ZlibDecoder::new(data);
    if zlib.read_to_end(&mut out).is_ok() && !out.is_empty() {
        return Ok(out);
    }
    out.clear();
    let mut deflate = DeflateDecoder::new(data);
    deflate
        .read_to_end(&mut out)
        .map_err(|e| Error::Codec(CodecError::Flate(e.to_string())))?;
    Ok(out)
}

pub fn flate_encode(data: &[u8]) -> Vec<u8> {
    use flate2::write::ZlibEncoder;
    use flate2::Compression;
    use std::io::Write;

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).expect("writing to an in-memory encoder cannot fail");
    encoder.finish().expect("finishing an in-memory encoder cannot fail")
}

pub fn ascii_hex_encode(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() * 2 + 1);
    for &b in data {
        out.extend_from_slice(format!("{b:02X}").as_bytes());
    }
    out.push(b'>');
    out
}

pub fn ascii85_encode(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() * 5 / 4 + 2);
    for chunk in data.chunks(4) {
        if chunk.len() == 4 && chunk == [0, 0, 0, 0] {
            out.push(b'z');
            continue;
        }
        let mut buf = [0u8; 4];
        buf[..chunk.len()].copy_from_slice(chunk);
        let mut value = u32::from_be_bytes(buf);
        let mut digits = [0u8; 5];
        for slot in digits.iter_mut().rev() {
            *slot = (value % 85) as u8 + b'!';
            value /= 85;
        }
        let keep = chunk.len() + 1;
        out.extend_from_slice(&digits[..keep]);
    }
    out.extend_from_slice(b"~>");
    out
}

pub fn lzw_encode(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = weezl::encode::Encoder::new(weezl::BitOrder::Msb, 8);
    encoder.encode(data).map_err(|e| Error::Codec(CodecError::Lzw(format!("{e:?}"))))
}

pub fn run_length_encode(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    let mut i = 0usize;
    while i < data.len() {
        let run_end = (i..data.len()).take_while(|&j| j == i || data[j] == data[i]).count() + i;
        let run_len = run_end - i;
        if run_len >= 2 {
            let mut remaining = run_len;
            while remaining > 0 {
                let take = remaining.min(128);
                out.push((257 - take) as u8);
                out.push(data[i]);
                remaining -= take;
                i += take;
            }
            continue;
        }

        let literal_start = i;
        let mut j = i;
        while j < data.len() {
            let run = (j..data.len()).take_while(|&k| k == j || data[k] == data[j]).count();
            if run >= 2 {
                break;
            }
            j += 1;
            if j - literal_start == 128 {
                break;
            }
        }
        let literal_len = j - literal_start;
        out.push((literal_len - 1) as u8);
        out.extend_from_slice(&data[literal_start..j]);
        i = j;
    }
    out.push(128);
    out
}

/// Applies the PNG "Up" predictor (tag 2): simple, lossless, and cheap to
/// apply on arbitrary content without per-component color metadata.
pub fn png_up_encode(data: &[u8], columns: usize, colors: usize, bpc: usize) -> Vec<u8> {
    let row_bytes = (colors * bpc * columns + 7) / 8;
    if row_bytes == 0 {
        return Vec::new();
    }
    let mut out = Vec::with_capacity(data.len() + data.len() / row_bytes.max(1) + 1);
    let mut prev_row = vec![0u8; row_bytes];
    for row in data.chunks(row_bytes) {
        out.push(2);
        for (i, &byte) in row.iter().enumerate() {
            let b = prev_row.get(i).copied().unwrap_or(0);
            out.push(byte.wrapping_sub(b));
        }
        prev_row = row.to_vec();
        prev_row.resize(row_bytes, 0);
    }
    out
}

fn ascii_hex_decode(data: &[u8]) -> Result<Vec<u8>> {
    let mut digits: Vec<u8> = Vec::with_capacity(data.len());
    for (i, &b) in data.iter().enumerate() {
        if b == b'>' {
            break;
        }
        if b.is_ascii_hexdigit() {
            digits.push(b);
        } else if b.is_ascii_whitespace() {
            continue;
        } else {
            return Err(Error::Codec(CodecError::InvalidHex(i)));
        }
    }
    if digits.len() % 2 == 1 {
        digits.push(b'0');
    }
    let mut out = Vec::with_capacity(digits.len() / 2);
    for pair in digits.chunks_exact(2) {
        let hex = std::str::from_utf8(pair).unwrap_or("00");
        out.push(u8::from_str_radix(hex, 16).map_err(|_| Error::Codec(CodecError::InvalidHex(0)))?);
    }
    Ok(out)
}

fn ascii85_decode(data: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    let mut group = [0u8; 5];
    let mut group_len = 0usize;
    let mut i = 0usize;
    let bytes = data;

    while i < bytes.len() {
        let b = bytes[i];
        i += 1;
        if b.is_ascii_whitespace() {
            continue;
        }
        if b == b'~' {
            break;
        }
        if b == b'z' && group_len == 0 {
            out.extend_from_slice(&[0, 0, 0, 0]);
            continue;
        }
        if !(b'!'..=b'u').contains(&b) {
            return Err(Error::Codec(CodecError::InvalidAscii85(i)));
        }
        group[group_len] = b - b'!';
        group_len += 1;
        if group_len == 5 {
            let mut value: u32 = 0;
            for &g in &group {
                value = value.wrapping_mul(85).wrapping_add(g as u32);
            }
            out.extend_from_slice(&value.to_be_bytes());
            group_len = 0;
        }
    }

    if group_len > 0 {
        let pad = 5 - group_len;
        for slot in group.iter_mut().skip(group_len) {
            *slot = 84;
        }
        let mut value: u32 = 0;
        for &g in &group {
            value = value.wrapping_mul(85).wrapping_add(g as u32);
        }
        let full = value.to_be_bytes();
        out.extend_from_slice(&full[..4 - pad]);
    }

    Ok(out)
}

fn lzw_decode(data: &[u8], parm: &Option<Dictionary>) -> Result<Vec<u8>> {
    // PDF's default /EarlyChange 1 matches weezl's standard MSB decoder;
    // /EarlyChange 0 (rare) is not distinguished here since weezl ties the
    // early-change behavior to its TIFF variant rather than a plain flag.
    let _early_change = parm
        .as_ref()
        .and_then(|p| p.get(b"EarlyChange").ok().and_then(|o| o.as_i64().ok()))
        .unwrap_or(1);

    let mut decoder = weezl::decode::Decoder::new(weezl::BitOrder::Msb, 8);
    decoder
        .decode(data)
        .map_err(|e| Error::Codec(CodecError::Lzw(format!("{e:?}"))))
}

fn run_length_decode(data: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    let mut i = 0usize;
    while i < data.len() {
        let length = data[i];
        i += 1;
        if length == 128 {
            break;
        } else if length < 128 {
            let count = length as usize + 1;
            if i + count > data.len() {
                return Err(Error::Codec(CodecError::RunLength));
            }
            out.extend_from_slice(&data[i..i + count]);
            i += count;
        } else {
            if i >= data.len() {
                return Err(Error::Codec(CodecError::RunLength));
            }
            let count = 257 - length as usize;
            out.extend(std::iter::repeat(data[i]).take(count));
            i += 1;
        }
    }
    Ok(out)
}

/// Reverses a TIFF (predictor 2) or PNG (predictors 10-15) filter applied
/// before compression, per `/DecodeParms`.
fn apply_predictor(data: Vec<u8>, parm: &Option<Dictionary>) -> Result<Vec<u8>> {
    let Some(parm) = parm else { return Ok(data) };
    let predictor = parm.get(b"Predictor").and_then(Object::as_i64).unwrap_or(1);
    if predictor <= 1 {
        return Ok(data);
    }
    let colors = parm.get(b"Colors").and_then(Object::as_i64).unwrap_or(1).max(1) as usize;
    let bpc = parm.get(b"BitsPerComponent").and_then(Object::as_i64).unwrap_or(8).max(1) as usize;
    let columns = parm.get(b"Columns").and_then(Object::as_i64).unwrap_or(1).max(1) as usize;

    let bytes_per_pixel = ((colors * bpc) as f64 / 8.0).ceil().max(1.0) as usize;
    let row_bytes = (colors * bpc * columns + 7) / 8;

    if predictor == 2 {
        return Ok(tiff_predictor(data, colors, bpc, columns));
    }

    // PNG predictors: each encoded row is prefixed by a 1-byte filter tag.
    let mut out = Vec::with_capacity(data.len());
    let mut prev_row = vec![0u8; row_bytes];
    let mut pos = 0usize;
    while pos + 1 + row_bytes <= data.len() {
        let tag = data[pos];
        let mut row = data[pos + 1..pos + 1 + row_bytes].to_vec();
        pos += 1 + row_bytes;

        for i in 0..row.len() {
            let a = if i >= bytes_per_pixel { row[i - bytes_per_pixel] } else { 0 };
            let b = prev_row[i];
            let c = if i >= bytes_per_pixel { prev_row[i - bytes_per_pixel] } else { 0 };
            row[i] = match tag {
                0 => row[i],
                1 => row[i].wrapping_add(a),
                2 => row[i].wrapping_add(b),
                3 => row[i].wrapping_add(((a as u16 + b as u16) / 2) as u8),
                4 => row[i].wrapping_add(paeth(a, b, c)),
                _ => return Err(Error::Unsupported(UnsupportedFeature::Predictor(predictor))),
            };
        }

        out.extend_from_slice(&row);
        prev_row = row;
    }

    Ok(out)
}

fn paeth(a: u8, b: u8, c: u8) -> u8 {
    let p = a as i32 + b as i32 - c as i32;
    let pa = (p - a as i32).abs();
    let pb = (p - b as i32).abs();
    let pc = (p - c as i32).abs();
    if pa <= pb && pa <= pc {
        a
    } else if pb <= pc {
        b
    } else {
        c
    }
}

fn tiff_predictor(mut data: Vec<u8>, colors: usize, bpc: usize, columns: usize) -> Vec<u8> {
    if bpc != 8 {
        // Sub-byte-depth TIFF prediction is rare in practice; pass through
        // unmodified rather than risk corrupting the bitstream.
        return data;
    }
    let row_bytes = colors * columns;
    for row in data.chunks_mut(row_bytes) {
        for i in colors..row.len() {
            row[i] = row[i].wrapping_add(row[i - colors]);
        }
    }
    data
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_with_filter(name: &[u8], parm: Option<Dictionary>, encoded: Vec<u8>) -> Vec<u8> {
        let mut dict = Dictionary::new();
        dict.set("Filter", Object::Name(name.to_vec()));
        if let Some(parm) = parm {
            dict.set("DecodeParms", Object::Dictionary(parm));
        }
        decode_stream(&dict, &encoded).unwrap()
    }

    #[test]
    fn flate_round_trips() {
        let original = b"ABCABCABC".to_vec();
        let encoded = flate_encode(&original);
        assert_eq!(decode_with_filter(b"FlateDecode", None, encoded), original);
    }

    #[test]
    fn ascii_hex_round_trips() {
        let original = b"Hello, PDF!".to_vec();
        let encoded = ascii_hex_encode(&original);
        assert_eq!(decode_with_filter(b"ASCIIHexDecode", None, encoded), original);
    }

    #[test]
    fn ascii85_round_trips() {
        let original = b"the quick brown fox jumps over the lazy dog".to_vec();
        let encoded = ascii85_encode(&original);
        assert_eq!(decode_with_filter(b"ASCII85Decode", None, encoded), original);
    }

    #[test]
    fn lzw_round_trips() {
        let original = b"aaaaaaaaaaaaaaaaaabbbbbbbbbbbbbccccccccccccc".to_vec();
        let encoded = lzw_encode(&original).unwrap();
        assert_eq!(decode_with_filter(b"LZWDecode", None, encoded), original);
    }

    #[test]
    fn run_length_round_trips() {
        let original = b"aaaaaaXYZaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa".to_vec();
        let encoded = run_length_encode(&original);
        assert_eq!(decode_with_filter(b"RunLengthDecode", None, encoded), original);
    }

    /// Predictor 12 forces every row through the PNG "Up" tag regardless of
    /// which tag would compress best; `decode_stream` must still reverse it
    /// correctly once the row is re-wrapped in Flate.
    #[test]
    fn png_predictor_12_round_trips() {
        let columns = 4;
        let colors = 1;
        let bpc = 8;
        let original: Vec<u8> = (0..40u8).collect();
        let predicted = png_up_encode(&original, columns, colors, bpc);
        let encoded = flate_encode(&predicted);

        let mut parm = Dictionary::new();
        parm.set("Predictor", Object::Integer(12));
        parm.set("Columns", Object::Integer(columns as i64));
        parm.set("Colors", Object::Integer(colors as i64));
        parm.set("BitsPerComponent", Object::Integer(bpc as i64));

        assert_eq!(decode_with_filter(b"FlateDecode", Some(parm), encoded), original);
    }
}
