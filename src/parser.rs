//! `nom`-based grammar for the PDF object syntax, headers, and
//! cross-reference sections.
//!
//! Positions are tracked with `nom_locate::LocatedSpan` so error paths can
//! report an absolute byte offset without threading an index through every
//! combinator by hand.

use std::collections::HashSet;

use nom::branch::alt;
use nom::bytes::complete::{is_not, tag, take, take_while, take_while1, take_while_m_n};
use nom::character::complete::{digit1, one_of};
use nom::combinator::{map, map_res, opt, recognize, value};
use nom::multi::many0;
use nom::sequence::{delimited, pair, preceded, terminated};
use nom::IResult;
use nom_locate::LocatedSpan;

use crate::error::{Error, ParseError, XrefError};
use crate::lexer::{is_delimiter, is_eol, is_regular, is_whitespace};
use crate::object::{Dictionary, Object, ObjectId, Stream, StringFormat};
use crate::reader::{Reader, MAX_BRACKET};
use crate::xref::{Xref, XrefEntry};
use crate::Result;

pub type ParserInput<'a> = LocatedSpan<&'a [u8], &'a str>;
type PResult<'a, O> = IResult<ParserInput<'a>, O>;

fn ws0(input: ParserInput) -> PResult<()> {
    let mut i = input;
    loop {
        let (rest, consumed) = take_while(|c| is_whitespace(c))(i)?;
        i = rest;
        if consumed.fragment().is_empty() {
            break;
        }
        if i.fragment().first() == Some(&b'%') {
            let (rest, _) = take_while(|c| !is_eol(c))(i)?;
            i = rest;
            continue;
        }
        break;
    }
    // leading comment with no preceding whitespace
    if i.fragment().first() == Some(&b'%') {
        let (rest, _) = take_while(|c| !is_eol(c))(i)?;
        return ws0(rest);
    }
    Ok((i, ()))
}

fn keyword<'a>(kw: &'static str) -> impl FnMut(ParserInput<'a>) -> PResult<'a, ParserInput<'a>> {
    move |input| tag(kw.as_bytes())(input)
}

/// Parses `%PDF-1.N` and returns the version string (`"1.N"`).
pub fn header(input: ParserInput) -> Option<String> {
    let parsed: PResult<ParserInput> = preceded(tag(b"%PDF-".as_slice()), recognize(pair(digit1, pair(tag(b".".as_slice()), digit1))))(input);
    parsed.ok().map(|(_, v)| String::from_utf8_lossy(v.fragment()).into_owned())
}

/// Parses the binary-comment line following the header, if any four+ high
/// bytes are present, and returns them.
pub fn binary_mark(input: ParserInput) -> Option<Vec<u8>> {
    let parsed: PResult<ParserInput> = preceded(tag(b"%".as_slice()), take_while(|c| c != b'\n' && c != b'\r'))(input);
    parsed.ok().map(|(_, v)| v.fragment().to_vec())
}

/// Parses the `startxref\n<offset>` trailer footer, returning the offset.
pub fn xref_start(input: ParserInput) -> Option<i64> {
    let parsed: PResult<i64> = preceded(
        pair(tag(b"startxref".as_slice()), ws0),
        map_res(digit1, |d: ParserInput| {
            std::str::from_utf8(d.fragment()).unwrap_or("").parse::<i64>()
        }),
    )(input);
    parsed.ok().map(|(_, v)| v)
}

fn integer(input: ParserInput) -> PResult<i64> {
    map_res(recognize(pair(opt(one_of("+-")), digit1)), |d: ParserInput| {
        std::str::from_utf8(d.fragment()).unwrap_or("").parse::<i64>()
    })(input)
}

fn real(input: ParserInput) -> PResult<f64> {
    map_res(
        recognize(pair(
            opt(one_of("+-")),
            alt((
                recognize(pair(digit1, pair(tag(b".".as_slice()), opt(digit1)))),
                recognize(pair(tag(b".".as_slice()), digit1)),
            )),
        )),
        |d: ParserInput| std::str::from_utf8(d.fragment()).unwrap_or("0").parse::<f64>(),
    )(input)
}

fn number(input: ParserInput) -> PResult<Object> {
    alt((map(real, Object::Real), map(integer, Object::Integer)))(input)
}

// Names only ever contain regular characters (escape sequences aside); `#xx`
// escapes are decoded inline as they're encountered.
fn name(input: ParserInput) -> PResult<Vec<u8>> {
    let (mut rest, _) = tag(b"/".as_slice())(input)?;
    let mut out = Vec::new();
    loop {
        match rest.fragment().first() {
            Some(b'#') if rest.fragment().len() >= 3 && rest.fragment()[1].is_ascii_hexdigit() && rest.fragment()[2].is_ascii_hexdigit() => {
                let hex = std::str::from_utf8(&rest.fragment()[1..3]).unwrap_or("00");
                let byte = u8::from_str_radix(hex, 16).unwrap_or(b'#');
                out.push(byte);
                rest = rest.slice_from(3);
            }
            Some(&c) if is_regular(c) => {
                out.push(c);
                rest = rest.slice_from(1);
            }
            _ => break,
        }
    }
    Ok((rest, out))
}

trait SliceFrom {
    fn slice_from(&self, n: usize) -> Self;
}
impl<'a> SliceFrom for ParserInput<'a> {
    fn slice_from(&self, n: usize) -> Self {
        let (_, rest) = take::<usize, ParserInput<'a>, nom::error::Error<ParserInput<'a>>>(n)(*self).expect("in-bounds slice");
        rest
    }
}

fn literal_string(input: ParserInput) -> PResult<Vec<u8>> {
    let (mut rest, _) = tag(b"(".as_slice())(input)?;
    let mut out = Vec::new();
    let mut depth: usize = 1;
    loop {
        if depth > MAX_BRACKET {
            return Err(nom::Err::Failure(nom::error::Error::new(rest, nom::error::ErrorKind::TooLarge)));
        }
        let Some(&c) = rest.fragment().first() else {
            return Err(nom::Err::Error(nom::error::Error::new(rest, nom::error::ErrorKind::Eof)));
        };
        match c {
            b'(' => {
                depth += 1;
                out.push(c);
                rest = rest.slice_from(1);
            }
            b')' => {
                depth -= 1;
                rest = rest.slice_from(1);
                if depth == 0 {
                    break;
                }
                out.push(c);
            }
            b'\\' => {
                rest = rest.slice_from(1);
                let Some(&esc) = rest.fragment().first() else { break };
                match esc {
                    b'n' => { out.push(b'\n'); rest = rest.slice_from(1); }
                    b'r' => { out.push(b'\r'); rest = rest.slice_from(1); }
                    b't' => { out.push(b'\t'); rest = rest.slice_from(1); }
                    b'b' => { out.push(0x08); rest = rest.slice_from(1); }
                    b'f' => { out.push(0x0C); rest = rest.slice_from(1); }
                    b'(' | b')' | b'\\' => { out.push(esc); rest = rest.slice_from(1); }
                    b'\r' => {
                        rest = rest.slice_from(1);
                        if rest.fragment().first() == Some(&b'\n') {
                            rest = rest.slice_from(1);
                        }
                    }
                    b'\n' => { rest = rest.slice_from(1); }
                    b'0'..=b'7' => {
                        let mut val: u32 = 0;
                        let mut n = 0;
                        while n < 3 {
                            match rest.fragment().first() {
                                Some(&d) if (b'0'..=b'7').contains(&d) => {
                                    val = val * 8 + (d - b'0') as u32;
                                    rest = rest.slice_from(1);
                                    n += 1;
                                }
                                _ => break,
                            }
                        }
                        out.push((val & 0xFF) as u8);
                    }
                    _ => { out.push(esc); rest = rest.slice_from(1); }
                }
            }
            _ => {
                out.push(c);
                rest = rest.slice_from(1);
            }
        }
    }
    Ok((rest, out))
}

fn hex_string(input: ParserInput) -> PResult<Vec<u8>> {
    let (rest, digits) = delimited(
        tag(b"<".as_slice()),
        take_while(|c| c.is_ascii_hexdigit() || is_whitespace(c)),
        tag(b">".as_slice()),
    )(input)?;
    let mut cleaned: Vec<u8> = digits.fragment().iter().copied().filter(|c| !is_whitespace(*c)).collect();
    if cleaned.len() % 2 == 1 {
        cleaned.push(b'0');
    }
    let mut out = Vec::with_capacity(cleaned.len() / 2);
    for pair in cleaned.chunks_exact(2) {
        let hex = std::str::from_utf8(pair).unwrap_or("00");
        out.push(u8::from_str_radix(hex, 16).unwrap_or(0));
    }
    Ok((rest, out))
}

fn string(input: ParserInput) -> PResult<Object> {
    alt((
        map(literal_string, |s| Object::String(s, StringFormat::Literal)),
        map(hex_string, |s| Object::String(s, StringFormat::Hexadecimal)),
    ))(input)
}

fn boolean(input: ParserInput) -> PResult<Object> {
    alt((
        value(Object::Boolean(true), tag(b"true".as_slice())),
        value(Object::Boolean(false), tag(b"false".as_slice())),
    ))(input)
}

fn null(input: ParserInput) -> PResult<Object> {
    value(Object::Null, tag(b"null".as_slice()))(input)
}

fn array(input: ParserInput) -> PResult<Object> {
    map(
        delimited(
            pair(tag(b"[".as_slice()), ws0),
            many0(terminated(object, ws0)),
            tag(b"]".as_slice()),
        ),
        Object::Array,
    )(input)
}

fn dict_entries(input: ParserInput) -> PResult<Dictionary> {
    map(
        delimited(
            pair(tag(b"<<".as_slice()), ws0),
            many0(terminated(pair(name, preceded(ws0, object)), ws0)),
            tag(b">>".as_slice()),
        ),
        |pairs| {
            let mut dict = Dictionary::new();
            for (k, v) in pairs {
                dict.set(k, v);
            }
            dict
        },
    )(input)
}

fn reference(input: ParserInput) -> PResult<ObjectId> {
    let (rest, (num, _, gen, _, _)) = (
        integer,
        ws0,
        integer,
        ws0,
        tag(b"R".as_slice()),
    )
        .parse(input)?;
    Ok((rest, (num as u32, gen as u16)))
}

/// Any syntactic PDF object (no stream body, no indirection wrapper).
pub fn object(input: ParserInput) -> PResult<Object> {
    alt((
        map(reference, Object::Reference),
        map(dict_entries, Object::Dictionary),
        array,
        string,
        map(name, Object::Name),
        number,
        boolean,
        null,
    ))(input)
}

/// Parses `<n> <g> obj ... endobj`, including a trailing `stream...endstream`
/// body if the dictionary describes one. `reader` and `already_seen` are
/// threaded through purely so nested object streams can recurse through
/// [`Reader::get_object`] while parsing compressed entries; the grammar
/// itself never needs to resolve a reference.
pub fn indirect_object<'a>(
    input: ParserInput<'a>, offset: usize, expected_id: Option<ObjectId>, _reader: &Reader,
    _already_seen: &mut HashSet<ObjectId>,
) -> Result<(ObjectId, Object)> {
    let buf = input.fragment();
    if offset > buf.len() {
        return Err(Error::Parse(ParseError::InvalidIndirectObject(offset)));
    }
    let slice = &buf[offset..];
    let span = ParserInput::new_extra(slice, input.extra);

    let parsed: PResult<(i64, i64)> = (
        terminated(integer, ws0),
        terminated(integer, ws0),
    )
        .parse(span);
    let (rest, (num, gen)) = parsed.map_err(|_| Error::Parse(ParseError::InvalidIndirectObject(offset)))?;
    let (rest, _) = tag::<_, ParserInput, nom::error::Error<ParserInput>>(b"obj".as_slice())(rest)
        .map_err(|_| Error::Parse(ParseError::InvalidIndirectObject(offset)))?;
    let (rest, _) = ws0(rest).map_err(|_| Error::Parse(ParseError::InvalidIndirectObject(offset)))?;
    let (rest, obj) = object(rest).map_err(|_| Error::Parse(ParseError::InvalidIndirectObject(offset)))?;

    let id: ObjectId = (num as u32, gen as u16);
    if let Some(expected) = expected_id {
        if expected != id {
            log::warn!("expected object {} {} but found {} {}", expected.0, expected.1, id.0, id.1);
        }
    }

    let (rest, _) = ws0(rest).unwrap_or((rest, ()));
    let has_stream: PResult<ParserInput> = tag(b"stream".as_slice())(rest);
    let obj = if let (stream_rest, Some(_)) = {
        match has_stream {
            Ok((r, m)) => (r, Some(m)),
            Err(_) => (rest, None),
        }
    } {
        let mut after_kw = stream_rest;
        // a single CRLF or LF immediately follows the `stream` keyword
        if after_kw.fragment().first() == Some(&b'\r') {
            after_kw = after_kw.slice_from(1);
        }
        if after_kw.fragment().first() == Some(&b'\n') {
            after_kw = after_kw.slice_from(1);
        }
        let dict = obj.as_dict().map(Clone::clone).map_err(|_| Error::Parse(ParseError::InvalidDictionary(offset)))?;
        let abs_start = offset + (after_kw.fragment().as_ptr() as usize - slice.as_ptr() as usize);
        let stream = Stream::with_position(dict, Vec::new(), abs_start);
        Object::Stream(stream)
    } else {
        obj
    };

    Ok((id, obj))
}

/// Parses either a traditional `xref` table or a cross-reference stream
/// (`/Type /XRef`), followed by its trailer dictionary.
pub fn xref_and_trailer<'a>(input: ParserInput<'a>, reader: &Reader) -> Result<(Xref, Dictionary)> {
    let (rest, _) = ws0(input).unwrap_or((input, ()));
    if tag::<_, ParserInput, nom::error::Error<ParserInput>>(b"xref".as_slice())(rest).is_ok() {
        parse_xref_table(rest)
    } else {
        parse_xref_stream(rest, reader)
    }
}

fn parse_xref_table(input: ParserInput) -> Result<(Xref, Dictionary)> {
    let (rest, _) = tag::<_, ParserInput, nom::error::Error<ParserInput>>(b"xref".as_slice())(input)
        .map_err(|_| Error::Parse(ParseError::InvalidXref))?;
    let mut rest = rest;
    let mut xref = Xref::new(0);

    loop {
        let (r, _) = ws0(rest).unwrap_or((rest, ()));
        rest = r;
        if tag::<_, ParserInput, nom::error::Error<ParserInput>>(b"trailer".as_slice())(rest).is_ok() {
            break;
        }
        let section: PResult<(i64, i64)> = (terminated(integer, ws0), terminated(integer, ws0)).parse(rest);
        let Ok((r, (start, count))) = section else { break };
        rest = r;
        for i in 0..count {
            let entry: PResult<(ParserInput, ParserInput, ParserInput)> = (
                take_while_m_n(10, 10, |c: u8| c.is_ascii_digit()),
                preceded(take_while1(is_whitespace), take_while_m_n(5, 5, |c: u8| c.is_ascii_digit())),
                preceded(take_while1(is_whitespace), alt((tag(b"n".as_slice()), tag(b"f".as_slice())))),
            )
                .parse(rest);
            let Ok((r, (off, gen, kind))) = entry else {
                return Err(Error::Parse(ParseError::InvalidXref));
            };
            rest = r;
            let (r, _) = take_while(is_whitespace)(rest).unwrap_or((rest, ParserInput::new_extra(b"", "")));
            rest = r;
            let offset: u32 = std::str::from_utf8(off.fragment()).unwrap_or("0").parse().unwrap_or(0);
            let generation: u16 = std::str::from_utf8(gen.fragment()).unwrap_or("0").parse().unwrap_or(0);
            let id = start as u32 + i as u32;
            if kind.fragment()[0] == b'n' {
                xref.insert(id, XrefEntry::Normal { offset, generation });
            } else {
                xref.insert(id, XrefEntry::Free { generation });
            }
        }
    }

    let (rest, _) = tag::<_, ParserInput, nom::error::Error<ParserInput>>(b"trailer".as_slice())(rest)
        .map_err(|_| Error::Parse(ParseError::InvalidXref))?;
    let (_rest, _) = ws0(rest).unwrap_or((rest, ()));
    let (_rest, dict) = dict_entries(_rest).map_err(|_| Error::Parse(ParseError::InvalidXref))?;

    let size = dict.get(b"Size").and_then(Object::as_i64).unwrap_or(0).max(0) as u32;
    xref.size = size;
    Ok((xref, dict))
}

fn parse_xref_stream<'a>(input: ParserInput<'a>, reader: &Reader) -> Result<(Xref, Dictionary)> {
    let mut seen = HashSet::new();
    let buf_offset = input.fragment().as_ptr() as usize - reader.buffer.as_ptr() as usize;
    let (_, obj) = indirect_object(input, 0, None, reader, &mut seen)?;
    let mut stream = obj.as_stream().map_err(|_| Error::Xref(XrefError::MissingW))?.clone();

    // the stream body begins right after `stream\r?\n` - recover it from the
    // absolute offset recorded during parsing.
    if let Some(start) = stream.start_position {
        let length = stream
            .dict
            .get(b"Length")
            .and_then(Object::as_i64)
            .map_err(|_| Error::Xref(XrefError::MissingW))? as usize;
        let abs_start = buf_offset + start;
        if abs_start + length > reader.buffer.len() {
            return Err(Error::Xref(XrefError::MissingW));
        }
        stream.set_content(reader.buffer[abs_start..abs_start + length].to_vec());
    }

    let decoded = stream.decompressed_content()?;
    let dict = stream.dict.clone();

    let w = dict.get(b"W").and_then(Object::as_array).map_err(|_| Error::Xref(XrefError::MissingW))?;
    if w.len() != 3 {
        return Err(Error::Xref(XrefError::MissingW));
    }
    let widths: Vec<usize> = w.iter().map(|o| o.as_i64().unwrap_or(0) as usize).collect();
    let size = dict.get(b"Size").and_then(Object::as_i64).unwrap_or(0).max(0) as u32;

    let index: Vec<(u32, u32)> = match dict.get(b"Index").and_then(Object::as_array) {
        Ok(arr) => arr
            .chunks_exact(2)
            .map(|c| (c[0].as_i64().unwrap_or(0) as u32, c[1].as_i64().unwrap_or(0) as u32))
            .collect(),
        Err(_) => vec![(0, size)],
    };

    let mut xref = Xref::new(size);
    let entry_width: usize = widths.iter().sum();
    if entry_width == 0 {
        return Err(Error::Xref(XrefError::MissingW));
    }
    let mut cursor = 0usize;
    for (start, count) in index {
        for i in 0..count {
            if cursor + entry_width > decoded.len() {
                break;
            }
            let entry = &decoded[cursor..cursor + entry_width];
            cursor += entry_width;
            let mut off = 0usize;
            let field = |w: usize, entry: &[u8], off: &mut usize| -> i64 {
                if w == 0 {
                    *off += w;
                    return 1; // default type field is 1 (in-use) per spec
                }
                let mut v: i64 = 0;
                for b in &entry[*off..*off + w] {
                    v = (v << 8) | *b as i64;
                }
                *off += w;
                v
            };
            let ty = field(widths[0], entry, &mut off);
            let f2 = field(widths[1], entry, &mut off);
            let f3 = field(widths[2], entry, &mut off);
            let id = start + i;
            match ty {
                0 => xref.insert(id, XrefEntry::Free { generation: f3 as u16 }),
                1 => xref.insert(id, XrefEntry::Normal { offset: f2 as u32, generation: f3 as u16 }),
                2 => xref.insert(id, XrefEntry::Compressed { container: f2 as u32, index: f3 as u16 }),
                _ => {}
            }
        }
    }

    Ok((xref, dict))
}

// nom 8 dropped the free-standing `tuple` combinator: tuples implement
// `Parser` directly via `.parse(input)`.
use nom::Parser;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use crate::writer;

    fn round_trip(source: &str) -> Object {
        let (_, parsed) = object(ParserInput::new_extra(source.as_bytes(), "test")).unwrap();
        let mut bytes = Vec::new();
        writer::write_object(&mut bytes, &parsed).unwrap();
        let (_, reparsed) = object(ParserInput::new_extra(bytes.as_slice(), "test")).unwrap();
        reparsed
    }

    #[test]
    fn integer_round_trips_exactly() {
        assert_eq!(round_trip("-17"), Object::Integer(-17));
    }

    #[test]
    fn real_round_trips_exactly() {
        assert_eq!(round_trip("3.25"), Object::Real(3.25));
    }

    #[test]
    fn name_round_trips_with_hex_escapes() {
        let span = ParserInput::new_extra(b"/A#20B".as_slice(), "test");
        let (_, obj) = object(span).unwrap();
        assert_eq!(obj, Object::Name(b"A B".to_vec()));
    }

    #[test]
    fn dictionary_round_trips_order_and_values() {
        let reparsed = round_trip("<< /A 1 /B 2 0 R /C (hi) >>");
        let dict = reparsed.as_dict().unwrap();
        let keys: Vec<&[u8]> = dict.iter().map(|(k, _)| k.as_slice()).collect();
        assert_eq!(keys, vec![b"A".as_slice(), b"B".as_slice(), b"C".as_slice()]);
        assert_eq!(dict.get(b"A").unwrap(), &Object::Integer(1));
        assert_eq!(dict.get(b"B").unwrap(), &Object::Reference((2, 0)));
        assert_eq!(dict.get(b"C").unwrap(), &Object::String(b"hi".to_vec(), StringFormat::Literal));
    }

    #[test]
    fn array_round_trips() {
        let reparsed = round_trip("[1 2.5 /Name (str) true null]");
        assert_eq!(
            reparsed,
            Object::Array(vec![
                Object::Integer(1),
                Object::Real(2.5),
                Object::Name(b"Name".to_vec()),
                Object::String(b"str".to_vec(), StringFormat::Literal),
                Object::Boolean(true),
                Object::Null,
            ])
        );
    }

    /// An xref stream `/W [1 3 1]` with three packed entries: object 1
    /// in-use at offset 15, object 2 compressed in container stream 2 at
    /// index 1, object 3 free.
    #[test]
    fn xref_stream_decodes_packed_entry_types() {
        let entries: [u8; 15] = [
            0x01, 0x00, 0x00, 0x0F, 0x00, // in-use, offset 15, gen 0
            0x02, 0x00, 0x00, 0x02, 0x01, // compressed, container 2, index 1
            0x00, 0x00, 0x00, 0x00, 0x00, // free
        ];
        let mut pdf = Vec::new();
        pdf.extend_from_slice(b"%PDF-1.5\n");
        let obj_start = pdf.len();
        pdf.extend_from_slice(b"1 0 obj<</Type/XRef/W[1 3 1]/Index[1 3]/Size 4/Length 15>>stream\n");
        pdf.extend_from_slice(&entries);
        pdf.extend_from_slice(b"\nendstream\nendobj\n");

        let reader = Reader { buffer: &pdf, document: Document::new() };
        let span = ParserInput::new_extra(&pdf[obj_start..], "xref");
        let (xref, _trailer) = xref_and_trailer(span, &reader).unwrap();

        assert_eq!(xref.get(1), Some(&XrefEntry::Normal { offset: 15, generation: 0 }));
        assert_eq!(xref.get(2), Some(&XrefEntry::Compressed { container: 2, index: 1 }));
        assert_eq!(xref.get(3), Some(&XrefEntry::Free { generation: 0 }));
    }
}
