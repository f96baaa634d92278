use super::*;
use crate::object::StringFormat;
use crate::{Dictionary, Document, Object};

fn sample_pdf() -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(b"%PDF-1.4\n");
    let mut offsets = vec![0usize; 1];
    let mut push_obj = |body: &mut Vec<u8>, offsets: &mut Vec<usize>, text: &str| {
        offsets.push(body.len());
        body.extend_from_slice(text.as_bytes());
    };
    push_obj(&mut body, &mut offsets, "1 0 obj<</Type/Catalog/Pages 2 0 R>>endobj\n");
    push_obj(&mut body, &mut offsets, "2 0 obj<</Type/Pages/Kids[3 0 R]/Count 1>>endobj\n");
    push_obj(
        &mut body,
        &mut offsets,
        "3 0 obj<</Type/Page/Parent 2 0 R/MediaBox[0 0 612 792]>>endobj\n",
    );
    let xref_start = body.len();
    body.extend_from_slice(b"xref\n0 4\n");
    body.extend_from_slice(b"0000000000 65535 f \n");
    for &off in &offsets[1..] {
        body.extend_from_slice(format!("{:010} 00000 n \n", off).as_bytes());
    }
    body.extend_from_slice(b"trailer\n<</Root 1 0 R/Size 4>>\n");
    body.extend_from_slice(format!("startxref\n{xref_start}\n%%EOF").as_bytes());
    body
}

#[test]
fn load_document() {
    let doc = Document::load_mem(&sample_pdf()).unwrap();
    assert_eq!(doc.version, "1.4");
    assert_eq!(doc.catalog().unwrap().get_type().unwrap(), b"Catalog");
}

#[test]
fn load_short_document_fails_to_locate_xref() {
    let err = Document::load_mem(b"%PDF-1.5\n%%EOF\n").unwrap_err();
    assert!(matches!(err, Error::Xref(XrefError::Start)));
}

#[test]
fn load_document_with_preceding_bytes() {
    let mut content = Vec::new();
    content.extend(b"garbage-before-header");
    content.extend(sample_pdf());
    let doc = Document::load_mem(&content).unwrap();
    assert_eq!(doc.version, "1.4");
}

#[test]
fn load_many_shallow_brackets() {
    let content: String = std::iter::repeat("()").take(MAX_BRACKET * 10).flat_map(|x| x.chars()).collect();
    let literal = format!("({content})");
    let pdf = format!(
        "%PDF-1.4\n1 0 obj<</Type/Catalog/Pages 2 0 R>>endobj\n2 0 obj<</Type/Pages/Kids[3 0 R]/Count 1>>endobj\n3 0 obj<</Type/Page/Parent 2 0 R/MediaBox[0 0 1 1]>>endobj\n4 0 obj{literal}endobj\nxref\n0 5\n0000000000 65535 f \n0000000009 00000 n \n0000000060 00000 n \n0000000118 00000 n \n0000000189 00000 n \ntrailer\n<</Root 1 0 R/Size 5>>\nstartxref\n0\n%%EOF"
    );
    let doc = Document::load_mem(pdf.as_bytes()).unwrap();
    assert_eq!(doc.get_object((4, 0)).unwrap().as_str().unwrap().len(), content.len());
}

#[test]
fn load_too_deep_brackets_fails() {
    let content: Vec<u8> = std::iter::repeat(b'(')
        .take(MAX_BRACKET + 1)
        .chain(std::iter::repeat(b')').take(MAX_BRACKET + 1))
        .collect();
    let literal = format!("({})", String::from_utf8(content).unwrap());
    let pdf = format!("%PDF-1.4\n1 0 obj{literal}endobj\nxref\n0 2\n0000000000 65535 f \n0000000009 00000 n \ntrailer\n<</Root 1 0 R/Size 2>>\nstartxref\n0\n%%EOF");
    // The object itself fails to parse past the nesting limit; the xref
    // table is still well-formed, so the document loads with the bad
    // object simply missing from the object map.
    let doc = Document::load_mem(pdf.as_bytes()).unwrap();
    assert!(doc.get_object((1, 0)).is_err());
}

/// A page packed into a compressed `/ObjStm` object stream, resolved
/// through an xref stream's type-2 entries, must still surface through
/// the ordinary page tree walk — the read path that both
/// `load_objects_raw`'s upfront decode and `get_compressed_object`'s lazy
/// lookup share.
#[test]
fn load_document_with_compressed_object_stream() {
    let mut body = Vec::new();
    body.extend_from_slice(b"%PDF-1.5\n");

    let off1 = body.len();
    body.extend_from_slice(b"1 0 obj<</Type/Catalog/Pages 2 0 R>>endobj\n");

    let off2 = body.len();
    body.extend_from_slice(b"2 0 obj<</Type/Pages/Kids[3 0 R]/Count 1>>endobj\n");

    let objstm_header = b"3 0\n";
    let objstm_body = b"<</Type/Page/Parent 2 0 R/MediaBox[0 0 612 792]>>";
    let mut objstm_content = Vec::new();
    objstm_content.extend_from_slice(objstm_header);
    objstm_content.extend_from_slice(objstm_body);

    let off4 = body.len();
    body.extend_from_slice(
        format!(
            "4 0 obj<</Type/ObjStm/N 1/First {}/Length {}>>stream\n",
            objstm_header.len(),
            objstm_content.len()
        )
        .as_bytes(),
    );
    body.extend_from_slice(&objstm_content);
    body.extend_from_slice(b"\nendstream\nendobj\n");

    let off5 = body.len();

    // Entries for objects 0..=5 packed per /W [1 4 1]: type, field2, field3.
    let mut xref_body = Vec::new();
    xref_body.push(0u8); // obj 0: free
    xref_body.extend_from_slice(&0u32.to_be_bytes());
    xref_body.push(0u8);
    xref_body.push(1u8); // obj 1: in-use
    xref_body.extend_from_slice(&(off1 as u32).to_be_bytes());
    xref_body.push(0u8);
    xref_body.push(1u8); // obj 2: in-use
    xref_body.extend_from_slice(&(off2 as u32).to_be_bytes());
    xref_body.push(0u8);
    xref_body.push(2u8); // obj 3: compressed in container 4 at index 0
    xref_body.extend_from_slice(&4u32.to_be_bytes());
    xref_body.push(0u8);
    xref_body.push(1u8); // obj 4: in-use (the ObjStm itself)
    xref_body.extend_from_slice(&(off4 as u32).to_be_bytes());
    xref_body.push(0u8);
    xref_body.push(1u8); // obj 5: in-use (the xref stream itself)
    xref_body.extend_from_slice(&(off5 as u32).to_be_bytes());
    xref_body.push(0u8);

    body.extend_from_slice(
        format!("5 0 obj<</Type/XRef/W[1 4 1]/Size 6/Root 1 0 R/Length {}>>stream\n", xref_body.len()).as_bytes(),
    );
    body.extend_from_slice(&xref_body);
    body.extend_from_slice(b"\nendstream\nendobj\n");

    body.extend_from_slice(format!("startxref\n{off5}\n%%EOF").as_bytes());

    let doc = Document::load_mem(&body).unwrap();
    assert_eq!(doc.page_count(), 1);
    let page = doc.page(0).unwrap();
    assert_eq!(page.id, (3, 0));
    let dict = doc.get_dictionary(page.id).unwrap();
    assert!(dict.has_type(b"Page"));
    assert!(dict.get(b"MediaBox").is_ok());
}

#[test]
fn search_substring_finds_last_occurrence() {
    assert_eq!(Reader::search_substring(b"hello world", b"xyz", 0), None);
    assert_eq!(Reader::search_substring(b"hello world", b"world", 0), Some(6));

    let buffer = b"%%EOF\ntest%%EOF\nend";
    assert_eq!(Reader::search_substring(buffer, b"%%EOF", 0), Some(10));
    assert_eq!(Reader::search_substring(buffer, b"%%EOF", 6), Some(10));
    assert_eq!(Reader::search_substring(buffer, b"%%EOF", 15), None);
    assert_eq!(Reader::search_substring(b"%%EOF", b"%%EOF", 0), Some(0));
}

#[test]
fn dictionary_order_round_trip() {
    // Dictionary entries preserve both insertion order and value identity
    // through a parse.
    let span = ParserInput::new_extra(b"<< /A 1 /B 2 0 R /C (hi) >>".as_slice(), "test");
    let (_, obj) = parser::object(span).unwrap();
    let dict = obj.as_dict().unwrap();
    let keys: Vec<&[u8]> = dict.iter().map(|(k, _)| k.as_slice()).collect();
    assert_eq!(keys, vec![b"A".as_slice(), b"B".as_slice(), b"C".as_slice()]);
    assert_eq!(dict.get(b"A").unwrap(), &Object::Integer(1));
    assert_eq!(dict.get(b"B").unwrap(), &Object::Reference((2, 0)));
    assert_eq!(dict.get(b"C").unwrap(), &Object::String(b"hi".to_vec(), StringFormat::Literal));
}

#[test]
fn reference_disambiguated_from_two_numbers() {
    let span = ParserInput::new_extra(b"7 0 R".as_slice(), "test");
    let (_, obj) = parser::object(span).unwrap();
    assert_eq!(obj, Object::Reference((7, 0)));

    let span = ParserInput::new_extra(b"7 0".as_slice(), "test");
    let (rest, obj) = parser::object(span).unwrap();
    assert_eq!(obj, Object::Integer(7));
    assert_eq!(rest.fragment(), &b" 0".as_slice());
}

#[test]
fn null_value_is_omitted_equivalent() {
    let mut dict = Dictionary::new();
    dict.set("A", Object::Integer(1));
    dict.set("B", Object::Null);
    assert!(dict.has("A"));
    // A dictionary storing Null is still technically present for `.has`,
    // but the writer treats it as absent (see writer::write_dictionary).
    assert_eq!(dict.get(b"B").unwrap(), &Object::Null);
}
