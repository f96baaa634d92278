//! Minimal hand-built fixtures shared across the integration tests, in the
//! same spirit as `reader::tests::sample_pdf` but parametrized over page
//! count since these tests exercise multi-page behavior the unit tests
//! beside each module don't need.

/// Builds a single-revision, traditional-xref PDF with `pages` leaves
/// sharing one `/Pages` root.
pub fn n_page_pdf(pages: u32) -> Vec<u8> {
    let kids: String = (0..pages).map(|i| format!("{} 0 R", 3 + i)).collect::<Vec<_>>().join(" ");

    let mut body = Vec::new();
    body.extend_from_slice(b"%PDF-1.4\n");
    let mut offsets = vec![0usize];

    offsets.push(body.len());
    body.extend_from_slice(b"1 0 obj<</Type/Catalog/Pages 2 0 R>>endobj\n");

    offsets.push(body.len());
    body.extend_from_slice(format!("2 0 obj<</Type/Pages/Kids[{kids}]/Count {pages}>>endobj\n").as_bytes());

    for i in 0..pages {
        offsets.push(body.len());
        body.extend_from_slice(format!("{} 0 obj<</Type/Page/Parent 2 0 R/MediaBox[0 0 612 792]>>endobj\n", 3 + i).as_bytes());
    }

    let xref_start = body.len();
    let count = offsets.len();
    body.extend_from_slice(format!("xref\n0 {count}\n").as_bytes());
    body.extend_from_slice(b"0000000000 65535 f \n");
    for &off in &offsets[1..] {
        body.extend_from_slice(format!("{off:010} 00000 n \n").as_bytes());
    }
    body.extend_from_slice(format!("trailer\n<</Root 1 0 R/Size {count}>>\n").as_bytes());
    body.extend_from_slice(format!("startxref\n{xref_start}\n%%EOF\n").as_bytes());
    body
}

/// Appends a second, incremental revision to `base` (itself produced by
/// [`n_page_pdf`]) that redefines object 3's `/MediaBox`, and points
/// `/Prev` at the original `startxref` offset. Object 3 is the first page
/// object in every `n_page_pdf` fixture, so the caller can always resolve
/// it to check which revision won.
pub fn with_redefined_object_3(base: &[u8], new_media_box: &str) -> Vec<u8> {
    let prev_start = find_last_startxref(base);

    let mut out = base.to_vec();
    let obj_start = out.len();
    out.extend_from_slice(
        format!("3 0 obj<</Type/Page/Parent 2 0 R/MediaBox[{new_media_box}]>>endobj\n").as_bytes(),
    );

    let xref_start = out.len();
    out.extend_from_slice(b"xref\n3 1\n");
    out.extend_from_slice(format!("{obj_start:010} 00000 n \n").as_bytes());
    out.extend_from_slice(format!("trailer\n<</Root 1 0 R/Size 8/Prev {prev_start}>>\n").as_bytes());
    out.extend_from_slice(format!("startxref\n{xref_start}\n%%EOF\n").as_bytes());
    out
}

fn find_last_startxref(bytes: &[u8]) -> usize {
    let marker = b"startxref\n";
    let pos = bytes.windows(marker.len()).rposition(|window| window == marker).unwrap();
    let digits_start = pos + marker.len();
    let digits_end = bytes[digits_start..].iter().position(|&b| b == b'\n').unwrap() + digits_start;
    std::str::from_utf8(&bytes[digits_start..digits_end]).unwrap().parse().unwrap()
}
