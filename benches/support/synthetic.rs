// Shared by every bench binary via `include!`, since criterion benches in
// `benches/` each compile as a standalone crate and can't `use` a sibling
// module directly. Builds a synthetic multi-page PDF as raw bytes, the
// same way the crate's own loader tests do, so benchmarks don't depend on
// fixture files on disk.
fn synthetic_pdf(count: u32) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(b"%PDF-1.7\n");
    let mut offsets = vec![0usize];

    let mut push = |body: &mut Vec<u8>, offsets: &mut Vec<usize>, text: String| {
        offsets.push(body.len());
        body.extend_from_slice(text.as_bytes());
    };

    push(&mut body, &mut offsets, "1 0 obj<</Type/Catalog/Pages 2 0 R>>endobj\n".to_string());
    let kids: String = (0..count).map(|i| format!("{} 0 R ", i + 3)).collect();
    push(&mut body, &mut offsets, format!("2 0 obj<</Type/Pages/Kids[{kids}]/Count {count}>>endobj\n"));
    for i in 0..count {
        push(
            &mut body,
            &mut offsets,
            format!(
                "{} 0 obj<</Type/Page/Parent 2 0 R/MediaBox[0 0 612 792]/Contents {} 0 R>>endobj\n",
                i + 3,
                i + 3 + count
            ),
        );
    }
    for i in 0..count {
        let content = format!("BT /F1 12 Tf (Page {i}) Tj ET");
        push(
            &mut body,
            &mut offsets,
            format!("{} 0 obj<</Length {}>>stream\n{content}\nendstream endobj\n", i + 3 + count, content.len()),
        );
    }

    let size = offsets.len() as u32;
    let xref_start = body.len();
    body.extend_from_slice(format!("xref\n0 {size}\n").as_bytes());
    body.extend_from_slice(b"0000000000 65535 f \n");
    for &off in &offsets[1..] {
        body.extend_from_slice(format!("{off:010} 00000 n \n").as_bytes());
    }
    body.extend_from_slice(format!("trailer\n<</Root 1 0 R/Size {size}>>\n").as_bytes());
    body.extend_from_slice(format!("startxref\n{xref_start}\n%%EOF").as_bytes());
    body
}
