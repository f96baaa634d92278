//! Parse → write → parse round trips at the whole-document level.

mod support;

use docforge::{write, Document, WriteOptions};

/// A traditional-xref, single-page file: `Document::version == "1.4"` and
/// `page_count() == 1`.
#[test]
fn parses_traditional_xref_single_page_file() {
    let doc = Document::load_mem(&support::n_page_pdf(1)).unwrap();
    assert_eq!(doc.version, "1.4");
    assert_eq!(doc.page_count(), 1);
}

/// `parse(write(parse(F)))` yields an equivalent document: same page
/// count and the same `/Root` subgraph shape, up to renumbering.
#[test]
fn round_trip_preserves_page_count_and_catalog() {
    for pages in [1, 3, 7] {
        let original = Document::load_mem(&support::n_page_pdf(pages)).unwrap();
        assert_eq!(original.page_count(), pages);

        let bytes = write(&original, WriteOptions::default()).unwrap();
        let reparsed = Document::load_mem(&bytes).unwrap();

        assert_eq!(reparsed.page_count(), pages);
        assert_eq!(reparsed.catalog().unwrap().get_type().unwrap(), b"Catalog");
        assert!(reparsed.trailer.has(b"ID"));
    }
}

/// Every page reachable from the re-written catalog still has a
/// `/MediaBox`, directly or inherited, after the round trip.
#[test]
fn round_trip_preserves_media_box() {
    let original = Document::load_mem(&support::n_page_pdf(4)).unwrap();
    let bytes = write(&original, WriteOptions::default()).unwrap();
    let reparsed = Document::load_mem(&bytes).unwrap();

    for page in reparsed.pages() {
        assert!(reparsed.inherited(page.id, b"MediaBox").unwrap().is_some());
    }
}

/// When an incremental update's xref section redefines an object already
/// present in an earlier section, the newer (later-appearing) definition
/// wins, not the one that was loaded first.
#[test]
fn newer_xref_revision_wins_over_earlier_one() {
    let base = support::n_page_pdf(2);
    let updated = support::with_redefined_object_3(&base, "0 0 200 200");

    let original = Document::load_mem(&base).unwrap();
    let original_box = original.get_dictionary((3, 0)).unwrap().get(b"MediaBox").unwrap().as_array().unwrap().clone();
    assert_eq!(original_box[2].as_i64().unwrap(), 612);

    let doc = Document::load_mem(&updated).unwrap();
    let media_box = doc.get_dictionary((3, 0)).unwrap().get(b"MediaBox").unwrap().as_array().unwrap();
    assert_eq!(media_box[2].as_i64().unwrap(), 200);
    assert_eq!(media_box[3].as_i64().unwrap(), 200);
}
