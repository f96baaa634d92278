//! Page-count, reference-closure, and rotation-composition invariants
//! across the mutators (`Merger`, `Splitter`, `Rotator`).

mod support;

use docforge::mutator::{Merger, Rotator, Splitter};
use docforge::object::{Object, ObjectId};
use docforge::Document;

/// Every `Reference` reachable from the new document's trailer resolves to
/// an object actually present in the output.
fn assert_reference_closure(doc: &Document) {
    fn walk(doc: &Document, object: &Object, visited: &mut Vec<ObjectId>) {
        match object {
            Object::Reference(id) => {
                assert!(doc.objects.contains_key(id), "dangling reference to {id:?}");
                if !visited.contains(id) {
                    visited.push(*id);
                    if let Ok(resolved) = doc.get_object(*id) {
                        walk(doc, resolved, visited);
                    }
                }
            }
            Object::Array(items) => {
                for item in items {
                    walk(doc, item, visited);
                }
            }
            Object::Dictionary(dict) => {
                for (_, value) in dict.iter() {
                    walk(doc, value, visited);
                }
            }
            Object::Stream(stream) => {
                for (_, value) in stream.dict.iter() {
                    walk(doc, value, visited);
                }
            }
            _ => {}
        }
    }

    let mut visited = Vec::new();
    walk(doc, &Object::Dictionary(doc.trailer.clone()), &mut visited);
}

/// Merging two 3-page documents yields 6 pages: pages 1-3 from the first
/// source, 4-6 from the second, `/Pages /Count == 6`, and every page's
/// `/Parent` points at the new `/Pages` root.
#[test]
fn merging_two_three_page_documents_yields_six_pages_with_shared_parent() {
    let a = Document::load_mem(&support::n_page_pdf(3)).unwrap();
    let b = Document::load_mem(&support::n_page_pdf(3)).unwrap();

    let merged = Merger::merge(&[&a, &b]).unwrap();
    assert_eq!(merged.page_count(), 6);

    let pages_root = merged.catalog().unwrap().get(b"Pages").unwrap().as_reference().unwrap();
    let pages_dict = merged.get_dictionary(pages_root).unwrap();
    assert_eq!(pages_dict.get(b"Count").unwrap().as_i64().unwrap(), 6);

    for page in merged.pages() {
        let parent = merged.get_dictionary(page.id).unwrap().get(b"Parent").unwrap().as_reference().unwrap();
        assert_eq!(parent, pages_root);
    }

    assert_reference_closure(&merged);
}

/// Merging is additive for arbitrary page counts, not just 3+3.
#[test]
fn merge_page_count_is_additive() {
    for (n1, n2) in [(1u32, 1u32), (2, 5), (0, 4)] {
        let a = Document::load_mem(&support::n_page_pdf(n1.max(1))).unwrap();
        let b = Document::load_mem(&support::n_page_pdf(n2.max(1))).unwrap();
        let merged = Merger::merge(&[&a, &b]).unwrap();
        assert_eq!(merged.page_count(), n1.max(1) + n2.max(1));
    }
}

/// Splitting an `n`-page document into chunks of `chunk_size` yields
/// `ceil(n / chunk_size)` chunks whose page counts sum to `n`.
#[test]
fn split_chunk_counts_sum_to_total() {
    for (pages, chunk_size) in [(10u32, 3u32), (6, 2), (5, 5), (7, 4)] {
        let source = Document::load_mem(&support::n_page_pdf(pages)).unwrap();
        let chunks = Splitter::split(&source, chunk_size).unwrap();

        let expected_chunk_count = pages.div_ceil(chunk_size);
        assert_eq!(chunks.len() as u32, expected_chunk_count);

        let total: u32 = chunks.iter().map(Document::page_count).sum();
        assert_eq!(total, pages);

        for chunk in &chunks {
            assert_reference_closure(chunk);
        }
    }
}

/// `extract` pulls out exactly the requested pages, in the order given.
#[test]
fn extract_selects_requested_pages_in_order() {
    let source = Document::load_mem(&support::n_page_pdf(5)).unwrap();
    let extracted = Splitter::extract(&source, &[4, 0, 2]).unwrap();
    assert_eq!(extracted.page_count(), 3);
}

/// `rotate(d1) ∘ rotate(d2)` equals `rotate((d1 + d2) mod 360)` normalized
/// to the nearest quarter turn.
#[test]
fn rotation_composition_matches_summed_rotation() {
    let source = Document::load_mem(&support::n_page_pdf(1)).unwrap();

    let composed = Rotator::rotate(&source, &[], 90).unwrap();
    let composed = Rotator::rotate(&composed, &[], 90).unwrap();

    let direct = Rotator::rotate(&source, &[], 180).unwrap();

    let page_id = composed.pages().next().unwrap().id;
    let composed_rotate = composed.get_dictionary(page_id).unwrap().get(b"Rotate").unwrap().as_i64().unwrap();

    let page_id = direct.pages().next().unwrap().id;
    let direct_rotate = direct.get_dictionary(page_id).unwrap().get(b"Rotate").unwrap().as_i64().unwrap();

    assert_eq!(composed_rotate, 180);
    assert_eq!(composed_rotate, direct_rotate);
}
