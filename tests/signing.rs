//! Incremental-update signing: prefix preservation, `/ByteRange` exactness,
//! and end-to-end sign + verify.

#![cfg(feature = "signing")]

mod support;

use docforge::signing::{Certificate, SignOptions, Signer};
use docforge::Document;
use rand_core::OsRng;
use rsa::RsaPrivateKey;

fn throwaway_key() -> RsaPrivateKey {
    RsaPrivateKey::new(&mut OsRng, 2048).expect("key generation")
}

/// A source document with enough pages that its serialized size sits in
/// the same range as a real-world signed PDF (~10 KB).
fn ten_kilobyte_pdf() -> Vec<u8> {
    let mut pages = 1u32;
    loop {
        let candidate = support::n_page_pdf(pages);
        if candidate.len() >= 10 * 1024 {
            return candidate;
        }
        pages += 20;
    }
}

/// `sign(F)[0 .. len(F)] == F` when `F` ends with `%%EOF\n`.
#[test]
fn signing_preserves_the_original_byte_prefix() {
    let original = support::n_page_pdf(1);
    assert!(original.ends_with(b"%%EOF\n"));

    let key = throwaway_key();
    let certificate = Certificate { subject_common_name: "docforge test signer".to_string(), serial: 1 };
    let signed = Signer::sign(&original, &certificate, &key, &SignOptions::default()).unwrap();

    assert!(signed.len() > original.len());
    assert_eq!(&signed[..original.len()], original.as_slice());
}

/// After signing, the signed bytes equal file bytes at `[0..a) ∪ [b..L)`
/// and the embedded signature verifies against the signer's own public key.
#[test]
fn byte_range_is_exact_and_verifies() {
    let original = ten_kilobyte_pdf();
    let key = throwaway_key();
    let certificate = Certificate { subject_common_name: "docforge test signer".to_string(), serial: 7 };
    let options = SignOptions::default();

    let signed = Signer::sign(&original, &certificate, &key, &options).unwrap();
    let report = Signer::verify(&signed).unwrap();
    assert!(report.valid);

    let [first_offset, a, b, trailing_len] = report.byte_range;
    assert_eq!(first_offset, 0);
    assert_eq!(b - a + a + trailing_len, signed.len() as i64);
    // The gap spans exactly the reserved hex-digit placeholder, not
    // counting the `<`/`>` delimiters themselves.
    assert_eq!(b - a, 2 * options.signature_size as i64);
}

/// Signing twice chains correctly: the second invocation's output still
/// carries the first signature's bytes untouched.
#[test]
fn multi_signing_preserves_earlier_revisions() {
    let original = support::n_page_pdf(1);

    let first_key = throwaway_key();
    let first_cert = Certificate { subject_common_name: "first signer".to_string(), serial: 1 };
    let once_signed = Signer::sign(&original, &first_cert, &first_key, &SignOptions::default()).unwrap();

    let second_key = throwaway_key();
    let second_cert = Certificate { subject_common_name: "second signer".to_string(), serial: 2 };
    let mut second_options = SignOptions::default();
    second_options.field_name = "Signature2".to_string();
    let twice_signed = Signer::sign(&once_signed, &second_cert, &second_key, &second_options).unwrap();

    assert_eq!(&twice_signed[..once_signed.len()], once_signed.as_slice());

    let report = Signer::verify(&twice_signed).unwrap();
    assert!(report.valid);
    assert_eq!(report.signer_common_name.as_deref(), Some("second signer"));
}

/// A real reader walking the `/Prev` chain must still see every page from
/// before signing, not just the appended Sig/Widget/AcroForm revision:
/// the xref section a signing revision appends covers only the objects it
/// added or touched, so unchanged objects stay resolvable through the
/// prior revision's table.
#[test]
fn signed_document_still_resolves_original_pages() {
    let original = support::n_page_pdf(5);

    let key = throwaway_key();
    let certificate = Certificate { subject_common_name: "docforge test signer".to_string(), serial: 1 };
    let signed = Signer::sign(&original, &certificate, &key, &SignOptions::default()).unwrap();

    let reparsed = Document::load_mem(&signed).unwrap();
    assert_eq!(reparsed.page_count(), 5);
    for i in 0..5 {
        let page = reparsed.page(i).unwrap();
        let dict = reparsed.get_dictionary(page.id).unwrap();
        assert!(dict.has_type(b"Page"));
        assert!(dict.get(b"MediaBox").is_ok());
    }
}
