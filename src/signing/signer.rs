//! The incremental-update signing procedure: allocate a Sig/Widget/
//! AcroForm revision, append it, compute the exact `/ByteRange`, and
//! splice in a detached CMS signature — grounded in a sibling signing
//! tool's save-placeholder / compute-range / inject-signature sequence,
//! adapted from a whole-file rewrite to this crate's true incremental
//! append.

use rsa::{Pkcs1v15Sign, RsaPrivateKey, RsaPublicKey};

use super::byte_range::{self, DEFAULT_SIGNATURE_SIZE};
use super::{cms, DigestAlgorithm};
use crate::error::SignError;
use crate::incremental::IncrementalDocument;
use crate::object::{Dictionary, Object, ObjectId, Stream, StringFormat};
use crate::{Error, Result};

/// A minimal self-signed certificate description: just enough identity to
/// embed a verifiable public key alongside the signature. Not a
/// conformant CA-issued certificate — see `cms::build_self_signed_certificate`.
#[derive(Debug, Clone)]
pub struct Certificate {
    pub subject_common_name: String,
    pub serial: u64,
}

#[derive(Debug, Clone)]
pub struct SignOptions {
    pub digest: DigestAlgorithm,
    pub field_name: String,
    pub reason: Option<String>,
    pub location: Option<String>,
    /// 0-based index of the page the signature widget is attached to.
    pub page_index: u32,
    /// Bytes reserved for the raw (non-hex) signature; the `/Contents`
    /// placeholder reserves `2 * signature_size` hex characters.
    pub signature_size: usize,
    pub signing_time_utc: String,
}

impl Default for SignOptions {
    fn default() -> Self {
        SignOptions {
            digest: DigestAlgorithm::Sha256,
            field_name: "Signature1".to_string(),
            reason: None,
            location: None,
            page_index: 0,
            signature_size: DEFAULT_SIGNATURE_SIZE,
            signing_time_utc: "000101000000Z".to_string(),
        }
    }
}

pub struct Signer;

impl Signer {
    /// Appends a new signed revision to `bytes`. Safe to call again on the
    /// output of a previous `sign` call: each invocation only appends, so
    /// every prior `/ByteRange` stays byte-exact (multi-signing).
    pub fn sign(bytes: &[u8], certificate: &Certificate, private_key: &RsaPrivateKey, options: &SignOptions) -> Result<Vec<u8>> {
        let mut incremental = IncrementalDocument::load_mem(bytes)?;

        let public_key = RsaPublicKey::from(private_key);
        let cert_der = cms::build_self_signed_certificate(&public_key, &certificate.subject_common_name, certificate.serial);

        let sig_id = build_signature_revision(&mut incremental, options)?;

        let mut output = incremental.save_to_bytes()?;

        let (a, b) = byte_range::locate_contents(&output, sig_id)?;
        let total_len = output.len() as i64;
        let range = [0i64, a as i64, b as i64, total_len - b as i64];
        byte_range::splice_byte_range(&mut output, sig_id, range)?;

        let mut digest_input = Vec::with_capacity(a + (output.len() - b));
        digest_input.extend_from_slice(&output[..a]);
        digest_input.extend_from_slice(&output[b..]);
        let document_hash = options.digest.digest(&digest_input);

        let signed_attrs_content = cms::build_signed_attributes(&document_hash, &options.signing_time_utc);
        let to_be_signed = cms::wrap_as_set(&signed_attrs_content);
        let attrs_digest = options.digest.digest(&to_be_signed);

        let signature = sign_digest(private_key, options.digest, &attrs_digest)?;

        let signed_data = cms::build_signed_data(
            options.digest,
            &signed_attrs_content,
            &signature,
            &cert_der,
            &certificate.subject_common_name,
            certificate.serial,
        );

        let signature_hex = hex::encode(&signed_data);
        byte_range::splice_signature(&mut output, a, b, &signature_hex)?;

        Ok(output)
    }
}

fn sign_digest(private_key: &RsaPrivateKey, digest: DigestAlgorithm, hashed: &[u8]) -> Result<Vec<u8>> {
    let result = match digest {
        DigestAlgorithm::Sha256 => private_key.sign(Pkcs1v15Sign::new::<sha2::Sha256>(), hashed),
        DigestAlgorithm::Sha384 => private_key.sign(Pkcs1v15Sign::new::<sha2::Sha384>(), hashed),
        DigestAlgorithm::Sha512 => private_key.sign(Pkcs1v15Sign::new::<sha2::Sha512>(), hashed),
    };
    result.map_err(|e| Error::Sign(SignError::UnusableKey(e.to_string())))
}

/// Builds every object the procedure in spec.md §4.6 step 2 names, wires
/// them into the AcroForm/Page/Catalog, and returns the Sig object's id.
fn build_signature_revision(doc: &mut IncrementalDocument, options: &SignOptions) -> Result<ObjectId> {
    let page_id = doc.document.page(options.page_index)?.id;

    let appearance_id = doc.add_object(empty_appearance_stream());

    let mut sig_dict = Dictionary::new();
    sig_dict.set("Type", Object::Name(b"Sig".to_vec()));
    sig_dict.set("Filter", Object::Name(b"Adobe.PPKLite".to_vec()));
    sig_dict.set("SubFilter", Object::Name(b"adbe.pkcs7.detached".to_vec()));
    sig_dict.set(
        "ByteRange",
        Object::Array(vec![
            Object::Integer(0),
            Object::Integer(byte_range::BYTE_RANGE_PLACEHOLDER),
            Object::Integer(byte_range::BYTE_RANGE_PLACEHOLDER),
            Object::Integer(byte_range::BYTE_RANGE_PLACEHOLDER),
        ]),
    );
    sig_dict.set("Contents", Object::String(vec![0u8; options.signature_size], StringFormat::Hexadecimal));
    sig_dict.set("M", Object::string_literal(options.signing_time_utc.clone().into_bytes()));
    if let Some(reason) = &options.reason {
        sig_dict.set("Reason", Object::string_literal(reason.clone().into_bytes()));
    }
    if let Some(location) = &options.location {
        sig_dict.set("Location", Object::string_literal(location.clone().into_bytes()));
    }
    let sig_id = doc.add_object(sig_dict);

    let mut widget = Dictionary::new();
    widget.set("Type", Object::Name(b"Annot".to_vec()));
    widget.set("Subtype", Object::Name(b"Widget".to_vec()));
    widget.set("FT", Object::Name(b"Sig".to_vec()));
    widget.set("Rect", Object::Array(vec![Object::Integer(0), Object::Integer(0), Object::Integer(0), Object::Integer(0)]));
    widget.set("V", Object::Reference(sig_id));
    widget.set("T", Object::string_literal(options.field_name.clone().into_bytes()));
    widget.set("F", Object::Integer(4)); // Print
    widget.set("P", Object::Reference(page_id));
    let mut ap = Dictionary::new();
    ap.set("N", Object::Reference(appearance_id));
    widget.set("AP", Object::Dictionary(ap));
    let widget_id = doc.add_object(widget);

    add_widget_to_acroform(doc, widget_id)?;
    add_widget_to_page(doc, page_id, widget_id)?;

    Ok(sig_id)
}

fn empty_appearance_stream() -> Stream {
    let mut dict = Dictionary::new();
    dict.set("Type", Object::Name(b"XObject".to_vec()));
    dict.set("Subtype", Object::Name(b"Form".to_vec()));
    dict.set("FormType", Object::Integer(1));
    dict.set("BBox", Object::Array(vec![Object::Integer(0); 4]));
    Stream::new(dict, Vec::new())
}

fn add_widget_to_acroform(doc: &mut IncrementalDocument, widget_id: ObjectId) -> Result<()> {
    let catalog_id = doc.document.trailer.get(b"Root").and_then(Object::as_reference)?;
    let catalog = doc.document.get_dictionary(catalog_id)?.clone();

    let acroform_id = match catalog.get(b"AcroForm").and_then(Object::as_reference) {
        Ok(id) => id,
        Err(_) => {
            let mut acroform = Dictionary::new();
            acroform.set("Fields", Object::Array(Vec::new()));
            let id = doc.add_object(acroform);
            let mut catalog = catalog.clone();
            catalog.set("AcroForm", Object::Reference(id));
            doc.set_object(catalog_id, catalog);
            id
        }
    };

    let mut acroform = doc.document.get_dictionary(acroform_id)?.clone();
    let mut fields = acroform.get(b"Fields").and_then(Object::as_array).cloned().unwrap_or_default();
    fields.push(Object::Reference(widget_id));
    acroform.set("Fields", Object::Array(fields));
    acroform.set("SigFlags", Object::Integer(3)); // SignaturesExist | AppendOnly
    doc.set_object(acroform_id, acroform);
    Ok(())
}

fn add_widget_to_page(doc: &mut IncrementalDocument, page_id: ObjectId, widget_id: ObjectId) -> Result<()> {
    let mut page = doc.document.get_dictionary(page_id)?.clone();
    let mut annots = match page.get(b"Annots") {
        Ok(Object::Reference(id)) => doc.document.get_object(*id)?.as_array().cloned().unwrap_or_default(),
        Ok(Object::Array(arr)) => arr.clone(),
        _ => Vec::new(),
    };
    annots.push(Object::Reference(widget_id));
    page.set("Annots", Object::Array(annots));
    doc.set_object(page_id, page);
    Ok(())
}
