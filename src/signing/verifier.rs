//! Detached-signature verification: locate the signed `/ByteRange`,
//! reassemble the exact bytes that were hashed, and check the embedded
//! CMS signature against the bundled certificate's public key.

use rsa::{Pkcs1v15Sign, RsaPublicKey};

use super::cms;
use super::signer::Signer;
use super::DigestAlgorithm;
use crate::document::Document;
use crate::error::SignError;
use crate::object::Object;
use crate::Result;

#[derive(Debug, Clone)]
pub struct VerificationReport {
    pub valid: bool,
    pub byte_range: [i64; 4],
    pub signer_common_name: Option<String>,
    pub digest: DigestAlgorithm,
}

impl Signer {
    /// Verifies the last signature revision found in `bytes`. The
    /// `/ByteRange` is taken at face value: invariant 9 requires signers to
    /// leave it byte-exact, so a mismatch here is treated as tampering
    /// rather than repaired.
    pub fn verify(bytes: &[u8]) -> Result<VerificationReport> {
        let document = Document::load_mem(bytes)?;
        let sig_dict = find_signature_dictionary(&document)?;

        let byte_range = read_byte_range(sig_dict)?;
        // The parser already decoded the hex `<...>` string into raw
        // bytes; trailing `0x00` is the unused tail of the signature
        // reservation, left alone here since DER carries its own length.
        let signed_data = sig_dict.get(b"Contents").and_then(Object::as_str)?.to_vec();

        // ByteRange is `[first_offset, first_length, second_offset, second_length]`;
        // the signed content is `[0, gap_start) ∪ [gap_end, len)` and the gap in
        // between holds the `/Contents` hex string itself.
        let [first_offset, gap_start, gap_end, second_length] = byte_range;
        if first_offset != 0 || gap_start < 0 || gap_end < gap_start {
            return Err(SignError::ByteRange("ByteRange is not of the expected [0 a b c] shape".into()).into());
        }
        let gap_start = gap_start as usize;
        let gap_end = gap_end as usize;
        if gap_end > bytes.len() || gap_end as i64 + second_length != bytes.len() as i64 {
            return Err(SignError::ByteRange("ByteRange span exceeds document length".into()).into());
        }

        let mut signed_bytes = Vec::with_capacity(gap_start + (bytes.len() - gap_end));
        signed_bytes.extend_from_slice(&bytes[..gap_start]);
        signed_bytes.extend_from_slice(&bytes[gap_end..]);

        let (digest, certificate, message_digest_attr) = parse_signed_data(&signed_data)?;
        let document_hash = digest.digest(&signed_bytes);

        let valid = message_digest_attr == document_hash && verify_signature(&signed_data, digest, &certificate).unwrap_or(false);

        let signer_common_name = cms::extract_subject_common_name(&certificate);

        Ok(VerificationReport { valid, byte_range, signer_common_name, digest })
    }
}

fn find_signature_dictionary(document: &Document) -> Result<&crate::object::Dictionary> {
    // Later revisions allocate higher object numbers, so the highest-id Sig
    // dictionary is the most recently appended signature.
    document
        .objects
        .values()
        .rev()
        .filter_map(|o| o.as_dict().ok())
        .find(|d| d.has_type(b"Sig"))
        .ok_or_else(|| SignError::NoSignature.into())
}

fn read_byte_range(sig_dict: &crate::object::Dictionary) -> Result<[i64; 4]> {
    let array = sig_dict.get(b"ByteRange").and_then(Object::as_array)?;
    if array.len() != 4 {
        return Err(SignError::ByteRange("ByteRange must have four elements".into()).into());
    }
    let mut out = [0i64; 4];
    for (slot, object) in out.iter_mut().zip(array) {
        *slot = object.as_i64()?;
    }
    Ok(out)
}

/// Walks the `SignedData` structure this crate itself produces, extracting
/// the digest algorithm, the embedded certificate, and the signed
/// `messageDigest` attribute value — not a general CMS parser.
fn parse_signed_data(der: &[u8]) -> Result<(DigestAlgorithm, Vec<u8>, Vec<u8>)> {
    cms::parse_minimal_signed_data(der).ok_or_else(|| SignError::VerificationFailed("malformed SignedData".into()).into())
}

fn verify_signature(der: &[u8], digest: DigestAlgorithm, certificate: &[u8]) -> Option<bool> {
    let (n, e) = cms::extract_public_key_from_certificate(certificate)?;
    let public_key = RsaPublicKey::new(
        rsa::BigUint::from_bytes_be(&n),
        rsa::BigUint::from_bytes_be(&e),
    )
    .ok()?;

    let (signature, signed_attrs) = cms::extract_signature_and_signed_attrs(der)?;
    let attrs_digest = digest.digest(&cms::wrap_as_set(&signed_attrs));

    let result = match digest {
        DigestAlgorithm::Sha256 => public_key.verify(Pkcs1v15Sign::new::<sha2::Sha256>(), &attrs_digest, &signature),
        DigestAlgorithm::Sha384 => public_key.verify(Pkcs1v15Sign::new::<sha2::Sha384>(), &attrs_digest, &signature),
        DigestAlgorithm::Sha512 => public_key.verify(Pkcs1v15Sign::new::<sha2::Sha512>(), &attrs_digest, &signature),
    };
    Some(result.is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_range_rejects_wrong_arity() {
        let mut dict = crate::object::Dictionary::new();
        dict.set("ByteRange", Object::Array(vec![Object::Integer(0), Object::Integer(1)]));
        assert!(read_byte_range(&dict).is_err());
    }
}
