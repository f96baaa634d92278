//! Minimal DER/BER encoder for the RFC 5652 `SignedData` structure this
//! crate embeds as a detached PAdES signature, plus a self-signed
//! certificate wrapping the signer's RSA public key. Retargeted from the
//! ECDSA-oriented TLV helpers of a sibling signing tool to the RSA
//! PKCS#1 v1.5 + SHA-256/384/512 OID table this crate signs with.

use rsa::traits::PublicKeyParts;
use rsa::RsaPublicKey;

use super::DigestAlgorithm;

/// `1.2.840.113549` — the RSADSI arc every OID below hangs off of.
const RSADSI: [u8; 6] = [0x2A, 0x86, 0x48, 0x86, 0xF7, 0x0D];

const OID_DATA: &[u8] = &[0x2A, 0x86, 0x48, 0x86, 0xF7, 0x0D, 0x01, 0x07, 0x01];
const OID_SIGNED_DATA: &[u8] = &[0x2A, 0x86, 0x48, 0x86, 0xF7, 0x0D, 0x01, 0x07, 0x02];
const OID_CONTENT_TYPE: &[u8] = &[0x2A, 0x86, 0x48, 0x86, 0xF7, 0x0D, 0x01, 0x09, 0x03];
const OID_MESSAGE_DIGEST: &[u8] = &[0x2A, 0x86, 0x48, 0x86, 0xF7, 0x0D, 0x01, 0x09, 0x04];
const OID_SIGNING_TIME: &[u8] = &[0x2A, 0x86, 0x48, 0x86, 0xF7, 0x0D, 0x01, 0x09, 0x05];
const OID_RSA_ENCRYPTION: &[u8] = &[0x2A, 0x86, 0x48, 0x86, 0xF7, 0x0D, 0x01, 0x01, 0x01];

impl DigestAlgorithm {
    /// `2.16.840.1.101.3.4.2.{1,2,3}`.
    pub(super) fn digest_oid(self) -> &'static [u8] {
        match self {
            DigestAlgorithm::Sha256 => &[0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x02, 0x01],
            DigestAlgorithm::Sha384 => &[0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x02, 0x02],
            DigestAlgorithm::Sha512 => &[0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x02, 0x03],
        }
    }

    /// `sha{256,384,512}WithRSAEncryption` = `1.2.840.113549.1.1.{11,12,13}`.
    pub(super) fn signature_oid(self) -> Vec<u8> {
        let last = match self {
            DigestAlgorithm::Sha256 => 0x0B,
            DigestAlgorithm::Sha384 => 0x0C,
            DigestAlgorithm::Sha512 => 0x0D,
        };
        let mut oid = RSADSI.to_vec();
        oid.extend_from_slice(&[0x01, 0x01, last]);
        oid
    }
}

/// Builds the raw concatenated `Attribute` encodings (contentType,
/// signingTime, messageDigest, in that order) with no outer tag — callers
/// wrap this as a `SET OF` (tag 0x31, [`wrap_as_set`]) to hash it per RFC
/// 5652, or as an IMPLICIT `[0]` (tag 0xA0, via `build_context_specific`)
/// to embed it in `SignerInfo`. The DER bytes are identical either way;
/// only the outer tag differs, which is exactly the IMPLICIT-tagging rule
/// this structure relies on.
pub(super) fn build_signed_attributes(document_hash: &[u8], signing_time_utc: &str) -> Vec<u8> {
    let content_type = build_attribute(OID_CONTENT_TYPE, &build_oid(OID_DATA));
    let signing_time = build_attribute(OID_SIGNING_TIME, &build_utc_time(signing_time_utc));
    let message_digest = build_attribute(OID_MESSAGE_DIGEST, &build_octet_string(document_hash));

    let mut attrs = Vec::new();
    attrs.extend(content_type);
    attrs.extend(signing_time);
    attrs.extend(message_digest);
    attrs
}

/// Tags raw `Attribute` content as `SET OF Attribute` (tag 0x31) — the form
/// that gets hashed and signed, per RFC 5652 §5.4.
pub(super) fn wrap_as_set(content: &[u8]) -> Vec<u8> {
    build_set(content)
}

/// Builds the full `ContentInfo { contentType: id-signedData, content: SignedData }`.
pub(super) fn build_signed_data(
    digest: DigestAlgorithm,
    signed_attrs: &[u8],
    signature: &[u8],
    certificate: &[u8],
    issuer_cn: &str,
    serial: u64,
) -> Vec<u8> {
    let mut content = Vec::new();
    content.extend(build_integer(&[1])); // version

    let digest_alg = build_algorithm_identifier(digest.digest_oid());
    content.extend(build_set(&digest_alg));

    content.extend(build_sequence(&[&build_oid(OID_DATA)])); // empty EncapsulatedContentInfo

    content.extend(build_context_specific(0, certificate));

    let signer_info = build_signer_info(digest, signed_attrs, signature, issuer_cn, serial);
    content.extend(build_set(&signer_info));

    let signed_data = build_sequence(&[&content]);

    let mut out = Vec::new();
    out.extend(build_oid(OID_SIGNED_DATA));
    out.extend(build_context_specific(0, &signed_data));
    build_sequence(&[&out])
}

fn build_signer_info(digest: DigestAlgorithm, signed_attrs: &[u8], signature: &[u8], issuer_cn: &str, serial: u64) -> Vec<u8> {
    let mut content = Vec::new();
    content.extend(build_integer(&[1])); // version 1: issuerAndSerialNumber
    content.extend(build_issuer_and_serial(issuer_cn, serial));
    content.extend(build_algorithm_identifier(digest.digest_oid()));
    content.extend(build_context_specific(0, signed_attrs));
    content.extend(build_algorithm_identifier(&digest.signature_oid()));
    content.extend(build_octet_string(signature));
    build_sequence(&[&content])
}

/// A minimal self-signed X.509-shaped certificate wrapping an RSA public
/// key, for embedding in the CMS `certificates` field. Issuer/subject are a
/// single CN RDN; validity dates are fixed placeholders. Not a conformant
/// X.509 certificate chain — sufficient to carry a verifiable public key
/// alongside the signature, which is all PAdES verification here needs.
pub(super) fn build_self_signed_certificate(public_key: &RsaPublicKey, subject_cn: &str, serial: u64) -> Vec<u8> {
    let mut tbs = Vec::new();
    tbs.extend(build_context_specific(0, &build_integer(&[2]))); // version v3
    tbs.extend(build_integer(&serial.to_be_bytes()));
    tbs.extend(build_algorithm_identifier(OID_RSA_ENCRYPTION));
    tbs.extend(build_name(subject_cn));
    tbs.extend(build_validity());
    tbs.extend(build_name(subject_cn));
    tbs.extend(build_subject_public_key_info(public_key));
    let tbs_cert = build_sequence(&[&tbs]);

    let mut cert = Vec::new();
    cert.extend(&tbs_cert);
    cert.extend(build_algorithm_identifier(OID_RSA_ENCRYPTION));
    cert.extend(build_bit_string(&[0; 8])); // outer signature is not verified; key is what matters here

    build_sequence(&[&cert])
}

pub(super) fn build_subject_public_key_info(public_key: &RsaPublicKey) -> Vec<u8> {
    let n = build_integer(&public_key.n().to_bytes_be());
    let e = build_integer(&public_key.e().to_bytes_be());
    let rsa_public_key = build_sequence(&[&n, &e]);
    let alg = build_algorithm_identifier(OID_RSA_ENCRYPTION);
    let bits = build_bit_string(&rsa_public_key);
    build_sequence(&[&alg, &bits])
}

/// Pulls `(n, e)` back out of a certificate built by
/// [`build_self_signed_certificate`]. Walks only the fixed shape this
/// module itself produces — not a general X.509 parser.
pub(super) fn extract_public_key_from_certificate(cert: &[u8]) -> Option<(Vec<u8>, Vec<u8>)> {
    let (tbs_cert, _) = read_tlv(cert)?;
    let (version, rest) = read_tlv(tbs_cert)?;
    debug_assert_eq!(version[0] & 0xA0, 0xA0);
    let (_serial, rest) = read_tlv(rest)?;
    let (_sig_alg, rest) = read_tlv(rest)?;
    let (_issuer, rest) = read_tlv(rest)?;
    let (_validity, rest) = read_tlv(rest)?;
    let (_subject, rest) = read_tlv(rest)?;
    let (spki, _rest) = read_tlv(rest)?;

    let (_alg, spki_rest) = read_tlv(spki)?;
    let (bit_string, _) = read_tlv(spki_rest)?;
    let rsa_public_key = &bit_string[1..]; // skip "unused bits" byte
    let (n, rest) = read_tlv(rsa_public_key)?;
    let (e, _) = read_tlv(rest)?;
    Some((strip_leading_zero(n), strip_leading_zero(e)))
}

/// Everything [`Signer::verify`](super::signer::Signer::verify) needs back
/// out of a `SignedData` this module built: which digest algorithm was
/// used, the embedded certificate, the raw (untagged) signed attributes,
/// and the detached signature bytes.
struct ParsedSignedData {
    digest: DigestAlgorithm,
    certificate: Vec<u8>,
    signed_attrs: Vec<u8>,
    signature: Vec<u8>,
}

/// Walks a `ContentInfo { id-signedData, SignedData }` structure this
/// module itself produced, in the exact field order [`build_signed_data`]
/// emits it. Not a general CMS parser.
fn parse_signed_data_fields(der: &[u8]) -> Option<ParsedSignedData> {
    let (content_info, _) = read_tlv(der)?;
    let (_oid, rest) = read_tlv(content_info)?;
    let (signed_data_tlv, _) = read_tlv(rest)?;
    let (sd_content, _) = read_tlv(signed_data_tlv)?;

    let (_version, rest) = read_tlv(sd_content)?;
    let (digest_algs_set, rest) = read_tlv(rest)?;
    let (alg_id_content, _) = read_tlv(digest_algs_set)?;
    let (digest_oid, _) = read_tlv(alg_id_content)?;
    let digest = oid_to_digest_algorithm(digest_oid)?;

    let (_encap_content_info, rest) = read_tlv(rest)?;
    let (certificate, rest) = read_tlv(rest)?;
    let (signer_infos_set, _rest) = read_tlv(rest)?;

    let (signer_info_content, _) = read_tlv(signer_infos_set)?;
    let (_si_version, rest) = read_tlv(signer_info_content)?;
    let (_issuer_and_serial, rest) = read_tlv(rest)?;
    let (_digest_algorithm, rest) = read_tlv(rest)?;
    let (signed_attrs, rest) = read_tlv(rest)?;
    let (_signature_algorithm, rest) = read_tlv(rest)?;
    let (signature, _) = read_tlv(rest)?;

    Some(ParsedSignedData {
        digest,
        certificate: certificate.to_vec(),
        signed_attrs: signed_attrs.to_vec(),
        signature: signature.to_vec(),
    })
}

fn oid_to_digest_algorithm(oid: &[u8]) -> Option<DigestAlgorithm> {
    [DigestAlgorithm::Sha256, DigestAlgorithm::Sha384, DigestAlgorithm::Sha512]
        .into_iter()
        .find(|d| d.digest_oid() == oid)
}

/// Extracts `(digest algorithm, certificate DER, messageDigest attribute
/// value)` from a `SignedData` this module built.
pub(super) fn parse_minimal_signed_data(der: &[u8]) -> Option<(DigestAlgorithm, Vec<u8>, Vec<u8>)> {
    let parsed = parse_signed_data_fields(der)?;
    let message_digest = extract_message_digest(&parsed.signed_attrs)?;
    Some((parsed.digest, parsed.certificate, message_digest))
}

/// Extracts `(detached signature, raw signed-attributes content)` from a
/// `SignedData` this module built. The signed attributes are returned
/// untagged, matching what [`build_signed_attributes`] produces, so the
/// caller can re-wrap them with [`wrap_as_set`] before hashing.
pub(super) fn extract_signature_and_signed_attrs(der: &[u8]) -> Option<(Vec<u8>, Vec<u8>)> {
    let parsed = parse_signed_data_fields(der)?;
    Some((parsed.signature, parsed.signed_attrs))
}

/// Pulls the `messageDigest` attribute value out of the raw signed
/// attributes this module built — the third (and last) `Attribute` in
/// [`build_signed_attributes`]'s fixed contentType/signingTime/messageDigest
/// order.
fn extract_message_digest(signed_attrs: &[u8]) -> Option<Vec<u8>> {
    let (_content_type_attr, rest) = read_tlv(signed_attrs)?;
    let (_signing_time_attr, rest) = read_tlv(rest)?;
    let (message_digest_attr, _) = read_tlv(rest)?;

    let (_oid, rest) = read_tlv(message_digest_attr)?;
    let (set_content, _) = read_tlv(rest)?;
    let (octet_string, _) = read_tlv(set_content)?;
    Some(octet_string.to_vec())
}

/// Pulls the subject's common name back out of a certificate built by
/// [`build_self_signed_certificate`]. Walks the same fixed shape as
/// [`extract_public_key_from_certificate`], stopping one field earlier.
pub(super) fn extract_subject_common_name(cert: &[u8]) -> Option<String> {
    let (tbs_cert, _) = read_tlv(cert)?;
    let (version, rest) = read_tlv(tbs_cert)?;
    debug_assert_eq!(version[0] & 0xA0, 0xA0);
    let (_serial, rest) = read_tlv(rest)?;
    let (_sig_alg, rest) = read_tlv(rest)?;
    let (_issuer, rest) = read_tlv(rest)?;
    let (_validity, rest) = read_tlv(rest)?;
    let (subject, _rest) = read_tlv(rest)?;

    let (rdn_set, _) = read_tlv(subject)?;
    let (attr, _) = read_tlv(rdn_set)?;
    let (_cn_oid, value) = read_tlv(attr)?;
    let (cn_utf8, _) = read_tlv(value)?;
    String::from_utf8(cn_utf8.to_vec()).ok()
}

fn strip_leading_zero(bytes: &[u8]) -> Vec<u8> {
    if bytes.len() > 1 && bytes[0] == 0 {
        bytes[1..].to_vec()
    } else {
        bytes.to_vec()
    }
}

/// Reads one TLV's content, returning `(content, tbs_cert_bytes_consumed)`
/// where the second element is everything the TLV's tag+length header
/// occupied plus its content — i.e. `(content, remainder)`.
fn read_tlv(bytes: &[u8]) -> Option<(&[u8], &[u8])> {
    if bytes.len() < 2 {
        return None;
    }
    let (len, header_len) = if bytes[1] < 0x80 {
        (bytes[1] as usize, 2)
    } else if bytes[1] == 0x81 {
        (*bytes.get(2)? as usize, 3)
    } else if bytes[1] == 0x82 {
        ((*bytes.get(2)? as usize) << 8 | *bytes.get(3)? as usize, 4)
    } else {
        return None;
    };
    let content = bytes.get(header_len..header_len + len)?;
    let remainder = bytes.get(header_len + len..)?;
    Some((content, remainder))
}

// --- ASN.1 DER primitives --------------------------------------------------

fn build_tlv(tag: u8, content: &[u8]) -> Vec<u8> {
    let mut out = vec![tag];
    let len = content.len();
    if len < 0x80 {
        out.push(len as u8);
    } else if len < 0x100 {
        out.push(0x81);
        out.push(len as u8);
    } else {
        out.push(0x82);
        out.push((len >> 8) as u8);
        out.push(len as u8);
    }
    out.extend_from_slice(content);
    out
}

fn build_sequence(items: &[&[u8]]) -> Vec<u8> {
    let content: Vec<u8> = items.iter().flat_map(|i| i.iter().copied()).collect();
    build_tlv(0x30, &content)
}

fn build_set(content: &[u8]) -> Vec<u8> {
    build_tlv(0x31, content)
}

fn build_oid(oid_bytes: &[u8]) -> Vec<u8> {
    build_tlv(0x06, oid_bytes)
}

fn build_integer(value: &[u8]) -> Vec<u8> {
    let value = if value.is_empty() { &[0][..] } else { value };
    if value[0] & 0x80 != 0 {
        let mut padded = vec![0];
        padded.extend_from_slice(value);
        build_tlv(0x02, &padded)
    } else {
        build_tlv(0x02, value)
    }
}

fn build_octet_string(content: &[u8]) -> Vec<u8> {
    build_tlv(0x04, content)
}

fn build_bit_string(content: &[u8]) -> Vec<u8> {
    let mut bs = vec![0];
    bs.extend_from_slice(content);
    build_tlv(0x03, &bs)
}

fn build_utf8_string(s: &str) -> Vec<u8> {
    build_tlv(0x0C, s.as_bytes())
}

/// `YYMMDDHHMMSSZ` per X.680 UTCTime.
fn build_utc_time(time: &str) -> Vec<u8> {
    build_tlv(0x17, time.as_bytes())
}

fn build_context_specific(tag: u8, content: &[u8]) -> Vec<u8> {
    build_tlv(0xA0 | tag, content)
}

fn build_attribute(oid: &[u8], value: &[u8]) -> Vec<u8> {
    build_sequence(&[&build_oid(oid), &build_set(value)])
}

fn build_algorithm_identifier(oid: &[u8]) -> Vec<u8> {
    build_sequence(&[&build_oid(oid), &[0x05, 0x00]])
}

fn build_name(cn: &str) -> Vec<u8> {
    let cn_oid = build_oid(&[0x55, 0x04, 0x03]); // 2.5.4.3
    let attr = build_sequence(&[&cn_oid, &build_utf8_string(cn)]);
    build_sequence(&[&build_set(&attr)])
}

fn build_validity() -> Vec<u8> {
    build_sequence(&[&build_utc_time("240101000000Z"), &build_utc_time("340101000000Z")])
}

fn build_issuer_and_serial(cn: &str, serial: u64) -> Vec<u8> {
    build_sequence(&[&build_name(cn), &build_integer(&serial.to_be_bytes())])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tlv_round_trips_through_read_tlv() {
        let tlv = build_octet_string(b"hello");
        let (content, rest) = read_tlv(&tlv).unwrap();
        assert_eq!(content, b"hello");
        assert!(rest.is_empty());
    }

    #[test]
    fn integer_pads_high_bit() {
        let encoded = build_integer(&[0x80]);
        assert_eq!(encoded, vec![0x02, 0x02, 0x00, 0x80]);
    }

    #[test]
    fn digest_oid_matches_nist_sha256() {
        assert_eq!(DigestAlgorithm::Sha256.digest_oid(), &[0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x02, 0x01]);
    }

    #[test]
    fn signature_oid_matches_rsadsi_sha256() {
        assert_eq!(DigestAlgorithm::Sha256.signature_oid(), vec![0x2A, 0x86, 0x48, 0x86, 0xF7, 0x0D, 0x01, 0x01, 0x0B]);
    }
}
