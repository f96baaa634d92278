//! Incremental-update digital signing: appends a Sig/Widget/AcroForm
//! revision to an existing PDF, computes an exact `/ByteRange`, and embeds
//! a detached CMS SignedData signature without ever rewriting bytes
//! already on disk.

mod byte_range;
mod cms;
mod signer;
mod verifier;

pub use signer::{Certificate, SignOptions, Signer};
pub use verifier::VerificationReport;

/// Digest algorithm a signature is computed with; also selects the
/// matching `sha{N}WithRSAEncryption` signature algorithm OID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DigestAlgorithm {
    #[default]
    Sha256,
    Sha384,
    Sha512,
}

impl DigestAlgorithm {
    fn digest(self, data: &[u8]) -> Vec<u8> {
        use sha2::{Digest, Sha256, Sha384, Sha512};
        match self {
            DigestAlgorithm::Sha256 => Sha256::digest(data).to_vec(),
            DigestAlgorithm::Sha384 => Sha384::digest(data).to_vec(),
            DigestAlgorithm::Sha512 => Sha512::digest(data).to_vec(),
        }
    }
}
