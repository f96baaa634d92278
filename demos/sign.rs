//! Applies a detached PKCS#1 v1.5 / CMS signature to a PDF's AcroForm, then
//! verifies the result, generating a throwaway RSA key pair on the fly.
//!
//! ```sh
//! cargo run --example sign --features signing -- input.pdf signed.pdf
//! ```

use docforge::signing::{Certificate, SignOptions, Signer};
use rand_core::OsRng;
use rsa::RsaPrivateKey;

fn main() -> docforge::Result<()> {
    env_logger::init();
    let mut args = std::env::args().skip(1);
    let input = args.next().unwrap_or_else(|| "input.pdf".to_string());
    let output = args.next().unwrap_or_else(|| "signed.pdf".to_string());

    let bytes = std::fs::read(&input)?;

    let private_key = RsaPrivateKey::new(&mut OsRng, 2048).expect("key generation");
    let certificate = Certificate { subject_common_name: "docforge demo signer".to_string(), serial: 1 };
    let options = SignOptions::default();

    let signed = Signer::sign(&bytes, &certificate, &private_key, &options)?;
    std::fs::write(&output, &signed)?;
    log::info!("wrote {output}");

    let report = Signer::verify(&signed)?;
    println!("signature valid: {}", report.valid);
    println!("signer: {:?}", report.signer_common_name);
    println!("byte range: {:?}", report.byte_range);

    Ok(())
}
