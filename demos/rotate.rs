//! Rotates every page of an input PDF by 90 degrees clockwise and writes
//! the result next to it.
//!
//! ```sh
//! cargo run --example rotate -- input.pdf output.pdf [degrees]
//! ```

use docforge::mutator::Rotator;
use docforge::{write, Document, WriteOptions};

fn main() -> docforge::Result<()> {
    env_logger::init();
    let mut args = std::env::args().skip(1);
    let input = args.next().unwrap_or_else(|| "input.pdf".to_string());
    let output = args.next().unwrap_or_else(|| "rotated.pdf".to_string());
    let degrees: i32 = args.next().and_then(|s| s.parse().ok()).unwrap_or(90);

    let source = Document::load(&input)?;
    let rotated = Rotator::rotate(&source, &[], degrees)?;
    let bytes = write(&rotated, WriteOptions::default())?;
    std::fs::write(&output, bytes)?;

    log::info!("wrote {output} ({degrees} degrees)");
    Ok(())
}
