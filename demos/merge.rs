//! Concatenates any number of input PDFs into a single output file, in the
//! order given on the command line.
//!
//! ```sh
//! cargo run --example merge -- output.pdf a.pdf b.pdf c.pdf
//! ```

use docforge::mutator::Merger;
use docforge::{write, Document, WriteOptions};

fn main() -> docforge::Result<()> {
    env_logger::init();
    let mut args = std::env::args().skip(1);
    let output = args.next().expect("usage: merge <output.pdf> <input.pdf>...");
    let inputs: Vec<String> = args.collect();
    if inputs.is_empty() {
        eprintln!("usage: merge <output.pdf> <input.pdf>...");
        std::process::exit(1);
    }

    let sources: Vec<Document> = inputs.iter().map(Document::load).collect::<docforge::Result<_>>()?;
    let refs: Vec<&Document> = sources.iter().collect();
    let merged = Merger::merge(&refs)?;

    let bytes = write(&merged, WriteOptions::default())?;
    std::fs::write(&output, bytes)?;

    log::info!("wrote {output} from {} source documents", inputs.len());
    Ok(())
}
