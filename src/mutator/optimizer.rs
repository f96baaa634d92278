//! Textual-scan optimizer: recompresses Flate streams, drops objects
//! unreachable from `/Root` or `/Info`, and deduplicates identical
//! streams — all via regex extraction of `<n> <g> obj … endobj` blocks,
//! deliberately short of a full parse so unrecognized constructs pass
//! through untouched.
//!
//! L2/L3's textual reference rewrite inspects raw bytes, so it can
//! mistake a `<n> <g> R`-shaped byte sequence inside a *compressed*
//! stream's payload for a real reference. Safe only once every stream in
//! scope is decoded; this implementation only ever recompresses/dedupes
//! streams it has itself just decoded, never ones left compressed.

use std::collections::{HashMap, HashSet};
use std::io::{Read, Write};

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use regex::bytes::Regex;
use sha2::{Digest, Sha256};

use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum OptimizerLevel {
    L1,
    L2,
    L3,
}

#[derive(Debug, Clone, Default)]
pub struct OptimizerStats {
    pub original_size: usize,
    pub final_size: usize,
    pub ratio: f64,
    pub objects_removed: usize,
    pub duplicates_removed: usize,
}

struct ObjectBlock {
    id: u32,
    gen: u16,
    body: Vec<u8>,
}

pub struct Optimizer;

impl Optimizer {
    /// Runs `level`'s passes over an already-serialized PDF byte buffer and
    /// returns the rewritten bytes alongside size/removal statistics.
    pub fn optimize(bytes: &[u8], level: OptimizerLevel) -> Result<(Vec<u8>, OptimizerStats)> {
        let original_size = bytes.len();
        let object_re = Regex::new(r"(?s)(\d+)[ \t]+(\d+)[ \t]+obj(.*?)endobj").expect("static regex");

        let mut blocks: Vec<ObjectBlock> = object_re
            .captures_iter(bytes)
            .filter_map(|c| {
                let id = std::str::from_utf8(c.get(1)?.as_bytes()).ok()?.parse().ok()?;
                let gen = std::str::from_utf8(c.get(2)?.as_bytes()).ok()?.parse().unwrap_or(0);
                let body = c.get(3)?.as_bytes().to_vec();
                Some(ObjectBlock { id, gen, body })
            })
            .collect();

        if level >= OptimizerLevel::L1 {
            for block in &mut blocks {
                recompress_flate(&mut block.body);
            }
        }

        let mut objects_removed = 0;
        let mut duplicates_removed = 0;

        if level >= OptimizerLevel::L2 {
            let root = find_indirect_ref(bytes, b"Root");
            let info = find_indirect_ref(bytes, b"Info");
            let reachable = reachable_ids(&blocks, root, info);
            let before = blocks.len();
            blocks.retain(|b| reachable.contains(&b.id));
            objects_removed = before - blocks.len();
        }

        if level >= OptimizerLevel::L3 {
            duplicates_removed = dedupe(&mut blocks);
        }

        let root_id = find_indirect_ref(bytes, b"Root");
        let output = render(&blocks, root_id);
        let final_size = output.len();
        let ratio = if original_size == 0 { 1.0 } else { final_size as f64 / original_size as f64 };

        Ok((output, OptimizerStats { original_size, final_size, ratio, objects_removed, duplicates_removed }))
    }
}

fn find_indirect_ref(bytes: &[u8], key: &[u8]) -> Option<u32> {
    let pattern = format!(r"/{}[ \t\r\n]+(\d+)[ \t\r\n]+\d+[ \t\r\n]+R", regex::escape(std::str::from_utf8(key).ok()?));
    let re = Regex::new(&pattern).ok()?;
    let caps = re.captures(bytes)?;
    std::str::from_utf8(caps.get(1)?.as_bytes()).ok()?.parse().ok()
}

fn reachable_ids(blocks: &[ObjectBlock], root: Option<u32>, info: Option<u32>) -> HashSet<u32> {
    let ref_re = Regex::new(r"(\d+)[ \t\r\n]+\d+[ \t\r\n]+R").expect("static regex");
    let by_id: HashMap<u32, &ObjectBlock> = blocks.iter().map(|b| (b.id, b)).collect();

    let mut seen = HashSet::new();
    let mut stack: Vec<u32> = root.into_iter().chain(info).collect();
    while let Some(id) = stack.pop() {
        if !seen.insert(id) {
            continue;
        }
        let Some(block) = by_id.get(&id) else { continue };
        for caps in ref_re.captures_iter(&block.body) {
            if let Some(referenced) = caps.get(1).and_then(|m| std::str::from_utf8(m.as_bytes()).ok()).and_then(|s| s.parse().ok()) {
                if !seen.contains(&referenced) {
                    stack.push(referenced);
                }
            }
        }
    }
    seen
}

/// Recompresses a single FlateDecode stream at maximum compression,
/// replacing its bytes and `/Length` entry if the result is shorter.
fn recompress_flate(body: &mut Vec<u8>) {
    if !body.windows(12).any(|w| w == b"/FlateDecode") {
        return;
    }
    let stream_re = Regex::new(r"(?s)stream\r?\n(.*?)endstream").expect("static regex");
    let Some(caps) = stream_re.captures(body) else { return };
    let Some(raw) = caps.get(1) else { return };
    let original = raw.as_bytes();

    let mut decoded = Vec::new();
    if ZlibDecoder::new(original).read_to_end(&mut decoded).is_err() || decoded.is_empty() {
        return;
    }

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::best());
    if encoder.write_all(&decoded).is_err() {
        return;
    }
    let Ok(recompressed) = encoder.finish() else { return };
    if recompressed.len() >= original.len() {
        return;
    }

    let length_re = Regex::new(r"/Length[ \t\r\n]+\d+").expect("static regex");
    let new_length = format!("/Length {}", recompressed.len());
    let with_length = length_re.replace(body, new_length.as_bytes()).into_owned();

    let stream_start = caps.get(1).unwrap().start();
    let stream_end = caps.get(1).unwrap().end();
    let offset_shift = with_length.len() as isize - body.len() as isize;
    let adj_start = (stream_start as isize + offset_shift) as usize;
    let adj_end = (stream_end as isize + offset_shift) as usize;

    let mut out = Vec::with_capacity(with_length.len());
    out.extend_from_slice(&with_length[..adj_start]);
    out.extend_from_slice(&recompressed);
    out.extend_from_slice(&with_length[adj_end..]);
    *body = out;
}

/// Collapses objects with byte-identical bodies to one representative,
/// rewriting every textual reference to the duplicates accordingly.
fn dedupe(blocks: &mut Vec<ObjectBlock>) -> usize {
    let mut canonical: HashMap<[u8; 32], u32> = HashMap::new();
    let mut redirect: HashMap<u32, u32> = HashMap::new();

    for block in blocks.iter() {
        let digest: [u8; 32] = Sha256::digest(&block.body).into();
        canonical.entry(digest).or_insert(block.id);
    }
    for block in blocks.iter() {
        let digest: [u8; 32] = Sha256::digest(&block.body).into();
        let rep = canonical[&digest];
        if rep != block.id {
            redirect.insert(block.id, rep);
        }
    }

    if redirect.is_empty() {
        return 0;
    }

    let ref_re = Regex::new(r"(\d+)([ \t\r\n]+)(\d+)([ \t\r\n]+R)").expect("static regex");
    for block in blocks.iter_mut() {
        let rewritten = ref_re.replace_all(&block.body, |caps: &regex::bytes::Captures| {
            let id: u32 = std::str::from_utf8(&caps[1]).unwrap_or("0").parse().unwrap_or(0);
            let gen_sep = &caps[2];
            let gen = &caps[3];
            let tail = &caps[4];
            let target = redirect.get(&id).copied().unwrap_or(id);
            let mut out = target.to_string().into_bytes();
            out.extend_from_slice(gen_sep);
            out.extend_from_slice(gen);
            out.extend_from_slice(tail);
            out
        });
        block.body = rewritten.into_owned();
    }

    let removed = redirect.len();
    blocks.retain(|b| !redirect.contains_key(&b.id));
    removed
}

fn render(blocks: &[ObjectBlock], root_id: Option<u32>) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(b"%PDF-1.7\n");

    let mut offsets = Vec::with_capacity(blocks.len());
    let mut max_id = 0u32;
    for block in blocks {
        offsets.push((block.id, block.gen, out.len()));
        max_id = max_id.max(block.id);
        out.extend_from_slice(format!("{} {} obj", block.id, block.gen).as_bytes());
        out.extend_from_slice(&block.body);
        out.extend_from_slice(b"endobj\n");
    }

    let xref_offset = out.len();
    let size = max_id + 1;
    out.extend_from_slice(format!("xref\n0 {size}\n").as_bytes());
    let by_id: HashMap<u32, (u16, usize)> = offsets.iter().map(|&(id, gen, off)| (id, (gen, off))).collect();
    for num in 0..size {
        match by_id.get(&num) {
            Some(&(gen, off)) => out.extend_from_slice(format!("{off:010} {gen:05} n \n").as_bytes()),
            None if num == 0 => out.extend_from_slice(b"0000000000 65535 f \n"),
            None => out.extend_from_slice(b"0000000000 00000 f \n"),
        }
    }

    out.extend_from_slice(b"trailer\n");
    out.extend_from_slice(format!("<< /Size {size}").as_bytes());
    if let Some(root) = root_id {
        out.extend_from_slice(format!(" /Root {root} 0 R").as_bytes());
    }
    out.extend_from_slice(b" >>\n");
    out.extend_from_slice(format!("startxref\n{xref_offset}\n%%EOF\n").as_bytes());
    out
}
