//! Locating and rewriting the `/ByteRange` and `/Contents` placeholders a
//! freshly appended Sig object reserves, entirely by scanning bytes —
//! mirroring the save-then-splice sequence of a sibling signing tool, but
//! anchored on the Sig object's own `<n> <g> obj` header instead of a
//! blind "last occurrence" search, since this crate knows the object id.

use crate::error::SignError;
use crate::object::ObjectId;
use crate::Result;

/// `SIGNATURE_SIZE` default reservation in bytes (65536 hex chars once
/// hex-encoded, i.e. `2 * SIGNATURE_SIZE` characters between `<` and `>`).
pub const DEFAULT_SIGNATURE_SIZE: usize = 32768;

/// A placeholder `/ByteRange` array wide enough that every element stays a
/// fixed 10 ASCII digits once serialized, so later in-place rewriting never
/// changes the file's total length. Mirrors the grounded technique of
/// reserving large placeholder integers rather than literal zero digits.
pub const BYTE_RANGE_PLACEHOLDER: i64 = 9_999_999_999;

/// Finds the `<` ... `>` span of the Sig object's `/Contents` hex string,
/// returning byte offsets `(a, b)` where `a` is just after `<` and `b` is
/// the position of `>`.
pub fn locate_contents(bytes: &[u8], sig_id: ObjectId) -> Result<(usize, usize)> {
    let header = format!("{} {} obj", sig_id.0, sig_id.1);
    let obj_start = find(bytes, header.as_bytes(), 0).ok_or(SignError::ByteRange("signature object not found".into()))?;

    let contents_marker = find(bytes, b"/Contents", obj_start).ok_or(SignError::ByteRange("/Contents not found".into()))?;
    let open = find(bytes, b"<", contents_marker).ok_or(SignError::ByteRange("Contents opening '<' not found".into()))?;
    let a = open + 1;
    let b = find(bytes, b">", a).ok_or(SignError::ByteRange("Contents closing '>' not found".into()))?;
    Ok((a, b))
}

/// Rewrites the fixed-width `/ByteRange [0 9999999999 9999999999
/// 9999999999]` placeholder in place with the real offsets, space-padding
/// on the right so the file's total length is unchanged.
pub fn splice_byte_range(bytes: &mut [u8], sig_id: ObjectId, range: [i64; 4]) -> Result<()> {
    let header = format!("{} {} obj", sig_id.0, sig_id.1);
    let obj_start = find(bytes, header.as_bytes(), 0).ok_or(SignError::ByteRange("signature object not found".into()))?;
    let marker = find(bytes, b"/ByteRange", obj_start).ok_or(SignError::ByteRange("/ByteRange not found".into()))?;
    let open = find(bytes, b"[", marker).ok_or(SignError::ByteRange("ByteRange opening '[' not found".into()))?;
    let close = find(bytes, b"]", open).ok_or(SignError::ByteRange("ByteRange closing ']' not found".into()))?;

    let rendered = format!("[{} {} {} {}]", range[0], range[1], range[2], range[3]);
    if rendered.len() > close + 1 - open {
        return Err(SignError::ByteRange("rendered ByteRange exceeds reserved placeholder width".into()).into());
    }

    let slot = &mut bytes[open..close + 1];
    slot[..rendered.len()].copy_from_slice(rendered.as_bytes());
    for b in &mut slot[rendered.len()..] {
        *b = b' ';
    }
    Ok(())
}

/// Splices a hex-encoded signature (right-padded with `'0'` to the
/// reserved width) between `a` and `b`.
pub fn splice_signature(bytes: &mut [u8], a: usize, b: usize, signature_hex: &str) -> Result<()> {
    let width = b - a;
    if signature_hex.len() > width {
        return Err(SignError::PlaceholderTooSmall { needed: signature_hex.len(), reserved: width }.into());
    }
    let slot = &mut bytes[a..b];
    slot[..signature_hex.len()].copy_from_slice(signature_hex.as_bytes());
    for byte in &mut slot[signature_hex.len()..] {
        *byte = b'0';
    }
    Ok(())
}

fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    haystack.get(from..)?.windows(needle.len()).position(|w| w == needle).map(|p| p + from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locates_contents_span() {
        let bytes = b"5 0 obj\n<< /Type /Sig /Contents <00000000> >>\nendobj\n".to_vec();
        let (a, b) = locate_contents(&bytes, (5, 0)).unwrap();
        assert_eq!(&bytes[a..b], b"00000000");
    }

    #[test]
    fn splices_byte_range_preserving_length() {
        let mut bytes = b"5 0 obj\n<< /ByteRange [0 9999999999 9999999999 9999999999] >>\nendobj\n".to_vec();
        let before_len = bytes.len();
        splice_byte_range(&mut bytes, (5, 0), [0, 12, 34, 56]).unwrap();
        assert_eq!(bytes.len(), before_len);
        assert!(bytes.windows(b"[0 12 34 56]".len()).any(|w| w == b"[0 12 34 56]"));
    }
}
