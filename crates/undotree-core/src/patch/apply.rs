use crate::error::{Result, SyncError};
use undotree_http::{Patch, Segment};

/// Apply `patch` to `base`.
///
/// Every segment is checked against its source offset, deleted text must
/// match `base` exactly, and the segments must cover all of `base`. Any
/// violation yields [`SyncError::PatchMismatch`] and leaves `base` untouched.
pub fn apply(patch: &Patch, base: &str) -> Result<String> {
    if patch.segments().is_empty() {
        return Ok(base.to_string());
    }

    let chars: Vec<char> = base.chars().collect();
    let mut out = String::with_capacity(base.len());
    let mut cursor: usize = 0;
    let mut produced: usize = 0;

    for segment in patch.ordered() {
        if segment.old_start() != cursor || segment.new_start() != produced {
            return Err(SyncError::PatchMismatch(format!(
                "segment at ({}, {}) does not continue from ({}, {})",
                segment.old_start(),
                segment.new_start(),
                cursor,
                produced
            )));
        }

        match segment {
            Segment::Equal { len, .. } => {
                let end = span_end(cursor, *len, chars.len())?;
                out.extend(&chars[cursor..end]);
                cursor = end;
            }
            Segment::Delete { text, .. } => {
                let end = span_end(cursor, text.chars().count(), chars.len())?;
                if !chars[cursor..end].iter().copied().eq(text.chars()) {
                    return Err(SyncError::PatchMismatch(format!(
                        "deleted text {:?} not found at offset {}",
                        text, cursor
                    )));
                }
                cursor = end;
            }
            Segment::Insert { text, .. } => {
                out.push_str(text);
            }
        }
        produced = produced.checked_add(segment.new_len()).ok_or_else(|| {
            SyncError::PatchMismatch(format!("target offset overflows after {}", produced))
        })?;
    }

    if cursor != chars.len() {
        return Err(SyncError::PatchMismatch(format!(
            "patch covers {} of {} characters",
            cursor,
            chars.len()
        )));
    }

    Ok(out)
}

/// End of a `len`-char span starting at `cursor`, if it fits in `available`.
fn span_end(cursor: usize, len: usize, available: usize) -> Result<usize> {
    match cursor.checked_add(len) {
        Some(end) if end <= available => Ok(end),
        _ => Err(SyncError::PatchMismatch(format!(
            "span of {} chars at {} runs past end of base ({} chars)",
            len, cursor, available
        ))),
    }
}
