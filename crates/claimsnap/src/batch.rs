//! ✂️ Batch decoding: one blob of text in, an ordered list of records out.
//!
//! The payload is newline-delimited. Every record is one line. The writer of the
//! payload ends the last line with a `\n` too, which leaves a ghost record at the
//! end when you split. We drop that ghost and ONLY that ghost.
//!
//! ⚠️ This is not "trim empty lines". An empty line in the middle of a batch is
//! a record. It will fail parsing downstream and be counted as failed. That is
//! the contract. Don't fix it here.

use memchr::memchr_iter;

/// ✂️ Split a payload into its records, in payload order.
///
/// Drops the final element only when it is empty (the trailing-terminator artifact).
/// An empty payload yields no records. Never fails.
pub fn decode_batch(payload: &str) -> Vec<&str> {
    let mut records = Vec::new();
    let mut start = 0usize;

    // 🔍 memchr walks the bytes for '\n'. '\n' is ASCII so every index it hands
    // back is a valid char boundary. No UTF-8 surgery required.
    for newline_at in memchr_iter(b'\n', payload.as_bytes()) {
        records.push(&payload[start..newline_at]);
        start = newline_at + 1;
    }

    let the_tail = &payload[start..];
    if !the_tail.is_empty() {
        records.push(the_tail);
    }

    records
}
