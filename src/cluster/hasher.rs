use sha1::{Digest, Sha1};

/// Hashes `s` to a non-negative integer.
///
/// Takes the SHA-1 digest of the UTF-8 bytes and folds its first four bytes,
/// read as signed, into `b0 + b1*8 + b2*64 + b3*512`. The result is the
/// absolute value of that sum. The layout must not change: data already
/// placed on nodes was routed with it.
pub fn hash(s: &str) -> u32 {
    let digest = Sha1::digest(s.as_bytes());
    let byte = |i: usize| i32::from(digest[i] as i8);

    let folded = byte(0) + byte(1) * 8 + byte(2) * 64 + byte(3) * 512;
    folded.unsigned_abs()
}
