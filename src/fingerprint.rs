//! Stable, collision-resistant digests used to derive synthetic node names
//! and to gate Ninja regeneration.

use md5::{Digest, Md5};

/// MD5 over `input`'s UTF-8 bytes, rendered as 32 lowercase hex characters.
///
/// The algorithm is fixed (not configurable) so regenerating from the same
/// input always yields a bit-identical plan file.
pub fn hash(input: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(input.as_bytes());
    let digest = hasher.finalize();

    let mut out = String::with_capacity(32);
    for byte in digest {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}
