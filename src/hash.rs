//! Content hashing utilities shared by the fact gatherer and the cache
//! store: full content hash, the quick-hash used to skip re-probing
//! video files, and a perceptual (dHash) hash for image dedup.

use std::io::Read;
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::error::Result;

const QUICK_HASH_SAMPLE: u64 = 64 * 1024;

/// SHA-256 over the full byte stream. This is the cache's content address.
pub fn content_hash_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex(hasher.finalize().as_slice())
}

/// SHA-256 over a file's bytes, streamed in chunks rather than read whole.
pub fn content_hash_file(path: &Path) -> Result<String> {
    let mut file = std::fs::File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex(hasher.finalize().as_slice()))
}

/// Quick-hash: SHA-256 over (first 64 KiB ‖ last 64 KiB ‖ size), used to
/// cheaply recognize a previously-probed video file without reading it whole.
/// A quick-hash match is provisional: the gatherer re-verifies against a full
/// content hash before trusting a cache hit (see `ProbeCache`).
pub fn quick_hash_file(path: &Path) -> Result<String> {
    let metadata = std::fs::metadata(path)?;
    let size = metadata.len();

    let mut file = std::fs::File::open(path)?;
    let mut head = vec![0u8; QUICK_HASH_SAMPLE.min(size) as usize];
    file.read_exact(&mut head)?;

    let mut tail = Vec::new();
    if size > QUICK_HASH_SAMPLE {
        use std::io::{Seek, SeekFrom};
        let tail_len = QUICK_HASH_SAMPLE.min(size);
        file.seek(SeekFrom::End(-(tail_len as i64)))?;
        tail = vec![0u8; tail_len as usize];
        file.read_exact(&mut tail)?;
    }

    let mut hasher = Sha256::new();
    hasher.update(&head);
    hasher.update(&tail);
    hasher.update(size.to_le_bytes());
    Ok(hex(hasher.finalize().as_slice()))
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// 64-bit difference hash (dHash) computed from an already-decoded image,
/// resizing to 9x8 grayscale and comparing adjacent pixels row-wise.
pub fn perceptual_hash(img: &image::DynamicImage) -> u64 {
    let small = img.resize_exact(9, 8, image::imageops::FilterType::Triangle).to_luma8();
    let mut hash: u64 = 0;
    let mut bit = 0u32;
    for y in 0..8u32 {
        for x in 0..8u32 {
            let left = small.get_pixel(x, y).0[0];
            let right = small.get_pixel(x + 1, y).0[0];
            if left > right {
                hash |= 1 << bit;
            }
            bit += 1;
        }
    }
    hash
}

pub fn hamming_distance(a: u64, b: u64) -> u32 {
    (a ^ b).count_ones()
}

/// Two images are the same asset for dedup purposes when their perceptual
/// hashes differ by at most `threshold` bits.
pub fn is_perceptual_duplicate(a: u64, b: u64, threshold: u32) -> bool {
    hamming_distance(a, b) <= threshold
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_hash_is_deterministic() {
        assert_eq!(content_hash_bytes(b"hello"), content_hash_bytes(b"hello"));
        assert_ne!(content_hash_bytes(b"hello"), content_hash_bytes(b"world"));
    }

    #[test]
    fn identical_hash_has_zero_distance() {
        assert_eq!(hamming_distance(0xFF00, 0xFF00), 0);
        assert!(is_perceptual_duplicate(0xFF00, 0xFF00, 0));
    }

    #[test]
    fn quick_hash_round_trips_on_small_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f.bin");
        std::fs::write(&path, b"a small test file").unwrap();
        let h1 = quick_hash_file(&path).unwrap();
        let h2 = quick_hash_file(&path).unwrap();
        assert_eq!(h1, h2);
    }
}
