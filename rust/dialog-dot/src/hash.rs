use std::fmt::{Debug, Display};

use base64::{Engine, engine::general_purpose::URL_SAFE};

/// The size of a content hash in bytes.
pub const CONTENT_HASH_LENGTH: usize = 32;

/// A BLAKE3 digest identifying a certificate or a chain by its content.
///
/// Rendered as URL-safe base64, the same way identities are.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct ContentHash([u8; CONTENT_HASH_LENGTH]);

impl ContentHash {
    /// Hash a sequence of byte chunks as if they were one contiguous buffer.
    pub fn hash_iter<'a, I>(chunks: I) -> Self
    where
        I: IntoIterator<Item = &'a [u8]>,
    {
        let mut hasher = blake3::Hasher::new();
        for chunk in chunks {
            hasher.update(chunk);
        }
        Self(hasher.finalize().into())
    }

    /// The raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; CONTENT_HASH_LENGTH] {
        &self.0
    }
}

impl Display for ContentHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", URL_SAFE.encode(self.0))
    }
}

impl Debug for ContentHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ContentHash").field(&self.to_string()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_hashes_chunks_like_a_single_buffer() {
        let split = ContentHash::hash_iter([b"hello ".as_slice(), b"world".as_slice()]);
        let whole = ContentHash::hash_iter([b"hello world".as_slice()]);
        assert_eq!(split, whole);
    }

    #[test]
    fn it_renders_as_url_safe_base64() {
        let hash = ContentHash::hash_iter([b"dot".as_slice()]);
        let text = hash.to_string();
        assert_eq!(text.len(), 44);
        assert!(!text.contains('/'));
        assert!(!text.contains('+'));
    }
}
