//! Short token generation
//!
//! Tokens are `n` random bytes rendered as unpadded URL-safe base64, so a
//! 3-byte token is 4 characters and a 16-byte token is 22.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;

use crate::errors::{DecaylinkError, Result};

/// Source of the random bytes behind a token.
///
/// Implementations must be cryptographically strong: a guessable token hands
/// out someone else's link.
pub trait TokenSource: Send + Sync {
    fn fill(&self, buf: &mut [u8]) -> Result<()>;
}

/// Thread-local CSPRNG from `rand`, reseeded from the OS.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRngSource;

impl TokenSource for ThreadRngSource {
    fn fill(&self, buf: &mut [u8]) -> Result<()> {
        rand::fill(buf);
        Ok(())
    }
}

/// Draw `byte_len` bytes from `source` and encode them.
pub fn generate_token(source: &dyn TokenSource, byte_len: usize) -> Result<String> {
    if byte_len == 0 {
        return Err(DecaylinkError::generation(
            "token length must be at least one byte",
        ));
    }

    let mut buf = vec![0u8; byte_len];
    source.fill(&mut buf)?;
    Ok(URL_SAFE_NO_PAD.encode(&buf))
}

/// Length in characters of a token drawn from `byte_len` bytes.
pub fn encoded_len(byte_len: usize) -> usize {
    (byte_len * 4).div_ceil(3)
}
