pub mod time_parser;
pub mod url_validator;

pub use time_parser::parse_duration;
pub use url_validator::{UrlValidationError, validate_url};

/// Longest token the resolve path accepts.
pub const MAX_TOKEN_LEN: usize = 128;

/// Tokens only ever contain the URL-safe base64 alphabet; anything else can
/// be answered without touching the store.
#[inline]
pub fn is_valid_token(token: &str) -> bool {
    !token.is_empty()
        && token.len() <= MAX_TOKEN_LEN
        && token
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}
