//! Authentication for the chat gateway HTTP surface.
//!
//! Callers authenticate with `Authorization: Bearer <jwt>`. Tokens are
//! HMAC-SHA256 signed, carry the user id in `sub`, and expire after seven
//! days. The [`AuthUser`] extractor rejects missing or invalid tokens with a
//! 401 before any handler runs.

mod extract;
mod jwt;

pub use extract::{AuthError, AuthUser};
pub use jwt::{Claims, JwtKeys, JwtKeysError};
