//! # farmhub-auth
//!
//! The "verify token → identity" capability consumed by the real-time
//! engine. Token minting belongs to the account system; this crate only
//! validates inbound bearer tokens and exposes the decoded claims as an
//! explicit structure, checked once at the boundary.

pub mod jwt;

pub use jwt::{Claims, JwtDecoder, JwtEncoder};
