//! A cashu wallet library: a blind-signature client over a pluggable HTTP client and local
//! proof store.

pub mod client;
pub mod error;
pub mod localstore;
pub mod secret;
pub mod wallet;
