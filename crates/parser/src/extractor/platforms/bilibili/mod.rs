mod builder;
mod fingerprint;
pub(crate) mod models;
mod wbi;

pub use builder::{BVID_REGEX, Bilibili};
pub use fingerprint::FingerprintCache;
pub use wbi::{WbiSigner, signed_query};
