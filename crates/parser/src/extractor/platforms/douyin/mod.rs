mod bogus;
mod builder;
pub(crate) mod models;
mod quality;

pub use bogus::SignatureEngine;
pub use builder::{Douyin, URL_REGEX};
