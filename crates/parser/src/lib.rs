//! Resolves share links from douyin, bilibili and xiaohongshu into
//! normalized media descriptors with direct stream URLs.

pub mod audio;
pub mod error;
pub mod extractor;
pub mod http;
pub mod js_engine;
pub mod media;
pub mod service;
pub mod session;

pub use audio::{AudioTrack, extract_audio_track};
pub use error::ExtractorError;
pub use media::{
    AudioStream, Author, MediaDescriptor, Platform, StatCounter, StreamVariant, Timestamp,
};
pub use service::ShareParser;
pub use session::{CookieStatus, SessionState};
