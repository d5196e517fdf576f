//! Audio track extraction from a resolved media URL.
//!
//! Downloads the media to a scratch directory and transcodes it with the
//! system `ffmpeg` into a mono 16 kHz mp3 suitable for speech pipelines.

use reqwest::Client;
use reqwest::header::{HeaderMap, HeaderValue, REFERER, USER_AGENT};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info};

use crate::error::ExtractorError;
use crate::extractor::default::DEFAULT_UA;
use crate::media::Platform;

const AUDIO_BITRATE: &str = "64k";
const AUDIO_BITRATE_BPS: u64 = 64_000;
const AUDIO_SAMPLE_RATE: &str = "16000";

/// Transcoded audio plus a duration estimate derived from the fixed
/// output bitrate.
pub struct AudioTrack {
    pub data: Vec<u8>,
    pub estimated_duration: f64,
}

/// Downloads `media_url` and returns its audio track as mp3 bytes.
///
/// The request carries the platform's referer since the CDNs reject
/// bare fetches. Requires `ffmpeg` on PATH.
pub async fn extract_audio_track(
    client: &Client,
    platform: Platform,
    media_url: &str,
) -> Result<AudioTrack, ExtractorError> {
    let dir = tempfile::tempdir()?;
    let video_path = dir.path().join("media.bin");
    let audio_path = dir.path().join("audio.mp3");

    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(DEFAULT_UA));
    headers.insert(REFERER, HeaderValue::from_static(platform.referer()));

    debug!(%media_url, "downloading media for audio extraction");
    let mut response = client
        .get(media_url)
        .headers(headers)
        .send()
        .await?
        .error_for_status()?;

    let mut file = tokio::fs::File::create(&video_path).await?;
    let mut downloaded: u64 = 0;
    while let Some(chunk) = response.chunk().await? {
        downloaded += chunk.len() as u64;
        file.write_all(&chunk).await?;
    }
    file.flush().await?;
    drop(file);
    debug!(bytes = downloaded, "media download complete");

    let output = Command::new("ffmpeg")
        .args([
            "-i",
            &video_path.to_string_lossy(),
            "-vn",
            "-acodec",
            "libmp3lame",
            "-ab",
            AUDIO_BITRATE,
            "-ar",
            AUDIO_SAMPLE_RATE,
            "-ac",
            "1",
            "-y",
            &audio_path.to_string_lossy(),
        ])
        .output()
        .await?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ExtractorError::Other(format!(
            "ffmpeg exited with {}: {}",
            output.status,
            stderr.trim()
        )));
    }

    let data = tokio::fs::read(&audio_path).await?;
    let estimated_duration = (data.len() as u64 * 8) as f64 / AUDIO_BITRATE_BPS as f64;
    info!(
        bytes = data.len(),
        estimated_duration, "audio track extracted"
    );

    Ok(AudioTrack {
        data,
        estimated_duration,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_estimate_follows_output_bitrate() {
        // 64 kbit/s means 8000 bytes per second of audio.
        let data = vec![0u8; 80_000];
        let estimated = (data.len() as u64 * 8) as f64 / AUDIO_BITRATE_BPS as f64;
        assert!((estimated - 10.0).abs() < f64::EPSILON);
    }
}
