use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use share_parser::{Platform, ShareParser, extract_audio_track};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Share link or share text containing one
    input: String,

    /// Platform (douyin, bilibili, xiaohongshu); detected from the URL when omitted
    #[arg(short, long)]
    platform: Option<Platform>,

    /// Cookie header to use for the request
    #[clap(long)]
    cookie: Option<String>,

    /// Output the result in JSON format
    #[clap(long)]
    json: bool,

    /// Also extract the audio track (mp3) to the given path, requires ffmpeg
    #[clap(long)]
    audio: Option<PathBuf>,
}

fn spinner(message: &'static str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.enable_steady_tick(Duration::from_millis(120));
    pb.set_style(
        ProgressStyle::with_template("{spinner:.blue} {msg}")
            .unwrap()
            .tick_strings(&[
                "▹▹▹▹▹",
                "▸▹▹▹▹",
                "▹▸▹▹▹",
                "▹▹▸▹▹",
                "▹▹▹▸▹",
                "▹▹▹▹▸",
                "▪▪▪▪▪",
            ]),
    );
    pb.set_message(message);
    pb
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .init();

    let args = Args::parse();

    let platform = match args.platform {
        Some(p) => p,
        None => Platform::detect(&args.input)
            .context("Could not detect the platform, pass it with --platform")?,
    };

    let parser = ShareParser::new();

    let pb = spinner("Extracting media information...");
    let descriptor = parser
        .extract(platform, &args.input, args.cookie)
        .await
        .context("Failed to extract media information")?;
    pb.finish_with_message("Done");

    if args.json {
        println!("{}", serde_json::to_string_pretty(&descriptor)?);
    } else {
        println!("\n{}", "Media Information:".green().bold());
        println!("{} {}", "Platform:".green(), descriptor.platform.to_string().cyan());
        println!("{} {}", "Id:".green(), descriptor.id.cyan());
        println!("{} {}", "Title:".green(), descriptor.title.cyan());
        println!("{} {}", "Author:".green(), descriptor.author.name.cyan());
        if !descriptor.cover_url.is_empty() {
            println!("{} {}", "Cover URL:".green(), descriptor.cover_url.blue());
        }
        if !descriptor.created_at.formatted.is_empty() {
            println!(
                "{} {}",
                "Published:".green(),
                descriptor.created_at.formatted.cyan()
            );
        }
        if !descriptor.stats.is_empty() {
            println!("{}", "Stats:".green());
            for (name, counter) in &descriptor.stats {
                println!("  {}: {}", name.yellow(), counter.formatted.cyan());
            }
        }

        if !descriptor.video_streams.is_empty() {
            println!("\n{}", "Video Streams:".green().bold());
            for stream in &descriptor.video_streams {
                println!(
                    "  {} ({}, {}): {}",
                    stream.display_name.yellow(),
                    stream.short_label.cyan(),
                    stream.size.cyan(),
                    stream.url.blue()
                );
            }
        }
        if let Some(audio) = &descriptor.audio_stream {
            println!("\n{}", "Audio Stream:".green().bold());
            println!("  {}: {}", "Title".yellow(), audio.title.cyan());
            println!("  {}: {}", "URL".yellow(), audio.url.blue());
        }
        if !descriptor.images.is_empty() {
            println!("\n{}", "Images:".green().bold());
            for image in &descriptor.images {
                println!("  {}", image.blue());
            }
        }
    }

    if let Some(audio_path) = args.audio {
        let url = descriptor
            .audio_stream
            .as_ref()
            .map(|a| a.url.clone())
            .or_else(|| descriptor.video_streams.first().map(|s| s.url.clone()))
            .context("No stream available for audio extraction")?;

        let pb = spinner("Extracting audio track...");
        let client = share_parser::extractor::default::default_client();
        let track = extract_audio_track(&client, descriptor.platform, &url)
            .await
            .context("Failed to extract audio track")?;
        tokio::fs::write(&audio_path, &track.data)
            .await
            .with_context(|| format!("Failed to write {}", audio_path.display()))?;
        pb.finish_with_message("Done");

        println!(
            "\n{} {} ({:.1}s)",
            "Audio written to:".green(),
            audio_path.display().to_string().cyan(),
            track.estimated_duration
        );
    }

    Ok(())
}
