// src/services/media_tools.rs
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::process::Command;
use uuid::Uuid;

/// Output profile per platform: portrait for the vertical feeds, landscape
/// for YouTube.
const PLATFORM_SPECS: &[(&str, &str, &str)] = &[
    ("tiktok", "1080:1920", "4000k"),
    ("instagram", "1080:1920", "4000k"),
    ("youtube", "1920:1080", "8000k"),
];

/// Concatenate segment files in order with the concat demuxer (no
/// re-encode). Returns the merged file path.
pub async fn merge_segments(
    input_files: &[PathBuf],
    processed_dir: &Path,
    project_id: Uuid,
) -> Result<PathBuf> {
    if input_files.is_empty() {
        anyhow::bail!("no segments to merge");
    }
    fs::create_dir_all(processed_dir)
        .await
        .context("Failed to create processed directory")?;

    let concat_list = processed_dir.join(format!("concat_{}.txt", project_id));
    let mut listing = String::new();
    for file in input_files {
        listing.push_str(&format!("file '{}'\n", file.display()));
    }
    fs::write(&concat_list, listing)
        .await
        .context("Failed to write concat list")?;

    let output_path = processed_dir.join(format!("merged_{}.mp4", project_id));

    let status = Command::new("ffmpeg")
        .arg("-y")
        .arg("-f")
        .arg("concat")
        .arg("-safe")
        .arg("0")
        .arg("-i")
        .arg(&concat_list)
        .arg("-c")
        .arg("copy")
        .arg(&output_path)
        .status()
        .await
        .context("Failed to spawn ffmpeg")?;

    fs::remove_file(&concat_list).await.ok();

    if !status.success() {
        anyhow::bail!("FFmpeg merge failed");
    }
    Ok(output_path)
}

/// Scale/pad and re-encode for the target platform's dimensions and bitrate.
pub async fn optimize_for_platform(
    input: &Path,
    processed_dir: &Path,
    project_id: Uuid,
    platform: &str,
    preset: &str,
) -> Result<PathBuf> {
    let platform_key = platform.to_lowercase();
    let (_, size, bitrate) = PLATFORM_SPECS
        .iter()
        .find(|(name, _, _)| *name == platform_key)
        .unwrap_or(&PLATFORM_SPECS[2]);

    fs::create_dir_all(processed_dir)
        .await
        .context("Failed to create processed directory")?;
    let output_path = processed_dir.join(format!("final_{}_{}.mp4", project_id, platform_key));

    let pad = size.replace(':', "x");
    let filter = format!(
        "scale={size}:force_original_aspect_ratio=decrease,pad={pad}:(ow-iw)/2:(oh-ih)/2",
        size = size,
        pad = pad
    );

    let status = Command::new("ffmpeg")
        .arg("-y")
        .arg("-i")
        .arg(input)
        .arg("-vf")
        .arg(&filter)
        .arg("-c:v")
        .arg("libx264")
        .arg("-b:v")
        .arg(bitrate)
        .arg("-c:a")
        .arg("aac")
        .arg("-b:a")
        .arg("128k")
        .arg("-preset")
        .arg(preset)
        .arg(&output_path)
        .status()
        .await
        .context("Failed to spawn ffmpeg")?;

    if !status.success() {
        anyhow::bail!("FFmpeg platform optimization failed");
    }
    Ok(output_path)
}

/// Duration in seconds via ffprobe.
pub async fn probe_duration(input: &Path) -> Result<f64> {
    let output = Command::new("ffprobe")
        .arg("-v")
        .arg("error")
        .arg("-show_entries")
        .arg("format=duration")
        .arg("-of")
        .arg("json")
        .arg(input)
        .output()
        .await
        .context("Failed to spawn ffprobe")?;

    if !output.status.success() {
        anyhow::bail!("ffprobe failed");
    }

    let parsed: serde_json::Value =
        serde_json::from_slice(&output.stdout).context("Invalid ffprobe output")?;
    parsed["format"]["duration"]
        .as_str()
        .and_then(|d| d.parse::<f64>().ok())
        .context("ffprobe output missing duration")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_platform_falls_back_to_landscape() {
        let platform_key = "vimeo";
        let (_, size, _) = PLATFORM_SPECS
            .iter()
            .find(|(name, _, _)| *name == platform_key)
            .unwrap_or(&PLATFORM_SPECS[2]);
        assert_eq!(*size, "1920:1080");
    }

    #[test]
    fn vertical_platforms_use_portrait_dimensions() {
        for key in ["tiktok", "instagram"] {
            let (_, size, _) = PLATFORM_SPECS
                .iter()
                .find(|(name, _, _)| *name == key)
                .unwrap();
            assert_eq!(*size, "1080:1920");
        }
    }
}
