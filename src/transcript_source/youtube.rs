//! YouTube transcript source backed by yt-dlp caption downloads.

use super::{TranscriptSegment, TranscriptSource};
use crate::error::{BlogError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info, instrument};

/// Fetches YouTube captions (manual or auto-generated) with yt-dlp.
pub struct YoutubeTranscriptSource {
    yt_dlp: String,
    languages: Vec<String>,
}

impl YoutubeTranscriptSource {
    pub fn new() -> Self {
        Self::with_config("yt-dlp", &["en".to_string()])
    }

    /// Create a source with a custom yt-dlp binary and caption language preference.
    pub fn with_config(yt_dlp: &str, languages: &[String]) -> Self {
        Self {
            yt_dlp: yt_dlp.to_string(),
            languages: languages.to_vec(),
        }
    }

    /// Build the `--sub-langs` value, matching regional variants too (en -> en.*).
    fn sub_langs(&self) -> String {
        if self.languages.is_empty() {
            return "en.*".to_string();
        }
        self.languages
            .iter()
            .map(|l| format!("{}.*", l))
            .collect::<Vec<_>>()
            .join(",")
    }

    /// The yt-dlp invocation that writes `<id>.<lang>.json3` files into `dir`.
    fn caption_command(&self, video_id: &str, dir: &Path) -> Command {
        let url = format!("https://www.youtube.com/watch?v={}", video_id);
        let template = dir.join(format!("{}.%(ext)s", video_id));

        let mut command = Command::new(&self.yt_dlp);
        command
            .arg("--skip-download")
            .arg("--write-subs")
            .arg("--write-auto-subs")
            .arg("--sub-langs")
            .arg(self.sub_langs())
            .arg("--sub-format")
            .arg("json3")
            .arg("--output")
            .arg(&template)
            .arg("--no-playlist")
            .arg("--quiet")
            .arg("--no-warnings")
            .arg(&url)
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        command
    }

    /// Download captions for `video_id` into `dir`.
    async fn download_captions(&self, video_id: &str, dir: &Path) -> Result<()> {
        let result = self.caption_command(video_id, dir).output().await;

        let output = match result {
            Ok(o) => o,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(BlogError::ToolNotFound(self.yt_dlp.clone()));
            }
            Err(e) => {
                return Err(BlogError::TranscriptUnavailable(format!(
                    "yt-dlp execution failed: {e}"
                )));
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(classify_failure(video_id, &stderr));
        }

        Ok(())
    }
}

impl Default for YoutubeTranscriptSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TranscriptSource for YoutubeTranscriptSource {
    #[instrument(skip(self), fields(video_id = %video_id))]
    async fn fetch(&self, video_id: &str) -> Result<Vec<TranscriptSegment>> {
        let dir = tempfile::tempdir()?;

        info!("Fetching captions for {}", video_id);
        self.download_captions(video_id, dir.path()).await?;

        let caption_file = find_caption_file(dir.path(), video_id, &self.languages)?.ok_or_else(|| {
            BlogError::TranscriptUnavailable(format!("No captions available for {}", video_id))
        })?;

        let content = std::fs::read_to_string(&caption_file)?;
        let segments = parse_json3(&content)?;
        debug!("Parsed {} caption segments", segments.len());

        if segments.is_empty() {
            return Err(BlogError::TranscriptUnavailable(format!(
                "Captions for {} are empty",
                video_id
            )));
        }

        Ok(segments)
    }
}

/// Map yt-dlp stderr to a not-found or unavailable error.
fn classify_failure(video_id: &str, stderr: &str) -> BlogError {
    let lower = stderr.to_lowercase();
    let missing = ["video unavailable", "private video", "does not exist", "not found", "http error 404"];

    if missing.iter().any(|m| lower.contains(m)) {
        BlogError::TranscriptNotFound(format!("{}: {}", video_id, stderr.trim()))
    } else {
        BlogError::TranscriptUnavailable(format!("yt-dlp failed: {}", stderr.trim()))
    }
}

/// Locate the json3 caption file yt-dlp wrote (`<id>.<lang>.json3`).
///
/// Languages are tried in preference order, the exact code before regional
/// variants (`en` before `en-US`). Falls back to the first file by name.
fn find_caption_file(dir: &Path, video_id: &str, languages: &[String]) -> Result<Option<PathBuf>> {
    let prefix = format!("{}.", video_id);
    let mut candidates: Vec<(String, PathBuf)> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter_map(|path| {
            let name = path.file_name()?.to_str()?;
            let lang = name.strip_prefix(&prefix)?.strip_suffix(".json3")?.to_string();
            Some((lang, path))
        })
        .collect();
    candidates.sort();

    for language in languages {
        let regional = format!("{}-", language);
        let preferred = candidates
            .iter()
            .position(|(lang, _)| lang == language)
            .or_else(|| candidates.iter().position(|(lang, _)| lang.starts_with(&regional)));
        if let Some(index) = preferred {
            return Ok(Some(candidates.swap_remove(index).1));
        }
    }

    Ok(candidates.into_iter().next().map(|(_, path)| path))
}

#[derive(Debug, Deserialize)]
struct Json3Captions {
    #[serde(default)]
    events: Vec<Json3Event>,
}

#[derive(Debug, Deserialize)]
struct Json3Event {
    #[serde(rename = "tStartMs", default)]
    start_ms: u64,
    #[serde(default)]
    segs: Option<Vec<Json3Seg>>,
}

#[derive(Debug, Deserialize)]
struct Json3Seg {
    #[serde(default)]
    utf8: String,
}

/// Parse YouTube's json3 caption format into ordered segments.
fn parse_json3(content: &str) -> Result<Vec<TranscriptSegment>> {
    let captions: Json3Captions = serde_json::from_str(content)?;

    let segments = captions
        .events
        .into_iter()
        .filter_map(|event| {
            let text: String = event.segs?.into_iter().map(|s| s.utf8).collect();
            let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
            (!text.is_empty()).then(|| TranscriptSegment::new(text, event.start_ms as f64 / 1000.0))
        })
        .collect();

    Ok(segments)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_json3() {
        let content = r#"{
            "wireMagic": "pb3",
            "events": [
                {"tStartMs": 0, "dDurationMs": 5000, "id": 1},
                {"tStartMs": 120, "dDurationMs": 2000, "segs": [{"utf8": "Hello"}, {"utf8": " there"}]},
                {"tStartMs": 2100, "segs": [{"utf8": "\n"}]},
                {"tStartMs": 2500, "segs": [{"utf8": "general\nkenobi"}]}
            ]
        }"#;

        let segments = parse_json3(content).unwrap();
        assert_eq!(
            segments,
            vec![
                TranscriptSegment::new("Hello there", 0.12),
                TranscriptSegment::new("general kenobi", 2.5),
            ]
        );
    }

    #[test]
    fn test_parse_json3_rejects_garbage() {
        assert!(matches!(parse_json3("not json"), Err(BlogError::Json(_))));
    }

    #[test]
    fn test_classify_failure() {
        assert!(matches!(
            classify_failure("abc", "ERROR: [youtube] abc: Video unavailable"),
            BlogError::TranscriptNotFound(_)
        ));
        assert!(matches!(
            classify_failure("abc", "ERROR: Unable to download webpage: timed out"),
            BlogError::TranscriptUnavailable(_)
        ));
    }

    #[test]
    fn test_sub_langs() {
        let source = YoutubeTranscriptSource::with_config("yt-dlp", &["en".into(), "de".into()]);
        assert_eq!(source.sub_langs(), "en.*,de.*");
        assert_eq!(YoutubeTranscriptSource::with_config("yt-dlp", &[]).sub_langs(), "en.*");
    }

    #[test]
    fn test_find_caption_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("abc.en.json3"), "{}").unwrap();
        std::fs::write(dir.path().join("other.en.json3"), "{}").unwrap();

        let languages = vec!["en".to_string()];
        let found = find_caption_file(dir.path(), "abc", &languages).unwrap().unwrap();
        assert!(found.ends_with("abc.en.json3"));
        assert!(find_caption_file(dir.path(), "zzz", &languages).unwrap().is_none());
    }

    #[test]
    fn test_find_caption_file_follows_language_order() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("abc.de.json3"), "{}").unwrap();
        std::fs::write(dir.path().join("abc.en.json3"), "{}").unwrap();

        let languages = vec!["en".to_string(), "de".to_string()];
        let found = find_caption_file(dir.path(), "abc", &languages).unwrap().unwrap();
        assert!(found.ends_with("abc.en.json3"));

        let languages = vec!["de".to_string(), "en".to_string()];
        let found = find_caption_file(dir.path(), "abc", &languages).unwrap().unwrap();
        assert!(found.ends_with("abc.de.json3"));
    }

    #[test]
    fn test_find_caption_file_regional_and_fallback() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("abc.en-US.json3"), "{}").unwrap();
        std::fs::write(dir.path().join("abc.fr.json3"), "{}").unwrap();

        let found = find_caption_file(dir.path(), "abc", &["en".to_string()]).unwrap().unwrap();
        assert!(found.ends_with("abc.en-US.json3"));

        let found = find_caption_file(dir.path(), "abc", &["ja".to_string()]).unwrap().unwrap();
        assert!(found.ends_with("abc.en-US.json3"));
    }

    #[cfg(unix)]
    #[test]
    fn test_output_template_keeps_non_utf8_dir() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = Path::new(OsStr::from_bytes(b"/tmp/captions-\xff"));
        let source = YoutubeTranscriptSource::new();
        let command = source.caption_command("abc123", dir);

        let args: Vec<&OsStr> = command.as_std().get_args().collect();
        let position = args.iter().position(|a| *a == "--output").unwrap();
        assert_eq!(args[position + 1], dir.join("abc123.%(ext)s").as_os_str());
    }

    #[tokio::test]
    async fn test_missing_tool_is_reported() {
        let source = YoutubeTranscriptSource::with_config("ytblog-no-such-binary", &[]);
        let result = source.fetch("abc123").await;
        assert!(matches!(result, Err(BlogError::ToolNotFound(_))));
    }
}
