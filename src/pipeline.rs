//! One gallery build: search, duration lookup, filtering, rendering and the
//! final write, strictly in that order. Any failure before the write leaves
//! the previous output untouched.

use std::path::PathBuf;

use tracing::info;

use crate::config::GalleryConfig;
use crate::error::Result;
use crate::filter::{FilteredVideo, filter_candidates};
use crate::render::{render_page, write_page};
use crate::youtube::{Transport, YouTubeClient};

/// Summary of a finished build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildReport {
    pub candidates: usize,
    pub kept: usize,
    pub output: PathBuf,
}

/// A rendered document together with the list it was rendered from.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    pub html: String,
    pub videos: Vec<FilteredVideo>,
    /// Candidates returned by the search, before filtering.
    pub candidates: usize,
}

/// Everything up to the rendered document, without touching the filesystem.
pub fn build_page<T: Transport + ?Sized>(
    config: &GalleryConfig,
    transport: &T,
) -> Result<RenderedPage> {
    let client = YouTubeClient::from_config(transport, config);

    let candidates = client.fetch_candidates(&config.channel_id, config.search_results)?;
    let candidate_count = candidates.len();

    let videos = if candidates.is_empty() {
        Vec::new()
    } else {
        let ids: Vec<String> = candidates.iter().map(|c| c.video_id.clone()).collect();
        let durations = client.fetch_durations(&ids)?;
        filter_candidates(candidates, &durations, &config.filter)
    };

    info!(
        candidates = candidate_count,
        kept = videos.len(),
        max_count = config.filter.max_count,
        unknown_duration = ?config.filter.unknown_duration,
        "filtered uploads"
    );

    let html = render_page(&videos, &config.page_title);
    Ok(RenderedPage {
        html,
        videos,
        candidates: candidate_count,
    })
}

/// Runs a full build and writes the page to `config.output_path`.
pub fn run<T: Transport + ?Sized>(config: &GalleryConfig, transport: &T) -> Result<BuildReport> {
    let page = build_page(config, transport)?;
    write_page(&config.output_path, &page.html)?;
    Ok(BuildReport {
        candidates: page.candidates,
        kept: page.videos.len(),
        output: config.output_path.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EnvConfig;
    use crate::error::{Endpoint, Error, FetchError};
    use crate::filter::UnknownDurationPolicy;
    use crate::youtube::testing::ScriptedTransport;
    use std::fs;
    use tempfile::tempdir;

    fn config(output: PathBuf) -> GalleryConfig {
        let mut config = GalleryConfig::from_env_config(EnvConfig {
            api_key: Some("key".into()),
            api_base: Some("https://api.test/v3".into()),
            ..EnvConfig::default()
        })
        .unwrap();
        config.output_path = output;
        config
    }

    fn search_item(id: &str, title: &str) -> String {
        format!(
            r#"{{"id": {{"videoId": "{id}"}}, "snippet": {{"title": "{title}", "thumbnails": {{"high": {{"url": "https://img.test/{id}.jpg"}}}}}}}}"#
        )
    }

    fn search_body(items: &[String]) -> String {
        format!(r#"{{"items": [{}]}}"#, items.join(","))
    }

    fn videos_body(durations: &[(&str, &str)]) -> String {
        let items: Vec<String> = durations
            .iter()
            .map(|(id, duration)| {
                format!(r#"{{"id": "{id}", "contentDetails": {{"duration": "{duration}"}}}}"#)
            })
            .collect();
        format!(r#"{{"items": [{}]}}"#, items.join(","))
    }

    fn sample_transport() -> ScriptedTransport {
        let search = search_body(&[
            search_item("A", "Sunday service"),
            search_item("B", "One minute devotion"),
            search_item("C", "Metadata missing"),
            search_item("D", "#Shorts performance"),
        ]);
        let videos = videos_body(&[
            ("A", "PT1M1S"),
            ("B", "PT60S"),
            ("C", "bogus"),
            ("D", "PT30S"),
        ]);
        ScriptedTransport::new()
            .respond(200, &search)
            .respond(200, &videos)
    }

    #[test]
    fn run_filters_and_writes_page() -> anyhow::Result<()> {
        let temp = tempdir()?;
        let output = temp.path().join("public").join("index.html");
        let transport = sample_transport();

        let report = run(&config(output.clone()), &transport)?;
        assert_eq!(report.candidates, 4);
        assert_eq!(report.kept, 2);
        assert_eq!(report.output, output);

        let html = fs::read_to_string(&output)?;
        assert!(html.contains(r#"data-video-id="A""#));
        assert!(html.contains(r#"data-video-id="C""#));
        assert!(!html.contains(r#"data-video-id="B""#));
        assert!(!html.contains(r#"data-video-id="D""#));

        assert_eq!(transport.request_count(), 2);
        assert_eq!(transport.request(1).param("id"), Some("A,B,C,D"));
        Ok(())
    }

    #[test]
    fn strict_mode_drops_unknown_duration() -> anyhow::Result<()> {
        let temp = tempdir()?;
        let mut config = config(temp.path().join("index.html"));
        config.filter.unknown_duration = UnknownDurationPolicy::Strict;

        let page = build_page(&config, &sample_transport())?;
        let ids: Vec<&str> = page
            .videos
            .iter()
            .map(|v| v.video.video_id.as_str())
            .collect();
        assert_eq!(ids, ["A"]);
        Ok(())
    }

    #[test]
    fn no_candidates_skips_duration_lookup() -> anyhow::Result<()> {
        let temp = tempdir()?;
        let output = temp.path().join("index.html");
        let transport = ScriptedTransport::new().respond(200, r#"{"items": []}"#);

        let report = run(&config(output.clone()), &transport)?;
        assert_eq!(report.kept, 0);
        assert_eq!(transport.request_count(), 1);
        assert!(fs::read_to_string(&output)?.contains("No videos found."));
        Ok(())
    }

    #[test]
    fn fetch_failure_leaves_previous_output_untouched() -> anyhow::Result<()> {
        let temp = tempdir()?;
        let output = temp.path().join("index.html");
        fs::write(&output, "previous build")?;

        let transport = ScriptedTransport::new()
            .respond(200, &search_body(&[search_item("A", "Long")]))
            .respond(500, "");
        let err = run(&config(output.clone()), &transport).unwrap_err();
        assert!(matches!(
            err,
            Error::Fetch(FetchError::Status {
                endpoint: Endpoint::Videos,
                status: 500
            })
        ));
        assert_eq!(fs::read_to_string(&output)?, "previous build");
        Ok(())
    }

    #[test]
    fn search_failure_aborts_before_duration_lookup() {
        let transport = ScriptedTransport::new().respond(401, "");
        let err = build_page(&config(PathBuf::from("unused.html")), &transport).unwrap_err();
        assert!(matches!(
            err,
            Error::Fetch(FetchError::Status {
                endpoint: Endpoint::Search,
                ..
            })
        ));
        assert_eq!(transport.request_count(), 1);
    }

    #[test]
    fn identical_responses_render_identical_pages() -> anyhow::Result<()> {
        let config = config(PathBuf::from("unused.html"));
        let first = build_page(&config, &sample_transport())?;
        let second = build_page(&config, &sample_transport())?;
        assert_eq!(first.html, second.html);
        Ok(())
    }

    #[test]
    fn desired_count_caps_output() -> anyhow::Result<()> {
        let items: Vec<String> = (0..30)
            .map(|i| search_item(&format!("v{i}"), "Long video"))
            .collect();
        let ids: Vec<String> = (0..30).map(|i| format!("v{i}")).collect();
        let durations: Vec<(&str, &str)> = ids.iter().map(|id| (id.as_str(), "PT10M")).collect();
        let transport = ScriptedTransport::new()
            .respond(200, &search_body(&items))
            .respond(200, &videos_body(&durations));

        let page = build_page(&config(PathBuf::from("unused.html")), &transport)?;
        assert_eq!(page.candidates, 30);
        assert_eq!(page.videos.len(), 24);
        assert_eq!(page.videos[0].video.video_id, "v0");
        assert_eq!(page.videos[23].video.video_id, "v23");
        Ok(())
    }
}
