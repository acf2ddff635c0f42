//! Link discovery on a directory-index page.
//!
//! [`discover`] fetches the index document, scans it for `<a href>` targets,
//! resolves each against the index URL, keeps those ending in the configured
//! suffix (case-insensitive), and removes duplicates while preserving the
//! order of first occurrence.

mod scanner;

use std::collections::HashSet;

use thiserror::Error;
use tracing::{debug, info, instrument};
use url::Url;

use crate::download::{DownloadError, HttpClient};

pub use scanner::{TagAttributes, TagScanner};

/// Failure to obtain the index document. Fatal to the run.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// Index fetch failed (transport error, timeout, or error status).
    #[error("failed to fetch index {url}: {source}")]
    Fetch {
        /// Index address.
        url: String,
        /// Underlying fetch error.
        #[source]
        source: DownloadError,
    },
}

/// Fetches `index_url` and returns matching absolute links in first-seen order.
///
/// # Errors
///
/// Returns [`DiscoveryError::Fetch`] when the index cannot be retrieved.
#[instrument(skip(client), fields(index = %index_url))]
pub async fn discover(
    client: &HttpClient,
    index_url: &Url,
    suffix: &str,
) -> Result<Vec<Url>, DiscoveryError> {
    let body = client
        .fetch_text(index_url)
        .await
        .map_err(|source| DiscoveryError::Fetch {
            url: index_url.to_string(),
            source,
        })?;

    let links = extract_links(&body, index_url, suffix);
    info!(count = links.len(), suffix, "index scanned");
    Ok(links)
}

/// Extracts, resolves, filters and de-duplicates links from an index document.
#[must_use]
pub fn extract_links(html: &str, base: &Url, suffix: &str) -> Vec<Url> {
    let scanner = TagScanner::parse(html);
    if scanner.error_count() > 0 {
        debug!(errors = scanner.error_count(), "recovered from malformed markup");
    }

    let suffix = suffix.to_lowercase();
    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for href in scanner.hrefs() {
        let mut url = match base.join(href.trim()) {
            Ok(url) => url,
            Err(error) => {
                debug!(href = %href, error = %error, "skipping unresolvable link");
                continue;
            }
        };
        url.set_fragment(None);

        if !url.as_str().to_lowercase().ends_with(&suffix) {
            continue;
        }
        if seen.insert(url.as_str().to_string()) {
            links.push(url);
        }
    }

    links
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://archive.org/download/show_2023/").unwrap()
    }

    fn strs(links: &[Url]) -> Vec<&str> {
        links.iter().map(Url::as_str).collect()
    }

    #[test]
    fn test_extract_links_resolves_relative_and_absolute() {
        let html = r#"
            <a href="ep1.ia.mp4">1</a>
            <a href="/download/other/ep2.ia.mp4">2</a>
            <a href="https://cdn.example.com/ep3.ia.mp4">3</a>
            <a href="sub/../ep4.ia.mp4">4</a>
        "#;
        let links = extract_links(html, &base(), ".ia.mp4");
        assert_eq!(
            strs(&links),
            vec![
                "https://archive.org/download/show_2023/ep1.ia.mp4",
                "https://archive.org/download/other/ep2.ia.mp4",
                "https://cdn.example.com/ep3.ia.mp4",
                "https://archive.org/download/show_2023/ep4.ia.mp4",
            ]
        );
    }

    #[test]
    fn test_extract_links_dedupes_in_first_seen_order() {
        let html = r#"
            <a href="b.ia.mp4">b</a>
            <a href="a.ia.mp4">a</a>
            <a href="./b.ia.mp4">b again</a>
            <a href="https://archive.org/download/show_2023/a.ia.mp4">a again</a>
            <a href="c.ia.mp4">c</a>
        "#;
        let links = extract_links(html, &base(), ".ia.mp4");
        let names: Vec<_> = links
            .iter()
            .map(|u| u.path_segments().unwrap().next_back().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["b.ia.mp4", "a.ia.mp4", "c.ia.mp4"]);
    }

    #[test]
    fn test_extract_links_suffix_filter_is_case_insensitive() {
        let html = r#"
            <a href="LOUD.IA.MP4">1</a>
            <a href="quiet.ia.mp4">2</a>
            <a href="plain.mp4">3</a>
            <a href="notes.txt">4</a>
        "#;
        let links = extract_links(html, &base(), ".IA.mp4");
        assert_eq!(links.len(), 2);
        for link in &links {
            assert!(link.as_str().to_lowercase().ends_with(".ia.mp4"));
        }
    }

    #[test]
    fn test_extract_links_strips_fragment_before_filtering() {
        let html = r##"<a href="ep.ia.mp4#t=10">1</a><a href="ep.ia.mp4">2</a>"##;
        let links = extract_links(html, &base(), ".ia.mp4");
        assert_eq!(
            strs(&links),
            vec!["https://archive.org/download/show_2023/ep.ia.mp4"]
        );
    }

    #[test]
    fn test_extract_links_query_prevents_suffix_match() {
        let html = r#"<a href="ep.ia.mp4?download=1">1</a>"#;
        assert!(extract_links(html, &base(), ".ia.mp4").is_empty());
    }

    #[test]
    fn test_extract_links_three_matching_one_not() {
        let html = r#"
            <html><body><pre>
            <a href="../">Parent</a>
            <a href="one.ia.mp4">one</a>
            <a href="two.ia.mp4">two</a>
            <a href="show_meta.xml">meta</a>
            <a href="three.ia.mp4">three</a>
            </pre></body></html>
        "#;
        let links = extract_links(html, &base(), ".ia.mp4");
        assert_eq!(links.len(), 3);
        assert!(links.iter().all(|u| u.as_str().ends_with(".ia.mp4")));
    }

    #[test]
    fn test_extract_links_stray_table_content_keeps_first_seen_order() {
        let html = r#"<table><tr><td><a href="first.ia.mp4">1</a></td></tr><a href="second.ia.mp4">2</a></table>"#;
        let links = extract_links(html, &base(), ".ia.mp4");
        assert_eq!(
            strs(&links),
            vec![
                "https://archive.org/download/show_2023/first.ia.mp4",
                "https://archive.org/download/show_2023/second.ia.mp4",
            ]
        );
    }

    #[test]
    fn test_extract_links_keeps_anchor_inside_select() {
        let html = r#"<select><option>x</option><a href="inselect.ia.mp4">1</a></select><a href="after.ia.mp4">2</a>"#;
        let links = extract_links(html, &base(), ".ia.mp4");
        assert_eq!(
            strs(&links),
            vec![
                "https://archive.org/download/show_2023/inselect.ia.mp4",
                "https://archive.org/download/show_2023/after.ia.mp4",
            ]
        );
    }

    #[test]
    fn test_extract_links_empty_document() {
        assert!(extract_links("", &base(), ".ia.mp4").is_empty());
    }
}
