//! Integration tests for index fetching and link discovery.

mod support;

use std::time::Duration;

use index_downloader::{DiscoveryError, DownloadError, HttpClient, discover};
use support::socket_guard::{socket_skip_return, start_mock_server_or_skip};
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

const INDEX_HTML: &str = r#"<html><head><title>Index of /dl/show</title></head><body>
<h1>Index of /dl/show/</h1><pre>
<a href="../">../</a>
<a href="Episode%201.ia.mp4">Episode 1.ia.mp4</a>   12-Aug-2023 10:00   512M
<a href="episode2.IA.MP4">episode2.IA.MP4</a>     12-Aug-2023 10:00   498M
<a href="episode2.IA.MP4">episode2.IA.MP4</a>
<a href="show_meta.xml">show_meta.xml</a>
<a href="/dl/other/bonus.ia.mp4">bonus.ia.mp4</a>
<a href="thumb.jpg"><img src="thumb.jpg"
</pre></body></html>"#;

fn client() -> HttpClient {
    HttpClient::new("index-downloader-test/1.0", Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn test_discover_resolves_filters_and_dedupes() -> Result<(), Box<dyn std::error::Error>> {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return socket_skip_return();
    };

    Mock::given(method("GET"))
        .and(path("/dl/show/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(INDEX_HTML))
        .expect(1)
        .mount(&mock_server)
        .await;

    let index = Url::parse(&format!("{}/dl/show/", mock_server.uri()))?;
    let links = discover(&client(), &index, ".ia.mp4").await?;

    let base = mock_server.uri();
    let got: Vec<_> = links.iter().map(Url::as_str).collect();
    assert_eq!(
        got,
        vec![
            format!("{base}/dl/show/Episode%201.ia.mp4"),
            format!("{base}/dl/show/episode2.IA.MP4"),
            format!("{base}/dl/other/bonus.ia.mp4"),
        ]
    );
    Ok(())
}

#[tokio::test]
async fn test_discover_index_error_status_is_fatal() -> Result<(), Box<dyn std::error::Error>> {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return socket_skip_return();
    };

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let index = Url::parse(&format!("{}/dl/show/", mock_server.uri()))?;
    let result = discover(&client(), &index, ".ia.mp4").await;

    match result {
        Err(DiscoveryError::Fetch { url, source }) => {
            assert_eq!(url, index.as_str());
            assert!(matches!(source, DownloadError::HttpStatus { status: 500, .. }));
        }
        other => panic!("expected fetch error, got {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn test_discover_empty_listing_returns_no_links() -> Result<(), Box<dyn std::error::Error>> {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return socket_skip_return();
    };

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html><body>nothing</body></html>"))
        .mount(&mock_server)
        .await;

    let index = Url::parse(&format!("{}/", mock_server.uri()))?;
    assert!(discover(&client(), &index, ".ia.mp4").await?.is_empty());
    Ok(())
}
