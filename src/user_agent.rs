//! Default User-Agent string for index and download requests.

/// Project URL for User-Agent identification.
const PROJECT_UA_URL: &str = "https://archive.org";

/// Default User-Agent sent with every outbound request (identifies the tool).
#[must_use]
pub(crate) fn default_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("Mozilla/5.0 (compatible; index-downloader/{version}; +{PROJECT_UA_URL})")
}
