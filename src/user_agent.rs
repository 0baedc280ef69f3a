//! User-Agent string sent with API requests.

/// Project URL for User-Agent identification (RFC 9308).
const PROJECT_UA_URL: &str = "https://github.com/fierce/benzinga-downloader";

/// Default User-Agent for news API requests (identifies the tool and version).
#[must_use]
pub(crate) fn default_api_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("benzinga-downloader/{version} (+{PROJECT_UA_URL})")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_agent_has_version_and_project_url() {
        let ua = default_api_user_agent();
        assert!(ua.starts_with("benzinga-downloader/"));
        assert!(ua.contains(env!("CARGO_PKG_VERSION")));
        assert!(ua.contains(PROJECT_UA_URL));
    }
}
