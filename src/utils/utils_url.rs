use reqwest::Url;

use crate::error::DashboardError;

/// Appends `segments` to the path of `base`, percent-encoding each one.
/// A path prefix on the base (`http://host/synth/`) is kept.
pub fn resource_url<I, S>(base: &str, segments: I) -> Result<Url, DashboardError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut url = Url::parse(base.trim()).map_err(|_| DashboardError::InvalidUrl(base.to_string()))?;
    url.set_query(None);
    url.set_fragment(None);
    url.path_segments_mut()
        .map_err(|_| DashboardError::InvalidUrl(base.to_string()))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// `resource_url` for a slash separated path such as `history/message-paths`.
pub fn join_path(base: &str, path: &str) -> Result<Url, DashboardError> {
    resource_url(base, path.split('/').filter(|s| !s.is_empty()))
}

/// Canonical form of a base URL used as an identity key: lowercased scheme and
/// host, default port elided, no trailing slash. Unparsable input is returned
/// trimmed so it still dedups against itself.
pub fn normalize_base_url(raw: &str) -> String {
    match Url::parse(raw.trim()) {
        Ok(url) => url.as_str().trim_end_matches('/').to_string(),
        Err(_) => raw.trim().trim_end_matches('/').to_string(),
    }
}
