use tracing::debug;
use url::Url;

use crate::config::RelayConfig;
use crate::server::error::{AppResult, Error};

pub struct UrlUtil;

impl UrlUtil {
    /// relay + origin + "/" + path + query
    ///
    /// `path` is whatever came after the route prefix, already decoded. Empty segments are dropped
    /// so `a//b/`, `/a/b` and `a/b` all land on the same target and there's never a doubled slash
    /// after the origin.
    pub fn build_upstream_url(config: &RelayConfig, path: &str, query: Option<&str>) -> String {
        let joined = path
            .split('/')
            .filter(|segment| !segment.is_empty())
            .collect::<Vec<_>>()
            .join("/");

        Self::with_query(format!("{}/{}", config.relayed_origin(), joined), query)
    }

    fn with_query(mut target: String, query: Option<&str>) -> String {
        if let Some(q) = query.map(|q| q.trim_start_matches('?')).filter(|q| !q.is_empty()) {
            target.push('?');
            target.push_str(q);
        }

        target
    }

    /// Turns a redirect `Location` into the next relay url.
    ///
    /// Only the path and query of the location survive, the host is thrown away and the result is
    /// always re-rooted at relay + origin. The path is kept exactly as given, trailing and repeated
    /// slashes included, otherwise an origin redirecting `/live` to `/live/` loops forever.
    ///
    /// A location that already went through the relay is unwrapped first and a relative one is
    /// resolved against `current`, the upstream view (no relay prefix) of the url that produced
    /// the redirect.
    pub fn rebuild_from_location(
        config: &RelayConfig,
        current: &Url,
        location: &str,
    ) -> AppResult<String> {
        let location = location.trim();
        let unwrapped = location.strip_prefix(&config.relay_base).unwrap_or(location);

        let resolved = match Url::parse(unwrapped) {
            Ok(absolute) => absolute,
            Err(url::ParseError::RelativeUrlWithoutBase) => current
                .join(unwrapped)
                .map_err(|e| Error::MalformedLocation(format!("{}: {}", location, e)))?,
            Err(e) => return Err(Error::MalformedLocation(format!("{}: {}", location, e))),
        };

        if resolved.cannot_be_a_base() {
            return Err(Error::MalformedLocation(location.to_string()));
        }

        let rebuilt = Self::with_query(
            format!("{}{}", config.relayed_origin(), resolved.path()),
            resolved.query(),
        );
        debug!("Location {} rebuilt as {}", location, rebuilt);

        Ok(rebuilt)
    }

    /// Location rewrite for responses that are handed back to the caller. Anything pointing at the
    /// bare origin gets the relay put in front, everything else is left alone.
    pub fn relay_location(config: &RelayConfig, location: &str) -> Option<String> {
        let rest = location.strip_prefix(&config.upstream_origin)?;

        // ucdn.starhubgo.com.somewhere-else.com is not the origin
        match rest.chars().next() {
            None | Some('/') | Some('?') | Some('#') => {
                Some(format!("{}{}", config.relay_base, location))
            }
            Some(_) => None,
        }
    }

    /// strips the relay prefix back off, giving the url as the cdn sees it
    pub fn upstream_view(config: &RelayConfig, relay_url: &str) -> AppResult<Url> {
        let bare = relay_url
            .strip_prefix(&config.relay_base)
            .unwrap_or(relay_url);

        Url::parse(bare).map_err(|e| Error::BadRequest(format!("Invalid upstream url {}: {}", bare, e)))
    }
}
