use axum::http::{HeaderMap, HeaderName, HeaderValue, header};
use tracing::debug;

use crate::config::RelayConfig;

/// never crosses the proxy in either direction
pub const HOP_BY_HOP_HEADERS: [HeaderName; 9] = [
    header::CONNECTION,
    HeaderName::from_static("keep-alive"),
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
    header::HOST,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// caller -> relay
    Outbound,
    /// relay -> caller
    Inbound,
}

pub struct HeaderUtil;

impl HeaderUtil {
    pub fn is_hop_by_hop(name: &HeaderName) -> bool {
        // HeaderName is always lowercase so a plain compare is case insensitive
        HOP_BY_HOP_HEADERS.contains(name)
    }

    /// Copies `source` minus the hop-by-hop set. Repeated headers are folded into one value
    /// joined with ", ", except set-cookie which can't be folded without breaking it.
    ///
    /// Outbound also gets the spoofed player identity, overwriting whatever the caller sent.
    pub fn sanitize(source: &HeaderMap, direction: Direction, config: &RelayConfig) -> HeaderMap {
        let mut sanitized = HeaderMap::with_capacity(source.keys_len() + 2);

        for name in source.keys() {
            if Self::is_hop_by_hop(name) {
                debug!("Dropping hop-by-hop header {} ({:?})", name, direction);
                continue;
            }

            if *name == header::SET_COOKIE {
                for value in source.get_all(name) {
                    sanitized.append(name.clone(), value.clone());
                }
                continue;
            }

            let mut values = source.get_all(name).iter();
            let Some(first) = values.next() else {
                continue;
            };

            let folded = values.fold(first.as_bytes().to_vec(), |mut acc, value| {
                acc.extend_from_slice(b", ");
                acc.extend_from_slice(value.as_bytes());
                acc
            });

            match HeaderValue::from_bytes(&folded) {
                Ok(value) => {
                    sanitized.insert(name.clone(), value);
                }
                Err(e) => debug!("Dropping unfoldable header {}: {}", name, e),
            }
        }

        if direction == Direction::Outbound {
            Self::apply_identity(&mut sanitized, config);
        }

        sanitized
    }

    fn apply_identity(headers: &mut HeaderMap, config: &RelayConfig) {
        match HeaderValue::from_str(&config.user_agent) {
            Ok(value) => {
                headers.insert(header::USER_AGENT, value);
            }
            Err(e) => debug!("Configured user agent is not a valid header value: {}", e),
        }

        match HeaderValue::from_str(&config.forwarded_for) {
            Ok(value) => {
                headers.insert(HeaderName::from_static("x-forwarded-for"), value);
            }
            Err(e) => debug!("Configured forwarded ip is not a valid header value: {}", e),
        }
    }
}
