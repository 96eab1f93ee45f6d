use starhub_proxy::RelayConfig;
use starhub_proxy::server::error::Error;
use starhub_proxy::server::utils::url_utils::UrlUtil;
use url::Url;

const RELAYED: &str = "https://cors-buster.fly.dev/https://ucdn.starhubgo.com";

fn config() -> RelayConfig {
    RelayConfig::new("https://cors-buster.fly.dev/", "https://ucdn.starhubgo.com")
}

fn upstream(path: &str) -> Url {
    Url::parse(&format!("https://ucdn.starhubgo.com{}", path)).unwrap()
}

#[test]
fn test_build_joins_segments_under_relay() {
    let url = UrlUtil::build_upstream_url(&config(), "hls/ch101/index.m3u8", None);

    assert_eq!(url, format!("{}/hls/ch101/index.m3u8", RELAYED));
}

#[test]
fn test_build_never_doubles_or_drops_slashes() {
    let expected = format!("{}/a/b/c.ts", RELAYED);

    for path in ["a/b/c.ts", "/a/b/c.ts", "a//b///c.ts", "//a/b/c.ts/", "a/b/c.ts//"] {
        assert_eq!(UrlUtil::build_upstream_url(&config(), path, None), expected);
    }

    // zero segments still gets the separator
    assert_eq!(
        UrlUtil::build_upstream_url(&config(), "", None),
        format!("{}/", RELAYED)
    );
    assert_eq!(
        UrlUtil::build_upstream_url(&config(), "///", None),
        format!("{}/", RELAYED)
    );
}

#[test]
fn test_build_appends_query() {
    assert_eq!(
        UrlUtil::build_upstream_url(&config(), "live/index.m3u8", Some("token=abc&exp=1")),
        format!("{}/live/index.m3u8?token=abc&exp=1", RELAYED)
    );
    assert_eq!(
        UrlUtil::build_upstream_url(&config(), "live/index.m3u8", Some("?token=abc")),
        format!("{}/live/index.m3u8?token=abc", RELAYED)
    );
    // empty query is the same as no query
    assert_eq!(
        UrlUtil::build_upstream_url(&config(), "live/index.m3u8", Some("")),
        format!("{}/live/index.m3u8", RELAYED)
    );
}

#[test]
fn test_config_normalizes_slashes() {
    let config = RelayConfig::new("https://cors-buster.fly.dev", "https://ucdn.starhubgo.com/");

    assert_eq!(config.relay_base, "https://cors-buster.fly.dev/");
    assert_eq!(config.upstream_origin, "https://ucdn.starhubgo.com");
    assert_eq!(
        UrlUtil::build_upstream_url(&config, "x", None),
        format!("{}/x", RELAYED)
    );
}

#[test]
fn test_default_config_matches_constants() {
    let config = RelayConfig::default();

    assert_eq!(config.relayed_origin(), RELAYED);
    assert_eq!(
        config.user_agent,
        "ExoPlayerDemo/2.15.1 (Linux; Android 13) ExoPlayerLib/2.15.1"
    );
    assert_eq!(config.forwarded_for, "203.117.83.181");
    assert_eq!(config.max_redirects, 5);
}

#[test]
fn test_absolute_location_is_rerooted() {
    let next = UrlUtil::rebuild_from_location(
        &config(),
        &upstream("/a"),
        "https://ucdn.starhubgo.com/edge/b.m3u8",
    )
    .unwrap();

    assert_eq!(next, format!("{}/edge/b.m3u8", RELAYED));
}

#[test]
fn test_location_path_is_kept_exactly() {
    let current = upstream("/live");

    assert_eq!(
        UrlUtil::rebuild_from_location(&config(), &current, "https://ucdn.starhubgo.com/live/")
            .unwrap(),
        format!("{}/live/", RELAYED)
    );
    assert_eq!(
        UrlUtil::rebuild_from_location(&config(), &current, "/hls//ch1/index.m3u8").unwrap(),
        format!("{}/hls//ch1/index.m3u8", RELAYED)
    );
    assert_eq!(
        UrlUtil::rebuild_from_location(&config(), &current, "https://ucdn.starhubgo.com/").unwrap(),
        format!("{}/", RELAYED)
    );
}

#[test]
fn test_relative_trailing_slash_location_is_kept() {
    let next = UrlUtil::rebuild_from_location(&config(), &upstream("/vod/show"), "show/").unwrap();

    assert_eq!(next, format!("{}/vod/show/", RELAYED));
}

#[test]
fn test_foreign_host_location_is_rerooted_at_origin() {
    let next = UrlUtil::rebuild_from_location(
        &config(),
        &upstream("/a"),
        "https://edge7.cdn.example.net/edge/b.m3u8",
    )
    .unwrap();

    assert_eq!(next, format!("{}/edge/b.m3u8", RELAYED));
}

#[test]
fn test_location_keeps_its_query() {
    let next = UrlUtil::rebuild_from_location(
        &config(),
        &upstream("/a?old=1"),
        "https://ucdn.starhubgo.com/b.m3u8?sig=xyz&exp=99",
    )
    .unwrap();

    assert_eq!(next, format!("{}/b.m3u8?sig=xyz&exp=99", RELAYED));
}

#[test]
fn test_relative_location_resolves_against_current() {
    let current = upstream("/hls/ch1/master.m3u8");

    assert_eq!(
        UrlUtil::rebuild_from_location(&config(), &current, "/other/index.m3u8").unwrap(),
        format!("{}/other/index.m3u8", RELAYED)
    );
    assert_eq!(
        UrlUtil::rebuild_from_location(&config(), &current, "720p/index.m3u8").unwrap(),
        format!("{}/hls/ch1/720p/index.m3u8", RELAYED)
    );
}

#[test]
fn test_already_relayed_location_is_not_doubled() {
    let next = UrlUtil::rebuild_from_location(
        &config(),
        &upstream("/a"),
        "https://cors-buster.fly.dev/https://ucdn.starhubgo.com/b.m3u8",
    )
    .unwrap();

    assert_eq!(next, format!("{}/b.m3u8", RELAYED));
}

#[test]
fn test_garbage_location_is_malformed() {
    let result = UrlUtil::rebuild_from_location(&config(), &upstream("/a"), "http://[::1");

    assert!(matches!(result, Err(Error::MalformedLocation(_))));
}

#[test]
fn test_caller_facing_location_rewrite() {
    assert_eq!(
        UrlUtil::relay_location(&config(), "https://ucdn.starhubgo.com/foo/bar"),
        Some("https://cors-buster.fly.dev/https://ucdn.starhubgo.com/foo/bar".to_string())
    );
}

#[test]
fn test_caller_facing_rewrite_ignores_other_hosts() {
    assert_eq!(
        UrlUtil::relay_location(&config(), "https://elsewhere.example.com/foo"),
        None
    );
    assert_eq!(
        UrlUtil::relay_location(&config(), "https://ucdn.starhubgo.com.evil.example/foo"),
        None
    );
    assert_eq!(UrlUtil::relay_location(&config(), "/foo/bar"), None);
}

#[test]
fn test_upstream_view_strips_relay() {
    let view = UrlUtil::upstream_view(&config(), &format!("{}/a/b.ts?x=1", RELAYED)).unwrap();

    assert_eq!(view.as_str(), "https://ucdn.starhubgo.com/a/b.ts?x=1");
}
