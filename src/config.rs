use tracing::level_filters::LevelFilter;

#[derive(clap::ValueEnum, Clone, Debug, Copy)]
pub enum CargoEnv {
    Development,
    Production,
}

/// how a 3xx coming back through the relay is handled
#[derive(clap::ValueEnum, Clone, Debug, Copy, PartialEq, Eq)]
pub enum RedirectMode {
    /// chase the whole chain here, every hop re-rooted at the relay
    Follow,
    /// send one request, rewrite the location and let the caller do the next hop
    PassThrough,
}

#[derive(clap::Parser)]
pub struct AppConfig {
    // production or development
    #[clap(long, env, value_enum)]
    pub cargo_env: CargoEnv,

    // port that the app will bind to
    #[clap(long, env, default_value = "5000")]
    pub port: u16,

    // the cors relay everything is routed through, the upstream url gets glued onto the end of it
    #[clap(long, env, default_value = "https://cors-buster.fly.dev/")]
    pub relay_base: String,

    // the real cdn, never hit directly
    #[clap(long, env, default_value = "https://ucdn.starhubgo.com")]
    pub upstream_origin: String,

    // the cdn 403s anything that doesn't look like an android player
    #[clap(
        long,
        env,
        default_value = "ExoPlayerDemo/2.15.1 (Linux; Android 13) ExoPlayerLib/2.15.1"
    )]
    pub spoofed_user_agent: String,

    // singapore ip so geo checks pass
    #[clap(long, env, default_value = "203.117.83.181")]
    pub spoofed_forwarded_for: String,

    #[clap(long, env, default_value = "5")]
    pub max_redirects: u32,

    // follow is the default, pass-through hands the redirect back to the player
    #[clap(long, env, value_enum, default_value = "follow")]
    pub redirect_mode: RedirectMode,

    // per hop timeout for the upstream client
    #[clap(long, env, default_value = "30")]
    pub upstream_timeout_secs: u64,

    // inbound bodies are buffered so they can be resent on redirects, cap them
    #[clap(long, env, default_value = "10485760")]
    pub max_body_bytes: usize,

    // this should be either * for allowing everything, or a comma seperated list of domains like
    // example.com,something.com
    #[clap(long, env, default_value = "*")]
    pub cors_origin: String,

    // optional sentry integration
    #[clap(long, env)]
    pub sentry_dsn: Option<String>,

    // where the daily relay log rolls over in production, development logs to stdout
    #[clap(long, env, default_value = "logs")]
    pub log_dir: String,

    // overrides the per environment level, e.g. trace to see every header that goes out
    #[clap(long, env)]
    pub log_level: Option<LevelFilter>,
}

impl Default for AppConfig {
    // defaults aren't really needed here but it's here as a bad fallback
    fn default() -> Self {
        Self {
            cargo_env: CargoEnv::Development,
            port: 5000,
            relay_base: "https://cors-buster.fly.dev/".to_string(),
            upstream_origin: "https://ucdn.starhubgo.com".to_string(),
            spoofed_user_agent: "ExoPlayerDemo/2.15.1 (Linux; Android 13) ExoPlayerLib/2.15.1"
                .to_string(),
            spoofed_forwarded_for: "203.117.83.181".to_string(),
            max_redirects: 5,
            redirect_mode: RedirectMode::Follow,
            upstream_timeout_secs: 30,
            max_body_bytes: 10 * 1024 * 1024,
            cors_origin: "*".to_string(),
            sentry_dsn: None,
            log_dir: "logs".to_string(),
            log_level: None,
        }
    }
}

/// Everything the relay pipeline needs, fixed for the lifetime of the process.
///
/// `relay_base` always ends in exactly one `/` and `upstream_origin` never ends in one, so
/// `relay_base + upstream_origin + "/" + path` can be concatenated without checking slashes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    pub relay_base: String,
    pub upstream_origin: String,
    pub user_agent: String,
    pub forwarded_for: String,
    pub max_redirects: u32,
    pub redirect_mode: RedirectMode,
}

impl RelayConfig {
    pub fn new(relay_base: &str, upstream_origin: &str) -> Self {
        let defaults = AppConfig::default();

        Self {
            relay_base: format!("{}/", relay_base.trim_end_matches('/')),
            upstream_origin: upstream_origin.trim_end_matches('/').to_string(),
            user_agent: defaults.spoofed_user_agent,
            forwarded_for: defaults.spoofed_forwarded_for,
            max_redirects: defaults.max_redirects,
            redirect_mode: defaults.redirect_mode,
        }
    }

    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            user_agent: config.spoofed_user_agent.clone(),
            forwarded_for: config.spoofed_forwarded_for.clone(),
            max_redirects: config.max_redirects,
            redirect_mode: config.redirect_mode,
            ..Self::new(&config.relay_base, &config.upstream_origin)
        }
    }

    pub fn with_max_redirects(mut self, max_redirects: u32) -> Self {
        self.max_redirects = max_redirects;
        self
    }

    pub fn with_redirect_mode(mut self, redirect_mode: RedirectMode) -> Self {
        self.redirect_mode = redirect_mode;
        self
    }

    /// relay base and origin glued together, every upstream url starts with this
    pub fn relayed_origin(&self) -> String {
        format!("{}{}", self.relay_base, self.upstream_origin)
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self::from_app_config(&AppConfig::default())
    }
}
