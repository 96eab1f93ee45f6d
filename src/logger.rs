/* Logger initialization */
use std::any::Any;
use std::{panic, thread};

use tracing::{error, info, level_filters::LevelFilter};
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::{AppConfig, CargoEnv};

const LOG_FILE_PREFIX: &str = "relay.log";

pub struct LoggerGuards {
    pub _tracing_guard: WorkerGuard,
    // only there when a dsn was given
    pub _sentry_guard: Option<sentry::ClientInitGuard>,
}

pub struct Logger {}

impl Logger {
    /// Installs the global subscriber and panic hook. The returned guards have to outlive main or
    /// buffered lines and queued sentry events are lost.
    pub fn init(config: &AppConfig) -> LoggerGuards {
        let (writer, tracing_guard) = Self::writer(config);
        let sentry_guard = Self::sentry(config);

        let registry = tracing_subscriber::registry()
            .with(Self::max_level(config))
            .with(tracing_subscriber::fmt::layer().with_writer(writer));

        if sentry_guard.is_some() {
            registry.with(sentry_tracing::layer()).init();
        } else {
            registry.init();
        }

        panic::set_hook(Box::new(|info| {
            let thread = thread::current();
            let thread = thread.name().unwrap_or("unknown");
            let msg = Self::panic_message(info.payload());
            let backtrace = backtrace::Backtrace::new();

            match info.location() {
                Some(location) => error!(
                    target: "panic", "thread '{}' panicked at '{}': {}:{}\n{:?}",
                    thread,
                    msg,
                    location.file(),
                    location.line(),
                    backtrace
                ),
                None => error!(
                    target: "panic", "thread '{}' panicked at '{}'\n{:?}",
                    thread,
                    msg,
                    backtrace
                ),
            }
        }));

        info!(
            "Logging at {} for {}",
            Self::max_level(config),
            Self::environment_name(config.cargo_env)
        );

        LoggerGuards {
            _tracing_guard: tracing_guard,
            _sentry_guard: sentry_guard,
        }
    }

    /// Explicit `log_level` wins. Otherwise production runs at debug so a redirect chain that went
    /// wrong can be traced hop by hop afterwards, development stays at info.
    pub fn max_level(config: &AppConfig) -> LevelFilter {
        config.log_level.unwrap_or(match config.cargo_env {
            CargoEnv::Development => LevelFilter::INFO,
            CargoEnv::Production => LevelFilter::DEBUG,
        })
    }

    fn writer(config: &AppConfig) -> (NonBlocking, WorkerGuard) {
        match config.cargo_env {
            CargoEnv::Development => tracing_appender::non_blocking(std::io::stdout()),
            CargoEnv::Production => tracing_appender::non_blocking(
                tracing_appender::rolling::daily(&config.log_dir, LOG_FILE_PREFIX),
            ),
        }
    }

    fn sentry(config: &AppConfig) -> Option<sentry::ClientInitGuard> {
        let dsn = config.sentry_dsn.as_deref().filter(|dsn| !dsn.trim().is_empty())?;

        Some(sentry::init((
            dsn,
            sentry::ClientOptions {
                release: sentry::release_name!(),
                environment: Some(Self::environment_name(config.cargo_env).into()),
                attach_stacktrace: true,
                ..Default::default()
            },
        )))
    }

    /// panic payloads are a `&str` for literals and a `String` for anything formatted
    pub fn panic_message(payload: &(dyn Any + Send)) -> &str {
        if let Some(s) = payload.downcast_ref::<&'static str>() {
            return s;
        }

        payload
            .downcast_ref::<String>()
            .map(String::as_str)
            .unwrap_or("Box<Any>")
    }

    pub fn environment_name(cargo_env: CargoEnv) -> &'static str {
        match cargo_env {
            CargoEnv::Development => "development",
            CargoEnv::Production => "production",
        }
    }
}
