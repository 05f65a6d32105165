use clap::ValueEnum;
use tracing_subscriber::EnvFilter;

/// Environment variable that overrides `--log-level` with a full filter
/// directive (e.g. `mqprims_channel=trace,info`).
pub const LOG_ENV: &str = "MQPRIMS_LOG";

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_directive(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

fn build_filter(level: LogLevel, env_override: Option<&str>) -> EnvFilter {
    env_override
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(level.as_directive()))
}

pub fn init_logging(format: LogFormat, level: LogLevel) {
    let env_override = std::env::var(LOG_ENV).ok();
    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(build_filter(level, env_override.as_deref()))
        .with_ansi(false)
        .with_target(false);

    match format {
        LogFormat::Text => {
            let _ = builder.try_init();
        }
        LogFormat::Json => {
            let _ = builder.json().try_init();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_maps_to_directive() {
        assert_eq!(LogLevel::Warn.as_directive(), "warn");
        assert_eq!(build_filter(LogLevel::Debug, None).to_string(), "debug");
    }

    #[test]
    fn env_override_wins_when_valid() {
        let filter = build_filter(LogLevel::Error, Some("mqprims_channel=trace"));
        assert_eq!(filter.to_string(), "mqprims_channel=trace");
    }

    #[test]
    fn invalid_env_override_falls_back_to_level() {
        let filter = build_filter(LogLevel::Info, Some("mqprims=verbose"));
        assert_eq!(filter.to_string(), "info");
    }
}
