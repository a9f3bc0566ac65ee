//! Log subscriber for the CLI and native shells.
//!
//! `RUST_LOG` picks the filter (default: this crate at info, everything else
//! at warn). `CKBOOST_LOG_FORMAT` picks the output: `compact` (default),
//! `pretty` or `json`. `CKBOOST_LOG_JSON=1` is accepted as a shorthand for
//! `json`. Logs always go to stderr so command output on stdout stays clean.

use tracing_subscriber::{fmt, EnvFilter};

pub const ENV_LOG_FORMAT: &str = "CKBOOST_LOG_FORMAT";
pub const ENV_LOG_JSON: &str = "CKBOOST_LOG_JSON";

const DEFAULT_DIRECTIVES: &str = "warn,ckboost=info";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Compact,
    Pretty,
    Json,
}

impl LogFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Some(Self::Compact),
            "pretty" => Some(Self::Pretty),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    fn from_vars<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(format) = lookup(ENV_LOG_FORMAT).as_deref().and_then(Self::parse) {
            return format;
        }
        match lookup(ENV_LOG_JSON).as_deref() {
            Some("1") | Some("true") => Self::Json,
            _ => Self::default(),
        }
    }
}

/// Install the global subscriber from the environment. Safe to call twice.
pub fn init_logging() {
    init_logging_with(LogFormat::from_vars(|key| std::env::var(key).ok()));
}

pub fn init_logging_with(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES));
    let builder = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    // A second init (tests, embedding shells) keeps the first subscriber.
    let _ = match format {
        LogFormat::Compact => builder.compact().with_target(false).try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        move |key| pairs.iter().find(|(k, _)| *k == key).map(|(_, v)| v.to_string())
    }

    #[test]
    fn format_selection() {
        assert_eq!(LogFormat::from_vars(vars(&[])), LogFormat::Compact);
        assert_eq!(LogFormat::from_vars(vars(&[(ENV_LOG_JSON, "1")])), LogFormat::Json);
        assert_eq!(LogFormat::from_vars(vars(&[(ENV_LOG_FORMAT, "Pretty")])), LogFormat::Pretty);
        assert_eq!(
            LogFormat::from_vars(vars(&[(ENV_LOG_FORMAT, "compact"), (ENV_LOG_JSON, "1")])),
            LogFormat::Compact
        );
        assert_eq!(LogFormat::from_vars(vars(&[(ENV_LOG_FORMAT, "xml")])), LogFormat::Compact);
    }

    #[test]
    fn init_twice_is_harmless() {
        init_logging_with(LogFormat::Compact);
        init_logging_with(LogFormat::Json);
    }
}
