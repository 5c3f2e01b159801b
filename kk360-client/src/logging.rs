use crate::config::LoggingConfig;
use crate::error::{ClientError, ClientResult};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber.
///
/// `RUST_LOG` wins over the configured directive. Output goes to stderr, as
/// JSON lines when `config.json` is set.
pub fn init_logging(config: &LoggingConfig) -> ClientResult<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.filter))
        .map_err(|e| ClientError::Logging(e.to_string()))?;

    let json = config.json.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_current_span(false)
            .with_span_list(false)
    });
    let plain = (!config.json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json)
        .with(plain)
        .try_init()
        .map_err(|e| ClientError::Logging(e.to_string()))?;

    tracing::debug!(filter = %config.filter, json = config.json, "logging initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_is_an_error_not_a_panic() {
        let config = LoggingConfig {
            filter: "kk360=debug".to_string(),
            json: true,
        };
        let _ = init_logging(&config);
        assert!(matches!(init_logging(&config), Err(ClientError::Logging(_))));
    }
}
