use kk360_client::config::{normalize_api_root, AuthConfig, ClientConfig, ConfigError, LoggingConfig};
use kk360_client::resources::ApplicationStatus;
use kk360_core::error::{GENERIC_FALLBACK, MARKUP_FALLBACK, MAX_MESSAGE_CHARS};
use kk360_core::user_facing_message;
use proptest::prelude::*;
use std::io::Write;

fn base_config() -> ClientConfig {
    ClientConfig {
        api_base_url: "http://localhost:5000".to_string(),
        request_timeout_ms: 5_000,
        auth: AuthConfig {
            bearer_token: Some("test-token".to_string()),
        },
        logging: LoggingConfig {
            filter: "kk360=info".to_string(),
            json: false,
        },
    }
}

#[test]
fn config_accepts_missing_token() {
    let mut config = base_config();
    config.auth = AuthConfig { bearer_token: None };
    assert!(config.validate().is_ok());
}

#[test]
fn config_rejects_blank_token() {
    let mut config = base_config();
    config.auth = AuthConfig {
        bearer_token: Some("  ".to_string()),
    };
    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidValue { field: "auth.bearer_token", .. })
    ));
}

#[test]
fn config_rejects_non_http_base() {
    let mut config = base_config();
    config.api_base_url = "localhost:5000".to_string();
    assert!(config.validate().is_err());
}

#[test]
fn config_loads_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
api_base_url = "https://kk360.example.org/api/"
request_timeout_ms = 2500

[auth]

[logging]
filter = "kk360=debug"
json = true
"#
    )
    .unwrap();
    let config = ClientConfig::from_path(file.path()).unwrap();
    assert_eq!(config.api_root(), "https://kk360.example.org/api");
    assert!(config.auth.bearer_token.is_none());
    assert!(config.logging.json);
}

#[test]
fn config_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = ClientConfig::from_path(&dir.path().join("absent.toml"));
    assert!(matches!(result, Err(ConfigError::Io(_))));
}

proptest! {
    #[test]
    fn config_timeout_validation(timeout in 0u64..10_000) {
        let mut config = base_config();
        config.request_timeout_ms = timeout;
        prop_assert_eq!(config.validate().is_ok(), timeout > 0);
    }

    #[test]
    fn api_root_is_idempotent(host in "[a-z]{1,10}", slashes in 0usize..4, with_api in any::<bool>()) {
        let mut base = format!("https://{host}.example.org");
        if with_api {
            base.push_str("/api");
        }
        base.push_str(&"/".repeat(slashes));

        let root = normalize_api_root(&base);
        prop_assert!(root.ends_with("/api"));
        prop_assert!(!root.ends_with("/api/api"));
        prop_assert_eq!(normalize_api_root(&root), root.clone());
    }

    #[test]
    fn known_statuses_survive_the_wire(index in 0usize..5) {
        let status = [
            ApplicationStatus::UnderReview,
            ApplicationStatus::TeleVerification,
            ApplicationStatus::PanelInterview,
            ApplicationStatus::Selected,
            ApplicationStatus::Rejected,
        ][index]
            .clone();
        prop_assert_eq!(ApplicationStatus::normalize(status.as_wire()), status.clone());
        prop_assert_eq!(ApplicationStatus::normalize(status.as_str()), status);
    }

    #[test]
    fn user_messages_are_bounded_and_never_markup(raw in ".{0,600}") {
        let message = user_facing_message(&raw);
        prop_assert!(!message.trim_start().starts_with('<'));
        prop_assert!(!message.trim().is_empty());
        prop_assert!(message.chars().count() <= MAX_MESSAGE_CHARS + 1);
        if raw.trim_start().starts_with('<') {
            prop_assert_eq!(message, MARKUP_FALLBACK);
        } else if raw.trim().is_empty() {
            prop_assert_eq!(message, GENERIC_FALLBACK);
        }
    }
}
