#![allow(clippy::unwrap_used)]
// Provider-stack tests. `Jail` gives each test a scratch directory and a
// restorable environment.

use std::path::Path;
use std::time::Duration;

use figment::Jail;
use pretty_assertions::assert_eq;

use plexstax_config::{ConfigError, load};

fn load_in_jail() -> Result<plexstax_config::Settings, figment::Error> {
    load(Some(Path::new("plexstax.toml"))).map_err(|e| e.to_string().into())
}

#[test]
fn defaults_without_file_or_env() {
    Jail::expect_with(|_jail| {
        let config = load_in_jail()?.stack_config().unwrap();

        assert_eq!(config.http_timeout, Duration::from_millis(4000));
        assert_eq!(config.probe_timeout, Duration::from_millis(2000));
        assert_eq!(config.tick_interval, Duration::from_millis(5000));
        assert!(!config.ribbons);
        assert!(config.immediate_push);
        assert!(!config.insecure_tls);
        assert_eq!(config.sonarr.base_url(), None);
        Ok(())
    });
}

#[test]
fn env_overrides_file() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "plexstax.toml",
            r#"
                sonarr_url = "sonarr.lan:8989"
                sonarr_api_key = "from-file"
                tick_interval_ms = 1000
            "#,
        )?;
        jail.set_env("SONARR_API_KEY", "from-env");
        jail.set_env("TICK_INTERVAL_MS", "2500");

        let config = load_in_jail()?.stack_config().unwrap();

        assert_eq!(config.sonarr.keyed(), Some(("http://sonarr.lan:8989", "from-env")));
        assert_eq!(config.tick_interval, Duration::from_millis(2500));
        Ok(())
    });
}

#[test]
fn blank_values_are_unset() {
    Jail::expect_with(|jail| {
        jail.set_env("RADARR_URL", "   ");
        jail.set_env("RADARR_API_KEY", "");
        jail.set_env("HTTP_TIMEOUT_MS", "");

        let config = load_in_jail()?.stack_config().unwrap();

        assert_eq!(config.radarr.base_url(), None);
        assert_eq!(config.radarr.api_key(), None);
        assert_eq!(config.http_timeout, Duration::from_millis(4000));
        Ok(())
    });
}

#[test]
fn legacy_overseer_spelling_is_honoured() {
    Jail::expect_with(|jail| {
        jail.set_env("OVERSEER_URL", "http://requests.lan:5055/");
        jail.set_env("OVERSEER_API_KEY", "legacy");

        let config = load_in_jail()?.stack_config().unwrap();

        assert_eq!(config.overseerr.keyed(), Some(("http://requests.lan:5055", "legacy")));
        Ok(())
    });
}

#[test]
fn current_overseerr_spelling_wins_over_legacy() {
    Jail::expect_with(|jail| {
        jail.set_env("OVERSEERR_URL", "http://new:5055");
        jail.set_env("OVERSEER_URL", "http://old:5055");
        jail.set_env("OVERSEERR_API_KEY", "");
        jail.set_env("OVERSEER_API_KEY", "fallback");

        let config = load_in_jail()?.stack_config().unwrap();

        assert_eq!(config.overseerr.keyed(), Some(("http://new:5055", "fallback")));
        Ok(())
    });
}

#[test]
fn numeric_looking_keys_stay_text() {
    Jail::expect_with(|jail| {
        jail.set_env("TAUTULLI_URL", "tautulli:8181");
        jail.set_env("TAUTULLI_API_KEY", "1234567890");

        let config = load_in_jail()?.stack_config().unwrap();

        assert_eq!(config.tautulli.api_key(), Some("1234567890"));
        Ok(())
    });
}

#[test]
fn nzbget_basic_auth_and_flags() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "plexstax.toml",
            r#"
                nzbget_url = "nzbget:6789"
                nzbget_user = "nzb"
                ribbons = true
            "#,
        )?;
        jail.set_env("NZBGET_PASS", "pw");
        jail.set_env("IMMEDIATE_PUSH", "false");
        jail.set_env("INSECURE_TLS", "1");

        let config = load_in_jail()?.stack_config().unwrap();

        assert_eq!(config.nzbget.base_url(), Some("http://nzbget:6789"));
        assert_eq!(config.nzbget.username(), Some("nzb"));
        assert_eq!(config.nzbget.password(), Some("pw"));
        assert!(config.ribbons);
        assert!(!config.immediate_push);
        assert!(config.insecure_tls);
        Ok(())
    });
}

#[test]
fn zero_timeout_is_a_validation_error() {
    Jail::expect_with(|jail| {
        jail.set_env("PROBE_TIMEOUT_MS", "0");

        let err = load_in_jail()?.stack_config().unwrap_err();

        assert!(
            matches!(err, ConfigError::Validation { ref field, .. } if field == "PROBE_TIMEOUT_MS"),
            "got: {err:?}"
        );
        Ok(())
    });
}

#[test]
fn bind_from_env() {
    Jail::expect_with(|jail| {
        jail.set_env("BIND", "0.0.0.0:8080");

        let settings = load_in_jail()?;

        assert_eq!(settings.bind_addr(None).unwrap().to_string(), "0.0.0.0:8080");
        Ok(())
    });
}
