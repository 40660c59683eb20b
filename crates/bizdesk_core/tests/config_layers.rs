use bizdesk_core::config::{BizConfig, ConfigError};
use figment::Jail;
use std::path::{Path, PathBuf};

#[test]
fn file_then_env_override_defaults() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "bizdesk.toml",
            r#"
                [server]
                bind = "127.0.0.1:7000"

                [database]
                path = "data/biz.db"
            "#,
        )?;
        jail.set_env("BIZDESK_SERVER__BIND", "0.0.0.0:9000");
        jail.set_env("BIZDESK_LOGGING__LEVEL", "debug");

        let config = BizConfig::load(None).map_err(|err| err.to_string())?;
        assert_eq!(config.server.bind, "0.0.0.0:9000");
        assert_eq!(config.server.max_body_bytes, 1024 * 1024);
        assert_eq!(config.database.path, PathBuf::from("data/biz.db"));
        assert_eq!(config.logging.level, "debug");
        Ok(())
    });
}

#[test]
fn explicit_config_path_must_exist() {
    Jail::expect_with(|_| {
        let err = BizConfig::load(Some(Path::new("missing.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::MissingFile(_)));
        Ok(())
    });
}

#[test]
fn explicit_config_path_replaces_default_file() {
    Jail::expect_with(|jail| {
        jail.create_file("bizdesk.toml", "[server]\nbind = \"127.0.0.1:7000\"\n")?;
        jail.create_file("prod.toml", "[server]\nbind = \"127.0.0.1:7100\"\n")?;

        let config = BizConfig::load(Some(Path::new("prod.toml"))).map_err(|err| err.to_string())?;
        assert_eq!(config.server.bind, "127.0.0.1:7100");
        Ok(())
    });
}

#[test]
fn invalid_values_are_reported_by_field() {
    Jail::expect_with(|jail| {
        jail.set_env("BIZDESK_SERVER__MAX_BODY_BYTES", "0");
        let err = BizConfig::load(None).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                field: "server.max_body_bytes",
                ..
            }
        ));

        jail.set_env("BIZDESK_SERVER__MAX_BODY_BYTES", "2048");
        jail.set_env("BIZDESK_LOGGING__LEVEL", "chatty");
        let err = BizConfig::load(None).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                field: "logging.level",
                ..
            }
        ));
        Ok(())
    });
}
