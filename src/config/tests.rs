use super::*;

#[test]
fn defaults_are_sensible() {
    let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");

    assert_eq!(settings.server.bind.port(), DEFAULT_PORT);
    assert_eq!(settings.database.url, DEFAULT_DATABASE_URL);
    assert_eq!(settings.feed.posts_per_page.get(), DEFAULT_POSTS_PER_PAGE);
    assert_eq!(
        settings.cache.home_ttl,
        Duration::from_secs(DEFAULT_HOME_CACHE_TTL_SECS)
    );
    assert!(settings.cache.is_enabled());
    assert_eq!(settings.logging.level, LevelFilter::INFO);
    assert_eq!(settings.logging.format, LogFormat::Compact);
}

#[test]
fn cli_overrides_take_highest_precedence() {
    let mut raw = RawSettings::default();
    raw.server.port = Some(4000);
    raw.logging.level = Some("info".to_string());

    let overrides = ServeOverrides {
        bind: Some("0.0.0.0:4321".parse().expect("valid addr")),
        log_level: Some("debug".to_string()),
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.server.bind.port(), 4321);
    assert_eq!(settings.logging.level, LevelFilter::DEBUG);
}

#[test]
fn cli_json_logging_enforces_format() {
    let mut raw = RawSettings::default();
    let overrides = ServeOverrides {
        log_json: true,
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert!(matches!(settings.logging.format, LogFormat::Json));
}

#[test]
fn zero_cache_ttl_disables_the_cache() {
    let mut raw = RawSettings::default();
    raw.cache.home_ttl_seconds = Some(0);

    let settings = Settings::from_raw(raw).expect("valid settings");
    assert!(!settings.cache.is_enabled());
}

#[test]
fn zero_posts_per_page_is_rejected() {
    let mut raw = RawSettings::default();
    raw.feed.posts_per_page = Some(0);

    let err = Settings::from_raw(raw).expect_err("must be rejected");
    assert!(matches!(
        err,
        ConfigError::Invalid {
            field: "feed.posts_per_page",
            ..
        }
    ));
}

#[test]
fn invalid_host_is_rejected() {
    let mut raw = RawSettings::default();
    raw.server.host = Some("not-an-ip".to_string());

    assert!(Settings::from_raw(raw).is_err());
}
