use super::*;
use order_watcher::plugins::{Delivery, build_notifier, build_sources};
use std::fs;
use std::path::Path;

#[test]
fn test_shipped_configuration_is_valid() -> anyhow::Result<()> {
    let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("config");
    let config = AppConfig::load_from(&dir, None)?;

    let names: Vec<&str> = config.sources.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["freelancespace.ru", "fl.ru"]);
    assert_eq!(config.sources[0].kind, SourceKind::PaginatedApi);
    assert_eq!(config.sources[1].kind, SourceKind::IndexDetail);
    assert_eq!(config.sources[1].id_prefix.as_deref(), Some("fl_"));
    assert!(config.scheduler.interval_secs > 0);

    // No credentials are shipped, so only a dry run can be built from it.
    assert!(config.validate_delivery().is_err());
    assert!(build_notifier(&config, Delivery::DryRun { json: false }).is_ok());
    assert_eq!(build_sources(&config)?.len(), 2);

    Ok(())
}

#[test]
fn test_local_file_overrides_default() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let shipped = Path::new(env!("CARGO_MANIFEST_DIR")).join("config/default.toml");
    fs::copy(shipped, dir.path().join("default.toml"))?;
    fs::write(
        dir.path().join("local.toml"),
        r#"
[telegram]
bot_token = "999:xyz"
chat_id = "42"

[scheduler]
interval_secs = 15
"#,
    )?;

    let config = AppConfig::load_from(dir.path(), None)?;
    assert_eq!(config.scheduler.interval_secs, 15);
    assert_eq!(config.telegram.chat_id, "42");
    assert!(config.validate_delivery().is_ok());
    assert_eq!(
        config.telegram.send_message_url(),
        "https://api.telegram.org/bot999:xyz/sendMessage"
    );

    Ok(())
}

#[test]
fn test_explicit_file_with_bad_limit_is_rejected() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let shipped = Path::new(env!("CARGO_MANIFEST_DIR")).join("config/default.toml");
    fs::copy(shipped, dir.path().join("default.toml"))?;

    let explicit = dir.path().join("broken.toml");
    fs::write(&explicit, "[scraper]\nmax_pages = 0\n")?;

    let error = AppConfig::load_from(dir.path(), Some(&explicit)).unwrap_err();
    assert!(error.to_string().contains("max_pages"));

    Ok(())
}

#[test]
fn test_test_config_is_valid() {
    let config = get_test_config("http://127.0.0.1:9", vec![paginated_source("http://127.0.0.1:9")]);
    assert!(config.validate().is_ok());
}
