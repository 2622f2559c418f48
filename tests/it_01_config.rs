use invite_bot::Config;
use invite_models::NetworkMode;
use std::path::Path;

#[test]
fn shipped_config_parses_onto_defaults() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("configs/default.toml");
    let config: Config = Config::figment(Some(&path)).extract().unwrap();

    assert_eq!(config.database.name, "invite_bot");
    assert_eq!(config.database.port, 5432);
    assert_eq!(config.telegram.poll_timeout_secs, 30);
    assert_eq!(config.pacing.direct_message_ms, 50);
    assert_eq!(config.broadcast.network_mode, NetworkMode::All);
    assert!(config.broadcast.to_target_chat_members);
}

#[test]
fn missing_config_file_is_an_error() {
    let err = Config::load(Some(Path::new("/nonexistent/invite-bot.toml"))).unwrap_err();
    assert_eq!(err.kind(), "config");
}
