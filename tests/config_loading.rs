//! Config loading: TOML knobs with full defaults, env path override, and the
//! "ENV" api-key indirection. Tests that touch process env are serialized.

use std::{env, fs};

use serial_test::serial;

use fx_lens::config::ai::AiConfig;
use fx_lens::config::app::{AppConfig, ENV_CONFIG_PATH};

fn temp_path(name: &str) -> std::path::PathBuf {
    env::temp_dir().join(format!("fx_lens_test_{name}_{}", std::process::id()))
}

#[test]
#[serial]
fn app_config_falls_back_to_defaults_when_file_is_absent() {
    env::set_var(ENV_CONFIG_PATH, "/definitely/not/here.toml");
    let cfg = AppConfig::load();
    env::remove_var(ENV_CONFIG_PATH);

    assert_eq!(cfg.global_query, "forex market news");
    assert_eq!(cfg.global_count, 30);
    assert_eq!(cfg.pair_count, 20);
    assert_eq!(cfg.calendar_days_ahead, 4);
}

#[test]
#[serial]
fn app_config_env_path_override_is_honored() {
    let path = temp_path("app_override");
    fs::write(&path, "global_query = \"gbp macro news\"\nglobal_count = 12\n").unwrap();

    env::set_var(ENV_CONFIG_PATH, &path);
    let cfg = AppConfig::load();
    env::remove_var(ENV_CONFIG_PATH);
    let _ = fs::remove_file(&path);

    assert_eq!(cfg.global_query, "gbp macro news");
    assert_eq!(cfg.global_count, 12);
    // untouched keys keep defaults
    assert_eq!(cfg.market, "en-US");
}

#[test]
fn ai_config_reads_literal_api_key() {
    let path = temp_path("ai_literal");
    fs::write(
        &path,
        r#"{"enabled": true, "provider": "OpenAI", "api_key": "sk-test", "parse_mode": "tolerant"}"#,
    )
    .unwrap();

    let cfg = AiConfig::load_from_file(&path).unwrap();
    let _ = fs::remove_file(&path);

    assert!(cfg.enabled);
    assert_eq!(cfg.provider, "openai", "provider is normalized to lowercase");
    assert_eq!(cfg.api_key, "sk-test");
    // model falls back to the default when absent
    assert_eq!(cfg.model, "gpt-4.1-mini");
}

#[test]
#[serial]
fn ai_config_env_indirection_resolves_the_key() {
    let path = temp_path("ai_env");
    fs::write(
        &path,
        r#"{"enabled": true, "provider": "openai", "api_key": "ENV"}"#,
    )
    .unwrap();

    env::set_var("OPENAI_API_KEY", "sk-from-env");
    let cfg = AiConfig::load_from_file(&path).unwrap();
    env::remove_var("OPENAI_API_KEY");
    let _ = fs::remove_file(&path);

    assert_eq!(cfg.api_key, "sk-from-env");
}

#[test]
#[serial]
fn ai_config_env_indirection_fails_without_the_variable() {
    let path = temp_path("ai_env_missing");
    fs::write(
        &path,
        r#"{"enabled": true, "provider": "openai", "api_key": "ENV"}"#,
    )
    .unwrap();

    env::remove_var("OPENAI_API_KEY");
    let res = AiConfig::load_from_file(&path);
    let _ = fs::remove_file(&path);

    assert!(res.is_err());
}
