use super::*;
use tempfile::tempdir;

#[tokio::test]
async fn test_init_creates_default_config() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("dora-metrics.toml");
    let path_str = path.to_string_lossy().into_owned();

    execute(ConfigCommands::Init {
        path: Some(path_str.clone()),
    })
    .await
    .unwrap();

    assert!(path.exists());
    assert_eq!(load_config(Some(path_str.as_str())).unwrap(), MetricsConfig::default());
}

#[tokio::test]
async fn test_init_refuses_to_overwrite() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("dora-metrics.toml");
    std::fs::write(&path, "schemaVersion = 1\n").unwrap();

    let result = execute(ConfigCommands::Init {
        path: Some(path.to_string_lossy().into_owned()),
    })
    .await;

    assert!(matches!(result, Err(CliError::ConfigError(_))));
}

#[tokio::test]
async fn test_validate_rejects_unsupported_schema() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("dora-metrics.toml");
    std::fs::write(&path, "schemaVersion = 2\n").unwrap();

    let result = execute(ConfigCommands::Validate {
        path: Some(path.to_string_lossy().into_owned()),
    })
    .await;

    assert!(matches!(result, Err(CliError::ConfigError(_))));
}

#[tokio::test]
async fn test_validate_accepts_valid_config() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("dora-metrics.toml");
    std::fs::write(
        &path,
        "schemaVersion = 1\n[filters]\nbaseBranchPatterns = [\"^main$\"]\n",
    )
    .unwrap();

    let result = execute(ConfigCommands::Validate {
        path: Some(path.to_string_lossy().into_owned()),
    })
    .await;

    assert!(result.is_ok());
}
