//! Repository selection and process configuration from the environment.

mod support;

use std::io::Write;
use std::str::FromStr;

use neo_planner::config::AppConfig;
use neo_planner::db::{
    LessonPlanRepository, RepositoryBuilder, RepositoryConfig, RepositoryError,
    RepositoryFactory, RepositoryType,
};

#[test]
fn test_repository_type_from_str_is_case_insensitive() {
    assert_eq!(RepositoryType::from_str("POSTGRES").unwrap(), RepositoryType::Postgres);
    assert_eq!(RepositoryType::from_str("LOCAL").unwrap(), RepositoryType::Local);
    assert_eq!(RepositoryType::from_str("memory").unwrap(), RepositoryType::Local);

    let err = RepositoryType::from_str("invalid").unwrap_err();
    assert!(err.contains("Unknown repository type"));
}

#[test]
fn test_repository_type_from_env_default() {
    support::with_scoped_env(
        &[
            ("REPOSITORY_TYPE", None),
            ("DATABASE_URL", None),
            ("PG_DATABASE_URL", None),
        ],
        || assert_eq!(RepositoryType::from_env(), RepositoryType::Local),
    );
}

#[test]
fn test_repository_type_from_env_with_database_url() {
    support::with_scoped_env(
        &[
            ("REPOSITORY_TYPE", None),
            ("DATABASE_URL", Some("postgres://localhost/test")),
        ],
        || assert_eq!(RepositoryType::from_env(), RepositoryType::Postgres),
    );
}

#[test]
fn test_repository_type_from_env_explicit_wins_over_url() {
    support::with_scoped_env(
        &[
            ("REPOSITORY_TYPE", Some("local")),
            ("DATABASE_URL", Some("postgres://localhost/test")),
        ],
        || assert_eq!(RepositoryType::from_env(), RepositoryType::Local),
    );
}

#[test]
fn test_repository_type_from_env_invalid_defaults_to_local() {
    support::with_scoped_env(&[("REPOSITORY_TYPE", Some("invalid"))], || {
        assert_eq!(RepositoryType::from_env(), RepositoryType::Local)
    });
}

#[tokio::test]
async fn test_create_local_via_factory() {
    let repo = RepositoryFactory::create(RepositoryType::Local, None)
        .await
        .ok()
        .unwrap();
    assert!(repo.health_check().await.unwrap());
}

#[cfg(not(feature = "postgres-repo"))]
#[tokio::test]
async fn test_create_postgres_without_feature_fails() {
    let err = RepositoryFactory::create(RepositoryType::Postgres, None)
        .await
        .err()
        .unwrap();
    assert!(err.to_string().contains("feature not enabled"));
}

#[cfg(feature = "postgres-repo")]
#[tokio::test]
async fn test_create_postgres_without_config_fails() {
    let err = RepositoryFactory::create(RepositoryType::Postgres, None)
        .await
        .err()
        .unwrap();
    assert!(err.to_string().contains("requires PostgresConfig"));
}

#[tokio::test]
async fn test_factory_from_config_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[repository]\ntype = \"local\"").unwrap();

    let repo = RepositoryFactory::from_config_file(file.path())
        .await
        .ok()
        .unwrap();
    assert!(repo.health_check().await.unwrap());
}

#[tokio::test]
async fn test_factory_missing_config_file() {
    let err = RepositoryFactory::from_config_file("/nonexistent/repository.toml")
        .await
        .err()
        .unwrap();
    assert!(matches!(err, RepositoryError::ConfigurationError { .. }));
}

#[test]
fn test_config_path_from_env() {
    support::with_scoped_env(
        &[("NEO_REPOSITORY_CONFIG", Some("/etc/neo/repository.toml"))],
        || {
            assert_eq!(
                RepositoryConfig::locate().unwrap().to_str(),
                Some("/etc/neo/repository.toml")
            );
        },
    );
}

#[test]
fn test_builder_rejects_bad_config_type() {
    let config = RepositoryConfig::from_toml_str("[repository]\ntype = \"sqlite\"\n").unwrap();
    assert!(RepositoryBuilder::new().from_config(&config).is_err());
}

#[test]
fn test_app_config_from_env() {
    support::with_scoped_env(
        &[
            ("HOST", Some("127.0.0.1")),
            ("PORT", Some("9090")),
            ("GEMINI_API_KEY", None),
            ("GOOGLE_API_KEY", Some("google-key")),
            ("MAPS_API_KEY", None),
            ("NEO_LOCATION", Some("Kerala")),
            ("NEO_DEFAULT_GRADES", Some("3,4")),
        ],
        || {
            let config = AppConfig::from_env();
            assert_eq!(config.bind_addr().unwrap().to_string(), "127.0.0.1:9090");
            assert_eq!(config.llm.api_key.as_deref(), Some("google-key"));
            assert_eq!(config.maps_api_key, None);
            assert_eq!(config.fallback_location, "Kerala");
            assert_eq!(config.default_grades, vec!["3", "4"]);
        },
    );
}
