// src/config.rs
use crate::constants::{
    DEFAULT_BODY_PREFIX, DEFAULT_CREATE_CONCURRENCY, DEFAULT_FETCH_TIMEOUT_SECS,
    DEFAULT_MAX_MEDIA_BYTES, DEFAULT_THUMBNAIL_PREFIX, EMBED_HOSTS, MAX_EXTRACT_WORKERS,
};
use crate::error::AppError;
use crate::media::{HostRewrite, MediaConfig};
use crate::notion::{CollectionDatabases, PropertyNames};
use crate::pipeline::PipelineSettings;
use crate::storage::{PublicUrlBase, S3Settings};
use crate::types::{ApiKey, Collection, ContentType, DatabaseId, StoragePrefix, ValidatedUrl};
use clap::Parser;
use log::LevelFilter;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Parsed command-line input.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CommandLineInput {
    /// CSV file with `URLs` and `Categories` columns
    pub input: PathBuf,

    /// Content type of every row: news, voice or activity (anything else is generic)
    pub mode: Option<String>,
}

/// Resolved migration configuration, validated and ready to build every component.
#[derive(Debug, Clone)]
pub struct MigrationConfig {
    pub input: PathBuf,
    pub content_type: ContentType,
    pub api_key: ApiKey,
    pub databases: CollectionDatabases,
    pub properties: PropertyNames,
    pub storage: S3Settings,
    pub body_prefix: StoragePrefix,
    pub thumbnail_prefix: StoragePrefix,
    pub public_base: PublicUrlBase,
    pub host_rewrites: Vec<HostRewrite>,
    pub extract_workers: usize,
    pub create_concurrency: usize,
    pub fetch_timeout: Duration,
    pub max_media_bytes: u64,
}

impl MigrationConfig {
    /// Resolves a complete configuration from CLI input and the process environment.
    pub fn resolve(cli: CommandLineInput) -> Result<Self, AppError> {
        Self::resolve_with(cli, |key| std::env::var(key).ok())
    }

    /// Resolves against an arbitrary variable lookup. Blank values count as unset.
    pub fn resolve_with<F>(cli: CommandLineInput, lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(lookup);

        let api_key = ApiKey::new(env.required("NOTION_TOKEN")?)?;

        let databases = collection_databases(&env)?;
        if databases.is_empty() {
            return Err(AppError::MissingConfiguration(
                "at least one of NOTION_NEWS_DATABASE_ID, NOTION_FIELDWORK_DATABASE_ID, \
                 NOTION_ACTIVITY_DATABASE_ID or NOTION_VOICE_DATABASE_ID must be set"
                    .to_string(),
            ));
        }

        let storage = S3Settings {
            bucket: env.required("STORAGE_BUCKET")?,
            region: env.required("STORAGE_REGION")?,
            endpoint: env.optional("STORAGE_ENDPOINT"),
            access_key_id: env.required("STORAGE_ACCESS_KEY_ID")?,
            secret_access_key: env.required("STORAGE_SECRET_ACCESS_KEY")?,
        };

        let cdn_base = ValidatedUrl::parse(&env.required("CDN_BASE_URL")?)?;

        let default_workers = num_cpus::get().clamp(4, 16);
        let extract_workers = env
            .parsed("MIGRATE_CONCURRENCY", default_workers)?
            .clamp(1, MAX_EXTRACT_WORKERS);

        Ok(Self {
            input: cli.input,
            content_type: ContentType::from_mode(cli.mode.as_deref()),
            api_key,
            databases,
            properties: property_names(&env),
            storage,
            body_prefix: StoragePrefix::new(env.or("STORAGE_BODY_PREFIX", DEFAULT_BODY_PREFIX))?,
            thumbnail_prefix: StoragePrefix::new(
                env.or("STORAGE_THUMBNAIL_PREFIX", DEFAULT_THUMBNAIL_PREFIX),
            )?,
            public_base: PublicUrlBase::new(cdn_base.as_str()),
            host_rewrites: host_rewrites(&env)?,
            extract_workers,
            create_concurrency: env
                .parsed("MIGRATE_CREATE_CONCURRENCY", DEFAULT_CREATE_CONCURRENCY)?
                .max(1),
            fetch_timeout: Duration::from_secs(
                env.parsed("MIGRATE_FETCH_TIMEOUT_SECS", DEFAULT_FETCH_TIMEOUT_SECS)?,
            ),
            max_media_bytes: env.parsed("MIGRATE_MAX_MEDIA_BYTES", DEFAULT_MAX_MEDIA_BYTES)?,
        })
    }

    pub fn media_config(&self) -> MediaConfig {
        MediaConfig {
            body_prefix: self.body_prefix.clone(),
            thumbnail_prefix: self.thumbnail_prefix.clone(),
            public_base: self.public_base.clone(),
            embed_hosts: EMBED_HOSTS.iter().map(|h| h.to_string()).collect(),
            host_rewrites: self.host_rewrites.clone(),
        }
    }

    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            extract_workers: self.extract_workers,
            create_concurrency: self.create_concurrency,
        }
    }
}

/// Log level from `MIGRATE_LOG_LEVEL`, `info` when unset or unrecognized.
pub fn log_level_from_env() -> LevelFilter {
    std::env::var("MIGRATE_LOG_LEVEL")
        .ok()
        .and_then(|level| LevelFilter::from_str(level.trim()).ok())
        .unwrap_or(LevelFilter::Info)
}

struct Env<F>(F);

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn required(&self, key: &str) -> Result<String, AppError> {
        self.optional(key).ok_or_else(|| {
            AppError::MissingConfiguration(format!("{} environment variable not set", key))
        })
    }

    fn or(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    fn parsed<T>(&self, key: &str, default: T) -> Result<T, AppError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.optional(key) {
            None => Ok(default),
            Some(raw) => raw.parse().map_err(|e: T::Err| AppError::InvalidConfiguration {
                key: key.to_string(),
                reason: format!("'{}': {}", raw, e),
            }),
        }
    }
}

fn collection_databases<F>(env: &Env<F>) -> Result<CollectionDatabases, AppError>
where
    F: Fn(&str) -> Option<String>,
{
    let sources = [
        (Collection::News, "NOTION_NEWS_DATABASE_ID"),
        (Collection::Fieldwork, "NOTION_FIELDWORK_DATABASE_ID"),
        (Collection::Activity, "NOTION_ACTIVITY_DATABASE_ID"),
        (Collection::Voice, "NOTION_VOICE_DATABASE_ID"),
    ];

    let mut databases = CollectionDatabases::new();
    for (collection, key) in sources {
        if let Some(raw) = env.optional(key) {
            databases = databases.with(collection, DatabaseId::parse(&raw)?);
        }
    }
    Ok(databases)
}

fn property_names<F>(env: &Env<F>) -> PropertyNames
where
    F: Fn(&str) -> Option<String>,
{
    let defaults = PropertyNames::default();
    PropertyNames {
        title: env.or("NOTION_TITLE_PROPERTY", &defaults.title),
        slug: env.or("NOTION_SLUG_PROPERTY", &defaults.slug),
        tags: env.or("NOTION_TAGS_PROPERTY", &defaults.tags),
        published: env.or("NOTION_PUBLISHED_PROPERTY", &defaults.published),
        date: env.or("NOTION_DATE_PROPERTY", &defaults.date),
        thumbnail: env.or("NOTION_THUMBNAIL_PROPERTY", &defaults.thumbnail),
    }
}

fn host_rewrites<F>(env: &Env<F>) -> Result<Vec<HostRewrite>, AppError>
where
    F: Fn(&str) -> Option<String>,
{
    match (env.optional("LEGACY_MEDIA_HOST"), env.optional("CANONICAL_MEDIA_HOST")) {
        (Some(from), Some(to)) => Ok(vec![HostRewrite { from, to }]),
        (None, None) => Ok(Vec::new()),
        (Some(_), None) => Err(AppError::MissingConfiguration(
            "CANONICAL_MEDIA_HOST must be set together with LEGACY_MEDIA_HOST".to_string(),
        )),
        (None, Some(_)) => Err(AppError::MissingConfiguration(
            "LEGACY_MEDIA_HOST must be set together with CANONICAL_MEDIA_HOST".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn base_env() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("NOTION_TOKEN", "secret_0123456789abcdefghij"),
            ("NOTION_NEWS_DATABASE_ID", "0123456789abcdef0123456789abcdef"),
            ("STORAGE_BUCKET", "media"),
            ("STORAGE_REGION", "nyc3"),
            ("STORAGE_ACCESS_KEY_ID", "AKIA"),
            ("STORAGE_SECRET_ACCESS_KEY", "secret"),
            ("CDN_BASE_URL", "https://cdn.example.org/"),
        ])
    }

    fn cli(mode: Option<&str>) -> CommandLineInput {
        CommandLineInput {
            input: PathBuf::from("articles.csv"),
            mode: mode.map(str::to_string),
        }
    }

    fn resolve(env: &HashMap<&'static str, &'static str>, mode: Option<&str>) -> Result<MigrationConfig, AppError> {
        MigrationConfig::resolve_with(cli(mode), |key| env.get(key).map(|v| v.to_string()))
    }

    #[test]
    fn resolves_with_defaults() {
        let config = resolve(&base_env(), Some("news")).unwrap();

        assert_eq!(config.content_type, ContentType::News);
        assert_eq!(config.body_prefix.as_str(), DEFAULT_BODY_PREFIX);
        assert_eq!(config.thumbnail_prefix.as_str(), DEFAULT_THUMBNAIL_PREFIX);
        assert_eq!(config.create_concurrency, DEFAULT_CREATE_CONCURRENCY);
        assert_eq!(config.fetch_timeout, Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS));
        assert!((4..=16).contains(&config.extract_workers));
        assert!(config.host_rewrites.is_empty());
        assert!(config.databases.get(Collection::News).is_some());
        assert_eq!(config.public_base.url_for("k.png"), "https://cdn.example.org/k.png");
        assert_eq!(config.properties, PropertyNames::default());
    }

    #[test]
    fn unknown_mode_is_generic() {
        let config = resolve(&base_env(), Some("podcast")).unwrap();
        assert_eq!(config.content_type, ContentType::Generic);
        let config = resolve(&base_env(), None).unwrap();
        assert_eq!(config.content_type, ContentType::Generic);
    }

    #[test]
    fn missing_token_is_a_configuration_error() {
        let mut env = base_env();
        env.remove("NOTION_TOKEN");
        assert!(matches!(
            resolve(&env, None),
            Err(AppError::MissingConfiguration(msg)) if msg.contains("NOTION_TOKEN")
        ));
    }

    #[test]
    fn a_collection_database_is_required() {
        let mut env = base_env();
        env.remove("NOTION_NEWS_DATABASE_ID");
        assert!(matches!(resolve(&env, None), Err(AppError::MissingConfiguration(_))));
    }

    #[test]
    fn numeric_overrides_are_validated() {
        let mut env = base_env();
        env.insert("MIGRATE_CONCURRENCY", "500");
        env.insert("MIGRATE_CREATE_CONCURRENCY", "0");
        let config = resolve(&env, None).unwrap();
        assert_eq!(config.extract_workers, MAX_EXTRACT_WORKERS);
        assert_eq!(config.create_concurrency, 1);

        env.insert("MIGRATE_FETCH_TIMEOUT_SECS", "soon");
        assert!(matches!(
            resolve(&env, None),
            Err(AppError::InvalidConfiguration { key, .. }) if key == "MIGRATE_FETCH_TIMEOUT_SECS"
        ));
    }

    #[test]
    fn host_rewrite_needs_both_hosts() {
        let mut env = base_env();
        env.insert("LEGACY_MEDIA_HOST", "old.example.org");
        assert!(resolve(&env, None).is_err());

        env.insert("CANONICAL_MEDIA_HOST", "www.example.org");
        let config = resolve(&env, None).unwrap();
        assert_eq!(
            config.host_rewrites,
            vec![HostRewrite {
                from: "old.example.org".to_string(),
                to: "www.example.org".to_string(),
            }]
        );
        assert_eq!(config.media_config().embed_hosts.len(), EMBED_HOSTS.len());
    }
}
