use std::{
    collections::HashMap,
    env,
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::error::CliError;
use gdl_common::directories::ProjectDirs;
use gdl_extractors::{
    auth::{Error as AuthError, SessionCookies},
    extractor_config::{DEFAULT_SOURCES, SourceConfig, serialize::read_source_cfg_file},
};
use log::{debug, warn};
use reqwest::cookie::Jar;

use super::AVAILABLE_SOURCES;

/// Builds a cookie jar for `source`, seeded with the cached session if there is one.
///
/// A missing or unreadable cache only means the public host will be used.
pub async fn session_jar(source: &SourceConfig) -> Result<Arc<Jar>, CliError> {
    let jar = Arc::new(Jar::default());

    match SessionCookies::read_cache(&source.name).await {
        Ok(session) => {
            debug!("Using cached session for {}", source.name);
            session.seed(jar.as_ref(), &source.public_url()?);
        }
        Err(AuthError::MissingCache { .. }) => {
            debug!("Running without a session for {}", source.name);
        }
        Err(e) => {
            warn!(
                "Failed to read session cache for {}: {}. Proceeding without a session.",
                source.name, e
            );
        }
    }

    Ok(jar)
}

fn source_cfg_path() -> Option<PathBuf> {
    match env::var("GDL_SOURCE_CFG") {
        Ok(path) => Some(PathBuf::from(path)),
        Err(_) => ProjectDirs::from("com", "FerrahWolfeh", "gallery-downloader")
            .map(|cdir| cdir.config_dir().to_path_buf()),
    }
}

pub fn get_sources<'a>() -> &'a HashMap<String, SourceConfig> {
    AVAILABLE_SOURCES.get_or_init(|| {
        let mut sources = DEFAULT_SOURCES.clone();

        let Some(cfg_path) = source_cfg_path() else {
            warn!("No config directory available, using built-in sources only");
            return sources;
        };

        if let Err(e) = std::fs::create_dir_all(&cfg_path) {
            warn!("Failed to create {}: {e}", cfg_path.display());
            return sources;
        }

        let cfg_path = cfg_path.join(Path::new("sources.toml"));

        if let Err(e) = read_source_cfg_file(&cfg_path, &mut sources) {
            warn!("Ignoring {}: {e}", cfg_path.display());
        }

        sources
    })
}

pub fn validate_source(input: &str) -> Result<SourceConfig, String> {
    let sources = get_sources();

    sources.get(input).map_or_else(
        || {
            Err(format!(
                "Invalid source: {}. Allowed sources are: {:?}",
                input,
                sources.keys()
            ))
        },
        |source| Ok(source.clone()),
    )
}
