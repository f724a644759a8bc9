//! Common data structs and helpers shared by the gallery extractors and their frontends.
use std::{
    env,
    fs::create_dir_all,
    io,
    path::{Path, PathBuf},
};

// Public Exports
pub use bincode;
pub use bytes;
pub use directories;
pub use log;
pub use reqwest;
pub use serde;
pub use tokio;

use directories::ProjectDirs;
use log::debug;

pub mod gallery;

/// Returns a `PathBuf` pointing to the directory where session caches are stored.
///
/// This is XDG-compliant and saves cache files to
/// `$XDG_CONFIG_HOME/gallery-downloader/` on Linux or
/// `%APPDATA%/FerrahWolfeh/gallery-downloader/` on Windows
///
/// Or you can set the env var `GDL_CACHE_DIR` to point it to a custom location.
pub fn cache_dir() -> Result<PathBuf, io::Error> {
    let cfg_path = match env::var("GDL_CACHE_DIR") {
        Ok(path) => path,
        Err(_) => ProjectDirs::from("com", "FerrahWolfeh", "gallery-downloader")
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no home directory"))?
            .config_dir()
            .to_string_lossy()
            .to_string(),
    };

    let cfold = Path::new(&cfg_path);

    if !cfold.exists() {
        debug!("Creating cache dir at {}", cfold.display());
        create_dir_all(cfold)?;
    }

    Ok(cfold.to_path_buf())
}
