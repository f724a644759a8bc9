use std::io;

use gdl_extractors::{error::ExtractorError, extractor_config::ConfigError};
use thiserror::Error;

#[allow(clippy::enum_variant_names)]
#[derive(Error, Debug)]
pub enum CliError {
    #[error("Failed to access session cache: {source}")]
    SessionCacheFail {
        #[from]
        source: gdl_extractors::auth::Error,
    },

    #[error("Extractor failed: {source}")]
    ExtractorFail {
        #[from]
        source: ExtractorError,
    },

    #[error("Failed to read source config: {source}")]
    SourceConfigFail {
        #[from]
        source: ConfigError,
    },

    #[error("Failed to access file: {source}")]
    IOError {
        #[from]
        source: io::Error,
    },

    #[error("Banned by the server for {}s. Use --wait-on-ban to wait it out", .retry_after.as_secs())]
    Banned { retry_after: std::time::Duration },
}
