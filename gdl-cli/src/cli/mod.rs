use gdl_extractors::extractor_config::SourceConfig;
use once_cell::sync::OnceCell;
use std::collections::HashMap;

use clap::{Parser, Subcommand};

use self::{
    commands::{image::ImageFetch, login::Login, search::GallerySearch},
    extra::validate_source,
};

pub mod commands;
pub(crate) mod extra;

pub static AVAILABLE_SOURCES: OnceCell<HashMap<String, SourceConfig>> = OnceCell::new();

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Search the gallery index and print the results page by page
    Search(GallerySearch),
    /// Download a single image, cropping it if the URL ends in `#left,top,right,bottom`
    Image(ImageFetch),
    /// Store session cookies so later runs use the authenticated host
    Login(Login),
}

#[derive(Parser, Debug)]
#[clap(name = "Gallery Downloader", author, version, about, long_about = None)]
pub struct Cli {
    #[clap(subcommand)]
    pub mode: Commands,

    /// Specify which gallery index to use
    ///
    /// Extra sources can be declared in `sources.toml` inside the config dir.
    #[clap(short, long, ignore_case = true, default_value_t = SourceConfig::default(), global = true, value_parser = validate_source)]
    pub source: SourceConfig,

    /// Print all available sources and exit
    #[clap(long, global = true)]
    pub servers: bool,
}

impl Cli {
    pub async fn run(&self) -> Result<(), crate::error::CliError> {
        match &self.mode {
            Commands::Search(com) => com.run(self).await,
            Commands::Image(com) => com.run(self).await,
            Commands::Login(com) => com.run(self).await,
        }
    }
}
