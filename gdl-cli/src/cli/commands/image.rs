use std::path::PathBuf;

use clap::Args;
use gdl_extractors::extractor::DefaultExtractor;
use log::debug;
use owo_colors::OwoColorize;
use tokio::fs::write;
use url::Url;

use crate::{
    cli::{Cli, extra::session_jar},
    error::CliError,
};

#[derive(Debug, Args)]
pub struct ImageFetch {
    /// Image URL. A `#left,top,right,bottom` fragment crops the downloaded image
    #[clap(value_parser)]
    pub url: Url,

    /// Where to save the image
    #[clap(short = 'o', value_name = "PATH", help_heading = "SAVE")]
    pub output: PathBuf,
}

impl ImageFetch {
    pub async fn run(&self, args: &Cli) -> Result<(), CliError> {
        let jar = session_jar(&args.source).await?;
        let extractor = DefaultExtractor::from_config_with_jar(&args.source, jar)?;

        let bytes = extractor.fetch_image(&self.url).await?;
        debug!("Fetched {} bytes from {}", bytes.len(), self.url);

        write(&self.output, &bytes).await?;

        println!(
            "{} {}",
            "Saved".bold(),
            self.output.display().bold().blue()
        );
        Ok(())
    }
}
