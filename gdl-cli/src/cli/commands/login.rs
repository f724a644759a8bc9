use clap::Args;
use gdl_extractors::auth::SessionCookies;
use log::info;
use owo_colors::OwoColorize;

use crate::{cli::Cli, error::CliError};

#[derive(Debug, Args)]
pub struct Login {
    /// Session cookie values, in the order the source lists them
    ///
    /// For the built-in source: `ipb_member_id` then `ipb_pass_hash`.
    #[clap(value_parser, required = true, value_name = "COOKIE")]
    pub values: Vec<String>,
}

impl Login {
    pub async fn run(&self, args: &Cli) -> Result<(), CliError> {
        let values: Vec<&str> = self.values.iter().map(|v| v.trim()).collect();
        let session = SessionCookies::from_values(&args.source, &values)?;

        let path = session.write_cache().await?;
        info!("Session cache saved to {}", path.display());

        println!(
            "{} {}",
            "Stored session for".bold(),
            args.source.pretty_name.green().bold()
        );
        Ok(())
    }
}
