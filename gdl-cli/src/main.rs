#![deny(clippy::all)]
use clap::Parser;
use color_eyre::eyre::Result;
use color_eyre::owo_colors::OwoColorize;
use gdl_cli::cli::{AVAILABLE_SOURCES, Cli};
use std::process::exit;

#[tokio::main]
async fn main() -> Result<()> {
    let args: Cli = Cli::parse();

    if args.servers {
        print_sources()
    }

    env_logger::builder().format_timestamp(None).init();
    color_eyre::install()?;

    args.run().await?;

    Ok(())
}

fn print_sources() {
    println!(
        "{}\n----------------",
        "Available Sources:".underline().bold().blue()
    );

    let Some(sources) = AVAILABLE_SOURCES.get() else {
        exit(0)
    };

    for (id, data) in sources {
        let marker = data
            .marker_cookie
            .as_ref()
            .map_or_else(|| String::from("none"), |m| format!("{}={}", m.name, m.value));

        println!(
            "{:<16} - {}:\n - {} {}\n - {} {}\n - {} {:?}\n - {} {}\n",
            format!("[{}]", id),
            data.pretty_name.bold().green(),
            "Public URL:".bold().blue(),
            data.public_url.bold().purple().underline(),
            "Authenticated URL:".bold().blue(),
            data.authenticated_url.bold().purple().underline(),
            "Session cookies:".bold().blue(),
            data.session_cookies,
            "Marker cookie:".bold().blue(),
            marker.yellow(),
        )
    }

    exit(0)
}
