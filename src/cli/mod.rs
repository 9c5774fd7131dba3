pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "menuscout")]
#[command(about = "Finds, scrapes and structures restaurant menus", long_about = None)]
pub struct Cli {
    /// Path to a config file (default: ~/.config/menuscout/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP server
    Serve {
        /// Address to bind, overriding the config file (e.g. "0.0.0.0:8080")
        #[arg(short, long)]
        bind: Option<String>,
    },
    /// Look up, scrape and structure a place's menu, printing JSON
    Menu {
        /// Place id of the restaurant
        place_id: String,
    },
    /// Scrape a place's website and map listing without structuring
    Scrape {
        /// Place id of the restaurant
        place_id: String,

        /// Website to scrape alongside the map listing
        #[arg(short, long)]
        website: Option<String>,
    },
    /// Run the streaming flow, printing each event as an SSE frame
    Stream {
        /// Place id of the restaurant
        place_id: String,

        /// Restaurant name, if already known
        #[arg(short, long)]
        name: Option<String>,

        /// Restaurant address, if already known
        #[arg(short, long)]
        address: Option<String>,
    },
    /// Extract menu text from a web page
    Extract {
        /// URL of the page
        url: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scrape_with_website() {
        let cli = Cli::parse_from([
            "menuscout",
            "scrape",
            "ChIJ123",
            "--website",
            "https://acme.example",
        ]);
        match cli.command {
            Commands::Scrape { place_id, website } => {
                assert_eq!(place_id, "ChIJ123");
                assert_eq!(website.as_deref(), Some("https://acme.example"));
            }
            _ => panic!("expected scrape"),
        }
    }

    #[test]
    fn test_config_flag_is_global() {
        let cli = Cli::parse_from(["menuscout", "stream", "ChIJ123", "--config", "/tmp/m.toml"]);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/m.toml")));
        assert!(matches!(cli.command, Commands::Stream { .. }));
    }
}
