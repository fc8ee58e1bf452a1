mod chime;
mod colors;
mod config;
mod countdown;
mod feed;
mod geo;
mod globe;
mod help;
mod highlight;
mod logging;
mod regions;
mod settings;
mod spin;
mod stats;
mod surface;
mod terminal;
mod tracker;
mod trajectory;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use config::{TrackArgs, TrackerConfig};
use settings::Settings;
use std::io;
use std::path::PathBuf;
use tracker::StatusReport;

#[derive(Parser)]
#[command(name = "santa-tracker")]
#[command(author = "Terminal Art Generator")]
#[command(version)]
#[command(about = "Follow Santa's Christmas Eve flight on a braille globe", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Track Santa live on an interactive globe
    Track {
        /// Lift-off time (RFC 3339), defaults to Dec 24 00:00 UTC this year
        #[arg(long)]
        start: Option<DateTime<Utc>>,

        /// Return time (RFC 3339), defaults to 24 hours after lift-off
        #[arg(long)]
        end: Option<DateTime<Utc>>,

        /// Base URL of a journey service to poll instead of the simulation
        #[arg(long)]
        feed: Option<String>,

        /// GeoJSON file of country outlines to use instead of the built-in set
        #[arg(long)]
        regions: Option<PathBuf>,

        /// Don't ring the terminal bell
        #[arg(long)]
        mute: bool,

        /// Animation speed (seconds per frame)
        #[arg(short, long)]
        time: Option<f32>,
    },

    /// Print where Santa is and exit
    Status {
        /// Report for this instant (RFC 3339) instead of now
        #[arg(long)]
        at: Option<DateTime<Utc>>,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

fn main() -> io::Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load();

    if let Err(e) = logging::init(&settings.log) {
        eprintln!("Logging disabled: {}", e);
    }

    match cli.command {
        Commands::Track {
            start,
            end,
            feed,
            regions,
            mute,
            time,
        } => {
            let args = TrackArgs {
                start,
                end,
                feed,
                regions,
                mute,
                time,
            };
            let config = TrackerConfig::resolve(args, &settings, Utc::now());
            tracker::run(config)?;
        }
        Commands::Status { at, json } => {
            let at = at.unwrap_or_else(Utc::now);
            let config = TrackerConfig::resolve(TrackArgs::default(), &settings, at);
            let report = StatusReport::at(&config, at);
            if json {
                let text = serde_json::to_string_pretty(&report)
                    .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
                println!("{}", text);
            } else {
                print!("{}", report);
            }
        }
    }

    Ok(())
}
