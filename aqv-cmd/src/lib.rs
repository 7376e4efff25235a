//! Command implementations for the AQV CLI.
//!
//! Every subcommand loads a data directory asynchronously into a
//! [`Dashboard`], then queries it or drives it over time.

use aqv_core::pollutant::{Metric, Pollutant};
use aqv_core::region::Region;
use aqv_data::ranking::RankOrder;
use aqv_view::config::{DashboardConfig, RankSettings};
use aqv_view::dashboard::Dashboard;
use clap::{Args, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

pub mod animate;
pub mod load;
pub mod query;

/// Options shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct DataArgs {
    /// Directory holding type.csv, citynamewithlocation.csv and <P>_day<metric>.csv files
    #[arg(short = 'd', long, default_value = "data")]
    pub data_dir: PathBuf,

    /// Year shown by the dashboard (rows before it are ignored)
    #[arg(short = 'y', long, default_value_t = 2025)]
    pub year: i32,

    /// Pollutant deciding which cities take part in national means
    #[arg(long, default_value = "AQI")]
    pub registry: Pollutant,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show the loaded datasets
    Summary {
        #[command(flatten)]
        data: DataArgs,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// National daily mean series as CSV
    National {
        #[command(flatten)]
        data: DataArgs,

        #[arg(short = 'p', long, default_value = "AQI")]
        pollutant: Pollutant,

        /// Only the days of this month (1-12)
        #[arg(short = 'm', long)]
        month: Option<u32>,

        /// Output CSV path (stdout when omitted)
        #[arg(short = 'o', long)]
        output: Option<String>,
    },

    /// One city's daily series for the year as CSV
    City {
        #[command(flatten)]
        data: DataArgs,

        #[arg(short = 'c', long)]
        city: String,

        #[arg(short = 'p', long, default_value = "AQI")]
        pollutant: Pollutant,

        /// max, mean or min
        #[arg(long, default_value = "max")]
        metric: Metric,

        #[arg(short = 'o', long)]
        output: Option<String>,
    },

    /// City and national radar for one day as JSON
    Radar {
        #[command(flatten)]
        data: DataArgs,

        #[arg(short = 'c', long, default_value = "北京")]
        city: String,

        /// Pollutant of the info panel
        #[arg(short = 'p', long, default_value = "AQI")]
        pollutant: Pollutant,

        /// Day as YYYY-MM-DD
        #[arg(long)]
        date: String,
    },

    /// Per-month density curves of one city as JSON
    Density {
        #[command(flatten)]
        data: DataArgs,

        #[arg(short = 'c', long)]
        city: String,

        #[arg(short = 'p', long, default_value = "AQI")]
        pollutant: Pollutant,

        #[arg(long, value_enum, default_value = "ridgeline")]
        kind: query::DensityKind,
    },

    /// Play the monthly racing-bar ranking of a region
    Rank {
        #[command(flatten)]
        data: DataArgs,

        #[arg(short = 'p', long, default_value = "AQI")]
        pollutant: Pollutant,

        #[arg(short = 'r', long, default_value = "东北")]
        region: Region,

        /// best (lowest first) or worst
        #[arg(long, default_value = "best")]
        order: RankOrder,

        /// Cities per frame, 0 for all
        #[arg(short = 'n', long, default_value_t = 15)]
        top_n: usize,

        /// Frame interval in milliseconds (3000, 2000 or 1000 in the dashboard)
        #[arg(short = 'i', long, default_value_t = 2000)]
        interval_ms: u64,

        /// Frames to play after the first
        #[arg(short = 'f', long, default_value_t = 11)]
        frames: usize,
    },

    /// Replay scripted navigation, printing every notification
    Session {
        #[command(flatten)]
        data: DataArgs,

        /// Comma separated steps, e.g. "drill=沈阳,month=3,back,rank,play,wait=4000,leave"
        #[arg(short = 's', long)]
        steps: String,

        /// Include the derived view data in every line
        #[arg(long)]
        full: bool,
    },
}

/// Build a dashboard for `data` and load its directory.
pub async fn load_dashboard(data: &DataArgs, mut config: DashboardConfig) -> Dashboard {
    config.year = data.year;
    config.registry_pollutant = data.registry;
    let dashboard = Dashboard::new(config);
    load::load_data_dir(dashboard.store(), &data.data_dir).await;
    dashboard
}

pub async fn run(command: Command) -> anyhow::Result<()> {
    match command {
        Command::Summary { data, json } => {
            let dashboard = load_dashboard(&data, DashboardConfig::default()).await;
            query::run_summary(dashboard.store(), json)
        }
        Command::National {
            data,
            pollutant,
            month,
            output,
        } => {
            let dashboard = load_dashboard(&data, DashboardConfig::default()).await;
            query::run_national(dashboard.store(), pollutant, month, output.as_deref())
        }
        Command::City {
            data,
            city,
            pollutant,
            metric,
            output,
        } => {
            let dashboard = load_dashboard(&data, DashboardConfig::default()).await;
            query::run_city(dashboard.store(), &city, pollutant, metric, output.as_deref())
        }
        Command::Radar {
            data,
            city,
            pollutant,
            date,
        } => {
            let dashboard = load_dashboard(&data, DashboardConfig::default()).await;
            query::run_radar(dashboard.store(), &city, pollutant, &date)
        }
        Command::Density {
            data,
            city,
            pollutant,
            kind,
        } => {
            let dashboard = load_dashboard(&data, DashboardConfig::default()).await;
            query::run_density(dashboard.store(), &city, pollutant, kind)
        }
        Command::Rank {
            data,
            pollutant,
            region,
            order,
            top_n,
            interval_ms,
            frames,
        } => {
            let config = DashboardConfig {
                default_pollutant: pollutant,
                rank: RankSettings {
                    region,
                    order,
                    top_n,
                    interval: Duration::from_millis(interval_ms.max(1)),
                },
                ..DashboardConfig::default()
            };
            let dashboard = load_dashboard(&data, config).await;
            animate::run_rank(dashboard, frames).await
        }
        Command::Session { data, steps, full } => {
            let steps = animate::parse_steps(&steps)?;
            let dashboard = load_dashboard(&data, DashboardConfig::default()).await;
            animate::run_session(dashboard, &steps, full)
        }
    }
}
