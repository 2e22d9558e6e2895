//! Home Assistant websocket client for hourly energy statistics.
//!
//! This crate connects to the Home Assistant websocket API, authenticates
//! with a long-lived access token and queries the recorder for hourly
//! energy-change statistics of a single sensor over a number of trailing
//! days.
//!
//! # Quick Start
//!
//! ```no_run
//! use powertracker_core::{ConnectOptions, Session, StatisticsCollector};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let options = ConnectOptions::new("http://homeassistant.local:8123", "token");
//!     let mut session = Session::connect(&options).await?;
//!
//!     let matrix = StatisticsCollector::new(&mut session, "sensor.grid_import", 7)
//!         .collect()
//!         .await?;
//!     session.close().await?;
//!
//!     for (hour, avg) in matrix.averages().iter().enumerate() {
//!         println!("{hour:>2}: {avg:.3} kWh");
//!     }
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod messages;
pub mod session;
pub mod stats;
pub mod window;

pub use error::{Error, Result, UrlError};
pub use messages::{ClientMessage, ServerMessage, StatisticsRequest, StatisticsResponse};
pub use session::{ConnectOptions, Session, dial_url};
pub use stats::{HOURS_PER_DAY, HourlyRow, ResultsMatrix, StatisticsCollector, collect, hour_headers};
pub use window::DayWindow;
