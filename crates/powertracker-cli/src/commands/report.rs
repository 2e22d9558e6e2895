//! Statistics report: connect, collect, render.

use std::io::{self, Write};

use anyhow::{Context, Result};
use powertracker_core::{Session, StatisticsCollector, hour_headers};
use tracing::{info, warn};

use crate::config::RunSettings;
use crate::format::{OutputMode, format_table, format_text, write_csv};

pub async fn cmd_report(settings: RunSettings) -> Result<()> {
    let RunSettings {
        connect,
        sensor_id,
        days,
        output,
        csv_file,
    } = settings;

    let mut session = Session::connect(&connect)
        .await
        .context("connecting to websocket")?;

    info!("fetching {} days of hourly statistics for {}", days, sensor_id);
    let collected = StatisticsCollector::new(&mut session, &sensor_id, days)
        .collect()
        .await;
    if let Err(e) = session.close().await {
        warn!("closing websocket: {}", e);
    }
    let matrix = collected.context("getting results")?;

    let headers = hour_headers();
    let averages = matrix.averages();

    match output {
        OutputMode::Text => print_stdout(&format_text(&averages))?,
        OutputMode::Table => print_stdout(&format_table(&matrix, &averages, &headers))?,
        OutputMode::Csv => {
            write_csv(&csv_file, &headers, &matrix, &averages).context("writing CSV file")?;
            info!("wrote {} days to {}", matrix.len(), csv_file.display());
        }
    }

    Ok(())
}

fn print_stdout(content: &str) -> Result<()> {
    let mut stdout = io::stdout().lock();
    stdout.write_all(content.as_bytes())?;
    stdout.flush()?;
    Ok(())
}
