//! Stature Replay
//!
//! Feeds a recorded sensor stream through the observer service and logs
//! every output. The feed holds one JSON `SensorEvent` per line:
//!
//! ```text
//! {"type":"frame","timestamp_ms":0,"bodies":[...]}
//! {"type":"availability","available":false}
//! ```
//!
//! Usage: `stature-replay [--config <file.json>] [--feed <file.jsonl>]`
//! Without `--feed` the events are read from stdin.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;

use clap::Parser;
use stature_core::StatureError;
use stature_identity::Observation;
use stature_runtime::{
    init_logging, Observer, ObserverOutput, ObserverService, RuntimeConfig, SensorEvent,
};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "stature-replay", about = "Replay a recorded body-frame feed")]
struct Args {
    /// Runtime configuration (JSON)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Sensor events, one JSON object per line. Reads stdin when absent.
    #[arg(long, value_name = "PATH")]
    feed: Option<PathBuf>,
}

fn parse_event(line_no: u64, line: &str) -> Result<Option<SensorEvent>, StatureError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    serde_json::from_str(line)
        .map(Some)
        .map_err(|e| StatureError::MalformedRecord {
            line: line_no,
            reason: e.to_string(),
        })
}

fn log_output(output: &ObserverOutput) {
    match output {
        ObserverOutput::Observation {
            tracking_id,
            observation: Observation::Recognized(subject),
            ..
        } => info!(tracking = %tracking_id, subject = %subject.as_str(), "recognized"),
        ObserverOutput::Observation {
            tracking_id,
            observation: Observation::Enrolled(subject),
            ..
        } => info!(tracking = %tracking_id, subject = %subject.as_str(), "enrolled"),
        ObserverOutput::Failed {
            tracking_id,
            reason,
            ..
        } => warn!(tracking = %tracking_id, %reason, "observation failed"),
        ObserverOutput::SessionEnded { tracking_id, .. } => {
            info!(tracking = %tracking_id, "left view")
        }
        ObserverOutput::SensorLost { sessions_ended } => {
            warn!(sessions_ended, "sensor lost")
        }
        ObserverOutput::SensorRestored => info!("sensor restored"),
        _ => {}
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = match &args.config {
        Some(path) => RuntimeConfig::from_json(path)?,
        None => RuntimeConfig::default(),
    };
    init_logging(&config.log);

    let observer = Observer::from_config(&config)?;
    let (handle, mut outputs, task) = ObserverService::spawn(observer, config.channel_capacity);

    let printer = tokio::spawn(async move {
        let mut count = 0u64;
        while let Some(output) = outputs.recv().await {
            log_output(&output);
            count += 1;
        }
        count
    });

    let reader: Box<dyn BufRead> = match &args.feed {
        Some(path) => Box::new(BufReader::new(File::open(path)?)),
        None => Box::new(BufReader::new(io::stdin())),
    };

    let mut events = 0u64;
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        if let Some(event) = parse_event(i as u64 + 1, &line)? {
            handle.send(event).await?;
            events += 1;
        }
    }

    handle.shutdown().await?;
    let observer = task.await?;
    let outputs = printer.await?;

    let stats = observer.stats();
    info!(
        events,
        outputs,
        frames = stats.frames,
        recognized = stats.recognized,
        enrolled = stats.enrolled,
        store_errors = stats.store_errors,
        "replay finished"
    );
    Ok(())
}
