//! TCAP SRT replay
//!
//! Reads dissected TCAP events as JSON lines (from a file, or stdin when no
//! path is given) and prints one correlation per event, `null` for events
//! with no dialogue. The final statistics are logged on exit.
//!
//! Configuration comes from the JSON file named by `TCAP_SRT_CONFIG`, or
//! from `TCAP_SRT_*` variables.

use anyhow::Context;
use tcap_srt::{CorrelationEngine, SrtConfig, TcapEvent};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tcap_telemetry::init("tcap-srt-replay")?;

    let config = match std::env::var("TCAP_SRT_CONFIG") {
        Ok(path) => SrtConfig::from_file(&path).with_context(|| format!("loading {path}"))?,
        Err(_) => SrtConfig::from_env()?,
    };
    let mut engine = CorrelationEngine::new(config);
    info!(capture = %engine.capture_id(), config = ?engine.config(), "replay started");

    let input: Box<dyn AsyncBufRead + Unpin> = match std::env::args().nth(1) {
        Some(path) => {
            let file = tokio::fs::File::open(&path)
                .await
                .with_context(|| format!("opening {path}"))?;
            Box::new(BufReader::new(file))
        }
        None => Box::new(BufReader::new(tokio::io::stdin())),
    };

    let mut lines = input.lines();
    let mut stdout = tokio::io::stdout();
    let mut line_no = 0usize;
    while let Some(line) = lines.next_line().await? {
        line_no += 1;
        if line.trim().is_empty() {
            continue;
        }
        let event: TcapEvent = match serde_json::from_str(&line) {
            Ok(event) => event,
            Err(e) => {
                warn!(line = line_no, error = %e, "skipping malformed event");
                continue;
            }
        };

        let correlation = engine.process(&event);
        let mut out = serde_json::to_vec(&correlation)?;
        out.push(b'\n');
        stdout.write_all(&out).await?;
    }
    stdout.flush().await?;

    let snapshot = engine.snapshot();
    info!(
        lines = line_no,
        opened = snapshot.sessions_opened,
        closed = snapshot.sessions_closed,
        duplicates = snapshot.duplicates,
        orphans = snapshot.orphans,
        "replay finished"
    );
    info!(snapshot = %serde_json::to_string(&snapshot)?, "srt statistics");
    Ok(())
}
