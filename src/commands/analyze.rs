//! Analyze command handler
//!
//! Runs a full session against the configured endpoint (or a replay
//! directory):
//! 1. Submit the identity and stream the yearly report
//! 2. Optionally activate the record for `--drill-year` (monthly report)
//! 3. Optionally activate the month for `--drill-month` (daily report)
//! 4. Print the final view

use std::io::{self, Write};
use std::sync::Arc;

use anyhow::{bail, Context, Result};

use kline::driver::SessionDriver;
use kline::report::{ChartPoint, Level};
use kline::session::{AnalysisSession, Completion, Identity, ResultSink, SessionState};
use kline::transport::{HttpTransport, ReplayTransport, StreamTransport};
use kline::Config;

use super::{render_records, render_summary, truncate_display};
use crate::cli::AnalyzeArgs;

/// Progress output on stderr so stdout stays clean for the final view.
struct ConsoleSink {
    enabled: bool,
    reason_width: usize,
}

impl ResultSink for ConsoleSink {
    fn on_record_committed(&mut self, record: &ChartPoint) {
        if self.enabled {
            eprintln!(
                "  + {} {} {}",
                record.date_key(),
                record.gan_zhi,
                truncate_display(&record.reason, self.reason_width)
            );
        }
    }

    fn on_state_changed(&mut self, state: SessionState) {
        if self.enabled {
            eprintln!("[{}]", state.label());
            let _ = io::stderr().flush();
        }
    }
}

/// Request a report and optionally drill down.
#[cfg(not(tarpaulin_include))]
pub fn handle(args: AnalyzeArgs) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;
    runtime.block_on(run(args))
}

fn build_transport(args: &AnalyzeArgs, config: &Config) -> Result<Arc<dyn StreamTransport>> {
    if let Some(dir) = &args.replay_dir {
        let transport = ReplayTransport::from_dir(dir)
            .with_context(|| format!("Failed to load replay reports from {:?}", dir))?
            .with_chunk_chars(args.chunk_size);
        return Ok(Arc::new(transport));
    }

    let url = args
        .endpoint
        .clone()
        .unwrap_or_else(|| config.endpoint.url.clone());
    let transport = HttpTransport::new(url, config.endpoint.timeout())?
        .with_sse(config.endpoint.sse || args.sse);
    Ok(Arc::new(transport))
}

fn find_record(records: &[ChartPoint], year: i32, month: Option<u32>) -> Option<ChartPoint> {
    records
        .iter()
        .find(|r| r.year == year && (month.is_none() || r.month == month))
        .cloned()
}

async fn run(args: AnalyzeArgs) -> Result<()> {
    let config = Config::load()?;
    let transport = build_transport(&args, &config)?;

    let sink = ConsoleSink {
        enabled: !args.json,
        reason_width: config.display.reason_width,
    };
    let session = AnalysisSession::with_schema(sink, config.parser.schema());
    let driver = SessionDriver::new(session, transport);

    let interrupt = driver.clone();
    ctrlc::set_handler(move || {
        interrupt.cancel();
    })
    .context("Failed to install Ctrl-C handler")?;

    let mut identity = Identity::new(args.gender, &args.birth_date, &args.birth_time);
    if let Some(name) = &args.name {
        identity = identity.with_name(name);
    }

    if driver.submit(identity).await? == Completion::Abandoned {
        eprintln!("Cancelled.");
        return Ok(());
    }

    if let Some(year) = args.drill_year {
        let record = find_record(driver.lock().records(), year, None)
            .with_context(|| format!("Year {} is not in the report", year))?;
        if driver.activate(&record).await? == Some(Completion::Abandoned) {
            eprintln!("Cancelled.");
            return Ok(());
        }

        if let Some(month) = args.drill_month {
            let record = find_record(driver.lock().records(), year, Some(month))
                .with_context(|| format!("Month {}-{:02} is not in the report", year, month))?;
            if driver.activate(&record).await? == Some(Completion::Abandoned) {
                eprintln!("Cancelled.");
                return Ok(());
            }
        }
    }

    let session = driver.lock();
    if session.state() != SessionState::Done {
        bail!(
            "Session ended in state {}: {}",
            session.state(),
            session.last_error().unwrap_or("unknown error")
        );
    }

    if args.json {
        let doc = serde_json::json!({
            "level": session.level(),
            "drillDepth": session.drill_depth(),
            "fields": session.fields(),
            "tags": session.tags(),
            "records": session.records(),
        });
        println!("{}", serde_json::to_string_pretty(&doc)?);
        return Ok(());
    }

    if session.level() == Level::Coarse {
        print!("{}", render_summary(session.fields(), session.tags()));
    } else if let Some(anchor) = session.coarse_anchor() {
        match session.medium_anchor() {
            Some(month) => println!("{}-{:02} ({})", anchor.year, month.month, month.gan_zhi),
            None => println!("{} ({})", anchor.year, anchor.gan_zhi),
        }
    }
    print!(
        "{}",
        render_records(session.records(), config.display.reason_width)
    );
    Ok(())
}
