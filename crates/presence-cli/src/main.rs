//! `presence` CLI — evaluate and watch a calendar feed's busy/free signal.
//!
//! ## Usage
//!
//! ```sh
//! # One-shot evaluation of a feed
//! presence check --url https://example.com/cal.ics
//!
//! # Machine-readable output
//! presence check --url https://example.com/cal.ics --json
//!
//! # Continuous watch: regular refresh plus boundary-exact wake-ups
//! presence watch --url https://example.com/cal.ics --interval 300
//!
//! # Parse a local ICS file and dump the built events
//! presence parse -i calendar.ics --local-tz Europe/Berlin
//! ```

use anyhow::{anyhow, Context, Result};
use chrono::{Duration, Utc};
use chrono_tz::Tz;
use clap::{Args, Parser, Subcommand};
use serde_json::json;
use std::io::{self, Read};
use std::thread;
use std::time::Duration as StdDuration;

use presence_core::config::{DEFAULT_DIAG_CHAR_CAP, MIN_POLL_INTERVAL_SECS};
use presence_core::schedule::{cadence_backoff, next_regular_run};
use presence_core::{
    parse_feed, run_pipeline, DiagnosticBuffer, EngineConfig, EngineError, FeedFetch,
    FeedResponse, RunOutcome, RunStatus, SchedulerState, SystemClock,
};

#[derive(Parser)]
#[command(
    name = "presence",
    version,
    about = "Calendar-feed busy/free signal engine"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Local (hub) timezone, the innermost fallback for floating times
    #[arg(long, global = true, default_value = "UTC")]
    local_tz: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one fetch-and-evaluate pass and print the result
    Check {
        /// Feed URL (omitting it exercises the unconfigured path)
        #[arg(long)]
        url: Option<String>,
        /// Emit JSON instead of human-readable lines
        #[arg(long)]
        json: bool,
        /// Print the diagnostic buffer to stderr afterwards
        #[arg(long)]
        diag: bool,
        #[command(flatten)]
        engine: EngineOpts,
    },
    /// Poll continuously, waking exactly at signal boundaries
    Watch {
        #[arg(long)]
        url: String,
        /// Regular refresh cadence in seconds (floor enforced)
        #[arg(long, default_value_t = 300)]
        interval: u64,
        /// Stop after this many pipeline runs (runs forever if omitted)
        #[arg(long)]
        max_runs: Option<u64>,
        #[command(flatten)]
        engine: EngineOpts,
    },
    /// Parse a local ICS document and dump the built events
    Parse {
        /// Input file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Emit JSON instead of one line per event
        #[arg(long)]
        json: bool,
    },
}

/// Engine/filter settings shared by `check` and `watch`.
#[derive(Args)]
struct EngineOpts {
    /// Hours of past events kept in the selection window
    #[arg(long, default_value_t = 1)]
    past_hours: i64,
    /// Days of future events kept in the selection window
    #[arg(long, default_value_t = 2)]
    horizon_days: i64,
    /// Cap on the selected event list
    #[arg(long, default_value_t = 50)]
    max_events: usize,
    /// Let all-day events drive the signal
    #[arg(long)]
    all_day: bool,
    /// Count transparent (free) events too, not just opaque ones
    #[arg(long)]
    include_transparent: bool,
    /// Drop tentative events
    #[arg(long)]
    exclude_tentative: bool,
    /// Keep events an attendee declined
    #[arg(long)]
    keep_declined: bool,
    /// Comma-separated keywords, at least one of which must appear
    #[arg(long, default_value = "")]
    include: String,
    /// Comma-separated keywords, none of which may appear
    #[arg(long, default_value = "")]
    exclude: String,
    /// Minutes added to every event start (signed)
    #[arg(long, default_value_t = 0)]
    start_offset: i64,
    /// Minutes added to every event end (signed)
    #[arg(long, default_value_t = 0)]
    end_offset: i64,
    /// Upcoming-list size
    #[arg(long, default_value_t = 5)]
    next_list: usize,
    /// Show locations on display lines
    #[arg(long)]
    show_location: bool,
    /// Fetch timeout in seconds
    #[arg(long, default_value_t = 15)]
    timeout: u64,
}

impl EngineOpts {
    fn to_config(&self, url: Option<&str>, interval_secs: u64) -> EngineConfig {
        EngineConfig {
            url: url.unwrap_or("").to_string(),
            poll_interval_secs: interval_secs,
            fetch_timeout_secs: self.timeout,
            include_past_hours: self.past_hours,
            horizon_days: self.horizon_days,
            max_events: self.max_events,
            trigger_all_day: self.all_day,
            trigger_busy_only: !self.include_transparent,
            exclude_tentative: self.exclude_tentative,
            exclude_declined: !self.keep_declined,
            include_keywords: self.include.clone(),
            exclude_keywords: self.exclude.clone(),
            start_offset_min: self.start_offset,
            end_offset_min: self.end_offset,
            next_list_size: self.next_list,
            next_list_show_location: self.show_location,
            diag_char_cap: DEFAULT_DIAG_CHAR_CAP,
        }
    }
}

/// Blocking HTTP fetcher backing the [`FeedFetch`] collaborator.
struct HttpFetch {
    client: reqwest::blocking::Client,
}

impl HttpFetch {
    fn new() -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self { client })
    }
}

impl FeedFetch for HttpFetch {
    fn fetch(
        &self,
        url: &str,
        timeout: StdDuration,
    ) -> std::result::Result<FeedResponse, EngineError> {
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .map_err(|e| EngineError::Transport(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .map_err(|e| EngineError::Transport(e.to_string()))?;
        Ok(FeedResponse { status, body })
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let local_tz: Tz = cli
        .local_tz
        .parse()
        .map_err(|_| anyhow!("unknown timezone '{}'", cli.local_tz))?;

    match cli.command {
        Commands::Check {
            url,
            json,
            diag,
            engine,
        } => check(engine.to_config(url.as_deref(), 300), local_tz, json, diag),
        Commands::Watch {
            url,
            interval,
            max_runs,
            engine,
        } => watch(engine.to_config(Some(&url), interval), local_tz, max_runs),
        Commands::Parse { input, json } => parse(input.as_deref(), local_tz, json),
    }
}

fn read_input(path: Option<&str>) -> Result<String> {
    match path {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("failed to read '{path}'"))
        }
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("failed to read stdin")?;
            Ok(buffer)
        }
    }
}

fn check(cfg: EngineConfig, local_tz: Tz, json: bool, show_diag: bool) -> Result<()> {
    let fetch = HttpFetch::new()?;
    let clock = SystemClock::new(local_tz);
    let mut state = SchedulerState::default();
    let mut diag = DiagnosticBuffer::new(cfg.diag_char_cap);

    let outcome = run_pipeline(&fetch, &clock, &cfg, &mut state, &mut diag);

    if json {
        print_json(&outcome)?;
    } else {
        print_human(&outcome);
    }
    if show_diag {
        for line in diag.lines() {
            eprintln!("{line}");
        }
    }
    Ok(())
}

fn print_json(outcome: &RunOutcome) -> Result<()> {
    let status = match &outcome.status {
        RunStatus::Ok => "ok".to_string(),
        RunStatus::Failed(error) => error.to_string(),
    };
    let transition = outcome.plan.as_ref().map(|p| {
        json!({
            "target": p.target.to_rfc3339(),
            "reason": p.reason.tag(),
            "delay_seconds": p.delay.num_seconds(),
        })
    });
    let value = json!({
        "status": status,
        "signal": outcome.signal,
        "governing": outcome.governing_line,
        "next": outcome.next_line,
        "upcoming": outcome.upcoming,
        "feed_timezone": outcome.feed_tz_id,
        "fetched_at": outcome.fetched_at.map(|t| t.to_rfc3339()),
        "transition": transition,
    });
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

fn print_human(outcome: &RunOutcome) {
    match outcome.signal {
        Some(true) => println!("signal: busy"),
        Some(false) => println!("signal: free"),
        None => println!("signal: unchanged (run failed)"),
    }
    if let RunStatus::Failed(error) = &outcome.status {
        println!("error: {error}");
    }
    if let Some(line) = &outcome.governing_line {
        println!("governing: {line}");
    }
    if let Some(line) = &outcome.next_line {
        println!("next: {line}");
    }
    for line in &outcome.upcoming {
        println!("upcoming: {line}");
    }
    if let Some(tz) = &outcome.feed_tz_id {
        println!("feed timezone: {tz}");
    }
    if let Some(plan) = &outcome.plan {
        println!(
            "transition: {} ({}) in {}s",
            plan.target.format("%Y-%m-%d %H:%M:%S UTC"),
            plan.reason.tag(),
            plan.delay.num_seconds()
        );
    }
}

fn watch(cfg: EngineConfig, local_tz: Tz, max_runs: Option<u64>) -> Result<()> {
    let fetch = HttpFetch::new()?;
    let clock = SystemClock::new(local_tz);
    let mut state = SchedulerState::default();
    let mut diag = DiagnosticBuffer::new(cfg.diag_char_cap);
    let min_gap = Duration::seconds(MIN_POLL_INTERVAL_SECS as i64);
    let mut last_signal: Option<bool> = None;
    let mut runs = 0u64;

    loop {
        let now = Utc::now();
        let transition_due = state.next_transition.is_some_and(|target| target <= now);
        if !transition_due {
            // Only cadence-triggered runs are throttled; a boundary wake
            // is never gated behind the minimum gap.
            if let Some(backoff) = cadence_backoff(&state, now, min_gap) {
                sleep(backoff);
                continue;
            }
        }

        let outcome = run_pipeline(&fetch, &clock, &cfg, &mut state, &mut diag);
        report(&outcome, &mut last_signal);

        runs += 1;
        if max_runs.is_some_and(|limit| runs >= limit) {
            return Ok(());
        }

        let now = Utc::now();
        let regular = next_regular_run(&state, now, cfg.poll_interval());
        let wake = match state.next_transition {
            Some(target) if target < regular => target,
            _ => regular,
        };
        sleep(wake - now);
    }
}

fn report(outcome: &RunOutcome, last_signal: &mut Option<bool>) {
    let stamp = Utc::now().format("%Y-%m-%d %H:%M:%S");
    if let Some(signal) = outcome.signal {
        if *last_signal != Some(signal) {
            println!(
                "{stamp} signal -> {}",
                if signal { "busy" } else { "free" }
            );
            *last_signal = Some(signal);
        }
    }
    match &outcome.status {
        RunStatus::Ok => {
            if let Some(line) = &outcome.governing_line {
                println!("{stamp} governing: {line}");
            }
            if let Some(line) = &outcome.next_line {
                println!("{stamp} next: {line}");
            }
        }
        RunStatus::Failed(error) => eprintln!("{stamp} run failed: {error}"),
    }
}

fn parse(input: Option<&str>, local_tz: Tz, json: bool) -> Result<()> {
    let text = read_input(input)?;
    let parsed = parse_feed(&text, local_tz);

    if json {
        let events: Vec<_> = parsed
            .events
            .iter()
            .map(|e| {
                json!({
                    "uid": e.uid,
                    "summary": e.summary,
                    "location": e.location,
                    "status": e.status.as_str(),
                    "transparency": e.transparency.as_str(),
                    "start": e.start.to_rfc3339(),
                    "end": e.end.to_rfc3339(),
                    "all_day": e.is_all_day,
                    "zone": e.zone.name(),
                })
            })
            .collect();
        let value = json!({
            "feed_timezone": parsed.feed_tz.id(),
            "events": events,
            "dropped": parsed.dropped.len(),
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        println!("feed timezone: {}", parsed.feed_tz.id());
        for event in &parsed.events {
            println!(
                "{} .. {} {} [{}]",
                event.start.format("%Y-%m-%d %H:%M"),
                event.end.format("%Y-%m-%d %H:%M"),
                if event.summary.is_empty() {
                    "(untitled)"
                } else {
                    event.summary.as_str()
                },
                if event.is_all_day { "all-day" } else { "timed" },
            );
        }
        for drop in &parsed.dropped {
            println!("dropped: uid={:?} reason={}", drop.uid, drop.reason);
        }
    }
    Ok(())
}

fn sleep(delay: Duration) {
    let delay = delay
        .to_std()
        .unwrap_or_else(|_| StdDuration::from_secs(1))
        .max(StdDuration::from_secs(1));
    thread::sleep(delay);
}
