use std::io::BufRead;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use futures::StreamExt;

use noise_monitor::audio::{AudioSource, SimulatedSource, WavSource};
use noise_monitor::{
    AppConfig, Intensity, ModeHandle, PolicySetting, Reading, SamplingLoop, Session,
};

#[derive(Parser, Debug)]
#[command(
    name = "noise_monitor",
    about = "Ambient noise monitor with light/hard threshold modes"
)]
struct Cli {
    #[command(flatten)]
    options: MonitorArgs,
    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct MonitorArgs {
    /// JSON config file (defaults to assets/noise_config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Start in hard mode
    #[arg(long, global = true, conflicts_with = "light")]
    hard: bool,
    /// Start in light mode
    #[arg(long, global = true)]
    light: bool,
    /// Stop after this many seconds (replay defaults to the file length)
    #[arg(long, global = true)]
    duration_secs: Option<u64>,
    /// Publish at most one reading per interval
    #[arg(long, global = true)]
    throttle_ms: Option<u64>,
    /// Which compliance transition fires an event
    #[arg(long, global = true, value_enum)]
    policy: Option<PolicyArg>,
    /// Print readings as JSON lines
    #[arg(long, global = true)]
    json: bool,
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Monitor the default microphone
    Live,
    /// Replay a WAV recording through the monitor
    Replay {
        path: PathBuf,
        /// Samples advanced per tick (defaults to one 60 Hz frame)
        #[arg(long)]
        hop: Option<usize>,
    },
    /// Monitor a simulated noise feed
    Simulate {
        #[arg(long, default_value_t = 60.0)]
        min: f64,
        #[arg(long, default_value_t = 90.0)]
        max: f64,
        #[arg(long)]
        seed: Option<u64>,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum PolicyArg {
    FollowMode,
    OnRestore,
    OnBreach,
}

impl From<PolicyArg> for PolicySetting {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::FollowMode => PolicySetting::FollowMode,
            PolicyArg::OnRestore => PolicySetting::OnRestore,
            PolicyArg::OnBreach => PolicySetting::OnBreach,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.options.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::INFO,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let options = cli.options;
    let config = load_config(&options);
    let mode = config.mode_handle();
    let mut duration = options.duration_secs.map(Duration::from_secs);

    match cli.command {
        Command::Live => {
            #[cfg(not(target_os = "android"))]
            {
                let source = noise_monitor::audio::CpalSource::new(config.sampler.clone())
                    .context("configuring microphone analyser")?;
                monitor(source, config, mode, duration, options.json).await
            }
            #[cfg(target_os = "android")]
            {
                anyhow::bail!("live capture is not available on this platform")
            }
        }
        Command::Replay { path, hop } => {
            let mut source = WavSource::new(&path, &config.sampler)
                .context("configuring replay analyser")?;
            if let Some(hop) = hop {
                source = source.with_hop(hop);
            }
            if duration.is_none() {
                duration = Some(
                    source
                        .duration()
                        .with_context(|| format!("reading {}", path.display()))?,
                );
            }
            monitor(source, config, mode, duration, options.json).await
        }
        Command::Simulate { min, max, seed } => {
            let scale = config.level.scale().context("invalid level range")?;
            let mut source = SimulatedSource::new(min, max, scale, config.sampler.bin_count());
            if let Some(seed) = seed {
                source = source.with_seed(seed);
            }
            monitor(source, config, mode, duration, options.json).await
        }
    }
}

fn load_config(options: &MonitorArgs) -> AppConfig {
    let mut config = match &options.config {
        Some(path) => AppConfig::load_from_file(path),
        None => AppConfig::load(),
    };
    if options.hard {
        config.hard_mode = true;
    }
    if options.light {
        config.hard_mode = false;
    }
    if let Some(throttle_ms) = options.throttle_ms {
        config.cadence.throttle_ms = Some(throttle_ms);
    }
    if let Some(policy) = options.policy {
        config.celebration.policy = policy.into();
    }
    config
}

async fn monitor<S: AudioSource + 'static>(
    source: S,
    config: AppConfig,
    mode: ModeHandle,
    duration: Option<Duration>,
    json: bool,
) -> Result<()> {
    let mut session = Session::new(config.history_capacity);
    let mut sampling_loop = SamplingLoop::new(source, config, mode.clone());
    let mut readings = Box::pin(sampling_loop.reading_stream());

    sampling_loop
        .start()
        .with_context(|| format!("starting monitor on {}", sampling_loop.source().describe()))?;
    spawn_mode_toggle(mode);

    let deadline = async {
        match duration {
            Some(duration) => tokio::time::sleep(duration).await,
            None => std::future::pending().await,
        }
    };
    tokio::pin!(deadline);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut liveness = tokio::time::interval(Duration::from_millis(250));

    loop {
        tokio::select! {
            _ = &mut deadline => break,
            _ = &mut ctrl_c => break,
            _ = liveness.tick() => {
                if !sampling_loop.is_running() {
                    break;
                }
            }
            reading = readings.next() => match reading {
                Some(reading) => {
                    session.record(&reading);
                    print_reading(&reading, json)?;
                }
                None => break,
            },
        }
    }

    sampling_loop.stop().context("stopping monitor")?;
    print_summary(&session, json)
}

/// Typing `m` + Enter flips between light and hard mode
fn spawn_mode_toggle(mode: ModeHandle) {
    let spawned = std::thread::Builder::new()
        .name("mode-toggle".to_string())
        .spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else { break };
                if line.trim().eq_ignore_ascii_case("m") {
                    let now = mode.toggle();
                    tracing::info!("[noise_monitor] Mode switched to {:?}", now);
                }
            }
        });
    if let Err(err) = spawned {
        tracing::warn!("[noise_monitor] Mode toggle unavailable: {}", err);
    }
}

fn print_reading(reading: &Reading, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(reading)?);
        return Ok(());
    }

    const BAR_WIDTH: usize = 30;
    let filled = (reading.gauge_fraction() * BAR_WIDTH as f64).round() as usize;
    let bar = format!("{}{}", "#".repeat(filled), ".".repeat(BAR_WIDTH - filled));
    let marker = match (reading.event, reading.celebration, reading.intensity) {
        (Some(event), _, _) => format!(" <- {:?}", event.reason),
        (None, Some(_), _) => " *".to_string(),
        (None, None, Intensity::Maximum) => " !".to_string(),
        _ => String::new(),
    };

    println!(
        "{:>8} ms {:>6.1} dB [{}] {:<5} {:<6} {:<12}{}",
        reading.timestamp_ms,
        reading.level,
        bar,
        format!("{:?}", reading.mode).to_lowercase(),
        format!("{:?}", reading.category).to_lowercase(),
        if reading.compliance.is_compliant() {
            "within limit"
        } else {
            "exceeding"
        },
        marker
    );
    Ok(())
}

fn print_summary(session: &Session, json: bool) -> Result<()> {
    let summary = session.summary();
    if json {
        println!("{}", serde_json::to_string(&summary)?);
        return Ok(());
    }

    let fmt_level = |level: Option<f64>| level.map_or("-".to_string(), |l| format!("{l:.1} dB"));
    println!("--- session summary ---");
    println!("readings:        {}", summary.readings);
    println!("duration:        {:.1} s", summary.duration_ms as f64 / 1_000.0);
    println!(
        "min/mean/max:    {} / {} / {}",
        fmt_level(summary.min_level),
        fmt_level(summary.mean_level),
        fmt_level(summary.max_level)
    );
    if let Some(ratio) = summary.within_limit_ratio {
        println!("within limit:    {:.0}%", ratio * 100.0);
    }
    println!("limit restored:  {}", summary.limit_restored);
    println!("limit breached:  {}", summary.limit_breached);
    println!("reached high:    {}", if summary.latched { "yes" } else { "no" });
    Ok(())
}
