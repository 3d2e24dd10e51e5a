mod traffic;

use anyhow::{anyhow, Result};
use clap::{Args, Parser, Subcommand};
use crossbeam_channel::select;
use sawf_config::{load_config, Config, ConfigStore, DetectionStrategy};
use sawf_telemetry::{BreachEvent, ChannelNotifier, SawfTelemetry, StatsHandle};
use sawf_utils::rate_scale::{scale_byte_rate, scale_delay_us};
use sawf_utils::MacAddress;
use signal_hook::{
    consts::{SIGINT, SIGTERM},
    iterator::Signals,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::level_filters::LevelFilter;
use tracing::{info, warn};
use traffic::{SyntheticTraffic, TrafficProfile};

#[derive(Parser)]
#[command(about = "Exercise a SAWF SLA configuration against synthetic peers")]
struct Cli {
    /// Configuration file. Defaults to $SAWF_CONFIG, then /etc/sawf.conf
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the configuration and print what it enables
    Check,
    /// Attach synthetic peers and report breaches as they happen
    Run(RunArgs),
}

#[derive(Args)]
struct RunArgs {
    /// How long to run, in seconds
    #[arg(long, default_value_t = 30)]
    seconds: u64,

    /// Number of peers to attach
    #[arg(long, default_value_t = 1)]
    peers: u8,

    /// Service class for every peer. Defaults to the first class with an SLA
    #[arg(long)]
    service_class: Option<u8>,

    /// MAC address of the first peer; later peers count up from it
    #[arg(long, default_value = "02:00:00:00:00:01")]
    mac: String,

    /// TID of the simulated queue
    #[arg(long, default_value_t = 0)]
    tid: u8,

    /// Offered load per peer, kbit/s
    #[arg(long, default_value_t = 2000)]
    offered_kbps: u64,

    /// Percentage of traffic delivered (and of packets meeting their targets)
    #[arg(long, default_value_t = 100)]
    delivered_pct: u64,

    /// Hardware delay reported to the moving average, µs
    #[arg(long, default_value_t = 500)]
    hw_delay_us: u64,

    /// Average MSDU size, bytes
    #[arg(long, default_value_t = 1500)]
    msdu_bytes: u64,

    /// Interval between data-path reports, ms
    #[arg(long, default_value_t = 100)]
    report_ms: u64,
}

/// Console logging at the level named by `RUST_LOG`, WARN otherwise.
fn set_console_logging() -> Result<()> {
    let level = std::env::var("RUST_LOG")
        .ok()
        .and_then(|level| level.trim().parse::<LevelFilter>().ok())
        .unwrap_or(LevelFilter::WARN);

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .compact()
        .with_file(true)
        .with_line_number(true)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn main() -> Result<()> {
    set_console_logging()?;
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Arc::new(Config::load_from_path(path)?),
        None => load_config()?,
    };

    match cli.command {
        Some(Commands::Check) => check(&config),
        Some(Commands::Run(args)) => run(&config, args),
        None => {
            println!("Run with --help to see instructions");
            Ok(())
        }
    }
}

fn check(config: &Config) -> Result<()> {
    let store = ConfigStore::from_config(config)?;
    let snapshot = store.snapshot();
    let moving_average = snapshot.moving_average();
    let period = snapshot.sla_period();

    println!("Configuration OK");
    println!(
        "Moving average: {} packets x {} windows",
        moving_average.packets, moving_average.windows
    );
    println!("SLA period: {} packets / {} s", period.packets, period.seconds);
    for strategy in DetectionStrategy::ALL {
        let enabled: Vec<_> = strategy
            .parameters()
            .iter()
            .filter(|p| snapshot.detection(strategy).is_set(**p))
            .map(|p| p.name())
            .collect();
        println!("Detection {strategy}: {}", describe(&enabled));
    }
    for id in snapshot.configured_ids() {
        let sla: Vec<_> = snapshot
            .sla(id)
            .iter()
            .filter(|(_, threshold)| *threshold != 0)
            .map(|(p, threshold)| format!("{p} {threshold}%"))
            .collect();
        println!("Service class {id}: SLA {}", describe(&sla));
    }
    Ok(())
}

fn describe<T: AsRef<str>>(items: &[T]) -> String {
    if items.is_empty() {
        return "none".to_string();
    }
    items.iter().map(|s| s.as_ref()).collect::<Vec<_>>().join(", ")
}

fn print_event(event: &BreachEvent) {
    let state = if event.breached { "BREACH" } else { "clear " };
    println!(
        "{state} {} class {} tid {}: {}",
        event.mac, event.service_class_id, event.tid, event.parameter
    );
}

fn run(config: &Config, args: RunArgs) -> Result<()> {
    let store = Arc::new(ConfigStore::from_config(config)?);
    let snapshot = store.snapshot();
    let service_class = match args.service_class {
        Some(id) => id,
        None => snapshot
            .configured_ids()
            .find(|id| snapshot.sla_configured(*id))
            .ok_or_else(|| anyhow!("No service class has an SLA configured"))?,
    };
    if !snapshot.sla_configured(service_class) {
        warn!("Service class {service_class} has no SLA; nothing will be reported");
    }

    let (notifier, events) = ChannelNotifier::new();
    let engine = SawfTelemetry::init(store, Arc::new(notifier));

    let profile = TrafficProfile {
        offered_kbps: args.offered_kbps,
        delivered_pct: args.delivered_pct,
        hw_delay_us: args.hw_delay_us,
        msdu_bytes: args.msdu_bytes,
    };
    let base: MacAddress = args.mac.parse()?;
    let mut peers = Vec::with_capacity(args.peers as usize);
    for n in 0..args.peers {
        let mut octets = base.octets();
        octets[5] = octets[5].wrapping_add(n);
        let traffic = Arc::new(SyntheticTraffic::new(profile));
        let peer = engine.alloc_peer(
            traffic.clone(),
            StatsHandle(n as u64),
            MacAddress::new(octets),
            service_class,
            0,
        )?;
        engine.update_queue_mapping(&peer, 0, args.tid, 0)?;
        peers.push((peer, traffic));
    }
    info!(
        "Simulating {} peers in service class {service_class} for {} s",
        peers.len(),
        args.seconds
    );

    // Handle signals
    let (quit_tx, quit_rx) = crossbeam_channel::bounded(1);
    let mut signals = Signals::new([SIGINT, SIGTERM])?;
    std::thread::Builder::new()
        .name("Signal Handler".to_string())
        .spawn(move || {
            if let Some(sig) = signals.forever().next() {
                warn!("Terminating on signal {sig}");
                let _ = quit_tx.send(());
            }
        })?;

    let deadline = crossbeam_channel::after(Duration::from_secs(args.seconds));
    let report = crossbeam_channel::tick(Duration::from_millis(args.report_ms.max(1)));
    let mut transitions = 0usize;
    loop {
        select! {
            recv(report) -> _ => {
                for (peer, traffic) in &peers {
                    let (pass, fail) = traffic.delay_counts();
                    engine.update_delay(peer, args.tid, 0, pass, fail)?;
                    let (total, drop, ttl_drop) = traffic.msdu_counts();
                    engine.update_msdu_drop(peer, args.tid, 0, total, drop, ttl_drop)?;
                    engine.update_delay_moving_avg(peer, args.tid, 0, traffic.delay_sample())?;
                }
            }
            recv(events) -> event => {
                if let Ok(event) = event {
                    print_event(&event);
                    transitions += 1;
                }
            }
            recv(deadline) -> _ => break,
            recv(quit_rx) -> _ => break,
        }
    }

    for event in events.try_iter() {
        print_event(&event);
        transitions += 1;
    }

    println!("\n{transitions} breach transitions");
    for (peer, _) in &peers {
        let rate = engine.get_rate(peer, 0)?;
        let delay = engine.pull_moving_average(peer, 0)?;
        println!(
            "{}: in {} out {} hw delay {}",
            peer.mac(),
            scale_byte_rate(rate.ingress),
            scale_byte_rate(rate.egress),
            scale_delay_us(delay.hardware)
        );
    }
    for (peer, _) in peers {
        engine.free_peer(peer);
    }
    engine.shutdown();
    Ok(())
}
