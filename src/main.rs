// Anchor tracker simulation
//
// Drives the tracker with a simulated vehicle moving at constant velocity
// and noisy anchor fixes delivered every few ticks.

use anchor_tracking::{
    AnchorTracker, ConfigurationManager, EstimateFormatter, EstimateRecord, MockPositionSource,
    OutputFormat, PositionFix, TrackerError, Vect3,
};
use clap::Parser;
use rand::Rng;
use tracing::{info, warn};

/// Anchor tracker simulation
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
struct Config {
    /// JSON tracker configuration file (defaults are used when omitted)
    #[arg(long, value_name = "FILE")]
    config: Option<String>,

    /// Number of prediction ticks to simulate
    #[arg(long, default_value_t = 500)]
    steps: u32,

    /// Deliver an anchor fix every N ticks
    #[arg(long, value_name = "N", default_value_t = 5)]
    fix_every: u32,

    /// Half-width of the uniform noise added to each fix axis (meters)
    #[arg(long, default_value_t = 0.05)]
    noise: f32,

    /// Simulated vehicle velocity as vx,vy,vz (m/s)
    #[arg(long, value_name = "VX,VY,VZ", default_value = "1.0,0.5,0.0")]
    velocity: String,

    /// Print an estimate every N ticks
    #[arg(long, value_name = "N", default_value_t = 50)]
    print_every: u32,

    /// Output format: text, json or csv
    #[arg(long, default_value = "text")]
    format: OutputFormat,

    /// Verbose logging (DEBUG level)
    #[arg(long, short, default_value_t = false)]
    verbose: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Config::parse();
    init_logging(args.verbose);

    let mut manager = match &args.config {
        Some(path) => {
            info!("Loading configuration from {}", path);
            ConfigurationManager::from_file(path)?
        }
        None => ConfigurationManager::new(),
    };
    let tracker_config = manager.get_config().clone();
    manager.lock_sample_period();

    let velocity = parse_vector(&args.velocity)?;
    let dt = tracker_config.filter.sample_period_s;
    let fix_every = args.fix_every.max(1);
    let print_every = args.print_every.max(1);

    info!(
        "Simulating {} ticks at dt={}s, fix every {} ticks, velocity=({}, {}, {})",
        args.steps, dt, fix_every, velocity.x, velocity.y, velocity.z
    );

    let mut tracker = AnchorTracker::new(&tracker_config, MockPositionSource::new(1))?;
    let formatter = EstimateFormatter::new(args.format);
    if let Some(header) = formatter.header() {
        println!("{}", header);
    }

    let mut rng = rand::thread_rng();
    for step in 1..=args.steps {
        if step % fix_every == 0 {
            let truth = velocity * (step as f32 * dt);
            let noisy = truth + Vect3::from_fn(|_, _| {
                if args.noise > 0.0 {
                    rng.gen_range(-args.noise..args.noise)
                } else {
                    0.0
                }
            });
            let timestamp_ms = (step as f32 * dt * 1000.0) as u64;
            tracker.source_mut().push_fix(PositionFix::new(noisy.x, noisy.y, noisy.z).with_timestamp(timestamp_ms));
        }

        match tracker.tick() {
            Ok(_) => {}
            Err(TrackerError::Source(error)) if error.is_recoverable() => {
                warn!("Tick {} without fixes: {}", step, error);
            }
            Err(error) => return Err(error.into()),
        }

        if step % print_every == 0 || step == args.steps {
            let record = EstimateRecord {
                estimate: tracker.estimate(),
                health: tracker.health(),
            };
            println!("{}", formatter.format_record(&record)?);
        }
    }

    let truth = velocity * (args.steps as f32 * dt);
    let error = (tracker.filter().get_position() - truth).norm();
    let stats = tracker.stats();
    info!(
        "Done: {} predictions, {} corrections applied, {} skipped, final position error {:.4} m",
        stats.predictions, stats.corrections_applied, stats.corrections_skipped, error
    );

    Ok(())
}

fn parse_vector(text: &str) -> Result<Vect3, String> {
    let parts: Vec<&str> = text.split(',').map(str::trim).collect();
    if parts.len() != 3 {
        return Err(format!("expected three comma-separated values, got '{}'", text));
    }
    let mut values = [0.0f32; 3];
    for (slot, part) in values.iter_mut().zip(parts) {
        *slot = part
            .parse()
            .map_err(|e| format!("invalid component '{}': {}", part, e))?;
    }
    Ok(Vect3::from(values))
}

/// Initialize logging subsystem
fn init_logging(verbose: bool) {
    let subscriber = tracing_subscriber::fmt()
        .with_target(false)
        .with_thread_ids(false)
        .with_level(true)
        .with_writer(std::io::stderr);

    if verbose {
        subscriber
            .with_max_level(tracing::Level::DEBUG)
            .init();
        info!("Verbose logging enabled (DEBUG level)");
    } else {
        subscriber
            .with_max_level(tracing::Level::INFO)
            .init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_vector() {
        assert_eq!(parse_vector("1.0, -2,0.5").unwrap(), Vect3::new(1.0, -2.0, 0.5));
        assert!(parse_vector("1,2").is_err());
        assert!(parse_vector("1,x,3").is_err());
    }

    #[test]
    fn test_cli_defaults() {
        let args = Config::parse_from(["anchor_tracking"]);
        assert_eq!(args.steps, 500);
        assert_eq!(args.format, OutputFormat::Text);
        assert!(args.config.is_none());
    }
}
