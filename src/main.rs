use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Deserialize;

use motoric::config::HumanizeConfig;
use motoric::fitts::DurationModel;
use motoric::keystroke::KeystrokeTimer;
use motoric::model::{MouseButton, Point};
use motoric::profile::{KeystrokeSample, MouseSample, PersonalProfile, ProfileLearner};
use motoric::script;
use motoric::store::{CoordinateStore, CoordinateType};
use motoric::trajectory::plan_trajectory;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum CoordinateTypeArg {
    /// Never expected to move.
    Static,
    /// May drift between sessions.
    Dynamic,
}

impl CoordinateTypeArg {
    fn to_library(self) -> CoordinateType {
        match self {
            CoordinateTypeArg::Static => CoordinateType::Static,
            CoordinateTypeArg::Dynamic => CoordinateType::Dynamic,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "motoric")]
#[command(about = "Humanized input planning and coordinate-cache tooling", long_about = None)]
struct Cli {
    /// Optional config file (JSON). Unknown keys are rejected.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Plan a humanized move-and-click as an action sequence (JSON)
    Move {
        /// Start point, e.g. 100,200
        #[arg(long, value_name = "X,Y")]
        from: String,

        /// Target point, e.g. 640,480
        #[arg(long, value_name = "X,Y")]
        to: String,

        /// Target width in pixels, for pacing
        #[arg(long)]
        width: Option<f64>,

        /// Calibrated profile to pace the movement with
        #[arg(long, value_name = "PATH")]
        profile: Option<PathBuf>,

        /// Optional RNG seed (for debugging)
        #[arg(long)]
        seed: Option<u64>,

        /// Output actions file (defaults to stdout)
        #[arg(long, value_name = "PATH")]
        output: Option<PathBuf>,
    },

    /// Plan humanized typing as an action sequence (JSON)
    Type {
        /// Input text file, or '-' for stdin
        #[arg(long, value_name = "PATH")]
        input: PathBuf,

        /// Calibrated profile to pace the typing with
        #[arg(long, value_name = "PATH")]
        profile: Option<PathBuf>,

        /// Optional RNG seed (for debugging)
        #[arg(long)]
        seed: Option<u64>,

        /// Output actions file (defaults to stdout)
        #[arg(long, value_name = "PATH")]
        output: Option<PathBuf>,
    },

    /// Fit a personal profile from recorded samples
    Learn {
        /// Recorded samples (JSON with mouse_samples and keystroke_samples)
        #[arg(long, value_name = "PATH")]
        samples: PathBuf,

        /// Profile name
        #[arg(long)]
        name: String,

        /// Output profile file
        #[arg(long, value_name = "PATH")]
        output: PathBuf,
    },

    /// Inspect or seed a coordinate store
    Store {
        /// Store file (JSON)
        #[arg(long, value_name = "PATH")]
        file: PathBuf,

        /// Platform tag recorded in new store files
        #[arg(long, default_value = "linux")]
        platform: String,

        /// Screen resolution recorded in new store files, e.g. 1920x1080
        #[arg(long, default_value = "1920x1080")]
        resolution: String,

        #[command(subcommand)]
        command: StoreCommand,
    },
}

#[derive(Debug, Subcommand)]
enum StoreCommand {
    /// Print aggregate click/healing statistics
    Stats,

    /// List all known steps with their coordinates and counters
    List,

    /// Seed a step with known coordinates
    Seed {
        /// Step name
        #[arg(long)]
        step: String,

        /// Coordinates, e.g. 640,480
        #[arg(long, value_name = "X,Y")]
        at: String,

        #[arg(long, value_enum, default_value_t = CoordinateTypeArg::Static)]
        kind: CoordinateTypeArg,

        #[arg(long, default_value = "")]
        description: String,

        /// Accept healed x only inside this range, e.g. 400,600
        #[arg(long, value_name = "MIN,MAX")]
        x_range: Option<String>,
    },
}

#[derive(Debug, Deserialize)]
struct SampleFile {
    #[serde(default)]
    mouse_samples: Vec<MouseSample>,
    #[serde(default)]
    keystroke_samples: Vec<KeystrokeSample>,
}

fn parse_pair(s: &str, what: &str) -> Result<(i32, i32)> {
    let (a, b) = s
        .split_once(',')
        .ok_or_else(|| anyhow!("{what} must look like A,B, got {s:?}"))?;
    Ok((
        a.trim().parse().with_context(|| format!("bad {what}: {s:?}"))?,
        b.trim().parse().with_context(|| format!("bad {what}: {s:?}"))?,
    ))
}

fn parse_point(s: &str) -> Result<Point> {
    let (x, y) = parse_pair(s, "point")?;
    Ok(Point::new(x, y))
}

fn parse_resolution(s: &str) -> Result<(u32, u32)> {
    let (w, h) = s
        .split_once('x')
        .ok_or_else(|| anyhow!("resolution must look like WIDTHxHEIGHT, got {s:?}"))?;
    Ok((
        w.trim().parse().with_context(|| format!("bad resolution: {s:?}"))?,
        h.trim().parse().with_context(|| format!("bad resolution: {s:?}"))?,
    ))
}

fn read_input(path: &PathBuf) -> Result<String> {
    if path.as_os_str() == std::ffi::OsStr::new("-") {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read stdin")?;
        return Ok(buf);
    }

    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn write_output(path: Option<&PathBuf>, contents: &str) -> Result<()> {
    match path {
        Some(path) => fs::write(path, contents)
            .with_context(|| format!("failed to write {}", path.display())),
        None => {
            println!("{contents}");
            Ok(())
        }
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<HumanizeConfig> {
    let cfg = match path {
        Some(path) => HumanizeConfig::load(path)?,
        None => HumanizeConfig::default(),
    };
    cfg.validate()?;
    Ok(cfg)
}

fn load_profile(path: Option<&PathBuf>) -> Result<Option<PersonalProfile>> {
    path.map(|p| PersonalProfile::load(p)).transpose()
}

fn rng_from_seed(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

fn print_action_summary(actions: &[motoric::model::InputAction]) {
    let stats = script::stats(actions);
    eprintln!(
        "Planned: {} actions ({} moves, {} key events, {} button events), ~{:.2} s",
        stats.actions,
        stats.moves,
        stats.key_events,
        stats.button_events,
        stats.total_wait_ms as f64 / 1000.0
    );
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref())?;

    match cli.command {
        Command::Move {
            from,
            to,
            width,
            profile,
            seed,
            output,
        } => {
            let start = parse_point(&from)?;
            let end = parse_point(&to)?;
            let mut rng = rng_from_seed(seed);

            let model = match load_profile(profile.as_ref())? {
                Some(p) => DurationModel::new(p.fitts_intercept_ms, p.fitts_slope_ms, &config),
                None => DurationModel::with_defaults(&config),
            };

            let duration = model.duration_between(start, end, width);
            let trajectory = plan_trajectory(start, end, &config, duration, &mut rng);
            let actions = script::click_actions(&trajectory, MouseButton::Left, &mut rng);

            print_action_summary(&actions);
            let json =
                serde_json::to_string_pretty(&actions).context("failed to serialize actions")?;
            write_output(output.as_ref(), &json)?;
        }
        Command::Type {
            input,
            profile,
            seed,
            output,
        } => {
            let text = read_input(&input)?;
            let mut rng = rng_from_seed(seed);

            let timer = match load_profile(profile.as_ref())? {
                Some(p) => KeystrokeTimer::from_profile(&p, &config),
                None => KeystrokeTimer::from_config(&config),
            };

            let actions = script::type_actions(&timer, &text, &mut rng);

            print_action_summary(&actions);
            let json =
                serde_json::to_string_pretty(&actions).context("failed to serialize actions")?;
            write_output(output.as_ref(), &json)?;
        }
        Command::Learn {
            samples,
            name,
            output,
        } => {
            let json = fs::read_to_string(&samples)
                .with_context(|| format!("failed to read {}", samples.display()))?;
            let file: SampleFile =
                serde_json::from_str(&json).context("failed to parse samples JSON")?;

            let mut learner = ProfileLearner::new();
            for sample in file.mouse_samples {
                learner.add_mouse_sample(sample);
            }
            for sample in file.keystroke_samples {
                learner.add_keystroke_sample(sample);
            }

            let profile = learner.analyze(&name);
            eprintln!(
                "Learned {:?}: {} mouse + {} keystroke samples, Fitts a={:.1} b={:.1}, {:.1} WPM",
                profile.name,
                profile.mouse_samples.len(),
                profile.keystroke_samples.len(),
                profile.fitts_intercept_ms,
                profile.fitts_slope_ms,
                profile.wpm_mean
            );
            profile.save(&output)?;
        }
        Command::Store {
            file,
            platform,
            resolution,
            command,
        } => {
            let resolution = parse_resolution(&resolution)?;
            let store = CoordinateStore::open(
                &file,
                &platform,
                resolution,
                config.consecutive_failure_threshold,
            )?;

            match command {
                StoreCommand::Stats => {
                    let stats = store.get_stats();
                    println!(
                        "clicks: {} total, {} ok, {} failed; healing events: {}{}",
                        stats.total_clicks,
                        stats.successful_clicks,
                        stats.failed_clicks,
                        stats.healing_events,
                        stats
                            .last_healing
                            .map(|t| format!("; last healing {t}"))
                            .unwrap_or_default()
                    );
                }
                StoreCommand::List => {
                    for step in store.get_all_steps() {
                        let Some(entry) = store.get_entry(&step) else {
                            continue;
                        };
                        let coords = entry
                            .coordinates()
                            .map(|p| format!("({}, {})", p.x, p.y))
                            .unwrap_or_else(|| "unknown".to_string());
                        println!(
                            "{step}: {coords} ok={} fail={} consecutive={} heals={}",
                            entry.success_count,
                            entry.failure_count,
                            entry.consecutive_failures,
                            entry.healing_history.len()
                        );
                    }
                }
                StoreCommand::Seed {
                    step,
                    at,
                    kind,
                    description,
                    x_range,
                } => {
                    let coords = parse_point(&at)?;
                    let x_range = x_range
                        .as_deref()
                        .map(|s| parse_pair(s, "x_range"))
                        .transpose()?;
                    store.add_coordinate(
                        &step,
                        coords,
                        kind.to_library(),
                        &description,
                        x_range,
                    );
                    eprintln!("Seeded {step:?} at ({}, {})", coords.x, coords.y);
                }
            }
        }
    }

    Ok(())
}
