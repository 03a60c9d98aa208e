use std::fs;
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum, ValueHint};
use mapty::{
    Coords, Discipline, FileStorage, Metrics, Tracker, TrackerConfig, Workout, WorkoutCard,
    WorkoutForm,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Mapty workout journal CLI", long_about = None)]
struct Cli {
    /// Key/value store file holding the workout list
    #[arg(
        long,
        global = true,
        env = "MAPTY_STORE",
        default_value = "mapty-store.json",
        value_hint = ValueHint::FilePath
    )]
    store: PathBuf,

    /// Optional JSON file overriding tracker settings
    #[arg(long, global = true, value_hint = ValueHint::FilePath)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true, action = ArgAction::SetTrue)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Record a new workout at the given location
    Add(AddArgs),
    /// Print every stored workout, oldest first
    List(ListArgs),
    /// Print the coordinates of one workout
    Locate(LocateArgs),
    /// Write the workout list as CSV
    Export(ExportArgs),
    /// Remove the stored workout list
    Reset,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum DisciplineOpt {
    Running,
    Cycling,
}

impl From<DisciplineOpt> for Discipline {
    fn from(value: DisciplineOpt) -> Self {
        match value {
            DisciplineOpt::Running => Discipline::Running,
            DisciplineOpt::Cycling => Discipline::Cycling,
        }
    }
}

#[derive(Args, Debug)]
struct AddArgs {
    #[arg(value_enum)]
    discipline: DisciplineOpt,

    /// Latitude of the workout
    #[arg(long, allow_hyphen_values = true)]
    lat: f64,

    /// Longitude of the workout
    #[arg(long, allow_hyphen_values = true)]
    lng: f64,

    /// Distance (km)
    #[arg(long, allow_hyphen_values = true)]
    distance: String,

    /// Duration (min)
    #[arg(long, allow_hyphen_values = true)]
    duration: String,

    /// Cadence (steps/min), running only
    #[arg(long, default_value = "", allow_hyphen_values = true)]
    cadence: String,

    /// Elevation gain (m), cycling only
    #[arg(long, default_value = "", allow_hyphen_values = true)]
    elevation: String,
}

#[derive(Args, Debug)]
struct ListArgs {
    /// Print the stored JSON records instead of cards
    #[arg(long, action = ArgAction::SetTrue)]
    json: bool,
}

#[derive(Args, Debug)]
struct LocateArgs {
    id: String,
}

#[derive(Args, Debug)]
struct ExportArgs {
    /// Output CSV path (`-` for stdout)
    #[arg(short, long, default_value = "-", value_hint = ValueHint::FilePath)]
    output: PathBuf,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    let config = match cli.config.as_ref() {
        Some(path) => load_config(path)?,
        None => TrackerConfig::default(),
    };
    let mut tracker = Tracker::new(FileStorage::new(&cli.store), &config);
    tracker.restore();

    match cli.command {
        Command::Add(args) => handle_add(&mut tracker, args),
        Command::List(args) => handle_list(&tracker, args),
        Command::Locate(args) => handle_locate(&mut tracker, args),
        Command::Export(args) => handle_export(&tracker, args),
        Command::Reset => {
            tracker
                .reset()
                .with_context(|| format!("failed to reset {}", cli.store.display()))?;
            info!("cleared workouts from {}", cli.store.display());
            Ok(())
        }
    }
}

fn load_config(path: &Path) -> Result<TrackerConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("{} is not valid JSON", path.display()))
}

fn handle_add(tracker: &mut Tracker<FileStorage>, args: AddArgs) -> Result<()> {
    let discipline: Discipline = args.discipline.into();
    match discipline {
        Discipline::Running if !args.elevation.is_empty() => {
            warn!("--elevation is ignored for running workouts")
        }
        Discipline::Cycling if !args.cadence.is_empty() => {
            warn!("--cadence is ignored for cycling workouts")
        }
        _ => {}
    }
    let form = WorkoutForm {
        discipline,
        distance: args.distance,
        duration: args.duration,
        cadence: args.cadence,
        elevation: args.elevation,
    };
    tracker.begin_entry(Coords::new(args.lat, args.lng));
    let workout = tracker.submit(&form)?;
    println!("{}", WorkoutCard::from_workout(workout));
    ensure_persisted(tracker)
}

// `submit` only logs a failed write; the CLI has nothing else to show, so check.
fn ensure_persisted(tracker: &Tracker<FileStorage>) -> Result<()> {
    let stored = tracker
        .store()
        .try_load()
        .with_context(|| {
            format!(
                "failed to re-read {}",
                tracker.store().storage().path().display()
            )
        })?
        .unwrap_or_default();
    if stored.len() != tracker.workouts().len() {
        return Err(anyhow!(
            "workout was not saved to {}",
            tracker.store().storage().path().display()
        ));
    }
    Ok(())
}

fn handle_list(tracker: &Tracker<FileStorage>, args: ListArgs) -> Result<()> {
    let workouts = tracker.workouts();
    if args.json {
        let text = serde_json::to_string_pretty(workouts)?;
        println!("{text}");
        return Ok(());
    }
    if workouts.is_empty() {
        info!("no workouts stored yet");
    }
    for workout in workouts {
        println!("{}", WorkoutCard::from_workout(workout));
    }
    Ok(())
}

fn handle_locate(tracker: &mut Tracker<FileStorage>, args: LocateArgs) -> Result<()> {
    let coords = tracker
        .locate(&args.id)
        .ok_or_else(|| anyhow!("no workout with id {}", args.id))?;
    tracker
        .persist()
        .with_context(|| format!("recording lookup of {}", args.id))?;
    println!("{:.6},{:.6}", coords.lat, coords.lng);
    Ok(())
}

fn handle_export(tracker: &Tracker<FileStorage>, args: ExportArgs) -> Result<()> {
    if args.output.as_os_str() == "-" {
        let stdout = io::stdout();
        let mut writer = csv::Writer::from_writer(stdout.lock());
        write_workout_rows(tracker.workouts(), &mut writer)
    } else {
        let file = File::create(&args.output)
            .with_context(|| format!("failed to create {}", args.output.display()))?;
        let mut writer = csv::Writer::from_writer(file);
        write_workout_rows(tracker.workouts(), &mut writer)?;
        info!(
            "wrote {} workouts to {}",
            tracker.workouts().len(),
            args.output.display()
        );
        Ok(())
    }
}

fn write_workout_rows<W: Write>(workouts: &[Workout], writer: &mut csv::Writer<W>) -> Result<()> {
    writer.write_record([
        "id",
        "type",
        "date",
        "lat",
        "lng",
        "distance_km",
        "duration_min",
        "pace_min_per_km",
        "speed_km_per_h",
        "cadence_spm",
        "elevation_gain_m",
        "description",
    ])?;
    for w in workouts {
        let (pace, speed, cadence, elevation) = match &w.metrics {
            Metrics::Running { cadence, pace } => {
                (format!("{pace:.1}"), String::new(), cadence.to_string(), String::new())
            }
            Metrics::Cycling {
                elevation_gain,
                speed,
            } => (
                String::new(),
                format!("{speed:.1}"),
                String::new(),
                elevation_gain.to_string(),
            ),
        };
        writer.write_record([
            w.id.clone(),
            w.discipline().to_string(),
            w.date.to_rfc3339(),
            w.coords.lat.to_string(),
            w.coords.lng.to_string(),
            w.distance.to_string(),
            w.duration.to_string(),
            pace,
            speed,
            cadence,
            elevation,
            w.description.clone(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}
