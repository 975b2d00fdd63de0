//! Wiring and command handlers.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. Load SyncConfig (defaults < sync.toml < LIFTLOG_* env)             │
//! │  2. Open SQLite store, run migrations                                   │
//! │  3. Connectivity (--offline) + AuthSession::restore                     │
//! │  4. Start workout and rest-day engines over ApiClient                   │
//! │  5. WorkoutTracker::load (caps a stale workout)                         │
//! │  6. Run the command                                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use liftlog_core::{StoredWorkout, WeightUnit};
use liftlog_db::{Database, DbConfig};
use liftlog_sync::{
    ApiClient, AuthSession, ConnectivityMonitor, LoadOutcome, RestDaySyncAdapter, SyncAdapter, SyncConfig,
    SyncEventEmitter, SyncSignals, SyncView, SyncedSave, WorkoutRemote, WorkoutSyncAdapter, WorkoutTracker,
};

use crate::cli::{Cli, Command};
use crate::error::{CliError, CliResult};

// =============================================================================
// Terminal Events
// =============================================================================

/// Prints retry and failure events for the user; state changes are only
/// logged.
struct TerminalEmitter;

impl SyncEventEmitter for TerminalEmitter {
    fn emit_status(&self, adapter: &str, view: &SyncView) {
        debug!(adapter, status = %view.status_line(Utc::now()), "Sync status");
    }

    fn emit_retry_scheduled(&self, adapter: &str, attempt: u32, delay: Duration) {
        eprintln!("[{}] retry {} in {}s", adapter, attempt, delay.as_secs());
    }

    fn emit_error(&self, adapter: &str, message: &str, retryable: bool) {
        if !retryable {
            eprintln!("[{}] {}", adapter, message);
        }
    }
}

// =============================================================================
// App
// =============================================================================

struct App {
    db: Database,
    connectivity: ConnectivityMonitor,
    auth: AuthSession,
    tracker: WorkoutTracker,
}

impl App {
    async fn open(config: &SyncConfig, offline: bool) -> CliResult<Self> {
        let path = config.database_path().ok_or(CliError::NoDatabasePath)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = Database::new(DbConfig::new(path)).await?;

        let connectivity = ConnectivityMonitor::new(!offline);
        let auth = AuthSession::new(Arc::new(db.credentials()));
        auth.restore().await?;

        let api: Arc<dyn WorkoutRemote> = Arc::new(ApiClient::new(config, auth.store())?);
        let signals = SyncSignals::from_sources(&connectivity, &auth);
        let emitter: Arc<dyn SyncEventEmitter> = Arc::new(TerminalEmitter);

        let workouts = SyncedSave::start_with_emitter(
            WorkoutSyncAdapter::from_database(&db, api.clone()),
            signals.clone(),
            config.engine_options(),
            emitter.clone(),
        )
        .await?;
        let rest_days = SyncedSave::start_with_emitter(
            RestDaySyncAdapter::from_database(&db, api),
            signals,
            config.engine_options(),
            emitter,
        )
        .await?;

        let tracker = WorkoutTracker::new(db.local_store(), workouts, rest_days);
        if let LoadOutcome::Capped(workout) = tracker.load().await? {
            println!(
                "Workout started {} was open over 24h; it was closed and queued for sync.",
                workout.start_time.format("%Y-%m-%d %H:%M")
            );
        }

        Ok(App {
            db,
            connectivity,
            auth,
            tracker,
        })
    }

    async fn close(self) {
        self.tracker.workouts().shutdown();
        self.tracker.rest_days().shutdown();
        self.db.close().await;
    }
}

pub async fn run(cli: Cli) -> CliResult<()> {
    let config = SyncConfig::load(cli.config)?;
    let app = App::open(&config, cli.offline).await?;
    info!(online = app.connectivity.is_online(), authenticated = app.auth.is_authenticated(), "Ready");

    let result = dispatch(&app, cli.command).await;
    app.close().await;
    result
}

async fn dispatch(app: &App, command: Command) -> CliResult<()> {
    let tracker = &app.tracker;

    match command {
        Command::Status => print_status(app).await?,

        Command::Start => {
            let workout = tracker.start().await?;
            println!("Workout started ({}).", workout.id);
        }

        Command::AddExercise {
            exercise_id,
            name,
            profile,
        } => {
            let workout = tracker.add_exercise(&exercise_id, &name, profile).await?;
            println!("Added {}. {} exercise(s) in workout.", name, workout.exercises.len());
        }

        Command::AddSet {
            exercise_id,
            reps,
            weight,
            unit,
        } => {
            let suggestion = tracker.suggest_set(&exercise_id).await?;
            let set = tracker
                .add_set(
                    &exercise_id,
                    reps.unwrap_or(suggestion.reps),
                    weight.unwrap_or(suggestion.weight),
                    unit.unwrap_or(suggestion.weight_unit),
                )
                .await?;
            println!("Logged {} × {}{}.", set.reps, set.weight, set.weight_unit);
        }

        Command::Finish { name, gym } => {
            let finished = tracker.finish(name, gym).await?;
            println!(
                "Workout finished: {} exercise(s), {} set(s).",
                finished.workout.exercises.len(),
                finished.workout.set_count()
            );
            print_outcome(finished.synced, &tracker.workouts().view());
        }

        Command::Cancel => {
            tracker.cancel().await?;
            println!("Workout discarded.");
        }

        Command::RestDay => {
            let finished = tracker.log_rest_day().await?;
            println!("Rest day logged.");
            print_outcome(finished.synced, &tracker.rest_days().view());
        }

        Command::Sync { wait } => {
            sync_engine(tracker.workouts(), wait).await;
            sync_engine(tracker.rest_days(), wait).await;
        }

        Command::Login {
            access_token,
            refresh_token,
        } => {
            app.auth.login(&access_token, refresh_token.as_deref()).await?;
            println!("Signed in. Run `liftlog sync` to upload anything pending.");
        }

        Command::Logout => {
            app.auth.logout().await?;
            println!("Signed out. Unsynced items stay on this device.");
        }

        Command::Settings { privacy, unit } => {
            let store = app.db.local_store();
            let mut settings = store.settings().await?;

            if privacy.is_some() || unit.is_some() {
                if let Some(privacy) = privacy {
                    settings.default_privacy = privacy;
                }
                if unit.is_some() {
                    settings.display_unit = unit;
                }
                store.save_settings(&settings).await?;
            }

            println!("default privacy: {}", settings.default_privacy);
            println!(
                "display unit:    {}",
                settings.display_unit.map(|u| u.to_string()).unwrap_or_else(|| "as entered".into())
            );
            println!("rest timer:      {}s", settings.default_rest_timer_seconds);
        }
    }

    Ok(())
}

// =============================================================================
// Output
// =============================================================================

async fn sync_engine<A: SyncAdapter>(engine: &SyncedSave<A>, wait: bool) {
    let name = engine.adapter().name();

    if !engine.force_sync().await {
        let state = engine.state();
        if wait && state.has_pending && state.next_retry_at.is_some() {
            let max = engine.options().retry.max_retries;
            let mut rx = engine.subscribe();
            let _ = rx.wait_for(|s| !s.has_pending || s.retry_count >= max).await;
        }
    }

    println!("{:<9} {}", name, engine.view().status_line(Utc::now()));
}

fn print_outcome(synced: bool, view: &SyncView) {
    if synced {
        println!("Synced.");
    } else {
        println!("{}", view.status_line(Utc::now()));
        if let Some(error) = &view.error {
            println!("  ({})", error);
        }
    }
}

async fn print_status(app: &App) -> CliResult<()> {
    let tracker = &app.tracker;

    match tracker.current().await? {
        Some(workout) => print_workout(&workout),
        None => println!("No workout in progress."),
    }
    println!();

    println!(
        "online: {}  signed in: {}",
        yes_no(app.connectivity.is_online()),
        yes_no(app.auth.is_authenticated())
    );

    let now = Utc::now();
    let workouts = tracker.workouts().view();
    let rest_days = tracker.rest_days().view();
    println!("{:<9} {}", "workout", workouts.status_line(now));
    println!("{:<9} {}", "rest_day", rest_days.status_line(now));

    let last_sync = [workouts.last_sync_time, rest_days.last_sync_time].into_iter().flatten().max();
    match last_sync {
        Some(at) => println!("last sync: {}", at.format("%Y-%m-%d %H:%M:%S UTC")),
        None => println!("last sync: never"),
    }

    Ok(())
}

fn print_workout(workout: &StoredWorkout) {
    let minutes = (Utc::now() - workout.start_time).num_minutes();
    println!("Workout in progress: {} min, {} set(s)", minutes, workout.set_count());

    for exercise in &workout.exercises {
        let sets: Vec<String> = exercise
            .sets
            .iter()
            .map(|s| format_set(s.reps, s.weight, s.weight_unit))
            .collect();
        println!("  {:<20} {}", exercise.exercise_name, sets.join(", "));
    }
}

fn format_set(reps: u32, weight: f64, unit: WeightUnit) -> String {
    format!("{}×{}{}", reps, weight, unit)
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}
