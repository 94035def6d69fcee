use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use fitpro_core::*;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

#[derive(Parser)]
#[command(name = "fitpro")]
#[command(about = "FIT PRO coaching toolkit: nutrition targets and workout logging", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum SexArg {
    Male,
    Female,
}

impl From<SexArg> for Sex {
    fn from(arg: SexArg) -> Self {
        match arg {
            SexArg::Male => Sex::Male,
            SexArg::Female => Sex::Female,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Estimate basal and total daily energy expenditure
    Energy {
        /// Body weight in kg
        #[arg(long)]
        weight: f64,
        /// Height in cm
        #[arg(long)]
        height: f64,
        /// Age in years
        #[arg(long)]
        age: u32,
        #[arg(long, value_enum)]
        sex: SexArg,
        /// Body fat percentage
        #[arg(long)]
        body_fat: Option<f64>,
        /// Activity multiplier (defaults to the configured level)
        #[arg(long)]
        activity: Option<f64>,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Split a calorie target into protein, fat and carbohydrate
    Macros {
        /// Daily calorie target
        #[arg(long)]
        calories: f64,
        /// Body weight in kg
        #[arg(long)]
        weight: f64,
        /// Goal label (emagrecimento, hipertrofia, manutencao, ...)
        #[arg(long)]
        goal: Option<String>,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Run a workout session and log it
    Workout {
        /// Exercise as ID:SETSxREPS[@KG], repeatable
        #[arg(long = "exercise", required = true, value_parser = parse_exercise)]
        exercises: Vec<ExercisePlan>,

        /// Rest between sets in seconds (defaults to the configured value)
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        rest: Option<u32>,

        /// Student the session belongs to
        #[arg(long)]
        student: Option<String>,

        /// Complete every set at its target and skip real-time rest
        #[arg(long)]
        auto_complete: bool,

        /// Run the session without logging it
        #[arg(long)]
        dry_run: bool,
    },

    /// Log a meal
    Meal {
        #[arg(long)]
        student: String,
        /// Meal name, e.g. "Almoço"
        #[arg(long)]
        name: String,
        #[arg(long)]
        meal_plan: Option<String>,
        #[arg(long)]
        notes: Option<String>,
        /// Public URL of an already uploaded photo
        #[arg(long)]
        photo_url: Option<String>,
        /// Print the storage key for a photo with this extension
        #[arg(long)]
        photo_ext: Option<String>,
    },

    /// Roll up the session WAL to CSV
    Rollup {
        /// Clean up processed WAL files after rollup
        #[arg(long)]
        cleanup: bool,
    },

    /// Show recent workout history
    History {
        #[arg(long, default_value_t = 7)]
        days: i64,
    },
}

struct DataPaths {
    wal_dir: PathBuf,
    sessions_wal: PathBuf,
    meals_wal: PathBuf,
    sessions_csv: PathBuf,
}

impl DataPaths {
    fn new(data_dir: &Path) -> Self {
        let wal_dir = data_dir.join("wal");
        Self {
            sessions_wal: wal_dir.join("workout_sessions.wal"),
            meals_wal: wal_dir.join("meal_logs.wal"),
            sessions_csv: data_dir.join("sessions.csv"),
            wal_dir,
        }
    }
}

fn main() -> Result<()> {
    fitpro_core::logging::init();

    let cli = Cli::parse();

    let config = Config::load()?;
    let data_dir = cli
        .data_dir
        .unwrap_or_else(|| config.data.data_dir.clone());
    let paths = DataPaths::new(&data_dir);

    match cli.command {
        Commands::Energy {
            weight,
            height,
            age,
            sex,
            body_fat,
            activity,
            json,
        } => {
            let input = AnthropometricInput {
                weight,
                height,
                age,
                sex: sex.into(),
                body_fat,
                activity_level: activity.unwrap_or(config.nutrition.default_activity_level),
            };
            cmd_energy(&input, json)
        }
        Commands::Macros {
            calories,
            weight,
            goal,
            json,
        } => {
            let goal = goal
                .as_deref()
                .map(Goal::parse)
                .unwrap_or(config.nutrition.default_goal);
            cmd_macros(calories, weight, goal, json)
        }
        Commands::Workout {
            exercises,
            rest,
            student,
            auto_complete,
            dry_run,
        } => {
            let rest = rest.unwrap_or(config.session.default_rest_seconds);
            cmd_workout(
                &paths,
                &config,
                exercises,
                rest,
                student,
                auto_complete,
                dry_run,
            )
        }
        Commands::Meal {
            student,
            name,
            meal_plan,
            notes,
            photo_url,
            photo_ext,
        } => cmd_meal(&paths, student, name, meal_plan, notes, photo_url, photo_ext),
        Commands::Rollup { cleanup } => cmd_rollup(&paths, cleanup),
        Commands::History { days } => cmd_history(&paths, days),
    }
}

/// Parse `ID:SETSxREPS[@KG]`, e.g. `squat:3x10@60`
fn parse_exercise(raw: &str) -> std::result::Result<ExercisePlan, String> {
    let (id, scheme) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected ID:SETSxREPS[@KG], got '{}'", raw))?;
    if id.trim().is_empty() {
        return Err(format!("missing exercise id in '{}'", raw));
    }

    let (volume, weight) = match scheme.split_once('@') {
        Some((volume, kg)) => {
            let kg: f64 = kg
                .parse()
                .map_err(|_| format!("invalid weight '{}' in '{}'", kg, raw))?;
            if !kg.is_finite() || kg < 0.0 {
                return Err(format!("weight must be a non-negative number in '{}'", raw));
            }
            (volume, Some(kg))
        }
        None => (scheme, None),
    };

    let (sets, reps) = volume
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected SETSxREPS in '{}'", raw))?;
    let sets: usize = sets
        .parse()
        .map_err(|_| format!("invalid set count '{}' in '{}'", sets, raw))?;
    let reps: u32 = reps
        .parse()
        .map_err(|_| format!("invalid rep count '{}' in '{}'", reps, raw))?;
    if sets == 0 {
        return Err(format!("'{}' has no sets", raw));
    }

    Ok(ExercisePlan {
        exercise_id: id.trim().to_string(),
        sets: vec![
            SetTarget {
                target_reps: reps,
                target_weight: weight,
            };
            sets
        ],
    })
}

fn cmd_energy(input: &AnthropometricInput, json: bool) -> Result<()> {
    let estimate = estimate_energy(input)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&estimate)?);
        return Ok(());
    }

    println!("\n  Energy estimate");
    println!("  ───────────────────────────────");
    println!("  BMR (Mifflin-St Jeor):   {:>8.1} kcal", estimate.mifflin);
    println!(
        "  BMR x activity ({:.2}):   {:>8.1} kcal",
        input.activity_level, estimate.activity_adjusted
    );
    println!("  GET (Tinsley weight):    {:>8.1} kcal", estimate.tinsley_total);
    if let Some(lbm) = estimate.tinsley_lbm {
        println!("  GET (Tinsley lean mass): {:>8.1} kcal", lbm);
    }
    println!();
    println!("  → GET: {:.1} kcal ({:?})", estimate.get, estimate.method);
    println!();
    Ok(())
}

fn cmd_macros(calories: f64, weight: f64, goal: Goal, json: bool) -> Result<()> {
    let plan = calculate_macros(calories, weight, goal)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
        return Ok(());
    }

    println!("\n  Macros for {:.0} kcal ({:?})", plan.total_calories, goal);
    println!("  ───────────────────────────────");
    for (name, macro_) in [
        ("Protein", &plan.protein),
        ("Fat", &plan.fats),
        ("Carbs", &plan.carbs),
    ] {
        println!(
            "  {:<8} {:>7.1} g  {:>7.1} kcal  {:>5.1}%",
            name, macro_.grams, macro_.calories, macro_.percentage
        );
    }

    if !plan.feasible {
        println!();
        println!("  ⚠ Infeasible plan: protein and fat alone exceed the calorie target");
    }
    println!();
    Ok(())
}

fn cmd_workout(
    paths: &DataPaths,
    config: &Config,
    exercises: Vec<ExercisePlan>,
    rest: u32,
    student: Option<String>,
    auto_complete: bool,
    dry_run: bool,
) -> Result<()> {
    let mut store = WorkoutSessionStore::with_options(SystemClock, config.session.store_options());
    store.subscribe(|session| {
        tracing::debug!(
            "status={:?} exercise={:?} rest={:?} elapsed={}s",
            session.status,
            session.active_exercise_index,
            session.rest_remaining_seconds,
            session.elapsed_seconds
        );
    });

    store.start_session(exercises)?;
    let token = store.timer_token();
    let mut timer = Ticker::new(token, auto_complete);

    loop {
        let exercise_index = store.session().active_exercise_index.unwrap_or(0);
        let exercise = store.session().exercises[exercise_index].clone();
        println!("\n▶ {}", exercise.exercise_id);

        for set in &exercise.sets {
            timer.catch_up(&mut store);
            let actual = if auto_complete {
                ActualSet {
                    reps: set.target_reps,
                    weight: set.target_weight,
                }
            } else {
                prompt_set(&exercise.exercise_id, set, exercise.sets.len())?
            };
            timer.catch_up(&mut store);
            store.complete_set(exercise_index, set.set_index, actual)?;
            println!(
                "  ✓ Set {}: {} reps{}",
                set.set_index + 1,
                actual.reps,
                actual
                    .weight
                    .map(|kg| format!(" @ {} kg", kg))
                    .unwrap_or_default()
            );

            let last_set = set.set_index + 1 == exercise.sets.len();
            if !(last_set && !store.has_next_exercise()) {
                store.start_rest(rest)?;
                timer.run_rest(&mut store);
            }
        }

        if !store.advance_exercise()? {
            break;
        }
    }

    timer.catch_up(&mut store);
    let session = store.finish_session()?;
    let mut record = SessionRecord::from_finished(&session)?;
    if let Some(student) = student {
        record = record.with_student(student);
    }

    println!(
        "\n✓ Workout finished: {} sets, {:.1} kg volume, {}s",
        record.completed_sets(),
        record.total_volume(),
        record.elapsed_seconds
    );

    if dry_run {
        println!("\n[Dry run - not logging session]");
        return Ok(());
    }

    let mut sink = JsonlSink::new(&paths.sessions_wal);
    sink.append(&record)?;
    println!("✓ Session logged!");
    Ok(())
}

/// Delivers one-second ticks to the store, either in real time or simulated
struct Ticker {
    token: TimerToken,
    simulated: bool,
    last: Instant,
}

impl Ticker {
    fn new(token: TimerToken, simulated: bool) -> Self {
        Self {
            token,
            simulated,
            last: Instant::now(),
        }
    }

    /// Deliver the whole seconds that passed since the last tick
    fn catch_up<C: Clock>(&mut self, store: &mut WorkoutSessionStore<C>) {
        if self.simulated {
            return;
        }
        let whole = self.last.elapsed().as_secs();
        for _ in 0..whole {
            store.tick_elapsed(self.token);
        }
        self.last += Duration::from_secs(whole);
    }

    fn run_rest<C: Clock>(&mut self, store: &mut WorkoutSessionStore<C>) {
        while store.status() == SessionStatus::Resting {
            if !self.simulated {
                if let Some(remaining) = store.session().rest_remaining_seconds {
                    print!("\r  Rest: {:>3}s ", remaining);
                    let _ = io::stdout().flush();
                }
                std::thread::sleep(Duration::from_secs(1));
                self.last += Duration::from_secs(1);
            }
            store.tick(self.token);
        }
        if !self.simulated {
            println!("\r  Rest done.   ");
        }
    }
}

fn prompt_set(exercise_id: &str, set: &SetExecution, total_sets: usize) -> Result<ActualSet> {
    let target = match set.target_weight {
        Some(kg) => format!("{} reps @ {} kg", set.target_reps, kg),
        None => format!("{} reps", set.target_reps),
    };
    print!(
        "  {} set {}/{} (target {}). Reps done [{}]: ",
        exercise_id,
        set.set_index + 1,
        total_sets,
        target,
        set.target_reps
    );
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    let reps = match input.trim() {
        "" => set.target_reps,
        raw => raw
            .parse()
            .map_err(|_| Error::invalid(format!("'{}' is not a rep count", raw)))?,
    };

    Ok(ActualSet {
        reps,
        weight: set.target_weight,
    })
}

fn cmd_meal(
    paths: &DataPaths,
    student: String,
    name: String,
    meal_plan: Option<String>,
    notes: Option<String>,
    photo_url: Option<String>,
    photo_ext: Option<String>,
) -> Result<()> {
    let now = Utc::now();
    let mut log = MealLog::new(student, name, now);
    log.meal_plan_id = meal_plan;
    log.notes = notes;
    log.photo_url = photo_url;

    if let Some(ext) = photo_ext {
        let key = photo_object_key(&log.student_id, now, &ext)?;
        println!("Photo storage key: {}", key);
    }

    let mut sink = JsonlSink::new(&paths.meals_wal);
    sink.append_meal(&log)?;
    println!("✓ Meal '{}' logged for {}", log.meal_name, log.student_id);
    Ok(())
}

fn cmd_rollup(paths: &DataPaths, cleanup: bool) -> Result<()> {
    if !paths.sessions_wal.exists() {
        println!("No WAL file found - nothing to roll up.");
        return Ok(());
    }

    let count =
        fitpro_core::csv_rollup::wal_to_csv_and_archive(&paths.sessions_wal, &paths.sessions_csv)?;

    println!("✓ Rolled up {} sessions to CSV", count);
    println!("  CSV: {}", paths.sessions_csv.display());

    if cleanup {
        let cleaned = fitpro_core::csv_rollup::cleanup_processed_wals(&paths.wal_dir)?;
        if cleaned > 0 {
            println!("✓ Cleaned up {} processed WAL files", cleaned);
        }
    }

    Ok(())
}

fn cmd_history(paths: &DataPaths, days: i64) -> Result<()> {
    let records = load_recent_sessions(&paths.sessions_wal, days)?;
    if records.is_empty() {
        println!("No sessions in the last {} days.", days);
        return Ok(());
    }

    for record in &records {
        let when = record
            .finished_at
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".into());
        let names: Vec<&str> = record
            .exercises
            .iter()
            .map(|e| e.exercise_id.as_str())
            .collect();
        println!(
            "  {}  {:>3} sets  {:>8.1} kg  {}",
            when,
            record.completed_sets(),
            record.total_volume(),
            names.join(", ")
        );
    }

    let summary = summarize(&records);
    println!(
        "\n  {} sessions, {} sets, {:.1} kg total volume, {} min",
        summary.sessions,
        summary.sets_completed,
        summary.total_volume,
        summary.total_seconds / 60
    );
    Ok(())
}
