//! Lucky Draw terminal front end
//!
//! Usage:
//!   lucky-draw init --entries 1-50        - Start a new session
//!   lucky-draw import FILE --mode names   - Load entries, one per line
//!   lucky-draw draw [--turbo|--instant]   - Draw the next prize
//!   lucky-draw run                        - Draw every remaining prize
//!   lucky-draw undo                       - Revert the last batch
//!   lucky-draw reset                      - Clear history, refill the pool
//!   lucky-draw status                     - Show the session

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use crossbeam_channel::Receiver;

use ld_draw::{
    Clock, DrawEngine, DrawError, DrawEvent, DrawMode, DrawStart, RevealTiming, SystemClock,
};
use ld_state::{AutosaveConfig, Autosaver, DrawSettings, SessionFile};

#[derive(Parser)]
#[command(name = "lucky-draw", about = "Live lucky draw with timed reveals")]
struct Cli {
    /// Session file (defaults to the user data directory)
    #[arg(long, global = true)]
    session: Option<PathBuf>,

    /// Settings file (defaults to the user config directory)
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a new session
    Init {
        /// Range ("001-500") or comma-separated list
        #[arg(short, long)]
        entries: Option<String>,
        /// numbers | names
        #[arg(short, long)]
        mode: Option<DrawMode>,
        /// Comma-separated prize names, drawn first to last
        #[arg(short, long)]
        prizes: Option<String>,
        /// Winners per prize
        #[arg(short, long)]
        winners: Option<usize>,
        /// Fixed RNG seed (rehearsals only)
        #[arg(long)]
        seed: Option<u64>,
        /// Event title
        #[arg(short, long)]
        title: Option<String>,
    },
    /// Load entries from a file, one per line
    Import {
        file: PathBuf,
        /// numbers | names
        #[arg(short, long, default_value = "names")]
        mode: DrawMode,
    },
    /// Draw the next prize
    Draw {
        #[command(flatten)]
        speed: Speed,
    },
    /// Draw every remaining prize
    Run {
        #[command(flatten)]
        speed: Speed,
    },
    /// Revert the last batch
    Undo,
    /// Clear history and refill the pool
    Reset,
    /// Show the session
    Status,
}

#[derive(Args)]
struct Speed {
    /// Quarter-length reveals
    #[arg(long, conflicts_with = "instant")]
    turbo: bool,
    /// No animation
    #[arg(long)]
    instant: bool,
}

impl Speed {
    fn timing(&self, settings: &DrawSettings) -> RevealTiming {
        if self.instant {
            RevealTiming::instant()
        } else if self.turbo {
            RevealTiming::turbo()
        } else {
            settings.reveal_timing()
        }
    }
}

/// Loaded session plus where it lives
struct Workspace {
    settings: DrawSettings,
    settings_path: PathBuf,
    session: SessionFile,
    session_path: PathBuf,
}

impl Workspace {
    /// Load settings and session
    ///
    /// Commands that save the session refuse to start from a session file
    /// that exists but cannot be loaded.
    fn open(cli: &Cli) -> Result<Self> {
        let settings_path = cli.settings.clone().unwrap_or_else(DrawSettings::default_path);
        let session_path = cli.session.clone().unwrap_or_else(SessionFile::default_path);
        let settings = DrawSettings::load_from(&settings_path);

        let session = match cli.command {
            Commands::Init { .. } | Commands::Status => {
                SessionFile::load_or_default(&session_path, &settings)
            }
            _ => SessionFile::load_or_new(&session_path, &settings).with_context(|| {
                format!(
                    "Cannot load {}; fix or remove it, or run `init` to start over",
                    session_path.display()
                )
            })?,
        };

        Ok(Self {
            settings,
            settings_path,
            session,
            session_path,
        })
    }

    fn engine(&self, timing: RevealTiming) -> Result<DrawEngine> {
        let mut engine = self
            .session
            .to_engine(timing)
            .context("Session state is inconsistent")?;
        if let Some(seed) = self.settings.seed {
            engine.seed(seed);
        }
        Ok(engine)
    }

    fn save(&mut self, engine: &DrawEngine) -> Result<()> {
        self.session.update(engine);
        self.session
            .save_to(&self.session_path)
            .with_context(|| format!("Failed to save {}", self.session_path.display()))
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let mut workspace = Workspace::open(&cli)?;

    match cli.command {
        Commands::Init {
            entries,
            mode,
            prizes,
            winners,
            seed,
            title,
        } => {
            let mut settings = workspace.settings.clone();
            if let Some(entries) = entries {
                settings.entries = entries;
            }
            if let Some(mode) = mode {
                settings.mode = mode;
            }
            if let Some(prizes) = prizes {
                settings.prizes = prizes.split(',').map(|p| p.trim().to_string()).collect();
            }
            if let Some(winners) = winners {
                settings.winners_per_prize = winners;
            }
            if let Some(title) = title {
                settings.title = title;
            }
            settings.seed = seed;
            init(&mut workspace, settings)
        }
        Commands::Import { file, mode } => import(&mut workspace, file, mode),
        Commands::Draw { speed } => {
            let timing = speed.timing(&workspace.settings);
            draw(&mut workspace, timing, false)
        }
        Commands::Run { speed } => {
            let timing = speed.timing(&workspace.settings);
            draw(&mut workspace, timing, true)
        }
        Commands::Undo => undo(&mut workspace),
        Commands::Reset => reset(&mut workspace),
        Commands::Status => status(&workspace),
    }
}

fn init(workspace: &mut Workspace, settings: DrawSettings) -> Result<()> {
    let session = SessionFile::from_settings(&settings).context("Invalid draw settings")?;
    settings
        .save_to(&workspace.settings_path)
        .with_context(|| format!("Failed to save {}", workspace.settings_path.display()))?;

    workspace.settings = settings;
    workspace.session = session;
    let engine = workspace.engine(RevealTiming::instant())?;
    workspace.save(&engine)?;

    println!("✅ New session \"{}\"", workspace.session.title);
    print_summary(&engine);
    Ok(())
}

fn import(workspace: &mut Workspace, file: PathBuf, mode: DrawMode) -> Result<()> {
    let text = fs::read_to_string(&file)
        .with_context(|| format!("Failed to read {}", file.display()))?;

    let mut engine = workspace.engine(RevealTiming::instant())?;
    engine
        .import_entries(&text, mode)
        .with_context(|| format!("Invalid entries in {}", file.display()))?;

    workspace.session.input_spec = file.display().to_string();
    workspace.save(&engine)?;

    println!("📥 Imported {} entries", engine.pool().total_count());
    Ok(())
}

fn draw(workspace: &mut Workspace, timing: RevealTiming, all: bool) -> Result<()> {
    let mut engine = workspace.engine(timing)?;
    let events = engine.subscribe();
    let clock = SystemClock::new();
    let mut autosaver = Autosaver::new(workspace.session_path.clone(), AutosaveConfig::default());
    autosaver.mark_saved(engine.revision());

    loop {
        match engine.draw_next(clock.now_ms()) {
            Ok(DrawStart::Started { prize, winners }) => {
                println!("\n🎲 Drawing {winners} winner(s) for {prize}");
            }
            Ok(DrawStart::Busy) => bail!("A draw is already in progress"),
            Err(DrawError::PrizesComplete | DrawError::ExhaustedPool) if all => break,
            Err(e) => return Err(e).context("Cannot draw"),
        }

        animate(&mut engine, &clock, &events)?;
        autosaver
            .maybe_save(&engine, &mut workspace.session)
            .context("Autosave failed")?;

        if !all {
            break;
        }
    }

    workspace.save(&engine)
}

/// Drive the reveal in real time, rendering every event
fn animate(engine: &mut DrawEngine, clock: &SystemClock, events: &Receiver<DrawEvent>) -> Result<()> {
    render(events)?;
    while let Some(deadline) = engine.next_deadline() {
        clock.sleep_until(deadline);
        engine.advance(clock.now_ms());
        render(events)?;
    }
    Ok(())
}

fn render(events: &Receiver<DrawEvent>) -> Result<()> {
    let mut out = io::stdout().lock();
    for event in events.try_iter() {
        match event {
            DrawEvent::Tick { display } | DrawEvent::FakeOut { display } => {
                write!(out, "\r   {display}   ")?;
            }
            DrawEvent::WinnerRevealed { entry, index, of } => {
                writeln!(out, "\r🏆 {entry}   ({}/{of})", index + 1)?;
            }
            DrawEvent::BatchCommitted { batch, .. } => {
                writeln!(out, "✅ {} recorded", batch.prize_name)?;
            }
            DrawEvent::AllPrizesComplete => writeln!(out, "🎉 All prizes drawn!")?,
            _ => {}
        }
    }
    out.flush()?;
    Ok(())
}

fn undo(workspace: &mut Workspace) -> Result<()> {
    let mut engine = workspace.engine(RevealTiming::instant())?;
    let batch = engine.undo().context("Nothing to undo")?;
    workspace.save(&engine)?;

    let entries: Vec<&str> = batch.entries.iter().map(|e| e.as_str()).collect();
    println!("↩️  Undid {}: {}", batch.prize_name, entries.join(", "));
    Ok(())
}

fn reset(workspace: &mut Workspace) -> Result<()> {
    let mut engine = workspace.engine(RevealTiming::instant())?;
    engine.reset();
    workspace.save(&engine)?;

    println!("🔄 Reset");
    print_summary(&engine);
    Ok(())
}

fn status(workspace: &Workspace) -> Result<()> {
    let engine = workspace.engine(RevealTiming::instant())?;

    println!("{}", workspace.session.title);
    println!("Source: {}", workspace.session.input_spec);
    println!(
        "Saved:  {}",
        workspace.session.saved_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    print_summary(&engine);

    let groups = engine.history().winners_by_prize();
    if groups.is_empty() {
        return Ok(());
    }
    println!("\nWinners:");
    for (prize, entries) in groups {
        let entries: Vec<&str> = entries.iter().map(|e| e.as_str()).collect();
        println!("  {prize}: {}", entries.join(", "));
    }
    Ok(())
}

fn print_summary(engine: &DrawEngine) {
    let snapshot = engine.snapshot();
    println!(
        "Entries: {}/{} remaining ({} mode)",
        snapshot.remaining_count,
        snapshot.total_count,
        snapshot.mode.display_name()
    );
    println!("Winners per prize: {}", snapshot.winners_per_prize);
    println!("Next prize: {}", snapshot.current_prize_name);
}
