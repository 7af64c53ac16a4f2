mod shared;
mod tui;
mod audio_api;
mod audio;
mod config;
mod middle;
mod pipeline;
mod playback;
mod practice;
mod recorder;
mod scene;

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use crossterm::terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing::{info, warn};

use config::Config;
use middle::Middle;
use pipeline::persistence;
use shared::InputEvent;

const LOG_FILE: &str = "raindrum.log";

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let project_dir: PathBuf = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_default());
    let data_dir = persistence::data_dir(&project_dir);
    // without a writable data dir the app still runs, just unlogged
    if let Err(e) = init_logging(&data_dir) {
        eprintln!("Logging disabled: {:#}", e);
    }

    let config = Config::load(&data_dir);
    let state = persistence::load_project(&project_dir);
    info!(songs = state.songs.len(), dir = %project_dir.display(), "project loaded");

    // audio failures are logged and leave the app silent but usable
    let audio = audio::start_audio(&config.audio);
    if !audio.is_live() {
        info!("running without sound");
    }
    let mut middle = Middle::with_state(state, &config);
    for cmd in middle.startup_commands() {
        audio.send(cmd);
    }

    terminal::enable_raw_mode()?;
    // Enable keyboard enhancement for real press/release detection.
    // Falls back gracefully if the terminal doesn't support it.
    let _ = crossterm::execute!(
        std::io::stdout(),
        crossterm::event::PushKeyboardEnhancementFlags(
            crossterm::event::KeyboardEnhancementFlags::REPORT_EVENT_TYPES
        )
    );
    let _guard = RawModeGuard; // auto drops when out of scope

    let backend = CrosstermBackend::new(std::io::stdout());
    let mut term = Terminal::new(backend)?;
    term.clear()?;
    let size = term.size()?;
    middle.handle_input(InputEvent::Resize(tui::input::viewport_for(size.width, size.height)));

    let tick_rate = Duration::from_millis(shared::FRAME_MS);
    let mut last_tick = Instant::now();
    let blink_start = Instant::now();
    let mut tui_state = tui::mode::TuiState::default();

    loop {
        let blink_on = (blink_start.elapsed().as_millis() / 500) % 2 == 0;
        let ds = middle.display_state();
        tui_state.sync(&ds);

        term.draw(|frame| {
            tui::view::render(frame, frame.area(), &ds, &tui_state, blink_on);
        })?;

        let events = tui::input::poll_input(tick_rate, &mut tui_state)?;
        for event in events {
            if event == InputEvent::Quit {
                // save before quitting
                if let Err(e) = persistence::save_project(&project_dir, &middle.state) {
                    warn!("Could not save project: {e}");
                }
                info!("bye");
                return Ok(());
            }
            for cmd in middle.handle_input(event) {
                audio.send(cmd);
            }
        }

        // songs are saved as soon as the library changes, not just on quit
        if middle.take_songs_dirty()
            && let Err(e) = persistence::save_songs(&project_dir, &middle.state)
        {
            warn!("Could not save songs: {e}");
        }

        let elapsed = last_tick.elapsed().as_secs_f64();
        last_tick = Instant::now();
        for cmd in middle.tick(elapsed) {
            audio.send(cmd);
        }
    }
}

// the terminal belongs to the ui, so logs go to a file in the data dir
fn init_logging(data_dir: &Path) -> anyhow::Result<()> {
    std::fs::create_dir_all(data_dir)?;
    let log_file = std::fs::File::create(data_dir.join(LOG_FILE))?;
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::sync::Mutex::new(log_file))
        .with_ansi(false)
        .init();
    Ok(())
}

struct RawModeGuard;
impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = crossterm::execute!(
            std::io::stdout(),
            crossterm::event::PopKeyboardEnhancementFlags
        );
        let _ = terminal::disable_raw_mode();
    }
}
