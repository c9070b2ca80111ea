//! Wavescope CLI: terminal music player with live audio visualization

use std::fs::File;
use std::io;
use std::os::unix::io::AsRawFd;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::Parser;

use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use ratatui::widgets::canvas::{Canvas as BrailleCanvas, Line as BrailleLine, Points};
use ratatui::widgets::*;

#[derive(Parser)]
#[command(
    name = "wavescope",
    about = "Terminal music player with live audio visualization",
    version
)]
struct Cli {
    /// Directory holding the songs and their list.txt manifest
    #[arg(default_value = "songs")]
    songs_dir: PathBuf,

    /// Extra audio files to append to the playlist
    #[arg(short, long = "add", value_name = "FILE")]
    add: Vec<PathBuf>,
}

use wavescope::audio::{AudioEngine, AudioEvent, PlaybackState, PlayerStatus};
use wavescope::library::Library;
use wavescope::viz::{RasterView, VectorView, Viewport, VizModel};
use wavescope_app::config::transport::{
    RESTART_THRESHOLD_SECS, SEEK_STEP_SECS, VOLUME_STEP, VOLUME_STEP_FINE, VOLUME_STEP_LARGE,
};
use wavescope_app::data::Settings;

struct App {
    library: Library,
    settings: Settings,
    model: VizModel,
    cursor: usize,
    playing: Option<usize>,
    status: PlayerStatus,
    notice: String,
    running: bool,
}

impl App {
    fn new(library: Library, settings: Settings) -> Self {
        Self {
            library,
            settings,
            model: VizModel::default(),
            cursor: 0,
            playing: None,
            status: PlayerStatus::default(),
            notice: String::new(),
            running: true,
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let settings = match Settings::load() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("{} (using default settings)", e);
            Settings::default()
        }
    };

    let mut library = match Library::load_manifest(&cli.songs_dir) {
        Ok(library) => library,
        Err(e) => {
            eprintln!("{}", e);
            Library::new()
        }
    };
    if !cli.add.is_empty() {
        library.add_files(&cli.add);
    }
    if library.is_empty() {
        eprintln!(
            "No playable songs in {} and no --add files given",
            cli.songs_dir.display()
        );
    }

    let engine = match AudioEngine::new() {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };
    engine.set_volume(settings.gain());

    let mut app = App::new(library, settings);
    if app.settings.auto_start && !app.library.is_empty() {
        play_song(&engine, &mut app, 0);
    }

    let tap = engine.tap();
    let status = engine.status();
    let mut vector_view = VectorView::new(Viewport::default());
    let mut raster_view = RasterView::new(Viewport::default());
    raster_view.attach();

    // Suppress stderr while the TUI is up; ALSA/PulseAudio write
    // diagnostics that corrupt the ratatui display.
    let saved_stderr = unsafe { libc::dup(2) };
    {
        let devnull = File::open("/dev/null")?;
        unsafe { libc::dup2(devnull.as_raw_fd(), 2) };
    }

    // Enter TUI
    terminal::enable_raw_mode()?;
    io::stdout().execute(EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)?;

    let tick_rate = Duration::from_millis(1000 / u64::from(wavescope::config::viz::FRAME_RATE));
    let mut last_tick = Instant::now();

    while app.running {
        // Draw
        terminal.draw(|f| draw_ui(f, &app, &vector_view, &raster_view))?;

        // Poll input
        let timeout = tick_rate.saturating_sub(last_tick.elapsed());
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    handle_key(key.code, key.modifiers, &engine, &mut app);
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();

            // Poll engine events
            while let Some(event) = engine.try_recv_event() {
                match event {
                    AudioEvent::Finished => {
                        if app.settings.autoplay && !app.library.is_empty() {
                            let next = app
                                .playing
                                .map(|i| (i + 1) % app.library.len())
                                .unwrap_or(0);
                            play_song(&engine, &mut app, next);
                        } else {
                            app.playing = None;
                        }
                    }
                    AudioEvent::Error(msg) => {
                        app.notice = msg;
                    }
                    _ => {}
                }
            }

            // Snapshot playback status
            if let Ok(snapshot) = status.lock() {
                app.status = snapshot.clone();
            }

            // Advance both visualization views; each paces itself to the
            // configured frame rate
            let now = Instant::now();
            vector_view.tick(&tap, app.model, now);
            raster_view.tick(&tap, app.model, now);
        }
    }

    // Shut the engine down while still in the alternate screen
    // (rodio may print to stderr on drop)
    engine.shutdown();

    // Restore terminal
    terminal::disable_raw_mode()?;
    io::stdout().execute(LeaveAlternateScreen)?;

    // Restore stderr
    if saved_stderr >= 0 {
        unsafe {
            libc::dup2(saved_stderr, 2);
            libc::close(saved_stderr);
        }
    }

    if let Err(e) = app.settings.save() {
        eprintln!("Failed to save settings: {}", e);
    }

    Ok(())
}

/// Route the song at `index`, leaving the current route in place on failure
fn play_song(engine: &AudioEngine, app: &mut App, index: usize) {
    let Some(song) = app.library.get(index) else {
        return;
    };
    match File::open(&song.path) {
        Ok(file) => {
            let hint = song
                .path
                .extension()
                .and_then(|e| e.to_str())
                .map(|s| s.to_lowercase());
            engine.play(Box::new(file), hint);
            app.playing = Some(index);
            app.cursor = index;
            app.notice.clear();
        }
        Err(e) => {
            app.notice = format!("Cannot open {}: {}", song.path.display(), e);
        }
    }
}

fn volume_step(modifiers: KeyModifiers) -> f32 {
    if modifiers.contains(KeyModifiers::SHIFT) {
        VOLUME_STEP_LARGE
    } else if modifiers.contains(KeyModifiers::CONTROL) {
        VOLUME_STEP_FINE
    } else {
        VOLUME_STEP
    }
}

fn handle_key(code: KeyCode, modifiers: KeyModifiers, engine: &AudioEngine, app: &mut App) {
    match code {
        KeyCode::Char('q') | KeyCode::Esc => {
            app.running = false;
        }
        KeyCode::Char(' ') => match app.status.state {
            PlaybackState::Playing => engine.pause(),
            PlaybackState::Paused => engine.resume(),
            PlaybackState::Stopped => play_song(engine, app, app.cursor),
        },
        KeyCode::Char('m') => {
            app.settings.toggle_mute();
            engine.set_volume(app.settings.gain());
        }
        KeyCode::Up => {
            app.settings.adjust_volume(volume_step(modifiers));
            engine.set_volume(app.settings.gain());
        }
        KeyCode::Down => {
            app.settings.adjust_volume(-volume_step(modifiers));
            engine.set_volume(app.settings.gain());
        }
        KeyCode::Right => {
            if app.playing.is_some() {
                let pos = app.status.position.as_secs_f32();
                engine.seek(Duration::from_secs_f32(pos + SEEK_STEP_SECS));
            }
        }
        KeyCode::Left => {
            if app.playing.is_some() {
                let pos = app.status.position.as_secs_f32();
                if modifiers.contains(KeyModifiers::SHIFT) {
                    if pos > RESTART_THRESHOLD_SECS {
                        engine.seek(Duration::ZERO);
                    }
                } else {
                    engine.seek(Duration::from_secs_f32((pos - SEEK_STEP_SECS).max(0.0)));
                }
            }
        }
        KeyCode::Char('v') => {
            app.model = app.model.next();
        }
        KeyCode::Char('a') => {
            app.settings.autoplay = !app.settings.autoplay;
        }
        KeyCode::Char('s') => {
            app.settings.auto_start = !app.settings.auto_start;
        }
        KeyCode::Char('j') => {
            if !app.library.is_empty() {
                app.cursor = (app.cursor + 1).min(app.library.len() - 1);
            }
        }
        KeyCode::Char('k') => {
            app.cursor = app.cursor.saturating_sub(1);
        }
        KeyCode::Enter => {
            play_song(engine, app, app.cursor);
        }
        KeyCode::Char('n') => {
            if !app.library.is_empty() {
                let next = app
                    .playing
                    .map(|i| (i + 1) % app.library.len())
                    .unwrap_or(app.cursor);
                play_song(engine, app, next);
            }
        }
        KeyCode::Char('p') => {
            if !app.library.is_empty() {
                let len = app.library.len();
                let prev = app
                    .playing
                    .map(|i| (i + len - 1) % len)
                    .unwrap_or(app.cursor);
                play_song(engine, app, prev);
            }
        }
        _ => {}
    }
}

fn draw_ui(f: &mut Frame, app: &App, vector: &VectorView, raster: &RasterView) {
    let area = f.area();

    let outer = Block::default()
        .title(format!(" Wavescope v{} ", env!("CARGO_PKG_VERSION")))
        .title_alignment(Alignment::Center)
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded);
    let inner = outer.inner(area);
    f.render_widget(outer, area);

    let chunks = Layout::vertical([
        Constraint::Min(12),   // visualizers
        Constraint::Length(8), // playlist
        Constraint::Length(1), // status line
        Constraint::Length(1), // help line
    ])
    .split(inner);

    let viz_cols = Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[0]);

    draw_vector_pane(f, vector, viz_cols[0]);
    draw_raster_pane(f, raster, viz_cols[1]);
    draw_playlist(f, app, chunks[1]);
    draw_status(f, app, chunks[2]);
    draw_help(f, chunks[3]);
}

/// Standard pane chrome: rounded corners, dim border
fn pane_block(title: &'static str) -> Block<'static> {
    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(Color::DarkGray))
}

fn draw_vector_pane(f: &mut Frame, view: &VectorView, area: Rect) {
    let viewport = view.viewport();
    let (w, h) = (f64::from(viewport.width), f64::from(viewport.height));

    let shapes = view.shapes();
    let widget = BrailleCanvas::default()
        .block(pane_block(" Vector "))
        .x_bounds([0.0, w])
        .y_bounds([0.0, h])
        .paint(move |ctx| {
            for shape in shapes {
                for pair in shape.points.windows(2) {
                    ctx.draw(&BrailleLine {
                        x1: f64::from(pair[0].0),
                        y1: h - f64::from(pair[0].1),
                        x2: f64::from(pair[1].0),
                        y2: h - f64::from(pair[1].1),
                        color: Color::Cyan,
                    });
                }
                if shape.closed {
                    if let (Some(first), Some(last)) = (shape.points.first(), shape.points.last())
                    {
                        ctx.draw(&BrailleLine {
                            x1: f64::from(last.0),
                            y1: h - f64::from(last.1),
                            x2: f64::from(first.0),
                            y2: h - f64::from(first.1),
                            color: Color::Cyan,
                        });
                    }
                }
            }
        });
    f.render_widget(widget, area);
}

fn draw_raster_pane(f: &mut Frame, view: &RasterView, area: Rect) {
    let viewport = view.viewport();
    let (w, h) = (f64::from(viewport.width), f64::from(viewport.height));

    // Collect lit pixels from the RGBA surface
    let mut coords: Vec<(f64, f64)> = Vec::new();
    if let Some(canvas) = view.canvas() {
        let width = canvas.width() as usize;
        for (i, px) in canvas.pixels().chunks_exact(4).enumerate() {
            if px[3] > 0 {
                let x = (i % width) as f64;
                let y = (i / width) as f64;
                coords.push((x, h - y));
            }
        }
    }

    let widget = BrailleCanvas::default()
        .block(pane_block(" Raster "))
        .x_bounds([0.0, w])
        .y_bounds([0.0, h])
        .paint(move |ctx| {
            ctx.draw(&Points {
                coords: &coords,
                color: Color::White,
            });
        });
    f.render_widget(widget, area);
}

fn draw_playlist(f: &mut Frame, app: &App, area: Rect) {
    let items: Vec<ListItem> = app
        .library
        .songs()
        .iter()
        .enumerate()
        .map(|(i, song)| {
            let marker = if app.playing == Some(i) { "> " } else { "  " };
            let style = if app.playing == Some(i) {
                Style::default().fg(Color::Cyan)
            } else if song.custom {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default().fg(Color::White)
            };
            let line = Line::from(vec![
                Span::styled(format!("{}{}", marker, song.name), style),
                Span::styled(
                    format!("  {}", format_time(song.length)),
                    Style::default().fg(Color::DarkGray),
                ),
            ]);
            ListItem::new(line)
        })
        .collect();

    let list = List::new(items)
        .block(pane_block(" Songs "))
        .highlight_style(Style::default().bg(Color::DarkGray).bold());

    let mut state = ListState::default();
    if !app.library.is_empty() {
        state.select(Some(app.cursor));
    }
    f.render_stateful_widget(list, area, &mut state);
}

fn draw_status(f: &mut Frame, app: &App, area: Rect) {
    let song_name = app
        .playing
        .and_then(|i| app.library.get(i))
        .map(|s| s.name.as_str())
        .unwrap_or("---");

    let length = app.status.duration.map(|d| d.as_secs_f32()).unwrap_or_else(|| {
        app.playing
            .and_then(|i| app.library.get(i))
            .map(|s| s.length)
            .unwrap_or(0.0)
    });

    let vol_display = if app.settings.is_muted() {
        "MUTE".to_string()
    } else {
        format!("{:.0}%", app.settings.volume.unwrap_or(0.0))
    };

    let state_color = match app.status.state {
        PlaybackState::Playing => Color::Green,
        PlaybackState::Paused => Color::Yellow,
        PlaybackState::Stopped => Color::DarkGray,
    };

    let mut flags = Vec::new();
    if app.settings.autoplay {
        flags.push("autoplay");
    }
    if app.settings.auto_start {
        flags.push("autostart");
    }

    let mut spans = vec![
        Span::styled(
            format!(" {} ", app.status.state),
            Style::default().fg(state_color),
        ),
        Span::styled(song_name, Style::default().fg(Color::White).bold()),
        Span::styled(
            format!(
                "  {} / {}",
                format_time(app.status.position.as_secs_f32()),
                format_time(length)
            ),
            Style::default().fg(Color::DarkGray),
        ),
        Span::styled(
            format!("  Vol: {}", vol_display),
            Style::default().fg(Color::Cyan),
        ),
        Span::styled(format!("  {}", app.model), Style::default().fg(Color::Magenta)),
    ];
    if !flags.is_empty() {
        spans.push(Span::styled(
            format!("  [{}]", flags.join(", ")),
            Style::default().fg(Color::DarkGray),
        ));
    }
    if !app.notice.is_empty() {
        spans.push(Span::styled(
            format!("  {}", app.notice),
            Style::default().fg(Color::Red),
        ));
    }

    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn draw_help(f: &mut Frame, area: Rect) {
    let key = Style::default().fg(Color::Yellow);
    let help = Line::from(vec![
        Span::styled("  'q' ", key),
        Span::raw("quit  "),
        Span::styled("Space ", key),
        Span::raw("pause  "),
        Span::styled("'m' ", key),
        Span::raw("mute  "),
        Span::styled("Up/Dn ", key),
        Span::raw("volume  "),
        Span::styled("L/R ", key),
        Span::raw("seek  "),
        Span::styled("'v' ", key),
        Span::raw("model  "),
        Span::styled("'j'/'k' ", key),
        Span::raw("select  "),
        Span::styled("Enter ", key),
        Span::raw("play  "),
        Span::styled("'n'/'p' ", key),
        Span::raw("next/prev  "),
        Span::styled("'a' ", key),
        Span::raw("autoplay"),
    ]);
    f.render_widget(Paragraph::new(help).alignment(Alignment::Left), area);
}

/// Format seconds as m:ss
fn format_time(secs: f32) -> String {
    let secs = secs.max(0.0);
    format!("{}:{:02}", (secs / 60.0) as u32, (secs % 60.0) as u32)
}
