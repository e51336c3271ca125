use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use touchline::clock::format_clock;
use touchline::command::{Command, apply_command};
use touchline::config::EngineConfig;
use touchline::demo_feed;
use touchline::export;
use touchline::game_log::PitchPoint;
use touchline::persist::{JsonFileStore, MemoryStore, SnapshotStore, SnapshotWriter};
use touchline::presets::{self, BIG_PLAY_DESCRIPTIONS};
use touchline::record::{FinalizedMatchRecord, MemoryRecordSink, RecordSink, VotingPayload};
use touchline::record_store::SqliteRecordStore;
use touchline::remote::RemoteRecordSink;
use touchline::roster::{CardKind, CardStatus, SquadSelection};
use touchline::session::{MatchSession, StatOutcome};
use touchline::state::{MatchState, Period};
use touchline::stats::{StatKey, TRACKED_STATS, impact_score};

const CLOCK_TICK: Duration = Duration::from_secs(1);
const POLL_RATE: Duration = Duration::from_millis(100);
const PITCH_STEP: f32 = 5.0;

#[derive(Debug, Clone)]
enum Mode {
    Resume(Box<MatchState>),
    Live,
    Location { cursor: PitchPoint },
    Card { kind: CardKind },
    BigPlay,
    ConfirmEnd,
    ConfirmDiscard,
    Voting { picks: Vec<String> },
    Finished { record: Box<FinalizedMatchRecord> },
}

struct App {
    config: EngineConfig,
    session: MatchSession,
    writer: SnapshotWriter,
    sink: Box<dyn RecordSink>,
    mode: Mode,
    selected: usize,
    stat: StatKey,
    help_overlay: bool,
    should_quit: bool,
    demo_tx: Option<mpsc::Sender<Command>>,
}

impl App {
    fn new(config: EngineConfig, demo_tx: Option<mpsc::Sender<Command>>) -> Self {
        let store = snapshot_store(&config);
        let mut session = MatchSession::new(&config);
        let mode = match store.load() {
            Ok(Some(state)) => Mode::Resume(Box::new(state)),
            Ok(None) => Mode::Live,
            Err(err) => {
                session.push_log(format!("[WARN] Snapshot unreadable, starting fresh: {err:#}"));
                Mode::Live
            }
        };
        let writer = SnapshotWriter::new(store, config.snapshot_settle, config.snapshot_max_delay);
        let sink = record_sink(&config, &mut session);
        let mut app = App {
            config,
            session,
            writer,
            sink,
            mode,
            selected: 0,
            stat: StatKey::Tackles,
            help_overlay: false,
            should_quit: false,
            demo_tx,
        };
        if matches!(app.mode, Mode::Live) {
            app.bind_squad_file();
            app.start_demo_feed();
        }
        app
    }

    /// Starts once the roster is settled, so the feed targets real player ids.
    fn start_demo_feed(&mut self) {
        let Some(tx) = self.demo_tx.take() else {
            return;
        };
        let ids = self
            .session
            .state()
            .players
            .iter()
            .map(|p| p.id.clone())
            .collect();
        demo_feed::spawn_demo_feed(tx, ids);
    }

    fn replace_session(&mut self, mut next: MatchSession) {
        next.carry_logs_from(&self.session);
        self.session = next;
        self.selected = 0;
    }

    fn bind_squad_file(&mut self) {
        let Some(path) = self.config.squad_file.clone() else {
            return;
        };
        match load_squad_file(&path) {
            Ok(selections) => {
                if let Err(err) = self.session.bind_squad(&selections) {
                    self.session.push_log(format!("[WARN] {err}"));
                }
            }
            Err(err) => self
                .session
                .push_log(format!("[WARN] Squad file ignored: {err:#}")),
        }
    }

    fn selected_player_id(&self) -> Option<String> {
        self.session
            .state()
            .players
            .get(self.selected)
            .map(|p| p.id.clone())
    }

    fn apply(&mut self, command: Command) {
        let _ = apply_command(&mut self.session, command);
    }

    fn on_key(&mut self, key: KeyEvent) {
        if key.code == KeyCode::Char('?') {
            self.help_overlay = !self.help_overlay;
            return;
        }
        match self.mode.clone() {
            Mode::Resume(state) => self.on_resume_key(key, *state),
            Mode::Live => self.on_live_key(key),
            Mode::Location { cursor } => self.on_location_key(key, cursor),
            Mode::Card { kind } => self.on_card_key(key, kind),
            Mode::BigPlay => self.on_big_play_key(key),
            Mode::ConfirmEnd => self.on_confirm_end_key(key),
            Mode::ConfirmDiscard => self.on_confirm_discard_key(key),
            Mode::Voting { picks } => self.on_voting_key(key, picks),
            Mode::Finished { record } => self.on_finished_key(key, &record),
        }
    }

    fn on_resume_key(&mut self, key: KeyEvent, state: MatchState) {
        match key.code {
            KeyCode::Char('r') | KeyCode::Enter => {
                let restored = MatchSession::restore(state, &self.config);
                self.replace_session(restored);
                self.mode = Mode::Live;
                self.start_demo_feed();
            }
            KeyCode::Char('d') => {
                if let Err(err) = self.writer.clear_stored() {
                    self.session
                        .push_log(format!("[WARN] Snapshot discard failed: {err:#}"));
                } else {
                    self.session.push_log("[INFO] Previous match discarded");
                }
                self.mode = Mode::Live;
                self.bind_squad_file();
                self.start_demo_feed();
            }
            KeyCode::Char('q') => self.should_quit = true,
            _ => {}
        }
    }

    fn on_live_key(&mut self, key: KeyEvent) {
        let player_count = self.session.state().players.len();
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char(' ') => {
                if self.session.state().clock.is_running {
                    self.apply(Command::StopClock);
                } else {
                    self.apply(Command::StartClock);
                }
            }
            KeyCode::Char('j') | KeyCode::Down => {
                if player_count > 0 {
                    self.selected = (self.selected + 1) % player_count;
                }
            }
            KeyCode::Char('k') | KeyCode::Up => {
                if player_count > 0 {
                    self.selected = (self.selected + player_count - 1) % player_count;
                }
            }
            KeyCode::Char('l') | KeyCode::Right => self.stat = self.stat.next(),
            KeyCode::Char('h') | KeyCode::Left => self.stat = self.stat.prev(),
            KeyCode::Char('+') | KeyCode::Char('=') => self.stat_delta(1),
            KeyCode::Char('-') => self.stat_delta(-1),
            KeyCode::Char('s') => {
                if let Some(player_id) = self.selected_player_id() {
                    self.apply(Command::ToggleField { player_id });
                }
            }
            KeyCode::Char('y') => self.mode = Mode::Card {
                kind: CardKind::Yellow,
            },
            KeyCode::Char('r') => self.mode = Mode::Card {
                kind: CardKind::Red,
            },
            KeyCode::Char('c') => {
                if let Some(player_id) = self.selected_player_id() {
                    self.apply(Command::RemoveCard { player_id });
                }
            }
            KeyCode::Char('b') => self.mode = Mode::BigPlay,
            KeyCode::Char(']') => self.apply(Command::AdjustOpponentScore(1)),
            KeyCode::Char('[') => self.apply(Command::AdjustOpponentScore(-1)),
            KeyCode::Char('}') => {
                let score = self.session.state().team_score();
                self.apply(Command::SetTeamScore(score.saturating_add(1)));
            }
            KeyCode::Char('{') => {
                let score = self.session.state().team_score();
                self.apply(Command::SetTeamScore(score.saturating_sub(1)));
            }
            KeyCode::Char('t') => self.apply(Command::RecordSet { completed: true }),
            KeyCode::Char('T') => self.apply(Command::RecordSet { completed: false }),
            KeyCode::Char('z') => self.undo_set(true),
            KeyCode::Char('Z') => self.undo_set(false),
            KeyCode::Char('D') => self.mode = Mode::ConfirmDiscard,
            KeyCode::Char('e') => {
                self.apply(Command::EndPeriod);
                if self.session.awaiting_period_confirmation() {
                    self.mode = Mode::ConfirmEnd;
                }
            }
            _ => {}
        }
    }

    fn undo_set(&mut self, completed: bool) {
        if let Err(err) = self.session.undo_last_set(completed) {
            self.session.push_log(format!("[WARN] {err}"));
        }
    }

    fn stat_delta(&mut self, delta: i64) {
        let Some(player_id) = self.selected_player_id() else {
            return;
        };
        match self.session.apply_stat_delta(&player_id, self.stat, delta) {
            Ok(StatOutcome::PendingLocation) => {
                self.mode = Mode::Location {
                    cursor: PitchPoint::centre(),
                };
            }
            Ok(_) => {}
            Err(err) => self.session.push_log(format!("[WARN] {err}")),
        }
    }

    fn on_location_key(&mut self, key: KeyEvent, cursor: PitchPoint) {
        let moved = match key.code {
            KeyCode::Left => Some(PitchPoint::new(cursor.x - PITCH_STEP, cursor.y)),
            KeyCode::Right => Some(PitchPoint::new(cursor.x + PITCH_STEP, cursor.y)),
            KeyCode::Up => Some(PitchPoint::new(cursor.x, cursor.y - PITCH_STEP)),
            KeyCode::Down => Some(PitchPoint::new(cursor.x, cursor.y + PITCH_STEP)),
            _ => None,
        };
        if let Some(cursor) = moved {
            self.mode = Mode::Location { cursor };
            return;
        }
        match key.code {
            KeyCode::Esc => {
                self.apply(Command::CancelCapture);
                self.mode = Mode::Live;
            }
            KeyCode::Char(c) if c.is_ascii_digit() => {
                let Some(pending) = self.session.pending_capture() else {
                    self.mode = Mode::Live;
                    return;
                };
                let options = presets::reasons_for_stat(pending.key);
                let Some(reason) = presets::pick(options, digit(c)) else {
                    return;
                };
                self.apply(Command::ConfirmLocation {
                    reason: reason.to_string(),
                    location: cursor,
                });
                self.mode = Mode::Live;
            }
            _ => {}
        }
    }

    fn on_card_key(&mut self, key: KeyEvent, kind: CardKind) {
        match key.code {
            KeyCode::Esc => self.mode = Mode::Live,
            KeyCode::Char(c) if c.is_ascii_digit() => {
                let Some(reason) = presets::pick(presets::reasons_for_card(kind), digit(c)) else {
                    return;
                };
                if let Some(player_id) = self.selected_player_id() {
                    self.apply(Command::AssignCard {
                        player_id,
                        kind,
                        reason: reason.to_string(),
                    });
                }
                self.mode = Mode::Live;
            }
            _ => {}
        }
    }

    fn on_big_play_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.mode = Mode::Live,
            KeyCode::Char(c) if c.is_ascii_digit() => {
                let Some(description) = presets::pick(&BIG_PLAY_DESCRIPTIONS, digit(c)) else {
                    return;
                };
                if let Some(player_id) = self.selected_player_id() {
                    self.apply(Command::BigPlay {
                        player_id,
                        key: self.stat,
                        description: description.to_string(),
                    });
                }
                self.mode = Mode::Live;
            }
            _ => {}
        }
    }

    fn on_confirm_end_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('y') | KeyCode::Enter => {
                self.apply(Command::ConfirmEndPeriod);
                self.mode = if self.session.voting_open() {
                    Mode::Voting { picks: Vec::new() }
                } else {
                    Mode::Live
                };
            }
            KeyCode::Char('n') | KeyCode::Esc => {
                self.apply(Command::CancelEndPeriod);
                self.mode = Mode::Live;
            }
            _ => {}
        }
    }

    fn on_confirm_discard_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('y') => {
                // Failures are already on the console; the old match is closed either way.
                let _ = self.writer.discard(&mut self.session);
                let fresh = MatchSession::new(&self.config);
                self.replace_session(fresh);
                self.bind_squad_file();
                self.mode = Mode::Live;
            }
            KeyCode::Char('n') | KeyCode::Esc => self.mode = Mode::Live,
            _ => {}
        }
    }

    fn on_voting_key(&mut self, key: KeyEvent, mut picks: Vec<String>) {
        let player_count = self.session.state().players.len();
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => {
                if player_count > 0 {
                    self.selected = (self.selected + 1) % player_count;
                }
            }
            KeyCode::Char('k') | KeyCode::Up => {
                if player_count > 0 {
                    self.selected = (self.selected + player_count - 1) % player_count;
                }
            }
            KeyCode::Char('v') => {
                if let Some(id) = self.selected_player_id() {
                    if picks.len() < 3 && !picks.contains(&id) {
                        picks.push(id);
                    }
                }
                self.mode = Mode::Voting { picks };
            }
            KeyCode::Backspace => {
                picks.pop();
                self.mode = Mode::Voting { picks };
            }
            KeyCode::Enter => {
                let state = self.session.state();
                let chosen: Vec<_> = picks.iter().filter_map(|id| state.player(id)).collect();
                let payload = VotingPayload::three_two_one(&chosen);
                self.finalize(Some(payload));
            }
            KeyCode::Char('x') => self.finalize(None),
            _ => {}
        }
    }

    fn finalize(&mut self, voting: Option<VotingPayload>) {
        let result = self
            .session
            .finalize(voting, self.sink.as_mut(), self.writer.store_mut());
        // On failure the session keeps its votes-open state; the coach can retry.
        if let Ok(done) = result {
            self.mode = Mode::Finished {
                record: Box::new(done.record),
            };
        }
    }

    fn on_finished_key(&mut self, key: KeyEvent, record: &FinalizedMatchRecord) {
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('x') => {
                let path = export_path(&self.config, record);
                match export::export_record(&path, record) {
                    Ok(report) => self.session.push_log(format!(
                        "[INFO] Exported {} players, {} events to {}",
                        report.players,
                        report.events,
                        path.display()
                    )),
                    Err(err) => self
                        .session
                        .push_log(format!("[ERROR] Export failed: {err:#}")),
                }
            }
            _ => {}
        }
    }
}

fn main() -> io::Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    let config = EngineConfig::from_env();

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let (tx, rx) = mpsc::channel();
    let demo_tx = config.demo_feed.then_some(tx);
    let mut app = App::new(config, demo_tx);

    let res = run_app(&mut terminal, &mut app, rx);
    app.writer.flush(&mut app.session);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("error: {err}");
    }
    Ok(())
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    rx: mpsc::Receiver<Command>,
) -> io::Result<()> {
    let mut last_tick = Instant::now();

    loop {
        let live = !matches!(app.mode, Mode::Resume(_) | Mode::Finished { .. });
        if live {
            // Feed commands wait while a modal capture is open.
            if matches!(app.mode, Mode::Live) {
                while let Ok(command) = rx.try_recv() {
                    app.apply(command);
                }
            }
            while last_tick.elapsed() >= CLOCK_TICK {
                app.session.tick();
                last_tick += CLOCK_TICK;
            }
            app.writer.poll(&mut app.session, Instant::now());
        } else {
            last_tick = Instant::now();
        }

        terminal.draw(|f| ui(f, app))?;

        if event::poll(POLL_RATE)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.on_key(key);
                }
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn ui(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(5),
            Constraint::Length(1),
        ])
        .split(frame.size());

    let header = Paragraph::new(header_text(app)).block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(50), Constraint::Length(44)])
        .split(chunks[1]);
    render_roster(frame, columns[0], app);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(13), Constraint::Min(1)])
        .split(columns[1]);
    let totals = Paragraph::new(totals_text(&app.session))
        .block(Block::default().title("Team").borders(Borders::ALL));
    frame.render_widget(totals, right[0]);
    let log = Paragraph::new(game_log_text(&app.session))
        .block(Block::default().title("Game Log").borders(Borders::ALL));
    frame.render_widget(log, right[1]);

    let console = Paragraph::new(console_text(&app.session))
        .block(Block::default().title("Console").borders(Borders::ALL));
    frame.render_widget(console, chunks[2]);

    let footer = Paragraph::new(footer_text(&app.mode)).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(footer, chunks[3]);

    match &app.mode {
        Mode::Resume(state) => render_popup(frame, "Resume", &resume_text(state)),
        Mode::Location { cursor } => render_popup(frame, "Location", &location_text(app, *cursor)),
        Mode::Card { kind } => render_popup(
            frame,
            kind.label(),
            &preset_text(presets::reasons_for_card(*kind)),
        ),
        Mode::BigPlay => render_popup(frame, "Big Play", &preset_text(&BIG_PLAY_DESCRIPTIONS)),
        Mode::ConfirmEnd => render_popup(frame, "End Period", &confirm_end_text(&app.session)),
        Mode::ConfirmDiscard => render_popup(
            frame,
            "Discard",
            "Abandon this match without saving a record?\n\ny Discard   n Keep playing",
        ),
        Mode::Voting { picks } => render_popup(frame, "Votes", &voting_text(app, picks)),
        Mode::Finished { record } => render_popup(frame, "Full Time", &finished_text(record)),
        Mode::Live => {}
    }

    if app.help_overlay {
        render_popup(frame, "Help", HELP_TEXT);
    }
}

fn header_text(app: &App) -> String {
    let state = app.session.state();
    let running = if state.clock.is_running { "RUN" } else { "STOP" };
    let mut line1 = format!(
        "  {} {} - {} {}   {}  [{}]  {}",
        state.team_name,
        state.team_score(),
        state.opponent_score,
        state.opponent_name,
        state.clock.display(),
        running,
        state.period.label()
    );
    if app.session.stat_rejected(Instant::now()) {
        line1.push_str("   CLOCK STOPPED: stat not recorded");
    }
    let sets = state.sets;
    let rate = sets
        .completion_rate()
        .map(|r| format!("{r:.0}%"))
        .unwrap_or_else(|| "-".to_string());
    let line2 = format!(
        "  Sets {}/{} ({rate})  Adj {:+}  Stat: {}",
        sets.completed,
        sets.total,
        state.home_score_adjustment,
        app.stat.label()
    );
    format!("{line1}\n{line2}")
}

fn render_roster(frame: &mut Frame, area: Rect, app: &App) {
    let session = &app.session;
    let state = session.state();
    let aggregates = session.aggregates();
    let mut lines = vec![Line::styled(
        format!(
            "{:>3} {:<18} {:<6} {:>5} {:>6} {:>6}",
            "#",
            "Name",
            "State",
            app.stat.short_label(),
            "Mins",
            "Impact"
        ),
        Style::default().add_modifier(Modifier::BOLD),
    )];
    for (idx, p) in state.players.iter().enumerate() {
        let status = match p.card_status {
            CardStatus::Yellow => match session.sin_bin_remaining(&p.id) {
                Some(0) => "YC!".to_string(),
                Some(left) => format!("YC{}", left / 60),
                None => "YC".to_string(),
            },
            CardStatus::Red => "RC".to_string(),
            CardStatus::None if p.is_on_field => "ON".to_string(),
            CardStatus::None => "bench".to_string(),
        };
        let value = p.stat(app.stat);
        let leader = if aggregates.is_leader(p, app.stat) { "*" } else { " " };
        let text = format!(
            "{:>3} {:<18} {:<6} {:>4}{leader} {:>6} {:>6}",
            p.number,
            truncate(&p.name, 18),
            status,
            value,
            format_clock(p.total_seconds_on_field),
            impact_score(p)
        );
        let mut style = match p.card_status {
            CardStatus::Yellow => Style::default().fg(Color::Yellow),
            CardStatus::Red => Style::default().fg(Color::Red),
            CardStatus::None if p.is_on_field => Style::default(),
            CardStatus::None => Style::default().fg(Color::DarkGray),
        };
        if idx == app.selected {
            style = style.bg(Color::DarkGray).fg(Color::White);
        }
        lines.push(Line::styled(text, style));
    }
    let roster = Paragraph::new(lines).block(
        Block::default()
            .title(format!("Roster ({} on field)", state.on_field_count()))
            .borders(Borders::ALL),
    );
    frame.render_widget(roster, area);
}

fn totals_text(session: &MatchSession) -> String {
    let agg = session.aggregates();
    TRACKED_STATS
        .iter()
        .map(|key| {
            format!(
                "{:<15} {:>4}  max {:>3} ({})",
                key.label(),
                agg.total(*key),
                agg.max_value(*key),
                agg.leader_count(*key)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn game_log_text(session: &MatchSession) -> String {
    let log = session.state().game_log.entries();
    if log.is_empty() {
        return "No events yet".to_string();
    }
    log.iter()
        .take(20)
        .map(|e| {
            let num = e
                .player
                .player_number
                .map(|n| format!("#{n}"))
                .unwrap_or_else(|| "#?".to_string());
            let reason = e.reason.as_deref().unwrap_or("");
            format!(
                "{} {:<4} {num} {} {reason}",
                e.clock,
                e.kind.label(),
                e.player.player_name
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn console_text(session: &MatchSession) -> String {
    let logs = session.logs();
    if logs.is_empty() {
        return "No alerts yet".to_string();
    }
    let skip = logs.len().saturating_sub(3);
    logs.iter().skip(skip).cloned().collect::<Vec<_>>().join("\n")
}

fn footer_text(mode: &Mode) -> &'static str {
    match mode {
        Mode::Resume(_) => "r Resume | d Discard | q Quit",
        Mode::Live => {
            "Space Clock | j/k Player | h/l Stat | +/- Stat | s Sub | y/r Card | c Clear card | b Big play | e End period | ? Help | q Quit"
        }
        Mode::Location { .. } => "Arrows Move | 1-9 Reason | Esc Cancel",
        Mode::Card { .. } | Mode::BigPlay => "1-9 Pick | Esc Cancel",
        Mode::ConfirmEnd => "y Confirm | n Cancel",
        Mode::ConfirmDiscard => "y Discard | n Cancel",
        Mode::Voting { .. } => "j/k Player | v Vote | Backspace Undo | Enter Save | x Skip votes",
        Mode::Finished { .. } => "x Export XLSX | q Quit",
    }
}

fn resume_text(state: &MatchState) -> String {
    format!(
        "Unfinished match found\n\n{} {} - {} {}\n{} at {}\n\nr Resume   d Discard",
        state.team_name,
        state.team_score(),
        state.opponent_score,
        state.opponent_name,
        state.period.label(),
        state.clock.display()
    )
}

fn location_text(app: &App, cursor: PitchPoint) -> String {
    let Some(pending) = app.session.pending_capture() else {
        return "Nothing pending".to_string();
    };
    let mut lines = vec![
        format!("{} at x {:.0}% / y {:.0}%", pending.key.label(), cursor.x, cursor.y),
        pitch_grid(cursor),
        String::new(),
    ];
    lines.push(preset_text(presets::reasons_for_stat(pending.key)));
    lines.join("\n")
}

fn pitch_grid(cursor: PitchPoint) -> String {
    const COLS: usize = 20;
    const ROWS: usize = 5;
    let cx = ((cursor.x / 100.0) * (COLS - 1) as f32).round() as usize;
    let cy = ((cursor.y / 100.0) * (ROWS - 1) as f32).round() as usize;
    (0..ROWS)
        .map(|row| {
            (0..COLS)
                .map(|col| if row == cy && col == cx { 'X' } else { '.' })
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn preset_text(options: &[&str]) -> String {
    options
        .iter()
        .enumerate()
        .map(|(i, o)| format!("{} {o}", i + 1))
        .collect::<Vec<_>>()
        .join("\n")
}

fn confirm_end_text(session: &MatchSession) -> String {
    match session.state().period {
        Period::FirstHalf => "End the first half?\n\ny Confirm   n Cancel".to_string(),
        _ => "End the match?\n\ny Confirm   n Cancel".to_string(),
    }
}

fn voting_text(app: &App, picks: &[String]) -> String {
    let state = app.session.state();
    let mut lines = vec!["3-2-1 votes".to_string(), String::new()];
    for (idx, points) in [3, 2, 1].iter().enumerate() {
        let name = picks
            .get(idx)
            .and_then(|id| state.player(id))
            .map(|p| format!("#{} {}", p.number, p.name))
            .unwrap_or_else(|| "-".to_string());
        lines.push(format!("{points} pts: {name}"));
    }
    if let Some(p) = state.players.get(app.selected) {
        lines.push(String::new());
        lines.push(format!("Selected: #{} {}", p.number, p.name));
    }
    lines.join("\n")
}

fn finished_text(record: &FinalizedMatchRecord) -> String {
    format!(
        "{} {} {}\n{}\n\nx Export   q Quit",
        record.team_name,
        record.final_score,
        record.opponent_name,
        record.result.label()
    )
}

const HELP_TEXT: &str = "Space   start/stop clock\n\
j/k     select player\n\
h/l     select stat\n\
+ / -   stat up/down (clock must run)\n\
s       interchange on/off\n\
y / r   yellow / red card\n\
c       clear card\n\
b       big play for selected stat\n\
[ / ]   opponent score -/+\n\
{ / }   team score -/+\n\
t / T   completed / failed set\n\
z / Z   undo completed / failed set\n\
e       end period\n\
D       discard match\n\
?       toggle help";

fn render_popup(frame: &mut Frame, title: &str, text: &str) {
    let area = centered_rect(50, 50, frame.size());
    frame.render_widget(Clear, area);
    let popup = Paragraph::new(text.to_string())
        .block(Block::default().title(title.to_string()).borders(Borders::ALL));
    frame.render_widget(popup, area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);

    horizontal[1]
}

fn truncate(raw: &str, max: usize) -> String {
    raw.chars().take(max).collect()
}

fn digit(c: char) -> usize {
    c.to_digit(10).map(|d| d as usize).unwrap_or(0)
}

fn snapshot_store(config: &EngineConfig) -> Box<dyn SnapshotStore> {
    match config.snapshot_dir() {
        Some(dir) => Box::new(JsonFileStore::new(&dir, &config.user_key)),
        None => Box::new(MemoryStore::default()),
    }
}

fn record_sink(config: &EngineConfig, session: &mut MatchSession) -> Box<dyn RecordSink> {
    if let Some(endpoint) = &config.record_endpoint {
        return Box::new(RemoteRecordSink::new(endpoint.clone(), config.user_key.clone()));
    }
    if let Some(path) = config.records_db_path() {
        match SqliteRecordStore::open(&path, &config.user_key) {
            Ok(store) => return Box::new(store),
            Err(err) => session.push_log(format!("[WARN] Match database unavailable: {err:#}")),
        }
    }
    session.push_log("[WARN] Finished matches will only be kept in memory");
    Box::new(MemoryRecordSink::default())
}

fn load_squad_file(path: &Path) -> Result<Vec<SquadSelection>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("read squad file {}", path.display()))?;
    serde_json::from_str(&raw).context("parse squad file")
}

fn export_path(config: &EngineConfig, record: &FinalizedMatchRecord) -> PathBuf {
    let stamp: String = record
        .date
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect();
    let file = format!("match_{stamp}.xlsx");
    match config.snapshot_dir() {
        Some(dir) => dir.join(file),
        None => PathBuf::from(file),
    }
}
