use std::{
    error::Error,
    io::{self, stdin},
    path::PathBuf,
    sync::{mpsc::Sender, Arc},
    time::Instant,
};

use chrono::NaiveDateTime;
use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::KeyEventKind,
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};

use focusdash::{
    axis::Granularity,
    config::{Config, ConfigStore, FileConfigStore},
    controller::{parse_pivot, Dashboard, KeyOutcome},
    history::{HistorySource, HttpHistorySource},
    live::LiveChannel,
    logging::init_logging,
    runtime::{spawn_interval, spawn_terminal_reader, ChannelEventSource, DashEvent, Runner},
    session::SessionMachine,
    ui,
};

/// live concentration dashboard with an evolving companion and history charts
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Follows a concentration monitor's live score stream, hatches a companion once enough focus has accumulated, and charts past scores by hour or by day."
)]
pub struct Cli {
    /// base url of the monitor service
    #[clap(short = 's', long)]
    server: Option<String>,

    /// accumulated score at which the companion hatches
    #[clap(short = 'e', long)]
    evolution_threshold: Option<f64>,

    /// overall score above which the companion counts as focused
    #[clap(short = 'a', long)]
    activity_threshold: Option<f64>,

    /// start the history view with daily granularity
    #[clap(long)]
    by_day: bool,

    /// history pivot, e.g. 2024-01-01T10:00 (defaults to now)
    #[clap(long, value_parser = parse_at)]
    at: Option<NaiveDateTime>,

    /// config file to read instead of the default location
    #[clap(short = 'c', long)]
    config: Option<PathBuf>,

    /// log file (defaults to ~/.local/state/focusdash/focusdash.log)
    #[clap(long)]
    log_file: Option<PathBuf>,

    /// log filter such as "debug" or "focusdash=trace"; RUST_LOG wins when set
    #[clap(long)]
    log_level: Option<String>,
}

fn parse_at(s: &str) -> Result<NaiveDateTime, String> {
    parse_pivot(s).ok_or_else(|| format!("'{s}' is not YYYY-MM-DDTHH:MM or YYYY-MM-DD"))
}

impl Cli {
    /// Overlay command line flags on a loaded config
    fn apply(&self, mut config: Config) -> Config {
        if let Some(server) = &self.server {
            config.server_url = server.clone();
        }
        if let Some(threshold) = self.evolution_threshold {
            config.evolution_threshold = threshold;
        }
        if let Some(threshold) = self.activity_threshold {
            config.activity_threshold = threshold;
        }
        if let Some(level) = &self.log_level {
            config.log_level = level.clone();
        }
        config
    }

    fn granularity(&self) -> Granularity {
        if self.by_day {
            Granularity::Daily
        } else {
            Granularity::Hourly
        }
    }

    fn config_store(&self) -> FileConfigStore {
        match &self.config {
            Some(path) => FileConfigStore::with_path(path),
            None => FileConfigStore::new(),
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    let config = cli.apply(cli.config_store().load());
    if let Err(err) = config.validate() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::ValueValidation, err).exit();
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    // Logging is best effort; the dashboard runs without it.
    let _log_guard = match init_logging(&config.log_level, cli.log_file.as_deref()) {
        Ok(guard) => Some(guard),
        Err(err) => {
            eprintln!("focusdash: logging disabled: {err}");
            None
        }
    };
    tracing::info!(server = %config.server_url, "starting");

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = start_tui(&mut terminal, &cli, &config);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = &result {
        tracing::error!(%err, "dashboard stopped");
    }
    result
}

fn start_tui<B: Backend>(
    terminal: &mut Terminal<B>,
    cli: &Cli,
    config: &Config,
) -> Result<(), Box<dyn Error>> {
    let events = ChannelEventSource::new();
    let tx = events.sender();

    spawn_terminal_reader(tx.clone());
    spawn_interval(tx.clone(), config.tick_rate(), || DashEvent::Tick);
    spawn_interval(tx.clone(), config.repeat_interval(), || DashEvent::RepeatPulse);

    let machine = SessionMachine::new(config.evolution_threshold, config.activity_threshold);
    let pivot = cli
        .at
        .unwrap_or_else(|| chrono::Local::now().naive_local());
    let mut dashboard = Dashboard::new(machine, pivot, cli.granularity());
    let history: Arc<dyn HistorySource> = Arc::new(HttpHistorySource::new(config.server_url.as_str()));

    dashboard.open_session();
    let channel = LiveChannel::open(&config.server_url, tx.clone());

    let runner = Runner::new(events, config.tick_rate());
    let result = event_loop(terminal, &mut dashboard, &runner, &history, &tx);

    channel.close();
    dashboard.close_session();
    result
}

fn event_loop<B: Backend>(
    terminal: &mut Terminal<B>,
    dashboard: &mut Dashboard,
    runner: &Runner<ChannelEventSource>,
    history: &Arc<dyn HistorySource>,
    tx: &Sender<DashEvent>,
) -> Result<(), Box<dyn Error>> {
    let mut last_tick = Instant::now();
    terminal.draw(|f| ui::draw(dashboard, f))?;

    loop {
        match runner.step() {
            DashEvent::Key(key) => {
                // Some terminals also report releases.
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                match dashboard.handle_key(key) {
                    KeyOutcome::Quit => break,
                    KeyOutcome::Render(request) => request.spawn(Arc::clone(history), tx.clone()),
                    KeyOutcome::Continue => {}
                }
            }
            DashEvent::Resize => {}
            DashEvent::Tick => {
                let now = Instant::now();
                dashboard.on_tick(now.duration_since(last_tick).as_secs_f64());
                last_tick = now;
            }
            DashEvent::RepeatPulse => dashboard.on_repeat_pulse(),
            DashEvent::Channel(event) => dashboard.on_channel_event(event),
            DashEvent::ChartReady(payload) => dashboard.on_chart_ready(payload),
        }

        terminal.draw(|f| ui::draw(dashboard, f))?;
    }

    Ok(())
}
