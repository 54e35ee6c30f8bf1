use std::io::IsTerminal;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use duesync_core::{update, AppState, AppViewModel, Effect, FormField, Msg, StatusKind};
use duesync_logging::{ds_debug, ds_info, LogDestination};
use log::LevelFilter;

use super::cli::{Cli, Command};
use super::config::AppConfig;
use super::effects::EffectRunner;
use super::render::Renderer;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

pub fn run_app() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let mut config = AppConfig::load_or_default(&cli.config)?;
    config.apply_overrides(&cli);
    init_logging(&cli, &config);
    ds_info!("duesync starting: {:?}", cli.command);

    let runner =
        EffectRunner::new(config.to_engine_config()).context("failed to start the engine")?;
    let mut session = Session::new(runner, Renderer::new(std::io::stdout().is_terminal()));

    // Every entry point starts with the silent session check.
    session.dispatch(Msg::Started);
    session.settle();

    for msg in command_messages(cli.command) {
        session.dispatch(msg);
    }
    session.settle();

    let view = session.view();
    Ok(match view.status.map(|line| line.kind) {
        Some(StatusKind::Error) => ExitCode::FAILURE,
        _ => ExitCode::SUCCESS,
    })
}

fn init_logging(cli: &Cli, config: &AppConfig) {
    let path = config.log_file.clone();
    if cli.verbose {
        duesync_logging::initialize(LogDestination::Both(path), LevelFilter::Debug);
    } else {
        duesync_logging::initialize(LogDestination::File(path), LevelFilter::Info);
    }
}

fn command_messages(command: Command) -> Vec<Msg> {
    match command {
        Command::Status => Vec::new(),
        Command::Authorize => vec![Msg::AuthorizeClicked],
        Command::SignOut => vec![Msg::SignOutClicked],
        Command::Sync { target } => vec![Msg::SyncClicked(target.into())],
        Command::AddEvent {
            title,
            date,
            time,
            description,
        } => vec![
            field(FormField::Title, title),
            field(FormField::Date, date),
            field(FormField::Time, time),
            field(FormField::Description, description),
            Msg::AddEventClicked,
        ],
    }
}

fn field(field: FormField, value: String) -> Msg {
    Msg::FormFieldChanged { field, value }
}

/// Drives the core state machine against the engine until no effect is
/// left in flight.
struct Session {
    state: AppState,
    runner: EffectRunner,
    renderer: Renderer,
    in_flight: usize,
}

impl Session {
    fn new(runner: EffectRunner, renderer: Renderer) -> Self {
        Self {
            state: AppState::new(),
            runner,
            renderer,
            in_flight: 0,
        }
    }

    fn view(&self) -> AppViewModel {
        self.state.view()
    }

    fn dispatch(&mut self, msg: Msg) {
        if completes_effect(&msg) {
            self.in_flight = self.in_flight.saturating_sub(1);
        }
        let state = std::mem::take(&mut self.state);
        let (mut state, effects) = update(state, msg);
        if state.consume_dirty() {
            for line in self.renderer.render(&state.view()) {
                println!("{line}");
            }
        }
        self.state = state;
        self.run(effects);
    }

    fn run(&mut self, effects: Vec<Effect>) {
        self.in_flight += effects.len();
        self.runner.enqueue(effects);
    }

    fn settle(&mut self) {
        while self.in_flight > 0 {
            if let Some(msg) = self.runner.next_msg(POLL_INTERVAL) {
                ds_debug!("Engine message {:?}", msg);
                self.dispatch(msg);
            }
        }
    }
}

/// Messages that answer exactly one earlier effect.
fn completes_effect(msg: &Msg) -> bool {
    matches!(
        msg,
        Msg::AuthChecked { .. }
            | Msg::AuthorizeFinished(_)
            | Msg::SignOutFinished(_)
            | Msg::SyncFinished(_)
            | Msg::EventCreated(_)
    )
}
