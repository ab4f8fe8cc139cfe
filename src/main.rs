// runprompt: collect a program's standard input before it runs remotely

use std::fs::{self, File};
use std::io::{self, IsTerminal};
use std::sync::Mutex;

use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt, registry::Registry, EnvFilter};

use runprompt::analysis::{analyze, Analysis};
use runprompt::config::{usage, Config, ConfigError, LOG_ENV};
use runprompt::dispatch::ExecutionRequest;
use runprompt::errors::DispatchError;
use runprompt::session::{drive, Session};
use runprompt::ui::{App, LineAnswers};

/// Logs go to the `--log` file, or to stderr in line mode. The TUI owns the
/// screen, so without a file nothing is installed.
fn setup_global_subscriber(config: &Config, plain: bool) -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));

    if let Some(path) = &config.log {
        let file = File::create(path)?;
        let layer = fmt::Layer::default().with_ansi(false).with_writer(Mutex::new(file));
        tracing::subscriber::set_global_default(Registry::default().with(filter).with(layer))?;
    } else if plain {
        let layer = fmt::Layer::default().with_writer(io::stderr);
        tracing::subscriber::set_global_default(Registry::default().with(filter).with(layer))?;
    }
    Ok(())
}

fn run_tui(analysis: Analysis) -> Result<Session, Box<dyn std::error::Error>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(Session::new(analysis));
    let res = app.run(&mut terminal);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res?;
    Ok(app.into_session())
}

fn run_plain(analysis: Analysis) -> Session {
    let mut session = Session::new(analysis);
    let mut answers = LineAnswers::stdio();
    if let Err(e) = drive(&mut session, &mut answers) {
        eprintln!();
        eprintln!("{}", e);
    }
    session
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args();
    let program_name = args.next().unwrap_or_else(|| String::from("runprompt"));

    let config = match Config::from_args(args) {
        Ok(config) => config,
        Err(ConfigError::HelpRequested) => {
            println!("{}", usage(&program_name));
            return Ok(());
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!();
            eprintln!("{}", usage(&program_name));
            std::process::exit(1);
        }
    };

    if !config.path.exists() {
        eprintln!("Error: File '{}' not found", config.path.display());
        std::process::exit(1);
    }

    let plain = config.plain || !io::stdin().is_terminal() || !io::stdout().is_terminal();
    setup_global_subscriber(&config, plain)?;

    let source = fs::read_to_string(&config.path)?;
    let language = match config.resolve_language(&source) {
        Ok(language) => language,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("Pass --lang <tag> to choose the language.");
            std::process::exit(1);
        }
    };

    eprintln!("Analysing {} as {}...", config.path.display(), language);
    let analysis = analyze(language.tag(), &source)?;
    eprintln!(
        "Found {} input site(s){}.",
        analysis.prompts.len(),
        match analysis.structure.top_loop {
            Some(_) => format!(", {} inside a loop", analysis.structure.loop_inputs()),
            None => String::new(),
        }
    );

    let session = if plain {
        run_plain(analysis)
    } else {
        run_tui(analysis)?
    };

    match ExecutionRequest::from_session(&session) {
        Ok(request) => {
            eprintln!("Collected {} value(s).", request.inputs.len());
            println!("{}", serde_json::to_string_pretty(&request)?);
        }
        Err(DispatchError::Cancelled) => eprintln!("Run cancelled; nothing to execute."),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }

    Ok(())
}
