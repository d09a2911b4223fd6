//! cerebro - a terminal with natural-language command suggestions
//!
//! cerebro hosts your shell in a pseudo-terminal and draws it inside the
//! current terminal window. Type a request in plain words and press
//! Shift+Enter: a local language model proposes a single shell command,
//! which runs only after you confirm it.
//!
//! # Quick Start
//!
//! ```text
//! cerebro                    # Start with $SHELL
//! cerebro -s /bin/zsh        # Start with a specific shell
//! cerebro --model llama3     # Use another ollama model
//! ```
//!
//! # Keys
//!
//! | Key | Action |
//! |-----|--------|
//! | Enter | Send the line to the shell |
//! | Shift+Enter | Ask the AI for a command |
//! | y / n | Run / cancel a suggestion |
//! | Ctrl+C, Ctrl+D | Sent straight to the shell |
//! | Esc | Quit |

mod ai;
mod config;
mod core;
mod input;
mod ui;

use std::env;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use crossterm::event::{self, Event};
use tracing::{debug, error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::ai::{AiService, CommandRuntime};
use crate::config::Config as CerebroConfig;
use crate::core::session::Session;
use crate::input::{InputRouter, RouterContext, RouterOutcome};
use crate::ui::{CursorBlink, KeyMapper, Renderer};

/// Shell used when neither the command line, the config file nor $SHELL name one
const DEFAULT_SHELL: &str = "/bin/bash";

/// Smallest usable grid; anything smaller falls back to 80x24
const MIN_COLS: u16 = 10;
const MIN_ROWS: u16 = 5;
const FALLBACK_COLS: u16 = 80;
const FALLBACK_ROWS: u16 = 24;

/// How long the loop waits for input between frames
const FRAME_WAIT: Duration = Duration::from_millis(10);

/// Command line options
#[derive(Debug, Default)]
struct Cli {
    /// Shell command
    shell: Option<String>,
    /// AI model name
    model: Option<String>,
    /// Log level
    log_level: Option<String>,
    /// Write a default config file and exit
    init_config: bool,
}

/// Version string from Cargo.toml
const VERSION: &str = env!("CARGO_PKG_VERSION");

fn print_version() {
    eprintln!("cerebro {}", VERSION);
}

fn print_help() {
    eprintln!("cerebro {} - a terminal with natural-language command suggestions", VERSION);
    eprintln!();
    eprintln!("Usage: cerebro [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -s, --shell <PATH>    Shell to run (default: $SHELL, then {})", DEFAULT_SHELL);
    eprintln!("  --model <NAME>        Model for the AI runtime (default: qwen2.5:7b)");
    eprintln!("  --log-level <LEVEL>   trace, debug, info, warn or error (default: info)");
    eprintln!("  --init-config         Write a default config file and exit");
    eprintln!("  -v, --version         Show version");
    eprintln!("  -h, --help            Show this help");
    eprintln!();
    eprintln!("Keys:");
    eprintln!("  Enter                 Send the line to the shell");
    eprintln!("  Shift+Enter           Ask the AI to turn the line into a command");
    eprintln!("  y / n                 Run / cancel the suggested command");
    eprintln!("  Ctrl+C, Ctrl+D        Sent straight to the shell");
    eprintln!("  Esc                   Quit");
    eprintln!();
    eprintln!("Configuration: ~/.cerebro/config.toml");
    eprintln!("Log file:      ~/.cerebro/cerebro.log");
}

fn parse_args() -> Result<Cli, String> {
    let args: Vec<String> = env::args().collect();
    let mut cli = Cli::default();
    let mut i = 1;

    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            "-v" | "--version" => {
                print_version();
                std::process::exit(0);
            }
            "-s" | "--shell" => {
                i += 1;
                if i >= args.len() {
                    return Err("Missing shell argument".to_string());
                }
                cli.shell = Some(args[i].clone());
            }
            "--model" => {
                i += 1;
                if i >= args.len() {
                    return Err("Missing model argument".to_string());
                }
                cli.model = Some(args[i].clone());
            }
            "--log-level" => {
                i += 1;
                if i >= args.len() {
                    return Err("Missing log level argument".to_string());
                }
                cli.log_level = Some(args[i].clone());
            }
            "--init-config" => {
                cli.init_config = true;
            }
            arg => {
                return Err(format!("Unknown argument: {}. Use -h for help.", arg));
            }
        }
        i += 1;
    }

    Ok(cli)
}

/// Shell to run: command line, then config file, then $SHELL
fn resolve_shell(cli: Option<&str>, config: Option<&str>, env_shell: Option<String>) -> String {
    cli.or(config)
        .map(str::to_string)
        .or(env_shell.filter(|s| !s.trim().is_empty()))
        .unwrap_or_else(|| DEFAULT_SHELL.to_string())
}

/// Grid size from the host terminal, with fallbacks for tiny windows
fn grid_size(measured: Option<(u16, u16)>) -> (u16, u16) {
    let (cols, rows) = measured.unwrap_or((FALLBACK_COLS, FALLBACK_ROWS));
    let cols = if cols < MIN_COLS { FALLBACK_COLS } else { cols };
    let rows = if rows < MIN_ROWS { FALLBACK_ROWS } else { rows };
    (cols, rows)
}

fn init_logging(level: &str) {
    let Some(dir) = config::data_dir() else {
        return;
    };
    let log_path = dir.join("cerebro.log");

    // Open log file (append mode)
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .ok();

    if let Some(file) = log_file {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(filter)
            .with_writer(std::sync::Mutex::new(file))
            .with_ansi(false)
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    }
}

fn main() -> anyhow::Result<()> {
    // Parse command line arguments
    let cli = match parse_args() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("Use --help for usage information");
            std::process::exit(1);
        }
    };

    if cli.init_config {
        let path = CerebroConfig::default().save()?;
        eprintln!("Wrote {}", path.display());
        return Ok(());
    }

    let config = CerebroConfig::load();
    init_logging(cli.log_level.as_deref().unwrap_or(&config.log_level));

    info!("cerebro {} starting...", VERSION);

    let result = run_terminal(cli, config);
    if let Err(e) = &result {
        error!("{:#}", e);
    }
    info!("cerebro exiting");
    result
}

/// Run the terminal until the user quits
fn run_terminal(cli: Cli, config: CerebroConfig) -> anyhow::Result<()> {
    let shell = resolve_shell(
        cli.shell.as_deref(),
        config.shell.as_deref(),
        env::var("SHELL").ok(),
    );
    let model = cli.model.unwrap_or_else(|| config.ai.model.clone());

    let (cols, rows) = grid_size(Renderer::size().ok());
    info!("Shell: {}", shell);
    info!("AI: {} run {}", config.ai.program, model);
    info!("Terminal size: {}x{}", cols, rows);

    // No shell, no terminal
    let mut session = Session::start(&shell, cols, rows)
        .with_context(|| format!("failed to start shell {}", shell))?;
    if let Some(pid) = session.pty.child_pid() {
        info!("Shell pid: {}", pid);
    }

    let mut ai = AiService::new(Arc::new(CommandRuntime::ollama(&config.ai.program, &model)));
    let mut router = InputRouter::new(config.ai.trigger_modifier());
    let mut blink = CursorBlink::new(Duration::from_millis(config.cursor_blink_ms), Instant::now());

    let mut renderer = Renderer::new();
    renderer.init().context("failed to initialize terminal")?;

    let result = run_main_loop(&mut session, &mut router, &mut ai, &mut blink, &mut renderer);

    let _ = renderer.cleanup();
    result
}

fn run_main_loop(
    session: &mut Session,
    router: &mut InputRouter,
    ai: &mut AiService,
    blink: &mut CursorBlink,
    renderer: &mut Renderer,
) -> anyhow::Result<()> {
    let mut force_redraw = true;
    let mut shell_exited = false;

    loop {
        // Keyboard events
        while event::poll(Duration::ZERO)? {
            match event::read()? {
                Event::Key(key_event) => {
                    let Some(key) = KeyMapper::map(&key_event) else {
                        continue;
                    };
                    let mut ctx = RouterContext {
                        screen: &mut session.screen,
                        shell: &mut session.pty,
                        ai: &mut *ai,
                    };
                    if router.handle_key(key, &mut ctx) == RouterOutcome::Quit {
                        info!("Quit requested");
                        return Ok(());
                    }
                }
                Event::Resize(new_cols, new_rows) => {
                    // The grid keeps its startup size
                    debug!("Host resized to {}x{}", new_cols, new_rows);
                    force_redraw = true;
                }
                _ => {}
            }
        }

        // Shell output
        session.pump();
        if !shell_exited && session.is_closed() {
            shell_exited = true;
            info!("Shell exited; waiting for Esc");
        }

        // AI result
        router.poll_ai(&mut session.screen, ai);

        let flipped = blink.tick(Instant::now());
        if session.screen.take_dirty() || flipped || force_redraw {
            renderer.render(&session.screen, blink.visible())?;
            force_redraw = false;
        }

        event::poll(FRAME_WAIT)?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_shell_precedence() {
        let env_shell = Some("/bin/zsh".to_string());
        assert_eq!(resolve_shell(Some("/bin/sh"), Some("/bin/fish"), env_shell.clone()), "/bin/sh");
        assert_eq!(resolve_shell(None, Some("/bin/fish"), env_shell.clone()), "/bin/fish");
        assert_eq!(resolve_shell(None, None, env_shell), "/bin/zsh");
        assert_eq!(resolve_shell(None, None, None), DEFAULT_SHELL);
        assert_eq!(resolve_shell(None, None, Some(" ".to_string())), DEFAULT_SHELL);
    }

    #[test]
    fn test_grid_size_fallbacks() {
        assert_eq!(grid_size(Some((120, 40))), (120, 40));
        assert_eq!(grid_size(Some((9, 40))), (80, 40));
        assert_eq!(grid_size(Some((120, 4))), (120, 24));
        assert_eq!(grid_size(Some((0, 0))), (80, 24));
        assert_eq!(grid_size(None), (80, 24));
    }
}
