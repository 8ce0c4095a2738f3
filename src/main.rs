//! Headless driver for the journaled calculator.
//!
//! One thread reads commands from stdin and emits them as events; the main
//! thread runs the engine's update step at a fixed interval and prints the
//! stack whenever it changes. `quit` (or end of input) stops the loop, after
//! which the journal is saved if one is configured.

use std::io::{self, BufRead};
use std::process::ExitCode;
use std::sync::atomic::Ordering;
use std::thread;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use csplab::calculator::{Calculator, Command};
use csplab::settings::{DEFAULT_SETTINGS_FILE, Settings};

fn main() -> ExitCode {
    let path = std::env::args().nth(1).unwrap_or_else(|| DEFAULT_SETTINGS_FILE.to_string());
    let settings = match Settings::load(&path) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.log_filter));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    match run(&settings) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "calculator stopped");
            ExitCode::FAILURE
        }
    }
}

fn run(settings: &Settings) -> csplab::Result<()> {
    let calculator = match settings.script_source()? {
        Some(script) => Calculator::with_script(&script)?,
        None => Calculator::new()?,
    };
    if let Some(journal) = settings.journal.as_ref().filter(|path| path.exists()) {
        let replayed = calculator.replay_journal(journal)?;
        info!(replayed, path = %journal.display(), "replaying journal");
    }

    let emitter = calculator.engine().emitter();
    let quit = calculator.quit_flag();
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else {
                break;
            };
            if line.trim().is_empty() {
                continue;
            }
            match Command::parse(&line) {
                Some(command) => command.emit(&emitter),
                None => warn!(input = %line, "unrecognized input"),
            }
        }
        // end of input: ask politely, then make sure the loop stops
        Command::Quit.emit(&emitter);
        quit.store(true, Ordering::SeqCst);
    });

    let mut shown = calculator.stack();
    println!("{shown:?}");
    while !calculator.quit_requested() {
        calculator.update();
        let stack = calculator.stack();
        if stack != shown {
            println!("{stack:?}");
            shown = stack;
        }
        thread::sleep(settings.frame_interval());
    }
    // whatever was queued before the flag went up
    calculator.update();
    let stack = calculator.stack();
    if stack != shown {
        println!("{stack:?}");
    }

    if let Some(journal) = &settings.journal {
        calculator.save_journal(journal)?;
        info!(path = %journal.display(), entries = calculator.journal().entries().len(), "journal saved");
    }
    Ok(())
}
