//! Diamond Dash Bot
//!
//! Finds the Diamond Dash board on the primary monitor, reads the tile
//! colors and keeps clicking the largest group of matching tiles.
//!
//! Usage:
//!   dd-bot                          play until Escape is held (Windows)
//!   dd-bot --analyze <screen.png>   report the move for a saved screenshot

mod board;
mod bot;
mod capture;
mod paths;

use anyhow::{anyhow, Result};
use chrono::Local;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

/// Logs a message to both console and log file with timestamp.
pub fn log(msg: &str) {
    let timestamp = Local::now().format("%H:%M:%S%.3f");
    let line = format!("[{}] {}\n", timestamp, msg);
    print!("{}", line);
    let log_path = paths::get_logs_dir().join("dd_bot.log");
    if let Ok(mut file) = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    {
        let _ = file.write_all(line.as_bytes());
    }
}

/// What the process was asked to do.
enum Command {
    Play,
    Analyze(PathBuf),
}

fn parse_args(args: &[String]) -> Result<Command> {
    match args {
        [] => Ok(Command::Play),
        [flag, path] if flag == "--analyze" => Ok(Command::Analyze(PathBuf::from(path))),
        _ => Err(anyhow!(
            "Usage: dd-bot [--analyze <screenshot.png>]"
        )),
    }
}

fn main() -> Result<()> {
    // Set up panic hook to log panics
    std::panic::set_hook(Box::new(|panic_info| {
        let msg = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };
        let location = if let Some(loc) = panic_info.location() {
            format!(" at {}:{}:{}", loc.file(), loc.line(), loc.column())
        } else {
            String::new()
        };
        log(&format!("[PANIC]{} {}", location, msg));
    }));

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = parse_args(&args)?;

    // Ensure output directories exist
    paths::ensure_directories()?;

    bot::init_config();
    let config = bot::get_config();

    match command {
        Command::Play => {
            #[cfg(windows)]
            unsafe {
                windows::Win32::System::WinRT::RoInitialize(
                    windows::Win32::System::WinRT::RO_INIT_MULTITHREADED,
                )?
            };

            log("Starting Diamond Dash bot...");
            if let Err(e) = bot::run_bot(config) {
                log(&format!("Bot error: {:#}", e));
                return Err(e);
            }
            Ok(())
        }
        Command::Analyze(path) => {
            let mut session = bot::create_session(config)?;
            bot::analyze_screenshot(&path, &mut session, config)?;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_args() {
        assert!(matches!(parse_args(&args(&[])).unwrap(), Command::Play));
        assert!(matches!(
            parse_args(&args(&["--analyze", "shot.png"])).unwrap(),
            Command::Analyze(p) if p == PathBuf::from("shot.png")
        ));
        assert!(parse_args(&args(&["--analyze"])).is_err());
        assert!(parse_args(&args(&["--bogus", "x"])).is_err());
    }
}
