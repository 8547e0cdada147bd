//! Bot state machine.
//!
//! The state machine sequences through: Capture → Click → Wait → Loop.
//! Each step checks the abort flag first. A missing or unsettled board is
//! retried on a fresh capture; anything else stops the run.

use anyhow::Result;
use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::board::{BoardError, Decision, Session};
use crate::bot::config::BotConfig;
use crate::bot::input::Actuator;
use crate::capture::{save_capture, CaptureSource};

/// Log a missing board only every this many consecutive misses.
const MISS_LOG_INTERVAL: u32 = 25;

/// Bot state machine states.
#[derive(Debug, Clone, PartialEq)]
pub enum BotState {
    /// Waiting to start (initial state)
    Idle,
    /// Capturing the screen and choosing a move
    Capturing,
    /// Clicking the chosen tile
    Clicking(Decision),
    /// Letting the board settle after a move
    Waiting(Duration),
    /// Move limit reached
    Complete,
    /// Error occurred
    Error(String),
    /// User requested abort
    Aborted,
}

impl fmt::Display for BotState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BotState::Idle => write!(f, "Idle"),
            BotState::Capturing => write!(f, "Capturing"),
            BotState::Clicking(d) => write!(f, "Clicking ({}, {})", d.target.x, d.target.y),
            BotState::Waiting(delay) => write!(f, "Waiting {}ms", delay.as_millis()),
            BotState::Complete => write!(f, "Complete"),
            BotState::Error(msg) => write!(f, "Error: {}", msg),
            BotState::Aborted => write!(f, "Aborted"),
        }
    }
}

/// Bot context holding state, configuration and the platform seams.
pub struct BotContext<C: CaptureSource, A: Actuator> {
    /// Current state
    pub state: BotState,
    /// Bot configuration
    pub config: BotConfig,
    /// Board offset and search state
    pub session: Session,
    /// Moves played so far
    pub moves_made: u32,
    /// Time when the run started
    pub start_time: Instant,
    capture: C,
    actuator: A,
    abort: Arc<AtomicBool>,
    /// Where the first capture is saved (None = never)
    dump_dir: Option<PathBuf>,
    first_capture_saved: bool,
    consecutive_misses: u32,
}

impl<C: CaptureSource, A: Actuator> BotContext<C, A> {
    /// Creates a new bot context.
    pub fn new(
        config: BotConfig,
        session: Session,
        capture: C,
        actuator: A,
        abort: Arc<AtomicBool>,
        dump_dir: Option<PathBuf>,
    ) -> Self {
        Self {
            state: BotState::Idle,
            config,
            session,
            moves_made: 0,
            start_time: Instant::now(),
            capture,
            actuator,
            abort,
            dump_dir,
            first_capture_saved: false,
            consecutive_misses: 0,
        }
    }

    /// Advances the state machine by one step.
    ///
    /// Returns `Ok(true)` if the bot should continue, `Ok(false)` if complete/error/aborted.
    pub fn step(&mut self) -> Result<bool> {
        if self.abort.load(Ordering::SeqCst) {
            crate::log("Abort requested, stopping bot");
            self.state = BotState::Aborted;
            return Ok(false);
        }

        match &self.state {
            BotState::Idle => {
                crate::log(&format!(
                    "Starting in {}ms, switch to the game window",
                    self.config.start_delay_ms
                ));
                std::thread::sleep(self.config.start_delay());
                self.start_time = Instant::now();
                self.state = BotState::Capturing;
                Ok(true)
            }

            BotState::Capturing => {
                let screen = match self.capture.capture() {
                    Ok(screen) => screen,
                    Err(e) => {
                        self.state = BotState::Error(format!("Failed to capture: {}", e));
                        return Ok(false);
                    }
                };

                if !self.first_capture_saved {
                    self.first_capture_saved = true;
                    if self.config.dump_first_capture {
                        if let Some(dir) = &self.dump_dir {
                            // Diagnostics only, a failed save does not stop the bot
                            if let Err(e) = save_capture(&screen, dir) {
                                crate::log(&format!("Warning: Failed to save capture: {}", e));
                            }
                        }
                    }
                }

                match self.session.decide(&screen, self.config.move_delay()) {
                    Ok(decision) => {
                        self.consecutive_misses = 0;
                        self.state = BotState::Clicking(decision);
                        Ok(true)
                    }
                    Err(BoardError::PatternNotFound) => {
                        self.consecutive_misses += 1;
                        if self.consecutive_misses % MISS_LOG_INTERVAL == 1 {
                            crate::log(&format!(
                                "Not Diamond Dash ({} captures without a board)",
                                self.consecutive_misses
                            ));
                        }
                        std::thread::sleep(self.config.retry_delay());
                        Ok(true)
                    }
                    Err(e) if e.is_recoverable() => {
                        crate::log(&format!("{}, recapturing", e));
                        std::thread::sleep(self.config.retry_delay());
                        Ok(true)
                    }
                    Err(e) => {
                        self.state = BotState::Error(e.to_string());
                        Ok(false)
                    }
                }
            }

            BotState::Clicking(decision) => {
                let decision = *decision;
                crate::log(&format!(
                    "Move {}: clicking cell ({}, {}) at ({}, {}){}",
                    self.moves_made + 1,
                    decision.cell.row,
                    decision.cell.col,
                    decision.target.x,
                    decision.target.y,
                    if decision.power_tile { " [diamond]" } else { "" }
                ));

                let clicked = self
                    .actuator
                    .move_to(decision.target.x, decision.target.y)
                    .and_then(|()| self.actuator.click());
                if let Err(e) = clicked {
                    self.state = BotState::Error(format!("Failed to click: {}", e));
                    return Ok(false);
                }

                self.moves_made += 1;
                self.state = BotState::Waiting(decision.delay);
                Ok(true)
            }

            BotState::Waiting(delay) => {
                std::thread::sleep(*delay);

                if self
                    .config
                    .max_moves
                    .is_some_and(|max| self.moves_made >= max)
                {
                    crate::log(&format!(
                        "Bot complete: {} moves in {:.1}s",
                        self.moves_made,
                        self.start_time.elapsed().as_secs_f32()
                    ));
                    self.state = BotState::Complete;
                    Ok(false)
                } else {
                    self.state = BotState::Capturing;
                    Ok(true)
                }
            }

            BotState::Complete | BotState::Error(_) | BotState::Aborted => Ok(false),
        }
    }

    /// Returns a progress string for display.
    pub fn progress_string(&self) -> String {
        match self.config.max_moves {
            Some(max) => format!("{}/{} moves - {}", self.moves_made, max, self.state),
            None => format!("{} moves - {}", self.moves_made, self.state),
        }
    }
}
