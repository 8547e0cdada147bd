//! Bot runner - entry points for live play and offline analysis.

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::board::{BoardError, Decision, Session};
use crate::bot::config::BotConfig;
use crate::bot::input::Actuator;
use crate::bot::state::{BotContext, BotState};
use crate::capture::{load_rgb, CaptureSource, FileCapture};

/// Loads the anchor image and creates a fresh session.
pub fn create_session(config: &BotConfig) -> Result<Session> {
    let path = config.reference_path(crate::paths::get_exe_dir());
    let reference = load_rgb(&path).context("Anchor image is required to find the board")?;
    crate::log(&format!(
        "Loaded anchor {} ({}x{})",
        path.display(),
        reference.width(),
        reference.height()
    ));
    Ok(Session::new(reference))
}

/// Runs the state machine until it stops.
///
/// `poll_abort` is called before every step; returning true requests abort.
pub fn run_loop<C: CaptureSource, A: Actuator>(
    ctx: &mut BotContext<C, A>,
    abort: &AtomicBool,
    mut poll_abort: impl FnMut() -> bool,
) -> Result<()> {
    loop {
        if poll_abort() {
            abort.store(true, Ordering::SeqCst);
        }

        match ctx.step() {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => {
                crate::log(&format!("Bot error: {}", e));
                ctx.state = BotState::Error(e.to_string());
                break;
            }
        }
    }

    match &ctx.state {
        BotState::Complete => {
            crate::log(&format!("Bot finished: {}", ctx.progress_string()));
            Ok(())
        }
        BotState::Aborted => {
            crate::log(&format!("Bot aborted after {} moves", ctx.moves_made));
            Ok(())
        }
        BotState::Error(msg) => Err(anyhow::anyhow!("Bot failed: {}", msg)),
        other => Err(anyhow::anyhow!("Bot stopped in unexpected state: {}", other)),
    }
}

/// Plays the game on the primary monitor until aborted with Escape.
#[cfg(windows)]
pub fn run_bot(config: &BotConfig) -> Result<()> {
    use crate::bot::input::{escape_pressed, SendInputActuator};
    use crate::capture::ScreenCapture;
    use std::sync::Arc;

    let session = create_session(config)?;
    let capture = ScreenCapture::new()?;
    let actuator = SendInputActuator::new();
    let abort = Arc::new(AtomicBool::new(false));

    let mut ctx = BotContext::new(
        config.clone(),
        session,
        capture,
        actuator,
        abort.clone(),
        Some(crate::paths::get_captures_dir()),
    );

    crate::log("Bot running (hold Escape to stop)");
    run_loop(&mut ctx, &abort, escape_pressed)
}

/// Live play needs screen capture and input injection, which are only
/// implemented for Windows.
#[cfg(not(windows))]
pub fn run_bot(_config: &BotConfig) -> Result<()> {
    Err(anyhow::anyhow!(
        "Live play is only supported on Windows; use --analyze <screenshot.png>"
    ))
}

/// Reads a saved screenshot and reports the move the bot would play.
///
/// Returns `Ok(None)` when the screenshot shows no board or no confident move.
pub fn analyze_screenshot(
    path: &Path,
    session: &mut Session,
    config: &BotConfig,
) -> Result<Option<Decision>> {
    let screen = FileCapture::new(path).capture()?;
    crate::log(&format!(
        "Analyzing {} ({}x{})",
        path.display(),
        screen.width(),
        screen.height()
    ));

    match session.decide(&screen, config.move_delay()) {
        Ok(decision) => {
            crate::log(&format!(
                "Best move: cell ({}, {}) -> click ({}, {}), wait {}ms{}",
                decision.cell.row,
                decision.cell.col,
                decision.target.x,
                decision.target.y,
                decision.delay.as_millis(),
                if decision.power_tile { " [diamond]" } else { "" }
            ));
            Ok(Some(decision))
        }
        Err(e @ (BoardError::PatternNotFound | BoardError::Unsettled { .. })) => {
            crate::log(&format!("No move: {}", e));
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::palette::Palette;
    use crate::board::{BOARD_HEIGHT, BOARD_WIDTH, TILE_SIZE};
    use image::{Rgb, RgbImage};
    use std::sync::Arc;
    use tempfile::tempdir;

    struct NoopActuator;

    impl Actuator for NoopActuator {
        fn move_to(&mut self, _x: i32, _y: i32) -> Result<()> {
            Ok(())
        }

        fn click(&mut self) -> Result<()> {
            Ok(())
        }
    }

    struct StaticCapture(RgbImage);

    impl CaptureSource for StaticCapture {
        fn capture(&mut self) -> Result<RgbImage> {
            Ok(self.0.clone())
        }
    }

    fn anchor() -> RgbImage {
        RgbImage::from_fn(2, 2, |x, y| Rgb([90 + x as u8, 90 + y as u8, 90]))
    }

    /// Anchor at (0, 0); column 0 of the board is all blue, the rest varies.
    fn game_screen() -> RgbImage {
        const KINDS: [u8; 4] = [1, 3, 4, 2];
        let palette = Palette::default();
        let mut screen = RgbImage::new(420, 380);
        for y in 0..2 {
            for x in 0..2 {
                screen.put_pixel(x, y, *anchor().get_pixel(x, y));
            }
        }
        for y in 0..BOARD_HEIGHT {
            for x in 0..BOARD_WIDTH {
                let (r, c) = ((y / TILE_SIZE) as usize, (x / TILE_SIZE) as usize);
                let kind = if c == 0 { 5 } else { KINDS[(r * 2 + c) % 4] };
                screen.put_pixel(2 + x, 2 + y, palette.color(kind));
            }
        }
        screen
    }

    fn quiet_config() -> BotConfig {
        BotConfig {
            move_delay_ms: 0,
            start_delay_ms: 0,
            retry_delay_ms: 0,
            dump_first_capture: false,
            ..BotConfig::default()
        }
    }

    #[test]
    fn test_analyze_screenshot() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("screen.png");
        game_screen().save(&path).unwrap();
        let mut session = Session::new(anchor());

        let decision = analyze_screenshot(&path, &mut session, &quiet_config())
            .unwrap()
            .unwrap();

        // Right half has only singles, the retry finds the blue column
        assert_eq!((decision.cell.row, decision.cell.col), (0, 0));
        assert_eq!((decision.target.x, decision.target.y), (22, 22));
    }

    #[test]
    fn test_analyze_non_game_screenshot() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("desktop.png");
        RgbImage::new(500, 400).save(&path).unwrap();
        let mut session = Session::new(anchor());

        let result = analyze_screenshot(&path, &mut session, &quiet_config()).unwrap();

        assert!(result.is_none());
    }

    #[test]
    fn test_run_loop_stops_on_abort_poll() {
        let abort = Arc::new(AtomicBool::new(false));
        let mut ctx = BotContext::new(
            quiet_config(),
            Session::new(anchor()),
            StaticCapture(game_screen()),
            NoopActuator,
            abort.clone(),
            None,
        );
        let mut polls = 0;

        run_loop(&mut ctx, &abort, || {
            polls += 1;
            polls > 5
        })
        .unwrap();

        assert_eq!(ctx.state, BotState::Aborted);
        assert!(ctx.moves_made >= 1);
    }

    #[test]
    fn test_run_loop_reports_errors() {
        // Anchor is visible but the board would run off the screen
        let mut screen = RgbImage::new(100, 100);
        for y in 0..2 {
            for x in 0..2 {
                screen.put_pixel(x, y, *anchor().get_pixel(x, y));
            }
        }
        let abort = Arc::new(AtomicBool::new(false));
        let mut ctx = BotContext::new(
            quiet_config(),
            Session::new(anchor()),
            StaticCapture(screen),
            NoopActuator,
            abort.clone(),
            None,
        );

        let result = run_loop(&mut ctx, &abort, || false);

        assert!(result.is_err());
    }

    #[test]
    fn test_run_loop_completes_move_limit() {
        let abort = Arc::new(AtomicBool::new(false));
        let config = BotConfig {
            max_moves: Some(3),
            ..quiet_config()
        };
        let mut ctx = BotContext::new(
            config,
            Session::new(anchor()),
            StaticCapture(game_screen()),
            NoopActuator,
            abort.clone(),
            None,
        );

        run_loop(&mut ctx, &abort, || false).unwrap();

        assert_eq!(ctx.state, BotState::Complete);
        assert_eq!(ctx.moves_made, 3);
    }
}
