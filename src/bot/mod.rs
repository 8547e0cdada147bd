//! Game automation for Diamond Dash.
//!
//! This module provides:
//! - config.json loading (`config`)
//! - Mouse input and the abort key (`input`)
//! - The capture → click → wait state machine (`state`)
//! - Entry points for live play and offline analysis (`runner`)

pub mod config;
pub mod input;
pub mod runner;
pub mod state;

pub use config::{get_config, init_config};
pub use runner::{analyze_screenshot, create_session, run_bot};
