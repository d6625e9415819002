// Library root for the Minesweeper TUI
// The binary in main.rs wires these modules together

pub mod xtm_config; // User configuration and persistence
pub mod xtm_field;  // Minefield model: placement and adjacency counts
pub mod xtm_game;   // Game rules: reveal, flags, chord, win/loss, timer
pub mod xtm_log;    // File-based tracing setup
pub mod xtm_theme;  // Glyphs and terminal color matching
pub mod xtm_ui;     // Terminal UI rendering and event handling

pub use xtm_field::{FieldError, FieldState, Minefield};
pub use xtm_game::{CellView, Game, GameStatus, Mark, RevealOutcome};
