// Library surface for headless/integration tests and reuse.
// The binary in main.rs only adds the terminal plumbing and CLI.
pub mod app;
pub mod app_dirs;
pub mod celebration;
pub mod classifier;
pub mod config;
pub mod error;
pub mod game;
pub mod gate;
pub mod labels;
pub mod runtime;
pub mod shaper;
pub mod sketch;
pub mod ui;
pub mod util;

pub use app::App;
