// Library surface for the binary, headless integration tests and reuse.
pub mod app;
pub mod app_dirs;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod model;
pub mod runtime;
pub mod stats;
pub mod stopwatch;
pub mod store;
pub mod time_series;
pub mod ui;
pub mod util;

pub use app::{Action, App, Screen};
pub use error::{StoreError, StoreResult};
pub use model::{Record, RecordId, Timer, TimerId};
pub use store::{Repository, TimerStore};
