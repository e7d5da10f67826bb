// Library surface for the binary, headless/integration tests and reuse.
pub mod app_dirs;
pub mod axis;
pub mod config;
pub mod controller;
pub mod effects;
pub mod error;
pub mod history;
pub mod live;
pub mod logging;
pub mod runtime;
pub mod score;
pub mod session;
pub mod sse;
pub mod time_series;
pub mod ui;
pub mod wire;
