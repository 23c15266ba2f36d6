//! Interactive terminal UI: browse tickets and edit timeline details.

mod app;
mod screens;

pub use app::run;
