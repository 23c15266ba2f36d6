//! Repair ticket status timelines.
//!
//! A ticket moves through a fixed sequence of repair states. The timeline
//! shows every state it has reached with an operator-written detail, and
//! the detail editor lets an operator rewrite one row at a time.

pub mod cli;
pub mod config;
pub mod editor;
pub mod identity;
pub mod logging;
pub mod model;
pub mod storage;
pub mod timeline;
pub mod tui;
