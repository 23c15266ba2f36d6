//! Screen rendering and input handling.

mod tickets;
mod timeline;

pub use tickets::TicketsScreen;
pub use timeline::TimelineScreen;
