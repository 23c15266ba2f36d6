//! Core data model for repair tickets.
//!
//! Status codes and their catalog, detail annotations, and the ticket
//! record the timeline is rendered from.

mod detail;
mod status;
mod ticket;

pub use detail::Detail;
pub use status::{
    FALLBACK_LABEL, Status, StatusCatalog, StatusCode, UNKNOWN_STATUS_LABEL, label_for,
};
pub use ticket::{DetailChange, DetailUpdate, Ticket};
