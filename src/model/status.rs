//! Status catalog: the fixed sequence of repair states and their labels.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Label used for any code outside the known catalog.
///
/// Matches the terminal status label, so unknown codes read as complete.
/// Use [`StatusCatalog::distinct`] to tell them apart.
pub const FALLBACK_LABEL: &str = "Repair Marked Complete";

/// Alternative fallback that keeps unknown codes visibly separate.
pub const UNKNOWN_STATUS_LABEL: &str = "Unknown Status";

/// A raw status code as recorded in a ticket's state history.
///
/// Opaque outside the catalog: any integer is accepted and none panics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatusCode(pub i64);

impl StatusCode {
    /// The known status for this code, if any.
    pub fn status(self) -> Option<Status> {
        Status::ALL.into_iter().find(|s| s.code() == self)
    }

    /// Whether the catalog has an entry for this code.
    pub fn is_known(self) -> bool {
        self.status().is_some()
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// The known repair states, in presentation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Start,
    VmiTroubleshooting,
    RepairReleased,
    AwaitingParts,
    PartsAllocated,
    InRepair,
    ReadyForPickup,
    RepairComplete,
}

impl Status {
    pub const ALL: [Status; 8] = [
        Status::Start,
        Status::VmiTroubleshooting,
        Status::RepairReleased,
        Status::AwaitingParts,
        Status::PartsAllocated,
        Status::InRepair,
        Status::ReadyForPickup,
        Status::RepairComplete,
    ];

    pub fn code(self) -> StatusCode {
        let code = match self {
            Status::Start => 0,
            Status::VmiTroubleshooting => 1,
            Status::RepairReleased => 2,
            Status::AwaitingParts => 3,
            Status::PartsAllocated => 4,
            Status::InRepair => 5,
            Status::ReadyForPickup => 6,
            Status::RepairComplete => 7,
        };
        StatusCode(code)
    }

    pub fn label(self) -> &'static str {
        match self {
            Status::Start => "Start",
            Status::VmiTroubleshooting => "VMI Troubleshooting",
            Status::RepairReleased => "Repair Released from Processing",
            Status::AwaitingParts => "Awaiting Parts",
            Status::PartsAllocated => "Parts Allocated",
            Status::InRepair => "In Repair",
            Status::ReadyForPickup => "Ready For Pickup",
            Status::RepairComplete => "Repair Marked Complete",
        }
    }
}

/// Label for a status code, falling back to [`FALLBACK_LABEL`].
///
/// Total: every integer yields a label.
pub fn label_for(code: StatusCode) -> &'static str {
    StatusCatalog::parity().label_for(code)
}

/// A status catalog with a chosen fallback label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusCatalog {
    fallback: &'static str,
}

impl StatusCatalog {
    /// Unknown codes resolve to the terminal status label.
    pub const fn parity() -> Self {
        Self {
            fallback: FALLBACK_LABEL,
        }
    }

    /// Unknown codes resolve to [`UNKNOWN_STATUS_LABEL`].
    pub const fn distinct() -> Self {
        Self {
            fallback: UNKNOWN_STATUS_LABEL,
        }
    }

    pub fn fallback(&self) -> &'static str {
        self.fallback
    }

    pub fn label_for(&self, code: StatusCode) -> &'static str {
        code.status().map_or(self.fallback, Status::label)
    }
}

impl Default for StatusCatalog {
    fn default() -> Self {
        Self::parity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_codes_map_to_exact_labels() {
        let expected = [
            "Start",
            "VMI Troubleshooting",
            "Repair Released from Processing",
            "Awaiting Parts",
            "Parts Allocated",
            "In Repair",
            "Ready For Pickup",
            "Repair Marked Complete",
        ];
        for (code, label) in (0..).zip(expected) {
            assert_eq!(label_for(StatusCode(code)), label);
        }
    }

    #[test]
    fn unknown_codes_fall_back_to_complete() {
        for code in [-1, 8, 99, 1000, i64::MIN, i64::MAX] {
            assert_eq!(label_for(StatusCode(code)), "Repair Marked Complete");
            assert!(!StatusCode(code).is_known());
        }
    }

    #[test]
    fn distinct_catalog_separates_unknown_from_complete() {
        let catalog = StatusCatalog::distinct();
        assert_eq!(catalog.label_for(StatusCode(8)), UNKNOWN_STATUS_LABEL);
        assert_eq!(catalog.label_for(StatusCode(7)), "Repair Marked Complete");
    }

    #[test]
    fn all_is_in_code_order() {
        let codes: Vec<i64> = Status::ALL.iter().map(|s| s.code().0).collect();
        assert_eq!(codes, (0..8).collect::<Vec<_>>());
    }
}
