#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Crime report, responder, and SOS alert enumerations.
//!
//! This crate defines the canonical status and category values shared by
//! the whole crime-watch system. Every value serializes to the same
//! `snake_case` string that is stored in the database and sent over the
//! HTTP API, so the store, the dispatch workflow, and the server all agree
//! on one spelling.
//!
//! It also owns the two small tables that drive the response workflow:
//! which timestamp a [`ResponseStatus`] stamps, and which [`ReportStatus`]
//! it cascades onto the parent report.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Severity level for a reported crime, from 1 (low) to 4 (critical).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CrimeSeverity {
    /// Level 1: no immediate danger
    Low = 1,
    /// Level 2: needs attention soon
    Medium = 2,
    /// Level 3: serious, someone may be at risk
    High = 3,
    /// Level 4: life-threatening or in progress with violence
    Critical = 4,
}

impl CrimeSeverity {
    /// Returns the numeric value of this severity level.
    #[must_use]
    pub const fn value(self) -> u8 {
        self as u8
    }

    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Low, Self::Medium, Self::High, Self::Critical]
    }
}

/// Lifecycle status of a crime report.
///
/// A report is created as [`ReportStatus::Reported`]. After that its status
/// only changes as a side effect of responder updates (see
/// [`ResponseStatus::report_cascade`]).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ReportStatus {
    /// Newly submitted
    Reported,
    /// Responders have been assigned
    Dispatched,
    /// A responder is on scene
    Investigating,
    /// A responder completed the response
    Resolved,
    /// Closed by an administrator
    Closed,
}

/// One responder's engagement status with one report.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ResponseStatus {
    /// Fan-out created the row; the responder has not acted yet
    Notified,
    /// The responder accepted the dispatch
    Accepted,
    /// The responder is travelling to the scene
    EnRoute,
    /// The responder reached the scene
    Arrived,
    /// The responder finished
    Completed,
    /// The responder turned the dispatch down
    Declined,
}

impl ResponseStatus {
    /// Returns the timestamp column stamped when a response moves to this
    /// status, if any.
    #[must_use]
    pub const fn timestamp_field(self) -> Option<ResponseTimestamp> {
        match self {
            Self::Accepted => Some(ResponseTimestamp::ResponseTime),
            Self::Arrived => Some(ResponseTimestamp::ArrivalTime),
            Self::Completed => Some(ResponseTimestamp::CompletionTime),
            Self::Notified | Self::EnRoute | Self::Declined => None,
        }
    }

    /// Returns the status the parent report moves to when a response
    /// reaches this status, if any.
    #[must_use]
    pub const fn report_cascade(self) -> Option<ReportStatus> {
        match self {
            Self::Arrived => Some(ReportStatus::Investigating),
            Self::Completed => Some(ReportStatus::Resolved),
            Self::Notified | Self::Accepted | Self::EnRoute | Self::Declined => None,
        }
    }

    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Notified,
            Self::Accepted,
            Self::EnRoute,
            Self::Arrived,
            Self::Completed,
            Self::Declined,
        ]
    }
}

/// The per-transition timestamp columns on a vigilante response.
///
/// [`AsRef<str>`] yields the column name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum ResponseTimestamp {
    /// Stamped on `accepted`
    ResponseTime,
    /// Stamped on `arrived`
    ArrivalTime,
    /// Stamped on `completed`
    CompletionTime,
}

/// Kind of user account.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum UserType {
    /// A member of the community who files reports
    Resident,
    /// A volunteer responder
    Vigilante,
    /// Police or another official agency
    Authority,
}

impl UserType {
    /// User types notified when a crime report is submitted.
    pub const REPORT_RESPONDERS: &'static [Self] = &[Self::Vigilante];

    /// User types counted as responders for an SOS alert.
    pub const SOS_RESPONDERS: &'static [Self] = &[Self::Vigilante, Self::Authority];
}

/// Kind of emergency raised by an SOS alert.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SosAlertType {
    /// Unspecified emergency
    General,
    /// Medical emergency
    Medical,
    /// Fire
    Fire,
    /// Crime in progress
    Crime,
    /// Traffic or other accident
    Accident,
}

/// Lifecycle status of an SOS alert.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SosAlertStatus {
    /// Raised and awaiting a responder
    Active,
    /// A responder has picked it up
    Responded,
    /// Dealt with
    Resolved,
    /// Raised by mistake
    FalseAlarm,
}
