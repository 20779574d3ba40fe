//! Error type for layout control operations.
//!
//! Hardware operations on the layout never fail observably. The only errors
//! are a full exit queue and identifiers outside their nominal range, which
//! are rejected instead of being silently wrapped.
//!
//! ```rust
//! use rs_layout::{LayoutError, PointId};
//!
//! assert_eq!(PointId::new(33), Err(LayoutError::PointOutOfRange(33)));
//! assert_eq!(
//!     LayoutError::QueueFull.to_string(),
//!     "exit queue is full"
//! );
//! ```

use thiserror::Error;

/// Errors reported by the layout controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum LayoutError {
    /// The exit queue already holds its maximum number of requests.
    ///
    /// The queue is left unmodified.
    #[error("exit queue is full")]
    QueueFull,

    /// Point number outside 1..=32.
    #[error("point {0} out of range (1..=32)")]
    PointOutOfRange(u8),

    /// Occupancy detector number outside 1..=32.
    #[error("occupancy detector {0} out of range (1..=32)")]
    TotiOutOfRange(u8),

    /// State machine number outside 1..=3.
    #[error("state machine {0} out of range (1..=3)")]
    MachineOutOfRange(u8),

    /// State value outside 0..=127.
    #[error("state {0} out of range (0..=127)")]
    StateOutOfRange(u8),

    /// Timer index outside the bank.
    #[error("timer {0} out of range")]
    TimerOutOfRange(usize),

    /// Siding number outside 0..=8, or siding 0 without a through route.
    #[error("siding {0} out of range")]
    SidingOutOfRange(u8),

    /// Exit request without any destination bit.
    #[error("exit request {0:#04x} has no destination")]
    NoDestination(u8),
}

/// Errors from parsing a text command.
///
/// ```rust
/// use rs_layout::commands::LayoutCommand;
/// use rs_layout::{CommandError, LayoutError};
///
/// assert_eq!(LayoutCommand::parse("warp 9"), Err(CommandError::UnknownCommand));
/// assert_eq!(
///     LayoutCommand::parse("point 40 set"),
///     Err(CommandError::Invalid(LayoutError::PointOutOfRange(40)))
/// );
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum CommandError {
    /// Blank line or comment.
    #[error("empty command")]
    Empty,

    /// First word is not a known command.
    #[error("unknown command")]
    UnknownCommand,

    /// A required argument is absent.
    #[error("missing argument: {0}")]
    MissingArgument(&'static str),

    /// More arguments than the command takes.
    #[error("unexpected trailing argument")]
    TrailingArgument,

    /// An argument that should be a number is not.
    #[error("invalid number for {0}")]
    InvalidNumber(&'static str),

    /// Destination name not recognised.
    #[error("unknown destination")]
    UnknownDestination,

    /// Point level is neither `set` nor `clear`.
    #[error("expected `set` or `clear`")]
    InvalidLevel,

    /// Arguments parsed but are out of range.
    #[error(transparent)]
    Invalid(#[from] LayoutError),
}
