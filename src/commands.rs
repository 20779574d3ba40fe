//! Text commands for driving the layout from a console or a script.
//!
//! Each line is one command. Words are separated by whitespace; numbers may
//! be decimal or `0x` hex; `#` starts a comment.
//!
//! | Command | Effect |
//! |---|---|
//! | `point <n> set\|clear` | set or clear point `n` (`point 0 clear` clears the siding entry points) |
//! | `exit <dest>[+<dest>] <siding>` | queue an exit request, e.g. `exit main 3`, `exit through+main 0` |
//! | `pop` | dispatch the front request, making it active |
//! | `done` | forget the active request |
//! | `purge` | empty the queue, indicators off |
//! | `show` | re-encode the indicators with the active request flashing |
//! | `state <machine> <value>` | move a state machine (`merge`, `enter`, `exit` or 1..=3) |
//! | `timer <id> <seconds>` | arm a timer (0 stops it) |
//! | `tick [n]` | run `n` driver ticks (default 1) |
//! | `second [n]` | advance the timer bank `n` seconds (default 1) |
//!
//! # Example
//!
//! ```rust
//! use rs_layout::commands::LayoutCommand;
//! use rs_layout::exits::Destinations;
//! use rs_layout::PointId;
//!
//! let cmd = LayoutCommand::parse("point 5 set").unwrap();
//! assert_eq!(cmd, LayoutCommand::SetPoint { point: PointId::new(5).unwrap(), set: true });
//!
//! match LayoutCommand::parse("exit goods 2").unwrap() {
//!     LayoutCommand::Exit(request) => {
//!         assert_eq!(request.destination(), Destinations::GOODS);
//!         assert_eq!(request.siding(), 2);
//!     }
//!     other => panic!("unexpected {other:?}"),
//! }
//! ```

use crate::error::{CommandError, LayoutError};
use crate::exits::{Destinations, ExitRequest, IndicatorEncoding};
use crate::machine::{MachineId, MachineState};
use crate::points::PointId;

// ============================================================================
// Commands
// ============================================================================

/// A parsed layout command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum LayoutCommand {
    /// Set or clear one point.
    SetPoint {
        /// Point to move.
        point: PointId,
        /// True to set, false to clear.
        set: bool,
    },
    /// Clear the siding entry points.
    ClearSidingEntries,
    /// Queue an exit request.
    Exit(ExitRequest),
    /// Dispatch the front request.
    Pop,
    /// Empty the queue and turn the indicators off.
    Purge,
    /// Forget the active request.
    Done,
    /// Re-encode the indicators, flashing the active request.
    Show,
    /// Move a state machine.
    MoveState {
        /// Machine to move.
        machine: MachineId,
        /// New state, 0..=127.
        state: u8,
    },
    /// Arm (or stop) a timer.
    ArmTimer {
        /// Timer index.
        timer: usize,
        /// Countdown in seconds.
        seconds: u32,
    },
    /// Run driver ticks.
    Tick(u32),
    /// Advance the timer bank by whole seconds.
    Second(u32),
}

impl LayoutCommand {
    /// Parses one command line.
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let line = line.split('#').next().unwrap_or("").trim();
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            return Err(CommandError::Empty);
        };

        let cmd = match verb {
            v if v.eq_ignore_ascii_case("point") => {
                let n = parse_num::<u8>(words.next(), "point")?;
                let set = match words.next().ok_or(CommandError::MissingArgument("level"))? {
                    w if w.eq_ignore_ascii_case("set") => true,
                    w if w.eq_ignore_ascii_case("clear") => false,
                    _ => return Err(CommandError::InvalidLevel),
                };
                if n == 0 && !set {
                    Self::ClearSidingEntries
                } else {
                    Self::SetPoint {
                        point: PointId::new(n)?,
                        set,
                    }
                }
            }
            v if v.eq_ignore_ascii_case("exit") => {
                let dest = parse_destinations(words.next())?;
                let siding = parse_num::<u8>(words.next(), "siding")?;
                Self::Exit(ExitRequest::new(dest, siding)?)
            }
            v if v.eq_ignore_ascii_case("pop") => Self::Pop,
            v if v.eq_ignore_ascii_case("purge") => Self::Purge,
            v if v.eq_ignore_ascii_case("done") => Self::Done,
            v if v.eq_ignore_ascii_case("show") => Self::Show,
            v if v.eq_ignore_ascii_case("state") => {
                let machine = parse_machine(words.next())?;
                let state = parse_num::<u8>(words.next(), "state")?;
                if state > crate::machine::MAX_STATE {
                    return Err(LayoutError::StateOutOfRange(state).into());
                }
                Self::MoveState { machine, state }
            }
            v if v.eq_ignore_ascii_case("timer") => {
                let timer = parse_num::<usize>(words.next(), "timer")?;
                if timer >= crate::timers::TIMER_COUNT {
                    return Err(LayoutError::TimerOutOfRange(timer).into());
                }
                let seconds = parse_num::<u32>(words.next(), "seconds")?;
                Self::ArmTimer { timer, seconds }
            }
            v if v.eq_ignore_ascii_case("tick") => Self::Tick(parse_count(words.next())?),
            v if v.eq_ignore_ascii_case("second") => Self::Second(parse_count(words.next())?),
            _ => return Err(CommandError::UnknownCommand),
        };

        match words.next() {
            Some(_) => Err(CommandError::TrailingArgument),
            None => Ok(cmd),
        }
    }
}

impl core::str::FromStr for LayoutCommand {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

// ============================================================================
// Command Outcomes
// ============================================================================

/// Result of applying a command to the layout.
///
/// Returned by [`Layout::apply`](crate::Layout::apply).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum CommandOutcome {
    /// Command was applied; nothing to report.
    Applied,
    /// The request popped from the queue, if any.
    Dispatched(Option<ExitRequest>),
    /// The new indicator encoding.
    Indicator(IndicatorEncoding),
    /// The machine's state after the move.
    Machine(MachineState),
    /// Number of ticks (or seconds) run.
    Advanced(u32),
}

// ============================================================================
// Argument Helpers
// ============================================================================

trait ParseNum: Sized {
    fn from_radix(s: &str, radix: u32) -> Option<Self>;
}

macro_rules! parse_num_impl {
    ($($t:ty),*) => {
        $(impl ParseNum for $t {
            fn from_radix(s: &str, radix: u32) -> Option<Self> {
                <$t>::from_str_radix(s, radix).ok()
            }
        })*
    };
}

parse_num_impl!(u8, u32, usize);

fn parse_num<T: ParseNum>(word: Option<&str>, what: &'static str) -> Result<T, CommandError> {
    let word = word.ok_or(CommandError::MissingArgument(what))?;
    let parsed = match word.strip_prefix("0x").or_else(|| word.strip_prefix("0X")) {
        Some(hex) => T::from_radix(hex, 16),
        None => T::from_radix(word, 10),
    };
    parsed.ok_or(CommandError::InvalidNumber(what))
}

fn parse_count(word: Option<&str>) -> Result<u32, CommandError> {
    match word {
        Some(_) => parse_num(word, "count"),
        None => Ok(1),
    }
}

fn parse_destinations(word: Option<&str>) -> Result<Destinations, CommandError> {
    let word = word.ok_or(CommandError::MissingArgument("destination"))?;
    word.split('+').try_fold(Destinations::empty(), |acc, name| {
        Destinations::from_text(name)
            .map(|dest| acc | dest)
            .ok_or(CommandError::UnknownDestination)
    })
}

fn parse_machine(word: Option<&str>) -> Result<MachineId, CommandError> {
    let word = word.ok_or(CommandError::MissingArgument("machine"))?;
    let named = [
        ("merge", MachineId::MERGE),
        ("enter", MachineId::ENTER),
        ("exit", MachineId::EXIT),
    ]
    .into_iter()
    .find(|(name, _)| word.eq_ignore_ascii_case(name));
    match named {
        Some((_, id)) => Ok(id),
        None => Ok(MachineId::new(parse_num(Some(word), "machine")?)?),
    }
}
