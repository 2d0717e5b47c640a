//! Filter controls: turn user actions into filter snapshots.
//!
//! The interactive CLI reads one command per line:
//!
//! | Command              | Effect                                   |
//! |----------------------|------------------------------------------|
//! | `segment <value>`    | select a segment (likewise `service`, `contract`) |
//! | `apply`              | refresh with the current selection       |
//! | `reset`              | restore first-option defaults and refresh |
//! | `show`               | redraw the last dashboard                |
//! | `filters`            | list legal values                        |
//! | `help`               | list commands                            |
//! | `quit` / `exit`      | leave                                    |
//!
//! Selections are staged: nothing is fetched until `apply` or `reset`.

use crate::filters::{Dimension, FilterError, FilterOptions, FilterSnapshot, FilterState};

/// A parsed control command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlCommand {
    Select { dimension: Dimension, value: String },
    Apply,
    Reset,
    Show,
    Filters,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseCommandError {
    #[error("empty command")]
    Empty,

    #[error("missing value for {0}")]
    MissingValue(Dimension),

    #[error("unknown command '{0}' (type `help` for a list)")]
    Unknown(String),
}

impl ControlCommand {
    /// Parse one input line. Everything after the dimension name is the value,
    /// so `segment New Customers` selects `"New Customers"`.
    pub fn parse(line: &str) -> Result<Self, ParseCommandError> {
        let line = line.trim();
        let (head, rest) = match line.split_once(char::is_whitespace) {
            Some((head, rest)) => (head, rest.trim()),
            None => (line, ""),
        };

        match head.to_ascii_lowercase().as_str() {
            "" => Err(ParseCommandError::Empty),
            "apply" => Ok(Self::Apply),
            "reset" => Ok(Self::Reset),
            "show" => Ok(Self::Show),
            "filters" => Ok(Self::Filters),
            "help" | "?" => Ok(Self::Help),
            "quit" | "exit" | "q" => Ok(Self::Quit),
            other => match other.parse::<Dimension>() {
                Ok(dimension) if rest.is_empty() => {
                    Err(ParseCommandError::MissingValue(dimension))
                }
                Ok(dimension) => Ok(Self::Select {
                    dimension,
                    value: rest.to_string(),
                }),
                Err(_) => Err(ParseCommandError::Unknown(head.to_string())),
            },
        }
    }
}

/// What the caller should do after a command was handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlOutcome {
    /// Run exactly one refresh with this snapshot.
    Refresh(FilterSnapshot),
    /// A selection was staged.
    Selected { dimension: Dimension, value: String },
    Redisplay,
    ListFilters,
    Help,
    Quit,
}

/// Owns the filter state and reacts to control commands.
#[derive(Debug, Clone)]
pub struct FilterControls {
    state: FilterState,
}

impl FilterControls {
    pub fn new(options: FilterOptions) -> Self {
        Self {
            state: FilterState::new(options),
        }
    }

    pub fn state(&self) -> &FilterState {
        &self.state
    }

    /// Snapshot for the first refresh after startup: first option everywhere.
    pub fn initial_load(&mut self) -> ControlOutcome {
        self.state.reset();
        ControlOutcome::Refresh(self.state.current())
    }

    /// Apply a command to the filter state.
    pub fn handle(&mut self, command: ControlCommand) -> Result<ControlOutcome, FilterError> {
        Ok(match command {
            ControlCommand::Select { dimension, value } => {
                self.state.select(dimension, &value)?;
                ControlOutcome::Selected { dimension, value }
            }
            ControlCommand::Apply => ControlOutcome::Refresh(self.state.current()),
            ControlCommand::Reset => {
                self.state.reset();
                ControlOutcome::Refresh(self.state.current())
            }
            ControlCommand::Show => ControlOutcome::Redisplay,
            ControlCommand::Filters => ControlOutcome::ListFilters,
            ControlCommand::Help => ControlOutcome::Help,
            ControlCommand::Quit => ControlOutcome::Quit,
        })
    }
}

/// Help text for the interactive prompt.
pub const HELP: &str = "\
Commands:
  segment <value>    stage a segment selection
  service <value>    stage a service selection
  contract <value>   stage a contract selection
  apply              refresh the dashboard with the staged selection
  reset              restore defaults and refresh
  show               print the dashboard again
  filters            list the available filter values
  help               show this help
  quit               exit";

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
