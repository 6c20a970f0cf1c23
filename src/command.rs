use regex::Regex;
use std::str::FromStr;
use std::sync::LazyLock;

use crate::adjust::{BumpAction, BumpStep};
use crate::error::LooperError;
use crate::range::Bound;

static BUMP_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(hold\s+)?(s|start|e|end)\s*(\+\+|\+|--|-)$").expect("bump pattern is valid")
});

static ENTRY_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^set\s+(s|start|e|end)(?:\s+(.+))?$").expect("entry pattern is valid"));

/// Every user action a session understands
#[derive(Debug, Clone, PartialEq)]
pub enum SessionCommand {
    Play,
    Stop,
    CycleSpeed,
    /// One discrete bump, as from a click
    Bump(BumpAction),
    /// Begin repeating a bump while the control is held
    PressStart(BumpAction),
    /// Control released
    PressEnd,
    /// Press aborted, e.g. the pointer left the control
    PressCancel,
    /// Typed replacement for a bound; `None` when the prompt was dismissed
    DirectEntry { bound: Bound, input: Option<String> },
}

impl FromStr for SessionCommand {
    type Err = LooperError;

    /// Parse the textual command form used by the CLI.
    ///
    /// `play`, `stop`, `speed`, `s+`, `end--`, `hold s++`, `release`,
    /// `cancel`, `set start 12,5`, `set end` (dismissed prompt).
    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim().to_lowercase();

        match line.as_str() {
            "play" | "p" => return Ok(Self::Play),
            "stop" | "x" => return Ok(Self::Stop),
            "speed" | "rate" => return Ok(Self::CycleSpeed),
            "release" | "up" => return Ok(Self::PressEnd),
            "cancel" | "leave" => return Ok(Self::PressCancel),
            _ => {}
        }

        if let Some(caps) = BUMP_PATTERN.captures(&line) {
            let action = BumpAction::new(parse_bound(&caps[2]), parse_step(&caps[3]));
            return Ok(if caps.get(1).is_some() {
                Self::PressStart(action)
            } else {
                Self::Bump(action)
            });
        }

        if let Some(caps) = ENTRY_PATTERN.captures(&line) {
            return Ok(Self::DirectEntry {
                bound: parse_bound(&caps[1]),
                input: caps.get(2).map(|m| m.as_str().to_string()),
            });
        }

        Err(LooperError::InvalidCommand(line))
    }
}

fn parse_bound(token: &str) -> Bound {
    if token.starts_with('s') {
        Bound::Start
    } else {
        Bound::End
    }
}

fn parse_step(token: &str) -> BumpStep {
    match token {
        "--" => BumpStep::DecreaseLarge,
        "-" => BumpStep::DecreaseSmall,
        "+" => BumpStep::IncreaseSmall,
        _ => BumpStep::IncreaseLarge,
    }
}
