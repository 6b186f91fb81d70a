//! The line-oriented command language read by `play`.

use world_rules::{ActionKind, ObjectId, Position, ZoneId};

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Let time pass.
    Wait(f32),
    Move(Position),
    Use(ObjectId, ActionKind),
    Die(String),
    Zone(ZoneId),
    Status,
    Reset,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScriptError {
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    #[error("{command}: missing {what}")]
    Missing { command: &'static str, what: &'static str },

    #[error("{command}: invalid {what}: {value}")]
    Invalid {
        command: &'static str,
        what: &'static str,
        value: String,
    },
}

/// Parse one line. Blank lines and `#` comments yield `None`.
pub fn parse_line(line: &str) -> Result<Option<Command>, ScriptError> {
    let line = line.split('#').next().unwrap_or("").trim();
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Ok(None);
    };

    let command = match head {
        "wait" => Command::Wait(parse_secs("wait", words.next())?),
        "move" => {
            let x = parse_coord("move", "x", words.next())?;
            let y = parse_coord("move", "y", words.next())?;
            Command::Move(Position::new(x, y))
        }
        "use" => {
            let object = words.next().ok_or(ScriptError::Missing {
                command: "use",
                what: "object",
            })?;
            let action = words.next().ok_or(ScriptError::Missing {
                command: "use",
                what: "action",
            })?;
            let action = ActionKind::parse(action).ok_or_else(|| ScriptError::Invalid {
                command: "use",
                what: "action",
                value: action.to_owned(),
            })?;
            Command::Use(ObjectId::from(object), action)
        }
        "die" => {
            let cause = words.collect::<Vec<_>>().join(" ");
            Command::Die(if cause.is_empty() { "unknown".to_owned() } else { cause })
        }
        "zone" => {
            let zone = words.next().ok_or(ScriptError::Missing {
                command: "zone",
                what: "zone id",
            })?;
            Command::Zone(ZoneId::from(zone))
        }
        "status" => Command::Status,
        "reset" => Command::Reset,
        "quit" | "exit" => Command::Quit,
        other => return Err(ScriptError::UnknownCommand(other.to_owned())),
    };

    Ok(Some(command))
}

fn parse_secs(command: &'static str, value: Option<&str>) -> Result<f32, ScriptError> {
    let raw = value.ok_or(ScriptError::Missing {
        command,
        what: "seconds",
    })?;
    raw.parse::<f32>()
        .ok()
        .filter(|secs| secs.is_finite() && *secs >= 0.0)
        .ok_or_else(|| ScriptError::Invalid {
            command,
            what: "seconds",
            value: raw.to_owned(),
        })
}

fn parse_coord(command: &'static str, what: &'static str, value: Option<&str>) -> Result<f32, ScriptError> {
    let raw = value.ok_or(ScriptError::Missing { command, what })?;
    raw.parse::<f32>()
        .ok()
        .filter(|coord| coord.is_finite())
        .ok_or_else(|| ScriptError::Invalid {
            command,
            what,
            value: raw.to_owned(),
        })
}
