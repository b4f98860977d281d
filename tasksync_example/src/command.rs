use chrono::FixedOffset;
use tasksync::{TaskDraft, ValidationError};
use thiserror::Error;

#[derive(Debug, PartialEq, Eq)]
pub enum Command {
    Add(TaskDraft),
    Online,
    Offline,
    Sync,
    List,
    Quit,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("usage: {0}")]
    Usage(&'static str),
    #[error("unknown command '{0}' (try add, online, offline, sync, list)")]
    Unknown(String),
    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

const ADD_USAGE: &str = "add <title> @ <YYYY-MM-DDTHH:MM> [done]";

/// Parse one input line. Validation of new tasks happens here, before the
/// library ever sees them.
pub fn parse(line: &str, offset: FixedOffset) -> Result<Command, ParseError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(Command::Quit);
    }

    let (word, rest) = line.split_once(' ').unwrap_or((line, ""));
    match word {
        "add" => {
            let (title, when) = rest.rsplit_once('@').ok_or(ParseError::Usage(ADD_USAGE))?;
            let mut when = when.split_whitespace();
            let datetime = when.next().ok_or(ParseError::Usage(ADD_USAGE))?;
            let completed = match when.next() {
                None => false,
                Some("done") => true,
                Some(_) => return Err(ParseError::Usage(ADD_USAGE)),
            };
            Ok(Command::Add(TaskDraft::parse_local(title, datetime, offset, completed)?))
        }
        "online" => Ok(Command::Online),
        "offline" => Ok(Command::Offline),
        "sync" => Ok(Command::Sync),
        "list" => Ok(Command::List),
        "quit" | "exit" => Ok(Command::Quit),
        other => Err(ParseError::Unknown(other.to_string())),
    }
}
