//! Parser for `--script` input scripts.
//!
//! A script is a `;`-separated list of events replayed as if typed and
//! clicked by a user:
//!
//! ```text
//! key <char|name|code>        key press: `key n`, `key right`, `key 65361`
//! click <x> <y>               left press + release
//! mclick <x> <y>              middle press + release
//! drag <x0> <y0> <x1> <y1>    left press, move, release
//! wait                        end of this tick's input
//! ```
//!
//! Events between two `wait`s are delivered within the same tick.

use vistune_pipeline::{InputEvent, KeyCode, MouseEvent, MouseFlags, MouseKind};

/// Errors from parsing a script.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ScriptError {
    /// The command word is not recognized.
    #[error("event {index}: unknown command `{command}`")]
    UnknownCommand {
        /// Zero-based event position.
        index: usize,
        /// Offending command word.
        command: String,
    },
    /// The command has the wrong number of arguments.
    #[error("event {index}: `{command}` takes {expected} argument(s), got {actual}")]
    Arity {
        /// Zero-based event position.
        index: usize,
        /// Command word.
        command: String,
        /// Required argument count.
        expected: usize,
        /// Given argument count.
        actual: usize,
    },
    /// A coordinate is not an integer.
    #[error("event {index}: invalid coordinate `{value}`")]
    Coordinate {
        /// Zero-based event position.
        index: usize,
        /// Offending text.
        value: String,
    },
    /// A key is neither a single character, a known name, nor a number.
    #[error("event {index}: invalid key `{value}`")]
    Key {
        /// Zero-based event position.
        index: usize,
        /// Offending text.
        value: String,
    },
}

/// Named keys accepted by `key`.
const KEY_NAMES: &[(&str, KeyCode)] = &[
    ("left", KeyCode::LEFT),
    ("right", KeyCode::RIGHT),
    ("up", KeyCode::UP),
    ("down", KeyCode::DOWN),
    ("space", KeyCode::SPACE),
    ("tab", KeyCode::TAB),
    ("esc", KeyCode::ESCAPE),
];

/// Parse a script into per-tick event batches.
///
/// The batch after the last `wait` is kept even when empty only if the
/// script ends with `wait`.
///
/// # Errors
///
/// Returns a [`ScriptError`] naming the first malformed event.
pub fn parse(script: &str) -> Result<Vec<Vec<InputEvent>>, ScriptError> {
    let mut ticks = Vec::new();
    let mut batch = Vec::new();

    for (index, item) in script.split(';').enumerate() {
        let words: Vec<&str> = item.split_whitespace().collect();
        let Some((&command, args)) = words.split_first() else {
            continue;
        };
        let arity = |expected: usize| {
            if args.len() == expected {
                Ok(())
            } else {
                Err(ScriptError::Arity {
                    index,
                    command: command.to_string(),
                    expected,
                    actual: args.len(),
                })
            }
        };
        match command {
            "wait" => {
                arity(0)?;
                ticks.push(std::mem::take(&mut batch));
            }
            "key" => {
                arity(1)?;
                batch.push(InputEvent::Key(parse_key(index, args[0])?));
            }
            "click" | "mclick" => {
                arity(2)?;
                let (x, y) = (coord(index, args[0])?, coord(index, args[1])?);
                let (down, up, flags) = if command == "click" {
                    (MouseKind::LeftDown, MouseKind::LeftUp, MouseFlags::LEFT)
                } else {
                    (MouseKind::MiddleDown, MouseKind::MiddleUp, MouseFlags::MIDDLE)
                };
                batch.push(InputEvent::Mouse(MouseEvent::new(down, x, y, flags)));
                batch.push(InputEvent::Mouse(MouseEvent::new(up, x, y, MouseFlags::NONE)));
            }
            "drag" => {
                arity(4)?;
                let x0 = coord(index, args[0])?;
                let y0 = coord(index, args[1])?;
                let x1 = coord(index, args[2])?;
                let y1 = coord(index, args[3])?;
                batch.extend([
                    MouseEvent::new(MouseKind::LeftDown, x0, y0, MouseFlags::LEFT),
                    MouseEvent::new(MouseKind::Move, x1, y1, MouseFlags::LEFT),
                    MouseEvent::new(MouseKind::LeftUp, x1, y1, MouseFlags::NONE),
                ]
                .map(InputEvent::Mouse));
            }
            other => {
                return Err(ScriptError::UnknownCommand {
                    index,
                    command: other.to_string(),
                });
            }
        }
    }

    if !batch.is_empty() {
        ticks.push(batch);
    }
    Ok(ticks)
}

fn coord(index: usize, value: &str) -> Result<i32, ScriptError> {
    value.parse().map_err(|_| ScriptError::Coordinate {
        index,
        value: value.to_string(),
    })
}

fn parse_key(index: usize, value: &str) -> Result<KeyCode, ScriptError> {
    let lower = value.to_ascii_lowercase();
    if let Some(&(_, code)) = KEY_NAMES.iter().find(|(name, _)| *name == lower) {
        return Ok(code);
    }
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(KeyCode::from_char(c)),
        _ => value.parse().map(KeyCode).map_err(|_| ScriptError::Key {
            index,
            value: value.to_string(),
        }),
    }
}
