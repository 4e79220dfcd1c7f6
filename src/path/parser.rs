use tracing::trace;

use super::{ArcTo, PathCommand, RawCommand, arity};
use crate::error::{Error, Result};
use crate::kernel::{Point2, Vector2};

const COMMAND_LETTERS: &str = "MmLlHhVvAaZz";

fn unsupported(position: usize, token: impl Into<String>) -> Error {
    Error::UnsupportedPathCommand {
        position,
        token: token.into(),
    }
}

/// The separator-delimited token starting at `position`
fn token_at(text: &str, position: usize) -> &str {
    text[position..]
        .split(|c: char| c.is_whitespace() || c == ',')
        .next()
        .unwrap_or_default()
}

/// End offset of the number starting at `start`, if one starts there
///
/// A sign or a second decimal point ends the current number, so `1-2.5.5`
/// reads as `1`, `-2.5`, `.5`.
fn scan_number(bytes: &[u8], start: usize) -> Option<usize> {
    let mut i = start;
    if i < bytes.len() && (bytes[i] == b'+' || bytes[i] == b'-') {
        i += 1;
    }
    let int_start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    let mut digits = i - int_start;
    if i < bytes.len() && bytes[i] == b'.' {
        i += 1;
        let frac_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        digits += i - frac_start;
    }
    if digits == 0 {
        return None;
    }
    if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
        let mut j = i + 1;
        if j < bytes.len() && (bytes[j] == b'+' || bytes[j] == b'-') {
            j += 1;
        }
        let exp_start = j;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
        }
        if j == exp_start {
            return None;
        }
        i = j;
    }
    Some(i)
}

/// Whether the next argument of `command` is an arc flag
fn expects_flag(command: &RawCommand) -> bool {
    command.letter.eq_ignore_ascii_case(&'a') && matches!(command.args.len() % 7, 3 | 4)
}

fn check_arguments(command: &RawCommand) -> Result<()> {
    let n = command.arity();
    if n > 0 && (command.args.is_empty() || command.args.len() % n != 0) {
        return Err(unsupported(command.position, command.letter.to_string()));
    }
    Ok(())
}

/// Split path text into commands with their raw arguments
///
/// Arguments are separated by whitespace and/or commas, or not at all where
/// a sign, decimal point or command letter starts the next token. Arc flags
/// are single `0`/`1` characters and may be packed together.
///
/// Unknown letters, malformed numbers, numbers before the first command and
/// argument counts that are not a whole number of repetitions all fail with
/// [`Error::UnsupportedPathCommand`].
pub fn tokenize(text: &str) -> Result<Vec<RawCommand>> {
    let bytes = text.as_bytes();
    let mut commands: Vec<RawCommand> = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        let c = bytes[pos];
        if c.is_ascii_whitespace() || c == b',' {
            pos += 1;
            continue;
        }

        if c.is_ascii_alphabetic() {
            let letter = c as char;
            if !COMMAND_LETTERS.contains(letter) {
                return Err(unsupported(pos, letter.to_string()));
            }
            if let Some(previous) = commands.last() {
                check_arguments(previous)?;
            }
            commands.push(RawCommand {
                letter,
                args: Vec::new(),
                position: pos,
            });
            pos += 1;
            continue;
        }

        let Some(current) = commands.last_mut() else {
            return Err(unsupported(pos, token_at(text, pos)));
        };
        if arity(current.letter) == 0 {
            return Err(unsupported(pos, token_at(text, pos)));
        }

        if expects_flag(current) {
            let flag = match c {
                b'0' => 0.0,
                b'1' => 1.0,
                _ => return Err(unsupported(pos, token_at(text, pos))),
            };
            current.args.push(flag);
            pos += 1;
            continue;
        }

        let end = scan_number(bytes, pos).ok_or_else(|| unsupported(pos, token_at(text, pos)))?;
        let token = &text[pos..end];
        let value: f64 = token.parse().map_err(|_| unsupported(pos, token))?;
        if !value.is_finite() {
            return Err(unsupported(pos, token));
        }
        current.args.push(value);
        pos = end;
    }

    if let Some(last) = commands.last() {
        check_arguments(last)?;
    }
    Ok(commands)
}

/// Parse path text into canonical absolute commands
///
/// Relative coordinates are resolved against the current point, `H`/`V`
/// become [`PathCommand::LineTo`], and extra coordinate pairs after a moveto
/// become line commands. The first command must be a moveto.
pub fn parse_path(text: &str) -> Result<Vec<PathCommand>> {
    let raw = tokenize(text)?;
    if let Some(first) = raw.first()
        && !first.letter.eq_ignore_ascii_case(&'m')
    {
        return Err(unsupported(first.position, first.letter.to_string()));
    }

    let mut commands = Vec::new();
    let mut pen = Point2::origin();
    let mut subpath_start = Point2::origin();

    for command in &raw {
        let relative = command.is_relative();
        let base = |pen: Point2| if relative { pen.coords } else { Vector2::zeros() };
        let before = commands.len();

        match command.letter.to_ascii_uppercase() {
            'M' => {
                for (i, pair) in command.args.chunks_exact(2).enumerate() {
                    let p = Point2::new(pair[0], pair[1]) + base(pen);
                    if i == 0 {
                        commands.push(PathCommand::MoveTo(p));
                        subpath_start = p;
                    } else {
                        commands.push(PathCommand::LineTo(p));
                    }
                    pen = p;
                }
            }
            'L' => {
                for pair in command.args.chunks_exact(2) {
                    let p = Point2::new(pair[0], pair[1]) + base(pen);
                    commands.push(PathCommand::LineTo(p));
                    pen = p;
                }
            }
            'H' => {
                for &x in &command.args {
                    let p = Point2::new(x + base(pen).x, pen.y);
                    commands.push(PathCommand::LineTo(p));
                    pen = p;
                }
            }
            'V' => {
                for &y in &command.args {
                    let p = Point2::new(pen.x, y + base(pen).y);
                    commands.push(PathCommand::LineTo(p));
                    pen = p;
                }
            }
            'A' => {
                for a in command.args.chunks_exact(7) {
                    let end = Point2::new(a[5], a[6]) + base(pen);
                    commands.push(PathCommand::ArcTo(ArcTo {
                        rx: a[0],
                        ry: a[1],
                        rotation: a[2],
                        large_arc: a[3] != 0.0,
                        sweep: a[4] != 0.0,
                        end,
                    }));
                    pen = end;
                }
            }
            _ => {
                commands.push(PathCommand::ClosePath);
                pen = subpath_start;
            }
        }

        if commands[before..].iter().any(|c| !c.is_finite()) {
            return Err(unsupported(command.position, command.letter.to_string()));
        }

        trace!(
            "path command '{}' at {} -> {} canonical command(s)",
            command.letter,
            command.position,
            commands.len() - before
        );
    }

    Ok(commands)
}
