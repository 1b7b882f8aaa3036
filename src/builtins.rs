//! Natives every runtime starts with: `print`, `system` and `sleep`.
//!
//! Each resolves its params the same way: a variable reference is looked up
//! in the environment, a literal is used as written. Values of a kind a
//! native does not handle are ignored without a diagnostic.

use std::{
    io::{self, Write},
    process::Command,
    thread,
    time::Duration,
};

use tracing::{debug, warn};

use crate::{
    diagnostics::{KilateError, Result},
    registry::Registry,
    value::{CallData, CallParam, Value},
};

pub fn install(registry: &mut Registry) {
    registry.register("print", vec!["any".into()], print);
    registry.register("system", vec!["string".into()], system);
    registry.register("sleep", vec!["long".into()], sleep);
}

enum Resolved<'a> {
    Value(Value),
    Literal(&'a str),
}

fn resolve<'a>(param: &'a CallParam, data: &CallData<'_>) -> Result<Resolved<'a>> {
    match param {
        CallParam::Variable(name) => data.env.resolve(name).map(Resolved::Value),
        CallParam::Literal(text) => Ok(Resolved::Literal(text)),
    }
}

pub fn print(data: CallData<'_>) -> Result<Option<Value>> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_params(&mut out, &data)?;
    out.flush()?;
    Ok(None)
}

/// Writes every param back to back, with no separator or trailing newline.
pub(crate) fn write_params(out: &mut impl Write, data: &CallData<'_>) -> Result<()> {
    for param in &data.params {
        match resolve(param, data)? {
            Resolved::Literal(text) => out.write_all(text.as_bytes())?,
            Resolved::Value(value) => match value {
                Value::Int(n) => write!(out, "{n}")?,
                Value::Float(n) => write!(out, "{n:.6}")?,
                Value::Long(n) => write!(out, "{n}")?,
                Value::String(s) => out.write_all(s.as_bytes())?,
                Value::Bool(b) => write!(out, "{b}")?,
                Value::Function(_) | Value::Var(_) => {}
            },
        }
    }
    Ok(())
}

pub fn system(data: CallData<'_>) -> Result<Option<Value>> {
    for param in &data.params {
        match resolve(param, &data)? {
            Resolved::Literal(command) => run_shell(command),
            Resolved::Value(Value::String(command)) => run_shell(&command),
            Resolved::Value(_) => {}
        }
    }
    Ok(None)
}

fn run_shell(command: &str) {
    #[cfg(windows)]
    let status = Command::new("cmd").args(["/C", command]).status();
    #[cfg(not(windows))]
    let status = Command::new("sh").args(["-c", command]).status();

    match status {
        Ok(status) => debug!(command, %status, "shell command finished"),
        Err(err) => warn!(command, %err, "failed to spawn shell command"),
    }
}

/// Suspends the calling thread. Durations are in milliseconds.
///
/// A variable reference that does not hold an int sleeps for its own name
/// read as a number before the literal path runs. The literal path always
/// runs and reads the raw payload as a number, so a variable reference
/// never sleeps for the variable's value.
pub fn sleep(data: CallData<'_>) -> Result<Option<Value>> {
    let param = data
        .params
        .first()
        .ok_or_else(|| KilateError::runtime("`sleep` expects a duration argument"))?;
    if let CallParam::Variable(name) = param {
        let value = data.env.resolve(name)?;
        if !matches!(value, Value::Int(_)) {
            sleep_millis(leading_int(param.payload()));
        }
    }
    sleep_millis(leading_int(param.payload()));
    Ok(None)
}

fn sleep_millis(millis: i64) {
    let millis = u64::try_from(millis).unwrap_or(0);
    if millis > 0 {
        thread::sleep(Duration::from_millis(millis));
    }
}

/// Reads an optionally signed decimal prefix, ignoring leading whitespace.
/// Text with no digits reads as zero; overflow saturates.
pub(crate) fn leading_int(text: &str) -> i64 {
    let text = text.trim_start();
    let (negative, digits) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };
    let magnitude = digits
        .bytes()
        .take_while(u8::is_ascii_digit)
        .fold(0i64, |acc, digit| {
            acc.saturating_mul(10).saturating_add(i64::from(digit - b'0'))
        });
    if negative { -magnitude } else { magnitude }
}
