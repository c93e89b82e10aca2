//! Positional `<a1> <d> <n>` handling shared by the benchmark binaries.
//!
//! Anything starting with `--` is passed through untouched so each binary can
//! interpret its own flags.

use std::path::Path;

use thiserror::Error;

use crate::Scalar;

/// Validated generator inputs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SequenceArgs {
    pub a1: Scalar,
    pub d: Scalar,
    pub n: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArgsError {
    #[error("Usage: {program} <a1> <d> <n>")]
    Usage { program: String },
    #[error("invalid value for '{name}': {value:?} is not a finite number")]
    InvalidFloat { name: &'static str, value: String },
    #[error("invalid value for 'n': {value:?} is not an unsigned 32-bit integer")]
    InvalidCount { value: String },
    #[error("'n' must be greater than 0")]
    ZeroCount,
}

/// Result of splitting the raw command line.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedArgs {
    pub program: String,
    pub sequence: SequenceArgs,
    pub flags: Vec<String>,
}

/// Parses a full argv (program name first) into positional inputs and flags.
///
/// Exactly three positionals are required and `n` must be non-zero.
pub fn parse_args<I>(args: I) -> Result<ParsedArgs, ArgsError>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    let program = args
        .next()
        .map(|argv0| program_name(&argv0))
        .unwrap_or_else(|| "asg".to_string());

    let (flags, positionals): (Vec<String>, Vec<String>) =
        args.partition(|arg| arg.starts_with("--"));

    let [a1, d, n] = positionals.as_slice() else {
        return Err(ArgsError::Usage { program });
    };

    let sequence = SequenceArgs {
        a1: parse_scalar("a1", a1)?,
        d: parse_scalar("d", d)?,
        n: parse_count(n)?,
    };

    Ok(ParsedArgs {
        program,
        sequence,
        flags,
    })
}

fn program_name(argv0: &str) -> String {
    Path::new(argv0)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| argv0.to_string())
}

fn parse_scalar(name: &'static str, value: &str) -> Result<Scalar, ArgsError> {
    match value.trim().parse::<Scalar>() {
        Ok(parsed) if parsed.is_finite() => Ok(parsed),
        _ => Err(ArgsError::InvalidFloat {
            name,
            value: value.to_string(),
        }),
    }
}

fn parse_count(value: &str) -> Result<u32, ArgsError> {
    let n: u32 = value
        .trim()
        .parse()
        .map_err(|_| ArgsError::InvalidCount {
            value: value.to_string(),
        })?;
    if n == 0 {
        return Err(ArgsError::ZeroCount);
    }
    Ok(n)
}
