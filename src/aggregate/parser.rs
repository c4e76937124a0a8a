use std::fmt;

use regex::{Captures, Match, Regex};
use serde::Serialize;

/// Method token, request path up to the closing quote, status, one opaque
/// field, then response size, request size and a third size-like field.
const LOG_ENTRY_PATTERN: &str = r#"(GET|PUT|HEAD|POST) /[^"]*" \d+ \S+ (\d+|-) (\d+|-) (?:\d+|-)"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogMethod {
    Get,
    Put,
    Post,
    Head,
}

impl LogMethod {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            LogMethod::Get => "GET",
            LogMethod::Put => "PUT",
            LogMethod::Post => "POST",
            LogMethod::Head => "HEAD",
        }
    }

    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "GET" => Some(LogMethod::Get),
            "PUT" => Some(LogMethod::Put),
            "POST" => Some(LogMethod::Post),
            "HEAD" => Some(LogMethod::Head),
            _ => None,
        }
    }
}

impl fmt::Display for LogMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One `(method, request size, response size)` record taken from a log line.
/// A `-` or otherwise non-numeric size is `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Observation {
    pub method: LogMethod,
    pub request_size: Option<u64>,
    pub response_size: Option<u64>,
}

impl Observation {
    #[must_use]
    pub const fn new(
        method: LogMethod,
        request_size: Option<u64>,
        response_size: Option<u64>,
    ) -> Self {
        Self {
            method,
            request_size,
            response_size,
        }
    }
}

/// Compiled access-log pattern. Cloning shares the compiled program.
#[derive(Debug, Clone)]
pub struct LogLineParser {
    pattern: Regex,
}

impl LogLineParser {
    /// Compiles the access-log pattern.
    ///
    /// # Errors
    ///
    /// Returns an error when the pattern fails to compile.
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(LOG_ENTRY_PATTERN)?,
        })
    }

    /// Yields every record embedded in `line`; lines that do not match yield
    /// nothing.
    pub fn parse(&self, line: &str) -> impl Iterator<Item = Observation> {
        self.pattern
            .captures_iter(line)
            .filter_map(|captures| observation_from(&captures))
    }
}

fn observation_from(captures: &Captures<'_>) -> Option<Observation> {
    let method = LogMethod::from_token(captures.get(1)?.as_str())?;
    Some(Observation {
        method,
        response_size: size_field(captures.get(2)),
        request_size: size_field(captures.get(3)),
    })
}

fn size_field(field: Option<Match<'_>>) -> Option<u64> {
    field.and_then(|value| value.as_str().parse::<u64>().ok())
}
