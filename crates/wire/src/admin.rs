// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The administrative control channel (§6): seven line-oriented commands
//! dispatched by name over a socket. One line in, one [`AdminResponse`]
//! line out.

use thiserror::Error;

/// A parsed administrative request, positionally validated but not yet
/// checked against the registry - that's `cachemgr-manager`'s dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminRequest {
    Load { name: String, path: String, state: String },
    Inline { name: String, source: String, state: String },
    Use { name: String },
    State { name: String, requested: String },
    Discard { name: String },
    List,
    Label { label: String, target: String },
}

/// Default `state` when a `load`/`inline` command omits it (§6).
pub const DEFAULT_STATE: &str = "auto";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Unknown request.")]
    UnknownCommand,
    #[error("Too few parameters")]
    TooFewArgs,
    #[error("Too many parameters")]
    TooManyArgs,
}

/// Parse one line of admin input into a request.
///
/// Tokenizes shell-style (double-quoted tokens may contain whitespace, no
/// escape processing beyond the closing quote) since `vcl.inline`'s source
/// argument and any name containing spaces need quoting.
pub fn parse_line(line: &str) -> Result<AdminRequest, ParseError> {
    let tokens = tokenize(line);
    let mut it = tokens.iter();
    let command = it.next().ok_or(ParseError::UnknownCommand)?.as_str();
    let rest: Vec<&str> = it.map(String::as_str).collect();

    match command {
        "vcl.load" => match rest.as_slice() {
            [name, path] => Ok(AdminRequest::Load {
                name: (*name).to_string(),
                path: (*path).to_string(),
                state: DEFAULT_STATE.to_string(),
            }),
            [name, path, state] => Ok(AdminRequest::Load {
                name: (*name).to_string(),
                path: (*path).to_string(),
                state: (*state).to_string(),
            }),
            [] | [_] => Err(ParseError::TooFewArgs),
            _ => Err(ParseError::TooManyArgs),
        },
        "vcl.inline" => match rest.as_slice() {
            [name, source] => Ok(AdminRequest::Inline {
                name: (*name).to_string(),
                source: (*source).to_string(),
                state: DEFAULT_STATE.to_string(),
            }),
            [name, source, state] => Ok(AdminRequest::Inline {
                name: (*name).to_string(),
                source: (*source).to_string(),
                state: (*state).to_string(),
            }),
            [] | [_] => Err(ParseError::TooFewArgs),
            _ => Err(ParseError::TooManyArgs),
        },
        "vcl.use" => match rest.as_slice() {
            [name] => Ok(AdminRequest::Use { name: (*name).to_string() }),
            [] => Err(ParseError::TooFewArgs),
            _ => Err(ParseError::TooManyArgs),
        },
        "vcl.state" => match rest.as_slice() {
            [name, requested] => {
                Ok(AdminRequest::State { name: (*name).to_string(), requested: (*requested).to_string() })
            }
            [] | [_] => Err(ParseError::TooFewArgs),
            _ => Err(ParseError::TooManyArgs),
        },
        "vcl.discard" => match rest.as_slice() {
            [name] => Ok(AdminRequest::Discard { name: (*name).to_string() }),
            [] => Err(ParseError::TooFewArgs),
            _ => Err(ParseError::TooManyArgs),
        },
        "vcl.list" => {
            if rest.is_empty() {
                Ok(AdminRequest::List)
            } else {
                Err(ParseError::TooManyArgs)
            }
        }
        "vcl.label" => match rest.as_slice() {
            [label, target] => {
                Ok(AdminRequest::Label { label: (*label).to_string(), target: (*target).to_string() })
            }
            [] | [_] => Err(ParseError::TooFewArgs),
            _ => Err(ParseError::TooManyArgs),
        },
        _ => Err(ParseError::UnknownCommand),
    }
}

fn tokenize(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut has_token = false;

    for ch in line.trim().chars() {
        match ch {
            '"' => {
                in_quotes = !in_quotes;
                has_token = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if has_token {
                    tokens.push(std::mem::take(&mut current));
                    has_token = false;
                }
            }
            c => {
                current.push(c);
                has_token = true;
            }
        }
    }
    if has_token {
        tokens.push(current);
    }
    tokens
}

/// A response line: `<status> <body>`, with a single-line body (embedded
/// newlines are escaped as `\n` so the wire stays line-oriented).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminResponse {
    pub status: u32,
    pub body: String,
}

impl AdminResponse {
    pub fn new(status: u32, body: impl Into<String>) -> Self {
        Self { status, body: body.into() }
    }

    pub fn ok(body: impl Into<String>) -> Self {
        Self::new(200, body)
    }

    /// Render as the line written back to the admin client.
    pub fn format_line(&self) -> String {
        format!("{} {}", self.status, self.body.replace('\n', "\\n"))
    }
}

#[cfg(test)]
#[path = "admin_tests.rs"]
mod tests;
