// ─── Processor Arguments ───
// Tokenizer and substitution for installer processor argument templates.

use std::collections::BTreeMap;

use crate::core::error::{LauncherError, LauncherResult};
use crate::core::maven::LibrarySpecifier;
use crate::core::state::LauncherPaths;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgToken {
    Text(String),
    /// `{NAME}`, replaced by a pipeline variable.
    Variable(String),
    /// `'text'`, emitted without the quotes.
    Literal(String),
    /// A whole argument of the form `[group:artifact:version]`.
    Library(LibrarySpecifier),
}

/// Splits one argument template into tokens. A backslash escapes the next
/// character.
pub fn tokenize(arg: &str) -> LauncherResult<Vec<ArgToken>> {
    if let Some(coord) = arg.strip_prefix('[').and_then(|a| a.strip_suffix(']')) {
        return Ok(vec![ArgToken::Library(LibrarySpecifier::parse(coord)?)]);
    }

    let malformed = || LauncherError::InvalidProcessorArgument(arg.to_string());
    let mut tokens = Vec::new();
    let mut text = String::new();
    let mut chars = arg.chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' => text.push(chars.next().ok_or_else(malformed)?),
            '{' | '\'' => {
                let close = if c == '{' { '}' } else { '\'' };
                let mut inner = String::new();
                loop {
                    match chars.next() {
                        Some(next) if next == close => break,
                        Some(next) => inner.push(next),
                        None => return Err(malformed()),
                    }
                }
                if !text.is_empty() {
                    tokens.push(ArgToken::Text(std::mem::take(&mut text)));
                }
                tokens.push(if c == '{' {
                    ArgToken::Variable(inner)
                } else {
                    ArgToken::Literal(inner)
                });
            }
            _ => text.push(c),
        }
    }

    if !text.is_empty() {
        tokens.push(ArgToken::Text(text));
    }
    Ok(tokens)
}

/// Expands a template against the pipeline variables. Library tokens become
/// absolute paths under the libraries root.
pub fn substitute(
    arg: &str,
    vars: &BTreeMap<String, String>,
    paths: &LauncherPaths,
) -> LauncherResult<String> {
    let mut out = String::new();
    for token in tokenize(arg)? {
        match token {
            ArgToken::Text(text) | ArgToken::Literal(text) => out.push_str(&text),
            ArgToken::Variable(name) => {
                let value = vars
                    .get(&name)
                    .ok_or(LauncherError::UnknownProcessorVariable(name))?;
                out.push_str(value);
            }
            ArgToken::Library(spec) => {
                out.push_str(&paths.library_file(&spec.path()).to_string_lossy());
            }
        }
    }
    Ok(out)
}

/// How an install profile `data` value turns into a variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataValue {
    Library(LibrarySpecifier),
    Literal(String),
    /// A file inside the installer archive, extracted before use.
    Embedded(String),
    Plain(String),
}

pub fn classify_data(value: &str) -> LauncherResult<DataValue> {
    if let Some(coord) = value.strip_prefix('[').and_then(|v| v.strip_suffix(']')) {
        return LibrarySpecifier::parse(coord).map(DataValue::Library);
    }
    if let Some(lit) = value
        .strip_prefix('\'')
        .and_then(|v| v.strip_suffix('\''))
    {
        return Ok(DataValue::Literal(lit.to_string()));
    }
    if let Some(entry) = value.strip_prefix('/') {
        return Ok(DataValue::Embedded(entry.to_string()));
    }
    Ok(DataValue::Plain(value.to_string()))
}
