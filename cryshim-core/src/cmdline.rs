//! The process command line, kept both as the single string forwarded to the
//! host and as tokens for the launcher's own options.
//!
//! Options use the engine convention: `-name` switches and `-name value`
//! pairs, matched case-insensitively.

use std::env;
use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CmdLine {
    line: String,
    args: Vec<String>,
    app_name_end: usize,
}

fn needs_quotes(arg: &str) -> bool {
    arg.is_empty() || arg.chars().any(|c| c.is_whitespace() || c == '"')
}

fn push_quoted(line: &mut String, arg: &str) {
    if !needs_quotes(arg) {
        line.push_str(arg);
        return;
    }
    line.push('"');
    for c in arg.chars() {
        if c == '"' {
            line.push('\\');
        }
        line.push(c);
    }
    line.push('"');
}

/// Splits on whitespace; double quotes group and `\"` escapes a quote.
fn tokenize(line: &str) -> Vec<(String, usize)> {
    let mut tokens = Vec::new();
    let mut current: Option<(String, usize)> = None;
    let mut in_quotes = false;
    let mut chars = line.char_indices().peekable();

    while let Some((pos, c)) = chars.next() {
        match c {
            '\\' if matches!(chars.peek(), Some((_, '"'))) => {
                chars.next();
                current.get_or_insert_with(|| (String::new(), pos)).0.push('"');
            }
            '"' => {
                in_quotes = !in_quotes;
                current.get_or_insert_with(|| (String::new(), pos));
            }
            c if c.is_whitespace() && !in_quotes => {
                if let Some((token, start)) = current.take() {
                    tokens.push((token, start));
                }
            }
            c => current.get_or_insert_with(|| (String::new(), pos)).0.push(c),
        }
    }
    tokens.extend(current);
    tokens
}

impl CmdLine {
    /// Rebuilds the command line of the current process.
    pub fn from_env() -> Self {
        Self::from_args(env::args())
    }

    /// Joins program name and arguments, quoting where needed.
    pub fn from_args<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut line = String::new();
        let mut tokens = Vec::new();
        let mut app_name_end = 0;
        for (i, arg) in args.into_iter().enumerate() {
            let arg = arg.as_ref();
            if i > 0 {
                line.push(' ');
            }
            push_quoted(&mut line, arg);
            if i == 0 {
                app_name_end = line.len();
            }
            tokens.push(arg.to_owned());
        }
        Self { line, args: tokens, app_name_end }
    }

    /// Parses a raw command line whose first token is the program.
    pub fn parse(line: &str) -> Self {
        let tokens = tokenize(line);
        let app_name_end = match tokens.get(1) {
            Some((_, start)) => line[..*start].trim_end().len(),
            None => line.trim_end().len(),
        };
        Self {
            line: line.to_owned(),
            args: tokens.into_iter().map(|(token, _)| token).collect(),
            app_name_end,
        }
    }

    /// The full line, program included, as the host receives it.
    pub fn as_str(&self) -> &str {
        &self.line
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn app_name(&self) -> Option<&str> {
        self.args.first().map(String::as_str)
    }

    pub fn without_app_name(&self) -> &str {
        self.line[self.app_name_end..].trim_start()
    }

    fn position(&self, name: &str) -> Option<usize> {
        let name = name.trim_start_matches('-');
        self.args
            .iter()
            .skip(1)
            .position(|arg| arg.strip_prefix('-').is_some_and(|a| a.eq_ignore_ascii_case(name)))
            .map(|i| i + 1)
    }

    /// `-name` is present.
    pub fn has_arg(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// The token following `-name`, unless it is another option.
    pub fn arg_value(&self, name: &str) -> Option<&str> {
        let value = self.args.get(self.position(name)? + 1)?;
        (!value.starts_with('-')).then_some(value.as_str())
    }

    pub fn arg_value_int(&self, name: &str) -> Option<i32> {
        self.arg_value(name)?.trim().parse().ok()
    }
}

impl fmt::Display for CmdLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.line)
    }
}
