//! # Source Text Splicing
//!
//! Every textual rewrite the generator performs on code fragments lives here:
//! newline splicing into format strings, address-of rewriting, callback
//! assembly, indentation and literal arithmetic. Handlers never edit
//! generated text by hand.

use regex::Regex;
use std::sync::OnceLock;

fn word_start() -> Option<&'static Regex> {
    static WORD_START: OnceLock<Option<Regex>> = OnceLock::new();
    WORD_START.get_or_init(|| Regex::new(r"\b(\w)").ok()).as_ref()
}

/// Splice `\n` in front of the closing quote of a format string.
///
/// Only applies when the content literally ends in `"`; anything else
/// (a variable, a call) is returned unchanged.
pub fn append_newline(content: &str) -> String {
    match content.strip_suffix('"') {
        Some(head) => format!("{}\\n\"", head),
        None => content.to_string(),
    }
}

/// Prefix every word in a comma separated list with `&`, turning
/// `a,b` into `&a,&b` for scanf style calls.
pub fn address_of_words(extra: &str) -> String {
    match word_start() {
        Some(re) => re.replace_all(extra, "&${1}").into_owned(),
        None => extra.to_string(),
    }
}

/// Indent every non-empty line of `code` by `prefix`.
pub fn prefix_lines(code: &str, prefix: &str) -> String {
    let mut out = String::with_capacity(code.len());
    for line in code.split_inclusive('\n') {
        if !line.trim().is_empty() {
            out.push_str(prefix);
        }
        out.push_str(line);
    }
    out
}

/// Assemble a free function definition. `body` is already indented and
/// newline terminated; an empty body still yields complete braces.
pub fn callback_function(return_type: &str, name: &str, params: &[&str], body: &str) -> String {
    format!("{} {}({}) {{\n{}}}", return_type, name, params.join(", "), body)
}

/// Quote `text` as a C string literal.
pub fn c_string_literal(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

/// The numeric value of `code` when it is a plain number literal.
pub fn numeric_literal(code: &str) -> Option<f64> {
    let code = code.trim();
    let starts_numeric = code
        .chars()
        .next()
        .map(|c| c.is_ascii_digit() || c == '-' || c == '.')
        .unwrap_or(false);
    if !starts_numeric {
        return None;
    }
    code.parse::<f64>().ok().filter(|n| n.is_finite())
}

pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// `code / divisor`, folded when `code` is a literal.
///
/// `code` must already be wrapped for a multiplicative slot.
pub fn divide_literal(code: &str, divisor: f64) -> String {
    match numeric_literal(code) {
        Some(n) => format_number(n / divisor),
        None => format!("{} / {:.1}", code, divisor),
    }
}

/// `code * factor`, folded when `code` is a literal.
pub fn multiply_literal(code: &str, factor: f64) -> String {
    match numeric_literal(code) {
        Some(n) => format_number(n * factor),
        None => format!("{} * {}", code, format_number(factor)),
    }
}

/// Encode an editor id as identifier characters, to follow a name prefix.
///
/// ASCII letters and digits pass through; any other character becomes
/// `_<hex code point>_`, so distinct ids never share an encoding.
pub fn identifier_suffix(id: &str) -> String {
    let mut out = String::with_capacity(id.len());
    for c in id.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c);
        } else {
            out.push_str(&format!("_{:x}_", c as u32));
        }
    }
    out
}
