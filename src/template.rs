use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::iter::Peekable;
use std::str::Chars;

/// Expand `{name}` placeholders from `variables`.
///
/// A `{` that does not open a well-formed identifier followed by `}` is kept
/// literally. A well-formed placeholder with no value is an error.
pub fn expand_placeholders(input: &str, variables: &HashMap<&str, String>) -> Result<String> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' => {
                let name = consume_identifier(&mut chars);
                if name.is_empty() {
                    output.push('{');
                } else if chars.peek() == Some(&'}') {
                    chars.next();
                    let value = variables
                        .get(name.as_str())
                        .ok_or_else(|| anyhow!("Placeholder '{{{}}}' has no value", name))?;
                    output.push_str(value);
                } else {
                    // Unterminated, keep as written
                    output.push('{');
                    output.push_str(&name);
                }
            }
            _ => output.push(c),
        }
    }

    Ok(output)
}

fn consume_identifier(chars: &mut Peekable<Chars>) -> String {
    let mut name = String::new();
    if let Some(&c) = chars.peek() {
        if !c.is_alphabetic() && c != '_' {
            return name;
        }
    }

    while let Some(&c) = chars.peek() {
        if c.is_alphanumeric() || c == '_' {
            name.push(c);
            chars.next();
        } else {
            break;
        }
    }
    name
}
