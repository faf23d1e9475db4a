//! Line tokenizer using winnow.
//!
//! A project line is a sequence of whitespace separated tokens. A token that
//! starts with `"`, `'` or `` ` `` runs to the next occurrence of the same
//! quote character, so names may contain spaces.

use winnow::ascii::space0;
use winnow::combinator::{alt, delimited, opt, repeat};
use winnow::prelude::*;
use winnow::token::{one_of, take_till, take_while};

type PResult<T> = winnow::ModalResult<T>;

/// One token of a project line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    /// Token text without surrounding quotes
    pub text: &'a str,
    /// Quote character the token was written with, if any
    pub quote: Option<char>,
}

impl<'a> Token<'a> {
    fn bare(text: &'a str) -> Self {
        Token { text, quote: None }
    }

    pub fn is_quoted(&self) -> bool {
        self.quote.is_some()
    }

    pub fn as_f64(&self) -> Option<f64> {
        self.text.parse().ok()
    }

    pub fn as_i64(&self) -> Option<i64> {
        self.text
            .parse()
            .ok()
            .or_else(|| self.as_f64().map(|v| v as i64))
    }

    /// Render the token back, re-quoting when it was quoted.
    pub fn render(&self) -> String {
        match self.quote {
            Some(q) => format!("{q}{}{q}", self.text),
            None => self.text.to_string(),
        }
    }
}

fn quoted<'a>(input: &mut &'a str) -> PResult<Token<'a>> {
    let q = one_of(['"', '\'', '`']).parse_next(input)?;
    let text = take_till(0.., move |c: char| c == q).parse_next(input)?;
    // An unclosed quote runs to end of line
    opt(q).parse_next(input)?;
    Ok(Token {
        text,
        quote: Some(q),
    })
}

fn bare<'a>(input: &mut &'a str) -> PResult<Token<'a>> {
    take_while(1.., |c: char| !c.is_whitespace())
        .map(Token::bare)
        .parse_next(input)
}

fn token<'a>(input: &mut &'a str) -> PResult<Token<'a>> {
    alt((quoted, bare)).parse_next(input)
}

fn tokens<'a>(input: &mut &'a str) -> PResult<Vec<Token<'a>>> {
    repeat(0.., delimited(space0, token, space0)).parse_next(input)
}

/// Split a line into tokens.
pub fn tokenize(line: &str) -> Vec<Token<'_>> {
    let mut input = line.trim();
    tokens(&mut input).unwrap_or_default()
}

/// The field name of a line (its first token), if any.
pub fn field_name(line: &str) -> Option<&str> {
    line.split_whitespace().next()
}

/// Join tokens back into a line with single spaces.
pub fn join(tokens: &[Token<'_>]) -> String {
    tokens
        .iter()
        .map(Token::render)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Quote a string value, picking a quote character it does not contain.
pub fn quote(value: &str) -> String {
    let q = ['"', '\'', '`']
        .into_iter()
        .find(|q| !value.contains(*q))
        .unwrap_or('"');
    format!("{q}{value}{q}")
}

/// Rewrite the numeric token at `index` of `line` through `f`.
///
/// Returns `None` when the line has no such token or it is not a number.
pub fn rewrite_number(line: &str, index: usize, f: impl FnOnce(f64) -> f64) -> Option<String> {
    let toks = tokenize(line);
    let value = toks.get(index)?.as_f64()?;
    let replaced = format_number(f(value));
    let mut rendered: Vec<String> = toks.iter().map(Token::render).collect();
    rendered[index] = replaced;
    Some(rendered.join(" "))
}

/// Format a number the way project files carry them: up to 14 decimals,
/// trailing zeros removed.
pub fn format_number(value: f64) -> String {
    if !value.is_finite() {
        return "0".to_string();
    }
    let s = format!("{value:.14}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    match s {
        "-0" | "" => "0".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_bare_and_quoted() {
        let toks = tokenize(r#"MARKER 2 4.5 "Verse 1" 1 0"#);
        let texts: Vec<_> = toks.iter().map(|t| t.text).collect();
        assert_eq!(texts, vec!["MARKER", "2", "4.5", "Verse 1", "1", "0"]);
        assert_eq!(toks[3].quote, Some('"'));
        assert!(!toks[2].is_quoted());
    }

    #[test]
    fn test_tokenize_empty_quoted_name() {
        let toks = tokenize(r#"MARKER 2 12 "" 1"#);
        assert_eq!(toks.len(), 5);
        assert_eq!(toks[3].text, "");
        assert!(toks[3].is_quoted());
    }

    #[test]
    fn test_tokenize_alternate_quotes() {
        let toks = tokenize("NAME 'He said \"hi\"'");
        assert_eq!(toks[1].text, "He said \"hi\"");
        let toks = tokenize("NAME `it's`");
        assert_eq!(toks[1].text, "it's");
    }

    #[test]
    fn test_tokenize_unclosed_quote_runs_to_end() {
        let toks = tokenize("NAME \"Kick In");
        assert_eq!(toks.len(), 2);
        assert_eq!(toks[1].text, "Kick In");
    }

    #[test]
    fn test_tokenize_blank() {
        assert!(tokenize("   ").is_empty());
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(2.0), "2");
        assert_eq!(format_number(2.5), "2.5");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(20.123), "20.123");
        assert_eq!(format_number(1.0 / 3.0), "0.33333333333333");
    }

    #[test]
    fn test_quote_picks_free_character() {
        assert_eq!(quote("Kick In"), "\"Kick In\"");
        assert_eq!(quote("say \"hi\""), "'say \"hi\"'");
        assert_eq!(quote(""), "\"\"");
    }

    #[test]
    fn test_rewrite_number() {
        let line = rewrite_number("POSITION 2.5", 1, |v| v + 20.0).unwrap();
        assert_eq!(line, "POSITION 22.5");

        let line = rewrite_number("PT 1 0.5 0 0 1", 1, |v| v + 4.0).unwrap();
        assert_eq!(line, "PT 5 0.5 0 0 1");

        assert!(rewrite_number("POSITION abc", 1, |v| v).is_none());
        assert!(rewrite_number("POSITION", 1, |v| v).is_none());
    }
}
