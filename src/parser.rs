//! Recursive-descent parser for legacy transform expressions.
//!
//! An expression is one of: a column reference qualified by the input-table
//! alias (`in0.price`), a function call (`string_lpad(in0.code, 10)`), or a
//! bare literal token. Calls nest arbitrarily and string literals may
//! contain commas and parentheses, so argument boundaries are found with an
//! explicit character scan rather than by splitting on commas.

/// A node of the argument tree. Strict tree, built fresh per expression and
/// discarded after translation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expression {
    /// Numeric or quoted-string token (or any other bare token); emitted
    /// verbatim.
    Literal(String),
    /// Field reference with the input-table prefix already stripped.
    Column(String),
    FunctionCall {
        name: String,
        args: Vec<Expression>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Returned when the input is empty (or just whitespace)
    NoExpression,
    UnterminatedStringLiteral(usize),
    UnbalancedParens(usize),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoExpression => write!(f, "empty expression"),
            Self::UnterminatedStringLiteral(start) => {
                write!(f, "unterminated string literal starting at {start}")
            }
            Self::UnbalancedParens(at) => write!(f, "unbalanced parenthesis at {at}"),
        }
    }
}

impl std::error::Error for Error {}

/// Parses one right-hand-side expression into an argument tree.
///
/// Structural balance is validated up front: past an unbalanced quote or
/// parenthesis there is no correct way to pick argument boundaries, so the
/// whole expression is rejected instead of guessed at.
pub fn parse(input: &str, input_alias: &str) -> Result<Expression, Error> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(Error::NoExpression);
    }
    top_level_commas(trimmed)?;
    parse_term(trimmed, input_alias)
}

fn parse_term(input: &str, input_alias: &str) -> Result<Expression, Error> {
    let trimmed = input.trim();

    // Base case: a column qualified by the input table. The prefix is a
    // namespace marker only; output uses the bare field name, and already
    // bare text comes back unchanged.
    if let Some(rest) = strip_alias(trimmed, input_alias) {
        return Ok(Expression::Column(rest.to_string()));
    }

    // A call spanning the whole expression: name(args)
    if let Some((name, inner)) = match_call(trimmed)? {
        return Ok(Expression::FunctionCall {
            name: name.to_string(),
            args: parse_args(inner, input_alias)?,
        });
    }

    // Legacy prefix application: `(fn(args))suffix` applies fn with the
    // suffix as one extra trailing argument.
    if let Some((call, suffix)) = match_prefix_application(trimmed)?
        && let Expression::FunctionCall { name, mut args } = parse_term(call, input_alias)?
    {
        args.push(parse_term(suffix, input_alias)?);
        return Ok(Expression::FunctionCall { name, args });
    }

    // Anything else is a literal and passes through untouched.
    Ok(Expression::Literal(trimmed.to_string()))
}

fn parse_args(inner: &str, input_alias: &str) -> Result<Vec<Expression>, Error> {
    if inner.trim().is_empty() {
        return Ok(Vec::new());
    }
    let mut args = Vec::new();
    let mut start = 0;
    for comma in top_level_commas(inner)? {
        args.push(parse_term(&inner[start..comma], input_alias)?);
        start = comma + 1;
    }
    args.push(parse_term(&inner[start..], input_alias)?);
    Ok(args)
}

fn strip_alias<'a>(input: &'a str, alias: &str) -> Option<&'a str> {
    input
        .strip_prefix(alias)
        .and_then(|rest| rest.strip_prefix('.'))
        .filter(|rest| !rest.is_empty())
}

/// Matches `name( ... )` where the matching close paren is the final
/// character, returning the name and the text between the parens.
fn match_call(input: &str) -> Result<Option<(&str, &str)>, Error> {
    let bytes = input.as_bytes();
    let mut i = 0;
    while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
        i += 1;
    }
    // Identifiers start with a letter or underscore
    if i == 0 || bytes[0].is_ascii_digit() {
        return Ok(None);
    }
    let mut open = i;
    while open < bytes.len() && bytes[open].is_ascii_whitespace() {
        open += 1;
    }
    if open >= bytes.len() || bytes[open] != b'(' {
        return Ok(None);
    }
    let close = matching_paren(input, open)?;
    if close != input.len() - 1 {
        return Ok(None);
    }
    Ok(Some((&input[..i], &input[open + 1..close])))
}

/// Matches `( ... )suffix` with a non-empty suffix, returning the text
/// between the parens and the suffix.
fn match_prefix_application(input: &str) -> Result<Option<(&str, &str)>, Error> {
    if !input.starts_with('(') {
        return Ok(None);
    }
    let close = matching_paren(input, 0)?;
    let suffix = input[close + 1..].trim();
    if suffix.is_empty() {
        return Ok(None);
    }
    Ok(Some((&input[1..close], suffix)))
}

/// The quote half of the scanning state: parenthesis depth is only tracked
/// while outside a string literal, and only the quote character that opened
/// a literal can close it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QuoteState {
    Normal,
    Single,
    Double,
}

/// Byte offsets of the commas that sit at parenthesis depth zero outside
/// any string literal. The scan must end back in the normal state at depth
/// zero, so this doubles as the balance check for a whole expression.
fn top_level_commas(input: &str) -> Result<Vec<usize>, Error> {
    let mut commas = Vec::new();
    let mut state = QuoteState::Normal;
    let mut escaped = false;
    let mut quote_start = 0;
    let mut opens: Vec<usize> = Vec::new();

    // Scanning bytes is safe here: every structural character is ASCII and
    // never matches a UTF-8 continuation byte.
    for (i, b) in input.bytes().enumerate() {
        if escaped {
            escaped = false;
            continue;
        }
        match state {
            QuoteState::Normal => match b {
                b'\'' => {
                    state = QuoteState::Single;
                    quote_start = i;
                }
                b'"' => {
                    state = QuoteState::Double;
                    quote_start = i;
                }
                b'(' => opens.push(i),
                b')' => {
                    if opens.pop().is_none() {
                        return Err(Error::UnbalancedParens(i));
                    }
                }
                b',' if opens.is_empty() => commas.push(i),
                _ => {}
            },
            QuoteState::Single => match b {
                b'\\' => escaped = true,
                b'\'' => state = QuoteState::Normal,
                _ => {}
            },
            QuoteState::Double => match b {
                b'\\' => escaped = true,
                b'"' => state = QuoteState::Normal,
                _ => {}
            },
        }
    }

    if state != QuoteState::Normal {
        return Err(Error::UnterminatedStringLiteral(quote_start));
    }
    if let Some(open) = opens.pop() {
        return Err(Error::UnbalancedParens(open));
    }
    Ok(commas)
}

/// Index of the `)` matching the `(` at [open], skipping quoted text.
fn matching_paren(input: &str, open: usize) -> Result<usize, Error> {
    let mut state = QuoteState::Normal;
    let mut escaped = false;
    let mut depth = 0usize;

    for (i, b) in input.bytes().enumerate().skip(open) {
        if escaped {
            escaped = false;
            continue;
        }
        match state {
            QuoteState::Normal => match b {
                b'\'' => state = QuoteState::Single,
                b'"' => state = QuoteState::Double,
                b'(' => depth += 1,
                b')' => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(i);
                    }
                }
                _ => {}
            },
            QuoteState::Single => match b {
                b'\\' => escaped = true,
                b'\'' => state = QuoteState::Normal,
                _ => {}
            },
            QuoteState::Double => match b {
                b'\\' => escaped = true,
                b'"' => state = QuoteState::Normal,
                _ => {}
            },
        }
    }
    Err(Error::UnbalancedParens(open))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_in0(input: &str) -> Expression {
        parse(input, "in0").expect("a valid parse")
    }

    #[test]
    fn column_reference_is_stripped_once() {
        assert_eq!(parse_in0("in0.col_a"), Expression::Column("col_a".into()));
        // Already-bare tokens are left alone
        assert_eq!(parse_in0("col_a"), Expression::Literal("col_a".into()));
    }

    #[test]
    fn literals_pass_through() {
        assert_eq!(parse_in0("'+'"), Expression::Literal("'+'".into()));
        assert_eq!(parse_in0(" 42 "), Expression::Literal("42".into()));
    }

    #[test]
    fn quoted_comma_is_not_an_argument_boundary() {
        let Expression::FunctionCall { name, args } = parse_in0("string_concat(in0.a, 'x,y')")
        else {
            panic!("expected a call");
        };
        assert_eq!(name, "string_concat");
        assert_eq!(
            args,
            vec![
                Expression::Column("a".into()),
                Expression::Literal("'x,y'".into()),
            ]
        );
    }

    #[test]
    fn quoted_paren_is_not_structure() {
        let Expression::FunctionCall { args, .. } = parse_in0("string_concat(in0.a, '(')") else {
            panic!("expected a call");
        };
        assert_eq!(args.len(), 2);
        assert_eq!(args[1], Expression::Literal("'('".into()));
    }

    #[test]
    fn escaped_quote_stays_inside_the_literal() {
        let Expression::FunctionCall { args, .. } =
            parse_in0(r"string_concat(in0.a, 'it\'s, fine')")
        else {
            panic!("expected a call");
        };
        assert_eq!(args.len(), 2);
        assert_eq!(args[1], Expression::Literal(r"'it\'s, fine'".into()));
    }

    #[test]
    fn nested_calls() {
        let Expression::FunctionCall { name, args } = parse_in0("string_upper(string_lower(in0.a))")
        else {
            panic!("expected a call");
        };
        assert_eq!(name, "string_upper");
        assert_eq!(args.len(), 1);
        let Expression::FunctionCall { name, args } = &args[0] else {
            panic!("expected a nested call");
        };
        assert_eq!(name, "string_lower");
        assert_eq!(args[0], Expression::Column("a".into()));
    }

    #[test]
    fn nested_call_commas_stay_nested() {
        let Expression::FunctionCall { args, .. } =
            parse_in0("string_lpad(string_replace(in0.a, 'x', 'y'), 5)")
        else {
            panic!("expected a call");
        };
        assert_eq!(args.len(), 2);
        assert_eq!(args[1], Expression::Literal("5".into()));
    }

    #[test]
    fn zero_argument_call() {
        assert_eq!(
            parse_in0("today()"),
            Expression::FunctionCall {
                name: "today".into(),
                args: vec![],
            }
        );
    }

    #[test]
    fn prefix_application() {
        let Expression::FunctionCall { name, args } = parse_in0("(datetime('YYYY-MM-DD'))in0.col_b")
        else {
            panic!("expected a call");
        };
        assert_eq!(name, "datetime");
        assert_eq!(
            args,
            vec![
                Expression::Literal("'YYYY-MM-DD'".into()),
                Expression::Column("col_b".into()),
            ]
        );
    }

    #[test]
    fn unbalanced_input_is_rejected() {
        assert!(matches!(
            parse("string_upper(in0.a", "in0"),
            Err(Error::UnbalancedParens(_))
        ));
        assert!(matches!(
            parse("string_upper(in0.a))", "in0"),
            Err(Error::UnbalancedParens(_))
        ));
        assert!(matches!(
            parse("'abc", "in0"),
            Err(Error::UnterminatedStringLiteral(0))
        ));
        assert_eq!(parse("   ", "in0"), Err(Error::NoExpression));
    }
}
