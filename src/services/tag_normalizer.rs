//! Genre field normalization
//!
//! Catalog exports store genres as a Python-style literal such as
//! `[{'id': 28, 'name': 'Action'}, {'id': 12, 'name': 'Adventure'}]`.
//! The JSON spelling of the same structure is accepted as well.

use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{char, multispace0},
    combinator::{all_consuming, map, opt, value},
    error::ErrorKind,
    multi::separated_list0,
    number::complete::double,
    sequence::{delimited, preceded, separated_pair, terminated, tuple},
    IResult,
};
use std::str::CharIndices;

/// Reasons a genre field could not be turned into a tag list
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenreParseError {
    #[error("malformed genre literal: {0}")]
    Syntax(String),

    #[error("genre field is not a list")]
    NotAList,

    #[error("genre entry {0} cannot be searched for a name")]
    Unsearchable(usize),

    #[error("genre entry {0} has a name but is not a mapping")]
    NotAMapping(usize),

    #[error("genre entry {0} has a non-string name")]
    NonStringName(usize),
}

/// Parses a raw genre field into its tag names, in source order.
///
/// Entries without a `name` key are skipped, as are names that are blank
/// after trimming. When a mapping repeats the `name` key the last one wins.
///
/// A string or list entry is skipped unless it contains `name`, in which
/// case it cannot be indexed and the whole field fails. Numbers, booleans
/// and null cannot be searched at all and also fail the field.
pub fn parse_genres(raw: &str) -> Result<Vec<String>, GenreParseError> {
    let (_, parsed) = all_consuming(terminated(literal, ws))(raw).map_err(|e| {
        GenreParseError::Syntax(match e {
            nom::Err::Error(e) | nom::Err::Failure(e) => {
                format!("{:?} at offset {}", e.code, raw.len() - e.input.len())
            }
            nom::Err::Incomplete(_) => "incomplete input".to_string(),
        })
    })?;

    let Literal::List(entries) = parsed else {
        return Err(GenreParseError::NotAList);
    };

    let mut names = Vec::with_capacity(entries.len());
    for (position, entry) in entries.into_iter().enumerate() {
        let pairs = match entry {
            Literal::Map(pairs) => pairs,
            Literal::Str(text) if text.contains("name") => {
                return Err(GenreParseError::NotAMapping(position))
            }
            Literal::List(items) if items.iter().any(is_name_key) => {
                return Err(GenreParseError::NotAMapping(position))
            }
            Literal::Str(_) | Literal::List(_) => continue,
            Literal::Number(_) | Literal::Bool(_) | Literal::Null => {
                return Err(GenreParseError::Unsearchable(position))
            }
        };

        let name = pairs
            .into_iter()
            .rev()
            .find(|(key, _)| is_name_key(key));

        match name {
            Some((_, Literal::Str(name))) => {
                let name = name.trim();
                if !name.is_empty() {
                    names.push(name.to_string());
                }
            }
            Some(_) => return Err(GenreParseError::NonStringName(position)),
            None => {}
        }
    }

    Ok(names)
}

fn is_name_key(literal: &Literal) -> bool {
    matches!(literal, Literal::Str(key) if key == "name")
}

/// Tag names for a raw genre field. Missing or malformed input yields no tags.
pub fn normalize_tags(raw: Option<&str>) -> Vec<String> {
    match raw.map(parse_genres) {
        Some(Ok(names)) => names,
        Some(Err(err)) => {
            tracing::trace!(error = %err, "Unparseable genre field treated as untagged");
            Vec::new()
        }
        None => Vec::new(),
    }
}

/// Space-joined tag names for a raw genre field, or `""` when there are none
pub fn normalize_genres(raw: Option<&str>) -> String {
    normalize_tags(raw).join(" ")
}

// ============================================================================
// Literal grammar
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
enum Literal {
    Str(String),
    Number(f64),
    Bool(bool),
    Null,
    List(Vec<Literal>),
    Map(Vec<(Literal, Literal)>),
}

fn ws(input: &str) -> IResult<&str, ()> {
    value((), multispace0)(input)
}

fn literal(input: &str) -> IResult<&str, Literal> {
    preceded(
        ws,
        alt((
            map(list, Literal::List),
            map(mapping, Literal::Map),
            map(string, Literal::Str),
            keyword,
            map(double, Literal::Number),
        )),
    )(input)
}

fn keyword(input: &str) -> IResult<&str, Literal> {
    alt((
        value(Literal::Bool(true), alt((tag("True"), tag("true")))),
        value(Literal::Bool(false), alt((tag("False"), tag("false")))),
        value(Literal::Null, alt((tag("None"), tag("null")))),
    ))(input)
}

/// `[a, b, ...]`, trailing comma allowed
fn list(input: &str) -> IResult<&str, Vec<Literal>> {
    delimited(
        char('['),
        separated_list0(preceded(ws, char(',')), literal),
        tuple((opt(preceded(ws, char(','))), ws, char(']'))),
    )(input)
}

/// `{k: v, ...}`, trailing comma allowed
fn mapping(input: &str) -> IResult<&str, Vec<(Literal, Literal)>> {
    delimited(
        char('{'),
        separated_list0(
            preceded(ws, char(',')),
            separated_pair(literal, preceded(ws, char(':')), literal),
        ),
        tuple((opt(preceded(ws, char(','))), ws, char('}'))),
    )(input)
}

fn string(input: &str) -> IResult<&str, String> {
    alt((single_quoted, double_quoted))(input)
}

fn single_quoted(input: &str) -> IResult<&str, String> {
    quoted(input, '\'')
}

fn double_quoted(input: &str) -> IResult<&str, String> {
    quoted(input, '"')
}

/// A string delimited by `quote` with backslash escapes
fn quoted(input: &str, quote: char) -> IResult<&str, String> {
    let (rest, _) = char(quote)(input)?;
    let fail = || nom::Err::Error(nom::error::Error::new(input, ErrorKind::Escaped));

    let mut out = String::new();
    let mut chars = rest.char_indices();
    while let Some((offset, c)) = chars.next() {
        if c == quote {
            return Ok((&rest[offset + c.len_utf8()..], out));
        }
        if c != '\\' {
            out.push(c);
            continue;
        }

        let Some((_, escaped)) = chars.next() else {
            break;
        };
        match escaped {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            '\\' | '\'' | '"' | '/' => out.push(escaped),
            'x' => out.push(hex_escape(&mut chars, 2).ok_or_else(fail)?),
            'u' => out.push(hex_escape(&mut chars, 4).ok_or_else(fail)?),
            other => {
                out.push('\\');
                out.push(other);
            }
        }
    }

    Err(fail())
}

fn hex_escape(chars: &mut CharIndices<'_>, digits: usize) -> Option<char> {
    let code: String = chars.by_ref().take(digits).map(|(_, c)| c).collect();
    if code.chars().count() != digits {
        return None;
    }
    u32::from_str_radix(&code, 16).ok().and_then(char::from_u32)
}
