//! Structural paths into JSON records.
//!
//! Paths render in the normalized bracket form used by JSONPath tooling:
//!
//! ```text
//! $['relationships'][0]['relatedSubstance']
//! ```
//!
//! The parser also accepts the dotted shorthand (`relationships[0].relatedSubstance`).
//! Patterns share the same grammar plus `[*]`, which matches any array index.

use std::fmt;

use nom::{
    branch::alt,
    bytes::complete::{is_not, take_while1},
    character::complete::{anychar, char as pchar, digit1, multispace0},
    combinator::{all_consuming, map, map_res, opt, recognize},
    multi::{fold_many0, many0},
    sequence::{delimited, preceded},
    IResult,
};

use crate::error::{NetworkError, Result};

/// One step of a [`JsonPath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    Key(String),
    Index(usize),
}

impl Segment {
    pub fn as_key(&self) -> Option<&str> {
        match self {
            Segment::Key(k) => Some(k),
            Segment::Index(_) => None,
        }
    }
}

/// A concrete location inside a JSON document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct JsonPath {
    segments: Vec<Segment>,
}

impl JsonPath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn from_segments(segments: Vec<Segment>) -> Self {
        Self { segments }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn child_key(&self, key: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(Segment::Key(key.into()));
        Self { segments }
    }

    pub fn child_index(&self, index: usize) -> Self {
        let mut segments = self.segments.clone();
        segments.push(Segment::Index(index));
        Self { segments }
    }

    /// Outermost field name, if the path starts with one.
    pub fn first_key(&self) -> Option<&str> {
        self.segments.first().and_then(Segment::as_key)
    }

    /// Path of the object that owns the reference found at `self`.
    ///
    /// When the path ends in `[<index>]['<field>']` the owner is the indexed
    /// element (`relationships[2].relatedSubstance` -> `relationships[2]`);
    /// otherwise the referencing object is its own owner.
    pub fn parent_object(&self) -> JsonPath {
        match self.segments.as_slice() {
            [.., Segment::Index(_), Segment::Key(field)] if is_word(field) => JsonPath {
                segments: self.segments[..self.segments.len() - 1].to_vec(),
            },
            _ => self.clone(),
        }
    }

    pub fn parse(input: &str) -> Result<Self> {
        let mut segments = Vec::new();
        for step in parse_steps(input)? {
            match step {
                Step::Key(k) => segments.push(Segment::Key(k)),
                Step::Index(i) => segments.push(Segment::Index(i)),
                Step::AnyIndex => {
                    return Err(invalid(input, "wildcard index is only allowed in patterns"))
                }
            }
        }
        Ok(Self { segments })
    }
}

impl fmt::Display for JsonPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("$")?;
        for segment in &self.segments {
            match segment {
                Segment::Key(k) => write!(f, "['{}']", escape_key(k))?,
                Segment::Index(i) => write!(f, "[{i}]")?,
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum PatternSegment {
    Key(String),
    Index(usize),
    AnyIndex,
}

/// A literal path in which `[*]` stands for any array index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    source: String,
    segments: Vec<PatternSegment>,
}

impl PathPattern {
    pub fn parse(input: &str) -> Result<Self> {
        let segments = parse_steps(input)?
            .into_iter()
            .map(|step| match step {
                Step::Key(k) => PatternSegment::Key(k),
                Step::Index(i) => PatternSegment::Index(i),
                Step::AnyIndex => PatternSegment::AnyIndex,
            })
            .collect();
        Ok(Self {
            source: input.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Full match: every segment lines up and the lengths agree.
    pub fn matches(&self, path: &JsonPath) -> bool {
        let segments = path.segments();
        self.segments.len() == segments.len()
            && self
                .segments
                .iter()
                .zip(segments)
                .all(|(pattern, segment)| match (pattern, segment) {
                    (PatternSegment::Key(want), Segment::Key(got)) => want == got,
                    (PatternSegment::Index(want), Segment::Index(got)) => want == got,
                    (PatternSegment::AnyIndex, Segment::Index(_)) => true,
                    _ => false,
                })
    }
}

// ============================================================================
// Parser
// ============================================================================

enum Step {
    Key(String),
    Index(usize),
    AnyIndex,
}

fn invalid(input: &str, message: &str) -> NetworkError {
    NetworkError::InvalidPathPattern {
        pattern: input.to_string(),
        message: message.to_string(),
    }
}

fn is_word(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_alphanumeric() || c == '_')
}

fn escape_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for c in key.chars() {
        if c == '\'' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// `$`, then any mix of `.field`, `['quoted']`, `["quoted"]`, `[digits]` and
/// `[*]`. The leading `$` may be replaced by a bare field name.
fn parse_steps(input: &str) -> Result<Vec<Step>> {
    fn field_name(input: &str) -> IResult<&str, &str> {
        take_while1(|c: char| c != '.' && c != '[')(input)
    }

    fn head(input: &str) -> IResult<&str, Option<Step>> {
        alt((
            map(pchar('$'), |_| None),
            map(field_name, |k: &str| Some(Step::Key(k.to_string()))),
        ))(input)
    }

    fn dotted(input: &str) -> IResult<&str, Step> {
        map(preceded(pchar('.'), field_name), |k: &str| {
            Step::Key(k.to_string())
        })(input)
    }

    fn quoted<'a>(quote: char) -> impl FnMut(&'a str) -> IResult<&'a str, String> {
        let plain: &'static str = if quote == '"' { "\\\"" } else { "\\'" };
        move |input: &'a str| {
            delimited(
                pchar(quote),
                fold_many0(
                    alt((is_not(plain), preceded(pchar('\\'), recognize(anychar)))),
                    String::new,
                    |mut key, part: &str| {
                        key.push_str(part);
                        key
                    },
                ),
                pchar(quote),
            )(input)
        }
    }

    fn bracket(input: &str) -> IResult<&str, Step> {
        delimited(
            pchar('['),
            delimited(
                multispace0,
                alt((
                    map(alt((quoted('\''), quoted('"'))), Step::Key),
                    map(pchar('*'), |_| Step::AnyIndex),
                    map_res(digit1, |d: &str| d.parse::<usize>().map(Step::Index)),
                )),
                multispace0,
            ),
            pchar(']'),
        )(input)
    }

    fn path(input: &str) -> IResult<&str, Vec<Step>> {
        let (input, first) = opt(head)(input)?;
        let (input, rest) = many0(alt((dotted, bracket)))(input)?;
        Ok((input, first.flatten().into_iter().chain(rest).collect()))
    }

    all_consuming(path)(input.trim())
        .map(|(_, steps)| steps)
        .map_err(|err| match err {
            nom::Err::Error(e) | nom::Err::Failure(e) if e.input.is_empty() => {
                invalid(input, "unexpected end of path")
            }
            nom::Err::Error(e) | nom::Err::Failure(e) => {
                invalid(input, &format!("unexpected input at `{}`", e.input))
            }
            nom::Err::Incomplete(_) => invalid(input, "unexpected end of path"),
        })
}
