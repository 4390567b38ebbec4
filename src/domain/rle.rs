//! Run-length encoded (RLE) pattern decoding.
//!
//! ```text
//! #N Glider
//! #O Richard K. Guy
//! #C The smallest, most common spaceship.
//! x = 3, y = 3, rule = B3/S23
//! bob$2bo$3o!
//! ```
//!
//! Header lines (`#N`, `#O`, `#C`/`#c`, `#P`, `#R`, `#r`) are honoured in any
//! order until the first data line. The size line is mandatory and must come
//! before any data. Decoding is all-or-nothing: any error discards the
//! partially built grid.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use std::str::FromStr;

use log::info;
use thiserror::Error;

use super::bit_grid::BitGrid;
use super::growable_grid::GrowableGrid;
use super::rules::LifeRule;

#[derive(Debug, Error)]
pub enum PatternError {
    #[error("could not read pattern: {0}")]
    Io(#[from] io::Error),
    #[error("line {line}: pattern data before the size line")]
    DataBeforeSize { line: usize },
    #[error("pattern has no size line")]
    MissingSize,
    #[error("line {line}: second size line")]
    DuplicateSize { line: usize },
    #[error("pattern dimensions cannot be negative (got {width}x{height})")]
    NegativeDimension { width: i64, height: i64 },
    #[error("pattern of {width}x{height} cells is too large to load")]
    TooLarge { width: usize, height: usize },
    #[error("line {line}: number out of range")]
    InvalidNumber { line: usize },
    #[error("corner ({x}, {y}) is out of bounds for a {convention:?} pattern of {width}x{height}")]
    CornerOutOfBounds {
        x: i64,
        y: i64,
        convention: CornerConvention,
        width: usize,
        height: usize,
    },
    #[error("invalid rule string {0:?}")]
    InvalidRule(String),
    #[error("line {line}: run length {run:?} is too large")]
    InvalidRunLength { line: usize, run: String },
    #[error("not a valid RLE pattern")]
    Unrecognized,
}

/// How a pattern's corner coordinates are to be read.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CornerConvention {
    /// `#P x y`: top-left corner, both coordinates within `0..=size`.
    TopLeft,
    /// `#R x y`: relative to the centre, `|x| <= width / 2`, `|y| <= height / 2`.
    Centered,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Corner {
    pub x: i64,
    pub y: i64,
    pub convention: CornerConvention,
}

impl Corner {
    fn check(&self, width: usize, height: usize) -> Result<(), PatternError> {
        let (w, h) = (width as i64, height as i64);
        let fits = match self.convention {
            CornerConvention::TopLeft => {
                (0..=w).contains(&self.x) && (0..=h).contains(&self.y)
            }
            CornerConvention::Centered => self.x.abs() <= w / 2 && self.y.abs() <= h / 2,
        };
        if fits {
            Ok(())
        } else {
            Err(PatternError::CornerOutOfBounds {
                x: self.x,
                y: self.y,
                convention: self.convention,
                width,
                height,
            })
        }
    }
}

/// A decoded pattern: metadata plus its cells.
#[derive(Clone, Debug)]
pub struct Pattern {
    pub name: String,
    pub author: String,
    pub comment: String,
    width: usize,
    height: usize,
    corner: Option<Corner>,
    rule: Option<String>,
    cells: GrowableGrid,
}

impl Pattern {
    /// Declared width.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Declared height.
    pub fn height(&self) -> usize {
        self.height
    }

    pub fn corner(&self) -> Option<Corner> {
        self.corner
    }

    /// Rule string carried by the pattern, if any.
    pub fn rule(&self) -> Option<&str> {
        self.rule.as_deref()
    }

    pub fn life_rule(&self) -> Option<LifeRule> {
        self.rule.as_deref().and_then(|s| LifeRule::parse(s).ok())
    }

    pub fn cells(&self) -> &GrowableGrid {
        &self.cells
    }

    pub fn cell_state(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height && self.cells.cell_state(x as i64, y as i64)
    }

    /// Live cells in row-major order.
    pub fn live_cells(&self) -> Vec<(usize, usize)> {
        (0..self.height)
            .flat_map(|y| (0..self.width).map(move |x| (x, y)))
            .filter(|&(x, y)| self.cell_state(x, y))
            .collect()
    }

    pub fn population(&self) -> usize {
        self.live_cells().len()
    }
}

impl FromStr for Pattern {
    type Err = PatternError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode_str(s)
    }
}

/// Decode a whole RLE document.
pub fn decode_str(text: &str) -> Result<Pattern, PatternError> {
    decode_lines(text.lines())
}

/// Read and decode a pattern from any buffered byte stream, such as a file
/// or a downloaded body.
pub fn read_pattern<R: BufRead>(reader: R) -> Result<Pattern, PatternError> {
    let lines = reader.lines().collect::<Result<Vec<_>, _>>()?;
    decode_lines(lines)
}

pub fn read_pattern_file(path: impl AsRef<Path>) -> Result<Pattern, PatternError> {
    read_pattern(BufReader::new(File::open(path)?))
}

/// Decode RLE text given line by line.
pub fn decode_lines<I, S>(lines: I) -> Result<Pattern, PatternError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut decoder = Decoder::default();
    for (number, line) in lines.into_iter().enumerate() {
        if decoder.line(number + 1, line.as_ref())? == Flow::Stop {
            break;
        }
    }
    decoder.finish()
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Stop,
}

#[derive(Default)]
struct Decoder {
    name: Vec<String>,
    author: Vec<String>,
    comment: Vec<String>,
    corner: Option<Corner>,
    rule: Option<String>,
    size: Option<(usize, usize)>,
    cells: Option<GrowableGrid>,
    in_data: bool,
    matched: bool,
    /// Pending run count; a count may be split across a line break.
    run: String,
    x: usize,
    y: usize,
}

impl Decoder {
    fn line(&mut self, number: usize, line: &str) -> Result<Flow, PatternError> {
        if line.trim().is_empty() {
            return Ok(Flow::Continue);
        }
        if !self.in_data && self.header(number, line)? {
            self.matched = true;
            return Ok(Flow::Continue);
        }
        if is_data(line) {
            self.matched = true;
            if self.cells.is_none() {
                return Err(PatternError::DataBeforeSize { line: number });
            }
            self.in_data = true;
            return self.data(number, line);
        }
        Ok(Flow::Continue)
    }

    /// Apply a header line; false when the line is not a header.
    fn header(&mut self, number: usize, line: &str) -> Result<bool, PatternError> {
        let line = line.trim();
        if let Some(tagged) = line.strip_prefix('#') {
            let mut chars = tagged.chars();
            let tag = chars.next();
            let rest = chars.as_str();
            match tag {
                Some('N') => self.name.push(rest.trim().to_string()),
                Some('O') => self.author.push(rest.trim().to_string()),
                Some('C' | 'c') => self.comment.push(rest.trim().to_string()),
                Some(tag @ ('P' | 'R')) => {
                    let Some((x, y)) = coordinates(rest) else {
                        return Ok(false);
                    };
                    let convention = if tag == 'P' {
                        CornerConvention::TopLeft
                    } else {
                        CornerConvention::Centered
                    };
                    self.corner = Some(Corner {
                        x: number_at(x, number)?,
                        y: number_at(y, number)?,
                        convention,
                    });
                }
                Some('r') => match token(rest) {
                    Some(rule) => self.set_rule(rule)?,
                    None => return Ok(false),
                },
                _ => return Ok(false),
            }
            return Ok(true);
        }

        let Some((width, height, rule)) = size_fields(line) else {
            return Ok(false);
        };
        if self.size.is_some() {
            return Err(PatternError::DuplicateSize { line: number });
        }
        let width = number_at(width, number)?;
        let height = number_at(height, number)?;
        if width < 0 || height < 0 {
            return Err(PatternError::NegativeDimension { width, height });
        }
        let (width, height) = (width as usize, height as usize);
        if let Some(rule) = rule {
            self.set_rule(rule)?;
        }
        self.size = Some((width, height));
        let cells = GrowableGrid::new(width.max(1), height.max(1))
            .map_err(|_| PatternError::TooLarge { width, height })?;
        self.cells = Some(cells);
        Ok(true)
    }

    fn set_rule(&mut self, rule: &str) -> Result<(), PatternError> {
        if !LifeRule::validate(rule) {
            return Err(PatternError::InvalidRule(rule.to_string()));
        }
        self.rule = Some(rule.to_string());
        Ok(())
    }

    fn data(&mut self, number: usize, line: &str) -> Result<Flow, PatternError> {
        for c in line.chars() {
            match c {
                '0'..='9' => self.run.push(c),
                '!' => return Ok(Flow::Stop),
                '$' | 'A'..='Z' | 'a'..='z' => {
                    let count = if self.run.is_empty() {
                        1
                    } else {
                        self.run.parse::<usize>().map_err(|_| PatternError::InvalidRunLength {
                            line: number,
                            run: self.run.clone(),
                        })?
                    };
                    self.run.clear();
                    match c {
                        '$' => {
                            self.x = 0;
                            self.y = self.y.saturating_add(count);
                        }
                        'b' | 'B' => self.x = self.x.saturating_add(count),
                        'o' | 'A'..='Z' => self.live_run(count),
                        // other lowercase tags carry no state
                        _ => {}
                    }
                }
                _ => {}
            }
        }
        Ok(Flow::Continue)
    }

    fn live_run(&mut self, count: usize) {
        let Some((width, height)) = self.size else {
            return;
        };
        let Some(cells) = self.cells.as_mut() else {
            return;
        };
        for _ in 0..count {
            if width > 0 && self.x >= width {
                self.y = self.y.saturating_add(self.x / width);
                self.x %= width;
            }
            if self.x >= width || self.y >= height {
                // nothing more of this run lands inside the declared extent
                self.x = self.x.saturating_add(count);
                return;
            }
            cells.set_cell_state(self.x as i64, self.y as i64, true);
            self.x += 1;
        }
    }

    fn finish(self) -> Result<Pattern, PatternError> {
        if !self.matched {
            return Err(PatternError::Unrecognized);
        }
        let ((width, height), cells) = self.size.zip(self.cells).ok_or(PatternError::MissingSize)?;
        if let Some(corner) = &self.corner {
            corner.check(width, height)?;
        }

        let pattern = Pattern {
            name: self.name.join("\n"),
            author: self.author.join("\n"),
            comment: self.comment.join("\n"),
            width,
            height,
            corner: self.corner,
            rule: self.rule,
            cells,
        };
        info!(
            "decoded pattern {:?}: {}x{}, {} live cells",
            pattern.name,
            width,
            height,
            pattern.population()
        );
        Ok(pattern)
    }
}

fn number_at(digits: &str, line: usize) -> Result<i64, PatternError> {
    digits.parse().map_err(|_| PatternError::InvalidNumber { line })
}

/// Optional minus sign followed by at least one digit.
fn is_integer(text: &str) -> bool {
    let digits = text.strip_prefix('-').unwrap_or(text);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// The single whitespace-free word in `text`.
fn token(text: &str) -> Option<&str> {
    let word = text.trim();
    (!word.is_empty() && !word.contains(char::is_whitespace)).then_some(word)
}

/// `x y` of a `#P` or `#R` line.
fn coordinates(text: &str) -> Option<(&str, &str)> {
    let mut words = text.split_whitespace();
    let x = words.next().filter(|w| is_integer(w))?;
    let y = words.next().filter(|w| is_integer(w))?;
    words.next().is_none().then_some((x, y))
}

/// Value of a `key = value` clause, matching the key case-insensitively.
fn field<'a>(clause: &'a str, key: &str) -> Option<&'a str> {
    let (name, value) = clause.split_once('=')?;
    name.trim().eq_ignore_ascii_case(key).then(|| value.trim())
}

/// Width, height and optional rule of an `x = .., y = .., rule = ..` line.
fn size_fields(line: &str) -> Option<(&str, &str, Option<&str>)> {
    let mut clauses = line.splitn(3, ',');
    let width = field(clauses.next()?, "x").filter(|v| is_integer(v))?;
    let height = field(clauses.next()?, "y").filter(|v| is_integer(v))?;
    let rule = match clauses.next() {
        Some(clause) => Some(field(clause, "rule").and_then(token)?),
        None => None,
    };
    Some((width, height, rule))
}

/// Run-length data: digits, tags and `$` up to an optional `!`.
fn is_data(line: &str) -> bool {
    let body = line.split_once('!').map_or(line, |(body, _)| body);
    body.chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '$' || c.is_whitespace())
}
