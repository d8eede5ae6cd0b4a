//! Praat TextGrid reader
//!
//! Reads the two text serialisations Praat writes: the "long" form with
//! `key = value` lines and `item [n]:` headers, and the "short" form that
//! lists bare values only. Both are a stream of numbers, quoted strings and
//! `<exists>` flags once labels are skipped, which is how they are parsed here.
//!
//! Files may be UTF-8 (with or without BOM) or UTF-16 with a BOM.

use std::fs;
use std::path::Path;

use crate::{FricativeError, Result};

/// A labelled stretch of time on an interval tier
#[derive(Debug, Clone, PartialEq)]
pub struct Interval {
    pub label: String,
    pub start: f64,
    pub end: f64,
}

impl Interval {
    pub fn new(label: impl Into<String>, start: f64, end: f64) -> Self {
        Self {
            label: label.into(),
            start,
            end,
        }
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    pub fn midpoint(&self) -> f64 {
        0.5 * (self.start + self.end)
    }
}

/// A labelled instant on a point tier
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    pub time: f64,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TierContent {
    Intervals(Vec<Interval>),
    Points(Vec<Point>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tier {
    pub name: String,
    pub xmin: f64,
    pub xmax: f64,
    pub content: TierContent,
}

impl Tier {
    pub fn intervals(&self) -> Option<&[Interval]> {
        match &self.content {
            TierContent::Intervals(intervals) => Some(intervals),
            TierContent::Points(_) => None,
        }
    }
}

/// A parsed TextGrid: a time domain and its tiers in file order
#[derive(Debug, Clone, PartialEq)]
pub struct TextGrid {
    pub xmin: f64,
    pub xmax: f64,
    pub tiers: Vec<Tier>,
}

impl TextGrid {
    /// Read and parse a TextGrid file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = fs::read(path.as_ref())?;
        let text = decode_text(&bytes)?;
        Self::parse(&text)
    }

    /// Parse TextGrid text in long or short form
    pub fn parse(text: &str) -> Result<Self> {
        let tokens = tokenize(text)?;
        let mut reader = TokenReader { tokens, pos: 0 };

        let file_type = reader.string("file type")?;
        if file_type != "ooTextFile" {
            return Err(reader.error(format!("unsupported file type \"{}\"", file_type)));
        }
        let class = reader.string("object class")?;
        if class != "TextGrid" {
            return Err(reader.error(format!("expected a TextGrid, found \"{}\"", class)));
        }

        let xmin = reader.number("xmin")?;
        let xmax = reader.number("xmax")?;
        let tier_count = if reader.flag()? { reader.count("tier count", TIER_HEADER_TOKENS)? } else { 0 };

        let mut tiers = Vec::with_capacity(tier_count);
        for _ in 0..tier_count {
            tiers.push(reader.tier()?);
        }

        Ok(Self { xmin, xmax, tiers })
    }

    /// Intervals of the tier at a 1-based position
    ///
    /// Fails if the position is out of range or names a point tier.
    pub fn interval_tier(&self, position: usize) -> Result<&[Interval]> {
        let tier = position
            .checked_sub(1)
            .and_then(|index| self.tiers.get(index))
            .ok_or_else(|| {
                FricativeError::InvalidParameter(format!(
                    "tier {} requested but the TextGrid has {} tier(s)",
                    position,
                    self.tiers.len()
                ))
            })?;
        tier.intervals().ok_or_else(|| {
            FricativeError::InvalidParameter(format!(
                "tier {} (\"{}\") is a point tier, not an interval tier",
                position, tier.name
            ))
        })
    }
}

fn decode_text(bytes: &[u8]) -> Result<String> {
    let utf16 = |units: Vec<u16>| {
        char::decode_utf16(units)
            .collect::<std::result::Result<String, _>>()
            .map_err(|e| FricativeError::TextGrid {
                line: 0,
                reason: format!("invalid UTF-16: {}", e),
            })
    };

    match bytes {
        [0xFF, 0xFE, rest @ ..] => utf16(
            rest.chunks_exact(2)
                .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
                .collect(),
        ),
        [0xFE, 0xFF, rest @ ..] => utf16(
            rest.chunks_exact(2)
                .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                .collect(),
        ),
        _ => {
            let body = bytes.strip_prefix(&[0xEF_u8, 0xBB, 0xBF][..]).unwrap_or(bytes);
            String::from_utf8(body.to_vec()).map_err(|e| FricativeError::TextGrid {
                line: 0,
                reason: format!("invalid UTF-8: {}", e),
            })
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Text(String),
    Flag(bool),
}

#[derive(Debug)]
struct Located {
    token: Token,
    line: usize,
}

/// Split TextGrid text into values, dropping keys, `=` signs, `[n]:`
/// headers and `!` comments.
fn tokenize(text: &str) -> Result<Vec<Located>> {
    let mut tokens = Vec::new();
    let mut chars = text.chars().peekable();
    let mut line = 1;

    while let Some(&c) = chars.peek() {
        if c == '\n' {
            line += 1;
            chars.next();
        } else if c.is_whitespace() {
            chars.next();
        } else if c == '!' {
            while let Some(&c) = chars.peek() {
                if c == '\n' {
                    break;
                }
                chars.next();
            }
        } else if c == '"' {
            let start_line = line;
            chars.next();
            let mut value = String::new();
            loop {
                match chars.next() {
                    Some('"') => {
                        if chars.peek() == Some(&'"') {
                            chars.next();
                            value.push('"');
                        } else {
                            break;
                        }
                    }
                    Some(c) => {
                        if c == '\n' {
                            line += 1;
                        }
                        value.push(c);
                    }
                    None => {
                        return Err(FricativeError::TextGrid {
                            line: start_line,
                            reason: "unterminated string".to_string(),
                        })
                    }
                }
            }
            tokens.push(Located {
                token: Token::Text(value),
                line: start_line,
            });
        } else {
            let mut word = String::new();
            while let Some(&c) = chars.peek() {
                if c.is_whitespace() || c == '"' {
                    break;
                }
                word.push(c);
                chars.next();
            }
            let token = match word.as_str() {
                "<exists>" => Some(Token::Flag(true)),
                "<absent>" => Some(Token::Flag(false)),
                _ if word.starts_with('[') || word.ends_with(':') => None,
                _ => word
                    .parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .map(Token::Number),
            };
            if let Some(token) = token {
                tokens.push(Located { token, line });
            }
        }
    }

    Ok(tokens)
}

/// Class, name, xmin, xmax and item count
const TIER_HEADER_TOKENS: usize = 5;

struct TokenReader {
    tokens: Vec<Located>,
    pos: usize,
}

impl TokenReader {
    fn line(&self) -> usize {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map(|t| t.line)
            .unwrap_or(0)
    }

    fn error(&self, reason: String) -> FricativeError {
        FricativeError::TextGrid {
            line: self.line(),
            reason,
        }
    }

    fn next(&mut self, what: &str) -> Result<Token> {
        match self.tokens.get(self.pos) {
            Some(located) => {
                self.pos += 1;
                Ok(located.token.clone())
            }
            None => Err(self.error(format!("unexpected end of file, expected {}", what))),
        }
    }

    fn number(&mut self, what: &str) -> Result<f64> {
        match self.next(what)? {
            Token::Number(value) => Ok(value),
            other => {
                self.pos -= 1;
                Err(self.error(format!("expected {} (a number), found {:?}", what, other)))
            }
        }
    }

    /// Item count for a list whose items take at least `tokens_per_item`
    /// tokens each; a count the rest of the file cannot hold is an error.
    fn count(&mut self, what: &str, tokens_per_item: usize) -> Result<usize> {
        let value = self.number(what)?;
        if value < 0.0 || value.fract() != 0.0 {
            self.pos -= 1;
            return Err(self.error(format!("expected {} (a whole number), found {}", what, value)));
        }
        let available = (self.tokens.len() - self.pos) / tokens_per_item.max(1);
        if value > available as f64 {
            self.pos -= 1;
            return Err(self.error(format!(
                "{} {} exceeds the {} item(s) left in the file",
                what, value, available
            )));
        }
        Ok(value as usize)
    }

    fn string(&mut self, what: &str) -> Result<String> {
        match self.next(what)? {
            Token::Text(value) => Ok(value),
            other => {
                self.pos -= 1;
                Err(self.error(format!("expected {} (a quoted string), found {:?}", what, other)))
            }
        }
    }

    fn flag(&mut self) -> Result<bool> {
        match self.next("tier flag")? {
            Token::Flag(value) => Ok(value),
            other => {
                self.pos -= 1;
                Err(self.error(format!("expected <exists> or <absent>, found {:?}", other)))
            }
        }
    }

    fn tier(&mut self) -> Result<Tier> {
        let class = self.string("tier class")?;
        let name = self.string("tier name")?;
        let xmin = self.number("tier xmin")?;
        let xmax = self.number("tier xmax")?;
        let per_item = if class == "TextTier" { 2 } else { 3 };
        let size = self.count("item count", per_item)?;

        let content = match class.as_str() {
            "IntervalTier" => {
                let mut intervals = Vec::with_capacity(size);
                for _ in 0..size {
                    let start = self.number("interval xmin")?;
                    let end = self.number("interval xmax")?;
                    let label = self.string("interval text")?;
                    intervals.push(Interval::new(label.trim(), start, end));
                }
                TierContent::Intervals(intervals)
            }
            "TextTier" => {
                let mut points = Vec::with_capacity(size);
                for _ in 0..size {
                    let time = self.number("point time")?;
                    let label = self.string("point mark")?;
                    points.push(Point {
                        time,
                        label: label.trim().to_string(),
                    });
                }
                TierContent::Points(points)
            }
            other => {
                return Err(self.error(format!("unknown tier class \"{}\"", other)));
            }
        };

        Ok(Tier {
            name,
            xmin,
            xmax,
            content,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const LONG: &str = r#"File type = "ooTextFile"
Object class = "TextGrid"

xmin = 0
xmax = 0.7
tiers? <exists>
size = 2
item []:
    item [1]:
        class = "IntervalTier"
        name = "words"
        xmin = 0
        xmax = 0.7
        intervals: size = 2
        intervals [1]:
            xmin = 0
            xmax = 0.3
            text = "bas"
        intervals [2]:
            xmin = 0.3
            xmax = 0.7
            text = "a ""quoted"" word"
    item [2]:
        class = "TextTier"
        name = "events"
        xmin = 0
        xmax = 0.7
        points: size = 1
        points [1]:
            number = 0.25
            mark = "click"
"#;

    const SHORT: &str = "File type = \"ooTextFile\"\nObject class = \"TextGrid\"\n\n0\n0.7\n<exists>\n1\n\"IntervalTier\"\n\"phones\"\n0\n0.7\n2\n0\n0.2\n\"s\"\n0.2\n0.7\n\"\"\n";

    #[test]
    fn test_parse_long_format() {
        let grid = TextGrid::parse(LONG).unwrap();

        assert_relative_eq!(grid.xmax, 0.7);
        assert_eq!(grid.tiers.len(), 2);
        assert_eq!(grid.tiers[0].name, "words");

        let words = grid.interval_tier(1).unwrap();
        assert_eq!(words.len(), 2);
        assert_eq!(words[0], Interval::new("bas", 0.0, 0.3));
        assert_eq!(words[1].label, "a \"quoted\" word");

        match &grid.tiers[1].content {
            TierContent::Points(points) => {
                assert_eq!(points.len(), 1);
                assert_eq!(points[0].label, "click");
                assert_relative_eq!(points[0].time, 0.25);
            }
            other => panic!("expected points, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_short_format() {
        let grid = TextGrid::parse(SHORT).unwrap();
        let phones = grid.interval_tier(1).unwrap();

        assert_eq!(phones.len(), 2);
        assert_eq!(phones[0], Interval::new("s", 0.0, 0.2));
        assert_eq!(phones[1].label, "");
    }

    #[test]
    fn test_tier_selection_errors() {
        let grid = TextGrid::parse(LONG).unwrap();

        assert!(matches!(grid.interval_tier(0), Err(FricativeError::InvalidParameter(_))));
        assert!(matches!(grid.interval_tier(3), Err(FricativeError::InvalidParameter(_))));
        let err = grid.interval_tier(2).unwrap_err();
        assert!(err.to_string().contains("point tier"));
    }

    #[test]
    fn test_utf16_with_bom() {
        let mut bytes = vec![0xFF, 0xFE];
        for unit in SHORT.encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        let text = decode_text(&bytes).unwrap();
        let grid = TextGrid::parse(&text).unwrap();
        assert_eq!(grid.tiers[0].name, "phones");
    }

    #[test]
    fn test_utf8_bom_is_skipped() {
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice(SHORT.as_bytes());
        assert!(TextGrid::parse(&decode_text(&bytes).unwrap()).is_ok());
    }

    #[test]
    fn test_counts_larger_than_the_file_are_rejected() {
        let huge_intervals = SHORT.replacen("0\n0.7\n2\n", "0\n0.7\n1e300\n", 1);
        assert_ne!(huge_intervals, SHORT);
        assert!(matches!(
            TextGrid::parse(&huge_intervals),
            Err(FricativeError::TextGrid { .. })
        ));

        let huge_tiers = SHORT.replacen("<exists>\n1\n", "<exists>\n1e10\n", 1);
        assert_ne!(huge_tiers, SHORT);
        match TextGrid::parse(&huge_tiers) {
            Err(FricativeError::TextGrid { reason, .. }) => assert!(reason.contains("tier count"), "{}", reason),
            other => panic!("expected a TextGrid error, got {:?}", other),
        }
    }

    #[test]
    fn test_truncated_file_reports_line() {
        let truncated = &SHORT[..SHORT.find("\"s\"").unwrap()];
        match TextGrid::parse(truncated) {
            Err(FricativeError::TextGrid { line, reason }) => {
                assert!(line > 0);
                assert!(reason.contains("item count 2 exceeds"), "{}", reason);
            }
            other => panic!("expected a TextGrid error, got {:?}", other),
        }
    }

    #[test]
    fn test_rejects_other_object_class() {
        let text = "File type = \"ooTextFile\"\nObject class = \"Pitch 1\"\n0\n1\n";
        assert!(TextGrid::parse(text).is_err());
    }

    #[test]
    fn test_absent_tiers() {
        let text = "\"ooTextFile\"\n\"TextGrid\"\n0\n1\n<absent>\n";
        let grid = TextGrid::parse(text).unwrap();
        assert!(grid.tiers.is_empty());
    }
}
