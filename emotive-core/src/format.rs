//! Conditional blocks inside reply text
//!
//! Replies may carry spans like `[Patience;<=0.0;Hurry up.]`. A span is
//! replaced by its text when the named emotion satisfies the condition and
//! removed otherwise. Blocks are resolved one at a time from the left,
//! pairing the first `[` with the first `]` after it; blocks must not nest.

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

use crate::affect::AffectState;
use crate::error::{Error, Result};

/// Tolerance used by `==`
pub const EQ_TOLERANCE: f32 = 0.001;

#[allow(clippy::expect_used)]
static NUMERAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[-+]?[0-9]*\.[0-9]+|[-+]?[0-9]+").expect("numeral pattern is valid")
});

/// First signed decimal numeral in `text`: its byte offset and value
pub fn find_numeral(text: &str) -> Option<(usize, f32)> {
    let found = NUMERAL.find(text)?;
    let value = found.as_str().parse::<f32>().ok()?;
    Some((found.start(), value))
}

/// Comparison in a conditional block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// `==`, within [`EQ_TOLERANCE`]
    Eq,
    /// `<`
    Lt,
    /// `>`
    Gt,
    /// `<=`
    Le,
    /// `>=`
    Ge,
}

impl Operator {
    /// Compare `actual` against `threshold`
    pub fn evaluate(self, actual: f32, threshold: f32) -> bool {
        match self {
            Self::Eq => (actual - threshold).abs() < EQ_TOLERANCE,
            Self::Lt => actual < threshold,
            Self::Gt => actual > threshold,
            Self::Le => actual <= threshold,
            Self::Ge => actual >= threshold,
        }
    }
}

impl FromStr for Operator {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "==" => Ok(Self::Eq),
            "<" => Ok(Self::Lt),
            ">" => Ok(Self::Gt),
            "<=" => Ok(Self::Le),
            ">=" => Ok(Self::Ge),
            other => Err(Error::parse(format!("unknown operator '{}'", other))),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Eq => "==",
            Self::Lt => "<",
            Self::Gt => ">",
            Self::Le => "<=",
            Self::Ge => ">=",
        })
    }
}

/// Parsed `<operator><numeral>` expression
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Condition {
    /// Comparison
    pub operator: Operator,
    /// Right-hand side
    pub threshold: f32,
}

impl Condition {
    /// Parse e.g. `<=-0.5`. The first numeral is the threshold; everything
    /// before it, whitespace included, must be exactly the operator.
    pub fn parse(expr: &str) -> Result<Self> {
        let (start, threshold) = find_numeral(expr)
            .ok_or_else(|| Error::parse(format!("no numeral in condition '{}'", expr)))?;
        let operator = expr[..start].parse()?;
        Ok(Self {
            operator,
            threshold,
        })
    }

    /// Whether `actual` satisfies the condition
    pub fn holds(&self, actual: f32) -> bool {
        self.operator.evaluate(actual, self.threshold)
    }
}

/// One `[emotion;condition;text]` span, without its brackets
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionalBlock<'a> {
    /// Emotion the condition reads, matched exactly
    pub emotion: &'a str,
    /// Raw condition expression
    pub expression: &'a str,
    /// Text shown when the condition holds
    pub text: &'a str,
}

impl<'a> ConditionalBlock<'a> {
    /// Split the inside of a block on `;`. Segments after the third are
    /// ignored.
    pub fn parse(inner: &'a str) -> Result<Self> {
        let mut segments = inner.split(';');
        match (segments.next(), segments.next(), segments.next()) {
            (Some(emotion), Some(expression), Some(text)) => Ok(Self {
                emotion,
                expression,
                text,
            }),
            _ => Err(Error::parse(format!(
                "conditional block '{}' needs at least three ';'-separated segments",
                inner
            ))),
        }
    }
}

/// Rewrites reply text by resolving its conditional blocks
#[derive(Debug, Clone, Copy, Default)]
pub struct TaggedTextFormatter;

impl TaggedTextFormatter {
    /// Create a formatter
    pub fn new() -> Self {
        Self
    }

    /// Whether emotion `emotion` currently satisfies `expr`. Unknown
    /// emotions and unparsable expressions are false.
    pub fn check_condition(&self, state: &AffectState, emotion: &str, expr: &str) -> bool {
        let actual = match state.emotion(emotion) {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "Conditional block names an unknown emotion");
                return false;
            }
        };
        match Condition::parse(expr) {
            Ok(condition) => condition.holds(actual),
            Err(e) => {
                warn!(error = %e, "Unparsable conditional block");
                false
            }
        }
    }

    fn resolve(&self, state: &AffectState, inner: &str) -> String {
        match ConditionalBlock::parse(inner) {
            Ok(block) if self.check_condition(state, block.emotion, block.expression) => {
                debug!(block = inner, "Showing conditional block");
                block.text.to_string()
            }
            Ok(_) => {
                debug!(block = inner, "Hiding conditional block");
                String::new()
            }
            Err(e) => {
                warn!(error = %e, "Dropping malformed conditional block");
                String::new()
            }
        }
    }

    /// Resolve every block in `raw` until no `[` remains
    pub fn format(&self, state: &AffectState, raw: &str) -> String {
        let mut output = raw.to_string();

        while let Some(open) = output.find('[') {
            let Some(close) = output[open..].find(']').map(|i| open + i) else {
                // Unterminated block: drop the bracket, keep the text
                warn!(at = open, "Unterminated conditional block");
                output.remove(open);
                continue;
            };
            let replacement = self.resolve(state, &output[open + 1..close]);
            output.replace_range(open..=close, &replacement);
        }

        output
    }
}
