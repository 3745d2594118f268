//! Output file name templates.
//!
//! An [`OutputTemplate`] is a file name containing printf-style integer
//! placeholders that are replaced with the timestamp (in seconds) of each
//! extracted frame. Supported conversions:
//!
//! | Placeholder | Meaning |
//! |-------------|---------|
//! | `%d`, `%i`, `%u` | timestamp |
//! | `%5d` | timestamp right-aligned to 5 columns |
//! | `%05d` | timestamp zero-padded to 5 digits |
//! | `%ld`, `%lld` | same as `%d` |
//! | `%%` | a literal `%` |
//!
//! # Example
//!
//! ```
//! use stillshot::OutputTemplate;
//!
//! let template = OutputTemplate::parse("shot_%04d.jpg")?;
//! assert_eq!(template.expand(42), "shot_0042.jpg");
//! # Ok::<(), stillshot::StillshotError>(())
//! ```

use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::error::StillshotError;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Number { width: usize, zero_pad: bool },
}

/// A parsed output file name template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputTemplate {
    source: String,
    segments: Vec<Segment>,
}

impl OutputTemplate {
    /// Parse a template string.
    ///
    /// # Errors
    ///
    /// Returns [`StillshotError::InvalidTemplate`] for an unsupported
    /// conversion (e.g. `%s`) or a dangling `%` at the end.
    pub fn parse(template: &str) -> Result<Self, StillshotError> {
        let invalid = |reason: String| StillshotError::InvalidTemplate {
            template: template.to_string(),
            reason,
        };

        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = template.chars().peekable();

        while let Some(c) = chars.next() {
            if c != '%' {
                literal.push(c);
                continue;
            }

            if chars.peek() == Some(&'%') {
                chars.next();
                literal.push('%');
                continue;
            }

            let zero_pad = chars.next_if_eq(&'0').is_some();
            let mut width = 0_usize;
            while let Some(digit) = chars.peek().and_then(|c| c.to_digit(10)) {
                chars.next();
                width = width
                    .checked_mul(10)
                    .and_then(|w| w.checked_add(digit as usize))
                    .ok_or_else(|| invalid("field width too large".to_string()))?;
            }
            while chars.next_if_eq(&'l').is_some() {}

            match chars.next() {
                Some('d' | 'i' | 'u') => {
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Number { width, zero_pad });
                }
                Some(other) => {
                    return Err(invalid(format!("unsupported conversion '%{other}'")));
                }
                None => return Err(invalid("dangling '%' at end".to_string())),
            }
        }

        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self {
            source: template.to_string(),
            segments,
        })
    }

    /// Substitute `seconds` into every placeholder.
    pub fn expand(&self, seconds: u64) -> String {
        let mut output = String::with_capacity(self.source.len() + 8);
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => output.push_str(text),
                Segment::Number {
                    width,
                    zero_pad: true,
                } => output.push_str(&format!("{seconds:0w$}", w = *width)),
                Segment::Number {
                    width,
                    zero_pad: false,
                } => output.push_str(&format!("{seconds:>w$}", w = *width)),
            }
        }
        output
    }

    /// Returns `true` if the template contains at least one placeholder.
    ///
    /// Without one, every timestamp writes to the same file.
    pub fn has_placeholder(&self) -> bool {
        self.segments
            .iter()
            .any(|segment| matches!(segment, Segment::Number { .. }))
    }

    /// The template as originally given.
    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl Display for OutputTemplate {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_placeholder() {
        let template = OutputTemplate::parse("frame_%d.png").unwrap();
        assert_eq!(template.expand(0), "frame_0.png");
        assert_eq!(template.expand(125), "frame_125.png");
        assert!(template.has_placeholder());
    }

    #[test]
    fn padded_placeholders() {
        let zero = OutputTemplate::parse("%03d.jpg").unwrap();
        assert_eq!(zero.expand(7), "007.jpg");
        assert_eq!(zero.expand(1234), "1234.jpg");

        let spaced = OutputTemplate::parse("[%4d]").unwrap();
        assert_eq!(spaced.expand(7), "[   7]");
    }

    #[test]
    fn length_modifiers_and_escapes() {
        let template = OutputTemplate::parse("100%%_%lld_%ld.bmp").unwrap();
        assert_eq!(template.expand(9), "100%_9_9.bmp");
    }

    #[test]
    fn no_placeholder() {
        let template = OutputTemplate::parse("cover.jpg").unwrap();
        assert_eq!(template.expand(3), "cover.jpg");
        assert!(!template.has_placeholder());
        assert_eq!(template.to_string(), "cover.jpg");
    }

    #[test]
    fn rejects_unsupported_conversions() {
        assert!(OutputTemplate::parse("frame_%s.png").is_err());
        assert!(OutputTemplate::parse("frame_%").is_err());
        assert!(OutputTemplate::parse("frame_%05").is_err());
    }
}
