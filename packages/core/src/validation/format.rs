//! Character definition compiler
//!
//! A character definition such as `B\d\dC\d\dR\d\d` is scanned left to right
//! into slots, one slot per segment character. The slots are then turned
//! into an anchored [`Regex`] which is the validator used for every segment
//! proposed against that format.

use super::error::FormatError;
use regex::Regex;
use std::fmt;

/// Maximum separator width (matches the storage column)
pub const MAX_SEPARATOR_LENGTH: usize = 3;

/// Characters accepted by a `\p` slot, before the separator is removed
pub const PUNCTUATION: &str = "!\"#$%&'()*+,-./:;<=>?@[]^_`{|}~";

/// Character class of a single template slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotClass {
    /// `\d`
    Digit,
    /// `\a`
    Alpha,
    /// `\p`
    Punctuation,
    /// Any other character, matched exactly
    Literal(char),
}

impl SlotClass {
    /// The text this slot was written as in the character definition
    pub fn canonical(&self) -> String {
        match self {
            SlotClass::Digit => r"\d".to_string(),
            SlotClass::Alpha => r"\a".to_string(),
            SlotClass::Punctuation => r"\p".to_string(),
            SlotClass::Literal(c) => c.to_string(),
        }
    }

    /// Whether `c` may appear at a position governed by this slot
    pub fn accepts(&self, c: char, separator: &str) -> bool {
        match self {
            SlotClass::Digit => c.is_ascii_digit(),
            SlotClass::Alpha => c.is_ascii_alphabetic(),
            SlotClass::Punctuation => punctuation(separator).any(|p| p == c),
            SlotClass::Literal(l) => *l == c,
        }
    }

    fn pattern(&self, separator: &str) -> String {
        match self {
            SlotClass::Digit => "[0-9]".to_string(),
            SlotClass::Alpha => "[A-Za-z]".to_string(),
            SlotClass::Punctuation => {
                let choices: Vec<String> = punctuation(separator)
                    .map(|c| regex::escape(&c.to_string()))
                    .collect();
                format!("(?:{})", choices.join("|"))
            }
            SlotClass::Literal(c) => regex::escape(&c.to_string()),
        }
    }
}

/// Punctuation characters usable in a `\p` slot for the given separator.
///
/// A single character separator is removed from the set. Wider separators
/// are kept out of segments by the separator check instead.
fn punctuation(separator: &str) -> impl Iterator<Item = char> + '_ {
    let mut sep_chars = separator.chars();
    let single = match (sep_chars.next(), sep_chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    };

    PUNCTUATION.chars().filter(move |c| Some(*c) != single)
}

/// Validate a separator string.
///
/// Returns the separator unchanged when it is non-empty and no wider than
/// [`MAX_SEPARATOR_LENGTH`] characters.
pub fn compile_separator(raw: &str) -> Result<String, FormatError> {
    if raw.is_empty() {
        return Err(FormatError::EmptySeparator);
    }

    let length = raw.chars().count();

    if length > MAX_SEPARATOR_LENGTH {
        return Err(FormatError::SeparatorTooLong {
            length,
            max: MAX_SEPARATOR_LENGTH,
        });
    }

    Ok(raw.to_string())
}

/// Reject a name or segment that contains the separator
pub fn check_separator_free(value: &str, separator: &str) -> Result<(), FormatError> {
    if value.contains(separator) {
        return Err(FormatError::separator_in_value(value, separator));
    }

    Ok(())
}

fn tokenize(raw: &str) -> Result<Vec<SlotClass>, FormatError> {
    let mut slots = Vec::new();
    let mut chars = raw.chars();

    while let Some(c) = chars.next() {
        let slot = match c {
            '\\' => match chars.next() {
                Some('d') => SlotClass::Digit,
                Some('a') => SlotClass::Alpha,
                Some('p') => SlotClass::Punctuation,
                Some(other) => {
                    return Err(FormatError::unparsable(
                        raw,
                        format!("unknown escape '\\{}'", other),
                    ))
                }
                None => {
                    return Err(FormatError::unparsable(
                        raw,
                        "dangling '\\' at end of format",
                    ))
                }
            },
            c if c.is_control() => {
                return Err(FormatError::unparsable(
                    raw,
                    format!("control character {:?}", c),
                ))
            }
            c => SlotClass::Literal(c),
        };

        slots.push(slot);
    }

    Ok(slots)
}

/// Compile a character definition against a separator.
///
/// # Errors
///
/// - `EmptySeparator` / `SeparatorTooLong` for a bad separator
/// - `TemplateEmpty` for an empty definition
/// - `TemplateContainsSeparator` when the separator appears anywhere in `raw`
/// - `TemplateUnparsable` for unknown or dangling escapes
pub fn compile_template(raw: &str, separator: &str) -> Result<CompiledTemplate, FormatError> {
    let separator = compile_separator(separator)?;

    if raw.is_empty() {
        return Err(FormatError::TemplateEmpty);
    }

    if raw.contains(separator.as_str()) {
        return Err(FormatError::TemplateContainsSeparator {
            template: raw.to_string(),
            separator,
        });
    }

    let slots = tokenize(raw)?;
    let canonical: String = slots.iter().map(SlotClass::canonical).collect();

    if canonical != raw {
        return Err(FormatError::unparsable(
            raw,
            format!("parsed as '{}'", canonical),
        ));
    }

    if slots.is_empty() {
        return Err(FormatError::TemplateEmpty);
    }

    let pattern: String = slots.iter().map(|slot| slot.pattern(&separator)).collect();
    let matcher = Regex::new(&format!("^{}$", pattern))
        .map_err(|e| FormatError::unparsable(raw, e.to_string()))?;

    Ok(CompiledTemplate {
        source: raw.to_string(),
        separator,
        slots,
        matcher,
    })
}

/// Check a segment against a compiled template.
///
/// The separator check runs first, so a segment carrying the separator is
/// reported as `SeparatorInValue` even if it also misses the template.
pub fn validate_segment(segment: &str, template: &CompiledTemplate) -> Result<String, FormatError> {
    check_separator_free(segment, &template.separator)?;

    if !template.matches(segment) {
        return Err(FormatError::SegmentDoesNotMatchTemplate {
            segment: segment.to_string(),
            template: template.source.clone(),
        });
    }

    Ok(segment.to_string())
}

/// Immutable validator produced by [`compile_template`]
#[derive(Debug, Clone)]
pub struct CompiledTemplate {
    source: String,
    separator: String,
    slots: Vec<SlotClass>,
    matcher: Regex,
}

impl CompiledTemplate {
    /// The character definition this template was compiled from
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn separator(&self) -> &str {
        &self.separator
    }

    pub fn slots(&self) -> &[SlotClass] {
        &self.slots
    }

    /// Number of characters a matching segment has
    pub fn segment_length(&self) -> usize {
        self.slots.len()
    }

    /// True when `segment` has exactly `segment_length` characters and each
    /// one fits the slot at its position.
    pub fn matches(&self, segment: &str) -> bool {
        segment.chars().count() == self.slots.len() && self.matcher.is_match(segment)
    }
}

impl fmt::Display for CompiledTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Separator-bound validator, one per location default
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatValidator {
    separator: String,
}

impl FormatValidator {
    pub fn new(separator: &str) -> Result<Self, FormatError> {
        Ok(Self {
            separator: compile_separator(separator)?,
        })
    }

    pub fn separator(&self) -> &str {
        &self.separator
    }

    pub fn compile(&self, char_definition: &str) -> Result<CompiledTemplate, FormatError> {
        compile_template(char_definition, &self.separator)
    }

    /// Returns the character definition unchanged if it compiles
    pub fn validate_char_definition(&self, char_definition: &str) -> Result<String, FormatError> {
        self.compile(char_definition)?;
        Ok(char_definition.to_string())
    }

    /// Compile `char_definition` and check one segment against it.
    ///
    /// The template (and its regex) is compiled on every call; to check
    /// many segments against one definition, [`FormatValidator::compile`]
    /// once and pass the [`CompiledTemplate`] to [`validate_segment`].
    pub fn validate_segment(&self, segment: &str, char_definition: &str) -> Result<String, FormatError> {
        let template = self.compile(char_definition)?;
        validate_segment(segment, &template)
    }
}
