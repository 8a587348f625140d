//! Format Template Error Types
//!
//! Errors raised while compiling separators and character definitions, and
//! while checking a proposed value against them. All of these are reported
//! at definition or validation time, before any write happens.

use thiserror::Error;

/// Separator, template and segment validation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    /// Separator is the empty string
    #[error("A separator cannot be empty")]
    EmptySeparator,

    /// Separator is wider than the storage column allows
    #[error("The length of the separator is {length}, the max length is {max}")]
    SeparatorTooLong { length: usize, max: usize },

    /// Character definition has no slots at all
    #[error("Character definition formats are required")]
    TemplateEmpty,

    /// Character definition contains the reserved separator
    #[error("Invalid format, found separator '{separator}' in '{template}'")]
    TemplateContainsSeparator { template: String, separator: String },

    /// Character definition could not be tokenized
    #[error("Invalid format '{template}': {reason}")]
    TemplateUnparsable { template: String, reason: String },

    /// A name or segment contains the reserved separator
    #[error("Invalid value '{value}', found separator '{separator}'")]
    SeparatorInValue { value: String, separator: String },

    /// Segment length or character classes do not fit the template
    #[error("Invalid segment '{segment}', does not conform to '{template}'")]
    SegmentDoesNotMatchTemplate { segment: String, template: String },
}

impl FormatError {
    /// Create a template unparsable error
    pub fn unparsable(template: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::TemplateUnparsable {
            template: template.into(),
            reason: reason.into(),
        }
    }

    /// Create a separator-in-value error
    pub fn separator_in_value(value: impl Into<String>, separator: impl Into<String>) -> Self {
        Self::SeparatorInValue {
            value: value.into(),
            separator: separator.into(),
        }
    }
}
