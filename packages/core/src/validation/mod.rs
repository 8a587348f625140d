//! Format Template Validation
//!
//! Location codes are constrained per tree level by a compact character
//! definition ("format template"). This module compiles those definitions
//! into immutable validators:
//!
//! - `\d` - one ASCII digit
//! - `\a` - one ASCII letter
//! - `\p` - one punctuation character (the separator excluded)
//! - anything else - a literal that must match itself
//!
//! The separator reserved for path serialization is validated here too, and
//! no compiled template or accepted segment can ever contain it.

mod error;
mod format;

pub use error::FormatError;
pub use format::{
    check_separator_free, compile_separator, compile_template, validate_segment,
    CompiledTemplate, FormatValidator, SlotClass, MAX_SEPARATOR_LENGTH, PUNCTUATION,
};
