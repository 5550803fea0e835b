use std::io;

use thiserror::Error;

/// Failures surfaced while loading a document.
///
/// Query evaluation is infallible; only the loaders return these.
#[derive(Debug, Error)]
pub enum XmlError {
    #[error("error reading document source")]
    Io(#[from] io::Error),

    #[error("document is not valid UTF-8")]
    Encoding(#[from] std::string::FromUtf8Error),

    #[error("unexpected end of input")]
    UnexpectedEof,

    #[error("malformed tag")]
    InvalidTag,

    #[error("close tag </{found}> does not match the open element")]
    MismatchedCloseTag {
        expected: Option<Box<str>>,
        found: Box<str>,
    },

    #[error("attribute `{name}` is missing `=` and a value")]
    ExpectedAttributeValue { name: Box<str> },

    #[error("attribute value must be quoted with `'` or `\"`")]
    ExpectedQuote,
}
