//! Line-oriented flat files: delimited tokenizing, line mapping and the
//! readers built on top of them.

use std::marker::PhantomData;

use crate::BatchError;

/// This module contains the single-resource flat file reader.
pub mod flat_file_reader;

/// This module contains the reader chaining several flat files.
pub mod multi_resource_reader;

/// This module contains the selection of input files in a directory.
pub mod resource;

/// Default delimiter of the address files.
pub const DEFAULT_DELIMITER: char = '|';

/// Lines starting with this prefix are comments and never mapped.
pub const DEFAULT_COMMENT_PREFIX: &str = "#";

/// Maps one line of text to an item.
pub trait LineMapper<T> {
    /// Maps `line`, the `line_number`-th physical line of its resource.
    fn map_line(&self, line: &str, line_number: usize) -> Result<T, BatchError>;
}

/// Builds an item from the positional tokens of a record.
///
/// `NAMES` is the ordered list of token names; the tokenizer only hands over
/// token slices of exactly that length.
pub trait FieldSetMapper: Sized {
    const NAMES: &'static [&'static str];

    fn map_field_set(fields: &[&str]) -> Self;
}

/// Splits a record on a single-character delimiter.
///
/// The whole record is trimmed first, then split. In strict mode (the
/// default) a token count different from the expected width is an error.
#[derive(Debug, Clone, Copy)]
pub struct DelimitedLineTokenizer {
    delimiter: char,
    expected: usize,
    strict: bool,
}

impl DelimitedLineTokenizer {
    pub fn new(expected: usize) -> Self {
        Self {
            delimiter: DEFAULT_DELIMITER,
            expected,
            strict: true,
        }
    }

    pub fn delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Tokenizes `line`.
    ///
    /// When not strict, missing tokens are padded with empty strings and
    /// extra tokens are dropped.
    pub fn tokenize<'l>(&self, line: &'l str) -> Result<Vec<&'l str>, BatchError> {
        let mut tokens: Vec<&str> = line.trim().split(self.delimiter).collect();

        if tokens.len() != self.expected {
            if self.strict {
                return Err(BatchError::IncorrectTokenCount {
                    expected: self.expected,
                    actual: tokens.len(),
                });
            }
            tokens.resize(self.expected, "");
        }

        Ok(tokens)
    }
}

/// [`LineMapper`] for delimited records whose layout is given by a
/// [`FieldSetMapper`].
#[derive(Debug)]
pub struct DelimitedLineMapper<T> {
    tokenizer: DelimitedLineTokenizer,
    _item: PhantomData<fn() -> T>,
}

impl<T> Clone for DelimitedLineMapper<T> {
    fn clone(&self) -> Self {
        Self {
            tokenizer: self.tokenizer,
            _item: PhantomData,
        }
    }
}

impl<T: FieldSetMapper> Default for DelimitedLineMapper<T> {
    fn default() -> Self {
        Self::new(DelimitedLineTokenizer::new(T::NAMES.len()))
    }
}

impl<T: FieldSetMapper> DelimitedLineMapper<T> {
    pub fn new(tokenizer: DelimitedLineTokenizer) -> Self {
        Self {
            tokenizer,
            _item: PhantomData,
        }
    }

    pub fn tokenizer(&self) -> &DelimitedLineTokenizer {
        &self.tokenizer
    }
}

impl<T: FieldSetMapper> LineMapper<T> for DelimitedLineMapper<T> {
    fn map_line(&self, line: &str, _line_number: usize) -> Result<T, BatchError> {
        let tokens = self.tokenizer.tokenize(line)?;
        Ok(T::map_field_set(&tokens))
    }
}
