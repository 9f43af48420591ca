use std::{
    cell::{Cell, RefCell},
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

use log::debug;

use crate::{
    core::item::{ItemReader, ItemReaderResult},
    error::BatchError,
};

use super::{DEFAULT_COMMENT_PREFIX, LineMapper};

/// Reads items from one line-oriented source.
///
/// Every physical line is counted, including comment lines, which are skipped
/// without being mapped. Any other line is mapped, so a blank line fails like
/// any line of the wrong width. Mapping failures are reported as
/// [`BatchError::FlatFileParse`] carrying the resource name, the line number
/// and the offending input.
///
/// A line that is not valid UTF-8 is an [`BatchError::ItemReader`] error. It
/// still counts as consumed, so line numbers and cursors stay aligned when the
/// error is skipped.
///
/// # Examples
///
/// ```
/// use address_batch::core::item::ItemReader;
/// use address_batch::item::address::AddressRecord;
/// use address_batch::item::flat::{
///     DelimitedLineMapper, flat_file_reader::FlatFileItemReaderBuilder,
/// };
///
/// let line = vec!["x"; 33].join("|");
/// let data = format!("# header comment\n{}\n", line);
///
/// let reader = FlatFileItemReaderBuilder::new(DelimitedLineMapper::<AddressRecord>::default())
///     .from_reader(data.as_bytes());
///
/// let record: AddressRecord = reader.read().unwrap().unwrap();
/// assert_eq!(record.town_code, "x");
/// assert!(ItemReader::<AddressRecord>::read(&reader).unwrap().is_none());
/// assert_eq!(reader.line_count(), 2);
/// ```
pub struct FlatFileItemReader<R, M> {
    resource: String,
    input: RefCell<R>,
    line_mapper: M,
    comments: Vec<String>,
    line_count: Cell<usize>,
}

impl<R: BufRead, M> FlatFileItemReader<R, M> {
    /// Number of physical lines consumed so far.
    pub fn line_count(&self) -> usize {
        self.line_count.get()
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// Consumes up to `count` lines without mapping them.
    ///
    /// Returns the number of lines actually skipped, lower than `count` when
    /// the input ends first.
    pub fn skip_lines(&self, count: usize) -> Result<usize, BatchError> {
        let mut skipped = 0;
        while skipped < count {
            if self.read_raw_line()?.is_none() {
                break;
            }
            skipped += 1;
        }
        debug!("Skipped {} lines of {}", skipped, self.resource);
        Ok(skipped)
    }

    /// Reads the bytes of the next physical line and counts it.
    fn read_raw_line(&self) -> Result<Option<Vec<u8>>, BatchError> {
        let mut bytes = Vec::new();
        let read = self
            .input
            .borrow_mut()
            .read_until(b'\n', &mut bytes)
            .map_err(|e| BatchError::ItemReader(format!("{}: {}", self.resource, e)))?;

        if read == 0 {
            return Ok(None);
        }

        self.line_count.set(self.line_count.get() + 1);
        Ok(Some(bytes))
    }

    fn read_line(&self) -> Result<Option<String>, BatchError> {
        let Some(bytes) = self.read_raw_line()? else {
            return Ok(None);
        };

        let mut line = String::from_utf8(bytes).map_err(|e| {
            BatchError::ItemReader(format!(
                "{}: line {} is not valid UTF-8: {}",
                self.resource,
                self.line_count.get(),
                e
            ))
        })?;

        let content_len = line.trim_end_matches(['\n', '\r']).len();
        line.truncate(content_len);
        Ok(Some(line))
    }

    fn is_comment(&self, line: &str) -> bool {
        self.comments.iter().any(|prefix| line.starts_with(prefix))
    }
}

impl<R: BufRead, T, M: LineMapper<T>> ItemReader<T> for FlatFileItemReader<R, M> {
    fn read(&self) -> ItemReaderResult<T> {
        while let Some(line) = self.read_line()? {
            if self.is_comment(&line) {
                continue;
            }

            let line_number = self.line_count.get();
            return match self.line_mapper.map_line(&line, line_number) {
                Ok(item) => Ok(Some(item)),
                Err(source) => Err(BatchError::FlatFileParse {
                    resource: self.resource.clone(),
                    line_number,
                    input: line,
                    source: Box::new(source),
                }),
            };
        }

        Ok(None)
    }
}

/// Builder for [`FlatFileItemReader`].
///
/// Default configuration: lines starting with `#` are comments, the resource
/// is named after the path it was opened from (or `"reader"`).
pub struct FlatFileItemReaderBuilder<M> {
    line_mapper: M,
    name: Option<String>,
    comments: Vec<String>,
}

impl<M> FlatFileItemReaderBuilder<M> {
    pub fn new(line_mapper: M) -> Self {
        Self {
            line_mapper,
            name: None,
            comments: vec![DEFAULT_COMMENT_PREFIX.to_string()],
        }
    }

    pub fn name(mut self, name: String) -> Self {
        self.name = Some(name);
        self
    }

    /// Replaces the comment prefixes. An empty list disables comments.
    pub fn comments(mut self, comments: Vec<String>) -> Self {
        self.comments = comments;
        self
    }

    pub fn from_reader<R: BufRead>(self, input: R) -> FlatFileItemReader<R, M> {
        FlatFileItemReader {
            resource: self.name.unwrap_or_else(|| "reader".to_string()),
            input: RefCell::new(input),
            line_mapper: self.line_mapper,
            comments: self.comments,
            line_count: Cell::new(0),
        }
    }

    pub fn from_path<P: AsRef<Path>>(
        mut self,
        path: P,
    ) -> Result<FlatFileItemReader<BufReader<File>, M>, BatchError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            BatchError::ItemReader(format!("unable to open {}: {}", path.display(), e))
        })?;

        if self.name.is_none() {
            self.name = Some(path.display().to_string());
        }

        Ok(self.from_reader(BufReader::new(file)))
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::FlatFileItemReaderBuilder;
    use crate::{
        BatchError,
        core::item::ItemReader,
        item::flat::{DelimitedLineMapper, FieldSetMapper},
    };

    #[derive(Debug, PartialEq)]
    struct Code(String, String);

    impl FieldSetMapper for Code {
        const NAMES: &'static [&'static str] = &["key", "label"];

        fn map_field_set(fields: &[&str]) -> Self {
            Code(fields[0].to_string(), fields[1].to_string())
        }
    }

    fn mapper() -> DelimitedLineMapper<Code> {
        DelimitedLineMapper::default()
    }

    #[test]
    fn reads_every_line_in_order() {
        let reader =
            FlatFileItemReaderBuilder::new(mapper()).from_reader("a|1\r\nb|2\nc|3".as_bytes());

        let mut codes: Vec<Code> = Vec::new();
        while let Some(code) = reader.read().unwrap() {
            codes.push(code);
        }

        assert_eq!(
            codes,
            vec![
                Code("a".into(), "1".into()),
                Code("b".into(), "2".into()),
                Code("c".into(), "3".into())
            ]
        );
        assert_eq!(reader.line_count(), 3);
    }

    #[test]
    fn comments_are_counted_but_not_mapped() {
        let reader = FlatFileItemReaderBuilder::new(mapper())
            .from_reader("# codes\n# more\na|1\n#\nb|2\n".as_bytes());

        assert_eq!(reader.read().unwrap(), Some(Code("a".into(), "1".into())));
        assert_eq!(reader.line_count(), 3);
        assert_eq!(reader.read().unwrap(), Some(Code("b".into(), "2".into())));
        assert_eq!(reader.line_count(), 5);
        assert_eq!(reader.read().unwrap(), None::<Code>);
    }

    #[test]
    fn blank_line_is_a_parse_error() {
        let reader =
            FlatFileItemReaderBuilder::new(mapper()).from_reader("a|1\n   \nb|2\n".as_bytes());

        let _: Option<Code> = reader.read().unwrap();
        let error = ItemReader::<Code>::read(&reader).unwrap_err();

        match error {
            BatchError::FlatFileParse {
                line_number,
                source,
                ..
            } => {
                assert_eq!(line_number, 2);
                assert!(matches!(
                    *source,
                    BatchError::IncorrectTokenCount {
                        expected: 2,
                        actual: 1
                    }
                ));
            }
            other => panic!("unexpected error: {}", other),
        }
        assert_eq!(reader.read().unwrap(), Some(Code("b".into(), "2".into())));
    }

    #[test]
    fn parse_error_reports_resource_and_line() {
        let reader = FlatFileItemReaderBuilder::new(mapper())
            .name("codes.txt".to_string())
            .from_reader("a|1\nb\n".as_bytes());

        let _: Option<Code> = reader.read().unwrap();
        let error = ItemReader::<Code>::read(&reader).unwrap_err();

        match error {
            BatchError::FlatFileParse {
                resource,
                line_number,
                input,
                source,
            } => {
                assert_eq!(resource, "codes.txt");
                assert_eq!(line_number, 2);
                assert_eq!(input, "b");
                assert!(matches!(
                    *source,
                    BatchError::IncorrectTokenCount {
                        expected: 2,
                        actual: 1
                    }
                ));
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn skip_lines_stops_at_end_of_input() {
        let reader =
            FlatFileItemReaderBuilder::new(mapper()).from_reader("a|1\nb|2\nc|3\n".as_bytes());

        assert_eq!(reader.skip_lines(2).unwrap(), 2);
        assert_eq!(reader.read().unwrap(), Some(Code("c".into(), "3".into())));
        assert_eq!(reader.skip_lines(5).unwrap(), 0);
    }

    #[test]
    fn skip_lines_passes_over_invalid_utf8() {
        let bytes: &[u8] = b"a|1\n\xff\xfe\nb|2\n";
        let reader = FlatFileItemReaderBuilder::new(mapper()).from_reader(bytes);

        assert_eq!(reader.skip_lines(2).unwrap(), 2);
        assert_eq!(reader.read().unwrap(), Some(Code("b".into(), "2".into())));
    }

    #[test]
    fn invalid_utf8_is_a_read_error() {
        let bytes: &[u8] = &[b'a', b'|', 0xff, 0xfe, b'\n'];
        let reader = FlatFileItemReaderBuilder::new(mapper()).from_reader(bytes);

        let result: Result<Option<Code>, BatchError> = reader.read();

        assert!(matches!(result, Err(BatchError::ItemReader(_))));
    }

    #[test]
    fn invalid_utf8_line_is_counted_as_consumed() {
        let bytes: &[u8] = b"a|1\n\xff\xfe\nb|2\n";
        let reader = FlatFileItemReaderBuilder::new(mapper()).from_reader(bytes);

        assert_eq!(reader.read().unwrap(), Some(Code("a".into(), "1".into())));
        assert!(ItemReader::<Code>::read(&reader).is_err());
        assert_eq!(reader.line_count(), 2);
        assert_eq!(reader.read().unwrap(), Some(Code("b".into(), "2".into())));
        assert_eq!(reader.line_count(), 3);
    }

    #[test]
    fn from_path_names_resource_after_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("codes.txt");
        fs::write(&path, "a|1\n").unwrap();

        let reader = FlatFileItemReaderBuilder::new(mapper()).from_path(&path).unwrap();

        assert_eq!(reader.resource(), path.display().to_string());
        assert_eq!(reader.read().unwrap(), Some(Code("a".into(), "1".into())));
    }

    #[test]
    fn from_path_fails_on_missing_file() {
        let dir = tempdir().unwrap();

        let result =
            FlatFileItemReaderBuilder::new(mapper()).from_path(dir.path().join("missing.txt"));

        assert!(matches!(result, Err(BatchError::ItemReader(_))));
    }
}
