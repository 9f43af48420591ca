use crate::error::BatchError;

use super::cursor::ReadCursor;

/// Result of a single `read`: `Ok(None)` signals the end of the stream.
pub type ItemReaderResult<R> = Result<Option<R>, BatchError>;

/// Result of writing one chunk.
pub type ItemWriterResult = Result<(), BatchError>;

/// Retrieves the input of a step, one item at a time.
///
/// Readers use interior mutability so that a step can hold them behind a
/// shared reference while it drives the read loop.
pub trait ItemReader<R> {
    /// Reads the next item, or `Ok(None)` once the input is exhausted.
    fn read(&self) -> ItemReaderResult<R>;

    /// Positions the reader before the first read.
    ///
    /// A restartable reader resumes at `cursor` when one is given. The default
    /// implementation ignores it.
    fn open(&self, _cursor: Option<&ReadCursor>) -> Result<(), BatchError> {
        Ok(())
    }

    /// Current position of a restartable reader, `None` for readers that
    /// cannot be restarted.
    fn cursor(&self) -> Option<ReadCursor> {
        None
    }

    fn close(&self) -> Result<(), BatchError> {
        Ok(())
    }
}

/// Output side of a step, receiving one chunk at a time.
pub trait ItemWriter<W> {
    /// Writes a whole chunk. When this returns `Ok`, the chunk is durable.
    fn write(&self, items: &[W]) -> ItemWriterResult;

    fn flush(&self) -> ItemWriterResult {
        Ok(())
    }

    fn open(&self) -> ItemWriterResult {
        Ok(())
    }

    fn close(&self) -> ItemWriterResult {
        Ok(())
    }
}
