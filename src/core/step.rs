use std::{
    cell::Cell,
    sync::atomic::{AtomicBool, Ordering},
    time::{Duration, Instant},
};

use log::{debug, error, info, warn};
use uuid::Uuid;

use crate::BatchError;

use super::{
    build_name,
    chunk::{Chunk, ChunkStatus},
    cursor::CursorRepository,
    item::{ItemReader, ItemWriter},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    /// Built but not executed yet.
    Starting,
    /// Reading and writing chunks.
    Started,
    /// The reader was exhausted and every chunk was written.
    Success,
    /// A read or write error exceeded the skip limit.
    Failed,
    /// A stop was requested between two chunks.
    Stopped,
}

/// Summary of one step execution.
#[derive(Debug, Clone)]
pub struct StepExecution {
    pub id: Uuid,
    pub name: String,
    pub status: StepStatus,
    pub start: Instant,
    pub end: Instant,
    pub duration: Duration,
    /// Number of items successfully read
    pub read_count: usize,
    /// Number of items successfully written
    pub write_count: usize,
    pub read_error_count: usize,
    pub write_error_count: usize,
}

pub trait Step {
    /// Executes the step.
    ///
    /// # Returns
    /// - `Ok(StepExecution)` when the step succeeded or was stopped
    /// - `Err(BatchError::Step)` wrapping the error that failed the step
    fn execute(&self) -> Result<StepExecution, BatchError>;

    fn get_name(&self) -> &str;
}

/// Chunk-oriented step: reads items until a chunk is full, writes the chunk,
/// records the reader position, and repeats until the reader is exhausted.
///
/// Items flow from reader to writer unchanged.
pub struct StepInstance<'a, T> {
    id: Uuid,
    name: String,
    reader: &'a dyn ItemReader<T>,
    writer: &'a dyn ItemWriter<T>,
    cursor_repository: Option<&'a dyn CursorRepository>,
    stop_signal: Option<&'a AtomicBool>,
    chunk_size: usize,
    skip_limit: usize,
    status: Cell<StepStatus>,
    read_count: Cell<usize>,
    write_count: Cell<usize>,
    read_error_count: Cell<usize>,
    write_error_count: Cell<usize>,
}

impl<T> Step for StepInstance<'_, T> {
    fn execute(&self) -> Result<StepExecution, BatchError> {
        let start = Instant::now();

        info!("Start of step: {}, id: {}", self.name, self.id);

        self.reset_counters();
        self.status.set(StepStatus::Started);

        let outcome = self.open().and_then(|_| self.process_chunks());
        let closed = self.close();
        let outcome = outcome.and_then(|status| closed.map(|_| status));

        match outcome {
            Ok(status) => {
                self.status.set(status);
                info!(
                    "End of step: {}, id: {}, status: {:?}, read: {}, written: {}",
                    self.name,
                    self.id,
                    status,
                    self.get_read_count(),
                    self.get_write_count()
                );

                Ok(StepExecution {
                    id: self.id,
                    name: self.name.clone(),
                    status,
                    start,
                    end: Instant::now(),
                    duration: start.elapsed(),
                    read_count: self.get_read_count(),
                    write_count: self.get_write_count(),
                    read_error_count: self.get_read_error_count(),
                    write_error_count: self.get_write_error_count(),
                })
            }
            Err(err) => {
                self.status.set(StepStatus::Failed);
                error!("Step {} failed: {}", self.name, err);

                Err(BatchError::Step {
                    name: self.name.clone(),
                    source: Box::new(err),
                })
            }
        }
    }

    fn get_name(&self) -> &str {
        &self.name
    }
}

impl<T> StepInstance<'_, T> {
    pub fn get_status(&self) -> StepStatus {
        self.status.get()
    }

    pub fn get_read_count(&self) -> usize {
        self.read_count.get()
    }

    pub fn get_write_count(&self) -> usize {
        self.write_count.get()
    }

    pub fn get_read_error_count(&self) -> usize {
        self.read_error_count.get()
    }

    pub fn get_write_error_count(&self) -> usize {
        self.write_error_count.get()
    }

    fn open(&self) -> Result<(), BatchError> {
        let cursor = match self.cursor_repository {
            Some(repository) => repository.load()?,
            None => None,
        };

        if let Some(cursor) = &cursor {
            info!(
                "Restarting step {} from file #{} line {}",
                self.name, cursor.file_index, cursor.line_offset
            );
        }

        self.reader.open(cursor.as_ref())?;
        self.writer.open()
    }

    fn close(&self) -> Result<(), BatchError> {
        let reader_closed = self.reader.close();
        let writer_closed = self.writer.close();
        reader_closed.and(writer_closed)
    }

    fn process_chunks(&self) -> Result<StepStatus, BatchError> {
        let mut chunk = Chunk::new(self.chunk_size);

        loop {
            if self.is_stop_requested() {
                warn!("Stop requested, step {} ends before next chunk", self.name);
                return Ok(StepStatus::Stopped);
            }

            chunk.clear();
            self.read_chunk(&mut chunk)?;

            if !chunk.is_empty() {
                self.write_chunk(chunk.get_items())?;
            }

            if chunk.get_status() == &ChunkStatus::Finished {
                if let Some(repository) = self.cursor_repository {
                    repository.clear()?;
                }
                return Ok(StepStatus::Success);
            }

            self.save_cursor()?;
        }
    }

    fn read_chunk(&self, chunk: &mut Chunk<T>) -> Result<(), BatchError> {
        debug!("Start reading chunk");

        loop {
            if let Err(err) = chunk.add_item(self.reader.read()) {
                self.read_error_count.set(self.read_error_count.get() + 1);

                if self.is_skip_limit_reached() {
                    return Err(err);
                }
                warn!("Skipping item after read error: {}", err);
            }

            match chunk.get_status() {
                ChunkStatus::Full => {
                    debug!("End reading chunk: FULL");
                    break;
                }
                ChunkStatus::Finished => {
                    debug!("End reading chunk: FINISHED");
                    break;
                }
                ChunkStatus::Continuable | ChunkStatus::Error => {}
            }
        }

        self.read_count.set(self.read_count.get() + chunk.len());
        Ok(())
    }

    fn write_chunk(&self, items: &[T]) -> Result<(), BatchError> {
        debug!("Start writing chunk of {} items", items.len());

        match self.writer.write(items).and_then(|_| self.writer.flush()) {
            Ok(()) => {
                self.write_count.set(self.write_count.get() + items.len());
                debug!("End writing chunk");
                Ok(())
            }
            Err(err) => {
                self.write_error_count
                    .set(self.write_error_count.get() + items.len());

                if self.is_skip_limit_reached() {
                    return Err(err);
                }
                warn!("Skipping {} items after write error: {}", items.len(), err);
                Ok(())
            }
        }
    }

    fn save_cursor(&self) -> Result<(), BatchError> {
        if let (Some(repository), Some(cursor)) = (self.cursor_repository, self.reader.cursor()) {
            repository.save(&cursor)?;
        }
        Ok(())
    }

    fn is_skip_limit_reached(&self) -> bool {
        self.read_error_count.get() + self.write_error_count.get() > self.skip_limit
    }

    fn is_stop_requested(&self) -> bool {
        self.stop_signal
            .map(|signal| signal.load(Ordering::SeqCst))
            .unwrap_or(false)
    }

    fn reset_counters(&self) {
        self.read_count.set(0);
        self.write_count.set(0);
        self.read_error_count.set(0);
        self.write_error_count.set(0);
    }
}

/// Builder for [`StepInstance`].
///
/// Defaults: a random name, a chunk size of 1, a skip limit of 0 (the first
/// error fails the step), no cursor persistence and no stop signal.
pub struct StepBuilder<'a, T> {
    name: Option<String>,
    reader: Option<&'a dyn ItemReader<T>>,
    writer: Option<&'a dyn ItemWriter<T>>,
    cursor_repository: Option<&'a dyn CursorRepository>,
    stop_signal: Option<&'a AtomicBool>,
    chunk_size: usize,
    skip_limit: usize,
}

impl<T> Default for StepBuilder<'_, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, T> StepBuilder<'a, T> {
    pub fn new() -> Self {
        Self {
            name: None,
            reader: None,
            writer: None,
            cursor_repository: None,
            stop_signal: None,
            chunk_size: 1,
            skip_limit: 0,
        }
    }

    pub fn name(mut self, name: String) -> Self {
        self.name = Some(name);
        self
    }

    pub fn reader(mut self, reader: &'a dyn ItemReader<T>) -> Self {
        self.reader = Some(reader);
        self
    }

    pub fn writer(mut self, writer: &'a dyn ItemWriter<T>) -> Self {
        self.writer = Some(writer);
        self
    }

    /// Sets the commit interval.
    pub fn chunk(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn skip_limit(mut self, skip_limit: usize) -> Self {
        self.skip_limit = skip_limit;
        self
    }

    /// Persists the reader position after each committed chunk and resumes
    /// from it on the next execution.
    pub fn cursor_repository(mut self, repository: &'a dyn CursorRepository) -> Self {
        self.cursor_repository = Some(repository);
        self
    }

    /// Flag checked between chunks; once raised the step stops.
    pub fn stop_signal(mut self, stop_signal: &'a AtomicBool) -> Self {
        self.stop_signal = Some(stop_signal);
        self
    }

    pub fn build(self) -> Result<StepInstance<'a, T>, BatchError> {
        let reader = self
            .reader
            .ok_or_else(|| BatchError::Configuration("step reader is mandatory".to_string()))?;
        let writer = self
            .writer
            .ok_or_else(|| BatchError::Configuration("step writer is mandatory".to_string()))?;

        if self.chunk_size == 0 {
            return Err(BatchError::Configuration(
                "chunk size must be greater than 0".to_string(),
            ));
        }

        Ok(StepInstance {
            id: Uuid::new_v4(),
            name: self.name.unwrap_or_else(build_name),
            reader,
            writer,
            cursor_repository: self.cursor_repository,
            stop_signal: self.stop_signal,
            chunk_size: self.chunk_size,
            skip_limit: self.skip_limit,
            status: Cell::new(StepStatus::Starting),
            read_count: Cell::new(0),
            write_count: Cell::new(0),
            read_error_count: Cell::new(0),
            write_error_count: Cell::new(0),
        })
    }
}
