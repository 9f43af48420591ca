use std::{
    cell::{Cell, RefCell},
    fs::File,
    io::BufReader,
    path::PathBuf,
};

use log::{debug, info};

use crate::{
    core::{
        cursor::ReadCursor,
        item::{ItemReader, ItemReaderResult},
    },
    error::BatchError,
};

use super::{
    DEFAULT_COMMENT_PREFIX, LineMapper,
    flat_file_reader::{FlatFileItemReader, FlatFileItemReaderBuilder},
};

/// Reads a list of flat files as one stream of items.
///
/// Files are opened lazily, in list order, and each is read to its end before
/// the next one is opened. The reader never reads ahead, so [`cursor`] always
/// points just after the last item returned, which makes it safe to persist
/// after a chunk commit and to hand back to [`open`] on restart.
///
/// [`cursor`]: ItemReader::cursor
/// [`open`]: ItemReader::open
pub struct MultiResourceItemReader<M> {
    resources: Vec<PathBuf>,
    line_mapper: M,
    comments: Vec<String>,
    current: RefCell<Option<FlatFileItemReader<BufReader<File>, M>>>,
    resource_index: Cell<usize>,
    /// Lines to skip in the next opened resource, set when restarting.
    pending_skip: Cell<usize>,
}

impl<M: Clone> MultiResourceItemReader<M> {
    pub fn resources(&self) -> &[PathBuf] {
        &self.resources
    }

    fn open_resource(
        &self,
        index: usize,
    ) -> Result<FlatFileItemReader<BufReader<File>, M>, BatchError> {
        let path = &self.resources[index];
        info!("Reading resource #{}: {}", index, path.display());

        let reader = FlatFileItemReaderBuilder::new(self.line_mapper.clone())
            .comments(self.comments.clone())
            .from_path(path)?;

        let skip = self.pending_skip.replace(0);
        if skip > 0 {
            let skipped = reader.skip_lines(skip)?;
            debug!("Resumed {} after {} lines", path.display(), skipped);
        }

        Ok(reader)
    }
}

impl<T, M: LineMapper<T> + Clone> ItemReader<T> for MultiResourceItemReader<M> {
    fn read(&self) -> ItemReaderResult<T> {
        loop {
            let index = self.resource_index.get();
            if index >= self.resources.len() {
                return Ok(None);
            }

            let mut current = self.current.borrow_mut();
            if current.is_none() {
                match self.open_resource(index) {
                    Ok(reader) => *current = Some(reader),
                    Err(err) => {
                        // A skipped failure moves on to the next resource.
                        self.resource_index.set(index + 1);
                        self.pending_skip.set(0);
                        return Err(err);
                    }
                }
            }

            let item = match current.as_ref() {
                Some(reader) => ItemReader::<T>::read(reader)?,
                None => None,
            };

            match item {
                Some(item) => return Ok(Some(item)),
                None => {
                    debug!("End of resource #{}", index);
                    *current = None;
                    self.resource_index.set(index + 1);
                }
            }
        }
    }

    fn open(&self, cursor: Option<&ReadCursor>) -> Result<(), BatchError> {
        *self.current.borrow_mut() = None;

        match cursor {
            Some(cursor) => {
                if cursor.file_index > self.resources.len() {
                    return Err(BatchError::Restart(format!(
                        "cursor points to resource #{} but only {} resources were selected",
                        cursor.file_index,
                        self.resources.len()
                    )));
                }
                self.resource_index.set(cursor.file_index);
                self.pending_skip.set(cursor.line_offset);
            }
            None => {
                self.resource_index.set(0);
                self.pending_skip.set(0);
            }
        }

        Ok(())
    }

    fn cursor(&self) -> Option<ReadCursor> {
        let line_offset = match self.current.borrow().as_ref() {
            Some(reader) => reader.line_count(),
            None => self.pending_skip.get(),
        };
        Some(ReadCursor::new(self.resource_index.get(), line_offset))
    }

    fn close(&self) -> Result<(), BatchError> {
        *self.current.borrow_mut() = None;
        Ok(())
    }
}

/// Builder for [`MultiResourceItemReader`].
pub struct MultiResourceItemReaderBuilder<M> {
    line_mapper: M,
    resources: Vec<PathBuf>,
    comments: Vec<String>,
}

impl<M> MultiResourceItemReaderBuilder<M> {
    pub fn new(line_mapper: M) -> Self {
        Self {
            line_mapper,
            resources: Vec::new(),
            comments: vec![DEFAULT_COMMENT_PREFIX.to_string()],
        }
    }

    pub fn resources(mut self, resources: Vec<PathBuf>) -> Self {
        self.resources = resources;
        self
    }

    pub fn comments(mut self, comments: Vec<String>) -> Self {
        self.comments = comments;
        self
    }

    pub fn build(self) -> MultiResourceItemReader<M> {
        MultiResourceItemReader {
            resources: self.resources,
            line_mapper: self.line_mapper,
            comments: self.comments,
            current: RefCell::new(None),
            resource_index: Cell::new(0),
            pending_skip: Cell::new(0),
        }
    }
}
