use crate::{BatchError, core::item::ItemReaderResult};

#[derive(Debug, PartialEq)]
pub enum ChunkStatus {
    Continuable,
    Error,
    Finished,
    Full,
}

/// Ordered batch of items collected between two commits.
pub struct Chunk<R> {
    items: Vec<R>,
    status: ChunkStatus,
    chunk_size: usize,
}

impl<R> Chunk<R> {
    pub fn new(chunk_size: usize) -> Chunk<R> {
        Chunk {
            items: Vec::with_capacity(chunk_size),
            status: ChunkStatus::Continuable,
            chunk_size,
        }
    }

    /// Records the outcome of one `read` call.
    ///
    /// A failed read leaves the items in place, marks the chunk `Error` and
    /// hands the error back; the caller decides whether it is skippable.
    pub fn add_item(&mut self, read_item: ItemReaderResult<R>) -> Result<(), BatchError> {
        match read_item {
            Ok(Some(item)) => {
                self.items.push(item);
                self.status = if self.items.len() >= self.chunk_size {
                    ChunkStatus::Full
                } else {
                    ChunkStatus::Continuable
                };
                Ok(())
            }
            Ok(None) => {
                self.status = ChunkStatus::Finished;
                Ok(())
            }
            Err(err) => {
                self.status = ChunkStatus::Error;
                Err(err)
            }
        }
    }

    pub fn get_items(&self) -> &[R] {
        &self.items
    }

    pub fn get_status(&self) -> &ChunkStatus {
        &self.status
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn clear(&mut self) {
        self.status = ChunkStatus::Continuable;
        self.items.clear();
    }
}

#[cfg(test)]
mod tests {
    use crate::BatchError;

    use super::{Chunk, ChunkStatus};

    #[test]
    fn chunk_of_one_is_full_after_first_item() {
        let mut chunk: Chunk<u8> = Chunk::new(1);
        chunk.add_item(Ok(Some(7))).unwrap();

        assert_eq!(chunk.get_status(), &ChunkStatus::Full);
        assert_eq!(chunk.get_items(), &[7]);
    }

    #[test]
    fn end_of_stream_finishes_partial_chunk() {
        let mut chunk: Chunk<u8> = Chunk::new(3);
        chunk.add_item(Ok(Some(1))).unwrap();
        assert_eq!(chunk.get_status(), &ChunkStatus::Continuable);

        chunk.add_item(Ok(None)).unwrap();
        assert_eq!(chunk.get_status(), &ChunkStatus::Finished);
        assert_eq!(chunk.len(), 1);
    }

    #[test]
    fn read_error_keeps_items_and_flags_chunk() {
        let mut chunk: Chunk<u8> = Chunk::new(3);
        chunk.add_item(Ok(Some(1))).unwrap();
        let result = chunk.add_item(Err(BatchError::ItemReader("boom".to_string())));

        assert!(matches!(result, Err(BatchError::ItemReader(_))));
        assert_eq!(chunk.get_status(), &ChunkStatus::Error);
        assert_eq!(chunk.len(), 1);

        chunk.clear();
        assert!(chunk.is_empty());
        assert_eq!(chunk.get_status(), &ChunkStatus::Continuable);
    }
}
