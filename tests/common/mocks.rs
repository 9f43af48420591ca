//! Mock version of an address writer
use mockall::mock;

use address_batch::{
    core::item::{ItemWriter, ItemWriterResult},
    item::address::AddressRecord,
};

mock! {
    pub AddressWriter {}
    impl ItemWriter<AddressRecord> for AddressWriter {
        fn write(&self, items: &[AddressRecord]) -> ItemWriterResult;
        fn flush(&self) -> ItemWriterResult;
        fn open(&self) -> ItemWriterResult;
        fn close(&self) -> ItemWriterResult;
    }
}
