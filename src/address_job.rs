//! The address import job: every address file of the source directory is
//! read line by line and inserted into the address table.
//!
//! The job has a single chunk-oriented step:
//!
//! ```text
//! select_resources ──► MultiResourceItemReader ──► StepInstance ──► ItemWriter
//!   (prefix/suffix)     (DelimitedLineMapper)      (chunk, skip,     (MySQL in
//!                                                   cursor, stop)     production)
//! ```

use std::sync::atomic::AtomicBool;

use log::info;

use crate::{
    BatchError,
    config::BatchConfig,
    core::{
        cursor::JsonFileCursorRepository,
        item::ItemWriter,
        job::{Job, JobBuilder, JobExecution},
        step::StepBuilder,
    },
    item::{
        address::AddressRecord,
        flat::{
            DelimitedLineMapper,
            multi_resource_reader::{MultiResourceItemReader, MultiResourceItemReaderBuilder},
            resource::{FileNameFilter, select_resources},
        },
    },
};

/// Name of the job, as it appears in the logs.
pub const JOB_NAME: &str = "stepAddressJob";

/// Name of the single step of the job.
pub const STEP_NAME: &str = "start_step";

/// Builds the reader over the address files of `config.source_dir`.
///
/// Files are selected once, when the reader is built; a directory with no
/// matching file gives a reader with nothing to read.
pub fn address_reader(
    config: &BatchConfig,
) -> MultiResourceItemReader<DelimitedLineMapper<AddressRecord>> {
    let filter = FileNameFilter::new(&config.file_prefix, &config.file_suffix);
    let resources = select_resources(&config.source_dir, &filter);

    info!(
        "{} address file(s) selected in {}",
        resources.len(),
        config.source_dir.display()
    );

    MultiResourceItemReaderBuilder::new(DelimitedLineMapper::<AddressRecord>::default())
        .resources(resources)
        .build()
}

/// Runs the address import job, writing the records with `writer`.
///
/// When `config.cursor_path` is set the position of the last committed chunk
/// is kept in that file, so a failed or stopped run resumes where it left
/// off. `stop` is checked between chunks.
///
/// # Returns
///
/// - `Ok(JobExecution)` with status `Completed`, or `Stopped` when `stop` was
///   raised
/// - `Err(BatchError::Step)` when the step failed; chunks committed before
///   the failure stay in the table
pub fn run_address_job(
    config: &BatchConfig,
    writer: &dyn ItemWriter<AddressRecord>,
    stop: Option<&AtomicBool>,
) -> Result<JobExecution, BatchError> {
    config.validate()?;

    let reader = address_reader(config);
    let repository = config.cursor_path.as_ref().map(JsonFileCursorRepository::new);

    let mut builder = StepBuilder::<AddressRecord>::new()
        .name(STEP_NAME.to_string())
        .reader(&reader)
        .writer(writer)
        .chunk(config.chunk_size)
        .skip_limit(config.skip_limit);

    if let Some(repository) = &repository {
        builder = builder.cursor_repository(repository);
    }
    if let Some(stop) = stop {
        builder = builder.stop_signal(stop);
    }

    let step = builder.build()?;

    let job = JobBuilder::new()
        .name(JOB_NAME.to_string())
        .start(&step)
        .build();

    job.run()
}
