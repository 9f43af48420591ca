use std::{
    cell::Cell,
    time::{Duration, Instant},
};

use log::{error, info, warn};
use uuid::Uuid;

use crate::BatchError;

use super::{
    build_name,
    step::{Step, StepExecution, StepStatus},
};

/// Type alias for job execution results.
type JobResult<T> = Result<T, BatchError>;

/// Lifecycle of a job instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchStatus {
    /// Status of a job prior to its execution.
    Ready,
    /// Status of a job that is running.
    Running,
    /// The job has successfully completed its execution.
    Completed,
    /// A step failed; the remaining steps were not executed.
    Failed,
    /// A step was stopped on request.
    Stopped,
}

/// Represents a job that can be executed.
///
/// A job is a container for a sequence of steps that are executed in order.
pub trait Job {
    /// Runs the job and returns the result of the job execution.
    ///
    /// # Returns
    /// - `Ok(JobExecution)` when every step succeeded, or a step was stopped
    /// - `Err(BatchError)` with the error of the first failing step
    fn run(&self) -> JobResult<JobExecution>;
}

/// Represents the execution of a job.
#[derive(Debug)]
pub struct JobExecution {
    pub id: Uuid,
    pub name: String,
    pub status: BatchStatus,
    /// The time when the job started executing
    pub start: Instant,
    /// The time when the job finished executing
    pub end: Instant,
    /// The total duration of the job execution
    pub duration: Duration,
    /// Items read across all steps
    pub read_count: usize,
    /// Items written across all steps
    pub write_count: usize,
    pub steps: Vec<StepExecution>,
}

/// Represents an instance of a job: an identifier, a name and the steps to
/// execute in order.
pub struct JobInstance<'a> {
    id: Uuid,
    name: String,
    steps: Vec<&'a dyn Step>,
    status: Cell<BatchStatus>,
}

impl JobInstance<'_> {
    pub fn get_status(&self) -> BatchStatus {
        self.status.get()
    }

    pub fn get_name(&self) -> &str {
        &self.name
    }
}

impl Job for JobInstance<'_> {
    /// Runs the job by executing its steps in sequence.
    ///
    /// The first failing step aborts the job: its error is returned and the
    /// job status becomes `Failed`. A stopped step ends the job as `Stopped`
    /// without running the following steps.
    fn run(&self) -> JobResult<JobExecution> {
        let start = Instant::now();

        info!("Start of job: {}, id: {}", self.name, self.id);
        self.status.set(BatchStatus::Running);

        let mut executions = Vec::with_capacity(self.steps.len());
        let mut status = BatchStatus::Completed;

        for step in &self.steps {
            match step.execute() {
                Ok(execution) => {
                    let stopped = execution.status == StepStatus::Stopped;
                    executions.push(execution);

                    if stopped {
                        warn!("Job {} stopped during step {}", self.name, step.get_name());
                        status = BatchStatus::Stopped;
                        break;
                    }
                }
                Err(err) => {
                    self.status.set(BatchStatus::Failed);
                    error!("Job {} failed, id: {}", self.name, self.id);
                    return Err(err);
                }
            }
        }

        self.status.set(status);

        let read_count = executions.iter().map(|e| e.read_count).sum();
        let write_count = executions.iter().map(|e| e.write_count).sum();

        info!(
            "End of job: {}, id: {}, status: {:?}, read: {}, written: {}",
            self.name, self.id, status, read_count, write_count
        );

        Ok(JobExecution {
            id: self.id,
            name: self.name.clone(),
            status,
            start,
            end: Instant::now(),
            duration: start.elapsed(),
            read_count,
            write_count,
            steps: executions,
        })
    }
}

/// Builder for creating a job instance.
#[derive(Default)]
pub struct JobBuilder<'a> {
    /// Optional name for the job (generated randomly if not specified)
    name: Option<String>,
    /// Collection of steps to be executed, in order
    steps: Vec<&'a dyn Step>,
}

impl<'a> JobBuilder<'a> {
    pub fn new() -> Self {
        Self {
            name: None,
            steps: Vec::new(),
        }
    }

    pub fn name(mut self, name: String) -> JobBuilder<'a> {
        self.name = Some(name);
        self
    }

    /// Sets the first step of the job.
    ///
    /// Semantically identical to `next()`, reads better for the initial step.
    pub fn start(mut self, step: &'a dyn Step) -> JobBuilder<'a> {
        self.steps.push(step);
        self
    }

    pub fn next(mut self, step: &'a dyn Step) -> JobBuilder<'a> {
        self.steps.push(step);
        self
    }

    /// Builds a `JobInstance`; a random name is generated when none was given.
    pub fn build(self) -> JobInstance<'a> {
        JobInstance {
            id: Uuid::new_v4(),
            name: self.name.unwrap_or_else(build_name),
            steps: self.steps,
            status: Cell::new(BatchStatus::Ready),
        }
    }
}
