//! Job trait and related types

use std::fmt;

/// A unit of work executed by exactly one worker of the pool.
///
/// Any failure inside `execute` belongs to the job itself: the pool only
/// observes that the job ran.
pub trait Job: Send {
    /// Execute the job
    fn execute(&mut self);

    /// Get the job's type name for debugging and statistics
    fn job_type(&self) -> &str {
        "Job"
    }
}

impl fmt::Debug for dyn Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Job({})", self.job_type())
    }
}

/// A boxed job that can be sent across threads
pub type BoxedJob = Box<dyn Job>;

/// Helper to create a job from a closure
pub struct ClosureJob<F>
where
    F: FnOnce() + Send,
{
    closure: Option<F>,
    name: String,
}

impl<F> ClosureJob<F>
where
    F: FnOnce() + Send,
{
    /// Create a new closure job
    pub fn new(closure: F) -> Self {
        Self {
            closure: Some(closure),
            name: "ClosureJob".to_string(),
        }
    }

    /// Create a new closure job with a custom name
    pub fn with_name<S: Into<String>>(closure: F, name: S) -> Self {
        Self {
            closure: Some(closure),
            name: name.into(),
        }
    }
}

impl<F> Job for ClosureJob<F>
where
    F: FnOnce() + Send,
{
    fn execute(&mut self) {
        match self.closure.take() {
            Some(closure) => closure(),
            None => log::warn!("{} already executed, ignoring second run", self.name),
        }
    }

    fn job_type(&self) -> &str {
        &self.name
    }
}
