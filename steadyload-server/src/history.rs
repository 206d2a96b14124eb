use crate::ServerError;
use std::sync::{Arc, Mutex};
use steadyload::RunReport;

/// In-memory list of completed run reports, oldest first.
///
/// Cloning yields another handle to the same list. Nothing is persisted across restarts.
#[derive(Clone, Debug, Default)]
pub struct ResultHistory {
    reports: Arc<Mutex<Vec<RunReport>>>,
}

impl ResultHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, report: RunReport) -> Result<(), ServerError> {
        self.reports.lock()?.push(report);
        Ok(())
    }

    pub fn snapshot(&self) -> Result<Vec<RunReport>, ServerError> {
        Ok(self.reports.lock()?.clone())
    }

    pub fn len(&self) -> Result<usize, ServerError> {
        Ok(self.reports.lock()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, ServerError> {
        Ok(self.len()? == 0)
    }
}
