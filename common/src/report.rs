use serde::Serialize;
use std::fmt;

#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StageStatus {
    Ok,
    Failed,
}

/// Outcome of one step of an operation
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct StageResult {
    pub step: String,
    pub status: StageStatus,
    pub message: String,
}

impl fmt::Display for StageResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mark = match self.status {
            StageStatus::Ok => "OK",
            StageStatus::Failed => "FAILED",
        };
        write!(f, "[{mark}] {}: {}", self.step, self.message)
    }
}

/// Accumulated outcome of a multi-step operation.
///
/// A report is returned by value from every call, failed steps are recorded
/// and the operation decides on its own whether to continue.
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct Report {
    pub operation: String,
    pub steps: Vec<StageResult>,
    /// Set when a fatal step stopped the sequence
    pub aborted: bool,
}

impl Report {
    pub fn new(operation: &str) -> Report {
        Report {
            operation: operation.to_string(),
            steps: Vec::new(),
            aborted: false,
        }
    }

    pub fn ok(&mut self, step: &str, message: impl Into<String>) {
        let result = StageResult {
            step: step.to_string(),
            status: StageStatus::Ok,
            message: message.into(),
        };
        tracing::info!("{result}");
        self.steps.push(result);
    }

    pub fn failed(&mut self, step: &str, message: impl Into<String>) {
        let result = StageResult {
            step: step.to_string(),
            status: StageStatus::Failed,
            message: message.into(),
        };
        tracing::error!("{result}");
        self.steps.push(result);
    }

    /// Record a failure that stops the operation
    pub fn abort(&mut self, step: &str, message: impl Into<String>) {
        self.failed(step, message);
        self.aborted = true;
    }

    pub fn status(&self) -> StageStatus {
        if self.is_ok() {
            StageStatus::Ok
        } else {
            StageStatus::Failed
        }
    }

    pub fn is_ok(&self) -> bool {
        !self.aborted && self.steps.iter().all(|s| s.status == StageStatus::Ok)
    }

    pub fn errors(&self) -> Vec<&StageResult> {
        self.steps.iter().filter(|s| s.status == StageStatus::Failed).collect()
    }

    pub fn step(&self, name: &str) -> Option<&StageResult> {
        self.steps.iter().find(|s| s.step == name)
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for step in &self.steps {
            writeln!(f, "{step}")?;
        }
        match self.status() {
            StageStatus::Ok => write!(f, "{} succeeded", self.operation),
            StageStatus::Failed => {
                write!(f, "{} failed with {} error(s)", self.operation, self.errors().len())
            }
        }
    }
}
