use super::super::run::AllocationRun;

/// Downstream consumer of finished runs (report directory, archive, mail-out).
pub trait ReportPublisher: Send + Sync {
    fn publish(&self, run: &AllocationRun) -> Result<(), PublishError>;
}

#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("failed to write report: {0}")]
    Io(#[from] std::io::Error),
    #[error("report sink unavailable: {0}")]
    Unavailable(String),
}
