use crate::job::CompletionEvent;

/// Messages from background tasks to the main UI thread
#[derive(Debug)]
pub enum BackgroundMessage {
    /// The supervisor finished a job (any outcome).
    JobCompleted(CompletionEvent),
    /// A background task died before it could report.
    Error(String),
}
