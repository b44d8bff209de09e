/// Incremental progress emitted after every record, success or failure,
/// so the UI can render a bar while a backlog drains.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressUpdate {
    pub done: u32,
    pub total: u32,
    pub label: String,
}

pub type ProgressFn = dyn Fn(ProgressUpdate) + Send + Sync;

pub fn report(progress: Option<&ProgressFn>, done: u32, total: u32, label: &str) {
    if let Some(callback) = progress {
        callback(ProgressUpdate {
            done,
            total,
            label: label.to_string(),
        });
    }
}
