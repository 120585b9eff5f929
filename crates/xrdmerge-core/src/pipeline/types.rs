use std::path::PathBuf;

/// Pipeline processing stage, used for progress reporting.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MergeStage {
    Discovering,
    Loading,
    Merging,
    Writing,
    Rendering,
}

impl std::fmt::Display for MergeStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Discovering => write!(f, "Discovering files"),
            Self::Loading => write!(f, "Reading frames"),
            Self::Merging => write!(f, "Merging"),
            Self::Writing => write!(f, "Writing output"),
            Self::Rendering => write!(f, "Rendering"),
        }
    }
}

/// Thread-safe progress reporting.
///
/// Implementors can use this to drive progress bars, logging, or any other
/// UI feedback. All methods have default no-op implementations.
pub trait ProgressReporter: Send + Sync {
    /// A new stage has started. `total_items` is the number of work items
    /// in this stage (e.g., frame count), if known.
    fn begin_stage(&self, _stage: MergeStage, _total_items: Option<usize>) {}

    /// One more work item within the current stage has completed.
    /// `items_done` is the running count for the stage.
    fn advance(&self, _items_done: usize) {}

    /// The current stage is finished.
    fn finish_stage(&self) {}

    /// The sequence does not divide evenly into windows; the trailing
    /// `leftover` frames form a final, smaller window.
    fn partial_window(&self, _leftover: usize, _window: usize) {}
}

/// Reporter that ignores every notification.
pub struct NoOpReporter;
impl ProgressReporter for NoOpReporter {}

/// What a completed merge run produced.
#[derive(Clone, Debug)]
pub struct MergeReport {
    pub output: PathBuf,
    pub frames_merged: usize,
    /// Number of windows written, `None` when the whole range was merged at once.
    pub windows: Option<usize>,
    pub frame_shape: (usize, usize),
}
