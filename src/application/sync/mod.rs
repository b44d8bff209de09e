mod coordinator;
mod evidence;
mod inspections;
mod notices;
mod photos;
mod progress;
mod retry;
mod routine_activities;
mod syncer;

#[cfg(test)]
pub(crate) mod testing;

pub use coordinator::{SyncCoordinator, SyncEvent, SyncOutcome};
pub use evidence::EvidenceSyncer;
pub use inspections::InspectionSyncer;
pub use notices::EnvironmentalNoticeSyncer;
pub use photos::PhotoUploader;
pub use progress::{ProgressFn, ProgressUpdate};
pub use retry::{RetryPolicy, SyncTrigger};
pub use routine_activities::RoutineActivitySyncer;
pub use syncer::CollectionSyncer;
