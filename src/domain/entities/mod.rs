pub mod environmental_notice;
pub mod evidence;
pub mod inspection;
pub mod photo;
pub mod routine_activity;
pub mod sync_report;
pub mod syncable;

pub use environmental_notice::{EnvironmentalNotice, NoticeSeverity};
pub use evidence::CorrectiveEvidence;
pub use inspection::{AnswerVerdict, Inspection, InspectionAnswer};
pub use photo::Photo;
pub use routine_activity::RoutineActivity;
pub use sync_report::{CollectionOutcome, PendingCounts, SyncReport, SyncRunSummary};
pub use syncable::{SyncMeta, Syncable};

/// Collection names used as keys in the local store and as remote routes.
pub mod collections {
    pub const INSPECTIONS: &str = "inspections";
    pub const INSPECTION_ANSWERS: &str = "inspection_answers";
    pub const ROUTINE_ACTIVITIES: &str = "routine_activities";
    pub const ENVIRONMENTAL_NOTICES: &str = "environmental_notices";
    pub const CORRECTIVE_EVIDENCE: &str = "corrective_evidence";
    pub const PHOTOS: &str = "photos";
}
