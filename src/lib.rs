//! Offline-first synchronization core for field inspection and compliance
//! tracking: records created while disconnected are queued locally and
//! reconciled with the remote system of record once connectivity returns.

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod shared;

pub use application::context::{SyncContext, UploadDefaults};
pub use application::managers::{EntityManager, PhotoManager};
pub use application::ports::{
    AuthTokenProvider, GatewayError, RemoteGateway, RemoteRecord, StaticTokenProvider,
};
pub use application::sync::{
    CollectionSyncer, RetryPolicy, SyncCoordinator, SyncEvent, SyncOutcome, SyncTrigger,
};
pub use domain::entities::{
    collections, AnswerVerdict, CorrectiveEvidence, EnvironmentalNotice, Inspection,
    InspectionAnswer, NoticeSeverity, PendingCounts, Photo, RoutineActivity, SyncMeta, SyncReport,
    SyncRunSummary, Syncable,
};
pub use domain::value_objects::{GeoPoint, LocalId, RemoteId};
pub use infrastructure::remote::HttpRemoteGateway;
pub use infrastructure::store::DocumentStore;
pub use shared::config::AppConfig;
pub use shared::error::{AppError, Result};
