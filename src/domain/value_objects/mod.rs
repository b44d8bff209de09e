mod geo_point;
mod local_id;
mod remote_id;

pub use geo_point::GeoPoint;
pub use local_id::LocalId;
pub use remote_id::RemoteId;
