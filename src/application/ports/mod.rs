pub mod auth;
pub mod remote_gateway;

pub use auth::{AuthTokenProvider, StaticTokenProvider};
pub use remote_gateway::{GatewayError, RemoteGateway, RemoteRecord};
