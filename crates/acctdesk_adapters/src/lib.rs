pub mod accounts;
pub mod configuration;
pub mod gateway;
pub mod network;
pub mod session;
pub mod telemetry;

// Re-exports for convenience
pub use accounts::HttpAccountsApi;
pub use gateway::{HttpGateway, ReqwestTransport};
pub use session::{RouteHistory, SharedAuthSession};
