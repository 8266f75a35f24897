// openmotics-api: Async Rust client for the OpenMotics API (Cloud + Local Gateway)

pub mod auth;
pub mod backend;
pub mod cloud;
pub mod engine;
pub mod error;
pub mod local;
pub mod models;
pub mod retry;
pub mod transport;
pub mod websocket;

mod tls;

pub use auth::{Credentials, TokenRefresh, TokenState};
pub use backend::Backend;
pub use cloud::CloudClient;
pub use engine::Payload;
pub use error::{Error, ErrorKind};
pub use local::LocalGateway;
pub use retry::RetryPolicy;
pub use transport::{TlsMode, TransportConfig};
pub use websocket::{EventStream, GatewayEvent, ReconnectConfig};
