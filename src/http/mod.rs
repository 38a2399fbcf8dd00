//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection (ConnectInfo<SocketAddr>)
//!     → request.rs (request ID set and propagated)
//!     → middleware/real_ip.rs (RemoteAddr overwritten with the resolved client IP)
//!     → trace span (method, uri, request id, remote_addr)
//!     → middleware/unpanic.rs (handler panics → response.rs error page)
//!     → handlers
//! ```

pub mod middleware;
pub mod request;
pub mod response;
pub mod server;

pub use middleware::real_ip::{RealIpLayer, RemoteAddr};
pub use request::{MakeRequestUuid, X_REQUEST_ID};
pub use server::HttpServer;
