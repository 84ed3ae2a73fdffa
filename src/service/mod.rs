pub use request_service::{RequestService, RequestServiceBuilder};
pub use router_service::RouterService;
pub use server::{shutdown_signal, Server};

mod active;
mod request_service;
mod router_service;
mod server;
