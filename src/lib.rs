//! MCC/MNC Lookup Service - longest-prefix resolution over mutual-TLS gRPC.
//!
//! This crate provides the prefix table and resolver, the bearer token gate,
//! the gRPC server and client, and the process modes built on them.

#![forbid(unsafe_code)]

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod grpc;
pub mod loader;
pub mod mtls;
pub mod observability;
pub mod resolver;
pub mod runner;
pub mod server;
pub mod shutdown;
pub mod store;

// Include generated protobuf code
pub mod proto {
    pub mod search {
        pub mod v1 {
            tonic::include_proto!("search.v1");
        }
    }
}

pub use auth::AuthGate;
pub use client::{ResolvedCode, SearchClient};
pub use config::{CallType, Config, ConfigError, Mode};
pub use error::{ErrorCode, LookupError};
pub use grpc::SearchServiceImpl;
pub use mtls::TlsMaterial;
pub use resolver::{PrefixResolver, Resolve};
pub use server::{start_server, ServerHandle, ServerOptions};
pub use store::PrefixStore;
