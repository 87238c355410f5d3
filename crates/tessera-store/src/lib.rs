// crates/tessera-store/src/lib.rs
//
// tessera-store: Upload primitives for Tessera.
//
// Provides an IPFS client (Kubo HTTP API) for content-addressed storage,
// a local directory store keyed by SHA-256 digests, and an in-memory store
// for tests and dry runs. All three implement `tessera_core::Uploader`.

pub mod content;
pub mod ipfs;
pub mod local;
pub mod memory;

// Re-export key types for ergonomic access from downstream crates.
pub use ipfs::IpfsClient;
pub use local::LocalStore;
pub use memory::MemoryStore;
