// crates/tessera-dataset/src/lib.rs
//
// tessera-dataset: Dataset orchestration for Tessera.
//
// Owns the live dataset registry and composes the batch upload engine and
// the version manager into create / get / update / add / remove / list /
// delete / rollback / compare operations. Lifecycle and progress
// notifications are published as typed events on a broadcast channel.

pub mod events;
pub mod filter;
pub mod manager;
pub mod state;

pub use events::DatasetEvent;
pub use filter::{DatasetFilter, DatasetPage};
pub use manager::{
    CreateOptions, CreateResult, DatasetManager, DatasetUpdate, MetadataPatch, MutationOptions,
    MutationResult,
};
pub use state::RegistryState;
