// crates/tessera-dataset/src/state.rs
//
// Serializable image of the registry, used to persist datasets and their
// histories between processes.

use serde::{Deserialize, Serialize};

use tessera_core::{Dataset, DatasetVersion};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegistryState {
    /// Live datasets in creation order.
    #[serde(default)]
    pub datasets: Vec<Dataset>,
    /// Every version record of every live dataset.
    #[serde(default)]
    pub versions: Vec<DatasetVersion>,
}

impl RegistryState {
    pub fn is_empty(&self) -> bool {
        self.datasets.is_empty()
    }
}
