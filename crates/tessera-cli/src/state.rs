// crates/tessera-cli/src/state.rs
//
// JSON persistence of the dataset registry between CLI invocations.

use std::path::Path;

use tessera_core::TesseraError;
use tessera_dataset::RegistryState;

/// Read the registry file. A missing file is an empty registry.
pub fn load_state(path: &Path) -> Result<RegistryState, TesseraError> {
    match std::fs::read_to_string(path) {
        Ok(contents) => {
            let state: RegistryState = serde_json::from_str(&contents)?;
            tracing::debug!(
                "Loaded {} datasets from {}",
                state.datasets.len(),
                path.display()
            );
            Ok(state)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(RegistryState::default()),
        Err(e) => Err(e.into()),
    }
}

/// Write the registry file, replacing the previous one atomically.
pub fn save_state(path: &Path, state: &RegistryState) -> Result<(), TesseraError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, serde_json::to_vec_pretty(state)?)?;
    std::fs::rename(&tmp, path)?;
    tracing::debug!(
        "Saved {} datasets to {}",
        state.datasets.len(),
        path.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_core::{Dataset, DatasetConfig};

    #[test]
    fn missing_file_is_empty_registry() {
        let path = std::env::temp_dir().join(format!("tessera_none_{}.json", uuid::Uuid::now_v7()));
        assert!(load_state(&path).unwrap().is_empty());
    }

    #[test]
    fn save_then_load() {
        let dir = std::env::temp_dir().join(format!("tessera_state_{}", uuid::Uuid::now_v7()));
        let path = dir.join("nested").join("registry.json");

        let state = RegistryState {
            datasets: vec![Dataset::new(DatasetConfig::new("saved"), Vec::new())],
            versions: Vec::new(),
        };
        save_state(&path, &state).unwrap();
        assert!(!path.with_extension("json.tmp").exists());

        let loaded = load_state(&path).unwrap();
        assert_eq!(loaded, state);

        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let path = std::env::temp_dir().join(format!("tessera_bad_{}.json", uuid::Uuid::now_v7()));
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            load_state(&path),
            Err(TesseraError::Serialization(_))
        ));
        let _ = std::fs::remove_file(path);
    }
}
