//! Persistência do [`SystemState`] entre ciclos.
//!
//! Na placa real o contador vive em memória RTC e sobrevive ao deep sleep.
//! Aqui ele é gravado em um arquivo binário (bincode) ao lado do config.

use crate::types::SystemState;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Erros ao gravar o estado.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("Erro de serialização: {0}")]
    Serialize(String),

    #[error("Erro de I/O em {}: {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Arquivo de estado da estação.
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Lê o estado salvo. Arquivo ausente ou corrompido volta ao padrão.
    pub fn load(&self) -> SystemState {
        match std::fs::read(&self.path) {
            Ok(bytes) => match bincode::deserialize::<SystemState>(&bytes) {
                Ok(state) => {
                    debug!("Estado carregado de {}: {:?}", self.path.display(), state);
                    return state;
                }
                Err(e) => warn!("Estado corrompido em {}: {}", self.path.display(), e),
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("Sem estado salvo em {}", self.path.display());
            }
            Err(e) => warn!("Erro ao ler {}: {}", self.path.display(), e),
        }

        SystemState::default()
    }

    /// Grava o estado de forma atômica (arquivo temporário + rename).
    pub fn save(&self, state: &SystemState) -> Result<(), StateError> {
        let bytes = bincode::serialize(state).map_err(|e| StateError::Serialize(e.to_string()))?;

        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, bytes).map_err(|source| StateError::Io {
            path: tmp.clone(),
            source,
        })?;
        std::fs::rename(&tmp, &self.path).map_err(|source| StateError::Io {
            path: self.path.clone(),
            source,
        })?;

        debug!("Estado salvo em {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("bthome-state-{}-{name}", std::process::id()))
    }

    #[test]
    fn missing_file_yields_default() {
        let store = StateStore::new(temp_path("missing.bin"));
        assert_eq!(store.load(), SystemState::default());
    }

    #[test]
    fn save_then_load() {
        let path = temp_path("roundtrip.bin");
        let store = StateStore::new(&path);
        let state = SystemState { boot_count: 42 };

        store.save(&state).unwrap();
        assert_eq!(store.load(), state);

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn corrupt_file_yields_default() {
        let path = temp_path("corrupt.bin");
        std::fs::write(&path, [0x01]).unwrap();

        let store = StateStore::new(&path);
        assert_eq!(store.load(), SystemState::default());

        let _ = std::fs::remove_file(path);
    }
}
