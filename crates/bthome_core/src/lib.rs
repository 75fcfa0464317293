//! # BTHome Core
//!
//! Crate compartilhada com o encoder BTHome, a montagem do advertising
//! data, o estado persistente e a configuração TOML da estação.
//!
//! ## Módulos
//! - [`constants`] – Formatos de objeto, data types e limites
//! - [`encode`] – Header, escrita little-endian e encoders por campo
//! - [`packet`] – Composição de vários campos em um buffer fixo
//! - [`advertisement`] – Estruturas AD com o service data BTHome
//! - [`types`] – Leituras de sensores e estado do sistema
//! - [`state`] – Persistência binária (bincode) do estado
//! - [`config`] – Configuração unificada via TOML

pub mod constants;
pub mod encode;
pub mod packet;
pub mod advertisement;
pub mod types;
pub mod state;
pub mod config;

// Re-exports convenientes
pub use advertisement::AdvertisementBuilder;
pub use config::{AppConfig, StationConfig, TransportConfig};
pub use constants::{DataType, ObjectFormat, UNENCRYPTED_SERVICE_UUID};
pub use encode::EncodeError;
pub use packet::{Measurement, PacketBuilder};
pub use types::{SensorReadings, SystemState};
