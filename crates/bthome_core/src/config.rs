//! Configuração unificada via TOML.
//!
//! Um único `config.toml` ao lado do executável controla a estação e o
//! transporte usado para publicar o advertising.

use crate::advertisement::{FLAGS_STRUCTURE_LEN, SERVICE_DATA_OVERHEAD};
use crate::constants::{MAX_EXTENDED_ADV_LEN, MAX_LEGACY_ADV_LEN};
use crate::encode::PACKET_ID;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Menor buffer que comporta flags + service data com o packet id.
pub const MIN_BUFFER_CAPACITY: usize =
    FLAGS_STRUCTURE_LEN + SERVICE_DATA_OVERHEAD + PACKET_ID.encoded_len();

/// Configuração da estação (ciclo de leitura e advertising).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StationConfig {
    /// Nome anunciado no advertising
    pub device_name: String,
    /// Capacidade do buffer de advertising data (bytes)
    pub buffer_capacity: usize,
    /// Publica o nível da bateria
    pub include_battery: bool,
    /// Publica o TX power no advertising
    pub include_tx_power: bool,
    /// TX power anunciado (dBm)
    pub tx_power_dbm: i8,
    /// Janela de advertising por ciclo (ms)
    pub advertise_window_ms: u64,
    /// Intervalo entre anúncios dentro da janela (ms)
    pub advertise_interval_ms: u64,
    /// Sono entre ciclos (segundos)
    pub sleep_secs: u64,
    /// Período de amostragem dos sensores (ms)
    pub sensor_period_ms: u64,
    /// Arquivo do estado persistente (relativo ao config)
    pub state_file: String,
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            device_name: "weather-station".into(),
            buffer_capacity: MAX_LEGACY_ADV_LEN,
            include_battery: false,
            include_tx_power: true,
            tx_power_dbm: 0,
            advertise_window_ms: 500,
            advertise_interval_ms: 40,
            sleep_secs: 900,
            sensor_period_ms: 1000,
            state_file: "state.bin".into(),
        }
    }
}

/// Transporte UDP que substitui o rádio BLE.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Modo de envio: "broadcast" ou "unicast"
    pub mode: String,
    /// IP de destino (255.255.255.255 para broadcast)
    pub dest_ip: String,
    /// Porta UDP
    pub port: u16,
    /// IP local para bind (vazio = auto)
    pub bind_ip: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            mode: "broadcast".into(),
            dest_ip: "255.255.255.255".into(),
            port: 5006,
            bind_ip: String::new(),
        }
    }
}

/// Configuração raiz do aplicativo.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub station: StationConfig,
    pub transport: TransportConfig,
}

impl AppConfig {
    /// Carrega configuração de um arquivo TOML.
    pub fn load(path: &Path) -> Self {
        if path.exists() {
            match std::fs::read_to_string(path) {
                Ok(content) => match toml::from_str::<AppConfig>(&content) {
                    Ok(config) => {
                        info!("Configuração carregada de {}", path.display());
                        return config;
                    }
                    Err(e) => {
                        warn!("Erro ao parsear {}: {}", path.display(), e);
                    }
                },
                Err(e) => {
                    warn!("Erro ao ler {}: {}", path.display(), e);
                }
            }
        }

        info!("Usando configuração padrão");
        AppConfig::default()
    }

    /// Salva configuração em arquivo TOML.
    pub fn save(&self, path: &Path) -> Result<(), String> {
        let content = toml::to_string_pretty(self).map_err(|e| e.to_string())?;
        std::fs::write(path, content).map_err(|e| e.to_string())?;
        info!("Configuração salva em {}", path.display());
        Ok(())
    }

    /// Retorna o caminho padrão do config.toml.
    pub fn default_path() -> PathBuf {
        let exe_dir = std::env::current_exe()
            .map(|p| p.parent().unwrap_or(Path::new(".")).to_path_buf())
            .unwrap_or_else(|_| PathBuf::from("."));
        exe_dir.join("config.toml")
    }

    /// Caminho do arquivo de estado, resolvido a partir do config.
    pub fn state_path(&self, config_path: &Path) -> PathBuf {
        let file = Path::new(&self.station.state_file);
        if file.is_absolute() {
            return file.to_path_buf();
        }
        config_path
            .parent()
            .unwrap_or(Path::new("."))
            .join(file)
    }

    /// Valida a configuração e retorna lista de erros.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        let station = &self.station;

        if station.device_name.is_empty() {
            errors.push("Nome do dispositivo não pode ser vazio".into());
        }
        if station.buffer_capacity < MIN_BUFFER_CAPACITY
            || station.buffer_capacity > MAX_EXTENDED_ADV_LEN
        {
            errors.push(format!(
                "Capacidade do buffer inválida: {} ({MIN_BUFFER_CAPACITY}–{MAX_EXTENDED_ADV_LEN})",
                station.buffer_capacity
            ));
        }
        if station.advertise_interval_ms == 0 {
            errors.push("Intervalo de advertising não pode ser 0".into());
        }
        if station.advertise_window_ms < station.advertise_interval_ms {
            errors.push(format!(
                "Janela de advertising ({} ms) menor que o intervalo ({} ms)",
                station.advertise_window_ms, station.advertise_interval_ms
            ));
        }
        if station.sensor_period_ms == 0 {
            errors.push("Período dos sensores não pode ser 0".into());
        }
        if self.transport.port == 0 {
            errors.push("Porta do transporte não pode ser 0".into());
        }
        if self.transport.mode != "broadcast" && self.transport.mode != "unicast" {
            errors.push(format!(
                "Modo de transporte inválido: {} (broadcast|unicast)",
                self.transport.mode
            ));
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        let errors = config.validate();
        assert!(errors.is_empty(), "Erros: {:?}", errors);
    }

    #[test]
    fn roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(config.transport.port, parsed.transport.port);
        assert_eq!(config.station.device_name, parsed.station.device_name);
        assert_eq!(config.station.tx_power_dbm, parsed.station.tx_power_dbm);
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let partial = r#"
[station]
sleep_secs = 60
"#;
        let config: AppConfig = toml::from_str(partial).unwrap();
        assert_eq!(config.station.sleep_secs, 60);
        // Outros campos devem ter valor padrão
        assert_eq!(config.station.buffer_capacity, MAX_LEGACY_ADV_LEN);
        assert_eq!(config.transport.port, 5006);
    }

    #[test]
    fn invalid_values_are_reported() {
        let mut config = AppConfig::default();
        config.station.buffer_capacity = 300;
        config.station.advertise_window_ms = 10;
        config.transport.mode = "multicast".into();

        let errors = config.validate();
        assert_eq!(errors.len(), 3, "Erros: {:?}", errors);
    }

    #[test]
    fn buffer_must_fit_flags_and_packet_id() {
        assert_eq!(MIN_BUFFER_CAPACITY, 10);

        let mut config = AppConfig::default();
        config.station.buffer_capacity = 9;
        let errors = config.validate();
        assert_eq!(errors.len(), 1, "Erros: {:?}", errors);
        assert!(errors[0].contains("Capacidade do buffer"));

        config.station.buffer_capacity = 10;
        assert!(config.validate().is_empty());
    }

    #[test]
    fn state_path_is_relative_to_config() {
        let config = AppConfig::default();
        let path = config.state_path(Path::new("/opt/station/config.toml"));
        assert_eq!(path, PathBuf::from("/opt/station/state.bin"));
    }

    #[test]
    fn save_and_load_file() {
        let path = std::env::temp_dir().join(format!("bthome-config-{}.toml", std::process::id()));
        let mut config = AppConfig::default();
        config.station.device_name = "ws-test".into();

        config.save(&path).unwrap();
        let loaded = AppConfig::load(&path);
        assert_eq!(loaded.station.device_name, "ws-test");

        let _ = std::fs::remove_file(path);
    }
}
