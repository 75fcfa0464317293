//! Tipos compartilhados entre a coleta de sensores e o advertising.

use crate::packet::Measurement;
use serde::{Deserialize, Serialize};

// ──────────────────────────────────────────────
// Sensores
// ──────────────────────────────────────────────

/// Última leitura dos sensores da estação.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct SensorReadings {
    /// Temperatura do ar (°C)
    pub temperature: f32,
    /// Umidade relativa (0–100%)
    pub humidity: f32,
    /// Pressão atmosférica (hPa)
    pub pressure: f32,
    /// Nível da bateria (0–100%), se a placa tiver medição
    pub battery: Option<f32>,
}

impl SensorReadings {
    /// Sequência de campos publicada a cada ciclo, na ordem do pacote.
    ///
    /// A bateria só entra quando `include_battery` e houver leitura.
    pub fn measurements(
        &self,
        packet_id: u8,
        include_battery: bool,
    ) -> impl Iterator<Item = Measurement> + use<> {
        let battery = self.battery.filter(|_| include_battery);
        [
            Some(Measurement::PacketId(packet_id)),
            Some(Measurement::Temperature(self.temperature)),
            Some(Measurement::Humidity(self.humidity)),
            Some(Measurement::Pressure(self.pressure)),
            battery.map(Measurement::Battery),
        ]
        .into_iter()
        .flatten()
    }
}

// ──────────────────────────────────────────────
// Estado do sistema
// ──────────────────────────────────────────────

/// Estado que sobrevive entre ciclos de sono.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SystemState {
    /// Número de ciclos de advertising já concluídos
    pub boot_count: u32,
}

impl SystemState {
    /// Packet id rotativo derivado do contador de boot.
    pub fn packet_id(&self) -> u8 {
        (self.boot_count % 256) as u8
    }

    /// Avança para o próximo ciclo.
    pub fn advance(&mut self) {
        self.boot_count = self.boot_count.wrapping_add(1);
    }
}
