//! Fontes de leitura dos sensores e thread de amostragem.
//!
//! - [`SimulatedSensors`] – valores sintéticos, sempre disponível
//! - [`HostSensors`] – temperatura real dos components do `sysinfo`,
//!   demais grandezas vindas do simulador

use bthome_core::SensorReadings;
use crossbeam_channel::{Receiver, TrySendError, bounded};
use std::time::Duration;
use sysinfo::Components;
use tracing::{debug, info, warn};

/// Origem das leituras publicadas pela estação.
pub trait SensorSource: Send {
    fn name(&self) -> &'static str;
    fn read(&mut self) -> SensorReadings;
}

// ──────────────────────────────────────────────
// Simulador
// ──────────────────────────────────────────────

/// Leituras sintéticas que variam a cada amostra.
#[derive(Debug, Default)]
pub struct SimulatedSensors {
    tick: u64,
}

impl SensorSource for SimulatedSensors {
    fn name(&self) -> &'static str {
        "simulador"
    }

    fn read(&mut self) -> SensorReadings {
        let tick = self.tick;
        self.tick = self.tick.wrapping_add(1);

        // Temperatura 20–30°C, umidade 50–80%, pressão 1010–1020 hPa
        SensorReadings {
            temperature: 20.0 + (tick % 100) as f32 / 10.0,
            humidity: 50.0 + (tick % 60) as f32 / 2.0,
            pressure: 1010.0 + (tick % 100) as f32 / 10.0,
            battery: Some(100.0 - ((tick / 100) % 100) as f32),
        }
    }
}

// ──────────────────────────────────────────────
// Host (sysinfo)
// ──────────────────────────────────────────────

/// Usa o sensor térmico mais quente do host como temperatura.
pub struct HostSensors {
    components: Components,
    fallback: SimulatedSensors,
}

impl HostSensors {
    /// Retorna `None` se o host não expõe nenhum sensor térmico.
    pub fn try_new() -> Option<Self> {
        let components = Components::new_with_refreshed_list();
        let found = components.iter().filter(|c| c.temperature().is_some()).count();
        if found == 0 {
            warn!("✗ sysinfo: nenhum sensor térmico disponível");
            return None;
        }

        info!("✓ sysinfo: {found} sensores térmicos detectados");
        Some(Self {
            components,
            fallback: SimulatedSensors::default(),
        })
    }

    fn hottest_component(&self) -> Option<f32> {
        self.components
            .iter()
            .filter_map(|c| c.temperature())
            .filter(|t| t.is_finite() && *t < 150.0)
            .reduce(f32::max)
    }
}

impl SensorSource for HostSensors {
    fn name(&self) -> &'static str {
        "host"
    }

    fn read(&mut self) -> SensorReadings {
        self.components.refresh(true);

        let mut readings = self.fallback.read();
        match self.hottest_component() {
            Some(temp) => readings.temperature = temp,
            None => debug!("Sem temperatura do host, usando simulador"),
        }
        readings
    }
}

/// Escolhe a fonte de sensores: host quando possível, senão simulador.
pub fn select_source(force_simulated: bool) -> Box<dyn SensorSource> {
    if !force_simulated {
        if let Some(host) = HostSensors::try_new() {
            return Box::new(host);
        }
    }
    Box::new(SimulatedSensors::default())
}

// ──────────────────────────────────────────────
// Thread de amostragem
// ──────────────────────────────────────────────

/// Inicia a thread de sensores. Retorna o receiver do channel.
///
/// O channel guarda só uma leitura: se o consumidor ainda não pegou a
/// anterior, a nova é descartada.
pub fn spawn_sensor_thread(
    mut source: Box<dyn SensorSource>,
    period: Duration,
) -> std::io::Result<Receiver<SensorReadings>> {
    let (tx, rx) = bounded::<SensorReadings>(1);

    std::thread::Builder::new()
        .name("sensors".into())
        .spawn(move || {
            info!("Thread de sensores iniciada – fonte: {}", source.name());
            loop {
                let readings = source.read();
                match tx.try_send(readings) {
                    Ok(()) => debug!("Leitura publicada: {readings:?}"),
                    Err(TrySendError::Full(_)) => {}
                    Err(TrySendError::Disconnected(_)) => {
                        debug!("Consumidor encerrado, parando sensores");
                        break;
                    }
                }
                std::thread::sleep(period);
            }
        })?;

    Ok(rx)
}
