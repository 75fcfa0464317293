//! # Weather Station
//!
//! Lê temperatura, umidade e pressão e publica as leituras como pacote
//! BTHome dentro de um advertising data. O rádio BLE é substituído por
//! UDP broadcast e o deep sleep por uma pausa entre ciclos.
//!
//! ## Uso
//! ```bash
//! weather_station               # Loop contínuo
//! weather_station --once        # Um único ciclo
//! weather_station --simulated   # Ignora sensores do host
//! ```

mod advertiser;
mod sensors;

use advertiser::{UdpAdvertiser, encode_advertisement};
use bthome_core::config::AppConfig;
use bthome_core::state::StateStore;
use bthome_core::{SensorReadings, StationConfig, SystemState};
use crossbeam_channel::RecvTimeoutError;
use std::time::Duration;
use tracing::{error, info, warn};

/// Tempo máximo de espera por uma leitura antes de registrar timeout.
const SENSOR_WAIT: Duration = Duration::from_secs(1);

fn main() {
    // ── Logging ──
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let once = std::env::args().any(|a| a == "--once");
    let force_simulated = std::env::args().any(|a| a == "--simulated");

    // ── Carregar config ──
    let config_path = AppConfig::default_path();
    let config = AppConfig::load(&config_path);

    // Salva config padrão se não existir
    if !config_path.exists() {
        if let Err(e) = config.save(&config_path) {
            warn!("Não foi possível salvar config padrão: {e}");
        }
    }

    let errors = config.validate();
    if !errors.is_empty() {
        for e in &errors {
            error!("Config inválida: {e}");
        }
        std::process::exit(1);
    }

    let station = &config.station;
    let store = StateStore::new(config.state_path(&config_path));
    let mut state = store.load();

    // ── Transporte ──
    let advertiser = match UdpAdvertiser::new(&config.transport) {
        Ok(adv) => adv,
        Err(e) => {
            error!("Falha ao criar socket UDP: {e}");
            std::process::exit(1);
        }
    };

    // ── Sensores ──
    let source = sensors::select_source(force_simulated);
    let readings_rx = match sensors::spawn_sensor_thread(
        source,
        Duration::from_millis(station.sensor_period_ms),
    ) {
        Ok(rx) => rx,
        Err(e) => {
            error!("Falha ao criar thread de sensores: {e}");
            std::process::exit(1);
        }
    };

    // ── Banner ──
    println!();
    println!("══════════════════════════════════════════════");
    println!("   ⚡ WEATHER STATION – BTHome");
    println!("══════════════════════════════════════════════");
    println!("  Nome:      {}", station.device_name);
    println!("  Destino:   {}", advertiser.dest_addr());
    println!("  Buffer:    {} bytes", station.buffer_capacity);
    println!("  Janela:    {} ms", station.advertise_window_ms);
    println!("  Sono:      {} s", station.sleep_secs);
    println!("  Boot:      #{}", state.boot_count);
    println!("══════════════════════════════════════════════");
    println!();

    // ── Loop principal ──
    loop {
        let readings = match readings_rx.recv_timeout(SENSOR_WAIT) {
            Ok(readings) => readings,
            Err(RecvTimeoutError::Timeout) => {
                warn!("Nenhuma leitura dos sensores em {SENSOR_WAIT:?}");
                continue;
            }
            Err(RecvTimeoutError::Disconnected) => {
                error!("Thread de sensores encerrada");
                break;
            }
        };

        run_cycle(station, &readings, &mut state, &advertiser);

        if let Err(e) = store.save(&state) {
            error!("Erro ao salvar estado: {e}");
        }

        if once {
            break;
        }

        // Deep sleep
        info!("Dormindo por {} s", station.sleep_secs);
        std::thread::sleep(Duration::from_secs(station.sleep_secs));

        // Descarta leitura acumulada durante o sono
        while readings_rx.try_recv().is_ok() {}
    }
}

/// Codifica as leituras, anuncia durante a janela e avança o contador.
fn run_cycle(
    station: &StationConfig,
    readings: &SensorReadings,
    state: &mut SystemState,
    advertiser: &UdpAdvertiser,
) {
    let mut buf = vec![0u8; station.buffer_capacity];
    let packet_id = state.packet_id();

    match encode_advertisement(station, readings, packet_id, &mut buf) {
        Ok(encoded) => {
            let sent = advertiser.advertise(
                &buf[..encoded.len],
                Duration::from_millis(station.advertise_window_ms),
                Duration::from_millis(station.advertise_interval_ms),
            );
            info!(
                "→ #{} | {} bytes ({} BTHome) × {} | {:.2}°C {:.2}% {:.2} hPa | {} campos descartados",
                packet_id,
                encoded.len,
                encoded.packet_len,
                sent,
                readings.temperature,
                readings.humidity,
                readings.pressure,
                encoded.skipped.len()
            );
        }
        Err(e) => error!("Erro ao montar advertising: {e}"),
    }

    state.advance();
}
