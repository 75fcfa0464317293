//! Montagem do advertising data e publicação via UDP.
//!
//! O socket UDP faz o papel do rádio: cada datagrama é um advertising data
//! completo, repetido a cada intervalo enquanto a janela estiver aberta.

use bthome_core::advertisement::{FLAGS_GENERAL_DISCOVERABLE, SERVICE_DATA_OVERHEAD};
use bthome_core::config::TransportConfig;
use bthome_core::constants::{DataType, MAX_EXTENDED_ADV_LEN};
use bthome_core::{AdvertisementBuilder, EncodeError, PacketBuilder, SensorReadings, StationConfig};
use std::net::UdpSocket;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Resultado da montagem de um advertising.
#[derive(Debug)]
pub struct EncodedAdvertisement {
    /// Bytes válidos no buffer
    pub len: usize,
    /// Tamanho do pacote BTHome dentro do service data
    pub packet_len: usize,
    /// Campos descartados e o motivo
    pub skipped: Vec<(DataType, EncodeError)>,
}

/// Monta flags + service data BTHome + TX power + nome em `buf`.
///
/// Campos que o encoder rejeita são pulados; nome e TX power só entram se
/// ainda houver espaço depois do pacote.
pub fn encode_advertisement(
    station: &StationConfig,
    readings: &SensorReadings,
    packet_id: u8,
    buf: &mut [u8],
) -> Result<EncodedAdvertisement, EncodeError> {
    let mut adv = AdvertisementBuilder::new(buf);
    adv.flags(FLAGS_GENERAL_DISCOVERABLE)?;

    let budget = adv
        .remaining()
        .saturating_sub(SERVICE_DATA_OVERHEAD)
        .min(MAX_EXTENDED_ADV_LEN);
    let mut packet_buf = [0u8; MAX_EXTENDED_ADV_LEN];
    let mut packet = PacketBuilder::new(&mut packet_buf[..budget]);

    let mut skipped = Vec::new();
    for measurement in readings.measurements(packet_id, station.include_battery) {
        if let Err(e) = packet.push(measurement) {
            warn!("Campo {} descartado: {e}", measurement.data_type());
            skipped.push((measurement.data_type(), e));
        }
    }

    let packet_len = packet.len();
    adv.bthome(packet.finish())?;

    if station.include_tx_power {
        if let Err(e) = adv.tx_power(station.tx_power_dbm) {
            debug!("TX power fora do advertising: {e}");
        }
    }
    if let Err(e) = adv.complete_local_name(&station.device_name) {
        debug!("Nome fora do advertising: {e}");
    }

    Ok(EncodedAdvertisement {
        len: adv.len(),
        packet_len,
        skipped,
    })
}

/// "Rádio" UDP.
pub struct UdpAdvertiser {
    sock: UdpSocket,
    dest_addr: String,
}

impl UdpAdvertiser {
    pub fn new(transport: &TransportConfig) -> std::io::Result<Self> {
        let sock = UdpSocket::bind(if transport.bind_ip.is_empty() {
            "0.0.0.0:0".to_string()
        } else {
            format!("{}:0", transport.bind_ip)
        })?;

        if transport.mode == "broadcast" || transport.dest_ip == "255.255.255.255" {
            sock.set_broadcast(true)?;
            info!("Modo BROADCAST ativado");
        } else {
            info!("Modo UNICAST → {}", transport.dest_ip);
        }

        Ok(Self {
            sock,
            dest_addr: format!("{}:{}", transport.dest_ip, transport.port),
        })
    }

    pub fn dest_addr(&self) -> &str {
        &self.dest_addr
    }

    /// Anuncia `data` a cada `interval` até fechar a janela.
    ///
    /// Retorna quantos anúncios foram enviados com sucesso.
    pub fn advertise(&self, data: &[u8], window: Duration, interval: Duration) -> usize {
        let start = Instant::now();
        let mut sent = 0;

        while start.elapsed() < window {
            match self.sock.send_to(data, &self.dest_addr) {
                Ok(_) => sent += 1,
                Err(e) => error!("Erro ao enviar UDP: {e}"),
            }
            std::thread::sleep(interval);
        }

        debug!("Advertising encerrado após {sent} anúncios");
        sent
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bthome_core::constants::MAX_LEGACY_ADV_LEN;

    fn readings() -> SensorReadings {
        SensorReadings {
            temperature: 21.5,
            humidity: 55.25,
            pressure: 1013.25,
            battery: Some(87.0),
        }
    }

    #[test]
    fn legacy_advertisement_keeps_packet_and_drops_name() {
        let station = StationConfig::default();
        let mut buf = [0u8; MAX_LEGACY_ADV_LEN];

        let encoded = encode_advertisement(&station, &readings(), 7, &mut buf).unwrap();

        assert!(encoded.skipped.is_empty());
        assert_eq!(encoded.packet_len, 16);
        // flags(3) + service data(4 + 16) + tx power(3); nome não cabe
        assert_eq!(encoded.len, 26);
        assert_eq!(&buf[3..7], &[19, 0x16, 0x1C, 0x18]);
        assert_eq!(&buf[23..26], &[0x02, 0x0A, 0x00]);
    }

    #[test]
    fn large_buffer_includes_name_and_battery() {
        let station = StationConfig {
            include_battery: true,
            buffer_capacity: 64,
            ..Default::default()
        };
        let mut buf = [0u8; 64];

        let encoded = encode_advertisement(&station, &readings(), 1, &mut buf).unwrap();

        assert_eq!(encoded.packet_len, 20);
        let name = station.device_name.as_bytes();
        assert_eq!(&buf[encoded.len - name.len()..encoded.len], name);
    }

    #[test]
    fn fields_that_do_not_fit_are_skipped() {
        let station = StationConfig::default();
        let mut buf = [0u8; 16];

        let encoded = encode_advertisement(&station, &readings(), 7, &mut buf).unwrap();

        // 16 - flags(3) - overhead(4) = 9: packet_id + temperatura
        assert_eq!(encoded.packet_len, 7);
        let skipped: Vec<_> = encoded.skipped.iter().map(|(t, _)| *t).collect();
        assert_eq!(skipped, vec![DataType::Humidity, DataType::Pressure]);
    }

    #[test]
    fn minimum_capacity_carries_packet_id() {
        let station = StationConfig {
            buffer_capacity: bthome_core::config::MIN_BUFFER_CAPACITY,
            ..Default::default()
        };
        let mut buf = vec![0u8; station.buffer_capacity];

        let encoded = encode_advertisement(&station, &readings(), 7, &mut buf).unwrap();

        assert_eq!(encoded.len, 10);
        assert_eq!(encoded.packet_len, 3);
        assert_eq!(&buf[3..], &[0x06, 0x16, 0x1C, 0x18, 0x02, 0x00, 0x07]);
        assert_eq!(encoded.skipped.len(), 3);
    }

    #[test]
    fn invalid_reading_is_skipped() {
        let station = StationConfig::default();
        let mut buf = [0u8; MAX_LEGACY_ADV_LEN];
        let bad = SensorReadings {
            temperature: f32::NAN,
            ..readings()
        };

        let encoded = encode_advertisement(&station, &bad, 7, &mut buf).unwrap();
        assert_eq!(encoded.packet_len, 12);
        assert!(matches!(
            encoded.skipped[0],
            (DataType::Temperature, EncodeError::OutOfRange { .. })
        ));
    }

    #[test]
    fn advertise_sends_during_window() {
        let receiver = UdpSocket::bind("127.0.0.1:0").unwrap();
        let transport = TransportConfig {
            mode: "unicast".into(),
            dest_ip: "127.0.0.1".into(),
            port: receiver.local_addr().unwrap().port(),
            bind_ip: "127.0.0.1".into(),
        };
        let advertiser = UdpAdvertiser::new(&transport).unwrap();

        let sent = advertiser.advertise(
            &[0x02, 0x01, 0x06],
            Duration::from_millis(30),
            Duration::from_millis(10),
        );
        assert!(sent >= 1);

        let mut buf = [0u8; 32];
        let (n, _) = receiver.recv_from(&mut buf).unwrap();
        assert_eq!(&buf[..n], &[0x02, 0x01, 0x06]);
    }
}
