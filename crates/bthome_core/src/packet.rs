//! Composição de pacotes BTHome.
//!
//! O [`PacketBuilder`] guarda o buffer do chamador e o offset acumulado.
//! Cada campo é escrito logo após o anterior, sem padding. Um campo que não
//! cabe é rejeitado e o offset não avança, então os campos anteriores
//! continuam válidos.

use crate::constants::DataType;
use crate::encode::{self, EncodeError, FieldSpec};

/// Uma leitura tipada pronta para ser codificada.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Measurement {
    PacketId(u8),
    /// °C
    Temperature(f32),
    /// %
    Humidity(f32),
    /// %
    Battery(f32),
    /// hPa
    Pressure(f32),
}

impl Measurement {
    pub fn data_type(&self) -> DataType {
        match self {
            Self::PacketId(_) => DataType::PacketId,
            Self::Temperature(_) => DataType::Temperature,
            Self::Humidity(_) => DataType::Humidity,
            Self::Battery(_) => DataType::Battery,
            Self::Pressure(_) => DataType::Pressure,
        }
    }

    /// Bytes que o objeto ocupa no pacote.
    pub fn encoded_len(&self) -> usize {
        FieldSpec::for_type(self.data_type()).encoded_len()
    }

    /// Codifica a leitura no início de `dest`.
    pub fn encode(&self, dest: &mut [u8]) -> Result<usize, EncodeError> {
        match *self {
            Self::PacketId(id) => encode::packet_id(id, dest),
            Self::Temperature(v) => encode::temperature(v, dest),
            Self::Humidity(v) => encode::humidity(v, dest),
            Self::Battery(v) => encode::battery(v, dest),
            Self::Pressure(v) => encode::pressure(v, dest),
        }
    }
}

/// Monta um pacote sobre um buffer de capacidade fixa.
#[derive(Debug)]
pub struct PacketBuilder<'a> {
    buf: &'a mut [u8],
    len: usize,
}

impl<'a> PacketBuilder<'a> {
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, len: 0 }
    }

    /// Adiciona uma leitura. Retorna os bytes escritos por ela.
    pub fn push(&mut self, measurement: Measurement) -> Result<usize, EncodeError> {
        let written = measurement.encode(&mut self.buf[self.len..])?;
        self.len += written;
        Ok(written)
    }

    pub fn packet_id(&mut self, id: u8) -> Result<&mut Self, EncodeError> {
        self.push(Measurement::PacketId(id))?;
        Ok(self)
    }

    pub fn temperature(&mut self, celsius: f32) -> Result<&mut Self, EncodeError> {
        self.push(Measurement::Temperature(celsius))?;
        Ok(self)
    }

    pub fn humidity(&mut self, percent: f32) -> Result<&mut Self, EncodeError> {
        self.push(Measurement::Humidity(percent))?;
        Ok(self)
    }

    pub fn battery(&mut self, percent: f32) -> Result<&mut Self, EncodeError> {
        self.push(Measurement::Battery(percent))?;
        Ok(self)
    }

    pub fn pressure(&mut self, hpa: f32) -> Result<&mut Self, EncodeError> {
        self.push(Measurement::Pressure(hpa))?;
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.len
    }

    /// Bytes já codificados.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    /// Encerra a montagem devolvendo o pacote com o lifetime do buffer.
    pub fn finish(self) -> &'a [u8] {
        let Self { buf, len } = self;
        &buf[..len]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::ObjectFormat;

    const SENTINEL: u8 = 0xAA;

    fn unsigned(len: u8) -> u8 {
        ((ObjectFormat::UnsignedInt as u8) << 5) | len
    }

    #[test]
    fn fields_are_packed_back_to_back() {
        let mut buf = [0u8; 32];
        let mut packet = PacketBuilder::new(&mut buf);
        packet
            .packet_id(7)
            .and_then(|p| p.temperature(21.5))
            .and_then(|p| p.humidity(55.25))
            .and_then(|p| p.pressure(1013.25))
            .unwrap();

        assert_eq!(packet.len(), 3 + 4 + 4 + 5);
        assert_eq!(
            packet.finish(),
            &[
                unsigned(2), 0x00, 0x07,
                0x23, 0x02, 0x66, 0x08,
                unsigned(3), 0x03, 0x95, 0x15,
                unsigned(4), 0x04, 0xCD, 0x8B, 0x01,
            ]
        );
    }

    #[test]
    fn overflow_leaves_previous_fields_untouched() {
        let mut buf = [SENTINEL; 10];
        let mut packet = PacketBuilder::new(&mut buf);

        assert_eq!(packet.push(Measurement::PacketId(7)), Ok(3));
        assert_eq!(packet.push(Measurement::Temperature(21.5)), Ok(4));
        let before = packet.as_bytes().to_vec();

        assert_eq!(
            packet.push(Measurement::Humidity(55.25)),
            Err(EncodeError::InsufficientCapacity { needed: 4, available: 3 })
        );
        assert_eq!(
            packet.push(Measurement::Pressure(1013.25)),
            Err(EncodeError::InsufficientCapacity { needed: 5, available: 3 })
        );
        assert_eq!(packet.len(), 7);
        assert_eq!(packet.remaining(), 3);
        assert_eq!(packet.as_bytes(), before.as_slice());

        drop(packet);
        assert_eq!(&buf[7..], &[SENTINEL; 3]);
    }

    #[test]
    fn rejected_value_does_not_advance() {
        let mut buf = [0u8; 16];
        let mut packet = PacketBuilder::new(&mut buf);
        packet.packet_id(1).unwrap();

        assert!(packet.temperature(f32::NAN).is_err());
        assert_eq!(packet.len(), 3);

        packet.battery(87.0).unwrap();
        assert_eq!(packet.as_bytes()[3..], [unsigned(3), 0x01, 0x57, 0x00]);
    }

    #[test]
    fn exact_fit_fills_buffer() {
        let mut buf = [0u8; 7];
        let mut packet = PacketBuilder::new(&mut buf);
        packet.packet_id(255).unwrap().battery(100.0).unwrap();
        assert_eq!(packet.remaining(), 0);
        assert_eq!(packet.capacity(), 7);
        assert!(packet.packet_id(0).is_err());
    }

    #[test]
    fn measurement_len_matches_encoding() {
        for m in [
            Measurement::PacketId(9),
            Measurement::Temperature(-5.0),
            Measurement::Humidity(40.0),
            Measurement::Battery(50.0),
            Measurement::Pressure(990.0),
        ] {
            let mut buf = [0u8; 8];
            assert_eq!(m.encode(&mut buf), Ok(m.encoded_len()));
        }
    }

    #[test]
    fn empty_builder() {
        let mut buf = [0u8; 4];
        let packet = PacketBuilder::new(&mut buf);
        assert!(packet.is_empty());
        assert!(packet.finish().is_empty());
    }
}
