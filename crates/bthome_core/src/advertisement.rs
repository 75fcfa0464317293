//! Advertising data BLE contendo o pacote BTHome.
//!
//! Formato de cada estrutura AD:
//!
//! ```text
//! ┌────────┬─────────────┬──────────────────┐
//! │ Len(1) │ AD type (1) │ Dados (Len - 1)  │
//! └────────┴─────────────┴──────────────────┘
//! ```
//!
//! O pacote BTHome vai em "Service Data – 16-bit UUID", precedido do UUID
//! [`UNENCRYPTED_SERVICE_UUID`] em little-endian.

use crate::constants::UNENCRYPTED_SERVICE_UUID;
use crate::encode::EncodeError;

pub const AD_TYPE_FLAGS: u8 = 0x01;
pub const AD_TYPE_COMPLETE_LOCAL_NAME: u8 = 0x09;
pub const AD_TYPE_TX_POWER_LEVEL: u8 = 0x0A;
pub const AD_TYPE_SERVICE_DATA_16: u8 = 0x16;

/// LE General Discoverable + BR/EDR não suportado.
pub const FLAGS_GENERAL_DISCOVERABLE: u8 = 0x06;

/// Estrutura de flags completa: len + AD type + flags.
pub const FLAGS_STRUCTURE_LEN: usize = 3;

/// Service data sem o pacote: len + AD type + UUID de 16 bits.
pub const SERVICE_DATA_OVERHEAD: usize = 4;

/// Maior payload que cabe no byte de tamanho (que inclui o AD type).
const MAX_STRUCTURE_DATA: usize = u8::MAX as usize - 1;

/// Monta estruturas AD sobre um buffer de capacidade fixa.
#[derive(Debug)]
pub struct AdvertisementBuilder<'a> {
    buf: &'a mut [u8],
    len: usize,
}

impl<'a> AdvertisementBuilder<'a> {
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, len: 0 }
    }

    /// Escreve uma estrutura AD cujo conteúdo é a concatenação de `parts`.
    ///
    /// Nada é escrito se a estrutura inteira não couber.
    pub fn push_structure(&mut self, ad_type: u8, parts: &[&[u8]]) -> Result<usize, EncodeError> {
        let data_len: usize = parts.iter().map(|p| p.len()).sum();
        if data_len > MAX_STRUCTURE_DATA {
            return Err(EncodeError::InvalidLength(data_len));
        }

        let needed = 2 + data_len;
        let dest = &mut self.buf[self.len..];
        if dest.len() < needed {
            return Err(EncodeError::InsufficientCapacity {
                needed,
                available: dest.len(),
            });
        }

        dest[0] = (data_len + 1) as u8;
        dest[1] = ad_type;
        let mut at = 2;
        for part in parts {
            dest[at..at + part.len()].copy_from_slice(part);
            at += part.len();
        }

        self.len += needed;
        Ok(needed)
    }

    pub fn flags(&mut self, flags: u8) -> Result<&mut Self, EncodeError> {
        self.push_structure(AD_TYPE_FLAGS, &[&[flags]])?;
        Ok(self)
    }

    /// Nome completo do dispositivo. Um nome que não cabe é rejeitado.
    pub fn complete_local_name(&mut self, name: &str) -> Result<&mut Self, EncodeError> {
        self.push_structure(AD_TYPE_COMPLETE_LOCAL_NAME, &[name.as_bytes()])?;
        Ok(self)
    }

    pub fn tx_power(&mut self, dbm: i8) -> Result<&mut Self, EncodeError> {
        self.push_structure(AD_TYPE_TX_POWER_LEVEL, &[&dbm.to_le_bytes()])?;
        Ok(self)
    }

    pub fn service_data(&mut self, uuid: u16, data: &[u8]) -> Result<&mut Self, EncodeError> {
        self.push_structure(AD_TYPE_SERVICE_DATA_16, &[&uuid.to_le_bytes(), data])?;
        Ok(self)
    }

    /// Service data com o UUID BTHome não criptografado.
    pub fn bthome(&mut self, packet: &[u8]) -> Result<&mut Self, EncodeError> {
        self.service_data(UNENCRYPTED_SERVICE_UUID, packet)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.len
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    pub fn finish(self) -> &'a [u8] {
        let Self { buf, len } = self;
        &buf[..len]
    }
}
