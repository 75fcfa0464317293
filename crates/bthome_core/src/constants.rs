//! Constantes do formato BTHome (v1, sem criptografia).
//!
//! Cada objeto no pacote é formado por um header de 2 bytes seguido do
//! valor em little-endian:
//!
//! ```text
//! ┌───────────────────────────┬───────────────┬──────────────┐
//! │ Formato(3b) | Tamanho(5b) │ Data type (1) │ Valor (1..N) │
//! └───────────────────────────┴───────────────┴──────────────┘
//! ```
//!
//! O campo `Tamanho` conta o byte de data type mais os bytes do valor.

/// UUID de serviço BTHome para payloads não criptografados.
pub const UNENCRYPTED_SERVICE_UUID: u16 = 0x181C;

/// Tamanho do header de objeto (info + data type).
pub const OBJECT_HEADER_LEN: usize = 2;

/// Deslocamento do formato no byte de info.
pub const OBJECT_FORMAT_SHIFT: u8 = 5;

/// Máscara do tamanho (5 bits baixos).
pub const OBJECT_LENGTH_MASK: u8 = 0x1F;

/// Maior valor declarável no campo de tamanho, já incluindo o byte de data type.
pub const MAX_OBJECT_LENGTH: usize = OBJECT_LENGTH_MASK as usize;

/// Limite de advertising data em BLE legacy.
pub const MAX_LEGACY_ADV_LEN: usize = 31;

/// Limite de advertising data em BLE extended (buffer do firmware).
pub const MAX_EXTENDED_ADV_LEN: usize = 255;

/// Classe de formato do valor (3 bits altos do byte de info).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ObjectFormat {
    UnsignedInt = 0,
    SignedInt = 1,
}

impl ObjectFormat {
    /// Converte os 3 bits de formato de volta para o enum.
    pub fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            0 => Some(Self::UnsignedInt),
            1 => Some(Self::SignedInt),
            _ => None,
        }
    }
}

/// Identificador do tipo de dado (registro de objetos BTHome).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum DataType {
    PacketId = 0x00,
    Battery = 0x01,
    Temperature = 0x02,
    Humidity = 0x03,
    Pressure = 0x04,
}

impl DataType {
    /// Nome curto usado em logs e mensagens de erro.
    pub fn name(self) -> &'static str {
        match self {
            Self::PacketId => "packet_id",
            Self::Battery => "battery",
            Self::Temperature => "temperature",
            Self::Humidity => "humidity",
            Self::Pressure => "pressure",
        }
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
