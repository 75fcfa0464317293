//! Encoder de objetos BTHome.
//!
//! Cada função escreve um objeto completo (header + valor) no início do
//! slice de destino e retorna quantos bytes foram escritos. O tamanho do
//! slice é a capacidade restante: o chamador passa `&mut buf[offset..]`.
//!
//! Nenhuma função escreve parcialmente. A capacidade é verificada antes do
//! primeiro byte, então uma falha deixa o destino intacto.

use crate::constants::{
    DataType, OBJECT_FORMAT_SHIFT, OBJECT_HEADER_LEN, OBJECT_LENGTH_MASK, MAX_OBJECT_LENGTH,
    ObjectFormat,
};

/// Maior largura de valor suportada pelo escritor escalar.
const MAX_VALUE_WIDTH: usize = 4;

/// Erros do encoder.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EncodeError {
    #[error("Espaço insuficiente: {needed} bytes necessários, {available} disponíveis")]
    InsufficientCapacity { needed: usize, available: usize },

    #[error("Valor fora do intervalo representável para {field}: {value}")]
    OutOfRange { field: DataType, value: f64 },

    #[error("Valor 0x{value:X} não cabe em {width} bytes")]
    ValueTooWide { value: u32, width: usize },

    #[error("Tamanho de valor inválido: {0} bytes")]
    InvalidLength(usize),
}

/// Descrição fixa de um campo: formato, largura e escala.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSpec {
    pub data_type: DataType,
    pub format: ObjectFormat,
    /// Bytes do valor (sem header)
    pub width: usize,
    /// Fator aplicado ao valor físico antes do truncamento
    pub scale: f64,
}

pub const PACKET_ID: FieldSpec = FieldSpec {
    data_type: DataType::PacketId,
    format: ObjectFormat::UnsignedInt,
    width: 1,
    scale: 1.0,
};

pub const TEMPERATURE: FieldSpec = FieldSpec {
    data_type: DataType::Temperature,
    format: ObjectFormat::SignedInt,
    width: 2,
    scale: 100.0,
};

pub const HUMIDITY: FieldSpec = FieldSpec {
    data_type: DataType::Humidity,
    format: ObjectFormat::UnsignedInt,
    width: 2,
    scale: 100.0,
};

pub const BATTERY: FieldSpec = FieldSpec {
    data_type: DataType::Battery,
    format: ObjectFormat::UnsignedInt,
    width: 2,
    scale: 1.0,
};

pub const PRESSURE: FieldSpec = FieldSpec {
    data_type: DataType::Pressure,
    format: ObjectFormat::UnsignedInt,
    width: 3,
    scale: 100.0,
};

impl FieldSpec {
    /// Retorna a especificação do campo para um data type.
    pub fn for_type(data_type: DataType) -> &'static FieldSpec {
        match data_type {
            DataType::PacketId => &PACKET_ID,
            DataType::Temperature => &TEMPERATURE,
            DataType::Humidity => &HUMIDITY,
            DataType::Battery => &BATTERY,
            DataType::Pressure => &PRESSURE,
        }
    }

    /// Bytes ocupados pelo objeto completo (header + valor).
    pub const fn encoded_len(&self) -> usize {
        OBJECT_HEADER_LEN + self.width
    }

    fn mask(&self) -> u32 {
        width_mask(self.width)
    }

    /// Limites inteiros do valor já escalado.
    fn bounds(&self) -> (f64, f64) {
        let bits = (self.width * 8) as i32;
        match self.format {
            ObjectFormat::SignedInt => {
                let half = 2f64.powi(bits - 1);
                (-half, half - 1.0)
            }
            _ => (0.0, f64::from(self.mask())),
        }
    }

    /// Converte o valor físico em inteiro de ponto fixo, truncando para zero.
    ///
    /// Valores não finitos ou fora da largura do campo são rejeitados.
    pub fn scale_value(&self, value: f32) -> Result<u32, EncodeError> {
        let scaled = (f64::from(value) * self.scale).trunc();
        let (min, max) = self.bounds();
        if !scaled.is_finite() || scaled < min || scaled > max {
            return Err(EncodeError::OutOfRange {
                field: self.data_type,
                value: f64::from(value),
            });
        }
        // Complemento de dois truncado na largura do campo
        Ok((scaled as i64 as u32) & self.mask())
    }
}

fn width_mask(width: usize) -> u32 {
    if width >= MAX_VALUE_WIDTH {
        u32::MAX
    } else {
        (1u32 << (width * 8)) - 1
    }
}

fn ensure_capacity(needed: usize, dest: &[u8]) -> Result<(), EncodeError> {
    if dest.len() < needed {
        return Err(EncodeError::InsufficientCapacity {
            needed,
            available: dest.len(),
        });
    }
    Ok(())
}

// ──────────────────────────────────────────────
// Primitivas
// ──────────────────────────────────────────────

/// Escreve o header de 2 bytes de um objeto.
///
/// `data_len` é o número de bytes do valor; o tamanho declarado no header é
/// `data_len + 1` para incluir o byte de data type.
pub fn write_object_info(
    format: ObjectFormat,
    data_type: DataType,
    data_len: usize,
    dest: &mut [u8],
) -> Result<usize, EncodeError> {
    if data_len == 0 || data_len + 1 > MAX_OBJECT_LENGTH {
        return Err(EncodeError::InvalidLength(data_len));
    }
    ensure_capacity(OBJECT_HEADER_LEN, dest)?;

    dest[0] = ((format as u8) << OBJECT_FORMAT_SHIFT) | (data_len as u8 + 1);
    dest[1] = data_type as u8;

    Ok(OBJECT_HEADER_LEN)
}

/// Escreve `value` em little-endian usando exatamente `width` bytes.
pub fn write_data_bytes(value: u32, width: usize, dest: &mut [u8]) -> Result<usize, EncodeError> {
    if width == 0 || width > MAX_VALUE_WIDTH {
        return Err(EncodeError::InvalidLength(width));
    }
    if value & !width_mask(width) != 0 {
        return Err(EncodeError::ValueTooWide { value, width });
    }
    ensure_capacity(width, dest)?;

    dest[..width].copy_from_slice(&value.to_le_bytes()[..width]);
    Ok(width)
}

/// Separa o byte de info em (formato, tamanho declarado).
pub fn decode_object_info(info: u8) -> (Option<ObjectFormat>, usize) {
    (
        ObjectFormat::from_bits(info >> OBJECT_FORMAT_SHIFT),
        (info & OBJECT_LENGTH_MASK) as usize,
    )
}

/// Escreve um objeto cujo valor já está em ponto fixo.
pub fn write_object(field: &FieldSpec, raw: u32, dest: &mut [u8]) -> Result<usize, EncodeError> {
    ensure_capacity(field.encoded_len(), dest)?;
    if raw & !field.mask() != 0 {
        return Err(EncodeError::ValueTooWide {
            value: raw,
            width: field.width,
        });
    }

    let (header, body) = dest.split_at_mut(OBJECT_HEADER_LEN);
    let mut written = write_object_info(field.format, field.data_type, field.width, header)?;
    written += write_data_bytes(raw, field.width, body)?;
    Ok(written)
}

fn write_scaled(field: &FieldSpec, value: f32, dest: &mut [u8]) -> Result<usize, EncodeError> {
    let raw = field.scale_value(value)?;
    write_object(field, raw, dest)
}

// ──────────────────────────────────────────────
// Campos
// ──────────────────────────────────────────────

/// Contador rotativo de pacotes (u8, sem escala).
pub fn packet_id(id: u8, dest: &mut [u8]) -> Result<usize, EncodeError> {
    write_object(&PACKET_ID, u32::from(id), dest)
}

/// Temperatura em °C (i16, resolução 0.01).
pub fn temperature(celsius: f32, dest: &mut [u8]) -> Result<usize, EncodeError> {
    write_scaled(&TEMPERATURE, celsius, dest)
}

/// Umidade relativa em % (u16, resolução 0.01).
pub fn humidity(percent: f32, dest: &mut [u8]) -> Result<usize, EncodeError> {
    write_scaled(&HUMIDITY, percent, dest)
}

/// Bateria em % inteiro (u16, sem escala).
pub fn battery(percent: f32, dest: &mut [u8]) -> Result<usize, EncodeError> {
    write_scaled(&BATTERY, percent, dest)
}

/// Pressão em hPa (u24, resolução 0.01).
pub fn pressure(hpa: f32, dest: &mut [u8]) -> Result<usize, EncodeError> {
    write_scaled(&PRESSURE, hpa, dest)
}

// ──────────────────────────────────────────────
// Testes
// ──────────────────────────────────────────────
