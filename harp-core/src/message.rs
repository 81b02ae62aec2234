//! # Frame Harp
//!
//! Formato binário de uma mensagem Harp (little-endian):
//!
//! ```text
//! ┌──────┬────────┬─────────┬──────┬──────────────┬─────────────┬─────────┬──────────┐
//! │ type │ length │ address │ port │ payload type │ timestamp?  │ payload │ checksum │
//! │  1   │   1    │    1    │  1   │      1       │ 4 + 2 (opt) │   N     │    1     │
//! └──────┴────────┴─────────┴──────┴──────────────┴─────────────┴─────────┴──────────┘
//! ```
//!
//! - `length` conta todos os bytes depois dele (frame total − 2)
//! - `checksum` é a soma (wrapping) de todos os bytes anteriores
//! - timestamp: segundos (u32) + ticks de 32 µs (u16)

use bytes::{Buf, BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{HarpError, HarpResult};

/// Porta padrão (dispositivo local)
pub const DEFAULT_PORT: u8 = 0xFF;

/// Bit de erro no tipo de mensagem
pub const ERROR_FLAG: u8 = 0x08;

/// Bit de timestamp no tipo de payload
pub const TIMESTAMP_FLAG: u8 = 0x10;

/// Duração de um tick do timestamp (s)
pub const TICK_SECONDS: f64 = 32e-6;

/// Cabeçalho sem timestamp: type, length, address, port, payload type
const HEADER_SIZE: usize = 5;

/// Bytes de timestamp (u32 + u16)
const TIMESTAMP_SIZE: usize = 6;

/// Maior frame representável (length é u8)
pub const MAX_FRAME_SIZE: usize = u8::MAX as usize + 2;

// ═══════════════════════════════════════════════════════════════════════════════
// TIPOS
// ═══════════════════════════════════════════════════════════════════════════════

/// Tipo de mensagem Harp
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum MessageType {
    /// Leitura de registrador
    Read = 0x01,
    /// Escrita em registrador
    Write = 0x02,
    /// Evento emitido pelo dispositivo
    Event = 0x03,
}

impl MessageType {
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            0x01 => Some(Self::Read),
            0x02 => Some(Self::Write),
            0x03 => Some(Self::Event),
            _ => None,
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Read => "Read",
            Self::Write => "Write",
            Self::Event => "Event",
        };
        f.write_str(name)
    }
}

/// Tipo de elemento do payload
///
/// O nibble baixo do código é o tamanho do elemento em bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum PayloadType {
    U8 = 0x01,
    S8 = 0x81,
    U16 = 0x02,
    S16 = 0x82,
    U32 = 0x04,
    S32 = 0x84,
    U64 = 0x08,
    S64 = 0x88,
    Float = 0x44,
}

impl PayloadType {
    /// Decodifica o código sem o bit de timestamp
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            0x01 => Some(Self::U8),
            0x81 => Some(Self::S8),
            0x02 => Some(Self::U16),
            0x82 => Some(Self::S16),
            0x04 => Some(Self::U32),
            0x84 => Some(Self::S32),
            0x08 => Some(Self::U64),
            0x88 => Some(Self::S64),
            0x44 => Some(Self::Float),
            _ => None,
        }
    }

    /// Tamanho de um elemento em bytes
    #[inline]
    pub const fn element_size(self) -> usize {
        (self as u8 & 0x0F) as usize
    }

    #[inline]
    pub const fn is_signed(self) -> bool {
        self as u8 & 0x80 != 0
    }

    #[inline]
    pub const fn is_float(self) -> bool {
        self as u8 & 0x40 != 0
    }
}

impl fmt::Display for PayloadType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::U8 => "U8",
            Self::S8 => "S8",
            Self::U16 => "U16",
            Self::S16 => "S16",
            Self::U32 => "U32",
            Self::S32 => "S32",
            Self::U64 => "U64",
            Self::S64 => "S64",
            Self::Float => "Float",
        };
        f.write_str(name)
    }
}

/// Timestamp do relógio do dispositivo
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Timestamp {
    /// Segundos inteiros
    pub seconds: u32,
    /// Fração em ticks de 32 µs
    pub ticks: u16,
}

impl Timestamp {
    pub const fn new(seconds: u32, ticks: u16) -> Self {
        Self { seconds, ticks }
    }

    /// Converte segundos fracionários, arredondando para o tick mais próximo
    pub fn from_seconds(value: f64) -> Self {
        let value = value.max(0.0);
        let mut seconds = value.trunc() as u32;
        let mut ticks = (value.fract() / TICK_SECONDS).round() as u32;
        // 31250 ticks = 1 s
        if ticks >= 31_250 {
            seconds = seconds.saturating_add(1);
            ticks = 0;
        }
        Self { seconds, ticks: ticks as u16 }
    }

    /// Tempo total em segundos
    #[inline]
    pub fn as_seconds(&self) -> f64 {
        self.seconds as f64 + self.ticks as f64 * TICK_SECONDS
    }
}

/// Checksum Harp: soma wrapping de todos os bytes
#[inline]
pub fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |acc, b| acc.wrapping_add(*b))
}

// ═══════════════════════════════════════════════════════════════════════════════
// MENSAGEM
// ═══════════════════════════════════════════════════════════════════════════════

/// Mensagem Harp completa
#[derive(Debug, Clone, PartialEq)]
pub struct HarpMessage {
    message_type: MessageType,
    error: bool,
    address: u8,
    port: u8,
    payload_type: PayloadType,
    timestamp: Option<Timestamp>,
    payload: Bytes,
}

impl HarpMessage {
    /// Cria mensagem sem timestamp
    pub fn new(
        message_type: MessageType,
        address: u8,
        payload_type: PayloadType,
        payload: &[u8],
    ) -> HarpResult<Self> {
        Self::build(message_type, address, payload_type, None, payload)
    }

    /// Cria mensagem com timestamp
    pub fn with_timestamp(
        message_type: MessageType,
        address: u8,
        payload_type: PayloadType,
        timestamp: Timestamp,
        payload: &[u8],
    ) -> HarpResult<Self> {
        Self::build(message_type, address, payload_type, Some(timestamp), payload)
    }

    fn build(
        message_type: MessageType,
        address: u8,
        payload_type: PayloadType,
        timestamp: Option<Timestamp>,
        payload: &[u8],
    ) -> HarpResult<Self> {
        if payload.len() % payload_type.element_size() != 0 {
            return Err(HarpError::InvalidPayloadSize(format!(
                "{} bytes is not a multiple of {} element size",
                payload.len(),
                payload_type
            )));
        }

        let frame_size = Self::frame_size(timestamp.is_some(), payload.len());
        if frame_size > MAX_FRAME_SIZE {
            return Err(HarpError::InvalidPayloadSize(format!(
                "{} bytes exceeds frame capacity",
                payload.len()
            )));
        }

        Ok(Self {
            message_type,
            error: false,
            address,
            port: DEFAULT_PORT,
            payload_type,
            timestamp,
            payload: Bytes::copy_from_slice(payload),
        })
    }

    /// Marca a mensagem como resposta de erro
    pub fn into_error(mut self) -> Self {
        self.error = true;
        self
    }

    /// Define a porta (dispositivos em hub)
    pub fn with_port(mut self, port: u8) -> Self {
        self.port = port;
        self
    }

    #[inline]
    fn frame_size(has_timestamp: bool, payload_len: usize) -> usize {
        let ts = if has_timestamp { TIMESTAMP_SIZE } else { 0 };
        HEADER_SIZE + ts + payload_len + 1
    }

    /// Decodifica um frame completo
    pub fn parse(frame: &[u8]) -> HarpResult<Self> {
        if frame.len() < HEADER_SIZE + 1 {
            return Err(HarpError::FrameTooShort(frame.len()));
        }

        let declared = frame[1] as usize + 2;
        if declared != frame.len() {
            return Err(HarpError::LengthMismatch {
                declared,
                actual: frame.len(),
            });
        }

        let (body, tail) = frame.split_at(frame.len() - 1);
        let expected = checksum(body);
        if expected != tail[0] {
            return Err(HarpError::ChecksumMismatch {
                expected,
                actual: tail[0],
            });
        }

        let mut buf = body;
        let type_byte = buf.get_u8();
        let _length = buf.get_u8();
        let address = buf.get_u8();
        let port = buf.get_u8();
        let payload_byte = buf.get_u8();

        let message_type = MessageType::from_byte(type_byte & !ERROR_FLAG)
            .ok_or(HarpError::UnknownMessageType(type_byte))?;
        let error = type_byte & ERROR_FLAG != 0;

        let payload_type = PayloadType::from_byte(payload_byte & !TIMESTAMP_FLAG)
            .ok_or(HarpError::UnknownPayloadType(payload_byte))?;

        let timestamp = if payload_byte & TIMESTAMP_FLAG != 0 {
            if buf.remaining() < TIMESTAMP_SIZE {
                return Err(HarpError::FrameTooShort(frame.len()));
            }
            let seconds = buf.get_u32_le();
            let ticks = buf.get_u16_le();
            Some(Timestamp { seconds, ticks })
        } else {
            None
        };

        if buf.remaining() % payload_type.element_size() != 0 {
            return Err(HarpError::InvalidPayloadSize(format!(
                "{} bytes is not a multiple of {} element size",
                buf.remaining(),
                payload_type
            )));
        }

        Ok(Self {
            message_type,
            error,
            address,
            port,
            payload_type,
            timestamp,
            payload: Bytes::copy_from_slice(buf),
        })
    }

    /// Serializa para o formato wire
    pub fn to_bytes(&self) -> Bytes {
        let size = Self::frame_size(self.timestamp.is_some(), self.payload.len());
        let mut buf = BytesMut::with_capacity(size);

        let mut type_byte = self.message_type as u8;
        if self.error {
            type_byte |= ERROR_FLAG;
        }
        let mut payload_byte = self.payload_type as u8;
        if self.timestamp.is_some() {
            payload_byte |= TIMESTAMP_FLAG;
        }

        buf.put_u8(type_byte);
        buf.put_u8((size - 2) as u8);
        buf.put_u8(self.address);
        buf.put_u8(self.port);
        buf.put_u8(payload_byte);
        if let Some(ts) = self.timestamp {
            buf.put_u32_le(ts.seconds);
            buf.put_u16_le(ts.ticks);
        }
        buf.put_slice(&self.payload);
        let sum = checksum(&buf);
        buf.put_u8(sum);

        buf.freeze()
    }

    #[inline]
    pub fn message_type(&self) -> MessageType {
        self.message_type
    }

    #[inline]
    pub fn is_error(&self) -> bool {
        self.error
    }

    #[inline]
    pub fn address(&self) -> u8 {
        self.address
    }

    #[inline]
    pub fn port(&self) -> u8 {
        self.port
    }

    #[inline]
    pub fn payload_type(&self) -> PayloadType {
        self.payload_type
    }

    #[inline]
    pub fn timestamp(&self) -> Option<Timestamp> {
        self.timestamp
    }

    /// Bytes do payload (sem timestamp)
    #[inline]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Número de elementos no payload
    #[inline]
    pub fn element_count(&self) -> usize {
        self.payload.len() / self.payload_type.element_size()
    }
}

impl fmt::Display for HarpMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message_type)?;
        if self.error {
            f.write_str("Error")?;
        }
        write!(f, " @{} {}", self.address, self.payload_type)?;
        if let Some(ts) = self.timestamp {
            write!(f, " t={:.6}", ts.as_seconds())?;
        }
        write!(f, " [")?;
        for (i, b) in self.payload.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{:02X}", b)?;
        }
        f.write_str("]")
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// COMANDOS
// ═══════════════════════════════════════════════════════════════════════════════

/// Construtores de comandos host → dispositivo
pub struct HarpCommand;

impl HarpCommand {
    /// Pedido de leitura (sem payload)
    pub fn read(address: u8, payload_type: PayloadType) -> HarpMessage {
        HarpMessage {
            message_type: MessageType::Read,
            error: false,
            address,
            port: DEFAULT_PORT,
            payload_type,
            timestamp: None,
            payload: Bytes::new(),
        }
    }

    /// Pedido de escrita com payload já codificado
    pub fn write(address: u8, payload_type: PayloadType, payload: &[u8]) -> HarpResult<HarpMessage> {
        HarpMessage::new(MessageType::Write, address, payload_type, payload)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// DECODIFICADOR DE STREAM
// ═══════════════════════════════════════════════════════════════════════════════

/// Acumula bytes recebidos e extrai frames completos
///
/// Em caso de checksum inválido descarta um byte e ressincroniza.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buffer: BytesMut,
    discarded: u64,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adiciona bytes recebidos
    pub fn extend(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Bytes descartados durante ressincronização
    pub fn discarded(&self) -> u64 {
        self.discarded
    }

    /// Bytes pendentes no buffer
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Próximo frame completo, se houver
    pub fn next_frame(&mut self) -> Option<HarpResult<HarpMessage>> {
        loop {
            if self.buffer.len() < 2 {
                return None;
            }

            let total = self.buffer[1] as usize + 2;
            if total < HEADER_SIZE + 1 {
                self.skip_byte();
                continue;
            }
            if self.buffer.len() < total {
                return None;
            }

            match HarpMessage::parse(&self.buffer[..total]) {
                Ok(msg) => {
                    self.buffer.advance(total);
                    return Some(Ok(msg));
                }
                Err(HarpError::ChecksumMismatch { .. }) => {
                    self.skip_byte();
                }
                Err(e) => {
                    self.buffer.advance(total);
                    return Some(Err(e));
                }
            }
        }
    }

    fn skip_byte(&mut self) {
        self.buffer.advance(1);
        self.discarded += 1;
        tracing::trace!(discarded = self.discarded, "resync: dropped byte");
    }
}
