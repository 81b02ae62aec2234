//! Erros do protocolo Harp

use thiserror::Error;

pub type HarpResult<T> = Result<T, HarpError>;

/// Erros de codificação, decodificação e transporte de mensagens Harp
#[derive(Debug, Error, Clone, PartialEq)]
pub enum HarpError {
    /// Frame menor que o cabeçalho mínimo
    #[error("Frame too short: {0} bytes")]
    FrameTooShort(usize),

    /// Campo length não bate com o tamanho do frame
    #[error("Length mismatch: header says {declared}, frame has {actual}")]
    LengthMismatch { declared: usize, actual: usize },

    /// Checksum inválido
    #[error("Checksum mismatch: expected 0x{expected:02X}, got 0x{actual:02X}")]
    ChecksumMismatch { expected: u8, actual: u8 },

    /// Código de tipo de mensagem desconhecido
    #[error("Unknown message type: 0x{0:02X}")]
    UnknownMessageType(u8),

    /// Código de tipo de payload desconhecido
    #[error("Unknown payload type: 0x{0:02X}")]
    UnknownPayloadType(u8),

    /// Payload com tamanho incompatível
    #[error("Invalid payload size: {0}")]
    InvalidPayloadSize(String),

    /// Mensagem de outro registrador
    #[error("Address mismatch: expected {expected}, got {actual}")]
    AddressMismatch { expected: u8, actual: u8 },

    /// Tipo de payload diferente do registrador
    #[error("Payload type mismatch on register {address}: expected {expected}, got {actual}")]
    PayloadTypeMismatch {
        address: u8,
        expected: String,
        actual: String,
    },

    /// Valor fora do domínio do tipo
    #[error("Invalid value: {0}")]
    InvalidValue(String),

    /// Dispositivo respondeu com flag de erro
    #[error("Device replied with error to {message_type} on register {address}")]
    DeviceError { address: u8, message_type: String },

    /// Sem resposta do transporte
    #[error("No reply for register {0}")]
    NoReply(u8),

    /// Falha de transporte
    #[error("Transport error: {0}")]
    Transport(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum_display() {
        let err = HarpError::ChecksumMismatch { expected: 0x0A, actual: 0xFF };
        assert_eq!(err.to_string(), "Checksum mismatch: expected 0x0A, got 0xFF");
    }

    #[test]
    fn test_no_reply_display() {
        let err = HarpError::NoReply(32);
        assert!(err.to_string().contains("32"));
    }
}
