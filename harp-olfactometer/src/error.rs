//! Erros do Olfactometer

use harp_core::HarpError;
use thiserror::Error;

pub type OlfactometerResult<T> = Result<T, OlfactometerError>;

#[derive(Debug, Error)]
pub enum OlfactometerError {
    /// Erro do protocolo ou do transporte
    #[error(transparent)]
    Harp(#[from] HarpError),

    /// WhoAmI diferente de 1140
    #[error("Unexpected device: WhoAmI is {actual}, expected {expected}")]
    UnexpectedDevice { expected: u16, actual: u16 },

    /// Canal de odor inexistente
    #[error("Invalid channel index {0}: odor channels are 0..=3")]
    InvalidChannel(usize),

    /// Canal 3 em modo carrier não aceita concentração
    #[error("Channel 3 is configured as carrier")]
    ChannelIsCarrier,

    /// Porcentagem fora de [0, 1]
    #[error("Invalid percentage {value} for channel {channel}: must be within [0, 1]")]
    InvalidPercentage { channel: usize, value: f64 },

    /// Configuração inválida
    #[error("Configuration error: {0}")]
    Config(String),

    /// Falha ao montar a imagem de EEPROM
    #[error("EEPROM error: {0}")]
    Eeprom(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn harp_errors_are_transparent() {
        let err: OlfactometerError = HarpError::NoReply(90).into();
        assert_eq!(err.to_string(), "No reply for register 90");
    }

    #[test]
    fn channel_errors() {
        assert!(OlfactometerError::InvalidChannel(4).to_string().contains('4'));
        assert_eq!(
            OlfactometerError::ChannelIsCarrier.to_string(),
            "Channel 3 is configured as carrier"
        );
    }
}
