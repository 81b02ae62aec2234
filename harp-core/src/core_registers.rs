//! Registradores comuns a todo dispositivo Harp (endereços 0..=14)

use crate::register;

register! {
    /// Identificador do dispositivo
    pub struct WhoAmI: u16 = 0, READ;
}

register! {
    pub struct HardwareVersionHigh: u8 = 1, READ;
}

register! {
    pub struct HardwareVersionLow: u8 = 2, READ;
}

register! {
    pub struct AssemblyVersion: u8 = 3, READ;
}

register! {
    pub struct CoreVersionHigh: u8 = 4, READ;
}

register! {
    pub struct CoreVersionLow: u8 = 5, READ;
}

register! {
    pub struct FirmwareVersionHigh: u8 = 6, READ;
}

register! {
    pub struct FirmwareVersionLow: u8 = 7, READ;
}

register! {
    /// Segundos do relógio do dispositivo
    pub struct TimestampSeconds: u32 = 8, WRITE_EVENT;
}

register! {
    /// Fração do relógio em ticks de 32 µs
    pub struct TimestampMicroseconds: u16 = 9, READ;
}

register! {
    /// Modo de operação (standby/active, eco de comandos, LEDs)
    pub struct OperationControl: u8 = 10, WRITE;
}

register! {
    pub struct ResetDevice: u8 = 11, WRITE;
}

register! {
    /// Nome do dispositivo (ASCII, terminado em zero)
    pub struct DeviceName: [u8; 25] = 12, WRITE;
}

register! {
    pub struct SerialNumber: u16 = 13, WRITE;
}

register! {
    pub struct ClockConfiguration: u8 = 14, WRITE;
}

/// Converte o payload de [`DeviceName`] em texto
pub fn device_name(bytes: &[u8; 25]) -> String {
    let end = bytes.iter().position(|b| *b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::MessageType;
    use crate::register::{Access, Register};

    #[test]
    fn who_am_i_is_u16_at_zero() {
        let info = WhoAmI::info();
        assert_eq!(info.address, 0);
        assert_eq!(info.access, Access::READ);
        let msg = WhoAmI::from_payload(MessageType::Read, &1140).unwrap();
        assert_eq!(msg.payload(), &[0x74, 0x04]);
    }

    #[test]
    fn device_name_stops_at_nul() {
        let mut raw = [0u8; 25];
        raw[..12].copy_from_slice(b"Olfactometer");
        assert_eq!(device_name(&raw), "Olfactometer");
    }
}
