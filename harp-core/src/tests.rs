//! Testes do módulo harp-core

use super::*;
use crate::core_registers::{DeviceName, SerialNumber, TimestampSeconds, WhoAmI};

// ═══════════════════════════════════════════════════════════════════════════════
// TESTES DE WIRE
// ═══════════════════════════════════════════════════════════════════════════════

/// Transporte que passa tudo pelo formato wire
struct WireTransport {
    device: LoopbackTransport,
    decoder: FrameDecoder,
}

impl Transport for WireTransport {
    fn send(&mut self, message: &HarpMessage) -> HarpResult<()> {
        let parsed = HarpMessage::parse(&message.to_bytes())?;
        self.device.send(&parsed)?;
        while let Some(reply) = self.device.recv()? {
            self.decoder.extend(&reply.to_bytes());
        }
        Ok(())
    }

    fn recv(&mut self) -> HarpResult<Option<HarpMessage>> {
        self.decoder.next_frame().transpose()
    }
}

#[test]
fn test_device_over_wire() {
    let transport = WireTransport {
        device: LoopbackTransport::new().with_register::<WhoAmI>(&1140),
        decoder: FrameDecoder::new(),
    };
    let mut device = Device::new(transport);

    assert_eq!(device.who_am_i().unwrap(), 1140);

    let mut name = [0u8; 25];
    name[..4].copy_from_slice(b"Olfa");
    device.write::<DeviceName>(&name).unwrap();
    let back = device.read::<DeviceName>().unwrap();
    assert_eq!(core_registers::device_name(&back), "Olfa");
}

#[test]
fn test_event_stream_from_bytes() {
    let mut wire = Vec::new();
    for s in 0..5u32 {
        let msg = TimestampSeconds::from_timestamped_payload(s as f64, MessageType::Event, &s).unwrap();
        wire.extend_from_slice(&msg.to_bytes());
    }
    wire.extend_from_slice(&SerialNumber::from_payload(MessageType::Write, &3).unwrap().to_bytes());

    let mut decoder = FrameDecoder::new();
    decoder.extend(&wire);
    let messages = std::iter::from_fn(|| decoder.next_frame()).map(|r| r.unwrap());

    let seconds: Vec<u32> = messages
        .events()
        .parse_register::<TimestampSeconds>()
        .map(|r| r.unwrap())
        .collect();
    assert_eq!(seconds, vec![0, 1, 2, 3, 4]);
}

#[test]
fn test_display_message() {
    let msg = SerialNumber::from_payload(MessageType::Write, &0x0102).unwrap();
    assert_eq!(msg.to_string(), "Write @13 U16 [02 01]");
}

#[test]
fn test_register_info_display() {
    let line = WhoAmI::info().to_string();
    assert!(line.contains("WhoAmI"));
    assert!(line.ends_with("R"));
}
