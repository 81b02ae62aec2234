//! # EEPROM de calibração
//!
//! Gera a imagem Intel HEX gravada na EEPROM do Olfactometer a partir de
//! uma tabela CSV de calibração.
//!
//! ```text
//! registro   0      FF FF FF FF [serial BE] FF ... FF
//! registro   1..99  FF × 16
//! registro 100..111 linhas 0..5 da tabela, 8 valores u16 BE por registro
//! registro 112..127 FF × 16
//! ```
//!
//! A temperatura vai no byte alto do primeiro valor zero da última linha.

use std::fmt::Write as _;
use std::path::Path;

use bytes::{BufMut, BytesMut};

use crate::error::{OlfactometerError, OlfactometerResult};

/// Registros de 16 bytes na imagem
pub const RECORD_COUNT: usize = 128;
pub const RECORD_SIZE: usize = 16;
/// Primeiro registro da tabela de calibração
pub const CALIBRATION_RECORD: usize = 100;
/// Linhas da tabela gravadas na EEPROM
pub const CALIBRATION_ROWS: usize = 6;
pub const VALUES_PER_ROW: usize = 16;

const FILL: u8 = 0xFF;
const SERIAL_OFFSET: usize = 4;

/// Tabela de calibração lida de CSV
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CalibrationTable {
    rows: Vec<[u16; VALUES_PER_ROW]>,
}

impl CalibrationTable {
    /// Lê linhas de até 16 inteiros decimais separados por vírgula
    ///
    /// Colunas ausentes valem zero. Linhas vazias são ignoradas de propósito,
    /// para aceitar arquivos com linha final em branco; um campo vazio dentro
    /// de uma linha continua sendo erro.
    pub fn parse_csv(text: &str) -> OlfactometerResult<Self> {
        let mut rows = Vec::new();
        for (number, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let mut row = [0u16; VALUES_PER_ROW];
            for (column, field) in line.split(',').enumerate() {
                let slot = row.get_mut(column).ok_or_else(|| {
                    OlfactometerError::Eeprom(format!(
                        "line {}: more than {VALUES_PER_ROW} values",
                        number + 1
                    ))
                })?;
                *slot = field.trim().parse().map_err(|_| {
                    OlfactometerError::Eeprom(format!(
                        "line {}, column {}: {:?} is not a 16-bit unsigned value",
                        number + 1,
                        column + 1,
                        field.trim()
                    ))
                })?;
            }
            rows.push(row);
        }
        Ok(Self { rows })
    }

    pub fn from_csv_file(path: impl AsRef<Path>) -> OlfactometerResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::parse_csv(&text)
    }

    pub fn rows(&self) -> &[[u16; VALUES_PER_ROW]] {
        &self.rows
    }
}

/// Imagem da EEPROM em registros de 16 bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EepromImage {
    records: Vec<[u8; RECORD_SIZE]>,
}

impl EepromImage {
    /// Monta a imagem com número de série e temperatura de calibração
    pub fn generate(table: &CalibrationTable, serial_number: u16, temperature: u8) -> OlfactometerResult<Self> {
        let rows = table.rows();
        if rows.len() < CALIBRATION_ROWS {
            return Err(OlfactometerError::Eeprom(format!(
                "calibration table has {} rows, {CALIBRATION_ROWS} required",
                rows.len()
            )));
        }

        let mut records = vec![[FILL; RECORD_SIZE]; RECORD_COUNT];
        records[0][SERIAL_OFFSET..SERIAL_OFFSET + 2].copy_from_slice(&serial_number.to_be_bytes());

        for (k, row) in rows.iter().take(CALIBRATION_ROWS).enumerate() {
            let mut row = *row;
            if k == CALIBRATION_ROWS - 1 {
                let slot = row.iter_mut().find(|v| **v == 0).ok_or_else(|| {
                    OlfactometerError::Eeprom("no free slot for the temperature in the last row".into())
                })?;
                *slot = (*slot & 0x00FF) | (u16::from(temperature) << 8);
            }

            let (first, second) = row.split_at(VALUES_PER_ROW / 2);
            let index = CALIBRATION_RECORD + 2 * k;
            records[index] = record(first);
            records[index + 1] = record(second);
        }

        tracing::debug!(serial_number, temperature, "eeprom image generated");
        Ok(Self { records })
    }

    pub fn records(&self) -> &[[u8; RECORD_SIZE]] {
        &self.records
    }

    /// Imagem contínua (`RECORD_COUNT * RECORD_SIZE` bytes)
    pub fn to_bytes(&self) -> Vec<u8> {
        self.records.concat()
    }

    /// Texto Intel HEX: um registro de dados por bloco e o registro de fim
    pub fn to_intel_hex(&self) -> String {
        let mut out = String::with_capacity(RECORD_COUNT * 44 + 12);
        for (i, data) in self.records.iter().enumerate() {
            // RECORD_COUNT * RECORD_SIZE cabe em 16 bits
            let address = (i * RECORD_SIZE) as u16;
            push_hex_record(&mut out, address, 0x00, data);
        }
        push_hex_record(&mut out, 0, 0x01, &[]);
        out
    }

    pub fn save(&self, path: impl AsRef<Path>) -> OlfactometerResult<()> {
        std::fs::write(path, self.to_intel_hex())?;
        Ok(())
    }
}

fn record(values: &[u16]) -> [u8; RECORD_SIZE] {
    let mut buf = BytesMut::with_capacity(RECORD_SIZE);
    for &v in values {
        buf.put_u16(v);
    }
    let mut out = [FILL; RECORD_SIZE];
    out[..buf.len()].copy_from_slice(&buf);
    out
}

fn push_hex_record(out: &mut String, address: u16, record_type: u8, data: &[u8]) {
    let [hi, lo] = address.to_be_bytes();
    let len = data.len() as u8;
    let sum = data
        .iter()
        .fold(len.wrapping_add(hi).wrapping_add(lo).wrapping_add(record_type), |acc, b| {
            acc.wrapping_add(*b)
        });
    let checksum = sum.wrapping_neg();

    let _ = write!(out, ":{len:02X}{address:04X}{record_type:02X}");
    for b in data {
        let _ = write!(out, "{b:02X}");
    }
    let _ = writeln!(out, "{checksum:02X}");
}
