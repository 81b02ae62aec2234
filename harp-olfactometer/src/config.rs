//! Configuração da mistura de odores
//!
//! Lida de um arquivo JSON ou de variáveis de ambiente (com `.env`).
//!
//! | Variável                          | Padrão |
//! |-----------------------------------|--------|
//! | `OLFACTOMETER_TARGET_ODOR_FLOW`   | 100    |
//! | `OLFACTOMETER_TARGET_TOTAL_FLOW`  | 1000   |
//! | `OLFACTOMETER_CHANNEL3_AS_CARRIER`| false  |

use std::env;
use std::path::Path;
use std::str::FromStr;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::error::{OlfactometerError, OlfactometerResult};

pub const DEFAULT_TARGET_ODOR_FLOW: i32 = 100;
pub const DEFAULT_TARGET_TOTAL_FLOW: i32 = 1000;

static DOTENV_INIT: Lazy<()> = Lazy::new(|| {
    let _ = dotenv::dotenv();
});

#[inline]
fn ensure_loaded() {
    let _ = &*DOTENV_INIT;
}

/// Parâmetros de [`ConfigureOdorMix`](crate::odor_mix::ConfigureOdorMix)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OdorMixConfig {
    /// Fluxo total dos canais de odor (ml/min)
    pub target_odor_flow: i32,
    /// Fluxo total na saída (ml/min), informativo
    pub target_total_flow: i32,
    /// Canal 3 funciona como carrier
    pub channel3_as_carrier: bool,
    /// Porcentagem de cada canal de odor, em [0, 1]
    pub percentages: [f32; 4],
}

impl Default for OdorMixConfig {
    fn default() -> Self {
        Self {
            target_odor_flow: DEFAULT_TARGET_ODOR_FLOW,
            target_total_flow: DEFAULT_TARGET_TOTAL_FLOW,
            channel3_as_carrier: false,
            percentages: [0.0; 4],
        }
    }
}

impl OdorMixConfig {
    /// Lê das variáveis de ambiente, com padrões para as ausentes
    pub fn from_env() -> OlfactometerResult<Self> {
        ensure_loaded();
        Ok(Self {
            target_odor_flow: env_or("OLFACTOMETER_TARGET_ODOR_FLOW", DEFAULT_TARGET_ODOR_FLOW)?,
            target_total_flow: env_or("OLFACTOMETER_TARGET_TOTAL_FLOW", DEFAULT_TARGET_TOTAL_FLOW)?,
            channel3_as_carrier: env_or("OLFACTOMETER_CHANNEL3_AS_CARRIER", false)?,
            percentages: [0.0; 4],
        })
    }

    /// Lê de um arquivo JSON
    pub fn from_json_file(path: impl AsRef<Path>) -> OlfactometerResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> OlfactometerResult<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> OlfactometerResult<T> {
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| OlfactometerError::Config(format!("{name}: cannot parse {value:?}"))),
        Err(_) => Ok(default),
    }
}
