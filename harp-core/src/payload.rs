//! Codec de elementos do payload
//!
//! Todos os valores são little-endian no fio.

use bytes::{Buf, BufMut};

use crate::error::{HarpError, HarpResult};
use crate::message::PayloadType;

/// Escalar representável no payload Harp
pub trait PayloadValue: Copy + Sized {
    /// Tipo Harp correspondente
    const PAYLOAD_TYPE: PayloadType;

    fn put(self, buf: &mut Vec<u8>);

    fn get(buf: &mut &[u8]) -> Self;
}

macro_rules! payload_value {
    ($ty:ty, $pt:ident, $put:ident, $get:ident) => {
        impl PayloadValue for $ty {
            const PAYLOAD_TYPE: PayloadType = PayloadType::$pt;

            #[inline]
            fn put(self, buf: &mut Vec<u8>) {
                buf.$put(self);
            }

            #[inline]
            fn get(buf: &mut &[u8]) -> Self {
                buf.$get()
            }
        }
    };
}

payload_value!(u8, U8, put_u8, get_u8);
payload_value!(i8, S8, put_i8, get_i8);
payload_value!(u16, U16, put_u16_le, get_u16_le);
payload_value!(i16, S16, put_i16_le, get_i16_le);
payload_value!(u32, U32, put_u32_le, get_u32_le);
payload_value!(i32, S32, put_i32_le, get_i32_le);
payload_value!(u64, U64, put_u64_le, get_u64_le);
payload_value!(i64, S64, put_i64_le, get_i64_le);
payload_value!(f32, Float, put_f32_le, get_f32_le);

/// Codifica um escalar
pub fn encode_value<T: PayloadValue>(value: T) -> Vec<u8> {
    let mut buf = Vec::with_capacity(T::PAYLOAD_TYPE.element_size());
    value.put(&mut buf);
    buf
}

/// Codifica um array de escalares
pub fn encode_array<T: PayloadValue>(values: &[T]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(values.len() * T::PAYLOAD_TYPE.element_size());
    for &v in values {
        v.put(&mut buf);
    }
    buf
}

/// Decodifica exatamente um escalar
pub fn decode_value<T: PayloadValue>(payload: &[u8]) -> HarpResult<T> {
    let size = T::PAYLOAD_TYPE.element_size();
    if payload.len() != size {
        return Err(HarpError::InvalidPayloadSize(format!(
            "expected {} bytes for {}, got {}",
            size,
            T::PAYLOAD_TYPE,
            payload.len()
        )));
    }
    let mut buf = payload;
    Ok(T::get(&mut buf))
}

/// Decodifica exatamente `len` escalares
pub fn decode_array<T: PayloadValue>(payload: &[u8], len: usize) -> HarpResult<Vec<T>> {
    let size = T::PAYLOAD_TYPE.element_size();
    if payload.len() != size * len {
        return Err(HarpError::InvalidPayloadSize(format!(
            "expected {} x {} ({} bytes), got {} bytes",
            len,
            T::PAYLOAD_TYPE,
            size * len,
            payload.len()
        )));
    }
    let mut buf = payload;
    Ok((0..len).map(|_| T::get(&mut buf)).collect())
}

/// Decodifica um array de tamanho fixo
pub fn decode_fixed<T: PayloadValue + Default, const N: usize>(payload: &[u8]) -> HarpResult<[T; N]> {
    let values = decode_array::<T>(payload, N)?;
    let mut out = [T::default(); N];
    out.copy_from_slice(&values);
    Ok(out)
}
