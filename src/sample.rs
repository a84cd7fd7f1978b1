use std::str::FromStr;

use thiserror::Error;

/// Decode one on-disk sample value into the engine's working type.
///
/// Captures are headerless, so the numeric kind is declared out-of-band on
/// the command line and the engine is instantiated once for that kind.
pub trait Sample: Copy + Send + Sync + 'static {
    /// Bytes per sample value on disk.
    const WIDTH: usize;

    /// Little-endian decode of the value at the front of `bytes`.
    fn decode(bytes: &[u8]) -> f64;

    /// dB of a full-scale tone for this type, used as the default
    /// heat-map ceiling when no explicit ceiling is configured.
    fn full_scale_db() -> f64;
}

macro_rules! impl_int_sample {
    ($($t:ty),*) => {$(
        impl Sample for $t {
            const WIDTH: usize = std::mem::size_of::<$t>();

            fn decode(bytes: &[u8]) -> f64 {
                <$t>::from_le_bytes(bytes[..Self::WIDTH].try_into().unwrap()) as f64
            }

            fn full_scale_db() -> f64 {
                20.0 * (<$t>::MAX as f64).log10()
            }
        }
    )*};
}

macro_rules! impl_float_sample {
    ($($t:ty),*) => {$(
        impl Sample for $t {
            const WIDTH: usize = std::mem::size_of::<$t>();

            fn decode(bytes: &[u8]) -> f64 {
                <$t>::from_le_bytes(bytes[..Self::WIDTH].try_into().unwrap()) as f64
            }

            fn full_scale_db() -> f64 {
                0.0
            }
        }
    )*};
}

impl_int_sample!(i8, i16, i32, i64, u8, u16, u32, u64);
impl_float_sample!(f32, f64);

/// The closed set of sample kinds a capture may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleFormat {
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
}

#[derive(Debug, Error)]
#[error("unrecognized sample format '{0}' (expected one of i8..i64, u8..u64, f32, f64)")]
pub struct UnknownFormat(String);

impl FromStr for SampleFormat {
    type Err = UnknownFormat;

    /// Accepts Rust-style names plus the C-style names used by older
    /// capture tooling (`int16_t`, `float`, `double`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "i8" | "int8" | "int8_t" => Ok(SampleFormat::I8),
            "i16" | "int16" | "int16_t" => Ok(SampleFormat::I16),
            "i32" | "int32" | "int32_t" => Ok(SampleFormat::I32),
            "i64" | "int64" | "int64_t" => Ok(SampleFormat::I64),
            "u8" | "uint8" | "uint8_t" => Ok(SampleFormat::U8),
            "u16" | "uint16" | "uint16_t" => Ok(SampleFormat::U16),
            "u32" | "uint32" | "uint32_t" => Ok(SampleFormat::U32),
            "u64" | "uint64" | "uint64_t" => Ok(SampleFormat::U64),
            "f32" | "float" => Ok(SampleFormat::F32),
            "f64" | "double" => Ok(SampleFormat::F64),
            _ => Err(UnknownFormat(s.to_string())),
        }
    }
}

impl std::fmt::Display for SampleFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SampleFormat::I8 => "i8",
            SampleFormat::I16 => "i16",
            SampleFormat::I32 => "i32",
            SampleFormat::I64 => "i64",
            SampleFormat::U8 => "u8",
            SampleFormat::U16 => "u16",
            SampleFormat::U32 => "u32",
            SampleFormat::U64 => "u64",
            SampleFormat::F32 => "f32",
            SampleFormat::F64 => "f64",
        };
        write!(f, "{}", name)
    }
}
