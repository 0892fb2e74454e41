//! Little-endian wire codec shared by the save and load paths.
//!
//! Every field is written at a fixed width in little-endian order, never in
//! host order, so streams produced on one machine load on any other.

use std::io::{Read, Write};

use crate::context::ParmsId;
use crate::Result;

/// Serialized width of the fixed ciphertext header, in bytes: the
/// parameter-set identifier, the NTT flag byte, three u64 dimensions and
/// the f64 scale.
pub(crate) const HEADER_BYTES: usize = 32 + 1 + 3 * 8 + 8;

pub(crate) fn write_u8<W: Write>(stream: &mut W, value: u8) -> Result<()> {
    stream.write_all(&[value])?;
    Ok(())
}

pub(crate) fn read_u8<R: Read>(stream: &mut R) -> Result<u8> {
    let mut bytes = [0u8; 1];
    stream.read_exact(&mut bytes)?;
    Ok(bytes[0])
}

pub(crate) fn write_u64<W: Write>(stream: &mut W, value: u64) -> Result<()> {
    stream.write_all(&value.to_le_bytes())?;
    Ok(())
}

pub(crate) fn read_u64<R: Read>(stream: &mut R) -> Result<u64> {
    let mut bytes = [0u8; 8];
    stream.read_exact(&mut bytes)?;
    Ok(u64::from_le_bytes(bytes))
}

pub(crate) fn write_f64<W: Write>(stream: &mut W, value: f64) -> Result<()> {
    stream.write_all(&value.to_le_bytes())?;
    Ok(())
}

pub(crate) fn read_f64<R: Read>(stream: &mut R) -> Result<f64> {
    let mut bytes = [0u8; 8];
    stream.read_exact(&mut bytes)?;
    Ok(f64::from_le_bytes(bytes))
}

/// Fixed-order ciphertext header: parameter-set identifier, NTT flag,
/// size, degree, modulus count, scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct CiphertextHeader {
    pub parms_id: ParmsId,
    pub is_ntt_form: bool,
    pub size: u64,
    pub degree: u64,
    pub mod_count: u64,
    pub scale: f64,
}

impl CiphertextHeader {
    pub(crate) fn write<W: Write>(&self, stream: &mut W) -> Result<()> {
        for word in self.parms_id.0 {
            write_u64(stream, word)?;
        }
        write_u8(stream, self.is_ntt_form as u8)?;
        write_u64(stream, self.size)?;
        write_u64(stream, self.degree)?;
        write_u64(stream, self.mod_count)?;
        write_f64(stream, self.scale)
    }

    pub(crate) fn read<R: Read>(stream: &mut R) -> Result<Self> {
        let mut words = [0u64; 4];
        for word in words.iter_mut() {
            *word = read_u64(stream)?;
        }
        let is_ntt_form = read_u8(stream)? != 0;
        let size = read_u64(stream)?;
        let degree = read_u64(stream)?;
        let mod_count = read_u64(stream)?;
        let scale = read_f64(stream)?;
        Ok(CiphertextHeader {
            parms_id: ParmsId(words),
            is_ntt_form,
            size,
            degree,
            mod_count,
            scale,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> CiphertextHeader {
        CiphertextHeader {
            parms_id: ParmsId([1, 2, 3, u64::MAX]),
            is_ntt_form: true,
            size: 2,
            degree: 4096,
            mod_count: 3,
            scale: 2.0f64.powi(40),
        }
    }

    #[test]
    fn header_round_trip() {
        let header = sample();
        let mut bytes = Vec::new();
        header.write(&mut bytes).unwrap();
        assert_eq!(bytes.len(), HEADER_BYTES);

        let read = CiphertextHeader::read(&mut bytes.as_slice()).unwrap();
        assert_eq!(read, header);
    }

    #[test]
    fn header_layout_is_fixed_little_endian() {
        let header = sample();
        let mut bytes = Vec::new();
        header.write(&mut bytes).unwrap();

        assert_eq!(bytes[0..8], 1u64.to_le_bytes());
        assert_eq!(bytes[24..32], u64::MAX.to_le_bytes());
        assert_eq!(bytes[32], 1); // NTT flag byte
        assert_eq!(bytes[33..41], 2u64.to_le_bytes());
        assert_eq!(bytes[41..49], 4096u64.to_le_bytes());
        assert_eq!(bytes[49..57], 3u64.to_le_bytes());
        assert_eq!(bytes[57..65], 2.0f64.powi(40).to_le_bytes());
    }

    #[test]
    fn short_streams_error() {
        let header = sample();
        let mut bytes = Vec::new();
        header.write(&mut bytes).unwrap();

        let truncated = &bytes[..HEADER_BYTES - 1];
        assert!(CiphertextHeader::read(&mut &truncated[..]).is_err());
    }

    #[test]
    fn nonzero_flag_bytes_mean_ntt() {
        let mut bytes = Vec::new();
        sample().write(&mut bytes).unwrap();
        bytes[32] = 0x7f;
        let read = CiphertextHeader::read(&mut bytes.as_slice()).unwrap();
        assert!(read.is_ntt_form);
    }
}
