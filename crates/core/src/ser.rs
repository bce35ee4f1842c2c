//! A simple trait for binary (de)Serialization using std `Read` and `Write` traits.

use base64::{engine::general_purpose::STANDARD as BASE64, DecodeError, Engine};
use hex::FromHexError;
use std::{
    fmt::Debug,
    io::{Cursor, Error as IOError, Read, Write},
};
use thiserror::Error;

/// Errors related to serialization of types.
#[derive(Debug, Error)]
pub enum SerError {
    /// VarInts must be minimal.
    #[error("attempted to deserialize a non-minimal VarInt")]
    NonMinimalVarInt,

    /// Requested a fixed-width integer outside the 1..=8 byte range.
    #[error("unsupported fixed integer width: {0}")]
    BadWidth(usize),

    /// A length-prefixed or fixed-width string did not hold valid utf8.
    #[error("string field is not valid utf8")]
    BadString,

    /// A fixed-width string field was given more bytes than its width.
    #[error("string of length {got} overflows fixed width {width}")]
    StringTooLong {
        /// Byte length of the provided string.
        got: usize,
        /// Fixed width of the field.
        width: usize,
    },

    /// IOError bubbled up from a `Read` or `Write` passed to a `ByteFormat`
    /// implementation.
    #[error(transparent)]
    IOError(#[from] IOError),

    /// `deserialize_hex` encountered an error on its input.
    #[error(transparent)]
    FromHexError(#[from] FromHexError),

    /// `deserialize_base64` encountered an error on its input.
    #[error(transparent)]
    DecodeError(#[from] DecodeError),

    /// An error by a component call in data structure (de)serialization.
    #[error("error in component (de)serialization: {0}")]
    ComponentError(String),

    /// Failed to pass a limit to an iterated deserializer that requires one.
    #[error("deserialization of this struct needs additional length information")]
    RequiresLimit,
}

/// Type alias for serialization errors
pub type SerResult<T> = Result<T, SerError>;

/// Calculates the minimum prefix length for a VarInt encoding `number`
pub fn prefix_byte_len(number: u64) -> u8 {
    match number {
        0..=0xfc => 1,
        0xfd..=0xffff => 3,
        0x1_0000..=0xffff_ffff => 5,
        _ => 9,
    }
}

/// Matches the length of the VarInt to the 1-byte flag
pub fn first_byte_from_len(number: u8) -> Option<u8> {
    match number {
        3 => Some(0xfd),
        5 => Some(0xfe),
        9 => Some(0xff),
        _ => None,
    }
}

/// Matches the VarInt prefix flag to the serialized length
pub fn prefix_len_from_first_byte(number: u8) -> u8 {
    match number {
        0..=0xfc => 1,
        0xfd => 3,
        0xfe => 5,
        0xff => 9,
    }
}

/// Convenience function for writing a Bitcoin-style VarInt
pub fn write_compact_int<W>(writer: &mut W, number: u64) -> SerResult<usize>
where
    W: Write,
{
    let prefix_len = prefix_byte_len(number);
    let written: usize = match first_byte_from_len(prefix_len) {
        None => writer.write(&[number as u8])?,
        Some(prefix) => {
            let mut written = writer.write(&[prefix])?;
            let body = number.to_le_bytes();
            written += writer.write(&body[..prefix_len as usize - 1])?;
            written
        }
    };
    Ok(written)
}

/// Convenience function for reading a Bitcoin-style VarInt
pub fn read_compact_int<R>(reader: &mut R) -> SerResult<u64>
where
    R: Read,
{
    let mut prefix = [0u8; 1];
    reader.read_exact(&mut prefix)?;
    let prefix_len = prefix_len_from_first_byte(prefix[0]);

    // Get the byte(s) representing the number, and parse as u64
    let number = if prefix_len > 1 {
        let mut buf = [0u8; 8];
        reader.read_exact(&mut buf[..prefix_len as usize - 1])?;
        u64::from_le_bytes(buf)
    } else {
        prefix[0] as u64
    };

    let minimal_length = prefix_byte_len(number);
    if minimal_length < prefix_len {
        Err(SerError::NonMinimalVarInt)
    } else {
        Ok(number)
    }
}

/// Writes a big-endian VarInt. The tag scheme matches the wire (little
/// endian) form; only the body byte order differs. Bitcoin protocol fields
/// never use this form.
pub fn write_compact_int_be<W>(writer: &mut W, number: u64) -> SerResult<usize>
where
    W: Write,
{
    let prefix_len = prefix_byte_len(number);
    let written: usize = match first_byte_from_len(prefix_len) {
        None => writer.write(&[number as u8])?,
        Some(prefix) => {
            let mut written = writer.write(&[prefix])?;
            let body = number.to_be_bytes();
            written += writer.write(&body[8 - (prefix_len as usize - 1)..])?;
            written
        }
    };
    Ok(written)
}

/// Reads a big-endian VarInt. See [`write_compact_int_be`].
pub fn read_compact_int_be<R>(reader: &mut R) -> SerResult<u64>
where
    R: Read,
{
    let mut prefix = [0u8; 1];
    reader.read_exact(&mut prefix)?;
    let prefix_len = prefix_len_from_first_byte(prefix[0]);

    let number = if prefix_len > 1 {
        let mut buf = [0u8; 8];
        let body_len = prefix_len as usize - 1;
        reader.read_exact(&mut buf[8 - body_len..])?;
        u64::from_be_bytes(buf)
    } else {
        prefix[0] as u64
    };

    let minimal_length = prefix_byte_len(number);
    if minimal_length < prefix_len {
        Err(SerError::NonMinimalVarInt)
    } else {
        Ok(number)
    }
}

/// Reads a `width`-byte little-endian unsigned integer, `1..=8` bytes.
pub fn read_uint_le<R>(reader: &mut R, width: usize) -> SerResult<u64>
where
    R: Read,
{
    if width == 0 || width > 8 {
        return Err(SerError::BadWidth(width));
    }
    let mut buf = [0u8; 8];
    reader.read_exact(&mut buf[..width])?;
    Ok(u64::from_le_bytes(buf))
}

/// Reads a `width`-byte big-endian unsigned integer, `1..=8` bytes.
pub fn read_uint_be<R>(reader: &mut R, width: usize) -> SerResult<u64>
where
    R: Read,
{
    if width == 0 || width > 8 {
        return Err(SerError::BadWidth(width));
    }
    let mut buf = [0u8; 8];
    reader.read_exact(&mut buf[8 - width..])?;
    Ok(u64::from_be_bytes(buf))
}

/// Writes the low `width` bytes of `number` little-endian, `1..=8` bytes.
/// Returns an error rather than truncating a number that does not fit.
pub fn write_uint_le<W>(writer: &mut W, number: u64, width: usize) -> SerResult<usize>
where
    W: Write,
{
    if width == 0 || width > 8 || (width < 8 && number >> (8 * width) != 0) {
        return Err(SerError::BadWidth(width));
    }
    Ok(writer.write(&number.to_le_bytes()[..width])?)
}

/// Writes the low `width` bytes of `number` big-endian, `1..=8` bytes.
pub fn write_uint_be<W>(writer: &mut W, number: u64, width: usize) -> SerResult<usize>
where
    W: Write,
{
    if width == 0 || width > 8 || (width < 8 && number >> (8 * width) != 0) {
        return Err(SerError::BadWidth(width));
    }
    Ok(writer.write(&number.to_be_bytes()[8 - width..])?)
}

/// A simple trait for deserializing from `std::io::Read` and serializing to
/// `std::io::Write`. We have provided implementations for `u8`, byte arrays,
/// and `Vec<T: ByteFormat>`.
///
/// `ByteFormat` is used extensively in sighash calculation, txid
/// calculations, and transaction and message serialization.
pub trait ByteFormat {
    /// An associated error type
    type Error: From<SerError> + From<IOError> + std::error::Error;

    /// Returns the byte-length of the serialized data structure.
    fn serialized_length(&self) -> usize;

    /// Convenience function for reading a single byte
    fn read_u8<R>(reader: &mut R) -> Result<u8, Self::Error>
    where
        R: Read,
    {
        let mut buf = [0u8; 1];
        reader.read_exact(&mut buf)?;
        Ok(buf[0])
    }

    /// Convenience function for reading a LE u16
    fn read_u16_le<R>(reader: &mut R) -> Result<u16, Self::Error>
    where
        R: Read,
    {
        let mut buf = [0u8; 2];
        reader.read_exact(&mut buf)?;
        Ok(u16::from_le_bytes(buf))
    }

    /// Convenience function for reading a BE u16
    fn read_u16_be<R>(reader: &mut R) -> Result<u16, Self::Error>
    where
        R: Read,
    {
        let mut buf = [0u8; 2];
        reader.read_exact(&mut buf)?;
        Ok(u16::from_be_bytes(buf))
    }

    /// Convenience function for reading a LE u32
    fn read_u32_le<R>(reader: &mut R) -> Result<u32, Self::Error>
    where
        R: Read,
    {
        let mut buf = [0u8; 4];
        reader.read_exact(&mut buf)?;
        Ok(u32::from_le_bytes(buf))
    }

    /// Convenience function for reading a BE u32
    fn read_u32_be<R>(reader: &mut R) -> Result<u32, Self::Error>
    where
        R: Read,
    {
        let mut buf = [0u8; 4];
        reader.read_exact(&mut buf)?;
        Ok(u32::from_be_bytes(buf))
    }

    /// Convenience function for reading a LE u64
    fn read_u64_le<R>(reader: &mut R) -> Result<u64, Self::Error>
    where
        R: Read,
    {
        let mut buf = [0u8; 8];
        reader.read_exact(&mut buf)?;
        Ok(u64::from_le_bytes(buf))
    }

    /// Convenience function for reading a BE u64
    fn read_u64_be<R>(reader: &mut R) -> Result<u64, Self::Error>
    where
        R: Read,
    {
        let mut buf = [0u8; 8];
        reader.read_exact(&mut buf)?;
        Ok(u64::from_be_bytes(buf))
    }

    /// Convenience function for reading an odd-width (1..=8 byte) LE integer
    fn read_uint_le<R>(reader: &mut R, width: usize) -> Result<u64, Self::Error>
    where
        R: Read,
    {
        read_uint_le(reader, width).map_err(Into::into)
    }

    /// Convenience function for reading an odd-width (1..=8 byte) BE integer
    fn read_uint_be<R>(reader: &mut R, width: usize) -> Result<u64, Self::Error>
    where
        R: Read,
    {
        read_uint_be(reader, width).map_err(Into::into)
    }

    /// Convenience function for reading a Bitcoin-style VarInt
    fn read_compact_int<R>(reader: &mut R) -> Result<u64, <Self as ByteFormat>::Error>
    where
        R: Read,
    {
        read_compact_int(reader).map_err(Into::into)
    }

    /// Convenience function for reading a prefixed vector
    fn read_prefix_vec<R, E, I>(reader: &mut R) -> Result<Vec<I>, <Self as ByteFormat>::Error>
    where
        R: Read,
        E: Into<Self::Error> + From<SerError> + From<IOError> + std::error::Error,
        I: ByteFormat<Error = E>,
    {
        let items = Self::read_compact_int(reader)?;
        let mut ret = vec![];
        for _ in 0..items {
            ret.push(I::read_from(reader, 0).map_err(Into::into)?);
        }
        Ok(ret)
    }

    /// Convenience function for reading a VarInt-prefixed utf8 string
    fn read_string<R>(reader: &mut R) -> Result<String, Self::Error>
    where
        R: Read,
    {
        let len = Self::read_compact_int(reader)?;
        let mut buf = vec![0u8; len as usize];
        reader.read_exact(&mut buf)?;
        String::from_utf8(buf).map_err(|_| SerError::BadString.into())
    }

    /// Convenience function for reading a fixed-width, zero-padded utf8
    /// string. The string ends at the first NUL byte within the width.
    fn read_string_fixed<R>(reader: &mut R, width: usize) -> Result<String, Self::Error>
    where
        R: Read,
    {
        let mut buf = vec![0u8; width];
        reader.read_exact(&mut buf)?;
        let end = buf.iter().position(|&b| b == 0).unwrap_or(width);
        buf.truncate(end);
        String::from_utf8(buf).map_err(|_| SerError::BadString.into())
    }

    /// Convenience function for writing a single byte
    fn write_u8<W>(writer: &mut W, byte: u8) -> Result<usize, <Self as ByteFormat>::Error>
    where
        W: Write,
    {
        Ok(writer.write(&[byte])?)
    }

    /// Convenience function for writing a LE u16
    fn write_u16_le<W>(writer: &mut W, number: u16) -> Result<usize, <Self as ByteFormat>::Error>
    where
        W: Write,
    {
        Ok(writer.write(&number.to_le_bytes())?)
    }

    /// Convenience function for writing a BE u16
    fn write_u16_be<W>(writer: &mut W, number: u16) -> Result<usize, <Self as ByteFormat>::Error>
    where
        W: Write,
    {
        Ok(writer.write(&number.to_be_bytes())?)
    }

    /// Convenience function for writing a LE u32
    fn write_u32_le<W>(writer: &mut W, number: u32) -> Result<usize, <Self as ByteFormat>::Error>
    where
        W: Write,
    {
        Ok(writer.write(&number.to_le_bytes())?)
    }

    /// Convenience function for writing a BE u32
    fn write_u32_be<W>(writer: &mut W, number: u32) -> Result<usize, <Self as ByteFormat>::Error>
    where
        W: Write,
    {
        Ok(writer.write(&number.to_be_bytes())?)
    }

    /// Convenience function for writing a LE u64
    fn write_u64_le<W>(writer: &mut W, number: u64) -> Result<usize, <Self as ByteFormat>::Error>
    where
        W: Write,
    {
        Ok(writer.write(&number.to_le_bytes())?)
    }

    /// Convenience function for writing a BE u64
    fn write_u64_be<W>(writer: &mut W, number: u64) -> Result<usize, <Self as ByteFormat>::Error>
    where
        W: Write,
    {
        Ok(writer.write(&number.to_be_bytes())?)
    }

    /// Convenience function for writing an odd-width (1..=8 byte) LE integer
    fn write_uint_le<W>(
        writer: &mut W,
        number: u64,
        width: usize,
    ) -> Result<usize, <Self as ByteFormat>::Error>
    where
        W: Write,
    {
        write_uint_le(writer, number, width).map_err(Into::into)
    }

    /// Convenience function for writing an odd-width (1..=8 byte) BE integer
    fn write_uint_be<W>(
        writer: &mut W,
        number: u64,
        width: usize,
    ) -> Result<usize, <Self as ByteFormat>::Error>
    where
        W: Write,
    {
        write_uint_be(writer, number, width).map_err(Into::into)
    }

    /// Convenience function for writing a Bitcoin-style VarInt
    fn write_compact_int<W>(
        writer: &mut W,
        number: u64,
    ) -> Result<usize, <Self as ByteFormat>::Error>
    where
        W: Write,
    {
        write_compact_int(writer, number).map_err(Into::into)
    }

    /// Convenience function to write a length-prefixed vector.
    fn write_prefix_vec<W, E, I>(
        writer: &mut W,
        vector: &[I],
    ) -> Result<usize, <Self as ByteFormat>::Error>
    where
        W: Write,
        E: Into<Self::Error> + From<SerError> + From<IOError> + std::error::Error,
        I: ByteFormat<Error = E>,
    {
        let mut written = Self::write_compact_int(writer, vector.len() as u64)?;
        for i in vector.iter() {
            written += i.write_to(writer).map_err(Into::into)?;
        }
        Ok(written)
    }

    /// Convenience function for writing a VarInt-prefixed utf8 string
    fn write_string<W>(writer: &mut W, s: &str) -> Result<usize, Self::Error>
    where
        W: Write,
    {
        let mut written = Self::write_compact_int(writer, s.len() as u64)?;
        written += writer.write(s.as_bytes())?;
        Ok(written)
    }

    /// Convenience function for writing a fixed-width, zero-padded utf8
    /// string. Errors if the string overflows the width.
    fn write_string_fixed<W>(writer: &mut W, s: &str, width: usize) -> Result<usize, Self::Error>
    where
        W: Write,
    {
        if s.len() > width {
            return Err(SerError::StringTooLong {
                got: s.len(),
                width,
            }
            .into());
        }
        let mut buf = vec![0u8; width];
        buf[..s.len()].copy_from_slice(s.as_bytes());
        Ok(writer.write(&buf)?)
    }

    /// Deserializes an instance of `Self` from a `std::io::Read`.
    /// The `limit` argument is used only when deserializing collections, and
    /// specifies a maximum number of instances of the underlying type to
    /// read.
    fn read_from<R>(reader: &mut R, limit: usize) -> Result<Self, Self::Error>
    where
        R: Read,
        Self: std::marker::Sized;

    /// Decodes a hex string to a `Vec<u8>`, deserializes an instance of
    /// `Self` from that vector.
    fn deserialize_hex(s: &str) -> Result<Self, Self::Error>
    where
        Self: std::marker::Sized,
    {
        let v: Vec<u8> = hex::decode(s).map_err(SerError::from)?;
        let mut cursor = Cursor::new(v);
        Self::read_from(&mut cursor, 0)
    }

    /// Decodes a base64 string (standard RFC4648 non-url safe characters),
    /// deserializes an instance of `Self` from the result.
    fn deserialize_base64(s: &str) -> Result<Self, Self::Error>
    where
        Self: std::marker::Sized,
    {
        let v: Vec<u8> = BASE64.decode(s).map_err(SerError::from)?;
        let mut cursor = Cursor::new(v);
        Self::read_from(&mut cursor, 0)
    }

    /// Serializes `Self` to a `std::io::Write`. Following `Write` trait
    /// conventions, its `Ok` type is a `usize` denoting the number of bytes
    /// written.
    fn write_to<W>(&self, writer: &mut W) -> Result<usize, <Self as ByteFormat>::Error>
    where
        W: Write;

    /// Serializes `self` to a vector, returns the hex-encoded vector
    fn serialize_hex(&self) -> String {
        let mut v: Vec<u8> = vec![];
        self.write_to(&mut v)
            .expect("no IOError writing to a Vec");
        hex::encode(v)
    }

    /// Serialize `self` to a base64 string, using standard RFC4648 non-url
    /// safe characters
    fn serialize_base64(&self) -> String {
        let mut v: Vec<u8> = vec![];
        self.write_to(&mut v)
            .expect("no IOError writing to a Vec");
        BASE64.encode(v)
    }
}

impl<E, I> ByteFormat for Vec<I>
where
    E: From<SerError> + From<IOError> + std::error::Error,
    I: ByteFormat<Error = E>,
{
    type Error = E;

    fn serialized_length(&self) -> usize {
        self.iter().map(|v| v.serialized_length()).sum()
    }

    fn read_from<T>(reader: &mut T, limit: usize) -> Result<Self, Self::Error>
    where
        T: Read,
        Self: std::marker::Sized,
    {
        let mut v = vec![];
        for _ in 0..limit {
            v.push(I::read_from(reader, 0)?);
        }
        Ok(v)
    }

    fn write_to<W>(&self, writer: &mut W) -> Result<usize, Self::Error>
    where
        W: Write,
    {
        let mut written = 0;
        for item in self.iter() {
            written += item.write_to(writer)?;
        }
        Ok(written)
    }
}

impl<const N: usize> ByteFormat for [u8; N] {
    type Error = SerError;

    fn serialized_length(&self) -> usize {
        N
    }

    fn read_from<R>(reader: &mut R, _limit: usize) -> SerResult<Self>
    where
        R: Read,
        Self: std::marker::Sized,
    {
        let mut buf = [0u8; N];
        reader.read_exact(&mut buf)?;
        Ok(buf)
    }

    fn write_to<W>(&self, writer: &mut W) -> SerResult<usize>
    where
        W: Write,
    {
        Ok(writer.write(self)?)
    }
}

impl ByteFormat for u8 {
    type Error = SerError;

    fn serialized_length(&self) -> usize {
        1
    }

    fn read_from<R>(reader: &mut R, _limit: usize) -> SerResult<Self>
    where
        R: Read,
        Self: std::marker::Sized,
    {
        let mut buf = [0u8; 1];
        reader.read_exact(&mut buf)?;
        Ok(buf[0])
    }

    fn write_to<W>(&self, writer: &mut W) -> SerResult<usize>
    where
        W: Write,
    {
        Ok(writer.write(&self.to_le_bytes())?)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn it_matches_byte_len_and_prefix() {
        let cases = [
            (1, 1, None),
            (0xff, 3, Some(0xfd)),
            (0xffff_ffff, 5, Some(0xfe)),
            (0xffff_ffff_ffff_ffff, 9, Some(0xff)),
        ];
        for case in cases.iter() {
            assert_eq!(prefix_byte_len(case.0), case.1);
            assert_eq!(first_byte_from_len(case.1), case.2);
        }
    }

    #[test]
    fn it_writes_minimal_varints() {
        // Boundary values and the shortest encodings that can hold them.
        let cases: [(u64, &str); 8] = [
            (0, "00"),
            (0xfc, "fc"),
            (0xfd, "fdfd00"),
            (0xffff, "fdffff"),
            (0x1_0000, "fe00000100"),
            (0xffff_ffff, "feffffffff"),
            (0x1_0000_0000, "ff0000000001000000"),
            (0xffff_ffff_ffff_ffff, "ffffffffffffffffff"),
        ];
        for (number, expected) in cases.iter() {
            let mut buf = vec![];
            write_compact_int(&mut buf, *number).unwrap();
            assert_eq!(hex::encode(&buf), *expected);
            let mut cursor = Cursor::new(buf);
            assert_eq!(read_compact_int(&mut cursor).unwrap(), *number);
        }
    }

    #[test]
    fn it_rejects_non_minimal_varints() {
        for case in ["fd0100", "fe01000000", "fefc000000", "ff0100000000000000"].iter() {
            let buf = hex::decode(case).unwrap();
            let mut cursor = Cursor::new(buf);
            match read_compact_int(&mut cursor) {
                Err(SerError::NonMinimalVarInt) => {}
                other => panic!("expected NonMinimalVarInt, got {:?}", other),
            }
        }
    }

    #[test]
    fn it_round_trips_be_varints() {
        let cases: [(u64, &str); 4] = [
            (0xfc, "fc"),
            (0xfd, "fd00fd"),
            (0x1_0000, "fe00010000"),
            (0x1_0000_0000, "ff0000000100000000"),
        ];
        for (number, expected) in cases.iter() {
            let mut buf = vec![];
            write_compact_int_be(&mut buf, *number).unwrap();
            assert_eq!(hex::encode(&buf), *expected);
            let mut cursor = Cursor::new(buf);
            assert_eq!(read_compact_int_be(&mut cursor).unwrap(), *number);
        }
    }

    #[test]
    fn it_reads_and_writes_odd_width_integers() {
        for width in 1..=8usize {
            let number = 0x1122_3344_5566_7788u64 & (u64::MAX >> (8 * (8 - width)));
            let mut le = vec![];
            write_uint_le(&mut le, number, width).unwrap();
            assert_eq!(le.len(), width);
            assert_eq!(read_uint_le(&mut Cursor::new(le), width).unwrap(), number);

            let mut be = vec![];
            write_uint_be(&mut be, number, width).unwrap();
            assert_eq!(be.len(), width);
            assert_eq!(read_uint_be(&mut Cursor::new(be), width).unwrap(), number);
        }
        assert!(matches!(
            write_uint_le(&mut vec![], 0x100, 1),
            Err(SerError::BadWidth(1))
        ));
        assert!(matches!(
            read_uint_le(&mut Cursor::new(vec![0u8; 16]), 9),
            Err(SerError::BadWidth(9))
        ));
    }

    #[test]
    fn it_round_trips_fixed_strings() {
        let mut buf = vec![];
        <u8 as ByteFormat>::write_string_fixed(&mut buf, "verack", 12).unwrap();
        assert_eq!(buf.len(), 12);
        assert_eq!(&buf[..6], b"verack");
        assert!(buf[6..].iter().all(|&b| b == 0));

        let got = <u8 as ByteFormat>::read_string_fixed(&mut Cursor::new(buf), 12).unwrap();
        assert_eq!(got, "verack");

        match <u8 as ByteFormat>::write_string_fixed(&mut vec![], "much-too-long-command", 12) {
            Err(SerError::StringTooLong { got: 21, width: 12 }) => {}
            other => panic!("expected StringTooLong, got {:?}", other),
        }
    }
}
