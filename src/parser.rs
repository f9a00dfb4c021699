//! Deserialize wire data into primitives.
//!
//! Parsers operate on [`NomBytes`] so decoded payloads are zero-copy slices
//! of the input frame. Length violations are reported as `Failure` with
//! [`nom::error::ErrorKind::Verify`], which the crate error type maps to
//! `NegativeLength`; plain parse errors map to `UnexpectedEnd`.
use bytes::Bytes;
use nom::{
    IResult,
    bytes::complete::take,
    multi::many_m_n,
    number::complete::{be_i16, be_i32},
};
use nombytes::NomBytes;

use crate::constants::MAX_PROTOCOL_ARRAY_SIZE;

/// Convert bytes to a validated UTF-8 string.
/// Returns an error if the bytes are not valid UTF-8.
pub fn bytes_to_string(bytes: &Bytes) -> Result<String, nom::Err<nom::error::Error<NomBytes>>> {
    std::str::from_utf8(bytes)
        .map(|s| s.to_string())
        .map_err(|_| {
            nom::Err::Failure(nom::error::Error::new(
                NomBytes::from(bytes.as_ref()),
                nom::error::ErrorKind::Char,
            ))
        })
}

/// Convert optional bytes to a validated UTF-8 string.
/// Returns None for None input, error for invalid UTF-8.
pub fn bytes_to_string_opt(
    bytes: Option<Bytes>,
) -> Result<Option<String>, nom::Err<nom::error::Error<NomBytes>>> {
    match bytes {
        Some(b) => bytes_to_string(&b).map(Some),
        None => Ok(None),
    }
}

/// Parse a non-nullable string (i16 length prefix).
///
/// A null marker (-1) decodes as the empty string since the caller's model
/// has no slot for null here; lengths below -1 are invalid.
pub fn parse_string(s: NomBytes) -> IResult<NomBytes, Bytes> {
    let (s, length) = be_i16(s)?;

    if length == -1 {
        return Ok((s, Bytes::new()));
    }
    if length < 0 {
        return Err(nom::Err::Failure(nom::error::Error::new(
            s,
            nom::error::ErrorKind::Verify,
        )));
    }

    let (s, string) = take(length as u16)(s)?;
    Ok((s, string.into_bytes()))
}

/// Parse a nullable string (i16 length prefix, -1 = null).
///
/// Null and empty are distinct: `None` for -1, `Some("")` for length 0.
pub fn parse_nullable_string(s: NomBytes) -> IResult<NomBytes, Option<Bytes>> {
    let (s, length) = be_i16(s)?;

    if length == -1 {
        return Ok((s, None));
    }
    if length < 0 {
        return Err(nom::Err::Failure(nom::error::Error::new(
            s,
            nom::error::ErrorKind::Verify,
        )));
    }

    let (s, string) = take(length as u16)(s)?;
    Ok((s, Some(string.into_bytes())))
}

/// Parse a nullable byte payload (i32 length prefix, -1 = null).
pub fn parse_bytes(s: NomBytes) -> IResult<NomBytes, Option<Bytes>> {
    let (s, length) = be_i32(s)?;

    if length == -1 {
        return Ok((s, None));
    }
    if length < 0 {
        return Err(nom::Err::Failure(nom::error::Error::new(
            s,
            nom::error::ErrorKind::Verify,
        )));
    }

    let (s, payload) = take(length as u32)(s)?;
    Ok((s, Some(payload.into_bytes())))
}

/// Parse an i32-counted array of `f`-shaped elements.
///
/// A null array (-1) decodes as empty; counts above
/// [`MAX_PROTOCOL_ARRAY_SIZE`] are rejected before any allocation.
pub fn parse_array<O, E, F>(f: F) -> impl FnMut(NomBytes) -> IResult<NomBytes, Vec<O>, E>
where
    F: nom::Parser<NomBytes, O, E> + Copy,
    E: nom::error::ParseError<NomBytes>,
{
    move |input: NomBytes| {
        let (i, length) = be_i32(input)?;

        // Null array
        if length == -1 {
            return Ok((i, vec![]));
        }

        if length < 0 {
            return Err(nom::Err::Failure(E::from_error_kind(
                i,
                nom::error::ErrorKind::Verify,
            )));
        }
        if length > MAX_PROTOCOL_ARRAY_SIZE {
            return Err(nom::Err::Failure(E::from_error_kind(
                i,
                nom::error::ErrorKind::TooLarge,
            )));
        }

        many_m_n(length as usize, length as usize, f)(i)
    }
}
