use bytes::{
    BufMut,
    Bytes,
    BytesMut,
};

use crate::{
    checksum::{
        self,
        Checksum,
    },
    is_reserved,
    stuffing::{
        destuff,
        max_stuffed_len,
        stuff,
    },
    Error,
    FramingError,
    FLAG,
};

/// Address and control bytes.
pub const HEADER_LEN: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Frame {
    pub address: u8,
    pub control: u8,
    pub payload: Bytes,
}

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
pub struct FrameOptions {
    /// Stuff the address and control bytes like the rest of the frame.
    ///
    /// Off by default: peers that predate this option send both bytes
    /// verbatim, so an address or control of `0x7E`/`0x7D` is ambiguous on the
    /// wire. Decoding is the same either way.
    pub escape_address_control: bool,
}

impl Frame {
    #[inline]
    pub fn new(address: u8, control: u8, payload: impl Into<Bytes>) -> Self {
        Self {
            address,
            control,
            payload: payload.into(),
        }
    }

    /// Whether this header can't be sent unambiguously without escaping.
    #[inline]
    pub fn has_reserved_header(&self) -> bool {
        is_reserved(self.address) || is_reserved(self.control)
    }

    pub fn encode_into<C>(&self, options: FrameOptions, dst: &mut BytesMut)
    where
        C: Checksum,
    {
        encode_full_into::<C>(self.address, self.control, &self.payload, options, dst)
    }
}

/// Checksum over `address ‖ control ‖ payload`, in wire order.
#[inline]
pub fn calculate_fcs<C>(address: u8, control: u8, payload: &[u8]) -> checksum::Array
where
    C: Checksum,
{
    C::to_array(C::checksum_parts([&[address, control][..], payload]))
}

pub fn encode_raw_into(payload: &[u8], dst: &mut BytesMut) {
    dst.reserve(2 + max_stuffed_len(payload.len()));

    dst.put_u8(FLAG);
    stuff(payload, dst);
    dst.put_u8(FLAG);
}

pub fn encode_full_into<C>(
    address: u8,
    control: u8,
    payload: &[u8],
    options: FrameOptions,
    dst: &mut BytesMut,
) where
    C: Checksum,
{
    let fcs = calculate_fcs::<C>(address, control, payload);

    dst.reserve(2 + max_stuffed_len(HEADER_LEN + payload.len() + fcs.len()));
    dst.put_u8(FLAG);

    if options.escape_address_control {
        stuff(&[address, control], dst);
    } else {
        dst.put_u8(address);
        dst.put_u8(control);
    }

    stuff(payload, dst);
    stuff(&fcs, dst);

    dst.put_u8(FLAG);
}

/// `FLAG ‖ stuff(payload) ‖ FLAG`
pub fn encode_raw(payload: &[u8]) -> Bytes {
    let mut dst = BytesMut::new();
    encode_raw_into(payload, &mut dst);

    dst.freeze()
}

/// `FLAG ‖ address ‖ control ‖ stuff(payload ‖ fcs) ‖ FLAG`, with the header
/// unescaped.
pub fn encode_full<C>(address: u8, control: u8, payload: &[u8]) -> Bytes
where
    C: Checksum,
{
    let mut dst = BytesMut::new();
    encode_full_into::<C>(address, control, payload, FrameOptions::default(), &mut dst);

    dst.freeze()
}

/// Trim surrounding delimiters, if any. A delimiter left inside the body means
/// `src` was not a single frame.
pub fn strip_delimiters(src: &[u8]) -> Result<&[u8], FramingError> {
    let start = src.iter().position(|&b| b != FLAG).unwrap_or(src.len());
    let end = src.iter().rposition(|&b| b != FLAG).map_or(start, |i| i + 1);

    let body = &src[start..end];
    if body.contains(&FLAG) {
        return Err(FramingError::EmbeddedDelimiter);
    }

    Ok(body)
}

/// Decode a raw frame, with or without its delimiters.
pub fn decode_raw(src: &[u8]) -> Result<Bytes, FramingError> {
    let body = strip_delimiters(src)?;

    Ok(destuff(body)?.freeze())
}

/// Decode and verify a full frame, with or without its delimiters.
pub fn decode_full<C>(src: &[u8]) -> Result<Frame, Error>
where
    C: Checksum,
{
    let body = strip_delimiters(src)?;
    let mut payload = destuff(body)?;

    let min = HEADER_LEN + checksum::size::<C>();
    if payload.len() < min {
        return Err(FramingError::TooShort {
            len: payload.len(),
            min,
        }
        .into());
    }

    let received = payload.split_off(payload.len() - checksum::size::<C>());
    let header = payload.split_to(HEADER_LEN);
    let (address, control) = (header[0], header[1]);

    let expected = calculate_fcs::<C>(address, control, &payload);
    if expected.as_slice() != received.as_ref() {
        return Err(Error::ChecksumMismatch {
            expected: expected.to_vec(),
            received: received.to_vec(),
        });
    }

    Ok(Frame {
        address,
        control,
        payload: payload.freeze(),
    })
}
