use bytes::{
    BufMut,
    BytesMut,
};

use crate::{
    is_reserved,
    FramingError,
    ESCAPE,
    ESCAPE_MASK,
};

/// Worst-case stuffed length of `len` input bytes.
#[inline]
pub const fn max_stuffed_len(len: usize) -> usize {
    len * 2
}

/// Append `src` to `dst`, escaping every [`FLAG`](crate::FLAG) and [`ESCAPE`].
pub fn stuff(src: &[u8], dst: &mut BytesMut) {
    dst.reserve(src.len() + src.iter().filter(|&&b| is_reserved(b)).count());

    for &b in src {
        if is_reserved(b) {
            dst.put_u8(ESCAPE);
            dst.put_u8(b ^ ESCAPE_MASK);
        } else {
            dst.put_u8(b);
        }
    }
}

/// Reverse [`stuff`].
///
/// Any byte following an [`ESCAPE`] is unmasked, whether or not it was a
/// reserved value originally.
pub fn destuff(src: &[u8]) -> Result<BytesMut, FramingError> {
    let mut out = BytesMut::with_capacity(src.len());
    let mut escaped = false;

    for &b in src {
        if escaped {
            out.put_u8(b ^ ESCAPE_MASK);
            escaped = false;
        } else if b == ESCAPE {
            escaped = true;
        } else {
            out.put_u8(b);
        }
    }

    if escaped {
        return Err(FramingError::DanglingEscape);
    }

    Ok(out)
}

#[cfg(test)]
mod test {
    use proptest::prelude::*;

    use super::*;
    use crate::FLAG;

    fn stuffed(src: &[u8]) -> Vec<u8> {
        let mut dst = BytesMut::new();
        stuff(src, &mut dst);

        dst.to_vec()
    }

    #[test]
    fn test_reserved_bytes() {
        assert_eq!(stuffed(&[0x78, 0x7E, 0x7D]), vec![0x78, 0x7D, 0x5E, 0x7D, 0x5D]);
        assert_eq!(stuffed(&[0x5E, 0x5D]), vec![0x5E, 0x5D]);
    }

    #[test]
    fn test_appends() {
        let mut dst = BytesMut::from(&[FLAG][..]);
        stuff(&[1, 2], &mut dst);

        assert_eq!(dst.as_ref(), &[FLAG, 1, 2]);
    }

    #[test]
    fn test_dangling_escape() {
        assert_eq!(destuff(&[1, 2, ESCAPE]), Err(FramingError::DanglingEscape));
    }

    #[test]
    fn test_empty() -> eyre::Result<()> {
        assert!(stuffed(&[]).is_empty());
        assert!(destuff(&[])?.is_empty());

        Ok(())
    }

    proptest! {
        #[test]
        fn test_no_flag_in_output(src in any::<Vec<u8>>()) {
            let out = stuffed(&src);

            prop_assert!(!out.contains(&FLAG));
            prop_assert!(out.len() <= max_stuffed_len(src.len()));
        }

        #[test]
        fn test_escapes_precede_reserved(src in any::<Vec<u8>>()) {
            let out = stuffed(&src);

            let mut iter = out.iter();
            while let Some(&b) = iter.next() {
                if b == ESCAPE {
                    let next = *iter.next().expect("escape is never the last byte");
                    prop_assert!(is_reserved(next ^ ESCAPE_MASK));
                }
            }
        }

        #[test]
        fn test_destuff_inverts_stuff(src in any::<Vec<u8>>()) {
            let out = destuff(&stuffed(&src)).unwrap();
            prop_assert_eq!(out.as_ref(), &src[..]);
        }
    }
}
