#[macro_export]
macro_rules! verify {
    ($expr:expr) => {{
        let result = $expr;
        $crate::utils::verify(result, stringify!($expr))?;
    }};
}

pub fn verify(predicate: bool, condition: &str) -> std::io::Result<()> {
    if predicate {
        Ok(())
    } else {
        Err(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            condition,
        ))
    }
}

/// Maximum number of bytes of a variable-length encoded `u32`.
pub const MAX_VU32_LEN: usize = 5;

/// Maximum number of bytes of a variable-length encoded `u64`.
pub const MAX_VU64_LEN: usize = 10;

/// Encodes `value` as a variable-length integer into `buf`, returning the number of
/// bytes used.
///
/// Each byte carries seven bits of the value, least significant group first; the
/// high bit is set on every byte except the last one.
#[inline]
pub fn encode_vu64(mut value: u64, buf: &mut [u8; MAX_VU64_LEN]) -> usize {
    let mut len = 0;
    while value >= 0x80 {
        buf[len] = (value as u8 & 0x7f) | 0x80;
        value >>= 7;
        len += 1;
    }
    buf[len] = value as u8;
    len + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_vu64() {
        let mut buf = [0u8; MAX_VU64_LEN];
        assert_eq!(encode_vu64(0, &mut buf), 1);
        assert_eq!(buf[0], 0);

        assert_eq!(encode_vu64(127, &mut buf), 1);
        assert_eq!(buf[0], 0x7f);

        assert_eq!(encode_vu64(128, &mut buf), 2);
        assert_eq!(&buf[..2], &[0x80, 0x01]);

        assert_eq!(encode_vu64(300, &mut buf), 2);
        assert_eq!(&buf[..2], &[0xac, 0x02]);

        assert_eq!(encode_vu64(u64::MAX, &mut buf), MAX_VU64_LEN);
        assert_eq!(buf[MAX_VU64_LEN - 1], 0x01);
    }
}
