//! Split-word timestamps and lengths.
//!
//! A tick is 100 nanoseconds; tick 0 is 1601-01-01T00:00:00Z, the epoch of
//! the native split-word time on every platform.

use hostio_driver::FileTime;

/// Ticks per second.
pub const TICKS_PER_SECOND: i64 = 10_000_000;

/// Ticks between the tick epoch and 1970-01-01T00:00:00Z.
pub const UNIX_EPOCH_TICKS: i64 = 116_444_736_000_000_000;

/// Joins `high:low` into one 64-bit value.
pub const fn join_words(high: u32, low: u32) -> i64 {
    (((high as u64) << 32) | low as u64) as i64
}

/// Splits a 64-bit value into its `(high, low)` words.
pub const fn split_words(value: i64) -> (u32, u32) {
    ((value as u64 >> 32) as u32, value as u32)
}

/// Ticks of a native timestamp.
pub fn filetime_to_ticks(time: &FileTime) -> i64 {
    join_words(time.high, time.low)
}

/// Native timestamp of a tick count.
pub fn ticks_to_filetime(ticks: i64) -> FileTime {
    let (high, low) = split_words(ticks);
    FileTime { low, high }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn words() {
        for (high, low) in [
            (0, 0),
            (0, u32::MAX),
            (u32::MAX, 0),
            (0x8000_0000, 1),
            (u32::MAX, u32::MAX),
            (0x01d9_8c3a, 0x1234_5678),
        ] {
            assert_eq!(split_words(join_words(high, low)), (high, low));
            let time = FileTime { low, high };
            assert_eq!(ticks_to_filetime(filetime_to_ticks(&time)), time);
        }
    }

    #[test]
    fn known_values() {
        assert_eq!(join_words(1, 0), 1 << 32);
        assert_eq!(split_words(-1), (u32::MAX, u32::MAX));
        assert_eq!(split_words(UNIX_EPOCH_TICKS), (0x019d_b1de, 0xd53e_8000));
    }
}
