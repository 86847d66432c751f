//! Sharder implementation.
use md5;

pub trait Sharder {
    fn get_shard(&self, input: impl AsRef<[u8]>, total_shards: u64) -> u64;
}

/// The default (and only) sharder.
pub struct Md5Sharder;

impl Sharder for Md5Sharder {
    fn get_shard(&self, input: impl AsRef<[u8]>, total_shards: u64) -> u64 {
        let hash = md5::compute(input);
        let value = u32::from_be_bytes([hash[0], hash[1], hash[2], hash[3]]);
        (value as u64) % total_shards
    }
}

#[cfg(test)]
mod tests {
    use super::{Md5Sharder, Sharder};

    #[test]
    fn shard_is_stable_and_bounded() {
        for input in ["salt-123", "salt-user-a", "other-salt-123", ""] {
            let shard = Md5Sharder.get_shard(input, 10_000);
            assert!(shard < 10_000);
            assert_eq!(shard, Md5Sharder.get_shard(input, 10_000));
        }
    }

    #[test]
    fn shard_uses_leading_digest_bytes() {
        // md5("") = d41d8cd98f00b204e9800998ecf8427e
        assert_eq!(Md5Sharder.get_shard("", u64::MAX), 0xd41d8cd9);
    }
}
