use crate::{
    foundation::error::{VoidError, VoidResult},
    foundation::math::fnv1a64_str,
};

/// Hash partition: `fnv1a64(identifier) % total == index`.
///
/// Depends only on the identifier and the shard count, so membership never
/// shifts when files are added or removed. Returns `false` for an invalid
/// `(index, total)`.
pub fn belongs_to_shard(identifier: &str, index: u32, total: u32) -> bool {
    if total == 0 || index >= total {
        return false;
    }
    fnv1a64_str(identifier) % u64::from(total) == u64::from(index)
}

/// How a batch splits its inputs across workers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShardStrategy {
    /// Position in the sorted input list modulo the shard count.
    #[default]
    RoundRobin,
    /// [`belongs_to_shard`] on the file name.
    Hash,
}

/// One worker's slice of the input set. Always valid once constructed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ShardSpec {
    index: u32,
    total: u32,
    strategy: ShardStrategy,
}

impl Default for ShardSpec {
    fn default() -> Self {
        Self {
            index: 0,
            total: 1,
            strategy: ShardStrategy::RoundRobin,
        }
    }
}

impl ShardSpec {
    pub fn new(index: u32, total: u32, strategy: ShardStrategy) -> VoidResult<Self> {
        if total == 0 {
            return Err(VoidError::startup("shard total must be > 0"));
        }
        if index >= total {
            return Err(VoidError::startup(format!(
                "shard index {index} out of range for {total} shards"
            )));
        }
        Ok(Self {
            index,
            total,
            strategy,
        })
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    pub fn strategy(&self) -> ShardStrategy {
        self.strategy
    }

    /// Select this shard's names. Input is sorted first so every worker sees
    /// the same positions.
    pub fn select<S: AsRef<str>>(&self, mut names: Vec<S>) -> Vec<S> {
        names.sort_by(|a, b| a.as_ref().cmp(b.as_ref()));
        let total = self.total as usize;
        let index = self.index as usize;
        match self.strategy {
            ShardStrategy::RoundRobin => names
                .into_iter()
                .enumerate()
                .filter(|(i, _)| i % total == index)
                .map(|(_, n)| n)
                .collect(),
            ShardStrategy::Hash => names
                .into_iter()
                .filter(|n| belongs_to_shard(n.as_ref(), self.index, self.total))
                .collect(),
        }
    }
}

#[cfg(test)]
#[path = "../tests/unit/shard.rs"]
mod tests;
