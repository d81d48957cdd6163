//! # UTXO模块
//!
//! 定义未花费交易输出的标识 `Utxo`，以及账本当前可花费状态 `UtxoPool`。

use std::collections::HashMap;
use std::fmt;

use log::trace;
use serde::{Deserialize, Serialize};

use crate::transaction::Output;

/// 一个可花费输出位置的标识：来源交易哈希 + 输出索引
///
/// 相等性与哈希按值计算，作为池的键使用。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Utxo {
    #[serde(with = "hex::serde")]
    tx_hash: Vec<u8>,
    output_index: u32,
}

impl Utxo {
    /// 创建UTXO标识，复制传入的哈希字节
    pub fn new(tx_hash: &[u8], output_index: u32) -> Self {
        Utxo {
            tx_hash: tx_hash.to_vec(),
            output_index,
        }
    }

    pub fn tx_hash(&self) -> &[u8] {
        &self.tx_hash
    }

    pub fn output_index(&self) -> u32 {
        self.output_index
    }
}

impl fmt::Display for Utxo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", hex::encode(&self.tx_hash), self.output_index)
    }
}

/// UTXO池，从UTXO标识映射到它代表的输出
///
/// `Clone` 即复制构造：得到独立的映射，之后双方的修改互不影响。
#[derive(Debug, Clone, Default)]
pub struct UtxoPool {
    utxos: HashMap<Utxo, Output>,
}

impl UtxoPool {
    pub fn new() -> Self {
        UtxoPool {
            utxos: HashMap::new(),
        }
    }

    /// 插入或覆盖映射，返回被覆盖的输出
    pub fn add_utxo(&mut self, utxo: Utxo, output: Output) -> Option<Output> {
        trace!("add utxo {} value {}", utxo, output.value());
        self.utxos.insert(utxo, output)
    }

    /// 删除映射，不存在时什么也不做；返回被删除的输出
    pub fn remove_utxo(&mut self, utxo: &Utxo) -> Option<Output> {
        let removed = self.utxos.remove(utxo);
        if removed.is_some() {
            trace!("remove utxo {}", utxo);
        }
        removed
    }

    pub fn contains(&self, utxo: &Utxo) -> bool {
        self.utxos.contains_key(utxo)
    }

    pub fn get_tx_output(&self, utxo: &Utxo) -> Option<&Output> {
        self.utxos.get(utxo)
    }

    /// 池中全部UTXO，按（哈希, 索引）排序
    pub fn all_utxos(&self) -> Vec<Utxo> {
        let mut utxos: Vec<Utxo> = self.utxos.keys().cloned().collect();
        utxos.sort();
        utxos
    }

    pub fn len(&self) -> usize {
        self.utxos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.utxos.is_empty()
    }

    /// 池中所有输出金额之和
    pub fn total_value(&self) -> f64 {
        self.utxos.values().map(Output::value).sum()
    }
}

impl fmt::Display for UtxoPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "UTXO Pool ({} entries):", self.len())?;
        for utxo in self.all_utxos() {
            if let Some(output) = self.utxos.get(&utxo) {
                writeln!(f, "  {} -> {}", utxo, output)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::fixed_owner;

    fn output(value: f64) -> Output {
        Output::new(value, fixed_owner(7))
    }

    #[test]
    fn test_utxo_equality_by_value() {
        let hash = vec![1u8, 2, 3];
        let a = Utxo::new(&hash, 0);
        let b = Utxo::new(&[1u8, 2, 3], 0);

        assert_eq!(a, b);
        assert_ne!(a, Utxo::new(&hash, 1));
        assert_ne!(a, Utxo::new(&[1u8, 2, 4], 0));
    }

    #[test]
    fn test_lookup_with_fresh_key() {
        let mut pool = UtxoPool::new();
        pool.add_utxo(Utxo::new(b"h1", 0), output(100.0));

        // 用新构造的键查找，依赖按值相等
        let key = Utxo::new(b"h1", 0);
        assert!(pool.contains(&key));
        assert_eq!(pool.get_tx_output(&key).map(Output::value), Some(100.0));
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let mut pool = UtxoPool::new();
        pool.add_utxo(Utxo::new(b"h1", 0), output(1.0));

        pool.remove_utxo(&Utxo::new(b"h2", 0));
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn test_display_is_sorted() {
        let mut pool = UtxoPool::new();
        pool.add_utxo(Utxo::new(&[0x02], 0), output(2.0));
        pool.add_utxo(Utxo::new(&[0x01], 1), output(1.0));

        let text = pool.to_string();
        let first = text.find("01:1").unwrap();
        let second = text.find("02:0").unwrap();
        assert!(first < second);
    }
}
