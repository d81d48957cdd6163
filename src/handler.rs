//! # 交易处理模块
//!
//! `TxHandler` 持有账本当前的UTXO池，负责验证一批候选交易，
//! 按给定顺序贪心地接受互相一致的交易，并据此更新UTXO池。

use std::collections::HashSet;
use std::fmt;

use log::{debug, info, warn};

use crate::crypto::{CryptoProvider, Secp256k1Provider};
use crate::error::{LedgerResult, TxRejection};
use crate::transaction::{Output, Transaction};
use crate::utxo::{Utxo, UtxoPool};

/// 单个周期的交易处理器
pub struct TxHandler<P: CryptoProvider = Secp256k1Provider> {
    pool: UtxoPool,
    provider: P,
}

impl TxHandler<Secp256k1Provider> {
    /// 以 `pool` 的副本作为当前账本创建处理器，使用默认签名服务
    pub fn new(pool: &UtxoPool) -> Self {
        Self::with_provider(pool, Secp256k1Provider::new())
    }
}

impl<P: CryptoProvider> TxHandler<P> {
    /// 以 `pool` 的副本和指定的签名服务创建处理器
    ///
    /// 处理器从不与调用方共享池，之后对 `pool` 的修改不会影响处理器。
    pub fn with_provider(pool: &UtxoPool, provider: P) -> Self {
        TxHandler {
            pool: pool.clone(),
            provider,
        }
    }

    pub fn pool(&self) -> &UtxoPool {
        &self.pool
    }

    pub fn into_pool(self) -> UtxoPool {
        self.pool
    }

    /// 检查交易在当前池上是否有效，不修改池
    ///
    /// 输出数量超出 u32 可表示范围的交易直接拒绝。之后依次检查（遇到第一条失败即返回）：
    ///
    /// 1. 每个输入声明的UTXO都在当前池中
    /// 2. 每个输入的签名都能用对应输出所有者的公钥验证
    /// 3. 同一交易内没有重复声明的UTXO
    /// 4. 所有输出金额非负
    /// 5. 输入金额之和不小于输出金额之和
    ///
    /// # 返回值
    ///
    /// 有效时返回 `Ok(None)`，否则返回第一条失败规则对应的原因。
    /// 签名服务故障（例如池中公钥格式错误）以 `Err` 返回。
    pub fn rejection_reason(&self, tx: &Transaction) -> LedgerResult<Option<TxRejection>> {
        if !outputs_indexable(tx.num_outputs()) {
            return Ok(Some(TxRejection::TooManyOutputs {
                count: tx.num_outputs(),
            }));
        }

        for input in tx.inputs() {
            let utxo = input.utxo();
            if !self.pool.contains(&utxo) {
                return Ok(Some(TxRejection::MissingInput(utxo)));
            }
        }

        for (index, input) in tx.inputs().iter().enumerate() {
            let utxo = input.utxo();
            let output = match self.pool.get_tx_output(&utxo) {
                Some(output) => output,
                None => return Ok(Some(TxRejection::MissingInput(utxo))),
            };
            let signature = match input.signature() {
                Some(signature) => signature,
                None => return Ok(Some(TxRejection::Unsigned { index })),
            };
            let message = tx.raw_data_to_sign(index)?;
            if !self.provider.verify(output.owner(), &message, signature)? {
                return Ok(Some(TxRejection::BadSignature { index }));
            }
        }

        let mut claimed: HashSet<Utxo> = HashSet::with_capacity(tx.num_inputs());
        for input in tx.inputs() {
            let utxo = input.utxo();
            if claimed.contains(&utxo) {
                return Ok(Some(TxRejection::DuplicateInput(utxo)));
            }
            claimed.insert(utxo);
        }

        for (index, output) in tx.outputs().iter().enumerate() {
            if output.value() < 0.0 {
                return Ok(Some(TxRejection::NegativeOutput {
                    index,
                    value: output.value(),
                }));
            }
        }

        // 按UTXO键去重求和
        let inputs: f64 = claimed
            .iter()
            .filter_map(|utxo| self.pool.get_tx_output(utxo))
            .map(|output| output.value())
            .sum();
        let outputs: f64 = tx.outputs().iter().map(|output| output.value()).sum();
        // 输出含 NaN 时比较为假，同样拒绝
        if !(inputs >= outputs) {
            return Ok(Some(TxRejection::InsufficientInput { inputs, outputs }));
        }

        Ok(None)
    }

    pub fn is_valid_tx(&self, tx: &Transaction) -> LedgerResult<bool> {
        Ok(self.rejection_reason(tx)?.is_none())
    }

    /// 处理一个周期的候选交易
    ///
    /// 严格按给定顺序逐笔验证；有效交易立即生效，后面的交易可以花费
    /// 同一批中前面交易创建的输出。冲突的交易只接受顺序在前的那一笔。
    ///
    /// # 返回值
    ///
    /// 按接受顺序返回被接受的交易。签名服务故障时返回 `Err`，
    /// 本批已生效的修改全部撤销，池恢复到调用前的状态。
    pub fn handle_txs<'a>(
        &mut self,
        candidates: &'a [Transaction],
    ) -> LedgerResult<Vec<&'a Transaction>> {
        let mut accepted = Vec::new();
        let mut journal = Vec::new();

        for tx in candidates {
            let reason = match self.rejection_reason(tx) {
                Ok(reason) => reason,
                Err(err) => {
                    warn!(
                        "provider failure on tx {}, rolling back {} accepted txs: {}",
                        hex::encode(tx.hash()),
                        accepted.len(),
                        err
                    );
                    self.roll_back(journal);
                    return Err(err);
                }
            };
            if let Some(reason) = reason {
                debug!("reject tx {}: {}", hex::encode(tx.hash()), reason);
                continue;
            }

            self.apply(tx, &mut journal);
            accepted.push(tx);
        }

        info!(
            "handled {} candidate txs, accepted {}, pool size {}",
            candidates.len(),
            accepted.len(),
            self.pool.len()
        );
        Ok(accepted)
    }

    /// 加入全部输出，再删除全部被花费的输入；每次修改前的状态记入 `journal`
    fn apply(&mut self, tx: &Transaction, journal: &mut Vec<(Utxo, Option<Output>)>) {
        // 输出数量已在验证时检查，不会超出 u32
        for (index, output) in (0..=u32::MAX).zip(tx.outputs()) {
            let utxo = Utxo::new(tx.hash(), index);
            let previous = self.pool.add_utxo(utxo.clone(), output.clone());
            journal.push((utxo, previous));
        }
        for input in tx.inputs() {
            let utxo = input.utxo();
            let previous = self.pool.remove_utxo(&utxo);
            journal.push((utxo, previous));
        }
        debug!("accept tx {}", hex::encode(tx.hash()));
    }

    fn roll_back(&mut self, journal: Vec<(Utxo, Option<Output>)>) {
        for (utxo, previous) in journal.into_iter().rev() {
            match previous {
                Some(output) => {
                    self.pool.add_utxo(utxo, output);
                }
                None => {
                    self.pool.remove_utxo(&utxo);
                }
            }
        }
    }
}

/// 输出索引编码为4字节，输出数量必须能用 u32 表示
fn outputs_indexable(count: usize) -> bool {
    u32::try_from(count).is_ok()
}

impl<P: CryptoProvider> fmt::Display for TxHandler<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Transaction Handler:\n{}", self.pool)
    }
}
