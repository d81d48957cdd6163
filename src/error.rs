//! # 错误模块
//!
//! 区分两类失败：调用方的结构性误用/签名服务故障（`LedgerError`），
//! 以及交易未通过验证规则（`TxRejection`）。后者不是错误，只说明拒绝原因。

use thiserror::Error;

use crate::utxo::Utxo;

/// 账本操作中的错误
#[derive(Error, Debug)]
pub enum LedgerError {
    /// 输入索引越界
    #[error("input index {index} out of bounds ({len} inputs)")]
    InputIndexOutOfBounds { index: usize, len: usize },

    /// 输出数量超出 u32 可表示范围，无法引用其输出
    #[error("{count} outputs cannot be indexed by u32")]
    TooManyOutputs { count: usize },

    /// 所有者公钥无法解析
    #[error("invalid owner key: {0}")]
    InvalidOwnerKey(secp256k1::Error),

    /// 签名/哈希服务故障
    #[error("crypto provider error: {0}")]
    Crypto(#[from] secp256k1::Error),
}

pub type LedgerResult<T> = Result<T, LedgerError>;

/// 交易被拒绝的原因，按验证规则的顺序排列
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TxRejection {
    #[error("{count} outputs cannot be indexed by u32")]
    TooManyOutputs { count: usize },

    #[error("input claims {0} which is not in the pool")]
    MissingInput(Utxo),

    #[error("input {index} is not signed")]
    Unsigned { index: usize },

    #[error("signature on input {index} does not verify")]
    BadSignature { index: usize },

    #[error("{0} is claimed more than once")]
    DuplicateInput(Utxo),

    #[error("output {index} has negative value {value}")]
    NegativeOutput { index: usize, value: f64 },

    #[error("inputs {inputs} do not cover outputs {outputs}")]
    InsufficientInput { inputs: f64, outputs: f64 },
}
