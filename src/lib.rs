//! # UTXO账本验证器
//!
//! 给定当前未花费交易输出（UTXO）池和一批候选交易，判断哪些交易互相一致地有效，
//! 接受其中的一个子集，并得到更新后的UTXO池。
//!
//! ## 主要模块
//!
//! * `crypto` - 签名/哈希服务接口及 secp256k1 默认实现
//! * `transaction` - 交易输入、输出、构建器与规范字节编码
//! * `utxo` - UTXO标识与UTXO池
//! * `handler` - 交易验证规则与周期状态转换
//! * `wallet` - 密钥管理和交易签名
//! * `error` - 错误与拒绝原因

pub mod crypto;
pub mod error;
pub mod handler;
pub mod transaction;
pub mod utxo;
pub mod wallet;

pub use crypto::{CryptoProvider, OwnerKey, Secp256k1Provider};
pub use error::{LedgerError, LedgerResult, TxRejection};
pub use handler::TxHandler;
pub use transaction::{Input, Output, Transaction, TransactionBuilder};
pub use utxo::{Utxo, UtxoPool};
pub use wallet::Wallet;
