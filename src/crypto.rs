//! # 密码学模块
//!
//! 定义验证器依赖的签名/哈希服务接口 `CryptoProvider`，以及基于
//! secp256k1 ECDSA 与 SHA-256 的默认实现。
//!
//! 验证器只要求 `verify` 是 `sign` 的精确逆检查，具体算法可替换。

use std::fmt;

use ripemd::Ripemd160;
use secp256k1::{ecdsa, All, Message, PublicKey, Secp256k1, SecretKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{LedgerError, LedgerResult};

/// 输出所有者的公钥，保存65字节未压缩 SEC1 编码
///
/// 交易的规范编码直接拼接这些字节，因此相等性按字节比较。
/// 只能由合法公钥构造，池中不会出现无法解析的所有者。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OwnerKey(Vec<u8>);

impl OwnerKey {
    /// 解析公钥字节（压缩或未压缩），统一保存为未压缩编码
    pub fn from_bytes(bytes: &[u8]) -> LedgerResult<Self> {
        let public_key = PublicKey::from_slice(bytes).map_err(LedgerError::InvalidOwnerKey)?;
        Ok(OwnerKey::from(public_key))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// 由公钥字节计算显示用地址：先 SHA-256，再 RIPEMD160，输出40位十六进制
    pub fn address(&self) -> String {
        let digest = Sha256::digest(&self.0);
        let mut ripemd = Ripemd160::new();
        ripemd.update(digest);
        hex::encode(ripemd.finalize())
    }
}

impl From<PublicKey> for OwnerKey {
    fn from(public_key: PublicKey) -> Self {
        OwnerKey(public_key.serialize_uncompressed().to_vec())
    }
}

impl From<&PublicKey> for OwnerKey {
    fn from(public_key: &PublicKey) -> Self {
        OwnerKey::from(*public_key)
    }
}

impl TryFrom<String> for OwnerKey {
    type Error = LedgerError;

    fn try_from(encoded: String) -> LedgerResult<Self> {
        let bytes = hex::decode(encoded)
            .map_err(|_| LedgerError::InvalidOwnerKey(secp256k1::Error::InvalidPublicKey))?;
        OwnerKey::from_bytes(&bytes)
    }
}

impl From<OwnerKey> for String {
    fn from(owner: OwnerKey) -> Self {
        hex::encode(owner.0)
    }
}

impl fmt::Display for OwnerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.address())
    }
}

/// 签名与哈希服务
///
/// `sign` 和密钥相关的失败属于服务故障，以错误返回；
/// 签名不匹配不是故障，`verify` 返回 `Ok(false)`。
pub trait CryptoProvider {
    type SecretKey;

    /// 用私钥对消息签名
    fn sign(&self, secret_key: &Self::SecretKey, message: &[u8]) -> LedgerResult<Vec<u8>>;

    /// 用所有者公钥检查消息上的签名
    fn verify(&self, owner: &OwnerKey, message: &[u8], signature: &[u8]) -> LedgerResult<bool>;

    /// 计算摘要，用作交易的唯一标识
    fn hash(&self, data: &[u8]) -> Vec<u8>;
}

/// 默认服务：SHA-256 哈希，secp256k1 ECDSA 签名（对消息的 SHA-256 摘要签名，紧凑64字节格式）
#[derive(Debug, Clone)]
pub struct Secp256k1Provider {
    secp: Secp256k1<All>,
}

impl Secp256k1Provider {
    pub fn new() -> Self {
        Secp256k1Provider {
            secp: Secp256k1::new(),
        }
    }

    fn digest_message(message: &[u8]) -> LedgerResult<Message> {
        let digest = Sha256::digest(message);
        Ok(Message::from_slice(&digest)?)
    }
}

impl Default for Secp256k1Provider {
    fn default() -> Self {
        Self::new()
    }
}

impl CryptoProvider for Secp256k1Provider {
    type SecretKey = SecretKey;

    fn sign(&self, secret_key: &SecretKey, message: &[u8]) -> LedgerResult<Vec<u8>> {
        let message = Self::digest_message(message)?;
        let signature = self.secp.sign_ecdsa(&message, secret_key);
        Ok(signature.serialize_compact().to_vec())
    }

    fn verify(&self, owner: &OwnerKey, message: &[u8], signature: &[u8]) -> LedgerResult<bool> {
        let public_key = PublicKey::from_slice(owner.as_bytes())?;
        let signature = match ecdsa::Signature::from_compact(signature) {
            Ok(signature) => signature,
            Err(_) => return Ok(false),
        };
        let message = Self::digest_message(message)?;
        Ok(self.secp.verify_ecdsa(&message, &signature, &public_key).is_ok())
    }

    fn hash(&self, data: &[u8]) -> Vec<u8> {
        Sha256::digest(data).to_vec()
    }
}

/// 测试用：由固定私钥字节得到确定的所有者公钥
#[cfg(test)]
pub(crate) fn fixed_owner(byte: u8) -> OwnerKey {
    let secp = Secp256k1::new();
    let secret_key = SecretKey::from_slice(&[byte; 32]).expect("valid secret key");
    OwnerKey::from(PublicKey::from_secret_key(&secp, &secret_key))
}
