//! # 交易模块
//!
//! 定义交易输入、交易输出和交易本身。
//!
//! 交易分两个阶段：`TransactionBuilder` 阶段可以添加输入、输出和签名；
//! 调用 `finalize` 后得到不可变的 `Transaction`，其哈希即唯一标识。
//!
//! 规范字节编码（签名与哈希都基于它，顺序敏感）：
//!
//! * 输出：8字节大端 IEEE-754 金额 + 所有者公钥编码字节
//! * 第 i 个输入的签名数据：前序交易哈希 + 4字节大端输出索引 + 全部输出编码
//! * 哈希数据：每个输入的（前序交易哈希 + 4字节大端输出索引 + 签名）+ 全部输出编码

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::crypto::{CryptoProvider, OwnerKey};
use crate::error::{LedgerError, LedgerResult};
use crate::utxo::Utxo;

/// 交易输出，表示金额及其所有者
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Output {
    value: f64,
    owner: OwnerKey,
}

impl Output {
    pub fn new(value: f64, owner: OwnerKey) -> Self {
        Output { value, owner }
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn owner(&self) -> &OwnerKey {
        &self.owner
    }

    fn encode_into(&self, raw: &mut Vec<u8>) {
        raw.extend_from_slice(&self.value.to_be_bytes());
        raw.extend_from_slice(self.owner.as_bytes());
    }
}

impl fmt::Display for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "value {} to {}", self.value, self.owner)
    }
}

/// 交易输入，引用之前某笔交易的输出
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Input {
    /// 被花费输出所在交易的哈希
    #[serde(with = "hex::serde")]
    prev_tx_hash: Vec<u8>,
    /// 被花费输出在该交易中的索引
    output_index: u32,
    /// 签名，签名之前为空
    signature: Option<Vec<u8>>,
}

impl Input {
    fn new(prev_tx_hash: &[u8], output_index: u32) -> Self {
        Input {
            prev_tx_hash: prev_tx_hash.to_vec(),
            output_index,
            signature: None,
        }
    }

    pub fn prev_tx_hash(&self) -> &[u8] {
        &self.prev_tx_hash
    }

    pub fn output_index(&self) -> u32 {
        self.output_index
    }

    pub fn signature(&self) -> Option<&[u8]> {
        self.signature.as_deref()
    }

    /// 该输入声明花费的UTXO
    pub fn utxo(&self) -> Utxo {
        Utxo::new(&self.prev_tx_hash, self.output_index)
    }

    fn encode_outpoint_into(&self, raw: &mut Vec<u8>) {
        raw.extend_from_slice(&self.prev_tx_hash);
        raw.extend_from_slice(&self.output_index.to_be_bytes());
    }
}

impl fmt::Display for Input {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let signature = match &self.signature {
            Some(signature) => hex::encode(signature),
            None => "NULL".to_string(),
        };
        write!(
            f,
            "prev {} index {} signature {}",
            hex::encode(&self.prev_tx_hash),
            self.output_index,
            signature
        )
    }
}

fn encode_outputs_into(outputs: &[Output], raw: &mut Vec<u8>) {
    for output in outputs {
        output.encode_into(raw);
    }
}

fn raw_data_to_sign(inputs: &[Input], outputs: &[Output], index: usize) -> LedgerResult<Vec<u8>> {
    let input = inputs.get(index).ok_or(LedgerError::InputIndexOutOfBounds {
        index,
        len: inputs.len(),
    })?;

    let mut raw = Vec::new();
    input.encode_outpoint_into(&mut raw);
    encode_outputs_into(outputs, &mut raw);
    Ok(raw)
}

fn raw_tx(inputs: &[Input], outputs: &[Output]) -> Vec<u8> {
    let mut raw = Vec::new();
    for input in inputs {
        input.encode_outpoint_into(&mut raw);
        if let Some(signature) = &input.signature {
            raw.extend_from_slice(signature);
        }
    }
    encode_outputs_into(outputs, &mut raw);
    raw
}

/// 构建中的交易
///
/// 输入和输出的添加顺序是规范编码的一部分，会影响签名数据和最终哈希。
#[derive(Debug, Clone, Default)]
pub struct TransactionBuilder {
    inputs: Vec<Input>,
    outputs: Vec<Output>,
}

impl TransactionBuilder {
    pub fn new() -> Self {
        TransactionBuilder {
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    /// 追加一个未签名的输入，不做任何检查
    pub fn add_input(&mut self, prev_tx_hash: &[u8], output_index: u32) -> &mut Self {
        self.inputs.push(Input::new(prev_tx_hash, output_index));
        self
    }

    /// 追加一个输出，不做任何检查（负金额由验证器拒绝）
    pub fn add_output(&mut self, value: f64, owner: OwnerKey) -> &mut Self {
        self.outputs.push(Output::new(value, owner));
        self
    }

    /// 删除第 `index` 个输入
    pub fn remove_input(&mut self, index: usize) -> LedgerResult<Input> {
        if index >= self.inputs.len() {
            return Err(LedgerError::InputIndexOutOfBounds {
                index,
                len: self.inputs.len(),
            });
        }
        Ok(self.inputs.remove(index))
    }

    /// 删除第一个声明花费 `utxo` 的输入，返回是否删除
    pub fn remove_input_utxo(&mut self, utxo: &Utxo) -> bool {
        match self.inputs.iter().position(|input| input.utxo() == *utxo) {
            Some(position) => {
                self.inputs.remove(position);
                true
            }
            None => false,
        }
    }

    /// 为第 `index` 个输入附加签名（复制字节，不检查正确性）
    pub fn add_signature(&mut self, signature: &[u8], index: usize) -> LedgerResult<()> {
        let len = self.inputs.len();
        let input = self
            .inputs
            .get_mut(index)
            .ok_or(LedgerError::InputIndexOutOfBounds { index, len })?;
        input.signature = Some(signature.to_vec());
        Ok(())
    }

    /// 第 `index` 个输入需要签名的字节数据，不包含任何签名
    pub fn raw_data_to_sign(&self, index: usize) -> LedgerResult<Vec<u8>> {
        raw_data_to_sign(&self.inputs, &self.outputs, index)
    }

    /// 用于计算哈希的字节数据，包含已附加的签名
    pub fn raw_tx(&self) -> Vec<u8> {
        raw_tx(&self.inputs, &self.outputs)
    }

    pub fn num_inputs(&self) -> usize {
        self.inputs.len()
    }

    pub fn num_outputs(&self) -> usize {
        self.outputs.len()
    }

    pub fn input(&self, index: usize) -> Option<&Input> {
        self.inputs.get(index)
    }

    pub fn output(&self, index: usize) -> Option<&Output> {
        self.outputs.get(index)
    }

    /// 计算哈希并固定交易
    ///
    /// 哈希数据包含签名，所以必须在所有输入签名之后调用。
    /// 消耗构建器，之后交易不可再修改。
    pub fn finalize<P: CryptoProvider>(self, provider: &P) -> Transaction {
        let hash = provider.hash(&self.raw_tx());
        Transaction {
            hash,
            inputs: self.inputs,
            outputs: self.outputs,
        }
    }
}

/// 已固定的交易，`hash` 为其唯一标识
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    #[serde(with = "hex::serde")]
    hash: Vec<u8>,
    inputs: Vec<Input>,
    outputs: Vec<Output>,
}

impl Transaction {
    pub fn hash(&self) -> &[u8] {
        &self.hash
    }

    pub fn inputs(&self) -> &[Input] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[Output] {
        &self.outputs
    }

    pub fn input(&self, index: usize) -> Option<&Input> {
        self.inputs.get(index)
    }

    pub fn output(&self, index: usize) -> Option<&Output> {
        self.outputs.get(index)
    }

    pub fn num_inputs(&self) -> usize {
        self.inputs.len()
    }

    pub fn num_outputs(&self) -> usize {
        self.outputs.len()
    }

    pub fn raw_data_to_sign(&self, index: usize) -> LedgerResult<Vec<u8>> {
        raw_data_to_sign(&self.inputs, &self.outputs, index)
    }

    pub fn raw_tx(&self) -> Vec<u8> {
        raw_tx(&self.inputs, &self.outputs)
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Transaction {}", hex::encode(&self.hash))?;
        for (index, input) in self.inputs.iter().enumerate() {
            writeln!(f, "  input {}: {}", index, input)?;
        }
        for (index, output) in self.outputs.iter().enumerate() {
            writeln!(f, "  output {}: {}", index, output)?;
        }
        Ok(())
    }
}
