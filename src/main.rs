//! # UTXO账本演示程序
//!
//! 创建三个钱包，构造创世交易并用它的输出初始化UTXO池，
//! 然后把同一笔转账交易提交两次，只有第一次会被接受。
//!
//! 用法：`utxo_ledger [创世金额]`，日志级别由 `RUST_LOG` 控制。

use std::env;

use anyhow::Context;
use log::info;

use utxo_ledger::{Secp256k1Provider, TxHandler, Utxo, UtxoPool, Wallet};

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let genesis_value: f64 = match args.get(1) {
        Some(arg) => arg
            .parse()
            .with_context(|| format!("invalid genesis value: {}", arg))?,
        None => 100.0,
    };

    let provider = Secp256k1Provider::new();
    let alice = Wallet::new();
    let bob = Wallet::new();
    let carol = Wallet::new();
    println!("alice: {}", alice.address);
    println!("bob:   {}", bob.address);
    println!("carol: {}", carol.address);

    // 创世交易
    let tx1 = alice.build_transaction(&provider, None, &[(alice.owner_key(), genesis_value)])?;
    println!("\nTx1:\n{}", tx1);

    // 用创世交易的最后一个输出初始化账本
    let mut pool = UtxoPool::new();
    let last = tx1.num_outputs() - 1;
    let output = tx1.output(last).context("genesis tx has no outputs")?;
    let index = u32::try_from(last).context("genesis output index overflows u32")?;
    pool.add_utxo(Utxo::new(tx1.hash(), index), output.clone());

    let mut handler = TxHandler::with_provider(&pool, provider.clone());
    println!("{}", handler);

    let payees = [
        (bob.owner_key(), genesis_value * 0.8),
        (carol.owner_key(), genesis_value * 0.2),
    ];
    let tx2 = alice.build_transaction(&provider, Some(&tx1), &payees)?;
    println!("Tx2:\n{}", tx2);

    println!("Add two tx2 to ledger");
    let candidates = vec![tx2.clone(), tx2];
    let accepted = handler.handle_txs(&candidates)?;
    info!("accepted {} of {}", accepted.len(), candidates.len());

    println!("\nProcessed transactions: {}", accepted.len());
    println!("{}", serde_json::to_string_pretty(&accepted)?);
    println!("\n{}", handler);
    Ok(())
}
