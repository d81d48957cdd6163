use utxo_ledger::crypto::{CryptoProvider, Secp256k1Provider};
use utxo_ledger::transaction::TransactionBuilder;
use utxo_ledger::wallet::Wallet;

#[test]
fn test_wallet_creation() {
    // 创建新钱包
    let wallet = Wallet::new();

    // 验证钱包地址是有效的十六进制字符串（40个字符，20字节的RIPEMD160哈希）
    assert_eq!(wallet.address.len(), 40);
    assert!(wallet.address.chars().all(|c| c.is_ascii_hexdigit()));
    assert_eq!(wallet.address, wallet.owner_key().address());

    // 创建另一个钱包，验证地址唯一性
    let wallet2 = Wallet::new();
    assert_ne!(wallet.address, wallet2.address);
}

#[test]
fn test_wallet_from_secret_key() {
    let wallet = Wallet::new();
    let restored = Wallet::from_secret_key(wallet.private_key);

    assert_eq!(restored.public_key, wallet.public_key);
    assert_eq!(restored.address, wallet.address);
}

#[test]
fn test_sign_input_out_of_bounds() {
    let provider = Secp256k1Provider::new();
    let wallet = Wallet::new();

    let mut builder = TransactionBuilder::new();
    builder.add_input(&[0x01], 0);

    assert!(wallet.sign_input(&provider, &mut builder, 1).is_err());
    assert!(builder.input(0).unwrap().signature().is_none());
}

#[test]
fn test_build_genesis_transaction() {
    let provider = Secp256k1Provider::new();
    let wallet = Wallet::new();

    let tx = wallet
        .build_transaction(&provider, None, &[(wallet.owner_key(), 100.0)])
        .unwrap();

    // 创世交易声明 ([0x00], 0)
    assert_eq!(tx.num_inputs(), 1);
    assert_eq!(tx.input(0).unwrap().prev_tx_hash(), &[0x00]);
    assert_eq!(tx.input(0).unwrap().output_index(), 0);
    assert_eq!(tx.num_outputs(), 1);
    assert_eq!(tx.output(0).unwrap().value(), 100.0);

    let message = tx.raw_data_to_sign(0).unwrap();
    let signature = tx.input(0).unwrap().signature().unwrap();
    assert!(provider.verify(&wallet.owner_key(), &message, signature).unwrap());
}

#[test]
fn test_build_spending_transaction() {
    let provider = Secp256k1Provider::new();
    let alice = Wallet::new();
    let bob = Wallet::new();
    let carol = Wallet::new();

    let prev = alice
        .build_transaction(&provider, None, &[(bob.owner_key(), 1.0), (alice.owner_key(), 99.0)])
        .unwrap();
    let tx = alice
        .build_transaction(
            &provider,
            Some(&prev),
            &[(bob.owner_key(), 80.0), (carol.owner_key(), 19.0)],
        )
        .unwrap();

    // 花费前一笔交易的最后一个输出，输出按给定顺序排列
    assert_eq!(tx.input(0).unwrap().prev_tx_hash(), prev.hash());
    assert_eq!(tx.input(0).unwrap().output_index(), 1);
    assert_eq!(tx.output(0).unwrap().owner(), &bob.owner_key());
    assert_eq!(tx.output(1).unwrap().owner(), &carol.owner_key());
}
