use utxo_ledger::crypto::Secp256k1Provider;
use utxo_ledger::handler::TxHandler;
use utxo_ledger::transaction::{Output, TransactionBuilder};
use utxo_ledger::utxo::{Utxo, UtxoPool};
use utxo_ledger::wallet::Wallet;

// 主流程测试：同一笔转账提交两次，只接受第一次
#[test]
fn test_duplicate_submission_in_one_epoch() {
    let _ = env_logger::builder().is_test(true).try_init();
    let provider = Secp256k1Provider::new();

    println!("=== 单周期交易处理流程 ===");

    // 第1步：池中只有 (h1, 0)，金额100，属于K1
    let k1 = Wallet::new();
    let k2 = Wallet::new();
    let k3 = Wallet::new();
    let h1 = [0x5a; 32];
    let mut pool = UtxoPool::new();
    pool.add_utxo(Utxo::new(&h1, 0), Output::new(100.0, k1.owner_key()));
    let mut handler = TxHandler::new(&pool);

    // 第2步：K1 签名，转给 K2 80，转给 K3 20
    let mut builder = TransactionBuilder::new();
    builder
        .add_input(&h1, 0)
        .add_output(80.0, k2.owner_key())
        .add_output(20.0, k3.owner_key());
    k1.sign_all_inputs(&provider, &mut builder).unwrap();
    let t1 = builder.finalize(&provider);
    println!("T1: {}", t1);

    assert!(handler.is_valid_tx(&t1).unwrap());

    // 第3步：把 T1 提交两次
    let batch = vec![t1.clone(), t1.clone()];
    let accepted = handler.handle_txs(&batch).unwrap();
    println!("accepted {} of {}", accepted.len(), batch.len());

    assert_eq!(accepted.len(), 1);
    assert_eq!(accepted[0], &t1);

    // 第4步：池里正好是 T1 的两个输出
    let pool = handler.pool();
    assert_eq!(pool.len(), 2);
    assert!(!pool.contains(&Utxo::new(&h1, 0)));

    let first = pool.get_tx_output(&Utxo::new(t1.hash(), 0)).unwrap();
    assert_eq!(first.value(), 80.0);
    assert_eq!(first.owner(), &k2.owner_key());

    let second = pool.get_tx_output(&Utxo::new(t1.hash(), 1)).unwrap();
    assert_eq!(second.value(), 20.0);
    assert_eq!(second.owner(), &k3.owner_key());

    // 已经生效的交易不能再次通过验证
    assert!(!handler.is_valid_tx(&t1).unwrap());
}

// 模拟多个周期：每个周期的输出在下一个周期可以继续花费
#[test]
fn test_multiple_epochs() {
    let provider = Secp256k1Provider::new();
    let alice = Wallet::new();
    let bob = Wallet::new();
    let carol = Wallet::new();

    let genesis = alice
        .build_transaction(&provider, None, &[(alice.owner_key(), 50.0)])
        .unwrap();
    let mut pool = UtxoPool::new();
    pool.add_utxo(Utxo::new(genesis.hash(), 0), genesis.output(0).unwrap().clone());

    // 第一个周期：alice 转给 bob 30，找零 20
    let mut handler = TxHandler::new(&pool);
    let pay_bob = alice
        .build_transaction(
            &provider,
            Some(&genesis),
            &[(bob.owner_key(), 30.0), (alice.owner_key(), 20.0)],
        )
        .unwrap();
    assert_eq!(handler.handle_txs(&[pay_bob.clone()]).unwrap().len(), 1);
    let pool = handler.into_pool();
    assert_eq!(pool.total_value(), 50.0);

    // 第二个周期：alice 花费找零，bob 试图花费不属于他的找零
    let mut handler = TxHandler::new(&pool);
    let pay_carol = alice
        .build_transaction(&provider, Some(&pay_bob), &[(carol.owner_key(), 20.0)])
        .unwrap();
    let bob_steals = bob
        .build_transaction(&provider, Some(&pay_bob), &[(bob.owner_key(), 20.0)])
        .unwrap();

    let batch = [bob_steals, pay_carol.clone()];
    let accepted = handler.handle_txs(&batch).unwrap();
    assert_eq!(accepted, vec![&pay_carol]);

    let pool = handler.pool();
    assert_eq!(
        pool.all_utxos().len(),
        2,
        "bob 的 30 和 carol 的 20 应该留在池中"
    );
    assert!(pool.contains(&Utxo::new(pay_bob.hash(), 0)));
    assert!(pool.contains(&Utxo::new(pay_carol.hash(), 0)));
    assert_eq!(pool.total_value(), 50.0);
}
