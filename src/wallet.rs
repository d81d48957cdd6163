use secp256k1::{PublicKey, Secp256k1, SecretKey};

use crate::crypto::{CryptoProvider, OwnerKey};
use crate::error::{LedgerError, LedgerResult};
use crate::transaction::{Transaction, TransactionBuilder};

pub struct Wallet {
    pub private_key: SecretKey,
    pub public_key: PublicKey,
    pub address: String,
}

impl Wallet {
    pub fn new() -> Self {
        let secp = Secp256k1::new();
        let mut rng = rand::thread_rng();
        let (secret_key, public_key) = secp.generate_keypair(&mut rng);
        Self::from_keys(secret_key, public_key)
    }

    pub fn from_secret_key(secret_key: SecretKey) -> Self {
        let secp = Secp256k1::new();
        let public_key = PublicKey::from_secret_key(&secp, &secret_key);
        Self::from_keys(secret_key, public_key)
    }

    fn from_keys(private_key: SecretKey, public_key: PublicKey) -> Self {
        let address = OwnerKey::from(public_key).address();
        Wallet {
            private_key,
            public_key,
            address,
        }
    }

    pub fn owner_key(&self) -> OwnerKey {
        OwnerKey::from(self.public_key)
    }

    /// 对第 `index` 个输入签名并附加到交易上
    pub fn sign_input<P>(
        &self,
        provider: &P,
        builder: &mut TransactionBuilder,
        index: usize,
    ) -> LedgerResult<()>
    where
        P: CryptoProvider<SecretKey = SecretKey>,
    {
        let message = builder.raw_data_to_sign(index)?;
        let signature = provider.sign(&self.private_key, &message)?;
        builder.add_signature(&signature, index)
    }

    pub fn sign_all_inputs<P>(
        &self,
        provider: &P,
        builder: &mut TransactionBuilder,
    ) -> LedgerResult<()>
    where
        P: CryptoProvider<SecretKey = SecretKey>,
    {
        for index in 0..builder.num_inputs() {
            self.sign_input(provider, builder, index)?;
        }
        Ok(())
    }

    /// 创建、签名并固定一笔交易
    ///
    /// 有 `prev` 时花费其最后一个输出，否则作为创世交易声明 `([0x00], 0)`。
    /// 按 `payees` 的顺序添加输出。
    pub fn build_transaction<P>(
        &self,
        provider: &P,
        prev: Option<&Transaction>,
        payees: &[(OwnerKey, f64)],
    ) -> LedgerResult<Transaction>
    where
        P: CryptoProvider<SecretKey = SecretKey>,
    {
        let mut builder = TransactionBuilder::new();

        match prev {
            Some(prev) => {
                let last = u32::try_from(prev.num_outputs().saturating_sub(1)).map_err(|_| {
                    LedgerError::TooManyOutputs {
                        count: prev.num_outputs(),
                    }
                })?;
                builder.add_input(prev.hash(), last);
            }
            None => {
                builder.add_input(&[0x00], 0);
            }
        }

        for (owner, value) in payees {
            builder.add_output(*value, owner.clone());
        }

        self.sign_all_inputs(provider, &mut builder)?;
        Ok(builder.finalize(provider))
    }
}

impl Default for Wallet {
    fn default() -> Self {
        Self::new()
    }
}
