use std::collections::HashMap;

use moksha_core::blind::BlindedSignature;
use moksha_core::dhke::Dhke;
use moksha_core::primitives::{CheckResponse, PostMeltResponse, PostMintResponse, PostSplitResponse};
use moksha_wallet::client::MockCashuClient;
use moksha_wallet::error::MokshaWalletError;
use moksha_wallet::localstore::memory::MemoryLocalStore;
use moksha_wallet::wallet::Wallet;
use secp256k1::{PublicKey, Secp256k1, SecretKey};
use url::Url;

/// A tiny in-test stand-in for a mint's signing keys, covering every power-of-two denomination
/// a 64-sat split can produce.
struct TestMint {
    secp: Secp256k1<secp256k1::All>,
    keys: HashMap<u64, SecretKey>,
}

impl TestMint {
    fn new() -> Self {
        let secp = Secp256k1::new();
        let keys = (0..7)
            .map(|i| (1u64 << i, SecretKey::new(&mut rand::thread_rng())))
            .collect();
        Self { secp, keys }
    }

    fn public_keys(&self) -> HashMap<u64, PublicKey> {
        self.keys
            .iter()
            .map(|(amt, sk)| (*amt, sk.public_key(&self.secp)))
            .collect()
    }

    fn sign(&self, dhke: &Dhke, amount: u64, b_: PublicKey) -> BlindedSignature {
        let key = self.keys.get(&amount).expect("unsupported denomination");
        let c_ = dhke.step2_bob(b_, key).unwrap();
        BlindedSignature {
            amount,
            c_,
            id: Some("test-keyset".to_owned()),
        }
    }
}

fn mock_client(mint: std::sync::Arc<TestMint>) -> MockCashuClient {
    let dhke = Dhke::new();
    let mut mock = MockCashuClient::new();

    let m = mint.clone();
    mock.expect_get_keys()
        .returning(move |_| Ok(m.public_keys()));

    let m = mint.clone();
    let d = dhke.clone();
    mock.expect_post_mint().returning(move |_, _, outputs| {
        let promises = outputs
            .iter()
            .map(|o| m.sign(&d, o.amount, o.b_))
            .collect();
        Ok(PostMintResponse { promises })
    });

    // Mirrors `moksha-mint`'s `/split` route exactly: `fst_count` is derived from the
    // *remainder* decomposition, and the resulting partitions must sum to the remainder and the
    // requested amount respectively, or the swap is rejected.
    let m = mint.clone();
    let d = dhke.clone();
    mock.expect_post_split()
        .returning(move |_, proofs, amount, outputs| {
            let total = proofs.total_amount();
            let remainder = total.saturating_sub(amount);
            let fst_count = moksha_core::amount::split_amount(remainder).len();
            let (fst_outputs, snd_outputs) = outputs.split_at(fst_count.min(outputs.len()));

            let fst: Vec<BlindedSignature> =
                fst_outputs.iter().map(|o| m.sign(&d, o.amount, o.b_)).collect();
            let snd: Vec<BlindedSignature> =
                snd_outputs.iter().map(|o| m.sign(&d, o.amount, o.b_)).collect();

            let fst_total: u64 = fst.iter().map(|s| s.amount).sum();
            let snd_total: u64 = snd.iter().map(|s| s.amount).sum();
            if fst_total != remainder || snd_total != amount {
                return Err(MokshaWalletError::MintError(format!(
                    "split mismatch: fst={fst_total} snd={snd_total} total={total} requested={amount}"
                )));
            }

            Ok(PostSplitResponse { fst, snd })
        });

    mock.expect_post_melt()
        .returning(|_, _, _, _| Ok(PostMeltResponse { paid: true, preimage: Some("preimage".to_owned()) }));

    mock.expect_post_check().returning(|_, proofs| {
        let spendable = (0..proofs.len())
            .map(|i| (i.to_string(), true))
            .collect();
        Ok(CheckResponse(spendable))
    });

    mock
}

#[tokio::test]
async fn test_mint_then_spend_to_invoice() -> anyhow::Result<()> {
    let mint = std::sync::Arc::new(TestMint::new());
    let mut wallet = Wallet::new(
        mock_client(mint),
        MemoryLocalStore::default(),
        Url::parse("https://mint.example.com")?,
    );
    wallet.load_mint().await?;

    let proofs = wallet.mint(16, "paid-hash").await?;
    assert_eq!(wallet.balance().await?, 16);

    let paid = wallet.melt(&proofs, 16, "lnbc1...").await?;
    assert!(paid);
    assert_eq!(wallet.balance().await?, 0);
    Ok(())
}

#[tokio::test]
async fn test_send_and_receive_with_deterministic_secret() -> anyhow::Result<()> {
    let mint = std::sync::Arc::new(TestMint::new());

    let mut sender = Wallet::new(
        mock_client(mint.clone()),
        MemoryLocalStore::default(),
        Url::parse("https://mint.example.com")?,
    );
    sender.load_mint().await?;
    sender.mint(32, "paid-hash").await?;

    let send_secret = "a-shared-secret-base";
    let (to_send, kept) = sender.split_to_send(12, Some(send_secret)).await?;
    assert_eq!(to_send.iter().map(|p| p.amount).sum::<u64>(), 12);
    assert_eq!(sender.balance().await?, 32);
    assert_eq!(kept.iter().map(|p| p.amount).sum::<u64>() + 12, 32);

    let mut receiver = Wallet::new(
        mock_client(mint),
        MemoryLocalStore::default(),
        Url::parse("https://mint.example.com")?,
    );
    receiver.load_mint().await?;

    let redeemed = receiver.redeem(to_send, Some(send_secret)).await?;
    assert_eq!(redeemed.iter().map(|p| p.amount).sum::<u64>(), 12);
    assert_eq!(receiver.balance().await?, 12);
    Ok(())
}

#[tokio::test]
async fn test_set_reserved_excludes_from_available_balance() -> anyhow::Result<()> {
    let mint = std::sync::Arc::new(TestMint::new());
    let mut wallet = Wallet::new(
        mock_client(mint),
        MemoryLocalStore::default(),
        Url::parse("https://mint.example.com")?,
    );
    wallet.load_mint().await?;
    let proofs = wallet.mint(8, "paid-hash").await?;

    wallet.set_reserved(&proofs, true).await?;
    assert_eq!(wallet.balance().await?, 8);
    assert_eq!(wallet.available_balance().await?, 0);
    Ok(())
}

#[tokio::test]
async fn test_serialize_and_deserialize_token_roundtrip() -> anyhow::Result<()> {
    let mint = std::sync::Arc::new(TestMint::new());
    let mut wallet = Wallet::new(
        mock_client(mint),
        MemoryLocalStore::default(),
        Url::parse("https://mint.example.com")?,
    );
    wallet.load_mint().await?;
    let proofs = wallet.mint(4, "paid-hash").await?;

    let token = wallet.serialize_token(&proofs, false)?;
    assert!(token.starts_with("cashuA"));

    let decoded = Wallet::<MemoryLocalStore, MockCashuClient>::deserialize_token(&token)?;
    assert_eq!(decoded.iter().map(|p| p.amount).sum::<u64>(), 4);
    Ok(())
}

#[tokio::test]
async fn test_serialize_with_hide_secret_omits_secret_from_wire() -> anyhow::Result<()> {
    let mint = std::sync::Arc::new(TestMint::new());
    let mut wallet = Wallet::new(
        mock_client(mint),
        MemoryLocalStore::default(),
        Url::parse("https://mint.example.com")?,
    );
    wallet.load_mint().await?;
    let proofs = wallet.mint(4, "paid-hash").await?;

    let hidden = wallet.serialize_token(&proofs, true)?;
    let visible = wallet.serialize_token(&proofs, false)?;
    assert_ne!(hidden, visible);

    let decoded = Wallet::<MemoryLocalStore, MockCashuClient>::deserialize_token(&hidden)?;
    assert_eq!(decoded.iter().map(|p| p.amount).sum::<u64>(), 4);
    assert!(decoded.iter().all(|p| p.secret.is_empty()));
    Ok(())
}
