//! Property-based tests for the wallet service.
//!
//! - Balance never goes negative, whatever sequence of requests arrives
//! - The balance always equals the opening balance plus the applied ledger
//! - A reference is applied at most once per direction

use std::collections::HashSet;
use std::sync::Arc;

use proptest::prelude::*;
use wallet_shared::types::{PageRequest, UserId};

use super::*;

#[derive(Debug, Clone)]
enum Request {
    Deposit(u8, i64),
    Withdraw(u8, i64),
    Disable,
    Enable,
}

/// Strategy for a single request; references come from a small pool so duplicates are common.
fn request() -> impl Strategy<Value = Request> {
    prop_oneof![
        4 => (0u8..12, -5i64..500).prop_map(|(r, a)| Request::Deposit(r, a)),
        4 => (0u8..12, -5i64..500).prop_map(|(r, a)| Request::Withdraw(r, a)),
        1 => Just(Request::Disable),
        1 => Just(Request::Enable),
    ]
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("runtime")
}

proptest! {
    #[test]
    fn prop_balance_matches_ledger(
        opening in 0i64..1_000,
        requests in prop::collection::vec(request(), 1..60),
    ) {
        let (balance, ledger, seen) = runtime().block_on(async {
            let service = WalletService::new(Arc::new(MemoryLedgerStore::new()), opening);
            let owner = UserId::new();
            service.enable_wallet(owner).await.unwrap();

            for request in requests {
                let result = match request {
                    Request::Deposit(r, amount) => {
                        service.deposit(owner, &format!("ref-{r}"), amount).await.map(|_| ())
                    }
                    Request::Withdraw(r, amount) => {
                        service.withdraw(owner, &format!("ref-{r}"), amount).await.map(|_| ())
                    }
                    Request::Disable => service.disable_wallet(owner).await.map(|_| ()),
                    Request::Enable => service.enable_wallet(owner).await.map(|_| ()),
                };
                // Only validation and business-rule errors are expected here.
                if let Err(err) = result {
                    assert!(err.http_status_code() < 500, "unexpected error {err}");
                }

                let wallet = service.store().get_wallet(owner).await.unwrap().unwrap();
                assert!(wallet.balance >= 0);
            }

            let wallet = service.store().get_wallet(owner).await.unwrap().unwrap();
            let (ledger, _) = service
                .store()
                .list_transactions(wallet.id, PageRequest::new(1, 100))
                .await
                .unwrap();
            let seen: HashSet<_> = ledger
                .iter()
                .map(|tx| (tx.reference_id.clone(), tx.direction))
                .collect();
            (wallet.balance, ledger, seen)
        });

        let net: i64 = ledger
            .iter()
            .map(|tx| match tx.direction {
                TransactionDirection::Deposit => tx.amount,
                TransactionDirection::Withdrawal => -tx.amount,
            })
            .sum();
        prop_assert_eq!(balance, opening + net);
        prop_assert_eq!(seen.len(), ledger.len());
        prop_assert!(ledger.iter().all(|tx| tx.amount > 0));
    }

    #[test]
    fn prop_overdraft_never_applied(balance in 0i64..10_000, amount in 1i64..20_000) {
        let wallet = Wallet {
            id: wallet_shared::types::WalletId::new(),
            owner_id: UserId::new(),
            balance,
            status: WalletStatus::Active,
            status_changed_at: chrono::Utc::now(),
        };

        match plan_balance_change(&wallet, "r", TransactionDirection::Withdrawal, amount) {
            Ok(change) => {
                prop_assert!(amount <= balance);
                prop_assert_eq!(change.new_balance, balance - amount);
            }
            Err(err) => {
                prop_assert!(amount > balance);
                let is_insufficient = matches!(err, WalletError::InsufficientBalance { .. });
                prop_assert!(is_insufficient);
            }
        }
    }
}
