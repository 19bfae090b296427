mod common;

use anyhow::Result;
use common::*;
use finance_ledger::error::AppError;
use finance_ledger::models::account::DEFAULT_ACCOUNT_NAME;
use finance_ledger::services::ledger_service;

#[tokio::test]
async fn test_first_account_becomes_default() -> Result<()> {
    let Some(pool) = test_pool().await? else {
        return Ok(());
    };
    let owner = fresh_owner();

    let first = open_account(&pool, owner, "Cash", "0").await?;
    let second = open_account(&pool, owner, "Card", "0").await?;
    assert!(first.is_default);
    assert!(!second.is_default);

    let listed = ledger_service::list_accounts(&pool, owner).await?;
    let ids: Vec<_> = listed.iter().map(|a| a.id).collect();
    assert_eq!(ids, vec![first.id, second.id]);

    Ok(())
}

#[tokio::test]
async fn test_concurrent_first_accounts_share_one_default() -> Result<()> {
    let Some(pool) = test_pool().await? else {
        return Ok(());
    };
    let owner = fresh_owner();

    let mut handles = Vec::new();
    for i in 0..5 {
        let pool = pool.clone();
        handles.push(tokio::spawn(async move {
            ledger_service::create_account(&pool, owner, &format!("Wallet {i}"), "RUB", dec("0"))
                .await
        }));
    }
    let mut opened = Vec::new();
    for handle in handles {
        opened.push(handle.await??);
    }

    assert_eq!(opened.iter().filter(|a| a.is_default).count(), 1);
    assert_eq!(ledger_service::list_accounts(&pool, owner).await?.len(), 5);

    Ok(())
}

#[tokio::test]
async fn test_guarded_account_deletes() -> Result<()> {
    let Some(pool) = test_pool().await? else {
        return Ok(());
    };
    let owner = fresh_owner();
    let main = open_account(&pool, owner, "Main", "0").await?;
    let savings = open_account(&pool, owner, "Savings", "12.00").await?;

    assert!(matches!(
        ledger_service::delete_account(&pool, owner, main.id).await,
        Err(AppError::DefaultAccount)
    ));
    assert!(matches!(
        ledger_service::delete_account(&pool, owner, savings.id).await,
        Err(AppError::NonZeroBalance)
    ));
    assert_eq!(ledger_service::list_accounts(&pool, owner).await?.len(), 2);

    ledger_service::create_expense(&pool, owner, entry(savings.id, "12.00", None)).await?;
    ledger_service::delete_account(&pool, owner, savings.id).await?;

    let listed = ledger_service::list_accounts(&pool, owner).await?;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, main.id);

    assert!(matches!(
        ledger_service::delete_account(&pool, owner, savings.id).await,
        Err(AppError::AccountNotFound)
    ));

    Ok(())
}

#[tokio::test]
async fn test_history_of_archived_account_can_be_rolled_back() -> Result<()> {
    let Some(pool) = test_pool().await? else {
        return Ok(());
    };
    let owner = fresh_owner();
    let _main = open_account(&pool, owner, "Main", "0").await?;
    let wallet = open_account(&pool, owner, "Wallet", "10.00").await?;

    let (tx, _) = ledger_service::create_expense(&pool, owner, entry(wallet.id, "10.00", None)).await?;
    ledger_service::delete_account(&pool, owner, wallet.id).await?;

    assert!(matches!(
        ledger_service::create_expense(&pool, owner, entry(wallet.id, "1", None)).await,
        Err(AppError::AccountNotFound)
    ));

    ledger_service::delete_transaction(&pool, owner, tx.id).await?;
    assert_eq!(balance_of(&pool, owner, wallet.id).await?, dec("10.00"));

    Ok(())
}

#[tokio::test]
async fn test_account_names_are_unique_among_active_accounts() -> Result<()> {
    let Some(pool) = test_pool().await? else {
        return Ok(());
    };
    let owner = fresh_owner();
    let _main = open_account(&pool, owner, "Main", "0").await?;
    let cash = open_account(&pool, owner, "Cash", "0").await?;

    assert!(matches!(
        ledger_service::create_account(&pool, owner, "Cash", "RUB", dec("0")).await,
        Err(AppError::InvalidRequest(_))
    ));
    assert!(matches!(
        ledger_service::create_account(&pool, owner, "   ", "RUB", dec("0")).await,
        Err(AppError::InvalidRequest(_))
    ));

    ledger_service::delete_account(&pool, owner, cash.id).await?;
    let reopened = open_account(&pool, owner, "Cash", "0").await?;
    assert_ne!(reopened.id, cash.id);

    // Another owner may use the same name
    open_account(&pool, fresh_owner(), "Cash", "0").await?;

    Ok(())
}

#[tokio::test]
async fn test_update_account_keeps_balance_unless_given() -> Result<()> {
    let Some(pool) = test_pool().await? else {
        return Ok(());
    };
    let owner = fresh_owner();
    let cash = open_account(&pool, owner, "Cash", "42.00").await?;
    let card = open_account(&pool, owner, "Card", "0").await?;

    let renamed = ledger_service::update_account(&pool, owner, cash.id, "Pocket", None).await?;
    assert_eq!(renamed.name, "Pocket");
    assert_eq!(renamed.balance, dec("42.00"));

    let corrected =
        ledger_service::update_account(&pool, owner, cash.id, "Pocket", Some(dec("-5.00"))).await?;
    assert_eq!(corrected.balance, dec("-5.00"));

    assert!(matches!(
        ledger_service::update_account(&pool, owner, card.id, "Pocket", None).await,
        Err(AppError::InvalidRequest(_))
    ));

    Ok(())
}

#[tokio::test]
async fn test_ensure_default_account_is_idempotent() -> Result<()> {
    let Some(pool) = test_pool().await? else {
        return Ok(());
    };
    let owner = fresh_owner();

    let created = ledger_service::ensure_default_account(&pool, owner, "rub").await?;
    assert_eq!(created.name, DEFAULT_ACCOUNT_NAME);
    assert_eq!(created.currency, "RUB");
    assert!(created.is_default);
    assert_eq!(created.balance, dec("0"));

    let again = ledger_service::ensure_default_account(&pool, owner, "USD").await?;
    assert_eq!(again.id, created.id);

    let balance = ledger_service::get_balance(&pool, owner).await?;
    assert_eq!(balance.len(), 1);

    Ok(())
}
