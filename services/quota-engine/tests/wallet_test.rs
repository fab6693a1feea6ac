use std::sync::Arc;

use chrono::{Duration, Utc};
use tempfile::{tempdir, TempDir};
use thetai_quota_engine::config::QuotaEngineConfig;
use thetai_quota_engine::quota::QuotaManager;
use thetai_quota_engine::storage::QuotaDatabase;
use thetai_quota_engine::wallet::{WalletError, WalletManager};

fn setup() -> (TempDir, Arc<QuotaDatabase>, QuotaManager, WalletManager) {
    let temp = tempdir().expect("failed to create temp dir");
    let database =
        Arc::new(QuotaDatabase::new(temp.path().to_path_buf()).expect("failed to open database"));
    let config = QuotaEngineConfig {
        data_dir: temp.path().to_path_buf(),
        ..QuotaEngineConfig::default()
    };
    let quota = QuotaManager::new(Arc::clone(&database));
    let wallet = WalletManager::new(Arc::clone(&database), &config);
    (temp, database, quota, wallet)
}

fn user_id() -> String {
    format!("user-{}", uuid::Uuid::new_v4())
}

#[test]
fn award_then_spend_round_trips_the_balance() {
    let (_temp, _database, _quota, wallet) = setup();
    let user = user_id();

    let after_award = wallet.award(&user, 120, "trivia-game").expect("award");
    assert_eq!(after_award.balance, 120);

    let after_spend = wallet.spend(&user, 120).expect("spend full balance");
    assert_eq!(after_spend.balance, 0);
}

#[test]
fn spend_beyond_balance_refuses_without_debit() {
    let (_temp, _database, _quota, wallet) = setup();
    let user = user_id();

    wallet.award(&user, 50, "daily-login").expect("award");

    let refused = wallet.spend(&user, 51);
    assert!(matches!(
        refused,
        Err(WalletError::InsufficientBalance {
            balance: 50,
            required: 51
        })
    ));

    assert_eq!(wallet.balance(&user).expect("balance").balance, 50);
}

#[test]
fn zero_amounts_are_rejected() {
    let (_temp, _database, _quota, wallet) = setup();
    let user = user_id();

    assert!(matches!(
        wallet.award(&user, 0, "test"),
        Err(WalletError::InvalidAmount(_))
    ));
    assert!(matches!(
        wallet.spend(&user, 0),
        Err(WalletError::InvalidAmount(_))
    ));
}

#[test]
fn upgrade_at_full_price() {
    let (_temp, _database, quota, wallet) = setup();
    let user = user_id();

    wallet.award(&user, 500, "minigames").expect("award");
    let outcome = wallet.upgrade_to_plus(&user, None).expect("upgrade");
    assert_eq!(outcome.price_paid, 500);
    assert_eq!(outcome.balance, 0);

    let snapshot = quota.get_user_limits(&user).expect("snapshot");
    assert_eq!(snapshot.messages_limit, 1000);
    assert_eq!(snapshot.images_gen_limit, 15);
}

#[test]
fn promo_discount_is_applied() {
    let (_temp, _database, _quota, wallet) = setup();
    let user = user_id();

    wallet
        .create_promo("LAUNCH20", 20, 100, None)
        .expect("create promo");
    wallet.award(&user, 400, "minigames").expect("award");

    let outcome = wallet
        .upgrade_to_plus(&user, Some("LAUNCH20"))
        .expect("discounted upgrade");
    assert_eq!(outcome.price_paid, 400);
    assert_eq!(outcome.balance, 0);
    assert_eq!(outcome.promo_code.as_deref(), Some("LAUNCH20"));
}

#[test]
fn refused_upgrade_does_not_consume_the_promo() {
    let (_temp, _database, _quota, wallet) = setup();
    let user = user_id();

    // Single-use code: if the failed attempt consumed a use, the retry
    // below would report the code as exhausted.
    wallet
        .create_promo("ONESHOT", 10, 1, None)
        .expect("create promo");
    wallet.award(&user, 10, "minigames").expect("award");

    let refused = wallet.upgrade_to_plus(&user, Some("ONESHOT"));
    assert!(matches!(
        refused,
        Err(WalletError::InsufficientBalance { .. })
    ));
    assert_eq!(wallet.balance(&user).expect("balance").balance, 10);

    wallet.award(&user, 440, "minigames").expect("award");
    let outcome = wallet
        .upgrade_to_plus(&user, Some("ONESHOT"))
        .expect("retry with enough balance");
    assert_eq!(outcome.price_paid, 450);
}

#[test]
fn exhausted_promo_refuses_before_any_debit() {
    let (_temp, _database, _quota, wallet) = setup();
    let first = user_id();
    let second = user_id();

    wallet
        .create_promo("SINGLE", 50, 1, None)
        .expect("create promo");
    wallet.award(&first, 250, "minigames").expect("award");
    wallet.award(&second, 250, "minigames").expect("award");

    wallet
        .upgrade_to_plus(&first, Some("SINGLE"))
        .expect("first use");

    let refused = wallet.upgrade_to_plus(&second, Some("SINGLE"));
    assert!(matches!(refused, Err(WalletError::PromoExhausted(_))));
    assert_eq!(wallet.balance(&second).expect("balance").balance, 250);
}

#[test]
fn expired_promo_refuses() {
    let (_temp, _database, _quota, wallet) = setup();
    let user = user_id();

    wallet
        .create_promo("OLD", 20, 10, Some(Utc::now() - Duration::days(1)))
        .expect("create promo");
    wallet.award(&user, 500, "minigames").expect("award");

    let refused = wallet.upgrade_to_plus(&user, Some("OLD"));
    assert!(matches!(refused, Err(WalletError::PromoExpired(_))));
}

#[test]
fn unknown_promo_refuses() {
    let (_temp, _database, _quota, wallet) = setup();
    let user = user_id();

    wallet.award(&user, 500, "minigames").expect("award");
    let refused = wallet.upgrade_to_plus(&user, Some("NOPE"));
    assert!(matches!(refused, Err(WalletError::UnknownPromo(_))));
}

#[test]
fn double_upgrade_refuses() {
    let (_temp, _database, _quota, wallet) = setup();
    let user = user_id();

    wallet.award(&user, 1000, "minigames").expect("award");
    wallet.upgrade_to_plus(&user, None).expect("first upgrade");

    let refused = wallet.upgrade_to_plus(&user, None);
    assert!(matches!(refused, Err(WalletError::AlreadyPlus(_))));
    assert_eq!(wallet.balance(&user).expect("balance").balance, 500);
}

#[test]
fn duplicate_promo_code_refuses() {
    let (_temp, _database, _quota, wallet) = setup();

    wallet.create_promo("DUP", 10, 5, None).expect("create");
    let refused = wallet.create_promo("DUP", 30, 2, None);
    assert!(matches!(refused, Err(WalletError::PromoExists(_))));
}

#[test]
fn invalid_promo_parameters_refuse() {
    let (_temp, _database, _quota, wallet) = setup();

    assert!(matches!(
        wallet.create_promo("", 10, 5, None),
        Err(WalletError::InvalidPromo(_))
    ));
    assert!(matches!(
        wallet.create_promo("BAD", 0, 5, None),
        Err(WalletError::InvalidPromo(_))
    ));
    assert!(matches!(
        wallet.create_promo("BAD", 101, 5, None),
        Err(WalletError::InvalidPromo(_))
    ));
    assert!(matches!(
        wallet.create_promo("BAD", 10, 0, None),
        Err(WalletError::InvalidPromo(_))
    ));
}

#[test]
fn upgrade_mid_window_keeps_counters_and_anchors() {
    let (_temp, _database, quota, wallet) = setup();
    let user = user_id();

    for _ in 0..30 {
        quota
            .increment_message_usage(&user, false)
            .expect("increment");
    }
    quota.increment_image_gen_usage(&user).expect("generation");

    let before = quota.get_user_limits(&user).expect("snapshot");
    assert_eq!(before.messages_used, 30);
    assert_eq!(before.messages_limit, 50);

    wallet.award(&user, 500, "minigames").expect("award");
    wallet.upgrade_to_plus(&user, None).expect("upgrade");

    // Only the ceilings change; usage and both window anchors survive.
    let after = quota.get_user_limits(&user).expect("snapshot");
    assert_eq!(after.messages_used, 30);
    assert_eq!(after.images_generated_today, 1);
    assert_eq!(after.messages_limit, 1000);
    assert_eq!(after.messages_remaining, 970);
    assert_eq!(after.usage_resets_at, before.usage_resets_at);
    assert_eq!(after.image_gen_resets_at, before.image_gen_resets_at);
}
