use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Transaction};

use crate::quota::state::{ImageGenWindow, MessageWindow, UserQuotaState};
use crate::wallet::types::{PromoCode, Wallet};

use super::error::StorageError;
use super::schema::init_database;
use super::QUOTA_DB_FILENAME;

/// SQLite-backed store for quota rows, wallets, and promo codes.
///
/// A single connection guarded by a mutex serializes writers; every
/// business operation runs inside one [`transaction`](Self::transaction)
/// so a check against a row and the mutation that follows it cannot
/// interleave with another request for the same user.
pub struct QuotaDatabase {
    conn: Mutex<Connection>,
}

impl QuotaDatabase {
    pub fn new(data_dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&data_dir)?;
        let db_path = data_dir.join(QUOTA_DB_FILENAME);
        let is_new = !db_path.exists();
        let conn = Connection::open(&db_path)?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.pragma_update(None, "journal_mode", "WAL")?;

        if is_new {
            init_database(&conn)?;
        }

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Runs `f` inside a single SQLite transaction. Committed on `Ok`,
    /// rolled back on `Err`.
    pub fn transaction<T, E>(
        &self,
        f: impl FnOnce(&Transaction<'_>) -> Result<T, E>,
    ) -> Result<T, E>
    where
        E: From<StorageError>,
    {
        let mut conn = self
            .conn
            .lock()
            .map_err(|_| E::from(StorageError::ConnectionPoisoned))?;
        let tx = conn
            .transaction()
            .map_err(|err| E::from(StorageError::from(err)))?;
        let value = f(&tx)?;
        tx.commit()
            .map_err(|err| E::from(StorageError::from(err)))?;
        Ok(value)
    }
}

pub fn load_user_state(
    tx: &Transaction<'_>,
    user_id: &str,
) -> Result<Option<UserQuotaState>, StorageError> {
    let mut stmt = tx.prepare(
        r#"
        SELECT user_id, is_plus, messages_used, images_in_prompts_used,
               images_generated_today, usage_reset_at, image_gen_reset_at, created_at
        FROM user_quotas
        WHERE user_id = ?1
        "#,
    )?;

    let state = stmt
        .query_row(params![user_id], |row| {
            Ok(UserQuotaState {
                user_id: row.get(0)?,
                is_plus: row.get(1)?,
                messages: MessageWindow {
                    messages_used: row.get::<_, i64>(2)? as u32,
                    images_in_prompts_used: row.get::<_, i64>(3)? as u32,
                    reset_at: row.get(5)?,
                },
                image_gen: ImageGenWindow {
                    images_generated: row.get::<_, i64>(4)? as u32,
                    reset_at: row.get(6)?,
                },
                created_at: row.get(7)?,
            })
        })
        .optional()?;

    Ok(state)
}

/// Loads the user's quota row, inserting a fresh free-tier row when the
/// user has never been seen (account-creation semantics).
pub fn load_or_create_user_state(
    tx: &Transaction<'_>,
    user_id: &str,
    now: DateTime<Utc>,
) -> Result<UserQuotaState, StorageError> {
    if let Some(state) = load_user_state(tx, user_id)? {
        return Ok(state);
    }

    let state = UserQuotaState::new(user_id, now);
    tx.execute(
        r#"
        INSERT INTO user_quotas (
            user_id, is_plus, messages_used, images_in_prompts_used,
            images_generated_today, usage_reset_at, image_gen_reset_at,
            created_at, updated_at
        )
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        "#,
        params![
            state.user_id,
            state.is_plus,
            state.messages.messages_used as i64,
            state.messages.images_in_prompts_used as i64,
            state.image_gen.images_generated as i64,
            state.messages.reset_at,
            state.image_gen.reset_at,
            state.created_at,
            now,
        ],
    )?;

    Ok(state)
}

pub fn save_user_state(
    tx: &Transaction<'_>,
    state: &UserQuotaState,
    now: DateTime<Utc>,
) -> Result<(), StorageError> {
    tx.execute(
        r#"
        UPDATE user_quotas
        SET is_plus = ?2,
            messages_used = ?3,
            images_in_prompts_used = ?4,
            images_generated_today = ?5,
            usage_reset_at = ?6,
            image_gen_reset_at = ?7,
            updated_at = ?8
        WHERE user_id = ?1
        "#,
        params![
            state.user_id,
            state.is_plus,
            state.messages.messages_used as i64,
            state.messages.images_in_prompts_used as i64,
            state.image_gen.images_generated as i64,
            state.messages.reset_at,
            state.image_gen.reset_at,
            now,
        ],
    )?;

    Ok(())
}

pub fn load_wallet(tx: &Transaction<'_>, user_id: &str) -> Result<Option<Wallet>, StorageError> {
    let mut stmt = tx.prepare(
        r#"
        SELECT user_id, balance, created_at
        FROM wallets
        WHERE user_id = ?1
        "#,
    )?;

    let wallet = stmt
        .query_row(params![user_id], |row| {
            Ok(Wallet {
                user_id: row.get(0)?,
                balance: row.get::<_, i64>(1)? as u64,
                created_at: row.get(2)?,
            })
        })
        .optional()?;

    Ok(wallet)
}

pub fn load_or_create_wallet(
    tx: &Transaction<'_>,
    user_id: &str,
    now: DateTime<Utc>,
) -> Result<Wallet, StorageError> {
    if let Some(wallet) = load_wallet(tx, user_id)? {
        return Ok(wallet);
    }

    let wallet = Wallet::new(user_id, now);
    tx.execute(
        r#"
        INSERT INTO wallets (user_id, balance, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4)
        "#,
        params![wallet.user_id, wallet.balance as i64, wallet.created_at, now],
    )?;

    Ok(wallet)
}

pub fn save_wallet(
    tx: &Transaction<'_>,
    wallet: &Wallet,
    now: DateTime<Utc>,
) -> Result<(), StorageError> {
    tx.execute(
        r#"
        UPDATE wallets
        SET balance = ?2, updated_at = ?3
        WHERE user_id = ?1
        "#,
        params![wallet.user_id, wallet.balance as i64, now],
    )?;

    Ok(())
}

pub fn load_promo(tx: &Transaction<'_>, code: &str) -> Result<Option<PromoCode>, StorageError> {
    let mut stmt = tx.prepare(
        r#"
        SELECT code, discount_percent, max_uses, times_used, expires_at, created_at
        FROM promo_codes
        WHERE code = ?1
        "#,
    )?;

    let promo = stmt
        .query_row(params![code], |row| {
            Ok(PromoCode {
                code: row.get(0)?,
                discount_percent: row.get::<_, i64>(1)? as u32,
                max_uses: row.get::<_, i64>(2)? as u32,
                times_used: row.get::<_, i64>(3)? as u32,
                expires_at: row.get(4)?,
                created_at: row.get(5)?,
            })
        })
        .optional()?;

    Ok(promo)
}

pub fn insert_promo(tx: &Transaction<'_>, promo: &PromoCode) -> Result<(), StorageError> {
    tx.execute(
        r#"
        INSERT INTO promo_codes (code, discount_percent, max_uses, times_used, expires_at, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
        params![
            promo.code,
            promo.discount_percent as i64,
            promo.max_uses as i64,
            promo.times_used as i64,
            promo.expires_at,
            promo.created_at,
        ],
    )?;

    Ok(())
}

pub fn save_promo(tx: &Transaction<'_>, promo: &PromoCode) -> Result<(), StorageError> {
    tx.execute(
        r#"
        UPDATE promo_codes
        SET times_used = ?2
        WHERE code = ?1
        "#,
        params![promo.code, promo.times_used as i64],
    )?;

    Ok(())
}
