use anyhow::Result;
use rusqlite::Connection;

pub const USER_QUOTAS_TABLE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS user_quotas (
    user_id TEXT PRIMARY KEY,
    is_plus INTEGER NOT NULL DEFAULT 0,
    messages_used INTEGER NOT NULL DEFAULT 0,
    images_in_prompts_used INTEGER NOT NULL DEFAULT 0,
    images_generated_today INTEGER NOT NULL DEFAULT 0,
    usage_reset_at TEXT NOT NULL,
    image_gen_reset_at TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
"#;

pub const WALLETS_TABLE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS wallets (
    user_id TEXT PRIMARY KEY,
    balance INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
"#;

pub const PROMO_CODES_TABLE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS promo_codes (
    code TEXT PRIMARY KEY,
    discount_percent INTEGER NOT NULL,
    max_uses INTEGER NOT NULL,
    times_used INTEGER NOT NULL DEFAULT 0,
    expires_at TEXT,
    created_at TEXT NOT NULL
);
"#;

pub fn init_database(conn: &Connection) -> Result<()> {
    conn.execute_batch(USER_QUOTAS_TABLE_SCHEMA)?;
    conn.execute_batch(WALLETS_TABLE_SCHEMA)?;
    conn.execute_batch(PROMO_CODES_TABLE_SCHEMA)?;
    Ok(())
}
