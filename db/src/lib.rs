use anyhow::Result;
use common::{GeneratedImage, Profile};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

pub async fn init_pool(database_url: &str) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;
    Ok(pool)
}

pub async fn create_ledger_tables(pool: &PgPool) -> Result<()> {
    sqlx::query(
        r#"CREATE TABLE IF NOT EXISTS user_profiles (
            user_id UUID PRIMARY KEY,
            email TEXT NOT NULL,
            credits BIGINT NOT NULL CHECK (credits >= 0),
            created_at TIMESTAMPTZ NOT NULL DEFAULT now()
        )"#,
    )
    .execute(pool)
    .await?;
    sqlx::query(
        r#"CREATE TABLE IF NOT EXISTS generated_images (
            image_id UUID PRIMARY KEY,
            user_id UUID NOT NULL REFERENCES user_profiles (user_id),
            prompt TEXT NOT NULL,
            image_url TEXT NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now()
        )"#,
    )
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn get_profile(pool: &PgPool, user_id: Uuid) -> Option<Profile> {
    let row = sqlx::query_as::<_, (Uuid, String, i64, String)>(
        r#"select
            user_id,
            email,
            credits,
            coalesce(to_char(created_at, 'YYYY-MM-DD'), '')
        from user_profiles
        where user_id = $1"#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await
    .ok()
    .flatten()?;
    let (user_id, email, credits, created_at) = row;
    Some(Profile {
        user_id,
        email,
        credits,
        created_at,
    })
}

/// Creates the profile row for a fresh identity. The primary key on
/// `user_id` makes a double-submitted signup a no-op rather than a
/// duplicate row. Returns whether a row was actually inserted.
pub async fn insert_profile(pool: &PgPool, user_id: Uuid, email: &str, credits: i64) -> Result<bool> {
    let result = sqlx::query(
        r#"INSERT INTO user_profiles (user_id, email, credits)
           VALUES ($1, $2, $3)
           ON CONFLICT (user_id) DO NOTHING"#,
    )
    .bind(user_id)
    .bind(email)
    .bind(credits)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() == 1)
}

pub enum SettleOutcome {
    Recorded {
        image: GeneratedImage,
        remaining_credits: i64,
    },
    InsufficientCredits,
}

/// Debits one credit and appends the generation record in a single
/// transaction. The conditional decrement is the serialization point: a
/// concurrent request that already spent the last credit matches no row,
/// the transaction is rolled back and nothing is written.
pub async fn settle_generation(
    pool: &PgPool,
    user_id: Uuid,
    prompt: &str,
    image_url: &str,
) -> Result<SettleOutcome> {
    let mut tx = pool.begin().await?;

    let remaining = sqlx::query_scalar::<_, i64>(
        r#"UPDATE user_profiles
           SET credits = credits - 1
           WHERE user_id = $1 AND credits >= 1
           RETURNING credits"#,
    )
    .bind(user_id)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(remaining_credits) = remaining else {
        tx.rollback().await?;
        return Ok(SettleOutcome::InsufficientCredits);
    };

    let image_id = Uuid::new_v4();
    let created_at = sqlx::query_scalar::<_, String>(
        r#"INSERT INTO generated_images (image_id, user_id, prompt, image_url)
           VALUES ($1, $2, $3, $4)
           RETURNING to_char(created_at, 'YYYY-MM-DD HH24:MI')"#,
    )
    .bind(image_id)
    .bind(user_id)
    .bind(prompt)
    .bind(image_url)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(SettleOutcome::Recorded {
        image: GeneratedImage {
            image_id,
            user_id,
            prompt: prompt.to_string(),
            image_url: image_url.to_string(),
            created_at,
        },
        remaining_credits,
    })
}

pub async fn list_images_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<GeneratedImage>> {
    let rows = sqlx::query_as::<_, (Uuid, Uuid, String, String, String)>(
        r#"select
            image_id,
            user_id,
            prompt,
            image_url,
            coalesce(to_char(created_at, 'YYYY-MM-DD HH24:MI'), '')
        from generated_images
        where user_id = $1
        order by created_at desc, image_id desc"#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(rows
        .into_iter()
        .map(
            |(image_id, user_id, prompt, image_url, created_at)| GeneratedImage {
                image_id,
                user_id,
                prompt,
                image_url,
                created_at,
            },
        )
        .collect())
}
