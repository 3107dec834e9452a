mod types;

use std::str::FromStr;

use chrono::{DateTime, Utc};
pub use sqlx::Error;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Executor, Row, Sqlite,
};
use teloxide::types::UserId;

pub use types::MemberInfo;

type Pool = sqlx::Pool<Sqlite>;

pub struct Database {
    pool: Pool,
}

impl Database {
    /// Connect to the database at `url` and create the tables if needed.
    /// `sqlite::memory:` gives a private in-memory database.
    pub async fn new(url: &str) -> Result<Database, Error> {
        let in_memory = url.contains(":memory:");

        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .pragma("cache_size", "-32768")
            .busy_timeout(std::time::Duration::from_secs(600));

        // Every connection to an in-memory database is a database of its own,
        // so there must be exactly one and it must never be closed.
        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(8)
        };

        let pool = pool_options.connect_with(options).await?;

        // MEMBERS:
        // user_id (key, i64 because sqlite doesn't support u64)
        // username (string without the @, may be NULL)
        // display_name (first name, possibly empty)
        // joined_date (date+time in UTC of first sighting)
        // last_interacted_date (date+time in UTC, may be NULL)
        // last_thanked_month (membership month count of the last anniversary thanks)
        pool.execute(sqlx::query(
            "CREATE TABLE IF NOT EXISTS members (
                user_id INTEGER PRIMARY KEY NOT NULL,
                username TEXT NULL,
                display_name TEXT NOT NULL DEFAULT '',
                joined_date TEXT NOT NULL,
                last_interacted_date TEXT NULL,
                last_thanked_month INTEGER NOT NULL DEFAULT 0
            ) STRICT;",
        ))
        .await?;

        // SCHEDULE_LOG:
        // task_name (key, string)
        // last_run (period marker of the last run, like "2024-05-01" or "2024-W18")
        pool.execute(sqlx::query(
            "CREATE TABLE IF NOT EXISTS schedule_log (
                task_name TEXT PRIMARY KEY NOT NULL,
                last_run TEXT NOT NULL
            ) STRICT;",
        ))
        .await?;

        Ok(Database { pool })
    }

    /// Note that a member exists. Inserts them with `now` as their join date
    /// if they are new, otherwise only refreshes their names.
    #[allow(clippy::cast_possible_wrap)]
    pub async fn record_member(
        &self,
        user_id: UserId,
        username: Option<&str>,
        display_name: &str,
        now: DateTime<Utc>,
    ) -> Result<(), Error> {
        sqlx::query(
            "INSERT INTO members(user_id, username, display_name, joined_date)
            VALUES (?, ?, ?, ?)
        ON CONFLICT(user_id) DO
            UPDATE SET username=excluded.username, display_name=excluded.display_name;",
        )
        .bind(user_id.0 as i64)
        .bind(username)
        .bind(display_name)
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Like [`Self::record_member`], but also marks the member as contacted
    /// at `now`. Used when greeting a new arrival.
    #[allow(clippy::cast_possible_wrap)]
    pub async fn register_arrival(
        &self,
        user_id: UserId,
        username: Option<&str>,
        display_name: &str,
        now: DateTime<Utc>,
    ) -> Result<(), Error> {
        sqlx::query(
            "INSERT INTO members(user_id, username, display_name, joined_date, last_interacted_date)
            VALUES (?, ?, ?, ?, ?)
        ON CONFLICT(user_id) DO
            UPDATE SET username=excluded.username, display_name=excluded.display_name,
                last_interacted_date=excluded.last_interacted_date;",
        )
        .bind(user_id.0 as i64)
        .bind(username)
        .bind(display_name)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Get a single member, if known.
    #[allow(clippy::cast_possible_wrap)]
    pub async fn get_member(&self, user_id: UserId) -> Result<Option<MemberInfo>, Error> {
        sqlx::query(
            "SELECT user_id, username, display_name, joined_date,
                last_interacted_date, last_thanked_month
            FROM members WHERE user_id=?;",
        )
        .bind(user_id.0 as i64)
        .map(member_from_row)
        .fetch_optional(&self.pool)
        .await
    }

    /// Every member the bot has ever seen.
    pub async fn all_members(&self) -> Result<Vec<MemberInfo>, Error> {
        sqlx::query(
            "SELECT user_id, username, display_name, joined_date,
                last_interacted_date, last_thanked_month
            FROM members ORDER BY joined_date;",
        )
        .map(member_from_row)
        .fetch_all(&self.pool)
        .await
    }

    /// Every member, the ones never contacted first, then the ones contacted
    /// the longest time ago.
    pub async fn members_by_least_recent_contact(&self) -> Result<Vec<MemberInfo>, Error> {
        let mut members = self.all_members().await?;
        // `None` sorts before `Some`, and the sort is stable, so ties keep
        // their join order.
        members.sort_by_key(MemberInfo::last_interacted_date);
        Ok(members)
    }

    /// Mark the member as contacted at `now`.
    #[allow(clippy::cast_possible_wrap)]
    pub async fn touch_member(&self, user_id: UserId, now: DateTime<Utc>) -> Result<(), Error> {
        sqlx::query("UPDATE members SET last_interacted_date=? WHERE user_id=?;")
            .bind(now)
            .bind(user_id.0 as i64)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Record that the member was thanked for `months` months of membership.
    #[allow(clippy::cast_possible_wrap)]
    pub async fn set_last_thanked_month(&self, user_id: UserId, months: u32) -> Result<(), Error> {
        sqlx::query("UPDATE members SET last_thanked_month=? WHERE user_id=?;")
            .bind(i64::from(months))
            .bind(user_id.0 as i64)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Atomically record that `task_name` runs for the period `marker`.
    ///
    /// Returns `true` if this call recorded it, or `false` if the task has
    /// already been recorded for this very period, in which case it should
    /// not run again.
    pub async fn claim_schedule_period(&self, task_name: &str, marker: &str) -> Result<bool, Error> {
        let result = sqlx::query(
            "INSERT INTO schedule_log(task_name, last_run)
            VALUES (?, ?)
        ON CONFLICT(task_name) DO
            UPDATE SET last_run=excluded.last_run
        WHERE last_run != excluded.last_run;",
        )
        .bind(task_name)
        .bind(marker)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// The period marker `task_name` last ran for, if it ever ran.
    pub async fn last_schedule_marker(&self, task_name: &str) -> Result<Option<String>, Error> {
        sqlx::query("SELECT last_run FROM schedule_log WHERE task_name=?;")
            .bind(task_name)
            .map(|row: SqliteRow| row.get::<String, _>("last_run"))
            .fetch_optional(&self.pool)
            .await
    }
}

#[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
fn member_from_row(row: SqliteRow) -> MemberInfo {
    MemberInfo {
        user_id: UserId(row.get::<i64, _>("user_id") as u64),
        username: row.get("username"),
        display_name: row.get("display_name"),
        joined_date: row.get("joined_date"),
        last_interacted_date: row.get("last_interacted_date"),
        last_thanked_month: row.get::<i64, _>("last_thanked_month").max(0) as u32,
    }
}
