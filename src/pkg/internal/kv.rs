use sqlx::PgConnection;

use crate::prelude::Result;

/// One row of the `kv` table. Records are stored as JSON strings under
/// namespaced keys such as `resume:<uuid>` and `class:<uuid>`.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct KvItem {
    pub key: String,
    pub value: String,
}

pub struct KvStore<'a> {
    conn: &'a mut PgConnection,
}

impl<'a> KvStore<'a> {
    pub fn new(conn: &'a mut PgConnection) -> Self {
        KvStore { conn }
    }

    pub async fn set(&mut self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO kv (key, value)
            VALUES ($1, $2)
            ON CONFLICT (key) DO UPDATE SET value = $2, updated_at = NOW()
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(&mut *self.conn)
        .await?;
        Ok(())
    }

    pub async fn get(&mut self, key: &str) -> Result<Option<String>> {
        let value = sqlx::query_scalar::<_, String>("SELECT value FROM kv WHERE key = $1")
            .bind(key)
            .fetch_optional(&mut *self.conn)
            .await?;
        Ok(value)
    }

    pub async fn delete(&mut self, key: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM kv WHERE key = $1")
            .bind(key)
            .execute(&mut *self.conn)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Returns every entry whose key matches the glob `pattern`, where `*`
    /// matches any run of characters. Results come back ordered by key so
    /// listings are stable across calls.
    pub async fn list_entries(&mut self, pattern: &str) -> Result<Vec<KvItem>> {
        let items = sqlx::query_as::<_, KvItem>(
            "SELECT key, value FROM kv WHERE key LIKE $1 ORDER BY key",
        )
        .bind(glob_to_like(pattern))
        .fetch_all(&mut *self.conn)
        .await?;
        Ok(items)
    }
}

/// Translates a `*` glob into a SQL LIKE pattern. LIKE metacharacters in
/// the glob itself are escaped so a literal `%` or `_` in a key cannot
/// widen the match.
fn glob_to_like(pattern: &str) -> String {
    let mut like = String::with_capacity(pattern.len());
    for c in pattern.chars() {
        match c {
            '*' => like.push('%'),
            '%' | '_' | '\\' => {
                like.push('\\');
                like.push(c);
            }
            _ => like.push(c),
        }
    }
    like
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_glob_star_becomes_percent() {
        assert_eq!(glob_to_like("resume:*"), "resume:%");
        assert_eq!(glob_to_like("class:*"), "class:%");
        assert_eq!(glob_to_like("*"), "%");
    }

    #[test]
    fn test_exact_key_passes_through() {
        assert_eq!(
            glob_to_like("resume:4b8f8f13-3d60-4323-9cbc-9f0a7e0d3a55"),
            "resume:4b8f8f13-3d60-4323-9cbc-9f0a7e0d3a55"
        );
    }

    #[test]
    fn test_like_metacharacters_are_escaped() {
        assert_eq!(glob_to_like("resume:100%_done"), r"resume:100\%\_done");
        assert_eq!(glob_to_like(r"a\b*"), r"a\\b%");
    }
}
