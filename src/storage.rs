use anyhow::{Context, Result};
use sqlx::{Row, Sqlite, SqlitePool, Transaction};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, warn};

use crate::models::{AreaKind, AreaRule, CatalogStats, Cca, CcaCoverage};

/// SQLite-backed catalog of CCA programs and the areas they cover
#[derive(Clone)]
pub struct Storage {
    pool: SqlitePool,
}

impl Storage {
    pub async fn new(database_path: &str) -> Result<Self> {
        // Create database if it doesn't exist
        if !Path::new(database_path).exists() {
            std::fs::File::create(database_path)
                .with_context(|| format!("Cannot create database file: {}", database_path))?;
        }

        let database_url = format!("sqlite://{}", database_path);
        let pool = SqlitePool::connect(&database_url)
            .await
            .with_context(|| format!("Cannot open database: {}", database_path))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS ccas (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                cca_name TEXT NOT NULL,
                is_cca INTEGER NOT NULL,
                is_incumbent_utility INTEGER NOT NULL,
                state TEXT NOT NULL,
                signup_link TEXT,
                ingested_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS cca_areas (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                cca_id INTEGER NOT NULL REFERENCES ccas(id) ON DELETE CASCADE,
                kind TEXT NOT NULL,
                rule TEXT NOT NULL,
                value TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_areas_cca ON cca_areas(cca_id);
            CREATE INDEX IF NOT EXISTS idx_areas_kind_value ON cca_areas(kind, value);
            "#,
        )
        .execute(&pool)
        .await?;

        Ok(Storage { pool })
    }

    /// Insert a program and all of its area rules in one transaction.
    /// The id on `coverage.cca` is ignored; the new row id is returned.
    pub async fn insert_coverage(&self, coverage: &CcaCoverage) -> Result<i64> {
        let mut tx = self.pool.begin().await?;
        let cca_id = insert_coverage_in(&mut tx, coverage).await?;
        tx.commit().await?;
        Ok(cca_id)
    }

    /// Store a whole batch in one transaction, optionally replacing the
    /// existing catalog. Nothing is written unless every entry is.
    pub async fn store_catalog(&self, coverages: &[CcaCoverage], reset: bool) -> Result<Vec<i64>> {
        let mut tx = self.pool.begin().await?;

        if reset {
            sqlx::query("DELETE FROM cca_areas").execute(&mut *tx).await?;
            sqlx::query("DELETE FROM ccas").execute(&mut *tx).await?;
        }

        let mut ids = Vec::with_capacity(coverages.len());
        for coverage in coverages {
            let cca_id = insert_coverage_in(&mut tx, coverage)
                .await
                .with_context(|| format!("Cannot store {}", coverage.cca.cca_name))?;
            ids.push(cca_id);
        }

        tx.commit().await?;
        Ok(ids)
    }

    /// Load every program with its area rules, in insertion order
    pub async fn load_catalog(&self) -> Result<Vec<CcaCoverage>> {
        let cca_rows = sqlx::query(
            "SELECT id, cca_name, is_cca, is_incumbent_utility, state, signup_link FROM ccas ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut catalog = Vec::with_capacity(cca_rows.len());
        let mut positions = HashMap::new();
        for row in cca_rows {
            let cca = Cca {
                id: row.get("id"),
                cca_name: row.get("cca_name"),
                is_cca: row.get("is_cca"),
                is_incumbent_utility: row.get("is_incumbent_utility"),
                state: row.get("state"),
                signup_link: row.get("signup_link"),
            };
            positions.insert(cca.id, catalog.len());
            catalog.push(CcaCoverage::new(cca));
        }

        let area_rows = sqlx::query("SELECT cca_id, kind, rule, value FROM cca_areas ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        for row in area_rows {
            let cca_id: i64 = row.get("cca_id");
            let kind_str: String = row.get("kind");
            let rule_str: String = row.get("rule");

            let (Some(kind), Some(rule)) = (AreaKind::parse(&kind_str), AreaRule::parse(&rule_str)) else {
                warn!("Skipping area rule with unknown kind/rule: {}/{}", kind_str, rule_str);
                continue;
            };

            if let Some(&position) = positions.get(&cca_id) {
                catalog[position].areas_mut(kind).push(rule, row.get("value"));
            }
        }

        Ok(catalog)
    }

    pub async fn stats(&self) -> Result<CatalogStats> {
        let row = sqlx::query(
            r#"
            SELECT
                COUNT(*) AS programs,
                COUNT(NULLIF(TRIM(COALESCE(signup_link, '')), '')) AS with_signup_link,
                MAX(ingested_at) AS last_ingested_at
            FROM ccas
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        let last_ingested_at = row
            .get::<Option<String>, _>("last_ingested_at")
            .map(|ts| chrono::NaiveDateTime::parse_from_str(&ts, "%Y-%m-%d %H:%M:%S"))
            .transpose()?;

        let mut stats = CatalogStats {
            programs: row.get::<i64, _>("programs") as usize,
            with_signup_link: row.get::<i64, _>("with_signup_link") as usize,
            last_ingested_at,
            ..CatalogStats::default()
        };

        let kind_rows = sqlx::query("SELECT kind, COUNT(*) AS rules FROM cca_areas GROUP BY kind")
            .fetch_all(&self.pool)
            .await?;
        for row in kind_rows {
            let kind: String = row.get("kind");
            let rules = row.get::<i64, _>("rules") as usize;
            match AreaKind::parse(&kind) {
                Some(AreaKind::County) => stats.county_rules = rules,
                Some(AreaKind::City) => stats.city_rules = rules,
                Some(AreaKind::Zip) => stats.zip_rules = rules,
                None => warn!("Unknown area kind in catalog: {}", kind),
            }
        }

        Ok(stats)
    }

    /// Remove every program and area rule
    pub async fn clear(&self) -> Result<()> {
        self.store_catalog(&[], true).await?;
        Ok(())
    }
}

async fn insert_coverage_in(
    tx: &mut Transaction<'_, Sqlite>,
    coverage: &CcaCoverage,
) -> Result<i64> {
    let cca = &coverage.cca;

    let result = sqlx::query(
        r#"
        INSERT INTO ccas
        (cca_name, is_cca, is_incumbent_utility, state, signup_link, ingested_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&cca.cca_name)
    .bind(cca.is_cca)
    .bind(cca.is_incumbent_utility)
    .bind(&cca.state)
    .bind(&cca.signup_link)
    .bind(chrono::Local::now().naive_local().format("%Y-%m-%d %H:%M:%S").to_string())
    .execute(&mut **tx)
    .await?;
    let cca_id = result.last_insert_rowid();

    for kind in [AreaKind::County, AreaKind::City, AreaKind::Zip] {
        for rule in [AreaRule::Included, AreaRule::Excluded] {
            for value in coverage.areas(kind).get(rule) {
                sqlx::query("INSERT INTO cca_areas (cca_id, kind, rule, value) VALUES (?, ?, ?, ?)")
                    .bind(cca_id)
                    .bind(kind.as_str())
                    .bind(rule.as_str())
                    .bind(value)
                    .execute(&mut **tx)
                    .await?;
            }
        }
    }

    debug!("Stored {} with {} area rules", cca.cca_name, coverage.rule_count());
    Ok(cca_id)
}
