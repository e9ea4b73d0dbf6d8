//! In-memory SQLite seeded with the status and master tables

use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

const SCHEMA: &str = r#"
CREATE TABLE D_STATUS (
    MACHINE_NO INTEGER PRIMARY KEY,
    MODEL_NO INTEGER,
    READY_STATUS BOOLEAN,
    RUN_STATUS BOOLEAN,
    WAIT_STATUS BOOLEAN,
    WAIT_NO INTEGER,
    ARRANGE_STATUS BOOLEAN,
    STOP_STATUS BOOLEAN,
    ERR_STATUS BOOLEAN,
    ERR_NO INTEGER,
    INTO_SUM INTEGER,
    PRODUCT_SUM INTEGER,
    TARGET_NUM INTEGER,
    INTO_NUM INTEGER,
    PRODUCT_NUM INTEGER,
    OUT_NUM INTEGER,
    UPDATE_TIME DATETIME,
    NOTE TEXT,
    LOT_NO TEXT,
    KISHU_NAME TEXT,
    PRODUCT_KBN TEXT,
    COIL_NUM INTEGER
);

CREATE TABLE M_ERR (
    MACHINE_NO INTEGER NOT NULL,
    ERR_NO INTEGER NOT NULL,
    ERR_NAME TEXT,
    ENABLE_FLG INTEGER NOT NULL DEFAULT 1
);

CREATE TABLE M_WAIT (
    MACHINE_NO INTEGER NOT NULL,
    WAIT_NO INTEGER NOT NULL,
    WAIT_NAME TEXT,
    ENABLE_FLG INTEGER NOT NULL DEFAULT 1
);

CREATE TABLE M_STOP (
    MACHINE_NO INTEGER NOT NULL,
    STOP_NO INTEGER NOT NULL,
    STOP_NAME TEXT,
    ENABLE_FLG INTEGER NOT NULL DEFAULT 1
);
"#;

/// Single-connection pool so every query sees the same in-memory database
pub async fn seeded_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory database");

    sqlx::raw_sql(SCHEMA)
        .execute(&pool)
        .await
        .expect("Failed to create schema");

    pool
}

/// Insert a status row with the given flags; codes and counts stay NULL unless set later
pub async fn insert_status(
    pool: &SqlitePool,
    machine_no: i64,
    flags: [Option<bool>; 6],
    wait_no: Option<i64>,
    err_no: Option<i64>,
) {
    let [ready, run, wait, arrange, stop, err] = flags;
    sqlx::query(
        "INSERT INTO D_STATUS (MACHINE_NO, READY_STATUS, RUN_STATUS, WAIT_STATUS, ARRANGE_STATUS, \
         STOP_STATUS, ERR_STATUS, WAIT_NO, ERR_NO, PRODUCT_NUM, UPDATE_TIME, LOT_NO) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, '2025-10-18 08:30:00', 'L-0001')",
    )
    .bind(machine_no)
    .bind(ready)
    .bind(run)
    .bind(wait)
    .bind(arrange)
    .bind(stop)
    .bind(err)
    .bind(wait_no)
    .bind(err_no)
    .bind(machine_no * 100)
    .execute(pool)
    .await
    .expect("Failed to insert status row");
}

pub async fn insert_master(
    pool: &SqlitePool,
    table: &str,
    machine_no: i64,
    code: i64,
    name: Option<&str>,
    enabled: bool,
) {
    let (code_column, name_column) = match table {
        "M_ERR" => ("ERR_NO", "ERR_NAME"),
        "M_WAIT" => ("WAIT_NO", "WAIT_NAME"),
        "M_STOP" => ("STOP_NO", "STOP_NAME"),
        other => panic!("Unknown master table {}", other),
    };
    let sql = format!(
        "INSERT INTO {} (MACHINE_NO, {}, {}, ENABLE_FLG) VALUES (?, ?, ?, ?)",
        table, code_column, name_column
    );
    sqlx::query(&sql)
        .bind(machine_no)
        .bind(code)
        .bind(name)
        .bind(i64::from(enabled))
        .execute(pool)
        .await
        .expect("Failed to insert master row");
}
