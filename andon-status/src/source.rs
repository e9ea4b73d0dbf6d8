//! Status and master table sources
//!
//! The aggregator and the master cache only see the two traits here; the SQL
//! implementation reads the `D_STATUS`, `M_ERR`, `M_WAIT` and `M_STOP` tables,
//! optionally through a `[server].[database].[schema]` qualifier.

use andon_common::db::SourceQualifier;
use andon_common::{Error, Result};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::SqlitePool;
use tracing::{debug, error, info};

use crate::models::{Code, MachineId, MachineStatusRow, MasterEntry, MasterNamespace};

/// Per-machine status rows
#[async_trait]
pub trait StatusSource: Send + Sync {
    /// Every machine's row, ordered by machine id
    async fn fetch_all(&self) -> Result<Vec<MachineStatusRow>>;

    /// One machine's row, `None` if the source has no such machine
    async fn fetch_one(&self, machine_id: MachineId) -> Result<Option<MachineStatusRow>>;
}

/// Code → name master tables
#[async_trait]
pub trait MasterSource: Send + Sync {
    /// Enabled entries of one master table
    async fn fetch_names(&self, namespace: MasterNamespace) -> Result<Vec<MasterEntry>>;
}

const STATUS_COLUMNS: &str = "[MACHINE_NO], [MODEL_NO], [READY_STATUS], [RUN_STATUS], \
     [WAIT_STATUS], [WAIT_NO], [ARRANGE_STATUS], [STOP_STATUS], \
     [ERR_STATUS], [ERR_NO], [INTO_SUM], [PRODUCT_SUM], [TARGET_NUM], \
     [INTO_NUM], [PRODUCT_NUM], [OUT_NUM], [UPDATE_TIME], [NOTE], \
     [LOT_NO], [KISHU_NAME], [PRODUCT_KBN], [COIL_NUM]";

/// `D_STATUS` row as stored; widths are checked when converting
#[derive(Debug, sqlx::FromRow)]
struct StatusRecord {
    #[sqlx(rename = "MACHINE_NO")]
    machine_no: i64,
    #[sqlx(rename = "MODEL_NO")]
    model_no: Option<i64>,
    #[sqlx(rename = "READY_STATUS")]
    ready_status: Option<bool>,
    #[sqlx(rename = "RUN_STATUS")]
    run_status: Option<bool>,
    #[sqlx(rename = "WAIT_STATUS")]
    wait_status: Option<bool>,
    #[sqlx(rename = "WAIT_NO")]
    wait_no: Option<i64>,
    #[sqlx(rename = "ARRANGE_STATUS")]
    arrange_status: Option<bool>,
    #[sqlx(rename = "STOP_STATUS")]
    stop_status: Option<bool>,
    #[sqlx(rename = "ERR_STATUS")]
    err_status: Option<bool>,
    #[sqlx(rename = "ERR_NO")]
    err_no: Option<i64>,
    #[sqlx(rename = "INTO_SUM")]
    into_sum: Option<i64>,
    #[sqlx(rename = "PRODUCT_SUM")]
    product_sum: Option<i64>,
    #[sqlx(rename = "TARGET_NUM")]
    target_num: Option<i64>,
    #[sqlx(rename = "INTO_NUM")]
    into_num: Option<i64>,
    #[sqlx(rename = "PRODUCT_NUM")]
    product_num: Option<i64>,
    #[sqlx(rename = "OUT_NUM")]
    out_num: Option<i64>,
    #[sqlx(rename = "UPDATE_TIME")]
    update_time: Option<NaiveDateTime>,
    #[sqlx(rename = "NOTE")]
    note: Option<String>,
    #[sqlx(rename = "LOT_NO")]
    lot_no: Option<String>,
    #[sqlx(rename = "KISHU_NAME")]
    kishu_name: Option<String>,
    #[sqlx(rename = "PRODUCT_KBN")]
    product_kbn: Option<String>,
    #[sqlx(rename = "COIL_NUM")]
    coil_num: Option<i64>,
}

/// Master table row narrowed to key and name
#[derive(Debug, sqlx::FromRow)]
struct MasterRecord {
    #[sqlx(rename = "MACHINE_NO")]
    machine_no: i64,
    #[sqlx(rename = "CODE")]
    code: i64,
    #[sqlx(rename = "NAME")]
    name: Option<String>,
}

fn narrow<T: TryFrom<i64>>(column: &str, value: i64) -> Result<T> {
    T::try_from(value).map_err(|_| Error::Parse(format!("{} out of range: {}", column, value)))
}

fn narrow_opt<T: TryFrom<i64>>(column: &str, value: Option<i64>) -> Result<Option<T>> {
    value.map(|v| narrow(column, v)).transpose()
}

impl TryFrom<StatusRecord> for MachineStatusRow {
    type Error = Error;

    fn try_from(r: StatusRecord) -> Result<Self> {
        Ok(MachineStatusRow {
            machine_id: narrow("MACHINE_NO", r.machine_no)?,
            model_no: narrow_opt("MODEL_NO", r.model_no)?,
            ready: r.ready_status,
            running: r.run_status,
            waiting: r.wait_status,
            wait_code: narrow_opt("WAIT_NO", r.wait_no)?,
            arranging: r.arrange_status,
            stopped: r.stop_status,
            errored: r.err_status,
            error_code: narrow_opt("ERR_NO", r.err_no)?,
            into_sum: narrow_opt("INTO_SUM", r.into_sum)?,
            produced_sum: narrow_opt("PRODUCT_SUM", r.product_sum)?,
            target_count: narrow_opt("TARGET_NUM", r.target_num)?,
            into_count: narrow_opt("INTO_NUM", r.into_num)?,
            produced_count: narrow_opt("PRODUCT_NUM", r.product_num)?,
            out_count: narrow_opt("OUT_NUM", r.out_num)?,
            updated_at: r.update_time,
            note: r.note,
            lot_number: r.lot_no,
            model_name: r.kishu_name,
            product_class: r.product_kbn,
            coil_number: r.coil_num,
        })
    }
}

impl TryFrom<MasterRecord> for MasterEntry {
    type Error = Error;

    fn try_from(r: MasterRecord) -> Result<Self> {
        Ok(MasterEntry {
            machine_id: narrow::<MachineId>("MACHINE_NO", r.machine_no)?,
            code: narrow::<Code>("CODE", r.code)?,
            name: r.name,
        })
    }
}

/// SQL-backed status and master source
#[derive(Debug, Clone)]
pub struct SqlAndonSource {
    pool: SqlitePool,
    qualifier: SourceQualifier,
}

impl SqlAndonSource {
    pub fn new(pool: SqlitePool, qualifier: SourceQualifier) -> Self {
        if qualifier.is_empty() {
            info!("Status source tables are unqualified");
        } else {
            info!("Status source qualifier: {}", qualifier);
        }
        Self { pool, qualifier }
    }

    fn status_sql(&self, single: bool) -> String {
        let filter = if single {
            "WHERE [MACHINE_NO] = ?"
        } else {
            "ORDER BY [MACHINE_NO]"
        };
        format!(
            "SELECT {} FROM {} {}",
            STATUS_COLUMNS,
            self.qualifier.table("D_STATUS"),
            filter
        )
    }

    fn master_sql(&self, namespace: MasterNamespace) -> String {
        match namespace {
            MasterNamespace::Error => format!(
                "SELECT [MACHINE_NO], [ERR_NO] AS CODE, [ERR_NAME] AS NAME FROM {} \
                 WHERE [ENABLE_FLG] = 1",
                self.qualifier.table("M_ERR")
            ),
            MasterNamespace::Wait => format!(
                "SELECT [MACHINE_NO], [WAIT_NO] AS CODE, [WAIT_NAME] AS NAME FROM {} \
                 WHERE [ENABLE_FLG] = 1 AND [WAIT_NAME] IS NOT NULL",
                self.qualifier.table("M_WAIT")
            ),
            MasterNamespace::Stop => format!(
                "SELECT [MACHINE_NO], [STOP_NO] AS CODE, [STOP_NAME] AS NAME FROM {} \
                 WHERE [ENABLE_FLG] = 1",
                self.qualifier.table("M_STOP")
            ),
        }
    }
}

#[async_trait]
impl StatusSource for SqlAndonSource {
    async fn fetch_all(&self) -> Result<Vec<MachineStatusRow>> {
        let sql = self.status_sql(false);
        let records = sqlx::query_as::<_, StatusRecord>(&sql)
            .fetch_all(&self.pool)
            .await?;

        debug!("D_STATUS rows read: {}", records.len());
        records.into_iter().map(MachineStatusRow::try_from).collect()
    }

    async fn fetch_one(&self, machine_id: MachineId) -> Result<Option<MachineStatusRow>> {
        let sql = self.status_sql(true);
        let record = sqlx::query_as::<_, StatusRecord>(&sql)
            .bind(i64::from(machine_id))
            .fetch_optional(&self.pool)
            .await?;

        record.map(MachineStatusRow::try_from).transpose()
    }
}

#[async_trait]
impl MasterSource for SqlAndonSource {
    async fn fetch_names(&self, namespace: MasterNamespace) -> Result<Vec<MasterEntry>> {
        let sql = self.master_sql(namespace);
        debug!("{} master SQL: {}", namespace.as_str(), sql);

        let records = sqlx::query_as::<_, MasterRecord>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                error!("{} master query failed: {} (SQL: {})", namespace.as_str(), e, sql);
                e
            })?;

        records.into_iter().map(MasterEntry::try_from).collect()
    }
}
