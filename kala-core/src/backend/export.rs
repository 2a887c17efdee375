use std::collections::HashMap;

use serde::Deserialize;

use super::client::{BackendClient, BackendError};
use super::query::eq;
use crate::models::{ExportCheck, ExportStandard, ExportStatus};

#[derive(Deserialize)]
struct StatusRow {
    #[serde(deserialize_with = "crate::models::deserialize_id")]
    standard_id: String,
    status: Option<ExportStatus>,
}

impl BackendClient {
    /// Every export standard paired with this artwork's review status.
    pub async fn export_readiness(
        &self,
        artwork_id: &str,
    ) -> Result<Vec<ExportCheck>, BackendError> {
        let standards_query = [("select", "*".to_string())];
        let status_query = [
            ("select", "*".to_string()),
            ("artwork_id", eq(artwork_id)),
        ];
        let (standards, statuses) = tokio::try_join!(
            self.select::<ExportStandard>("export_standards", &standards_query),
            self.select::<StatusRow>("artwork_export_status", &status_query),
        )?;

        Ok(merge_checks(standards, statuses))
    }
}

/// Later status rows for the same standard win.
fn merge_checks(standards: Vec<ExportStandard>, statuses: Vec<StatusRow>) -> Vec<ExportCheck> {
    let by_standard: HashMap<String, Option<ExportStatus>> = statuses
        .into_iter()
        .map(|row| (row.standard_id, row.status))
        .collect();

    standards
        .into_iter()
        .map(|standard| {
            let status = by_standard.get(&standard.id).copied().flatten();
            ExportCheck { standard, status }
        })
        .collect()
}
