// ==========================================
// 门店日结系统 - 主表快照采集
// ==========================================
// 职责: 把主表（A to Z Format.xlsx）全量读成 JSON,
//       追加到快照时间线
// 说明: 快照读计算值（审计关心的是数,不是公式）
// ==========================================

use crate::config::MASTER_FILENAME;
use crate::domain::MasterSnapshot;
use crate::importer::error::ImportResult;
use crate::importer::workbook_parser::read_workbook;
use crate::repository::MasterSnapshotRepository;
use std::path::Path;
use tracing::info;

/// 采集一次主表快照
///
/// 目录下找不到主表按普通文件错误上抛; 空表照常入快照
/// （快照的意义是“此刻长这样”,包括空着）。
pub fn capture_master_snapshot(
    repo: &MasterSnapshotRepository,
    directory: &Path,
    note: Option<&str>,
) -> ImportResult<MasterSnapshot> {
    let master_path = directory.join(MASTER_FILENAME);
    let parsed = read_workbook(&master_path)?;

    let mut sheets = serde_json::Map::new();
    for (sheet_name, grid) in &parsed.sheets {
        let mut cells: Vec<(u32, u32, serde_json::Value)> = grid
            .iter_cells()
            .map(|(row, col, value)| (row, col, value.to_json()))
            .collect();
        // 固定 (行, 列) 顺序,快照内容可逐字节比对
        cells.sort_by_key(|(row, col, _)| (*row, *col));

        let cell_objects: Vec<serde_json::Value> = cells
            .into_iter()
            .map(|(row, col, value)| {
                serde_json::json!({ "row": row, "col": col, "value": value })
            })
            .collect();

        sheets.insert(
            sheet_name.clone(),
            serde_json::json!({
                "max_row": grid.max_row(),
                "max_col": grid.max_col(),
                "cells": cell_objects,
            }),
        );
    }

    let data = serde_json::json!({
        "workbook": parsed.filename,
        "sheets": sheets,
    });

    let snapshot = repo.append(&data, note)?;
    info!(
        uid = %snapshot.uid,
        sheets = parsed.sheets.len(),
        "主表快照已入库"
    );
    Ok(snapshot)
}
