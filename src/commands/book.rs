// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::grid::{Cell, Grid};
use crate::sheets;
use anyhow::{Context, Result, anyhow};
use csv::ReaderBuilder;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

/// A "workbook" for the CLI: a directory of per-sheet CSV files, where each
/// file stem is the worksheet name. How a grid is obtained is outside the
/// engine; this is the local-file collaborator.
pub struct CsvBook {
    dir: PathBuf,
}

impl CsvBook {
    pub fn open(dir: &str) -> Result<Self> {
        let dir = PathBuf::from(dir);
        if !dir.is_dir() {
            return Err(anyhow!("Workbook directory '{}' not found", dir.display()));
        }
        Ok(Self { dir })
    }

    /// Identity used for caching; stable across modifications.
    pub fn identity(&self) -> String {
        self.dir.display().to_string()
    }

    pub fn sheet_names(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in std::fs::read_dir(&self.dir)
            .with_context(|| format!("Read workbook dir {}", self.dir.display()))?
        {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) == Some("csv") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    names.push(stem.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    fn sheet_path(&self, resolved: &str) -> PathBuf {
        self.dir.join(format!("{}.csv", resolved))
    }

    /// Resolve a requested sheet name (fuzzy) and load its grid.
    /// Returns the resolved name alongside the grid.
    pub fn grid(&self, requested: &str) -> Result<(String, Grid)> {
        let names = self.sheet_names()?;
        let resolved = sheets::resolve(requested, &names)?.to_string();
        let grid = load_grid(&self.sheet_path(&resolved))?;
        Ok((resolved, grid))
    }

    /// Modification token for cache invalidation: the sheet file's mtime.
    pub fn token(&self, resolved: &str) -> Result<String> {
        let meta = std::fs::metadata(self.sheet_path(resolved))?;
        let mtime = meta
            .modified()?
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        Ok(mtime.to_string())
    }
}

/// CSV cells arrive as text; empty fields read as empty cells. The engine's
/// own parsers decide what is a date or an amount.
fn load_grid(path: &Path) -> Result<Grid> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Open sheet CSV {}", path.display()))?;
    let mut rows = Vec::new();
    for result in rdr.records() {
        let rec = result?;
        rows.push(rec.iter().map(Cell::from).collect());
    }
    Ok(Grid::new(rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_sheet(dir: &Path, name: &str, content: &str) {
        let mut f = std::fs::File::create(dir.join(format!("{}.csv", name))).unwrap();
        f.write_all(content.as_bytes()).unwrap();
    }

    #[test]
    fn books_list_and_resolve_sheets() {
        let tmp = tempfile::tempdir().unwrap();
        write_sheet(tmp.path(), "bCAS (Q4 Adj)", "a,b\n1,2\n");
        write_sheet(tmp.path(), "Master", "x\n");
        let book = CsvBook::open(tmp.path().to_str().unwrap()).unwrap();
        assert_eq!(book.sheet_names().unwrap(), vec!["Master", "bCAS (Q4 Adj)"]);

        let (resolved, grid) = book.grid("bcas(q4adj)").unwrap();
        assert_eq!(resolved, "bCAS (Q4 Adj)");
        assert_eq!(grid.row_count(), 2);
        assert_eq!(grid.cell(2, 2), &Cell::Text("2".into()));
    }

    #[test]
    fn tokens_follow_the_sheet_file() {
        let tmp = tempfile::tempdir().unwrap();
        write_sheet(tmp.path(), "Master", "a\n");
        let book = CsvBook::open(tmp.path().to_str().unwrap()).unwrap();
        let t1 = book.token("Master").unwrap();
        assert!(!t1.is_empty());
        assert_eq!(book.token("Master").unwrap(), t1);
        assert!(book.token("Missing").is_err());
    }

    #[test]
    fn missing_sheets_surface_suggestions() {
        let tmp = tempfile::tempdir().unwrap();
        write_sheet(tmp.path(), "bCAS (Q4 Adj)", "a\n");
        let book = CsvBook::open(tmp.path().to_str().unwrap()).unwrap();
        let err = book.grid("bcas q4").unwrap_err();
        assert!(err.to_string().contains("bCAS (Q4 Adj)"));
    }
}
