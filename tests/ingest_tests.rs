// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use fundsheet::commands::book::CsvBook;
use fundsheet::db;
use fundsheet::engine;
use fundsheet::store;
use rusqlite::Connection;
use rust_decimal::Decimal;
use std::io::Write;

fn setup() -> Connection {
    let mut conn = Connection::open_in_memory().unwrap();
    db::init_schema(&mut conn).unwrap();
    conn
}

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

const SHEET_CSV: &str = "\
Ending Balance,,,
,,Jan-24,Feb-24
1,Fund A,600,660
2,Fund B,400,440
,Total,1000,1100
";

#[test]
fn csv_book_ingests_into_period_store() {
    let tmp = tempfile::tempdir().unwrap();
    let mut f = std::fs::File::create(tmp.path().join("bCAS (Q4 Adj).csv")).unwrap();
    f.write_all(SHEET_CSV.as_bytes()).unwrap();
    drop(f);

    let book = CsvBook::open(tmp.path().to_str().unwrap()).unwrap();
    let (resolved, grid) = book.grid("bcas(q4adj)").unwrap();
    assert_eq!(resolved, "bCAS (Q4 Adj)");

    let mut conn = setup();
    let summary = engine::ingest(&mut conn, &resolved, &grid, "csv-book").unwrap();
    assert_eq!(summary.date_columns, 2);
    assert_eq!(
        summary.upserted,
        vec![ymd(2024, 1, 31), ymd(2024, 2, 29)]
    );

    let rows = store::periods_for_sheet(&conn, &resolved, None, None).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].values.ending_balance, Some(Decimal::from(1000)));
    assert_eq!(rows[1].values.ending_balance, Some(Decimal::from(1100)));
    // Carry-forward: February opens with January's close.
    assert_eq!(rows[1].values.beginning_balance, Some(Decimal::from(1000)));

    // Re-running the same ingestion changes nothing but updated_at.
    engine::ingest(&mut conn, &resolved, &grid, "csv-book").unwrap();
    let again = store::periods_for_sheet(&conn, &resolved, None, None).unwrap();
    assert_eq!(again, rows);
}
