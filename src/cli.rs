// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Command, arg, crate_version};

pub fn build_cli() -> Command {
    Command::new("fundsheet")
        .version(crate_version!())
        .about("Extract monthly fund metrics from balance-sheet workbooks and compute MOIC/ROI/IRR")
        .subcommand(Command::new("init").about("Initialize the local database"))
        .subcommand(
            Command::new("ingest")
                .about("Extract monthly totals from a worksheet and upsert them into the period store")
                .arg(arg!(--book <DIR> "Workbook directory of per-sheet CSV files"))
                .arg(arg!(--sheet <NAME> "Worksheet name (fuzzy-matched)"))
                .arg(arg!(--source <SOURCE> "Source tag stored with each record").required(false)),
        )
        .subcommand(
            Command::new("overview")
                .about("Compute MOIC/ROI/IRR for a worksheet over a basis window")
                .arg(arg!(--book <DIR> "Workbook directory of per-sheet CSV files").required(false))
                .arg(arg!(--sheet <NAME> "Worksheet name (fuzzy-matched)"))
                .arg(arg!(--basis <BASIS> "inception|ytd|quarter|month|day|latest").required(false))
                .arg(arg!(--"period-end" <PERIOD> "YYYY, YYYY-MM or YYYY-MM-DD").required(false))
                .arg(arg!(--year <YEAR> "Pick the latest period in this year").required(false))
                .arg(arg!(--store "Read from the period store instead of a workbook"))
                .arg(arg!(--json "Print as pretty JSON"))
                .arg(arg!(--jsonl "Print as JSON lines")),
        )
        .subcommand(
            Command::new("periods")
                .about("List stored monthly records for a worksheet")
                .arg(arg!(--sheet <NAME> "Worksheet name as stored"))
                .arg(arg!(--from <MONTH> "YYYY-MM lower bound").required(false))
                .arg(arg!(--to <MONTH> "YYYY-MM upper bound").required(false))
                .arg(arg!(--json "Print as pretty JSON"))
                .arg(arg!(--jsonl "Print as JSON lines")),
        )
        .subcommand(
            Command::new("sheets")
                .about("List worksheet names available in a workbook directory")
                .arg(arg!(--book <DIR> "Workbook directory of per-sheet CSV files")),
        )
}
