//! CSV snapshots of predictoor summaries and rewards.
//!
//! Two files per run directory:
//! - `predictoor_data.csv`: `predictoor_addr,accuracy,n_preds,n_correct_preds`
//! - `predictoor_rewards.csv`: `predictoor_addr,OCEAN_amt`
//!
//! Saving never overwrites and requires the directory to exist.

use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::info;

use df_core::error::PersistenceError;
use df_core::types::Address;

use crate::aggregate::AggregateRewardMap;
use crate::ledger::PredictoorSummary;

const DATA_FILE: &str = "predictoor_data.csv";
const DATA_HEADER: &str = "predictoor_addr,accuracy,n_preds,n_correct_preds";
const REWARDS_FILE: &str = "predictoor_rewards.csv";
const REWARDS_HEADER: &str = "predictoor_addr,OCEAN_amt";

pub fn predictoor_data_csv_path(dir: &Path) -> PathBuf {
    dir.join(DATA_FILE)
}

pub fn predictoor_rewards_csv_path(dir: &Path) -> PathBuf {
    dir.join(REWARDS_FILE)
}

pub fn save_predictoor_data_csv(
    data: &BTreeMap<Address, PredictoorSummary>,
    dir: &Path,
) -> Result<PathBuf, PersistenceError> {
    let path = predictoor_data_csv_path(dir);
    let mut w = create_new(dir, &path)?;
    writeln!(w, "{DATA_HEADER}")?;
    for s in data.values() {
        writeln!(
            w,
            "{},{},{},{}",
            s.address, s.accuracy, s.prediction_count, s.correct_prediction_count
        )?;
    }
    w.flush()?;
    info!(path = %path.display(), rows = data.len(), "created predictoor data csv");
    Ok(path)
}

pub fn load_predictoor_data_csv(
    dir: &Path,
) -> Result<BTreeMap<Address, PredictoorSummary>, PersistenceError> {
    let path = predictoor_data_csv_path(dir);
    let mut data = BTreeMap::new();
    for (line, fields) in read_rows(&path, DATA_HEADER)? {
        let [addr, accuracy, n_preds, n_correct] = fields.as_slice() else {
            return Err(malformed(line, format!("expected 4 fields, got {}", fields.len())));
        };
        let address: Address = addr.parse()?;
        let summary = PredictoorSummary {
            address: address.clone(),
            accuracy: parse_field(line, "accuracy", accuracy)?,
            prediction_count: parse_field(line, "n_preds", n_preds)?,
            correct_prediction_count: parse_field(line, "n_correct_preds", n_correct)?,
        };
        if summary.correct_prediction_count > summary.prediction_count {
            return Err(malformed(line, "more correct predictions than predictions".into()));
        }
        insert_unique(&mut data, line, address, summary)?;
    }
    info!(path = %path.display(), rows = data.len(), "loaded predictoor data csv");
    Ok(data)
}

pub fn save_predictoor_rewards_csv(
    rewards: &AggregateRewardMap,
    dir: &Path,
) -> Result<PathBuf, PersistenceError> {
    let path = predictoor_rewards_csv_path(dir);
    let mut w = create_new(dir, &path)?;
    writeln!(w, "{REWARDS_HEADER}")?;
    for (addr, amount) in rewards {
        writeln!(w, "{addr},{amount}")?;
    }
    w.flush()?;
    info!(path = %path.display(), rows = rewards.len(), "created predictoor rewards csv");
    Ok(path)
}

pub fn load_predictoor_rewards_csv(dir: &Path) -> Result<AggregateRewardMap, PersistenceError> {
    let path = predictoor_rewards_csv_path(dir);
    let mut rewards = AggregateRewardMap::new();
    for (line, fields) in read_rows(&path, REWARDS_HEADER)? {
        let [addr, amount] = fields.as_slice() else {
            return Err(malformed(line, format!("expected 2 fields, got {}", fields.len())));
        };
        let address: Address = addr.parse()?;
        let amount: f64 = parse_field(line, "OCEAN_amt", amount)?;
        if !amount.is_finite() || amount < 0.0 {
            return Err(malformed(line, format!("invalid reward {amount}")));
        }
        insert_unique(&mut rewards, line, address, amount)?;
    }
    info!(path = %path.display(), rows = rewards.len(), "loaded predictoor rewards csv");
    Ok(rewards)
}

fn create_new(dir: &Path, path: &Path) -> Result<BufWriter<File>, PersistenceError> {
    if !dir.is_dir() {
        return Err(PersistenceError::MissingDir(dir.display().to_string()));
    }
    match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(f) => Ok(BufWriter::new(f)),
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {
            Err(PersistenceError::FileExists(path.display().to_string()))
        }
        Err(e) => Err(e.into()),
    }
}

/// Data rows as `(line_number, fields)`, after checking the header.
fn read_rows(path: &Path, header: &str) -> Result<Vec<(usize, Vec<String>)>, PersistenceError> {
    let mut lines = BufReader::new(File::open(path)?).lines();
    let got = lines.next().transpose()?.unwrap_or_default();
    if got.trim_end() != header {
        return Err(PersistenceError::BadHeader {
            expected: header.to_string(),
            got,
        });
    }
    let mut rows = Vec::new();
    for (i, line) in lines.enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let fields = line.trim_end().split(',').map(|f| f.trim().to_string()).collect();
        rows.push((i + 2, fields));
    }
    Ok(rows)
}

fn parse_field<T: std::str::FromStr>(
    line: usize,
    name: &str,
    raw: &str,
) -> Result<T, PersistenceError> {
    raw.parse()
        .map_err(|_| malformed(line, format!("bad {name}: {raw:?}")))
}

fn insert_unique<V>(
    map: &mut BTreeMap<Address, V>,
    line: usize,
    address: Address,
    value: V,
) -> Result<(), PersistenceError> {
    if map.contains_key(&address) {
        return Err(PersistenceError::DuplicateAddress {
            line,
            address: address.to_string(),
        });
    }
    map.insert(address, value);
    Ok(())
}

fn malformed(line: usize, reason: String) -> PersistenceError {
    PersistenceError::MalformedRow { line, reason }
}
