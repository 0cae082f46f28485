//! Extract cell tower identities from radio state dumps.
//!
//! Dumps contain blocks like `CellIdentityLte:{ mCi=12345 mTac=678 ... }`.
//! Key spelling differs between radio types and platform versions, so every
//! field is looked up through a table of accepted spellings. Keys may carry
//! an `m` member prefix.
//!
//! A block ends at its first `}`. Nested braces are not understood and a
//! value containing `}` truncates the block.

use std::{collections::BTreeSet, sync::LazyLock};

use regex::Regex;
use tracing::{debug, trace};

use crate::model::{Field, TowerRecord, SENTINEL};

/// Accepted key spellings per field, as regex alternatives.
const SYNONYMS: &[(Field, &str)] = &[
    (Field::CellId, r"[Cc](?:ell)?[Ii][Dd]?"),
    (Field::TacLac, r"Tac|Lac"),
    (Field::Mcc, r"Mcc"),
    (Field::Mnc, r"Mnc"),
    (Field::PciPsc, r"Pci|Psc"),
    (Field::Earfcn, r"Earfcn|Arfcn|Uarfcn"),
];

static BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"CellIdentity\w+:\s*\{([^}]+)\}").expect("valid regex"));

static KEYS: LazyLock<Vec<(Field, Regex)>> = LazyLock::new(|| {
    SYNONYMS
        .iter()
        .map(|&(field, keys)| {
            let re = Regex::new(&format!(r"m?(?:{keys})=(\d+)")).expect("valid regex");
            (field, re)
        })
        .collect()
});

/// Parse the body of one identity block.
///
/// Each field takes the first matching key in the body. Unknown values are
/// dropped.
pub fn parse_block(body: &str) -> TowerRecord {
    let mut record = TowerRecord::default();
    for (field, re) in KEYS.iter() {
        let Some(value) = re.captures(body).and_then(|x| x.get(1)) else {
            continue;
        };
        let value = value.as_str();
        if field.is_sentinel_filtered() && value == SENTINEL {
            continue;
        }
        record = record.with(*field, value);
    }
    record
}

/// Extract every usable tower from `text`, in order of first appearance.
pub fn extract(text: &str) -> Vec<TowerRecord> {
    let mut towers = Dedup::default();
    for captures in BLOCK.captures_iter(text) {
        let record = parse_block(&captures[1]);
        if !record.is_retained() {
            trace!(block = &captures[0], "ignoring block without cell or operator");
            continue;
        }
        if towers.push(record) {
            debug!(block = &captures[0], "found tower");
        }
    }
    towers.into_records()
}

/// Collects records, dropping exact repeats and keeping first-seen order.
#[derive(Debug, Default)]
pub struct Dedup {
    seen: BTreeSet<TowerRecord>,
    records: Vec<TowerRecord>,
}

impl Dedup {
    /// Returns false if an identical record was already collected.
    pub fn push(&mut self, record: TowerRecord) -> bool {
        if !self.seen.insert(record.clone()) {
            return false;
        }
        self.records.push(record);
        true
    }

    pub fn into_records(self) -> Vec<TowerRecord> {
        self.records
    }
}
