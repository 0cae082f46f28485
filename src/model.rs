use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumIter, IntoEnumIterator};

/// Value the radio stack reports for an identifier it doesn't know.
pub const SENTINEL: &str = "2147483647";

/// Columns of a tower record, in export order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, AsRefStr, EnumIter)]
pub enum Field {
    #[strum(serialize = "CellID")]
    CellId,
    #[strum(serialize = "TAC_LAC")]
    TacLac,
    #[strum(serialize = "MCC")]
    Mcc,
    #[strum(serialize = "MNC")]
    Mnc,
    #[strum(serialize = "PCI_PSC")]
    PciPsc,
    #[strum(serialize = "EARFCN")]
    Earfcn,
}

impl Field {
    /// Whether [`SENTINEL`] marks this field as unknown.
    ///
    /// Country and network codes are taken as reported.
    pub fn is_sentinel_filtered(self) -> bool {
        !matches!(self, Field::Mcc | Field::Mnc)
    }
}

/// Radio type announced to the geolocation service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CellRadio {
    #[default]
    Gsm,
    Wcdma,
    Lte,
    Nr,
}

/// Identity of one observed cell tower.
///
/// Values are kept as the digit strings found in the dump.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
pub struct TowerRecord {
    #[serde(rename = "CellID")]
    cell_id: Option<String>,
    #[serde(rename = "TAC_LAC")]
    tac_lac: Option<String>,
    #[serde(rename = "MCC")]
    mcc: Option<String>,
    #[serde(rename = "MNC")]
    mnc: Option<String>,
    #[serde(rename = "PCI_PSC")]
    pci_psc: Option<String>,
    #[serde(rename = "EARFCN")]
    earfcn: Option<String>,
}

impl TowerRecord {
    pub fn get(&self, field: Field) -> Option<&str> {
        match field {
            Field::CellId => self.cell_id.as_deref(),
            Field::TacLac => self.tac_lac.as_deref(),
            Field::Mcc => self.mcc.as_deref(),
            Field::Mnc => self.mnc.as_deref(),
            Field::PciPsc => self.pci_psc.as_deref(),
            Field::Earfcn => self.earfcn.as_deref(),
        }
    }

    /// Returns the record with `field` set to `value`.
    pub fn with(mut self, field: Field, value: impl Into<String>) -> Self {
        let value = Some(value.into());
        match field {
            Field::CellId => self.cell_id = value,
            Field::TacLac => self.tac_lac = value,
            Field::Mcc => self.mcc = value,
            Field::Mnc => self.mnc = value,
            Field::PciPsc => self.pci_psc = value,
            Field::Earfcn => self.earfcn = value,
        }
        self
    }

    /// A record is worth keeping if it names a cell or at least an operator.
    pub fn is_retained(&self) -> bool {
        self.cell_id.is_some() || (self.mcc.is_some() && self.mnc.is_some())
    }
}

impl fmt::Display for TowerRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        let mut first = true;
        for field in Field::iter() {
            if let Some(value) = self.get(field) {
                if !first {
                    f.write_str(", ")?;
                }
                write!(f, "{}: {value}", field.as_ref())?;
                first = false;
            }
        }
        f.write_str("}")
    }
}
