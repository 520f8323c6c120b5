//! Regulator tariff table loading and snapshot resolution.
//!
//! The published table is a `;`-separated, Latin-1 encoded CSV with
//! Brazilian decimal commas. Only the rows that apply to medium and high
//! voltage customers on the Blue and Green structures are retained.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDate};
use thiserror::Error;
use tracing::{debug, info};

use crate::locale::parse_br_number;
use crate::sim::types::{TariffSnapshot, TariffStructure};

/// Voltage subgroups retained from the table.
pub const SUBGROUPS: &[&str] = &["A1", "A2", "A3", "A3a", "A4", "AS"];

const COL_UTILITY: &str = "SigAgente";
const COL_BASE: &str = "DscBaseTarifaria";
const COL_SUBGROUP: &str = "DscSubGrupo";
const COL_MODALITY: &str = "DscModalidadeTarifaria";
const COL_CLASS: &str = "DscClasse";
const COL_DETAIL: &str = "DscDetalhe";
const COL_POST: &str = "NomPostoTarifario";
const COL_UNIT: &str = "DscUnidadeTerciaria";
const COL_TUSD: &str = "VlrTUSD";
const COL_TE: &str = "VlrTE";
const COL_START: &str = "DatInicioVigencia";

const POST_PEAK: &str = "Ponta";
const POST_OFFPEAK: &str = "Fora ponta";
const POST_PEAK_DRY: &str = "Ponta seca";
const POST_OFFPEAK_DRY: &str = "Fora ponta seca";
const POST_NONE: &str = "Não se aplica";

/// Failure to load the table or to resolve a snapshot from it.
#[derive(Debug, Error)]
pub enum TariffError {
    #[error("cannot read tariff table \"{path}\": {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed tariff table: {0}")]
    Csv(#[from] csv::Error),

    #[error("tariff table has no `{0}` column")]
    MissingColumn(&'static str),

    #[error("invalid effective date \"{0}\", expected YYYY-MM-DD or DD/MM/YYYY")]
    InvalidDate(String),

    #[error("no tariff found for {utility} / {subgroup} / {modality}")]
    Unresolved {
        utility: String,
        subgroup: String,
        modality: String,
    },
}

/// One retained price row.
#[derive(Debug, Clone, PartialEq)]
struct TariffRow {
    utility: String,
    subgroup: String,
    structure: TariffStructure,
    post: String,
    unit: String,
    tusd: f64,
    te: f64,
    effective: NaiveDate,
}

/// Column positions looked up from the header row.
struct Columns {
    utility: usize,
    base: usize,
    subgroup: usize,
    modality: usize,
    class: usize,
    detail: usize,
    post: usize,
    unit: usize,
    tusd: usize,
    te: usize,
    start: usize,
}

impl Columns {
    fn from_header(header: &[String]) -> Result<Self, TariffError> {
        let find = |name: &'static str| {
            header
                .iter()
                .position(|h| h.trim() == name)
                .ok_or(TariffError::MissingColumn(name))
        };
        Ok(Self {
            utility: find(COL_UTILITY)?,
            base: find(COL_BASE)?,
            subgroup: find(COL_SUBGROUP)?,
            modality: find(COL_MODALITY)?,
            class: find(COL_CLASS)?,
            detail: find(COL_DETAIL)?,
            post: find(COL_POST)?,
            unit: find(COL_UNIT)?,
            tusd: find(COL_TUSD)?,
            te: find(COL_TE)?,
            start: find(COL_START)?,
        })
    }
}

/// Decodes a field as UTF-8, falling back to Latin-1.
fn decode(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => bytes.iter().map(|&b| char::from(b)).collect(),
    }
}

/// Parses `YYYY-MM-DD` (optionally followed by a time) or `DD/MM/YYYY`.
pub fn parse_effective_date(text: &str) -> Result<NaiveDate, TariffError> {
    let date = text.split_whitespace().next().unwrap_or("");
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(date, "%d/%m/%Y"))
        .map_err(|_| TariffError::InvalidDate(text.to_string()))
}

/// Renders a date the way snapshot labels show it (`DD/MM/YYYY`).
pub fn date_label(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

/// Filtered, in-memory copy of the regulator's tariff table.
#[derive(Debug, Clone, Default)]
pub struct TariffTable {
    rows: Vec<TariffRow>,
}

impl TariffTable {
    /// Loads and filters the table at `path`.
    ///
    /// # Errors
    ///
    /// Returns `TariffError::Io` if the file cannot be opened, or any error
    /// from [`TariffTable::from_reader`].
    pub fn from_path(path: &Path) -> Result<Self, TariffError> {
        let file = File::open(path).map_err(|source| TariffError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let table = Self::from_reader(file)?;
        info!(path = %path.display(), rows = table.len(), "loaded tariff table");
        Ok(table)
    }

    /// Reads and filters a table from any reader.
    ///
    /// # Errors
    ///
    /// Returns `TariffError::Csv` on malformed records,
    /// `TariffError::MissingColumn` if a required header is absent, and
    /// `TariffError::InvalidDate` if a retained row carries an unparseable date.
    pub fn from_reader(reader: impl Read) -> Result<Self, TariffError> {
        let mut rdr = csv::ReaderBuilder::new()
            .delimiter(b';')
            .flexible(true)
            .from_reader(reader);

        let header: Vec<String> = rdr.byte_headers()?.iter().map(decode).collect();
        let cols = Columns::from_header(&header)?;

        let mut rows = Vec::new();
        let mut skipped = 0usize;
        for record in rdr.byte_records() {
            let record = record?;
            let field = |idx: usize| record.get(idx).map(decode).unwrap_or_default();

            let subgroup = field(cols.subgroup);
            let structure = match field(cols.modality).as_str() {
                "Azul" => TariffStructure::Blue,
                "Verde" => TariffStructure::Green,
                _ => {
                    skipped += 1;
                    continue;
                }
            };
            let applies = |text: String| text.to_lowercase().contains("aplica");
            if !field(cols.base).contains("Aplica")
                || !SUBGROUPS.contains(&subgroup.as_str())
                || !applies(field(cols.class))
                || !applies(field(cols.detail))
            {
                skipped += 1;
                continue;
            }

            rows.push(TariffRow {
                utility: field(cols.utility),
                subgroup,
                structure,
                post: field(cols.post),
                unit: field(cols.unit),
                tusd: parse_br_number(&field(cols.tusd)),
                te: parse_br_number(&field(cols.te)),
                effective: parse_effective_date(&field(cols.start))?,
            });
        }

        debug!(kept = rows.len(), skipped, "filtered tariff table");
        Ok(Self { rows })
    }

    /// Number of retained rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Utility names, sorted.
    pub fn utilities(&self) -> Vec<String> {
        let names: BTreeSet<&str> = self.rows.iter().map(|r| r.utility.as_str()).collect();
        names.into_iter().map(String::from).collect()
    }

    /// Subgroups offered by `utility`, sorted.
    pub fn subgroups(&self, utility: &str) -> Vec<String> {
        let names: BTreeSet<&str> = self
            .rows
            .iter()
            .filter(|r| r.utility == utility)
            .map(|r| r.subgroup.as_str())
            .collect();
        names.into_iter().map(String::from).collect()
    }

    /// Structures offered by `utility` for `subgroup`, Blue first.
    pub fn modalities(&self, utility: &str, subgroup: &str) -> Vec<TariffStructure> {
        [TariffStructure::Blue, TariffStructure::Green]
            .into_iter()
            .filter(|&s| {
                self.rows
                    .iter()
                    .any(|r| r.utility == utility && r.subgroup == subgroup && r.structure == s)
            })
            .collect()
    }

    fn matching<'a>(
        &'a self,
        utility: &'a str,
        subgroup: &'a str,
        structure: TariffStructure,
    ) -> impl Iterator<Item = &'a TariffRow> + 'a {
        self.rows.iter().filter(move |r| {
            r.utility == utility && r.subgroup == subgroup && r.structure == structure
        })
    }

    /// Snapshot effective at the latest date published for the combination.
    ///
    /// # Errors
    ///
    /// Returns `TariffError::Unresolved` if no row matches, or if the latest
    /// rows carry neither an off-peak demand rate nor an off-peak TE rate.
    pub fn resolve_snapshot(
        &self,
        utility: &str,
        subgroup: &str,
        structure: TariffStructure,
    ) -> Result<TariffSnapshot, TariffError> {
        let unresolved = || TariffError::Unresolved {
            utility: utility.to_string(),
            subgroup: subgroup.to_string(),
            modality: structure.regulator_name().to_string(),
        };

        let latest = self
            .matching(utility, subgroup, structure)
            .map(|r| r.effective)
            .max()
            .ok_or_else(unresolved)?;

        let rows: Vec<&TariffRow> = self
            .matching(utility, subgroup, structure)
            .filter(|r| r.effective == latest)
            .collect();
        let snapshot = snapshot_from_rows(&rows, structure, latest);
        if !snapshot.is_resolved() {
            return Err(unresolved());
        }
        debug!(utility, subgroup, effective = %snapshot.effective_date, "resolved tariff snapshot");
        Ok(snapshot)
    }

    /// Snapshots for every effective date of the combination, oldest first.
    pub fn history(
        &self,
        utility: &str,
        subgroup: &str,
        structure: TariffStructure,
    ) -> Vec<TariffSnapshot> {
        let dates: BTreeSet<NaiveDate> = self
            .matching(utility, subgroup, structure)
            .map(|r| r.effective)
            .collect();

        dates
            .into_iter()
            .map(|date| {
                let rows: Vec<&TariffRow> = self
                    .matching(utility, subgroup, structure)
                    .filter(|r| r.effective == date)
                    .collect();
                snapshot_from_rows(&rows, structure, date)
            })
            .collect()
    }

    /// Month of the utility's latest effective date, or 1 when it has no rows.
    pub fn adjustment_month(&self, utility: &str) -> u32 {
        self.rows
            .iter()
            .filter(|r| r.utility == utility)
            .map(|r| r.effective)
            .max()
            .map_or(1, |d| d.month())
    }
}

/// First value of `post`/`unit` in `rows`, 0 when absent.
fn lookup(rows: &[&TariffRow], post: &str, unit: &str, value: fn(&TariffRow) -> f64) -> f64 {
    rows.iter()
        .find(|r| r.post == post && r.unit == unit)
        .map_or(0.0, |r| value(r))
}

fn snapshot_from_rows(
    rows: &[&TariffRow],
    structure: TariffStructure,
    effective: NaiveDate,
) -> TariffSnapshot {
    let tusd = |r: &TariffRow| r.tusd;
    let te = |r: &TariffRow| r.te;

    let (tusd_kw_peak, tusd_kw_offpeak) = match structure {
        TariffStructure::Blue => (
            lookup(rows, POST_PEAK, "kW", tusd),
            lookup(rows, POST_OFFPEAK, "kW", tusd),
        ),
        TariffStructure::Green => (0.0, lookup(rows, POST_NONE, "kW", tusd)),
    };

    let prefer_dry = |dry: &str, plain: &str| {
        let value = lookup(rows, dry, "MWh", te);
        if value == 0.0 {
            lookup(rows, plain, "MWh", te)
        } else {
            value
        }
    };

    TariffSnapshot {
        tusd_kw_peak,
        tusd_kw_offpeak,
        tusd_mwh_peak: lookup(rows, POST_PEAK, "MWh", tusd),
        tusd_mwh_offpeak: lookup(rows, POST_OFFPEAK, "MWh", tusd),
        te_peak: prefer_dry(POST_PEAK_DRY, POST_PEAK),
        te_offpeak: prefer_dry(POST_OFFPEAK_DRY, POST_OFFPEAK),
        effective_date: date_label(effective),
    }
}
