//! Multi-unit batch simulation from a units CSV.
//!
//! Each row describes one consumer unit. Units are simulated independently
//! and a failing unit never aborts the batch: its outcome carries the error
//! text instead of a summary.

use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::{
    ConsumptionConfig, ContractConfig, OfferConfig, ScenarioConfig, TariffConfig, TaxConfig,
};
use crate::sim::simulate;
use crate::tariffs::TariffTable;

/// One row of the units CSV.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UnitRecord {
    pub name: String,
    pub utility: String,
    pub subgroup: String,
    pub modality: String,
    pub demand_peak_kw: f64,
    pub demand_offpeak_kw: f64,
    pub energy_peak_kwh: f64,
    pub energy_offpeak_kwh: f64,
    pub icms_pct: f64,
    pub pis_cofins_pct: f64,
    pub incentive: String,
    pub icms_class: String,
    pub ccee_fee_per_mwh: f64,
    pub start_month: u32,
    pub start_year: i32,
    pub end_month: u32,
    pub end_year: i32,
    pub npv_rate_pct: f64,
    /// `"guaranteed_discount"` or `"fixed_price"`.
    pub offer_kind: String,
    /// Discount (%) or `;`-separated yearly prices (R$/MWh).
    pub offer_value: String,
}

impl UnitRecord {
    /// Converts the row into a scenario whose tariff is still to be resolved.
    ///
    /// # Errors
    ///
    /// Returns a message if `offer_value` is not a number or a list of numbers.
    pub fn to_scenario(&self) -> Result<ScenarioConfig, String> {
        let offer = match self.offer_kind.as_str() {
            "fixed_price" => OfferConfig {
                kind: self.offer_kind.clone(),
                discount_pct: 0.0,
                prices_per_mwh: parse_prices(&self.offer_value)?,
            },
            _ => OfferConfig {
                kind: self.offer_kind.clone(),
                discount_pct: parse_number(&self.offer_value)?,
                prices_per_mwh: Vec::new(),
            },
        };

        Ok(ScenarioConfig {
            consumption: ConsumptionConfig {
                demand_peak_kw: self.demand_peak_kw,
                demand_offpeak_kw: self.demand_offpeak_kw,
                energy_peak_kwh: self.energy_peak_kwh,
                energy_offpeak_kwh: self.energy_offpeak_kwh,
            },
            taxes: TaxConfig {
                icms_pct: self.icms_pct,
                pis_cofins_pct: self.pis_cofins_pct,
                incentive: self.incentive.clone(),
                icms_class: self.icms_class.clone(),
                ccee_fee_per_mwh: self.ccee_fee_per_mwh,
            },
            contract: ContractConfig {
                start_month: self.start_month,
                start_year: self.start_year,
                end_month: self.end_month,
                end_year: self.end_year,
                npv_rate_pct: self.npv_rate_pct,
            },
            offer,
            tariff: TariffConfig {
                modality: self.modality.clone(),
                utility: Some(self.utility.clone()),
                subgroup: Some(self.subgroup.clone()),
                ..TariffConfig::default()
            },
        })
    }
}

fn parse_number(text: &str) -> Result<f64, String> {
    let trimmed = text.trim();
    trimmed
        .replace(',', ".")
        .parse()
        .map_err(|_| format!("offer_value: \"{trimmed}\" is not a number"))
}

fn parse_prices(text: &str) -> Result<Vec<f64>, String> {
    text.split(';')
        .filter(|p| !p.trim().is_empty())
        .map(parse_number)
        .collect()
}

/// Headline figures of a successful unit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnitSummary {
    pub overall_discount: f64,
    pub total_savings: f64,
    pub npv_savings: f64,
    /// `"Jan/2025 a Dez/2027"`.
    pub period: String,
}

/// Outcome of one unit, in input order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnitOutcome {
    /// Zero-based row index in the units file.
    pub index: usize,
    pub name: String,
    pub utility: String,
    pub result: Result<UnitSummary, String>,
}

impl UnitOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Per-unit outcomes plus totals over the successful units.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchReport {
    pub units: Vec<UnitOutcome>,
    pub total_savings: f64,
    pub total_npv_savings: f64,
}

impl BatchReport {
    fn from_outcomes(units: Vec<UnitOutcome>) -> Self {
        let (total_savings, total_npv_savings) = units
            .iter()
            .filter_map(|u| u.result.as_ref().ok())
            .fold((0.0, 0.0), |(s, n), r| (s + r.total_savings, n + r.npv_savings));
        Self {
            units,
            total_savings,
            total_npv_savings,
        }
    }

    pub fn succeeded(&self) -> usize {
        self.units.iter().filter(|u| u.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.units.len() - self.succeeded()
    }
}

/// A units-file row that may or may not have deserialized.
pub type ParsedRow = (usize, String, String, Result<UnitRecord, String>);

/// Reads the units CSV, keeping rows that fail to deserialize as errors.
///
/// # Errors
///
/// Returns a `csv::Error` only when the header row itself cannot be read.
pub fn read_units(reader: impl Read) -> Result<Vec<ParsedRow>, csv::Error> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let headers = rdr.headers()?.clone();
    let name_col = headers.iter().position(|h| h == "name");
    let utility_col = headers.iter().position(|h| h == "utility");

    let mut rows = Vec::new();
    for (index, record) in rdr.records().enumerate() {
        let row = match record {
            Ok(record) => {
                let cell = |col: Option<usize>| {
                    col.and_then(|c| record.get(c)).unwrap_or_default().to_string()
                };
                let parsed = record
                    .deserialize::<UnitRecord>(Some(&headers))
                    .map_err(|e| e.to_string());
                (index, cell(name_col), cell(utility_col), parsed)
            }
            Err(e) => (index, String::new(), String::new(), Err(e.to_string())),
        };
        rows.push(row);
    }
    Ok(rows)
}

/// Simulates one parsed unit against the tariff table.
pub fn run_unit(record: &UnitRecord, table: &TariffTable) -> Result<UnitSummary, String> {
    let mut scenario = record.to_scenario()?;
    scenario
        .apply_tariff_table(table)
        .map_err(|e| e.to_string())?;
    let params = scenario.to_params().map_err(|e| e.to_string())?;
    let result = simulate(&params);
    Ok(UnitSummary {
        overall_discount: result.overall_discount,
        total_savings: result.total_savings,
        npv_savings: result.npv_savings,
        period: result.period,
    })
}

/// Runs every unit in parallel and returns outcomes in input order.
pub fn run_batch(rows: Vec<ParsedRow>, table: &TariffTable) -> BatchReport {
    let outcomes: Vec<UnitOutcome> = rows
        .into_par_iter()
        .map(|(index, name, utility, parsed)| {
            let name = if name.is_empty() {
                format!("Unit {}", index + 1)
            } else {
                name
            };
            let result = parsed.and_then(|record| run_unit(&record, table));
            match &result {
                Ok(summary) => debug!(unit = %name, discount = summary.overall_discount, "unit simulated"),
                Err(e) => warn!(unit = %name, error = %e, "unit failed"),
            }
            UnitOutcome {
                index,
                name,
                utility,
                result,
            }
        })
        .collect();

    let report = BatchReport::from_outcomes(outcomes);
    info!(
        units = report.units.len(),
        failed = report.failed(),
        total_savings = report.total_savings,
        "batch complete"
    );
    report
}

/// Loads the units file at `path` and runs the batch.
///
/// # Errors
///
/// Returns an `io::Error` if the file cannot be opened or its header is unreadable.
pub fn run_batch_file(path: &Path, table: &TariffTable) -> io::Result<BatchReport> {
    let rows = read_units(File::open(path)?).map_err(io::Error::other)?;
    Ok(run_batch(rows, table))
}

/// Writes one summary row per unit.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_batch_csv(report: &BatchReport, writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record([
        "name",
        "utility",
        "status",
        "period",
        "overall_discount",
        "total_savings",
        "npv_savings",
        "error",
    ])?;

    for unit in &report.units {
        let row = match &unit.result {
            Ok(s) => [
                unit.name.clone(),
                unit.utility.clone(),
                "ok".to_string(),
                s.period.clone(),
                format!("{:.6}", s.overall_discount),
                format!("{:.2}", s.total_savings),
                format!("{:.2}", s.npv_savings),
                String::new(),
            ],
            Err(e) => [
                unit.name.clone(),
                unit.utility.clone(),
                "error".to_string(),
                String::new(),
                String::new(),
                String::new(),
                String::new(),
                e.clone(),
            ],
        };
        wtr.write_record(&row)?;
    }

    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TARIFFS: &str = "SigAgente;DscBaseTarifaria;DscSubGrupo;DscModalidadeTarifaria;DscClasse;\
        DscDetalhe;NomPostoTarifario;DscUnidadeTerciaria;VlrTUSD;VlrTE;DatInicioVigencia\n\
        CEMIG;Tarifa de Aplicação;A4;Azul;Não se aplica;Não se aplica;Ponta;kW;60,00;,00;2025-05-28\n\
        CEMIG;Tarifa de Aplicação;A4;Azul;Não se aplica;Não se aplica;Fora ponta;kW;20,00;,00;2025-05-28\n\
        CEMIG;Tarifa de Aplicação;A4;Azul;Não se aplica;Não se aplica;Ponta;MWh;80,00;450,00;2025-05-28\n\
        CEMIG;Tarifa de Aplicação;A4;Azul;Não se aplica;Não se aplica;Fora ponta;MWh;80,00;280,00;2025-05-28";

    const HEADER: &str = "name,utility,subgroup,modality,demand_peak_kw,demand_offpeak_kw,\
        energy_peak_kwh,energy_offpeak_kwh,icms_pct,pis_cofins_pct,incentive,icms_class,\
        ccee_fee_per_mwh,start_month,start_year,end_month,end_year,npv_rate_pct,offer_kind,offer_value";

    fn table() -> TariffTable {
        TariffTable::from_reader(TARIFFS.as_bytes()).unwrap()
    }

    fn units(rows: &[&str]) -> Vec<ParsedRow> {
        let text = std::iter::once(HEADER).chain(rows.iter().copied()).collect::<Vec<_>>().join("\n");
        read_units(text.as_bytes()).unwrap()
    }

    const PLANT: &str = "Plant,CEMIG,A4,Azul,100,300,30000,120000,18,6.5,conventional,standard,0,1,2025,12,2027,9.67,guaranteed_discount,20";
    const STORE: &str = "Store,CEMIG,A4,Azul,100,300,30000,120000,18,6.5,conventional,standard,0,1,2025,12,2026,0,fixed_price,300;310";

    #[test]
    fn parses_fixed_price_schedule() {
        let rows = units(&[STORE]);
        let record = rows[0].3.as_ref().unwrap();
        let scenario = record.to_scenario().unwrap();
        assert_eq!(scenario.offer.prices_per_mwh, vec![300.0, 310.0]);
        assert_eq!(scenario.tariff.utility.as_deref(), Some("CEMIG"));
    }

    #[test]
    fn failures_are_isolated_and_order_is_kept() {
        let rows = units(&[
            PLANT,
            "Ghost,LIGHT,A4,Azul,100,300,30000,120000,18,6.5,conventional,standard,0,1,2025,12,2027,9.67,guaranteed_discount,20",
            STORE,
            "Broken,CEMIG,A4,Azul,lots,300,30000,120000,18,6.5,conventional,standard,0,1,2025,12,2027,9.67,guaranteed_discount,20",
        ]);
        let report = run_batch(rows, &table());

        let names: Vec<&str> = report.units.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, vec!["Plant", "Ghost", "Store", "Broken"]);
        assert_eq!(report.succeeded(), 2);
        assert_eq!(report.failed(), 2);

        let ghost = report.units[1].result.as_ref().unwrap_err();
        assert!(ghost.contains("LIGHT"));

        let expected: f64 = report
            .units
            .iter()
            .filter_map(|u| u.result.as_ref().ok())
            .map(|s| s.total_savings)
            .sum();
        assert!((report.total_savings - expected).abs() < 1e-6);
    }

    #[test]
    fn invalid_parameters_surface_as_unit_errors() {
        let rows = units(&[
            "Hot,CEMIG,A4,Azul,100,300,30000,120000,40,6.5,conventional,standard,0,1,2025,12,2027,9.67,guaranteed_discount,20",
        ]);
        let report = run_batch(rows, &table());
        let err = report.units[0].result.as_ref().unwrap_err();
        assert!(err.contains("icms_pct"));
        assert_eq!(report.total_savings, 0.0);
    }

    #[test]
    fn unnamed_unit_gets_positional_name() {
        let rows = units(&[
            ",CEMIG,A4,Azul,100,300,30000,120000,18,6.5,conventional,standard,0,1,2025,12,2027,9.67,guaranteed_discount,20",
        ]);
        let report = run_batch(rows, &table());
        assert_eq!(report.units[0].name, "Unit 1");
        assert!(report.units[0].is_ok());
    }

    #[test]
    fn summary_csv_has_one_row_per_unit() {
        let report = run_batch(units(&[PLANT, STORE]), &table());
        let mut buf = Vec::new();
        write_batch_csv(&report, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("name,utility,status"));
        assert!(lines[1].starts_with("Plant,CEMIG,ok,Jan/2025 a Dez/2027"));
    }
}
