//! CSV and JSON output of a movement run

use chrono::NaiveDate;
use csv::Writer;
use log::info;
use serde::Serialize;
use std::io;
use std::path::{Path, PathBuf};

use crate::dates::file_stamp;
use crate::error::BrrResult;
use crate::movement::{
    CashFlowLine, CorrectionSummary, DecoratedAsset, MovementConfig, MovementResult,
    MovementSummary, PeriodSnapshot, Reconciliation, ResidualBalances,
};

/// Row of the exported regulatory base
#[derive(Debug, Serialize)]
struct LedgerOutputRow<'a> {
    iu: &'a str,
    rtp: Option<u32>,
    municipio: &'a str,
    servico: &'a str,
    conta_contabil: &'a str,
    descricao: &'a str,
    qtde: f64,
    data_imob: NaiveDate,
    data_monet: NaiveDate,
    vrb: f64,
    vrl: f64,
    /// Annual depreciation rate as a fraction (0.1 = 10%/year)
    tdr_percent_ano: f64,
}

impl<'a> From<&'a DecoratedAsset> for LedgerOutputRow<'a> {
    fn from(a: &'a DecoratedAsset) -> Self {
        Self {
            iu: &a.asset.iu,
            rtp: a.asset.rtp,
            municipio: &a.asset.municipio,
            servico: &a.asset.servico,
            conta_contabil: &a.asset.conta_contabil,
            descricao: &a.asset.descricao,
            qtde: a.asset.qtde,
            data_imob: a.asset.data_imob,
            data_monet: a.asset.data_monet,
            vrb: a.asset.vrb,
            vrl: a.net_value,
            tdr_percent_ano: a.annual_rate,
        }
    }
}

/// Serializable digest of a run, for `--json` output
#[derive(Debug, Serialize)]
pub struct RunDigest<'a> {
    pub config: &'a MovementConfig,
    pub correction: CorrectionSummary,
    pub snapshots: &'a [PeriodSnapshot],
    pub reconciliation: &'a Reconciliation,
    pub summary: &'a MovementSummary,
    pub residuals: &'a ResidualBalances,
}

impl<'a> RunDigest<'a> {
    pub fn new(result: &'a MovementResult) -> Self {
        Self {
            config: &result.config,
            correction: result.movement.correction.summary(),
            snapshots: &result.movement.snapshots,
            reconciliation: &result.reconciliation,
            summary: &result.summary,
            residuals: &result.residuals,
        }
    }
}

pub fn write_snapshots<W: io::Write>(writer: W, snapshots: &[PeriodSnapshot]) -> BrrResult<()> {
    let mut wtr = Writer::from_writer(writer);
    for snap in snapshots {
        wtr.serialize(snap)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_ledger<W: io::Write>(writer: W, assets: &[DecoratedAsset]) -> BrrResult<()> {
    let mut wtr = Writer::from_writer(writer);
    for asset in assets {
        wtr.serialize(LedgerOutputRow::from(asset))?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_cash_flow<W: io::Write>(writer: W, lines: &[CashFlowLine]) -> BrrResult<()> {
    let mut wtr = Writer::from_writer(writer);
    for line in lines {
        wtr.serialize(line)?;
    }
    wtr.flush()?;
    Ok(())
}

fn file_name(prefix: &str, rtp: u32, config: &MovementConfig, items: usize) -> String {
    format!(
        "{prefix}_{rtp}RTP_DBM-{}_DBI-{}_{items}_itens.csv",
        file_stamp(config.monetary_reference_date),
        file_stamp(config.horizon_date)
    )
}

/// Snapshot table file name
pub fn summary_file_name(rtp: u32, config: &MovementConfig, items: usize) -> String {
    file_name("RESUMO_BRR", rtp, config, items)
}

/// Decorated ledger file name
pub fn ledger_file_name(rtp: u32, config: &MovementConfig, items: usize) -> String {
    file_name("BRR", rtp, config, items)
}

/// Reconciliation cash flow file name
pub fn cash_flow_file_name(rtp: u32, config: &MovementConfig, items: usize) -> String {
    file_name("FLUXO_BRR", rtp, config, items)
}

/// Write the snapshot table, the decorated ledger and the cash flow of a
/// run into `dir`; returns the paths written
pub fn export_run(result: &MovementResult, rtp: u32, dir: &Path) -> BrrResult<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)?;
    let items = result.movement.final_assets.len();

    let summary_path = dir.join(summary_file_name(rtp, &result.config, items));
    write_snapshots(std::fs::File::create(&summary_path)?, &result.movement.snapshots)?;

    let ledger_path = dir.join(ledger_file_name(rtp, &result.config, items));
    write_ledger(std::fs::File::create(&ledger_path)?, &result.movement.final_assets)?;

    let flow_path = dir.join(cash_flow_file_name(rtp, &result.config, items));
    write_cash_flow(std::fs::File::create(&flow_path)?, &result.reconciliation.lines)?;

    let paths = vec![summary_path, ledger_path, flow_path];
    for path in &paths {
        info!("Exported {}", path.display());
    }
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{AssetRecord, Eligibility, Ledger};
    use crate::movement::snapshot;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_file_names() {
        let config = MovementConfig::new(d(2023, 12, 31), d(2024, 6, 30));
        assert_eq!(
            summary_file_name(5, &config, 1200),
            "RESUMO_BRR_5RTP_DBM-31-12-2023_DBI-30-06-2024_1200_itens.csv"
        );
        assert_eq!(
            ledger_file_name(5, &config, 1200),
            "BRR_5RTP_DBM-31-12-2023_DBI-30-06-2024_1200_itens.csv"
        );
    }

    #[test]
    fn test_ledger_columns() {
        let asset = AssetRecord {
            iu: "4-9-1".into(),
            asset_type: "4".into(),
            tag: "9".into(),
            complement: "1".into(),
            vrb: 1000.0,
            taxa_deprec_anos: 10.0,
            data_imob: d(2020, 1, 1),
            data_monet: d(2020, 1, 1),
            elegibilidade: Eligibility::Eligible,
            qtde: 2.0,
            conta_contabil: "132".into(),
            municipio: "Vila".into(),
            servico: "Água".into(),
            descricao: "Rede".into(),
            rtp: Some(3),
        };
        let ledger = Ledger::from_records(vec![asset]).unwrap();
        let result = snapshot(&ledger, d(2021, 1, 1), d(2021, 1, 1), None);

        let mut buf = Vec::new();
        write_ledger(&mut buf, &result.assets).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "iu,rtp,municipio,servico,conta_contabil,descricao,qtde,data_imob,data_monet,vrb,vrl,tdr_percent_ano"
        );
        let row = lines.next().unwrap();
        assert!(row.starts_with("4-9-1,3,Vila,Água,132,Rede,2.0,2020-01-01,2020-01-01,1000.0,"));
        // Annual rate exported as a fraction
        assert!(row.ends_with(",0.1"));
    }

    #[test]
    fn test_snapshot_header() {
        let ledger = Ledger::from_records(Vec::new()).unwrap();
        let result = snapshot(&ledger, d(2021, 1, 1), d(2021, 1, 1), None);
        let mut buf = Vec::new();
        write_snapshots(&mut buf, std::slice::from_ref(&result.snapshot)).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.starts_with("evaluation_date,monetary_reference_date,period_investment,"));
    }
}
