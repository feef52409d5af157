//! Presentation of movement results: pt-BR money formatting, grouped
//! residual tables and the plain-text run summary

use std::collections::HashMap;
use std::fmt;

use crate::movement::{DecoratedAsset, MovementResult};

const MAGNITUDES: [&str; 5] = ["", " Mil", " Milhões", " Bilhões", " Trilhões"];

/// Digits of the integer part grouped in thousands with `.`
fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push('.');
        }
        out.push(ch);
    }
    out
}

/// Brazilian currency with two decimals: `R$1.234,56`
pub fn format_brl(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let sign = if value < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("R${sign}{},{frac_part}", group_thousands(int_part))
}

/// Fraction as a percentage with two decimals: `0.1234` -> `12.34%`
pub fn format_pct(value: f64) -> String {
    format!("{:.2}%", value * 100.0)
}

/// Currency scaled to its magnitude: `R$1,23 Milhões`
pub fn millify_brl(value: f64) -> String {
    let idx = if value == 0.0 {
        0
    } else {
        ((value.abs().log10() / 3.0).floor().max(0.0) as usize).min(MAGNITUDES.len() - 1)
    };
    let scaled = value / 10f64.powi(3 * idx as i32);
    format!("R${:.2}{}", scaled, MAGNITUDES[idx]).replace('.', ",")
}

/// Net value of a group of assets with its share of the total
#[derive(Debug, Clone, PartialEq)]
pub struct GroupTotal {
    pub key: String,
    pub count: usize,
    pub net: f64,
    pub share: f64,
    pub cumulative_share: f64,
}

/// Net values grouped by `key`, largest first, with shares and running
/// cumulative share
pub fn group_net_by<F>(assets: &[&DecoratedAsset], key: F) -> Vec<GroupTotal>
where
    F: Fn(&DecoratedAsset) -> String,
{
    let mut groups: HashMap<String, (usize, f64)> = HashMap::new();
    for a in assets {
        let entry = groups.entry(key(*a)).or_default();
        entry.0 += 1;
        entry.1 += a.net_value;
    }

    let total: f64 = groups.values().map(|(_, net)| net).sum();
    let mut rows: Vec<GroupTotal> = groups
        .into_iter()
        .map(|(key, (count, net))| GroupTotal {
            key,
            count,
            net,
            share: if total == 0.0 { 0.0 } else { net / total },
            cumulative_share: 0.0,
        })
        .collect();
    rows.sort_by(|a, b| b.net.total_cmp(&a.net).then_with(|| a.key.cmp(&b.key)));

    let mut cumulative = 0.0;
    for row in &mut rows {
        cumulative += row.share;
        row.cumulative_share = cumulative;
    }
    rows
}

/// Grouping used for residual balances: service, municipality and account
pub fn residual_key(a: &DecoratedAsset) -> String {
    format!(
        "{} | {} | {}",
        a.asset.servico, a.asset.municipio, a.asset.conta_contabil
    )
}

fn write_groups(f: &mut fmt::Formatter<'_>, rows: &[GroupTotal]) -> fmt::Result {
    for row in rows {
        writeln!(
            f,
            "    {:<50} {:>5} {:>22} {:>8} {:>8}",
            row.key,
            row.count,
            format_brl(row.net),
            format_pct(row.share),
            format_pct(row.cumulative_share)
        )?;
    }
    Ok(())
}

/// Plain-text summary of a run, rendered through `Display`
pub struct SummaryReport<'a>(pub &'a MovementResult);

impl fmt::Display for SummaryReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let result = self.0;
        let horizon = result.config.horizon_date.format("%d/%m/%Y");
        let correction = result.movement.correction.summary();

        writeln!(f, "BRR MOVEMENT")?;
        writeln!(
            f,
            "Prices of {}, horizon {}",
            correction.reference_date.format("%d/%m/%Y"),
            horizon
        )?;
        writeln!(
            f,
            "Monetary correction: {} -> {} ({})",
            millify_brl(correction.original_total),
            millify_brl(correction.corrected_total),
            format_pct(correction.average_variation)
        )?;
        if correction.divergent_count > 0 {
            writeln!(f, "  {} assets diverge from the index ratio", correction.divergent_count)?;
        }
        writeln!(f)?;

        writeln!(
            f,
            "{:<12} {:>20} {:>20} {:>20} {:>20} {:>20} {:>8}",
            "Date", "Investment", "Gross BRR", "Net BRR", "Accum. depr.", "QRR", "TDR"
        )?;
        for s in &result.movement.snapshots {
            writeln!(
                f,
                "{:<12} {:>20} {:>20} {:>20} {:>20} {:>20} {:>8}",
                s.evaluation_date.format("%d/%m/%Y"),
                format_brl(s.period_investment),
                format_brl(s.gross_brr),
                format_brl(s.net_brr),
                format_brl(s.accumulated_depreciation),
                format_brl(s.qrr),
                format_pct(s.tdr)
            )?;
        }
        writeln!(f)?;

        let summary = &result.summary;
        writeln!(
            f,
            "Accumulated depreciation up to {}: {}",
            horizon,
            format_brl(summary.final_accumulated_depreciation)
        )?;
        writeln!(f, "Total QRR up to {}: {}", horizon, format_brl(summary.total_qrr))?;
        writeln!(
            f,
            "Total investment up to {}: {}",
            horizon,
            format_brl(summary.total_investment)
        )?;
        writeln!(
            f,
            "Gross-net BRR difference at {}: {}",
            horizon,
            format_brl(summary.final_gross_net_difference)
        )?;
        writeln!(f)?;

        let rec = &result.reconciliation;
        writeln!(f, "Financing rate: {:.5}%", rec.financing_rate * 100.0)?;
        writeln!(f, "Estimated IRR: {:.5}%", rec.irr * 100.0)?;
        writeln!(f, "IRR deviation: {} [{}]", format_pct(rec.deviation), rec.verdict)?;
        if rec.dropped_lines > 0 {
            writeln!(f, "  cash flow truncated, {} lines dropped", rec.dropped_lines)?;
        }
        writeln!(f)?;

        let residuals = &result.residuals;
        let (non_amortizable, amortizable): (Vec<&DecoratedAsset>, Vec<&DecoratedAsset>) = result
            .movement
            .final_assets
            .iter()
            .filter(|a| a.eligibility.is_eligible() && a.net_value.round() != 0.0)
            .partition(|a| a.non_amortizable);
        writeln!(
            f,
            "Non-amortizable assets: {} ({})",
            residuals.non_amortizable.len(),
            format_brl(residuals.non_amortizable_net)
        )?;
        write_groups(f, &group_net_by(&non_amortizable, residual_key))?;
        writeln!(
            f,
            "Assets with balance left to amortize: {} ({})",
            residuals.amortizable.len(),
            format_brl(residuals.amortizable_net)
        )?;
        write_groups(f, &group_net_by(&amortizable, residual_key))
    }
}

/// Plain-text summary of a run
pub fn render_summary(result: &MovementResult) -> String {
    SummaryReport(result).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{AssetRecord, Eligibility, Ledger};
    use crate::movement::snapshot;
    use chrono::NaiveDate;

    #[test]
    fn test_format_brl() {
        assert_eq!(format_brl(1234.56), "R$1.234,56");
        assert_eq!(format_brl(1_234_567.891), "R$1.234.567,89");
        assert_eq!(format_brl(0.0), "R$0,00");
        assert_eq!(format_brl(999.999), "R$1.000,00");
        assert_eq!(format_brl(-50_000.5), "R$-50.000,50");
    }

    #[test]
    fn test_format_pct() {
        assert_eq!(format_pct(0.1182768), "11.83%");
        assert_eq!(format_pct(1.0), "100.00%");
    }

    #[test]
    fn test_millify() {
        assert_eq!(millify_brl(0.0), "R$0,00");
        assert_eq!(millify_brl(950.0), "R$950,00");
        assert_eq!(millify_brl(12_500.0), "R$12,50 Mil");
        assert_eq!(millify_brl(1_234_567.0), "R$1,23 Milhões");
        assert_eq!(millify_brl(3.2e9), "R$3,20 Bilhões");
        assert_eq!(millify_brl(5.0e15), "R$5000,00 Trilhões");
    }

    #[test]
    fn test_group_net_by_orders_and_accumulates() {
        let d = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        let asset = |tag: &str, vrb: f64, servico: &str| AssetRecord {
            iu: format!("3-{tag}-0"),
            asset_type: "3".into(),
            tag: tag.into(),
            complement: "0".into(),
            vrb,
            taxa_deprec_anos: 0.0,
            data_imob: d,
            data_monet: d,
            elegibilidade: Eligibility::Eligible,
            qtde: 1.0,
            conta_contabil: String::new(),
            municipio: String::new(),
            servico: servico.into(),
            descricao: String::new(),
            rtp: None,
        };
        let ledger = Ledger::from_records(vec![
            asset("1", 100.0, "Esgoto"),
            asset("2", 300.0, "Água"),
            asset("3", 100.0, "Esgoto"),
        ])
        .unwrap();
        let result = snapshot(&ledger, d, d, None);
        let refs: Vec<&DecoratedAsset> = result.assets.iter().collect();

        let rows = group_net_by(&refs, |a| a.asset.servico.clone());
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].key, "Água");
        assert_eq!(rows[0].net, 300.0);
        assert_eq!(rows[1].count, 2);
        assert!((rows[0].share - 0.6).abs() < 1e-12);
        assert!((rows[1].cumulative_share - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_render_summary_sections() {
        use crate::index::{InterpolatedIndex, PriceIndexPoint};
        use crate::movement::{MovementConfig, MovementEngine};

        let d = |y, m, day| NaiveDate::from_ymd_opt(y, m, day).unwrap();
        let asset = AssetRecord {
            iu: "6-1-0".into(),
            asset_type: "6".into(),
            tag: "1".into(),
            complement: "0".into(),
            vrb: 1000.0,
            taxa_deprec_anos: 10.0,
            data_imob: d(2020, 3, 1),
            data_monet: d(2020, 12, 31),
            elegibilidade: Eligibility::Eligible,
            qtde: 1.0,
            conta_contabil: "132".into(),
            municipio: "Vila".into(),
            servico: "Água".into(),
            descricao: String::new(),
            rtp: None,
        };
        let ledger = Ledger::from_records(vec![asset]).unwrap();
        let index = InterpolatedIndex::build(vec![
            PriceIndexPoint::new(d(2020, 12, 31), 100.0),
            PriceIndexPoint::new(d(2022, 12, 31), 110.0),
        ])
        .unwrap();
        let config = MovementConfig::new(d(2022, 12, 31), d(2022, 12, 31));
        let result = MovementEngine::new(index, None, config).run(&ledger).unwrap();

        let text = render_summary(&result);
        assert!(text.starts_with("BRR MOVEMENT\n"));
        assert!(text.contains("31/12/2021"));
        assert!(text.contains("[PASS]"));
        assert!(text.contains("Assets with balance left to amortize: 1 (R$"));
        assert!(text.contains("Água | Vila | 132"));
        assert_eq!(text, SummaryReport(&result).to_string());
    }
}
