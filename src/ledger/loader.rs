//! Load the asset ledger from CSV

use csv::Reader;
use log::info;
use std::path::Path;

use super::{Ledger, LedgerRow};
use crate::error::{BrrError, BrrResult};

/// Columns every ledger file must carry
pub const REQUIRED_COLUMNS: [&str; 7] = [
    "iu",
    "vrb",
    "taxa_deprec_anos",
    "data_imob",
    "data_monet",
    "elegibilidade",
    "qtde",
];

/// Identifier components, by their ledger header and the accepted alias
pub const IDENTIFIER_COLUMNS: [(&str, &str); 3] = [
    ("tipo", "asset_type"),
    ("plaqueta", "tag"),
    ("complemento", "complement"),
];

/// Check that all `required` columns appear in the header row
pub(crate) fn check_headers(headers: &csv::StringRecord, required: &[&str]) -> BrrResult<()> {
    for column in required {
        if !headers.iter().any(|h| h.trim() == *column) {
            return Err(BrrError::schema(column, "column not found"));
        }
    }
    Ok(())
}

/// Read raw ledger rows from any reader, checking required headers first
pub fn load_ledger_rows_from_reader<R: std::io::Read>(reader: R) -> BrrResult<Vec<LedgerRow>> {
    let mut csv_reader = Reader::from_reader(reader);
    let headers = csv_reader.headers()?;
    check_headers(headers, &REQUIRED_COLUMNS)?;
    for (column, alias) in IDENTIFIER_COLUMNS {
        if !headers.iter().any(|h| h.trim() == column || h.trim() == alias) {
            return Err(BrrError::schema(column, "column not found"));
        }
    }

    let mut rows = Vec::new();
    for result in csv_reader.deserialize() {
        let row: LedgerRow = result?;
        rows.push(row);
    }
    Ok(rows)
}

/// Load and validate a ledger from any reader
pub fn load_ledger_from_reader<R: std::io::Read>(reader: R) -> BrrResult<Ledger> {
    Ledger::from_rows(load_ledger_rows_from_reader(reader)?)
}

/// Load and validate a ledger from a CSV file
pub fn load_ledger<P: AsRef<Path>>(path: P) -> BrrResult<Ledger> {
    let path = path.as_ref();
    info!("Loading ledger from {}", path.display());
    let file = std::fs::File::open(path)?;
    load_ledger_from_reader(file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::Eligibility;

    const LEDGER_CSV: &str = "\
iu,tipo,plaqueta,complemento,vrb,taxa_deprec_anos,data_imob,data_monet,elegibilidade,qtde,conta_contabil,municipio,servico,descricao,rtp
10-500-0,10,500,0,100000.0,10,2020-01-01,31/12/2020,Elegível,1,132.01,Curitiba,Água,Rede de distribuição,4
10-501-0,10,501,0,5000.0,0,2020-06-15,31/12/2020,Não elegível,2,132.02,Londrina,Esgoto,Terreno,
";

    #[test]
    fn test_load_ledger_from_reader() {
        let ledger = load_ledger_from_reader(LEDGER_CSV.as_bytes()).expect("ledger loads");
        assert_eq!(ledger.len(), 2);

        let first = &ledger.assets()[0];
        assert_eq!(first.iu, "10-500-0");
        assert_eq!(first.municipio, "Curitiba");
        assert_eq!(first.rtp, Some(4));
        assert_eq!(first.elegibilidade, Eligibility::Eligible);

        let second = &ledger.assets()[1];
        assert_eq!(second.elegibilidade, Eligibility::Ineligible);
        assert!(!second.is_amortizable());
        assert_eq!(second.rtp, None);
        assert_eq!(ledger.tariff_review_cycle(), 4);
    }

    #[test]
    fn test_missing_column_is_schema_error() {
        let csv = "iu,vrb,data_imob,data_monet,elegibilidade,qtde\n1-1-1,10,2020-01-01,2020-01-01,Elegível,1\n";
        let err = load_ledger_from_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, BrrError::Schema { ref column, .. } if column == "taxa_deprec_anos"));
    }

    #[test]
    fn test_missing_identifier_columns_are_schema_errors() {
        let csv = "\
iu,vrb,taxa_deprec_anos,data_imob,data_monet,elegibilidade,qtde
1-1-1,10,10,2020-01-01,2020-01-01,Elegível,1
";
        let err = load_ledger_from_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, BrrError::Schema { ref column, .. } if column == "tipo"));

        let csv = "\
iu,tipo,plaqueta,vrb,taxa_deprec_anos,data_imob,data_monet,elegibilidade,qtde
1-1-1,1,1,10,10,2020-01-01,2020-01-01,Elegível,1
";
        let err = load_ledger_from_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, BrrError::Schema { ref column, .. } if column == "complemento"));

        // English aliases are accepted
        let csv = "\
iu,asset_type,tag,complement,vrb,taxa_deprec_anos,data_imob,data_monet,elegibilidade,qtde
1-1-1,1,1,1,10,10,2020-01-01,2020-01-01,Elegível,1
";
        assert_eq!(load_ledger_from_reader(csv.as_bytes()).unwrap().len(), 1);
    }

    #[test]
    fn test_null_rate_is_schema_error() {
        let csv = "\
iu,tipo,plaqueta,complemento,vrb,taxa_deprec_anos,data_imob,data_monet,elegibilidade,qtde
1-1-1,1,1,1,10,,2020-01-01,2020-01-01,Elegível,1
";
        let err = load_ledger_from_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, BrrError::Schema { ref column, .. } if column == "taxa_deprec_anos"));
    }
}
