//! CSV parsing and serialization for the tabular interfaces: catalog upload,
//! bulk order upload, stock export, and order export.
//!
//! Uploads arrive from spreadsheets exported by customers and suppliers, so
//! header matching is deliberately forgiving: headers are trimmed and
//! lowercased, the supersession column is matched by substring, and the bulk
//! format accepts any part-number-like and quantity-like column names.

use csv::{ReaderBuilder, WriterBuilder};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use utoipa::ToSchema;

use crate::errors::ServiceError;

/// One parsed catalog upload row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogRow {
    pub part_number: String,
    pub description: Option<String>,
    pub free_stock: i64,
    pub price: Decimal,
    pub superseded_by: Option<String>,
}

/// One parsed bulk enquiry/order row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct BulkRow {
    pub serial_no: String,
    pub part_number: String,
    pub requested_qty: i64,
}

/// Stock export line: the active `(part_number, description, stock)` triple.
#[derive(Debug, Clone, Serialize)]
pub struct StockExportRow {
    pub part_number: String,
    pub description: Option<String>,
    pub stock: i64,
}

/// Order export line carrying the standard order-item column set.
#[derive(Debug, Clone, Serialize)]
pub struct OrderExportRow {
    pub part_number: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub requested_qty: i64,
    pub allocated_qty: i64,
    pub available_qty: i64,
    pub supersedes: Option<String>,
}

fn clean_header(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Parses a currency-formatted price cell. `$` and thousands separators are
/// stripped; anything still unparseable coerces to zero, matching the upload
/// contract where a bad price must not reject the whole file.
fn parse_price(raw: &str) -> Decimal {
    let cleaned: String = raw
        .chars()
        .filter(|c| !matches!(c, '$' | ','))
        .collect::<String>()
        .trim()
        .to_string();
    Decimal::from_str(&cleaned).unwrap_or(Decimal::ZERO)
}

/// Parses a catalog upload CSV.
///
/// Recognized columns (after trim + lowercase): `part_number`, `description`,
/// `stock` (free stock), `price($)` or `price`, and any column whose name
/// contains `supersede`. A missing part-number column is a validation error;
/// missing optional columns default per row.
pub fn parse_catalog_csv(data: &[u8]) -> Result<Vec<CatalogRow>, ServiceError> {
    let mut reader = ReaderBuilder::new().flexible(true).from_reader(data);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(clean_header)
        .collect();

    let part_idx = headers.iter().position(|h| h == "part_number");
    let desc_idx = headers.iter().position(|h| h == "description");
    let stock_idx = headers.iter().position(|h| h == "stock");
    let price_idx = headers
        .iter()
        .position(|h| h == "price($)" || h == "price");
    let sup_idx = headers.iter().position(|h| h.contains("supersede"));

    let part_idx = part_idx.ok_or_else(|| {
        ServiceError::ValidationError(format!(
            "Missing required column: part_number. Found: {:?}",
            headers
        ))
    })?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let part_number = record.get(part_idx).unwrap_or("").trim().to_string();
        if part_number.is_empty() {
            continue;
        }

        let cell = |idx: Option<usize>| -> Option<String> {
            idx.and_then(|i| record.get(i))
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        rows.push(CatalogRow {
            part_number,
            description: cell(desc_idx),
            free_stock: cell(stock_idx)
                .and_then(|s| s.parse::<i64>().ok())
                .unwrap_or(0),
            price: cell(price_idx)
                .map(|s| parse_price(&s))
                .unwrap_or(Decimal::ZERO),
            superseded_by: cell(sup_idx),
        });
    }

    Ok(rows)
}

/// Parses a bulk enquiry/order CSV.
///
/// Requires a part-number-like column (name containing `part` or `number`)
/// and a quantity-like column (name containing `qty` or `quantity`). A serial
/// column named `s.no` (or an s-no-ish first column) is honored when present,
/// otherwise serial numbers are generated as a 1-based sequence. Problems are
/// collected and reported together as a single validation error.
pub fn parse_bulk_csv(data: &[u8]) -> Result<Vec<BulkRow>, ServiceError> {
    let mut reader = ReaderBuilder::new().flexible(true).from_reader(data);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(clean_header)
        .collect();

    let serial_idx = headers.iter().position(|h| h == "s.no").or_else(|| {
        headers
            .first()
            .filter(|h| h.contains('s') && h.contains("no"))
            .map(|_| 0)
    });

    let part_idx = headers
        .iter()
        .enumerate()
        .position(|(i, h)| Some(i) != serial_idx && (h.contains("part") || h.contains("number")));
    let qty_idx = headers
        .iter()
        .enumerate()
        .position(|(i, h)| Some(i) != serial_idx && (h.contains("qty") || h.contains("quantity")));

    // Last resort for the part column: any column that is neither the serial
    // nor the quantity column.
    let part_idx = part_idx.or_else(|| {
        (0..headers.len()).find(|i| Some(*i) != serial_idx && Some(*i) != qty_idx)
    });

    let (part_idx, qty_idx) = match (part_idx, qty_idx) {
        (Some(p), Some(q)) => (p, q),
        (p, q) => {
            let mut missing = Vec::new();
            if p.is_none() {
                missing.push("part_number");
            }
            if q.is_none() {
                missing.push("qty");
            }
            return Err(ServiceError::ValidationError(format!(
                "Missing required columns: {:?}. Found: {:?}",
                missing, headers
            )));
        }
    };

    let mut rows = Vec::new();
    let mut problems = Vec::new();

    for (line, record) in reader.records().enumerate() {
        let record = record?;
        let row_no = line + 1;

        let part_number = record.get(part_idx).unwrap_or("").trim().to_string();
        if part_number.is_empty() {
            problems.push(format!("row {}: missing part number", row_no));
            continue;
        }

        let qty_raw = record.get(qty_idx).unwrap_or("").trim();
        let requested_qty = match qty_raw.parse::<i64>() {
            Ok(q) if q >= 0 => q,
            _ => {
                problems.push(format!("row {}: unparseable quantity '{}'", row_no, qty_raw));
                continue;
            }
        };

        let serial_no = serial_idx
            .and_then(|i| record.get(i))
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| row_no.to_string());

        rows.push(BulkRow {
            serial_no,
            part_number,
            requested_qty,
        });
    }

    if !problems.is_empty() {
        return Err(ServiceError::ValidationError(problems.join("; ")));
    }

    Ok(rows)
}

/// Serializes the stock export for a stock type.
pub fn stock_csv(rows: &[StockExportRow]) -> Result<Vec<u8>, ServiceError> {
    let mut writer = WriterBuilder::new().from_writer(Vec::new());
    writer.write_record(["part_number", "description", "stock"])?;
    for row in rows {
        writer.write_record([
            row.part_number.as_str(),
            row.description.as_deref().unwrap_or(""),
            &row.stock.to_string(),
        ])?;
    }
    writer
        .into_inner()
        .map_err(|e| ServiceError::InternalError(format!("CSV write error: {}", e)))
}

/// Serializes one order's item rows.
pub fn order_csv(rows: &[OrderExportRow]) -> Result<Vec<u8>, ServiceError> {
    let mut writer = WriterBuilder::new().from_writer(Vec::new());
    writer.write_record([
        "part_number",
        "description",
        "price",
        "requested_qty",
        "allocated_qty",
        "available_qty",
        "supersedes",
    ])?;
    for row in rows {
        writer.write_record([
            row.part_number.as_str(),
            row.description.as_deref().unwrap_or(""),
            &row.price.to_string(),
            &row.requested_qty.to_string(),
            &row.allocated_qty.to_string(),
            &row.available_qty.to_string(),
            row.supersedes.as_deref().unwrap_or(""),
        ])?;
    }
    writer
        .into_inner()
        .map_err(|e| ServiceError::InternalError(format!("CSV write error: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn catalog_csv_maps_columns_and_cleans_prices() {
        let csv = b"Part_Number, Description ,Stock,Price($),Superseded By\n\
                    AB-01,Widget bracket,12,\"$1,250.50\",AB-02\n\
                    CD-77,,0,garbage,\n";
        let rows = parse_catalog_csv(csv).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].part_number, "AB-01");
        assert_eq!(rows[0].free_stock, 12);
        assert_eq!(rows[0].price, dec!(1250.50));
        assert_eq!(rows[0].superseded_by.as_deref(), Some("AB-02"));
        // Unparseable price coerces to zero rather than rejecting the file.
        assert_eq!(rows[1].price, Decimal::ZERO);
        assert_eq!(rows[1].description, None);
    }

    #[test]
    fn catalog_csv_requires_part_number_column() {
        let csv = b"description,stock\nfoo,1\n";
        let err = parse_catalog_csv(csv).unwrap_err();
        assert!(matches!(err, ServiceError::ValidationError(_)));
    }

    #[test]
    fn bulk_csv_fuzzy_headers_and_autogenerated_serials() {
        let csv = b"Part No,Quantity\nAB-01,5\nCD-77,2\n";
        let rows = parse_bulk_csv(csv).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].serial_no, "1");
        assert_eq!(rows[1].serial_no, "2");
        assert_eq!(rows[0].part_number, "AB-01");
        assert_eq!(rows[1].requested_qty, 2);
    }

    #[test]
    fn bulk_csv_honors_existing_serial_column() {
        let csv = b"S.No,part_number,qty\n10,AB-01,5\n20,CD-77,1\n";
        let rows = parse_bulk_csv(csv).unwrap();
        assert_eq!(rows[0].serial_no, "10");
        assert_eq!(rows[1].serial_no, "20");
    }

    #[test]
    fn bulk_csv_collects_problems() {
        let csv = b"part,qty\nAB-01,nope\n,4\n";
        let err = parse_bulk_csv(csv).unwrap_err();
        match err {
            ServiceError::ValidationError(msg) => {
                assert!(msg.contains("row 1"));
                assert!(msg.contains("row 2"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn bulk_csv_missing_columns_listed() {
        let csv = b"foo,bar\nx,y\n";
        let err = parse_bulk_csv(csv).unwrap_err();
        match err {
            ServiceError::ValidationError(msg) => assert!(msg.contains("qty")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn stock_csv_round_trips_triples() {
        let rows = vec![StockExportRow {
            part_number: "AB-01".into(),
            description: Some("Widget bracket".into()),
            stock: 12,
        }];
        let bytes = stock_csv(&rows).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.starts_with("part_number,description,stock"));
        assert!(text.contains("AB-01,Widget bracket,12"));
    }
}
