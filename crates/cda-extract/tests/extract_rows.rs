//! Integration tests for extraction over realistic export rows.
//!
//! Run with: cargo test -p cda-extract --test extract_rows

use cda_extract::{decode_input, DecodeError, ExtractionError, RecordExtractor};
use cda_types::Transaction;

const HEADER: &str = r#""app","ts","event","project_id","source","ident","user_id","session_id","country","device_type","device_os","device_os_ver","device_browser","device_browser_ver","props","nums""#;

const SAMPLE_ROW: &str = r#""seq-market","2024-04-15 02:15:07.167","BUY_ITEMS","4974","","1","0896ae95dcaeee38e83fa5c43bef99780d7b2be23bcab36214","5d8afd8fec2fbf3e","DE","desktop","linux","x86_64","chrome","122.0.0.0","{""tokenId"":""215"",""txnHash"":""0xd919290e80df271e77d1cbca61f350d2727531e0334266671ec20d626b2104a2"",""chainId"":""137"",""collectionAddress"":""0x22d5f9b75c524fec1d6619787e582644cd4d7422"",""currencyAddress"":""0xd1f9c58e33933a993a3891f8acfe05a68e1afc05"",""currencySymbol"":""SFL"",""marketplaceType"":""amm"",""requestId"":""""}","{""currencyValueDecimal"":""0.6136203411678249"",""currencyValueRaw"":""613620341167824900""}""#;

/// Build a row in the export layout for a given project, symbol and value.
fn make_row(ts: &str, project_id: &str, symbol: &str, value: &str) -> String {
    format!(
        r#""seq-market","{ts}","BUY_ITEMS","{project_id}","","1","user","session","DE","desktop","linux","x86_64","chrome","122.0.0.0","{{""currencySymbol"":""{symbol}"",""marketplaceType"":""amm""}}","{{""currencyValueDecimal"":""{value}""}}""#
    )
}

fn make_input(rows: &[String]) -> Vec<u8> {
    let mut text = String::from(HEADER);
    for row in rows {
        text.push('\n');
        text.push_str(row);
    }
    text.into_bytes()
}

fn sorted(mut transactions: Vec<Transaction>) -> Vec<Transaction> {
    transactions.sort_by(|a, b| {
        a.project_id
            .cmp(&b.project_id)
            .then(a.timestamp.cmp(&b.timestamp))
    });
    transactions
}

#[test]
fn test_extract_sample_row() {
    let input = make_input(&[SAMPLE_ROW.to_string()]);
    let extractor = RecordExtractor::new(1).unwrap();

    let transactions = extractor.extract(&input).unwrap();

    assert_eq!(transactions.len(), 1);
    assert_eq!(
        transactions[0],
        Transaction {
            timestamp: "2024-04-15 02:15:07.167".to_string(),
            event: "BUY_ITEMS".to_string(),
            project_id: "4974".to_string(),
            currency_symbol: "SFL".to_string(),
            currency_value: 0.6136203411678249,
        }
    );
}

#[test]
fn test_one_transaction_per_row() {
    let rows: Vec<String> = (0..200)
        .map(|i| make_row("2024-04-15 02:15:07.167", &i.to_string(), "SFL", &format!("{}.25", i)))
        .collect();
    let input = make_input(&rows);

    let transactions = RecordExtractor::new(8).unwrap().extract(&input).unwrap();
    assert_eq!(transactions.len(), 200);

    for tx in &transactions {
        let project: f64 = tx.project_id.parse().unwrap();
        assert_eq!(tx.currency_value, project + 0.25);
        assert_eq!(tx.currency_symbol, "SFL");
    }
}

#[test]
fn test_result_independent_of_worker_count() {
    let rows: Vec<String> = (0..25)
        .map(|i| {
            make_row(
                &format!("2024-04-{:02} 10:00:00", i % 28 + 1),
                &format!("{:03}", i),
                if i % 2 == 0 { "SFL" } else { "ETH" },
                &format!("{}", i as f64 * 1.5),
            )
        })
        .collect();
    let input = make_input(&rows);

    let baseline = sorted(RecordExtractor::new(1).unwrap().extract(&input).unwrap());
    for workers in 2..=rows.len() {
        let result = sorted(RecordExtractor::new(workers).unwrap().extract(&input).unwrap());
        assert_eq!(result, baseline, "differs with {} workers", workers);
    }
}

#[test]
fn test_single_bad_row_fails_everything() {
    let mut rows: Vec<String> = (0..50)
        .map(|i| make_row("2024-04-15 02:15:07.167", &i.to_string(), "SFL", "1.0"))
        .collect();
    rows[37] = make_row("2024-04-15 02:15:07.167", "37", "SFL", "not-a-number");
    let input = make_input(&rows);

    let result = RecordExtractor::new(4).unwrap().extract(&input);

    match result {
        Err(ExtractionError::Rows { failures, total }) => {
            assert_eq!(total, 50);
            assert_eq!(failures.len(), 1);
            // Header is line 1, so row index 37 sits on line 39.
            assert_eq!(failures[0].line, 39);
            assert!(matches!(
                failures[0].error,
                DecodeError::InvalidValue { ref value, .. } if value == "not-a-number"
            ));
        }
        other => panic!("expected row failures, got {:?}", other),
    }
}

#[test]
fn test_every_bad_row_is_listed() {
    let rows: Vec<String> = (0..10)
        .map(|i| {
            let value = if i % 3 == 0 { "bad" } else { "2.0" };
            make_row("2024-04-15 02:15:07.167", &i.to_string(), "SFL", value)
        })
        .collect();
    let input = make_input(&rows);

    match RecordExtractor::new(3).unwrap().extract(&input) {
        Err(ExtractionError::Rows { failures, .. }) => {
            let lines: Vec<u64> = failures.iter().map(|f| f.line).collect();
            assert_eq!(lines, vec![2, 5, 8, 11]);
        }
        other => panic!("expected row failures, got {:?}", other),
    }
}

#[test]
fn test_compressed_export() {
    use std::io::Write;

    let input = make_input(&[SAMPLE_ROW.to_string()]);
    let mut encoder = lz4_flex::frame::FrameEncoder::new(Vec::new());
    encoder.write_all(&input).unwrap();
    let compressed = encoder.finish().unwrap();

    let decoded = decode_input(&compressed).unwrap();
    let transactions = RecordExtractor::new(2).unwrap().extract(&decoded).unwrap();

    assert_eq!(transactions.len(), 1);
    assert_eq!(transactions[0].project_id, "4974");
}
