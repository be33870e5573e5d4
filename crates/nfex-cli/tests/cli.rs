//! Integration tests for the nfex binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;

const NS: &str = "http://www.portalfiscal.inf.br/nfe";

fn sale_xml(code: &str, name: &str, cfop: &str, quantity: &str, unit_price: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<nfeProc xmlns="{NS}" versao="4.00">
  <NFe><infNFe>
    <ide><dhEmi>2024-03-01T10:15:00-03:00</dhEmi></ide>
    <det nItem="1"><prod>
      <cProd>{code}</cProd>
      <xProd>{name}</xProd>
      <CFOP>{cfop}</CFOP>
      <qCom>{quantity}</qCom>
      <vUnCom>{unit_price}</vUnCom>
    </prod></det>
  </infNFe></NFe>
</nfeProc>"#
    )
}

#[test]
fn extract_outputs_json_records() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("nota.xml");
    fs::write(&file, sale_xml("P1", "Cafe torrado", "5102", "3.0000", "10.00")).unwrap();

    Command::cargo_bin("nfex")
        .unwrap()
        .arg("extract")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"product_code\": \"P1\""))
        .stdout(predicate::str::contains("Cafe torrado"));
}

#[test]
fn extract_fails_on_malformed_xml() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("broken.xml");
    fs::write(&file, "<nfeProc><NFe>").unwrap();

    Command::cargo_bin("nfex")
        .unwrap()
        .arg("extract")
        .arg(&file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("malformed"));
}

#[test]
fn analyze_reports_batch_outcome_and_top_products() {
    let dir = tempfile::tempdir().unwrap();
    let sales = dir.path().join("sales");
    fs::create_dir(&sales).unwrap();

    fs::write(
        sales.join("a.xml"),
        sale_xml("P1", "Cafe torrado", "5102", "8.0000", "10.00"),
    )
    .unwrap();
    fs::write(
        sales.join("b.xml"),
        sale_xml("P2", "Acucar cristal", "5405", "1.0000", "100.00"),
    )
    .unwrap();
    fs::write(sales.join("c.xml"), "<nfeProc><broken").unwrap();

    Command::cargo_bin("nfex")
        .unwrap()
        .arg("analyze")
        .arg("--sales-dir")
        .arg(&sales)
        .assert()
        .success()
        // 2 of 3 documents contributed, 1 failed.
        .stdout(predicate::str::contains("2").and(predicate::str::contains("3")))
        .stdout(predicate::str::contains("unprocessable: c.xml"))
        .stdout(predicate::str::contains("CFOP 5102: 1"))
        .stdout(predicate::str::contains("CFOP 5405 (ST): 1"))
        .stdout(predicate::str::contains("P1"))
        .stdout(predicate::str::contains("P2"));
}

#[test]
fn analyze_writes_reports_to_output_dir() {
    let dir = tempfile::tempdir().unwrap();
    let sales = dir.path().join("sales");
    let out = dir.path().join("out");
    fs::create_dir(&sales).unwrap();

    fs::write(
        sales.join("a.xml"),
        sale_xml("P1", "Cafe torrado", "5102", "3.0000", "10.00"),
    )
    .unwrap();

    Command::cargo_bin("nfex")
        .unwrap()
        .arg("analyze")
        .arg("--sales-dir")
        .arg(&sales)
        .arg("--output-dir")
        .arg(&out)
        .assert()
        .success();

    let items = fs::read_to_string(out.join("sale_items.csv")).unwrap();
    assert!(items.contains("P1"));
    assert!(items.contains("30.")); // line_total = 3 * 10

    let summary = fs::read_to_string(out.join("sale_summary.csv")).unwrap();
    assert!(summary.contains("qty_total_sold"));

    let report = fs::read_to_string(out.join("report.json")).unwrap();
    assert!(report.contains("\"total_discovered\": 1"));
}

#[test]
fn analyze_warns_on_missing_directory() {
    let dir = tempfile::tempdir().unwrap();
    let sales = dir.path().join("sales");
    fs::create_dir(&sales).unwrap();
    fs::write(
        sales.join("a.xml"),
        sale_xml("P1", "Cafe torrado", "5102", "1.0000", "1.00"),
    )
    .unwrap();

    // One missing directory is a warning, not an abort.
    Command::cargo_bin("nfex")
        .unwrap()
        .arg("analyze")
        .arg("--sales-dir")
        .arg(&sales)
        .arg("--purchases-dir")
        .arg(dir.path().join("nowhere"))
        .assert()
        .success()
        .stderr(predicate::str::contains("purchase directory not found"));
}

#[test]
fn analyze_requires_at_least_one_directory() {
    Command::cargo_bin("nfex")
        .unwrap()
        .arg("analyze")
        .assert()
        .failure()
        .stderr(predicate::str::contains("at least one"));
}
