use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn nfe_xml(number: u32, operation: u8, grand_total: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<nfeProc xmlns="http://www.portalfiscal.inf.br/nfe" versao="4.00">
  <NFe>
    <infNFe versao="4.00" Id="NFe35240111222333000181550010000000011123456788">
      <ide>
        <natOp>Venda de mercadoria</natOp>
        <serie>1</serie>
        <nNF>{number}</nNF>
        <dhEmi>2024-01-15T10:30:00-03:00</dhEmi>
        <tpNF>{operation}</tpNF>
      </ide>
      <emit><CNPJ>11222333000181</CNPJ><xNome>ACME COMERCIO LTDA</xNome></emit>
      <dest><CNPJ>11444777000161</CNPJ><xNome>CLIENTE EXEMPLO SA</xNome></dest>
      <det nItem="1"/>
      <total><ICMSTot><vICMS>0.00</vICMS><vProd>{grand_total}</vProd><vNF>{grand_total}</vNF></ICMSTot></total>
    </infNFe>
  </NFe>
</nfeProc>
"#
    )
}

/// Command isolated from any user configuration file.
fn nfe(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("nfe").unwrap();
    cmd.env("XDG_CONFIG_HOME", home.path()).env("HOME", home.path());
    cmd
}

fn batch_dir() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("1.xml"), nfe_xml(1, 1, "975.00")).unwrap();
    fs::write(dir.path().join("2.xml"), nfe_xml(2, 0, "1234.50")).unwrap();
    fs::write(dir.path().join("3.xml"), "<nfeProc><NFe>").unwrap();
    dir
}

fn write_file(dir: &Path, name: &str, content: &str) -> String {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path.display().to_string()
}

#[test]
fn test_process_prints_record() {
    let home = tempfile::tempdir().unwrap();
    let file = write_file(home.path(), "nota.xml", &nfe_xml(7, 1, "975.00"));

    nfe(&home)
        .args(["process", &file])
        .assert()
        .success()
        .stdout(predicate::str::contains("NF-e: 7 (series 1)"))
        .stdout(predicate::str::contains("R$ 975,00"))
        .stdout(predicate::str::contains("11.222.333/0001-81"));
}

#[test]
fn test_process_json() {
    let home = tempfile::tempdir().unwrap();
    let file = write_file(home.path(), "nota.xml", &nfe_xml(7, 0, "10.00"));

    let output = nfe(&home)
        .args(["process", &file, "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["header"]["invoice_number"], "7");
    assert_eq!(json["header"]["operation_type"], "Entrada");
    assert_eq!(json["totals"]["grand_total"], "10.00");
}

#[test]
fn test_process_reports_failure() {
    let home = tempfile::tempdir().unwrap();
    let file = write_file(home.path(), "bad.xml", "<nfeProc>");

    nfe(&home)
        .args(["process", &file])
        .assert()
        .failure()
        .stderr(predicate::str::contains("malformed-structure"));
}

#[test]
fn test_batch_summary() {
    let home = tempfile::tempdir().unwrap();
    let dir = batch_dir();

    nfe(&home)
        .arg("batch")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Processed 3 files"))
        .stdout(predicate::str::contains("2 parsed, 1 failed"))
        .stdout(predicate::str::contains("3.xml: malformed-structure"));
}

#[test]
fn test_batch_json_with_filter() {
    let home = tempfile::tempdir().unwrap();
    let dir = batch_dir();

    let output = nfe(&home)
        .arg("batch")
        .arg(dir.path())
        .args(["--format", "json", "--operation-type", "entrada", "--stats"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["counts"]["parsed"], 2);
    assert_eq!(json["records"].as_array().unwrap().len(), 1);
    assert_eq!(json["records"][0]["invoice_number"], "2");
    assert_eq!(json["records"][0]["operation_type"], "Entrada");
    assert_eq!(json["statistics"]["count"], 1);
    assert_eq!(json["failures"][0]["kind"], "malformed-structure");
}

#[test]
fn test_batch_json_honors_columns() {
    let home = tempfile::tempdir().unwrap();
    let dir = batch_dir();

    let output = nfe(&home)
        .arg("batch")
        .arg(dir.path())
        .args(["--format", "json", "--columns", "invoice_number,grand_total"])
        .args(["--sort-by", "invoice_number"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(
        json["records"],
        serde_json::json!([
            {"invoice_number": "1", "grand_total": "975.00"},
            {"invoice_number": "2", "grand_total": "1234.50"},
        ])
    );
}

#[test]
fn test_batch_csv_export() {
    let home = tempfile::tempdir().unwrap();
    let dir = batch_dir();
    let out = tempfile::tempdir().unwrap();
    let csv = out.path().join("notas.csv");

    nfe(&home)
        .arg("batch")
        .arg(dir.path())
        .args(["--columns", "invoice_number,grand_total", "--sort-by", "grand_total"])
        .arg("--csv")
        .arg(&csv)
        .assert()
        .success();

    let content = fs::read_to_string(&csv).unwrap();
    assert_eq!(
        content,
        "\u{feff}invoice_number,grand_total\n1,975.00\n2,1234.50\n"
    );
}

#[test]
fn test_batch_export_dir() {
    let home = tempfile::tempdir().unwrap();
    let dir = batch_dir();
    let out = tempfile::tempdir().unwrap();

    nfe(&home)
        .arg("batch")
        .arg(dir.path())
        .arg("--export-dir")
        .arg(out.path())
        .assert()
        .success();

    let mut names: Vec<String> = fs::read_dir(out.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    assert_eq!(names.len(), 2);
    assert!(names[0].starts_with("notas_fiscais_") && names[0].ends_with(".csv"));
    assert!(names[1].ends_with(".xls"));
}

#[test]
fn test_batch_empty_directory() {
    let home = tempfile::tempdir().unwrap();
    let dir = tempfile::tempdir().unwrap();

    nfe(&home)
        .arg("batch")
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("no .xml documents found"));
}

#[test]
fn test_batch_missing_directory() {
    let home = tempfile::tempdir().unwrap();

    nfe(&home)
        .args(["batch", "/definitely/not/here"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("directory not found"));
}

#[test]
fn test_config_init_get_set() {
    let home = tempfile::tempdir().unwrap();
    let config = home.path().join("nfe.json").display().to_string();

    nfe(&home)
        .args(["config", "init", "--config", &config])
        .assert()
        .success();

    nfe(&home)
        .args(["config", "get", "batch.recursive", "--config", &config])
        .assert()
        .success()
        .stdout(predicate::str::contains("false"));

    nfe(&home)
        .args(["config", "set", "batch.recursive", "true", "--config", &config])
        .assert()
        .success();

    nfe(&home)
        .args(["config", "get", "batch.recursive", "--config", &config])
        .assert()
        .success()
        .stdout(predicate::str::contains("true"));

    nfe(&home)
        .args(["config", "set", "batch.unknown", "1", "--config", &config])
        .assert()
        .failure();
}
