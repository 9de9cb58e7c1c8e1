//! Shared NF-e fixtures for integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::Path;

pub const ISSUER_CNPJ: &str = "11222333000181";

/// Access key for `number` with a valid mod-11 check digit.
pub fn access_key(number: u32) -> String {
    let base = format!("352401{}55001{:09}112345678", ISSUER_CNPJ, number);
    let sum: u32 = base
        .chars()
        .rev()
        .filter_map(|c| c.to_digit(10))
        .zip((2..=9).cycle())
        .map(|(d, w)| d * w)
        .sum();
    let digit = match sum % 11 {
        0 | 1 => 0,
        r => 11 - r,
    };
    format!("{}{}", base, digit)
}

/// A complete NF-e. `grand_total: None` leaves `vNF` out.
pub fn nfe_xml(number: u32, operation: u8, grand_total: Option<&str>) -> String {
    let key = access_key(number);
    let vnf = grand_total
        .map(|v| format!("<vNF>{}</vNF>", v))
        .unwrap_or_default();

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<nfeProc xmlns="http://www.portalfiscal.inf.br/nfe" versao="4.00">
  <NFe>
    <infNFe versao="4.00" Id="NFe{key}">
      <ide>
        <cUF>35</cUF>
        <natOp>Venda de mercadoria</natOp>
        <serie>1</serie>
        <nNF>{number}</nNF>
        <dhEmi>2024-01-{day:02}T09:15:00-03:00</dhEmi>
        <tpNF>{operation}</tpNF>
      </ide>
      <emit>
        <CNPJ>{ISSUER_CNPJ}</CNPJ>
        <xNome>ACME COMERCIO LTDA</xNome>
      </emit>
      <dest>
        <CPF>52998224725</CPF>
        <xNome>Maria da Silva</xNome>
      </dest>
      <det nItem="1"><prod><cProd>A1</cProd></prod></det>
      <total>
        <ICMSTot>
          <vICMS>18.00</vICMS>
          <vProd>100.00</vProd>
          {vnf}
        </ICMSTot>
      </total>
    </infNFe>
  </NFe>
  <protNFe versao="4.00"><infProt><chNFe>{key}</chNFe><cStat>100</cStat></infProt></protNFe>
</nfeProc>
"#,
        day = number % 28 + 1,
    )
}

pub fn write(dir: &Path, name: &str, content: &str) {
    fs::write(dir.join(name), content).unwrap();
}
