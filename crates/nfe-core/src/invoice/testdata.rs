//! NF-e document builder for unit tests.

use std::collections::HashMap;

use crate::models::invoice::Field;

pub const ISSUER_CNPJ: &str = "11222333000181";
pub const RECIPIENT_CNPJ: &str = "11444777000161";
pub const RECIPIENT_CPF: &str = "52998224725";

/// Valid keys for invoice numbers 1 to 4 issued by [`ISSUER_CNPJ`].
pub const ACCESS_KEYS: [&str; 4] = [
    "35240111222333000181550010000000011123456788",
    "35240111222333000181550010000000021123456785",
    "35240111222333000181550010000000031123456782",
    "35240111222333000181550010000000041123456780",
];

pub struct NfeBuilder {
    values: HashMap<Field, String>,
    namespace: bool,
    prefix: Option<String>,
    items: usize,
    date_element: &'static str,
    recipient_element: &'static str,
}

impl NfeBuilder {
    pub fn new() -> Self {
        let values = [
            (Field::InvoiceNumber, "1"),
            (Field::Series, "1"),
            (Field::IssueDate, "2024-01-15T10:30:00-03:00"),
            (Field::AccessKey, ACCESS_KEYS[0]),
            (Field::OperationNature, "Venda de mercadoria"),
            (Field::OperationType, "1"),
            (Field::IssuerCnpj, ISSUER_CNPJ),
            (Field::IssuerName, "ACME COMERCIO LTDA"),
            (Field::IssuerTradeName, "ACME"),
            (Field::RecipientTaxId, RECIPIENT_CNPJ),
            (Field::RecipientName, "CLIENTE EXEMPLO SA"),
            (Field::ProductsTotal, "1000.00"),
            (Field::Discount, "50.00"),
            (Field::Freight, "25.00"),
            (Field::GrandTotal, "975.00"),
            (Field::Icms, "180.00"),
            (Field::Ipi, "0.00"),
        ]
        .into_iter()
        .map(|(field, value)| (field, value.to_string()))
        .collect();

        Self {
            values,
            namespace: true,
            prefix: None,
            items: 2,
            date_element: "dhEmi",
            recipient_element: "CNPJ",
        }
    }

    pub fn set(mut self, field: Field, value: &str) -> Self {
        self.values.insert(field, value.to_string());
        self
    }

    pub fn without(mut self, field: Field) -> Self {
        self.values.remove(&field);
        self
    }

    pub fn without_namespace(mut self) -> Self {
        self.namespace = false;
        self
    }

    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.prefix = Some(prefix.to_string());
        self
    }

    pub fn items(mut self, items: usize) -> Self {
        self.items = items;
        self
    }

    pub fn legacy_date(mut self, date: &str) -> Self {
        self.date_element = "dEmi";
        self.set(Field::IssueDate, date)
    }

    pub fn recipient_cpf(mut self, cpf: &str) -> Self {
        self.recipient_element = "CPF";
        self.set(Field::RecipientTaxId, cpf)
    }

    fn tag(&self, name: &str) -> String {
        match &self.prefix {
            Some(prefix) => format!("{}:{}", prefix, name),
            None => name.to_string(),
        }
    }

    fn element(&self, name: &str, field: Field) -> String {
        match self.values.get(&field) {
            Some(value) => {
                let tag = self.tag(name);
                format!("<{tag}>{value}</{tag}>")
            }
            None => String::new(),
        }
    }

    fn wrap(&self, name: &str, attributes: &str, body: &str) -> String {
        let tag = self.tag(name);
        format!("<{tag}{attributes}>{body}</{tag}>")
    }

    pub fn build(&self) -> String {
        let ns = match (&self.prefix, self.namespace) {
            (_, false) => String::new(),
            (Some(prefix), true) => {
                format!(r#" xmlns:{}="http://www.portalfiscal.inf.br/nfe""#, prefix)
            }
            (None, true) => r#" xmlns="http://www.portalfiscal.inf.br/nfe""#.to_string(),
        };

        let key = self.values.get(&Field::AccessKey);
        let id = key
            .map(|k| format!(r#" versao="4.00" Id="NFe{}""#, k))
            .unwrap_or_else(|| r#" versao="4.00""#.to_string());

        let ide = self.wrap(
            "ide",
            "",
            &[
                format!("<{0}>35</{0}>", self.tag("cUF")),
                self.element("natOp", Field::OperationNature),
                self.element("serie", Field::Series),
                self.element("nNF", Field::InvoiceNumber),
                self.element(self.date_element, Field::IssueDate),
                self.element("tpNF", Field::OperationType),
            ]
            .concat(),
        );

        let emit = self.wrap(
            "emit",
            "",
            &[
                self.element("CNPJ", Field::IssuerCnpj),
                self.element("xNome", Field::IssuerName),
                self.element("xFant", Field::IssuerTradeName),
                self.wrap("enderEmit", "", &format!("<{0}>SP</{0}>", self.tag("UF"))),
            ]
            .concat(),
        );

        let dest = self.wrap(
            "dest",
            "",
            &[
                self.element(self.recipient_element, Field::RecipientTaxId),
                self.element("xNome", Field::RecipientName),
            ]
            .concat(),
        );

        let det: String = (1..=self.items)
            .map(|n| {
                let prod = self.wrap(
                    "prod",
                    "",
                    &format!("<{0}>{1}</{0}>", self.tag("cProd"), n),
                );
                self.wrap("det", &format!(r#" nItem="{}""#, n), &prod)
            })
            .collect();

        let totals = self.wrap(
            "total",
            "",
            &self.wrap(
                "ICMSTot",
                "",
                &[
                    self.element("vICMS", Field::Icms),
                    self.element("vProd", Field::ProductsTotal),
                    self.element("vFrete", Field::Freight),
                    self.element("vDesc", Field::Discount),
                    self.element("vIPI", Field::Ipi),
                    self.element("vNF", Field::GrandTotal),
                ]
                .concat(),
            ),
        );

        let inf = self.wrap("infNFe", &id, &[ide, emit, dest, det, totals].concat());
        let nfe = self.wrap("NFe", "", &inf);
        let prot = match key {
            Some(_) => self.wrap(
                "protNFe",
                r#" versao="4.00""#,
                &self.wrap(
                    "infProt",
                    "",
                    &[
                        self.element("chNFe", Field::AccessKey),
                        format!("<{0}>100</{0}>", self.tag("cStat")),
                    ]
                    .concat(),
                ),
            ),
            None => String::new(),
        };

        format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{}",
            self.wrap("nfeProc", &format!("{} versao=\"4.00\"", ns), &[nfe, prot].concat())
        )
    }
}
