//! Declarative field table and the generic resolver that evaluates it.
//!
//! Every business field is one [`FieldPath`] row. Adding a field means adding
//! a row here and a column to [`Field`].

use crate::models::invoice::Field;

use super::rules::{ValueKind, CNPJ_LEN, CPF_LEN};
use super::xml::{Element, NsMatch};

/// Element a location is relative to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// The `infNFe` element.
    Invoice,
    /// The document root (`nfeProc` or `NFe`).
    Document,
}

/// One place a field may live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub scope: Scope,
    /// Element names, each searched among descendants of the previous one.
    pub path: &'static [&'static str],
    /// Read this attribute of the final element instead of its text.
    pub attribute: Option<&'static str>,
}

impl Location {
    const fn element(path: &'static [&'static str]) -> Self {
        Self {
            scope: Scope::Invoice,
            path,
            attribute: None,
        }
    }

    const fn attribute(path: &'static [&'static str], name: &'static str) -> Self {
        Self {
            scope: Scope::Invoice,
            path,
            attribute: Some(name),
        }
    }

    const fn document(path: &'static [&'static str]) -> Self {
        Self {
            scope: Scope::Document,
            path,
            attribute: None,
        }
    }
}

/// Whether absence fails the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Mandatory,
    /// Absent values become [`ValueKind::default_value`].
    Optional,
}

/// Lookup rule for one business field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldPath {
    pub field: Field,
    /// Alternatives, first match wins.
    pub locations: &'static [Location],
    pub kind: ValueKind,
    pub presence: Presence,
}

const fn mandatory(field: Field, locations: &'static [Location], kind: ValueKind) -> FieldPath {
    FieldPath {
        field,
        locations,
        kind,
        presence: Presence::Mandatory,
    }
}

const fn optional(field: Field, locations: &'static [Location], kind: ValueKind) -> FieldPath {
    FieldPath {
        field,
        locations,
        kind,
        presence: Presence::Optional,
    }
}

/// Element holding the invoice information block.
pub const INVOICE_ELEMENT: &str = "infNFe";

/// Product line element, counted for [`Field::ItemCount`].
pub const ITEM_ELEMENT: &str = "det";

/// Where every resolved field lives. `ItemCount` is derived, not looked up.
pub static FIELD_PATHS: &[FieldPath] = &[
    mandatory(
        Field::InvoiceNumber,
        &[Location::element(&["ide", "nNF"])],
        ValueKind::Text,
    ),
    mandatory(
        Field::Series,
        &[Location::element(&["ide", "serie"])],
        ValueKind::Text,
    ),
    mandatory(
        Field::IssueDate,
        &[
            Location::element(&["ide", "dhEmi"]),
            Location::element(&["ide", "dEmi"]),
        ],
        ValueKind::Date,
    ),
    mandatory(
        Field::AccessKey,
        &[
            Location::attribute(&[], "Id"),
            Location::document(&["protNFe", "infProt", "chNFe"]),
        ],
        ValueKind::AccessKey,
    ),
    mandatory(
        Field::OperationNature,
        &[Location::element(&["ide", "natOp"])],
        ValueKind::Text,
    ),
    mandatory(
        Field::OperationType,
        &[Location::element(&["ide", "tpNF"])],
        ValueKind::OperationType,
    ),
    mandatory(
        Field::IssuerCnpj,
        &[Location::element(&["emit", "CNPJ"])],
        ValueKind::TaxId(&[CNPJ_LEN]),
    ),
    mandatory(
        Field::IssuerName,
        &[Location::element(&["emit", "xNome"])],
        ValueKind::Text,
    ),
    optional(
        Field::IssuerTradeName,
        &[Location::element(&["emit", "xFant"])],
        ValueKind::Text,
    ),
    mandatory(
        Field::RecipientTaxId,
        &[
            Location::element(&["dest", "CNPJ"]),
            Location::element(&["dest", "CPF"]),
        ],
        ValueKind::TaxId(&[CNPJ_LEN, CPF_LEN]),
    ),
    mandatory(
        Field::RecipientName,
        &[Location::element(&["dest", "xNome"])],
        ValueKind::Text,
    ),
    mandatory(
        Field::ProductsTotal,
        &[Location::element(&["total", "vProd"])],
        ValueKind::Amount,
    ),
    optional(
        Field::Discount,
        &[Location::element(&["total", "vDesc"])],
        ValueKind::Amount,
    ),
    optional(
        Field::Freight,
        &[Location::element(&["total", "vFrete"])],
        ValueKind::Amount,
    ),
    mandatory(
        Field::GrandTotal,
        &[Location::element(&["total", "vNF"])],
        ValueKind::Amount,
    ),
    mandatory(
        Field::Icms,
        &[Location::element(&["total", "vICMS"])],
        ValueKind::Amount,
    ),
    optional(
        Field::Ipi,
        &[Location::element(&["total", "vIPI"])],
        ValueKind::Amount,
    ),
];

/// Evaluates [`Location`]s against one parsed document.
pub struct Resolver<'a> {
    document: &'a Element,
    invoice: &'a Element,
    namespaces: &'a [String],
}

impl<'a> Resolver<'a> {
    /// Locate the invoice block, trying each namespace and then none.
    pub fn new(document: &'a Element, namespaces: &'a [String]) -> Option<Self> {
        let invoice = Self::lookup(namespaces, |ns| {
            document.find_self_or_descendant(INVOICE_ELEMENT, ns)
        })?;

        Some(Self {
            document,
            invoice,
            namespaces,
        })
    }

    fn lookup<T>(namespaces: &'a [String], find: impl Fn(NsMatch<'a>) -> Option<T>) -> Option<T> {
        namespaces
            .iter()
            .find_map(|uri| find(NsMatch::Exact(uri)))
            .or_else(|| find(NsMatch::Any))
    }

    /// Raw text of the first location that yields a non-blank value.
    pub fn resolve(&self, rule: &FieldPath) -> Option<&'a str> {
        rule.locations.iter().find_map(|location| self.resolve_location(location))
    }

    fn resolve_location(&self, location: &Location) -> Option<&'a str> {
        let base = match location.scope {
            Scope::Invoice => self.invoice,
            Scope::Document => self.document,
        };

        let element = Self::lookup(self.namespaces, |ns| base.find_path(location.path, ns))?;

        match location.attribute {
            Some(name) => element.attribute(name).map(str::trim).filter(|v| !v.is_empty()),
            None => element.text(),
        }
    }

    /// Number of direct `det` children of the invoice block.
    pub fn count_items(&self) -> u32 {
        let count = Self::lookup(self.namespaces, |ns| {
            let n = self.invoice.children_named(ITEM_ELEMENT, ns).count();
            (n > 0).then_some(n)
        })
        .unwrap_or(0);

        u32::try_from(count).unwrap_or(u32::MAX)
    }
}
