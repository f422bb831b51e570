use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

use crate::error::Error;

/// Ceiling for any single derived line amount.
pub const LINE_AMOUNT_CEILING: Decimal = dec!(999_999_999.99);
/// Ceiling for the grand total (10× the line ceiling).
pub const TOTAL_CEILING: Decimal = dec!(9_999_999_999.90);

const MAX_QUANTITY: u32 = 99_999;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DocumentKind {
    Invoice,
    Report,
}

impl DocumentKind {
    /// Slug used in output file names.
    pub fn slug(self) -> &'static str {
        match self {
            DocumentKind::Invoice => "facture",
            DocumentKind::Report => "rapport",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            DocumentKind::Invoice => "FACTURE",
            DocumentKind::Report => "RAPPORT DE FACTURATION",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Status {
    Draft,
    Sent,
    Paid,
    Cancelled,
    /// Anything the backend sends that we don't know; rendered neutrally.
    Other(String),
}

impl Status {
    pub fn parse(raw: &str) -> Status {
        match raw.trim().to_ascii_lowercase().as_str() {
            "draft" | "brouillon" => Status::Draft,
            "sent" | "envoyee" | "envoyée" => Status::Sent,
            "paid" | "payee" | "payée" => Status::Paid,
            "cancelled" | "canceled" | "annulee" | "annulée" => Status::Cancelled,
            _ => Status::Other(raw.trim().to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Status::Draft => "Brouillon",
            Status::Sent => "Envoyée",
            Status::Paid => "Payée",
            Status::Cancelled => "Annulée",
            Status::Other(raw) => raw,
        }
    }
}

/// Counterpart identity as printed on the document.
#[derive(Clone, Debug)]
pub struct Party {
    pub name: String,
    pub tax_id: Option<String>,
    pub address: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Totals {
    pub total_excl_tax: Decimal,
    pub total_tax: Decimal,
    pub total_incl_tax: Decimal,
}

/// One raw record surviving the caller's filters, before derivation.
#[derive(Clone, Debug)]
pub struct RawLine {
    pub reference: String,
    pub date: NaiveDate,
    pub description: String,
    /// Counterpart name for this row (None when fixed at document level).
    pub counterpart: Option<String>,
    /// Issuing-entity id for this row.
    pub issuer: Option<String>,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub tax_rate_percent: Decimal,
    pub status: Status,
}

/// A billable row with its derived amounts, invariant after build.
#[derive(Clone, Debug)]
pub struct LineItem {
    pub reference: String,
    pub date: NaiveDate,
    pub description: String,
    pub counterpart: Option<String>,
    pub issuer: Option<String>,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub tax_rate_percent: Decimal,
    pub amount_excl_tax: Decimal,
    pub amount_tax: Decimal,
    pub amount_incl_tax: Decimal,
    pub status: Status,
}

/// Filters that were active when the record set was produced. Only used to
/// pin context homogeneity and to describe the selection in the info block.
#[derive(Clone, Debug, Default)]
pub struct Filters {
    pub counterpart: Option<String>,
    pub issuer: Option<String>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub status: Option<Status>,
}

/// Elision context for one elidable column.
///
/// `uniform` means the column is dropped from the table; `value` is the
/// single known value, printed once in the document-level info block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColumnContext {
    pub uniform: bool,
    pub value: Option<String>,
}

#[derive(Clone, Debug)]
pub struct Homogeneity {
    pub counterpart: ColumnContext,
    pub issuer: ColumnContext,
}

/// The resolved financial document. Immutable once handed to the renderer.
#[derive(Clone, Debug)]
pub struct Document {
    pub kind: DocumentKind,
    pub identifier: String,
    /// Free text identifying the issuing entity in the page header.
    pub header_text: String,
    pub counterpart: Option<Party>,
    pub issue_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub status: Status,
    pub lines: Vec<LineItem>,
    pub totals: Totals,
    pub notes: Option<String>,
    pub filters: Filters,
    pub homogeneity: Homogeneity,
}

/// Raw material for `build_document`.
#[derive(Clone, Debug)]
pub struct DocumentInput {
    pub kind: DocumentKind,
    pub identifier: String,
    pub header_text: String,
    pub counterpart: Option<Party>,
    pub issue_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub status: Status,
    pub lines: Vec<RawLine>,
    /// Document-level stored totals, cross-checked against the line sums.
    pub stored_totals: Option<Totals>,
    pub notes: Option<String>,
    pub filters: Filters,
}

/// Issuing-entity lookup entry: display name, logo and footer contact lines.
#[derive(Clone, Debug)]
pub struct IssuerProfile {
    pub display_name: String,
    pub logo_path: Option<PathBuf>,
    pub contact_lines: Vec<String>,
}

pub type IssuerDirectory = HashMap<String, IssuerProfile>;

fn round_money(v: Decimal) -> Decimal {
    v.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

fn derive_line(raw: RawLine) -> Result<LineItem, Error> {
    if raw.quantity == 0 || raw.quantity > MAX_QUANTITY {
        return Err(Error::InvalidQuantity {
            reference: raw.reference,
            quantity: raw.quantity,
        });
    }
    if raw.unit_price < Decimal::ZERO || raw.unit_price > LINE_AMOUNT_CEILING {
        return Err(Error::InvalidUnitPrice {
            reference: raw.reference,
            unit_price: raw.unit_price,
        });
    }
    if raw.tax_rate_percent < Decimal::ZERO || raw.tax_rate_percent > dec!(100) {
        return Err(Error::InvalidTaxRate {
            reference: raw.reference,
            tax_rate: raw.tax_rate_percent,
        });
    }

    let amount_excl_tax = round_money(Decimal::from(raw.quantity) * raw.unit_price);
    let amount_tax = round_money(amount_excl_tax * raw.tax_rate_percent / dec!(100));
    let amount_incl_tax = amount_excl_tax + amount_tax;

    for amount in [amount_excl_tax, amount_tax, amount_incl_tax] {
        if amount > LINE_AMOUNT_CEILING {
            return Err(Error::LineAmountCeiling {
                reference: raw.reference,
                amount,
            });
        }
    }

    Ok(LineItem {
        reference: raw.reference,
        date: raw.date,
        description: raw.description,
        counterpart: raw.counterpart,
        issuer: raw.issuer,
        quantity: raw.quantity,
        unit_price: raw.unit_price,
        tax_rate_percent: raw.tax_rate_percent,
        amount_excl_tax,
        amount_tax,
        amount_incl_tax,
        status: raw.status,
    })
}

fn column_context<'a>(
    pinned: Option<&str>,
    values: impl Iterator<Item = Option<&'a str>>,
) -> ColumnContext {
    if let Some(p) = pinned {
        return ColumnContext {
            uniform: true,
            value: Some(p.to_string()),
        };
    }
    let mut distinct: BTreeSet<&str> = BTreeSet::new();
    let mut any_missing = false;
    for v in values {
        match v {
            Some(v) => {
                distinct.insert(v);
            }
            None => any_missing = true,
        }
    }
    match distinct.len() {
        // No row carries the value at all: nothing to put in the column.
        0 => ColumnContext {
            uniform: true,
            value: None,
        },
        1 if !any_missing => ColumnContext {
            uniform: true,
            value: distinct.first().map(|v| v.to_string()),
        },
        _ => ColumnContext {
            uniform: false,
            value: None,
        },
    }
}

/// Assemble a renderable `Document` from raw records.
///
/// Pure transform: derives and rounds the per-line amounts, sums the totals,
/// checks every ceiling, and computes the context-homogeneity flags used for
/// column elision. Fails fast, before any drawing occurs.
pub fn build_document(input: DocumentInput) -> Result<Document, Error> {
    if input.kind == DocumentKind::Invoice && input.counterpart.is_none() {
        return Err(Error::MissingCounterpart);
    }

    let lines: Vec<LineItem> = input
        .lines
        .into_iter()
        .map(derive_line)
        .collect::<Result<_, _>>()?;

    let totals = Totals {
        total_excl_tax: lines.iter().map(|l| l.amount_excl_tax).sum(),
        total_tax: lines.iter().map(|l| l.amount_tax).sum(),
        total_incl_tax: lines.iter().map(|l| l.amount_incl_tax).sum(),
    };
    if totals.total_incl_tax > TOTAL_CEILING {
        return Err(Error::TotalCeiling {
            amount: totals.total_incl_tax,
        });
    }

    if let Some(stored) = input.stored_totals
        && stored != totals
    {
        log::warn!(
            "Document {}: stored totals {:?} disagree with computed {:?}; using computed",
            input.identifier,
            stored,
            totals,
        );
    }

    let pinned_counterpart = input
        .filters
        .counterpart
        .as_deref()
        .or(input.counterpart.as_ref().map(|p| p.name.as_str()));
    let counterpart_ctx = column_context(
        pinned_counterpart,
        lines.iter().map(|l| l.counterpart.as_deref()),
    );
    let issuer_ctx = column_context(
        input.filters.issuer.as_deref(),
        lines.iter().map(|l| l.issuer.as_deref()),
    );

    Ok(Document {
        kind: input.kind,
        identifier: input.identifier,
        header_text: input.header_text,
        counterpart: input.counterpart,
        issue_date: input.issue_date,
        due_date: input.due_date,
        status: input.status,
        lines,
        totals,
        notes: input.notes,
        filters: input.filters,
        homogeneity: Homogeneity {
            counterpart: counterpart_ctx,
            issuer: issuer_ctx,
        },
    })
}
