use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use fleetdoc::{
    Document, DocumentInput, DocumentKind, Filters, IssuerDirectory, IssuerProfile, Party, RawLine,
    Status, build_document,
};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn line(reference: &str, issuer: Option<&str>, unit_price: Decimal) -> RawLine {
    RawLine {
        reference: reference.to_string(),
        date: NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
        description: "Transport Alger-Oran, 38 t".to_string(),
        counterpart: None,
        issuer: issuer.map(str::to_string),
        quantity: 2,
        unit_price,
        tax_rate_percent: dec!(19),
        status: Status::Sent,
    }
}

pub fn invoice(lines: Vec<RawLine>) -> Document {
    build_document(DocumentInput {
        kind: DocumentKind::Invoice,
        identifier: "F-2024-0042".to_string(),
        header_text: "Rue des Frères Bouadou, Alger".to_string(),
        counterpart: Some(Party {
            name: "SARL Horizon Transit".to_string(),
            tax_id: Some("099916000123456".to_string()),
            address: Some("Zone industrielle, Oran".to_string()),
        }),
        issue_date: NaiveDate::from_ymd_opt(2024, 3, 20).unwrap(),
        due_date: Some(NaiveDate::from_ymd_opt(2024, 4, 20).unwrap()),
        status: Status::Sent,
        lines,
        stored_totals: None,
        notes: Some("Paiement par virement sous 30 jours.".to_string()),
        filters: Filters::default(),
    })
    .expect("valid invoice input")
}

pub fn report(lines: Vec<RawLine>, filters: Filters) -> Document {
    build_document(DocumentInput {
        kind: DocumentKind::Report,
        identifier: "R-2024-03".to_string(),
        header_text: String::new(),
        counterpart: None,
        issue_date: NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
        due_date: None,
        status: Status::Draft,
        lines,
        stored_totals: None,
        notes: None,
        filters,
    })
    .expect("valid report input")
}

pub fn directory_with(issuer_id: &str, display_name: &str) -> IssuerDirectory {
    let mut dir = IssuerDirectory::new();
    dir.insert(
        issuer_id.to_string(),
        IssuerProfile {
            display_name: display_name.to_string(),
            logo_path: None,
            contact_lines: vec![
                "Tél. 021 45 67 89".to_string(),
                "contact@horizon-fret.dz".to_string(),
            ],
        },
    );
    dir
}
