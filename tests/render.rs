mod common;

use rust_decimal_macros::dec;

use fleetdoc::{
    DocumentKind, Error, Filters, IssuerDirectory, Status, build_document, document_file_name,
    render, render_to_file,
};

#[test]
fn invoice_renders_to_a_pdf() {
    common::init_logging();
    let doc = common::invoice(vec![
        common::line("T-101", None, dec!(25_000)),
        common::line("T-102", None, dec!(18_500.50)),
    ]);
    let bytes = render(&doc, &IssuerDirectory::new()).expect("render");
    assert!(bytes.starts_with(b"%PDF-"));
    assert!(bytes.ends_with(b"%%EOF\n") || bytes.ends_with(b"%%EOF"));
}

#[test]
fn report_with_issuer_contact_renders() {
    let lines = vec![
        common::line("T-201", Some("horizon"), dec!(12_000)),
        common::line("T-202", Some("horizon"), dec!(9_750)),
    ];
    let doc = common::report(
        lines,
        Filters {
            issuer: Some("horizon".to_string()),
            ..Filters::default()
        },
    );
    let dir = common::directory_with("horizon", "Horizon Fret SARL");
    let bytes = render(&doc, &dir).expect("render");
    assert!(bytes.starts_with(b"%PDF-"));
}

/// Inflate every Flate stream in the file and concatenate the results.
fn inflated_stream_text(pdf: &[u8]) -> String {
    fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
        haystack.windows(needle.len()).position(|w| w == needle)
    }

    let mut out = String::new();
    let mut i = 0;
    while let Some(pos) = find(&pdf[i..], b"stream") {
        let mut start = i + pos + b"stream".len();
        if pdf.get(start) == Some(&b'\r') {
            start += 1;
        }
        if pdf.get(start) == Some(&b'\n') {
            start += 1;
        }
        let Some(end) = find(&pdf[start..], b"endstream") else {
            break;
        };
        if let Ok(data) = miniz_oxide::inflate::decompress_to_vec_zlib(&pdf[start..start + end]) {
            out.push_str(&String::from_utf8_lossy(&data));
        }
        i = start + end + b"endstream".len();
    }
    out
}

#[test]
fn elided_counterpart_is_printed_exactly_once() {
    let doc = common::invoice(vec![
        common::line("T-701", None, dec!(1_000)),
        common::line("T-702", None, dec!(2_000)),
    ]);
    let bytes = render(&doc, &IssuerDirectory::new()).expect("render");
    let text = inflated_stream_text(&bytes);
    let occurrences = text.matches("Client : SARL Horizon Transit").count();
    assert_eq!(occurrences, 1);
    // The elided column's header label never reappears in the table band
    assert_eq!(text.matches("(Client)").count(), 0);
}

#[test]
fn rendering_is_deterministic() {
    common::init_logging();
    let doc = common::invoice(
        (0..60)
            .map(|i| common::line(&format!("T-{i:03}"), None, dec!(1_000)))
            .collect(),
    );
    let dir = IssuerDirectory::new();
    let first = render(&doc, &dir).expect("render");
    let second = render(&doc, &dir).expect("render");
    assert_eq!(first, second);
}

#[test]
fn missing_logo_file_does_not_fail_the_render() {
    let lines = vec![common::line("T-301", Some("horizon"), dec!(5_000))];
    let doc = common::report(
        lines,
        Filters {
            issuer: Some("horizon".to_string()),
            ..Filters::default()
        },
    );
    let mut dir = common::directory_with("horizon", "Horizon Fret SARL");
    dir.get_mut("horizon").unwrap().logo_path = Some("/nonexistent/logo.png".into());
    let bytes = render(&doc, &dir).expect("render despite missing logo");
    assert!(bytes.starts_with(b"%PDF-"));
}

#[test]
fn files_are_named_by_kind() {
    let invoice = common::invoice(vec![common::line("T-401", None, dec!(100))]);
    assert_eq!(document_file_name(&invoice), "facture-F-2024-0042.pdf");

    let report = common::report(
        vec![common::line("T-402", None, dec!(100))],
        Filters::default(),
    );
    assert_eq!(document_file_name(&report), "rapport_2024-04-01.pdf");
}

#[test]
fn render_to_file_writes_under_the_given_directory() {
    let doc = common::invoice(vec![common::line("T-501", None, dec!(750))]);
    let tmp = tempfile::tempdir().expect("tempdir");
    let path = render_to_file(&doc, &IssuerDirectory::new(), tmp.path()).expect("write");
    assert_eq!(path, tmp.path().join("facture-F-2024-0042.pdf"));
    let written = std::fs::read(&path).expect("read back");
    assert!(written.starts_with(b"%PDF-"));
}

#[test]
fn invalid_input_fails_before_any_output() {
    let mut bad = common::line("T-601", None, dec!(100));
    bad.quantity = 0;
    let err = build_document(fleetdoc::DocumentInput {
        kind: DocumentKind::Invoice,
        identifier: "F-2024-0099".to_string(),
        header_text: String::new(),
        counterpart: Some(fleetdoc::Party {
            name: "SARL Horizon Transit".to_string(),
            tax_id: None,
            address: None,
        }),
        issue_date: chrono::NaiveDate::from_ymd_opt(2024, 3, 20).unwrap(),
        due_date: None,
        status: Status::Draft,
        lines: vec![bad],
        stored_totals: None,
        notes: None,
        filters: Filters::default(),
    })
    .unwrap_err();
    assert!(matches!(err, Error::InvalidQuantity { .. }));
}
