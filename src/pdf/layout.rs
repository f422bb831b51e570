use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::fonts::{self, Font};
use crate::model::{Document, LineItem};

use super::table::status_color;

pub(super) const ROW_FONT_SIZE: f32 = 8.0;
pub(super) const LINE_HEIGHT: f32 = 10.0;
pub(super) const MIN_ROW_HEIGHT: f32 = 18.0;
pub(super) const CELL_PADDING: f32 = 4.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum Align {
    Start,
    End,
    Center,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum ColumnField {
    Reference,
    Date,
    Counterpart,
    Issuer,
    Description,
    Quantity,
    UnitPrice,
    AmountInclTax,
    Status,
}

#[derive(Clone, Debug)]
pub(super) struct ColumnSpec {
    pub(super) field: ColumnField,
    pub(super) label: &'static str,
    pub(super) width: f32,
    pub(super) align: Align,
}

/// Column geometry for the whole document: computed once, reused for every
/// page's header redraw and every row's cell placement.
#[derive(Clone, Debug)]
pub(super) struct TablePlan {
    pub(super) columns: Vec<ColumnSpec>,
    pub(super) x_offsets: Vec<f32>,
    pub(super) margin_left: f32,
    pub(super) total_width: f32,
}

/// Fixed widths keyed by column label; content never drives them.
fn column_width(label: &str) -> f32 {
    match label {
        "Réf." => 48.0,
        "Date" => 50.0,
        "Client" | "Société" => 76.0,
        "Désignation" => 110.0,
        "Qté" => 30.0,
        "P.U. HT" => 56.0,
        "Montant TTC" => 64.0,
        "Statut" => 50.0,
        _ => 60.0,
    }
}

fn spec(field: ColumnField, label: &'static str, align: Align) -> ColumnSpec {
    ColumnSpec {
        field,
        label,
        width: column_width(label),
        align,
    }
}

/// Decide the ordered column set and its absolute positions.
///
/// The elidable columns (counterpart, issuing entity) are omitted when the
/// document context already fixes their value; the table is then centered on
/// the page at its reduced width.
pub(super) fn plan_columns(doc: &Document, page_width: f32) -> TablePlan {
    let mut columns = vec![
        spec(ColumnField::Reference, "Réf.", Align::Start),
        spec(ColumnField::Date, "Date", Align::Center),
    ];
    if !doc.homogeneity.counterpart.uniform {
        columns.push(spec(ColumnField::Counterpart, "Client", Align::Start));
    }
    if !doc.homogeneity.issuer.uniform {
        columns.push(spec(ColumnField::Issuer, "Société", Align::Start));
    }
    columns.extend([
        spec(ColumnField::Description, "Désignation", Align::Start),
        spec(ColumnField::Quantity, "Qté", Align::End),
        spec(ColumnField::UnitPrice, "P.U. HT", Align::End),
        spec(ColumnField::AmountInclTax, "Montant TTC", Align::End),
        spec(ColumnField::Status, "Statut", Align::Center),
    ]);

    let total_width: f32 = columns.iter().map(|c| c.width).sum();
    let margin_left = (page_width - total_width) / 2.0;

    let mut x_offsets = Vec::with_capacity(columns.len());
    let mut x = margin_left;
    for col in &columns {
        x_offsets.push(x);
        x += col.width;
    }

    TablePlan {
        columns,
        x_offsets,
        margin_left,
        total_width,
    }
}

impl TablePlan {
    /// Usable wrap width of the free-text column.
    pub(super) fn description_budget(&self) -> f32 {
        self.columns
            .iter()
            .find(|c| c.field == ColumnField::Description)
            .map(|c| c.width - 2.0 * CELL_PADDING)
            .unwrap_or(0.0)
    }
}

/// Cell content, matched exhaustively by the renderer.
#[derive(Clone, Debug, PartialEq)]
pub(super) enum Cell {
    Text { lines: Vec<String> },
    Chip { text: String, color: [u8; 3] },
}

/// Shorten a single-line value to its column, eliding with `…`.
fn ellipsize(text: &str, font: Font, size: f32, max_width: f32) -> String {
    if fonts::text_width(text, font, size) <= max_width {
        return text.to_string();
    }
    let ell_w = fonts::char_width_1000(font, '…') * size / 1000.0;
    let mut out = String::new();
    let mut w = 0.0f32;
    for ch in text.chars() {
        let cw = fonts::char_width_1000(font, ch) * size / 1000.0;
        if w + cw + ell_w > max_width {
            break;
        }
        out.push(ch);
        w += cw;
    }
    out.push('…');
    out
}

/// Build the cells of one row, wrapping the description to its budget.
/// `max_desc_lines` caps a pathologically long description so a single row
/// can never outgrow a page's content area.
pub(super) fn row_cells(item: &LineItem, plan: &TablePlan, max_desc_lines: usize) -> Vec<Cell> {
    plan.columns
        .iter()
        .map(|col| match col.field {
            ColumnField::Reference => text_cell(ellipsize(
                &item.reference,
                Font::Regular,
                ROW_FONT_SIZE,
                col.width - 2.0 * CELL_PADDING,
            )),
            ColumnField::Date => text_cell(format_date(item.date)),
            ColumnField::Counterpart => text_cell(ellipsize(
                item.counterpart.as_deref().unwrap_or(""),
                Font::Regular,
                ROW_FONT_SIZE,
                col.width - 2.0 * CELL_PADDING,
            )),
            ColumnField::Issuer => text_cell(ellipsize(
                item.issuer.as_deref().unwrap_or(""),
                Font::Regular,
                ROW_FONT_SIZE,
                col.width - 2.0 * CELL_PADDING,
            )),
            ColumnField::Description => {
                let mut lines = fonts::wrap_text(
                    &item.description,
                    Font::Regular,
                    ROW_FONT_SIZE,
                    plan.description_budget(),
                );
                if lines.len() > max_desc_lines.max(1) {
                    lines.truncate(max_desc_lines.max(1));
                    if let Some(last) = lines.last_mut() {
                        last.push('…');
                    }
                }
                Cell::Text { lines }
            }
            ColumnField::Quantity => text_cell(item.quantity.to_string()),
            ColumnField::UnitPrice => text_cell(format_amount(item.unit_price)),
            ColumnField::AmountInclTax => text_cell(format_amount(item.amount_incl_tax)),
            ColumnField::Status => Cell::Chip {
                text: item.status.label().to_string(),
                color: status_color(&item.status),
            },
        })
        .collect()
}

fn text_cell(line: String) -> Cell {
    Cell::Text { lines: vec![line] }
}

/// Row height from the tallest wrapped cell.
pub(super) fn row_height(cells: &[Cell]) -> f32 {
    let max_lines = cells
        .iter()
        .map(|c| match c {
            Cell::Text { lines } => lines.len(),
            Cell::Chip { .. } => 1,
        })
        .max()
        .unwrap_or(1);
    MIN_ROW_HEIGHT.max(max_lines as f32 * LINE_HEIGHT)
}

/// French money formatting: space-grouped thousands, comma decimals.
pub(super) fn format_amount(amount: Decimal) -> String {
    let rounded = amount.round_dp(2);
    let s = format!("{rounded:.2}");
    let (int_part, frac_part) = s.split_once('.').unwrap_or((s.as_str(), "00"));
    let (sign, digits) = match int_part.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", int_part),
    };
    let mut grouped = String::new();
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(ch);
    }
    format!("{sign}{grouped},{frac_part}")
}

pub(super) fn format_date(d: NaiveDate) -> String {
    d.format("%d/%m/%Y").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        DocumentInput, DocumentKind, Filters, Party, RawLine, Status, build_document,
    };
    use rust_decimal_macros::dec;

    const PAGE_WIDTH: f32 = 595.28;

    fn line(reference: &str, counterpart: Option<&str>) -> RawLine {
        RawLine {
            reference: reference.to_string(),
            date: NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
            description: "Transport".to_string(),
            counterpart: counterpart.map(str::to_string),
            issuer: None,
            quantity: 1,
            unit_price: dec!(10),
            tax_rate_percent: dec!(20),
            status: Status::Sent,
        }
    }

    fn report(lines: Vec<RawLine>) -> Document {
        build_document(DocumentInput {
            kind: DocumentKind::Report,
            identifier: "R-1".to_string(),
            header_text: String::new(),
            counterpart: None,
            issue_date: NaiveDate::from_ymd_opt(2024, 3, 20).unwrap(),
            due_date: None,
            status: Status::Sent,
            lines,
            stored_totals: None,
            notes: None,
            filters: Filters::default(),
        })
        .unwrap()
    }

    fn invoice() -> Document {
        build_document(DocumentInput {
            kind: DocumentKind::Invoice,
            identifier: "F-1".to_string(),
            header_text: String::new(),
            counterpart: Some(Party {
                name: "SARL Horizon".to_string(),
                tax_id: None,
                address: None,
            }),
            issue_date: NaiveDate::from_ymd_opt(2024, 3, 20).unwrap(),
            due_date: None,
            status: Status::Sent,
            lines: vec![line("T-1", None)],
            stored_totals: None,
            notes: None,
            filters: Filters::default(),
        })
        .unwrap()
    }

    #[test]
    fn uniform_counterpart_elides_the_column() {
        let doc = invoice();
        let plan = plan_columns(&doc, PAGE_WIDTH);
        assert!(
            !plan
                .columns
                .iter()
                .any(|c| c.field == ColumnField::Counterpart)
        );
        assert_eq!(
            doc.homogeneity.counterpart.value.as_deref(),
            Some("SARL Horizon")
        );
    }

    #[test]
    fn mixed_counterparts_keep_the_column() {
        let doc = report(vec![line("T-1", Some("Horizon")), line("T-2", Some("Atlas"))]);
        let plan = plan_columns(&doc, PAGE_WIDTH);
        assert!(
            plan.columns
                .iter()
                .any(|c| c.field == ColumnField::Counterpart)
        );
    }

    #[test]
    fn table_is_horizontally_centered() {
        let doc = invoice();
        let plan = plan_columns(&doc, PAGE_WIDTH);
        let right_gap = PAGE_WIDTH - (plan.margin_left + plan.total_width);
        assert!((plan.margin_left - right_gap).abs() < 0.001);
        assert!(plan.margin_left > 0.0);
    }

    #[test]
    fn x_offsets_are_prefix_sums() {
        let doc = report(vec![line("T-1", Some("Horizon")), line("T-2", Some("Atlas"))]);
        let plan = plan_columns(&doc, PAGE_WIDTH);
        assert_eq!(plan.x_offsets.len(), plan.columns.len());
        assert_eq!(plan.x_offsets[0], plan.margin_left);
        for i in 1..plan.x_offsets.len() {
            let expected = plan.x_offsets[i - 1] + plan.columns[i - 1].width;
            assert!((plan.x_offsets[i] - expected).abs() < 0.001);
        }
    }

    #[test]
    fn widths_come_from_the_lookup_not_the_content() {
        let short = report(vec![line("T", Some("A")), line("U", Some("B"))]);
        let long = report(vec![
            line("TRES-LONGUE-REFERENCE-000173", Some("Compagnie Générale des Transports")),
            line("U", Some("B")),
        ]);
        let a = plan_columns(&short, PAGE_WIDTH);
        let b = plan_columns(&long, PAGE_WIDTH);
        for (ca, cb) in a.columns.iter().zip(&b.columns) {
            assert_eq!(ca.width, cb.width);
        }
    }

    #[test]
    fn status_cell_is_a_chip() {
        let doc = invoice();
        let plan = plan_columns(&doc, PAGE_WIDTH);
        let cells = row_cells(&doc.lines[0], &plan, 10);
        assert_eq!(cells.len(), plan.columns.len());
        assert!(matches!(
            cells.last(),
            Some(Cell::Chip { text, .. }) if text == "Envoyée"
        ));
    }

    #[test]
    fn long_description_wraps_and_grows_the_row() {
        let mut doc = invoice();
        doc.lines[0].description =
            "Transport exceptionnel de marchandises dangereuses entre le dépôt central et la \
             plateforme logistique du port"
                .to_string();
        let plan = plan_columns(&doc, PAGE_WIDTH);
        let cells = row_cells(&doc.lines[0], &plan, 50);
        let desc_lines = match &cells[plan
            .columns
            .iter()
            .position(|c| c.field == ColumnField::Description)
            .unwrap()]
        {
            Cell::Text { lines } => lines.len(),
            Cell::Chip { .. } => panic!("description is text"),
        };
        assert!(desc_lines > 1);
        assert_eq!(row_height(&cells), desc_lines as f32 * LINE_HEIGHT);
    }

    #[test]
    fn description_line_cap_elides_overflow() {
        let mut doc = invoice();
        doc.lines[0].description = "mot ".repeat(400);
        let plan = plan_columns(&doc, PAGE_WIDTH);
        let cells = row_cells(&doc.lines[0], &plan, 3);
        match &cells[2] {
            Cell::Text { lines } => {
                assert_eq!(lines.len(), 3);
                assert!(lines.last().unwrap().ends_with('…'));
            }
            Cell::Chip { .. } => panic!("description is text"),
        }
    }

    #[test]
    fn short_row_uses_the_minimum_height() {
        let doc = invoice();
        let plan = plan_columns(&doc, PAGE_WIDTH);
        let cells = row_cells(&doc.lines[0], &plan, 10);
        assert_eq!(row_height(&cells), MIN_ROW_HEIGHT);
    }

    #[test]
    fn amounts_use_french_formatting() {
        assert_eq!(format_amount(dec!(1234567.5)), "1 234 567,50");
        assert_eq!(format_amount(dec!(0)), "0,00");
        assert_eq!(format_amount(dec!(999.99)), "999,99");
        assert_eq!(format_amount(dec!(-1234)), "-1 234,00");
    }
}
