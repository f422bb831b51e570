use pdf_writer::{Content, Name, Str};

use crate::fonts::{self, Font};
use crate::model::{Status, Totals};

use super::layout::{
    Align, CELL_PADDING, Cell, LINE_HEIGHT, MIN_ROW_HEIGHT, ROW_FONT_SIZE, TablePlan,
    format_amount,
};

pub(super) const HEADER_BAND_HEIGHT: f32 = 20.0;
pub(super) const TOTALS_BOX_WIDTH: f32 = 190.0;
pub(super) const TOTALS_BOX_HEIGHT: f32 = 3.0 * TOTALS_ROW_HEIGHT;
pub(super) const WORDS_BLOCK_WIDTH: f32 = 420.0;
pub(super) const SIGNATURE_BLOCK_HEIGHT: f32 = 70.0;

const TOTALS_ROW_HEIGHT: f32 = 16.0;
const CHIP_HEIGHT: f32 = 11.0;

const HEADER_FILL: [u8; 3] = [52, 73, 94];
const ZEBRA_FILL: [u8; 3] = [236, 240, 241];
const RULE_GREY: [u8; 3] = [189, 195, 199];
const NEUTRAL: [u8; 3] = [127, 140, 141];

/// Fixed status palette; anything unknown renders neutrally.
pub(super) fn status_color(status: &Status) -> [u8; 3] {
    match status {
        Status::Paid => [39, 174, 96],
        Status::Sent => [230, 126, 34],
        Status::Draft => NEUTRAL,
        Status::Cancelled => [192, 57, 43],
        Status::Other(_) => NEUTRAL,
    }
}

pub(super) fn set_fill(content: &mut Content, [r, g, b]: [u8; 3]) {
    content.set_fill_rgb(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0);
}

pub(super) fn show_text(
    content: &mut Content,
    font: Font,
    size: f32,
    x: f32,
    baseline: f32,
    text: &str,
) {
    content
        .begin_text()
        .set_font(Name(font.pdf_name().as_bytes()), size)
        .next_line(x, baseline)
        .show(Str(&fonts::to_winansi_bytes(text)))
        .end_text();
}

fn aligned_x(align: Align, col_x: f32, col_w: f32, text_w: f32) -> f32 {
    match align {
        Align::Start => col_x + CELL_PADDING,
        Align::End => col_x + col_w - CELL_PADDING - text_w,
        Align::Center => col_x + (col_w - text_w) / 2.0,
    }
}

/// Draw the column header band at `top`. Identical on every page because the
/// plan never changes mid-document.
pub(super) fn draw_header_band(content: &mut Content, plan: &TablePlan, top: f32) -> f32 {
    content.save_state();
    set_fill(content, HEADER_FILL);
    content.rect(
        plan.margin_left,
        top - HEADER_BAND_HEIGHT,
        plan.total_width,
        HEADER_BAND_HEIGHT,
    );
    content.fill_nonzero();
    content.restore_state();

    let baseline = top - HEADER_BAND_HEIGHT + 6.5;
    set_fill(content, [255, 255, 255]);
    for (col, &x) in plan.columns.iter().zip(&plan.x_offsets) {
        let tw = fonts::text_width(col.label, Font::Bold, ROW_FONT_SIZE);
        show_text(
            content,
            Font::Bold,
            ROW_FONT_SIZE,
            aligned_x(col.align, x, col.width, tw),
            baseline,
            col.label,
        );
    }
    content.set_fill_gray(0.0);

    HEADER_BAND_HEIGHT
}

/// Draw one row under `top`. The zebra background follows the global row
/// index, not the position on the page.
pub(super) fn draw_row(
    content: &mut Content,
    plan: &TablePlan,
    cells: &[Cell],
    top: f32,
    row_height: f32,
    zebra: bool,
) {
    if zebra {
        content.save_state();
        set_fill(content, ZEBRA_FILL);
        content.rect(plan.margin_left, top - row_height, plan.total_width, row_height);
        content.fill_nonzero();
        content.restore_state();
    }

    let first_baseline = top - CELL_PADDING - 0.75 * ROW_FONT_SIZE;
    for ((col, &x), cell) in plan.columns.iter().zip(&plan.x_offsets).zip(cells) {
        match cell {
            Cell::Text { lines } => {
                for (i, line) in lines.iter().enumerate() {
                    if line.is_empty() {
                        continue;
                    }
                    let tw = fonts::text_width(line, Font::Regular, ROW_FONT_SIZE);
                    show_text(
                        content,
                        Font::Regular,
                        ROW_FONT_SIZE,
                        aligned_x(col.align, x, col.width, tw),
                        first_baseline - i as f32 * LINE_HEIGHT,
                        line,
                    );
                }
            }
            Cell::Chip { text, color } => {
                let tw = fonts::text_width(text, Font::Bold, 7.0);
                let chip_w = (tw + 8.0).min(col.width - 2.0 * CELL_PADDING);
                let chip_x = x + (col.width - chip_w) / 2.0;
                let chip_top = top - (MIN_ROW_HEIGHT - CHIP_HEIGHT) / 2.0;
                content.save_state();
                set_fill(content, *color);
                content.rect(chip_x, chip_top - CHIP_HEIGHT, chip_w, CHIP_HEIGHT);
                content.fill_nonzero();
                content.restore_state();
                set_fill(content, [255, 255, 255]);
                show_text(
                    content,
                    Font::Bold,
                    7.0,
                    x + (col.width - tw) / 2.0,
                    chip_top - CHIP_HEIGHT + 3.0,
                    text,
                );
                content.set_fill_gray(0.0);
            }
        }
    }
}

/// Totals box, right-aligned against `right_x`. Returns its height.
pub(super) fn draw_totals_box(
    content: &mut Content,
    totals: &Totals,
    right_x: f32,
    top: f32,
) -> f32 {
    let x = right_x - TOTALS_BOX_WIDTH;
    let rows = [
        ("Total HT", totals.total_excl_tax, Font::Regular),
        ("Total TVA", totals.total_tax, Font::Regular),
        ("Total TTC", totals.total_incl_tax, Font::Bold),
    ];

    for (i, (label, amount, font)) in rows.iter().enumerate() {
        let row_top = top - i as f32 * TOTALS_ROW_HEIGHT;
        if *font == Font::Bold {
            content.save_state();
            set_fill(content, ZEBRA_FILL);
            content.rect(x, row_top - TOTALS_ROW_HEIGHT, TOTALS_BOX_WIDTH, TOTALS_ROW_HEIGHT);
            content.fill_nonzero();
            content.restore_state();
        }
        let baseline = row_top - TOTALS_ROW_HEIGHT + 4.5;
        show_text(content, *font, ROW_FONT_SIZE, x + CELL_PADDING, baseline, label);
        let value = format_amount(*amount);
        let vw = fonts::text_width(&value, *font, ROW_FONT_SIZE);
        show_text(
            content,
            *font,
            ROW_FONT_SIZE,
            right_x - CELL_PADDING - vw,
            baseline,
            &value,
        );
    }

    content.save_state();
    content.set_line_width(0.5);
    let [r, g, b] = RULE_GREY;
    content.set_stroke_rgb(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0);
    content.rect(x, top - TOTALS_BOX_HEIGHT, TOTALS_BOX_WIDTH, TOTALS_BOX_HEIGHT);
    content.stroke();
    content.restore_state();

    TOTALS_BOX_HEIGHT
}

pub(super) fn words_block_lines(amount_words: &str) -> Vec<String> {
    fonts::wrap_text(amount_words, Font::Oblique, ROW_FONT_SIZE, WORDS_BLOCK_WIDTH)
}

pub(super) fn words_block_height(lines: &[String]) -> f32 {
    12.0 + lines.len() as f32 * LINE_HEIGHT + 4.0
}

/// Legal-text block: caption plus the spelled-out grand total.
pub(super) fn draw_words_block(
    content: &mut Content,
    lines: &[String],
    x: f32,
    top: f32,
) -> f32 {
    show_text(
        content,
        Font::Bold,
        ROW_FONT_SIZE,
        x,
        top - 8.0,
        "Arrêté le présent document à la somme de :",
    );
    for (i, line) in lines.iter().enumerate() {
        show_text(
            content,
            Font::Oblique,
            ROW_FONT_SIZE,
            x,
            top - 12.0 - (i + 1) as f32 * LINE_HEIGHT,
            line,
        );
    }
    words_block_height(lines)
}

pub(super) fn draw_signature_block(content: &mut Content, right_x: f32, top: f32) -> f32 {
    const BOX_W: f32 = 180.0;
    const BOX_H: f32 = 50.0;
    let x = right_x - BOX_W;
    show_text(content, Font::Bold, ROW_FONT_SIZE, x, top - 8.0, "Signature et cachet");
    content.save_state();
    content.set_line_width(0.5);
    let [r, g, b] = RULE_GREY;
    content.set_stroke_rgb(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0);
    content.rect(x, top - 12.0 - BOX_H, BOX_W, BOX_H);
    content.stroke();
    content.restore_state();
    SIGNATURE_BLOCK_HEIGHT
}

pub(super) fn notes_lines(notes: &str) -> Vec<String> {
    fonts::wrap_text(notes, Font::Oblique, ROW_FONT_SIZE, WORDS_BLOCK_WIDTH)
}

pub(super) fn notes_height(lines: &[String]) -> f32 {
    lines.len() as f32 * LINE_HEIGHT + 4.0
}

/// Free-text notes under the totals, pre-wrapped to the words-block width.
pub(super) fn draw_notes(content: &mut Content, lines: &[String], x: f32, top: f32) -> f32 {
    for (i, line) in lines.iter().enumerate() {
        show_text(
            content,
            Font::Oblique,
            ROW_FONT_SIZE,
            x,
            top - (i + 1) as f32 * LINE_HEIGHT,
            line,
        );
    }
    notes_height(lines)
}

pub(super) fn draw_rule(content: &mut Content, x1: f32, x2: f32, y: f32) {
    content.save_state();
    content.set_line_width(0.5);
    let [r, g, b] = RULE_GREY;
    content.set_stroke_rgb(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0);
    content.move_to(x1, y);
    content.line_to(x2, y);
    content.stroke();
    content.restore_state();
}
