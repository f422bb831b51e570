mod layout;
mod table;

use pdf_writer::{Content, Filter, Name, Pdf, Rect, Ref};

use crate::error::Error;
use crate::fonts::{self, Font};
use crate::model::{Document, DocumentKind, Filters, IssuerDirectory, IssuerProfile};
use crate::words::amount_in_words;

use layout::{TablePlan, format_date};

const PAGE_WIDTH: f32 = 595.28;
const PAGE_HEIGHT: f32 = 841.89;
const MARGIN_TOP: f32 = 48.0;
const SIDE_MARGIN: f32 = 40.0;
/// Bottom of the flowable area; everything below is reserved for the footer.
const CONTENT_BOTTOM: f32 = 96.0;
const LOGO_HEIGHT: f32 = 42.0;

const BLOCK_GAP: f32 = 10.0;

/// Current page index and vertical offset. Mutated only by the flow engine.
struct PageCursor {
    page_index: usize,
    y: f32,
}

/// Owns the per-page content streams and the cursor walking down them.
struct Flow {
    pages: Vec<Content>,
    cursor: PageCursor,
}

impl Flow {
    fn new(start_y: f32) -> Flow {
        Flow {
            pages: vec![Content::new()],
            cursor: PageCursor {
                page_index: 0,
                y: start_y,
            },
        }
    }

    fn content(&mut self) -> &mut Content {
        self.pages.last_mut().expect("flow always has a page")
    }

    fn break_page(&mut self) {
        self.pages.push(Content::new());
        self.cursor.page_index += 1;
        self.cursor.y = PAGE_HEIGHT - MARGIN_TOP;
    }

    /// Break before a fixed-size block that no longer fits.
    fn ensure(&mut self, needed: f32) {
        if self.cursor.y - needed < CONTENT_BOTTOM {
            self.break_page();
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum FlowState {
    AtPageTop,
    InTable,
    NeedsBreak,
    Finalizing,
}

/// Walk the line items through the page flow.
///
/// AtPageTop redraws the header band from the one shared plan; a row that
/// does not fit is never drawn partially, the flow breaks and retries it on
/// the next page. Zebra shading follows the global row index.
fn flow_table(flow: &mut Flow, doc: &Document, plan: &TablePlan) {
    let page_capacity = PAGE_HEIGHT - MARGIN_TOP - table::HEADER_BAND_HEIGHT - CONTENT_BOTTOM;
    let max_desc_lines = (page_capacity / layout::LINE_HEIGHT).floor() as usize;

    let mut state = FlowState::AtPageTop;
    let mut index = 0usize;
    loop {
        match state {
            FlowState::AtPageTop => {
                let y = flow.cursor.y;
                let band = table::draw_header_band(flow.content(), plan, y);
                flow.cursor.y -= band;
                state = FlowState::InTable;
            }
            FlowState::InTable => {
                let Some(item) = doc.lines.get(index) else {
                    state = FlowState::Finalizing;
                    continue;
                };
                let cells = layout::row_cells(item, plan, max_desc_lines);
                let row_h = layout::row_height(&cells);
                if flow.cursor.y - row_h < CONTENT_BOTTOM {
                    state = FlowState::NeedsBreak;
                    continue;
                }
                let y = flow.cursor.y;
                table::draw_row(flow.content(), plan, &cells, y, row_h, index % 2 == 1);
                flow.cursor.y -= row_h;
                index += 1;
            }
            FlowState::NeedsBreak => {
                flow.break_page();
                state = FlowState::AtPageTop;
            }
            FlowState::Finalizing => break,
        }
    }
}

/// Totals, amount in words, notes and signature. Each block re-checks the
/// remaining space and may force its own page break.
fn flow_closing_blocks(flow: &mut Flow, doc: &Document, plan: &TablePlan) {
    let right_x = plan.margin_left + plan.total_width;

    let words = amount_in_words(doc.totals.total_incl_tax);
    let word_lines = table::words_block_lines(&words);
    let note_lines: Vec<String> = doc.notes.as_deref().map(table::notes_lines).unwrap_or_default();

    // Try to keep the closing sequence together; each block still re-checks
    // its own space below in case the combined estimate was off.
    let mut combined = BLOCK_GAP
        + table::TOTALS_BOX_HEIGHT
        + BLOCK_GAP
        + table::words_block_height(&word_lines)
        + BLOCK_GAP
        + table::SIGNATURE_BLOCK_HEIGHT;
    if !note_lines.is_empty() {
        combined += table::notes_height(&note_lines) + BLOCK_GAP;
    }
    flow.ensure(combined);

    flow.cursor.y -= BLOCK_GAP;
    flow.ensure(table::TOTALS_BOX_HEIGHT);
    let y = flow.cursor.y;
    let h = table::draw_totals_box(flow.content(), &doc.totals, right_x, y);
    flow.cursor.y -= h + BLOCK_GAP;

    flow.ensure(table::words_block_height(&word_lines));
    let y = flow.cursor.y;
    let h = table::draw_words_block(flow.content(), &word_lines, plan.margin_left, y);
    flow.cursor.y -= h + BLOCK_GAP;

    if !note_lines.is_empty() {
        flow.ensure(table::notes_height(&note_lines));
        let y = flow.cursor.y;
        let h = table::draw_notes(flow.content(), &note_lines, plan.margin_left, y);
        flow.cursor.y -= h + BLOCK_GAP;
    }

    flow.ensure(table::SIGNATURE_BLOCK_HEIGHT);
    let y = flow.cursor.y;
    table::draw_signature_block(flow.content(), right_x, y);
    flow.cursor.y -= table::SIGNATURE_BLOCK_HEIGHT;
}

struct Logo {
    pdf_name: &'static str,
    xobj_ref: Ref,
    display_width: f32,
    display_height: f32,
}

/// Embed the issuing entity's logo, if it can be loaded. Failure to load is
/// the one locally-recovered error: generation proceeds without the image.
fn embed_logo(
    pdf: &mut Pdf,
    alloc: &mut dyn FnMut() -> Ref,
    profile: Option<&IssuerProfile>,
) -> Option<Logo> {
    let path = profile?.logo_path.as_deref()?;
    let data = match std::fs::read(path) {
        Ok(data) => data,
        Err(e) => {
            log::warn!("Logo {} unreadable, rendering without it: {e}", path.display());
            return None;
        }
    };
    if !data.starts_with(&[0x89, b'P', b'N', b'G']) {
        log::warn!("Logo {} is not a PNG, rendering without it", path.display());
        return None;
    }

    let decoded = match image::load_from_memory_with_format(&data, image::ImageFormat::Png) {
        Ok(decoded) => decoded,
        Err(e) => {
            log::warn!("Logo {} failed to decode, rendering without it: {e}", path.display());
            return None;
        }
    };

    let rgba: image::RgbaImage = decoded.to_rgba8();
    let (w, h) = (rgba.width(), rgba.height());
    let has_alpha = rgba.pixels().any(|p| p.0[3] < 255);

    let rgb_data: Vec<u8> = rgba.pixels().flat_map(|p| [p.0[0], p.0[1], p.0[2]]).collect();
    let compressed_rgb = miniz_oxide::deflate::compress_to_vec_zlib(&rgb_data, 6);

    let smask_ref = if has_alpha {
        let alpha_data: Vec<u8> = rgba.pixels().map(|p| p.0[3]).collect();
        let compressed_alpha = miniz_oxide::deflate::compress_to_vec_zlib(&alpha_data, 6);
        let mask_ref = alloc();
        let mut mask = pdf.image_xobject(mask_ref, &compressed_alpha);
        mask.filter(Filter::FlateDecode);
        mask.width(w as i32);
        mask.height(h as i32);
        mask.color_space().device_gray();
        mask.bits_per_component(8);
        Some(mask_ref)
    } else {
        None
    };

    let xobj_ref = alloc();
    let mut xobj = pdf.image_xobject(xobj_ref, &compressed_rgb);
    xobj.filter(Filter::FlateDecode);
    xobj.width(w as i32);
    xobj.height(h as i32);
    xobj.color_space().device_rgb();
    xobj.bits_per_component(8);
    if let Some(mask_ref) = smask_ref {
        xobj.s_mask(mask_ref);
    }
    drop(xobj);

    Some(Logo {
        pdf_name: "Im1",
        xobj_ref,
        display_width: LOGO_HEIGHT * w as f32 / h as f32,
        display_height: LOGO_HEIGHT,
    })
}

fn filter_period(filters: &Filters) -> Option<String> {
    match (filters.date_from, filters.date_to) {
        (Some(from), Some(to)) => Some(format!(
            "Période : du {} au {}",
            format_date(from),
            format_date(to)
        )),
        (Some(from), None) => Some(format!("Période : depuis le {}", format_date(from))),
        (None, Some(to)) => Some(format!("Période : jusqu'au {}", format_date(to))),
        (None, None) => None,
    }
}

fn show_text_right(content: &mut Content, font: Font, size: f32, right_x: f32, y: f32, text: &str) {
    let w = fonts::text_width(text, font, size);
    table::show_text(content, font, size, right_x - w, y, text);
}

/// First-page header: logo, issuing entity, title, dates, status chip and
/// the info block where elided homogeneous values are printed once.
/// Returns the y where the table flow starts.
fn draw_document_header(
    content: &mut Content,
    doc: &Document,
    issuer_profile: Option<&IssuerProfile>,
    logo: Option<&Logo>,
) -> f32 {
    let top = PAGE_HEIGHT - MARGIN_TOP;
    let right_x = PAGE_WIDTH - SIDE_MARGIN;

    // Left side: logo then issuing-entity identity
    let mut left_y = top;
    if let Some(logo) = logo {
        content.save_state();
        content.transform([
            logo.display_width,
            0.0,
            0.0,
            logo.display_height,
            SIDE_MARGIN,
            top - logo.display_height,
        ]);
        content.x_object(Name(logo.pdf_name.as_bytes()));
        content.restore_state();
        left_y -= logo.display_height + 10.0;
    }
    let issuer_name = issuer_profile.map(|p| p.display_name.as_str());
    if let Some(name) = issuer_name {
        table::show_text(content, Font::Bold, 12.0, SIDE_MARGIN, left_y - 12.0, name);
        left_y -= 16.0;
    }
    if !doc.header_text.is_empty() {
        for line in fonts::wrap_text(&doc.header_text, Font::Regular, 8.0, 240.0) {
            table::show_text(content, Font::Regular, 8.0, SIDE_MARGIN, left_y - 10.0, &line);
            left_y -= 10.0;
        }
    }

    // Right side: title, identification, dates, status chip
    let mut right_y = top;
    let title = match doc.kind {
        DocumentKind::Invoice => format!("FACTURE N° {}", doc.identifier),
        DocumentKind::Report => doc.kind.title().to_string(),
    };
    show_text_right(content, Font::Bold, 14.0, right_x, right_y - 14.0, &title);
    right_y -= 22.0;
    if doc.kind == DocumentKind::Report {
        show_text_right(
            content,
            Font::Regular,
            8.0,
            right_x,
            right_y - 8.0,
            &format!("Réf. {}", doc.identifier),
        );
        right_y -= 12.0;
    }
    show_text_right(
        content,
        Font::Regular,
        8.0,
        right_x,
        right_y - 8.0,
        &format!("Date d'émission : {}", format_date(doc.issue_date)),
    );
    right_y -= 12.0;
    if let Some(due) = doc.due_date {
        show_text_right(
            content,
            Font::Regular,
            8.0,
            right_x,
            right_y - 8.0,
            &format!("Échéance : {}", format_date(due)),
        );
        right_y -= 12.0;
    }
    {
        let label = doc.status.label();
        let tw = fonts::text_width(label, Font::Bold, 7.0);
        let chip_w = tw + 10.0;
        content.save_state();
        table::set_fill(content, table::status_color(&doc.status));
        content.rect(right_x - chip_w, right_y - 14.0, chip_w, 12.0);
        content.fill_nonzero();
        content.restore_state();
        table::set_fill(content, [255, 255, 255]);
        table::show_text(
            content,
            Font::Bold,
            7.0,
            right_x - chip_w + 5.0,
            right_y - 10.5,
            label,
        );
        content.set_fill_gray(0.0);
        right_y -= 18.0;
    }

    // Info block: counterpart identity and every context-pinned value,
    // each printed exactly once at document level
    let mut info: Vec<String> = Vec::new();
    if let Some(party) = &doc.counterpart {
        info.push(format!("Client : {}", party.name));
        if let Some(tax_id) = &party.tax_id {
            info.push(format!("Identifiant fiscal : {tax_id}"));
        }
        if let Some(address) = &party.address {
            info.push(format!("Adresse : {address}"));
        }
    } else if doc.homogeneity.counterpart.uniform {
        if let Some(value) = &doc.homogeneity.counterpart.value {
            info.push(format!("Client : {value}"));
        }
    }
    if doc.homogeneity.issuer.uniform
        && let Some(value) = &doc.homogeneity.issuer.value
    {
        let display = issuer_profile.map(|p| p.display_name.as_str()).unwrap_or(value);
        info.push(format!("Société : {display}"));
    }
    if let Some(period) = filter_period(&doc.filters) {
        info.push(period);
    }
    if let Some(status) = &doc.filters.status {
        info.push(format!("Statut filtré : {}", status.label()));
    }

    let mut info_y = left_y - 14.0;
    for line in &info {
        table::show_text(content, Font::Regular, 9.0, SIDE_MARGIN, info_y - 9.0, line);
        info_y -= 12.0;
    }

    info_y.min(right_y) - 16.0
}

/// Second pass over the finished pages: separator rule, contact lines and
/// the `Page i sur N` stamp. Runs only once the total page count is known.
fn stamp_footers(pages: &mut [Content], doc: &Document, issuers: &IssuerDirectory) {
    let total = pages.len();

    let contact: Vec<String> = doc
        .homogeneity
        .issuer
        .value
        .as_ref()
        .filter(|_| doc.homogeneity.issuer.uniform)
        .and_then(|id| issuers.get(id))
        .map(|p| p.contact_lines.iter().take(2).cloned().collect())
        .unwrap_or_else(|| vec!["Document édité par le service facturation".to_string()]);

    for (i, content) in pages.iter_mut().enumerate() {
        table::draw_rule(content, SIDE_MARGIN, PAGE_WIDTH - SIDE_MARGIN, 64.0);
        for (j, line) in contact.iter().enumerate() {
            let w = fonts::text_width(line, Font::Regular, 7.5);
            table::show_text(
                content,
                Font::Regular,
                7.5,
                (PAGE_WIDTH - w) / 2.0,
                54.0 - j as f32 * 10.0,
                line,
            );
        }
        let stamp = format!("Page {} sur {}", i + 1, total);
        let w = fonts::text_width(&stamp, Font::Regular, 7.5);
        table::show_text(
            content,
            Font::Regular,
            7.5,
            (PAGE_WIDTH - w) / 2.0,
            28.0,
            &stamp,
        );
    }
}

pub(crate) fn render(doc: &Document, issuers: &IssuerDirectory) -> Result<Vec<u8>, Error> {
    let t0 = std::time::Instant::now();
    let mut pdf = Pdf::new();
    let mut next_id = 1i32;
    let mut alloc = || {
        let r = Ref::new(next_id);
        next_id += 1;
        r
    };

    let catalog_id = alloc();
    let pages_id = alloc();

    // Phase 1: builtin fonts and the optional logo
    let fonts_used = [Font::Regular, Font::Bold, Font::Oblique];
    let font_refs: Vec<(Font, Ref)> = fonts_used
        .iter()
        .map(|&font| {
            let font_ref = alloc();
            pdf.type1_font(font_ref)
                .base_font(Name(font.base_font().as_bytes()))
                .encoding_predefined(Name(b"WinAnsiEncoding"));
            (font, font_ref)
        })
        .collect();

    let issuer_profile = doc
        .homogeneity
        .issuer
        .value
        .as_ref()
        .filter(|_| doc.homogeneity.issuer.uniform)
        .and_then(|id| issuers.get(id));
    let logo = embed_logo(&mut pdf, &mut alloc, issuer_profile);

    let t_resources = t0.elapsed();

    // Phase 2: flow the document into page content streams
    let plan = layout::plan_columns(doc, PAGE_WIDTH);
    let mut flow = Flow::new(PAGE_HEIGHT - MARGIN_TOP);
    let table_top = draw_document_header(flow.content(), doc, issuer_profile, logo.as_ref());
    flow.cursor.y = table_top;
    flow_table(&mut flow, doc, &plan);
    flow_closing_blocks(&mut flow, doc, &plan);

    let t_layout = t0.elapsed();

    // Phase 2b: footer pass, now that the page count is final
    stamp_footers(&mut flow.pages, doc, issuers);

    let t_footers = t0.elapsed();

    // Phase 3: assemble the file
    let n = flow.pages.len();
    let page_ids: Vec<Ref> = (0..n).map(|_| alloc()).collect();
    let content_ids: Vec<Ref> = (0..n).map(|_| alloc()).collect();

    for (i, content) in flow.pages.into_iter().enumerate() {
        let raw = content.finish();
        let compressed = miniz_oxide::deflate::compress_to_vec_zlib(raw.as_slice(), 6);
        pdf.stream(content_ids[i], &compressed).filter(Filter::FlateDecode);
    }

    pdf.catalog(catalog_id).pages(pages_id);
    pdf.pages(pages_id)
        .kids(page_ids.iter().copied())
        .count(n as i32);

    for i in 0..n {
        let mut page = pdf.page(page_ids[i]);
        page.media_box(Rect::new(0.0, 0.0, PAGE_WIDTH, PAGE_HEIGHT))
            .parent(pages_id)
            .contents(content_ids[i]);
        let mut resources = page.resources();
        {
            let mut font_dict = resources.fonts();
            for (font, font_ref) in &font_refs {
                font_dict.pair(Name(font.pdf_name().as_bytes()), *font_ref);
            }
        }
        if let Some(logo) = &logo {
            resources
                .x_objects()
                .pair(Name(logo.pdf_name.as_bytes()), logo.xobj_ref);
        }
    }

    let t_assembly = t0.elapsed();

    log::info!(
        "Render phases: resources={:.1}ms, layout={:.1}ms ({} page(s)), footers={:.1}ms, assembly={:.1}ms",
        t_resources.as_secs_f64() * 1000.0,
        (t_layout - t_resources).as_secs_f64() * 1000.0,
        n,
        (t_footers - t_layout).as_secs_f64() * 1000.0,
        (t_assembly - t_footers).as_secs_f64() * 1000.0,
    );

    Ok(pdf.finish())
}
