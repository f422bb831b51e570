//! Metrics and encoding for the builtin Helvetica family. The three faces
//! are standard Type1 fonts, so no file discovery or embedding is involved;
//! the AFM width tables below are all that text measurement needs.

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) enum Font {
    Regular,
    Bold,
    Oblique,
}

impl Font {
    /// Resource name registered on every page.
    pub(crate) fn pdf_name(self) -> &'static str {
        match self {
            Font::Regular => "F1",
            Font::Bold => "F2",
            Font::Oblique => "F3",
        }
    }

    pub(crate) fn base_font(self) -> &'static str {
        match self {
            Font::Regular => "Helvetica",
            Font::Bold => "Helvetica-Bold",
            Font::Oblique => "Helvetica-Oblique",
        }
    }

    fn widths(self) -> &'static [f32; 95] {
        match self {
            // Oblique shares the regular metrics
            Font::Regular | Font::Oblique => &HELVETICA_WIDTHS,
            Font::Bold => &HELVETICA_BOLD_WIDTHS,
        }
    }
}

/// AFM widths (1000-unit em) for chars 0x20..=0x7E of Helvetica.
#[rustfmt::skip]
const HELVETICA_WIDTHS: [f32; 95] = [
    278.0, 278.0, 355.0, 556.0, 556.0, 889.0, 667.0, 191.0, 333.0, 333.0,
    389.0, 584.0, 278.0, 333.0, 278.0, 278.0, 556.0, 556.0, 556.0, 556.0,
    556.0, 556.0, 556.0, 556.0, 556.0, 556.0, 278.0, 278.0, 584.0, 584.0,
    584.0, 556.0, 1015.0, 667.0, 667.0, 722.0, 722.0, 667.0, 611.0, 778.0,
    722.0, 278.0, 500.0, 667.0, 556.0, 833.0, 722.0, 778.0, 667.0, 778.0,
    722.0, 667.0, 611.0, 722.0, 667.0, 944.0, 667.0, 667.0, 611.0, 278.0,
    278.0, 278.0, 469.0, 556.0, 333.0, 556.0, 556.0, 500.0, 556.0, 556.0,
    278.0, 556.0, 556.0, 222.0, 222.0, 500.0, 222.0, 833.0, 556.0, 556.0,
    556.0, 556.0, 333.0, 500.0, 278.0, 556.0, 500.0, 722.0, 500.0, 500.0,
    500.0, 334.0, 260.0, 334.0, 584.0,
];

/// AFM widths (1000-unit em) for chars 0x20..=0x7E of Helvetica-Bold.
#[rustfmt::skip]
const HELVETICA_BOLD_WIDTHS: [f32; 95] = [
    278.0, 333.0, 474.0, 556.0, 556.0, 889.0, 722.0, 238.0, 333.0, 333.0,
    389.0, 584.0, 278.0, 333.0, 278.0, 278.0, 556.0, 556.0, 556.0, 556.0,
    556.0, 556.0, 556.0, 556.0, 556.0, 556.0, 333.0, 333.0, 584.0, 584.0,
    584.0, 611.0, 975.0, 722.0, 722.0, 722.0, 722.0, 667.0, 611.0, 778.0,
    722.0, 278.0, 556.0, 722.0, 611.0, 833.0, 722.0, 778.0, 667.0, 778.0,
    722.0, 667.0, 611.0, 722.0, 667.0, 944.0, 667.0, 667.0, 611.0, 333.0,
    278.0, 333.0, 584.0, 556.0, 333.0, 556.0, 611.0, 556.0, 611.0, 556.0,
    333.0, 611.0, 611.0, 278.0, 278.0, 556.0, 278.0, 889.0, 611.0, 611.0,
    611.0, 611.0, 389.0, 556.0, 333.0, 611.0, 556.0, 778.0, 556.0, 556.0,
    500.0, 389.0, 280.0, 389.0, 584.0,
];

/// Accented Latin-1 letters share the advance of their base glyph.
fn fold_accent(ch: char) -> char {
    match ch {
        'à' | 'â' | 'ä' => 'a',
        'ç' => 'c',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'î' | 'ï' => 'i',
        'ô' | 'ö' => 'o',
        'ù' | 'û' | 'ü' => 'u',
        'À' | 'Â' | 'Ä' => 'A',
        'Ç' => 'C',
        'É' | 'È' | 'Ê' | 'Ë' => 'E',
        'Î' | 'Ï' => 'I',
        'Ô' | 'Ö' => 'O',
        'Ù' | 'Û' | 'Ü' => 'U',
        '’' | '‘' => '\'',
        _ => ch,
    }
}

pub(crate) fn char_width_1000(font: Font, ch: char) -> f32 {
    let ch = fold_accent(ch);
    let code = ch as u32;
    if (0x20..=0x7E).contains(&code) {
        font.widths()[(code - 0x20) as usize]
    } else if ch == '°' {
        400.0
    } else {
        // Unknown glyph: digit/lowercase advance is the common case
        556.0
    }
}

pub(crate) fn text_width(text: &str, font: Font, size: f32) -> f32 {
    text.chars()
        .map(|ch| char_width_1000(font, ch) * size / 1000.0)
        .sum()
}

/// Map text to WinAnsi bytes for `show` with the predefined encoding.
/// WinAnsi is Latin-1 over 0xA0..=0xFF plus a handful of 0x80..0x9F marks.
pub(crate) fn to_winansi_bytes(text: &str) -> Vec<u8> {
    text.chars()
        .map(|ch| match ch as u32 {
            0x20..=0x7E | 0xA0..=0xFF => ch as u32 as u8,
            _ => match ch {
                '€' => 0x80,
                '…' => 0x85,
                'Œ' => 0x8C,
                '‘' => 0x91,
                '’' => 0x92,
                '“' => 0x93,
                '”' => 0x94,
                '–' => 0x96,
                '—' => 0x97,
                'œ' => 0x9C,
                _ => b'?',
            },
        })
        .collect()
}

/// Greedy word wrap against a pixel budget. A single word wider than the
/// budget is hard-broken so every returned line fits.
pub(crate) fn wrap_text(text: &str, font: Font, size: f32, max_width: f32) -> Vec<String> {
    let space_w = char_width_1000(font, ' ') * size / 1000.0;
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut current_w = 0.0f32;

    let push_word = |word: &str, lines: &mut Vec<String>, current: &mut String, current_w: &mut f32| {
        let ww = text_width(word, font, size);
        if current.is_empty() {
            current.push_str(word);
            *current_w = ww;
        } else if *current_w + space_w + ww <= max_width {
            current.push(' ');
            current.push_str(word);
            *current_w += space_w + ww;
        } else {
            lines.push(std::mem::take(current));
            current.push_str(word);
            *current_w = ww;
        }
    };

    for word in text.split_whitespace() {
        if text_width(word, font, size) <= max_width {
            push_word(word, &mut lines, &mut current, &mut current_w);
            continue;
        }
        // Oversized word: emit fitting prefixes character by character
        let mut piece = String::new();
        let mut piece_w = 0.0f32;
        for ch in word.chars() {
            let cw = char_width_1000(font, ch) * size / 1000.0;
            if !piece.is_empty() && piece_w + cw > max_width {
                push_word(&piece, &mut lines, &mut current, &mut current_w);
                piece.clear();
                piece_w = 0.0;
            }
            piece.push(ch);
            piece_w += cw;
        }
        if !piece.is_empty() {
            push_word(&piece, &mut lines, &mut current, &mut current_w);
        }
    }

    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}
