//! Spelled-out amounts for the legal-text line at the bottom of a document.
//!
//! Follows the French composition used on the issued documents: an exception
//! table for 10–16, `soixante-dix` built from the teens, and `quatre-vingt`
//! taking its plural `s` only when nothing follows it. That last rule is kept
//! exactly as issued documents spell it, compounds never take the suffix.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

const MAJOR_UNIT: &str = "dinars";
const MINOR_UNIT: &str = "centimes";

const UNITS: [&str; 10] = [
    "zéro", "un", "deux", "trois", "quatre", "cinq", "six", "sept", "huit", "neuf",
];
const TEENS: [&str; 7] = ["dix", "onze", "douze", "treize", "quatorze", "quinze", "seize"];
const TENS: [&str; 5] = ["vingt", "trente", "quarante", "cinquante", "soixante"];

fn under_twenty(n: u64) -> String {
    match n {
        0..=9 => UNITS[n as usize].to_string(),
        10..=16 => TEENS[n as usize - 10].to_string(),
        _ => format!("dix-{}", UNITS[n as usize - 10]),
    }
}

fn under_hundred(n: u64) -> String {
    match n {
        0..=19 => under_twenty(n),
        20..=69 => {
            let tens = TENS[n as usize / 10 - 2];
            match n % 10 {
                0 => tens.to_string(),
                1 => format!("{tens} et un"),
                u => format!("{tens}-{}", UNITS[u as usize]),
            }
        }
        71 => "soixante et onze".to_string(),
        70..=79 => format!("soixante-{}", under_twenty(n - 60)),
        80 => "quatre-vingts".to_string(),
        81..=89 => format!("quatre-vingt-{}", UNITS[n as usize - 80]),
        // 90..=99 reuse the teens table on top of quatre-vingt
        _ => format!("quatre-vingt-{}", under_twenty(n - 80)),
    }
}

fn under_thousand(n: u64) -> String {
    let hundreds = n / 100;
    let rest = n % 100;
    match (hundreds, rest) {
        (0, r) => under_hundred(r),
        (1, 0) => "cent".to_string(),
        (1, r) => format!("cent {}", under_hundred(r)),
        (h, 0) => format!("{} cent", UNITS[h as usize]),
        (h, r) => format!("{} cent {}", UNITS[h as usize], under_hundred(r)),
    }
}

fn integer_words(n: u64) -> String {
    if n == 0 {
        return UNITS[0].to_string();
    }
    let mut parts: Vec<String> = Vec::new();
    let millions = n / 1_000_000;
    let thousands = (n % 1_000_000) / 1_000;
    let rest = n % 1_000;

    if millions == 1 {
        parts.push("un million".to_string());
    } else if millions > 1 {
        parts.push(format!("{} millions", integer_words(millions)));
    }
    // "mille" never takes a leading "un"
    if thousands == 1 {
        parts.push("mille".to_string());
    } else if thousands > 1 {
        parts.push(format!("{} mille", under_thousand(thousands)));
    }
    if rest > 0 {
        parts.push(under_thousand(rest));
    }
    parts.join(" ")
}

/// Spell a non-negative monetary amount (at most 2 fractional digits).
///
/// The fractional clause is only appended when the cents are nonzero.
pub fn amount_in_words(amount: Decimal) -> String {
    debug_assert!(amount >= Decimal::ZERO);
    let integer = amount.trunc().to_u64().unwrap_or(0);
    let cents = (amount.fract() * Decimal::from(100))
        .round()
        .to_u64()
        .unwrap_or(0);

    let mut out = format!("{} {MAJOR_UNIT}", integer_words(integer));
    if cents > 0 {
        out.push_str(&format!(" et {} {MINOR_UNIT}", integer_words(cents)));
    }
    out
}
