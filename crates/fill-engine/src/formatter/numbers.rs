//! Number parsing, grouping, and spelled-out amounts

use serde_json::Value;

const ONES: [&str; 20] = [
    "Zero", "One", "Two", "Three", "Four", "Five", "Six", "Seven", "Eight", "Nine", "Ten",
    "Eleven", "Twelve", "Thirteen", "Fourteen", "Fifteen", "Sixteen", "Seventeen", "Eighteen",
    "Nineteen",
];

const TENS: [&str; 10] = [
    "", "", "Twenty", "Thirty", "Forty", "Fifty", "Sixty", "Seventy", "Eighty", "Ninety",
];

// u64::MAX is about 18.4 quintillion, so every quotient stays below a thousand
const SCALES: [(u64, &str); 6] = [
    (1_000_000_000_000_000_000, "Quintillion"),
    (1_000_000_000_000_000, "Quadrillion"),
    (1_000_000_000_000, "Trillion"),
    (1_000_000_000, "Billion"),
    (1_000_000, "Million"),
    (1_000, "Thousand"),
];

/// Parse a numeric value, tolerating currency symbols, grouping commas and a trailing `%`
pub fn parse_number(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let cleaned: String = s
                .trim()
                .trim_end_matches('%')
                .chars()
                .filter(|c| !matches!(c, '$' | '€' | '£' | ',' | ' '))
                .collect();
            if cleaned.is_empty() {
                None
            } else {
                cleaned.parse::<f64>().ok()
            }
        }
        _ => None,
    };
    parsed.filter(|n| n.is_finite())
}

/// Number of digits after the decimal point as written
pub fn written_decimals(value: &Value) -> usize {
    let text = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        _ => return 0,
    };
    text.split_once('.')
        .map(|(_, frac)| frac.chars().take_while(|c| c.is_ascii_digit()).count())
        .unwrap_or(0)
}

/// `1234567.891` with 2 decimals → `1,234,567.89`
pub fn format_grouped(value: f64, decimals: usize) -> String {
    let rounded = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match rounded.split_once('.') {
        Some((i, f)) => (i.to_string(), Some(f.to_string())),
        None => (rounded.clone(), None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, digit) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if value < 0.0 && rounded.chars().any(|c| c.is_ascii_digit() && c != '0') {
        "-"
    } else {
        ""
    };

    match frac_part {
        Some(frac) => format!("{}{}.{}", sign, grouped, frac),
        None => format!("{}{}", sign, grouped),
    }
}

/// `-1200.5` → `-$1,200.50`
pub fn format_currency(value: f64, symbol: &str, decimals: usize) -> String {
    let grouped = format_grouped(value, decimals);
    match grouped.strip_prefix('-') {
        Some(rest) => format!("-{}{}", symbol, rest),
        None => format!("{}{}", symbol, grouped),
    }
}

/// Spell out a whole number: `1234` → `One Thousand Two Hundred Thirty-Four`
pub fn integer_to_words(n: u64) -> String {
    if n == 0 {
        return ONES[0].to_string();
    }

    let mut parts = Vec::new();
    let mut remaining = n;
    for (scale, name) in SCALES {
        if remaining >= scale {
            parts.push(format!("{} {}", below_thousand(remaining / scale), name));
            remaining %= scale;
        }
    }
    if remaining > 0 {
        parts.push(below_thousand(remaining));
    }
    parts.join(" ")
}

fn below_thousand(n: u64) -> String {
    let mut parts = Vec::new();
    let hundreds = n / 100;
    let rest = n % 100;

    if hundreds > 0 {
        parts.push(format!("{} Hundred", ONES[hundreds as usize]));
    }
    if rest >= 20 {
        let tens = TENS[(rest / 10) as usize];
        match rest % 10 {
            0 => parts.push(tens.to_string()),
            ones => parts.push(format!("{}-{}", tens, ONES[ones as usize])),
        }
    } else if rest > 0 {
        parts.push(ONES[rest as usize].to_string());
    }
    parts.join(" ")
}

/// Absolute value in whole cents, or `None` when it does not fit a `u64`
fn cents_of(value: f64) -> Option<u64> {
    let cents = (value.abs() * 100.0).round();
    (cents < u64::MAX as f64).then_some(cents as u64)
}

/// Whole part in words plus cents as `and NN/100` when present.
/// Amounts too large to spell out are written as grouped numerals.
pub fn amount_to_words(value: f64) -> String {
    let Some(cents_total) = cents_of(value) else {
        return format_grouped(value, 2);
    };
    let whole = cents_total / 100;
    let cents = cents_total % 100;

    let mut words = integer_to_words(whole);
    if cents > 0 {
        words.push_str(&format!(" and {:02}/100", cents));
    }
    if value < 0.0 && cents_total > 0 {
        words = format!("Minus {}", words);
    }
    words
}

/// `One Thousand Two Hundred Dollars ($1,200.00)`
pub fn currency_words_with_numerals(value: f64, symbol: &str) -> String {
    let Some(cents_total) = cents_of(value) else {
        return format_currency(value, symbol, 2);
    };
    let whole = cents_total / 100;
    let cents = cents_total % 100;

    let unit = if whole == 1 { "Dollar" } else { "Dollars" };
    let mut words = format!("{} {}", integer_to_words(whole), unit);
    if cents > 0 {
        words.push_str(&format!(" and {:02}/100", cents));
    }
    format!("{} ({})", words, format_currency(value, symbol, 2))
}
