//! Money formatting. Amounts are carried as integer minor units (kobo).

pub const CURRENCY_SYMBOL: &str = "₦";

/// Formats minor units as a naira amount with thousands separators.
///
/// Whole amounts drop the fractional part: `150_000` → `₦1,500`,
/// `150_050` → `₦1,500.50`.
pub fn format_amount(minor: i64) -> String {
    let sign = if minor < 0 { "-" } else { "" };
    let minor = minor.unsigned_abs();
    let whole = group_thousands(minor / 100);
    let fraction = minor % 100;

    if fraction == 0 {
        format!("{sign}{CURRENCY_SYMBOL}{whole}")
    } else {
        format!("{sign}{CURRENCY_SYMBOL}{whole}.{fraction:02}")
    }
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
