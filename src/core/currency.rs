//! Known currency codes and their display names.

/// Display names shown next to each code. Not load-bearing: a code missing
/// here is still served, it just falls back to the code as its name.
const CURRENCY_NAMES: &[(&str, &str)] = &[
    ("TRY", "Türk Lirası"),
    ("USD", "Amerikan Doları"),
    ("EUR", "Euro"),
    ("GBP", "İngiliz Sterlini"),
    ("JPY", "Japon Yeni"),
    ("CHF", "İsviçre Frangı"),
    ("CAD", "Kanada Doları"),
    ("AUD", "Avustralya Doları"),
    ("SEK", "İsveç Kronu"),
    ("NOK", "Norveç Kronu"),
    ("DKK", "Danimarka Kronu"),
    ("SAR", "Suudi Arabistan Riyali"),
    ("KWD", "Kuveyt Dinarı"),
    ("AED", "BAE Dirhemi"),
    ("CNY", "Çin Yuanı"),
    ("RUB", "Rus Rublesi"),
    ("IRR", "İran Riyali"),
    ("BGN", "Bulgar Levası"),
    ("RON", "Romen Leyi"),
    ("AZN", "Azerbaycan Manatı"),
    ("PKR", "Pakistan Rupisi"),
    ("QAR", "Katar Riyali"),
    ("KRW", "Güney Kore Wonu"),
    ("INR", "Hint Rupisi"),
    ("BRL", "Brezilya Reali"),
    ("ZAR", "Güney Afrika Randı"),
    ("MXN", "Meksika Pezosu"),
    ("PLN", "Polonya Zlotisi"),
];

pub fn display_name(code: &str) -> String {
    CURRENCY_NAMES
        .iter()
        .find(|(c, _)| c.eq_ignore_ascii_case(code))
        .map_or_else(|| code.to_uppercase(), |(_, name)| (*name).to_string())
}

/// Three ASCII letters, any case.
pub fn is_valid_code(code: &str) -> bool {
    code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic())
}
