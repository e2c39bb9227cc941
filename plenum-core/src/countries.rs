//! Country and continent resolution for grant statistics.
//!
//! Maps ISO 3166-1 alpha-2 codes to display names and continents. Unresolvable
//! codes fall into the Unknown continent bucket rather than erroring, so recap
//! tables never lose a row to bad data. Flag glyphs are derived from the code
//! via Unicode regional indicator symbols instead of being stored.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Continent bucket for country-based aggregation.
///
/// Ord follows declaration order and drives the lexicographic
/// (continent, country-code) display ordering of recap tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Continent {
    Africa,
    Antarctica,
    Asia,
    Europe,
    NorthAmerica,
    Oceania,
    SouthAmerica,
    /// Fallback bucket for unresolvable or missing country codes.
    Unknown,
}

impl Continent {
    pub const ALL: [Continent; 8] = [
        Continent::Africa,
        Continent::Antarctica,
        Continent::Asia,
        Continent::Europe,
        Continent::NorthAmerica,
        Continent::Oceania,
        Continent::SouthAmerica,
        Continent::Unknown,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Continent::Africa => "Africa",
            Continent::Antarctica => "Antarctica",
            Continent::Asia => "Asia",
            Continent::Europe => "Europe",
            Continent::NorthAmerica => "North America",
            Continent::Oceania => "Oceania",
            Continent::SouthAmerica => "South America",
            Continent::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for Continent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Resolved country record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountryInfo {
    pub code: &'static str,
    pub name: &'static str,
    pub continent: Continent,
}

use Continent::*;

static COUNTRIES: &[(&str, &str, Continent)] = &[
    ("AD", "Andorra", Europe),
    ("AE", "United Arab Emirates", Asia),
    ("AF", "Afghanistan", Asia),
    ("AG", "Antigua and Barbuda", NorthAmerica),
    ("AL", "Albania", Europe),
    ("AM", "Armenia", Asia),
    ("AO", "Angola", Africa),
    ("AQ", "Antarctica", Antarctica),
    ("AR", "Argentina", SouthAmerica),
    ("AT", "Austria", Europe),
    ("AU", "Australia", Oceania),
    ("AZ", "Azerbaijan", Asia),
    ("BA", "Bosnia and Herzegovina", Europe),
    ("BB", "Barbados", NorthAmerica),
    ("BD", "Bangladesh", Asia),
    ("BE", "Belgium", Europe),
    ("BF", "Burkina Faso", Africa),
    ("BG", "Bulgaria", Europe),
    ("BH", "Bahrain", Asia),
    ("BI", "Burundi", Africa),
    ("BJ", "Benin", Africa),
    ("BN", "Brunei", Asia),
    ("BO", "Bolivia", SouthAmerica),
    ("BR", "Brazil", SouthAmerica),
    ("BS", "Bahamas", NorthAmerica),
    ("BT", "Bhutan", Asia),
    ("BW", "Botswana", Africa),
    ("BY", "Belarus", Europe),
    ("BZ", "Belize", NorthAmerica),
    ("CA", "Canada", NorthAmerica),
    ("CD", "DR Congo", Africa),
    ("CF", "Central African Republic", Africa),
    ("CG", "Congo", Africa),
    ("CH", "Switzerland", Europe),
    ("CI", "Ivory Coast", Africa),
    ("CL", "Chile", SouthAmerica),
    ("CM", "Cameroon", Africa),
    ("CN", "China", Asia),
    ("CO", "Colombia", SouthAmerica),
    ("CR", "Costa Rica", NorthAmerica),
    ("CU", "Cuba", NorthAmerica),
    ("CV", "Cape Verde", Africa),
    ("CY", "Cyprus", Europe),
    ("CZ", "Czechia", Europe),
    ("DE", "Germany", Europe),
    ("DJ", "Djibouti", Africa),
    ("DK", "Denmark", Europe),
    ("DM", "Dominica", NorthAmerica),
    ("DO", "Dominican Republic", NorthAmerica),
    ("DZ", "Algeria", Africa),
    ("EC", "Ecuador", SouthAmerica),
    ("EE", "Estonia", Europe),
    ("EG", "Egypt", Africa),
    ("ER", "Eritrea", Africa),
    ("ES", "Spain", Europe),
    ("ET", "Ethiopia", Africa),
    ("FI", "Finland", Europe),
    ("FJ", "Fiji", Oceania),
    ("FM", "Micronesia", Oceania),
    ("FR", "France", Europe),
    ("GA", "Gabon", Africa),
    ("GB", "United Kingdom", Europe),
    ("GD", "Grenada", NorthAmerica),
    ("GE", "Georgia", Asia),
    ("GH", "Ghana", Africa),
    ("GM", "Gambia", Africa),
    ("GN", "Guinea", Africa),
    ("GQ", "Equatorial Guinea", Africa),
    ("GR", "Greece", Europe),
    ("GT", "Guatemala", NorthAmerica),
    ("GW", "Guinea-Bissau", Africa),
    ("GY", "Guyana", SouthAmerica),
    ("HN", "Honduras", NorthAmerica),
    ("HR", "Croatia", Europe),
    ("HT", "Haiti", NorthAmerica),
    ("HU", "Hungary", Europe),
    ("ID", "Indonesia", Asia),
    ("IE", "Ireland", Europe),
    ("IL", "Israel", Asia),
    ("IN", "India", Asia),
    ("IQ", "Iraq", Asia),
    ("IR", "Iran", Asia),
    ("IS", "Iceland", Europe),
    ("IT", "Italy", Europe),
    ("JM", "Jamaica", NorthAmerica),
    ("JO", "Jordan", Asia),
    ("JP", "Japan", Asia),
    ("KE", "Kenya", Africa),
    ("KG", "Kyrgyzstan", Asia),
    ("KH", "Cambodia", Asia),
    ("KI", "Kiribati", Oceania),
    ("KM", "Comoros", Africa),
    ("KN", "Saint Kitts and Nevis", NorthAmerica),
    ("KP", "North Korea", Asia),
    ("KR", "South Korea", Asia),
    ("KW", "Kuwait", Asia),
    ("KZ", "Kazakhstan", Asia),
    ("LA", "Laos", Asia),
    ("LB", "Lebanon", Asia),
    ("LC", "Saint Lucia", NorthAmerica),
    ("LI", "Liechtenstein", Europe),
    ("LK", "Sri Lanka", Asia),
    ("LR", "Liberia", Africa),
    ("LS", "Lesotho", Africa),
    ("LT", "Lithuania", Europe),
    ("LU", "Luxembourg", Europe),
    ("LV", "Latvia", Europe),
    ("LY", "Libya", Africa),
    ("MA", "Morocco", Africa),
    ("MC", "Monaco", Europe),
    ("MD", "Moldova", Europe),
    ("ME", "Montenegro", Europe),
    ("MG", "Madagascar", Africa),
    ("MH", "Marshall Islands", Oceania),
    ("MK", "North Macedonia", Europe),
    ("ML", "Mali", Africa),
    ("MM", "Myanmar", Asia),
    ("MN", "Mongolia", Asia),
    ("MR", "Mauritania", Africa),
    ("MT", "Malta", Europe),
    ("MU", "Mauritius", Africa),
    ("MV", "Maldives", Asia),
    ("MW", "Malawi", Africa),
    ("MX", "Mexico", NorthAmerica),
    ("MY", "Malaysia", Asia),
    ("MZ", "Mozambique", Africa),
    ("NA", "Namibia", Africa),
    ("NE", "Niger", Africa),
    ("NG", "Nigeria", Africa),
    ("NI", "Nicaragua", NorthAmerica),
    ("NL", "Netherlands", Europe),
    ("NO", "Norway", Europe),
    ("NP", "Nepal", Asia),
    ("NR", "Nauru", Oceania),
    ("NZ", "New Zealand", Oceania),
    ("OM", "Oman", Asia),
    ("PA", "Panama", NorthAmerica),
    ("PE", "Peru", SouthAmerica),
    ("PG", "Papua New Guinea", Oceania),
    ("PH", "Philippines", Asia),
    ("PK", "Pakistan", Asia),
    ("PL", "Poland", Europe),
    ("PT", "Portugal", Europe),
    ("PW", "Palau", Oceania),
    ("PY", "Paraguay", SouthAmerica),
    ("QA", "Qatar", Asia),
    ("RO", "Romania", Europe),
    ("RS", "Serbia", Europe),
    ("RU", "Russia", Europe),
    ("RW", "Rwanda", Africa),
    ("SA", "Saudi Arabia", Asia),
    ("SB", "Solomon Islands", Oceania),
    ("SC", "Seychelles", Africa),
    ("SD", "Sudan", Africa),
    ("SE", "Sweden", Europe),
    ("SG", "Singapore", Asia),
    ("SI", "Slovenia", Europe),
    ("SK", "Slovakia", Europe),
    ("SL", "Sierra Leone", Africa),
    ("SM", "San Marino", Europe),
    ("SN", "Senegal", Africa),
    ("SO", "Somalia", Africa),
    ("SR", "Suriname", SouthAmerica),
    ("SS", "South Sudan", Africa),
    ("ST", "Sao Tome and Principe", Africa),
    ("SV", "El Salvador", NorthAmerica),
    ("SY", "Syria", Asia),
    ("SZ", "Eswatini", Africa),
    ("TD", "Chad", Africa),
    ("TG", "Togo", Africa),
    ("TH", "Thailand", Asia),
    ("TJ", "Tajikistan", Asia),
    ("TL", "Timor-Leste", Asia),
    ("TM", "Turkmenistan", Asia),
    ("TN", "Tunisia", Africa),
    ("TO", "Tonga", Oceania),
    ("TR", "Turkey", Asia),
    ("TT", "Trinidad and Tobago", NorthAmerica),
    ("TV", "Tuvalu", Oceania),
    ("TW", "Taiwan", Asia),
    ("TZ", "Tanzania", Africa),
    ("UA", "Ukraine", Europe),
    ("UG", "Uganda", Africa),
    ("US", "United States", NorthAmerica),
    ("UY", "Uruguay", SouthAmerica),
    ("UZ", "Uzbekistan", Asia),
    ("VA", "Vatican City", Europe),
    ("VC", "Saint Vincent and the Grenadines", NorthAmerica),
    ("VE", "Venezuela", SouthAmerica),
    ("VN", "Vietnam", Asia),
    ("VU", "Vanuatu", Oceania),
    ("WS", "Samoa", Oceania),
    ("YE", "Yemen", Asia),
    ("ZA", "South Africa", Africa),
    ("ZM", "Zambia", Africa),
    ("ZW", "Zimbabwe", Africa),
];

static INDEX: Lazy<HashMap<&'static str, CountryInfo>> = Lazy::new(|| {
    COUNTRIES
        .iter()
        .map(|&(code, name, continent)| {
            (
                code,
                CountryInfo {
                    code,
                    name,
                    continent,
                },
            )
        })
        .collect()
});

/// Resolve an ISO 3166-1 alpha-2 code, case-insensitively.
pub fn resolve_country(code: &str) -> Option<CountryInfo> {
    let upper = code.trim().to_ascii_uppercase();
    INDEX.get(upper.as_str()).copied()
}

/// Continent for a raw (possibly missing or bogus) country code.
pub fn continent_for(code: Option<&str>) -> Continent {
    code.and_then(resolve_country)
        .map(|c| c.continent)
        .unwrap_or(Continent::Unknown)
}

/// Regional-indicator flag glyph for a two-letter code, e.g. "IT" -> 🇮🇹.
///
/// Returns None for codes that are not two ASCII letters; whether the glyph
/// renders as a flag is up to the reader's font.
pub fn flag_glyph(code: &str) -> Option<String> {
    let code = code.trim();
    if code.len() != 2 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    code.chars()
        .map(|c| char::from_u32(0x1F1E6 + (c.to_ascii_uppercase() as u32 - 'A' as u32)))
        .collect()
}

/// Display label for a raw country code: "🇮🇹 Italy", or the raw input when
/// the code does not resolve.
pub fn display_label(code: &str) -> String {
    match (resolve_country(code), flag_glyph(code)) {
        (Some(info), Some(flag)) => format!("{} {}", flag, info.name),
        (Some(info), None) => info.name.to_string(),
        _ => code.trim().to_string(),
    }
}
