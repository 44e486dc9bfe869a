//! Locale resolution for language and dialect records
//!
//! Language records in the registry carry free-text display names
//! ("English", "Deutsch"); dialect records carry country or region names.
//! This module maps those labels to ISO codes by scanning static reference
//! tables of English and native display names. Resolution failure is never
//! an error - an unresolved label simply yields no locale.

/// A language reference entry: ISO 639-1 code plus both display names.
struct LanguageName {
    code: &'static str,
    english: &'static str,
    native: &'static str,
}

/// A country reference entry: ISO 3166-1 alpha-2 code plus both display names.
struct CountryName {
    code: &'static str,
    english: &'static str,
    native: &'static str,
}

/// Languages observed in the public USB ID registry's language section,
/// plus common others. Process-wide immutable reference data.
static LANGUAGES: &[LanguageName] = &[
    LanguageName { code: "af", english: "Afrikaans", native: "Afrikaans" },
    LanguageName { code: "ar", english: "Arabic", native: "العربية" },
    LanguageName { code: "as", english: "Assamese", native: "অসমীয়া" },
    LanguageName { code: "az", english: "Azerbaijani", native: "Azərbaycanca" },
    LanguageName { code: "be", english: "Belarusian", native: "Беларуская" },
    LanguageName { code: "bg", english: "Bulgarian", native: "Български" },
    LanguageName { code: "bn", english: "Bengali", native: "বাংলা" },
    LanguageName { code: "ca", english: "Catalan", native: "Català" },
    LanguageName { code: "cs", english: "Czech", native: "Čeština" },
    LanguageName { code: "da", english: "Danish", native: "Dansk" },
    LanguageName { code: "de", english: "German", native: "Deutsch" },
    LanguageName { code: "el", english: "Greek", native: "Ελληνικά" },
    LanguageName { code: "en", english: "English", native: "English" },
    LanguageName { code: "es", english: "Spanish", native: "Español" },
    LanguageName { code: "et", english: "Estonian", native: "Eesti" },
    LanguageName { code: "eu", english: "Basque", native: "Euskara" },
    LanguageName { code: "fa", english: "Persian", native: "فارسی" },
    LanguageName { code: "fi", english: "Finnish", native: "Suomi" },
    LanguageName { code: "fo", english: "Faroese", native: "Føroyskt" },
    LanguageName { code: "fr", english: "French", native: "Français" },
    LanguageName { code: "ga", english: "Irish", native: "Gaeilge" },
    LanguageName { code: "gu", english: "Gujarati", native: "ગુજરાતી" },
    LanguageName { code: "he", english: "Hebrew", native: "עברית" },
    LanguageName { code: "hi", english: "Hindi", native: "हिन्दी" },
    LanguageName { code: "hr", english: "Croatian", native: "Hrvatski" },
    LanguageName { code: "hu", english: "Hungarian", native: "Magyar" },
    LanguageName { code: "hy", english: "Armenian", native: "Հայերեն" },
    LanguageName { code: "id", english: "Indonesian", native: "Bahasa Indonesia" },
    LanguageName { code: "is", english: "Icelandic", native: "Íslenska" },
    LanguageName { code: "it", english: "Italian", native: "Italiano" },
    LanguageName { code: "ja", english: "Japanese", native: "日本語" },
    LanguageName { code: "ka", english: "Georgian", native: "ქართული" },
    LanguageName { code: "kk", english: "Kazakh", native: "Қазақша" },
    LanguageName { code: "kn", english: "Kannada", native: "ಕನ್ನಡ" },
    LanguageName { code: "ko", english: "Korean", native: "한국어" },
    LanguageName { code: "ks", english: "Kashmiri", native: "कॉशुर" },
    LanguageName { code: "lt", english: "Lithuanian", native: "Lietuvių" },
    LanguageName { code: "lv", english: "Latvian", native: "Latviešu" },
    LanguageName { code: "mk", english: "Macedonian", native: "Македонски" },
    LanguageName { code: "ml", english: "Malayalam", native: "മലയാളം" },
    LanguageName { code: "mn", english: "Mongolian", native: "Монгол" },
    LanguageName { code: "mr", english: "Marathi", native: "मराठी" },
    LanguageName { code: "ms", english: "Malay", native: "Bahasa Melayu" },
    LanguageName { code: "mt", english: "Maltese", native: "Malti" },
    LanguageName { code: "ne", english: "Nepali", native: "नेपाली" },
    LanguageName { code: "nl", english: "Dutch", native: "Nederlands" },
    LanguageName { code: "no", english: "Norwegian", native: "Norsk" },
    LanguageName { code: "or", english: "Oriya", native: "ଓଡ଼ିଆ" },
    LanguageName { code: "pa", english: "Punjabi", native: "ਪੰਜਾਬੀ" },
    LanguageName { code: "pl", english: "Polish", native: "Polski" },
    LanguageName { code: "pt", english: "Portuguese", native: "Português" },
    LanguageName { code: "ro", english: "Romanian", native: "Română" },
    LanguageName { code: "ru", english: "Russian", native: "Русский" },
    LanguageName { code: "sa", english: "Sanskrit", native: "संस्कृतम्" },
    LanguageName { code: "sd", english: "Sindhi", native: "سنڌي" },
    LanguageName { code: "sk", english: "Slovak", native: "Slovenčina" },
    LanguageName { code: "sl", english: "Slovenian", native: "Slovenščina" },
    LanguageName { code: "sq", english: "Albanian", native: "Shqip" },
    LanguageName { code: "sr", english: "Serbian", native: "Српски" },
    LanguageName { code: "sv", english: "Swedish", native: "Svenska" },
    LanguageName { code: "sw", english: "Swahili", native: "Kiswahili" },
    LanguageName { code: "ta", english: "Tamil", native: "தமிழ்" },
    LanguageName { code: "te", english: "Telugu", native: "తెలుగు" },
    LanguageName { code: "th", english: "Thai", native: "ไทย" },
    LanguageName { code: "tr", english: "Turkish", native: "Türkçe" },
    LanguageName { code: "tt", english: "Tatar", native: "Татарча" },
    LanguageName { code: "uk", english: "Ukrainian", native: "Українська" },
    LanguageName { code: "ur", english: "Urdu", native: "اردو" },
    LanguageName { code: "uz", english: "Uzbek", native: "Oʻzbekcha" },
    LanguageName { code: "vi", english: "Vietnamese", native: "Tiếng Việt" },
    LanguageName { code: "zh", english: "Chinese", native: "中文" },
];

/// Countries observed as dialect labels, plus common others.
static COUNTRIES: &[CountryName] = &[
    CountryName { code: "AR", english: "Argentina", native: "Argentina" },
    CountryName { code: "AT", english: "Austria", native: "Österreich" },
    CountryName { code: "AU", english: "Australia", native: "Australia" },
    CountryName { code: "BE", english: "Belgium", native: "België" },
    CountryName { code: "BR", english: "Brazil", native: "Brasil" },
    CountryName { code: "CA", english: "Canada", native: "Canada" },
    CountryName { code: "CH", english: "Switzerland", native: "Schweiz" },
    CountryName { code: "CL", english: "Chile", native: "Chile" },
    CountryName { code: "CN", english: "China", native: "中国" },
    CountryName { code: "CO", english: "Colombia", native: "Colombia" },
    CountryName { code: "CZ", english: "Czech Republic", native: "Česko" },
    CountryName { code: "DE", english: "Germany", native: "Deutschland" },
    CountryName { code: "DK", english: "Denmark", native: "Danmark" },
    CountryName { code: "EC", english: "Ecuador", native: "Ecuador" },
    CountryName { code: "EG", english: "Egypt", native: "مصر" },
    CountryName { code: "ES", english: "Spain", native: "España" },
    CountryName { code: "FI", english: "Finland", native: "Suomi" },
    CountryName { code: "FR", english: "France", native: "France" },
    CountryName { code: "GB", english: "United Kingdom", native: "United Kingdom" },
    CountryName { code: "GR", english: "Greece", native: "Ελλάδα" },
    CountryName { code: "HK", english: "Hong Kong", native: "香港" },
    CountryName { code: "IE", english: "Ireland", native: "Éire" },
    CountryName { code: "IN", english: "India", native: "भारत" },
    CountryName { code: "IT", english: "Italy", native: "Italia" },
    CountryName { code: "JP", english: "Japan", native: "日本" },
    CountryName { code: "KR", english: "South Korea", native: "대한민국" },
    CountryName { code: "LU", english: "Luxembourg", native: "Luxembourg" },
    CountryName { code: "MX", english: "Mexico", native: "México" },
    CountryName { code: "NL", english: "Netherlands", native: "Nederland" },
    CountryName { code: "NO", english: "Norway", native: "Norge" },
    CountryName { code: "NZ", english: "New Zealand", native: "New Zealand" },
    CountryName { code: "PE", english: "Peru", native: "Perú" },
    CountryName { code: "PL", english: "Poland", native: "Polska" },
    CountryName { code: "PT", english: "Portugal", native: "Portugal" },
    CountryName { code: "RU", english: "Russia", native: "Россия" },
    CountryName { code: "SA", english: "Saudi Arabia", native: "السعودية" },
    CountryName { code: "SE", english: "Sweden", native: "Sverige" },
    CountryName { code: "SG", english: "Singapore", native: "Singapore" },
    CountryName { code: "TW", english: "Taiwan", native: "台灣" },
    CountryName { code: "US", english: "United States", native: "United States" },
    CountryName { code: "VE", english: "Venezuela", native: "Venezuela" },
    CountryName { code: "ZA", english: "South Africa", native: "South Africa" },
];

/// Case-insensitive exact comparison (Unicode lowercase, no fuzzy matching).
fn eq_ignore_case(a: &str, b: &str) -> bool {
    a.chars()
        .flat_map(char::to_lowercase)
        .eq(b.chars().flat_map(char::to_lowercase))
}

/// Resolves a language display name to its ISO 639-1 code.
///
/// The label is trimmed and compared case-insensitively against every known
/// language's English and native display names; the first match wins.
pub fn language_code(label: &str) -> Option<&'static str> {
    let label = label.trim();
    LANGUAGES
        .iter()
        .find(|l| eq_ignore_case(l.english, label) || eq_ignore_case(l.native, label))
        .map(|l| l.code)
}

/// Resolves a country display name to its ISO 3166-1 alpha-2 code.
pub fn country_code(label: &str) -> Option<&'static str> {
    let label = label.trim();
    COUNTRIES
        .iter()
        .find(|c| eq_ignore_case(c.english, label) || eq_ignore_case(c.native, label))
        .map(|c| c.code)
}

/// Builds the locale string for a dialect record.
///
/// Returns `None` when the parent language label is unknown, the bare
/// language code when only the country label is unknown, and `"ll_CC"`
/// when both resolve.
pub fn dialect_locale(language_label: &str, country_label: &str) -> Option<String> {
    let language = language_code(language_label)?;
    match country_code(country_label) {
        Some(country) => Some(format!("{}_{}", language, country)),
        None => Some(language.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_english_display_name() {
        assert_eq!(language_code("English"), Some("en"));
        assert_eq!(language_code("German"), Some("de"));
    }

    #[test]
    fn test_native_display_name() {
        assert_eq!(language_code("Deutsch"), Some("de"));
        assert_eq!(language_code("日本語"), Some("ja"));
    }

    #[test]
    fn test_case_insensitive_and_trimmed() {
        assert_eq!(language_code("  english "), Some("en"));
        assert_eq!(language_code("FRANÇAIS"), Some("fr"));
        assert_eq!(country_code("united states"), Some("US"));
    }

    #[test]
    fn test_unknown_labels() {
        assert_eq!(language_code("Klingon"), None);
        assert_eq!(country_code("Atlantis"), None);
    }

    #[test]
    fn test_dialect_locale() {
        assert_eq!(
            dialect_locale("English", "United States"),
            Some("en_US".to_string())
        );
        // Unknown country falls back to the bare language code.
        assert_eq!(dialect_locale("English", "US"), Some("en".to_string()));
        // Unknown language yields nothing at all.
        assert_eq!(dialect_locale("Klingon", "United States"), None);
    }
}
