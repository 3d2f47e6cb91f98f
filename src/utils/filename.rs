use std::path::{Path, PathBuf};

use crate::utils::constants::{FORMAT_CSV, PROCESSED_DIR, RAW_DIR};

/// Latin letter with its diacritics removed; other non-ASCII characters map to
/// `None` and are dropped from slugs.
fn fold_latin(c: char) -> Option<&'static str> {
    let folded = match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ā' | 'ă' | 'ą' => "a",
        'À' | 'Á' | 'Â' | 'Ã' | 'Ä' | 'Å' | 'Ā' | 'Ă' | 'Ą' => "a",
        'æ' | 'Æ' => "ae",
        'ç' | 'ć' | 'č' | 'Ç' | 'Ć' | 'Č' => "c",
        'ď' | 'đ' | 'Ď' | 'Đ' => "d",
        'è' | 'é' | 'ê' | 'ë' | 'ē' | 'ė' | 'ę' | 'ě' => "e",
        'È' | 'É' | 'Ê' | 'Ë' | 'Ē' | 'Ė' | 'Ę' | 'Ě' => "e",
        'ğ' | 'Ğ' => "g",
        'ì' | 'í' | 'î' | 'ï' | 'ī' | 'ı' | 'Ì' | 'Í' | 'Î' | 'Ï' | 'Ī' | 'İ' => "i",
        'ł' | 'ľ' | 'Ł' | 'Ľ' => "l",
        'ñ' | 'ń' | 'ň' | 'Ñ' | 'Ń' | 'Ň' => "n",
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'ō' | 'ő' => "o",
        'Ò' | 'Ó' | 'Ô' | 'Õ' | 'Ö' | 'Ø' | 'Ō' | 'Ő' => "o",
        'œ' | 'Œ' => "oe",
        'ř' | 'Ř' => "r",
        'ś' | 'š' | 'ş' | 'Ś' | 'Š' | 'Ş' => "s",
        'ß' => "ss",
        'ť' | 'ţ' | 'Ť' | 'Ţ' => "t",
        'ù' | 'ú' | 'û' | 'ü' | 'ū' | 'ů' | 'ű' => "u",
        'Ù' | 'Ú' | 'Û' | 'Ü' | 'Ū' | 'Ů' | 'Ű' => "u",
        'ý' | 'ÿ' | 'Ý' | 'Ÿ' => "y",
        'ź' | 'ż' | 'ž' | 'Ź' | 'Ż' | 'Ž' => "z",
        _ => return None,
    };
    Some(folded)
}

/// File-safe city key: lowercase ASCII words joined by `-`.
///
/// ```
/// use weather_etl::utils::slugify;
///
/// assert_eq!(slugify("Kota Yogyakarta"), "kota-yogyakarta");
/// assert_eq!(slugify("São Paulo"), "sao-paulo");
/// ```
pub fn slugify(city: &str) -> String {
    let mut slug = String::with_capacity(city.len());
    let mut pending_dash = false;

    for c in city.chars() {
        let mut buf = [0u8; 4];
        let piece = if c.is_ascii_alphanumeric() {
            &*c.to_ascii_lowercase().encode_utf8(&mut buf)
        } else if let Some(folded) = fold_latin(c) {
            folded
        } else {
            if c.is_ascii() {
                pending_dash = true;
            }
            continue;
        };

        if pending_dash && !slug.is_empty() {
            slug.push('-');
        }
        pending_dash = false;
        slug.push_str(piece);
    }

    slug
}

/// Default daily CSV location: `{data_dir}/processed/{slug}_daily.csv`.
pub fn default_daily_path(data_dir: &Path, city: &str) -> PathBuf {
    daily_path_with_extension(data_dir, city, FORMAT_CSV)
}

/// Same as [`default_daily_path`] with an explicit extension.
pub fn daily_path_with_extension(data_dir: &Path, city: &str, extension: &str) -> PathBuf {
    data_dir
        .join(PROCESSED_DIR)
        .join(format!("{}_daily.{}", slugify(city), extension))
}

/// Raw forecast payload location: `{data_dir}/raw/{slug}_weather.json`.
pub fn raw_weather_path(data_dir: &Path, city: &str) -> PathBuf {
    data_dir.join(RAW_DIR).join(format!("{}_weather.json", slugify(city)))
}

/// Raw air-quality payload location: `{data_dir}/raw/{slug}_air.json`.
pub fn raw_air_path(data_dir: &Path, city: &str) -> PathBuf {
    data_dir.join(RAW_DIR).join(format!("{}_air.json", slugify(city)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_basic() {
        assert_eq!(slugify("Bandung"), "bandung");
        assert_eq!(slugify("Kota Yogyakarta"), "kota-yogyakarta");
        assert_eq!(slugify("Cirebon/Harjamukti"), "cirebon-harjamukti");
        assert_eq!(slugify("São Paulo"), "sao-paulo");
        assert_eq!(slugify("  Ho Chi Minh  City "), "ho-chi-minh-city");
        assert_eq!(slugify("Zürich"), "zurich");
    }

    #[test]
    fn test_slugify_drops_unknown_scripts() {
        assert_eq!(slugify("東京 Tokyo"), "tokyo");
        assert_eq!(slugify("---"), "");
    }

    #[test]
    fn test_default_daily_path() {
        let path = default_daily_path(Path::new("data"), "Kota Bandung");
        assert_eq!(path, PathBuf::from("data/processed/kota-bandung_daily.csv"));

        let json = daily_path_with_extension(Path::new("out"), "Bandung", "json");
        assert_eq!(json, PathBuf::from("out/processed/bandung_daily.json"));
    }

    #[test]
    fn test_raw_paths() {
        assert_eq!(
            raw_weather_path(Path::new("data"), "São Paulo"),
            PathBuf::from("data/raw/sao-paulo_weather.json")
        );
        assert_eq!(
            raw_air_path(Path::new("data"), "Bandung"),
            PathBuf::from("data/raw/bandung_air.json")
        );
    }
}
