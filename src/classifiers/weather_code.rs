use serde::{Deserialize, Serialize};

/// Coarse weather condition derived from a WMO weather code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeatherCondition {
    Clear,
    MostlyClear,
    PartlyCloudy,
    Cloudy,
    Fog,
    Drizzle,
    Rain,
    Snow,
    Showers,
    SnowShowers,
    Thunderstorms,
    Unknown,
}

impl WeatherCondition {
    /// WMO code table:
    /// - 0: clear sky, 1: mainly clear, 2: partly cloudy, 3: overcast
    /// - 45, 48: fog and depositing rime fog
    /// - 51-57: drizzle (incl. freezing)
    /// - 61-67: rain (incl. freezing)
    /// - 71-77: snow fall and snow grains
    /// - 80-82: rain showers
    /// - 85-86: snow showers
    /// - 95-99: thunderstorm, with or without hail
    pub fn from_code(code: u8) -> Self {
        match code {
            0 => WeatherCondition::Clear,
            1 => WeatherCondition::MostlyClear,
            2 => WeatherCondition::PartlyCloudy,
            3 => WeatherCondition::Cloudy,
            45 | 48 => WeatherCondition::Fog,
            51..=57 => WeatherCondition::Drizzle,
            61..=67 => WeatherCondition::Rain,
            71..=77 => WeatherCondition::Snow,
            80..=82 => WeatherCondition::Showers,
            85 | 86 => WeatherCondition::SnowShowers,
            95..=99 => WeatherCondition::Thunderstorms,
            _ => WeatherCondition::Unknown,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            WeatherCondition::Clear => "Clear",
            WeatherCondition::MostlyClear => "Mostly Clear",
            WeatherCondition::PartlyCloudy => "Partly Cloudy",
            WeatherCondition::Cloudy => "Cloudy",
            WeatherCondition::Fog => "Fog",
            WeatherCondition::Drizzle => "Drizzle",
            WeatherCondition::Rain => "Rain",
            WeatherCondition::Snow => "Snow",
            WeatherCondition::Showers => "Showers",
            WeatherCondition::SnowShowers => "Snow Showers",
            WeatherCondition::Thunderstorms => "Thunderstorms",
            WeatherCondition::Unknown => "",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            WeatherCondition::Clear => "\u{2600}",
            WeatherCondition::MostlyClear => "\u{1F324}",
            WeatherCondition::PartlyCloudy => "\u{26C5}",
            WeatherCondition::Cloudy => "\u{2601}",
            WeatherCondition::Fog => "\u{1F32B}",
            WeatherCondition::Drizzle => "\u{1F326}",
            WeatherCondition::Rain => "\u{1F327}",
            WeatherCondition::Snow => "\u{2744}",
            WeatherCondition::Showers => "\u{1F326}",
            WeatherCondition::SnowShowers => "\u{1F328}",
            WeatherCondition::Thunderstorms => "\u{26C8}",
            WeatherCondition::Unknown => "",
        }
    }

    /// Higher values are more significant and win when a day is summarized by a
    /// single code.
    pub fn severity(&self) -> u8 {
        match self {
            WeatherCondition::Thunderstorms => 100,
            WeatherCondition::Showers | WeatherCondition::SnowShowers => 80,
            WeatherCondition::Snow => 70,
            WeatherCondition::Drizzle | WeatherCondition::Rain => 60,
            WeatherCondition::Fog => 50,
            WeatherCondition::Cloudy => 30,
            WeatherCondition::PartlyCloudy => 20,
            WeatherCondition::MostlyClear => 10,
            WeatherCondition::Clear | WeatherCondition::Unknown => 0,
        }
    }
}

impl std::fmt::Display for WeatherCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Textual category for a WMO code. Unknown or absent codes give an empty string.
pub fn describe_weather_code(code: Option<u8>) -> &'static str {
    code.map(WeatherCondition::from_code)
        .unwrap_or(WeatherCondition::Unknown)
        .label()
}
