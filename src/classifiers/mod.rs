pub mod pm25;
pub mod weather_code;

pub use pm25::{classify_pm25, Pm25Category, PM25_BREAKPOINTS, UNHEALTHY_PM25_THRESHOLD};
pub use weather_code::{describe_weather_code, WeatherCondition};
