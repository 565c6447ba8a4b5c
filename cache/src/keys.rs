use std::fmt;

/// Builder for colon-separated cache keys.
///
/// Segments are trimmed and lowercased, and any `:` inside a segment is
/// replaced so callers cannot forge a different key shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheKey {
    segments: Vec<String>,
}

impl CacheKey {
    pub fn new(namespace: impl AsRef<str>) -> Self {
        Self {
            segments: vec![Self::normalize(namespace.as_ref())],
        }
    }

    /// Current weather for a city, keyed by units and language.
    pub fn weather(city: &str, units: &str, lang: &str) -> Self {
        Self::new("weather").part(city).part(units).part(lang)
    }

    /// Latest quote for a crypto symbol converted into `convert`.
    ///
    /// The conversion currency is always part of the key so quotes in
    /// different currencies never collide.
    pub fn crypto_quote(symbol: &str, convert: &str) -> Self {
        Self::new("crypto").part(symbol).part(convert)
    }

    pub fn part(mut self, segment: impl AsRef<str>) -> Self {
        self.segments.push(Self::normalize(segment.as_ref()));
        self
    }

    pub fn build(&self) -> String {
        self.segments.join(":")
    }

    fn normalize(segment: &str) -> String {
        segment.trim().to_lowercase().replace(':', "_")
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weather_key() {
        assert_eq!(
            CacheKey::weather(" Paris ", "metric", "ru").build(),
            "weather:paris:metric:ru"
        );
    }

    #[test]
    fn test_crypto_key_includes_conversion_currency() {
        assert_eq!(CacheKey::crypto_quote("BTC", "USD").to_string(), "crypto:btc:usd");
        assert_ne!(
            CacheKey::crypto_quote("BTC", "USD"),
            CacheKey::crypto_quote("BTC", "EUR")
        );
    }

    #[test]
    fn test_separator_inside_segment_is_escaped() {
        assert_eq!(CacheKey::new("weather").part("a:b").build(), "weather:a_b");
    }
}
