use std::env;
use std::net::SocketAddr;
use std::str::FromStr;

use crate::entities::TravelMode;
use crate::error::{config_error, Error};
use crate::session::DEFAULT_SPEED_LIMIT_KMH;

#[derive(Clone, Debug)]
pub struct Config {
    pub google_maps_api_base: String,
    pub google_maps_api_key: String,
    pub saferoute_api_base: String,
    pub speed_limit_kmh: f64,
    pub default_travel_mode: TravelMode,
    pub listen_addr: SocketAddr,
}

impl Config {
    /// Reads the process environment, after loading `.env` if one exists.
    pub fn from_env() -> Result<Self, Error> {
        dotenv::dotenv().ok();

        Self::from_lookup(|key| env::var(key))
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Result<String, env::VarError>,
    {
        let optional = |key: &str| match lookup(key) {
            Ok(value) => Ok(Some(value)),
            Err(env::VarError::NotPresent) => Ok(None),
            Err(err) => Err(Error::from(err)),
        };

        Ok(Self {
            google_maps_api_base: optional("GOOGLE_MAPS_API_BASE")?
                .unwrap_or_else(|| "maps.googleapis.com".into()),
            google_maps_api_key: lookup("GOOGLE_MAPS_API_KEY")?,
            saferoute_api_base: optional("SAFEROUTE_API_BASE")?
                .unwrap_or_else(|| "http://localhost:8000".into()),
            speed_limit_kmh: speed_limit(optional("SPEED_LIMIT_KMH")?)?,
            default_travel_mode: parse_or(optional("DEFAULT_TRAVEL_MODE")?, TravelMode::Driving)?,
            listen_addr: parse_or(
                optional("LISTEN_ADDR")?,
                SocketAddr::from(([127, 0, 0, 1], 3000)),
            )?,
        })
    }
}

fn parse_or<T: FromStr>(value: Option<String>, default: T) -> Result<T, Error> {
    match value {
        Some(value) => value.parse().map_err(|_| config_error(value)),
        None => Ok(default),
    }
}

/// A limit the session would reject at runtime is rejected at startup too.
fn speed_limit(value: Option<String>) -> Result<f64, Error> {
    let speed_limit_kmh = parse_or(value, DEFAULT_SPEED_LIMIT_KMH)?;

    if !speed_limit_kmh.is_finite() || speed_limit_kmh < 0.0 {
        return Err(config_error(speed_limit_kmh));
    }

    Ok(speed_limit_kmh)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Result<String, env::VarError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        move |key: &str| vars.get(key).cloned().ok_or(env::VarError::NotPresent)
    }

    #[test]
    fn defaults_apply() {
        let config = Config::from_lookup(lookup(&[("GOOGLE_MAPS_API_KEY", "test-key")])).unwrap();

        assert_eq!(config.google_maps_api_base, "maps.googleapis.com");
        assert_eq!(config.saferoute_api_base, "http://localhost:8000");
        assert_eq!(config.speed_limit_kmh, 60.0);
        assert_eq!(config.default_travel_mode, TravelMode::Driving);
        assert_eq!(config.listen_addr, SocketAddr::from(([127, 0, 0, 1], 3000)));
    }

    #[test]
    fn overrides_apply() {
        let config = Config::from_lookup(lookup(&[
            ("GOOGLE_MAPS_API_KEY", "test-key"),
            ("SPEED_LIMIT_KMH", "80"),
            ("DEFAULT_TRAVEL_MODE", "walking"),
            ("LISTEN_ADDR", "0.0.0.0:8080"),
        ]))
        .unwrap();

        assert_eq!(config.speed_limit_kmh, 80.0);
        assert_eq!(config.default_travel_mode, TravelMode::Walking);
        assert_eq!(config.listen_addr.port(), 8080);
    }

    #[test]
    fn missing_key_and_bad_values_fail() {
        assert_eq!(Config::from_lookup(lookup(&[])).unwrap_err().code, 1);

        let err = Config::from_lookup(lookup(&[
            ("GOOGLE_MAPS_API_KEY", "test-key"),
            ("SPEED_LIMIT_KMH", "fast"),
        ]))
        .unwrap_err();
        assert_eq!(err.code, 2);
    }

    #[test]
    fn unusable_speed_limits_fail() {
        for value in ["NaN", "-5", "inf"] {
            let err = Config::from_lookup(lookup(&[
                ("GOOGLE_MAPS_API_KEY", "test-key"),
                ("SPEED_LIMIT_KMH", value),
            ]))
            .unwrap_err();

            assert_eq!(err.code, 2, "{}", value);
        }

        let config = Config::from_lookup(lookup(&[
            ("GOOGLE_MAPS_API_KEY", "test-key"),
            ("SPEED_LIMIT_KMH", "0"),
        ]))
        .unwrap();
        assert_eq!(config.speed_limit_kmh, 0.0);
    }
}
