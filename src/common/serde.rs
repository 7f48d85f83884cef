use std::{str::FromStr, time::Duration};

use serde::Deserialize;

pub(crate) fn deserialize_with_from_str<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let s = String::deserialize(deserializer)?;
    T::from_str(&s).map_err(|e| {
        serde::de::Error::custom(format!(
            "failed to parse {}: {}",
            std::any::type_name::<T>(),
            e
        ))
    })
}

/// Accepts `"5s"`, `"1m+30s"` or a bare number of seconds.
pub(crate) fn deserialize_with_option_duration<'de, D>(
    deserializer: D,
) -> Result<Option<Duration>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Seconds(u64),
        Text(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Seconds(secs)) => Ok(Some(Duration::from_secs(secs))),
        Some(Raw::Text(s)) => duration_str::parse(&s).map(Some).map_err(|e| {
            serde::de::Error::custom(format!("failed to parse duration [{}]: {}", s, e))
        }),
    }
}
