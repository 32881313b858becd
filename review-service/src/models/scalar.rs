//! Lenient scalar fields for values the frontend sends either quoted or bare
//! (`"mark": 8` and `"mark": "8"`, `"reviewNumber": "1"` and `1`).

use serde::{de, Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Int(i64),
    Float(f64),
    Text(String),
}

impl Scalar {
    fn into_text(self) -> String {
        match self {
            Scalar::Int(n) => n.to_string(),
            Scalar::Float(f) => f.to_string(),
            Scalar::Text(s) => s,
        }
    }
}

/// String field that also accepts a JSON number.
pub fn string_from_scalar<'de, D>(d: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Scalar::deserialize(d)?.into_text())
}

/// Optional string field that also accepts a JSON number.
pub fn opt_string_from_scalar<'de, D>(d: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Scalar>::deserialize(d)?.map(Scalar::into_text))
}

/// Optional integer field that also accepts a numeric string. A blank string
/// reads as absent.
pub fn opt_i32_from_scalar<'de, D>(d: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = match Option::<Scalar>::deserialize(d)? {
        None => return Ok(None),
        Some(Scalar::Int(n)) => n,
        Some(Scalar::Float(f)) if f.fract() == 0.0 => f as i64,
        Some(Scalar::Float(f)) => {
            return Err(de::Error::custom(format!("expected a whole number, got {f}")))
        }
        Some(Scalar::Text(s)) => {
            let s = s.trim();
            if s.is_empty() {
                return Ok(None);
            }
            s.parse::<i64>()
                .map_err(|_| de::Error::custom(format!("expected a number, got {s:?}")))?
        }
    };

    i32::try_from(value)
        .map(Some)
        .map_err(|_| de::Error::custom(format!("number {value} out of range")))
}
