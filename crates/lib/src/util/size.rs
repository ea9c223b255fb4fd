//! Memory and disk size parsing.
//!
//! Sizes are written as a number with an optional unit (`256M`, `1G`,
//! `512MB`, `2048`). Plain numbers are megabytes.

use serde_json::Value;

use crate::error::ContentError;

/// Parse a size into megabytes.
///
/// Kilobyte values are rounded down. Units are case-insensitive.
pub fn parse_megabytes(owner: &str, value: &Value) -> Result<u64, ContentError> {
  let invalid = || ContentError::InvalidMemory {
    owner: owner.to_string(),
    value: value.to_string().trim_matches('"').to_string(),
  };

  let text = match value {
    Value::Number(n) => return n.as_u64().ok_or_else(invalid),
    Value::String(s) => s.trim().to_ascii_uppercase(),
    _ => return Err(invalid()),
  };

  let (digits, factor_kb): (&str, u64) = if let Some(d) = text.strip_suffix("GB").or_else(|| text.strip_suffix('G')) {
    (d, 1024 * 1024)
  } else if let Some(d) = text.strip_suffix("MB").or_else(|| text.strip_suffix('M')) {
    (d, 1024)
  } else if let Some(d) = text.strip_suffix("KB").or_else(|| text.strip_suffix('K')) {
    (d, 1)
  } else {
    (text.as_str(), 1024)
  };

  let amount: u64 = digits.trim().parse().map_err(|_| invalid())?;
  Ok(amount.saturating_mul(factor_kb) / 1024)
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn units_are_normalised_to_megabytes() {
    assert_eq!(parse_megabytes("web", &json!("256M")).unwrap(), 256);
    assert_eq!(parse_megabytes("web", &json!("256MB")).unwrap(), 256);
    assert_eq!(parse_megabytes("web", &json!("1G")).unwrap(), 1024);
    assert_eq!(parse_megabytes("web", &json!("2gb")).unwrap(), 2048);
    assert_eq!(parse_megabytes("web", &json!("2048K")).unwrap(), 2);
  }

  #[test]
  fn plain_numbers_are_megabytes() {
    assert_eq!(parse_megabytes("web", &json!(512)).unwrap(), 512);
    assert_eq!(parse_megabytes("web", &json!("512")).unwrap(), 512);
  }

  #[test]
  fn garbage_is_content_error() {
    let err = parse_megabytes("web", &json!("lots")).unwrap_err();
    assert_eq!(
      err,
      ContentError::InvalidMemory {
        owner: "web".to_string(),
        value: "lots".to_string(),
      }
    );
    assert!(parse_megabytes("web", &json!(true)).is_err());
  }
}
