//! The `Player` entity (spec.md §3) and alliance tag/color derivation
//! (spec.md §4.2 `set_alliance_tag`).

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub user_id: String,
    pub display_name: String,
    pub alliance_tag: Option<String>,
    pub alliance_color: Option<String>,
    pub energy: f64,
    pub last_update: i64,
}

impl Player {
    pub fn new_lazy(user_id: impl Into<String>, initial_energy: f64, now: i64) -> Self {
        let user_id = user_id.into();
        Self {
            display_name: user_id.clone(),
            user_id,
            alliance_tag: None,
            alliance_color: None,
            energy: initial_energy,
            last_update: now,
        }
    }
}

/// Normalize and validate a candidate alliance tag. `None` means "leave
/// alliance" and always succeeds. A `Some` value must trim+upcase to
/// `^[A-Z0-9]{3,4}$`, otherwise this raises `InvalidAllianceTag` (this is a
/// programmer/validation error per spec.md §7, not a rule-failure value).
pub fn normalize_alliance_tag(tag: Option<&str>) -> Result<Option<String>, EngineError> {
    let Some(raw) = tag else {
        return Ok(None);
    };

    let normalized = raw.trim().to_uppercase();
    let valid = (3..=4).contains(&normalized.len())
        && normalized.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit());

    if !valid {
        return Err(EngineError::InvalidAllianceTag { tag: raw.to_string() });
    }

    Ok(Some(normalized))
}

/// Deterministically derive `#RRGGBB` from an alliance tag: `h = (Σ
/// 31^(n-1) * codepoint) mod 360`, HSL(h, 68%, 56%) converted to RGB.
pub fn alliance_color(tag: &str) -> String {
    let mut hash: i64 = 0;
    for (i, c) in tag.chars().enumerate() {
        let weight = 31i64.pow(i as u32);
        hash = hash.wrapping_add(weight.wrapping_mul(c as i64));
    }
    let hue = hash.rem_euclid(360) as f64;

    let (r, g, b) = hsl_to_rgb(hue, 0.68, 0.56);
    format!("#{:02X}{:02X}{:02X}", r, g, b)
}

fn hsl_to_rgb(h: f64, s: f64, l: f64) -> (u8, u8, u8) {
    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let h_prime = h / 60.0;
    let x = c * (1.0 - (h_prime.rem_euclid(2.0) - 1.0).abs());
    let m = l - c / 2.0;

    let (r1, g1, b1) = match h_prime as i32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };

    let to_u8 = |v: f64| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;
    (to_u8(r1), to_u8(g1), to_u8(b1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_tag_normalizes_to_none() {
        assert_eq!(normalize_alliance_tag(None).unwrap(), None);
    }

    #[test]
    fn tag_is_trimmed_and_upcased() {
        assert_eq!(
            normalize_alliance_tag(Some(" fox ")).unwrap(),
            Some("FOX".to_string())
        );
    }

    #[test]
    fn tag_rejects_bad_length_and_characters() {
        assert!(normalize_alliance_tag(Some("AB")).is_err());
        assert!(normalize_alliance_tag(Some("ABCDE")).is_err());
        assert!(normalize_alliance_tag(Some("A-X")).is_err());
    }

    #[test]
    fn color_is_deterministic() {
        let a = alliance_color("FOX");
        let b = alliance_color("FOX");
        assert_eq!(a, b);
        assert_eq!(a.len(), 7);
        assert!(a.starts_with('#'));
    }

    #[test]
    fn color_differs_for_different_tags() {
        assert_ne!(alliance_color("FOX"), alliance_color("WOLF"));
    }
}
