//! Math utilities and types
//!
//! Colors in material scripts are written as whitespace separated floats,
//! `"r g b"` or `"r g b a"`.

pub use nalgebra::Vector4;

/// RGBA color, components nominally in `0.0..=1.0`
pub type Color = Vector4<f32>;

/// Opaque white
pub fn white() -> Color {
    Color::new(1.0, 1.0, 1.0, 1.0)
}

/// Parse a color from `"r g b"` or `"r g b a"`; a missing alpha is 1.0
pub fn parse_color(text: &str) -> Result<Color, String> {
    let mut components = [0.0f32, 0.0, 0.0, 1.0];
    let mut count = 0;

    for token in text.split_whitespace() {
        if count == 4 {
            return Err(format!("expected 3 or 4 components, found more in '{text}'"));
        }
        let value = token
            .parse::<f32>()
            .map_err(|_| format!("'{token}' is not a number"))?;
        if !value.is_finite() {
            return Err(format!("'{token}' is not finite"));
        }
        components[count] = value;
        count += 1;
    }

    if count < 3 {
        return Err(format!("expected 3 or 4 components, found {count}"));
    }

    Ok(Color::new(components[0], components[1], components[2], components[3]))
}

/// Format a color the way material scripts store it
///
/// Uses the shortest representation that parses back to the same `f32`.
pub fn format_color(color: &Color) -> String {
    format!("{} {} {} {}", color.x, color.y, color.z, color.w)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_parse_rgba() {
        let c = parse_color("0.811765 0.909804 0.298039 1").unwrap();
        assert_relative_eq!(c.x, 0.811_765);
        assert_relative_eq!(c.y, 0.909_804);
        assert_relative_eq!(c.z, 0.298_039);
        assert_relative_eq!(c.w, 1.0);
    }

    #[test]
    fn test_parse_rgb_defaults_alpha() {
        let c = parse_color("0.9  0.9\t0.9").unwrap();
        assert_relative_eq!(c.w, 1.0);
        assert_relative_eq!(c.x, 0.9);
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(parse_color("1 1").is_err());
        assert!(parse_color("1 1 1 1 1").is_err());
        assert!(parse_color("1 red 1").is_err());
        assert!(parse_color("").is_err());
        assert!(parse_color("inf 0 0").is_err());
    }

    #[test]
    fn test_format_parses_back() {
        let c = Color::new(0.882_353, 0.341_177, 0.560_784, 1.0);
        assert_eq!(parse_color(&format_color(&c)).unwrap(), c);
        assert_eq!(format_color(&white()), "1 1 1 1");
    }
}
