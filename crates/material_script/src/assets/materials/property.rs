//! Recognized material property keys and their value types
//!
//! Keys are either scalar (`mapTo`, `alphaRef`) or stage-indexed
//! (`diffuseMap[0]`). Stage-indexed keys written without an index address
//! stage 0. Names are matched case-insensitively; [`PropertyKey::name`]
//! returns the canonical spelling.

use std::fmt;
use std::str::FromStr;

use super::material::TranslucentBlendOp;
use crate::foundation::math::{self, Color};

/// Number of texture stages a material can declare
pub const MAX_STAGES: usize = 4;

/// A recognized property key, with its stage index for indexed keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyKey {
    /// `mapTo` - mesh texture slot the material binds to
    MapTo,
    /// `translucentBlendOp`
    TranslucentBlendOp,
    /// `doubleSided`
    DoubleSided,
    /// `alphaTest`
    AlphaTest,
    /// `alphaRef` - alpha test threshold, 0-255
    AlphaRef,
    /// `translucent`
    Translucent,
    /// `castShadows`
    CastShadows,
    /// `planarReflection`
    PlanarReflection,
    /// `diffuseMap[n]`
    DiffuseMap(usize),
    /// `normalMap[n]`
    NormalMap(usize),
    /// `specularMap[n]`
    SpecularMap(usize),
    /// `specular[n]` - specular color
    Specular(usize),
    /// `specularPower[n]` - specular exponent
    SpecularPower(usize),
    /// `useAnisotropic[n]`
    UseAnisotropic(usize),
    /// `pixelSpecular[n]`
    PixelSpecular(usize),
    /// `subSurface[n]`
    SubSurface(usize),
    /// `subSurfaceColor[n]`
    SubSurfaceColor(usize),
    /// `diffuseColor[n]`
    DiffuseColor(usize),
    /// `glow[n]`
    Glow(usize),
    /// `emissive[n]`
    Emissive(usize),
}

/// Type a property's text value decodes to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// Free text
    Text,
    /// Texture file reference
    Texture,
    /// `0`/`1`/`true`/`false`
    Bool,
    /// Non-negative finite number
    Float,
    /// Integer in 0..=255
    AlphaRef,
    /// 3 or 4 floats
    Color,
    /// [`TranslucentBlendOp`] enumerator
    BlendOp,
}

/// A decoded property value
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    /// Text or texture reference
    Text(String),
    /// Flag
    Bool(bool),
    /// Number
    Float(f32),
    /// Alpha test threshold
    AlphaRef(u8),
    /// RGBA color
    Color(Color),
    /// Blend operation
    BlendOp(TranslucentBlendOp),
}

const SCALAR_KEYS: &[(&str, PropertyKey)] = &[
    ("mapTo", PropertyKey::MapTo),
    ("translucentBlendOp", PropertyKey::TranslucentBlendOp),
    ("doubleSided", PropertyKey::DoubleSided),
    ("alphaTest", PropertyKey::AlphaTest),
    ("alphaRef", PropertyKey::AlphaRef),
    ("translucent", PropertyKey::Translucent),
    ("castShadows", PropertyKey::CastShadows),
    ("planarReflection", PropertyKey::PlanarReflection),
];

const STAGE_KEYS: &[(&str, fn(usize) -> PropertyKey)] = &[
    ("diffuseMap", PropertyKey::DiffuseMap),
    ("normalMap", PropertyKey::NormalMap),
    ("specularMap", PropertyKey::SpecularMap),
    ("specular", PropertyKey::Specular),
    ("specularPower", PropertyKey::SpecularPower),
    ("useAnisotropic", PropertyKey::UseAnisotropic),
    ("pixelSpecular", PropertyKey::PixelSpecular),
    ("subSurface", PropertyKey::SubSurface),
    ("subSurfaceColor", PropertyKey::SubSurfaceColor),
    ("diffuseColor", PropertyKey::DiffuseColor),
    ("glow", PropertyKey::Glow),
    ("emissive", PropertyKey::Emissive),
];

impl PropertyKey {
    /// Look up a key from its name and optional stage index
    pub fn parse(name: &str, index: Option<usize>) -> Result<Self, String> {
        if let Some((_, key)) = SCALAR_KEYS.iter().find(|(n, _)| n.eq_ignore_ascii_case(name)) {
            return match index {
                None => Ok(*key),
                Some(i) => Err(format!("'{}' does not take a stage index (got [{i}])", key.name())),
            };
        }

        if let Some((canonical, make)) = STAGE_KEYS.iter().find(|(n, _)| n.eq_ignore_ascii_case(name)) {
            let stage = index.unwrap_or(0);
            if stage >= MAX_STAGES {
                return Err(format!(
                    "stage index {stage} of '{canonical}' is out of range (0..{MAX_STAGES})"
                ));
            }
            return Ok(make(stage));
        }

        Err(format!("'{name}' is not a recognized material property"))
    }

    /// Canonical property name without the index
    pub const fn name(&self) -> &'static str {
        match self {
            Self::MapTo => "mapTo",
            Self::TranslucentBlendOp => "translucentBlendOp",
            Self::DoubleSided => "doubleSided",
            Self::AlphaTest => "alphaTest",
            Self::AlphaRef => "alphaRef",
            Self::Translucent => "translucent",
            Self::CastShadows => "castShadows",
            Self::PlanarReflection => "planarReflection",
            Self::DiffuseMap(_) => "diffuseMap",
            Self::NormalMap(_) => "normalMap",
            Self::SpecularMap(_) => "specularMap",
            Self::Specular(_) => "specular",
            Self::SpecularPower(_) => "specularPower",
            Self::UseAnisotropic(_) => "useAnisotropic",
            Self::PixelSpecular(_) => "pixelSpecular",
            Self::SubSurface(_) => "subSurface",
            Self::SubSurfaceColor(_) => "subSurfaceColor",
            Self::DiffuseColor(_) => "diffuseColor",
            Self::Glow(_) => "glow",
            Self::Emissive(_) => "emissive",
        }
    }

    /// Stage index for stage-indexed keys
    pub const fn stage(&self) -> Option<usize> {
        match self {
            Self::DiffuseMap(i)
            | Self::NormalMap(i)
            | Self::SpecularMap(i)
            | Self::Specular(i)
            | Self::SpecularPower(i)
            | Self::UseAnisotropic(i)
            | Self::PixelSpecular(i)
            | Self::SubSurface(i)
            | Self::SubSurfaceColor(i)
            | Self::DiffuseColor(i)
            | Self::Glow(i)
            | Self::Emissive(i) => Some(*i),
            _ => None,
        }
    }

    /// Type of value this key holds
    pub const fn value_kind(&self) -> ValueKind {
        match self {
            Self::MapTo => ValueKind::Text,
            Self::DiffuseMap(_) | Self::NormalMap(_) | Self::SpecularMap(_) => ValueKind::Texture,
            Self::Specular(_) | Self::SubSurfaceColor(_) | Self::DiffuseColor(_) => ValueKind::Color,
            Self::SpecularPower(_) => ValueKind::Float,
            Self::AlphaRef => ValueKind::AlphaRef,
            Self::TranslucentBlendOp => ValueKind::BlendOp,
            Self::DoubleSided
            | Self::AlphaTest
            | Self::Translucent
            | Self::CastShadows
            | Self::PlanarReflection
            | Self::UseAnisotropic(_)
            | Self::PixelSpecular(_)
            | Self::SubSurface(_)
            | Self::Glow(_)
            | Self::Emissive(_) => ValueKind::Bool,
        }
    }

    /// Decode a raw text value for this key
    pub fn decode(&self, raw: &str) -> Result<PropertyValue, String> {
        match self.value_kind() {
            ValueKind::Text | ValueKind::Texture => Ok(PropertyValue::Text(raw.to_string())),
            ValueKind::Bool => parse_bool(raw).map(PropertyValue::Bool),
            ValueKind::Float => {
                let value = raw
                    .trim()
                    .parse::<f32>()
                    .map_err(|_| "expected a number".to_string())?;
                if !value.is_finite() || value < 0.0 {
                    return Err("expected a finite, non-negative number".to_string());
                }
                Ok(PropertyValue::Float(value))
            }
            ValueKind::AlphaRef => {
                let value = raw
                    .trim()
                    .parse::<i64>()
                    .map_err(|_| "expected an integer".to_string())?;
                u8::try_from(value)
                    .map(PropertyValue::AlphaRef)
                    .map_err(|_| format!("{value} is outside 0..=255"))
            }
            ValueKind::Color => math::parse_color(raw).map(PropertyValue::Color),
            ValueKind::BlendOp => raw.parse::<TranslucentBlendOp>().map(PropertyValue::BlendOp),
        }
    }
}

impl fmt::Display for PropertyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.stage() {
            Some(stage) => write!(f, "{}[{stage}]", self.name()),
            None => f.write_str(self.name()),
        }
    }
}

impl FromStr for PropertyKey {
    type Err = String;

    /// Parse `name` or `name[index]`
    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let text = text.trim();
        match text.split_once('[') {
            None => Self::parse(text, None),
            Some((name, rest)) => {
                let index = rest
                    .strip_suffix(']')
                    .and_then(|i| i.trim().parse::<usize>().ok())
                    .ok_or_else(|| format!("malformed index in '{text}'"))?;
                Self::parse(name.trim(), Some(index))
            }
        }
    }
}

/// Parse a script boolean
pub fn parse_bool(raw: &str) -> Result<bool, String> {
    let raw = raw.trim();
    if raw == "1" || raw.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if raw == "0" || raw.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(format!("expected 0, 1, true or false, found '{raw}'"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_indexed_and_scalar() {
        assert_eq!("diffuseMap[0]".parse::<PropertyKey>().unwrap(), PropertyKey::DiffuseMap(0));
        assert_eq!("subSurfaceColor[3]".parse::<PropertyKey>().unwrap(), PropertyKey::SubSurfaceColor(3));
        assert_eq!("alphaRef".parse::<PropertyKey>().unwrap(), PropertyKey::AlphaRef);
    }

    #[test]
    fn test_missing_index_means_stage_zero() {
        assert_eq!(PropertyKey::parse("normalMap", None).unwrap(), PropertyKey::NormalMap(0));
    }

    #[test]
    fn test_names_are_case_insensitive() {
        let key = PropertyKey::parse("SPECULARPOWER", Some(1)).unwrap();
        assert_eq!(key, PropertyKey::SpecularPower(1));
        assert_eq!(key.to_string(), "specularPower[1]");
    }

    #[test]
    fn test_rejects_unknown_and_bad_indices() {
        assert!(PropertyKey::parse("shininess", None).is_err());
        assert!(PropertyKey::parse("mapTo", Some(0)).is_err());
        assert!(PropertyKey::parse("diffuseMap", Some(MAX_STAGES)).is_err());
        assert!("diffuseMap[x]".parse::<PropertyKey>().is_err());
        assert!("diffuseMap[0".parse::<PropertyKey>().is_err());
    }

    #[test]
    fn test_decode_numeric_fields() {
        assert_eq!(PropertyKey::SpecularPower(0).decode("10").unwrap(), PropertyValue::Float(10.0));
        assert_eq!(PropertyKey::AlphaRef.decode("120").unwrap(), PropertyValue::AlphaRef(120));
        assert!(PropertyKey::AlphaRef.decode("256").is_err());
        assert!(PropertyKey::AlphaRef.decode("-1").is_err());
        assert!(PropertyKey::AlphaRef.decode("12.5").is_err());
        assert!(PropertyKey::SpecularPower(0).decode("ten").is_err());
        assert!(PropertyKey::SpecularPower(0).decode("-3").is_err());
        assert!(PropertyKey::SpecularPower(0).decode("NaN").is_err());
    }

    #[test]
    fn test_decode_flags_and_blend_op() {
        assert_eq!(PropertyKey::DoubleSided.decode("1").unwrap(), PropertyValue::Bool(true));
        assert_eq!(PropertyKey::AlphaTest.decode("False").unwrap(), PropertyValue::Bool(false));
        assert!(PropertyKey::UseAnisotropic(0).decode("yes").is_err());
        assert_eq!(
            PropertyKey::TranslucentBlendOp.decode("None").unwrap(),
            PropertyValue::BlendOp(TranslucentBlendOp::None)
        );
        assert!(PropertyKey::TranslucentBlendOp.decode("Screen").is_err());
    }

    #[test]
    fn test_value_kinds() {
        assert_eq!(PropertyKey::DiffuseMap(0).value_kind(), ValueKind::Texture);
        assert_eq!(PropertyKey::Specular(0).value_kind(), ValueKind::Color);
        assert_eq!(PropertyKey::MapTo.stage(), None);
        assert_eq!(PropertyKey::Glow(2).stage(), Some(2));
    }
}
