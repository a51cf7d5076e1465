//! Asset management system

pub mod materials;

pub use materials::{
    MaterialScriptParser, RawMaterial,
    Material, MaterialStage, TranslucentBlendOp,
    MaterialLoader, MaterialLibrary, MaterialHandle, MaterialCache,
    MaterialWriter,
    Validator, Checks, Diagnostic, Severity, Report,
};
