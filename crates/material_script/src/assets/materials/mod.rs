//! Material script subsystem
//!
//! Parsing, decoding, registry, caching, validation and writing of
//! `singleton Material(...)` declarations.

pub mod lexer;
pub mod script_parser;
pub mod property;
pub mod material;
pub mod material_loader;
pub mod material_library;
pub mod material_cache;
pub mod material_writer;
pub mod validation;

pub use script_parser::{MaterialScriptParser, RawMaterial, RawProperty};
pub use property::{PropertyKey, PropertyValue, ValueKind, MAX_STAGES};
pub use material::{Material, MaterialStage, TranslucentBlendOp};
pub use material_loader::MaterialLoader;
pub use material_library::{MaterialLibrary, MaterialHandle};
pub use material_cache::MaterialCache;
pub use material_writer::MaterialWriter;
pub use validation::{Validator, Checks, Diagnostic, Severity, Report};
