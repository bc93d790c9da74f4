//! Pipeline stages for document extraction and answer rendering.
//!
//! Each submodule implements exactly one step and is tested on its own.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ literal ──▶ printable ──▶ normalize ──▶ (prompt) ──▶ llm ──▶ markup
//! (bytes)   (pass A)    (pass B,      (cleanup,                  (call)   (HTML)
//!                        if short)     fallback)
//! ```
//!
//! 1. [`input`]    : load a local path or URL into memory
//! 2. [`literal`]  : harvest parenthesised text-show literals
//! 3. [`printable`]: raw printable-run scan when pass A came up short
//! 4. [`normalize`]: whitespace cleanup, sufficiency check, placeholder text
//! 5. [`llm`]      : the only stage with network I/O, with timeout and retry
//! 6. [`markup`]   : reasoning removal and markdown → HTML rules

pub mod input;
pub mod literal;
pub mod llm;
pub mod markup;
pub mod normalize;
pub mod printable;
