//! Operator translators.
//!
//! One module per operator family. Every translator is a pure function
//! from a [`LowerCtx`](crate::ctx::LowerCtx) to the values it produces;
//! registration happens in [`crate::registry::default_registry`].

pub mod reduce;
