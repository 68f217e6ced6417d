//! Concrete model architecture implementations.
//!
//! A new architecture gets its own folder here and is wired into loading
//! through `crate::models::translit`.

pub mod seq2seq;
