//! Runtime support for parsers generated by `lalrgen`.
//!
//! The generator emits compressed tables as a [`Tables`] constant; the
//! [`engine::ParseEngine`] drives them over a stream of tokens.

pub mod definition;
pub mod engine;
pub mod tables;

pub use crate::{
    definition::{NonterminalIndex, ParseAction, ParserDef, RuleIndex, StateIndex, TerminalIndex},
    tables::Tables,
};
