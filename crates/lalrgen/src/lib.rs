//! An LALR(1) parser table generator.
//!
//! The pipeline reads a grammar, builds the LR(0) automaton with its LALR(1)
//! lookaheads, fills and compresses the parse tables and emits them as Rust
//! source for `lalrgen-runtime`.
//!
//! ```
//! use lalrgen::{automaton::Automaton, grammar::Grammar, table};
//!
//! let mut grammar = Grammar::from_str("%token a\n%token b\n%start S\nS ::= a S b | a b ;\n")?;
//! grammar.build_extended_grammar();
//! grammar.build_rule_map();
//!
//! let aut = Automaton::build(&grammar);
//! let table = table::generate(&aut);
//! assert!(table.conflicts.is_empty());
//! # Ok::<(), lalrgen::grammar::GrammarError>(())
//! ```

pub mod automaton;
pub mod build;
pub mod codegen;
pub mod compress;
pub mod digraph;
pub mod dot;
pub mod grammar;
pub mod report;
pub mod syntax;
pub mod table;
pub mod types;
pub mod util;
