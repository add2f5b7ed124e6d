//! Graphviz output of the automaton, printed by `--dot`.

use crate::{automaton::Automaton, grammar::SymbolID};
use std::fmt;

#[derive(Debug)]
pub struct DotGraph<'a, 'g> {
    aut: &'a Automaton<'g>,
}

impl<'a, 'g> DotGraph<'a, 'g> {
    pub fn new(aut: &'a Automaton<'g>) -> Self {
        Self { aut }
    }
}

impl fmt::Display for DotGraph<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let g = self.aut.grammar();

        writeln!(f, "digraph {{")?;
        writeln!(f, "  size=\"8,10\";")?;
        writeln!(f, "  node [shape=box, fontname=\"monospace\"];")?;

        for state in self.aut.states() {
            let mut label = format!("{}", state.id());
            for item in state.kernel() {
                label.push_str("\\n");
                label.push_str(&escape(&item.display(g).to_string()));
            }
            writeln!(f, "  {} [label=\"{}\"];", state.id(), label)?;
        }

        for state in self.aut.states() {
            for (symbol, to) in state.bundle() {
                let color = match symbol {
                    SymbolID::T(..) => "blue",
                    SymbolID::N(..) => "red",
                };
                writeln!(
                    f,
                    "  {} -> {} [label=\"{}\", color=\"{}\"];",
                    state.id(),
                    to,
                    escape(g.symbol_name(*symbol)),
                    color
                )?;
            }
        }

        writeln!(f, "}}")
    }
}

fn escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}
