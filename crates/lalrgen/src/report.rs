//! Human readable description of the automaton, printed by `--verbose`.

use crate::{
    automaton::{Automaton, State},
    grammar::{Grammar, RuleID, SymbolID},
    table::{Action, ConflictKind, ParseTable},
};
use std::fmt;

/// The states of the automaton together with the actions that ended up in
/// the parse table.
///
/// The reductions that lost an unresolved conflict are listed in brackets.
#[derive(Debug)]
pub struct Report<'a, 'g> {
    aut: &'a Automaton<'g>,
    table: &'a ParseTable,
}

impl<'a, 'g> Report<'a, 'g> {
    pub fn new(aut: &'a Automaton<'g>, table: &'a ParseTable) -> Self {
        Self { aut, table }
    }

    fn write_state(&self, f: &mut fmt::Formatter<'_>, state: &State) -> fmt::Result {
        let g = self.aut.grammar();
        let q = state.id();
        let conflicts: Vec<_> = self.table.conflicts.iter().filter(|c| c.state == q).collect();

        writeln!(f, "state {}:", q)?;
        for item in state.kernel() {
            writeln!(f, "    {}", item.display(g))?;
        }
        writeln!(f)?;

        for t in g.terminals.keys() {
            let name = &g.terminals[t];
            if self.table.actions[q.index()][t.index()] != 0 {
                match self.table.action(q, *t) {
                    Action::Shift(to) => writeln!(f, "    {:<12} shift, and go to state {}", name, to)?,
                    Action::Reduce(rule) => {
                        writeln!(f, "    {:<12} reduce using rule {}", name, RuleDisplay(g, rule))?
                    }
                    Action::Error => (),
                }
            } else if self.table.is_nonassoc_error(q, *t) {
                writeln!(f, "    {:<12} error (nonassoc)", name)?;
            }

            for conflict in conflicts.iter().filter(|c| c.terminal == *t) {
                let lost = match conflict.kind {
                    ConflictKind::ShiftReduce { rule, .. } => rule,
                    ConflictKind::ReduceReduce { dropped, .. } => dropped,
                };
                writeln!(f, "    {:<12} [reduce using rule {}]", name, RuleDisplay(g, lost))?;
            }
        }

        for (symbol, to) in state.bundle() {
            if let SymbolID::N(n) = symbol {
                writeln!(f, "    {:<12} go to state {}", g.nonterminals[n], to)?;
            }
        }

        let default = self.table.action_default[q.index()];
        if default > 0 {
            let rule = RuleID::from_index(default as usize - 1);
            writeln!(f, "    {:<12} reduce using rule {}", "$default", RuleDisplay(g, rule))?;
        }

        for conflict in &conflicts {
            let name = &g.terminals[&conflict.terminal];
            match conflict.kind {
                ConflictKind::ShiftReduce { rule, .. } => {
                    writeln!(f, "    *** shift/reduce conflict on `{}' with rule {}", name, rule)?
                }
                ConflictKind::ReduceReduce { kept, dropped } => writeln!(
                    f,
                    "    *** reduce/reduce conflict on `{}' between rules {}, {}",
                    name, kept, dropped
                )?,
            }
        }
        writeln!(f)
    }
}

struct RuleDisplay<'g>(&'g Grammar, RuleID);

impl fmt::Display for RuleDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.1, self.0.rule(self.1).display(self.0))
    }
}

impl fmt::Display for Report<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let g = self.aut.grammar();

        writeln!(f, "## grammar")?;
        for rule in g.rules.values() {
            writeln!(f, "{:>5}: {}", rule.id(), rule.display(g))?;
        }
        writeln!(f)?;

        writeln!(f, "## states")?;
        for state in self.aut.states() {
            self.write_state(f, state)?;
        }
        Ok(())
    }
}
