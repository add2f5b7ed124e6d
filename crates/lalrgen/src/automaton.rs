//! LALR(1) automaton construction.
//!
//! The LR(0) states are built first, merging states by their kernel. The
//! look-ahead sets of the reductions are then computed with DeRemer and
//! Pennello's relations\[1\]:
//!
//! - `(p,A) reads (r,C)` iff `p --(A)--> r --(C)-->` and `C =>* ε`
//! - `(p,A) includes (p',B)` iff `B -> β A γ`, `γ =>* ε` and `p' --(β)--> p`
//! - `(q,A->ω) lookback (p,A)` iff `p --(ω)--> q`
//!
//! Both relations are stored as a [`Digraph`] over the goto transitions and
//! solved by worklist propagation, which copes with the cycles produced by
//! recursive rules.
//!
//! \[1\]: DeRemer and Pennello, Efficient Computation of LALR(1) Look-Ahead Sets
//!       <https://dl.acm.org/doi/10.1145/69622.357187>

use crate::{
    digraph::Digraph,
    grammar::{Grammar, NonterminalID, RuleID, SymbolID, TerminalID, TerminalSet},
    types::{Map, Set},
    util::display_fn,
};
use std::fmt;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct StateID {
    raw: usize,
}
impl StateID {
    pub const INITIAL: Self = Self::new(0);

    #[inline]
    const fn new(raw: usize) -> Self {
        Self { raw }
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.raw
    }

    #[inline]
    pub const fn from_index(index: usize) -> Self {
        Self::new(index)
    }
}
impl fmt::Display for StateID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.raw, f)
    }
}

/// The LR(0) item, a rule with the recognized prefix of its right-hand side.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Item {
    pub rule: RuleID,
    pub dot: u16,
}
impl Item {
    pub const fn new(rule: RuleID, dot: u16) -> Self {
        Self { rule, dot }
    }

    /// The symbol right after the dot, if any.
    pub fn next_symbol(&self, g: &Grammar) -> Option<SymbolID> {
        g.rule(self.rule).right().get(usize::from(self.dot)).copied()
    }

    pub fn is_complete(&self, g: &Grammar) -> bool {
        usize::from(self.dot) == g.rule(self.rule).right().len()
    }

    fn advance(self) -> Self {
        Self {
            dot: self.dot + 1,
            ..self
        }
    }

    // `"A ::= a . B c"`
    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(|f| {
            let rule = g.rule(self.rule);
            write!(f, "{} ::=", g.nonterminals[&rule.left()])?;
            for (i, symbol) in rule.right().iter().enumerate() {
                if i == usize::from(self.dot) {
                    f.write_str(" .")?;
                }
                write!(f, " {}", g.symbol_name(*symbol))?;
            }
            if self.is_complete(g) {
                f.write_str(" .")?;
            }
            Ok(())
        })
    }
}

#[derive(Debug, Clone)]
pub struct State {
    id: StateID,
    kernel: Vec<Item>,
    closure: Vec<Item>,
    bundle: Map<SymbolID, StateID>,
    default_reduce: Option<RuleID>,
}

impl State {
    pub fn id(&self) -> StateID {
        self.id
    }

    /// The sorted items this state was created from.
    pub fn kernel(&self) -> &[Item] {
        &self.kernel
    }

    /// All items of this state: the kernel items, then the items added by
    /// the closure in discovery order.
    pub fn closure(&self) -> &[Item] {
        &self.closure
    }

    /// The transitions of this state, in the order the symbols first appear
    /// after a dot in the closure.
    pub fn bundle(&self) -> &Map<SymbolID, StateID> {
        &self.bundle
    }

    pub fn shifts(&self) -> impl Iterator<Item = (TerminalID, StateID)> + '_ {
        self.bundle.iter().filter_map(|(symbol, to)| match symbol {
            SymbolID::T(t) => Some((*t, *to)),
            SymbolID::N(..) => None,
        })
    }

    pub fn gotos(&self) -> impl Iterator<Item = (NonterminalID, StateID)> + '_ {
        self.bundle.iter().filter_map(|(symbol, to)| match symbol {
            SymbolID::N(n) => Some((*n, *to)),
            SymbolID::T(..) => None,
        })
    }

    /// The rule reduced regardless of the lookahead symbol, if chosen.
    pub fn default_reduce(&self) -> Option<RuleID> {
        self.default_reduce
    }
}

/// A goto transition `(from, symbol)`, the node type of the relations.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Goto {
    pub from: StateID,
    pub symbol: NonterminalID,
}

/// The LALR(1) automaton of an extended grammar.
#[derive(Debug)]
pub struct Automaton<'g> {
    grammar: &'g Grammar,
    states: Vec<State>,
    gotos: Map<Goto, StateID>,
    reads: Digraph,
    includes: Digraph,
    read_sets: Vec<TerminalSet>,
    follows: Vec<TerminalSet>,
    lookbacks: Map<(StateID, RuleID), Vec<usize>>,
    lookaheads: Map<(StateID, Item), TerminalSet>,
    accept_state: StateID,
    stats: PropagationStats,
}

/// The number of nodes processed while solving each relation.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct PropagationStats {
    pub reads: usize,
    pub includes: usize,
}

impl<'g> Automaton<'g> {
    /// Build the LALR(1) automaton.
    ///
    /// # Panics
    /// Panics if the grammar has not been extended with
    /// [`Grammar::build_extended_grammar`] or lacks the rule map built by
    /// [`Grammar::build_rule_map`].
    pub fn build(g: &'g Grammar) -> Self {
        assert!(
            g.is_extended(),
            "build_extended_grammar() must be called before building the automaton"
        );
        assert!(
            g.has_rule_map(),
            "build_rule_map() must be called before building the automaton"
        );

        let states = lr0(g);
        tracing::debug!(states = states.len(), "LR(0) automaton built");

        let mut gotos = Map::default();
        for state in &states {
            for (symbol, to) in state.gotos() {
                gotos.insert(
                    Goto {
                        from: state.id,
                        symbol,
                    },
                    to,
                );
            }
        }

        let mut aut = Self {
            grammar: g,
            states,
            gotos,
            reads: Digraph::default(),
            includes: Digraph::default(),
            read_sets: vec![],
            follows: vec![],
            lookbacks: Map::default(),
            lookaheads: Map::default(),
            accept_state: StateID::INITIAL,
            stats: PropagationStats::default(),
        };
        aut.build_relations();
        aut.build_lookaheads();
        aut.build_default_reductions();
        aut
    }

    pub fn grammar(&self) -> &'g Grammar {
        self.grammar
    }

    pub fn states(&self) -> &[State] {
        &self.states
    }

    pub fn state(&self, id: StateID) -> &State {
        &self.states[id.raw]
    }

    /// The state that contains the completed item `$accept ::= Start $end .`.
    pub fn accept_state(&self) -> StateID {
        self.accept_state
    }

    /// Return the goto transitions. Their positions are the node ids of the
    /// [`reads`](Self::reads) and [`includes`](Self::includes) graphs.
    pub fn gotos(&self) -> &Map<Goto, StateID> {
        &self.gotos
    }

    /// `x -> y` where `y reads x`.
    pub fn reads(&self) -> &Digraph {
        &self.reads
    }

    /// `x -> y` where `y includes x`.
    pub fn includes(&self) -> &Digraph {
        &self.includes
    }

    /// The terminals that can follow the goto transition without the help
    /// of the `includes` relation.
    pub fn read_set(&self, goto: &Goto) -> Option<&TerminalSet> {
        self.gotos
            .get_index_of(goto)
            .map(|node| &self.read_sets[node])
    }

    pub fn follow(&self, goto: &Goto) -> Option<&TerminalSet> {
        self.gotos.get_index_of(goto).map(|node| &self.follows[node])
    }

    /// The goto transitions the completion of `rule` in `state` goes back to.
    pub fn lookbacks(&self, state: StateID, rule: RuleID) -> impl Iterator<Item = &Goto> + '_ {
        self.lookbacks
            .get(&(state, rule))
            .into_iter()
            .flatten()
            .filter_map(|node| self.gotos.get_index(*node).map(|(goto, _)| goto))
    }

    /// The look-ahead set of a completed item.
    pub fn lookaheads(&self, state: StateID, item: Item) -> Option<&TerminalSet> {
        self.lookaheads.get(&(state, item))
    }

    /// The completed items of the state with their look-ahead sets, in closure order.
    pub fn reductions(&self, state: StateID) -> impl Iterator<Item = (Item, &TerminalSet)> + '_ {
        self.state(state)
            .closure
            .iter()
            .filter_map(move |item| Some((*item, self.lookaheads.get(&(state, *item))?)))
    }

    pub fn propagation_stats(&self) -> PropagationStats {
        self.stats
    }

    fn build_relations(&mut self) {
        let g = self.grammar;
        let node_count = self.gotos.len();

        let mut reads = Digraph::new(node_count);
        let mut read_sets = Vec::with_capacity(node_count);
        for (node, (_goto, to)) in self.gotos.iter().enumerate() {
            let to_state = &self.states[to.raw];
            // DR(p,A) = { t | p --(A)--> r --(t)--> }
            read_sets.push(to_state.shifts().map(|(t, _)| t).collect::<TerminalSet>());
            for (symbol, _) in to_state.gotos() {
                if g.nullables.contains(&symbol) {
                    let read = Goto {
                        from: *to,
                        symbol,
                    };
                    if let Some(x) = self.gotos.get_index_of(&read) {
                        reads.add_edge(x, node);
                    }
                }
            }
        }

        // Walk every rule `B -> X1 .. Xn` from every goto (p',B).
        let mut includes = Digraph::new(node_count);
        let mut lookbacks: Map<(StateID, RuleID), Vec<usize>> = Map::default();
        for (node, goto) in self.gotos.keys().enumerate() {
            for &rule in g.rules_of(goto.symbol) {
                let right = g.rule(rule).right();
                let mut current = goto.from;
                for (i, symbol) in right.iter().enumerate() {
                    if let SymbolID::N(n) = symbol {
                        if right[i + 1..].iter().all(|s| g.is_nullable(*s)) {
                            let included = Goto {
                                from: current,
                                symbol: *n,
                            };
                            if let Some(x) = self.gotos.get_index_of(&included) {
                                includes.add_edge(node, x);
                            }
                        }
                    }
                    match self.states[current.raw].bundle.get(symbol) {
                        Some(next) => current = *next,
                        None => unreachable!("missing transition while walking a rule"),
                    }
                }
                let nodes = lookbacks.entry((current, rule)).or_default();
                if !nodes.contains(&node) {
                    nodes.push(node);
                }
            }
        }

        tracing::debug!(
            nodes = node_count,
            reads = reads.edge_count(),
            includes = includes.edge_count(),
            "relations built"
        );

        self.stats.reads = reads.propagate(&mut read_sets);
        let mut follows = read_sets.clone();
        self.stats.includes = includes.propagate(&mut follows);

        self.reads = reads;
        self.includes = includes;
        self.read_sets = read_sets;
        self.follows = follows;
        self.lookbacks = lookbacks;
    }

    fn build_lookaheads(&mut self) {
        let g = self.grammar;
        let accept_item = Item::new(RuleID::ACCEPT, 2);

        let mut lookaheads = Map::default();
        for state in &self.states {
            for item in &state.closure {
                if !item.is_complete(g) {
                    continue;
                }
                // LA(q, A->ω) = \bigcup { Follow(p,A) | (q,A->ω) lookback (p,A) }
                let mut la = TerminalSet::default();
                if let Some(nodes) = self.lookbacks.get(&(state.id, item.rule)) {
                    for node in nodes {
                        la.union_with(&self.follows[*node]);
                    }
                }
                if *item == accept_item {
                    la.insert(TerminalID::EOI);
                    self.accept_state = state.id;
                }
                lookaheads.insert((state.id, *item), la);
            }
        }
        self.lookaheads = lookaheads;
    }

    fn build_default_reductions(&mut self) {
        let mut defaults = Vec::with_capacity(self.states.len());
        for state in &self.states {
            let reductions: Vec<_> = self.reductions(state.id).collect();
            let disjoint = reductions.iter().enumerate().all(|(i, (_, la))| {
                reductions[i + 1..]
                    .iter()
                    .all(|(_, other)| la.is_disjoint(other))
            });
            let mut chosen: Option<(Item, &TerminalSet)> = None;
            if disjoint {
                for &(item, la) in &reductions {
                    if chosen.map_or(true, |(_, max)| la.len() > max.len()) {
                        chosen = Some((item, la));
                    }
                }
            }
            defaults.push(chosen.map(|(item, _)| item.rule));
        }

        for (state, default_reduce) in self.states.iter_mut().zip(defaults) {
            if let Some(rule) = default_reduce {
                tracing::trace!(state = state.id.raw, rule = rule.index(), "default reduction");
            }
            state.default_reduce = default_reduce;
        }
    }
}

/// Build the LR(0) states, numbered in the order they are discovered.
fn lr0(g: &Grammar) -> Vec<State> {
    let mut kernels = Map::<Vec<Item>, StateID>::default();
    kernels.insert(vec![Item::new(RuleID::ACCEPT, 0)], StateID::INITIAL);

    let mut states = Vec::new();
    let mut closure_items = Set::default();
    let mut successors = Map::<SymbolID, Vec<Item>>::default();
    let mut current = 0;
    while let Some((kernel, &id)) = kernels.get_index(current) {
        let kernel = kernel.clone();

        closure_items.clear();
        closure_items.extend(kernel.iter().copied());
        let mut i = 0;
        while let Some(item) = closure_items.get_index(i).copied() {
            if let Some(SymbolID::N(n)) = item.next_symbol(g) {
                for &rule in g.rules_of(n) {
                    closure_items.insert(Item::new(rule, 0));
                }
            }
            i += 1;
        }
        let closure: Vec<_> = closure_items.iter().copied().collect();

        successors.clear();
        for item in &closure {
            if let Some(symbol) = item.next_symbol(g) {
                successors.entry(symbol).or_default().push(item.advance());
            }
        }

        let mut bundle = Map::default();
        for (symbol, mut next_kernel) in successors.drain(..) {
            next_kernel.sort();
            let next_id = StateID::new(kernels.len());
            let next = *kernels.entry(next_kernel).or_insert(next_id);
            bundle.insert(symbol, next);
        }

        tracing::trace!(state = id.raw, items = closure.len(), transitions = bundle.len(), "state");
        states.push(State {
            id,
            kernel,
            closure,
            bundle,
            default_reduce: None,
        });
        current += 1;
    }

    states
}

impl fmt::Display for Automaton<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let g = self.grammar;
        for state in &self.states {
            writeln!(f, "## state {}", state.id)?;
            for item in &state.kernel {
                writeln!(f, "- {}", item.display(g))?;
            }
            for (symbol, to) in &state.bundle {
                writeln!(f, "  {} => {}", g.symbol_name(*symbol), to)?;
            }
            for (item, la) in self.reductions(state.id) {
                write!(f, "  reduce {} on", item.rule)?;
                for t in la.iter() {
                    write!(f, " {}", g.terminals[&t])?;
                }
                writeln!(f)?;
            }
            if let Some(rule) = state.default_reduce {
                writeln!(f, "  default reduce {}", rule)?;
            }
        }
        Ok(())
    }
}
