//! Parser definition.

/// The number to identify a state of the LR automaton.
pub type StateIndex = i32;

/// The number to identify a terminal symbol.
pub type TerminalIndex = i32;

/// The number to identify a nonterminal symbol, counted from the first nonterminal.
pub type NonterminalIndex = i32;

/// The number to identify a production rule.
pub type RuleIndex = usize;

/// The terminal number reserved for the end of input.
pub const EOF_SYMBOL: TerminalIndex = 0;

/// The trait for abstracting the generated LALR(1) parse table.
pub trait ParserDef {
    /// Return the initial state number.
    fn initial_state(&self) -> StateIndex;

    /// Return whether the action in `state` depends on the lookahead symbol.
    ///
    /// When this returns `false`, [`action`](Self::action) yields the same
    /// result for every terminal and the driver may skip reading a token.
    fn needs_lookahead(&self, state: StateIndex) -> bool;

    /// Return the action corresponding to the specified state number and
    /// lookahead symbol.
    fn action(&self, state: StateIndex, lookahead: TerminalIndex) -> ParseAction;

    /// Return the state to transition after reducing to `lhs` in `state`.
    fn goto(&self, state: StateIndex, lhs: NonterminalIndex) -> StateIndex;
}

impl<T: ?Sized> ParserDef for &T
where
    T: ParserDef,
{
    fn initial_state(&self) -> StateIndex {
        (**self).initial_state()
    }

    fn needs_lookahead(&self, state: StateIndex) -> bool {
        (**self).needs_lookahead(state)
    }

    fn action(&self, state: StateIndex, lookahead: TerminalIndex) -> ParseAction {
        (**self).action(state, lookahead)
    }

    fn goto(&self, state: StateIndex, lhs: NonterminalIndex) -> StateIndex {
        (**self).goto(state, lhs)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ParseAction {
    /// Read the lookahead symbol and transition to the specified state.
    Shift(StateIndex),

    /// Pop `len` symbols and push `lhs`, matching the production `rule`.
    Reduce {
        rule: RuleIndex,
        lhs: NonterminalIndex,
        len: usize,
    },

    /// The input has been recognized.
    Accept,

    /// The lookahead symbol is not acceptable in this state.
    Fail,
}
