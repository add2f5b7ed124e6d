//! The implementation of LALR(1) parser engine.

use crate::definition::{
    NonterminalIndex, ParseAction, ParserDef, RuleIndex, StateIndex, TerminalIndex, EOF_SYMBOL,
};
use std::fmt;

/// A trait for abstracting token symbols.
pub trait Token {
    /// Return the terminal number corresponding to this token.
    fn to_index(&self) -> TerminalIndex;
}

impl Token for TerminalIndex {
    fn to_index(&self) -> TerminalIndex {
        *self
    }
}

/// The instance of LALR(1) parser engine that drives incrementally, based on generated tables.
pub struct ParseEngine<TDef, TTok>
where
    TDef: ParserDef,
    TTok: Token,
{
    definition: TDef,
    state: ParseEngineState,
    states_stack: Vec<StateIndex>,
    symbols_stack: Vec<Symbol<TTok>>,
    // `Some(None)` means the end of input has been offered.
    lookahead: Option<Option<TTok>>,
}

impl<TDef, TTok> fmt::Debug for ParseEngine<TDef, TTok>
where
    TDef: ParserDef + fmt::Debug,
    TTok: Token + fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParseEngine")
            .field("definition", &self.definition)
            .field("state", &self.state)
            .field("states_stack", &self.states_stack)
            .field("symbols_stack", &self.symbols_stack)
            .field("lookahead", &self.lookahead)
            .finish()
    }
}

#[derive(Debug, Copy, Clone)]
enum ParseEngineState {
    Pending,
    WaitingInput,
    Shifting(StateIndex),
    Reducing(NonterminalIndex, usize),
    Rejected,
    Accepted,
}

impl<TDef, TTok> ParseEngine<TDef, TTok>
where
    TDef: ParserDef,
    TTok: Token,
{
    /// Create a parser engine using the specified parser definition.
    pub fn new(definition: TDef) -> Self {
        let initial_state = definition.initial_state();
        Self {
            definition,
            state: ParseEngineState::Pending,
            states_stack: vec![initial_state],
            symbols_stack: vec![],
            lookahead: None,
        }
    }

    /// Offer a token after [`ParseEvent::InputNeeded`] is returned.
    pub fn offer_token(&mut self, token: TTok) -> Result<(), ParseError> {
        if !matches!(self.state, ParseEngineState::WaitingInput) {
            return Err(ParseError::AlreadyOfferedInput);
        }
        self.state = ParseEngineState::Pending;
        self.lookahead.replace(Some(token));
        Ok(())
    }

    /// Notify the end of input after [`ParseEvent::InputNeeded`] is returned.
    pub fn offer_eoi(&mut self) -> Result<(), ParseError> {
        if !matches!(self.state, ParseEngineState::WaitingInput) {
            return Err(ParseError::AlreadyOfferedInput);
        }
        self.state = ParseEngineState::Pending;
        self.lookahead.replace(None);
        Ok(())
    }

    /// Drives the internal LR automaton to the point where the user of this parser needs to do something.
    pub fn resume(&mut self) -> Result<ParseEvent<'_, TTok>, ParseError> {
        match self.state {
            ParseEngineState::WaitingInput => return Err(ParseError::TokenNotOffered),

            ParseEngineState::Shifting(next) => {
                match self.lookahead.take() {
                    Some(Some(token)) => self.symbols_stack.push(Symbol::T(token)),
                    Some(None) => return Err(ParseError::UnexpectedEoi),
                    None => return Err(ParseError::TokenNotOffered),
                }
                self.states_stack.push(next);
                self.state = ParseEngineState::Pending;
            }

            ParseEngineState::Reducing(lhs, n) => {
                let (Some(states_len), Some(symbols_len)) = (
                    self.states_stack.len().checked_sub(n),
                    self.symbols_stack.len().checked_sub(n),
                ) else {
                    return Err(ParseError::StackUnderflow);
                };
                self.states_stack.truncate(states_len);
                self.symbols_stack.truncate(symbols_len);

                let current = *self
                    .states_stack
                    .last()
                    .ok_or(ParseError::StackUnderflow)?;
                self.symbols_stack.push(Symbol::N(lhs));
                let next = self.definition.goto(current, lhs);
                self.states_stack.push(next);
                self.state = ParseEngineState::Pending;
            }

            ParseEngineState::Rejected => {
                return Ok(ParseEvent::Rejected {
                    state: self.states_stack.last().copied().unwrap_or_default(),
                    lookahead: self.lookahead.as_ref().and_then(|t| t.as_ref()),
                })
            }

            ParseEngineState::Accepted => return Err(ParseError::AlreadyAccepted),

            ParseEngineState::Pending => {}
        }

        let current = *self
            .states_stack
            .last()
            .ok_or(ParseError::StackUnderflow)?;

        let lookahead = if self.definition.needs_lookahead(current) {
            match self.lookahead {
                Some(ref lookahead) => lookahead.as_ref().map_or(EOF_SYMBOL, |t| t.to_index()),
                None => {
                    self.state = ParseEngineState::WaitingInput;
                    return Ok(ParseEvent::InputNeeded);
                }
            }
        } else {
            // The default reduction does not look at the lookahead.
            EOF_SYMBOL
        };

        match self.definition.action(current, lookahead) {
            ParseAction::Shift(next) => match self.lookahead {
                Some(Some(ref token)) => {
                    self.state = ParseEngineState::Shifting(next);
                    Ok(ParseEvent::Shifting(token))
                }
                _ => Err(ParseError::UnexpectedEoi),
            },

            ParseAction::Reduce { rule, lhs, len } => {
                self.state = ParseEngineState::Reducing(lhs, len);
                let start = self
                    .symbols_stack
                    .len()
                    .checked_sub(len)
                    .ok_or(ParseError::StackUnderflow)?;
                Ok(ParseEvent::AboutToReduce {
                    rule,
                    lhs,
                    args: &self.symbols_stack[start..],
                })
            }

            ParseAction::Accept => {
                self.state = ParseEngineState::Accepted;
                Ok(ParseEvent::Accepted)
            }

            ParseAction::Fail => {
                self.state = ParseEngineState::Rejected;
                Ok(ParseEvent::Rejected {
                    state: current,
                    lookahead: self.lookahead.as_ref().and_then(|t| t.as_ref()),
                })
            }
        }
    }
}

#[derive(Debug)]
pub enum ParseEvent<'p, TTok> {
    /// The engine needs a lookahead token, offered through
    /// [`ParseEngine::offer_token`] or [`ParseEngine::offer_eoi`].
    InputNeeded,
    Shifting(&'p TTok),
    AboutToReduce {
        rule: RuleIndex,
        lhs: NonterminalIndex,
        args: &'p [Symbol<TTok>],
    },
    Accepted,
    Rejected {
        state: StateIndex,
        lookahead: Option<&'p TTok>,
    },
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Symbol<TTok> {
    T(TTok),
    N(NonterminalIndex),
}

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("token is not offered")]
    TokenNotOffered,

    #[error("token has already been offered")]
    AlreadyOfferedInput,

    #[error("unexpected end of input")]
    UnexpectedEoi,

    #[error("the parse stack is shorter than the production being reduced")]
    StackUnderflow,

    #[error("already accepted")]
    AlreadyAccepted,
}

/// Run the engine over `tokens` and report whether the input is accepted.
///
/// The sequence of reduced rules is passed to `on_reduce` in order.
pub fn recognize<TDef, TTok, I>(
    definition: TDef,
    tokens: I,
    mut on_reduce: impl FnMut(RuleIndex),
) -> Result<bool, ParseError>
where
    TDef: ParserDef,
    TTok: Token,
    I: IntoIterator<Item = TTok>,
{
    let mut tokens = tokens.into_iter();
    let mut engine = ParseEngine::new(definition);
    loop {
        let offer = match engine.resume()? {
            ParseEvent::InputNeeded => true,
            ParseEvent::Shifting(..) => false,
            ParseEvent::AboutToReduce { rule, .. } => {
                on_reduce(rule);
                false
            }
            ParseEvent::Accepted => return Ok(true),
            ParseEvent::Rejected { .. } => return Ok(false),
        };
        if offer {
            match tokens.next() {
                Some(token) => engine.offer_token(token)?,
                None => engine.offer_eoi()?,
            }
        }
    }
}
