use std::fmt;

use thiserror::Error;

use crate::fa::EPSILON_CHAR;
use crate::nfa::NFA;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegexError {
    #[error("Malformed regex at {position}: {reason}")]
    Malformed { position: usize, reason: &'static str },
    #[error("Empty regex")]
    Empty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Union,
    Intersection,
    Concatenation,
    Star,
}

impl Operator {
    fn from_char(c: char) -> Option<Operator> {
        match c {
            '+' => Some(Operator::Union),
            '&' => Some(Operator::Intersection),
            '.' => Some(Operator::Concatenation),
            '*' => Some(Operator::Star),
            _ => None,
        }
    }

    pub fn priority(self) -> u8 {
        match self {
            Operator::Union | Operator::Intersection => 1,
            Operator::Concatenation => 2,
            Operator::Star => 3,
        }
    }

    pub fn symbol(self) -> char {
        match self {
            Operator::Union => '+',
            Operator::Intersection => '&',
            Operator::Concatenation => '.',
            Operator::Star => '*',
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// Postfix token: literal runs are already turned into automata.
#[derive(Debug, Clone)]
pub enum Token {
    Operand(NFA),
    Operator(Operator),
}

enum Pending {
    Operator(Operator),
    LeftParenthesis(usize),
}

fn is_special(c: char) -> bool {
    Operator::from_char(c).is_some() || c == '(' || c == ')'
}

/// Shunting-yard parser over the operators `+` (union), `&` (intersection),
/// `.` (concatenation) and postfix `*`, with parentheses for grouping.
///
/// Any other character is a symbol, and a maximal run of symbols is one word
/// operand. A `*` right after a run repeats only its last symbol, so `ab*`
/// means `a(b)*`. Operands written next to each other are concatenated, and
/// `@` stands for the empty word.
pub struct RegexParser<'a> {
    expression: &'a str,
}

impl<'a> RegexParser<'a> {
    pub fn new(expression: &'a str) -> RegexParser<'a> {
        RegexParser { expression }
    }

    /// Converts the expression into postfix order.
    pub fn parse(&self) -> Result<Vec<Token>, RegexError> {
        let chars: Vec<char> = self.expression.chars().collect();
        let mut output = Vec::new();
        let mut pending: Vec<Pending> = Vec::new();
        // true when the last thing read can be followed by a binary operator
        let mut after_operand = false;

        let mut i = 0;
        while i < chars.len() {
            let c = chars[i];
            match Operator::from_char(c) {
                Some(Operator::Star) => {
                    if !after_operand {
                        return Err(malformed(i, "`*` has nothing to repeat"));
                    }
                    push_operator(&mut output, &mut pending, Operator::Star);
                }
                Some(op) => {
                    if !after_operand {
                        return Err(malformed(i, "operator is missing its left operand"));
                    }
                    push_operator(&mut output, &mut pending, op);
                    after_operand = false;
                }
                None if c == '(' => {
                    if after_operand {
                        push_operator(&mut output, &mut pending, Operator::Concatenation);
                    }
                    pending.push(Pending::LeftParenthesis(i));
                    after_operand = false;
                }
                None if c == ')' => {
                    if !after_operand {
                        return Err(malformed(i, "group ends without an operand"));
                    }
                    loop {
                        match pending.pop() {
                            Some(Pending::Operator(op)) => output.push(Token::Operator(op)),
                            Some(Pending::LeftParenthesis(_)) => break,
                            None => return Err(malformed(i, "unmatched `)`")),
                        }
                    }
                }
                None => {
                    if after_operand {
                        push_operator(&mut output, &mut pending, Operator::Concatenation);
                    }
                    let begin = i;
                    while i < chars.len() && !is_special(chars[i]) {
                        i += 1;
                    }
                    let run: String = chars[begin..i].iter().collect();
                    output.push(Token::Operand(literal(&run, chars.get(i) == Some(&'*'))));
                    after_operand = true;
                    if chars.get(i) == Some(&'*') {
                        i += 1;
                    }
                    continue;
                }
            }
            i += 1;
        }

        if !after_operand {
            if chars.is_empty() {
                return Err(RegexError::Empty);
            }
            return Err(malformed(chars.len(), "expression ends without an operand"));
        }
        while let Some(top) = pending.pop() {
            match top {
                Pending::Operator(op) => output.push(Token::Operator(op)),
                Pending::LeftParenthesis(position) => {
                    return Err(malformed(position, "unclosed `(`"));
                }
            }
        }
        Ok(output)
    }

    /// Parses and evaluates the expression into an automaton.
    pub fn solve(&self) -> Result<NFA, RegexError> {
        let end = self.expression.chars().count();
        let mut operands: Vec<NFA> = Vec::new();

        for token in self.parse()? {
            match token {
                Token::Operand(nfa) => operands.push(nfa),
                Token::Operator(Operator::Star) => {
                    let one = operands.pop().ok_or(malformed(end, "`*` has nothing to repeat"))?;
                    operands.push(NFA::kleene_star(&one));
                }
                Token::Operator(op) => {
                    let (one, two) = match (operands.pop(), operands.pop()) {
                        (Some(one), Some(two)) => (one, two),
                        _ => return Err(malformed(end, "operator is missing an operand")),
                    };
                    let result = match op {
                        Operator::Union => NFA::union(&one, &two),
                        Operator::Intersection => NFA::intersection(&one, &two),
                        _ => NFA::concatenation(&two, &one),
                    };
                    operands.push(result);
                }
            }
        }

        match (operands.pop(), operands.is_empty()) {
            (Some(nfa), true) => {
                log::trace!("`{}` solved into {} nodes", self.expression, nfa.node_count());
                Ok(nfa)
            }
            (None, _) => Err(RegexError::Empty),
            (Some(_), false) => Err(malformed(end, "operands left without an operator")),
        }
    }
}

pub fn parse_regex(expression: &str) -> Result<NFA, RegexError> {
    RegexParser::new(expression).solve()
}

fn malformed(position: usize, reason: &'static str) -> RegexError {
    RegexError::Malformed { position, reason }
}

fn push_operator(output: &mut Vec<Token>, pending: &mut Vec<Pending>, op: Operator) {
    while let Some(Pending::Operator(top)) = pending.last() {
        if top.priority() < op.priority() {
            break;
        }
        output.push(Token::Operator(*top));
        pending.pop();
    }
    pending.push(Pending::Operator(op));
}

fn literal(run: &str, starred: bool) -> NFA {
    let mut chars = run.chars();
    if !starred {
        return NFA::from_word(run);
    }
    let last = match chars.next_back() {
        Some(last) => last,
        None => return NFA::from_word(run),
    };
    let repeated = NFA::kleene_star(&NFA::from_word(&last.to_string()));
    let prefix = chars.as_str();
    if prefix.chars().all(|c| c == EPSILON_CHAR) {
        repeated
    } else {
        NFA::concatenation(&NFA::from_word(prefix), &repeated)
    }
}
