use std::collections::BTreeSet;
use std::io::{self, BufRead, Write};

use anyhow::Context;
use automata::{parse_regex, AutomatonError, DFA, FA, NFA};
use clap::{Parser, Subcommand, ValueEnum};
use petgraph::dot::Dot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Kind {
    #[value(alias = "determ")]
    Det,
    #[value(alias = "nondeterm")]
    Nondet,
}

#[derive(Debug, Parser)]
#[command(name = "automata", no_binary_name = true, disable_version_flag = true)]
struct Line {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Start a new automaton at the given node
    New { kind: Kind, start: String },
    /// Add a transition, `@` is epsilon
    Trans {
        kind: Kind,
        from: String,
        symbol: char,
        to: String,
    },
    /// Mark nodes as final
    Final {
        kind: Kind,
        #[arg(required = true)]
        names: Vec<String>,
    },
    /// Replace the nondeterministic automaton with one parsed from a regex
    Regex { expression: String },
    /// Test a word, no word means the empty word
    Check { kind: Kind, word: Option<String> },
    Show { kind: Kind },
    /// Print the automaton in graphviz format
    Dot { kind: Kind },
    /// Print a regex for the deterministic automaton
    Extract,
    /// Print the shortest prefix of the input the deterministic automaton accepts
    Stream { input: String },
    /// Union with the stashed automaton (det) or with a regex (nondet)
    Union { kind: Kind, expression: Option<String> },
    /// Intersection with the stashed automaton (det) or with a regex (nondet)
    Inter { kind: Kind, expression: Option<String> },
    /// Concatenate the nondeterministic automaton with a regex
    Concat { expression: String },
    /// Kleene star of the nondeterministic automaton
    Star,
    /// Swap finals; a deterministic automaton is first completed over the alphabet, if given
    Complement { kind: Kind, alphabet: Option<String> },
    /// Replace the deterministic automaton with the determinized nondeterministic one
    Determinize,
    /// Keep a copy of the deterministic automaton as the second product operand
    Stash,
    #[command(alias = "quit")]
    Exit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// Line oriented command interpreter over one deterministic and one
/// nondeterministic automaton. Errors are reported and the session goes on.
pub struct Console<W> {
    out: W,
    det: Option<DFA>,
    nondet: Option<NFA>,
    stashed: Option<DFA>,
}

impl<W: Write> Console<W> {
    pub fn new(out: W) -> Console<W> {
        Console {
            out,
            det: None,
            nondet: None,
            stashed: None,
        }
    }

    pub fn run<R: BufRead>(&mut self, mut input: R, prompt: bool) -> io::Result<()> {
        let mut line = String::new();
        loop {
            if prompt {
                write!(self.out, "> ")?;
                self.out.flush()?;
            }
            line.clear();
            if input.read_line(&mut line)? == 0 {
                return Ok(());
            }
            if self.execute_line(&line)? == Flow::Exit {
                return Ok(());
            }
        }
    }

    pub fn execute_line(&mut self, line: &str) -> io::Result<Flow> {
        let words: Vec<&str> = line.split_whitespace().collect();
        if words.first().map_or(true, |w| w.starts_with('#')) {
            return Ok(Flow::Continue);
        }

        let command = match Line::try_parse_from(words) {
            Ok(line) => line.command,
            Err(err) => {
                write!(self.out, "{}", err.render())?;
                return Ok(Flow::Continue);
            }
        };
        if let Command::Exit = command {
            return Ok(Flow::Exit);
        }

        match self.execute(command) {
            Ok(text) => write!(self.out, "{}", text)?,
            Err(err) => {
                let fatal = err
                    .downcast_ref::<AutomatonError>()
                    .map_or(false, |err| !err.is_recoverable());
                if fatal {
                    log::warn!("command aborted: {:?}", err);
                    writeln!(self.out, "error: {:#}, start over with `new`", err)?;
                } else {
                    log::debug!("command failed: {:?}", err);
                    writeln!(self.out, "error: {:#}", err)?;
                }
            }
        }
        Ok(Flow::Continue)
    }

    fn execute(&mut self, command: Command) -> anyhow::Result<String> {
        match command {
            Command::New { kind: Kind::Det, start } => {
                let mut dfa = DFA::new();
                dfa.add_start(&start)?;
                self.det = Some(dfa);
            }
            Command::New { kind: Kind::Nondet, start } => {
                let mut nfa = NFA::new();
                nfa.add_start(&start)?;
                self.nondet = Some(nfa);
            }
            Command::Trans { kind: Kind::Det, from, symbol, to } => {
                self.dfa_mut()?.add_transition(&from, symbol, &to)?;
            }
            Command::Trans { kind: Kind::Nondet, from, symbol, to } => {
                self.nfa_mut()?.add_transition(&from, symbol, &to)?;
            }
            Command::Final { kind, names } => {
                let fa = self.fa_mut(kind)?;
                for name in names {
                    fa.add_final(&name)?;
                }
            }
            Command::Regex { expression } => {
                self.nondet = Some(parse_regex(&expression)?);
            }
            Command::Check { kind, word } => {
                let word = word.unwrap_or_default();
                let accepted = match kind {
                    Kind::Det => self.dfa()?.is_member(&word)?,
                    Kind::Nondet => self.nfa()?.is_member(&word)?,
                };
                let verdict = if accepted { "accepted" } else { "rejected" };
                return Ok(format!("{}\n", verdict));
            }
            Command::Show { kind } => return Ok(self.fa(kind)?.to_string()),
            Command::Dot { kind } => {
                let graph = self.fa(kind)?.to_graph();
                return Ok(format!("{}", Dot::new(&graph)));
            }
            Command::Extract => {
                let regex = self.dfa()?.to_regex()?;
                if regex.is_empty() {
                    return Ok("no final node is reachable\n".to_string());
                }
                return Ok(format!("{}\n", regex));
            }
            Command::Stream { input } => {
                return Ok(match self.dfa()?.shortest_accepted_prefix(&input)? {
                    Some(prefix) => format!("{}\n", prefix),
                    None => "no accepted prefix\n".to_string(),
                });
            }
            Command::Union { kind: Kind::Det, .. } => {
                let union = DFA::union(self.dfa()?, self.stashed()?);
                self.det = Some(union);
            }
            Command::Union { kind: Kind::Nondet, expression } => {
                let other = parse_regex(&expression.context("a regex operand is required")?)?;
                self.nondet = Some(NFA::union(self.nfa()?, &other));
            }
            Command::Inter { kind: Kind::Det, .. } => {
                let intersection = DFA::intersection(self.dfa()?, self.stashed()?);
                self.det = Some(intersection);
            }
            Command::Inter { kind: Kind::Nondet, expression } => {
                let other = parse_regex(&expression.context("a regex operand is required")?)?;
                self.nondet = Some(NFA::intersection(self.nfa()?, &other));
            }
            Command::Concat { expression } => {
                let other = parse_regex(&expression)?;
                self.nondet = Some(NFA::concatenation(self.nfa()?, &other));
            }
            Command::Star => {
                self.nondet = Some(NFA::kleene_star(self.nfa()?));
            }
            Command::Complement { kind: Kind::Det, alphabet } => {
                let dfa = self.dfa()?;
                let complement = match alphabet {
                    Some(alphabet) => {
                        let alphabet: BTreeSet<char> = alphabet.chars().collect();
                        dfa.completed(&alphabet).complement()
                    }
                    None => dfa.complement(),
                };
                self.det = Some(complement);
            }
            Command::Complement { kind: Kind::Nondet, .. } => {
                self.nondet = Some(self.nfa()?.complement());
            }
            Command::Determinize => {
                self.det = Some(self.nfa()?.to_dfa()?);
            }
            Command::Stash => {
                self.stashed = Some(self.dfa()?.clone());
            }
            Command::Exit => {}
        }
        Ok(String::new())
    }

    fn dfa(&self) -> anyhow::Result<&DFA> {
        self.det.as_ref().context("no deterministic automaton, start one with `new det`")
    }

    fn dfa_mut(&mut self) -> anyhow::Result<&mut DFA> {
        self.det.as_mut().context("no deterministic automaton, start one with `new det`")
    }

    fn nfa(&self) -> anyhow::Result<&NFA> {
        self.nondet
            .as_ref()
            .context("no nondeterministic automaton, start one with `new nondet` or `regex`")
    }

    fn nfa_mut(&mut self) -> anyhow::Result<&mut NFA> {
        self.nondet
            .as_mut()
            .context("no nondeterministic automaton, start one with `new nondet` or `regex`")
    }

    fn stashed(&self) -> anyhow::Result<&DFA> {
        self.stashed.as_ref().context("nothing stashed, use `stash` first")
    }

    fn fa(&self, kind: Kind) -> anyhow::Result<&FA> {
        let fa: &FA = match kind {
            Kind::Det => self.dfa()?,
            Kind::Nondet => self.nfa()?,
        };
        Ok(fa)
    }

    fn fa_mut(&mut self, kind: Kind) -> anyhow::Result<&mut FA> {
        let fa: &mut FA = match kind {
            Kind::Det => self.dfa_mut()?,
            Kind::Nondet => self.nfa_mut()?,
        };
        Ok(fa)
    }
}
