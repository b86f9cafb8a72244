//! ERE-subset parser and Thompson NFA construction.
//!
//! The dialect: `.`, bracket classes with ranges and negation, `* + ?`
//! (greedy), alternation, capture groups, `^`/`$` anchors, the shorthand
//! classes `\d \D \s \S \w \W`, the escapes `\n \t \r \\` plus literal
//! escaping of metacharacters, and the word boundaries `\b`/`\B`. No
//! backreferences, no lookaround, no non-greedy quantifiers.
//!
//! Parsing produces a small AST; compilation walks it emitting states with
//! dangling out-edges that are patched when the continuation is known.

use crate::error::{Error, Result};
use crate::options::MAX_PATTERN_LEN;
use crate::regex::program::{ClassMask, Program, State, StateKind, CLASS_WORDS};
use crate::simd;

/// True iff the pattern contains regex metacharacters and should be
/// compiled rather than searched literally.
pub fn is_regex_pattern(pattern: &[u8]) -> bool {
    pattern.iter().any(|&b| {
        matches!(
            b,
            b'.' | b'*' | b'+' | b'?' | b'[' | b']' | b'(' | b')' | b'{' | b'}' | b'|' | b'^' | b'$' | b'\\'
        )
    })
}

/// Compile `pattern` into an NFA program.
pub fn compile(pattern: &[u8], case_insensitive: bool) -> Result<Program> {
    if pattern.len() > MAX_PATTERN_LEN {
        return Err(Error::PatternTooLong {
            len: pattern.len(),
            limit: MAX_PATTERN_LEN,
        });
    }

    let mut parser = Parser {
        pattern,
        pos: 0,
        group_count: 0,
        case_insensitive,
    };
    let ast = parser.parse_alternation()?;
    if parser.pos < pattern.len() {
        // A stray ')' is the only way parsing stops early.
        return Err(Error::regex("unmatched ')'", parser.pos));
    }

    let mut compiler = Compiler {
        states: Vec::with_capacity(pattern.len() * 2 + 1),
        class_pool: Vec::new(),
        case_insensitive,
    };
    let frag = compiler.compile_ast(&ast);
    let accept = compiler.push(State::new(StateKind::Match));
    compiler.patch(&frag.outs, accept);
    let start = frag.start.unwrap_or(accept);

    Ok(Program {
        states: compiler.states,
        class_pool: compiler.class_pool,
        start,
        group_count: parser.group_count,
        anchored_start: starts_anchored(&ast),
        anchored_end: ends_anchored(&ast),
        case_insensitive,
    })
}

// ---------------------------------------------------------------------------
// AST
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
enum Ast {
    Empty,
    Literal(u8),
    Class(ClassMask),
    Dot,
    LineStart,
    LineEnd,
    WordBoundary,
    NotWordBoundary,
    Group(u32, Box<Ast>),
    Concat(Vec<Ast>),
    Alternate(Vec<Ast>),
    Star(Box<Ast>),
    Plus(Box<Ast>),
    Question(Box<Ast>),
}

/// Whether every path through the pattern begins with `^`.
fn starts_anchored(ast: &Ast) -> bool {
    match ast {
        Ast::LineStart => true,
        Ast::Concat(items) => items.first().is_some_and(starts_anchored),
        Ast::Alternate(branches) => !branches.is_empty() && branches.iter().all(starts_anchored),
        Ast::Group(_, inner) => starts_anchored(inner),
        _ => false,
    }
}

/// Whether every path through the pattern ends with `$`.
fn ends_anchored(ast: &Ast) -> bool {
    match ast {
        Ast::LineEnd => true,
        Ast::Concat(items) => items.last().is_some_and(ends_anchored),
        Ast::Alternate(branches) => !branches.is_empty() && branches.iter().all(ends_anchored),
        Ast::Group(_, inner) => ends_anchored(inner),
        _ => false,
    }
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

struct Parser<'a> {
    pattern: &'a [u8],
    pos: usize,
    group_count: u32,
    case_insensitive: bool,
}

impl<'a> Parser<'a> {
    #[inline]
    fn peek(&self) -> Option<u8> {
        self.pattern.get(self.pos).copied()
    }

    #[inline]
    fn advance(&mut self) -> Option<u8> {
        let byte = self.peek()?;
        self.pos += 1;
        Some(byte)
    }

    fn parse_alternation(&mut self) -> Result<Ast> {
        let mut branches = vec![self.parse_concat()?];
        while self.peek() == Some(b'|') {
            self.advance();
            branches.push(self.parse_concat()?);
        }
        if branches.len() == 1 {
            Ok(branches.pop().unwrap())
        } else {
            Ok(Ast::Alternate(branches))
        }
    }

    fn parse_concat(&mut self) -> Result<Ast> {
        let mut items = Vec::new();
        while let Some(byte) = self.peek() {
            if byte == b'|' || byte == b')' {
                break;
            }
            items.push(self.parse_repeat()?);
        }
        match items.len() {
            0 => Ok(Ast::Empty),
            1 => Ok(items.pop().unwrap()),
            _ => Ok(Ast::Concat(items)),
        }
    }

    fn parse_repeat(&mut self) -> Result<Ast> {
        let mut ast = self.parse_atom()?;
        while let Some(quantifier) = self.peek() {
            match quantifier {
                b'*' | b'+' | b'?' => {
                    if matches!(ast, Ast::LineStart | Ast::LineEnd | Ast::WordBoundary | Ast::NotWordBoundary) {
                        return Err(Error::regex("cannot repeat a zero-width assertion", self.pos));
                    }
                    self.advance();
                    ast = match quantifier {
                        b'*' => Ast::Star(Box::new(ast)),
                        b'+' => Ast::Plus(Box::new(ast)),
                        _ => Ast::Question(Box::new(ast)),
                    };
                }
                _ => break,
            }
        }
        Ok(ast)
    }

    fn parse_atom(&mut self) -> Result<Ast> {
        let at = self.pos;
        let Some(byte) = self.advance() else {
            return Ok(Ast::Empty);
        };

        match byte {
            b'(' => {
                self.group_count += 1;
                let index = self.group_count;
                let inner = self.parse_alternation()?;
                if self.advance() != Some(b')') {
                    return Err(Error::regex("unclosed group", at));
                }
                Ok(Ast::Group(index, Box::new(inner)))
            }
            b'[' => self.parse_class(at),
            b'.' => Ok(Ast::Dot),
            b'^' => Ok(Ast::LineStart),
            b'$' => Ok(Ast::LineEnd),
            b'*' | b'+' | b'?' => Err(Error::regex("nothing to repeat", at)),
            b'\\' => self.parse_escape(at),
            _ => Ok(Ast::Literal(byte)),
        }
    }

    fn parse_escape(&mut self, at: usize) -> Result<Ast> {
        let Some(byte) = self.advance() else {
            return Err(Error::regex("trailing backslash", at));
        };
        let ast = match byte {
            b'n' => Ast::Literal(b'\n'),
            b't' => Ast::Literal(b'\t'),
            b'r' => Ast::Literal(b'\r'),
            b'd' => Ast::Class(class_digit(false)),
            b'D' => Ast::Class(class_digit(true)),
            b's' => Ast::Class(class_space(false)),
            b'S' => Ast::Class(class_space(true)),
            b'w' => Ast::Class(class_word(false)),
            b'W' => Ast::Class(class_word(true)),
            b'b' => Ast::WordBoundary,
            b'B' => Ast::NotWordBoundary,
            // Anything else escapes to the literal byte, covering `\\`
            // and the metacharacters.
            other => Ast::Literal(other),
        };
        Ok(ast)
    }

    fn parse_class(&mut self, at: usize) -> Result<Ast> {
        let mut mask = ClassMask::new();
        let negated = if self.peek() == Some(b'^') {
            self.advance();
            true
        } else {
            false
        };

        let mut first = true;
        loop {
            let Some(byte) = self.advance() else {
                return Err(Error::regex("unclosed character class", at));
            };
            if byte == b']' && !first {
                break;
            }
            first = false;

            if byte == b'\\' {
                let Some(escaped) = self.advance() else {
                    return Err(Error::regex("trailing backslash in class", at));
                };
                match escaped {
                    b'n' => mask.set(b'\n'),
                    b't' => mask.set(b'\t'),
                    b'r' => mask.set(b'\r'),
                    b'd' => mask.union(&class_digit(false)),
                    b'D' => mask.union(&class_digit(true)),
                    b's' => mask.union(&class_space(false)),
                    b'S' => mask.union(&class_space(true)),
                    b'w' => mask.union(&class_word(false)),
                    b'W' => mask.union(&class_word(true)),
                    other => mask.set(other),
                }
                continue;
            }

            // A range requires a plain byte on both sides and a '-' that is
            // not the closing position.
            if self.peek() == Some(b'-') && self.pattern.get(self.pos + 1).copied().is_some_and(|b| b != b']') {
                self.advance(); // '-'
                let Some(mut hi) = self.advance() else {
                    return Err(Error::regex("unclosed character class", at));
                };
                if hi == b'\\' {
                    hi = match self.advance() {
                        Some(b'n') => b'\n',
                        Some(b't') => b'\t',
                        Some(b'r') => b'\r',
                        Some(other) => other,
                        None => return Err(Error::regex("trailing backslash in class", at)),
                    };
                }
                if byte > hi {
                    return Err(Error::regex("invalid range in character class", at));
                }
                mask.set_range(byte, hi);
            } else {
                mask.set(byte);
            }
        }

        // Fold the positive class before negating: `[^a]` must exclude
        // both cases, not re-admit them through the complement.
        if self.case_insensitive {
            fold_class(&mut mask);
        }
        if negated {
            mask.negate();
        }
        Ok(Ast::Class(mask))
    }
}

fn class_digit(negated: bool) -> ClassMask {
    let mut mask = ClassMask::new();
    mask.set_range(b'0', b'9');
    if negated {
        mask.negate();
    }
    mask
}

fn class_space(negated: bool) -> ClassMask {
    let mut mask = ClassMask::new();
    for b in [b' ', b'\t', b'\n', b'\r', 0x0B, 0x0C] {
        mask.set(b);
    }
    if negated {
        mask.negate();
    }
    mask
}

fn class_word(negated: bool) -> ClassMask {
    let mut mask = ClassMask::new();
    mask.set_range(b'a', b'z');
    mask.set_range(b'A', b'Z');
    mask.set_range(b'0', b'9');
    mask.set(b'_');
    if negated {
        mask.negate();
    }
    mask
}

// ---------------------------------------------------------------------------
// Thompson construction
// ---------------------------------------------------------------------------

/// A dangling out-edge awaiting its continuation.
#[derive(Debug, Clone, Copy)]
enum Patch {
    Out(u32),
    Out2(u32),
}

/// A compiled sub-expression: an entry state (or `None` for a fragment that
/// emits nothing, e.g. the empty pattern) plus its dangling edges.
struct Frag {
    start: Option<u32>,
    outs: Vec<Patch>,
}

struct Compiler {
    states: Vec<State>,
    class_pool: Vec<u32>,
    case_insensitive: bool,
}

impl Compiler {
    fn push(&mut self, state: State) -> u32 {
        self.states.push(state);
        (self.states.len() - 1) as u32
    }

    fn patch(&mut self, outs: &[Patch], target: u32) {
        for &patch in outs {
            match patch {
                Patch::Out(idx) => self.states[idx as usize].out = target,
                Patch::Out2(idx) => self.states[idx as usize].out2 = target,
            }
        }
    }

    fn compile_ast(&mut self, ast: &Ast) -> Frag {
        match ast {
            Ast::Empty => Frag {
                start: None,
                outs: Vec::new(),
            },
            Ast::Literal(byte) => {
                let mut state = State::new(StateKind::Literal);
                state.byte = if self.case_insensitive {
                    simd::to_lower(*byte) as u32
                } else {
                    *byte as u32
                };
                state.case_insensitive = self.case_insensitive as u32;
                let idx = self.push(state);
                Frag {
                    start: Some(idx),
                    outs: vec![Patch::Out(idx)],
                }
            }
            Ast::Class(mask) => {
                // Case folding already happened while the class was built.
                // An all-byte class degenerates to `any`, keeping the
                // bitmap pool off the hot path for it.
                if mask.is_full() {
                    let idx = self.push(State::new(StateKind::Any));
                    return Frag {
                        start: Some(idx),
                        outs: vec![Patch::Out(idx)],
                    };
                }
                let offset = self.intern_class(mask);
                let mut state = State::new(StateKind::CharClass);
                state.class_offset = offset;
                let idx = self.push(state);
                Frag {
                    start: Some(idx),
                    outs: vec![Patch::Out(idx)],
                }
            }
            Ast::Dot => {
                let idx = self.push(State::new(StateKind::Dot));
                Frag {
                    start: Some(idx),
                    outs: vec![Patch::Out(idx)],
                }
            }
            Ast::LineStart => self.zero_width(StateKind::LineStart),
            Ast::LineEnd => self.zero_width(StateKind::LineEnd),
            Ast::WordBoundary => self.zero_width(StateKind::WordBoundary),
            Ast::NotWordBoundary => self.zero_width(StateKind::NotWordBoundary),
            Ast::Group(index, inner) => {
                let mut open = State::new(StateKind::GroupStart);
                open.group = *index;
                let open_idx = self.push(open);
                let frag = self.compile_ast(inner);
                if let Some(start) = frag.start {
                    self.states[open_idx as usize].out = start;
                }
                let mut close = State::new(StateKind::GroupEnd);
                close.group = *index;
                let close_idx = self.push(close);
                if frag.start.is_some() {
                    self.patch(&frag.outs, close_idx);
                } else {
                    self.states[open_idx as usize].out = close_idx;
                }
                Frag {
                    start: Some(open_idx),
                    outs: vec![Patch::Out(close_idx)],
                }
            }
            Ast::Concat(items) => {
                let mut start = None;
                let mut outs: Vec<Patch> = Vec::new();
                for item in items {
                    let frag = self.compile_ast(item);
                    let Some(frag_start) = frag.start else {
                        continue;
                    };
                    if start.is_none() {
                        start = Some(frag_start);
                    } else {
                        self.patch(&outs, frag_start);
                    }
                    outs = frag.outs;
                }
                Frag { start, outs }
            }
            Ast::Alternate(branches) => {
                let mut frags = Vec::with_capacity(branches.len());
                for branch in branches {
                    frags.push(self.compile_ast(branch));
                }
                // Fold the branches right-to-left under split nodes.
                let mut acc = frags.pop().unwrap_or(Frag {
                    start: None,
                    outs: Vec::new(),
                });
                while let Some(frag) = frags.pop() {
                    let split_idx = self.push(State::new(StateKind::Split));
                    let mut outs = frag.outs;
                    outs.extend(acc.outs);
                    match frag.start {
                        Some(s) => self.states[split_idx as usize].out = s,
                        None => outs.push(Patch::Out(split_idx)),
                    }
                    match acc.start {
                        Some(s) => self.states[split_idx as usize].out2 = s,
                        None => outs.push(Patch::Out2(split_idx)),
                    }
                    acc = Frag {
                        start: Some(split_idx),
                        outs,
                    };
                }
                acc
            }
            Ast::Star(inner) => {
                let split_idx = self.push(State::new(StateKind::Split));
                let frag = self.compile_ast(inner);
                match frag.start {
                    Some(start) => {
                        self.states[split_idx as usize].out = start;
                        self.patch(&frag.outs, split_idx);
                    }
                    // `()*` — both edges fall through.
                    None => self.states[split_idx as usize].out = split_idx,
                }
                Frag {
                    start: Some(split_idx),
                    outs: vec![Patch::Out2(split_idx)],
                }
            }
            Ast::Plus(inner) => {
                let frag = self.compile_ast(inner);
                let split_idx = self.push(State::new(StateKind::Split));
                match frag.start {
                    Some(start) => {
                        self.patch(&frag.outs, split_idx);
                        self.states[split_idx as usize].out = start;
                        Frag {
                            start: Some(start),
                            outs: vec![Patch::Out2(split_idx)],
                        }
                    }
                    None => Frag {
                        start: Some(split_idx),
                        outs: vec![Patch::Out(split_idx), Patch::Out2(split_idx)],
                    },
                }
            }
            Ast::Question(inner) => {
                let split_idx = self.push(State::new(StateKind::Split));
                let frag = self.compile_ast(inner);
                let mut outs = frag.outs;
                match frag.start {
                    Some(start) => self.states[split_idx as usize].out = start,
                    None => outs.push(Patch::Out(split_idx)),
                }
                outs.push(Patch::Out2(split_idx));
                Frag {
                    start: Some(split_idx),
                    outs,
                }
            }
        }
    }

    fn zero_width(&mut self, kind: StateKind) -> Frag {
        let idx = self.push(State::new(kind));
        Frag {
            start: Some(idx),
            outs: vec![Patch::Out(idx)],
        }
    }

    /// Flush a class mask into the pool, reusing an identical earlier class.
    fn intern_class(&mut self, mask: &ClassMask) -> u32 {
        let mut offset = 0;
        while offset + CLASS_WORDS <= self.class_pool.len() {
            if self.class_pool[offset..offset + CLASS_WORDS] == mask.words {
                return offset as u32;
            }
            offset += CLASS_WORDS;
        }
        let offset = self.class_pool.len() as u32;
        self.class_pool.extend_from_slice(&mask.words);
        offset
    }
}

/// Populate both cases of every letter in the mask.
fn fold_class(mask: &mut ClassMask) {
    for upper in b'A'..=b'Z' {
        let lower = upper + 32;
        if mask.contains(upper) {
            mask.set(lower);
        }
        if mask.contains(lower) {
            mask.set(upper);
        }
    }
}
