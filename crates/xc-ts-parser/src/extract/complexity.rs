//! Component complexity scoring.
//!
//! The score is a weighted count of constructs that make a component harder
//! to follow. It is computed from text with comments blanked, so it is the
//! same whether or not the structured parse succeeded.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::ParseError;
use crate::syntax::strip_comments;

const HOOK_WEIGHT: u32 = 3;
const BRANCH_WEIGHT: u32 = 2;
const LOOP_WEIGHT: u32 = 2;
const TERNARY_WEIGHT: u32 = 1;
const ELEMENT_WEIGHT: u32 = 1;
const HANDLER_WEIGHT: u32 = 1;
const STATE_UPDATE_WEIGHT: u32 = 1;
const EFFECT_DEP_WEIGHT: u32 = 1;
const NESTING_WEIGHT: u32 = 2;

struct ComplexityPatterns {
    hook: Regex,
    branch: Regex,
    looping: Regex,
    ternary: Regex,
    element: Regex,
    handler: Regex,
    state_update: Regex,
    effect: Regex,
}

static COMPLEXITY_PATTERNS: OnceLock<ComplexityPatterns> = OnceLock::new();

fn complexity_patterns() -> Result<&'static ComplexityPatterns, ParseError> {
    if let Some(patterns) = COMPLEXITY_PATTERNS.get() {
        return Ok(patterns);
    }
    let compiled = ComplexityPatterns {
        hook: Regex::new(r"\buse[A-Z]\w*\s*(?:<[^>()]*>)?\(")?,
        branch: Regex::new(r"\bif\s*\(|\bcase\s")?,
        looping: Regex::new(r"\b(?:for|while)\s*\(|\.(?:map|forEach)\s*\(")?,
        ternary: Regex::new(r"\s\?\s")?,
        element: Regex::new(r"(?:^|[^\w$])<[A-Za-z]")?,
        handler: Regex::new(r"\bon[A-Z]\w*\s*=")?,
        state_update: Regex::new(r"\bset[A-Z]\w*\s*\(")?,
        effect: Regex::new(r"\buse(?:Layout)?Effect\s*\(")?,
    };
    Ok(COMPLEXITY_PATTERNS.get_or_init(|| compiled))
}

/// A breakdown of the constructs counted in a component.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ComplexityBreakdown {
    /// Hook calls.
    pub hooks: u32,
    /// `if`, `else if` and `case` branches.
    pub branches: u32,
    /// `for`/`while` loops and `.map`/`.forEach` iterations.
    pub loops: u32,
    /// Ternary expressions.
    pub ternaries: u32,
    /// JSX elements.
    pub elements: u32,
    /// `onX=` event-handler bindings.
    pub handlers: u32,
    /// `setX(` state-update calls.
    pub state_updates: u32,
    /// Entries across all effect dependency arrays.
    pub effect_deps: u32,
    /// Deepest brace nesting.
    pub max_depth: u32,
}

impl ComplexityBreakdown {
    /// Measures `text`.
    pub fn measure(text: &str) -> Result<Self, ParseError> {
        let patterns = complexity_patterns()?;
        let code = strip_comments(text);
        Ok(Self {
            hooks: count(&patterns.hook, &code),
            branches: count(&patterns.branch, &code),
            loops: count(&patterns.looping, &code),
            ternaries: count(&patterns.ternary, &code),
            elements: count(&patterns.element, &code),
            handlers: count(&patterns.handler, &code),
            state_updates: count(&patterns.state_update, &code),
            effect_deps: effect_dependencies(&patterns.effect, &code),
            max_depth: max_brace_depth(&code),
        })
    }

    /// Returns the weighted score.
    #[must_use]
    pub const fn score(&self) -> u32 {
        self.hooks * HOOK_WEIGHT
            + self.branches * BRANCH_WEIGHT
            + self.loops * LOOP_WEIGHT
            + self.ternaries * TERNARY_WEIGHT
            + self.elements * ELEMENT_WEIGHT
            + self.handlers * HANDLER_WEIGHT
            + self.state_updates * STATE_UPDATE_WEIGHT
            + self.effect_deps * EFFECT_DEP_WEIGHT
            + self.max_depth * NESTING_WEIGHT
    }
}

/// Computes the weighted complexity score of a component's source.
pub fn complexity_score(text: &str) -> Result<u32, ParseError> {
    Ok(ComplexityBreakdown::measure(text)?.score())
}

#[allow(clippy::cast_possible_truncation)]
fn count(pattern: &Regex, text: &str) -> u32 {
    pattern.find_iter(text).count() as u32
}

/// Sums the entries of the dependency array passed last to each effect hook.
#[allow(clippy::cast_possible_truncation)]
fn effect_dependencies(effect: &Regex, text: &str) -> u32 {
    let mut total = 0;
    for m in effect.find_iter(text) {
        let (start, end) = crate::fallback::paren_body(text, m.end());
        let args = &text[start..end];
        let trimmed = args.trim_end().trim_end_matches(',').trim_end();
        if !trimmed.ends_with(']') {
            continue;
        }
        let Some(open) = matching_open_bracket(trimmed) else {
            continue;
        };
        let deps = &trimmed[open + 1..trimmed.len() - 1];
        total += deps.split(',').filter(|d| !d.trim().is_empty()).count() as u32;
    }
    total
}

fn matching_open_bracket(text: &str) -> Option<usize> {
    let mut depth = 0i32;
    for (i, b) in text.bytes().enumerate().rev() {
        match b {
            b']' => depth += 1,
            b'[' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

fn max_brace_depth(text: &str) -> u32 {
    let mut depth = 0u32;
    let mut max = 0u32;
    for b in text.bytes() {
        match b {
            b'{' => {
                depth += 1;
                max = max.max(depth);
            }
            b'}' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    max
}
