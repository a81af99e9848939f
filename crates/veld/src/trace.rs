//! Lowering trace infrastructure.
//!
//! A trait-based hook system for observing the lowering pass with zero-cost
//! abstraction: the lowerer is generic over its tracer, so with the default
//! [`NoopTracer`] every hook call compiles away entirely.
//!
//! | Tracer | Purpose |
//! |--------|---------|
//! | [`NoopTracer`] | Zero-cost no-op (production default) |
//! | [`StderrTracer`] | Human-readable lowering log to stderr |
//! | [`RecordingTracer`] | Full event recording for assertions in tests |

use crate::{label::Label, symbols::FunctionSymbol};

/// One observable step of the lowering pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LowerEvent {
    /// `lower` was entered for a function body.
    FunctionStarted { function: String },
    /// `lower` finished; the flat block holds `statements` statements.
    FunctionFinished { function: String, statements: usize },
    /// A structured statement (`If`, `While`, `For`, `FromTo`) was desugared
    /// into labels and gotos.
    Desugared { construct: &'static str },
    /// A ternary expression had its three branch labels minted.
    TernaryAnnotated { end_label: Label },
    /// An integer literal conversion was folded into a plain literal.
    LiteralFolded { value: i32, to: String },
    /// A scope closed and a collection marker for `variables` locals was
    /// inserted.
    CollectionInserted { variables: usize },
    /// A void function's body could fall off the end; a bare return was
    /// appended.
    ReturnSynthesized,
}

/// Observer for the lowering pass. All hooks default to no-ops; implement
/// only what you care about.
pub trait LowerTracer {
    fn on_event(&mut self, event: LowerEvent) {
        let _ = event;
    }
}

/// Zero-cost tracer: every hook is a no-op the optimizer removes.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTracer;

impl LowerTracer for NoopTracer {}

/// Writes one line per event to stderr. Handy when staring at a miscompiled
/// function body.
#[derive(Debug, Clone, Copy, Default)]
pub struct StderrTracer;

impl LowerTracer for StderrTracer {
    fn on_event(&mut self, event: LowerEvent) {
        eprintln!("lower: {event:?}");
    }
}

/// Records every event in memory so tests can assert on the exact sequence
/// of lowering steps.
#[derive(Debug, Clone, Default)]
pub struct RecordingTracer {
    events: Vec<LowerEvent>,
}

impl RecordingTracer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn events(&self) -> &[LowerEvent] {
        &self.events
    }

    /// Number of recorded events matching `predicate`.
    #[must_use]
    pub fn count(&self, predicate: impl Fn(&LowerEvent) -> bool) -> usize {
        self.events.iter().filter(|event| predicate(event)).count()
    }
}

impl LowerTracer for RecordingTracer {
    fn on_event(&mut self, event: LowerEvent) {
        self.events.push(event);
    }
}

pub(crate) fn function_started(function: &FunctionSymbol) -> LowerEvent {
    LowerEvent::FunctionStarted {
        function: function.name.clone(),
    }
}

pub(crate) fn function_finished(function: &FunctionSymbol, statements: usize) -> LowerEvent {
    LowerEvent::FunctionFinished {
        function: function.name.clone(),
        statements,
    }
}
