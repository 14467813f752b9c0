//! Human-readable layout reports built on the walker's observer hook.
//!
//! A report records, for every step of a signature walk, which registers and
//! which stack bytes the cursor advanced over. The ranges describe cursor
//! movement: a register skipped for alignment is part of the range of the
//! value that caused the skip.

use std::any::type_name;
use std::fmt::{self, Write};
use std::ops::Range;

use crate::definition::{Abi, Allocate, ResultRole};
use crate::layout::{
    Arguments, LayoutObserver, Signature, Step, allocate_call_with, initialize_position,
};

/// Resource usage a position can report, for positions that want to appear
/// in a [`LayoutReport`].
pub trait PositionUsage {
    /// Registers consumed so far.
    fn registers_used(&self) -> usize;

    /// Stack bytes consumed so far.
    fn stack_used(&self) -> u64;

    fn register_name(&self, _index: usize) -> Option<&'static str> {
        None
    }
}

/// What one step of the walk consumed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepLayout {
    pub step: Step,
    /// Type name without module paths.
    pub type_name: String,
    pub registers: Range<usize>,
    /// Byte offsets relative to where the position's stack area starts.
    pub stack: Range<u64>,
    /// Names of `registers`; empty unless the ABI names every one of them.
    pub register_names: Vec<&'static str>,
}

impl StepLayout {
    /// The step consumed no storage at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.registers.is_empty() && self.stack.is_empty()
    }
}

/// Complete layout of one signature under one ABI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutReport {
    abi: &'static str,
    signature: String,
    steps: Vec<StepLayout>,
    registers_used: usize,
    stack_used: u64,
    final_position: String,
}

impl LayoutReport {
    #[must_use]
    pub fn abi(&self) -> &'static str {
        self.abi
    }

    #[must_use]
    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// Result step first, then one step per argument.
    #[must_use]
    pub fn steps(&self) -> &[StepLayout] {
        &self.steps
    }

    #[must_use]
    pub fn registers_used(&self) -> usize {
        self.registers_used
    }

    #[must_use]
    pub fn stack_used(&self) -> u64 {
        self.stack_used
    }

    /// `Debug` rendering of the position after the walk.
    #[must_use]
    pub fn final_position(&self) -> &str {
        &self.final_position
    }
}

impl fmt::Display for LayoutReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}: {}", self.abi, self.signature)?;
        for step in &self.steps {
            let label = match step.step {
                Step::Result => "result".to_string(),
                Step::Argument(index) => format!("arg {index}"),
            };
            write!(f, "  {label:<8} {:<12}", step.type_name)?;
            if step.is_empty() {
                writeln!(f, " -")?;
                continue;
            }
            if !step.registers.is_empty() {
                if step.register_names.is_empty() {
                    write!(f, " regs {}..{}", step.registers.start, step.registers.end)?;
                } else {
                    write!(f, " regs {}", step.register_names.join(","))?;
                }
            }
            if !step.stack.is_empty() {
                write!(f, " stack +{}..+{}", step.stack.start, step.stack.end)?;
            }
            writeln!(f)?;
        }
        write!(
            f,
            "total: {} registers, {} stack bytes",
            self.registers_used, self.stack_used
        )
    }
}

struct Recorder {
    registers: usize,
    stack: u64,
    steps: Vec<StepLayout>,
}

impl<A> LayoutObserver<A> for Recorder
where
    A: Abi,
    A::Position: PositionUsage,
{
    fn observe(&mut self, step: Step, type_name: &'static str, position: &A::Position) {
        let registers = self.registers..position.registers_used();
        let stack = self.stack..position.stack_used();
        let register_names = registers
            .clone()
            .map(|index| position.register_name(index))
            .collect::<Option<Vec<_>>>()
            .unwrap_or_default();

        self.registers = registers.end;
        self.stack = stack.end;
        self.steps.push(StepLayout {
            step,
            type_name: short_type_name(type_name),
            registers,
            stack,
            register_names,
        });
    }
}

/// Walk `F` under `A` from a fresh position and record every step.
#[must_use]
pub fn describe<A, F>(state: &A::State) -> LayoutReport
where
    F: Signature,
    A: Allocate<ResultRole, F::Result>,
    F::Arguments: Arguments<A>,
    A::Position: PositionUsage + fmt::Debug,
{
    let mut position = initialize_position::<A>(state);
    let mut recorder = Recorder {
        registers: position.registers_used(),
        stack: position.stack_used(),
        steps: Vec::with_capacity(1 + <F::Arguments as Arguments<A>>::COUNT),
    };

    allocate_call_with::<A, F, Recorder>(state, &mut position, &mut recorder);

    let signature = short_type_name(type_name::<F>());
    tracing::debug!(abi = A::NAME, %signature, "described signature");

    LayoutReport {
        abi: A::NAME,
        signature,
        steps: recorder.steps,
        registers_used: position.registers_used(),
        stack_used: position.stack_used(),
        final_position: format!("{position:?}"),
    }
}

/// Strip module paths from a type name:
/// `fn(guest_abi::abi::GuestPtr) -> i32` becomes `fn(GuestPtr) -> i32`.
#[must_use]
pub fn short_type_name(full: &str) -> String {
    let mut out = String::with_capacity(full.len());
    let mut segment = String::new();
    let mut chars = full.chars().peekable();

    while let Some(c) = chars.next() {
        if c == ':' && chars.peek() == Some(&':') {
            chars.next();
            segment.clear();
        } else if c.is_alphanumeric() || c == '_' {
            segment.push(c);
        } else {
            out.push_str(&segment);
            segment.clear();
            out.push(c);
        }
    }
    out.push_str(&segment);
    out
}

/// Render a report's steps as one compact line, e.g.
/// `result:- arg0:r0 arg1:r1,r2,r3 arg2:+0..+4`. Used in logs and test failure
/// messages.
#[must_use]
pub fn summarize(report: &LayoutReport) -> String {
    Summary(report).to_string()
}

struct Summary<'a>(&'a LayoutReport);

impl fmt::Display for Summary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.0.steps().iter().enumerate() {
            if i > 0 {
                f.write_char(' ')?;
            }
            match step.step {
                Step::Result => f.write_str("result:")?,
                Step::Argument(index) => write!(f, "arg{index}:")?,
            }
            if step.is_empty() {
                f.write_char('-')?;
                continue;
            }
            if !step.register_names.is_empty() {
                f.write_str(&step.register_names.join(","))?;
            } else if !step.registers.is_empty() {
                write!(f, "{}..{}", step.registers.start, step.registers.end)?;
            }
            if !step.stack.is_empty() {
                if !step.registers.is_empty() {
                    f.write_char(',')?;
                }
                write!(f, "+{}..+{}", step.stack.start, step.stack.end)?;
            }
        }
        Ok(())
    }
}
