//! Signature layout: position initialization, per-type allocation and the
//! signature walk.
//!
//! A layout computation creates one position with [`initialize_position`],
//! then threads it by `&mut` through the result and every argument in
//! declaration order. All dispatch is resolved by trait selection, so a
//! signature the ABI cannot lay out is a compile error rather than a runtime
//! failure.

use std::any::type_name;

use crate::definition::{Abi, Allocate, ArgumentRole, ResultRole, Role, RoleKind};

// ── Position initialization ──

/// Construction of a position at the start of a layout computation.
///
/// Implement this directly when the position is seeded from live execution
/// state (an initial stack pointer, a register window base). Positions that
/// start from a fixed value implement [`DefaultPosition`] instead and get
/// this trait for every state type.
pub trait InitPosition<S: ?Sized>: Sized {
    fn init(state: &S) -> Self;
}

/// Marker for positions that start from [`Default::default`] and never read
/// the execution state.
pub trait DefaultPosition: Default {}

impl<P: DefaultPosition, S: ?Sized> InitPosition<S> for P {
    fn init(_state: &S) -> Self {
        P::default()
    }
}

/// Create the starting position for one layout computation under `A`.
#[must_use]
pub fn initialize_position<A: Abi>(state: &A::State) -> A::Position {
    tracing::trace!(abi = A::NAME, "initialize position");
    <A::Position as InitPosition<A::State>>::init(state)
}

// ── Per-type allocation ──

/// Reserve storage for a `T` under role `R`.
///
/// Runs the ABI's override for exactly `(R, T)` if it has one, otherwise the
/// no-op default.
pub fn allocate<A, R, T>(state: &A::State, position: &mut A::Position)
where
    A: Allocate<R, T>,
    R: Role,
    T: ?Sized,
{
    tracing::trace!(
        abi = A::NAME,
        role = R::KIND.as_str(),
        ty = type_name::<T>(),
        "allocate"
    );
    <A as Allocate<R, T>>::allocate(state, position);
}

/// Which part of a signature an allocation step belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    Result,
    /// Zero-based argument index.
    Argument(usize),
}

impl Step {
    #[must_use]
    pub const fn role(self) -> RoleKind {
        match self {
            Step::Result => RoleKind::Result,
            Step::Argument(_) => RoleKind::Argument,
        }
    }
}

/// Hook called after every step of a signature walk.
///
/// `()` is the no-op observer used by the plain walker entry points.
pub trait LayoutObserver<A: Abi> {
    fn observe(&mut self, step: Step, type_name: &'static str, position: &A::Position);
}

impl<A: Abi> LayoutObserver<A> for () {
    #[inline]
    fn observe(&mut self, _step: Step, _type_name: &'static str, _position: &A::Position) {}
}

fn allocate_step<A, R, T, O>(
    state: &A::State,
    position: &mut A::Position,
    step: Step,
    observer: &mut O,
) where
    A: Allocate<R, T>,
    R: Role,
    O: LayoutObserver<A>,
{
    allocate::<A, R, T>(state, position);
    observer.observe(step, type_name::<T>(), position);
}

// ── Signature walk ──

/// An ordered list of argument types, as a tuple.
///
/// Implemented for tuples of up to twelve elements whose every element the
/// ABI can allocate under [`ArgumentRole`]. Each impl allocates its head and
/// recurses into the tuple of the remaining types; `()` ends the recursion.
pub trait Arguments<A: Abi> {
    /// Number of arguments in the list.
    const COUNT: usize;

    /// Allocate every argument in order, numbering them from `index`.
    fn allocate_from<O: LayoutObserver<A>>(
        state: &A::State,
        position: &mut A::Position,
        index: usize,
        observer: &mut O,
    );
}

impl<A: Abi> Arguments<A> for () {
    const COUNT: usize = 0;

    #[inline]
    fn allocate_from<O: LayoutObserver<A>>(
        _state: &A::State,
        _position: &mut A::Position,
        _index: usize,
        _observer: &mut O,
    ) {
    }
}

macro_rules! impl_arguments {
    () => {};
    ($head:ident $(, $tail:ident)*) => {
        impl<A, $head $(, $tail)*> Arguments<A> for ($head, $($tail,)*)
        where
            A: Abi + Allocate<ArgumentRole, $head>,
            ($($tail,)*): Arguments<A>,
        {
            const COUNT: usize = 1 + <($($tail,)*) as Arguments<A>>::COUNT;

            fn allocate_from<O: LayoutObserver<A>>(
                state: &A::State,
                position: &mut A::Position,
                index: usize,
                observer: &mut O,
            ) {
                allocate_step::<A, ArgumentRole, $head, O>(
                    state,
                    position,
                    Step::Argument(index),
                    observer,
                );
                <($($tail,)*) as Arguments<A>>::allocate_from(state, position, index + 1, observer);
            }
        }

        impl_arguments!($($tail),*);
    };
}

impl_arguments!(T1, T2, T3, T4, T5, T6, T7, T8, T9, T10, T11, T12);

/// A call signature written as a function pointer type, e.g.
/// `fn(i32, u64) -> i64`.
pub trait Signature {
    type Result;
    /// Argument types as a tuple.
    type Arguments;
}

macro_rules! impl_signature {
    ($($arg:ident),*) => {
        impl<R, $($arg),*> Signature for fn($($arg),*) -> R {
            type Result = R;
            type Arguments = ($($arg,)*);
        }
    };
}

impl_signature!();
impl_signature!(T1);
impl_signature!(T1, T2);
impl_signature!(T1, T2, T3);
impl_signature!(T1, T2, T3, T4);
impl_signature!(T1, T2, T3, T4, T5);
impl_signature!(T1, T2, T3, T4, T5, T6);
impl_signature!(T1, T2, T3, T4, T5, T6, T7);
impl_signature!(T1, T2, T3, T4, T5, T6, T7, T8);
impl_signature!(T1, T2, T3, T4, T5, T6, T7, T8, T9);
impl_signature!(T1, T2, T3, T4, T5, T6, T7, T8, T9, T10);
impl_signature!(T1, T2, T3, T4, T5, T6, T7, T8, T9, T10, T11);
impl_signature!(T1, T2, T3, T4, T5, T6, T7, T8, T9, T10, T11, T12);

/// Allocate storage for a call's return value.
pub fn allocate_result<A, Ret>(state: &A::State, position: &mut A::Position)
where
    A: Allocate<ResultRole, Ret>,
{
    allocate_result_with::<A, Ret, ()>(state, position, &mut ());
}

pub fn allocate_result_with<A, Ret, O>(
    state: &A::State,
    position: &mut A::Position,
    observer: &mut O,
) where
    A: Allocate<ResultRole, Ret>,
    O: LayoutObserver<A>,
{
    allocate_step::<A, ResultRole, Ret, O>(state, position, Step::Result, observer);
}

/// Allocate storage for each argument in `Args`, left to right.
pub fn allocate_arguments<A, Args>(state: &A::State, position: &mut A::Position)
where
    A: Abi,
    Args: Arguments<A>,
{
    Args::allocate_from(state, position, 0, &mut ());
}

/// Allocate the result and then every argument of a signature.
///
/// The position ends up past the storage of the result followed by all
/// arguments, in declaration order. No bounds are checked here: running out
/// of registers is for the ABI's allocators to handle.
pub fn allocate_signature<A, Ret, Args>(state: &A::State, position: &mut A::Position)
where
    A: Allocate<ResultRole, Ret>,
    Args: Arguments<A>,
{
    allocate_signature_with::<A, Ret, Args, ()>(state, position, &mut ());
}

/// [`allocate_signature`], reporting every step to `observer`.
pub fn allocate_signature_with<A, Ret, Args, O>(
    state: &A::State,
    position: &mut A::Position,
    observer: &mut O,
) where
    A: Allocate<ResultRole, Ret>,
    Args: Arguments<A>,
    O: LayoutObserver<A>,
{
    allocate_result_with::<A, Ret, O>(state, position, observer);
    Args::allocate_from(state, position, 0, observer);
}

/// [`allocate_signature`] for a function pointer type.
pub fn allocate_call<A, F>(state: &A::State, position: &mut A::Position)
where
    F: Signature,
    A: Allocate<ResultRole, F::Result>,
    F::Arguments: Arguments<A>,
{
    allocate_signature::<A, F::Result, F::Arguments>(state, position);
}

pub fn allocate_call_with<A, F, O>(
    state: &A::State,
    position: &mut A::Position,
    observer: &mut O,
) where
    F: Signature,
    A: Allocate<ResultRole, F::Result>,
    F::Arguments: Arguments<A>,
    O: LayoutObserver<A>,
{
    allocate_signature_with::<A, F::Result, F::Arguments, O>(state, position, observer);
}
