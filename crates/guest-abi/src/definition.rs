//! ABI descriptors and the roles a type can be laid out under.
//!
//! An ABI is a type-level contract: it names the execution state it reads,
//! the position (cursor) it advances, and, per (role, type) pair, how much
//! storage a value consumes. ABIs are usually uninhabited enums.

use std::fmt;

use crate::layout::InitPosition;

/// A guest calling convention.
pub trait Abi {
    /// Short name used in logs and reports.
    const NAME: &'static str;

    /// Execution state a position may be seeded from. Only ever borrowed.
    type State: ?Sized;

    /// Cursor through the ABI's registers and stack.
    type Position: InitPosition<Self::State>;
}

mod sealed {
    pub trait Sealed {}
}

/// Compile-time role marker: [`ResultRole`] or [`ArgumentRole`].
pub trait Role: sealed::Sealed {
    const KIND: RoleKind;
}

/// The type is the call's return value.
#[derive(Debug)]
pub enum ResultRole {}

/// The type is one of the call's arguments.
#[derive(Debug)]
pub enum ArgumentRole {}

impl sealed::Sealed for ResultRole {}
impl sealed::Sealed for ArgumentRole {}

impl Role for ResultRole {
    const KIND: RoleKind = RoleKind::Result;
}

impl Role for ArgumentRole {
    const KIND: RoleKind = RoleKind::Argument;
}

/// Runtime mirror of a [`Role`], for logging and reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoleKind {
    Result,
    Argument,
}

impl RoleKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            RoleKind::Result => "result",
            RoleKind::Argument => "argument",
        }
    }
}

impl fmt::Display for RoleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Storage reservation for a value of type `T` appearing under role `R`.
///
/// The provided `allocate` is a no-op: the type occupies no layout-relevant
/// storage, or its storage is implied by the value codec. An ABI that needs
/// more overrides it in the impl for that exact `(R, T)` pair. There are no
/// blanket impls, so a type is never laid out by the rule of a related type.
///
/// Use [`default_allocation!`](crate::default_allocation) to declare the
/// no-op pairs in bulk.
pub trait Allocate<R: Role, T: ?Sized>: Abi {
    /// Advance `position` past the storage a `T` consumes.
    ///
    /// On return `position` must describe the next free slot after the value.
    fn allocate(_state: &Self::State, _position: &mut Self::Position) {}
}

/// Implement [`Allocate`] with the no-op default for a list of types.
///
/// ```
/// use guest_abi::{Abi, ArgumentRole, DefaultPosition, ResultRole, default_allocation};
///
/// #[derive(Default)]
/// pub struct Cursor(usize);
/// impl DefaultPosition for Cursor {}
///
/// pub enum Tiny {}
/// impl Abi for Tiny {
///     const NAME: &'static str = "tiny";
///     type State = ();
///     type Position = Cursor;
/// }
///
/// default_allocation!(Tiny => ResultRole: (), u32);
/// default_allocation!(Tiny => ArgumentRole: u32);
/// ```
#[macro_export]
macro_rules! default_allocation {
    ($abi:ty => $role:ty: $($ty:ty),+ $(,)?) => {
        $(
            impl $crate::Allocate<$role, $ty> for $abi {}
        )+
    };
}
