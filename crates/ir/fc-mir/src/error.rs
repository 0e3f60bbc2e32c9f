//! Errors for malformed bodies.

use miette::Diagnostic;
use thiserror::Error;

/// Result type for body construction and validation.
pub type MirResult<T> = Result<T, MirError>;

/// A body that cannot be analysed.
///
/// These are frontend bugs rather than user errors, so they are reported
/// once and analysis does not start.
#[derive(Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
pub enum MirError {
    /// A place or statement names a local that was never declared
    #[error("unknown local `_{local}`")]
    #[diagnostic(code(mir::unknown_local))]
    UnknownLocal {
        /// Raw local index
        local: u32,
    },

    /// A terminator jumps to a block that does not exist
    #[error("bb{from} jumps to unknown block bb{block}")]
    #[diagnostic(code(mir::unknown_block))]
    UnknownBlock {
        /// Raw index of the missing block
        block: u32,
        /// Raw index of the block holding the terminator
        from: u32,
    },

    /// A type or borrow mentions an origin that was never declared
    #[error("unknown origin `'?{origin}`")]
    #[diagnostic(code(mir::unknown_origin), help("declare every origin on the body before using it"))]
    UnknownOrigin {
        /// Raw origin index
        origin: u32,
    },

    /// A field projection names a field the type does not have
    #[error("`{place}` has no field `{field}`")]
    #[diagnostic(code(mir::no_such_field))]
    NoSuchField {
        /// The place being projected
        place: String,
        /// The missing field
        field: String,
    },

    /// A deref projection applied to something that is not a reference
    #[error("cannot dereference `{place}`, which is not a reference")]
    #[diagnostic(code(mir::deref_of_non_reference))]
    DerefOfNonReference {
        /// The place being dereferenced
        place: String,
    },

    /// A call passes the wrong number of arguments for its signature
    #[error("call to `{callee}` passes {found} arguments, signature expects {expected}")]
    #[diagnostic(code(mir::arity_mismatch))]
    ArityMismatch {
        /// Callee name
        callee: String,
        /// Number of parameters in the signature
        expected: usize,
        /// Number of arguments passed
        found: usize,
    },

    /// A struct aggregate has the wrong number of operands
    #[error("aggregate for `{place}` has {found} operands, type has {expected} fields")]
    #[diagnostic(code(mir::aggregate_arity))]
    AggregateArity {
        /// Destination place
        place: String,
        /// Number of fields in the destination type
        expected: usize,
        /// Number of operands supplied
        found: usize,
    },

    /// The body has no basic blocks
    #[error("body `{name}` has no basic blocks")]
    #[diagnostic(code(mir::empty_body))]
    EmptyBody {
        /// Function name
        name: String,
    },

    /// A block was created by the builder but never terminated
    #[error("block bb{block} has no terminator")]
    #[diagnostic(code(mir::unterminated_block), help("end every block with `goto`, `switch`, `call` or `ret`"))]
    UnterminatedBlock {
        /// Raw block index
        block: u32,
    },
}
