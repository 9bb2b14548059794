use thiserror::Error;

use crate::metadata::token::Token;

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

macro_rules! out_of_bounds_error {
    () => {
        crate::Error::OutOfBounds {
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which covers every boundary failure this library can return.
///
/// Problems *inside* the imported metadata that a consumer must be able to observe and
/// enumerate (a cyclic forwarder, an ambiguous embedded interop type, an unsupported
/// signature shape) are not reported through this type. They are materialized as
/// [`crate::metadata::typesystem::ErrorType`] symbols that flow through the graph like
/// any other type. `Error` is reserved for failures of the caller's request itself or
/// for byte-level corruption detected by the blob parsers.
///
/// # Error Categories
///
/// ## Blob Parsing Errors
/// - [`Error::Malformed`] - Corrupted or invalid signature / attribute blob
/// - [`Error::OutOfBounds`] - Attempted to read beyond the end of a blob
/// - [`Error::RecursionLimit`] - Nesting in a blob exceeded the configured depth
///
/// ## Resolution Context Errors
/// - [`Error::UnitNotFound`] - A compiled unit name is not part of the context
/// - [`Error::DuplicateUnit`] - A compiled unit name was registered twice
/// - [`Error::TypeNotFound`] - A token does not address a row of the expected table
///
/// # Examples
///
/// ```rust
/// use symgraph::{Error, Parser};
///
/// let mut parser = Parser::new(&[]);
/// match parser.read_le::<u32>() {
///     Err(Error::OutOfBounds { .. }) => {}
///     other => panic!("unexpected {:?}", other),
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// A blob is damaged and could not be parsed.
    ///
    /// The error includes the source location where the malformation was detected for
    /// debugging purposes.
    ///
    /// # Fields
    ///
    /// * `message` - Detailed description of what was malformed
    /// * `file` - Source file where the error was detected
    /// * `line` - Source line where the error was detected
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// An out of bound access was attempted while parsing a blob.
    #[error("Out of Bound read would have occurred! - {file}:{line}")]
    OutOfBounds {
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// Recursion limit reached.
    ///
    /// Signature and attribute blobs can nest types arbitrarily deep. A maximum depth is
    /// enforced to prevent stack overflow on hostile input.
    ///
    /// The associated value shows the recursion limit that was reached.
    #[error("Reach the maximum recursion level allowed - {0}")]
    RecursionLimit(usize),

    /// Failed to find a row for the given token.
    ///
    /// The associated [`Token`] identifies which row was not found.
    #[error("Failed to find metadata row - {0}")]
    TypeNotFound(Token),

    /// The named compiled unit is not part of the resolution context.
    #[error("Compiled unit '{0}' is not part of this resolution context")]
    UnitNotFound(String),

    /// A compiled unit with this name was already registered.
    #[error("Compiled unit '{0}' was registered twice")]
    DuplicateUnit(String),
}
