use thiserror::Error;

/// Evaluation failure. Evaluation errors are soft: the context reports
/// them and the failing expression yields `Undefined`.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum EvalError {
    #[error("Invalid variable name: {0}")]
    InvalidVariable(String),
    #[error("Variable already defined: {0}")]
    AlreadyDefined(String),
    #[error("Invalid null operand for '{0}'")]
    NullOperand(&'static str),
    #[error("Invalid operands for '{op}': {left} and {right}")]
    Operands {
        op: &'static str,
        left: &'static str,
        right: &'static str,
    },
    #[error("Invalid operand for '{op}': {kind}")]
    Operand { op: &'static str, kind: &'static str },
    #[error("Division by zero")]
    DivisionByZero,
    #[error("Invalid assignment target")]
    NotAssignable,
    #[error("Assignment to a read-only value")]
    ReadOnly,
    #[error("Value is not callable")]
    NotCallable,
    #[error("Operator '{0}' is not supported")]
    Unsupported(&'static str),
    #[error("Invalid dictionary literal")]
    InvalidDictionary,
    #[error("Invalid mixin definition")]
    InvalidMixin,
    #[error("Mixin already defined: {0}")]
    MixinRedefined(String),
    #[error("Mixin not found: {0}")]
    MixinNotFound(String),
    #[error("Missing argument '{param}' for mixin {mixin}")]
    MissingArgument { mixin: String, param: String },
    #[error("Step limit exceeded")]
    StepLimit,
    /// Message returned by a native function.
    #[error("{0}")]
    Native(String),
}

pub type EvalResult<T> = Result<T, EvalError>;
