use thiserror::Error;

/// A method signature that Go itself would never accept.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SignatureConstraintError {
    #[error("interface `{interface}` has a method without a name")]
    EmptyMethodName { interface: String },

    #[error("interface `{interface}` declares method `{method}` more than once")]
    DuplicateMethod { interface: String, method: String },

    #[error("variadic parameter `{param}` of `{interface}.{method}` must be the last parameter")]
    VariadicNotLast {
        interface: String,
        method: String,
        param: String,
    },

    #[error("`{interface}.{method}` uses a variadic type inside `{ty}`")]
    NestedVariadic {
        interface: String,
        method: String,
        ty: String,
    },

    #[error("`{interface}.{method}` declares a variadic result")]
    VariadicResult { interface: String, method: String },
}
