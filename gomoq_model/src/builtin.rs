/// Types declared in Go's universe block.
pub const PREDECLARED_TYPES: &[&str] = &[
    "any",
    "bool",
    "byte",
    "comparable",
    "complex64",
    "complex128",
    "error",
    "float32",
    "float64",
    "int",
    "int8",
    "int16",
    "int32",
    "int64",
    "rune",
    "string",
    "uint",
    "uint8",
    "uint16",
    "uint32",
    "uint64",
    "uintptr",
];

pub fn is_predeclared(name: &str) -> bool {
    PREDECLARED_TYPES.contains(&name)
}

/// An identifier is exported when it starts with an upper-case letter.
pub fn is_exported(name: &str) -> bool {
    name.chars().next().map_or(false, char::is_uppercase)
}
