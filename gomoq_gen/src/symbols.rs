use std::fmt::Display;

macro_rules! define_symbols(
    ($($name:ident => $value:literal),*,) => {
        $(pub const $name: Symbol<'static> = Symbol($value));*;

        /// Every identifier the generated code declares itself.
        pub const ALL: &[Symbol<'static>] = &[$($name),*];
    };
);

define_symbols! {
    // Import aliases
    RUNTIME => "pegomock",
    REFLECT => "reflect",
    TIME => "time",

    // Receivers
    MOCK => "mock",
    VERIFIER => "verifier",
    ONGOING => "c",

    // Locals
    PARAMS => "_params",
    RESULT => "_result",
    INVOCATIONS => "methodInvocations",
    PARAM => "param",
    INDEX => "u",
    NULL_VALUE => "nullValue",
    OPTION => "option",
    OPTIONS => "options",
}

pub const REFLECT_IMPORT: &str = "reflect";
pub const TIME_IMPORT: &str = "time";

/// First line of every generated file.
pub const MARKER: &str = "// Code generated by gomoq. DO NOT EDIT.";

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Symbol<'a>(&'a str);

impl<'a> Symbol<'a> {
    pub fn inner(&self) -> &'a str {
        self.0
    }
}

impl PartialEq<Symbol<'_>> for String {
    fn eq(&self, other: &Symbol<'_>) -> bool {
        self == other.0
    }
}

impl<'a> PartialEq<Symbol<'_>> for &'a String {
    fn eq(&self, other: &Symbol<'_>) -> bool {
        *self == other.0
    }
}

impl PartialEq<Symbol<'_>> for str {
    fn eq(&self, other: &Symbol<'_>) -> bool {
        self == other.0
    }
}

impl<'a> PartialEq<Symbol<'_>> for &'a str {
    fn eq(&self, other: &Symbol<'_>) -> bool {
        *self == other.0
    }
}

impl Display for Symbol<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0)
    }
}

/// Whether `name` is taken by the generated code.
pub fn is_reserved(name: &str) -> bool {
    ALL.iter().any(|symbol| name == *symbol) || is_result_local(name)
}

/// `_ret0`, `_ret1`, ... hold the results inside mock methods.
fn is_result_local(name: &str) -> bool {
    name.strip_prefix("_ret")
        .map_or(false, |n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
}
