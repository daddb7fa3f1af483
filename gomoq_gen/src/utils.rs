use std::collections::HashSet;

use crate::imports::Imports;
use crate::symbols;

pub fn format_mock_ident(interface: &str) -> String {
    format!("Mock{interface}")
}

pub fn format_verifier_ident(interface: &str) -> String {
    format!("Verifier{}", format_mock_ident(interface))
}

pub fn format_ongoing_verification_ident(interface: &str, method: &str) -> String {
    format!("{}_{method}_OngoingVerification", format_mock_ident(interface))
}

pub fn format_result_ident(index: usize) -> String {
    format!("_ret{index}")
}

pub fn format_captured_ident(index: usize) -> String {
    format!("_param{index}")
}

/// Parameter names that cannot shadow an import alias, a name of the
/// generated body or each other. Offenders get `_` prefixes until they are
/// free.
pub fn dedupe_param_names<'a>(
    names: impl IntoIterator<Item = &'a str>,
    imports: &Imports,
) -> Vec<String> {
    let mut taken = HashSet::new();
    names
        .into_iter()
        .map(|name| {
            let mut name = name.to_string();
            while symbols::is_reserved(&name) || imports.is_alias(&name) || taken.contains(&name) {
                name.insert(0, '_');
            }
            taken.insert(name.clone());
            name
        })
        .collect()
}

/// `PtrToHttpRequest` → `ptr_to_http_request`.
pub fn to_snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let chars = name.chars().collect::<Vec<_>>();
    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() {
            let prev_lower = i > 0 && (chars[i - 1].is_lowercase() || chars[i - 1].is_ascii_digit());
            let next_lower = chars.get(i + 1).map_or(false, |n| n.is_lowercase());
            let prev_upper = i > 0 && chars[i - 1].is_uppercase();
            if prev_lower || (prev_upper && next_lower) {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// `net_http` → `NetHttp`.
pub fn to_camel_case(name: &str) -> String {
    name.split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(capitalize)
        .collect()
}

pub fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
