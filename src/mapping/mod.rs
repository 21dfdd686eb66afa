//! Path and template primitives
//!
//! Small total functions shared by schema validation (build time) and event
//! resolution (request time): dotted-path lookup, JSON body field extraction,
//! `:name` URL-template matching and `$name` substitution. None of these
//! return errors; a lookup that cannot succeed yields `None`.

use lazy_static::lazy_static;
use percent_encoding::percent_decode_str;
use regex_lite::Regex;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

lazy_static! {
    /// `$name` references in an identity template
    static ref TEMPLATE_VAR: Regex = Regex::new(r"\$([A-Za-z0-9_]+)").unwrap();
    /// `:name` segments in a URL template
    static ref URL_VAR: Regex = Regex::new(r":([A-Za-z0-9_]+)").unwrap();
}

/// Walk a dotted path (`"a.b.c"`) over nested JSON objects.
///
/// Returns `None` for an empty path, a non-object intermediate value, or any
/// missing segment.
pub fn get_by_path<'a>(obj: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return None;
    }
    let mut current = obj;
    for key in path.split('.') {
        current = current.as_object()?.get(key)?;
    }
    Some(current)
}

/// Extract a value from a JSON body by field spec.
///
/// A spec starting with `$.` is a dotted path into the body; anything else is
/// a single top-level field name.
pub fn get_from_json_body<'a>(body: Option<&'a Value>, spec: &str) -> Option<&'a Value> {
    if spec.is_empty() {
        return None;
    }
    let body = body?;
    if let Some(path) = spec.strip_prefix("$.") {
        get_by_path(body, path)
    } else {
        body.as_object()?.get(spec)
    }
}

/// Match a concrete URL path against a `:name` template.
///
/// Both sides are split on `/` with empty segments discarded. Each `:name`
/// template segment binds the URL-decoded path segment under `name`; every
/// other segment must match literally. Returns `None` on segment-count
/// mismatch, literal mismatch, or when either side is the empty string.
pub fn parse_url_template(template: &str, path: &str) -> Option<BTreeMap<String, String>> {
    if template.is_empty() || path.is_empty() {
        return None;
    }
    let tpl_segs: Vec<&str> = template.split('/').filter(|s| !s.is_empty()).collect();
    let path_segs: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    if tpl_segs.len() != path_segs.len() {
        return None;
    }
    let mut vars = BTreeMap::new();
    for (tpl, seg) in tpl_segs.iter().zip(path_segs.iter()) {
        if let Some(name) = tpl.strip_prefix(':') {
            let decoded = percent_decode_str(seg).decode_utf8_lossy().into_owned();
            vars.insert(name.to_string(), decoded);
        } else if tpl != seg {
            return None;
        }
    }
    Some(vars)
}

/// Replace every `$name` in `template` with the string form of `vars[name]`.
///
/// Unbound variables substitute as the empty string.
pub fn substitute(template: &str, vars: &BTreeMap<String, Value>) -> String {
    TEMPLATE_VAR
        .replace_all(template, |caps: &regex_lite::Captures<'_>| {
            vars.get(&caps[1]).map(value_to_string).unwrap_or_default()
        })
        .into_owned()
}

/// String form of a JSON value for entity-id substitution: strings verbatim,
/// null as empty, everything else via its JSON rendering.
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Distinct `$name` variables referenced by a template string.
pub fn template_vars(template: &str) -> BTreeSet<String> {
    TEMPLATE_VAR
        .captures_iter(template)
        .map(|caps| caps[1].to_string())
        .collect()
}

/// Distinct `:name` variables declared by a URL template.
pub fn url_template_vars(template: &str) -> BTreeSet<String> {
    URL_VAR
        .captures_iter(template)
        .map(|caps| caps[1].to_string())
        .collect()
}
