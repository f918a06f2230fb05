use zbus::zvariant::{Str, Value};

/// Strips any number of variant wrappers (`v`) around a value.
#[must_use]
pub fn peel<'a, 'b>(mut v: &'a Value<'b>) -> &'a Value<'b> {
    while let Value::Value(inner) = v {
        v = inner;
    }
    v
}

#[must_use]
/// Converts a [`Value`] into [`Str`], or return [`None`] if it's not `str`.
pub fn extract_str<'a, 'b>(v: &'a Value<'b>) -> Option<&'a Str<'b>> {
    if let Value::Str(v) = peel(v) {
        Some(v)
    } else {
        None
    }
}

#[must_use]
pub fn extract_bool(v: &Value<'_>) -> Option<bool> {
    if let Value::Bool(v) = peel(v) {
        Some(*v)
    } else {
        None
    }
}

#[must_use]
/// Reads an unsigned 16-bit value. BlueZ reports volume as `q`, but some
/// stacks widen it, so other unsigned integers that fit are accepted too.
pub fn extract_u16(v: &Value<'_>) -> Option<u16> {
    match peel(v) {
        Value::U16(v) => Some(*v),
        Value::U8(v) => Some(u16::from(*v)),
        Value::U32(v) => u16::try_from(*v).ok(),
        _ => None,
    }
}

/// Looks up a string entry of an `a{sv}` dictionary value.
#[must_use]
pub fn dict_str<'a>(v: &'a Value<'_>, key: &str) -> Option<&'a str> {
    let Value::Dict(dict) = peel(v) else {
        return None;
    };
    dict.iter()
        .find(|(k, _)| extract_str(k).is_some_and(|k| k.as_str() == key))
        .and_then(|(_, v)| extract_str(v))
        .map(Str::as_str)
}
