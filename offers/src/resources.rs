//! Resource bundles and shape-wise subtraction.
//!
//! The core never interprets a resource's `name` — it only knows how to
//! subtract one bundle from another given the value's shape. Names like
//! `"cpus"` or `"ports"` are opaque strings as far as this module cares.

use std::collections::BTreeSet;

/// A closed interval `[begin, end]` of integers, e.g. a port range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ValueRange {
    pub begin: u64,
    pub end: u64,
}

impl ValueRange {
    pub fn new(begin: u64, end: u64) -> Self {
        Self { begin, end }
    }
}

/// The shape of a resource's value. Any shape this enum doesn't name is
/// represented as `Opaque` and passed through subtraction untouched.
#[derive(Debug, Clone, PartialEq)]
pub enum ResourceValue {
    Scalar(f64),
    Ranges(Vec<ValueRange>),
    Set(BTreeSet<String>),
    Opaque(serde_json::Value),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    pub name: String,
    pub role: String,
    pub value: ResourceValue,
}

impl Resource {
    pub fn scalar(name: impl Into<String>, role: impl Into<String>, amount: f64) -> Self {
        Self {
            name: name.into(),
            role: role.into(),
            value: ResourceValue::Scalar(amount),
        }
    }

    pub fn ranges(name: impl Into<String>, role: impl Into<String>, ranges: Vec<ValueRange>) -> Self {
        Self {
            name: name.into(),
            role: role.into(),
            value: ResourceValue::Ranges(ranges),
        }
    }

    pub fn set(name: impl Into<String>, role: impl Into<String>, items: BTreeSet<String>) -> Self {
        Self {
            name: name.into(),
            role: role.into(),
            value: ResourceValue::Set(items),
        }
    }

    fn key(&self) -> (&str, &str) {
        (self.name.as_str(), self.role.as_str())
    }
}

/// Scalar amounts within this distance of zero are treated as exhausted.
const SCALAR_EPSILON: f64 = 1e-6;

/// Subtracts `consumed` from `offer`, shape-wise, per resource `(name,
/// role)`. Returns the reduced resource list plus a reason string for every
/// consumed entry that could not be applied (no matching resource in
/// `offer`, or a shape mismatch) — callers log these and keep going rather
/// than treat them as fatal, per the documented placement-processing error
/// path.
pub fn subtract_resources(offer: &[Resource], consumed: &[Resource]) -> (Vec<Resource>, Vec<String>) {
    let mut result = offer.to_vec();
    let mut errors = Vec::new();

    for c in consumed {
        let idx = result.iter().position(|r| r.key() == c.key());

        let Some(idx) = idx else {
            errors.push(format!(
                "no matching resource '{}' (role '{}') in current offer",
                c.name, c.role
            ));
            continue;
        };

        match subtract_value(&result[idx].value, &c.value) {
            Ok(Some(new_value)) => result[idx].value = new_value,
            Ok(None) => {
                result.remove(idx);
            }
            Err(reason) => errors.push(format!(
                "resource '{}' (role '{}'): {}",
                c.name, c.role, reason
            )),
        }
    }

    (result, errors)
}

/// Returns `Ok(Some(new_value))` if the resource survives, `Ok(None)` if it
/// should be dropped entirely, or `Err` on a shape mismatch.
fn subtract_value(existing: &ResourceValue, consumed: &ResourceValue) -> Result<Option<ResourceValue>, String> {
    match (existing, consumed) {
        (ResourceValue::Scalar(e), ResourceValue::Scalar(c)) => {
            let remaining = e - c;
            if remaining <= SCALAR_EPSILON {
                Ok(None)
            } else {
                Ok(Some(ResourceValue::Scalar(remaining)))
            }
        }
        (ResourceValue::Ranges(e), ResourceValue::Ranges(c)) => {
            let remaining = subtract_ranges(e, c);
            if remaining.is_empty() {
                Ok(None)
            } else {
                Ok(Some(ResourceValue::Ranges(remaining)))
            }
        }
        (ResourceValue::Set(e), ResourceValue::Set(c)) => {
            let remaining: BTreeSet<String> = e.difference(c).cloned().collect();
            if remaining.is_empty() {
                Ok(None)
            } else {
                Ok(Some(ResourceValue::Set(remaining)))
            }
        }
        (ResourceValue::Opaque(_), _) => Ok(Some(existing.clone())),
        _ => Err("consumed value shape does not match offered value shape".to_string()),
    }
}

fn subtract_ranges(existing: &[ValueRange], consumed: &[ValueRange]) -> Vec<ValueRange> {
    let mut remaining = existing.to_vec();

    for c in consumed {
        let mut next = Vec::with_capacity(remaining.len());
        for r in remaining {
            next.extend(subtract_range(r, c));
        }
        remaining = next;
    }

    remaining
}

fn subtract_range(r: ValueRange, c: &ValueRange) -> Vec<ValueRange> {
    if c.end < r.begin || c.begin > r.end {
        return vec![r];
    }

    let mut out = Vec::with_capacity(2);
    if r.begin < c.begin {
        out.push(ValueRange::new(r.begin, c.begin - 1));
    }
    if r.end > c.end {
        out.push(ValueRange::new(c.end + 1, r.end));
    }
    out
}
