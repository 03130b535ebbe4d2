use super::ValueMode;
use crate::error::TypeError;
use crate::validator::ValidationIssue;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;
use serde_json::{Map, Value};
use std::fmt;

/// The closed set of built-in type names a declaration may use.
///
/// `Array`, `Object` and `Any` are members of the enumeration for dispatch
/// purposes, but the factory builds them as the Array, Object and Generic
/// variants respectively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    TimeOnly,
    DateTime,
    DateTimeOnly,
    DateOnly,
    Number,
    Integer,
    Boolean,
    String,
    Null,
    Nil,
    File,
    Array,
    Object,
    Any,
}

impl PrimitiveKind {
    pub fn parse(s: &str) -> Option<Self> {
        let kind = match s {
            "time-only" => PrimitiveKind::TimeOnly,
            "datetime" => PrimitiveKind::DateTime,
            "datetime-only" => PrimitiveKind::DateTimeOnly,
            "date-only" => PrimitiveKind::DateOnly,
            "number" => PrimitiveKind::Number,
            "integer" => PrimitiveKind::Integer,
            "boolean" => PrimitiveKind::Boolean,
            "string" => PrimitiveKind::String,
            "null" => PrimitiveKind::Null,
            "nil" => PrimitiveKind::Nil,
            "file" => PrimitiveKind::File,
            "array" => PrimitiveKind::Array,
            "object" => PrimitiveKind::Object,
            "any" => PrimitiveKind::Any,
            _ => return None,
        };
        Some(kind)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PrimitiveKind::TimeOnly => "time-only",
            PrimitiveKind::DateTime => "datetime",
            PrimitiveKind::DateTimeOnly => "datetime-only",
            PrimitiveKind::DateOnly => "date-only",
            PrimitiveKind::Number => "number",
            PrimitiveKind::Integer => "integer",
            PrimitiveKind::Boolean => "boolean",
            PrimitiveKind::String => "string",
            PrimitiveKind::Null => "null",
            PrimitiveKind::Nil => "nil",
            PrimitiveKind::File => "file",
            PrimitiveKind::Array => "array",
            PrimitiveKind::Object => "object",
            PrimitiveKind::Any => "any",
        }
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberFormat {
    Int8,
    Int16,
    Int32,
    Int64,
    Float,
    Double,
}

impl NumberFormat {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "int8" => Some(NumberFormat::Int8),
            "int16" => Some(NumberFormat::Int16),
            "int32" => Some(NumberFormat::Int32),
            "int64" | "int" | "long" => Some(NumberFormat::Int64),
            "float" => Some(NumberFormat::Float),
            "double" => Some(NumberFormat::Double),
            _ => None,
        }
    }

    fn integral_range(self) -> Option<(f64, f64)> {
        match self {
            NumberFormat::Int8 => Some((i8::MIN as f64, i8::MAX as f64)),
            NumberFormat::Int16 => Some((i16::MIN as f64, i16::MAX as f64)),
            NumberFormat::Int32 => Some((i32::MIN as f64, i32::MAX as f64)),
            NumberFormat::Int64 => Some((i64::MIN as f64, i64::MAX as f64)),
            NumberFormat::Float | NumberFormat::Double => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateTimeFormat {
    #[default]
    Rfc3339,
    Rfc2616,
}

#[derive(Debug, Clone, Default)]
pub struct StringFacets {
    pub pattern: Option<Regex>,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub enumeration: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct NumberFacets {
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub multiple_of: Option<f64>,
    pub format: Option<NumberFormat>,
    pub enumeration: Vec<f64>,
}

#[derive(Debug, Clone, Default)]
pub struct FileFacets {
    pub file_types: Vec<String>,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
}

/// A scalar type together with the constraint facets declared for it.
#[derive(Debug, Clone)]
pub enum PrimitiveType {
    String(StringFacets),
    Number(NumberFacets),
    Integer(NumberFacets),
    Boolean,
    DateOnly,
    TimeOnly,
    DateTimeOnly,
    DateTime(DateTimeFormat),
    File(FileFacets),
    Null,
    Nil,
}

impl PrimitiveType {
    /// Build a scalar type of `kind`, reading its facets from the declaration.
    ///
    /// Returns `None` for the kinds that are not scalars (`array`, `object`, `any`).
    pub fn from_facets(
        name: &str,
        kind: PrimitiveKind,
        facets: &Map<String, Value>,
    ) -> Result<Option<Self>, TypeError> {
        let facet = FacetReader { name, facets };
        let ty = match kind {
            PrimitiveKind::String => PrimitiveType::String(StringFacets {
                pattern: facet.pattern()?,
                min_length: facet.usize("minLength")?,
                max_length: facet.usize("maxLength")?,
                enumeration: facet.string_list("enum")?,
            }),
            PrimitiveKind::Number => PrimitiveType::Number(facet.number_facets()?),
            PrimitiveKind::Integer => PrimitiveType::Integer(facet.number_facets()?),
            PrimitiveKind::Boolean => PrimitiveType::Boolean,
            PrimitiveKind::DateOnly => PrimitiveType::DateOnly,
            PrimitiveKind::TimeOnly => PrimitiveType::TimeOnly,
            PrimitiveKind::DateTimeOnly => PrimitiveType::DateTimeOnly,
            PrimitiveKind::DateTime => {
                let format = match facet.string("format")?.as_deref() {
                    None | Some("rfc3339") => DateTimeFormat::Rfc3339,
                    Some("rfc2616") => DateTimeFormat::Rfc2616,
                    Some(other) => {
                        return Err(facet.invalid(format!("unknown datetime format '{other}'")))
                    }
                };
                PrimitiveType::DateTime(format)
            }
            PrimitiveKind::File => PrimitiveType::File(FileFacets {
                file_types: facet.string_list("fileTypes")?,
                min_length: facet.usize("minLength")?,
                max_length: facet.usize("maxLength")?,
            }),
            PrimitiveKind::Null => PrimitiveType::Null,
            PrimitiveKind::Nil => PrimitiveType::Nil,
            PrimitiveKind::Array | PrimitiveKind::Object | PrimitiveKind::Any => return Ok(None),
        };
        Ok(Some(ty))
    }

    pub fn kind(&self) -> PrimitiveKind {
        match self {
            PrimitiveType::String(_) => PrimitiveKind::String,
            PrimitiveType::Number(_) => PrimitiveKind::Number,
            PrimitiveType::Integer(_) => PrimitiveKind::Integer,
            PrimitiveType::Boolean => PrimitiveKind::Boolean,
            PrimitiveType::DateOnly => PrimitiveKind::DateOnly,
            PrimitiveType::TimeOnly => PrimitiveKind::TimeOnly,
            PrimitiveType::DateTimeOnly => PrimitiveKind::DateTimeOnly,
            PrimitiveType::DateTime(_) => PrimitiveKind::DateTime,
            PrimitiveType::File(_) => PrimitiveKind::File,
            PrimitiveType::Null => PrimitiveKind::Null,
            PrimitiveType::Nil => PrimitiveKind::Nil,
        }
    }

    /// Check a single value against this scalar type.
    ///
    /// In [`ValueMode::Textual`] a string value is first coerced to the
    /// declared kind, the way a query parameter or a form field arrives.
    pub fn check(&self, value: &Value, location: &str, mode: ValueMode) -> Result<(), ValidationIssue> {
        let textual = mode == ValueMode::Textual;
        let mismatch = || {
            ValidationIssue::new(
                location,
                "type",
                format!("expected {}, got {}", self.kind(), describe_value(value)),
            )
        };

        match self {
            PrimitiveType::String(facets) => {
                let s = value.as_str().ok_or_else(mismatch)?;
                check_string(s, facets, location)
            }
            PrimitiveType::Number(facets) => {
                let n = as_number(value, textual).ok_or_else(mismatch)?;
                check_number(n, facets, location)
            }
            PrimitiveType::Integer(facets) => {
                let n = as_number(value, textual)
                    .filter(|n| n.fract() == 0.0)
                    .ok_or_else(mismatch)?;
                check_number(n, facets, location)
            }
            PrimitiveType::Boolean => match value {
                Value::Bool(_) => Ok(()),
                Value::String(s) if textual && (s == "true" || s == "false") => Ok(()),
                _ => Err(mismatch()),
            },
            PrimitiveType::DateOnly => {
                let s = value.as_str().ok_or_else(mismatch)?;
                NaiveDate::parse_from_str(s, "%Y-%m-%d")
                    .map(|_| ())
                    .map_err(|_| format_issue(location, "date-only (YYYY-MM-DD)", s))
            }
            PrimitiveType::TimeOnly => {
                let s = value.as_str().ok_or_else(mismatch)?;
                NaiveTime::parse_from_str(s, "%H:%M:%S%.f")
                    .map(|_| ())
                    .map_err(|_| format_issue(location, "time-only (hh:mm:ss)", s))
            }
            PrimitiveType::DateTimeOnly => {
                let s = value.as_str().ok_or_else(mismatch)?;
                NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
                    .map(|_| ())
                    .map_err(|_| format_issue(location, "datetime-only (YYYY-MM-DDThh:mm:ss)", s))
            }
            PrimitiveType::DateTime(format) => {
                let s = value.as_str().ok_or_else(mismatch)?;
                let parsed = match format {
                    DateTimeFormat::Rfc3339 => DateTime::parse_from_rfc3339(s).map(|_| ()),
                    DateTimeFormat::Rfc2616 => DateTime::parse_from_rfc2822(s).map(|_| ()),
                };
                parsed.map_err(|_| {
                    let expected = match format {
                        DateTimeFormat::Rfc3339 => "datetime (RFC 3339)",
                        DateTimeFormat::Rfc2616 => "datetime (RFC 2616)",
                    };
                    format_issue(location, expected, s)
                })
            }
            PrimitiveType::File(facets) => {
                let s = value.as_str().ok_or_else(mismatch)?;
                check_length(s.len(), facets.min_length, facets.max_length, location)
            }
            PrimitiveType::Null | PrimitiveType::Nil => match value {
                Value::Null => Ok(()),
                Value::String(s) if textual && (s.is_empty() || s == "null") => Ok(()),
                _ => Err(mismatch()),
            },
        }
    }
}

fn format_issue(location: &str, expected: &str, got: &str) -> ValidationIssue {
    ValidationIssue::new(location, "format", format!("expected {expected}, got '{got}'"))
}

fn as_number(value: &Value, textual: bool) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) if textual => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        _ => None,
    }
}

fn check_string(s: &str, facets: &StringFacets, location: &str) -> Result<(), ValidationIssue> {
    check_length(s.chars().count(), facets.min_length, facets.max_length, location)?;
    if let Some(pattern) = &facets.pattern {
        if !pattern.is_match(s) {
            return Err(ValidationIssue::new(
                location,
                "pattern",
                format!("'{s}' does not match pattern '{}'", pattern.as_str()),
            ));
        }
    }
    if !facets.enumeration.is_empty() && !facets.enumeration.iter().any(|e| e == s) {
        return Err(ValidationIssue::new(
            location,
            "enum",
            format!("'{s}' is not one of [{}]", facets.enumeration.join(", ")),
        ));
    }
    Ok(())
}

fn check_length(
    len: usize,
    min: Option<usize>,
    max: Option<usize>,
    location: &str,
) -> Result<(), ValidationIssue> {
    if let Some(min) = min.filter(|min| len < *min) {
        return Err(ValidationIssue::new(
            location,
            "minLength",
            format!("length {len} is shorter than {min}"),
        ));
    }
    if let Some(max) = max.filter(|max| len > *max) {
        return Err(ValidationIssue::new(
            location,
            "maxLength",
            format!("length {len} is longer than {max}"),
        ));
    }
    Ok(())
}

fn check_number(n: f64, facets: &NumberFacets, location: &str) -> Result<(), ValidationIssue> {
    if let Some(min) = facets.minimum.filter(|min| n < *min) {
        return Err(ValidationIssue::new(
            location,
            "minimum",
            format!("{n} is less than the minimum {min}"),
        ));
    }
    if let Some(max) = facets.maximum.filter(|max| n > *max) {
        return Err(ValidationIssue::new(
            location,
            "maximum",
            format!("{n} is greater than the maximum {max}"),
        ));
    }
    if let Some(step) = facets.multiple_of.filter(|step| *step != 0.0) {
        let ratio = n / step;
        if (ratio - ratio.round()).abs() > 1e-9 {
            return Err(ValidationIssue::new(
                location,
                "multipleOf",
                format!("{n} is not a multiple of {step}"),
            ));
        }
    }
    if let Some(format) = facets.format {
        if let Some((lo, hi)) = format.integral_range() {
            if n.fract() != 0.0 || n < lo || n > hi {
                return Err(ValidationIssue::new(
                    location,
                    "format",
                    format!("{n} does not fit format {format:?}"),
                ));
            }
        }
    }
    if !facets.enumeration.is_empty() && !facets.enumeration.contains(&n) {
        return Err(ValidationIssue::new(
            location,
            "enum",
            format!("{n} is not one of the allowed values"),
        ));
    }
    Ok(())
}

/// Human-readable JSON kind of a value, for diagnostics.
pub fn describe_value(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

struct FacetReader<'a> {
    name: &'a str,
    facets: &'a Map<String, Value>,
}

impl FacetReader<'_> {
    fn invalid(&self, reason: String) -> TypeError {
        TypeError::InvalidDefinition {
            name: self.name.to_string(),
            reason,
        }
    }

    fn usize(&self, key: &str) -> Result<Option<usize>, TypeError> {
        match self.facets.get(key) {
            None => Ok(None),
            // Trait substitution leaves numbers as text.
            Some(v) => v
                .as_u64()
                .or_else(|| v.as_str().and_then(|s| s.trim().parse().ok()))
                .map(|n| Some(n as usize))
                .ok_or_else(|| self.invalid(format!("facet '{key}' must be a non-negative integer"))),
        }
    }

    fn f64(&self, key: &str) -> Result<Option<f64>, TypeError> {
        match self.facets.get(key) {
            None => Ok(None),
            Some(v) => v
                .as_f64()
                .or_else(|| v.as_str().and_then(|s| s.trim().parse().ok()))
                .map(Some)
                .ok_or_else(|| self.invalid(format!("facet '{key}' must be a number"))),
        }
    }

    fn string(&self, key: &str) -> Result<Option<String>, TypeError> {
        match self.facets.get(key) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(_) => Err(self.invalid(format!("facet '{key}' must be a string"))),
        }
    }

    fn string_list(&self, key: &str) -> Result<Vec<String>, TypeError> {
        match self.facets.get(key) {
            None => Ok(Vec::new()),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| match item {
                    Value::String(s) => Ok(s.clone()),
                    Value::Number(n) => Ok(n.to_string()),
                    Value::Bool(b) => Ok(b.to_string()),
                    _ => Err(self.invalid(format!("facet '{key}' must list scalars"))),
                })
                .collect(),
            Some(Value::String(s)) => Ok(vec![s.clone()]),
            Some(_) => Err(self.invalid(format!("facet '{key}' must be a sequence"))),
        }
    }

    fn pattern(&self) -> Result<Option<Regex>, TypeError> {
        self.string("pattern")?
            .map(|p| {
                Regex::new(&p).map_err(|e| self.invalid(format!("invalid pattern '{p}': {e}")))
            })
            .transpose()
    }

    fn number_facets(&self) -> Result<NumberFacets, TypeError> {
        let format = match self.string("format")? {
            None => None,
            Some(f) => Some(
                NumberFormat::parse(&f)
                    .ok_or_else(|| self.invalid(format!("unknown number format '{f}'")))?,
            ),
        };
        let enumeration = match self.facets.get("enum") {
            None => Vec::new(),
            Some(Value::Array(items)) => items
                .iter()
                .map(|v| {
                    v.as_f64()
                        .ok_or_else(|| self.invalid("facet 'enum' must list numbers".to_string()))
                })
                .collect::<Result<_, _>>()?,
            Some(_) => return Err(self.invalid("facet 'enum' must be a sequence".to_string())),
        };
        Ok(NumberFacets {
            minimum: self.f64("minimum")?,
            maximum: self.f64("maximum")?,
            multiple_of: self.f64("multipleOf")?,
            format,
            enumeration,
        })
    }
}
