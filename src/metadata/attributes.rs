//! Reading schema-relevant attributes from parsed Rust items.
//!
//! Supported attributes:
//! - `#[serde(rename, rename_all, skip, default, flatten)]`
//! - `#[schema(rename, required, ignore, description, format, min_length, max_length,
//!   pattern, minimum, maximum, multiple_of, min_items, max_items, unique_items, default,
//!   example, deprecated)]`
//! - `#[validate(length(min, max, equal), range(min, max), email, url)]`
//! - `#[deprecated]` and `///` doc comments

use super::model::Attributes;
use heck::{
    ToKebabCase, ToLowerCamelCase, ToShoutyKebabCase, ToShoutySnakeCase, ToSnakeCase,
    ToUpperCamelCase,
};
use log::warn;
use serde_json::Value;
use std::collections::HashSet;
use syn::meta::ParseNestedMeta;
use syn::{Attribute, Expr, Lit, LitBool, LitInt, LitStr, Token, UnOp};

/// Container-level serde attributes
#[derive(Debug, Default)]
pub(crate) struct SerdeContainer {
    pub rename: Option<String>,
    pub rename_all: Option<String>,
    pub default: bool,
}

/// Field- or variant-level serde attributes
#[derive(Debug, Default)]
pub(crate) struct SerdeField {
    pub rename: Option<String>,
    pub skip: bool,
    pub default: bool,
    pub flatten: bool,
    /// Set when a serde attribute could not be parsed
    pub error: Option<String>,
}

/// `#[schema]`, `#[validate]`, `#[deprecated]` and doc comments
#[derive(Debug, Default)]
pub(crate) struct SchemaAttrs {
    pub rename: Option<String>,
    pub required: Option<bool>,
    pub ignore: bool,
    pub attributes: Attributes,
}

/// Names of derived traits, by last path segment
pub(crate) fn derives(attrs: &[Attribute]) -> HashSet<String> {
    let mut derived = HashSet::new();
    for attr in attrs.iter().filter(|a| a.path().is_ident("derive")) {
        let result = attr.parse_nested_meta(|meta| {
            if let Some(segment) = meta.path.segments.last() {
                derived.insert(segment.ident.to_string());
            }
            Ok(())
        });
        if let Err(e) = result {
            warn!("Ignoring malformed derive attribute: {}", e);
        }
    }
    derived
}

/// Joined `///` lines, or `None` when there are none
pub(crate) fn doc_comment(attrs: &[Attribute]) -> Option<String> {
    let lines: Vec<String> = attrs
        .iter()
        .filter(|a| a.path().is_ident("doc"))
        .filter_map(|a| match &a.meta {
            syn::Meta::NameValue(nv) => match &nv.value {
                Expr::Lit(expr) => match &expr.lit {
                    Lit::Str(s) => Some(s.value().trim().to_string()),
                    _ => None,
                },
                _ => None,
            },
            _ => None,
        })
        .collect();

    let text = lines.join("\n").trim().to_string();
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

pub(crate) fn serde_container(attrs: &[Attribute]) -> SerdeContainer {
    let mut container = SerdeContainer::default();
    for attr in attrs.iter().filter(|a| a.path().is_ident("serde")) {
        let result = attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename") {
                container.rename = parse_rename(&meta)?;
            } else if meta.path.is_ident("rename_all") {
                container.rename_all = parse_rename(&meta)?;
            } else if meta.path.is_ident("default") {
                container.default = true;
                skip_value(&meta)?;
            } else {
                skip_value(&meta)?;
            }
            Ok(())
        });
        if let Err(e) = result {
            warn!("Ignoring malformed container serde attribute: {}", e);
        }
    }
    container
}

pub(crate) fn serde_field(attrs: &[Attribute]) -> SerdeField {
    let mut field = SerdeField::default();
    for attr in attrs.iter().filter(|a| a.path().is_ident("serde")) {
        let result = attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename") {
                field.rename = parse_rename(&meta)?;
            } else if meta.path.is_ident("skip") {
                field.skip = true;
            } else if meta.path.is_ident("default") {
                field.default = true;
                skip_value(&meta)?;
            } else if meta.path.is_ident("flatten") {
                field.flatten = true;
            } else {
                skip_value(&meta)?;
            }
            Ok(())
        });
        if let Err(e) = result {
            field.error = Some(e.to_string());
        }
    }
    field
}

/// Reads `#[schema]`, `#[validate]`, `#[deprecated]` and docs. `target` names the item in
/// warnings.
pub(crate) fn schema_attrs(attrs: &[Attribute], target: &str) -> SchemaAttrs {
    let mut out = SchemaAttrs {
        attributes: Attributes {
            description: doc_comment(attrs),
            ..Default::default()
        },
        ..Default::default()
    };

    for attr in attrs {
        let result = if attr.path().is_ident("schema") {
            attr.parse_nested_meta(|meta| parse_schema_entry(&meta, &mut out))
        } else if attr.path().is_ident("validate") {
            attr.parse_nested_meta(|meta| parse_validate_entry(&meta, &mut out.attributes))
        } else if attr.path().is_ident("deprecated") {
            out.attributes.deprecated = true;
            Ok(())
        } else {
            Ok(())
        };

        if let Err(e) = result {
            warn!("Ignoring malformed attribute on {}: {}", target, e);
        }
    }
    out
}

fn parse_schema_entry(meta: &ParseNestedMeta, out: &mut SchemaAttrs) -> syn::Result<()> {
    let attributes = &mut out.attributes;
    let Some(key) = meta.path.get_ident().map(|i| i.to_string()) else {
        return skip_value(meta);
    };

    match key.as_str() {
        "rename" => out.rename = Some(parse_string(meta)?),
        "required" => out.required = Some(parse_flag(meta)?),
        "ignore" => out.ignore = parse_flag(meta)?,
        "description" => attributes.description = Some(parse_string(meta)?),
        "format" => attributes.format = Some(parse_string(meta)?),
        "min_length" => attributes.min_length = Some(parse_u64(meta)?),
        "max_length" => attributes.max_length = Some(parse_u64(meta)?),
        "pattern" => attributes.pattern = Some(parse_string(meta)?),
        "minimum" => attributes.minimum = Some(parse_f64(meta)?),
        "maximum" => attributes.maximum = Some(parse_f64(meta)?),
        "multiple_of" => attributes.multiple_of = Some(parse_f64(meta)?),
        "min_items" => attributes.min_items = Some(parse_u64(meta)?),
        "max_items" => attributes.max_items = Some(parse_u64(meta)?),
        "unique_items" => attributes.unique_items = Some(parse_flag(meta)?),
        "default" => attributes.default = Some(parse_json(meta)?),
        "example" => attributes.examples.push(parse_json(meta)?),
        "deprecated" => attributes.deprecated = parse_flag(meta)?,
        _ => skip_value(meta)?,
    }
    Ok(())
}

fn parse_validate_entry(meta: &ParseNestedMeta, attributes: &mut Attributes) -> syn::Result<()> {
    if meta.path.is_ident("length") {
        meta.parse_nested_meta(|inner| {
            if inner.path.is_ident("min") {
                attributes.min_length = Some(parse_u64(&inner)?);
            } else if inner.path.is_ident("max") {
                attributes.max_length = Some(parse_u64(&inner)?);
            } else if inner.path.is_ident("equal") {
                let len = parse_u64(&inner)?;
                attributes.min_length = Some(len);
                attributes.max_length = Some(len);
            } else {
                skip_value(&inner)?;
            }
            Ok(())
        })
    } else if meta.path.is_ident("range") {
        meta.parse_nested_meta(|inner| {
            if inner.path.is_ident("min") {
                attributes.minimum = Some(parse_f64(&inner)?);
            } else if inner.path.is_ident("max") {
                attributes.maximum = Some(parse_f64(&inner)?);
            } else {
                skip_value(&inner)?;
            }
            Ok(())
        })
    } else if meta.path.is_ident("email") {
        attributes.format = Some("email".to_string());
        skip_value(meta)
    } else if meta.path.is_ident("url") {
        attributes.format = Some("uri".to_string());
        skip_value(meta)
    } else {
        skip_value(meta)
    }
}

/// Applies a serde `rename_all` rule; `None` for unknown rules
pub(crate) fn apply_rename_rule(rule: &str, name: &str) -> Option<String> {
    let renamed = match rule {
        "lowercase" => name.to_lowercase(),
        "UPPERCASE" => name.to_uppercase(),
        "PascalCase" => name.to_upper_camel_case(),
        "camelCase" => name.to_lower_camel_case(),
        "snake_case" => name.to_snake_case(),
        "SCREAMING_SNAKE_CASE" => name.to_shouty_snake_case(),
        "kebab-case" => name.to_kebab_case(),
        "SCREAMING-KEBAB-CASE" => name.to_shouty_kebab_case(),
        _ => return None,
    };
    Some(renamed)
}

/// `rename = "x"` or `rename(serialize = "x", deserialize = "y")`
fn parse_rename(meta: &ParseNestedMeta) -> syn::Result<Option<String>> {
    if meta.input.peek(Token![=]) {
        return parse_string(meta).map(Some);
    }
    let mut serialize = None;
    meta.parse_nested_meta(|inner| {
        if inner.path.is_ident("serialize") {
            serialize = Some(parse_string(&inner)?);
        } else {
            skip_value(&inner)?;
        }
        Ok(())
    })?;
    Ok(serialize)
}

/// Consumes `= value` or `(...)` after an entry we do not interpret
fn skip_value(meta: &ParseNestedMeta) -> syn::Result<()> {
    if meta.input.peek(Token![=]) {
        meta.value()?.parse::<Expr>()?;
    } else if meta.input.peek(syn::token::Paren) {
        meta.parse_nested_meta(|inner| skip_value(&inner))?;
    }
    Ok(())
}

fn parse_string(meta: &ParseNestedMeta) -> syn::Result<String> {
    let lit: LitStr = meta.value()?.parse()?;
    Ok(lit.value())
}

fn parse_u64(meta: &ParseNestedMeta) -> syn::Result<u64> {
    let lit: LitInt = meta.value()?.parse()?;
    lit.base10_parse()
}

fn parse_f64(meta: &ParseNestedMeta) -> syn::Result<f64> {
    parse_json(meta)?
        .as_f64()
        .ok_or_else(|| meta.error("expected a number"))
}

/// A bare flag means `true`; `flag = false` is also accepted
fn parse_flag(meta: &ParseNestedMeta) -> syn::Result<bool> {
    if meta.input.peek(Token![=]) {
        let lit: LitBool = meta.value()?.parse()?;
        return Ok(lit.value);
    }
    Ok(true)
}

fn parse_json(meta: &ParseNestedMeta) -> syn::Result<Value> {
    let expr: Expr = meta.value()?.parse()?;
    expr_to_json(&expr).ok_or_else(|| meta.error("expected a literal value"))
}

fn expr_to_json(expr: &Expr) -> Option<Value> {
    match expr {
        Expr::Lit(expr) => lit_to_json(&expr.lit, false),
        Expr::Unary(unary) if matches!(unary.op, UnOp::Neg(_)) => match unary.expr.as_ref() {
            Expr::Lit(expr) => lit_to_json(&expr.lit, true),
            _ => None,
        },
        Expr::Array(array) => array
            .elems
            .iter()
            .map(expr_to_json)
            .collect::<Option<Vec<_>>>()
            .map(Value::Array),
        Expr::Paren(paren) => expr_to_json(&paren.expr),
        Expr::Group(group) => expr_to_json(&group.expr),
        _ => None,
    }
}

fn lit_to_json(lit: &Lit, negate: bool) -> Option<Value> {
    match lit {
        Lit::Str(s) if !negate => Some(Value::String(s.value())),
        Lit::Bool(b) if !negate => Some(Value::Bool(b.value)),
        Lit::Int(i) => {
            let value: i64 = i.base10_parse().ok()?;
            Some(Value::from(if negate { -value } else { value }))
        }
        Lit::Float(f) => {
            let value: f64 = f.base10_parse().ok()?;
            serde_json::Number::from_f64(if negate { -value } else { value }).map(Value::Number)
        }
        _ => None,
    }
}
