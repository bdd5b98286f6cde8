//! Resolving `getIconUrl`/`setIconUrl` style method names to field names.

use heck::ToSnakeCase;
use smol_str::SmolStr;

use crate::error::ObjectError;

/// Whether an accessor reads or writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessorKind {
    /// `get<Field>`
    Get,
    /// `set<Field>`
    Set,
}

/// A parsed accessor name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accessor {
    /// Read or write
    pub kind: AccessorKind,
    /// Canonical (snake case) field name
    pub field: SmolStr,
}

impl Accessor {
    /// Split a method name into its prefix and canonical field name.
    ///
    /// ```
    /// use fbgraph_object::accessor::{Accessor, AccessorKind};
    ///
    /// let acc = Accessor::parse("getIconUrl").unwrap();
    /// assert_eq!(acc.kind, AccessorKind::Get);
    /// assert_eq!(acc.field, "icon_url");
    /// ```
    pub fn parse(method: &str) -> Result<Self, ObjectError> {
        let invalid = |reason| ObjectError::InvalidAccessor {
            method: method.into(),
            reason,
        };
        let (kind, rest) = if let Some(rest) = method.strip_prefix("get") {
            (AccessorKind::Get, rest)
        } else if let Some(rest) = method.strip_prefix("set") {
            (AccessorKind::Set, rest)
        } else {
            return Err(invalid("expected a `get` or `set` prefix"));
        };

        match rest.chars().next() {
            Some(c) if c.is_ascii_uppercase() || c == '_' => {}
            None => return Err(invalid("no field name after the prefix")),
            Some(_) => return Err(invalid("field name must start with an uppercase letter")),
        }

        let field = rest.to_snake_case();
        if field.is_empty() {
            return Err(invalid("no field name after the prefix"));
        }
        Ok(Self {
            kind,
            field: field.into(),
        })
    }
}
