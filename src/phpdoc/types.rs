// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! The PHPDoc type mini-language.

use std::fmt;

/// A parsed PHPDoc type expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Type {
    /// `Foo`, `Foo\Bar`, `\Foo\Bar`, or `static`.
    Named { global: bool, parts: Vec<String> },
    /// `$this`.
    This,
    /// `?T`.
    Nullable(Box<Type>),
    /// `A|B|C`.
    Union(Vec<Type>),
    /// `A&B`.
    Intersect(Vec<Type>),
    /// `(T)`.
    Paren(Box<Type>),
    /// `T[]`.
    Array(Box<Type>),
    /// `array` or `array{key: T, …}`.
    ArrayShape(Vec<ShapeElem>),
    /// `object{key: T, …}`.
    ObjectShape(Vec<ShapeElem>),
    /// `B<T, …>`.
    Generic { base: Box<Type>, params: Vec<Type> },
    /// `callable` or `callable(P, …): R`.
    Callable {
        params: Vec<Param>,
        result: Option<Box<Type>>,
    },
    /// `C::NAME` or `C::PREFIX*`.
    ConstFetch { class: Box<Type>, name: String },
    /// A literal value: string, integer, or bare word.
    Literal(String),
}

/// One parameter of a `callable` signature or an `@param`/`@method` tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub typ: Type,
    pub by_ref: bool,
    pub variadic: bool,
    pub name: Option<String>,
    pub default: Option<String>,
}

/// One element of an array or object shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapeElem {
    pub key: Option<String>,
    pub optional: bool,
    pub typ: Type,
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Named { global, parts } => {
                if *global {
                    f.write_str("\\")?;
                }
                f.write_str(&parts.join("\\"))
            }
            Type::This => f.write_str("$this"),
            Type::Nullable(inner) => write!(f, "?{inner}"),
            Type::Union(types) => write_joined(f, types, "|"),
            Type::Intersect(types) => write_joined(f, types, "&"),
            Type::Paren(inner) => write!(f, "({inner})"),
            Type::Array(elem) => write!(f, "{elem}[]"),
            Type::ArrayShape(elems) => write_shape(f, "array", elems),
            Type::ObjectShape(elems) => write_shape(f, "object", elems),
            Type::Generic { base, params } => {
                write!(f, "{base}<")?;
                for (i, param) in params.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{param}")?;
                }
                f.write_str(">")
            }
            Type::Callable { params, result } => {
                f.write_str("callable")?;
                if params.is_empty() && result.is_none() {
                    return Ok(());
                }
                f.write_str("(")?;
                for (i, param) in params.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{param}")?;
                }
                f.write_str(")")?;
                if let Some(result) = result {
                    write!(f, ": {result}")?;
                }
                Ok(())
            }
            Type::ConstFetch { class, name } => write!(f, "{class}::{name}"),
            Type::Literal(value) => f.write_str(value),
        }
    }
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.typ)?;
        let mut sep = " ";
        if self.by_ref {
            f.write_str(" &")?;
            sep = "";
        }
        if self.variadic {
            f.write_str(sep)?;
            f.write_str("...")?;
            sep = "";
        }
        if let Some(name) = &self.name {
            f.write_str(sep)?;
            write!(f, "${name}")?;
        }
        if let Some(default) = &self.default {
            write!(f, " = {default}")?;
        }
        Ok(())
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, types: &[Type], sep: &str) -> fmt::Result {
    for (i, typ) in types.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        write!(f, "{typ}")?;
    }
    Ok(())
}

fn write_shape(f: &mut fmt::Formatter<'_>, base: &str, elems: &[ShapeElem]) -> fmt::Result {
    f.write_str(base)?;
    if elems.is_empty() {
        return Ok(());
    }
    f.write_str("{")?;
    for (i, elem) in elems.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        if let Some(key) = &elem.key {
            f.write_str(key)?;
            if elem.optional {
                f.write_str("?")?;
            }
            f.write_str(": ")?;
        }
        write!(f, "{}", elem.typ)?;
    }
    f.write_str("}")
}

#[cfg(test)]
mod tests {
    use super::{Param, ShapeElem, Type};

    fn named(name: &str) -> Type {
        Type::Named {
            global: false,
            parts: vec![name.to_string()],
        }
    }

    #[test]
    fn display_covers_the_composite_forms() {
        let union = Type::Union(vec![named("int"), Type::Nullable(Box::new(named("Foo")))]);
        assert_eq!(union.to_string(), "int|?Foo");

        let generic = Type::Generic {
            base: Box::new(named("array")),
            params: vec![named("int"), named("string")],
        };
        assert_eq!(generic.to_string(), "array<int, string>");

        let shape = Type::ArrayShape(vec![
            ShapeElem {
                key: Some("id".to_string()),
                optional: false,
                typ: named("int"),
            },
            ShapeElem {
                key: Some("name".to_string()),
                optional: true,
                typ: named("string"),
            },
        ]);
        assert_eq!(shape.to_string(), "array{id: int, name?: string}");

        let callable = Type::Callable {
            params: vec![Param {
                typ: named("int"),
                by_ref: false,
                variadic: true,
                name: Some("args".to_string()),
                default: None,
            }],
            result: Some(Box::new(named("void"))),
        };
        assert_eq!(callable.to_string(), "callable(int ...$args): void");

        let fetch = Type::ConstFetch {
            class: Box::new(named("Foo")),
            name: "BAR_*".to_string(),
        };
        assert_eq!(fetch.to_string(), "Foo::BAR_*");
    }

    #[test]
    fn array_suffix_and_global_names() {
        let arr = Type::Array(Box::new(Type::Named {
            global: true,
            parts: vec!["App".to_string(), "User".to_string()],
        }));
        assert_eq!(arr.to_string(), "\\App\\User[]");
    }
}
