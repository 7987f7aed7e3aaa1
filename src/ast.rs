//! Abstract Syntax Tree for rep interface documents.
//!
//! Pure data: the parser builds it once per document and hands ownership to the
//! caller. `Display` implementations give the canonical text of each entity.

use std::fmt;

use crate::preprocess::Directive;

/// Return type given to slots that declare none.
pub const DEFAULT_RETURN_TYPE: &str = "void";

/// Root of a parsed document: top-level declarations in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ast {
    pub classes: Vec<Class>,
    pub pods: Vec<Pod>,
    pub enums: Vec<Enum>,
    /// Preprocessor lines, in source order, for pass-through by a generator.
    /// Lines from inside class bodies are included. Only the order is kept,
    /// not which declarations a conditional enclosed.
    pub directives: Vec<Directive>,
}

impl Ast {
    pub fn find_class(&self, name: &str) -> Option<&Class> {
        self.classes.iter().find(|c| c.name == name)
    }

    pub fn find_pod(&self, name: &str) -> Option<&Pod> {
        self.pods.iter().find(|p| p.name == name)
    }

    pub fn find_enum(&self, name: &str) -> Option<&Enum> {
        self.enums.iter().find(|e| e.name == name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Class {
    pub name: String,
    pub properties: Vec<Property>,
    pub slots: Vec<Function>,
    pub signals: Vec<Function>,
    /// Enums declared inside the class body.
    pub enums: Vec<Enum>,
}

/// Property mutability.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Modifier {
    #[default]
    ReadWrite,
    ReadOnly,
    Constant,
}

impl Modifier {
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "READWRITE" => Some(Modifier::ReadWrite),
            "READONLY" => Some(Modifier::ReadOnly),
            "CONSTANT" => Some(Modifier::Constant),
            _ => None,
        }
    }

    pub fn keyword(self) -> &'static str {
        match self {
            Modifier::ReadWrite => "READWRITE",
            Modifier::ReadOnly => "READONLY",
            Modifier::Constant => "CONSTANT",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    /// Type text exactly as written, including whitespace inside `<...>`.
    pub type_name: String,
    pub name: String,
    /// Raw default value text, trimmed. Not type-checked.
    pub default_value: Option<String>,
    pub modifier: Modifier,
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.type_name, self.name)?;
        if let Some(default) = &self.default_value {
            write!(f, " = {}", default)?;
        }
        if self.modifier != Modifier::ReadWrite {
            write!(f, " {}", self.modifier.keyword())?;
        }
        Ok(())
    }
}

/// One parameter of a slot or signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub type_name: String,
    pub is_const: bool,
    pub is_reference: bool,
    /// Declared name, or a positional placeholder when the source omits it.
    pub name: String,
}

impl Param {
    /// Placeholder used for an unnamed parameter at 1-based `position`.
    pub fn placeholder_name(position: usize) -> String {
        format!("__repc_variable_{}", position)
    }
}

/// Canonical form: `[const ]type[ &] name`.
impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_const {
            f.write_str("const ")?;
        }
        f.write_str(&self.type_name)?;
        if self.is_reference {
            f.write_str(" &")?;
        }
        write!(f, " {}", self.name)
    }
}

/// A slot or signal. Signals always carry [`DEFAULT_RETURN_TYPE`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Function {
    pub return_type: String,
    pub name: String,
    pub params: Vec<Param>,
}

impl Function {
    /// Parameters joined with `, `.
    pub fn params_as_string(&self) -> String {
        self.params
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// `name(params)`, the form signals are written in.
    pub fn signature(&self) -> String {
        format!("{}({})", self.name, self.params_as_string())
    }
}

/// Slot form: `return_type name(params)`.
impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.return_type, self.signature())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PodAttribute {
    pub type_name: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pod {
    pub name: String,
    pub attributes: Vec<PodAttribute>,
}

impl fmt::Display for Pod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let attributes = self
            .attributes
            .iter()
            .map(|a| format!("{} {}", a.type_name, a.name))
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "POD {}({})", self.name, attributes)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumEntry {
    pub name: String,
    pub value: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enum {
    pub name: String,
    pub entries: Vec<EnumEntry>,
    /// Largest magnitude among entry values.
    pub max: u64,
    /// True iff any entry value is negative.
    pub is_signed: bool,
}

impl Enum {
    /// Build an enum from resolved entries, deriving `max` and `is_signed`.
    pub fn new(name: String, entries: Vec<EnumEntry>) -> Self {
        let max = entries
            .iter()
            .map(|e| e.value.unsigned_abs())
            .max()
            .unwrap_or(0);
        let is_signed = entries.iter().any(|e| e.value < 0);
        Enum {
            name,
            entries,
            max,
            is_signed,
        }
    }
}

impl fmt::Display for Enum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries = self
            .entries
            .iter()
            .map(|e| format!("{} = {}", e.name, e.value))
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "ENUM {} {{{}}}", self.name, entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, value: i64) -> EnumEntry {
        EnumEntry {
            name: name.to_string(),
            value,
        }
    }

    #[test]
    fn enum_derives_max_and_sign() {
        let e = Enum::new("E".into(), vec![entry("a", 15), entry("b", 16)]);
        assert_eq!(e.max, 16);
        assert!(!e.is_signed);

        let e = Enum::new("E".into(), vec![entry("a", 0), entry("b", -1)]);
        assert_eq!(e.max, 1);
        assert!(e.is_signed);

        let e = Enum::new("E".into(), vec![entry("a", i64::MIN)]);
        assert_eq!(e.max, 1u64 << 63);
    }

    #[test]
    fn param_canonical_spacing() {
        let p = Param {
            type_name: "QMap<QList<QString>,int>".into(),
            is_const: true,
            is_reference: true,
            name: "foo".into(),
        };
        assert_eq!(p.to_string(), "const QMap<QList<QString>,int> & foo");

        let f = Function {
            return_type: DEFAULT_RETURN_TYPE.into(),
            name: "test".into(),
            params: vec![
                p,
                Param {
                    type_name: "int".into(),
                    is_const: false,
                    is_reference: false,
                    name: Param::placeholder_name(2),
                },
            ],
        };
        assert_eq!(
            f.to_string(),
            "void test(const QMap<QList<QString>,int> & foo, int __repc_variable_2)"
        );
        assert_eq!(f.signature(), "test(const QMap<QList<QString>,int> & foo, int __repc_variable_2)");
    }

    #[test]
    fn property_display_omits_default_modifier() {
        let p = Property {
            type_name: "int".into(),
            name: "foo".into(),
            default_value: Some("1".into()),
            modifier: Modifier::ReadOnly,
        };
        assert_eq!(p.to_string(), "int foo = 1 READONLY");
        let p = Property {
            modifier: Modifier::ReadWrite,
            default_value: None,
            ..p
        };
        assert_eq!(p.to_string(), "int foo");
    }
}
