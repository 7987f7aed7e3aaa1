//! Parse rep source into an AST using PEST.
//!
//! The grammar recognizes the shape of every declaration; the builders below
//! enforce what the grammar leaves open: scope (members only inside a class,
//! no nested classes or PODs), arity of type/name pairs, empty declarations,
//! enum literals and value assignment. The first violation aborts the parse.

use std::collections::HashSet;
use std::io::Read;

use pest::error::LineColLocation;
use pest::Parser;
use pest_derive::Parser as PestParser;

use crate::ast::*;
use crate::error::{Error, ErrorKind, ParseError};
use crate::preprocess::{strip_comments, ConditionalStack, Directive};

#[derive(PestParser)]
#[grammar = "grammar.pest"]
struct RepParser;

type Pair<'i> = pest::iterators::Pair<'i, Rule>;

/// Parse a rep document into an AST.
pub fn parse(source: &str) -> Result<Ast, ParseError> {
    let text = strip_comments(source)?;
    let document = RepParser::parse(Rule::document, &text)
        .map_err(syntax_error)?
        .next()
        .ok_or_else(|| ParseError::new(ErrorKind::Structural, (1, 1), "empty parse"))?;
    DocumentBuilder::new(&text).build(document)
}

/// Read an already-open input to the end and parse it.
pub fn parse_reader<R: Read>(mut reader: R) -> Result<Ast, Error> {
    let mut source = String::new();
    reader.read_to_string(&mut source)?;
    Ok(parse(&source)?)
}

fn syntax_error(error: pest::error::Error<Rule>) -> ParseError {
    let error = error.renamed_rules(describe_rule);
    let at = match &error.line_col {
        LineColLocation::Pos(at) => *at,
        LineColLocation::Span(at, _) => *at,
    };
    ParseError::new(ErrorKind::Structural, at, error.variant.message())
}

fn describe_rule(rule: &Rule) -> String {
    match rule {
        Rule::ident | Rule::param_name => "identifier".to_string(),
        Rule::type_expr => "type".to_string(),
        Rule::class_decl | Rule::kw_class => "class declaration".to_string(),
        Rule::class_body => "class body `{ ... }`".to_string(),
        Rule::property | Rule::kw_prop => "PROP(...)".to_string(),
        Rule::slot | Rule::kw_slot => "SLOT(...)".to_string(),
        Rule::signal | Rule::kw_signal => "SIGNAL(...)".to_string(),
        Rule::signature => "function signature".to_string(),
        Rule::param => "parameter".to_string(),
        Rule::pod | Rule::kw_pod => "POD declaration".to_string(),
        Rule::pod_attr => "POD attribute".to_string(),
        Rule::enum_decl | Rule::kw_enum => "ENUM declaration".to_string(),
        Rule::enum_entry => "enum entry".to_string(),
        Rule::enum_value => "enum value".to_string(),
        Rule::modifier => "READONLY, CONSTANT or READWRITE".to_string(),
        Rule::default_value => "default value".to_string(),
        Rule::directive => "preprocessor line".to_string(),
        Rule::EOI => "end of input".to_string(),
        other => format!("{:?}", other),
    }
}

fn position(pair: &Pair) -> (usize, usize) {
    pair.as_span().start_pos().line_col()
}

/// Where a declaration appears.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    TopLevel,
    InClassBody,
}

fn keyword_of(rule: Rule) -> &'static str {
    match rule {
        Rule::class_decl => "class",
        Rule::pod => "POD",
        Rule::enum_decl => "ENUM",
        Rule::property => "PROP",
        Rule::slot => "SLOT",
        Rule::signal => "SIGNAL",
        _ => "declaration",
    }
}

fn misplaced(pair: &Pair, scope: Scope, class_name: &str) -> ParseError {
    let keyword = keyword_of(pair.as_rule());
    let message = match scope {
        Scope::TopLevel => format!("{} declared outside a class body", keyword),
        Scope::InClassBody => format!("{} cannot be declared inside class `{}`", keyword, class_name),
    };
    ParseError::new(ErrorKind::Structural, position(pair), message)
}

fn claim(seen: &mut HashSet<String>, name: &str, at: (usize, usize), what: &str) -> Result<(), ParseError> {
    if seen.insert(name.to_string()) {
        Ok(())
    } else {
        Err(ParseError::new(
            ErrorKind::Duplicate,
            at,
            format!("duplicate {} name `{}`", what, name),
        ))
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

struct DocumentBuilder<'s> {
    /// Comment-stripped text the pairs point into.
    text: &'s str,
    ast: Ast,
    conditionals: ConditionalStack,
}

impl<'s> DocumentBuilder<'s> {
    fn new(text: &'s str) -> Self {
        DocumentBuilder {
            text,
            ast: Ast::default(),
            conditionals: ConditionalStack::default(),
        }
    }

    /// Only whitespace (or a blanked comment) may precede `#` on its line.
    fn starts_line(&self, pair: &Pair) -> bool {
        let start = pair.as_span().start();
        let line_start = self.text[..start].rfind('\n').map_or(0, |i| i + 1);
        self.text[line_start..start].trim().is_empty()
    }

    fn build(mut self, document: Pair) -> Result<Ast, ParseError> {
        let mut names = HashSet::new();
        for item in document.into_inner() {
            let at = position(&item);
            match item.as_rule() {
                Rule::class_decl => {
                    let class = self.build_class(item)?;
                    claim(&mut names, &class.name, at, "declaration")?;
                    self.ast.classes.push(class);
                }
                Rule::pod => {
                    let pod = build_pod(item)?;
                    claim(&mut names, &pod.name, at, "declaration")?;
                    self.ast.pods.push(pod);
                }
                Rule::enum_decl => {
                    let e = build_enum(item)?;
                    claim(&mut names, &e.name, at, "declaration")?;
                    self.ast.enums.push(e);
                }
                Rule::property | Rule::slot | Rule::signal => {
                    return Err(misplaced(&item, Scope::TopLevel, ""));
                }
                Rule::directive => self.directive(item, Scope::TopLevel)?,
                _ => {}
            }
        }
        self.conditionals.finish()?;
        Ok(self.ast)
    }

    fn directive(&mut self, pair: Pair, scope: Scope) -> Result<(), ParseError> {
        let at = position(&pair);
        let directive = Directive::parse(pair.as_str());
        if !self.starts_line(&pair) {
            return Err(ParseError::new(
                ErrorKind::Structural,
                at,
                format!("`{}` must start its own line", directive.text),
            ));
        }
        if scope == Scope::InClassBody && !directive.kind.allowed_in_class() {
            return Err(ParseError::new(
                ErrorKind::Structural,
                at,
                format!("`{}` is not allowed inside a class body", directive.text),
            ));
        }
        self.conditionals.track(&directive, at)?;
        self.ast.directives.push(directive);
        Ok(())
    }

    fn build_class(&mut self, pair: Pair) -> Result<Class, ParseError> {
        let at = position(&pair);
        let mut name = None;
        let mut body = None;
        for inner in pair.into_inner() {
            match inner.as_rule() {
                Rule::ident => name = Some(inner.as_str().to_string()),
                Rule::class_body => body = Some(inner),
                _ => {}
            }
        }
        let name = name.ok_or_else(|| {
            ParseError::new(ErrorKind::EmptyDeclaration, at, "class declared without a name")
        })?;
        let body = body.ok_or_else(|| {
            ParseError::new(
                ErrorKind::Structural,
                at,
                format!("class `{}` has no body", name),
            )
        })?;

        let mut class = Class {
            name,
            ..Class::default()
        };
        let mut property_names = HashSet::new();
        let mut enum_names = HashSet::new();
        for member in body.into_inner() {
            let at = position(&member);
            match member.as_rule() {
                Rule::property => {
                    let property = build_property(member)?;
                    claim(&mut property_names, &property.name, at, "property")?;
                    class.properties.push(property);
                }
                Rule::slot => class.slots.push(build_function(member, FunctionKind::Slot)?),
                Rule::signal => class.signals.push(build_function(member, FunctionKind::Signal)?),
                Rule::enum_decl => {
                    let e = build_enum(member)?;
                    claim(&mut enum_names, &e.name, at, "enum")?;
                    class.enums.push(e);
                }
                Rule::pod | Rule::class_decl => {
                    return Err(misplaced(&member, Scope::InClassBody, &class.name));
                }
                Rule::directive => self.directive(member, Scope::InClassBody)?,
                _ => {}
            }
        }
        Ok(class)
    }
}

// ==================== Properties ====================

fn build_property(pair: Pair) -> Result<Property, ParseError> {
    let at = position(&pair);
    let mut tokens = Vec::new();
    let mut default_value = None;
    let mut modifier = Modifier::default();
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::type_expr => tokens.push(inner.as_str()),
            Rule::default_value => default_value = Some(inner.as_str().trim().to_string()),
            Rule::modifier => {
                modifier = Modifier::from_keyword(inner.as_str()).ok_or_else(|| {
                    ParseError::new(
                        ErrorKind::Structural,
                        position(&inner),
                        format!("unknown property modifier `{}`", inner.as_str()),
                    )
                })?;
            }
            _ => {}
        }
    }
    match tokens.as_slice() {
        [] => Err(ParseError::new(
            ErrorKind::EmptyDeclaration,
            at,
            "PROP() requires a type and a name",
        )),
        [type_name, name] => {
            if !is_identifier(name) {
                return Err(ParseError::new(
                    ErrorKind::Arity,
                    at,
                    format!("`{}` is not a valid property name", name),
                ));
            }
            Ok(Property {
                type_name: type_name.to_string(),
                name: name.to_string(),
                default_value,
                modifier,
            })
        }
        _ => Err(ParseError::new(
            ErrorKind::Arity,
            at,
            format!(
                "PROP expects one type and one name, found {} token(s): {}",
                tokens.len(),
                tokens.join(" ")
            ),
        )),
    }
}

// ==================== Slots and signals ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FunctionKind {
    Slot,
    Signal,
}

impl FunctionKind {
    fn keyword(self) -> &'static str {
        match self {
            FunctionKind::Slot => "SLOT",
            FunctionKind::Signal => "SIGNAL",
        }
    }
}

fn build_function(pair: Pair, kind: FunctionKind) -> Result<Function, ParseError> {
    let at = position(&pair);
    let signature = pair
        .into_inner()
        .find(|p| p.as_rule() == Rule::signature)
        .ok_or_else(|| {
            ParseError::new(
                ErrorKind::EmptyDeclaration,
                at,
                format!("{}() requires a name and a parameter list", kind.keyword()),
            )
        })?;

    let mut return_type = None;
    let mut name = String::new();
    let mut params = Vec::new();
    for inner in signature.into_inner() {
        match inner.as_rule() {
            Rule::return_type => {
                return_type = inner
                    .into_inner()
                    .find(|p| p.as_rule() == Rule::type_expr)
                    .map(|p| p.as_str().to_string());
            }
            Rule::ident => name = inner.as_str().to_string(),
            Rule::param => params.push(build_param(inner)),
            _ => {}
        }
    }

    name_unnamed_params(&mut params);

    let return_type = match (kind, return_type) {
        (_, None) => DEFAULT_RETURN_TYPE.to_string(),
        (FunctionKind::Slot, Some(t)) => t,
        (FunctionKind::Signal, Some(t)) if t == DEFAULT_RETURN_TYPE => t,
        (FunctionKind::Signal, Some(t)) => {
            return Err(ParseError::new(
                ErrorKind::Structural,
                at,
                format!("signal `{}` cannot return `{}`", name, t),
            ));
        }
    };
    Ok(Function {
        return_type,
        name,
        params,
    })
}

/// Unnamed parameters come back with an empty name; see `name_unnamed_params`.
fn build_param(pair: Pair) -> Param {
    let mut param = Param {
        type_name: String::new(),
        is_const: false,
        is_reference: false,
        name: String::new(),
    };
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::const_qual => param.is_const = true,
            Rule::type_expr => param.type_name = inner.as_str().to_string(),
            Rule::ref_marker => param.is_reference = true,
            Rule::param_name => param.name = inner.as_str().to_string(),
            _ => {}
        }
    }
    param
}

/// Give each unnamed parameter the placeholder for its 1-based position, or
/// the next free one when a declared name already uses it.
fn name_unnamed_params(params: &mut [Param]) {
    let mut used: HashSet<String> = params
        .iter()
        .filter(|p| !p.name.is_empty())
        .map(|p| p.name.clone())
        .collect();
    for (index, param) in params.iter_mut().enumerate() {
        if !param.name.is_empty() {
            continue;
        }
        let mut position = index + 1;
        let mut candidate = Param::placeholder_name(position);
        while used.contains(&candidate) {
            position += 1;
            candidate = Param::placeholder_name(position);
        }
        used.insert(candidate.clone());
        param.name = candidate;
    }
}

// ==================== PODs ====================

fn build_pod(pair: Pair) -> Result<Pod, ParseError> {
    let at = position(&pair);
    let mut name = None;
    let mut attrs = Vec::new();
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::ident => name = Some(inner.as_str().to_string()),
            Rule::pod_attr => attrs.push(inner),
            _ => {}
        }
    }
    let name = name.ok_or_else(|| {
        ParseError::new(ErrorKind::EmptyDeclaration, at, "POD declared without a name")
    })?;
    if attrs.len() == 1 && attrs[0].as_str().trim().is_empty() {
        return Err(ParseError::new(
            ErrorKind::EmptyDeclaration,
            at,
            format!("POD `{}` has no attributes", name),
        ));
    }

    let mut seen = HashSet::new();
    let mut attributes = Vec::with_capacity(attrs.len());
    for attr in attrs {
        let attr_at = position(&attr);
        let tokens: Vec<&str> = attr.into_inner().map(|p| p.as_str()).collect();
        match tokens.as_slice() {
            [type_name, attr_name] if is_identifier(attr_name) => {
                claim(&mut seen, attr_name, attr_at, "attribute")?;
                attributes.push(PodAttribute {
                    type_name: type_name.to_string(),
                    name: attr_name.to_string(),
                });
            }
            _ => {
                return Err(ParseError::new(
                    ErrorKind::Arity,
                    attr_at,
                    format!(
                        "POD `{}` attribute expects one type and one name, found `{}`",
                        name,
                        tokens.join(" ")
                    ),
                ));
            }
        }
    }
    Ok(Pod { name, attributes })
}

// ==================== Enums ====================

fn build_enum(pair: Pair) -> Result<Enum, ParseError> {
    let at = position(&pair);
    let mut name = None;
    let mut raw_entries = Vec::new();
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::ident => name = Some(inner.as_str().to_string()),
            Rule::enum_entry => raw_entries.push(inner),
            _ => {}
        }
    }
    let name = name.ok_or_else(|| {
        ParseError::new(ErrorKind::EmptyDeclaration, at, "ENUM declared without a name")
    })?;
    if raw_entries.is_empty() {
        return Err(ParseError::new(
            ErrorKind::EmptyDeclaration,
            at,
            format!("ENUM `{}` has no entries", name),
        ));
    }

    let mut seen = HashSet::new();
    let mut entries = Vec::with_capacity(raw_entries.len());
    let mut next = Some(0i64);
    for entry in raw_entries {
        let entry_at = position(&entry);
        let mut entry_name = String::new();
        let mut literal = None;
        for inner in entry.into_inner() {
            match inner.as_rule() {
                Rule::ident => entry_name = inner.as_str().to_string(),
                Rule::enum_value => literal = Some((inner.as_str().trim(), position(&inner))),
                _ => {}
            }
        }
        claim(&mut seen, &entry_name, entry_at, "enum entry")?;
        let value = match literal {
            Some((text, value_at)) => parse_enum_literal(text).ok_or_else(|| {
                ParseError::new(
                    ErrorKind::Literal,
                    value_at,
                    format!("`{}` is not a valid value for `{}`", text, entry_name),
                )
            })?,
            None => next.ok_or_else(|| {
                ParseError::new(
                    ErrorKind::Literal,
                    entry_at,
                    format!("implicit value of `{}` overflows", entry_name),
                )
            })?,
        };
        next = value.checked_add(1);
        entries.push(EnumEntry {
            name: entry_name,
            value,
        });
    }
    Ok(Enum::new(name, entries))
}

/// Decimal or `0x` hexadecimal, with an optional leading `-`.
fn parse_enum_literal(text: &str) -> Option<i64> {
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let magnitude = match digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
        Some(hex) => {
            if hex.is_empty() || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
                return None;
            }
            u64::from_str_radix(hex, 16).ok()?
        }
        None => {
            if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
                return None;
            }
            digits.parse::<u64>().ok()?
        }
    };
    let value = if negative {
        -i128::from(magnitude)
    } else {
        i128::from(magnitude)
    };
    i64::try_from(value).ok()
}
