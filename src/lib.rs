//! # repidl — rep Interface Definition Language parser
//!
//! Parses the small declarative language used to describe remote-object
//! interfaces into an AST for a code generator. A document declares:
//!
//! - **Classes**: `class Name { ... }` holding properties, slots, signals and enums
//! - **PODs**: `POD Name(type a, type b)` plain-data records
//! - **Enums**: `ENUM Name {A, B = 5, C = 0x10}`
//!
//! ## Class members
//!
//! - `PROP(type name [= default] [READONLY | CONSTANT | READWRITE])`
//! - `SLOT([return_type] name(params))`, the return type defaulting to `void`
//! - `SIGNAL(name(params))`
//!
//! Parameters are `[const] type [&] [name]`; unnamed parameters get
//! positional placeholder names. Types may be nested templates such as
//! `QMap<QString, QVector<int> >` and are kept exactly as written.
//!
//! `//` and `/* */` comments are ignored. Preprocessor lines (`#include`,
//! `#if` ... `#endif`) are recorded but never evaluated.
//!
//! ## Example
//!
//! ```text
//! #include "types.h"
//!
//! ENUM Mode {Off, On, Auto = 0x10}
//! POD Preset(int number, QString label)
//!
//! class Thermostat
//! {
//!     PROP(double target = 21.5)
//!     PROP(Mode mode READONLY)
//!     SLOT(void setPresets(const QVector<Preset> &presets))
//!     SIGNAL(overheated(double))
//! };
//! ```
//!
//! Parsing is all-or-nothing: the first error aborts with a [`ParseError`]
//! carrying its kind and position.

pub mod ast;
pub mod dump;
pub mod error;
pub mod parser;
pub mod preprocess;

pub use ast::{
    Ast, Class, Enum, EnumEntry, Function, Modifier, Param, Pod, PodAttribute, Property,
    DEFAULT_RETURN_TYPE,
};
pub use error::{Error, ErrorKind, ParseError};
pub use parser::{parse, parse_reader};
pub use preprocess::{Directive, DirectiveKind};
