//! Line preprocessing: comment removal and preprocessor directive handling.
//!
//! Comments are blanked rather than removed so that every character keeps its
//! line and column; positions reported by the grammar then map straight back to
//! the original source. Directive lines stay in the text and are captured by
//! the grammar, then classified here. Conditions are never evaluated and
//! `#include` targets are never opened.

use crate::error::{ErrorKind, ParseError};

#[derive(Clone, Copy, PartialEq, Eq)]
enum State {
    Code,
    LineComment,
    BlockComment,
    Quoted(char),
}

/// Replace `//` and `/* */` comments with spaces, keeping newlines.
///
/// Comment markers inside string or character literals are left alone. A
/// literal that is not closed ends at the end of its line.
pub fn strip_comments(source: &str) -> Result<String, ParseError> {
    let mut out = String::with_capacity(source.len());
    let mut state = State::Code;
    let mut block_start = (1, 1);
    let (mut line, mut column) = (1usize, 1usize);
    let mut chars = source.chars().peekable();

    while let Some(c) = chars.next() {
        let here = (line, column);
        if c == '\n' {
            line += 1;
            column = 1;
        } else {
            column += 1;
        }

        match state {
            State::Code => match c {
                '/' if chars.peek() == Some(&'/') => {
                    chars.next();
                    column += 1;
                    out.push_str("  ");
                    state = State::LineComment;
                }
                '/' if chars.peek() == Some(&'*') => {
                    chars.next();
                    column += 1;
                    out.push_str("  ");
                    block_start = here;
                    state = State::BlockComment;
                }
                '"' | '\'' => {
                    out.push(c);
                    state = State::Quoted(c);
                }
                _ => out.push(c),
            },
            State::LineComment => {
                if c == '\n' {
                    out.push('\n');
                    state = State::Code;
                } else {
                    out.push(' ');
                }
            }
            State::BlockComment => {
                if c == '*' && chars.peek() == Some(&'/') {
                    chars.next();
                    column += 1;
                    out.push_str("  ");
                    state = State::Code;
                } else if c == '\n' {
                    out.push('\n');
                } else {
                    out.push(' ');
                }
            }
            State::Quoted(quote) => {
                out.push(c);
                if c == '\\' {
                    if let Some(&next) = chars.peek() {
                        if next != '\n' {
                            chars.next();
                            column += 1;
                            out.push(next);
                        }
                    }
                } else if c == quote || c == '\n' {
                    state = State::Code;
                }
            }
        }
    }

    if state == State::BlockComment {
        return Err(ParseError::new(
            ErrorKind::Structural,
            block_start,
            "unterminated block comment",
        ));
    }
    Ok(out)
}

/// Classified preprocessor directive keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectiveKind {
    Include,
    If,
    Ifdef,
    Ifndef,
    Elif,
    Else,
    Endif,
    Define,
    Undef,
    Pragma,
    /// Any other keyword, or a bare `#`.
    Other,
}

impl DirectiveKind {
    fn from_keyword(keyword: &str) -> Self {
        match keyword {
            "include" => DirectiveKind::Include,
            "if" => DirectiveKind::If,
            "ifdef" => DirectiveKind::Ifdef,
            "ifndef" => DirectiveKind::Ifndef,
            "elif" => DirectiveKind::Elif,
            "else" => DirectiveKind::Else,
            "endif" => DirectiveKind::Endif,
            "define" => DirectiveKind::Define,
            "undef" => DirectiveKind::Undef,
            "pragma" => DirectiveKind::Pragma,
            _ => DirectiveKind::Other,
        }
    }

    /// Directives tolerated inside a class body. Macro definitions are not.
    pub fn allowed_in_class(self) -> bool {
        !matches!(
            self,
            DirectiveKind::Define | DirectiveKind::Undef | DirectiveKind::Other
        )
    }

    pub fn opens_conditional(self) -> bool {
        matches!(
            self,
            DirectiveKind::If | DirectiveKind::Ifdef | DirectiveKind::Ifndef
        )
    }
}

/// A preprocessor line, kept verbatim (trailing whitespace trimmed).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    pub kind: DirectiveKind,
    pub text: String,
}

impl Directive {
    /// Classify a line starting with `#`. Whitespace between `#` and the
    /// keyword is allowed (`#  include "foo"`).
    pub fn parse(line: &str) -> Self {
        let text = line.trim().to_string();
        let keyword: String = text
            .trim_start_matches('#')
            .trim_start()
            .chars()
            .take_while(|c| c.is_ascii_alphanumeric() || *c == '_')
            .collect();
        Directive {
            kind: DirectiveKind::from_keyword(&keyword),
            text,
        }
    }
}

/// Tracks `#if`/`#endif` nesting across a document.
#[derive(Debug, Default)]
pub struct ConditionalStack {
    open: Vec<(usize, usize)>,
}

impl ConditionalStack {
    pub fn track(&mut self, directive: &Directive, at: (usize, usize)) -> Result<(), ParseError> {
        match directive.kind {
            k if k.opens_conditional() => {
                self.open.push(at);
                Ok(())
            }
            DirectiveKind::Elif | DirectiveKind::Else if self.open.is_empty() => Err(ParseError::new(
                ErrorKind::Structural,
                at,
                format!("`{}` without a matching #if", directive.text),
            )),
            DirectiveKind::Endif => match self.open.pop() {
                Some(_) => Ok(()),
                None => Err(ParseError::new(
                    ErrorKind::Structural,
                    at,
                    "#endif without a matching #if",
                )),
            },
            _ => Ok(()),
        }
    }

    /// Every conditional must be closed by the end of the document.
    pub fn finish(self) -> Result<(), ParseError> {
        match self.open.last() {
            Some(&at) => Err(ParseError::new(
                ErrorKind::Structural,
                at,
                "unterminated #if: missing #endif",
            )),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_keeps_geometry() {
        let src = "PROP(int a) // trailing\n/* one\ntwo */ PROP(int b)";
        let out = strip_comments(src).expect("strip");
        assert_eq!(out.len(), src.len());
        assert_eq!(out.lines().count(), src.lines().count());
        assert!(out.starts_with("PROP(int a) "));
        assert!(!out.contains("trailing"));
        assert!(!out.contains("two"));
        assert!(out.ends_with("       PROP(int b)"));
    }

    #[test]
    fn strip_ignores_markers_in_strings() {
        let src = "PROP(QString url=\"http://host/*x*/\")";
        assert_eq!(strip_comments(src).expect("strip"), src);
    }

    #[test]
    fn unclosed_quote_ends_at_newline() {
        let src = "#include \"foo\n// gone\n#endif";
        let out = strip_comments(src).expect("strip");
        assert_eq!(out, "#include \"foo\n       \n#endif");
    }

    #[test]
    fn unterminated_block_comment_fails() {
        let err = strip_comments("class A\n{ /* open\n}").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Structural);
        assert_eq!((err.line, err.column), (2, 3));
    }

    #[test]
    fn classify_directives() {
        assert_eq!(Directive::parse("#include \"foo\"").kind, DirectiveKind::Include);
        assert_eq!(Directive::parse("#  include \"foo\"").kind, DirectiveKind::Include);
        assert_eq!(Directive::parse("# if 1").kind, DirectiveKind::If);
        assert_eq!(Directive::parse("#endif  ").text, "#endif");
        assert_eq!(Directive::parse("#define foo").kind, DirectiveKind::Define);
        assert_eq!(Directive::parse("#").kind, DirectiveKind::Other);
        assert!(!DirectiveKind::Define.allowed_in_class());
        assert!(DirectiveKind::Ifdef.allowed_in_class());
    }

    #[test]
    fn conditionals_must_balance() {
        let mut stack = ConditionalStack::default();
        stack.track(&Directive::parse("#if 1"), (1, 1)).expect("if");
        stack.track(&Directive::parse("#else"), (2, 1)).expect("else");
        stack.track(&Directive::parse("#endif"), (3, 1)).expect("endif");
        assert!(stack.finish().is_ok());

        let mut stack = ConditionalStack::default();
        assert!(stack.track(&Directive::parse("#endif"), (1, 1)).is_err());

        let mut stack = ConditionalStack::default();
        stack.track(&Directive::parse("#ifdef X"), (4, 1)).expect("ifdef");
        let err = stack.finish().unwrap_err();
        assert_eq!(err.line, 4);
    }
}
