use pp_rs::pp::Preprocessor;
use pp_rs::token::{PreprocessorError, Punct, TokenValue};

use super::Diagnostic;
use crate::source::PreparedSource;

#[derive(Debug, Clone, PartialEq)]
pub(super) enum Tok {
    Ident(String),
    Int { value: u64, unsigned: bool },
    Float(f64),
    Punct(Punct),
}

#[derive(Debug, Clone, PartialEq)]
pub(super) struct Token {
    pub tok: Tok,
    /// Line in the caller's text.
    pub line: u32,
}

impl Token {
    /// Token text as it appears in error messages.
    pub fn text(&self) -> String {
        match &self.tok {
            Tok::Ident(name) => name.clone(),
            Tok::Int { value, unsigned } => {
                format!("{value}{}", if *unsigned { "u" } else { "" })
            }
            Tok::Float(value) => value.to_string(),
            Tok::Punct(punct) => punct_text(*punct).to_string(),
        }
    }
}

/// Runs the preprocessor over `source` and collects the tokens the parser
/// needs. Directives that survive preprocessing (`#version`, `#extension`,
/// `#pragma`) carry nothing reflection uses and are dropped.
pub(super) fn tokenize(source: &PreparedSource<'_>) -> Result<Vec<Token>, Diagnostic> {
    let mut pp = Preprocessor::new(source.text());
    let directive = source.directive();
    let number = directive.number.to_string();
    let mut defines = vec![("__VERSION__", number.as_str())];
    if directive.is_es() {
        defines.extend([("GL_ES", "1"), ("GL_FRAGMENT_PRECISION_HIGH", "1")]);
    } else if directive.number >= 150 {
        defines.push(("GL_core_profile", "1"));
    }
    for (name, value) in defines {
        pp.add_define(name, value).map_err(|(err, location)| {
            Diagnostic::new(source.line_of(location.start as usize), name, describe(&err))
        })?;
    }

    let mut tokens = Vec::new();
    for item in pp {
        let token = item.map_err(|(err, location)| {
            Diagnostic::new(
                source.line_of(location.start as usize),
                error_token(&err),
                describe(&err),
            )
        })?;
        let tok = match token.value {
            TokenValue::Ident(name) => Tok::Ident(name),
            TokenValue::Integer(integer) => Tok::Int {
                value: integer.value,
                unsigned: !integer.signed,
            },
            TokenValue::Float(float) => Tok::Float(f64::from(float.value)),
            TokenValue::Punct(punct) => Tok::Punct(punct),
            TokenValue::Version(_) | TokenValue::Extension(_) | TokenValue::Pragma(_) => continue,
        };
        tokens.push(Token {
            tok,
            line: source.line_of(token.location.start as usize),
        });
    }
    tracing::trace!(tokens = tokens.len(), "preprocessed shader");
    Ok(tokens)
}

fn error_token(err: &PreprocessorError) -> String {
    match err {
        PreprocessorError::UnexpectedToken(value) => match value {
            TokenValue::Ident(name) => name.clone(),
            TokenValue::Integer(integer) => integer.value.to_string(),
            TokenValue::Float(float) => float.value.to_string(),
            TokenValue::Punct(punct) => punct_text(*punct).to_string(),
            TokenValue::Version(_) => "#version".to_string(),
            TokenValue::Extension(_) => "#extension".to_string(),
            TokenValue::Pragma(_) => "#pragma".to_string(),
        },
        PreprocessorError::ErrorDirective => "#error".to_string(),
        _ => String::new(),
    }
}

fn describe(err: &PreprocessorError) -> String {
    match err {
        PreprocessorError::IntegerOverflow => "integer literal too big".to_string(),
        PreprocessorError::FloatParsingError => "bad floating-point literal".to_string(),
        PreprocessorError::UnexpectedCharacter => "unexpected character".to_string(),
        PreprocessorError::UnexpectedToken(_) => "preprocessor syntax error".to_string(),
        PreprocessorError::UnexpectedHash => "unexpected '#'".to_string(),
        PreprocessorError::UnexpectedNewLine => "unexpected end of line".to_string(),
        PreprocessorError::UnexpectedEndOfInput => "unexpected end of input".to_string(),
        PreprocessorError::TooFewDefineArguments => "too few macro arguments".to_string(),
        PreprocessorError::TooManyDefineArguments => "too many macro arguments".to_string(),
        PreprocessorError::ErrorDirective => "#error directive".to_string(),
        PreprocessorError::DuplicateParameter => "duplicate macro parameter".to_string(),
        PreprocessorError::UnknownDirective => "invalid directive".to_string(),
        PreprocessorError::DefineRedefined => "macro redefined".to_string(),
        PreprocessorError::ElifOutsideOfBlock => "#elif without #if".to_string(),
        PreprocessorError::ElseOutsideOfBlock => "#else without #if".to_string(),
        PreprocessorError::EndifOutsideOfBlock => "#endif without #if".to_string(),
        PreprocessorError::ElifAfterElse => "#elif after #else".to_string(),
        PreprocessorError::MoreThanOneElse => "#else after #else".to_string(),
        PreprocessorError::UnfinishedBlock => "missing #endif".to_string(),
        PreprocessorError::LineOverflow => "line number overflow".to_string(),
        PreprocessorError::NotSupported16BitLiteral => "16-bit literals are not supported".to_string(),
        PreprocessorError::NotSupported64BitLiteral => "64-bit literals are not supported".to_string(),
        PreprocessorError::MacroNotDefined => "macro not defined".to_string(),
        PreprocessorError::RecursionLimitReached => "macro recursion limit reached".to_string(),
        PreprocessorError::DivisionByZero => "division by zero in preprocessor expression".to_string(),
        PreprocessorError::RemainderByZero => "remainder by zero in preprocessor expression".to_string(),
    }
}

pub(super) fn punct_text(punct: Punct) -> &'static str {
    match punct {
        Punct::AddAssign => "+=",
        Punct::SubAssign => "-=",
        Punct::MulAssign => "*=",
        Punct::DivAssign => "/=",
        Punct::ModAssign => "%=",
        Punct::LeftShiftAssign => "<<=",
        Punct::RightShiftAssign => ">>=",
        Punct::AndAssign => "&=",
        Punct::XorAssign => "^=",
        Punct::OrAssign => "|=",
        Punct::Increment => "++",
        Punct::Decrement => "--",
        Punct::LogicalAnd => "&&",
        Punct::LogicalOr => "||",
        Punct::LogicalXor => "^^",
        Punct::LessEqual => "<=",
        Punct::GreaterEqual => ">=",
        Punct::EqualEqual => "==",
        Punct::NotEqual => "!=",
        Punct::LeftShift => "<<",
        Punct::RightShift => ">>",
        Punct::LeftBrace => "{",
        Punct::RightBrace => "}",
        Punct::LeftParen => "(",
        Punct::RightParen => ")",
        Punct::LeftBracket => "[",
        Punct::RightBracket => "]",
        Punct::LeftAngle => "<",
        Punct::RightAngle => ">",
        Punct::Semicolon => ";",
        Punct::Comma => ",",
        Punct::Colon => ":",
        Punct::Dot => ".",
        Punct::Equal => "=",
        Punct::Bang => "!",
        Punct::Minus => "-",
        Punct::Tilde => "~",
        Punct::Plus => "+",
        Punct::Star => "*",
        Punct::Slash => "/",
        Punct::Percent => "%",
        Punct::Pipe => "|",
        Punct::Caret => "^",
        Punct::Ampersand => "&",
        Punct::Question => "?",
    }
}
