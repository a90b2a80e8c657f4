//! Recursive-descent parser over preprocessed tokens.
//!
//! Declarations are told apart from expressions the way the GLSL grammar
//! does it: by qualifier keywords, or a type name followed by an identifier.
//! Struct names become type names as soon as their definition is read.

use std::collections::HashSet;

use pp_rs::token::Punct;

use super::ast::{
    ArrayDim, BinaryOp, Block, Callee, Expr, ExternalDecl, Field, Function, LayoutQualifier,
    LocalVar, Qualifiers, Stmt, Storage, StructDef, TranslationUnit, TypeSpec, UnaryOp, Variable,
};
use super::lexer::{punct_text, Tok, Token};
use super::types::is_builtin_type;
use super::Diagnostic;

const STORAGE: &[(&str, Storage)] = &[
    ("const", Storage::Const),
    ("in", Storage::In),
    ("out", Storage::Out),
    ("inout", Storage::InOut),
    ("uniform", Storage::Uniform),
    ("buffer", Storage::Buffer),
    ("shared", Storage::Shared),
    ("attribute", Storage::Attribute),
    ("varying", Storage::Varying),
    ("rayPayloadEXT", Storage::Other),
    ("rayPayloadInEXT", Storage::Other),
    ("hitAttributeEXT", Storage::Other),
    ("callableDataEXT", Storage::Other),
    ("callableDataInEXT", Storage::Other),
    ("shaderRecordEXT", Storage::Other),
    ("taskPayloadSharedEXT", Storage::Other),
    ("rayPayloadNV", Storage::Other),
    ("rayPayloadInNV", Storage::Other),
    ("hitAttributeNV", Storage::Other),
    ("callableDataNV", Storage::Other),
    ("callableDataInNV", Storage::Other),
    ("shaderRecordNV", Storage::Other),
    ("taskNV", Storage::Other),
];

/// Qualifiers that do not change how a declaration is reflected.
const MODIFIERS: &[&str] = &[
    "centroid",
    "sample",
    "patch",
    "smooth",
    "flat",
    "noperspective",
    "highp",
    "mediump",
    "lowp",
    "invariant",
    "precise",
    "coherent",
    "volatile",
    "restrict",
    "readonly",
    "writeonly",
    "nonuniformEXT",
    "devicecoherent",
    "queuefamilycoherent",
    "workgroupcoherent",
    "subgroupcoherent",
    "nonprivate",
    "pervertexEXT",
    "pervertexNV",
    "perprimitiveEXT",
    "perprimitiveNV",
    "perviewNV",
];

fn storage_of(word: &str) -> Option<Storage> {
    STORAGE
        .iter()
        .find(|(keyword, _)| *keyword == word)
        .map(|&(_, storage)| storage)
}

fn binary_op(tok: &Tok) -> Option<(BinaryOp, u8)> {
    let Tok::Punct(punct) = tok else {
        return None;
    };
    let op = match punct {
        Punct::LogicalOr => (BinaryOp::LogicalOr, 1),
        Punct::LogicalXor => (BinaryOp::LogicalXor, 2),
        Punct::LogicalAnd => (BinaryOp::LogicalAnd, 3),
        Punct::Pipe => (BinaryOp::BitOr, 4),
        Punct::Caret => (BinaryOp::BitXor, 5),
        Punct::Ampersand => (BinaryOp::BitAnd, 6),
        Punct::EqualEqual => (BinaryOp::Equal, 7),
        Punct::NotEqual => (BinaryOp::NotEqual, 7),
        Punct::LeftAngle => (BinaryOp::Less, 8),
        Punct::RightAngle => (BinaryOp::Greater, 8),
        Punct::LessEqual => (BinaryOp::LessEqual, 8),
        Punct::GreaterEqual => (BinaryOp::GreaterEqual, 8),
        Punct::LeftShift => (BinaryOp::Shl, 9),
        Punct::RightShift => (BinaryOp::Shr, 9),
        Punct::Plus => (BinaryOp::Add, 10),
        Punct::Minus => (BinaryOp::Sub, 10),
        Punct::Star => (BinaryOp::Mul, 11),
        Punct::Slash => (BinaryOp::Div, 11),
        Punct::Percent => (BinaryOp::Mod, 11),
        _ => return None,
    };
    Some(op)
}

/// `Some(None)` for plain `=`, `Some(Some(op))` for compound assignment.
fn assign_op(tok: &Tok) -> Option<Option<BinaryOp>> {
    let Tok::Punct(punct) = tok else {
        return None;
    };
    let op = match punct {
        Punct::Equal => None,
        Punct::AddAssign => Some(BinaryOp::Add),
        Punct::SubAssign => Some(BinaryOp::Sub),
        Punct::MulAssign => Some(BinaryOp::Mul),
        Punct::DivAssign => Some(BinaryOp::Div),
        Punct::ModAssign => Some(BinaryOp::Mod),
        Punct::LeftShiftAssign => Some(BinaryOp::Shl),
        Punct::RightShiftAssign => Some(BinaryOp::Shr),
        Punct::AndAssign => Some(BinaryOp::BitAnd),
        Punct::XorAssign => Some(BinaryOp::BitXor),
        Punct::OrAssign => Some(BinaryOp::BitOr),
        _ => return None,
    };
    Some(op)
}

fn with_dims(ty: &TypeSpec, mut dims: Vec<ArrayDim>) -> TypeSpec {
    dims.extend(ty.dims.iter().cloned());
    TypeSpec {
        name: ty.name.clone(),
        dims,
        line: ty.line,
    }
}

pub(super) struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    struct_names: HashSet<String>,
    /// Struct definitions read since the last external declaration.
    structs: Vec<StructDef>,
    anonymous_structs: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            pos: 0,
            struct_names: HashSet::new(),
            structs: Vec::new(),
            anonymous_structs: 0,
        }
    }

    pub fn translation_unit(mut self) -> Result<TranslationUnit, Diagnostic> {
        let mut unit = TranslationUnit::default();
        while !self.at_end() {
            if self.eat_punct(Punct::Semicolon) {
                continue;
            }
            let decl = self.external_declaration()?;
            unit.decls
                .extend(self.structs.drain(..).map(ExternalDecl::Struct));
            unit.decls.push(decl);
        }
        Ok(unit)
    }

    // Token helpers.

    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn tok_at(&self, ahead: usize) -> Option<&Tok> {
        self.tokens.get(self.pos + ahead).map(|token| &token.tok)
    }

    fn peek(&self) -> Option<&Tok> {
        self.tok_at(0)
    }

    fn ident_at(&self, ahead: usize) -> Option<&str> {
        match self.tok_at(ahead) {
            Some(Tok::Ident(name)) => Some(name),
            _ => None,
        }
    }

    fn peek_ident(&self) -> Option<&str> {
        self.ident_at(0)
    }

    fn punct_at(&self, ahead: usize, punct: Punct) -> bool {
        matches!(self.tok_at(ahead), Some(Tok::Punct(p)) if *p == punct)
    }

    fn is_punct(&self, punct: Punct) -> bool {
        self.punct_at(0, punct)
    }

    fn eat_punct(&mut self, punct: Punct) -> bool {
        let found = self.is_punct(punct);
        if found {
            self.pos += 1;
        }
        found
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        let found = self.peek_ident() == Some(keyword);
        if found {
            self.pos += 1;
        }
        found
    }

    fn line(&self) -> u32 {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map_or(1, |token| token.line)
    }

    fn error(&self, expecting: &str) -> Diagnostic {
        match self.tokens.get(self.pos) {
            Some(token) => Diagnostic::new(
                token.line,
                token.text(),
                format!("syntax error, expecting {expecting}"),
            ),
            None => Diagnostic::new(
                self.line(),
                "",
                format!("syntax error, unexpected end of file, expecting {expecting}"),
            ),
        }
    }

    fn expect_punct(&mut self, punct: Punct) -> Result<(), Diagnostic> {
        if self.eat_punct(punct) {
            Ok(())
        } else {
            Err(self.error(&format!("'{}'", punct_text(punct))))
        }
    }

    fn expect_keyword(&mut self, keyword: &str) -> Result<(), Diagnostic> {
        if self.eat_keyword(keyword) {
            Ok(())
        } else {
            Err(self.error(&format!("'{keyword}'")))
        }
    }

    fn expect_ident(&mut self) -> Result<String, Diagnostic> {
        match self.peek_ident() {
            Some(name) => {
                let name = name.to_string();
                self.pos += 1;
                Ok(name)
            }
            None => Err(self.error("identifier")),
        }
    }

    fn skip_past(&mut self, punct: Punct) -> Result<(), Diagnostic> {
        while !self.eat_punct(punct) {
            if self.at_end() {
                return Err(self.error(&format!("'{}'", punct_text(punct))));
            }
            self.pos += 1;
        }
        Ok(())
    }

    fn is_type_name(&self, name: &str) -> bool {
        is_builtin_type(name) || self.struct_names.contains(name)
    }

    // Declarations.

    fn external_declaration(&mut self) -> Result<ExternalDecl, Diagnostic> {
        if self.eat_keyword("precision") {
            self.skip_past(Punct::Semicolon)?;
            return Ok(ExternalDecl::Other);
        }

        let qualifiers = self.qualifiers()?;
        if self.eat_punct(Punct::Semicolon) {
            return Ok(ExternalDecl::Defaults(qualifiers));
        }
        if !qualifiers.is_empty() {
            if let Some(name) = self.peek_ident() {
                if name != "struct" && self.punct_at(1, Punct::LeftBrace) {
                    return self.block(qualifiers);
                }
                // `invariant gl_Position;`
                if !self.is_type_name(name)
                    && (self.punct_at(1, Punct::Semicolon) || self.punct_at(1, Punct::Comma))
                {
                    self.skip_past(Punct::Semicolon)?;
                    return Ok(ExternalDecl::Other);
                }
            }
        }

        let ty = self.type_specifier()?;
        if self.eat_punct(Punct::Semicolon) {
            return Ok(ExternalDecl::Other);
        }
        let name = self.expect_ident()?;
        if self.is_punct(Punct::LeftParen) {
            return self.function(name);
        }
        Ok(ExternalDecl::Variables(
            self.declarators(&qualifiers, &ty, name)?,
        ))
    }

    fn qualifiers(&mut self) -> Result<Qualifiers, Diagnostic> {
        let mut qualifiers = Qualifiers::default();
        while let Some(word) = self.peek_ident() {
            if word == "layout" && self.punct_at(1, Punct::LeftParen) {
                self.pos += 1;
                self.layout_qualifiers(&mut qualifiers.layout)?;
            } else if word == "subroutine" {
                self.pos += 1;
                qualifiers.subroutine = true;
                if self.eat_punct(Punct::LeftParen) {
                    self.skip_past(Punct::RightParen)?;
                }
            } else if let Some(storage) = storage_of(word) {
                self.pos += 1;
                qualifiers.storage = Some(storage);
            } else if MODIFIERS.contains(&word) && !self.punct_at(1, Punct::LeftParen) {
                self.pos += 1;
            } else {
                break;
            }
        }
        Ok(qualifiers)
    }

    fn layout_qualifiers(&mut self, layout: &mut Vec<LayoutQualifier>) -> Result<(), Diagnostic> {
        self.expect_punct(Punct::LeftParen)?;
        loop {
            let name = self.expect_ident()?.to_ascii_lowercase();
            let value = if self.eat_punct(Punct::Equal) {
                Some(self.conditional()?)
            } else {
                None
            };
            layout.push(LayoutQualifier { name, value });
            if !self.eat_punct(Punct::Comma) {
                break;
            }
        }
        self.expect_punct(Punct::RightParen)
    }

    fn type_specifier(&mut self) -> Result<TypeSpec, Diagnostic> {
        let line = self.line();
        let name = if self.eat_keyword("struct") {
            self.struct_specifier()?
        } else {
            match self.peek_ident() {
                Some(name) if self.is_type_name(name) => {
                    let name = name.to_string();
                    self.pos += 1;
                    name
                }
                _ => return Err(self.error("type name")),
            }
        };
        let dims = self.array_dims()?;
        Ok(TypeSpec { name, dims, line })
    }

    fn struct_specifier(&mut self) -> Result<String, Diagnostic> {
        let name = match self.peek_ident() {
            Some(name) => {
                let name = name.to_string();
                self.pos += 1;
                name
            }
            None => {
                self.anonymous_structs += 1;
                format!("<anonymous struct {}>", self.anonymous_structs)
            }
        };
        let fields = self.field_list()?;
        self.struct_names.insert(name.clone());
        self.structs.push(StructDef {
            name: name.clone(),
            fields,
        });
        Ok(name)
    }

    fn field_list(&mut self) -> Result<Vec<Field>, Diagnostic> {
        self.expect_punct(Punct::LeftBrace)?;
        let mut fields = Vec::new();
        while !self.eat_punct(Punct::RightBrace) {
            if self.at_end() {
                return Err(self.error("'}'"));
            }
            let qualifiers = self.qualifiers()?;
            let ty = self.type_specifier()?;
            loop {
                let name = self.expect_ident()?;
                let dims = self.array_dims()?;
                fields.push(Field {
                    qualifiers: qualifiers.clone(),
                    name,
                    ty: with_dims(&ty, dims),
                });
                if !self.eat_punct(Punct::Comma) {
                    break;
                }
            }
            self.expect_punct(Punct::Semicolon)?;
        }
        Ok(fields)
    }

    fn array_dims(&mut self) -> Result<Vec<ArrayDim>, Diagnostic> {
        let mut dims = Vec::new();
        while self.eat_punct(Punct::LeftBracket) {
            if self.eat_punct(Punct::RightBracket) {
                dims.push(None);
                continue;
            }
            dims.push(Some(self.conditional()?));
            self.expect_punct(Punct::RightBracket)?;
        }
        Ok(dims)
    }

    fn block(&mut self, qualifiers: Qualifiers) -> Result<ExternalDecl, Diagnostic> {
        let line = self.line();
        let name = self.expect_ident()?;
        let fields = self.field_list()?;
        let (instance, instance_dims) = if self.peek_ident().is_some() {
            let instance = self.expect_ident()?;
            (Some(instance), self.array_dims()?)
        } else {
            (None, Vec::new())
        };
        self.expect_punct(Punct::Semicolon)?;
        Ok(ExternalDecl::Block(Block {
            qualifiers,
            name,
            fields,
            instance,
            instance_dims,
            line,
        }))
    }

    fn declarators(
        &mut self,
        qualifiers: &Qualifiers,
        ty: &TypeSpec,
        first: String,
    ) -> Result<Vec<Variable>, Diagnostic> {
        let mut variables = Vec::new();
        let mut name = first;
        loop {
            let dims = self.array_dims()?;
            let init = if self.eat_punct(Punct::Equal) {
                Some(self.initializer()?)
            } else {
                None
            };
            variables.push(Variable {
                qualifiers: qualifiers.clone(),
                name,
                ty: with_dims(ty, dims),
                init,
            });
            if !self.eat_punct(Punct::Comma) {
                break;
            }
            name = self.expect_ident()?;
        }
        self.expect_punct(Punct::Semicolon)?;
        Ok(variables)
    }

    fn initializer(&mut self) -> Result<Expr, Diagnostic> {
        if !self.eat_punct(Punct::LeftBrace) {
            return self.assignment();
        }
        let mut items = Vec::new();
        while !self.eat_punct(Punct::RightBrace) {
            items.push(self.initializer()?);
            if !self.eat_punct(Punct::Comma) {
                self.expect_punct(Punct::RightBrace)?;
                break;
            }
        }
        Ok(Expr::InitList(items))
    }

    fn function(&mut self, name: String) -> Result<ExternalDecl, Diagnostic> {
        self.expect_punct(Punct::LeftParen)?;
        let mut params = Vec::new();
        if self.peek_ident() == Some("void") && self.punct_at(1, Punct::RightParen) {
            self.pos += 1;
        }
        if !self.eat_punct(Punct::RightParen) {
            loop {
                self.qualifiers()?;
                self.type_specifier()?;
                if let Some(param) = self.peek_ident() {
                    params.push(param.to_string());
                    self.pos += 1;
                    self.array_dims()?;
                }
                if !self.eat_punct(Punct::Comma) {
                    break;
                }
            }
            self.expect_punct(Punct::RightParen)?;
        }

        if self.eat_punct(Punct::Semicolon) {
            return Ok(ExternalDecl::Other);
        }
        let body = self.compound_body()?;
        Ok(ExternalDecl::Function(Function { name, params, body }))
    }

    // Statements.

    fn compound_body(&mut self) -> Result<Vec<Stmt>, Diagnostic> {
        self.expect_punct(Punct::LeftBrace)?;
        let mut statements = Vec::new();
        while !self.eat_punct(Punct::RightBrace) {
            if self.at_end() {
                return Err(self.error("'}'"));
            }
            statements.push(self.statement()?);
        }
        Ok(statements)
    }

    fn statement(&mut self) -> Result<Stmt, Diagnostic> {
        if self.is_punct(Punct::LeftBrace) {
            return Ok(Stmt::Compound(self.compound_body()?));
        }
        if self.eat_punct(Punct::Semicolon) {
            return Ok(Stmt::Empty);
        }

        let keyword = self.peek_ident().unwrap_or_default().to_string();
        match keyword.as_str() {
            "if" => {
                self.pos += 1;
                self.expect_punct(Punct::LeftParen)?;
                let cond = self.expression()?;
                self.expect_punct(Punct::RightParen)?;
                let then = Box::new(self.statement()?);
                let otherwise = if self.eat_keyword("else") {
                    Some(Box::new(self.statement()?))
                } else {
                    None
                };
                Ok(Stmt::If {
                    cond,
                    then,
                    otherwise,
                })
            }
            "switch" => {
                self.pos += 1;
                self.expect_punct(Punct::LeftParen)?;
                let selector = self.expression()?;
                self.expect_punct(Punct::RightParen)?;
                let body = self.compound_body()?;
                Ok(Stmt::Switch { selector, body })
            }
            "case" => {
                self.pos += 1;
                let value = self.expression()?;
                self.expect_punct(Punct::Colon)?;
                Ok(Stmt::Case(Some(value)))
            }
            "default" if self.punct_at(1, Punct::Colon) => {
                self.pos += 2;
                Ok(Stmt::Case(None))
            }
            "while" => {
                self.pos += 1;
                self.expect_punct(Punct::LeftParen)?;
                let cond = Box::new(self.condition()?);
                self.expect_punct(Punct::RightParen)?;
                let body = Box::new(self.statement()?);
                Ok(Stmt::While { cond, body })
            }
            "do" => {
                self.pos += 1;
                let body = Box::new(self.statement()?);
                self.expect_keyword("while")?;
                self.expect_punct(Punct::LeftParen)?;
                let cond = self.expression()?;
                self.expect_punct(Punct::RightParen)?;
                self.expect_punct(Punct::Semicolon)?;
                Ok(Stmt::DoWhile { body, cond })
            }
            "for" => self.for_statement(),
            "return" => {
                self.pos += 1;
                if self.eat_punct(Punct::Semicolon) {
                    return Ok(Stmt::Return(None));
                }
                let value = self.expression()?;
                self.expect_punct(Punct::Semicolon)?;
                Ok(Stmt::Return(Some(value)))
            }
            "break" | "continue" | "discard" | "demote" | "terminateInvocation"
            | "terminateRayEXT" | "ignoreIntersectionEXT"
                if self.punct_at(1, Punct::Semicolon) =>
            {
                self.pos += 2;
                Ok(match keyword.as_str() {
                    "break" => Stmt::Break,
                    "continue" => Stmt::Continue,
                    _ => Stmt::Discard,
                })
            }
            "precision" => {
                self.skip_past(Punct::Semicolon)?;
                Ok(Stmt::Empty)
            }
            _ if self.is_declaration_start() => self.local_declaration(),
            _ => {
                let expr = self.expression()?;
                self.expect_punct(Punct::Semicolon)?;
                Ok(Stmt::Expr(expr))
            }
        }
    }

    fn for_statement(&mut self) -> Result<Stmt, Diagnostic> {
        self.pos += 1;
        self.expect_punct(Punct::LeftParen)?;
        let init = if self.eat_punct(Punct::Semicolon) {
            Stmt::Empty
        } else if self.is_declaration_start() {
            self.local_declaration()?
        } else {
            let expr = self.expression()?;
            self.expect_punct(Punct::Semicolon)?;
            Stmt::Expr(expr)
        };
        let cond = if self.is_punct(Punct::Semicolon) {
            None
        } else {
            Some(Box::new(self.condition()?))
        };
        self.expect_punct(Punct::Semicolon)?;
        let step = if self.is_punct(Punct::RightParen) {
            None
        } else {
            Some(self.expression()?)
        };
        self.expect_punct(Punct::RightParen)?;
        let body = Box::new(self.statement()?);
        Ok(Stmt::For {
            init: Box::new(init),
            cond,
            step,
            body,
        })
    }

    /// Loop condition: an expression or `type name = init`.
    fn condition(&mut self) -> Result<Stmt, Diagnostic> {
        if !self.is_declaration_start() {
            return Ok(Stmt::Expr(self.expression()?));
        }
        self.qualifiers()?;
        self.type_specifier()?;
        let name = self.expect_ident()?;
        self.expect_punct(Punct::Equal)?;
        let init = self.initializer()?;
        Ok(Stmt::Declaration(vec![LocalVar {
            name,
            init: Some(init),
        }]))
    }

    fn is_declaration_start(&self) -> bool {
        let Some(word) = self.peek_ident() else {
            return false;
        };
        if word == "struct" || (word == "layout" && self.punct_at(1, Punct::LeftParen)) {
            return true;
        }
        if storage_of(word).is_some() || MODIFIERS.contains(&word) {
            return !self.punct_at(1, Punct::LeftParen);
        }
        if !self.is_type_name(word) {
            return false;
        }

        // `Type name` or `Type[N] name`.
        let mut ahead = 1;
        while self.punct_at(ahead, Punct::LeftBracket) {
            let mut depth = 0usize;
            loop {
                match self.tok_at(ahead) {
                    Some(Tok::Punct(Punct::LeftBracket)) => depth += 1,
                    Some(Tok::Punct(Punct::RightBracket)) => depth -= 1,
                    Some(_) => {}
                    None => return false,
                }
                ahead += 1;
                if depth == 0 {
                    break;
                }
            }
        }
        self.ident_at(ahead).is_some()
    }

    fn local_declaration(&mut self) -> Result<Stmt, Diagnostic> {
        let qualifiers = self.qualifiers()?;
        if self.eat_punct(Punct::Semicolon) {
            return Ok(Stmt::Empty);
        }
        let ty = self.type_specifier()?;
        if self.eat_punct(Punct::Semicolon) {
            return Ok(Stmt::Empty);
        }
        let first = self.expect_ident()?;
        let variables = self.declarators(&qualifiers, &ty, first)?;
        Ok(Stmt::Declaration(
            variables
                .into_iter()
                .map(|variable| LocalVar {
                    name: variable.name,
                    init: variable.init,
                })
                .collect(),
        ))
    }

    // Expressions.

    fn expression(&mut self) -> Result<Expr, Diagnostic> {
        let first = self.assignment()?;
        if !self.is_punct(Punct::Comma) {
            return Ok(first);
        }
        let mut items = vec![first];
        while self.eat_punct(Punct::Comma) {
            items.push(self.assignment()?);
        }
        Ok(Expr::Sequence(items))
    }

    fn assignment(&mut self) -> Result<Expr, Diagnostic> {
        let target = self.conditional()?;
        let Some(op) = self.peek().and_then(assign_op) else {
            return Ok(target);
        };
        self.pos += 1;
        let value = self.assignment()?;
        Ok(Expr::Assign {
            op,
            target: Box::new(target),
            value: Box::new(value),
        })
    }

    fn conditional(&mut self) -> Result<Expr, Diagnostic> {
        let cond = self.binary(1)?;
        if !self.eat_punct(Punct::Question) {
            return Ok(cond);
        }
        let then = self.expression()?;
        self.expect_punct(Punct::Colon)?;
        let otherwise = self.assignment()?;
        Ok(Expr::Ternary {
            cond: Box::new(cond),
            then: Box::new(then),
            otherwise: Box::new(otherwise),
        })
    }

    fn binary(&mut self, min_precedence: u8) -> Result<Expr, Diagnostic> {
        let mut lhs = self.unary()?;
        while let Some((op, precedence)) = self.peek().and_then(binary_op) {
            if precedence < min_precedence {
                break;
            }
            self.pos += 1;
            let rhs = self.binary(precedence + 1)?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Expr, Diagnostic> {
        let op = match self.peek() {
            Some(Tok::Punct(Punct::Increment)) => Some(UnaryOp::PreInc),
            Some(Tok::Punct(Punct::Decrement)) => Some(UnaryOp::PreDec),
            Some(Tok::Punct(Punct::Plus)) => Some(UnaryOp::Plus),
            Some(Tok::Punct(Punct::Minus)) => Some(UnaryOp::Neg),
            Some(Tok::Punct(Punct::Bang)) => Some(UnaryOp::Not),
            Some(Tok::Punct(Punct::Tilde)) => Some(UnaryOp::BitNot),
            _ => None,
        };
        match op {
            Some(op) => {
                self.pos += 1;
                let operand = self.unary()?;
                Ok(Expr::Unary {
                    op,
                    operand: Box::new(operand),
                })
            }
            None => self.postfix(),
        }
    }

    fn postfix(&mut self) -> Result<Expr, Diagnostic> {
        let mut expr = self.primary()?;
        loop {
            if self.eat_punct(Punct::LeftBracket) {
                let index = self.expression()?;
                self.expect_punct(Punct::RightBracket)?;
                expr = Expr::Index {
                    base: Box::new(expr),
                    index: Box::new(index),
                };
            } else if self.eat_punct(Punct::Dot) {
                let name = self.expect_ident()?;
                expr = if self.eat_punct(Punct::LeftParen) {
                    Expr::Method {
                        base: Box::new(expr),
                        name,
                        args: self.call_args()?,
                    }
                } else {
                    Expr::Field {
                        base: Box::new(expr),
                        name,
                    }
                };
            } else if self.eat_punct(Punct::Increment) {
                expr = Expr::Unary {
                    op: UnaryOp::PostInc,
                    operand: Box::new(expr),
                };
            } else if self.eat_punct(Punct::Decrement) {
                expr = Expr::Unary {
                    op: UnaryOp::PostDec,
                    operand: Box::new(expr),
                };
            } else {
                return Ok(expr);
            }
        }
    }

    /// Arguments after an opening parenthesis, through the closing one.
    fn call_args(&mut self) -> Result<Vec<Expr>, Diagnostic> {
        let mut args = Vec::new();
        if self.peek_ident() == Some("void") && self.punct_at(1, Punct::RightParen) {
            self.pos += 1;
        }
        if self.eat_punct(Punct::RightParen) {
            return Ok(args);
        }
        loop {
            args.push(self.assignment()?);
            if !self.eat_punct(Punct::Comma) {
                break;
            }
        }
        self.expect_punct(Punct::RightParen)?;
        Ok(args)
    }

    fn primary(&mut self) -> Result<Expr, Diagnostic> {
        let Some(token) = self.tokens.get(self.pos).cloned() else {
            return Err(self.error("expression"));
        };
        match token.tok {
            Tok::Int { value, unsigned } => {
                self.pos += 1;
                Ok(Expr::Int { value, unsigned })
            }
            Tok::Float(value) => {
                self.pos += 1;
                Ok(Expr::Float(value))
            }
            Tok::Punct(Punct::LeftParen) => {
                self.pos += 1;
                let expr = self.expression()?;
                self.expect_punct(Punct::RightParen)?;
                Ok(expr)
            }
            Tok::Ident(name) => {
                self.pos += 1;
                match name.as_str() {
                    "true" => return Ok(Expr::Bool(true)),
                    "false" => return Ok(Expr::Bool(false)),
                    _ => {}
                }
                if self.is_type_name(&name) {
                    let dims = self.array_dims()?;
                    self.expect_punct(Punct::LeftParen)?;
                    let args = self.call_args()?;
                    return Ok(Expr::Call {
                        callee: Callee::Type(TypeSpec {
                            name,
                            dims,
                            line: token.line,
                        }),
                        args,
                    });
                }
                if self.eat_punct(Punct::LeftParen) {
                    let args = self.call_args()?;
                    return Ok(Expr::Call {
                        callee: Callee::Function(name),
                        args,
                    });
                }
                Ok(Expr::Ident {
                    name,
                    line: token.line,
                })
            }
            Tok::Punct(_) => Err(self.error("expression")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::glsl;
    use crate::source::PreparedSource;
    use crate::version::GlslVersion;

    fn parse(text: &str) -> Result<TranslationUnit, Diagnostic> {
        let source = PreparedSource::new(text, GlslVersion::new(450).unwrap());
        glsl::parse(&source)
    }

    fn function<'a>(unit: &'a TranslationUnit, name: &str) -> &'a Function {
        unit.decls
            .iter()
            .find_map(|decl| match decl {
                ExternalDecl::Function(function) if function.name == name => Some(function),
                _ => None,
            })
            .unwrap_or_else(|| panic!("no function {name}"))
    }

    #[test]
    fn parses_blocks_structs_and_loose_uniforms() {
        let unit = parse(
            "struct Light { vec3 col; float k; };\n\
             layout(std140, binding = 2) uniform Lights { Light lights[2]; } lit;\n\
             uniform sampler2D tex, masks[4];\n\
             void main() {}\n",
        )
        .unwrap();

        assert!(matches!(&unit.decls[0], ExternalDecl::Struct(def) if def.name == "Light"));
        assert_eq!(unit.decls[1], ExternalDecl::Other);
        let ExternalDecl::Block(block) = &unit.decls[2] else {
            panic!("expected a block: {:?}", unit.decls[2]);
        };
        assert_eq!(block.name, "Lights");
        assert_eq!(block.instance.as_deref(), Some("lit"));
        assert!(block.qualifiers.has_layout("std140"));
        assert_eq!(block.fields[0].ty.name, "Light");
        assert_eq!(block.fields[0].ty.dims.len(), 1);

        let ExternalDecl::Variables(vars) = &unit.decls[3] else {
            panic!("expected variables");
        };
        assert_eq!(vars.len(), 2);
        assert_eq!(vars[1].name, "masks");
        assert_eq!(vars[1].qualifiers.storage, Some(Storage::Uniform));
    }

    #[test]
    fn tells_declarations_from_expressions() {
        let unit = parse(
            "struct S { float a; };\n\
             uniform S s;\n\
             void main() {\n\
               S local = s;\n\
               float[2] pair = float[2](1.0, 2.0);\n\
               local.a = pair[1] * 2.0;\n\
               for (int i = 0; i < 2; ++i) { local.a += float(i); }\n\
             }\n",
        )
        .unwrap();
        let main = function(&unit, "main");
        assert!(matches!(main.body[0], Stmt::Declaration(_)));
        assert!(matches!(main.body[1], Stmt::Declaration(_)));
        assert!(matches!(main.body[2], Stmt::Expr(Expr::Assign { .. })));
        assert!(matches!(main.body[3], Stmt::For { .. }));
    }

    #[test]
    fn respects_operator_precedence() {
        let unit = parse("void main() { int x = 1 + 2 * 3; }\n").unwrap();
        let Stmt::Declaration(vars) = &function(&unit, "main").body[0] else {
            panic!("expected a declaration");
        };
        let Some(Expr::Binary { op, rhs, .. }) = &vars[0].init else {
            panic!("expected a binary initializer");
        };
        assert_eq!(*op, BinaryOp::Add);
        assert!(matches!(**rhs, Expr::Binary { op: BinaryOp::Mul, .. }));
    }

    #[test]
    fn accepts_legacy_and_vulkan_syntax() {
        parse(
            "precision mediump float;\n\
             attribute vec4 position;\n\
             varying vec2 uv;\n\
             invariant gl_Position;\n\
             layout(push_constant) uniform Push { mat4 mvp; } pc;\n\
             layout(set = 0, binding = 1) uniform texture2D img;\n\
             layout(local_size_x = 8) in;\n\
             float helper(in float x, out float y);\n\
             void main() {\n\
               switch (int(uv.x)) { case 0: break; default: discard; }\n\
               do { uv.x -= 1.0; } while (uv.x > 0.0);\n\
               gl_Position = pc.mvp * position + vec4(texture2D(sampler2D(img, s), uv).x);\n\
             }\n",
        )
        .unwrap();
    }

    #[test]
    fn reports_syntax_errors_with_caller_lines() {
        let err = parse("void main() {\n  float x = ;\n}\n").unwrap_err();
        assert_eq!(err.line, 2);
        assert_eq!(err.token, ";");
        assert!(err.message.starts_with("syntax error"));

        let err = parse("uniform Unknown thing;\n").unwrap_err();
        assert_eq!(err.token, "Unknown");
    }
}
