//! Syntax tree produced by [`super::parse`]. It keeps what reflection needs:
//! declarations with their qualifiers and types, and function bodies down to
//! every identifier use.

/// One array dimension; `None` for `[]`.
pub(crate) type ArrayDim = Option<Expr>;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct TypeSpec {
    /// Built-in type keyword or struct name.
    pub name: String,
    /// Dimensions written on the type itself (`float[3] x`), outermost first.
    pub dims: Vec<ArrayDim>,
    pub line: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Storage {
    Const,
    In,
    Out,
    InOut,
    Uniform,
    Buffer,
    Shared,
    Attribute,
    Varying,
    /// Ray tracing and mesh storage (`rayPayloadEXT`, `hitAttributeEXT`, ...).
    Other,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct LayoutQualifier {
    /// Lowercased identifier.
    pub name: String,
    pub value: Option<Expr>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Qualifiers {
    pub storage: Option<Storage>,
    pub layout: Vec<LayoutQualifier>,
    pub subroutine: bool,
}

impl Qualifiers {
    pub fn is_empty(&self) -> bool {
        self.storage.is_none() && self.layout.is_empty() && !self.subroutine
    }

    pub fn layout(&self, name: &str) -> Option<&LayoutQualifier> {
        self.layout.iter().rev().find(|q| q.name == name)
    }

    pub fn has_layout(&self, name: &str) -> bool {
        self.layout(name).is_some()
    }
}

/// A struct member or block member, one per declarator.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Field {
    pub qualifiers: Qualifiers,
    pub name: String,
    /// Type with the declarator's dimensions folded in, outermost first.
    pub ty: TypeSpec,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct StructDef {
    pub name: String,
    pub fields: Vec<Field>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Variable {
    pub qualifiers: Qualifiers,
    pub name: String,
    pub ty: TypeSpec,
    pub init: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Block {
    pub qualifiers: Qualifiers,
    pub name: String,
    pub fields: Vec<Field>,
    pub instance: Option<String>,
    pub instance_dims: Vec<ArrayDim>,
    pub line: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Function {
    pub name: String,
    pub params: Vec<String>,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ExternalDecl {
    Struct(StructDef),
    Variables(Vec<Variable>),
    Block(Block),
    Function(Function),
    /// `layout(...) uniform;` and friends, which set defaults.
    Defaults(Qualifiers),
    /// Precision statements, prototypes and qualifier redeclarations.
    Other,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct TranslationUnit {
    pub decls: Vec<ExternalDecl>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct LocalVar {
    pub name: String,
    pub init: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Stmt {
    Compound(Vec<Stmt>),
    Declaration(Vec<LocalVar>),
    Expr(Expr),
    If {
        cond: Expr,
        then: Box<Stmt>,
        otherwise: Option<Box<Stmt>>,
    },
    Switch {
        selector: Expr,
        body: Vec<Stmt>,
    },
    /// `case x:`, or `default:` when `None`.
    Case(Option<Expr>),
    While {
        cond: Box<Stmt>,
        body: Box<Stmt>,
    },
    DoWhile {
        body: Box<Stmt>,
        cond: Expr,
    },
    For {
        init: Box<Stmt>,
        cond: Option<Box<Stmt>>,
        step: Option<Expr>,
        body: Box<Stmt>,
    },
    Return(Option<Expr>),
    Break,
    Continue,
    Discard,
    Empty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UnaryOp {
    Neg,
    Plus,
    Not,
    BitNot,
    PreInc,
    PreDec,
    PostInc,
    PostDec,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BinaryOp {
    Mul,
    Div,
    Mod,
    Add,
    Sub,
    Shl,
    Shr,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,
    Equal,
    NotEqual,
    BitAnd,
    BitXor,
    BitOr,
    LogicalAnd,
    LogicalXor,
    LogicalOr,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Callee {
    Function(String),
    /// Constructor, including array constructors such as `float[2](a, b)`.
    Type(TypeSpec),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Expr {
    Ident {
        name: String,
        line: u32,
    },
    Int {
        value: u64,
        unsigned: bool,
    },
    Float(f64),
    Bool(bool),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Assign {
        op: Option<BinaryOp>,
        target: Box<Expr>,
        value: Box<Expr>,
    },
    Ternary {
        cond: Box<Expr>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
    },
    Index {
        base: Box<Expr>,
        index: Box<Expr>,
    },
    Field {
        base: Box<Expr>,
        name: String,
    },
    Call {
        callee: Callee,
        args: Vec<Expr>,
    },
    /// `base.name(args)`, in practice `.length()`.
    Method {
        base: Box<Expr>,
        name: String,
        args: Vec<Expr>,
    },
    Sequence(Vec<Expr>),
    /// Brace initializer `{a, b}`.
    InitList(Vec<Expr>),
}
