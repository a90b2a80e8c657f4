//! Turns a parsed shader into glslang-style reflection records.
//!
//! Naming follows the OpenGL program interface rules:
//!
//! - members of a named block are reported as `Block.member`, members of an
//!   anonymous block as `member`;
//! - nested structs are flattened (`Block.light.color`), arrays of aggregates
//!   are expanded per element (`Block.lights[1].color`);
//! - leaf arrays are reported once, with a `[0]` suffix and their element
//!   count in `size`.
//!
//! Liveness is tracked per record. Starting at `main`, every reachable
//! function is walked and each access chain rooted at a uniform
//! (`lights[i].color.rgb`) marks only the records it can reach. A dynamic
//! index reaches every element, a constant one only that element. Records
//! come out in declaration order either way.

use std::collections::{HashMap, HashSet, VecDeque};
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::gl_types::{gl_type_of, GL_NONE};
use crate::glsl::ast::{
    ArrayDim, Block, Callee, Expr, ExternalDecl, Field, Function, Qualifiers, Stmt, Storage,
    TranslationUnit, TypeSpec, Variable,
};
use crate::glsl::eval::{eval, ConstValue};
use crate::glsl::types::{basic_type, is_builtin_type, BasicType};
use crate::glsl::Diagnostic;
use crate::layout::{Layout, Member, Packing, StructTy, Ty};

/// Reflection record for a single uniform (or uniform block).
///
/// Field names and semantics follow `glslang::TObjectReflection`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectReflection {
    pub name: String,
    /// Byte offset inside the enclosing block, `-1` outside blocks.
    pub offset: i32,
    /// OpenGL type enumerant, see [`crate::gl_types`].
    pub gl_define_type: i32,
    /// Element count for uniforms (1 unless an array), byte size for blocks.
    pub size: i32,
    /// Block index (in reflection order) for block members and blocks,
    /// binding (or `-1`) for loose uniforms.
    pub index: i32,
    pub counter_index: i32,
    /// Member count for blocks, `-1` for uniforms.
    pub num_members: i32,
    pub array_stride: i32,
    pub top_level_array_size: i32,
    pub top_level_array_stride: i32,
    /// Whether the record is an array of basic types (`name[0]`).
    #[serde(default)]
    pub is_array: bool,
}

/// Narrow view of a uniform handed to callers that only need to upload
/// values: name, element count and type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UniformInfo {
    pub name: String,
    /// Number of array elements, 0 when the uniform is not an array.
    pub array_size: i32,
    pub type_id: i32,
}

impl From<&ObjectReflection> for UniformInfo {
    fn from(reflection: &ObjectReflection) -> Self {
        Self {
            name: reflection.name.clone(),
            array_size: if reflection.is_array {
                reflection.size
            } else {
                0
            },
            type_id: reflection.gl_define_type,
        }
    }
}

/// Uniform and block records of one shader.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reflection {
    pub uniforms: Vec<ObjectReflection>,
    pub blocks: Vec<ObjectReflection>,
}

/// Why a shader that parsed could not be reflected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ReflectFailure {
    /// A semantic error such as an undeclared identifier.
    Compile(Diagnostic),
    MissingEntryPoint,
}

impl From<Diagnostic> for ReflectFailure {
    fn from(diagnostic: Diagnostic) -> Self {
        ReflectFailure::Compile(diagnostic)
    }
}

/// Collects the uniforms of `unit`. With `include_inactive` unset, only the
/// records reachable from `main` are reported.
pub(crate) fn reflect(
    unit: &TranslationUnit,
    include_inactive: bool,
) -> Result<Reflection, ReflectFailure> {
    let program = Program::collect(unit)?;
    program.check_identifiers()?;
    if !program.functions.contains_key("main") {
        return Err(ReflectFailure::MissingEntryPoint);
    }

    let uses = program.live_uses();
    tracing::trace!(uses = uses.len(), "collected uniform accesses");
    Ok(program.emit(&uses, include_inactive))
}

fn to_i32(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

fn count(len: usize) -> i32 {
    i32::try_from(len).unwrap_or(i32::MAX)
}

fn is_sampler_state(type_name: &str) -> bool {
    basic_type(type_name) == Some(BasicType::SamplerState)
}

fn block_layout(qualifiers: &Qualifiers, defaults: Layout) -> Layout {
    let packing = if qualifiers.has_layout("std430") || qualifiers.has_layout("push_constant") {
        Packing::Std430
    } else if ["std140", "shared", "packed"]
        .iter()
        .any(|name| qualifiers.has_layout(name))
    {
        Packing::Std140
    } else {
        defaults.packing
    };
    Layout {
        packing,
        row_major: majority(qualifiers).unwrap_or(defaults.row_major),
    }
}

fn majority(qualifiers: &Qualifiers) -> Option<bool> {
    if qualifiers.has_layout("row_major") {
        Some(true)
    } else if qualifiers.has_layout("column_major") {
        Some(false)
    } else {
        None
    }
}

struct LooseUniform {
    name: String,
    ty: Ty,
    binding: i32,
}

struct UniformBlock {
    name: String,
    instance: Option<String>,
    /// Element count for arrays of blocks.
    elements: Option<u32>,
    members: Vec<Member>,
    layout: Layout,
}

enum Uniform {
    Loose(LooseUniform),
    Block(UniformBlock),
}

#[derive(Debug, Clone, Copy)]
enum Symbol {
    Uniform(usize),
    /// Member of an anonymous uniform block.
    BlockMember(usize, usize),
    Variable,
}

/// Global declarations of a shader, resolved.
struct Program<'u> {
    uniforms: Vec<Uniform>,
    globals: HashMap<String, Symbol>,
    constants: HashMap<String, ConstValue>,
    structs: HashMap<String, Rc<StructTy>>,
    functions: HashMap<&'u str, Vec<&'u Function>>,
    function_order: Vec<&'u Function>,
    initializers: Vec<&'u Expr>,
}

impl<'u> Program<'u> {
    fn collect(unit: &'u TranslationUnit) -> Result<Self, Diagnostic> {
        let mut program = Program {
            uniforms: Vec::new(),
            globals: HashMap::new(),
            constants: HashMap::new(),
            structs: HashMap::new(),
            functions: HashMap::new(),
            function_order: Vec::new(),
            initializers: Vec::new(),
        };
        let mut defaults = Layout::default();

        for decl in &unit.decls {
            match decl {
                ExternalDecl::Struct(def) => {
                    let members = program.members(&def.fields)?;
                    program.structs.insert(
                        def.name.clone(),
                        Rc::new(StructTy {
                            name: def.name.clone(),
                            members,
                        }),
                    );
                }
                ExternalDecl::Variables(variables) => {
                    for variable in variables {
                        program.declare_variable(variable)?;
                    }
                }
                ExternalDecl::Block(block) => program.declare_block(block, defaults)?,
                ExternalDecl::Function(function) => {
                    program
                        .functions
                        .entry(function.name.as_str())
                        .or_default()
                        .push(function);
                    program.function_order.push(function);
                }
                ExternalDecl::Defaults(qualifiers)
                    if qualifiers.storage == Some(Storage::Uniform) =>
                {
                    defaults = block_layout(qualifiers, defaults);
                }
                ExternalDecl::Defaults(_) | ExternalDecl::Other => {}
            }
        }
        Ok(program)
    }

    fn constant(&self, expr: &Expr) -> Option<ConstValue> {
        eval(expr, &|name: &str| self.constants.get(name).copied())
    }

    fn layout_int(&self, qualifiers: &Qualifiers, name: &str) -> Option<i64> {
        let value = qualifiers.layout(name)?.value.as_ref()?;
        self.constant(value)?.as_int()
    }

    fn array_len(&self, dim: &ArrayDim, line: u32) -> Result<Option<u32>, Diagnostic> {
        let Some(expr) = dim else {
            return Ok(None);
        };
        let Some(len) = self.constant(expr).and_then(ConstValue::as_int) else {
            return Err(Diagnostic::new(
                line,
                "",
                "array size must be a constant integer expression",
            ));
        };
        match u32::try_from(len) {
            Ok(len) if len > 0 => Ok(Some(len)),
            _ => Err(Diagnostic::new(
                line,
                len.to_string(),
                "array size must be a positive integer",
            )),
        }
    }

    fn resolve(&self, spec: &TypeSpec) -> Result<Ty, Diagnostic> {
        let mut ty = if is_builtin_type(&spec.name) {
            Ty::Basic(spec.name.clone())
        } else if let Some(def) = self.structs.get(&spec.name) {
            Ty::Struct(Rc::clone(def))
        } else {
            return Err(Diagnostic::new(spec.line, &spec.name, "undeclared type"));
        };
        for dim in spec.dims.iter().rev() {
            ty = Ty::Array(Box::new(ty), self.array_len(dim, spec.line)?);
        }
        Ok(ty)
    }

    fn members(&self, fields: &[Field]) -> Result<Vec<Member>, Diagnostic> {
        fields
            .iter()
            .map(|field| {
                Ok(Member {
                    name: field.name.clone(),
                    ty: self.resolve(&field.ty)?,
                    offset: self
                        .layout_int(&field.qualifiers, "offset")
                        .and_then(|offset| u32::try_from(offset).ok()),
                    row_major: majority(&field.qualifiers),
                })
            })
            .collect()
    }

    fn declare_variable(&mut self, variable: &'u Variable) -> Result<(), Diagnostic> {
        if let Some(init) = &variable.init {
            self.initializers.push(init);
        }
        let qualifiers = &variable.qualifiers;
        match qualifiers.storage {
            Some(Storage::Const) if variable.ty.dims.is_empty() => {
                if let Some(value) = variable.init.as_ref().and_then(|init| self.constant(init)) {
                    self.constants.insert(variable.name.clone(), value);
                }
            }
            Some(Storage::Uniform)
                if !qualifiers.subroutine && !is_sampler_state(&variable.ty.name) =>
            {
                let ty = self.resolve(&variable.ty)?;
                let binding = self
                    .layout_int(qualifiers, "binding")
                    .and_then(|binding| i32::try_from(binding).ok())
                    .unwrap_or(-1);
                self.globals
                    .insert(variable.name.clone(), Symbol::Uniform(self.uniforms.len()));
                self.uniforms.push(Uniform::Loose(LooseUniform {
                    name: variable.name.clone(),
                    ty,
                    binding,
                }));
                return Ok(());
            }
            _ => {}
        }
        self.globals.insert(variable.name.clone(), Symbol::Variable);
        Ok(())
    }

    fn declare_block(&mut self, block: &Block, defaults: Layout) -> Result<(), Diagnostic> {
        let is_uniform = block.qualifiers.storage == Some(Storage::Uniform);
        if !is_uniform {
            // Buffer and interface blocks only matter for name resolution.
            match &block.instance {
                Some(instance) => {
                    self.globals.insert(instance.clone(), Symbol::Variable);
                }
                None => {
                    for field in &block.fields {
                        self.globals.insert(field.name.clone(), Symbol::Variable);
                    }
                }
            }
            return Ok(());
        }

        let members = self.members(&block.fields)?;
        let mut elements = None;
        for dim in &block.instance_dims {
            let len = self.array_len(dim, block.line)?.unwrap_or(1);
            elements = Some(elements.unwrap_or(1) * len);
        }

        let index = self.uniforms.len();
        match &block.instance {
            Some(instance) => {
                self.globals.insert(instance.clone(), Symbol::Uniform(index));
            }
            None => {
                for (member, field) in block.fields.iter().enumerate() {
                    self.globals
                        .insert(field.name.clone(), Symbol::BlockMember(index, member));
                }
            }
        }
        self.uniforms.push(Uniform::Block(UniformBlock {
            name: block.name.clone(),
            instance: block.instance.clone(),
            elements,
            members,
            layout: block_layout(&block.qualifiers, defaults),
        }));
        Ok(())
    }

    /// Reports the first identifier that names nothing, in any function.
    fn check_identifiers(&self) -> Result<(), Diagnostic> {
        let mut walker = BodyWalker::new(self, Mode::Check);
        for init in self.initializers.iter().copied() {
            walker.expr(init);
        }
        for function in self.function_order.iter().copied() {
            walker.function(function);
        }
        match walker.error {
            Some(diagnostic) => Err(diagnostic),
            None => Ok(()),
        }
    }

    /// Uniform accesses in global initializers and in every function
    /// reachable from `main`.
    fn live_uses(&self) -> Vec<Use> {
        let mut walker = BodyWalker::new(self, Mode::Live);
        for init in self.initializers.iter().copied() {
            walker.expr(init);
        }

        let mut queue = VecDeque::from(["main"]);
        let mut seen = HashSet::new();
        while let Some(name) = queue.pop_front() {
            if !seen.insert(name) {
                continue;
            }
            for function in self.functions.get(name).into_iter().flatten().copied() {
                walker.function(function);
            }
            queue.extend(walker.calls.drain(..));
        }
        walker.uses
    }

    fn emit(&self, uses: &[Use], include_inactive: bool) -> Reflection {
        let mut live: Vec<HashMap<String, u32>> = vec![HashMap::new(); self.uniforms.len()];
        for access in uses {
            for leaf in explode(&self.uniforms[access.uniform], &access.steps) {
                let size = live[access.uniform].entry(leaf.name).or_insert(0);
                *size = (*size).max(leaf.size);
            }
        }

        let mut reflection = Reflection::default();
        let mut atomic_counters = 0;
        for (position, uniform) in self.uniforms.iter().enumerate() {
            let leaves: Vec<Leaf> = explode(uniform, &[])
                .into_iter()
                .filter_map(|mut leaf| match live[position].get(&leaf.name) {
                    Some(&size) => {
                        leaf.size = size;
                        Some(leaf)
                    }
                    None if include_inactive => Some(leaf),
                    None => None,
                })
                .collect();
            if leaves.is_empty() {
                continue;
            }

            let index = match uniform {
                Uniform::Loose(loose) => loose.binding,
                Uniform::Block(block) => push_block_records(block, &mut reflection),
            };
            for leaf in leaves {
                let counter_index = if leaf.atomic {
                    atomic_counters += 1;
                    atomic_counters - 1
                } else {
                    -1
                };
                let (top_level_array_size, top_level_array_stride) = leaf
                    .top_level
                    .map(|(len, stride)| (to_i32(len), to_i32(stride)))
                    .unwrap_or((0, 0));
                reflection.uniforms.push(ObjectReflection {
                    name: leaf.name,
                    offset: leaf.offset.map_or(-1, to_i32),
                    gl_define_type: leaf.gl_type,
                    size: to_i32(leaf.size),
                    index,
                    counter_index,
                    num_members: -1,
                    array_stride: to_i32(leaf.array_stride),
                    top_level_array_size,
                    top_level_array_stride,
                    is_array: leaf.is_array,
                });
            }
        }
        reflection
    }
}

/// Pushes the block record (one per element for arrays of blocks) and
/// returns the index its members refer to.
fn push_block_records(block: &UniformBlock, reflection: &mut Reflection) -> i32 {
    let first = count(reflection.blocks.len());
    let size = to_i32(block.layout.members_end(&block.members));
    let names = match block.elements {
        Some(count) => (0..count).map(|i| format!("{}[{i}]", block.name)).collect(),
        None => vec![block.name.clone()],
    };
    tracing::debug!(
        block = %block.name,
        members = block.members.len(),
        "reflecting uniform block"
    );
    for name in names {
        let index = count(reflection.blocks.len());
        reflection.blocks.push(ObjectReflection {
            name,
            offset: -1,
            gl_define_type: GL_NONE,
            size,
            index,
            counter_index: -1,
            num_members: count(block.members.len()),
            array_stride: 0,
            top_level_array_size: 0,
            top_level_array_stride: 0,
            is_array: false,
        });
    }
    first
}

/// One link of an access chain.
#[derive(Debug, Clone, PartialEq)]
enum Step {
    Field(String),
    /// Constant index, or `None` when the index is dynamic.
    Index(Option<i64>),
}

#[derive(Debug)]
struct Use {
    uniform: usize,
    steps: Vec<Step>,
}

/// A record-to-be.
#[derive(Debug)]
struct Leaf {
    name: String,
    gl_type: i32,
    size: u32,
    is_array: bool,
    offset: Option<u32>,
    array_stride: u32,
    top_level: Option<(u32, u32)>,
    atomic: bool,
}

/// Where the walk currently is inside a uniform.
#[derive(Clone, Copy)]
struct Place {
    offset: Option<u32>,
    top_level: Option<(u32, u32)>,
}

/// Records reachable through `steps`; every record when `steps` is empty.
fn explode(uniform: &Uniform, steps: &[Step]) -> Vec<Leaf> {
    let mut out = Vec::new();
    match uniform {
        Uniform::Loose(loose) => {
            let place = Place {
                offset: None,
                top_level: None,
            };
            walk(&loose.ty, loose.name.clone(), steps, place, Layout::default(), &mut out);
        }
        Uniform::Block(block) => {
            let steps = match (block.elements, steps.first()) {
                (Some(_), Some(Step::Index(_))) => &steps[1..],
                _ => steps,
            };
            let prefix = match block.instance {
                Some(_) => format!("{}.", block.name),
                None => String::new(),
            };
            let place = Place {
                offset: Some(0),
                top_level: None,
            };
            walk_members(&block.members, &prefix, steps, place, block.layout, &mut out);
        }
    }
    out
}

fn walk_members(
    members: &[Member],
    prefix: &str,
    steps: &[Step],
    place: Place,
    layout: Layout,
    out: &mut Vec<Leaf>,
) {
    let offsets = layout.member_offsets(members);
    let visit = |index: usize, rest: &[Step], out: &mut Vec<Leaf>| {
        let member = &members[index];
        let place = Place {
            offset: place.offset.map(|offset| offset + offsets[index]),
            ..place
        };
        let name = format!("{prefix}{}", member.name);
        walk(&member.ty, name, rest, place, layout.for_member(member), out);
    };

    match steps.split_first() {
        Some((Step::Field(field), rest)) => {
            if let Some(index) = members.iter().position(|member| &member.name == field) {
                visit(index, rest, out);
            }
        }
        _ => (0..members.len()).for_each(|index| visit(index, &[], out)),
    }
}

fn walk(
    ty: &Ty,
    name: String,
    steps: &[Step],
    place: Place,
    layout: Layout,
    out: &mut Vec<Leaf>,
) {
    match ty {
        Ty::Struct(def) => {
            walk_members(&def.members, &format!("{name}."), steps, place, layout, out);
        }
        Ty::Array(element, len) if element.is_aggregate() => {
            let stride = layout.array_stride(element);
            let place = Place {
                top_level: place.top_level.or(Some((len.unwrap_or(0), stride))),
                ..place
            };
            let count = len.unwrap_or(1);
            let (elements, rest): (Vec<u32>, &[Step]) = match steps.split_first() {
                Some((Step::Index(Some(index)), rest)) => {
                    let element = u32::try_from(*index).ok().filter(|index| *index < count);
                    (element.into_iter().collect(), rest)
                }
                Some((Step::Index(None), rest)) => ((0..count).collect(), rest),
                _ => ((0..count).collect(), &[]),
            };
            for element_index in elements {
                let place = Place {
                    offset: place.offset.map(|offset| offset + element_index * stride),
                    ..place
                };
                walk(element, format!("{name}[{element_index}]"), rest, place, layout, out);
            }
        }
        Ty::Array(element, len) => {
            let size = match (len, steps.first()) {
                (Some(len), Some(Step::Index(Some(index)))) => {
                    u32::try_from(index.saturating_add(1)).map_or(*len, |used| used.min(*len))
                }
                (None, Some(Step::Index(Some(index)))) => u32::try_from(index.saturating_add(1)).unwrap_or(1),
                (Some(len), _) => *len,
                (None, _) => 1,
            };
            let stride = if place.offset.is_some() {
                layout.array_stride(element)
            } else {
                0
            };
            let type_name = match element.as_ref() {
                Ty::Basic(type_name) => type_name.as_str(),
                _ => "",
            };
            out.push(Leaf {
                name: format!("{name}[0]"),
                gl_type: gl_type_of(type_name),
                size,
                is_array: true,
                offset: place.offset,
                array_stride: stride,
                top_level: place.top_level.or(Some((len.unwrap_or(0), stride))),
                atomic: type_name == "atomic_uint",
            });
        }
        Ty::Basic(type_name) => out.push(Leaf {
            name,
            gl_type: gl_type_of(type_name),
            size: 1,
            is_array: false,
            offset: place.offset,
            array_stride: 0,
            top_level: place.top_level,
            atomic: type_name == "atomic_uint",
        }),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Every function, reporting undeclared identifiers.
    Check,
    /// Reachable code only, recording uniform accesses.
    Live,
}

enum Resolved {
    Local,
    Global(Symbol),
    Builtin,
    Unknown,
}

/// An access chain rooted at a uniform, and the index expressions along it.
struct Access<'u> {
    uniform: usize,
    steps: Vec<Step>,
    indices: Vec<&'u Expr>,
}

struct BodyWalker<'p, 'u> {
    program: &'p Program<'u>,
    mode: Mode,
    scopes: Vec<HashSet<&'u str>>,
    calls: Vec<&'u str>,
    uses: Vec<Use>,
    error: Option<Diagnostic>,
}

impl<'p, 'u> BodyWalker<'p, 'u> {
    fn new(program: &'p Program<'u>, mode: Mode) -> Self {
        Self {
            program,
            mode,
            scopes: Vec::new(),
            calls: Vec::new(),
            uses: Vec::new(),
            error: None,
        }
    }

    fn resolve(&self, name: &str) -> Resolved {
        if self.scopes.iter().any(|scope| scope.contains(name)) {
            Resolved::Local
        } else if let Some(symbol) = self.program.globals.get(name) {
            Resolved::Global(*symbol)
        } else if name.starts_with("gl_") {
            Resolved::Builtin
        } else {
            Resolved::Unknown
        }
    }

    fn declare(&mut self, name: &'u str) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name);
        }
    }

    /// Folds `expr` unless a local shadows one of the constants it names.
    fn constant(&self, expr: &Expr) -> Option<ConstValue> {
        eval(expr, &|name: &str| match self.resolve(name) {
            Resolved::Global(_) => self.program.constants.get(name).copied(),
            _ => None,
        })
    }

    fn taken_branch(&self, cond: &Expr) -> Option<bool> {
        match self.mode {
            Mode::Live => self.constant(cond).and_then(ConstValue::as_bool),
            Mode::Check => None,
        }
    }

    fn function(&mut self, function: &'u Function) {
        self.scopes
            .push(function.params.iter().map(String::as_str).collect());
        for stmt in &function.body {
            self.stmt(stmt);
        }
        self.scopes.pop();
    }

    fn scoped(&mut self, stmt: &'u Stmt) {
        self.scopes.push(HashSet::new());
        self.stmt(stmt);
        self.scopes.pop();
    }

    fn stmt(&mut self, stmt: &'u Stmt) {
        match stmt {
            Stmt::Compound(statements) => {
                self.scopes.push(HashSet::new());
                for stmt in statements {
                    self.stmt(stmt);
                }
                self.scopes.pop();
            }
            Stmt::Declaration(variables) => {
                for variable in variables {
                    if let Some(init) = &variable.init {
                        self.expr(init);
                    }
                    self.declare(&variable.name);
                }
            }
            Stmt::Expr(expr) | Stmt::Case(Some(expr)) | Stmt::Return(Some(expr)) => {
                self.expr(expr)
            }
            Stmt::If {
                cond,
                then,
                otherwise,
            } => {
                self.expr(cond);
                match self.taken_branch(cond) {
                    Some(true) => self.scoped(then),
                    Some(false) => {
                        if let Some(otherwise) = otherwise {
                            self.scoped(otherwise);
                        }
                    }
                    None => {
                        self.scoped(then);
                        if let Some(otherwise) = otherwise {
                            self.scoped(otherwise);
                        }
                    }
                }
            }
            Stmt::Switch { selector, body } => {
                self.expr(selector);
                self.scopes.push(HashSet::new());
                for stmt in body {
                    self.stmt(stmt);
                }
                self.scopes.pop();
            }
            Stmt::While { cond, body } => {
                self.scopes.push(HashSet::new());
                self.stmt(cond);
                self.stmt(body);
                self.scopes.pop();
            }
            Stmt::DoWhile { body, cond } => {
                self.scoped(body);
                self.expr(cond);
            }
            Stmt::For {
                init,
                cond,
                step,
                body,
            } => {
                self.scopes.push(HashSet::new());
                self.stmt(init);
                if let Some(cond) = cond {
                    self.stmt(cond);
                }
                if let Some(step) = step {
                    self.expr(step);
                }
                self.scoped(body);
                self.scopes.pop();
            }
            Stmt::Case(None)
            | Stmt::Return(None)
            | Stmt::Break
            | Stmt::Continue
            | Stmt::Discard
            | Stmt::Empty => {}
        }
    }

    fn access(&self, expr: &'u Expr) -> Option<Access<'u>> {
        match expr {
            Expr::Ident { name, .. } => {
                let (uniform, steps) = match self.resolve(name) {
                    Resolved::Global(Symbol::Uniform(uniform)) => (uniform, Vec::new()),
                    Resolved::Global(Symbol::BlockMember(uniform, member)) => {
                        let Uniform::Block(block) = &self.program.uniforms[uniform] else {
                            return None;
                        };
                        let field = block.members[member].name.clone();
                        (uniform, vec![Step::Field(field)])
                    }
                    _ => return None,
                };
                Some(Access {
                    uniform,
                    steps,
                    indices: Vec::new(),
                })
            }
            Expr::Field { base, name } => {
                let mut access = self.access(base)?;
                access.steps.push(Step::Field(name.clone()));
                Some(access)
            }
            Expr::Index { base, index } => {
                let mut access = self.access(base)?;
                let constant = self.constant(index).and_then(ConstValue::as_int);
                access.steps.push(Step::Index(constant));
                access.indices.push(index);
                Some(access)
            }
            _ => None,
        }
    }

    fn record(&mut self, access: Access<'u>) {
        if self.mode == Mode::Live {
            self.uses.push(Use {
                uniform: access.uniform,
                steps: access.steps,
            });
        }
        for index in access.indices {
            self.expr(index);
        }
    }

    fn expr(&mut self, expr: &'u Expr) {
        if let Some(access) = self.access(expr) {
            self.record(access);
            return;
        }

        match expr {
            Expr::Ident { name, line } => {
                if let Resolved::Unknown = self.resolve(name) {
                    if self.error.is_none() {
                        self.error = Some(Diagnostic::new(*line, name, "undeclared identifier"));
                    }
                }
            }
            Expr::Int { .. } | Expr::Float(_) | Expr::Bool(_) => {}
            Expr::Unary { operand, .. } => self.expr(operand),
            Expr::Binary { lhs, rhs, .. } => {
                self.expr(lhs);
                self.expr(rhs);
            }
            Expr::Assign { target, value, .. } => {
                self.expr(target);
                self.expr(value);
            }
            Expr::Ternary {
                cond,
                then,
                otherwise,
            } => {
                self.expr(cond);
                match self.taken_branch(cond) {
                    Some(true) => self.expr(then),
                    Some(false) => self.expr(otherwise),
                    None => {
                        self.expr(then);
                        self.expr(otherwise);
                    }
                }
            }
            Expr::Index { base, index } => {
                self.expr(base);
                self.expr(index);
            }
            Expr::Field { base, .. } => self.expr(base),
            Expr::Call { callee, args } => {
                if let Callee::Function(name) = callee {
                    if self.program.functions.contains_key(name.as_str()) {
                        self.calls.push(name);
                    }
                }
                for arg in args {
                    self.expr(arg);
                }
            }
            Expr::Method { base, name, args } => {
                // `.length()` reads the declaration, not the uniform's value.
                match self.access(base) {
                    Some(access) if name == "length" && self.mode == Mode::Live => {
                        for index in access.indices {
                            self.expr(index);
                        }
                    }
                    _ => self.expr(base),
                }
                for arg in args {
                    self.expr(arg);
                }
            }
            Expr::Sequence(items) | Expr::InitList(items) => {
                for item in items {
                    self.expr(item);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gl_types::{GL_FLOAT, GL_FLOAT_MAT4, GL_FLOAT_VEC3, GL_UNSIGNED_INT_ATOMIC_COUNTER};
    use crate::glsl;
    use crate::source::PreparedSource;
    use crate::version::GlslVersion;

    fn reflect_source(text: &str, include_inactive: bool) -> Result<Reflection, ReflectFailure> {
        let source = PreparedSource::new(text, GlslVersion::new(450).unwrap());
        let unit = glsl::parse(&source).map_err(ReflectFailure::Compile)?;
        reflect(&unit, include_inactive)
    }

    fn names(reflection: &Reflection) -> Vec<&str> {
        reflection
            .uniforms
            .iter()
            .map(|record| record.name.as_str())
            .collect()
    }

    fn record(name: &str, size: i32, is_array: bool) -> ObjectReflection {
        ObjectReflection {
            name: name.to_string(),
            offset: -1,
            gl_define_type: GL_FLOAT,
            size,
            index: -1,
            counter_index: -1,
            num_members: -1,
            array_stride: 0,
            top_level_array_size: 0,
            top_level_array_stride: 0,
            is_array,
        }
    }

    #[test]
    fn liveness_is_tracked_per_member() {
        let reflection = reflect_source(
            r"#version 450
struct Light { vec3 col; float k; };
layout(std140, binding = 0) uniform Params { float used; float unused; } params;
layout(std140, binding = 1) uniform Lights { Light lights[2]; } lit;
layout(std140, binding = 2) uniform Extra { float anon_used; float anon_unused; };
layout(location = 0) out vec4 color;
void main() {
    color = vec4(params.used + anon_used);
    color.rgb += lit.lights[1].col;
}
",
            false,
        )
        .unwrap();

        assert_eq!(
            names(&reflection),
            ["Params.used", "Lights.lights[1].col", "anon_used"]
        );
        let col = &reflection.uniforms[1];
        assert_eq!(col.offset, 16);
        assert_eq!(col.gl_define_type, GL_FLOAT_VEC3);
        assert_eq!(col.top_level_array_size, 2);
        assert_eq!(col.top_level_array_stride, 16);
        assert_eq!(col.index, 1);
        assert_eq!(reflection.blocks.len(), 3);
        assert_eq!(reflection.blocks[2].num_members, 2);
    }

    #[test]
    fn dynamic_indices_reach_every_element() {
        let reflection = reflect_source(
            r"#version 450
struct Light { vec3 col; float k; };
layout(std140) uniform Lights { Light lights[2]; int count; };
out vec4 color;
void main() {
    for (int i = 0; i < count; ++i) {
        color.rgb += lights[i].col;
    }
}
",
            false,
        )
        .unwrap();
        assert_eq!(
            names(&reflection),
            ["lights[0].col", "lights[1].col", "count"]
        );
    }

    #[test]
    fn constant_indices_size_leaf_arrays() {
        let reflection = reflect_source(
            r"#version 450
const int LAST = 2;
uniform float weights[8];
uniform float spare[4];
out vec4 color;
void main() {
    color = vec4(weights[0] + weights[LAST]);
    int i = 1;
    color.x += spare[i];
}
",
            false,
        )
        .unwrap();
        let weights = &reflection.uniforms[0];
        assert_eq!(weights.name, "weights[0]");
        assert_eq!(weights.size, 3);
        assert!(weights.is_array);
        assert_eq!(reflection.uniforms[1].size, 4);

        let all = reflect_source(
            "#version 450\nuniform float weights[8];\nvoid main() {}\n",
            true,
        )
        .unwrap();
        assert_eq!(all.uniforms[0].size, 8);
    }

    #[test]
    fn only_reachable_functions_and_branches_count() {
        let reflection = reflect_source(
            r"#version 450
uniform mat4 mvp;
uniform float helper_only;
uniform float dead_branch;
uniform float never_called;
float helper() { return helper_only; }
float unused() { return never_called; }
void main() {
    if (false) { gl_Position = vec4(dead_branch); }
    gl_Position = mvp * vec4(helper());
}
",
            false,
        )
        .unwrap();
        assert_eq!(names(&reflection), ["mvp", "helper_only"]);
        assert_eq!(reflection.uniforms[0].gl_define_type, GL_FLOAT_MAT4);
    }

    #[test]
    fn locals_shadow_uniforms() {
        let reflection = reflect_source(
            "#version 450\nuniform float scale;\nvoid main() { float scale = 1.0; gl_Position = vec4(scale); }\n",
            false,
        )
        .unwrap();
        assert!(reflection.uniforms.is_empty());
    }

    #[test]
    fn atomic_counters_get_counter_indices() {
        let reflection = reflect_source(
            r"#version 450
layout(binding = 0, offset = 0) uniform atomic_uint first;
layout(binding = 0, offset = 4) uniform atomic_uint second;
void main() { atomicCounterIncrement(second); atomicCounterIncrement(first); }
",
            false,
        )
        .unwrap();
        let counters: Vec<i32> = reflection.uniforms.iter().map(|u| u.counter_index).collect();
        assert_eq!(counters, [0, 1]);
        assert_eq!(reflection.uniforms[0].gl_define_type, GL_UNSIGNED_INT_ATOMIC_COUNTER);
        assert_eq!(reflection.uniforms[0].index, 0);
    }

    #[test]
    fn undeclared_identifiers_and_missing_main_fail() {
        let failure = reflect_source("#version 450\nvoid main() {\n  nope = 1.0;\n}\n", false)
            .unwrap_err();
        assert_eq!(
            failure,
            ReflectFailure::Compile(Diagnostic::new(3, "nope", "undeclared identifier"))
        );

        let failure = reflect_source("#version 450\nvoid helper() {}\n", false).unwrap_err();
        assert_eq!(failure, ReflectFailure::MissingEntryPoint);
    }

    #[test]
    fn uniform_info_uses_the_array_flag() {
        let info = UniformInfo::from(&record("weights[0]", 8, true));
        assert_eq!(info.array_size, 8);
        // A struct member whose name happens to end in `]` is not an array.
        let info = UniformInfo::from(&record("lights[1].k", 1, false));
        assert_eq!(info.array_size, 0);
        let info = UniformInfo::from(&record("tint", 1, false));
        assert_eq!(info.array_size, 0);
        assert_eq!(info.type_id, GL_FLOAT);
    }

    #[test]
    fn uniform_info_serializes_camel_case() {
        let info = UniformInfo::from(&record("tex", 1, false));
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["arraySize"], 0);
        assert_eq!(json["typeId"], GL_FLOAT);
        let json = serde_json::to_value(record("w[0]", 2, true)).unwrap();
        assert_eq!(json["isArray"], true);
    }
}
