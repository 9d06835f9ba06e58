//! Arena-indexed AST for the D front end.
//!
//! Nodes live in typed vectors inside [`Ast`]; children are plain index
//! newtypes ([`ExprId`], [`TypeId`], [`StmtId`], [`DeclId`], [`InitId`]), so
//! the tree has no reference cycles and a whole parse is dropped in one go.
//! The parser builds nodes exclusively through the arena's `make_*`
//! constructors.

use std::sync::Arc;

use dfront_ident::Ident;
use dfront_location::Loc;
use dfront_token::TokenKind;

use crate::attributes::{CppMangle, Linkage, ModFlags, Protection, StorageClass};

macro_rules! arena_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u32);

        impl $name {
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }
    };
}

arena_id!(/// Index of an expression node.
    ExprId);
arena_id!(/// Index of a type node.
    TypeId);
arena_id!(/// Index of a statement node.
    StmtId);
arena_id!(/// Index of a declaration node.
    DeclId);
arena_id!(/// Index of an initializer node.
    InitId);

/// A template argument or `__traits`/`typeid`/`mixin` operand: the grammar
/// admits both types and expressions in these slots.
#[derive(Clone, Debug, PartialEq)]
pub enum TypeOrExpr {
    Type(TypeId),
    Expr(ExprId),
}

/// Doc comment attached to a declared symbol.
pub type DocComment = Option<Arc<str>>;

// ————————————————————————————— expressions —————————————————————————————

/// Binary operator tags. Identity (`is`), `in` and their negations live at
/// the relational level together with `==` and `<`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    Concat,
    Shl,
    Shr,
    Ushr,
    And,
    Or,
    Xor,
    AndAnd,
    OrOr,
    Equal,
    NotEqual,
    Identity,
    NotIdentity,
    In,
    NotIn,
    Less,
    LessEq,
    Greater,
    GreaterEq,
}

impl BinOp {
    pub fn as_str(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
            BinOp::Pow => "^^",
            BinOp::Concat => "~",
            BinOp::Shl => "<<",
            BinOp::Shr => ">>",
            BinOp::Ushr => ">>>",
            BinOp::And => "&",
            BinOp::Or => "|",
            BinOp::Xor => "^",
            BinOp::AndAnd => "&&",
            BinOp::OrOr => "||",
            BinOp::Equal => "==",
            BinOp::NotEqual => "!=",
            BinOp::Identity => "is",
            BinOp::NotIdentity => "!is",
            BinOp::In => "in",
            BinOp::NotIn => "!in",
            BinOp::Less => "<",
            BinOp::LessEq => "<=",
            BinOp::Greater => ">",
            BinOp::GreaterEq => ">=",
        }
    }
}

/// Prefix unary operator tags.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Plus,
    Com,
    Not,
    AddressOf,
    Deref,
    PreInc,
    PreDec,
}

impl UnaryOp {
    pub fn as_str(self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::Plus => "+",
            UnaryOp::Com => "~",
            UnaryOp::Not => "!",
            UnaryOp::AddressOf => "&",
            UnaryOp::Deref => "*",
            UnaryOp::PreInc => "++",
            UnaryOp::PreDec => "--",
        }
    }
}

/// The spec clause of an `is (…)` expression: `:` (implicit convertibility)
/// or `==` (exact match).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IsSpec {
    Colon,
    Equal,
}

/// `function` vs `delegate` vs neither, for function literals.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FuncLiteralKind {
    Function,
    Delegate,
    Anonymous,
}

/// What `goto` targets.
#[derive(Clone, Debug, PartialEq)]
pub enum GotoTarget {
    Label(Ident),
    Default,
    Case(Option<ExprId>),
}

#[derive(Clone, Debug, PartialEq)]
pub enum ExprKind {
    Error,
    Ident(Ident),
    /// Templated identifier `foo!(args)` in scope position.
    ScopeTemplate { ident: Ident, args: Vec<TypeOrExpr> },
    /// `.id` or `.id!(args)` rooted at module scope.
    ModuleScope { ident: Ident, args: Option<Vec<TypeOrExpr>> },
    Dollar,
    This,
    Super,
    Null,
    True,
    False,
    /// `__FILE__`, `__LINE__` and friends; the token kind says which.
    SpecialKeyword(TokenKind),
    IntLiteral { value: u64, kind: TokenKind },
    FloatLiteral { value: f64, kind: TokenKind },
    CharLiteral { value: u32, kind: TokenKind },
    StringLiteral { bytes: Arc<[u8]>, postfix: u8 },
    ArrayLiteral { elements: Vec<ExprId> },
    AssocArrayLiteral { keys: Vec<ExprId>, values: Vec<ExprId> },
    /// A type in expression position (template value args, `typeid`).
    TypeRef(TypeId),
    /// `T.id` / `T.id!(args)` where `T` is a type.
    TypeDotId { ty: TypeId, ident: Ident, args: Option<Vec<TypeOrExpr>> },
    Typeid { arg: TypeOrExpr },
    Traits { ident: Ident, args: Vec<TypeOrExpr> },
    Is {
        ty: TypeId,
        ident: Option<Ident>,
        spec: Option<IsSpec>,
        /// Exact spec type for `is(T == U)` / `is(T : U)`.
        spec_type: Option<TypeId>,
        /// Spec keyword (`struct`, `union`, `const`, `return`, …) when the
        /// spec is a category rather than a type.
        spec_keyword: Option<TokenKind>,
        /// `__argTypes` spec.
        spec_arg_types: bool,
        params: Vec<TemplateParam>,
    },
    Assert { expr: ExprId, msg: Option<ExprId> },
    MixinExpr { args: Vec<TypeOrExpr> },
    ImportString { expr: ExprId },
    New { ty: TypeId, args: Vec<ExprId> },
    /// `new class (args) BaseList { members }`
    NewAnonClass { args: Vec<ExprId>, decl: DeclId },
    FuncLiteral { decl: DeclId },
    Unary { op: UnaryOp, expr: ExprId },
    /// `cast(T) e` or qualifier-only `cast(const) e` (`ty` is `None`).
    Cast { ty: Option<TypeId>, mods: ModFlags, expr: ExprId },
    Delete { expr: ExprId },
    Binary { op: BinOp, lhs: ExprId, rhs: ExprId },
    Cond { cond: ExprId, when_true: ExprId, when_false: ExprId },
    Assign { lhs: ExprId, rhs: ExprId },
    BinAssign { op: BinOp, lhs: ExprId, rhs: ExprId },
    Comma { lhs: ExprId, rhs: ExprId },
    DotId { lhs: ExprId, ident: Ident, args: Option<Vec<TypeOrExpr>> },
    /// Postfix `e.new T(…)`.
    DotNew { lhs: ExprId, new: ExprId },
    PostInc { expr: ExprId },
    PostDec { expr: ExprId },
    Call { callee: ExprId, args: Vec<ExprId> },
    Index { base: ExprId, args: Vec<ExprId> },
    Slice { base: ExprId, lwr: Option<ExprId>, upr: Option<ExprId> },
    /// `l .. u` appearing as an index argument.
    Interval { lwr: ExprId, upr: ExprId },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Expr {
    pub loc: Loc,
    pub kind: ExprKind,
    /// Whether the source wrapped this expression in its own parentheses.
    /// Consulted by the mixed-precedence warning; not part of the printed
    /// form, which parenthesises from precedence alone.
    pub parens: bool,
}

// ———————————————————————————————— types ————————————————————————————————

/// One segment of a qualified type name: `id` or `id!(args)`.
#[derive(Clone, Debug, PartialEq)]
pub struct TypeSeg {
    pub ident: Ident,
    pub args: Option<Vec<TypeOrExpr>>,
}

/// The root of a `typeof` type: `typeof(expr)` or `typeof(return)`.
#[derive(Clone, Debug, PartialEq)]
pub enum TypeofArg {
    Expr(ExprId),
    Return,
}

#[derive(Clone, Debug, PartialEq)]
pub enum TypeKind {
    Error,
    /// Built-in scalar type; the token kind says which.
    Basic(TokenKind),
    /// `a.b!(c).d`, optionally rooted at module scope with a leading dot.
    Qualified { leading_dot: bool, segments: Vec<TypeSeg> },
    Typeof { arg: TypeofArg, segments: Vec<TypeSeg> },
    /// `__traits(…)` in type position.
    TraitsType { expr: ExprId },
    MixinType { args: Vec<TypeOrExpr> },
    Vector { base: TypeId },
    Pointer { next: TypeId },
    /// `T[]`
    DArray { next: TypeId },
    /// `T[dim]`
    SArray { next: TypeId, dim: ExprId },
    /// `T[Key]`
    AArray { next: TypeId, key: TypeId },
    /// `T[lwr .. upr]` (sequence slice)
    SliceType { next: TypeId, lwr: ExprId, upr: ExprId },
    /// `ret` is `None` for auto-return function declarations.
    FunctionType { ret: Option<TypeId>, params: ParameterList, stc: StorageClass, linkage: Linkage },
    DelegateType { ret: Option<TypeId>, params: ParameterList, stc: StorageClass, linkage: Linkage },
    Const { next: TypeId },
    Immutable { next: TypeId },
    Shared { next: TypeId },
    Wild { next: TypeId },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Type {
    pub loc: Loc,
    pub kind: TypeKind,
}

// ————————————————————————————— parameters ——————————————————————————————

/// Variadic style of a parameter list.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum VarArg {
    #[default]
    None,
    /// `(…)` or `(a, …)` — untyped variadic.
    Variadic,
    /// `(T t …)` — typesafe variadic bound to the last parameter.
    TypesafeVariadic,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Parameter {
    pub loc: Loc,
    pub stc: StorageClass,
    pub udas: Option<Vec<ExprId>>,
    /// `None` when the type is inferred (implicit template parameter or
    /// lambda parameter).
    pub ty: Option<TypeId>,
    pub ident: Option<Ident>,
    pub default_value: Option<ExprId>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParameterList {
    pub params: Vec<Parameter>,
    pub varargs: VarArg,
}

// ——————————————————————————— template model ————————————————————————————

#[derive(Clone, Debug, PartialEq)]
pub enum TemplateParam {
    /// `T`, `T : Spec`, `T = Default`
    Type { ident: Ident, spec: Option<TypeId>, default: Option<TypeId> },
    /// `this T`
    This { ident: Ident, spec: Option<TypeId>, default: Option<TypeId> },
    /// `int N`, `int N : 3`, `int N = 7`
    Value { ident: Ident, ty: TypeId, spec: Option<ExprId>, default: Option<ExprId> },
    /// `alias A`, with optional type constraint and defaults.
    Alias {
        ident: Ident,
        ty: Option<TypeId>,
        spec: Option<TypeOrExpr>,
        default: Option<TypeOrExpr>,
    },
    /// `T...`
    Tuple { ident: Ident },
}

// ————————————————————————————— statements ——————————————————————————————

/// `scope(exit|success|failure)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScopeGuardKind {
    Exit,
    Success,
    Failure,
}

impl ScopeGuardKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ScopeGuardKind::Exit => "exit",
            ScopeGuardKind::Success => "success",
            ScopeGuardKind::Failure => "failure",
        }
    }
}

/// A `debug`/`version`/`static if` condition head.
#[derive(Clone, Debug, PartialEq)]
pub enum Condition {
    StaticIf { cond: ExprId },
    Debug { level: Option<u64>, ident: Option<Ident> },
    Version { level: Option<u64>, ident: Option<Ident> },
}

/// One parameter of a `foreach` head.
#[derive(Clone, Debug, PartialEq)]
pub struct ForeachParam {
    pub loc: Loc,
    pub stc: StorageClass,
    pub ty: Option<TypeId>,
    pub ident: Ident,
}

/// The shared head of the four foreach variants.
#[derive(Clone, Debug, PartialEq)]
pub struct ForeachHead {
    pub reverse: bool,
    pub params: Vec<ForeachParam>,
    pub aggr: ExprId,
    /// Upper bound of a range foreach (`lwr .. upr`); `aggr` is the lower
    /// bound in that case.
    pub upper: Option<ExprId>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Catch {
    pub loc: Loc,
    pub ty: Option<TypeId>,
    pub ident: Option<Ident>,
    pub handler: StmtId,
}

/// The declared variable of `if (auto x = e)` and friends.
#[derive(Clone, Debug, PartialEq)]
pub struct IfParam {
    pub stc: StorageClass,
    pub ty: Option<TypeId>,
    pub ident: Ident,
}

/// One instruction of an `asm` block: the raw tokens up to `;`.
#[derive(Clone, Debug, PartialEq)]
pub struct AsmInstr {
    pub loc: Loc,
    pub tokens: Vec<dfront_token::Token>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum StmtKind {
    Error,
    Empty,
    Expr { expr: ExprId },
    /// A declaration in statement position.
    Decl { decl: DeclId },
    Compound { stmts: Vec<StmtId> },
    /// `{ … }` introducing a scope.
    Scoped { stmt: StmtId },
    While { cond: ExprId, body: StmtId },
    DoWhile { body: StmtId, cond: ExprId },
    For { init: Option<StmtId>, cond: Option<ExprId>, inc: Option<ExprId>, body: StmtId },
    Foreach { head: ForeachHead, body: StmtId },
    StaticForeach { head: ForeachHead, body: StmtId },
    If { param: Option<IfParam>, cond: ExprId, then: StmtId, else_: Option<StmtId> },
    Conditional { cond: Condition, then: StmtId, else_: Option<StmtId> },
    Pragma { ident: Ident, args: Vec<ExprId>, body: Option<StmtId> },
    StaticAssert { cond: ExprId, msg: Option<ExprId> },
    Switch { cond: ExprId, body: StmtId, is_final: bool },
    Case { exprs: Vec<ExprId>, body: StmtId },
    CaseRange { first: ExprId, last: ExprId, body: StmtId },
    Default { body: StmtId },
    Return { expr: Option<ExprId> },
    Break { ident: Option<Ident> },
    Continue { ident: Option<Ident> },
    Goto { target: GotoTarget },
    Synchronized { expr: Option<ExprId>, body: StmtId },
    With { expr: ExprId, body: StmtId },
    Try { body: StmtId, catches: Vec<Catch>, finally_: Option<StmtId> },
    Throw { expr: ExprId },
    ScopeGuard { kind: ScopeGuardKind, body: StmtId },
    Asm { stc: StorageClass, instrs: Vec<AsmInstr> },
    Mixin { args: Vec<TypeOrExpr> },
    Label { ident: Ident, stmt: StmtId },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Stmt {
    pub loc: Loc,
    pub kind: StmtKind,
}

// ———————————————————————————— declarations —————————————————————————————

/// `in`/`out` contracts accumulated before a function body.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Contracts {
    /// `in { … }` blocks and `in (expr, msg)` conditions, in source order.
    pub requires: Vec<Contract>,
    /// `out` variants, in source order.
    pub ensures: Vec<EnsureContract>,
}

impl Contracts {
    pub fn is_empty(&self) -> bool {
        self.requires.is_empty() && self.ensures.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Contract {
    Block(StmtId),
    Expr { expr: ExprId, msg: Option<ExprId> },
}

#[derive(Clone, Debug, PartialEq)]
pub struct EnsureContract {
    pub ident: Option<Ident>,
    pub contract: Contract,
}

/// One imported module with optional alias and selective names.
#[derive(Clone, Debug, PartialEq)]
pub struct ImportItem {
    pub loc: Loc,
    pub packages: Vec<Ident>,
    pub ident: Ident,
    pub alias: Option<Ident>,
    /// `: name, alias = name` selective list.
    pub names: Vec<(Option<Ident>, Ident)>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EnumMember {
    pub loc: Loc,
    pub ident: Ident,
    /// Explicit member type (rare, manifest-constant style).
    pub ty: Option<TypeId>,
    pub value: Option<ExprId>,
    pub udas: Option<Vec<ExprId>>,
    pub doc: DocComment,
}

/// What an `alias id = …;` binds to.
#[derive(Clone, Debug, PartialEq)]
pub enum AliasTarget {
    Type(TypeId),
    /// Function literal target (`alias f = x => x + 1;`).
    Expr(ExprId),
}

/// Aggregate flavour.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AggregateKind {
    Struct,
    Union,
    Class,
    Interface,
}

impl AggregateKind {
    pub fn keyword(self) -> &'static str {
        match self {
            AggregateKind::Struct => "struct",
            AggregateKind::Union => "union",
            AggregateKind::Class => "class",
            AggregateKind::Interface => "interface",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum DeclKind {
    Error,
    Module {
        packages: Vec<Ident>,
        ident: Ident,
        is_deprecated: bool,
        dep_msg: Option<ExprId>,
    },
    Import { items: Vec<ImportItem>, is_static: bool },
    AliasThis { ident: Ident },
    Var { ident: Ident, ty: Option<TypeId>, init: Option<InitId>, stc: StorageClass },
    Alias { ident: Ident, params: Option<Vec<TemplateParam>>, target: AliasTarget, stc: StorageClass },
    Func {
        ident: Ident,
        ty: TypeId,
        stc: StorageClass,
        contracts: Contracts,
        body: Option<StmtId>,
    },
    FuncLiteral {
        kind: FuncLiteralKind,
        params: Option<ParameterList>,
        ret: Option<TypeId>,
        stc: StorageClass,
        body: StmtId,
    },
    /// `this(…)`; a postblit is `this(this)`.
    Ctor {
        params: ParameterList,
        tpl_params: Option<Vec<TemplateParam>>,
        constraint: Option<ExprId>,
        stc: StorageClass,
        contracts: Contracts,
        body: Option<StmtId>,
        is_postblit: bool,
    },
    Dtor { stc: StorageClass, contracts: Contracts, body: Option<StmtId> },
    StaticCtor { shared: bool, stc: StorageClass, body: Option<StmtId> },
    StaticDtor { shared: bool, stc: StorageClass, body: Option<StmtId> },
    Invariant { expr: Option<ExprId>, body: Option<StmtId> },
    Unittest { body: StmtId },
    /// Class allocator `new(params) { … }` (legacy member).
    NewDecl { params: ParameterList, body: Option<StmtId> },
    Aggregate {
        kind: AggregateKind,
        ident: Option<Ident>,
        bases: Vec<TypeId>,
        members: Option<Vec<DeclId>>,
    },
    /// Anonymous `struct { … }` / `union { … }` member.
    AnonAggregate { is_union: bool, members: Vec<DeclId> },
    Enum {
        ident: Option<Ident>,
        memtype: Option<TypeId>,
        members: Option<Vec<EnumMember>>,
    },
    Template {
        ident: Ident,
        params: Vec<TemplateParam>,
        constraint: Option<ExprId>,
        members: Vec<DeclId>,
        is_mixin: bool,
    },
    /// `mixin a.b!(args) ident;`
    TemplateMixin { segments: Vec<TypeSeg>, leading_dot: bool, ident: Option<Ident> },
    /// `mixin("…");` at declaration level.
    MixinDecl { args: Vec<TypeOrExpr> },
    StaticAssert { cond: ExprId, msg: Option<ExprId> },
    /// `debug = id;` / `version = id;`
    VersionSymbol { is_debug: bool, level: Option<u64>, ident: Option<Ident> },
    // attribute wrappers; outermost wrapper == last attribute parsed
    StorageClassDecl { stc: StorageClass, decls: Vec<DeclId> },
    DeprecatedDecl { msg: Option<ExprId>, decls: Vec<DeclId> },
    LinkageDecl {
        linkage: Linkage,
        cpp_mangle: CppMangle,
        namespaces: Option<Vec<Ident>>,
        namespace_exprs: Option<Vec<ExprId>>,
        decls: Vec<DeclId>,
    },
    ProtectionDecl { protection: Protection, decls: Vec<DeclId> },
    AlignDecl { alignment: Option<ExprId>, decls: Vec<DeclId> },
    UserAttributeDecl { attrs: Vec<ExprId>, decls: Vec<DeclId> },
    PragmaDecl { ident: Ident, args: Vec<ExprId>, decls: Vec<DeclId> },
    Conditional { cond: Condition, then: Vec<DeclId>, else_: Option<Vec<DeclId>> },
    StaticForeachDecl { head: ForeachHead, decls: Vec<DeclId> },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Decl {
    pub loc: Loc,
    pub kind: DeclKind,
    pub doc: DocComment,
}

// ———————————————————————————— initializers —————————————————————————————

#[derive(Clone, Debug, PartialEq)]
pub enum InitKind {
    Error,
    Void,
    Expr { expr: ExprId },
    Struct { fields: Vec<(Option<Ident>, InitId)> },
    Array { items: Vec<(Option<ExprId>, InitId)> },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Init {
    pub loc: Loc,
    pub kind: InitKind,
}

// ———————————————————————————————— arena ————————————————————————————————

/// Per-parse node arena. This is also the builder seam: every node the
/// parser creates goes through a `make_*` constructor here.
#[derive(Debug, Default)]
pub struct Ast {
    exprs: Vec<Expr>,
    types: Vec<Type>,
    stmts: Vec<Stmt>,
    decls: Vec<Decl>,
    inits: Vec<Init>,
    /// Module header, set at most once per parse.
    pub module_decl: Option<DeclId>,
    /// UDAs that preceded the `module` declaration.
    pub module_attributes: Vec<ExprId>,
}

impl Ast {
    pub fn new() -> Self {
        Ast::default()
    }

    pub fn make_expr(&mut self, loc: Loc, kind: ExprKind) -> ExprId {
        let id = ExprId(self.exprs.len() as u32);
        self.exprs.push(Expr { loc, kind, parens: false });
        id
    }

    /// Record that the source parenthesised this expression.
    pub fn set_parens(&mut self, id: ExprId) {
        self.exprs[id.index()].parens = true;
    }

    pub fn make_type(&mut self, loc: Loc, kind: TypeKind) -> TypeId {
        let id = TypeId(self.types.len() as u32);
        self.types.push(Type { loc, kind });
        id
    }

    pub fn make_stmt(&mut self, loc: Loc, kind: StmtKind) -> StmtId {
        let id = StmtId(self.stmts.len() as u32);
        self.stmts.push(Stmt { loc, kind });
        id
    }

    pub fn make_decl(&mut self, loc: Loc, kind: DeclKind) -> DeclId {
        let id = DeclId(self.decls.len() as u32);
        self.decls.push(Decl { loc, kind, doc: None });
        id
    }

    pub fn make_decl_with_doc(&mut self, loc: Loc, kind: DeclKind, doc: DocComment) -> DeclId {
        let id = self.make_decl(loc, kind);
        self.decls[id.index()].doc = doc;
        id
    }

    pub fn make_init(&mut self, loc: Loc, kind: InitKind) -> InitId {
        let id = InitId(self.inits.len() as u32);
        self.inits.push(Init { loc, kind });
        id
    }

    pub fn expr(&self, id: ExprId) -> &Expr {
        &self.exprs[id.index()]
    }

    pub fn ty(&self, id: TypeId) -> &Type {
        &self.types[id.index()]
    }

    pub fn stmt(&self, id: StmtId) -> &Stmt {
        &self.stmts[id.index()]
    }

    pub fn decl(&self, id: DeclId) -> &Decl {
        &self.decls[id.index()]
    }

    /// Mutable access for the parser's attribute merging.
    pub fn decl_mut(&mut self, id: DeclId) -> &mut Decl {
        &mut self.decls[id.index()]
    }

    pub fn init(&self, id: InitId) -> &Init {
        &self.inits[id.index()]
    }

    /// Attach a doc comment to a declared symbol; the first comment wins so
    /// one comment never documents two symbols.
    pub fn set_doc(&mut self, id: DeclId, doc: DocComment) {
        let slot = &mut self.decls[id.index()].doc;
        if slot.is_none() {
            *slot = doc;
        }
    }

    pub fn expr_count(&self) -> usize {
        self.exprs.len()
    }

    pub fn decl_count(&self) -> usize {
        self.decls.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arena_hands_out_sequential_ids() {
        let mut ast = Ast::new();
        let a = ast.make_expr(Loc::initial(), ExprKind::Dollar);
        let b = ast.make_expr(Loc::initial(), ExprKind::Null);
        assert_eq!(a, ExprId(0));
        assert_eq!(b, ExprId(1));
        assert_eq!(ast.expr(b).kind, ExprKind::Null);
    }

    #[test]
    fn doc_attaches_once() {
        let mut ast = Ast::new();
        let d = ast.make_decl(
            Loc::initial(),
            DeclKind::Module {
                packages: vec![],
                ident: dfront_ident::Interner::new().intern("m"),
                is_deprecated: false,
                dep_msg: None,
            },
        );
        ast.set_doc(d, Some("first".into()));
        ast.set_doc(d, Some("second".into()));
        assert_eq!(ast.decl(d).doc.as_deref(), Some("first"));
    }
}
