//! Syntactic pretty-printer over the arena.
//!
//! Renders every node kind the parser builds back to D source. Expressions
//! are parenthesised from the precedence table alone, which makes the output
//! a fixed point: parsing the printed form and printing again yields the
//! same string. The round-trip tests lean on that.

use dfront_ident::{Ident, Interner};
use dfront_token::{Token, TokenKind, TokenValue};

use crate::ast::*;
use crate::attributes::{Linkage, Protection, StorageClass};
use crate::precedence::{Prec, binop_prec, expr_prec};

/// Pretty-printer for one parsed tree.
pub struct Printer<'a> {
    ast: &'a Ast,
    interner: &'a Interner,
    out: String,
}

impl<'a> Printer<'a> {
    pub fn new(ast: &'a Ast, interner: &'a Interner) -> Self {
        Printer { ast, interner, out: String::new() }
    }

    /// Render a whole module: header first, then the top-level declarations.
    pub fn module(mut self, decls: &[DeclId]) -> String {
        if let Some(module_decl) = self.ast.module_decl {
            let module_attrs = self.ast.module_attributes.clone();
            for &attr in &module_attrs {
                self.push("@(");
                self.expr(attr, Prec::Assign);
                self.push(") ");
            }
            self.decl(module_decl, 0);
        }
        for &d in decls {
            self.decl(d, 0);
        }
        self.out
    }

    /// Render a single expression.
    pub fn expression(mut self, e: ExprId) -> String {
        self.expr(e, Prec::Expr);
        self.out
    }

    /// Render a single declaration.
    pub fn declaration(mut self, d: DeclId) -> String {
        self.decl(d, 0);
        self.out
    }

    fn push(&mut self, s: &str) {
        self.out.push_str(s);
    }

    fn indent(&mut self, depth: usize) {
        for _ in 0..depth {
            self.out.push_str("    ");
        }
    }

    fn name(&self, ident: Ident) -> &str {
        self.interner.name(ident)
    }

    fn ident(&mut self, ident: Ident) {
        let name = self.interner.name(ident).to_string();
        self.push(&name);
    }

    // ————————————————————————— expressions —————————————————————————

    fn expr(&mut self, id: ExprId, ctx: Prec) {
        let node = self.ast.expr(id);
        let prec = expr_prec(&node.kind);
        let need_parens = prec < ctx;
        if need_parens {
            self.push("(");
        }
        self.expr_bare(id);
        if need_parens {
            self.push(")");
        }
    }

    fn expr_bare(&mut self, id: ExprId) {
        let kind = self.ast.expr(id).kind.clone();
        match kind {
            ExprKind::Error => self.push("__error"),
            ExprKind::Ident(ident) => self.ident(ident),
            ExprKind::ScopeTemplate { ident, args } => {
                self.ident(ident);
                self.template_args(&args);
            }
            ExprKind::ModuleScope { ident, args } => {
                self.push(".");
                self.ident(ident);
                if let Some(args) = args {
                    self.template_args(&args);
                }
            }
            ExprKind::Dollar => self.push("$"),
            ExprKind::This => self.push("this"),
            ExprKind::Super => self.push("super"),
            ExprKind::Null => self.push("null"),
            ExprKind::True => self.push("true"),
            ExprKind::False => self.push("false"),
            ExprKind::SpecialKeyword(kind) => self.push(kind.as_str()),
            ExprKind::IntLiteral { value, kind } => self.int_literal(value, kind),
            ExprKind::FloatLiteral { value, kind } => self.float_literal(value, kind),
            ExprKind::CharLiteral { value, .. } => self.char_literal(value),
            ExprKind::StringLiteral { bytes, postfix } => self.string_literal(&bytes, postfix),
            ExprKind::ArrayLiteral { elements } => {
                self.push("[");
                self.comma_exprs(&elements);
                self.push("]");
            }
            ExprKind::AssocArrayLiteral { keys, values } => {
                self.push("[");
                for (i, (&k, &v)) in keys.iter().zip(values.iter()).enumerate() {
                    if i > 0 {
                        self.push(", ");
                    }
                    self.expr(k, Prec::Assign);
                    self.push(": ");
                    self.expr(v, Prec::Assign);
                }
                self.push("]");
            }
            ExprKind::TypeRef(ty) => self.type_(ty),
            ExprKind::TypeDotId { ty, ident, args } => {
                self.type_(ty);
                self.push(".");
                self.ident(ident);
                if let Some(args) = args {
                    self.template_args(&args);
                }
            }
            ExprKind::Typeid { arg } => {
                self.push("typeid(");
                self.type_or_expr(&arg);
                self.push(")");
            }
            ExprKind::Traits { ident, args } => {
                self.push("__traits(");
                self.ident(ident);
                for arg in &args {
                    self.push(", ");
                    self.type_or_expr(arg);
                }
                self.push(")");
            }
            ExprKind::Is { ty, ident, spec, spec_type, spec_keyword, spec_arg_types, params } => {
                self.push("is(");
                self.type_(ty);
                if let Some(ident) = ident {
                    self.push(" ");
                    self.ident(ident);
                }
                if let Some(spec) = spec {
                    self.push(match spec {
                        IsSpec::Colon => " : ",
                        IsSpec::Equal => " == ",
                    });
                    if let Some(spec_type) = spec_type {
                        self.type_(spec_type);
                    } else if let Some(keyword) = spec_keyword {
                        self.push(keyword.as_str());
                    } else if spec_arg_types {
                        self.push("__argTypes");
                    }
                }
                for param in &params {
                    self.push(", ");
                    self.template_param(param);
                }
                self.push(")");
            }
            ExprKind::Assert { expr, msg } => {
                self.push("assert(");
                self.expr(expr, Prec::Assign);
                if let Some(msg) = msg {
                    self.push(", ");
                    self.expr(msg, Prec::Assign);
                }
                self.push(")");
            }
            ExprKind::MixinExpr { args } => {
                self.push("mixin(");
                self.type_or_exprs(&args);
                self.push(")");
            }
            ExprKind::ImportString { expr } => {
                self.push("import(");
                self.expr(expr, Prec::Assign);
                self.push(")");
            }
            ExprKind::New { ty, args } => {
                self.push("new ");
                self.type_(ty);
                if !args.is_empty() {
                    self.push("(");
                    self.comma_exprs(&args);
                    self.push(")");
                }
            }
            ExprKind::NewAnonClass { args, decl } => {
                self.push("new class");
                if !args.is_empty() {
                    self.push("(");
                    self.comma_exprs(&args);
                    self.push(")");
                }
                let (bases, members) = match &self.ast.decl(decl).kind {
                    DeclKind::Aggregate { bases, members, .. } => {
                        (bases.clone(), members.clone().unwrap_or_default())
                    }
                    _ => (Vec::new(), Vec::new()),
                };
                for (i, &base) in bases.iter().enumerate() {
                    self.push(if i == 0 { " : " } else { ", " });
                    self.type_(base);
                }
                self.push(" {\n");
                for &member in &members {
                    self.decl(member, 1);
                }
                self.push("}");
            }
            ExprKind::FuncLiteral { decl } => self.func_literal(decl),
            ExprKind::Unary { op, expr } => {
                self.push(op.as_str());
                let before = self.out.len();
                self.expr(expr, Prec::Pow);
                // keep `- -a` from fusing into `--a`
                let op_last = op.as_str().as_bytes().last().copied();
                if self.out.as_bytes().get(before).copied() == op_last {
                    self.out.insert(before, ' ');
                }
            }
            ExprKind::Cast { ty, mods, expr } => {
                self.push("cast(");
                if let Some(ty) = ty {
                    self.type_(ty);
                } else {
                    let names = mods.names().join(" ");
                    self.push(&names);
                }
                self.push(")");
                self.expr(expr, Prec::Unary);
            }
            ExprKind::Delete { expr } => {
                self.push("delete ");
                self.expr(expr, Prec::Unary);
            }
            ExprKind::Binary { op, lhs, rhs } => {
                let prec = binop_prec(op);
                let (lhs_ctx, rhs_ctx) = match op {
                    // right associative, binds tighter than unary on the left
                    BinOp::Pow => (Prec::Postfix, Prec::Pow),
                    _ => (prec, next_tighter(prec)),
                };
                self.expr(lhs, lhs_ctx);
                self.push(" ");
                self.push(op.as_str());
                self.push(" ");
                self.expr(rhs, rhs_ctx);
            }
            ExprKind::Cond { cond, when_true, when_false } => {
                self.expr(cond, Prec::OrOr);
                self.push(" ? ");
                self.expr(when_true, Prec::Cond);
                self.push(" : ");
                self.expr(when_false, Prec::Cond);
            }
            ExprKind::Assign { lhs, rhs } => {
                self.expr(lhs, Prec::Cond);
                self.push(" = ");
                self.expr(rhs, Prec::Assign);
            }
            ExprKind::BinAssign { op, lhs, rhs } => {
                self.expr(lhs, Prec::Cond);
                self.push(" ");
                self.push(op.as_str());
                self.push("= ");
                self.expr(rhs, Prec::Assign);
            }
            ExprKind::Comma { lhs, rhs } => {
                self.expr(lhs, Prec::Expr);
                self.push(", ");
                self.expr(rhs, Prec::Assign);
            }
            ExprKind::DotId { lhs, ident, args } => {
                self.expr(lhs, Prec::Postfix);
                self.push(".");
                self.ident(ident);
                if let Some(args) = args {
                    self.template_args(&args);
                }
            }
            ExprKind::DotNew { lhs, new } => {
                self.expr(lhs, Prec::Postfix);
                self.push(".");
                self.expr(new, Prec::Primary);
            }
            ExprKind::PostInc { expr } => {
                self.expr(expr, Prec::Postfix);
                self.push("++");
            }
            ExprKind::PostDec { expr } => {
                self.expr(expr, Prec::Postfix);
                self.push("--");
            }
            ExprKind::Call { callee, args } => {
                self.expr(callee, Prec::Postfix);
                self.push("(");
                self.comma_exprs(&args);
                self.push(")");
            }
            ExprKind::Index { base, args } => {
                self.expr(base, Prec::Postfix);
                self.push("[");
                self.comma_exprs(&args);
                self.push("]");
            }
            ExprKind::Slice { base, lwr, upr } => {
                self.expr(base, Prec::Postfix);
                self.push("[");
                if let (Some(lwr), Some(upr)) = (lwr, upr) {
                    self.expr(lwr, Prec::Assign);
                    self.push(" .. ");
                    self.expr(upr, Prec::Assign);
                }
                self.push("]");
            }
            ExprKind::Interval { lwr, upr } => {
                self.expr(lwr, Prec::Assign);
                self.push(" .. ");
                self.expr(upr, Prec::Assign);
            }
        }
    }

    fn comma_exprs(&mut self, exprs: &[ExprId]) {
        for (i, &e) in exprs.iter().enumerate() {
            if i > 0 {
                self.push(", ");
            }
            self.expr(e, Prec::Assign);
        }
    }

    fn int_literal(&mut self, value: u64, kind: TokenKind) {
        self.push(&value.to_string());
        match kind {
            TokenKind::Uint32Literal => self.push("u"),
            TokenKind::Int64Literal => self.push("L"),
            TokenKind::Uint64Literal => self.push("LU"),
            _ => {}
        }
    }

    fn float_literal(&mut self, value: f64, kind: TokenKind) {
        // {:?} prints the shortest digits that round-trip the value
        let mut text = format!("{value:?}");
        if !text.contains(['.', 'e', 'E']) {
            text.push_str(".0");
        }
        self.push(&text);
        match kind {
            TokenKind::Float32Literal => self.push("f"),
            TokenKind::Float80Literal => self.push("L"),
            TokenKind::Imaginary32Literal => self.push("fi"),
            TokenKind::Imaginary64Literal => self.push("i"),
            TokenKind::Imaginary80Literal => self.push("Li"),
            _ => {}
        }
    }

    fn char_literal(&mut self, value: u32) {
        match char::from_u32(value) {
            Some('\'') => self.push("'\\''"),
            Some('\\') => self.push("'\\\\'"),
            Some('\n') => self.push("'\\n'"),
            Some('\r') => self.push("'\\r'"),
            Some('\t') => self.push("'\\t'"),
            Some(c) if (c as u32) >= 0x20 && (c as u32) < 0x7f => {
                self.push(&format!("'{c}'"));
            }
            Some(c) if (c as u32) > 0xFFFF => self.push(&format!("'\\U{:08X}'", c as u32)),
            Some(c) if (c as u32) > 0x7f => self.push(&format!("'\\u{:04X}'", c as u32)),
            _ => self.push(&format!("'\\x{value:02x}'")),
        }
    }

    fn string_literal(&mut self, bytes: &[u8], postfix: u8) {
        self.push("\"");
        for &b in bytes {
            match b {
                b'"' => self.push("\\\""),
                b'\\' => self.push("\\\\"),
                b'\n' => self.push("\\n"),
                b'\r' => self.push("\\r"),
                b'\t' => self.push("\\t"),
                0x20..=0x7e => self.out.push(b as char),
                _ => self.push(&format!("\\x{b:02x}")),
            }
        }
        self.push("\"");
        if postfix != 0 {
            self.out.push(postfix as char);
        }
    }

    fn func_literal(&mut self, id: DeclId) {
        let (kind, params, ret, stc, body) = match &self.ast.decl(id).kind {
            DeclKind::FuncLiteral { kind, params, ret, stc, body } => {
                (*kind, params.clone(), *ret, *stc, *body)
            }
            _ => return,
        };
        match kind {
            FuncLiteralKind::Function => self.push("function "),
            FuncLiteralKind::Delegate => self.push("delegate "),
            FuncLiteralKind::Anonymous => {}
        }
        if stc.contains(StorageClass::REF) {
            self.push("ref ");
        }
        if let Some(ret) = ret {
            self.type_(ret);
            self.push(" ");
        }
        if let Some(params) = &params {
            self.params(params);
        }
        let fn_attrs = stc.without(StorageClass::REF);
        if !fn_attrs.is_empty() {
            self.push(" ");
            let names = fn_attrs.names().join(" ");
            self.push(&names);
        }
        // a bare return-statement body round-trips as the arrow form
        if let StmtKind::Return { expr: Some(e) } = self.ast.stmt(body).kind {
            self.push(" => ");
            self.expr(e, Prec::Assign);
        } else {
            self.push(" ");
            self.stmt_inline_block(body);
        }
    }

    // ———————————————————————————— types ————————————————————————————

    fn type_(&mut self, id: TypeId) {
        let kind = self.ast.ty(id).kind.clone();
        match kind {
            TypeKind::Error => self.push("__error"),
            TypeKind::Basic(kind) => self.push(kind.as_str()),
            TypeKind::Qualified { leading_dot, segments } => {
                if leading_dot {
                    self.push(".");
                }
                self.segments(&segments);
            }
            TypeKind::Typeof { arg, segments } => {
                self.push("typeof(");
                match arg {
                    TypeofArg::Expr(e) => self.expr(e, Prec::Expr),
                    TypeofArg::Return => self.push("return"),
                }
                self.push(")");
                if !segments.is_empty() {
                    self.push(".");
                    self.segments(&segments);
                }
            }
            TypeKind::TraitsType { expr } => self.expr(expr, Prec::Primary),
            TypeKind::MixinType { args } => {
                self.push("mixin(");
                self.type_or_exprs(&args);
                self.push(")");
            }
            TypeKind::Vector { base } => {
                self.push("__vector(");
                self.type_(base);
                self.push(")");
            }
            TypeKind::Pointer { next } => {
                // pointer-to-function prints in its `ret function(…)` form
                if let TypeKind::FunctionType { .. } = self.ast.ty(next).kind {
                    self.type_(next);
                } else {
                    self.type_(next);
                    self.push("*");
                }
            }
            TypeKind::DArray { next } => {
                self.type_(next);
                self.push("[]");
            }
            TypeKind::SArray { next, dim } => {
                self.type_(next);
                self.push("[");
                self.expr(dim, Prec::Assign);
                self.push("]");
            }
            TypeKind::AArray { next, key } => {
                self.type_(next);
                self.push("[");
                self.type_(key);
                self.push("]");
            }
            TypeKind::SliceType { next, lwr, upr } => {
                self.type_(next);
                self.push("[");
                self.expr(lwr, Prec::Assign);
                self.push(" .. ");
                self.expr(upr, Prec::Assign);
                self.push("]");
            }
            TypeKind::FunctionType { ret, params, stc, linkage } => {
                self.callable_type(ret, &params, stc, &linkage, "function");
            }
            TypeKind::DelegateType { ret, params, stc, linkage } => {
                self.callable_type(ret, &params, stc, &linkage, "delegate");
            }
            TypeKind::Const { next } => self.modified("const", next),
            TypeKind::Immutable { next } => self.modified("immutable", next),
            TypeKind::Shared { next } => self.modified("shared", next),
            TypeKind::Wild { next } => self.modified("inout", next),
        }
    }

    fn modified(&mut self, keyword: &str, next: TypeId) {
        self.push(keyword);
        self.push("(");
        self.type_(next);
        self.push(")");
    }

    fn callable_type(
        &mut self,
        ret: Option<TypeId>,
        params: &ParameterList,
        stc: StorageClass,
        linkage: &Linkage,
        keyword: &str,
    ) {
        if !matches!(linkage, Linkage::Default | Linkage::D) {
            self.push("extern (");
            self.push(linkage.as_str());
            self.push(") ");
        }
        if let Some(ret) = ret {
            self.type_(ret);
            self.push(" ");
        }
        self.push(keyword);
        self.params(params);
        if !stc.is_empty() {
            self.push(" ");
            let names = stc.names().join(" ");
            self.push(&names);
        }
    }

    fn segments(&mut self, segments: &[TypeSeg]) {
        for (i, segment) in segments.iter().enumerate() {
            if i > 0 {
                self.push(".");
            }
            self.ident(segment.ident);
            if let Some(args) = &segment.args {
                self.template_args(args);
            }
        }
    }

    fn type_or_expr(&mut self, arg: &TypeOrExpr) {
        match arg {
            TypeOrExpr::Type(ty) => self.type_(*ty),
            TypeOrExpr::Expr(e) => self.expr(*e, Prec::Assign),
        }
    }

    fn type_or_exprs(&mut self, args: &[TypeOrExpr]) {
        for (i, arg) in args.iter().enumerate() {
            if i > 0 {
                self.push(", ");
            }
            self.type_or_expr(arg);
        }
    }

    fn template_args(&mut self, args: &[TypeOrExpr]) {
        self.push("!(");
        self.type_or_exprs(args);
        self.push(")");
    }

    fn template_param(&mut self, param: &TemplateParam) {
        match param {
            TemplateParam::Type { ident, spec, default } => {
                self.ident(*ident);
                if let Some(spec) = spec {
                    self.push(" : ");
                    self.type_(*spec);
                }
                if let Some(default) = default {
                    self.push(" = ");
                    self.type_(*default);
                }
            }
            TemplateParam::This { ident, spec, default } => {
                self.push("this ");
                self.ident(*ident);
                if let Some(spec) = spec {
                    self.push(" : ");
                    self.type_(*spec);
                }
                if let Some(default) = default {
                    self.push(" = ");
                    self.type_(*default);
                }
            }
            TemplateParam::Value { ident, ty, spec, default } => {
                self.type_(*ty);
                self.push(" ");
                self.ident(*ident);
                if let Some(spec) = spec {
                    self.push(" : ");
                    self.expr(*spec, Prec::Cond);
                }
                if let Some(default) = default {
                    self.push(" = ");
                    self.expr(*default, Prec::Assign);
                }
            }
            TemplateParam::Alias { ident, ty, spec, default } => {
                self.push("alias ");
                if let Some(ty) = ty {
                    self.type_(*ty);
                    self.push(" ");
                }
                self.ident(*ident);
                if let Some(spec) = spec {
                    self.push(" : ");
                    self.type_or_expr(spec);
                }
                if let Some(default) = default {
                    self.push(" = ");
                    self.type_or_expr(default);
                }
            }
            TemplateParam::Tuple { ident } => {
                self.ident(*ident);
                self.push("...");
            }
        }
    }

    fn template_params(&mut self, params: &[TemplateParam]) {
        self.push("(");
        for (i, param) in params.iter().enumerate() {
            if i > 0 {
                self.push(", ");
            }
            self.template_param(param);
        }
        self.push(")");
    }

    fn params(&mut self, list: &ParameterList) {
        self.push("(");
        for (i, param) in list.params.iter().enumerate() {
            if i > 0 {
                self.push(", ");
            }
            if let Some(udas) = &param.udas {
                for &uda in udas {
                    self.push("@(");
                    self.expr(uda, Prec::Assign);
                    self.push(") ");
                }
            }
            if !param.stc.is_empty() {
                let names = param.stc.names().join(" ");
                self.push(&names);
                self.push(" ");
            }
            if let Some(ty) = param.ty {
                self.type_(ty);
                if param.ident.is_some() {
                    self.push(" ");
                }
            }
            if let Some(ident) = param.ident {
                self.ident(ident);
            }
            if let Some(default) = param.default_value {
                self.push(" = ");
                self.expr(default, Prec::Assign);
            }
            if i + 1 == list.params.len() && list.varargs == VarArg::TypesafeVariadic {
                self.push("...");
            }
        }
        if list.varargs == VarArg::Variadic {
            if !list.params.is_empty() {
                self.push(", ");
            }
            self.push("...");
        }
        self.push(")");
    }

    // ————————————————————————— statements ——————————————————————————

    /// Print a statement as the body of a control construct: blocks inline,
    /// everything else on its own indented line.
    fn body_stmt(&mut self, id: StmtId, depth: usize) {
        let is_block = matches!(
            self.ast.stmt(id).kind,
            StmtKind::Compound { .. } | StmtKind::Scoped { .. }
        );
        if is_block {
            self.push(" ");
            self.stmt_block(id, depth);
            self.push("\n");
        } else {
            self.push("\n");
            self.stmt(id, depth + 1);
        }
    }

    /// `{ … }` with statements indented one deeper than `depth`.
    fn stmt_block(&mut self, id: StmtId, depth: usize) {
        let stmts = self.block_stmts(id);
        self.push("{\n");
        for &s in &stmts {
            self.stmt(s, depth + 1);
        }
        self.indent(depth);
        self.push("}");
    }

    fn stmt_inline_block(&mut self, id: StmtId) {
        let stmts = self.block_stmts(id);
        self.push("{ ");
        for &s in &stmts {
            let before = self.out.len();
            self.stmt(s, 0);
            // single-line rendering inside literals
            let rendered = self.out.split_off(before);
            self.push(rendered.trim_end_matches('\n').trim_start());
            self.push(" ");
        }
        self.push("}");
    }

    fn block_stmts(&mut self, id: StmtId) -> Vec<StmtId> {
        match &self.ast.stmt(id).kind {
            StmtKind::Scoped { stmt } => self.block_stmts(*stmt),
            StmtKind::Compound { stmts } => stmts.clone(),
            _ => vec![id],
        }
    }

    fn stmt(&mut self, id: StmtId, depth: usize) {
        let kind = self.ast.stmt(id).kind.clone();
        self.indent(depth);
        match kind {
            StmtKind::Error => self.push("__error;\n"),
            StmtKind::Empty => self.push(";\n"),
            StmtKind::Expr { expr } => {
                self.expr(expr, Prec::Expr);
                self.push(";\n");
            }
            StmtKind::Decl { decl } => {
                let rendered = {
                    let mut sub = Printer::new(self.ast, self.interner);
                    sub.decl(decl, depth);
                    sub.out
                };
                // decl printing already indents
                self.out.truncate(self.out.len() - depth * 4);
                self.push(&rendered);
            }
            StmtKind::Compound { stmts } => {
                // bare statement list (no scope)
                self.out.truncate(self.out.len() - depth * 4);
                for &s in &stmts {
                    self.stmt(s, depth);
                }
            }
            StmtKind::Scoped { stmt } => {
                self.stmt_block(stmt, depth);
                self.push("\n");
            }
            StmtKind::While { cond, body } => {
                self.push("while (");
                self.expr(cond, Prec::Expr);
                self.push(")");
                self.body_stmt(body, depth);
            }
            StmtKind::DoWhile { body, cond } => {
                self.push("do");
                let is_block = matches!(
                    self.ast.stmt(body).kind,
                    StmtKind::Compound { .. } | StmtKind::Scoped { .. }
                );
                if is_block {
                    self.push(" ");
                    self.stmt_block(body, depth);
                    self.push(" ");
                } else {
                    self.push("\n");
                    self.stmt(body, depth + 1);
                    self.indent(depth);
                }
                self.push("while (");
                self.expr(cond, Prec::Expr);
                self.push(");\n");
            }
            StmtKind::For { init, cond, inc, body } => {
                self.push("for (");
                match init {
                    Some(init) => {
                        let rendered = {
                            let mut sub = Printer::new(self.ast, self.interner);
                            sub.stmt(init, 0);
                            sub.out
                        };
                        self.push(rendered.trim_end_matches('\n'));
                    }
                    None => self.push(";"),
                }
                self.push(" ");
                if let Some(cond) = cond {
                    self.expr(cond, Prec::Expr);
                }
                self.push("; ");
                if let Some(inc) = inc {
                    self.expr(inc, Prec::Expr);
                }
                self.push(")");
                self.body_stmt(body, depth);
            }
            StmtKind::Foreach { head, body } => {
                self.foreach_head(&head);
                self.body_stmt(body, depth);
            }
            StmtKind::StaticForeach { head, body } => {
                self.push("static ");
                self.foreach_head(&head);
                self.body_stmt(body, depth);
            }
            StmtKind::If { param, cond, then, else_ } => {
                self.push("if (");
                if let Some(param) = &param {
                    if !param.stc.is_empty() {
                        let names = param.stc.names().join(" ");
                        self.push(&names);
                        self.push(" ");
                    }
                    if let Some(ty) = param.ty {
                        self.type_(ty);
                        self.push(" ");
                    }
                    self.ident(param.ident);
                    self.push(" = ");
                }
                self.expr(cond, Prec::Expr);
                self.push(")");
                self.body_stmt(then, depth);
                if let Some(else_) = else_ {
                    self.indent(depth);
                    self.push("else");
                    self.body_stmt(else_, depth);
                }
            }
            StmtKind::Conditional { cond, then, else_ } => {
                self.condition(&cond);
                self.body_stmt(then, depth);
                if let Some(else_) = else_ {
                    self.indent(depth);
                    self.push("else");
                    self.body_stmt(else_, depth);
                }
            }
            StmtKind::Pragma { ident, args, body } => {
                self.push("pragma(");
                self.ident(ident);
                for &arg in &args {
                    self.push(", ");
                    self.expr(arg, Prec::Assign);
                }
                self.push(")");
                match body {
                    Some(body) => self.body_stmt(body, depth),
                    None => self.push(";\n"),
                }
            }
            StmtKind::StaticAssert { cond, msg } => {
                self.push("static assert(");
                self.expr(cond, Prec::Assign);
                if let Some(msg) = msg {
                    self.push(", ");
                    self.expr(msg, Prec::Assign);
                }
                self.push(");\n");
            }
            StmtKind::Switch { cond, body, is_final } => {
                if is_final {
                    self.push("final ");
                }
                self.push("switch (");
                self.expr(cond, Prec::Expr);
                self.push(")");
                self.body_stmt(body, depth);
            }
            StmtKind::Case { exprs, body } => {
                self.push("case ");
                self.comma_exprs(&exprs);
                self.push(":\n");
                self.case_body(body, depth);
            }
            StmtKind::CaseRange { first, last, body } => {
                self.push("case ");
                self.expr(first, Prec::Assign);
                self.push(": .. case ");
                self.expr(last, Prec::Assign);
                self.push(":\n");
                self.case_body(body, depth);
            }
            StmtKind::Default { body } => {
                self.push("default:\n");
                self.case_body(body, depth);
            }
            StmtKind::Return { expr } => {
                self.push("return");
                if let Some(expr) = expr {
                    self.push(" ");
                    self.expr(expr, Prec::Expr);
                }
                self.push(";\n");
            }
            StmtKind::Break { ident } => {
                self.push("break");
                if let Some(ident) = ident {
                    self.push(" ");
                    self.ident(ident);
                }
                self.push(";\n");
            }
            StmtKind::Continue { ident } => {
                self.push("continue");
                if let Some(ident) = ident {
                    self.push(" ");
                    self.ident(ident);
                }
                self.push(";\n");
            }
            StmtKind::Goto { target } => {
                self.push("goto ");
                match target {
                    GotoTarget::Label(ident) => self.ident(ident),
                    GotoTarget::Default => self.push("default"),
                    GotoTarget::Case(None) => self.push("case"),
                    GotoTarget::Case(Some(e)) => {
                        self.push("case ");
                        self.expr(e, Prec::Expr);
                    }
                }
                self.push(";\n");
            }
            StmtKind::Synchronized { expr, body } => {
                self.push("synchronized");
                if let Some(expr) = expr {
                    self.push(" (");
                    self.expr(expr, Prec::Expr);
                    self.push(")");
                }
                self.body_stmt(body, depth);
            }
            StmtKind::With { expr, body } => {
                self.push("with (");
                self.expr(expr, Prec::Expr);
                self.push(")");
                self.body_stmt(body, depth);
            }
            StmtKind::Try { body, catches, finally_ } => {
                self.push("try");
                self.body_stmt(body, depth);
                for catch in &catches {
                    self.indent(depth);
                    self.push("catch");
                    if let Some(ty) = catch.ty {
                        self.push(" (");
                        self.type_(ty);
                        if let Some(ident) = catch.ident {
                            self.push(" ");
                            self.ident(ident);
                        }
                        self.push(")");
                    }
                    self.body_stmt(catch.handler, depth);
                }
                if let Some(finally_) = finally_ {
                    self.indent(depth);
                    self.push("finally");
                    self.body_stmt(finally_, depth);
                }
            }
            StmtKind::Throw { expr } => {
                self.push("throw ");
                self.expr(expr, Prec::Expr);
                self.push(";\n");
            }
            StmtKind::ScopeGuard { kind, body } => {
                self.push("scope(");
                self.push(kind.as_str());
                self.push(")");
                self.body_stmt(body, depth);
            }
            StmtKind::Asm { stc, instrs } => {
                self.push("asm");
                if !stc.is_empty() {
                    self.push(" ");
                    let names = stc.names().join(" ");
                    self.push(&names);
                }
                self.push(" {\n");
                for instr in &instrs {
                    self.indent(depth + 1);
                    let text = instr
                        .tokens
                        .iter()
                        .map(|t| self.token_text(t))
                        .collect::<Vec<_>>()
                        .join(" ");
                    self.push(&text);
                    self.push(";\n");
                }
                self.indent(depth);
                self.push("}\n");
            }
            StmtKind::Mixin { args } => {
                self.push("mixin(");
                self.type_or_exprs(&args);
                self.push(");\n");
            }
            StmtKind::Label { ident, stmt } => {
                self.ident(ident);
                self.push(":\n");
                self.stmt(stmt, depth);
            }
        }
    }

    fn case_body(&mut self, body: StmtId, depth: usize) {
        let stmts = self.block_stmts(body);
        for &s in &stmts {
            self.stmt(s, depth + 1);
        }
    }

    fn foreach_head(&mut self, head: &ForeachHead) {
        self.push(if head.reverse { "foreach_reverse (" } else { "foreach (" });
        for (i, param) in head.params.iter().enumerate() {
            if i > 0 {
                self.push(", ");
            }
            if !param.stc.is_empty() {
                let names = param.stc.names().join(" ");
                self.push(&names);
                self.push(" ");
            }
            if let Some(ty) = param.ty {
                self.type_(ty);
                self.push(" ");
            }
            self.ident(param.ident);
        }
        self.push("; ");
        self.expr(head.aggr, Prec::Expr);
        if let Some(upper) = head.upper {
            self.push(" .. ");
            self.expr(upper, Prec::Expr);
        }
        self.push(")");
    }

    fn condition(&mut self, cond: &Condition) {
        match cond {
            Condition::StaticIf { cond } => {
                self.push("static if (");
                self.expr(*cond, Prec::Expr);
                self.push(")");
            }
            Condition::Debug { level, ident } => {
                self.push("debug");
                if let Some(level) = level {
                    self.push(&format!(" ({level})"));
                } else if let Some(ident) = ident {
                    self.push(" (");
                    self.ident(*ident);
                    self.push(")");
                }
            }
            Condition::Version { level, ident } => {
                self.push("version (");
                if let Some(level) = level {
                    self.push(&format!("{level}"));
                } else if let Some(ident) = ident {
                    self.ident(*ident);
                }
                self.push(")");
            }
        }
    }

    fn token_text(&self, token: &Token) -> String {
        match &token.value {
            TokenValue::Ident(ident) => self.name(*ident).to_string(),
            TokenValue::Int(value) => value.to_string(),
            TokenValue::Float(value) => format!("{value:?}"),
            TokenValue::Str { bytes, .. } => {
                format!("\"{}\"", String::from_utf8_lossy(bytes))
            }
            TokenValue::None => token.kind.as_str().to_string(),
        }
    }

    // ———————————————————————— declarations —————————————————————————

    fn decl(&mut self, id: DeclId, depth: usize) {
        let kind = self.ast.decl(id).kind.clone();
        self.indent(depth);
        match kind {
            DeclKind::Error => self.push("__error;\n"),
            DeclKind::Module { packages, ident, is_deprecated, dep_msg } => {
                if is_deprecated {
                    self.push("deprecated");
                    if let Some(msg) = dep_msg {
                        self.push("(");
                        self.expr(msg, Prec::Assign);
                        self.push(")");
                    }
                    self.push(" ");
                }
                self.push("module ");
                for &p in &packages {
                    self.ident(p);
                    self.push(".");
                }
                self.ident(ident);
                self.push(";\n");
            }
            DeclKind::Import { items, is_static } => {
                if is_static {
                    self.push("static ");
                }
                self.push("import ");
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        self.push(", ");
                    }
                    if let Some(alias) = item.alias {
                        self.ident(alias);
                        self.push(" = ");
                    }
                    for &p in &item.packages {
                        self.ident(p);
                        self.push(".");
                    }
                    self.ident(item.ident);
                    if !item.names.is_empty() {
                        self.push(" : ");
                        for (j, (alias, name)) in item.names.iter().enumerate() {
                            if j > 0 {
                                self.push(", ");
                            }
                            if let Some(alias) = alias {
                                self.ident(*alias);
                                self.push(" = ");
                            }
                            self.ident(*name);
                        }
                    }
                }
                self.push(";\n");
            }
            DeclKind::AliasThis { ident } => {
                self.push("alias ");
                self.ident(ident);
                self.push(" this;\n");
            }
            DeclKind::Var { ident, ty, init, stc } => {
                self.var_decl(ident, ty, init, stc);
            }
            DeclKind::Alias { ident, params, target, stc } => {
                if !stc.is_empty() {
                    let names = stc.names().join(" ");
                    self.push(&names);
                    self.push(" ");
                }
                self.push("alias ");
                self.ident(ident);
                if let Some(params) = &params {
                    self.template_params(params);
                }
                self.push(" = ");
                match target {
                    AliasTarget::Type(ty) => self.type_(ty),
                    AliasTarget::Expr(e) => self.expr(e, Prec::Assign),
                }
                self.push(";\n");
            }
            DeclKind::Func { ident, ty, stc, contracts, body } => {
                self.func_decl(None, ident, ty, stc, &contracts, body, depth);
            }
            DeclKind::FuncLiteral { .. } => {
                self.func_literal(id);
                self.push("\n");
            }
            DeclKind::Ctor { params, tpl_params, constraint, stc, contracts, body, is_postblit } => {
                if !stc.is_empty() {
                    let names = stc.names().join(" ");
                    self.push(&names);
                    self.push(" ");
                }
                self.push("this");
                if let Some(tpl_params) = &tpl_params {
                    self.template_params(tpl_params);
                }
                if is_postblit {
                    self.push("(this)");
                } else {
                    self.params(&params);
                }
                if let Some(constraint) = constraint {
                    self.push(" if (");
                    self.expr(constraint, Prec::Expr);
                    self.push(")");
                }
                self.fn_tail(&contracts, body, depth);
            }
            DeclKind::Dtor { stc, contracts, body } => {
                if !stc.is_empty() {
                    let names = stc.names().join(" ");
                    self.push(&names);
                    self.push(" ");
                }
                self.push("~this()");
                self.fn_tail(&contracts, body, depth);
            }
            DeclKind::StaticCtor { shared, stc, body } => {
                if shared {
                    self.push("shared ");
                }
                if !stc.is_empty() {
                    let names = stc.names().join(" ");
                    self.push(&names);
                    self.push(" ");
                }
                self.push("static this()");
                self.fn_tail(&Contracts::default(), body, depth);
            }
            DeclKind::StaticDtor { shared, stc, body } => {
                if shared {
                    self.push("shared ");
                }
                if !stc.is_empty() {
                    let names = stc.names().join(" ");
                    self.push(&names);
                    self.push(" ");
                }
                self.push("static ~this()");
                self.fn_tail(&Contracts::default(), body, depth);
            }
            DeclKind::Invariant { expr, body } => {
                self.push("invariant");
                match (expr, body) {
                    (Some(e), _) => {
                        self.push(" (");
                        self.expr(e, Prec::Assign);
                        self.push(");\n");
                    }
                    (None, Some(body)) => {
                        self.push(" ");
                        self.stmt_block(body, depth);
                        self.push("\n");
                    }
                    (None, None) => self.push(" {}\n"),
                }
            }
            DeclKind::Unittest { body } => {
                self.push("unittest ");
                self.stmt_block(body, depth);
                self.push("\n");
            }
            DeclKind::NewDecl { params, body } => {
                self.push("new");
                self.params(&params);
                self.fn_tail(&Contracts::default(), body, depth);
            }
            DeclKind::Aggregate { kind, ident, bases, members } => {
                self.aggregate(kind, ident, &bases, members.as_deref(), None, None, depth);
            }
            DeclKind::AnonAggregate { is_union, members } => {
                self.push(if is_union { "union {\n" } else { "struct {\n" });
                for &member in &members {
                    self.decl(member, depth + 1);
                }
                self.indent(depth);
                self.push("}\n");
            }
            DeclKind::Enum { ident, memtype, members } => {
                self.push("enum");
                if let Some(ident) = ident {
                    self.push(" ");
                    self.ident(ident);
                }
                if let Some(memtype) = memtype {
                    self.push(" : ");
                    self.type_(memtype);
                }
                match members {
                    None => self.push(";\n"),
                    Some(members) => {
                        self.push(" {\n");
                        for member in &members {
                            self.indent(depth + 1);
                            if let Some(udas) = &member.udas {
                                for &uda in udas {
                                    self.push("@(");
                                    self.expr(uda, Prec::Assign);
                                    self.push(") ");
                                }
                            }
                            if let Some(ty) = member.ty {
                                self.type_(ty);
                                self.push(" ");
                            }
                            self.ident(member.ident);
                            if let Some(value) = member.value {
                                self.push(" = ");
                                self.expr(value, Prec::Assign);
                            }
                            self.push(",\n");
                        }
                        self.indent(depth);
                        self.push("}\n");
                    }
                }
            }
            DeclKind::Template { ident, params, constraint, members, is_mixin } => {
                // eponymous single-member templates round-trip in the sugared
                // form they were written in
                if !is_mixin && members.len() == 1 {
                    let member = members[0];
                    match self.ast.decl(member).kind.clone() {
                        DeclKind::Aggregate {
                            kind,
                            ident: Some(agg_ident),
                            bases,
                            members: agg_members,
                        } if agg_ident == ident => {
                            self.aggregate(
                                kind,
                                Some(agg_ident),
                                &bases,
                                agg_members.as_deref(),
                                Some(&params),
                                constraint,
                                depth,
                            );
                            return;
                        }
                        DeclKind::Func { ident: fn_ident, ty, stc, contracts, body }
                            if fn_ident == ident =>
                        {
                            self.out.truncate(self.out.len() - depth * 4);
                            self.indent(depth);
                            self.func_decl_tpl(
                                Some(&params),
                                constraint,
                                fn_ident,
                                ty,
                                stc,
                                &contracts,
                                body,
                                depth,
                            );
                            return;
                        }
                        _ => {}
                    }
                }
                if is_mixin {
                    self.push("mixin ");
                }
                self.push("template ");
                self.ident(ident);
                self.template_params(&params);
                if let Some(constraint) = constraint {
                    self.push(" if (");
                    self.expr(constraint, Prec::Expr);
                    self.push(")");
                }
                self.push(" {\n");
                for &member in &members {
                    self.decl(member, depth + 1);
                }
                self.indent(depth);
                self.push("}\n");
            }
            DeclKind::TemplateMixin { segments, leading_dot, ident } => {
                self.push("mixin ");
                if leading_dot {
                    self.push(".");
                }
                self.segments(&segments);
                if let Some(ident) = ident {
                    self.push(" ");
                    self.ident(ident);
                }
                self.push(";\n");
            }
            DeclKind::MixinDecl { args } => {
                self.push("mixin(");
                self.type_or_exprs(&args);
                self.push(");\n");
            }
            DeclKind::StaticAssert { cond, msg } => {
                self.push("static assert(");
                self.expr(cond, Prec::Assign);
                if let Some(msg) = msg {
                    self.push(", ");
                    self.expr(msg, Prec::Assign);
                }
                self.push(");\n");
            }
            DeclKind::VersionSymbol { is_debug, level, ident } => {
                self.push(if is_debug { "debug = " } else { "version = " });
                if let Some(level) = level {
                    self.push(&format!("{level}"));
                } else if let Some(ident) = ident {
                    self.ident(ident);
                }
                self.push(";\n");
            }
            DeclKind::StorageClassDecl { stc, decls } => {
                let names = stc.names().join(" ");
                self.push(&names);
                self.attrib_body(&decls, depth);
            }
            DeclKind::DeprecatedDecl { msg, decls } => {
                self.push("deprecated");
                if let Some(msg) = msg {
                    self.push("(");
                    self.expr(msg, Prec::Assign);
                    self.push(")");
                }
                self.attrib_body(&decls, depth);
            }
            DeclKind::LinkageDecl { linkage, cpp_mangle, namespaces, namespace_exprs, decls } => {
                self.push("extern (");
                self.push(linkage.as_str());
                match cpp_mangle {
                    crate::attributes::CppMangle::AsStruct => self.push(", struct"),
                    crate::attributes::CppMangle::AsClass => self.push(", class"),
                    crate::attributes::CppMangle::Default => {}
                }
                if let Some(namespaces) = &namespaces {
                    for &ns in namespaces {
                        self.push(", ");
                        self.ident(ns);
                    }
                }
                if let Some(exprs) = &namespace_exprs {
                    for &e in exprs {
                        self.push(", ");
                        self.expr(e, Prec::Assign);
                    }
                }
                self.push(")");
                self.attrib_body(&decls, depth);
            }
            DeclKind::ProtectionDecl { protection, decls } => {
                self.push(protection.keyword());
                if let Protection::Package(path) = &protection {
                    if !path.is_empty() {
                        self.push("(");
                        for (i, &p) in path.iter().enumerate() {
                            if i > 0 {
                                self.push(".");
                            }
                            self.ident(p);
                        }
                        self.push(")");
                    }
                }
                self.attrib_body(&decls, depth);
            }
            DeclKind::AlignDecl { alignment, decls } => {
                self.push("align");
                if let Some(alignment) = alignment {
                    self.push("(");
                    self.expr(alignment, Prec::Assign);
                    self.push(")");
                }
                self.attrib_body(&decls, depth);
            }
            DeclKind::UserAttributeDecl { attrs, decls } => {
                for &attr in &attrs {
                    self.push("@(");
                    self.expr(attr, Prec::Assign);
                    self.push(") ");
                }
                self.out.truncate(self.out.len() - 1);
                self.attrib_body(&decls, depth);
            }
            DeclKind::PragmaDecl { ident, args, decls } => {
                self.push("pragma(");
                self.ident(ident);
                for &arg in &args {
                    self.push(", ");
                    self.expr(arg, Prec::Assign);
                }
                self.push(")");
                if decls.is_empty() {
                    self.push(";\n");
                } else {
                    self.attrib_body(&decls, depth);
                }
            }
            DeclKind::Conditional { cond, then, else_ } => {
                self.condition(&cond);
                self.push(" {\n");
                for &d in &then {
                    self.decl(d, depth + 1);
                }
                self.indent(depth);
                self.push("}");
                if let Some(else_) = else_ {
                    self.push(" else {\n");
                    for &d in &else_ {
                        self.decl(d, depth + 1);
                    }
                    self.indent(depth);
                    self.push("}");
                }
                self.push("\n");
            }
            DeclKind::StaticForeachDecl { head, decls } => {
                self.push("static ");
                self.foreach_head(&head);
                self.push(" {\n");
                for &d in &decls {
                    self.decl(d, depth + 1);
                }
                self.indent(depth);
                self.push("}\n");
            }
        }
    }

    fn attrib_body(&mut self, decls: &[DeclId], depth: usize) {
        if decls.len() == 1 {
            self.push(" ");
            let rendered = {
                let mut sub = Printer::new(self.ast, self.interner);
                sub.decl(decls[0], depth);
                sub.out
            };
            self.push(rendered[depth * 4..].trim_start_matches(' '));
        } else {
            self.push(" {\n");
            for &d in decls {
                self.decl(d, depth + 1);
            }
            self.indent(depth);
            self.push("}\n");
        }
    }

    fn var_decl(&mut self, ident: Ident, ty: Option<TypeId>, init: Option<InitId>, stc: StorageClass) {
        if !stc.is_empty() {
            let names = stc.names().join(" ");
            self.push(&names);
            self.push(" ");
        }
        if let Some(ty) = ty {
            self.type_(ty);
            self.push(" ");
        } else if stc.is_empty() {
            self.push("auto ");
        }
        self.ident(ident);
        if let Some(init) = init {
            self.push(" = ");
            self.init(init);
        }
        self.push(";\n");
    }

    #[allow(clippy::too_many_arguments)]
    fn func_decl_tpl(
        &mut self,
        tpl_params: Option<&[TemplateParam]>,
        constraint: Option<ExprId>,
        ident: Ident,
        ty: TypeId,
        stc: StorageClass,
        contracts: &Contracts,
        body: Option<StmtId>,
        depth: usize,
    ) {
        let (ret, params, fn_stc, linkage) = match self.ast.ty(ty).kind.clone() {
            TypeKind::FunctionType { ret, params, stc, linkage } => (ret, params, stc, linkage),
            _ => (None, ParameterList::default(), StorageClass::UNDEFINED, Linkage::Default),
        };
        let _ = linkage;
        if !stc.is_empty() {
            let names = stc.names().join(" ");
            self.push(&names);
            self.push(" ");
        }
        match ret {
            Some(ret) => {
                self.type_(ret);
                self.push(" ");
            }
            None if stc.is_empty() => self.push("auto "),
            None => {}
        }
        self.ident(ident);
        if let Some(tpl_params) = tpl_params {
            self.template_params(tpl_params);
        }
        self.params(&params);
        if !fn_stc.is_empty() {
            self.push(" ");
            let names = fn_stc.names().join(" ");
            self.push(&names);
        }
        if let Some(constraint) = constraint {
            self.push(" if (");
            self.expr(constraint, Prec::Expr);
            self.push(")");
        }
        self.fn_tail(contracts, body, depth);
    }

    fn func_decl(
        &mut self,
        tpl_params: Option<&[TemplateParam]>,
        ident: Ident,
        ty: TypeId,
        stc: StorageClass,
        contracts: &Contracts,
        body: Option<StmtId>,
        depth: usize,
    ) {
        self.func_decl_tpl(tpl_params, None, ident, ty, stc, contracts, body, depth);
    }

    fn fn_tail(&mut self, contracts: &Contracts, body: Option<StmtId>, depth: usize) {
        for contract in &contracts.requires {
            self.push("\n");
            self.indent(depth);
            match contract {
                Contract::Block(block) => {
                    self.push("in ");
                    self.stmt_block(*block, depth);
                }
                Contract::Expr { expr, msg } => {
                    self.push("in (");
                    self.expr(*expr, Prec::Assign);
                    if let Some(msg) = msg {
                        self.push(", ");
                        self.expr(*msg, Prec::Assign);
                    }
                    self.push(")");
                }
            }
        }
        for ensure in &contracts.ensures {
            self.push("\n");
            self.indent(depth);
            match &ensure.contract {
                Contract::Block(block) => {
                    self.push("out");
                    if let Some(ident) = ensure.ident {
                        self.push(" (");
                        self.ident(ident);
                        self.push(")");
                    }
                    self.push(" ");
                    self.stmt_block(*block, depth);
                }
                Contract::Expr { expr, msg } => {
                    self.push("out (");
                    if let Some(ident) = ensure.ident {
                        self.ident(ident);
                    }
                    self.push("; ");
                    self.expr(*expr, Prec::Assign);
                    if let Some(msg) = msg {
                        self.push(", ");
                        self.expr(*msg, Prec::Assign);
                    }
                    self.push(")");
                }
            }
        }
        match body {
            Some(body) => {
                if contracts.is_empty() {
                    self.push(" ");
                } else {
                    self.push("\n");
                    self.indent(depth);
                    self.push("do ");
                }
                self.stmt_block(body, depth);
                self.push("\n");
            }
            None => self.push(";\n"),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn aggregate(
        &mut self,
        kind: AggregateKind,
        ident: Option<Ident>,
        bases: &[TypeId],
        members: Option<&[DeclId]>,
        tpl_params: Option<&[TemplateParam]>,
        constraint: Option<ExprId>,
        depth: usize,
    ) {
        self.push(kind.keyword());
        if let Some(ident) = ident {
            self.push(" ");
            self.ident(ident);
        }
        if let Some(tpl_params) = tpl_params {
            self.template_params(tpl_params);
        }
        if let Some(constraint) = constraint {
            self.push(" if (");
            self.expr(constraint, Prec::Expr);
            self.push(")");
        }
        for (i, &base) in bases.iter().enumerate() {
            self.push(if i == 0 { " : " } else { ", " });
            self.type_(base);
        }
        match members {
            None => self.push(";\n"),
            Some(members) => {
                self.push(" {\n");
                for &member in members {
                    self.decl(member, depth + 1);
                }
                self.indent(depth);
                self.push("}\n");
            }
        }
    }

    // ———————————————————————— initializers —————————————————————————

    fn init(&mut self, id: InitId) {
        let kind = self.ast.init(id).kind.clone();
        match kind {
            InitKind::Error => self.push("__error"),
            InitKind::Void => self.push("void"),
            InitKind::Expr { expr } => self.expr(expr, Prec::Assign),
            InitKind::Struct { fields } => {
                self.push("{");
                for (i, (ident, init)) in fields.iter().enumerate() {
                    if i > 0 {
                        self.push(", ");
                    } else {
                        self.push(" ");
                    }
                    if let Some(ident) = ident {
                        self.ident(*ident);
                        self.push(": ");
                    }
                    self.init(*init);
                }
                self.push(" }");
            }
            InitKind::Array { items } => {
                self.push("[");
                for (i, (index, init)) in items.iter().enumerate() {
                    if i > 0 {
                        self.push(", ");
                    }
                    if let Some(index) = index {
                        self.expr(*index, Prec::Assign);
                        self.push(": ");
                    }
                    self.init(*init);
                }
                self.push("]");
            }
        }
    }
}

/// The next-tighter level, for left-associative right operands.
fn next_tighter(prec: Prec) -> Prec {
    match prec {
        Prec::Expr => Prec::Assign,
        Prec::Assign => Prec::Cond,
        Prec::Cond => Prec::OrOr,
        Prec::OrOr => Prec::AndAnd,
        Prec::AndAnd => Prec::Or,
        Prec::Or => Prec::Xor,
        Prec::Xor => Prec::And,
        Prec::And => Prec::Rel,
        Prec::Rel => Prec::Shift,
        Prec::Shift => Prec::Add,
        Prec::Add => Prec::Mul,
        Prec::Mul => Prec::Pow,
        Prec::Pow => Prec::Unary,
        Prec::Unary => Prec::Postfix,
        Prec::Postfix => Prec::Primary,
        _ => Prec::Primary,
    }
}
