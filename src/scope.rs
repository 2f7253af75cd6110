//! Lexical scope tracking over the source tree.
//!
//! `inspect_mut` drives a single mutable pre-order descent. The walker owns
//! all scope bookkeeping: declarations are recorded in the scope current at
//! their node, scope-introducing constructs push a frame for their subtree,
//! and the callback observes the scope exactly as of the visited node.
//! Returning `false` from the callback skips the node's subtree.

use std::collections::HashMap;

use crate::imports;
use crate::syntax::ast::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclKind {
    Func,
    Param,
    Var,
    Type,
    Import,
    Assign,
}

/// A stack of lexical scopes, innermost last.
#[derive(Debug)]
pub struct ScopeStack {
    frames: Vec<HashMap<String, DeclKind>>,
}

impl ScopeStack {
    pub fn new() -> ScopeStack {
        ScopeStack {
            frames: vec![HashMap::new()],
        }
    }

    fn push(&mut self) {
        self.frames.push(HashMap::new());
    }

    fn pop(&mut self) {
        self.frames.pop();
    }

    fn declare(&mut self, name: &str, kind: DeclKind) {
        if let Some(frame) = self.frames.last_mut() {
            frame.insert(name.to_string(), kind);
        }
    }

    /// Whether `name` is declared in this scope or any enclosing one.
    pub fn has_decl(&self, name: &str) -> bool {
        self.get_decl(name).is_some()
    }

    pub fn get_decl(&self, name: &str) -> Option<DeclKind> {
        self.frames
            .iter()
            .rev()
            .find_map(|frame| frame.get(name).copied())
    }
}

/// A mutable view of one visited node.
pub enum NodeMut<'a> {
    Import(&'a mut ImportSpec),
    Func(&'a mut FuncDecl),
    Field(&'a mut Field),
    Value(&'a mut ValueSpec),
    Type(&'a mut TypeSpec),
    Assign(&'a mut AssignStmt),
    Expr(&'a mut Expr),
}

pub fn inspect_mut<F>(file: &mut File, f: F)
where
    F: FnMut(NodeMut<'_>, &ScopeStack) -> bool,
{
    let mut walker = Walker {
        scope: ScopeStack::new(),
        f,
    };
    walker.file(file);
}

struct Walker<F> {
    scope: ScopeStack,
    f: F,
}

impl<F> Walker<F>
where
    F: FnMut(NodeMut<'_>, &ScopeStack) -> bool,
{
    fn visit(&mut self, node: NodeMut<'_>) -> bool {
        (self.f)(node, &self.scope)
    }

    fn file(&mut self, file: &mut File) {
        for imp in &mut file.imports {
            self.scope
                .declare(&imports::effective_name(imp), DeclKind::Import);
            self.visit(NodeMut::Import(imp));
        }
        for decl in &mut file.decls {
            match decl {
                Decl::Func(func) => self.func_decl(func),
                Decl::Value(value) => self.value_spec(&mut value.spec),
                Decl::Type(ty) => self.type_spec(&mut ty.spec),
            }
        }
    }

    fn func_decl(&mut self, func: &mut FuncDecl) {
        self.scope.declare(&func.name, DeclKind::Func);
        self.scope.push();
        if self.visit(NodeMut::Func(&mut *func)) {
            if let Some(receiver) = &mut func.receiver {
                self.field(receiver);
            }
            self.func_type(&mut func.func_type);
            if let Some(body) = &mut func.body {
                self.block(body);
            }
        }
        self.scope.pop();
    }

    fn func_type(&mut self, func_type: &mut FuncType) {
        for field in func_type.params.iter().chain(&func_type.results) {
            for name in &field.names {
                self.scope.declare(name, DeclKind::Param);
            }
        }
        for field in func_type.params.iter_mut().chain(&mut func_type.results) {
            self.field(field);
        }
    }

    fn field(&mut self, field: &mut Field) {
        if self.visit(NodeMut::Field(&mut *field)) {
            self.expr(&mut field.ty);
        }
    }

    fn value_spec(&mut self, spec: &mut ValueSpec) {
        for name in &spec.names {
            self.scope.declare(name, DeclKind::Var);
        }
        if self.visit(NodeMut::Value(&mut *spec)) {
            if let Some(ty) = &mut spec.ty {
                self.expr(ty);
            }
            for value in &mut spec.values {
                self.expr(value);
            }
        }
    }

    fn type_spec(&mut self, spec: &mut TypeSpec) {
        self.scope.declare(&spec.name, DeclKind::Type);
        if self.visit(NodeMut::Type(&mut *spec)) {
            self.expr(&mut spec.ty);
        }
    }

    fn block(&mut self, block: &mut Block) {
        self.scope.push();
        for stmt in &mut block.stmts {
            self.stmt(stmt);
        }
        self.scope.pop();
    }

    fn stmt(&mut self, stmt: &mut Stmt) {
        match stmt {
            Stmt::Value(spec) => self.value_spec(spec),
            Stmt::Type(spec) => self.type_spec(spec),
            Stmt::Assign(assign) => self.assign(assign),
            Stmt::Expr(expr) => self.expr(expr),
            Stmt::Return(exprs) => {
                for expr in exprs {
                    self.expr(expr);
                }
            }
            Stmt::If(stmt) => self.if_stmt(stmt),
            Stmt::Block(block) => self.block(block),
        }
    }

    fn assign(&mut self, assign: &mut AssignStmt) {
        for lhs in &assign.lhs {
            if let Expr::Ident(name) = lhs {
                self.scope.declare(name, DeclKind::Assign);
            }
        }
        if self.visit(NodeMut::Assign(&mut *assign)) {
            for expr in assign.lhs.iter_mut().chain(&mut assign.rhs) {
                self.expr(expr);
            }
        }
    }

    fn if_stmt(&mut self, stmt: &mut IfStmt) {
        if let Some(init) = &mut stmt.init {
            self.stmt(init);
        }
        self.expr(&mut stmt.cond);
        self.block(&mut stmt.then);
        if let Some(els) = &mut stmt.els {
            self.stmt(els);
        }
    }

    fn expr(&mut self, expr: &mut Expr) {
        if !self.visit(NodeMut::Expr(&mut *expr)) {
            return;
        }
        match expr {
            Expr::Ident(_) | Expr::BasicLit(_) => {}
            Expr::Selector { x, .. } => self.expr(x),
            Expr::Call { fun, args } => {
                self.expr(fun);
                for arg in args {
                    self.expr(arg);
                }
            }
            Expr::Star(x) | Expr::Paren(x) | Expr::Ellipsis(x) => self.expr(x),
            Expr::Unary { x, .. } => self.expr(x),
            Expr::Binary { x, y, .. } => {
                self.expr(x);
                self.expr(y);
            }
            Expr::ArrayType { len, elt } => {
                if let Some(len) = len {
                    self.expr(len);
                }
                self.expr(elt);
            }
            Expr::ChanType { value, .. } => self.expr(value),
            Expr::MapType { key, value } => {
                self.expr(key);
                self.expr(value);
            }
            Expr::StructType { fields } => {
                for field in fields {
                    self.field(field);
                }
            }
            Expr::FuncLit { func_type, body } => {
                self.func_type(func_type);
                self.block(body);
            }
            Expr::Composite { ty, elts } => {
                if let Some(ty) = ty {
                    self.expr(ty);
                }
                for elt in elts {
                    if let Some(key) = &mut elt.key {
                        self.expr(key);
                    }
                    self.expr(&mut elt.value);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::parse_file;

    fn qualifiers_seen_unshadowed(src: &str, name: &str) -> Vec<String> {
        let mut file = parse_file(src).unwrap();
        let mut seen = Vec::new();
        inspect_mut(&mut file, |node, scope| {
            if scope.has_decl(name) {
                return false;
            }
            if let NodeMut::Expr(Expr::Selector { x, sel }) = node {
                if matches!(&**x, Expr::Ident(n) if n == name) {
                    seen.push(sel.clone());
                }
            }
            true
        });
        seen
    }

    #[test]
    fn import_name_is_in_file_scope() {
        let mut file =
            parse_file("package app\n\nimport \"github.com/acme/first\"\n").unwrap();
        let mut found = false;
        inspect_mut(&mut file, |node, scope| {
            if let NodeMut::Import(_) = node {
                found = scope.has_decl("first");
            }
            true
        });
        assert!(found);
    }

    // The probed name is deliberately not bound by an import below: by the
    // time references are redirected, the import already carries its new
    // name, so only local declarations can shadow the old one.

    #[test]
    fn local_var_shadows_name_for_rest_of_block() {
        let src = "package app\n\nfunc A() string {\n\treturn first.Do()\n}\n\nfunc B() string {\n\tvar first Conflict\n\treturn first.Do()\n}\n";
        let seen = qualifiers_seen_unshadowed(src, "first");
        assert_eq!(seen, vec!["Do"]);
    }

    #[test]
    fn parameter_shadows_name_inside_function() {
        let src = "package app\n\nfunc A(first Conflict) string {\n\treturn first.Do()\n}\n\nfunc B() string {\n\treturn first.Do()\n}\n";
        let seen = qualifiers_seen_unshadowed(src, "first");
        assert_eq!(seen, vec!["Do"]);
    }

    #[test]
    fn shadow_does_not_escape_its_function() {
        let src = "package app\n\nfunc A() {\n\tfirst := 1\n\tuse(first)\n}\n\nfunc B() string {\n\treturn first.Do()\n}\n";
        let seen = qualifiers_seen_unshadowed(src, "first");
        assert_eq!(seen, vec!["Do"]);
    }

    #[test]
    fn define_in_if_init_shadows_condition_and_body() {
        let src = "package app\n\nfunc A() {\n\tif cfg := Load(); cfg.Valid() {\n\t\tcfg.Use()\n\t}\n}\n";
        let seen = qualifiers_seen_unshadowed(src, "cfg");
        assert!(seen.is_empty());
    }
}
