//! Identifier utilities: name sanitization and conflict detection.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::imports;
use crate::syntax::ast::*;

static NOT_IDENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Za-z0-9_]").unwrap());

/// Strip every character that cannot appear in an identifier.
pub fn clean(ident: &str) -> String {
    NOT_IDENT.replace_all(ident, "").into_owned()
}

/// Path segments too generic to distinguish sibling packages.
pub fn is_generic_parent(segment: &str) -> bool {
    matches!(segment, "pkg" | "internal" | "src")
}

/// Whether any declaration or import in the tree binds `candidate`.
/// Imports for which `skip_import` returns true are ignored. Struct field
/// names are not declarations for this purpose.
pub fn has_conflict<F>(file: &File, candidate: &str, skip_import: F) -> bool
where
    F: Fn(&ImportSpec) -> bool,
{
    let mut detector = ConflictDetector {
        candidate,
        found: false,
    };
    for imp in &file.imports {
        if skip_import(imp) {
            continue;
        }
        if imports::effective_name(imp) == candidate {
            detector.found = true;
        }
    }
    for decl in &file.decls {
        if detector.found {
            break;
        }
        detector.decl(decl);
    }
    detector.found
}

struct ConflictDetector<'a> {
    candidate: &'a str,
    found: bool,
}

impl ConflictDetector<'_> {
    fn check(&mut self, name: &str) {
        if name == self.candidate {
            self.found = true;
        }
    }

    fn decl(&mut self, decl: &Decl) {
        match decl {
            Decl::Func(func) => self.func_decl(func),
            Decl::Value(value) => self.value_spec(&value.spec),
            Decl::Type(ty) => self.type_spec(&ty.spec),
        }
    }

    fn func_decl(&mut self, func: &FuncDecl) {
        self.check(&func.name);
        if let Some(receiver) = &func.receiver {
            self.expr(&receiver.ty);
        }
        self.func_type(&func.func_type);
        if let Some(body) = &func.body {
            self.block(body);
        }
    }

    fn func_type(&mut self, func_type: &FuncType) {
        for field in func_type.params.iter().chain(&func_type.results) {
            for name in &field.names {
                self.check(name);
            }
            self.expr(&field.ty);
        }
    }

    fn value_spec(&mut self, spec: &ValueSpec) {
        for name in &spec.names {
            self.check(name);
        }
        if let Some(ty) = &spec.ty {
            self.expr(ty);
        }
        for value in &spec.values {
            self.expr(value);
        }
    }

    fn type_spec(&mut self, spec: &TypeSpec) {
        self.check(&spec.name);
        self.expr(&spec.ty);
    }

    fn block(&mut self, block: &Block) {
        for stmt in &block.stmts {
            if self.found {
                return;
            }
            self.stmt(stmt);
        }
    }

    fn stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Value(spec) => self.value_spec(spec),
            Stmt::Type(spec) => self.type_spec(spec),
            Stmt::Assign(assign) => {
                for lhs in &assign.lhs {
                    if let Expr::Ident(name) = lhs {
                        self.check(name);
                    }
                }
                for expr in assign.lhs.iter().chain(&assign.rhs) {
                    self.expr(expr);
                }
            }
            Stmt::Expr(expr) => self.expr(expr),
            Stmt::Return(exprs) => {
                for expr in exprs {
                    self.expr(expr);
                }
            }
            Stmt::If(stmt) => {
                if let Some(init) = &stmt.init {
                    self.stmt(init);
                }
                self.expr(&stmt.cond);
                self.block(&stmt.then);
                if let Some(els) = &stmt.els {
                    self.stmt(els);
                }
            }
            Stmt::Block(block) => self.block(block),
        }
    }

    fn expr(&mut self, expr: &Expr) {
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
            // Struct field names are not declarations; only their types
            // can hide further conflicts.
            Expr::StructType { fields } => {
                for field in fields {
                    self.expr(&field.ty);
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
                    if let Some(key) = &elt.key {
                        self.expr(key);
                    }
                    self.expr(&elt.value);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::parse_file;

    fn conflicts(src: &str, candidate: &str) -> bool {
        let file = parse_file(src).unwrap();
        has_conflict(&file, candidate, |_| false)
    }

    #[test]
    fn clean_strips_non_identifier_characters() {
        assert_eq!(clean("other-repo"), "otherrepo");
        assert_eq!(clean("go.uber.org"), "gouberorg");
        assert_eq!(clean("plain_name2"), "plain_name2");
    }

    #[test]
    fn generic_parents() {
        assert!(is_generic_parent("pkg"));
        assert!(is_generic_parent("internal"));
        assert!(is_generic_parent("src"));
        assert!(!is_generic_parent("tools"));
    }

    #[test]
    fn detects_function_and_type_names() {
        let src = "package app\n\nfunc other() {}\n\ntype Thing struct{}\n";
        assert!(conflicts(src, "other"));
        assert!(conflicts(src, "Thing"));
        assert!(!conflicts(src, "missing"));
    }

    #[test]
    fn detects_local_declarations_and_parameters() {
        let src = "package app\n\nfunc F(other Conflict) string {\n\tvar inner Conflict\n\tcount := 1\n\treturn other.Do(inner, count)\n}\n";
        assert!(conflicts(src, "other"));
        assert!(conflicts(src, "inner"));
        assert!(conflicts(src, "count"));
    }

    #[test]
    fn detects_import_effective_names() {
        let src = "package app\n\nimport (\n\talias \"github.com/acme/first\"\n\t\"github.com/other-repo/other\"\n)\n";
        assert!(conflicts(src, "alias"));
        assert!(conflicts(src, "other"));
        assert!(!conflicts(src, "first"));
    }

    #[test]
    fn skip_predicate_excludes_matching_imports() {
        let src = "package app\n\nimport \"github.com/acme/other\"\n";
        let file = parse_file(src).unwrap();
        assert!(has_conflict(&file, "other", |_| false));
        assert!(!has_conflict(&file, "other", |imp| {
            imp.path == "github.com/acme/other"
        }));
    }

    #[test]
    fn struct_field_names_are_not_conflicts() {
        let src = "package app\n\ntype Config struct {\n\tother string\n}\n";
        assert!(!conflicts(src, "other"));
    }

    #[test]
    fn named_results_are_conflicts() {
        let src = "package app\n\nfunc F() (other error) {\n\treturn\n}\n";
        assert!(conflicts(src, "other"));
    }
}
