//! Canonical serializer for the source tree.
//!
//! Output is deterministic: tab indentation, one blank line between
//! top-level declarations, and the import block re-emitted in path order
//! (the same normalization the original toolchain formatter applies).

use crate::syntax::ast::*;
use crate::syntax::lexer::quote;

pub fn print_file(file: &File) -> String {
    let mut p = Printer { out: String::new() };
    p.file(file);
    p.out
}

struct Printer {
    out: String,
}

impl Printer {
    fn push(&mut self, s: &str) {
        self.out.push_str(s);
    }

    fn indent(&mut self, depth: usize) {
        for _ in 0..depth {
            self.out.push('\t');
        }
    }

    fn file(&mut self, file: &File) {
        for group in &file.comments {
            for line in &group.lines {
                self.push(line);
                self.push("\n");
            }
            if group.hard_break {
                self.push("\n");
            }
        }
        self.push("package ");
        self.push(&file.package_name);
        self.push("\n");

        if !file.imports.is_empty() {
            let mut sorted: Vec<&ImportSpec> = file.imports.iter().collect();
            sorted.sort_by(|a, b| a.path.cmp(&b.path));
            self.push("\nimport (\n");
            for imp in sorted {
                self.push("\t");
                if let Some(alias) = &imp.alias {
                    self.push(alias);
                    self.push(" ");
                }
                self.push(&quote(&imp.path));
                self.push("\n");
            }
            self.push(")\n");
        }

        for decl in &file.decls {
            self.push("\n");
            match decl {
                Decl::Func(func) => self.func_decl(func),
                Decl::Value(value) => {
                    self.doc(&value.doc);
                    self.value_spec(&value.spec, 0);
                    self.push("\n");
                }
                Decl::Type(ty) => {
                    self.doc(&ty.doc);
                    self.type_spec(&ty.spec, 0);
                    self.push("\n");
                }
            }
        }
    }

    fn doc(&mut self, doc: &Option<CommentGroup>) {
        if let Some(group) = doc {
            for line in &group.lines {
                self.push(line);
                self.push("\n");
            }
        }
    }

    fn func_decl(&mut self, func: &FuncDecl) {
        self.doc(&func.doc);
        self.push("func ");
        if let Some(receiver) = &func.receiver {
            self.push("(");
            self.field(receiver, 0);
            self.push(") ");
        }
        self.push(&func.name);
        self.signature(&func.func_type, 0);
        match &func.body {
            Some(body) => {
                self.push(" ");
                self.block(body, 0);
                self.push("\n");
            }
            None => self.push("\n"),
        }
    }

    fn signature(&mut self, func_type: &FuncType, depth: usize) {
        self.push("(");
        self.fields(&func_type.params, depth);
        self.push(")");
        match func_type.results.len() {
            0 => {}
            1 if func_type.results[0].names.is_empty() => {
                self.push(" ");
                self.expr(&func_type.results[0].ty, depth);
            }
            _ => {
                self.push(" (");
                self.fields(&func_type.results, depth);
                self.push(")");
            }
        }
    }

    fn fields(&mut self, fields: &[Field], depth: usize) {
        for (i, field) in fields.iter().enumerate() {
            if i > 0 {
                self.push(", ");
            }
            self.field(field, depth);
        }
    }

    fn field(&mut self, field: &Field, depth: usize) {
        if !field.names.is_empty() {
            self.push(&field.names.join(", "));
            self.push(" ");
        }
        self.expr(&field.ty, depth);
    }

    fn value_spec(&mut self, spec: &ValueSpec, depth: usize) {
        self.push(match spec.kind {
            ValueKind::Var => "var ",
            ValueKind::Const => "const ",
        });
        self.push(&spec.names.join(", "));
        if let Some(ty) = &spec.ty {
            self.push(" ");
            self.expr(ty, depth);
        }
        if !spec.values.is_empty() {
            self.push(" = ");
            self.expr_list(&spec.values, depth);
        }
    }

    fn type_spec(&mut self, spec: &TypeSpec, depth: usize) {
        self.push("type ");
        self.push(&spec.name);
        self.push(" ");
        self.expr(&spec.ty, depth);
    }

    fn block(&mut self, block: &Block, depth: usize) {
        if block.stmts.is_empty() {
            self.push("{}");
            return;
        }
        self.push("{\n");
        for stmt in &block.stmts {
            self.indent(depth + 1);
            self.stmt(stmt, depth + 1);
            self.push("\n");
        }
        self.indent(depth);
        self.push("}");
    }

    fn stmt(&mut self, stmt: &Stmt, depth: usize) {
        match stmt {
            Stmt::Value(spec) => self.value_spec(spec, depth),
            Stmt::Type(spec) => self.type_spec(spec, depth),
            Stmt::Assign(assign) => {
                self.expr_list(&assign.lhs, depth);
                self.push(if assign.define { " := " } else { " = " });
                self.expr_list(&assign.rhs, depth);
            }
            Stmt::Expr(expr) => self.expr(expr, depth),
            Stmt::Return(exprs) => {
                self.push("return");
                if !exprs.is_empty() {
                    self.push(" ");
                    self.expr_list(exprs, depth);
                }
            }
            Stmt::If(stmt) => self.if_stmt(stmt, depth),
            Stmt::Block(block) => self.block(block, depth),
        }
    }

    fn if_stmt(&mut self, stmt: &IfStmt, depth: usize) {
        self.push("if ");
        if let Some(init) = &stmt.init {
            self.stmt(init, depth);
            self.push("; ");
        }
        self.expr(&stmt.cond, depth);
        self.push(" ");
        self.block(&stmt.then, depth);
        if let Some(els) = &stmt.els {
            self.push(" else ");
            self.stmt(els, depth);
        }
    }

    fn expr_list(&mut self, exprs: &[Expr], depth: usize) {
        for (i, expr) in exprs.iter().enumerate() {
            if i > 0 {
                self.push(", ");
            }
            self.expr(expr, depth);
        }
    }

    fn expr(&mut self, expr: &Expr, depth: usize) {
        match expr {
            Expr::Ident(name) => self.push(name),
            Expr::BasicLit(raw) => self.push(raw),
            Expr::Selector { x, sel } => {
                self.expr(x, depth);
                self.push(".");
                self.push(sel);
            }
            Expr::Call { fun, args } => {
                self.expr(fun, depth);
                self.push("(");
                self.expr_list(args, depth);
                self.push(")");
            }
            Expr::Star(x) => {
                self.push("*");
                self.expr(x, depth);
            }
            Expr::Unary { op, x } => {
                self.push(op.symbol());
                self.expr(x, depth);
            }
            Expr::Binary { op, x, y } => {
                self.expr(x, depth);
                self.push(" ");
                self.push(op.symbol());
                self.push(" ");
                self.expr(y, depth);
            }
            Expr::Paren(x) => {
                self.push("(");
                self.expr(x, depth);
                self.push(")");
            }
            Expr::Ellipsis(elt) => {
                self.push("...");
                self.expr(elt, depth);
            }
            Expr::ArrayType { len, elt } => {
                self.push("[");
                if let Some(len) = len {
                    self.expr(len, depth);
                }
                self.push("]");
                self.expr(elt, depth);
            }
            Expr::ChanType { dir, value } => {
                self.push(match dir {
                    ChanDir::Both => "chan ",
                    ChanDir::Send => "chan<- ",
                    ChanDir::Recv => "<-chan ",
                });
                self.expr(value, depth);
            }
            Expr::MapType { key, value } => {
                self.push("map[");
                self.expr(key, depth);
                self.push("]");
                self.expr(value, depth);
            }
            Expr::StructType { fields } => {
                if fields.is_empty() {
                    self.push("struct{}");
                    return;
                }
                self.push("struct {\n");
                for field in fields {
                    self.indent(depth + 1);
                    self.field(field, depth + 1);
                    self.push("\n");
                }
                self.indent(depth);
                self.push("}");
            }
            Expr::FuncLit { func_type, body } => {
                self.push("func");
                self.signature(func_type, depth);
                self.push(" ");
                self.block(body, depth);
            }
            Expr::Composite { ty, elts } => {
                if let Some(ty) = ty {
                    self.expr(ty, depth);
                }
                self.push("{");
                for (i, elt) in elts.iter().enumerate() {
                    if i > 0 {
                        self.push(", ");
                    }
                    if let Some(key) = &elt.key {
                        self.expr(key, depth);
                        self.push(": ");
                    }
                    self.expr(&elt.value, depth);
                }
                self.push("}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::parser::parse_file;
    use pretty_assertions::assert_eq;

    #[test]
    fn canonical_output_is_stable_under_reparse() {
        let src = "// Package app does things.\npackage app\n\nimport (\n\tother \"github.com/acme/first\"\n)\n\nfunc X() string {\n\treturn other.Do()\n}\n";
        let file = parse_file(src).unwrap();
        let printed = print_file(&file);
        assert_eq!(printed, src);
        let reparsed = parse_file(&printed).unwrap();
        assert_eq!(print_file(&reparsed), printed);
    }

    #[test]
    fn sorts_imports_by_path() {
        let src = "package app\n\nimport (\n\t\"z/last\"\n\t\"a/first\"\n)\n";
        let printed = print_file(&parse_file(src).unwrap());
        assert_eq!(
            printed,
            "package app\n\nimport (\n\t\"a/first\"\n\t\"z/last\"\n)\n"
        );
    }

    #[test]
    fn prints_struct_and_variadic_forms() {
        let src = "package app\n\ntype Config struct {\n\tFoo\n\tmore *Foo\n}\n\nfunc DoOtherThing(l ...Foo) string {\n\treturn DoSomething()\n}\n";
        let file = parse_file(src).unwrap();
        assert_eq!(print_file(&file), src);
    }

    #[test]
    fn prints_if_with_init_and_composite() {
        let src = "package app\n\nfunc F() error {\n\tif err := Load(Options{Name: \"x\"}); err != nil {\n\t\treturn err\n\t}\n\treturn nil\n}\n";
        let file = parse_file(src).unwrap();
        assert_eq!(print_file(&file), src);
    }
}
