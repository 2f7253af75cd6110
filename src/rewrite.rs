//! The file rewriter: applies relocation rules to one parsed file.

use crate::imports;
use crate::path::PkgPath;
use crate::rules::{RewriteRule, RewriteRules, RuleError};
use crate::scope::{self, NodeMut};
use crate::syntax::ast::{CommentGroup, Expr, File};

/// Apply the rule set to a file belonging to the package at `pkg_path`.
/// Returns whether the tree was mutated and needs to be serialized.
///
/// Imports are rewritten first so that an import which only becomes a
/// self-import after rewriting is still caught when the file's own package
/// is retargeted.
pub fn apply(rules: &RewriteRules, pkg_path: &PkgPath, file: &mut File) -> Result<bool, RuleError> {
    let mut changed = update_imports(rules, file)?;
    if let Some(rule) = rules.exact_match(pkg_path) {
        rewrite_package(file, rule);
        changed = true;
    }
    Ok(changed)
}

/// Rewrite every import matched by a rule, re-pointing qualified references
/// at the import's new local name.
fn update_imports(rules: &RewriteRules, file: &mut File) -> Result<bool, RuleError> {
    let mut changed = false;
    let mut i = 0;
    while i < file.imports.len() {
        let old_path = imports::import_path(&file.imports[i]);
        let rule = match rules.best_match(&old_path) {
            Some(rule) => rule,
            None => {
                i += 1;
                continue;
            }
        };

        let old_name = imports::effective_name(&file.imports[i]);
        let new_path = rule.rewrite(&old_path)?;
        file.imports[i].path = new_path.to_string();
        changed = true;

        // A side-effect import has no qualifier to redirect.
        if file.imports[i].is_blank() {
            i += 1;
            continue;
        }

        // When the destination is already imported under a usable name, fold
        // this entry into the existing one rather than inventing a suffixed
        // alias for a second import of the same path.
        let existing = file
            .imports
            .iter()
            .enumerate()
            .find(|(j, imp)| {
                *j != i && !imp.is_blank() && imports::import_path(imp) == new_path
            })
            .map(|(_, imp)| imports::effective_name(imp));
        if let Some(new_name) = existing {
            file.imports.remove(i);
            redirect_refs(file, &old_name, &new_name);
            continue;
        }

        let new_name = imports::disambiguate_import(file, &new_path);
        file.imports[i].alias = if new_name == new_path.pkg_name() {
            None
        } else {
            Some(new_name.clone())
        };
        redirect_refs(file, &old_name, &new_name);
        i += 1;
    }
    Ok(changed)
}

/// Redirect every qualified reference `old.Sel` to `new.Sel`, except where
/// an enclosing declaration re-binds `old`.
fn redirect_refs(file: &mut File, old: &str, new: &str) {
    if old == new {
        return;
    }
    scope::inspect_mut(file, |node, scope| {
        if scope.has_decl(old) {
            return false;
        }
        if let NodeMut::Expr(Expr::Selector { x, .. }) = node {
            if let Expr::Ident(name) = &mut **x {
                if name.as_str() == old {
                    *name = new.to_string();
                }
            }
        }
        true
    });
}

/// Retarget a file whose own package is being moved: rename the package
/// clause, fix up the package doc comment, and elide imports of the
/// destination package.
fn rewrite_package(file: &mut File, rule: &RewriteRule) {
    let new_name = rule.to.pkg_name().to_string();
    let old_name = std::mem::replace(&mut file.package_name, new_name.clone());
    for group in &mut file.comments {
        retarget_doc_comment(group, &old_name, &new_name);
    }
    remove_self_import(file, &rule.to);
}

/// Rewrite a `// Package <old> ...` or `/* Package <old> ...` prefix to the
/// new package name, first match per group.
fn retarget_doc_comment(group: &mut CommentGroup, old_name: &str, new_name: &str) {
    let line_prefix = format!("// Package {old_name} ");
    let block_prefix = format!("/* Package {old_name} ");
    for line in &mut group.lines {
        if let Some(rest) = line.strip_prefix(&line_prefix) {
            *line = format!("// Package {new_name} {rest}");
            break;
        }
        if let Some(rest) = line.strip_prefix(&block_prefix) {
            *line = format!("/* Package {new_name} {rest}");
            break;
        }
    }
}

/// Drop every import of `pkg_path` (the package the file now belongs to)
/// and strip the dropped qualifier from use-sites.
fn remove_self_import(file: &mut File, pkg_path: &PkgPath) {
    let mut removed = Vec::new();
    file.imports.retain(|imp| {
        if &imports::import_path(imp) == pkg_path {
            removed.push(imports::effective_name(imp));
            false
        } else {
            true
        }
    });
    for name in removed {
        strip_import_qualifier(file, &name);
    }
}

/// Remove `name.` qualifiers left behind by an elided self-import.
///
/// The fixed qualifier-bearing slots are stripped unconditionally: a type
/// reference like `var config config.Configuration` must lose its qualifier
/// even though the value name re-binds the alias at that point. Remaining
/// selectors in expression position are then stripped wherever the alias is
/// not shadowed by an enclosing declaration.
fn strip_import_qualifier(file: &mut File, name: &str) {
    scope::inspect_mut(file, |node, _scope| {
        match node {
            NodeMut::Field(field) => strip_slot(&mut field.ty, name),
            NodeMut::Value(spec) => {
                if let Some(ty) = &mut spec.ty {
                    strip_slot(ty, name);
                }
            }
            NodeMut::Expr(expr) => match expr {
                Expr::Star(x) => strip_slot(x, name),
                Expr::Ellipsis(elt) => strip_slot(elt, name),
                Expr::ArrayType { elt, .. } => strip_slot(elt, name),
                Expr::ChanType { value, .. } => strip_slot(value, name),
                Expr::MapType { key, .. } => strip_slot(key, name),
                Expr::Call { fun, .. } => strip_slot(fun, name),
                _ => {}
            },
            _ => {}
        }
        true
    });
    scope::inspect_mut(file, |node, scope| {
        if let NodeMut::Expr(expr) = node {
            if !scope.has_decl(name) {
                strip_slot(expr, name);
            }
        }
        true
    });
}

fn strip_slot(slot: &mut Expr, name: &str) {
    let sel = match slot {
        Expr::Selector { x, sel } if matches!(&**x, Expr::Ident(n) if n == name) => {
            std::mem::take(sel)
        }
        _ => return,
    };
    *slot = Expr::Ident(sel);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::{parse_file, print_file};
    use pretty_assertions::assert_eq;

    fn apply_rules(pkg_path: &str, src: &str, rule_specs: &[&str]) -> (bool, String) {
        let mut file = parse_file(src).unwrap();
        let rules = RewriteRules::parse(rule_specs).unwrap();
        let changed = apply(&rules, &PkgPath::new(pkg_path), &mut file).unwrap();
        (changed, print_file(&file))
    }

    #[test]
    fn untouched_file_reports_no_change() {
        let src = "package app\n\nimport (\n\t\"github.com/acme/keep\"\n)\n\nfunc X() string {\n\treturn keep.Do()\n}\n";
        let (changed, printed) =
            apply_rules("github.com/acme/app", src, &["github.com/acme/gone:x/y"]);
        assert!(!changed);
        assert_eq!(printed, src);
    }

    #[test]
    fn rewrites_import_and_references() {
        let src = "package app\n\nimport (\n\t\"github.com/acme/first\"\n)\n\nfunc X() string {\n\treturn first.Do()\n}\n";
        let (changed, printed) = apply_rules(
            "github.com/acme/app",
            src,
            &["github.com/acme/first:github.com/acme/other"],
        );
        assert!(changed);
        assert_eq!(
            printed,
            "package app\n\nimport (\n\t\"github.com/acme/other\"\n)\n\nfunc X() string {\n\treturn other.Do()\n}\n"
        );
    }

    #[test]
    fn shadowed_qualifier_is_left_alone() {
        let src = "package app\n\nimport (\n\t\"github.com/acme/first\"\n)\n\nfunc F() string {\n\tvar first Local\n\treturn first.M()\n}\n\nfunc G() string {\n\treturn first.Do()\n}\n";
        let (_, printed) = apply_rules(
            "github.com/acme/app",
            src,
            &["github.com/acme/first:github.com/acme/moved"],
        );
        assert_eq!(
            printed,
            "package app\n\nimport (\n\t\"github.com/acme/moved\"\n)\n\nfunc F() string {\n\tvar first Local\n\treturn first.M()\n}\n\nfunc G() string {\n\treturn moved.Do()\n}\n"
        );
    }

    #[test]
    fn blank_import_keeps_blank_alias() {
        let src = "package app\n\nimport (\n\t_ \"github.com/acme/authn\"\n)\n";
        let (changed, printed) = apply_rules(
            "github.com/acme/app",
            src,
            &["github.com/acme/authn:github.com/acme/services/authn"],
        );
        assert!(changed);
        assert_eq!(
            printed,
            "package app\n\nimport (\n\t_ \"github.com/acme/services/authn\"\n)\n"
        );
    }

    #[test]
    fn merges_into_existing_import_of_destination() {
        let src = "package app\n\nimport (\n\t\"github.com/acme/first\"\n\t\"github.com/acme/second\"\n)\n\nfunc A() string {\n\treturn first.Do()\n}\n\nfunc B() string {\n\treturn second.Do()\n}\n";
        let (_, printed) = apply_rules(
            "github.com/acme/app",
            src,
            &["github.com/acme/first:github.com/acme/second"],
        );
        assert_eq!(
            printed,
            "package app\n\nimport (\n\t\"github.com/acme/second\"\n)\n\nfunc A() string {\n\treturn second.Do()\n}\n\nfunc B() string {\n\treturn second.Do()\n}\n"
        );
    }

    #[test]
    fn blank_import_of_destination_is_not_a_merge_target() {
        let src = "package app\n\nimport (\n\t_ \"github.com/acme/second\"\n\t\"github.com/acme/first\"\n)\n\nfunc A() string {\n\treturn first.Do()\n}\n";
        let (_, printed) = apply_rules(
            "github.com/acme/app",
            src,
            &["github.com/acme/first:github.com/acme/second"],
        );
        assert_eq!(
            printed,
            "package app\n\nimport (\n\t_ \"github.com/acme/second\"\n\t\"github.com/acme/second\"\n)\n\nfunc A() string {\n\treturn second.Do()\n}\n"
        );
    }

    #[test]
    fn package_doc_comment_is_retargeted() {
        let src = "// Package first is a package that does some things.\npackage first\n\nfunc DoSomething() string {\n\treturn \"done\"\n}\n";
        let (changed, printed) = apply_rules(
            "github.com/acme/first",
            src,
            &["github.com/acme/first:github.com/acme/other"],
        );
        assert!(changed);
        assert_eq!(
            printed,
            "// Package other is a package that does some things.\npackage other\n\nfunc DoSomething() string {\n\treturn \"done\"\n}\n"
        );
    }

    #[test]
    fn build_tag_group_is_preserved_verbatim() {
        let src = "// +build tools\n\n// Package first does things.\npackage first\n";
        let (_, printed) = apply_rules(
            "github.com/acme/first",
            src,
            &["github.com/acme/first:github.com/acme/other"],
        );
        assert_eq!(
            printed,
            "// +build tools\n\n// Package other does things.\npackage other\n"
        );
    }
}
