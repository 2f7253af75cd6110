//! Import helpers and alias selection.

use crate::ident;
use crate::path::PkgPath;
use crate::syntax::ast::{File, ImportSpec};

/// The effective local name of an import: its explicit alias when present,
/// otherwise the cleaned last segment of its path.
pub fn effective_name(imp: &ImportSpec) -> String {
    match &imp.alias {
        Some(alias) => alias.clone(),
        None => ident::clean(import_path(imp).pkg_name()),
    }
}

pub fn import_path(imp: &ImportSpec) -> PkgPath {
    PkgPath::new(&imp.path)
}

/// Pick a local alias for `import_path` that conflicts with nothing else in
/// the file. An existing import of the same path is not counted as a
/// conflict, so a path that is already imported keeps claim to its own name.
///
/// Preference order: the package name itself; the parent-prefixed name when
/// the parent segment carries meaning; numeric suffixes.
pub fn disambiguate_import(file: &File, import_path: &PkgPath) -> String {
    let skip_self = |imp: &ImportSpec| &self::import_path(imp) == import_path;

    let pkg_name = ident::clean(import_path.pkg_name());
    if !ident::has_conflict(file, &pkg_name, skip_self) {
        return pkg_name;
    }

    if let Some(parent) = import_path.parent_name() {
        let parent = ident::clean(parent);
        if !ident::is_generic_parent(&parent) {
            let combo = format!("{parent}{pkg_name}");
            if !ident::has_conflict(file, &combo, skip_self) {
                return combo;
            }
        }
    }

    let mut n = 2;
    loop {
        let name = format!("{pkg_name}{n}");
        if !ident::has_conflict(file, &name, skip_self) {
            return name;
        }
        n += 1;
    }
}
