use std::collections::HashMap;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use regex::Regex;

use crate::analyzer::Parser;
use crate::ast::{insert_last, Directive, Import, Model, Rule, ValidatorSpec, TYPE_OPERATOR};
use crate::config::CompilerConfig;
use crate::error::Location;
use crate::eval::OperatorRegistry;
use crate::tokenizer::Position;
use crate::type_registry::{Kind, ResolveError, TypeRegistry};

use super::loader::{FsLoader, SourceLoader};
use super::{CompileError, CompileResult};

/// One DSL text being compiled and where it came from.
struct Source<'a> {
    text: &'a str,
    origin: Option<&'a Path>,
    base_dir: &'a Path,
}

impl Source<'_> {
    fn location(&self, line: usize, column: usize) -> Location {
        Location::new(self.text, line, column).in_file(self.origin)
    }

    /// Position of `needle` on `line`, falling back to the first column.
    fn locate(&self, line: usize, needle: &str) -> Location {
        let column = line
            .checked_sub(1)
            .and_then(|idx| self.text.lines().nth(idx))
            .and_then(|text| text.find(needle).map(|at| text[..at].chars().count() + 1))
            .unwrap_or(1);
        self.location(line, column)
    }
}

/// The compiled content of one source and everything it imports.
#[derive(Default)]
struct Unit {
    directives: Vec<Directive>,
    rules: IndexMap<String, Rule>,
    types: TypeRegistry,
    patterns: HashMap<String, Regex>,
}

impl Unit {
    /// Takes over rules and types of an imported unit; later imports win.
    fn absorb(&mut self, imported: Unit) {
        for (path, rule) in imported.rules {
            insert_last(&mut self.rules, path, rule);
        }
        self.types.extend(imported.types.into_types().into_values());
        self.patterns.extend(imported.patterns);
    }

    fn into_model(self) -> Model {
        Model {
            directives: self.directives,
            rules: self.rules,
            types: self.types.into_types(),
            patterns: self.patterns,
        }
    }
}

/// Compiles DSL sources into [`Model`]s.
pub struct Compiler {
    loader: Box<dyn SourceLoader>,
    operators: OperatorRegistry,
    config: CompilerConfig,
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new(Box::new(FsLoader))
    }
}

impl Compiler {
    pub fn new(loader: Box<dyn SourceLoader>) -> Self {
        Self {
            loader,
            operators: OperatorRegistry::with_builtins(),
            config: CompilerConfig::default(),
        }
    }

    pub fn with_config(mut self, config: CompilerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_operators(mut self, operators: OperatorRegistry) -> Self {
        self.operators = operators;
        self
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    pub fn operators(&self) -> &OperatorRegistry {
        &self.operators
    }

    /// Compiles `source`; its imports resolve relative to `base_dir`.
    #[tracing::instrument(level = "debug", skip(self, source), fields(base_dir = %base_dir.display()))]
    pub fn compile(&self, source: &str, base_dir: &Path) -> CompileResult<Model> {
        let mut resolving = Vec::new();
        let unit = self.unit(
            Source {
                text: source,
                origin: None,
                base_dir,
            },
            &mut resolving,
        )?;
        Ok(unit.into_model())
    }

    #[tracing::instrument(level = "debug", skip(self), fields(path = %path.display()))]
    pub fn compile_file(&self, path: &Path) -> CompileResult<Model> {
        let read_error = |source| CompileError::Read {
            path: path.to_path_buf(),
            source,
        };
        let canonical = self.loader.canonicalize(path).map_err(read_error)?;
        let text = self.loader.read(&canonical).map_err(read_error)?;
        let base_dir = canonical.parent().map(Path::to_path_buf).unwrap_or_default();

        let mut resolving = vec![canonical.clone()];
        let unit = self.unit(
            Source {
                text: &text,
                origin: Some(&canonical),
                base_dir: &base_dir,
            },
            &mut resolving,
        )?;
        Ok(unit.into_model())
    }

    /// Merges models in order; see [`Model::merge`].
    pub fn combine(models: impl IntoIterator<Item = Model>) -> Model {
        models.into_iter().fold(Model::default(), Model::merge)
    }

    fn unit(&self, source: Source<'_>, resolving: &mut Vec<PathBuf>) -> CompileResult<Unit> {
        let tree = Parser::new(source.text)
            .with_directive_prefix(self.config.directive_prefix)
            .with_origin(source.origin)
            .parse()?;

        let mut unit = Unit::default();
        for import in &tree.imports {
            let imported = self.import(&source, import, resolving)?;
            unit.absorb(imported);
        }

        let local_types: Vec<String> = tree.types.keys().cloned().collect();
        unit.types.extend(tree.types.into_values());
        for name in &local_types {
            self.check_type(&source, &unit.types, name, &mut unit.patterns)?;
        }

        for rule in tree.rules.into_values() {
            let rule = self.resolve_rule(&source, &unit.types, rule, &mut unit.patterns)?;
            insert_last(&mut unit.rules, rule.path.clone(), rule);
        }

        unit.directives = tree.directives;
        tracing::debug!(
            origin = ?source.origin,
            rules = unit.rules.len(),
            patterns = unit.patterns.len(),
            "compiled unit"
        );
        Ok(unit)
    }

    fn import(
        &self,
        source: &Source<'_>,
        import: &Import,
        resolving: &mut Vec<PathBuf>,
    ) -> CompileResult<Unit> {
        let location = || source.locate(import.line, &import.path);
        let target = source.base_dir.join(&import.path);
        tracing::debug!(path = %target.display(), line = import.line, "resolving import");

        let failed = |error| CompileError::ImportFailed {
            path: target.clone(),
            source: error,
            location: location(),
        };
        let canonical = self.loader.canonicalize(&target).map_err(failed)?;

        if resolving.contains(&canonical) {
            let chain = resolving
                .iter()
                .chain(std::iter::once(&canonical))
                .map(|path| path.display().to_string())
                .collect::<Vec<_>>()
                .join(" -> ");
            return Err(CompileError::ImportCycle {
                chain,
                location: location(),
            });
        }
        if resolving.len() >= self.config.max_import_depth {
            return Err(CompileError::ImportTooDeep {
                limit: self.config.max_import_depth,
                location: location(),
            });
        }

        let text = self.loader.read(&canonical).map_err(failed)?;
        let base_dir = canonical.parent().map(Path::to_path_buf).unwrap_or_default();

        resolving.push(canonical.clone());
        let unit = self.unit(
            Source {
                text: &text,
                origin: Some(&canonical),
                base_dir: &base_dir,
            },
            resolving,
        );
        resolving.pop();

        unit.map_err(|error| CompileError::InImport {
            path: canonical.clone(),
            location: location(),
            source: Box::new(error),
        })
    }

    fn check_type(
        &self,
        source: &Source<'_>,
        types: &TypeRegistry,
        name: &str,
        patterns: &mut HashMap<String, Regex>,
    ) -> CompileResult<()> {
        let Some(def) = types.get(name) else {
            return Ok(());
        };
        let kind = types
            .resolve_kind(name)
            .map_err(|error| resolve_error(source, error, def.position))?;
        for spec in def.validators.iter().filter(|spec| !spec.is(TYPE_OPERATOR)) {
            self.check_spec(source, kind, spec, patterns)?;
        }
        Ok(())
    }

    fn resolve_rule(
        &self,
        source: &Source<'_>,
        types: &TypeRegistry,
        rule: Rule,
        patterns: &mut HashMap<String, Regex>,
    ) -> CompileResult<Rule> {
        let position = rule.position;
        let kind = types
            .resolve_kind(&rule.declared_type)
            .map_err(|error| resolve_error(source, error, position))?;
        for spec in rule.explicit_specs() {
            self.check_spec(source, kind, spec, patterns)?;
        }
        types
            .flatten(rule)
            .map_err(|error| resolve_error(source, error, position))
    }

    fn check_spec(
        &self,
        source: &Source<'_>,
        kind: Kind,
        spec: &ValidatorSpec,
        patterns: &mut HashMap<String, Regex>,
    ) -> CompileResult<()> {
        let location = || source.locate(spec.line, &spec.operator);
        let operator =
            self.operators
                .get(&spec.operator)
                .ok_or_else(|| CompileError::UnknownOperator {
                    name: spec.operator.clone(),
                    location: location(),
                })?;

        let invalid = |message| CompileError::InvalidArgument {
            operator: spec.operator.clone(),
            message,
            location: location(),
        };
        operator.check(kind, spec).map_err(invalid)?;

        if let Some(pattern) = operator.pattern(spec) {
            if !patterns.contains_key(pattern) {
                let regex = Regex::new(pattern).map_err(|error| {
                    invalid(format!("invalid regular expression /{}/: {}", pattern, error))
                })?;
                patterns.insert(pattern.to_string(), regex);
            }
        }
        Ok(())
    }
}

fn resolve_error(source: &Source<'_>, error: ResolveError, position: Position) -> CompileError {
    let location = source.location(position.line, position.column);
    match error {
        ResolveError::Unknown(name) => CompileError::UnknownType { name, location },
        ResolveError::Cycle(chain) => CompileError::TypeCycle { chain, location },
        ResolveError::MissingBase(name) => CompileError::MissingBaseType { name, location },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::MemoryLoader;
    use pretty_assertions::assert_eq;

    fn compiler(files: &[(&str, &str)]) -> Compiler {
        let loader = files
            .iter()
            .fold(MemoryLoader::new(), |loader, (path, text)| loader.with_file(path, *text));
        Compiler::new(Box::new(loader))
    }

    #[test]
    fn test_compile_flattens_types() {
        let model = compiler(&[])
            .compile(
                "def Password { type String\n gte 3 }\nPassword pwd { required }",
                Path::new("/"),
            )
            .unwrap();
        let rule = model.rule("pwd").unwrap();
        assert_eq!(rule.kind, Some(Kind::String));
        let ops: Vec<_> = rule.validators.iter().map(|s| s.operator.as_str()).collect();
        assert_eq!(ops, vec!["type", "gte", "required"]);
        assert!(model.types.contains_key("Password"));
    }

    #[test]
    fn test_import_relative_to_importer() {
        let model = compiler(&[
            ("/m/shared/base.model", "@import ./types.model\nString base.name"),
            ("/m/shared/types.model", "def Age { type Number\n gte 0 }"),
        ])
        .compile("@import shared/base.model\nAge age", Path::new("/m"))
        .unwrap();
        assert_eq!(model.len(), 2);
        assert_eq!(model.rule("age").unwrap().kind, Some(Kind::Number));
    }

    #[test]
    fn test_local_rule_wins_over_import() {
        let model = compiler(&[("/a.model", "@clean\nNumber x\nString y")])
            .compile("@import a.model\nString x", Path::new("/"))
            .unwrap();
        assert_eq!(model.rule("x").unwrap().declared_type, "String");
        assert_eq!(model.rule("y").unwrap().declared_type, "String");
        assert!(!model.is_clean());
    }

    #[test]
    fn test_import_cycle() {
        let err = compiler(&[
            ("/a.model", "@import b.model\nString a"),
            ("/b.model", "\n@import a.model"),
        ])
        .compile_file(Path::new("/a.model"))
        .unwrap_err();
        let CompileError::InImport { path, source, .. } = &err else {
            panic!("unexpected error {err}");
        };
        assert_eq!(path, &PathBuf::from("/b.model"));
        match source.as_ref() {
            CompileError::ImportCycle { chain, location } => {
                assert_eq!(chain, "/a.model -> /b.model -> /a.model");
                assert_eq!(location.line, 2);
                assert_eq!(location.file.as_deref(), Some(Path::new("/b.model")));
            }
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn test_import_depth_limit() {
        let compiler = compiler(&[
            ("/1.model", "@import 2.model"),
            ("/2.model", "@import 3.model"),
            ("/3.model", "String deep"),
        ])
        .with_config(CompilerConfig {
            max_import_depth: 2,
            ..Default::default()
        });
        let err = compiler.compile("@import 1.model", Path::new("/")).unwrap_err();
        assert!(matches!(
            err.root_cause(),
            CompileError::ImportTooDeep { limit: 2, .. }
        ));
    }

    #[test]
    fn test_missing_import() {
        let err = compiler(&[])
            .compile("String a\n@import missing.model", Path::new("/"))
            .unwrap_err();
        assert!(matches!(err, CompileError::ImportFailed { .. }));
        assert_eq!(err.line(), Some(2));
        assert_eq!(err.location().unwrap().column, 9);
    }

    #[test]
    fn test_semantic_errors() {
        let compile = |source: &str| compiler(&[]).compile(source, Path::new("/")).unwrap_err();

        assert!(matches!(
            compile("Strin name"),
            CompileError::UnknownType { ref name, .. } if name == "Strin"
        ));
        let err = compile("Number n {\n  grt 5\n}");
        assert!(matches!(err, CompileError::UnknownOperator { ref name, .. } if name == "grt"));
        assert_eq!((err.line(), err.location().unwrap().column), (Some(2), 3));
        assert!(matches!(
            compile("Number n { gt abc }"),
            CompileError::InvalidArgument { .. }
        ));
        assert!(matches!(
            compile("Object o { lt 3 }"),
            CompileError::InvalidArgument { .. }
        ));
        assert!(matches!(
            compile("String s { match /(/ }"),
            CompileError::InvalidArgument { .. }
        ));
        assert!(matches!(
            compile("def A { type B }\ndef B { type A }"),
            CompileError::TypeCycle { .. }
        ));
        assert!(matches!(
            compile("def Bare { gt 1 }"),
            CompileError::MissingBaseType { .. }
        ));
        assert!(matches!(compile("String"), CompileError::Parse(_)));
    }

    #[test]
    fn test_patterns_are_cached() {
        let model = compiler(&[])
            .compile(
                "String a { match /^a/ }\nString b { regex /^a/ }\nString c { regexp /c$/ }",
                Path::new("/"),
            )
            .unwrap();
        assert_eq!(model.patterns.len(), 2);
        assert!(model.pattern("^a").unwrap().is_match("abc"));
    }

    #[test]
    fn test_combine() {
        let c = compiler(&[]);
        let first = c.compile("@clean\nString a\nNumber b", Path::new("/")).unwrap();
        let second = c.compile("Boolean b\nString c", Path::new("/")).unwrap();
        let combined = Compiler::combine([first, second]);
        let keys: Vec<_> = combined.rules.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
        assert_eq!(combined.rule("b").unwrap().declared_type, "Boolean");
        assert!(!combined.is_clean());
    }
}
