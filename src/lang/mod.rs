//! The Scala language extension: the phase orchestrator the host drives.
//!
//! ```text
//! register_flags / check_flags   providers, strategies, parser, run cache
//!     ↓
//! configure (per directory)      ScalaConfig cloned from the parent
//!     ↓
//! generate_rules (per package)   parse sources → RuleSymbols, register symbols
//!     ↓
//! done_generating_rules          providers' on_resolve, build resolver chain
//!     ↓
//! resolve (per rule)             resolve imports → DepWriter
//!     ↓
//! on_end (after the last rule)   write run cache, stop parser, reports
//! ```

use std::collections::BTreeSet;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{ArgMatches, Command};
use indexmap::IndexMap;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tracing::{debug, info, warn};

use crate::base::Label;
use crate::cache::{RuleCache, read_cache, write_cache};
use crate::cleaner::ScalaProtoGrpcDepsCleaner;
use crate::config::{DIRECTIVES, RuleConfig, ScalaConfig};
use crate::conflict::{
    DEFAULT_CONFLICT_RESOLVERS, PredefinedLabelConflictResolver, PreferredDeps, PreferredDepsConflictResolver,
    ProtoPackageWildcardImportConflictResolver, ScalaGrpcZioConflictResolver, ScalaProtoPackageConflictResolver,
};
use crate::deps::DepWriter;
use crate::error::{Error, Result};
use crate::host::{
    BuildFile, Config, FindResult, GenerateArgs, GenerateResult, ImportSpec, ImportsRaw, KindInfo, Language, LoadInfo,
    Rule, RuleIndex, flag_value, flag_values, repeated_flag, string_flag,
};
use crate::parser::{MemoParser, Parser, ParserClient, ParserOptions};
use crate::provider::{JavaProvider, MavenProvider, ProtobufProvider, SemanticdbProvider, SourceProvider};
use crate::resolver::{
    ChainSymbolResolver, CrossSymbolResolver, MemoSymbolResolver, NormalizingSymbolResolver, OverrideSymbolResolver,
    ScopeSymbolResolver, SymbolResolver,
};
use crate::rule::{ExistingRuleKind, ResolveContext, RuleFlavor, RuleKinds, RuleSymbols, SCALA_LANG};
use crate::scope::Scope;
use crate::universe::Universe;

mod env;

pub use env::{Env, LOG_FILE_ENV, SHOW_COVERAGE_ENV, SHOW_PROGRESS_ENV, UNMANAGED_DEPS_FILE_ENV, init_logging};

pub const SYMBOL_PROVIDER_FLAG: &str = "scala_symbol_provider";
pub const CONFLICT_RESOLVER_FLAG: &str = "scala_conflict_resolver";
pub const DEPS_CLEANER_FLAG: &str = "scala_deps_cleaner";
pub const EXISTING_BINARY_RULE_FLAG: &str = "scala_existing_scala_binary_rule";
pub const EXISTING_LIBRARY_RULE_FLAG: &str = "scala_existing_scala_library_rule";
pub const EXISTING_TEST_RULE_FLAG: &str = "scala_existing_scala_test_rule";
pub const RULE_CACHE_FILE_FLAG: &str = "scala_rule_cache_file";
pub const TOTAL_PACKAGE_COUNT_FLAG: &str = "total_package_count";
pub const PARSER_COMMAND_FLAG: &str = "scala_parser_command";
pub const PARSER_TIMEOUT_MS_FLAG: &str = "scala_parser_timeout_ms";

const EXISTING_RULE_FLAGS: [(&str, RuleFlavor); 3] = [
    (EXISTING_BINARY_RULE_FLAG, RuleFlavor::Binary),
    (EXISTING_LIBRARY_RULE_FLAG, RuleFlavor::Library),
    (EXISTING_TEST_RULE_FLAG, RuleFlavor::Test),
];

/// Attributes computed during resolution.
const RESOLVE_ATTRS: [&str; 2] = ["deps", "exports"];

// ============================================================================
// SCALA LANG
// ============================================================================

/// The extension object registered with the host.
pub struct ScalaLang {
    env: Env,
    universe: Arc<Universe>,
    kinds: RuleKinds,
    client: Option<Arc<ParserClient>>,
    memo: MemoParser,
    protobuf: Arc<ProtobufProvider>,
    resolver: Option<Arc<dyn SymbolResolver>>,
    cache_file: Option<PathBuf>,
    total_packages: usize,
    packages: usize,
    rules: FxHashMap<Label, Arc<RuleSymbols>>,
    remaining: usize,
    recognized: usize,
    managed: usize,
    unmanaged: BTreeSet<(Label, Label)>,
    logging: bool,
    ended: bool,
}

impl ScalaLang {
    /// An extension that parses through the `scala-parse-server` child.
    pub fn new(env: Env) -> Result<Self> {
        let client = Arc::new(ParserClient::new(ParserOptions::default()));
        let mut lang = Self::with_parser(env, client.clone())?;
        lang.client = Some(client);
        Ok(lang)
    }

    /// An extension that parses with `parser`.
    pub fn with_parser(env: Env, parser: Arc<dyn Parser>) -> Result<Self> {
        let universe = Arc::new(Universe::new());
        let preferred: PreferredDeps = Arc::new(RwLock::new(FxHashMap::default()));

        let source = Arc::new(SourceProvider::new(universe.scope(), parser));
        let semanticdb = Arc::new(SemanticdbProvider::new(source.clone()));
        let protobuf = Arc::new(ProtobufProvider::new());
        universe.register_provider(source)?;
        universe.register_provider(Arc::new(JavaProvider::new(preferred.clone())))?;
        universe.register_provider(Arc::new(MavenProvider::new()))?;
        universe.register_provider(protobuf.clone())?;
        universe.register_provider(semanticdb.clone())?;

        universe.register_conflict_resolver(Arc::new(PredefinedLabelConflictResolver::default()))?;
        universe.register_conflict_resolver(Arc::new(ProtoPackageWildcardImportConflictResolver::default()))?;
        universe.register_conflict_resolver(Arc::new(ScalaProtoPackageConflictResolver::default()))?;
        universe.register_conflict_resolver(Arc::new(ScalaGrpcZioConflictResolver::default()))?;
        universe.register_conflict_resolver(Arc::new(PreferredDepsConflictResolver::new(preferred)))?;

        universe.register_deps_cleaner(Arc::new(ScalaProtoGrpcDepsCleaner))?;

        Ok(Self {
            env,
            universe,
            kinds: RuleKinds::default(),
            client: None,
            memo: MemoParser::new(semanticdb),
            protobuf,
            resolver: None,
            cache_file: None,
            total_packages: 0,
            packages: 0,
            rules: FxHashMap::default(),
            remaining: 0,
            recognized: 0,
            managed: 0,
            unmanaged: BTreeSet::new(),
            logging: false,
            ended: false,
        })
    }

    /// The symbol universe of this run.
    pub fn universe(&self) -> &Arc<Universe> {
        &self.universe
    }

    /// The generated-code provider, for sibling extensions that register
    /// proto bindings.
    pub fn protobuf(&self) -> &Arc<ProtobufProvider> {
        &self.protobuf
    }

    /// The source parse memo.
    pub fn memo(&self) -> &MemoParser {
        &self.memo
    }

    /// Rule kinds known to this run.
    pub fn rule_kinds(&self) -> &RuleKinds {
        &self.kinds
    }

    /// Whether `on_end` already ran.
    pub fn is_ended(&self) -> bool {
        self.ended
    }

    fn check_parser_flags(&self, matches: &ArgMatches, c: &Config) -> Result<()> {
        let Some(client) = &self.client else {
            return Ok(());
        };
        let mut options = client.options();
        if let Some(command) = flag_value(matches, PARSER_COMMAND_FLAG) {
            options.command = PathBuf::from(command);
        }
        if let Some(ms) = flag_value(matches, PARSER_TIMEOUT_MS_FLAG) {
            let ms: u64 = ms
                .parse()
                .map_err(|_| Error::config(format!("invalid {PARSER_TIMEOUT_MS_FLAG} {ms:?}")))?;
            options.timeout = Duration::from_millis(ms);
        }
        options.strip_prefix = Some(c.repo_root.clone());
        client.set_options(options);
        Ok(())
    }

    fn read_rule_cache(&mut self, matches: &ArgMatches, c: &Config) {
        let Some(filename) = flag_value(matches, RULE_CACHE_FILE_FLAG) else {
            return;
        };
        let mut path = PathBuf::from(filename);
        if path.is_relative() {
            path = c.work_dir.join(path);
        }
        match read_cache(&path) {
            Ok(cache) => {
                debug!(path = %path.display(), rules = cache.rules.len(), "loaded rule cache");
                self.memo.load_rules(cache.rules);
            }
            Err(Error::Io { error, .. }) if error.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no rule cache yet");
            }
            Err(err) => warn!(path = %path.display(), %err, "ignoring unreadable rule cache"),
        }
        self.cache_file = Some(path);
    }

    fn resolve_rule(&mut self, c: &Config, ix: &RuleIndex, r: &mut Rule, symbols: &RuleSymbols, from: &Label) -> Result<()> {
        let sc = scala_config(c)?;
        let mut failed = false;
        for file in symbols.parse_errors() {
            warn!(label = %from, file = %file.filename, error = %file.parse_error, "parse error, deps left untouched");
            failed = true;
        }
        if failed {
            return Ok(());
        }

        let resolver = self
            .resolver
            .clone()
            .ok_or_else(|| Error::config("resolve called before done_generating_rules"))?;
        let language_scope = self.universe.language_scope();
        let ctx = ResolveContext {
            config: c,
            scala: &sc,
            index: ix,
            resolver: resolver.as_ref(),
            scope: language_scope.as_ref(),
        };
        let mut imports = symbols.resolve_imports(&ctx);

        let writer = DepWriter {
            universe: &self.universe,
            scala: &sc,
            repo_name: &c.repo_name,
            from,
            binary: symbols.is_binary(),
        };
        let report = writer.write(r, &mut imports);
        debug!(
            label = %from,
            imports = imports.len(),
            unresolved = report.unresolved.len(),
            ambiguous = report.ambiguous.len(),
            "resolved rule"
        );
        for dep in report.unmanaged {
            self.unmanaged.insert((from.clone(), dep));
        }
        Ok(())
    }

    /// Run the end-of-run work once: provider hooks, the cache file, parser
    /// shutdown and reports.
    pub fn on_end(&mut self) -> Result<()> {
        if self.ended {
            return Ok(());
        }
        self.ended = true;

        for provider in self.universe.enabled_providers() {
            provider.on_end()?;
        }

        if let Some(path) = &self.cache_file {
            let cache = RuleCache {
                package_count: i32::try_from(self.packages).unwrap_or(i32::MAX),
                rules: self.memo.rules(),
            };
            match write_cache(path, &cache) {
                Ok(()) => info!(
                    path = %path.display(),
                    rules = cache.rules.len(),
                    hits = self.memo.hits(),
                    misses = self.memo.misses(),
                    "wrote rule cache"
                ),
                Err(err) => warn!(path = %path.display(), %err, "rule cache not written"),
            }
        }

        if let Some(client) = &self.client {
            client.stop();
        }

        if self.env.show_coverage && self.recognized > 0 {
            let percent = self.managed * 100 / self.recognized;
            info!(managed = self.managed, recognized = self.recognized, percent, "rule coverage");
        }

        if let Some(path) = &self.env.unmanaged_deps_file {
            let text: String = self
                .unmanaged
                .iter()
                .map(|(from, dep)| format!("{from} {dep}\n"))
                .collect();
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
            }
            fs::write(path, text).map_err(|e| Error::io(path, e))?;
            debug!(path = %path.display(), deps = self.unmanaged.len(), "wrote unmanaged deps");
        }
        Ok(())
    }
}

fn scala_config(c: &Config) -> Result<Arc<ScalaConfig>> {
    ScalaConfig::get(c).ok_or_else(|| Error::config("scala configuration missing; check_flags was not called"))
}

// ============================================================================
// HOST CALLBACKS
// ============================================================================

impl Language for ScalaLang {
    fn name(&self) -> &str {
        SCALA_LANG
    }

    fn known_directives(&self) -> Vec<&'static str> {
        DIRECTIVES.to_vec()
    }

    fn kinds(&self) -> IndexMap<String, KindInfo> {
        self.kinds
            .iter()
            .map(|k| {
                let info = KindInfo {
                    resolve_attrs: RESOLVE_ATTRS.iter().map(|a| a.to_string()).collect(),
                };
                (k.kind.clone(), info)
            })
            .collect()
    }

    fn loads(&self) -> Vec<LoadInfo> {
        let mut loads: IndexMap<&str, Vec<String>> = IndexMap::new();
        for kind in self.kinds.iter() {
            loads.entry(kind.load.as_str()).or_default().push(kind.kind.clone());
        }
        loads
            .into_iter()
            .map(|(name, symbols)| LoadInfo {
                name: name.to_string(),
                symbols,
            })
            .collect()
    }

    fn register_flags(&mut self, cmd: Command, _c: &mut Config) -> Command {
        let mut cmd = cmd
            .arg(repeated_flag(SYMBOL_PROVIDER_FLAG, "enable a symbol provider by name"))
            .arg(repeated_flag(CONFLICT_RESOLVER_FLAG, "enable a conflict resolver by name"))
            .arg(repeated_flag(DEPS_CLEANER_FLAG, "enable a deps cleaner by name"))
            .arg(repeated_flag(EXISTING_BINARY_RULE_FLAG, "LOAD%KIND of a binary-like rule"))
            .arg(repeated_flag(EXISTING_LIBRARY_RULE_FLAG, "LOAD%KIND of a library rule"))
            .arg(repeated_flag(EXISTING_TEST_RULE_FLAG, "LOAD%KIND of a test rule"))
            .arg(string_flag(RULE_CACHE_FILE_FLAG, "path of the run cache file"))
            .arg(string_flag(TOTAL_PACKAGE_COUNT_FLAG, "number of packages, for progress"))
            .arg(string_flag(PARSER_COMMAND_FLAG, "parser server command"))
            .arg(string_flag(PARSER_TIMEOUT_MS_FLAG, "per-request parser deadline in milliseconds"));
        for provider in self.universe.providers() {
            cmd = provider.register_flags(cmd);
        }
        for resolver in self.universe.conflict_resolvers() {
            cmd = resolver.register_flags(cmd);
        }
        cmd
    }

    fn check_flags(&mut self, matches: &ArgMatches, c: &mut Config) -> Result<()> {
        for (flag, flavor) in EXISTING_RULE_FLAGS {
            for spec in flag_values(matches, flag) {
                self.kinds.add(ExistingRuleKind::parse(&spec, flavor)?);
            }
        }

        let mut providers = flag_values(matches, SYMBOL_PROVIDER_FLAG);
        if providers.is_empty() {
            providers = self
                .universe
                .providers()
                .iter()
                .map(|p| p.name().to_string())
                .collect();
        }
        let scope: Arc<dyn Scope> = self.universe.scope();
        for provider in self.universe.enable_providers(&providers)? {
            provider.check_flags(matches, c, scope.clone())?;
        }
        for resolver in self.universe.conflict_resolvers() {
            resolver.check_flags(matches, c)?;
        }

        let mut resolver_names = flag_values(matches, CONFLICT_RESOLVER_FLAG);
        if resolver_names.is_empty() {
            resolver_names = DEFAULT_CONFLICT_RESOLVERS.iter().map(|s| s.to_string()).collect();
        }
        let resolvers = resolver_names
            .iter()
            .map(|name| self.universe.conflict_resolver(name))
            .collect::<Result<Vec<_>>>()?;
        let cleaners = flag_values(matches, DEPS_CLEANER_FLAG)
            .iter()
            .map(|name| self.universe.deps_cleaner(name))
            .collect::<Result<Vec<_>>>()?;

        if let Some(count) = flag_value(matches, TOTAL_PACKAGE_COUNT_FLAG) {
            self.total_packages = count
                .parse()
                .map_err(|_| Error::config(format!("invalid {TOTAL_PACKAGE_COUNT_FLAG} {count:?}")))?;
        }
        self.read_rule_cache(matches, c);
        self.check_parser_flags(matches, c)?;

        let mut sc = ScalaConfig::new(self.universe.clone(), "");
        for kind in self.kinds.iter() {
            sc.put_rule_config(RuleConfig::new(kind.kind.clone(), kind.implementation()));
        }
        sc.set_conflict_resolvers(resolvers);
        sc.set_deps_cleaners(cleaners);
        sc.store(c);
        Ok(())
    }

    fn configure(&mut self, c: &mut Config, rel: &str, file: Option<&BuildFile>) -> Result<()> {
        let mut sc = scala_config(c)?.child(rel);
        if let Some(file) = file {
            sc.parse_directives(&file.directives)?;
        }

        if rel.is_empty() && !self.logging {
            if let Some(path) = &self.env.log_file {
                init_logging(path, sc.log_level().unwrap_or(tracing::Level::INFO))?;
            }
            self.logging = true;
        }

        self.packages += 1;
        if self.env.show_progress {
            info!(package = rel, visited = self.packages, total = self.total_packages, "configured package");
        }
        sc.store(c);
        Ok(())
    }

    fn generate_rules(&mut self, args: GenerateArgs<'_>) -> Result<GenerateResult> {
        let mut result = GenerateResult::default();
        let Some(file) = args.file else {
            return Ok(result);
        };
        let sc = scala_config(args.config)?;

        for rule in &file.rules {
            self.universe
                .put_known_rule(Label::new("", args.rel, rule.name()), rule.kind());
        }

        for rule in &file.rules {
            let recognized = sc.rule_configs().iter().any(|rc| rc.kind() == rule.kind());
            if !recognized {
                continue;
            }
            self.recognized += 1;
            if sc.rule_config_for_kind(rule.kind()).is_none() {
                debug!(rule = rule.name(), kind = rule.kind(), "rule kind disabled");
                continue;
            }

            let from = Label::new("", args.rel, rule.name());
            let srcs = rule.attr_strings("srcs").unwrap_or_default();
            let cached = match self.memo.parse_rule(&from, rule.kind(), &args.dir, &srcs) {
                Ok(cached) => cached,
                Err(err @ (Error::Parse(_) | Error::Io { .. })) => {
                    warn!(label = %from, %err, "rule not parsed");
                    continue;
                }
                Err(err) => return Err(err),
            };
            if let Some((filename, error)) = cached.parse_error() {
                debug!(label = %from, file = filename, error, "rule has unparsable files");
            }

            let binary = self.kinds.is_binary(rule.kind());
            let symbols = Arc::new(RuleSymbols::new(from.clone(), rule, cached, binary));
            self.rules.insert(from, symbols.clone());
            result.rules.push(rule.clone());
            result.imports.push(Box::new(symbols));
            self.managed += 1;
            self.remaining += 1;
        }
        Ok(result)
    }

    fn done_generating_rules(&mut self) -> Result<()> {
        for provider in self.universe.enabled_providers() {
            provider.on_resolve()?;
        }

        let universe_scope: Arc<dyn Scope> = self.universe.scope();
        let lookup = ChainSymbolResolver::new(vec![
            Arc::new(ScopeSymbolResolver::new(universe_scope)),
            Arc::new(CrossSymbolResolver::new(SCALA_LANG)),
            Arc::new(ScopeSymbolResolver::new(self.universe.language_scope())),
        ]);
        let chain = ChainSymbolResolver::new(vec![
            Arc::new(OverrideSymbolResolver::new()),
            Arc::new(MemoSymbolResolver::new(lookup)),
        ]);
        self.resolver = Some(Arc::new(NormalizingSymbolResolver::new(chain)));

        info!(
            rules = self.remaining,
            known_rules = self.universe.known_rule_count(),
            cache_hits = self.memo.hits(),
            cache_misses = self.memo.misses(),
            "generate phase complete"
        );
        if self.remaining == 0 {
            self.on_end()?;
        }
        Ok(())
    }

    fn imports(&self, _c: &Config, r: &Rule, f: &BuildFile) -> Vec<ImportSpec> {
        let from = Label::new("", f.pkg.as_str(), r.name());
        self.rules.get(&from).map(|s| s.provides()).unwrap_or_default()
    }

    fn embeds(&self, _r: &Rule, _from: &Label) -> Vec<Label> {
        Vec::new()
    }

    fn resolve(
        &mut self,
        c: &Config,
        ix: &RuleIndex,
        r: &mut Rule,
        imports_raw: Option<&ImportsRaw>,
        from: &Label,
    ) -> Result<()> {
        let symbols = imports_raw
            .and_then(|raw| raw.downcast_ref::<Arc<RuleSymbols>>())
            .cloned()
            .or_else(|| self.rules.get(from).cloned());
        let result = match symbols {
            Some(symbols) => self.resolve_rule(c, ix, r, &symbols, from),
            None => Ok(()),
        };

        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.on_end()?;
        }
        result
    }

    fn cross_resolve(&self, _c: &Config, _ix: &RuleIndex, spec: &ImportSpec, lang: &str) -> Vec<FindResult> {
        if spec.lang != SCALA_LANG || lang == SCALA_LANG {
            return Vec::new();
        }
        match self.universe.get_symbol(&spec.imp) {
            Some(symbol) if *symbol.name == *spec.imp && !symbol.label.is_empty() => {
                vec![FindResult { label: symbol.label.clone() }]
            }
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{ParseRequest, ParseResponse};

    struct NoParser;

    impl Parser for NoParser {
        fn parse(&self, _request: &ParseRequest) -> Result<ParseResponse> {
            Ok(ParseResponse::default())
        }
    }

    fn lang() -> ScalaLang {
        ScalaLang::with_parser(Env::default(), Arc::new(NoParser)).unwrap()
    }

    fn check(lang: &mut ScalaLang, args: &[&str]) -> Result<Config> {
        let mut c = Config::new("/repo");
        let cmd = lang.register_flags(Command::new("t").no_binary_name(true), &mut c);
        let matches = cmd.try_get_matches_from(args)?;
        lang.check_flags(&matches, &mut c)?;
        Ok(c)
    }

    #[test]
    fn test_kinds_and_loads() {
        let mut lang = lang();
        check(&mut lang, &["--scala_existing_scala_binary_rule=//rules:jvm.bzl%jvm_binary"]).unwrap();
        let kinds = lang.kinds();
        assert_eq!(kinds.len(), 5);
        assert_eq!(kinds["jvm_binary"].resolve_attrs, vec!["deps", "exports"]);
        assert!(lang.rule_kinds().is_binary("jvm_binary"));

        let loads = lang.loads();
        assert_eq!(loads.len(), 2);
        assert_eq!(loads[1].name, "//rules:jvm.bzl");
        assert_eq!(loads[1].symbols, vec!["jvm_binary"]);
    }

    #[test]
    fn test_defaults_enable_every_provider() {
        let mut lang = lang();
        let c = check(&mut lang, &[]).unwrap();
        let names: Vec<String> = lang
            .universe()
            .enabled_providers()
            .iter()
            .map(|p| p.name().to_string())
            .collect();
        assert_eq!(names, vec!["source", "java", "maven", "protobuf", "semanticdb"]);

        let sc = ScalaConfig::get(&c).unwrap();
        assert_eq!(sc.conflict_resolver_names(), DEFAULT_CONFLICT_RESOLVERS.to_vec());
        assert!(sc.rule_config_for_kind("scala_library").is_some());
    }

    #[test]
    fn test_unknown_names_are_fatal() {
        let mut lang = lang();
        let err = check(&mut lang, &["--scala_symbol_provider=nope"]).err().unwrap();
        assert_eq!(err.to_string(), "symbol provider not found: nope");

        let mut lang = self::lang();
        let err = check(&mut lang, &["--scala_conflict_resolver=nope"]).err().unwrap();
        assert!(matches!(err, Error::UnknownName { .. }));

        let mut lang = self::lang();
        let err = check(&mut lang, &["--scala_existing_scala_test_rule=bad"]).err().unwrap();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_no_rules_ends_at_transition() {
        let dir = tempfile::tempdir().unwrap();
        let cache = dir.path().join("cache.pb");
        let mut lang = lang();
        let cache_flag = format!("--scala_rule_cache_file={}", cache.display());
        check(&mut lang, &[cache_flag.as_str()]).unwrap();
        lang.done_generating_rules().unwrap();
        assert!(lang.is_ended());
        assert!(cache.exists());
    }
}
