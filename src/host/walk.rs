//! A two-phase driver for a single language extension.
//!
//! Mirrors what the host does on a full run: parse flags, configure every
//! directory with a config cloned from its nearest configured ancestor,
//! generate, index the advertised imports, signal the phase transition,
//! then resolve every generated rule.

use rustc_hash::FxHashMap;
use tracing::debug;

use super::{BuildFile, Config, GenerateArgs, ImportsRaw, Language, ResolveOverride, RuleIndex};
use crate::base::Label;
use crate::error::Result;

struct Generated {
    file: usize,
    rule: String,
    imports: Option<ImportsRaw>,
}

/// Drives one language over a set of build files.
pub struct Walk {
    root: Config,
}

impl Walk {
    /// Create a driver with the root configuration.
    pub fn new(root: Config) -> Self {
        Self { root }
    }

    /// Run both phases over `files` (in traversal order, parents before
    /// children) and return the rewritten files.
    pub fn run(&self, lang: &mut dyn Language, args: &[String], mut files: Vec<BuildFile>) -> Result<Vec<BuildFile>> {
        let mut root = self.root.clone();
        let cmd = clap::Command::new("gazelle").no_binary_name(true);
        let cmd = lang.register_flags(cmd, &mut root);
        let matches = cmd.try_get_matches_from(args)?;
        lang.check_flags(&matches, &mut root)?;

        let root_file = files.iter().find(|f| f.pkg.is_empty());
        if let Some(file) = root_file {
            apply_host_directives(&mut root, file)?;
        }
        lang.configure(&mut root, "", root_file)?;
        let mut configs: FxHashMap<String, Config> = FxHashMap::default();

        for file in &files {
            if file.pkg.is_empty() {
                continue;
            }
            let mut c = nearest_config(&configs, &root, &file.pkg).clone();
            apply_host_directives(&mut c, file)?;
            lang.configure(&mut c, &file.pkg, Some(file))?;
            configs.insert(file.pkg.clone(), c);
        }

        let mut generated = Vec::new();
        for (index, file) in files.iter_mut().enumerate() {
            let c = nearest_config(&configs, &root, &file.pkg);
            let result = lang.generate_rules(GenerateArgs {
                config: c,
                dir: c.repo_root.join(&file.pkg),
                rel: &file.pkg,
                file: Some(&*file),
            })?;
            debug!(pkg = %file.pkg, rules = result.rules.len(), "generated");

            let mut raws = result.imports.into_iter();
            for rule in result.rules {
                let name = rule.name().to_string();
                match file.rule_mut(&name) {
                    Some(existing) => *existing = rule,
                    None => file.rules.push(rule),
                }
                generated.push(Generated {
                    file: index,
                    rule: name,
                    imports: raws.next(),
                });
            }
            for empty in result.empty {
                file.rules.retain(|r| r.name() != empty.name());
            }
        }

        let mut ix = RuleIndex::new();
        for entry in &generated {
            let file = &files[entry.file];
            let c = nearest_config(&configs, &root, &file.pkg);
            if let Some(rule) = file.rule(&entry.rule) {
                let label = Label::new("", file.pkg.as_str(), rule.name());
                ix.add_rule(label, lang.name(), lang.imports(c, rule, file));
            }
        }
        ix.finish();
        lang.done_generating_rules()?;

        for entry in &generated {
            let file = &mut files[entry.file];
            let c = nearest_config(&configs, &root, &file.pkg);
            let from = Label::new("", file.pkg.as_str(), entry.rule.as_str());
            if let Some(rule) = file.rule_mut(&entry.rule) {
                lang.resolve(c, &ix, rule, entry.imports.as_ref(), &from)?;
            }
        }

        Ok(files)
    }
}

fn apply_host_directives(c: &mut Config, file: &BuildFile) -> Result<()> {
    for d in file.directives.iter().filter(|d| d.key == "resolve") {
        c.resolve_overrides.push(ResolveOverride::parse(&d.value)?);
    }
    Ok(())
}

fn nearest_config<'a>(configs: &'a FxHashMap<String, Config>, root: &'a Config, rel: &str) -> &'a Config {
    let mut rel = rel;
    loop {
        if rel.is_empty() {
            return root;
        }
        if let Some(c) = configs.get(rel) {
            return c;
        }
        rel = match rel.rfind('/') {
            Some(idx) => &rel[..idx],
            None => "",
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nearest_config_walks_up() {
        let mut configs = FxHashMap::default();
        let mut root = Config::new("/repo");
        root.repo_name = "root".into();
        let mut a = Config::new("/repo");
        a.repo_name = "a".into();
        configs.insert("a".to_string(), a);

        assert_eq!(nearest_config(&configs, &root, "a/b/c").repo_name, "a");
        assert_eq!(nearest_config(&configs, &root, "a").repo_name, "a");
        assert_eq!(nearest_config(&configs, &root, "x/y").repo_name, "root");
        assert_eq!(nearest_config(&configs, &root, "").repo_name, "root");
    }
}
