use std::sync::Arc;

use super::{ResolveError, SymbolResolver};
use crate::base::Label;
use crate::host::{Config, RuleIndex};
use crate::symbol::SymbolRef;

/// Consults its layers in order; the first success wins.
///
/// If every layer fails, the first error that is not
/// [`ResolveError::NotFound`] is returned, otherwise `NotFound(name)`.
#[derive(Default)]
pub struct ChainSymbolResolver {
    layers: Vec<Arc<dyn SymbolResolver>>,
}

impl ChainSymbolResolver {
    /// Create a chain over `layers`.
    pub fn new(layers: Vec<Arc<dyn SymbolResolver>>) -> Self {
        Self { layers }
    }

    /// Append a layer.
    pub fn push(&mut self, layer: Arc<dyn SymbolResolver>) {
        self.layers.push(layer);
    }
}

impl SymbolResolver for ChainSymbolResolver {
    fn resolve_symbol(
        &self,
        c: &Config,
        ix: &RuleIndex,
        from: &Label,
        lang: &str,
        name: &str,
    ) -> Result<SymbolRef, ResolveError> {
        let mut first_error = None;
        for layer in &self.layers {
            match layer.resolve_symbol(c, ix, from, lang, name) {
                Ok(symbol) => return Ok(symbol),
                Err(ResolveError::NotFound(_)) => {}
                Err(err) => {
                    first_error.get_or_insert(err);
                }
            }
        }
        Err(first_error.unwrap_or_else(|| ResolveError::NotFound(name.to_string())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::{Symbol, SymbolType};

    struct Fixed(Option<&'static str>);

    impl SymbolResolver for Fixed {
        fn resolve_symbol(
            &self,
            _c: &Config,
            _ix: &RuleIndex,
            _from: &Label,
            _lang: &str,
            name: &str,
        ) -> Result<SymbolRef, ResolveError> {
            match self.0 {
                Some(label) => Ok(Symbol::shared(
                    SymbolType::Class,
                    name,
                    "test",
                    Label::parse(label).unwrap(),
                )),
                None => Err(ResolveError::NotFound(name.to_string())),
            }
        }
    }

    #[test]
    fn test_first_success_wins() {
        let chain = ChainSymbolResolver::new(vec![
            Arc::new(Fixed(None)),
            Arc::new(Fixed(Some("//a:a"))),
            Arc::new(Fixed(Some("//b:b"))),
        ]);
        let c = Config::default();
        let symbol = chain
            .resolve_symbol(&c, &RuleIndex::new(), &Label::no_label(), "scala", "a.A")
            .unwrap();
        assert_eq!(symbol.label.to_string(), "//a:a");
    }

    #[test]
    fn test_all_missing_is_not_found() {
        let chain = ChainSymbolResolver::new(vec![Arc::new(Fixed(None))]);
        let c = Config::default();
        let err = chain
            .resolve_symbol(&c, &RuleIndex::new(), &Label::no_label(), "scala", "x.Y")
            .unwrap_err();
        assert_eq!(err, ResolveError::NotFound("x.Y".to_string()));
    }
}
