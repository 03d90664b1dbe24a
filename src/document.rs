use crate::env::Environment;
use crate::eval;
use crate::schema::TypeDef;
use crate::syntax::Parsed;
use crate::value::Value;
use indexmap::IndexMap;
use std::rc::Rc;
use tracing::debug;

/// The result of evaluation: an environment plus every expression result
/// so far. Supports incremental use, one fragment per [`Document::merge`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    env: Environment,
    results: Vec<Value>,
    last_result: Option<Value>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluate `parsed` into this document's environment. Definitions
    /// overwrite earlier entries of the same name and results are appended.
    /// Returns the fragment's last result, if it had any expressions.
    pub fn merge(&mut self, parsed: &Parsed) -> Option<&Value> {
        eval::load_data_block(&mut self.env, &parsed.data);
        let results = eval::run(&mut self.env, &parsed.root);
        self.last_result = results.last().cloned();
        debug!(
            appended = results.len(),
            total = self.results.len() + results.len(),
            "fragment merged"
        );
        self.results.extend(results);
        self.last_result.as_ref()
    }

    /// Drop all state.
    pub fn reset(&mut self) {
        debug!("document reset");
        *self = Document::default();
    }

    pub fn environment(&self) -> &Environment {
        &self.env
    }

    pub fn typedefs(&self) -> &IndexMap<String, Rc<TypeDef>> {
        &self.env.typedefs
    }

    pub fn locals(&self) -> &IndexMap<String, Value> {
        &self.env.locals
    }

    pub fn publics(&self) -> &IndexMap<String, Value> {
        &self.env.publics
    }

    pub fn results(&self) -> &[Value] {
        &self.results
    }

    /// Last result of the most recent merge; `None` if that merge held
    /// only definitions.
    pub fn last_result(&self) -> Option<&Value> {
        self.last_result.as_ref()
    }
}
