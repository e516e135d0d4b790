//! Internal `$ref` resolution
//!
//! Flattens every internal reference (`#/...`) into the structure it points
//! to. Sibling keys written next to a `$ref` are merged over the resolved
//! target, local keys winning, when the target is a mapping.
//!
//! Resolution is a recursive descent keyed by reference target. Meeting a
//! target that is already on the chain being expanded means the schema is
//! self-referential; that back-edge is left in place as a literal `$ref`
//! node instead of recursing forever. Every expanded target is memoized,
//! and a self-referential target is placed at most once per top-level
//! reference, later encounters staying a literal `$ref`. Densely cyclic
//! component graphs therefore resolve to a tree bounded by the number of
//! components, not by the number of paths through them.
//! External references (anything not starting with `#`) are kept verbatim.

use crate::error::ResolveError;
use percent_encoding::percent_decode_str;
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};

const REF_KEY: &str = "$ref";

/// Outcome of resolving one document
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    /// Flattened tree
    pub value: Value,
    /// Self-referential `$ref` nodes left in place
    pub cycles: usize,
    /// External references left untouched
    pub external: usize,
}

/// Resolve every internal reference in `root`
///
/// # Errors
/// Returns [`ResolveError::Unresolved`] if an internal pointer names nothing
pub fn resolve_refs(root: &Value) -> Result<Resolved, ResolveError> {
    let mut resolver = RefResolver {
        root,
        chain: Vec::new(),
        placed: HashSet::new(),
        memo: HashMap::new(),
        cycles: 0,
        external: 0,
    };
    let (value, _) = resolver.resolve(root)?;
    Ok(Resolved {
        value,
        cycles: resolver.cycles,
        external: resolver.external,
    })
}

/// A fully expanded reference target
struct Expansion {
    value: Value,
    /// A back-edge was kept somewhere beneath it
    cyclic: bool,
}

struct RefResolver<'a> {
    root: &'a Value,
    /// Targets currently being expanded, outermost first
    chain: Vec<String>,
    /// Cyclic targets already placed under the current top-level reference
    placed: HashSet<String>,
    memo: HashMap<String, Expansion>,
    cycles: usize,
    external: usize,
}

impl RefResolver<'_> {
    /// Returns the resolved node and whether a back-edge was met beneath it
    fn resolve(&mut self, node: &Value) -> Result<(Value, bool), ResolveError> {
        match node {
            Value::Object(map) => match map.get(REF_KEY) {
                Some(Value::String(reference)) => self.resolve_reference(reference, map),
                _ => self.resolve_mapping(map),
            },
            Value::Array(items) => {
                let mut touched = false;
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    let (value, cyc) = self.resolve(item)?;
                    touched |= cyc;
                    out.push(value);
                }
                Ok((Value::Array(out), touched))
            }
            scalar => Ok((scalar.clone(), false)),
        }
    }

    fn resolve_mapping(&mut self, map: &Map<String, Value>) -> Result<(Value, bool), ResolveError> {
        let mut touched = false;
        let mut out = Map::with_capacity(map.len());
        for (key, value) in map {
            let (value, cyc) = self.resolve(value)?;
            touched |= cyc;
            out.insert(key.clone(), value);
        }
        Ok((Value::Object(out), touched))
    }

    /// Keep `node` as a literal `$ref`, resolving only its siblings
    fn keep_reference(
        &mut self,
        reference: &str,
        node: &Map<String, Value>,
    ) -> Result<(Value, bool), ResolveError> {
        tracing::debug!(reference, "self-referential schema, keeping reference");
        self.cycles += 1;
        let (value, _) = self.resolve_mapping(node)?;
        Ok((value, true))
    }

    fn resolve_reference(
        &mut self,
        reference: &str,
        node: &Map<String, Value>,
    ) -> Result<(Value, bool), ResolveError> {
        let Some(fragment) = reference.strip_prefix('#') else {
            self.external += 1;
            return self.resolve_mapping(node);
        };
        let pointer = percent_decode_str(fragment).decode_utf8_lossy().into_owned();

        if self.chain.is_empty() {
            self.placed.clear();
        }
        if self.chain.contains(&pointer) {
            return self.keep_reference(reference, node);
        }

        let cached_cyclic = self.memo.get(&pointer).map(|e| e.cyclic);
        let (target, mut touched) = match cached_cyclic {
            Some(true) if self.placed.contains(&pointer) => {
                return self.keep_reference(reference, node);
            }
            Some(cyclic) => {
                if cyclic {
                    self.placed.insert(pointer.clone());
                }
                let value = self
                    .memo
                    .get(&pointer)
                    .map(|e| e.value.clone())
                    .unwrap_or_default();
                (value, cyclic)
            }
            None => {
                let raw = self
                    .root
                    .pointer(&pointer)
                    .ok_or_else(|| ResolveError::Unresolved(reference.to_string()))?;
                self.chain.push(pointer.clone());
                let result = self.resolve(raw);
                self.chain.pop();
                let (value, cyclic) = result?;
                if cyclic {
                    self.placed.insert(pointer.clone());
                }
                self.memo.insert(
                    pointer,
                    Expansion {
                        value: value.clone(),
                        cyclic,
                    },
                );
                (value, cyclic)
            }
        };

        let siblings: Vec<(&String, &Value)> =
            node.iter().filter(|(k, _)| k.as_str() != REF_KEY).collect();
        if siblings.is_empty() {
            return Ok((target, touched));
        }

        match target {
            Value::Object(mut merged) => {
                for (key, value) in siblings {
                    let (value, cyc) = self.resolve(value)?;
                    touched |= cyc;
                    merged.insert(key.clone(), value);
                }
                Ok((Value::Object(merged), touched))
            }
            // Only mappings can absorb sibling keys
            other => Ok((other, touched)),
        }
    }
}
