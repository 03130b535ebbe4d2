use super::{TypeId, TypeKind, TypeRegistry};
use crate::error::TypeError;
use once_cell::sync::OnceCell;
use std::collections::HashSet;
use tracing::trace;

/// Placeholder for a type referenced by name before (or without) being declared.
///
/// The target is looked up on first use and the handle cached; later
/// resolutions never scan the registry again.
#[derive(Debug, Clone)]
pub struct LazyProxy {
    target: String,
    resolved: OnceCell<TypeId>,
}

impl LazyProxy {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            resolved: OnceCell::new(),
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    /// The memoized resolution, if this proxy has been resolved before.
    pub fn cached(&self) -> Option<TypeId> {
        self.resolved.get().copied()
    }
}

impl TypeRegistry {
    /// Resolve a single proxy hop: the handle its target name refers to.
    ///
    /// Non-proxy types resolve to themselves. A reference never resolves to
    /// the proxy that holds it, so a property named like the type it refers to
    /// still finds the declaration.
    pub fn resolve_proxy(&self, id: TypeId) -> Result<TypeId, TypeError> {
        let ty = self.get(id).ok_or_else(|| TypeError::NotFound {
            name: id.to_string(),
        })?;
        let TypeKind::Proxy(proxy) = ty.kind() else {
            return Ok(id);
        };
        if let Some(hit) = proxy.cached() {
            return Ok(hit);
        }
        let found = self
            .lookup_excluding(proxy.target(), id)
            .ok_or_else(|| TypeError::UnknownTypeReference {
                name: proxy.target().to_string(),
            })?;
        trace!(proxy = %ty.name(), target = %proxy.target(), resolved = %found, "Proxy resolved");
        // A concurrent resolver may have won the race; both computed the same handle.
        Ok(*proxy.resolved.get_or_init(|| found))
    }

    /// Follow proxy hops until a concrete (non-proxy) type is reached.
    ///
    /// Fails with [`TypeError::CyclicReference`] when a chain of bare
    /// references loops back on itself.
    pub fn resolve(&self, id: TypeId) -> Result<TypeId, TypeError> {
        let mut current = id;
        let mut visited: Vec<TypeId> = Vec::new();
        loop {
            let ty = self.get(current).ok_or_else(|| TypeError::NotFound {
                name: current.to_string(),
            })?;
            if ty.as_proxy().is_none() {
                return Ok(current);
            }
            if visited.contains(&current) {
                let mut chain: Vec<String> = visited
                    .iter()
                    .filter_map(|v| self.get(*v).and_then(|t| t.as_proxy()))
                    .map(|p| p.target().to_string())
                    .collect();
                chain.insert(0, ty.name().to_string());
                return Err(TypeError::CyclicReference { chain });
            }
            visited.push(current);
            current = self.resolve_proxy(current)?;
        }
    }

    /// A path from union `start` back to itself through union members and
    /// proxy hops only. Such a loop never consumes any part of a value, so
    /// validating against it cannot terminate. Objects and arrays end the walk.
    pub(crate) fn union_cycle(&self, start: TypeId) -> Option<Vec<String>> {
        let mut seen = HashSet::new();
        let mut stack = vec![(start, vec![start])];
        while let Some((id, path)) = stack.pop() {
            let next: Vec<TypeId> = match self.get(id).map(|t| t.kind()) {
                Some(TypeKind::Union(union)) => union.members().to_vec(),
                Some(TypeKind::Proxy(_)) => self.resolve_proxy(id).ok().into_iter().collect(),
                _ => Vec::new(),
            };
            for step in next {
                if step == start {
                    let mut chain: Vec<String> = path
                        .iter()
                        .filter_map(|p| self.get(*p))
                        .filter(|t| t.as_proxy().is_none())
                        .map(|t| t.name().to_string())
                        .collect();
                    chain.extend(self.get(start).map(|t| t.name().to_string()));
                    return Some(chain);
                }
                if seen.insert(step) {
                    let mut longer = path.clone();
                    longer.push(step);
                    stack.push((step, longer));
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use crate::error::TypeError;
    use crate::types::{determine_type, TypeKind, TypeRegistry};
    use serde_json::json;

    #[test]
    fn forward_reference_resolves_once_declared() {
        let mut registry = TypeRegistry::new();
        let list = determine_type(&mut registry, "Foos", &json!("Foo[]")).unwrap();
        let TypeKind::Array(array) = registry.get(list).unwrap().kind() else {
            panic!("expected array");
        };
        let item = array.items();
        let proxy = registry.get(item).unwrap().as_proxy().unwrap();
        assert_eq!(proxy.target(), "Foo");
        assert!(proxy.cached().is_none());

        let foo = determine_type(&mut registry, "Foo", &json!("string")).unwrap();
        assert_eq!(registry.resolve(item).unwrap(), foo);

        let proxy = registry.get(item).unwrap().as_proxy().unwrap();
        assert_eq!(proxy.cached(), Some(foo));

        // Cached: a second resolution does not consult the registry again,
        // so it still answers after the target is removed.
        registry.remove(foo).unwrap();
        assert_eq!(registry.resolve_proxy(item).unwrap(), foo);
    }

    #[test]
    fn missing_target_is_an_unknown_reference() {
        let mut registry = TypeRegistry::new();
        let id = determine_type(&mut registry, "Ghost", &json!("Phantom")).unwrap();
        assert_eq!(
            registry.resolve(id).unwrap_err(),
            TypeError::UnknownTypeReference {
                name: "Phantom".into()
            }
        );
        assert!(registry.get(id).unwrap().as_proxy().unwrap().cached().is_none());
    }

    #[test]
    fn reference_chains_resolve_to_the_concrete_type() {
        let mut registry = TypeRegistry::new();
        let a = determine_type(&mut registry, "A", &json!("B")).unwrap();
        determine_type(&mut registry, "B", &json!("C")).unwrap();
        let c = determine_type(&mut registry, "C", &json!("integer")).unwrap();
        assert_eq!(registry.resolve(a).unwrap(), c);
    }

    #[test]
    fn reference_loops_are_detected() {
        let mut registry = TypeRegistry::new();
        let a = determine_type(&mut registry, "A", &json!("B")).unwrap();
        determine_type(&mut registry, "B", &json!("A")).unwrap();
        assert!(matches!(
            registry.resolve(a),
            Err(TypeError::CyclicReference { .. })
        ));
    }
}
