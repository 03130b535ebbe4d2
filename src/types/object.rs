use super::{TypeId, TypeKind, TypeRegistry};
use crate::error::TypeError;
use indexmap::{IndexMap, IndexSet};
use tracing::debug;

/// Structured type: named properties, the subset of them that is required, and
/// the parents it inherits from.
#[derive(Debug, Clone)]
pub struct ObjectType {
    pub(crate) properties: IndexMap<String, TypeId>,
    pub(crate) required: IndexSet<String>,
    pub(crate) parents: Vec<TypeId>,
    pub additional_properties: bool,
    inheritance_applied: bool,
}

impl Default for ObjectType {
    fn default() -> Self {
        Self {
            properties: IndexMap::new(),
            required: IndexSet::new(),
            parents: Vec::new(),
            additional_properties: true,
            inheritance_applied: false,
        }
    }
}

impl ObjectType {
    /// An object whose parents, if any, are not merged in yet.
    pub(crate) fn new(
        properties: IndexMap<String, TypeId>,
        required: IndexSet<String>,
        parents: Vec<TypeId>,
        additional_properties: bool,
    ) -> Self {
        Self {
            properties,
            required,
            parents,
            additional_properties,
            inheritance_applied: false,
        }
    }

    /// Property name to property type, in declaration order (inherited last).
    pub fn properties(&self) -> &IndexMap<String, TypeId> {
        &self.properties
    }

    pub fn required(&self) -> &IndexSet<String> {
        &self.required
    }

    pub fn is_required(&self, property: &str) -> bool {
        self.required.contains(property)
    }

    /// Parent references, usually lazy proxies, in declaration order.
    pub fn parents(&self) -> &[TypeId] {
        &self.parents
    }

    pub fn inheritance_applied(&self) -> bool {
        self.inheritance_applied
    }
}

impl TypeRegistry {
    /// Merge the parent chain of object `id` into it.
    ///
    /// Parents are resolved through their proxies and, if they still have
    /// inheritance of their own pending, resolved first, so the result does not
    /// depend on queue order. Child properties are never overwritten; required
    /// sets are unioned. Non-object types and already-resolved objects are
    /// left untouched.
    pub fn inherit_from_parent(&mut self, id: TypeId) -> Result<(), TypeError> {
        let mut visiting = Vec::new();
        self.inherit_visiting(id, &mut visiting)
    }

    fn inherit_visiting(&mut self, id: TypeId, visiting: &mut Vec<TypeId>) -> Result<(), TypeError> {
        let Some(ty) = self.get(id) else {
            return Err(TypeError::NotFound {
                name: id.to_string(),
            });
        };
        let child_name = ty.name().to_string();
        let parents = match ty.kind() {
            TypeKind::Object(object) if !object.inheritance_applied => object.parents.clone(),
            _ => return Ok(()),
        };

        if visiting.contains(&id) {
            let mut chain: Vec<String> = visiting
                .iter()
                .filter_map(|v| self.get(*v).map(|t| t.name().to_string()))
                .collect();
            chain.push(child_name);
            return Err(TypeError::CyclicInheritance { chain });
        }
        visiting.push(id);

        let mut inherited: IndexMap<String, TypeId> = IndexMap::new();
        let mut inherited_required: IndexSet<String> = IndexSet::new();
        for parent_ref in parents {
            let parent_id = self.resolve(parent_ref)?;
            let parent_name = self
                .get(parent_id)
                .map(|p| p.name().to_string())
                .unwrap_or_default();
            if self.get(parent_id).and_then(|p| p.as_object()).is_none() {
                return Err(TypeError::ExpectedObjectParent {
                    child: child_name,
                    parent: parent_name,
                });
            }

            self.inherit_visiting(parent_id, visiting)?;

            if let Some(parent) = self.get(parent_id).and_then(|p| p.as_object()) {
                for (name, prop) in &parent.properties {
                    inherited.entry(name.clone()).or_insert(*prop);
                }
                inherited_required.extend(parent.required.iter().cloned());
            }
        }
        visiting.pop();

        if let Some(TypeKind::Object(object)) = self.get_mut(id).map(|t| t.kind_mut()) {
            let before = object.properties.len();
            for (name, prop) in inherited {
                object.properties.entry(name).or_insert(prop);
            }
            object.required.extend(inherited_required);
            object.inheritance_applied = true;
            debug!(
                type_name = %child_name,
                inherited_properties = object.properties.len() - before,
                total_properties = object.properties.len(),
                "Inheritance resolved"
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::error::TypeError;
    use crate::types::{determine_type, TypeRegistry};
    use serde_json::json;

    fn three_levels(registry: &mut TypeRegistry) {
        // Declared child-first so the queue order is the reverse of the DAG order.
        determine_type(
            registry,
            "C",
            &json!({"type": "B", "properties": {"z": "integer"}}),
        )
        .unwrap();
        determine_type(
            registry,
            "B",
            &json!({"type": "A", "properties": {"y": "boolean", "x?": "integer"}}),
        )
        .unwrap();
        determine_type(registry, "A", &json!({"properties": {"x": "string"}})).unwrap();
    }

    #[test]
    fn multi_level_inheritance_merges_every_level() {
        let mut registry = TypeRegistry::new();
        three_levels(&mut registry);
        registry.apply_inheritance().unwrap();

        let c = registry.lookup("C").unwrap();
        let object = registry.get(c).unwrap().as_object().unwrap();
        let names: Vec<&str> = object.properties().keys().map(String::as_str).collect();
        assert_eq!(names, vec!["z", "y", "x"]);
        assert!(object.inheritance_applied());
        // x is optional on B but required on A: the required sets are unioned.
        for name in ["x", "y", "z"] {
            assert!(object.is_required(name), "{name} should be required");
        }
    }

    #[test]
    fn child_properties_are_never_overwritten() {
        let mut registry = TypeRegistry::new();
        three_levels(&mut registry);
        registry.apply_inheritance().unwrap();

        let b = registry.lookup("B").unwrap();
        let object = registry.get(b).unwrap().as_object().unwrap();
        let x = object.properties()["x"];
        assert_eq!(registry.describe(x), "integer");
    }

    #[test]
    fn two_node_cycle_fails_for_both() {
        let mut registry = TypeRegistry::new();
        let a = determine_type(
            &mut registry,
            "A",
            &json!({"type": "B", "properties": {"a": "string"}}),
        )
        .unwrap();
        let b = determine_type(
            &mut registry,
            "B",
            &json!({"type": "A", "properties": {"b": "string"}}),
        )
        .unwrap();

        for id in [a, b] {
            let err = registry.inherit_from_parent(id).unwrap_err();
            assert!(matches!(err, TypeError::CyclicInheritance { .. }), "{err}");
        }
        assert!(registry.apply_inheritance().is_err());
        assert_eq!(registry.pending_inheritance(), &[a, b]);
    }

    #[test]
    fn non_object_parent_is_rejected() {
        let mut registry = TypeRegistry::new();
        determine_type(&mut registry, "Name", &json!("string")).unwrap();
        let child = determine_type(
            &mut registry,
            "Person",
            &json!({"type": "Name", "properties": {"age": "integer"}}),
        )
        .unwrap();
        assert_eq!(
            registry.inherit_from_parent(child).unwrap_err(),
            TypeError::ExpectedObjectParent {
                child: "Person".into(),
                parent: "Name".into()
            }
        );
    }

    #[test]
    fn multiple_parents_merge_in_declaration_order() {
        let mut registry = TypeRegistry::new();
        determine_type(&mut registry, "Named", &json!({"properties": {"name": "string"}})).unwrap();
        determine_type(
            &mut registry,
            "Aged",
            &json!({"properties": {"age": "integer", "name?": "integer"}}),
        )
        .unwrap();
        let both = determine_type(&mut registry, "Both", &json!({"type": ["Named", "Aged"]})).unwrap();
        registry.apply_inheritance().unwrap();

        let object = registry.get(both).unwrap().as_object().unwrap();
        assert_eq!(object.properties().len(), 2);
        assert_eq!(registry.describe(object.properties()["name"]), "string");
    }
}
