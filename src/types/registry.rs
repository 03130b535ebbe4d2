use super::{Type, TypeId, TypeKind};
use crate::error::TypeError;
use crate::validator::ValidationIssue;
use tracing::{debug, info};

/// Ordered store of every type produced during one build session.
///
/// Types live in registration order. Lookup by name scans that order and the
/// first match wins; names are not required to be unique. Removal leaves an
/// empty slot behind so that outstanding [`TypeId`] handles stay stable.
///
/// One build session owns one registry. Construct a new one (or [`clear`] an
/// old one) before each build; nothing carries over implicitly.
///
/// [`clear`]: TypeRegistry::clear
#[derive(Debug, Default, Clone)]
pub struct TypeRegistry {
    slots: Vec<Option<Type>>,
    pending: Vec<TypeId>,
}

impl TypeRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a type. No uniqueness check is performed.
    pub fn register(&mut self, ty: Type) -> TypeId {
        let id = TypeId(self.slots.len());
        debug!(type_id = %id, name = %ty.name(), variant = ty.variant(), "Type registered");
        self.slots.push(Some(ty));
        id
    }

    /// First registered type named `name`.
    pub fn lookup(&self, name: &str) -> Result<TypeId, TypeError> {
        self.find(name, None).ok_or_else(|| TypeError::UnknownType {
            name: name.to_string(),
        })
    }

    /// Non-failing existence probe.
    #[must_use]
    pub fn exists(&self, name: &str) -> bool {
        self.lookup(name).is_ok()
    }

    pub(crate) fn lookup_excluding(&self, name: &str, skip: TypeId) -> Option<TypeId> {
        self.find(name, Some(skip))
    }

    fn find(&self, name: &str, skip: Option<TypeId>) -> Option<TypeId> {
        self.iter()
            .find(|(id, ty)| Some(*id) != skip && ty.name() == name)
            .map(|(id, _)| id)
    }

    /// Remove the exact instance behind `id`.
    pub fn remove(&mut self, id: TypeId) -> Result<Type, TypeError> {
        let removed = self
            .slots
            .get_mut(id.index())
            .and_then(Option::take)
            .ok_or_else(|| TypeError::NotFound {
                name: id.to_string(),
            })?;
        self.pending.retain(|p| *p != id);
        debug!(type_id = %id, name = %removed.name(), "Type removed");
        Ok(removed)
    }

    #[must_use]
    pub fn get(&self, id: TypeId) -> Option<&Type> {
        self.slots.get(id.index()).and_then(Option::as_ref)
    }

    pub(crate) fn get_mut(&mut self, id: TypeId) -> Option<&mut Type> {
        self.slots.get_mut(id.index()).and_then(Option::as_mut)
    }

    /// Swap in the final variant for a slot reserved earlier.
    ///
    /// Composite types reserve their slot before building their members so
    /// that the outer declaration precedes same-named members in lookup order.
    pub(crate) fn replace_kind(&mut self, id: TypeId, kind: TypeKind) {
        if let Some(ty) = self.get_mut(id) {
            *ty.kind_mut() = kind;
        }
    }

    /// Live types in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (TypeId, &Type)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|ty| (TypeId(i), ty)))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Queue an object type for inheritance resolution.
    pub fn mark_pending_inheritance(&mut self, id: TypeId) {
        self.pending.push(id);
    }

    #[must_use]
    pub fn pending_inheritance(&self) -> &[TypeId] {
        &self.pending
    }

    /// Resolve inheritance for every queued object, in queue order, then
    /// empty the queue. Calling it again with nothing queued is a no-op.
    ///
    /// On failure the failing object and everything queued after it stay
    /// queued, and the error is returned.
    pub fn apply_inheritance(&mut self) -> Result<(), TypeError> {
        let pending = std::mem::take(&mut self.pending);
        if pending.is_empty() {
            return Ok(());
        }
        for (i, id) in pending.iter().enumerate() {
            if let Err(err) = self.inherit_from_parent(*id) {
                self.pending = pending[i..].to_vec();
                return Err(err);
            }
        }
        info!(resolved = pending.len(), "Inheritance applied");
        Ok(())
    }

    /// Drop every type and every queued object.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.pending.clear();
    }

    /// Resolve every proxy and report the ones whose target cannot be found,
    /// then every union that can reach itself without passing through an
    /// object or an array (`A: A | string`).
    ///
    /// Failures are collected rather than surfaced one at a time.
    pub fn check_references(&self) -> Vec<ValidationIssue> {
        let unresolved = self
            .iter()
            .filter(|(_, ty)| ty.as_proxy().is_some())
            .filter_map(|(id, ty)| {
                self.resolve(id)
                    .err()
                    .map(|err| ValidationIssue::new(ty.name(), "reference", err.to_string()))
            });
        let cyclic = self
            .iter()
            .filter(|(_, ty)| matches!(ty.kind(), TypeKind::Union(_)))
            .filter_map(|(id, ty)| {
                self.union_cycle(id).map(|chain| {
                    ValidationIssue::new(ty.name(), "reference", TypeError::CyclicReference { chain }.to_string())
                })
            });
        unresolved.chain(cyclic).collect()
    }

    /// Render a type as a compact type expression (`Message[]`, `string | nil`).
    #[must_use]
    pub fn describe(&self, id: TypeId) -> String {
        let Some(ty) = self.get(id) else {
            return id.to_string();
        };
        match ty.kind() {
            TypeKind::Generic => "any".to_string(),
            TypeKind::Primitive(p) => p.kind().to_string(),
            TypeKind::Object(_) => ty.name().to_string(),
            TypeKind::Proxy(p) => p.target().to_string(),
            TypeKind::Union(u) => u
                .members()
                .iter()
                .map(|m| self.describe(*m))
                .collect::<Vec<_>>()
                .join(" | "),
            TypeKind::Array(a) => {
                let item = self.describe(a.items());
                if matches!(self.get(a.items()).map(Type::kind), Some(TypeKind::Union(_))) {
                    format!("({item})[]")
                } else {
                    format!("{item}[]")
                }
            }
        }
    }
}
