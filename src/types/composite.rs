use super::TypeId;

/// Ordered set of alternatives. Declaration order decides the order in which
/// members are tried and reported, never whether a value is accepted.
#[derive(Debug, Clone)]
pub struct UnionType {
    pub(crate) members: Vec<TypeId>,
}

impl UnionType {
    pub fn new(members: Vec<TypeId>) -> Self {
        Self { members }
    }

    pub fn members(&self) -> &[TypeId] {
        &self.members
    }
}

/// Homogeneous sequence of one item type with optional cardinality facets.
#[derive(Debug, Clone)]
pub struct ArrayType {
    pub(crate) items: TypeId,
    pub min_items: Option<usize>,
    pub max_items: Option<usize>,
    pub unique_items: bool,
}

impl ArrayType {
    pub fn new(items: TypeId) -> Self {
        Self {
            items,
            min_items: None,
            max_items: None,
            unique_items: false,
        }
    }

    pub fn items(&self) -> TypeId {
        self.items
    }
}
