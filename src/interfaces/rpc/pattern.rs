//! Message patterns served by the products service

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProductPattern {
    Create,
    FindAll,
    FindOne,
    Update,
    Delete,
    Validate,
}

impl ProductPattern {
    pub const ALL: [ProductPattern; 6] = [
        Self::Create,
        Self::FindAll,
        Self::FindOne,
        Self::Update,
        Self::Delete,
        Self::Validate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create_product",
            Self::FindAll => "find_all_products",
            Self::FindOne => "find_one_product",
            Self::Update => "update_product",
            Self::Delete => "delete_product",
            Self::Validate => "validate_products",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.as_str() == name)
    }
}

impl fmt::Display for ProductPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
