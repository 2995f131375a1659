//! Per-visitor display preferences and the "current product" slot.

use bytehub_core::Product;
use serde::{Deserialize, Serialize};

use crate::storage::{ScopedStorage, keys};

/// Colour theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }
}

/// Text direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Ltr,
    Rtl,
}

impl Direction {
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Ltr => Self::Rtl,
            Self::Rtl => Self::Ltr,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ltr => "ltr",
            Self::Rtl => "rtl",
        }
    }
}

pub async fn theme(store: &ScopedStorage) -> Theme {
    store.get(keys::THEME).await.unwrap_or_default()
}

pub async fn direction(store: &ScopedStorage) -> Direction {
    store.get(keys::DIRECTION).await.unwrap_or_default()
}

/// Flip the theme and return the new one.
pub async fn toggle_theme(store: &ScopedStorage) -> Theme {
    let next = theme(store).await.toggled();
    store.set(keys::THEME, &next).await;
    next
}

/// Flip the text direction and return the new one.
pub async fn toggle_direction(store: &ScopedStorage) -> Direction {
    let next = direction(store).await.toggled();
    store.set(keys::DIRECTION, &next).await;
    next
}

/// Remember the product the visitor opened last.
pub async fn remember_product(store: &ScopedStorage, product: &Product) -> bool {
    store.set(keys::CURRENT_PRODUCT, product).await
}

/// The product the visitor opened last.
pub async fn current_product(store: &ScopedStorage) -> Option<Product> {
    store.get(keys::CURRENT_PRODUCT).await
}
