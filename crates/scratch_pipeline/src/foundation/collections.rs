//! Specialized collection types

pub use slotmap::{new_key_type, SlotMap};

new_key_type! {
    /// Handle to a material registered in a [`MaterialLibrary`](crate::render::MaterialLibrary)
    pub struct MaterialHandle;

    /// Handle to a persistent GPU buffer owned by a backend
    pub struct BufferHandle;

    /// Handle to a GPU surface backing a temporary render target
    pub struct SurfaceHandle;
}

/// Free list for object pooling
///
/// Items are returned with [`FreeList::release`] and handed out again by
/// [`FreeList::acquire`] before any new item is constructed.
#[derive(Debug)]
pub struct FreeList<T> {
    items: Vec<T>,
}

impl<T> FreeList<T> {
    /// Create a new free list
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Take a pooled item, or build one with `create` if the pool is empty
    pub fn acquire(&mut self, create: impl FnOnce() -> T) -> T {
        self.items.pop().unwrap_or_else(create)
    }

    /// Return an item to the pool
    pub fn release(&mut self, item: T) {
        self.items.push(item);
    }

    /// Number of pooled items ready for reuse
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if the pool is empty
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T> Default for FreeList<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_free_list_reuses_released_items() {
        let mut list = FreeList::new();
        let first = list.acquire(|| vec![1u8; 4]);
        list.release(first);
        assert_eq!(list.len(), 1);

        let reused = list.acquire(Vec::new);
        assert_eq!(reused.len(), 4);
        assert!(list.is_empty());
    }
}
