/*!
 * Core Types
 * Common types used across the engine
 */

/// Virtual address handed out to callers.
///
/// Never a host pointer: values are assigned monotonically from
/// [`crate::core::limits::VIRT_BASE`] and only have meaning through the
/// address translator.
pub type VirtAddr = usize;

/// Size type for memory operations
pub type Size = usize;

/// Index of a page in the page chain (acquisition order)
pub type PageIdx = usize;

/// Slot index of a segment inside a page's segment chain
pub type SegIdx = usize;
