// Rendering and text codecs behind the delivery console.

// Log display
pub mod parser;
pub mod logs;

// Administration
pub mod rbac;

// Shared helpers
pub mod sets;
pub mod serde_utils;
