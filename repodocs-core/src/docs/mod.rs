//! Documentation import and rendering
//!
//! Writer side: build a run from pre-rendered fragment files.
//! Reader side: compose the chunks of a run into a standalone HTML page.

pub mod import;
pub mod render;

pub use import::{collect_fragment_files, import_documentation, ImportOutcome};
pub use render::documentation_page;
