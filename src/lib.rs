//! Compile-time implicit-parameter analyzer. Given a module's parsed
//! sources and the interfaces of its dependencies, it checks that every
//! implicit read happens under a scope that can provide it, computes
//! the requirement closure of every exported scope-taking function, and
//! emits the module interface and support file downstream builds need.

pub mod analyze;
pub mod build_syntax;
pub mod conditional;
pub mod diagnostics;
pub mod graph;
pub mod host;
pub mod implicit_key;
pub mod interface;
pub mod lang;
pub mod line_column;
pub mod namespace;
pub mod sema;
pub mod serialize;
pub mod signature;
pub mod source_files;
pub mod support_file;
pub mod symbol_index;
pub mod syntax_tree;
pub mod type_renderer;
pub mod visibility;

pub use analyze::{analyze_module, AnalyzeOptions, ModuleAnalysis};
