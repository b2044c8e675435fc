//! Template compilation.
//!
//! Turns a single user-authored template module into an executable CommonJS
//! bundle. Bundling is delegated to `esbuild` as a subprocess; the modules
//! that ship with the tool never leak into the output because the bundle's
//! rendering entry point is resolved from the user's own `node_modules`
//! (see [`resolver`]).

pub mod bundle;
pub mod resolver;

pub use bundle::{Bundle, compile};
