//! Configuration options for native compilation.

/// Which machine to generate code for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Target {
    /// The machine running the compiler, with a generic CPU and no optional
    /// features.
    #[default]
    Host,
    /// An explicit target triple such as `x86_64-unknown-linux-gnu`.
    Triple(String),
}

/// Configuration options for one compilation run.
///
/// # Example
///
/// ```
/// use ferrule_core::codegen::{CompileOptions, Target};
///
/// let options = CompileOptions {
///     target: Target::Triple("x86_64-unknown-linux-gnu".to_string()),
///     ..CompileOptions::default()
/// };
/// assert_eq!(options.module_name, "ferrule");
/// ```
#[derive(Debug, Clone)]
pub struct CompileOptions {
    /// Default: [`Target::Host`]
    pub target: Target,

    /// Name recorded in the object file.
    ///
    /// Default: `"ferrule"`
    pub module_name: String,

    /// Keep a copy of each function's IR for inspection after compilation.
    ///
    /// Default: false
    pub retain_ir: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            target: Target::Host,
            module_name: "ferrule".to_string(),
            retain_ir: false,
        }
    }
}
